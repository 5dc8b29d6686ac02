use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::spectrometer::acquisition::timing::ProcessTimings;
use crate::spectrometer::calibration::CalibrationAnchors;
use crate::spectrometer::camera::{Exposure, Resolution, Rotation};
use crate::spectrometer::extraction::SpectrumTrace;
use crate::spectrometer::image::{CropBox, Rgb, RgbImageData};
use crate::spectrometer::overlay::OverlayParams;
use crate::spectrometer::persistence::ExperimentMetadata;

/// Capture timestamp format used in file names and reports.
pub const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Everything the operator can set between measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionParams {
    pub exposure: Exposure,
    /// Camera mount rotation, applied by the camera itself.
    pub rotation: Rotation,
    /// Free angle in degrees (counter-clockwise) applied to the still before cropping.
    pub fine_angle: f64,
    pub crop: CropBox,
    pub calibration: CalibrationAnchors,
    pub metadata: ExperimentMetadata,
    /// Colour of the light indicator while measuring.
    pub light_color: Rgb,
}

impl AcquisitionParams {
    pub fn for_resolution(resolution: Resolution) -> Self {
        Self {
            exposure: Exposure::default(),
            rotation: Rotation::default(),
            fine_angle: 0.0,
            crop: CropBox::full(resolution.width as usize, resolution.height as usize),
            calibration: CalibrationAnchors::default(),
            metadata: ExperimentMetadata::default(),
            light_color: Rgb::new(255, 255, 255),
        }
    }

    pub fn overlay_params(&self, status: Option<String>) -> OverlayParams {
        OverlayParams {
            crop: Some(self.crop),
            pixel1: Some(self.calibration.pixel1),
            pixel2: Some(self.calibration.pixel2),
            status,
        }
    }

    /// Light source text for the report; names the indicator colour when the
    /// operator left it empty and an indicator is fitted.
    pub fn light_description(&self, indicator_present: bool) -> String {
        let typed = self.metadata.light_source.trim();
        if typed.is_empty() && indicator_present {
            format!("NeoPixel - {}", self.light_color)
        } else {
            typed.to_string()
        }
    }
}

impl Default for AcquisitionParams {
    fn default() -> Self {
        Self::for_resolution(Resolution::default())
    }
}

/// A still as delivered by the camera, with its capture time.
#[derive(Debug, Clone)]
pub struct Capture {
    pub taken_at: DateTime<Local>,
    pub stamp: String,
    pub image: RgbImageData,
}

impl Capture {
    pub fn new(taken_at: DateTime<Local>, image: RgbImageData) -> Self {
        Self {
            stamp: taken_at.format(STAMP_FORMAT).to_string(),
            taken_at,
            image,
        }
    }
}

/// Result of processing one capture.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub stamp: String,
    pub raw: RgbImageData,
    /// Cropped and brightness-normalised image the trace was taken from.
    pub processed: RgbImageData,
    pub trace: SpectrumTrace,
    pub scale_factor: u32,
    pub timings: ProcessTimings,
}
