//! Column-wise photometric averaging of a cropped still into a calibrated trace.

use tracing::debug;

use crate::spectrometer::calibration::{subtract_baseline, CalibrationAnchors, CalibrationModel};
use crate::spectrometer::common::error::{Result, SpectroError};
use crate::spectrometer::image::{RgbImageData, CHANNELS};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumPoint {
    pub wavelength: f64,
    pub intensity: f64,
}

/// One point per image column, in column order. Wavelengths decrease along
/// the trace when the calibration runs right to left.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumTrace {
    points: Vec<SpectrumPoint>,
}

impl SpectrumTrace {
    pub fn new(points: Vec<SpectrumPoint>) -> Self {
        Self { points }
    }

    pub fn from_columns(wavelengths: &[f64], intensities: &[f64]) -> Self {
        Self {
            points: wavelengths
                .iter()
                .zip(intensities)
                .map(|(&wavelength, &intensity)| SpectrumPoint { wavelength, intensity })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[SpectrumPoint] {
        &self.points
    }

    pub fn wavelengths(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.wavelength).collect()
    }

    pub fn intensities(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.intensity).collect()
    }

    /// Point with the highest intensity.
    pub fn peak(&self) -> Option<SpectrumPoint> {
        self.points
            .iter()
            .copied()
            .max_by(|a, b| a.intensity.total_cmp(&b.intensity))
    }
}

pub struct SpectrumExtractor;

impl SpectrumExtractor {
    /// Mean over all rows and channels, one value per column.
    pub fn column_means(image: &RgbImageData) -> Result<Vec<f64>> {
        if image.is_empty() {
            return Err(SpectroError::InvalidImage(format!(
                "cannot extract a spectrum from a {}x{} image",
                image.width, image.height
            )));
        }

        let mut sums = vec![0u64; image.width];
        for row in image.data.chunks_exact(image.width * CHANNELS) {
            for (sum, px) in sums.iter_mut().zip(row.chunks_exact(CHANNELS)) {
                *sum += px.iter().map(|&v| v as u64).sum::<u64>();
            }
        }

        let samples = (image.height * CHANNELS) as f64;
        Ok(sums.into_iter().map(|s| s as f64 / samples).collect())
    }

    pub fn extract(image: &RgbImageData, calibration: &CalibrationModel) -> Result<SpectrumTrace> {
        let raw = Self::column_means(image)?;
        let intensities = subtract_baseline(&raw);
        let wavelengths = calibration.wavelengths(intensities.len());

        let trace = SpectrumTrace::from_columns(&wavelengths, &intensities);
        debug!(columns = trace.len(), "Spectrum extracted");
        Ok(trace)
    }

    pub fn extract_with_anchors(image: &RgbImageData, anchors: &CalibrationAnchors) -> Result<SpectrumTrace> {
        let calibration = CalibrationModel::new(anchors)?;
        Self::extract(image, &calibration)
    }
}
