//! Pixel-column to wavelength calibration and baseline correction.

use serde::{Deserialize, Serialize};

use crate::spectrometer::common::error::{Result, SpectroError};

/// Fraction of the trace minimum treated as the sensor/ambient floor.
pub const BASELINE_FRACTION: f64 = 0.9;

pub const DEFAULT_WAVELENGTH1: f64 = 544.0;
pub const DEFAULT_WAVELENGTH2: f64 = 611.0;

/// Two reference lines as entered: pixel columns paired with known wavelengths (nm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationAnchors {
    pub pixel1: i64,
    pub pixel2: i64,
    pub wavelength1: f64,
    pub wavelength2: f64,
}

impl CalibrationAnchors {
    pub fn new(pixel1: i64, pixel2: i64, wavelength1: f64, wavelength2: f64) -> Self {
        Self { pixel1, pixel2, wavelength1, wavelength2 }
    }

    /// Parses the two line fields, keeping the configured wavelengths.
    pub fn with_pixel_fields(&self, pixel1: &str, pixel2: &str) -> Result<Self> {
        let parse = |field: &str| {
            field
                .trim()
                .parse::<i64>()
                .map_err(|_| SpectroError::InvalidCalibration(format!("'{}' is not a pixel column", field)))
        };
        Ok(Self {
            pixel1: parse(pixel1)?,
            pixel2: parse(pixel2)?,
            ..*self
        })
    }
}

impl Default for CalibrationAnchors {
    fn default() -> Self {
        Self {
            pixel1: 0,
            pixel2: 1,
            wavelength1: DEFAULT_WAVELENGTH1,
            wavelength2: DEFAULT_WAVELENGTH2,
        }
    }
}

/// Linear column -> wavelength map built from two anchors.
///
/// When the wavelengths arrive in descending order only the wavelengths are
/// swapped; the pixel anchors keep the order they were given in. Stored
/// calibrations rely on this pairing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationModel {
    wavelength1: f64,
    wavelength2: f64,
    pixel1: f64,
    pixel2: f64,
}

impl CalibrationModel {
    pub fn new(anchors: &CalibrationAnchors) -> Result<Self> {
        let CalibrationAnchors { pixel1, pixel2, mut wavelength1, mut wavelength2 } = *anchors;

        if pixel1 == pixel2 {
            return Err(SpectroError::InvalidCalibration(format!(
                "both lines sit on column {}",
                pixel1
            )));
        }
        if !wavelength1.is_finite() || !wavelength2.is_finite() {
            return Err(SpectroError::InvalidCalibration(
                "wavelengths must be finite numbers".to_string(),
            ));
        }

        if wavelength1 > wavelength2 {
            std::mem::swap(&mut wavelength1, &mut wavelength2);
        }

        Ok(Self {
            wavelength1,
            wavelength2,
            pixel1: pixel1 as f64,
            pixel2: pixel2 as f64,
        })
    }

    /// Nanometres per pixel column. Negative when the spectrum runs right to left.
    pub fn dispersion(&self) -> f64 {
        (self.wavelength2 - self.wavelength1) / (self.pixel2 - self.pixel1)
    }

    pub fn wavelength_at(&self, column: f64) -> f64 {
        self.wavelength1 + (column - self.pixel1) * self.dispersion()
    }

    /// Inverse of [`wavelength_at`](Self::wavelength_at).
    pub fn column_at(&self, wavelength: f64) -> f64 {
        self.pixel1 + (wavelength - self.wavelength1) / self.dispersion()
    }

    pub fn wavelengths(&self, columns: usize) -> Vec<f64> {
        (0..columns).map(|c| self.wavelength_at(c as f64)).collect()
    }
}

/// Subtracts `BASELINE_FRACTION * min` from every value. No clamping, so
/// values under the floor go slightly negative.
pub fn subtract_baseline(raw: &[f64]) -> Vec<f64> {
    let min = raw.iter().copied().fold(f64::INFINITY, f64::min);
    if !min.is_finite() {
        return raw.to_vec();
    }
    let baseline = BASELINE_FRACTION * min;
    raw.iter().map(|v| v - baseline).collect()
}
