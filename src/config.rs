//! Configuration file for the spectrometer front end.
//!
//! Every section and field is optional in the JSON file; anything left out
//! takes the default shown below.
//!
//! ```json
//! {
//!   "camera": { "exposure": 0.2, "rotation": 270.0, "settle_delay_ms": 500 },
//!   "calibration": { "wavelength1": 544.0, "wavelength2": 611.0, "pixel1": 180, "pixel2": 420 },
//!   "crop": { "left": 0, "top": 190, "right": 648, "bottom": 290 },
//!   "output": { "root": "docs", "compression": "deflate_balanced" },
//!   "peripherals": { "display": false, "indicator": true, "indicator_color": "#ffffff" },
//!   "logging": { "level": "info" }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::spectrometer::acquisition::AcquisitionParams;
use crate::spectrometer::calibration::{CalibrationAnchors, DEFAULT_WAVELENGTH1, DEFAULT_WAVELENGTH2};
use crate::spectrometer::camera::{Exposure, Resolution, Rotation, SessionConfig};
use crate::spectrometer::common::error::{Result, SpectroError};
use crate::spectrometer::image::{CropBox, Rgb};
use crate::spectrometer::persistence::{ExperimentMetadata, FileResultWriter, TiffCompression};

/// Upper bound for the wait after reconfiguring the camera.
pub const MAX_SETTLE_DELAY_MS: u64 = 10_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrometerConfig {
    pub camera: CameraConfig,
    pub calibration: CalibrationConfig,
    /// Initial crop box; the full frame when absent.
    pub crop: Option<CropBox>,
    pub output: OutputConfig,
    pub peripherals: PeripheralsConfig,
    pub metadata: ExperimentMetadata,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub resolution: Resolution,
    pub iso: u32,
    /// Seconds, 0.1 to 5.0
    pub exposure: Exposure,
    /// Mount rotation in degrees
    pub rotation: Rotation,
    pub bitrate: u32,
    pub settle_delay_ms: u64,
    /// Where the live preview can be watched; informational only.
    pub stream_url: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        Self {
            resolution: Resolution::default(),
            iso: session.iso,
            exposure: Exposure::default(),
            rotation: Rotation::new(270.0).unwrap_or_default(),
            bitrate: session.bitrate,
            settle_delay_ms: session.settle_delay.as_millis() as u64,
            stream_url: "http://localhost:8000/stream.mjpg".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub wavelength1: f64,
    pub wavelength2: f64,
    pub pixel1: i64,
    pub pixel2: i64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        let anchors = CalibrationAnchors::default();
        Self {
            wavelength1: DEFAULT_WAVELENGTH1,
            wavelength2: DEFAULT_WAVELENGTH2,
            pixel1: anchors.pixel1,
            pixel2: anchors.pixel2,
        }
    }
}

impl CalibrationConfig {
    pub fn anchors(&self) -> CalibrationAnchors {
        CalibrationAnchors::new(self.pixel1, self.pixel2, self.wavelength1, self.wavelength2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub root: PathBuf,
    /// Report template; `<root>/template.html` when absent.
    pub template: Option<PathBuf>,
    /// Log index; `<root>/index.html` when absent.
    pub index: Option<PathBuf>,
    pub compression: TiffCompression,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("docs"),
            template: None,
            index: None,
            compression: TiffCompression::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeripheralsConfig {
    pub display: bool,
    pub display_path: PathBuf,
    pub indicator: bool,
    /// `#rrggbb`
    pub indicator_color: String,
}

impl Default for PeripheralsConfig {
    fn default() -> Self {
        Self {
            display: false,
            display_path: PathBuf::from("lcd.tiff"),
            indicator: false,
            indicator_color: "#ffffff".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl SpectrometerConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SpectroError::ConfigError(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| SpectroError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| SpectroError::ConfigError(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.camera.settle_delay_ms > MAX_SETTLE_DELAY_MS {
            return Err(SpectroError::ConfigError(format!(
                "settle_delay_ms must be at most {}",
                MAX_SETTLE_DELAY_MS
            )));
        }
        if self.camera.resolution.width == 0 || self.camera.resolution.height == 0 {
            return Err(SpectroError::ConfigError("camera resolution must not be empty".to_string()));
        }
        self.indicator_color()?;
        Ok(())
    }

    pub fn indicator_color(&self) -> Result<Rgb> {
        Rgb::from_hex(&self.peripherals.indicator_color)
            .map_err(|_| SpectroError::ConfigError(format!("bad indicator colour '{}'", self.peripherals.indicator_color)))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::builder()
            .bitrate(self.camera.bitrate)
            .iso(self.camera.iso)
            .settle_delay(Duration::from_millis(self.camera.settle_delay_ms.min(MAX_SETTLE_DELAY_MS)))
            .build()
    }

    /// Starting parameters for a camera of the given resolution.
    pub fn acquisition_params(&self, resolution: Resolution) -> Result<AcquisitionParams> {
        let mut params = AcquisitionParams::for_resolution(resolution);
        params.exposure = self.camera.exposure;
        params.rotation = self.camera.rotation;
        params.calibration = self.calibration.anchors();
        params.metadata = self.metadata.clone();
        params.light_color = self.indicator_color()?;
        if let Some(crop) = self.crop {
            params.crop = crop;
        }
        Ok(params)
    }

    pub fn result_writer(&self) -> FileResultWriter {
        let mut writer = FileResultWriter::new(&self.output.root).with_compression(self.output.compression);
        if let Some(template) = &self.output.template {
            writer = writer.with_template(template);
        }
        if let Some(index) = &self.output.index {
            writer = writer.with_index(index);
        }
        writer
    }
}
