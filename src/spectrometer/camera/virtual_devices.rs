//! Stand-in devices for running the spectrometer without camera hardware.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::spectrometer::camera::device::{CameraDevice, StreamingServer};
use crate::spectrometer::camera::settings::{CameraSettings, Exposure, Resolution, Rotation};
use crate::spectrometer::common::error::{Result, SpectroError};
use crate::spectrometer::image::{Rgb, RgbImageData};

/// Gaussian emission line in the synthetic scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralLine {
    /// Horizontal position as a fraction of the image width
    pub position: f64,
    /// Peak brightness (0-255) at the default exposure
    pub amplitude: f64,
    /// Standard deviation in pixels
    pub sigma: f64,
}

/// Renders a horizontal band with a few emission lines, brighter with longer
/// exposures. The scene is drawn upright and then turned by the difference
/// between the requested rotation and the mount rotation.
pub struct SimulatedCamera {
    resolution: Resolution,
    mount_rotation: Rotation,
    lines: Vec<SpectralLine>,
    settings: Option<CameraSettings>,
    closed: bool,
}

impl SimulatedCamera {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            mount_rotation: Rotation::default(),
            // roughly a fluorescent tube: Hg 436/546, Eu 611
            lines: vec![
                SpectralLine { position: 0.18, amplitude: 90.0, sigma: 3.0 },
                SpectralLine { position: 0.47, amplitude: 150.0, sigma: 2.5 },
                SpectralLine { position: 0.71, amplitude: 120.0, sigma: 3.5 },
            ],
            settings: None,
            closed: false,
        }
    }

    pub fn with_mount_rotation(mut self, rotation: Rotation) -> Self {
        self.mount_rotation = rotation;
        self
    }

    pub fn with_lines(mut self, lines: Vec<SpectralLine>) -> Self {
        self.lines = lines;
        self
    }

    fn render(&self, settings: &CameraSettings) -> RgbImageData {
        let width = self.resolution.width as usize;
        let height = self.resolution.height as usize;
        let gain = settings.exposure.seconds() / Exposure::DEFAULT_SECONDS;
        let band = (height * 2 / 5)..(height * 3 / 5);

        let column_level: Vec<f64> = (0..width)
            .map(|x| {
                let lines: f64 = self
                    .lines
                    .iter()
                    .map(|l| {
                        let d = x as f64 - l.position * width as f64;
                        l.amplitude * (-d * d / (2.0 * l.sigma * l.sigma)).exp()
                    })
                    .sum();
                ((12.0 + lines) * gain).clamp(0.0, 255.0)
            })
            .collect();

        let scene = RgbImageData::from_fn(width, height, |x, y| {
            if !band.contains(&y) {
                return Rgb::new(3, 3, 3);
            }
            let v = column_level[x];
            let f = x as f64 / width.max(1) as f64;
            let tint = |w: f64| (v * w).round().clamp(0.0, 255.0) as u8;
            Rgb::new(tint(f), tint(1.0 - (2.0 * f - 1.0).abs()), tint(1.0 - f))
        });

        let turn = settings.rotation.degrees() - self.mount_rotation.degrees();
        scene.rotate(turn)
    }
}

impl CameraDevice for SimulatedCamera {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn configure(&mut self, settings: &CameraSettings) -> Result<()> {
        if self.closed {
            return Err(SpectroError::CameraFailure("simulated camera is closed".to_string()));
        }
        debug!(shutter_us = settings.shutter_us(), framerate = settings.framerate(), "Simulated camera configured");
        self.settings = Some(*settings);
        Ok(())
    }

    fn capture_still(&mut self) -> Result<RgbImageData> {
        match (&self.settings, self.closed) {
            (_, true) => Err(SpectroError::CameraFailure("simulated camera is closed".to_string())),
            (None, _) => Err(SpectroError::CameraFailure("simulated camera not configured".to_string())),
            (Some(settings), false) => Ok(self.render(settings)),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Serves a previously recorded still. The file is expected to be in display
/// orientation already, so rotation settings are not re-applied.
pub struct ReplayCamera {
    frame: RgbImageData,
    closed: bool,
}

impl ReplayCamera {
    pub fn new(frame: RgbImageData) -> Self {
        Self { frame, closed: false }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let decoded = image::open(path)
            .map_err(|e| SpectroError::DecodeError(format!("{}: {}", path.display(), e)))?
            .to_rgb8();
        let (width, height) = (decoded.width() as usize, decoded.height() as usize);
        info!(path = %path.display(), width, height, "Loaded replay still");
        Ok(Self::new(RgbImageData::new(width, height, decoded.into_raw())?))
    }
}

impl CameraDevice for ReplayCamera {
    fn resolution(&self) -> Resolution {
        Resolution::new(self.frame.width as u32, self.frame.height as u32)
    }

    fn configure(&mut self, _settings: &CameraSettings) -> Result<()> {
        Ok(())
    }

    fn capture_still(&mut self) -> Result<RgbImageData> {
        if self.closed {
            return Err(SpectroError::CameraFailure("replay camera is closed".to_string()));
        }
        Ok(self.frame.clone())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Streaming server that encodes nothing. It tracks the recording state and
/// optionally mirrors each overlay into an SVG file a browser can poll.
#[derive(Debug, Default)]
pub struct LoopbackStreamer {
    recording: bool,
    overlay_path: Option<PathBuf>,
    last_overlay: Option<String>,
    overlays_sent: usize,
    closed: bool,
}

impl LoopbackStreamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overlay_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.overlay_path = Some(path.into());
        self
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn last_overlay(&self) -> Option<&str> {
        self.last_overlay.as_deref()
    }

    pub fn overlays_sent(&self) -> usize {
        self.overlays_sent
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(SpectroError::CameraFailure("streaming server is closed".to_string()));
        }
        Ok(())
    }
}

impl StreamingServer for LoopbackStreamer {
    fn start_recording(&mut self, camera: &mut dyn CameraDevice, bitrate: u32) -> Result<()> {
        self.ensure_open()?;
        info!(resolution = %camera.resolution(), bitrate, "Preview stream recording");
        self.recording = true;
        Ok(())
    }

    fn stop_recording(&mut self, _camera: &mut dyn CameraDevice) -> Result<()> {
        if self.recording {
            debug!("Preview stream stopped");
        }
        self.recording = false;
        Ok(())
    }

    fn send_overlay(&mut self, svg: &str) -> Result<()> {
        self.ensure_open()?;
        if let Some(path) = &self.overlay_path {
            std::fs::write(path, svg)?;
        }
        self.last_overlay = Some(svg.to_string());
        self.overlays_sent += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.recording = false;
        self.closed = true;
        Ok(())
    }
}
