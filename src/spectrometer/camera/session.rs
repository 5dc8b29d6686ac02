use std::fmt;

use tracing::{debug, info, instrument, warn};

use crate::spectrometer::camera::device::{CameraDevice, StreamingServer};
use crate::spectrometer::camera::settings::{CameraSettings, Exposure, Resolution, Rotation, SessionConfig};
use crate::spectrometer::common::error::{Result, SpectroError};
use crate::spectrometer::image::RgbImageData;
use crate::spectrometer::overlay::{status_text, OverlayDescription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Streaming,
    CapturingStill,
    /// Terminal: the camera and the streaming server have been released.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Idle => "idle",
            SessionState::Streaming => "streaming",
            SessionState::CapturingStill => "capturing a still",
            SessionState::Closed => "closed",
        })
    }
}

/// Camera operations the acquisition workflow relies on. Implemented by the
/// session itself and by the worker handle that forwards to it.
pub trait CameraControl {
    fn start_streaming(&mut self, exposure: Exposure, rotation: Rotation) -> Result<()>;
    fn update_parameters(&mut self, exposure: Exposure, rotation: Rotation) -> Result<()>;
    fn capture_still(&mut self) -> Result<RgbImageData>;
    fn render_overlay(&mut self, overlay: &OverlayDescription) -> Result<()>;
    fn state(&self) -> SessionState;
    fn resolution(&self) -> Resolution;
    fn close(&mut self) -> Result<()>;
}

fn camera_failure(err: SpectroError) -> SpectroError {
    match err {
        SpectroError::CameraFailure(_) => err,
        other => SpectroError::CameraFailure(other.to_string()),
    }
}

/// Sole owner of the camera and its streaming server.
///
/// Streaming and still capture never overlap: a still stops the stream,
/// captures, and restarts the stream with the same settings before returning.
pub struct CameraSession<C: CameraDevice, S: StreamingServer> {
    camera: C,
    server: S,
    config: SessionConfig,
    state: SessionState,
    settings: Option<CameraSettings>,
    overlay: Option<OverlayDescription>,
}

impl<C: CameraDevice, S: StreamingServer> CameraSession<C, S> {
    pub fn new(camera: C, server: S, config: SessionConfig) -> Self {
        info!(resolution = %camera.resolution(), bitrate = config.bitrate, "Camera session created");
        Self {
            camera,
            server,
            config,
            state: SessionState::Idle,
            settings: None,
            overlay: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Settings the stream is currently running with.
    pub fn settings(&self) -> Option<&CameraSettings> {
        self.settings.as_ref()
    }

    pub fn overlay(&self) -> Option<&OverlayDescription> {
        self.overlay.as_ref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn require(&self, operation: &'static str, allowed: &[SessionState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SpectroError::InvalidState { operation, state: self.state })
        }
    }

    fn settings_for(&self, exposure: Exposure, rotation: Rotation) -> CameraSettings {
        CameraSettings {
            exposure,
            rotation,
            resolution: self.camera.resolution(),
            iso: self.config.iso,
            awb_gains: (1.0, 1.0),
        }
    }

    fn settle(&self) {
        if !self.config.settle_delay.is_zero() {
            std::thread::sleep(self.config.settle_delay);
        }
    }

    fn begin_stream(&mut self, settings: &CameraSettings) -> Result<()> {
        self.camera.configure(settings)?;
        self.settle();
        self.server.start_recording(&mut self.camera, self.config.bitrate)
    }

    fn restart_stream(&mut self, settings: &CameraSettings) -> Result<()> {
        self.server.stop_recording(&mut self.camera)?;
        self.begin_stream(settings)
    }

    /// Best-effort stop after a failed hardware step; the session ends up Idle.
    fn rollback_to_idle(&mut self, cause: SpectroError) -> SpectroError {
        warn!("Camera step failed, falling back to idle: {}", cause);
        if let Err(e) = self.server.stop_recording(&mut self.camera) {
            warn!("Stopping the stream during rollback failed: {}", e);
        }
        self.state = SessionState::Idle;
        self.settings = None;
        camera_failure(cause)
    }

    /// Re-sends the current overlay with a status line for the active settings.
    fn refresh_status_overlay(&mut self) -> Result<()> {
        let Some(settings) = self.settings else {
            return Ok(());
        };
        let overlay = self
            .overlay
            .take()
            .unwrap_or_else(|| OverlayDescription::empty(settings.resolution))
            .with_status(status_text(settings.exposure));
        let sent = self.server.send_overlay(&overlay.to_svg());
        self.overlay = Some(overlay);
        sent.map_err(camera_failure)
    }

    #[instrument(skip(self))]
    pub fn start_streaming(&mut self, exposure: Exposure, rotation: Rotation) -> Result<()> {
        self.require("start_streaming", &[SessionState::Idle, SessionState::Streaming])?;

        let settings = self.settings_for(exposure, rotation);
        if self.state == SessionState::Streaming {
            if self.settings == Some(settings) {
                debug!("Already streaming with these settings");
                return Ok(());
            }
            return self.update_parameters(exposure, rotation);
        }

        if let Err(e) = self.begin_stream(&settings) {
            return Err(self.rollback_to_idle(e));
        }
        self.state = SessionState::Streaming;
        self.settings = Some(settings);
        info!(
            framerate = settings.framerate(),
            shutter_us = settings.shutter_us(),
            "Streaming started"
        );
        // the stream is already running; a lost overlay is not a failed start
        if let Err(e) = self.refresh_status_overlay() {
            warn!("Status overlay not sent: {}", e);
        }
        Ok(())
    }

    /// Applies new exposure/rotation to the running stream. A failed
    /// stop/configure/start cycle is retried before the session gives up.
    #[instrument(skip(self))]
    pub fn update_parameters(&mut self, exposure: Exposure, rotation: Rotation) -> Result<()> {
        self.require("update_parameters", &[SessionState::Streaming])?;

        let settings = self.settings_for(exposure, rotation);
        if self.settings == Some(settings) {
            return Ok(());
        }

        let mut attempt = 1;
        loop {
            match self.restart_stream(&settings) {
                Ok(()) => break,
                Err(e) if attempt < self.config.reconfigure_attempts => {
                    warn!(attempt, "Reconfiguring the camera failed, retrying: {}", e);
                    attempt += 1;
                }
                Err(e) => return Err(self.rollback_to_idle(e)),
            }
        }

        self.settings = Some(settings);
        info!(framerate = settings.framerate(), shutter_us = settings.shutter_us(), "Camera reconfigured");
        self.refresh_status_overlay()
    }

    #[instrument(skip(self))]
    pub fn capture_still(&mut self) -> Result<RgbImageData> {
        self.require("capture_still", &[SessionState::Streaming])?;
        let Some(settings) = self.settings else {
            return Err(SpectroError::InvalidState { operation: "capture_still", state: self.state });
        };

        self.state = SessionState::CapturingStill;
        if let Err(e) = self.server.stop_recording(&mut self.camera) {
            // stream is presumably still running
            self.state = SessionState::Streaming;
            return Err(camera_failure(e));
        }

        let still = self.camera.capture_still();

        if let Err(e) = self.begin_stream(&settings) {
            return Err(self.rollback_to_idle(e));
        }
        self.state = SessionState::Streaming;

        let still = still.map_err(camera_failure)?;
        info!(width = still.width, height = still.height, "Still captured, streaming resumed");
        Ok(still)
    }

    pub fn render_overlay(&mut self, overlay: &OverlayDescription) -> Result<()> {
        self.require("render_overlay", &[SessionState::Streaming])?;
        self.server.send_overlay(&overlay.to_svg()).map_err(camera_failure)?;
        self.overlay = Some(overlay.clone());
        Ok(())
    }

    /// Releases the stream and the camera. Valid from any state; later
    /// operations fail with `InvalidState`.
    pub fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }

        let mut first_error = None;
        if self.state == SessionState::Streaming {
            if let Err(e) = self.server.stop_recording(&mut self.camera) {
                first_error.get_or_insert(e);
            }
        }
        if let Err(e) = self.server.close() {
            first_error.get_or_insert(e);
        }
        if let Err(e) = self.camera.close() {
            first_error.get_or_insert(e);
        }

        self.state = SessionState::Closed;
        self.settings = None;
        info!("Camera session closed");

        match first_error {
            Some(e) => Err(camera_failure(e)),
            None => Ok(()),
        }
    }
}

impl<C: CameraDevice, S: StreamingServer> Drop for CameraSession<C, S> {
    fn drop(&mut self) {
        if self.state != SessionState::Closed {
            warn!("Camera session dropped without close(), releasing the camera now");
            if let Err(e) = self.close() {
                warn!("Closing camera session on drop failed: {}", e);
            }
        }
    }
}

impl<C: CameraDevice, S: StreamingServer> CameraControl for CameraSession<C, S> {
    fn start_streaming(&mut self, exposure: Exposure, rotation: Rotation) -> Result<()> {
        CameraSession::start_streaming(self, exposure, rotation)
    }

    fn update_parameters(&mut self, exposure: Exposure, rotation: Rotation) -> Result<()> {
        CameraSession::update_parameters(self, exposure, rotation)
    }

    fn capture_still(&mut self) -> Result<RgbImageData> {
        CameraSession::capture_still(self)
    }

    fn render_overlay(&mut self, overlay: &OverlayDescription) -> Result<()> {
        CameraSession::render_overlay(self, overlay)
    }

    fn state(&self) -> SessionState {
        self.state
    }

    fn resolution(&self) -> Resolution {
        self.camera.resolution()
    }

    fn close(&mut self) -> Result<()> {
        CameraSession::close(self)
    }
}
