use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::spectrometer::camera::device::{CameraDevice, StreamingServer};
use crate::spectrometer::camera::session::{CameraControl, CameraSession, SessionState};
use crate::spectrometer::camera::settings::{Exposure, Resolution, Rotation};
use crate::spectrometer::common::error::{Result, SpectroError};
use crate::spectrometer::image::RgbImageData;
use crate::spectrometer::overlay::OverlayDescription;

enum Command {
    StartStreaming {
        exposure: Exposure,
        rotation: Rotation,
        reply: Sender<Result<()>>,
    },
    UpdateParameters {
        exposure: Exposure,
        rotation: Rotation,
        reply: Sender<Result<()>>,
    },
    CaptureStill {
        reply: Sender<Result<RgbImageData>>,
    },
    RenderOverlay {
        overlay: OverlayDescription,
        reply: Sender<Result<()>>,
    },
    State {
        reply: Sender<SessionState>,
    },
    Close {
        reply: Sender<Result<()>>,
    },
}

/// Runs a [`CameraSession`] on a dedicated thread. Commands are handled one
/// at a time in arrival order, so a parameter update can never interleave
/// with a still capture.
pub struct CameraWorker;

impl CameraWorker {
    pub fn spawn<C, S>(session: CameraSession<C, S>) -> Result<CameraHandle>
    where
        C: CameraDevice + 'static,
        S: StreamingServer + 'static,
    {
        let resolution = CameraControl::resolution(&session);
        let (tx, rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("camera-session".to_string())
            .spawn(move || run(session, rx))
            .map_err(|e| SpectroError::CameraFailure(format!("cannot start camera worker: {}", e)))?;

        Ok(CameraHandle {
            tx: Some(tx),
            thread: Some(thread),
            resolution,
        })
    }
}

fn run<C: CameraDevice, S: StreamingServer>(mut session: CameraSession<C, S>, rx: Receiver<Command>) {
    debug!("Camera worker running");
    // A dropped reply receiver only means the caller went away.
    while let Ok(command) = rx.recv() {
        match command {
            Command::StartStreaming { exposure, rotation, reply } => {
                let _ = reply.send(session.start_streaming(exposure, rotation));
            }
            Command::UpdateParameters { exposure, rotation, reply } => {
                let _ = reply.send(session.update_parameters(exposure, rotation));
            }
            Command::CaptureStill { reply } => {
                let _ = reply.send(session.capture_still());
            }
            Command::RenderOverlay { overlay, reply } => {
                let _ = reply.send(session.render_overlay(&overlay));
            }
            Command::State { reply } => {
                let _ = reply.send(session.state());
            }
            Command::Close { reply } => {
                let _ = reply.send(session.close());
                debug!("Camera worker stopped");
                return;
            }
        }
    }

    if let Err(e) = session.close() {
        warn!("Closing camera session after all handles dropped failed: {}", e);
    }
}

/// Client side of a [`CameraWorker`].
pub struct CameraHandle {
    tx: Option<Sender<Command>>,
    thread: Option<JoinHandle<()>>,
    resolution: Resolution,
}

impl CameraHandle {
    fn request<T>(&self, operation: &'static str, command: impl FnOnce(Sender<T>) -> Command) -> Result<T> {
        let tx = self.tx.as_ref().ok_or(SpectroError::InvalidState {
            operation,
            state: SessionState::Closed,
        })?;
        let (reply_tx, reply_rx) = mpsc::channel();
        tx.send(command(reply_tx))
            .map_err(|_| SpectroError::CameraFailure("camera worker is not running".to_string()))?;
        reply_rx
            .recv()
            .map_err(|_| SpectroError::CameraFailure("camera worker stopped before replying".to_string()))
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Camera worker thread panicked");
            }
        }
    }
}

impl CameraControl for CameraHandle {
    fn start_streaming(&mut self, exposure: Exposure, rotation: Rotation) -> Result<()> {
        self.request("start_streaming", |reply| Command::StartStreaming { exposure, rotation, reply })?
    }

    fn update_parameters(&mut self, exposure: Exposure, rotation: Rotation) -> Result<()> {
        self.request("update_parameters", |reply| Command::UpdateParameters { exposure, rotation, reply })?
    }

    fn capture_still(&mut self) -> Result<RgbImageData> {
        self.request("capture_still", |reply| Command::CaptureStill { reply })?
    }

    fn render_overlay(&mut self, overlay: &OverlayDescription) -> Result<()> {
        let overlay = overlay.clone();
        self.request("render_overlay", |reply| Command::RenderOverlay { overlay, reply })?
    }

    fn state(&self) -> SessionState {
        self.request("state", |reply| Command::State { reply })
            .unwrap_or(SessionState::Closed)
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn close(&mut self) -> Result<()> {
        if self.tx.is_none() {
            return Ok(());
        }
        let result = self.request("close", |reply| Command::Close { reply });
        self.tx = None;
        self.join();
        result?
    }
}

impl Drop for CameraHandle {
    fn drop(&mut self) {
        if let Err(e) = CameraControl::close(self) {
            warn!("Closing camera worker on drop failed: {}", e);
        }
    }
}
