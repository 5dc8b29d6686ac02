//! Camera coordination module
//!
//! A [`CameraSession`] owns the one physical camera and switches it between
//! live streaming and still capture. [`CameraWorker`] moves a session onto its
//! own thread so every camera call is serialised through one command queue.

mod device;
mod session;
pub mod settings;
mod virtual_devices;
mod worker;

pub use device::{CameraDevice, StreamingServer};
pub use session::{CameraControl, CameraSession, SessionState};
pub use settings::{
    CameraSettings, Exposure, Resolution, Rotation, SessionConfig, SessionConfigBuilder,
};
pub use virtual_devices::{LoopbackStreamer, ReplayCamera, SimulatedCamera, SpectralLine};
pub use worker::{CameraHandle, CameraWorker};
