use crate::spectrometer::common::error::Result;
use crate::spectrometer::image::RgbImageData;
use crate::spectrometer::camera::settings::{CameraSettings, Resolution};

/// Driver boundary for the physical camera.
pub trait CameraDevice: Send {
    fn resolution(&self) -> Resolution;
    fn configure(&mut self, settings: &CameraSettings) -> Result<()>;
    fn capture_still(&mut self) -> Result<RgbImageData>;
    fn close(&mut self) -> Result<()>;
}

/// Live video encoder/server. It borrows the camera for each call and never
/// keeps its own handle. `stop_recording` must tolerate an already stopped stream.
pub trait StreamingServer: Send {
    fn start_recording(&mut self, camera: &mut dyn CameraDevice, bitrate: u32) -> Result<()>;
    fn stop_recording(&mut self, camera: &mut dyn CameraDevice) -> Result<()>;
    fn send_overlay(&mut self, svg: &str) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

impl<T: CameraDevice + ?Sized> CameraDevice for Box<T> {
    fn resolution(&self) -> Resolution {
        (**self).resolution()
    }

    fn configure(&mut self, settings: &CameraSettings) -> Result<()> {
        (**self).configure(settings)
    }

    fn capture_still(&mut self) -> Result<RgbImageData> {
        (**self).capture_still()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<T: StreamingServer + ?Sized> StreamingServer for Box<T> {
    fn start_recording(&mut self, camera: &mut dyn CameraDevice, bitrate: u32) -> Result<()> {
        (**self).start_recording(camera, bitrate)
    }

    fn stop_recording(&mut self, camera: &mut dyn CameraDevice) -> Result<()> {
        (**self).stop_recording(camera)
    }

    fn send_overlay(&mut self, svg: &str) -> Result<()> {
        (**self).send_overlay(svg)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
