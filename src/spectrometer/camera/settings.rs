//! Camera and session configuration types

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::spectrometer::common::error::{Result, SpectroError};

/// Exposure time in seconds, bounded to what the preview stream can sustain.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Exposure(f64);

impl Exposure {
    pub const MIN_SECONDS: f64 = 0.1;
    pub const MAX_SECONDS: f64 = 5.0;
    pub const DEFAULT_SECONDS: f64 = 0.2;

    pub fn new(seconds: f64) -> Result<Self> {
        if !(Self::MIN_SECONDS..=Self::MAX_SECONDS).contains(&seconds) {
            return Err(SpectroError::invalid_parameter("exposure", seconds));
        }
        Ok(Self(seconds))
    }

    pub fn seconds(self) -> f64 {
        self.0
    }

    /// Frames per second; the shutter can stay open at most one frame period.
    pub fn framerate(self) -> f64 {
        1.0 / self.0
    }

    pub fn shutter_us(self) -> u32 {
        (self.0 * 1_000_000.0).round() as u32
    }
}

impl Default for Exposure {
    fn default() -> Self {
        Self(Self::DEFAULT_SECONDS)
    }
}

impl TryFrom<f64> for Exposure {
    type Error = SpectroError;

    fn try_from(seconds: f64) -> Result<Self> {
        Self::new(seconds)
    }
}

impl From<Exposure> for f64 {
    fn from(exposure: Exposure) -> f64 {
        exposure.0
    }
}

/// Rotation in degrees, normalised into [0, 360).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rotation(f64);

impl Rotation {
    pub fn new(degrees: f64) -> Result<Self> {
        if !degrees.is_finite() {
            return Err(SpectroError::invalid_parameter("rotation", degrees));
        }
        // rem_euclid rounds tiny negative angles up to exactly 360
        let normalised = degrees.rem_euclid(360.0);
        Ok(Self(if normalised >= 360.0 { 0.0 } else { normalised }))
    }

    pub fn degrees(self) -> f64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }
}

impl TryFrom<f64> for Rotation {
    type Error = SpectroError;

    fn try_from(degrees: f64) -> Result<Self> {
        Self::new(degrees)
    }
}

impl From<Rotation> for f64 {
    fn from(rotation: Rotation) -> f64 {
        rotation.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    /// Quarter of the 2592x1944 sensor.
    fn default() -> Self {
        Self::new(648, 486)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Everything a camera driver is told when (re)configured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    pub exposure: Exposure,
    pub rotation: Rotation,
    pub resolution: Resolution,
    pub iso: u32,
    /// Fixed (red, blue) white balance gains; auto white balance stays off.
    pub awb_gains: (f32, f32),
}

impl CameraSettings {
    pub fn framerate(&self) -> f64 {
        self.exposure.framerate()
    }

    pub fn shutter_us(&self) -> u32 {
        self.exposure.shutter_us()
    }
}

/// Tunables of a [`CameraSession`](super::CameraSession).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Bitrate handed to the streaming server
    pub bitrate: u32,
    /// Sensor ISO
    pub iso: u32,
    /// Wait after reconfiguring so exposure and frame rate settle
    pub settle_delay: Duration,
    /// Attempts for a stop/configure/start cycle before giving up
    pub reconfigure_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bitrate: 1_000_000,
            iso: 800,
            settle_delay: Duration::from_millis(500),
            reconfigure_attempts: 2,
        }
    }
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }
}

/// Builder for SessionConfig
#[derive(Default)]
pub struct SessionConfigBuilder {
    bitrate: Option<u32>,
    iso: Option<u32>,
    settle_delay: Option<Duration>,
    reconfigure_attempts: Option<u32>,
}

impl SessionConfigBuilder {
    pub fn bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    pub fn iso(mut self, iso: u32) -> Self {
        self.iso = Some(iso);
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = Some(delay);
        self
    }

    pub fn reconfigure_attempts(mut self, attempts: u32) -> Self {
        self.reconfigure_attempts = Some(attempts);
        self
    }

    pub fn build(self) -> SessionConfig {
        let default = SessionConfig::default();
        SessionConfig {
            bitrate: self.bitrate.unwrap_or(default.bitrate),
            iso: self.iso.unwrap_or(default.iso),
            settle_delay: self.settle_delay.unwrap_or(default.settle_delay),
            reconfigure_attempts: self.reconfigure_attempts.unwrap_or(default.reconfigure_attempts).max(1),
        }
    }
}
