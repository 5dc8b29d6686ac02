//! Image data types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::spectrometer::common::error::{Result, SpectroError};

/// Colour channels per pixel.
pub const CHANNELS: usize = 3;

/// 8-bit RGB image. Operations return new images, the source is never edited.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbImageData {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// RGB pixel data interleaved [R, G, B, R, G, B, ...], row major
    pub data: Vec<u8>,
}

impl RgbImageData {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        let expected = width * height * CHANNELS;
        if data.len() != expected {
            return Err(SpectroError::InvalidImage(format!(
                "{}x{} image needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    pub fn filled(width: usize, height: usize, color: Rgb) -> Self {
        Self::from_fn(width, height, |_, _| color)
    }

    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> Rgb) -> Self {
        let mut data = Vec::with_capacity(width * height * CHANNELS);
        for y in 0..height {
            for x in 0..width {
                let px = f(x, y);
                data.extend_from_slice(&[px.r, px.g, px.b]);
            }
        }
        Self { width, height, data }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        let i = (y * self.width + x) * CHANNELS;
        Rgb::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    pub fn put_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        let i = (y * self.width + x) * CHANNELS;
        self.data[i..i + CHANNELS].copy_from_slice(&[color.r, color.g, color.b]);
    }

    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(CHANNELS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const YELLOW: Rgb = Rgb::new(255, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` (leading `#` optional).
    pub fn from_hex(value: &str) -> Result<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(SpectroError::invalid_parameter("colour", value));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| SpectroError::invalid_parameter("colour", value))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = SpectroError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Crop rectangle in pixel coordinates. `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropBox {
    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width as u32, height as u32)
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Parses four text fields (left, top, right, bottom) as typed by an operator.
    pub fn parse_fields<S: AsRef<str>>(fields: &[S; 4]) -> Result<Self> {
        let mut values = [0u32; 4];
        for (value, field) in values.iter_mut().zip(fields) {
            let text = field.as_ref().trim();
            *value = text
                .parse()
                .map_err(|_| SpectroError::invalid_parameter("crop box", text))?;
        }
        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }

    fn invalid(&self, reason: impl Into<String>) -> SpectroError {
        SpectroError::InvalidCropBox {
            left: self.left,
            top: self.top,
            right: self.right,
            bottom: self.bottom,
            reason: reason.into(),
        }
    }

    pub fn validate(&self, width: usize, height: usize) -> Result<()> {
        if self.left >= self.right {
            return Err(self.invalid("left must be smaller than right"));
        }
        if self.top >= self.bottom {
            return Err(self.invalid("top must be smaller than bottom"));
        }
        if self.right as usize > width || self.bottom as usize > height {
            return Err(self.invalid(format!("box exceeds the {}x{} image", width, height)));
        }
        Ok(())
    }
}
