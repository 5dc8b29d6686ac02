use tracing::debug;

use crate::spectrometer::common::error::Result;
use crate::spectrometer::image::types::{CropBox, Rgb, RgbImageData, CHANNELS};

impl RgbImageData {
    /// Copies the region inside `crop` into a new image. Boxes that are
    /// inverted or reach past the image are rejected, never clamped.
    pub fn crop(&self, crop: &CropBox) -> Result<RgbImageData> {
        crop.validate(self.width, self.height)?;

        let (left, top) = (crop.left as usize, crop.top as usize);
        let (width, height) = (crop.width() as usize, crop.height() as usize);
        let row_bytes = width * CHANNELS;

        let mut data = Vec::with_capacity(row_bytes * height);
        for y in top..top + height {
            let start = (y * self.width + left) * CHANNELS;
            data.extend_from_slice(&self.data[start..start + row_bytes]);
        }

        debug!(?crop, width, height, "Cropped image");
        Ok(RgbImageData { width, height, data })
    }

    /// Rotates counter-clockwise by `degrees` about the image centre, keeping
    /// the canvas size. Nearest-neighbour sampling; uncovered pixels are black.
    pub fn rotate(&self, degrees: f64) -> RgbImageData {
        if degrees.rem_euclid(360.0) == 0.0 || self.is_empty() {
            return self.clone();
        }

        let (sin, cos) = degrees.to_radians().sin_cos();
        let cx = self.width as f64 / 2.0;
        let cy = self.height as f64 / 2.0;

        RgbImageData::from_fn(self.width, self.height, |x, y| {
            let ox = x as f64 + 0.5 - cx;
            let oy = y as f64 + 0.5 - cy;
            let sx = (cx + ox * cos - oy * sin).floor();
            let sy = (cy + ox * sin + oy * cos).floor();
            if sx < 0.0 || sy < 0.0 || sx >= self.width as f64 || sy >= self.height as f64 {
                Rgb::BLACK
            } else {
                self.pixel(sx as usize, sy as usize)
            }
        })
    }

    pub fn resize_nearest(&self, width: usize, height: usize) -> RgbImageData {
        if self.is_empty() {
            return RgbImageData::filled(width, height, Rgb::BLACK);
        }
        RgbImageData::from_fn(width, height, |x, y| {
            self.pixel(x * self.width / width, y * self.height / height)
        })
    }
}
