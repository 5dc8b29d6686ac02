//! Global brightness stretch applied to the cropped still before extraction.

use tracing::debug;

use crate::spectrometer::common::error::{Result, SpectroError};
use crate::spectrometer::image::{RgbImageData, CHANNELS};

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    pub image: RgbImageData,
    /// Integer gain applied to every channel of every pixel.
    pub factor: u32,
}

pub struct BrightnessNormalizer;

impl BrightnessNormalizer {
    /// Scales the image by `floor(255 / max)` where `max` is the largest of the
    /// per-channel maxima. One factor for all channels, results clamped to 255.
    pub fn normalize(image: &RgbImageData) -> Result<NormalizedImage> {
        let mut channel_max = [0u8; CHANNELS];
        for px in image.pixels() {
            for (max, &v) in channel_max.iter_mut().zip(px) {
                *max = (*max).max(v);
            }
        }

        let peak = channel_max.iter().copied().max().unwrap_or(0);
        if peak == 0 {
            return Err(SpectroError::InvalidImage(
                "image is completely black, nothing to scale".to_string(),
            ));
        }

        let factor = 255 / peak as u32;
        let data = image
            .data
            .iter()
            .map(|&v| (v as u32 * factor).min(255) as u8)
            .collect();

        debug!(?channel_max, factor, "Brightness normalized");
        Ok(NormalizedImage {
            image: RgbImageData {
                width: image.width,
                height: image.height,
                data,
            },
            factor,
        })
    }
}
