use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::spectrometer::common::error::{Result, SpectroError};
use crate::spectrometer::image::RgbImageData;

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression
    Lzw,
    /// Deflate compression - fast level
    DeflateFast,
    /// Deflate compression - balanced
    #[default]
    DeflateBalanced,
    /// Deflate compression - best compression (slower)
    DeflateBest,
}

pub fn write_rgb_tiff(image: &RgbImageData, output: &mut dyn Write, compression: TiffCompression) -> Result<()> {
    debug!("Encoding TIFF image: {}x{}", image.width, image.height);

    let mut buffer = Vec::new();

    let compression = match compression {
        TiffCompression::None => tiff::encoder::Compression::Uncompressed,
        TiffCompression::Lzw => tiff::encoder::Compression::Lzw,
        TiffCompression::DeflateFast => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Fast),
        TiffCompression::DeflateBalanced => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Balanced),
        TiffCompression::DeflateBest => tiff::encoder::Compression::Deflate(tiff::encoder::compression::DeflateLevel::Best),
    };

    let mut encoder = tiff::encoder::TiffEncoder::new(std::io::Cursor::new(&mut buffer))
        .map_err(|e| SpectroError::EncodeError(e.to_string()))?
        .with_compression(compression);

    encoder.write_image::<tiff::encoder::colortype::RGB8>(
        image.width as u32,
        image.height as u32,
        &image.data,
    ).map_err(|e| SpectroError::EncodeError(e.to_string()))?;

    output.write_all(&buffer)?;

    debug!("TIFF encoding complete");
    Ok(())
}
