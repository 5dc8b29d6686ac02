//! In-memory RGB images and the geometric operations applied to stills
//! before spectrum extraction.

pub mod types;
mod transform;

pub use types::{CropBox, Rgb, RgbImageData, CHANNELS};
