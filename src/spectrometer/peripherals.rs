//! Optional peripherals: an addressable light that illuminates the sample and
//! a small preview display. Both are chosen at construction time from
//! configuration flags; when disabled the no-op variants are used and the
//! pipeline runs unchanged.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::spectrometer::common::error::Result;
use crate::spectrometer::image::{Rgb, RgbImageData};
use crate::spectrometer::persistence::{write_rgb_tiff, TiffCompression};

pub trait Indicator: Send {
    fn set_color(&mut self, color: Rgb) -> Result<()>;

    fn off(&mut self) -> Result<()> {
        self.set_color(Rgb::BLACK)
    }

    fn is_present(&self) -> bool {
        true
    }
}

pub trait PreviewDisplay: Send {
    fn show(&mut self, image: &RgbImageData) -> Result<()>;

    fn is_present(&self) -> bool {
        true
    }
}

pub struct NoIndicator;

impl Indicator for NoIndicator {
    fn set_color(&mut self, _color: Rgb) -> Result<()> {
        Ok(())
    }

    fn is_present(&self) -> bool {
        false
    }
}

pub struct NoDisplay;

impl PreviewDisplay for NoDisplay {
    fn show(&mut self, _image: &RgbImageData) -> Result<()> {
        Ok(())
    }

    fn is_present(&self) -> bool {
        false
    }
}

/// Indicator that only reports colour changes through the log.
#[derive(Debug, Default)]
pub struct LogIndicator {
    color: Rgb,
}

impl LogIndicator {
    pub fn color(&self) -> Rgb {
        self.color
    }
}

impl Indicator for LogIndicator {
    fn set_color(&mut self, color: Rgb) -> Result<()> {
        if color != self.color {
            info!(color = %color, "Light source colour");
        }
        self.color = color;
        Ok(())
    }
}

/// Preview display backed by a TIFF file, resized to the panel resolution.
pub struct FileDisplay {
    path: PathBuf,
    width: usize,
    height: usize,
}

impl FileDisplay {
    /// ST7735 panel size.
    pub const DEFAULT_SIZE: (usize, usize) = (160, 80);

    pub fn new(path: impl Into<PathBuf>, width: usize, height: usize) -> Self {
        Self { path: path.into(), width, height }
    }
}

impl PreviewDisplay for FileDisplay {
    fn show(&mut self, image: &RgbImageData) -> Result<()> {
        let frame = image.resize_nearest(self.width, self.height);
        let mut file = std::fs::File::create(&self.path)?;
        write_rgb_tiff(&frame, &mut file, TiffCompression::None)?;
        debug!(path = %self.path.display(), "Preview display updated");
        Ok(())
    }
}

pub fn indicator_for(enabled: bool) -> Box<dyn Indicator> {
    if enabled {
        Box::new(LogIndicator::default())
    } else {
        Box::new(NoIndicator)
    }
}

pub fn display_for(enabled: bool, path: impl Into<PathBuf>) -> Box<dyn PreviewDisplay> {
    if enabled {
        let (width, height) = FileDisplay::DEFAULT_SIZE;
        Box::new(FileDisplay::new(path, width, height))
    } else {
        Box::new(NoDisplay)
    }
}
