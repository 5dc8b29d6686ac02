//! Vector overlay drawn over the live preview: crop box, the two calibration
//! lines and a status line. Rendering is a pure function of the parameters.

use std::fmt::Write;

use crate::spectrometer::camera::{Exposure, Resolution};
use crate::spectrometer::common::escape_markup;
use crate::spectrometer::common::error::{Result, SpectroError};
use crate::spectrometer::image::{CropBox, Rgb, RgbImageData};

pub const OVERLAY_TITLE: &str = "LEGO Spectrometer";

const CROP_COLOR: Rgb = Rgb::YELLOW;
const CROP_STROKE: u32 = 2;
const LINE1_COLOR: Rgb = Rgb::GREEN;
const LINE2_COLOR: Rgb = Rgb::RED;
const LINE_STROKE: u32 = 5;
const STATUS_COLOR: Rgb = Rgb::YELLOW;
const STATUS_X: u32 = 10;
const STATUS_Y: u32 = 25;
const STATUS_FONT_SIZE: u32 = 18;

pub fn status_text(exposure: Exposure) -> String {
    format!(
        "{} - Exposure {:.1} sec - Framerate {:.2} fps",
        OVERLAY_TITLE,
        exposure.seconds(),
        exposure.framerate()
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayShape {
    Rectangle { crop: CropBox, color: Rgb, stroke: u32 },
    VerticalLine { x: i64, color: Rgb, stroke: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayDescription {
    pub width: u32,
    pub height: u32,
    pub shapes: Vec<OverlayShape>,
    pub status: Option<String>,
}

impl OverlayDescription {
    pub fn empty(resolution: Resolution) -> Self {
        Self {
            width: resolution.width,
            height: resolution.height,
            shapes: Vec::new(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn to_svg(&self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        for shape in &self.shapes {
            // writing into a String cannot fail
            let _ = match *shape {
                OverlayShape::Rectangle { crop, color, stroke } => write!(
                    svg,
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
                    crop.left,
                    crop.top,
                    crop.width(),
                    crop.height(),
                    color,
                    stroke
                ),
                OverlayShape::VerticalLine { x, color, stroke } => write!(
                    svg,
                    r#"<line x1="{x}" y1="0" x2="{x}" y2="{}" stroke="{}" stroke-width="{}"/>"#,
                    self.height,
                    color,
                    stroke
                ),
            };
        }
        if let Some(status) = &self.status {
            let _ = write!(
                svg,
                r#"<text x="{}" y="{}" fill="{}" font-size="{}">{}</text>"#,
                STATUS_X,
                STATUS_Y,
                STATUS_COLOR,
                STATUS_FONT_SIZE,
                escape_markup(status)
            );
        }
        svg.push_str("</svg>");
        svg
    }

    /// Burns the shapes (not the status text) into a copy of `image`.
    pub fn draw_onto(&self, image: &RgbImageData) -> RgbImageData {
        let mut out = image.clone();
        let (w, h) = (out.width as i64, out.height as i64);
        let mut fill = |x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb| {
            for y in y0.max(0)..y1.min(h) {
                for x in x0.max(0)..x1.min(w) {
                    out.put_pixel(x as usize, y as usize, color);
                }
            }
        };

        for shape in &self.shapes {
            match *shape {
                OverlayShape::Rectangle { crop, color, stroke } => {
                    let (l, t, r, b) = (crop.left as i64, crop.top as i64, crop.right as i64, crop.bottom as i64);
                    let s = stroke as i64;
                    fill(l, t, r, t + s, color);
                    fill(l, b - s, r, b, color);
                    fill(l, t, l + s, b, color);
                    fill(r - s, t, r, b, color);
                }
                OverlayShape::VerticalLine { x, color, stroke } => {
                    let half = stroke as i64 / 2;
                    fill(x - half, 0, x - half + stroke as i64, h, color);
                }
            }
        }
        out
    }
}

/// Snapshot of the parameters that the overlay reflects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayParams {
    pub crop: Option<CropBox>,
    pub pixel1: Option<i64>,
    pub pixel2: Option<i64>,
    pub status: Option<String>,
}

/// Raw text of the crop and calibration inputs, possibly half typed.
#[derive(Debug, Clone, Default)]
pub struct OverlayFields {
    pub crop: [String; 4],
    pub pixel1: String,
    pub pixel2: String,
}

impl OverlayFields {
    pub fn parse(&self) -> Result<OverlayParams> {
        let crop = CropBox::parse_fields(&self.crop)?;
        let pixel = |field: &str| {
            field
                .trim()
                .parse::<i64>()
                .map_err(|_| SpectroError::invalid_parameter("calibration line", field))
        };
        Ok(OverlayParams {
            crop: Some(crop),
            pixel1: Some(pixel(&self.pixel1)?),
            pixel2: Some(pixel(&self.pixel2)?),
            status: None,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OverlayRenderer {
    resolution: Resolution,
}

impl OverlayRenderer {
    pub fn new(resolution: Resolution) -> Self {
        Self { resolution }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn render(&self, params: &OverlayParams) -> OverlayDescription {
        let mut overlay = OverlayDescription::empty(self.resolution);
        if let Some(crop) = params.crop {
            overlay.shapes.push(OverlayShape::Rectangle { crop, color: CROP_COLOR, stroke: CROP_STROKE });
        }
        if let Some(x) = params.pixel1 {
            overlay.shapes.push(OverlayShape::VerticalLine { x, color: LINE1_COLOR, stroke: LINE_STROKE });
        }
        if let Some(x) = params.pixel2 {
            overlay.shapes.push(OverlayShape::VerticalLine { x, color: LINE2_COLOR, stroke: LINE_STROKE });
        }
        overlay.status = params.status.clone();
        overlay
    }

    /// `None` while any field does not parse; the caller keeps the previous overlay.
    pub fn render_fields(&self, fields: &OverlayFields, status: Option<String>) -> Option<OverlayDescription> {
        match fields.parse() {
            Ok(params) => Some(self.render(&OverlayParams { status, ..params })),
            Err(e) => {
                tracing::debug!("Overlay not updated: {}", e);
                None
            }
        }
    }
}
