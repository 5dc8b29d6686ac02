use std::fmt::Write;

use crate::spectrometer::extraction::SpectrumTrace;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 600.0;
const MARGIN: f64 = 60.0;

fn range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        (0.0, 1.0)
    } else if lo == hi {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

/// Line plot of intensity against wavelength, as a standalone SVG document.
pub fn render_spectrum_svg(trace: &SpectrumTrace) -> String {
    let (x_min, x_max) = range(trace.points().iter().map(|p| p.wavelength));
    let (y_min, y_max) = range(trace.points().iter().map(|p| p.intensity));
    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    let sx = |x: f64| MARGIN + (x - x_min) / (x_max - x_min) * plot_w;
    let sy = |y: f64| HEIGHT - MARGIN - (y - y_min) / (y_max - y_min) * plot_h;

    let points = trace
        .points()
        .iter()
        .map(|p| format!("{:.2},{:.2}", sx(p.wavelength), sy(p.intensity)))
        .collect::<Vec<_>>()
        .join(" ");

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
    );
    let _ = write!(
        svg,
        r#"<rect x="{m}" y="{m}" width="{plot_w}" height="{plot_h}" fill="white" stroke="black"/>"#,
        m = MARGIN
    );
    let _ = write!(svg, r#"<polyline points="{}" fill="none" stroke="blue" stroke-width="1.5"/>"#, points);
    let bottom = HEIGHT - MARGIN + 20.0;
    let _ = write!(svg, r#"<text x="{}" y="{}" font-size="12">{:.1}</text>"#, MARGIN, bottom, x_min);
    let _ = write!(
        svg,
        r#"<text x="{}" y="{}" font-size="12" text-anchor="end">{:.1}</text>"#,
        WIDTH - MARGIN,
        bottom,
        x_max
    );
    let _ = write!(
        svg,
        r#"<text x="{}" y="{}" font-size="14" text-anchor="middle">Wavelength (nm)</text>"#,
        WIDTH / 2.0,
        HEIGHT - 15.0
    );
    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_spans_the_frame() {
        let trace = SpectrumTrace::from_columns(&[500.0, 550.0, 600.0], &[0.0, 10.0, 5.0]);
        let svg = render_spectrum_svg(&trace);
        assert!(svg.contains(r#"points="60.00,540.00 400.00,60.00 740.00,300.00""#));
        assert!(svg.contains("Wavelength (nm)"));
    }

    #[test]
    fn test_flat_and_empty_traces_render() {
        let flat = SpectrumTrace::from_columns(&[500.0, 600.0], &[3.0, 3.0]);
        assert!(!render_spectrum_svg(&flat).contains("NaN"));
        assert!(render_spectrum_svg(&SpectrumTrace::default()).ends_with("</svg>"));
    }
}
