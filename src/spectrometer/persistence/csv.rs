//! Two-column CSV form of a spectrum trace.

use std::io::{BufRead, Write};

use crate::spectrometer::common::error::{Result, SpectroError};
use crate::spectrometer::extraction::{SpectrumPoint, SpectrumTrace};

pub const CSV_HEADER: &str = "Wavelength,Intensity";

/// One row per trace point in trace order. Values use the shortest decimal
/// form that parses back to the same `f64`.
pub fn write_trace_csv<W: Write>(trace: &SpectrumTrace, mut output: W) -> Result<()> {
    writeln!(output, "{}", CSV_HEADER)?;
    for point in trace.points() {
        writeln!(output, "{},{}", point.wavelength, point.intensity)?;
    }
    output.flush()?;
    Ok(())
}

pub fn read_trace_csv<R: BufRead>(input: R) -> Result<SpectrumTrace> {
    let mut lines = input.lines();

    let header = lines.next().transpose()?.unwrap_or_default();
    if header.trim() != CSV_HEADER {
        return Err(SpectroError::DecodeError(format!("unexpected CSV header '{}'", header.trim())));
    }

    let mut points = Vec::new();
    for (row, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parse = |field: Option<&str>| {
            field
                .and_then(|f| f.trim().parse::<f64>().ok())
                .ok_or_else(|| SpectroError::DecodeError(format!("bad CSV row {}: '{}'", row + 2, line)))
        };
        let mut cols = line.split(',');
        let wavelength = parse(cols.next())?;
        let intensity = parse(cols.next())?;
        points.push(SpectrumPoint { wavelength, intensity });
    }

    Ok(SpectrumTrace::new(points))
}
