//! Persistence module
//!
//! Writes a finished measurement to disk: TIFF images, the CSV trace, an SVG
//! plot, a per-experiment HTML report and the running log index.

mod writer;
mod tiff_writer;
pub mod csv;
pub mod report;
mod plot;
mod file_writer;

pub use writer::{MeasurementRecord, ResultWriter};
pub use tiff_writer::{write_rgb_tiff, TiffCompression};
pub use csv::{read_trace_csv, write_trace_csv};
pub use report::{ExperimentMetadata, LogEntry};
pub use plot::render_spectrum_svg;
pub use file_writer::{FileResultWriter, OutputPaths};
