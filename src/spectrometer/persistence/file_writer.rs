use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::spectrometer::common::error::Result;
use crate::spectrometer::image::RgbImageData;
use crate::spectrometer::persistence::csv::write_trace_csv;
use crate::spectrometer::persistence::plot::render_spectrum_svg;
use crate::spectrometer::persistence::report::{
    fill_template, insert_log_entry, report_values, LogEntry, DEFAULT_INDEX, DEFAULT_TEMPLATE,
};
use crate::spectrometer::persistence::tiff_writer::{write_rgb_tiff, TiffCompression};
use crate::spectrometer::persistence::writer::{MeasurementRecord, ResultWriter};

/// Files written for one measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub raw_image: PathBuf,
    pub processed_image: PathBuf,
    pub plot: PathBuf,
    pub csv: PathBuf,
    pub report: PathBuf,
}

/// Writes measurements below one output root:
///
/// ```text
/// <root>/images/raw-<stamp>.tiff
/// <root>/images/processed-<stamp>.tiff
/// <root>/images/spectrum-<stamp>.svg
/// <root>/data/spectrum-<stamp>.csv
/// <root>/experiment-<stamp>.html
/// <root>/index.html
/// ```
pub struct FileResultWriter {
    root: PathBuf,
    template: PathBuf,
    index: PathBuf,
    compression: TiffCompression,
}

impl FileResultWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            template: root.join("template.html"),
            index: root.join("index.html"),
            root,
            compression: TiffCompression::default(),
        }
    }

    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_index(mut self, index: impl Into<PathBuf>) -> Self {
        self.index = index.into();
        self
    }

    pub fn with_compression(mut self, compression: TiffCompression) -> Self {
        self.compression = compression;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> &Path {
        &self.index
    }

    pub fn paths_for(&self, stamp: &str) -> OutputPaths {
        let images = self.root.join("images");
        OutputPaths {
            raw_image: images.join(format!("raw-{}.tiff", stamp)),
            processed_image: images.join(format!("processed-{}.tiff", stamp)),
            plot: images.join(format!("spectrum-{}.svg", stamp)),
            csv: self.root.join("data").join(format!("spectrum-{}.csv", stamp)),
            report: self.root.join(format!("experiment-{}.html", stamp)),
        }
    }

    fn write_image(&self, image: &RgbImageData, path: &Path) -> Result<()> {
        let _span = tracing::info_span!("write_image", path = %path.display()).entered();
        let mut file = BufWriter::new(File::create(path)?);
        write_rgb_tiff(image, &mut file, self.compression)?;
        file.flush()?;
        Ok(())
    }

    fn read_or(path: &Path, fallback: &str) -> Result<String> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(fallback.to_string()),
            Err(e) => Err(e.into()),
        }
    }

    /// Rewrites the index through a temporary file so an interrupted write
    /// cannot truncate the existing log.
    fn append_to_index(&self, entry: &LogEntry<'_>) -> Result<()> {
        let _span = tracing::info_span!("update_index").entered();
        let current = Self::read_or(&self.index, DEFAULT_INDEX)?;
        let updated = insert_log_entry(&current, entry);
        let tmp = self.index.with_extension("html.tmp");
        fs::write(&tmp, updated)?;
        fs::rename(&tmp, &self.index)?;
        Ok(())
    }
}

impl ResultWriter for FileResultWriter {
    #[instrument(skip(self, record), fields(stamp = record.stamp))]
    fn persist(&mut self, record: &MeasurementRecord<'_>) -> Result<()> {
        let paths = self.paths_for(record.stamp);
        fs::create_dir_all(self.root.join("images"))?;
        fs::create_dir_all(self.root.join("data"))?;

        self.write_image(record.raw, &paths.raw_image)?;
        self.write_image(record.processed, &paths.processed_image)?;

        {
            let _span = tracing::info_span!("write_plot").entered();
            fs::write(&paths.plot, render_spectrum_svg(record.trace))?;
        }

        {
            let _span = tracing::info_span!("write_csv", rows = record.trace.len()).entered();
            let file = File::create(&paths.csv)?;
            write_trace_csv(record.trace, BufWriter::new(file))?;
        }

        {
            let _span = tracing::info_span!("write_report").entered();
            let template = Self::read_or(&self.template, DEFAULT_TEMPLATE)?;
            let values = report_values(record.metadata, record.stamp, record.exposure.shutter_us());
            fs::write(&paths.report, fill_template(&template, &values))?;
        }

        self.append_to_index(&LogEntry::new(record.stamp, record.metadata))?;

        info!(report = %paths.report.display(), "Measurement saved");
        Ok(())
    }
}
