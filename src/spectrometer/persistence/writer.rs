use crate::spectrometer::camera::Exposure;
use crate::spectrometer::common::error::Result;
use crate::spectrometer::extraction::SpectrumTrace;
use crate::spectrometer::image::RgbImageData;
use crate::spectrometer::persistence::report::ExperimentMetadata;

/// Everything produced by one processed measurement.
#[derive(Debug, Clone, Copy)]
pub struct MeasurementRecord<'a> {
    /// Capture time formatted as `%Y%m%d-%H%M%S`
    pub stamp: &'a str,
    pub raw: &'a RgbImageData,
    pub processed: &'a RgbImageData,
    pub trace: &'a SpectrumTrace,
    pub metadata: &'a ExperimentMetadata,
    pub exposure: Exposure,
}

pub trait ResultWriter {
    fn persist(&mut self, record: &MeasurementRecord<'_>) -> Result<()>;
}
