mod params;
mod timing;
mod controller;

#[cfg(test)]
mod tests;

pub use params::{AcquisitionParams, Capture, Measurement, STAMP_FORMAT};
pub use timing::{ProcessTimings, StageTiming, Timer};
pub use controller::AcquisitionController;
pub use crate::spectrometer::persistence::ExperimentMetadata;
