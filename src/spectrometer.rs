//! Spectrometer core
//!
//! Turns a still of a dispersed-light pattern into an intensity-vs-wavelength
//! trace, and coordinates the single camera between live preview streaming and
//! still capture. File output and peripherals sit behind small traits so the
//! core runs without any hardware attached.

pub mod common;
pub mod image;
pub mod calibration;
pub mod brightness;
pub mod extraction;
pub mod overlay;
pub mod camera;
pub mod peripherals;
pub mod acquisition;
pub mod persistence;

pub use common::{
    SpectroError,
    Result,
};

pub use image::{
    CropBox,
    Rgb,
    RgbImageData,
};

pub use calibration::{
    CalibrationAnchors,
    CalibrationModel,
};

pub use brightness::{
    BrightnessNormalizer,
    NormalizedImage,
};

pub use extraction::{
    SpectrumExtractor,
    SpectrumPoint,
    SpectrumTrace,
};

pub use overlay::{
    OverlayDescription,
    OverlayFields,
    OverlayParams,
    OverlayRenderer,
    OverlayShape,
};

pub use camera::{
    CameraControl,
    CameraDevice,
    CameraHandle,
    CameraSession,
    CameraSettings,
    CameraWorker,
    Exposure,
    Resolution,
    Rotation,
    SessionConfig,
    SessionConfigBuilder,
    SessionState,
    StreamingServer,
};

pub use peripherals::{
    Indicator,
    PreviewDisplay,
};

pub use acquisition::{
    AcquisitionController,
    AcquisitionParams,
    Capture,
    ExperimentMetadata,
    Measurement,
};

pub use persistence::{
    FileResultWriter,
    MeasurementRecord,
    ResultWriter,
    TiffCompression,
};
