use thiserror::Error;

use crate::spectrometer::camera::SessionState;

#[derive(Error, Debug)]
pub enum SpectroError {
    #[error("Operation `{operation}` is not allowed while the camera is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    #[error("Camera failure: {0}")]
    CameraFailure(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Invalid calibration: {0}")]
    InvalidCalibration(String),

    #[error("Invalid crop box ({left}, {top}, {right}, {bottom}): {reason}")]
    InvalidCropBox {
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
        reason: String,
    },

    #[error("No still has been captured yet")]
    MissingCapture,

    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    #[error("Failed to encode output: {0}")]
    EncodeError(String),

    #[error("Failed to decode input: {0}")]
    DecodeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SpectroError {
    pub fn invalid_parameter(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Status line shown to the operator when a workflow step halts.
    pub fn user_message(&self) -> String {
        match self {
            SpectroError::InvalidState { operation, state } => {
                format!("Cannot {} while the camera is {}.", operation.replace('_', " "), state)
            }
            SpectroError::CameraFailure(_) => {
                "Camera error. Check the camera connection and try again.".to_string()
            }
            SpectroError::InvalidImage(reason) => format!("Image unusable: {}.", reason),
            SpectroError::InvalidCalibration(reason) => {
                format!("Check the calibration lines: {}.", reason)
            }
            SpectroError::InvalidCropBox { reason, .. } => {
                format!("Check the crop area: {}.", reason)
            }
            SpectroError::MissingCapture => "Take a measurement before processing.".to_string(),
            SpectroError::InvalidParameter { parameter, value } => {
                format!("'{}' is not a valid value for {}.", value, parameter)
            }
            SpectroError::EncodeError(_) | SpectroError::IoError(_) => {
                "Saving results failed. Check the output directory.".to_string()
            }
            SpectroError::DecodeError(_) => "Could not read the input image.".to_string(),
            SpectroError::ConfigError(reason) => format!("Configuration problem: {}.", reason),
        }
    }
}

pub type Result<T> = std::result::Result<T, SpectroError>;
