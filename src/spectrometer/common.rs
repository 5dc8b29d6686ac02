//! Common utilities module
//!
//! This module contains shared utilities used across the spectrometer core.

pub mod error;
pub mod markup;

pub use error::{SpectroError, Result};
pub use markup::escape_markup;
