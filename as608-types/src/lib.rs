//! Type definitions for as608

pub mod error;
pub mod image;
pub mod system_parameters;

pub use error::{Error, Result};
pub use image::FingerprintImage;
pub use system_parameters::{StatusRegister, SystemParameters};
