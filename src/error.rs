//! Crate-level error type and `Result` alias.
//! Every variant is recoverable: the presenter turns it into a one-line message
//! with [`Error::user_message`] while the `Display` text (technical detail) is
//! only ever logged.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Upload of {size} bytes exceeds the {max} byte limit")]
    OversizedInput { size: usize, max: usize },

    #[error("Default image not found at path: {}", path.display())]
    MissingDefaultImage { path: PathBuf },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Preset error: {0}")]
    Preset(String),
}

impl Error {
    pub fn decode<E: std::fmt::Display>(e: E) -> Self {
        Error::Decode(e.to_string())
    }

    pub fn processing<E: std::fmt::Display>(e: E) -> Self {
        Error::Processing(e.to_string())
    }

    pub fn model<E: std::fmt::Display>(e: E) -> Self {
        Error::Model(e.to_string())
    }

    /// Message safe to show an end user. Never includes library error text.
    pub fn user_message(&self) -> String {
        match self {
            Error::OversizedInput { max, .. } => format!(
                "The uploaded file is too large. Please upload an image smaller than {:.1}MB.",
                *max as f64 / 1024.0 / 1024.0
            ),
            Error::MissingDefaultImage { path } => {
                format!("Default image not found at path: {}", path.display())
            }
            Error::Decode(_) => {
                "The file could not be read as an image. Please upload a PNG or JPEG.".to_string()
            }
            Error::Processing(_) => "Failed to process image".to_string(),
            Error::Model(_) => "The background removal model is not available".to_string(),
            Error::Io(_) => "The image file could not be read".to_string(),
            Error::InvalidArgument { arg, .. } => format!("Invalid setting: {arg}"),
            Error::Preset(_) => "The preset file could not be loaded".to_string(),
        }
    }
}
