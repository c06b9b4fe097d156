//! Background removal capability.
//!
//! The pipeline only knows the [`BackgroundRemover`] trait. The production
//! implementation runs a U2-Net segmentation model through ONNX Runtime
//! ([`onnx::U2NetRemover`], `onnx` feature); tests inject stubs.
use image::DynamicImage;

use crate::error::Result;

pub mod mask;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use mask::{apply_alpha_mask, normalize_mask};
#[cfg(feature = "onnx")]
pub use onnx::U2NetRemover;

/// Maps an image to the same image with its background made transparent.
///
/// Implementations must return an image with the input's pixel dimensions and
/// an alpha channel, and should be deterministic for identical input so that
/// caching their output is meaningful.
pub trait BackgroundRemover: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    fn remove(&self, image: &DynamicImage) -> Result<DynamicImage>;
}
