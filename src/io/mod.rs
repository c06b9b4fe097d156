//! I/O layer: resolving uploads and default images into bytes, and
//! `writers` for the PNG download artifact.
pub mod input;
pub use input::{first_default_source, read_default_image, resolve_bytes, upload_from_path};

pub mod writers;
