//! Output writers. Only PNG is produced: it is the one format that carries
//! the alpha channel of a cut-out.
pub mod png;
pub use png::{encode_png, png_artifact, write_artifact};
