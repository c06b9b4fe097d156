//! Core pipeline building blocks: upload guard, decoding, resizing, the result
//! cache, and the orchestrating `Pipeline`. The high-level `api` module and the
//! GUI are thin layers over these.
pub mod params;
pub mod processing;
