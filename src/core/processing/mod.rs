pub mod cache;
pub mod decode;
pub mod guard;
pub mod pipeline;
pub mod resize;
