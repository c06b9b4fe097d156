pub mod app;
pub mod components;
pub mod logging;
pub mod models;
pub mod processing;

pub use logging::init_logging;
pub use models::CowwyGui;
