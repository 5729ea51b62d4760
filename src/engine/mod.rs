//! Engine core: the module lifecycle, shared context and the platform-facing
//! modules (window, input, camera, file system, renderer).

pub mod application;
pub mod camera;
pub mod config;
pub mod context;
pub mod error;
pub mod filesystem;
pub mod graphics;
pub mod input;
pub mod log_capture;
pub mod module;
pub mod timer;
pub mod window;

// Re-export commonly used types
pub use application::Application;
pub use context::{AppCommand, EngineContext};
pub use error::EngineError;
pub use module::{Module, UpdateStatus};
