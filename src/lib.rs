//! Library entry point for the engine.

pub mod assets;
pub mod editor;
pub mod engine;
pub mod game;
pub mod scene;

// Re-export main types for convenience
pub use engine::{Application, EngineContext, EngineError, Module, UpdateStatus};
pub use game::App;
