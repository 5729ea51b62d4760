//! Engine-wide error type.

use thiserror::Error;

use crate::assets::AssetError;
use crate::engine::filesystem::FsError;
use crate::scene::SceneError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("window error: {0}")]
    Window(String),
    #[error("graphics error: {0}")]
    Graphics(String),
    #[error("module '{module}' failed: {message}")]
    Module { module: String, message: String },
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    FileSystem(#[from] FsError),
}

impl EngineError {
    pub fn module(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Module {
            module: module.into(),
            message: message.into(),
        }
    }
}
