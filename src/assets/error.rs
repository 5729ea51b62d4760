use std::path::PathBuf;

use thiserror::Error;

use crate::engine::filesystem::FsError;
use crate::scene::SceneError;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("unsupported asset format: {}", .0.display())]
    Unsupported(PathBuf),
    #[error("'{}' holds no scene to import", .0.display())]
    EmptyModel(PathBuf),
    #[error("no object selected to receive '{}'", .0.display())]
    NoSelection(PathBuf),
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    FileSystem(#[from] FsError),
}
