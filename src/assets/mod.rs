//! Model and texture import into the scene.

pub mod error;
pub mod loader;
pub mod model;
pub mod texture;

pub use error::AssetError;
pub use loader::{AssetKind, AssetLoaderConfig, ModuleAssetLoader};
pub use model::{import_model, ImportSummary};
pub use texture::{apply_texture, load_texture};
