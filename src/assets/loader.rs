use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assets::error::AssetError;
use crate::assets::model::import_model;
use crate::assets::texture::{apply_texture, load_texture};
use crate::engine::context::EngineContext;
use crate::engine::error::EngineError;
use crate::engine::filesystem::{FileSystem, FsError};
use crate::engine::module::{parse_section, to_section, Module, UpdateStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Model,
    Texture,
}

impl AssetKind {
    /// Classifies a file by extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "gltf" | "glb" => Some(Self::Model),
            "png" | "jpg" | "jpeg" | "bmp" | "tga" | "dds" => Some(Self::Texture),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetLoaderConfig {
    /// Uniform scale applied to the root of every imported model.
    pub import_scale: f32,
    /// Select the root of a freshly imported model.
    pub select_imported: bool,
}

impl Default for AssetLoaderConfig {
    fn default() -> Self {
        Self {
            import_scale: 1.0,
            select_imported: true,
        }
    }
}

/// Imports files dropped on the window or queued in `EngineContext::assets`.
#[derive(Default)]
pub struct ModuleAssetLoader {
    pub config: AssetLoaderConfig,
    imported: usize,
}

impl ModuleAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files imported successfully since start.
    pub fn imported(&self) -> usize {
        self.imported
    }

    fn import(&mut self, ctx: &mut EngineContext, requested: &Path) -> Result<(), AssetError> {
        let kind = AssetKind::from_path(requested)
            .ok_or_else(|| AssetError::Unsupported(requested.to_path_buf()))?;
        let path = locate(&ctx.fs, requested)?;

        match kind {
            AssetKind::Model => {
                let summary = import_model(&mut ctx.scene, &path, self.config.import_scale)?;
                info!(
                    "Imported '{}': {} object(s), {} mesh(es)",
                    path.display(),
                    summary.objects,
                    summary.meshes
                );
                if self.config.select_imported {
                    ctx.scene.select(Some(summary.root));
                }
            }
            AssetKind::Texture => {
                let selected = ctx
                    .scene
                    .selected()
                    .ok_or_else(|| AssetError::NoSelection(path.clone()))?;
                let texture = Arc::new(load_texture(&path)?);
                apply_texture(&mut ctx.scene, selected, texture)?;
            }
        }
        self.imported += 1;
        Ok(())
    }
}

/// Dropped files arrive with absolute paths; queued ones may be virtual.
fn locate(fs: &FileSystem, requested: &Path) -> Result<PathBuf, FsError> {
    fs.resolve(requested)
        .ok_or_else(|| FsError::NotFound(requested.to_path_buf()))
}

impl Module for ModuleAssetLoader {
    fn name(&self) -> &str {
        "asset_loader"
    }

    fn init(&mut self, _ctx: &mut EngineContext) -> Result<(), EngineError> {
        info!("Init asset loader (import scale {})", self.config.import_scale);
        Ok(())
    }

    fn update(&mut self, ctx: &mut EngineContext, _dt: f32) -> UpdateStatus {
        for path in ctx.input.take_dropped_files() {
            ctx.assets.request(path);
        }

        while let Some(path) = ctx.assets.pop() {
            match self.import(ctx, &path) {
                Ok(()) => {}
                Err(e @ (AssetError::Unsupported(_) | AssetError::NoSelection(_))) => warn!("{}", e),
                Err(e) => error!("Could not import '{}': {}", path.display(), e),
            }
        }
        UpdateStatus::Continue
    }

    fn load_config(&mut self, _ctx: &mut EngineContext, section: &Value) -> Result<(), EngineError> {
        self.config = parse_section(self.name(), section)?;
        Ok(())
    }

    fn save_config(&self, _ctx: &EngineContext) -> Result<Option<Value>, EngineError> {
        to_section(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::model::tests::write_triangle_model;
    use crate::engine::input::InputEvent;

    #[test]
    fn classifies_by_extension() {
        assert_eq!(AssetKind::from_path(Path::new("a/b.GLB")), Some(AssetKind::Model));
        assert_eq!(AssetKind::from_path(Path::new("tex.Png")), Some(AssetKind::Texture));
        assert_eq!(AssetKind::from_path(Path::new("scene.fbx")), None);
        assert_eq!(AssetKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn queued_virtual_path_is_resolved_through_mounts() {
        let dir = tempfile::tempdir().unwrap();
        write_triangle_model(dir.path());
        let mut ctx = EngineContext::new();
        ctx.fs.add_path(dir.path(), Some("Assets")).unwrap();
        ctx.assets.request("Assets/triangle.gltf");

        let mut loader = ModuleAssetLoader::new();
        assert_eq!(loader.update(&mut ctx, 0.0), UpdateStatus::Continue);
        assert_eq!(loader.imported(), 1);
        assert!(ctx.assets.is_empty());

        let root = ctx.scene.find_by_name("triangle").unwrap();
        assert_eq!(ctx.scene.selected(), Some(root));
    }

    #[test]
    fn dropped_texture_lands_on_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();

        let mut ctx = EngineContext::new();
        let target = ctx.scene.create("target", None).unwrap();
        let mut loader = ModuleAssetLoader::new();

        // Nothing selected: the drop is reported and skipped.
        ctx.input.push_event(InputEvent::FileDropped(path.clone()));
        ctx.input.advance();
        loader.update(&mut ctx, 0.0);
        assert_eq!(loader.imported(), 0);

        ctx.scene.select(Some(target));
        ctx.input.push_event(InputEvent::FileDropped(path));
        ctx.input.advance();
        loader.update(&mut ctx, 0.0);
        assert_eq!(loader.imported(), 1);
        let material = ctx.scene.get(target).unwrap().material().unwrap();
        assert!(material.texture.is_some());
    }

    #[test]
    fn failures_do_not_stop_the_frame() {
        let mut ctx = EngineContext::new();
        ctx.assets.request("missing.gltf");
        ctx.assets.request("notes.txt");
        let mut loader = ModuleAssetLoader::new();
        assert_eq!(loader.update(&mut ctx, 0.0), UpdateStatus::Continue);
        assert_eq!(loader.imported(), 0);
        assert!(ctx.assets.is_empty());
    }

    #[test]
    fn config_round_trips_through_section() {
        let mut ctx = EngineContext::new();
        let mut loader = ModuleAssetLoader::new();
        loader
            .load_config(&mut ctx, &serde_json::json!({ "import_scale": 0.01 }))
            .unwrap();
        assert_eq!(loader.config.import_scale, 0.01);
        assert!(loader.config.select_imported);
        let saved = loader.save_config(&ctx).unwrap().unwrap();
        assert_eq!(saved["import_scale"], serde_json::json!(0.01f32));
    }
}
