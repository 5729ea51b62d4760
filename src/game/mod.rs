//! The editor application: module registry, intro scene and the winit host.

pub mod app;
pub mod scene_intro;

pub use app::App;
pub use scene_intro::ModuleSceneIntro;

use crate::assets::ModuleAssetLoader;
use crate::editor::ModuleEditor;
use crate::engine::camera::ModuleCamera3D;
use crate::engine::filesystem::ModuleFileSystem;
use crate::engine::graphics::ModuleRenderer3D;
use crate::engine::input::ModuleInput;
use crate::engine::module::Module;
use crate::engine::window::ModuleWindow;
use crate::scene::ModuleGOManager;

/// Every module of the editor, in update order.
pub fn build_modules() -> Vec<Box<dyn Module>> {
    vec![
        Box::new(ModuleWindow::new()),
        Box::new(ModuleCamera3D::new()),
        Box::new(ModuleInput::new()),
        Box::new(ModuleFileSystem::new()),
        Box::new(ModuleAssetLoader::new()),
        Box::new(ModuleGOManager::new()),
        Box::new(ModuleSceneIntro::new()),
        Box::new(ModuleRenderer3D::new()),
        Box::new(ModuleEditor::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modules_register_in_update_order() {
        let names: Vec<String> = build_modules().iter().map(|m| m.name().to_string()).collect();
        assert_eq!(
            names,
            [
                "window",
                "camera",
                "input",
                "file_system",
                "asset_loader",
                "go_manager",
                "scene_intro",
                "renderer",
                "editor"
            ]
        );
    }
}
