use log::info;

use crate::engine::context::EngineContext;
use crate::engine::error::EngineError;
use crate::engine::module::{Module, UpdateStatus};

/// Drives the scene: applies deferred removals and updates transforms and
/// components once per frame.
#[derive(Default)]
pub struct ModuleGOManager;

impl ModuleGOManager {
    pub fn new() -> Self {
        Self
    }
}

impl Module for ModuleGOManager {
    fn name(&self) -> &str {
        "go_manager"
    }

    fn init(&mut self, _ctx: &mut EngineContext) -> Result<(), EngineError> {
        info!("Init game object manager");
        Ok(())
    }

    fn update(&mut self, ctx: &mut EngineContext, dt: f32) -> UpdateStatus {
        ctx.scene.apply_removals();
        ctx.scene.update(dt);
        UpdateStatus::Continue
    }

    fn clean_up(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        info!("Destroying {} game object(s)", ctx.scene.len());
        ctx.scene.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn update_applies_removals_then_propagates() {
        let mut ctx = EngineContext::new();
        let mut manager = ModuleGOManager::new();
        let keep = ctx.scene.create("keep", None).unwrap();
        let gone = ctx.scene.create("gone", None).unwrap();
        ctx.scene.queue_removal(gone);
        ctx.scene
            .require_mut(keep)
            .unwrap()
            .transform_mut()
            .set_position(Vec3::Y);

        assert_eq!(manager.update(&mut ctx, 0.016), UpdateStatus::Continue);
        assert!(!ctx.scene.contains(gone));
        let keep = ctx.scene.get(keep).unwrap();
        assert_eq!(keep.transform().world_position(), Vec3::Y);

        manager.clean_up(&mut ctx).unwrap();
        assert!(ctx.scene.is_empty());
    }
}
