use glam::Vec3;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::context::{CameraRequest, DebugDraw, EngineContext};
use crate::engine::error::EngineError;
use crate::engine::module::{parse_section, to_section, Module, UpdateStatus};

const GRID_COLOR: [f32; 4] = [0.35, 0.35, 0.35, 1.0];
/// Largest accepted grid half extent.
pub const MAX_GRID_SIZE: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneIntroConfig {
    pub camera_position: [f32; 3],
    pub camera_reference: [f32; 3],
    pub draw_grid: bool,
    /// Half extent of the ground grid in world units.
    pub grid_size: u32,
    pub draw_axes: bool,
    /// Model queued for import at start, as a virtual path.
    pub startup_model: Option<String>,
}

impl Default for SceneIntroConfig {
    fn default() -> Self {
        Self {
            camera_position: [8.0, 6.0, 8.0],
            camera_reference: [0.0, 0.0, 0.0],
            draw_grid: true,
            grid_size: 20,
            draw_axes: true,
            startup_model: None,
        }
    }
}

/// Ground grid lines on the XZ plane, one unit apart.
pub fn grid(debug: &mut DebugDraw, size: u32) {
    let size = size.min(MAX_GRID_SIZE) as i32;
    let extent = size as f32;
    for i in -size..=size {
        let offset = i as f32;
        debug.line(Vec3::new(offset, 0.0, -extent), Vec3::new(offset, 0.0, extent), GRID_COLOR);
        debug.line(Vec3::new(-extent, 0.0, offset), Vec3::new(extent, 0.0, offset), GRID_COLOR);
    }
}

pub fn axes(debug: &mut DebugDraw) {
    debug.line(Vec3::ZERO, Vec3::X, [1.0, 0.0, 0.0, 1.0]);
    debug.line(Vec3::ZERO, Vec3::Y, [0.0, 1.0, 0.0, 1.0]);
    debug.line(Vec3::ZERO, Vec3::Z, [0.0, 0.0, 1.0, 1.0]);
}

/// The starting scene: camera placement, optional startup model and the
/// ground grid.
#[derive(Default)]
pub struct ModuleSceneIntro {
    pub config: SceneIntroConfig,
}

impl ModuleSceneIntro {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Module for ModuleSceneIntro {
    fn name(&self) -> &str {
        "scene_intro"
    }

    fn start(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        info!("Loading intro scene");
        ctx.camera.request = Some(CameraRequest {
            position: Vec3::from(self.config.camera_position),
            reference: Vec3::from(self.config.camera_reference),
        });
        if let Some(model) = &self.config.startup_model {
            ctx.assets.request(model);
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut EngineContext, _dt: f32) -> UpdateStatus {
        if self.config.draw_grid {
            grid(&mut ctx.debug, self.config.grid_size);
        }
        if self.config.draw_axes {
            axes(&mut ctx.debug);
        }
        UpdateStatus::Continue
    }

    fn load_config(&mut self, _ctx: &mut EngineContext, section: &Value) -> Result<(), EngineError> {
        let mut config: SceneIntroConfig = parse_section(self.name(), section)?;
        if config.grid_size > MAX_GRID_SIZE {
            warn!("Grid size {} clamped to {}", config.grid_size, MAX_GRID_SIZE);
            config.grid_size = MAX_GRID_SIZE;
        }
        self.config = config;
        Ok(())
    }

    fn save_config(&self, _ctx: &EngineContext) -> Result<Option<Value>, EngineError> {
        to_section(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_places_camera_and_queues_model() {
        let mut ctx = EngineContext::new();
        let mut intro = ModuleSceneIntro::new();
        intro
            .load_config(&mut ctx, &json!({ "startup_model": "Assets/house.glb" }))
            .unwrap();
        intro.start(&mut ctx).unwrap();

        let request = ctx.camera.request.unwrap();
        assert_eq!(request.position, Vec3::new(8.0, 6.0, 8.0));
        assert_eq!(ctx.assets.pop(), Some("Assets/house.glb".into()));
    }

    #[test]
    fn grid_emits_two_lines_per_step() {
        let mut ctx = EngineContext::new();
        let mut intro = ModuleSceneIntro::new();
        intro.config.grid_size = 2;
        intro.config.draw_axes = false;
        intro.update(&mut ctx, 0.0);
        // 5 steps, 2 lines each, 2 vertices per line.
        assert_eq!(ctx.debug.lines.len(), 20);

        ctx.debug.clear();
        intro.config.draw_grid = false;
        intro.config.draw_axes = true;
        intro.update(&mut ctx, 0.0);
        assert_eq!(ctx.debug.lines.len(), 6);
    }

    #[test]
    fn oversized_grid_is_clamped() {
        let mut ctx = EngineContext::new();
        let mut intro = ModuleSceneIntro::new();
        intro
            .load_config(&mut ctx, &json!({ "grid_size": 2_147_483_648u64, "draw_axes": false }))
            .unwrap();
        assert_eq!(intro.config.grid_size, MAX_GRID_SIZE);

        intro.update(&mut ctx, 0.0);
        assert_eq!(ctx.debug.lines.len(), (2 * MAX_GRID_SIZE as usize + 1) * 4);

        ctx.debug.clear();
        grid(&mut ctx.debug, u32::MAX);
        assert_eq!(ctx.debug.lines.len(), (2 * MAX_GRID_SIZE as usize + 1) * 4);
    }
}
