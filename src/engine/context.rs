//! State shared between modules.
//!
//! Every lifecycle hook receives `&mut EngineContext`. Modules publish what
//! other modules need here instead of reaching into each other.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use winit::window::Window;

use crate::engine::filesystem::FileSystem;
use crate::engine::graphics::settings::RenderSettings;
use crate::engine::graphics::vertex::LineVertex;
use crate::engine::input::InputState;
use crate::engine::timer::FrameStats;
use crate::engine::window::WindowSettings;
use crate::scene::Scene;

#[derive(Debug, Clone, PartialEq)]
pub struct AppInfo {
    pub name: String,
    pub organization: String,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: "NewGine".to_string(),
            organization: "NewGine Team".to_string(),
        }
    }
}

/// Requests a module makes to the owning application. Applied once per frame
/// after PostUpdate.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    SetMaxFps(i32),
    SaveConfig,
    LoadConfig,
    OpenLink(String),
}

#[derive(Default)]
pub struct WindowState {
    /// The OS window, present once the host has created it.
    pub handle: Option<Arc<Window>>,
    pub width: u32,
    pub height: u32,
    pub scale_factor: f32,
    /// Set by the input module on the frame the window was resized.
    pub resized: bool,
    pub settings: WindowSettings,
    /// Set when `settings` changed and must be applied to the OS window.
    pub settings_dirty: bool,
}

impl WindowState {
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CameraRequest {
    pub position: Vec3,
    pub reference: Vec3,
}

#[derive(Debug, Clone)]
pub struct CameraView {
    pub position: Vec3,
    pub reference: Vec3,
    pub view: Mat4,
    pub fov_y_degrees: f32,
    /// One-shot placement request, consumed by the camera module.
    pub request: Option<CameraRequest>,
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            reference: Vec3::ZERO,
            view: Mat4::IDENTITY,
            fov_y_degrees: 60.0,
            request: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GpuInfo {
    pub adapter: String,
    pub backend: String,
    pub device_type: String,
    pub driver: String,
    pub driver_info: String,
    pub wireframe_supported: bool,
}

/// Files waiting to be imported by the asset loader.
#[derive(Debug, Default)]
pub struct AssetQueue {
    pending: VecDeque<PathBuf>,
}

impl AssetQueue {
    pub fn request(&mut self, path: impl Into<PathBuf>) {
        self.pending.push_back(path.into());
    }

    pub fn pop(&mut self) -> Option<PathBuf> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Immediate-mode line buffer, drained by the renderer every frame.
#[derive(Debug, Default)]
pub struct DebugDraw {
    pub lines: Vec<LineVertex>,
}

impl DebugDraw {
    pub fn line(&mut self, from: Vec3, to: Vec3, color: [f32; 4]) {
        self.lines.push(LineVertex::new(from, color));
        self.lines.push(LineVertex::new(to, color));
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// Tessellated editor output waiting to be painted.
pub struct UiFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

#[derive(Default)]
pub struct EngineContext {
    pub app: AppInfo,
    pub stats: FrameStats,
    pub window: WindowState,
    pub input: InputState,
    pub camera: CameraView,
    pub scene: Scene,
    pub fs: FileSystem,
    pub render: RenderSettings,
    pub gpu: Option<GpuInfo>,
    pub assets: AssetQueue,
    pub debug: DebugDraw,
    pub ui: Option<UiFrame>,
    commands: Vec<AppCommand>,
}

impl EngineContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, command: AppCommand) {
        self.commands.push(command);
    }

    pub fn take_commands(&mut self) -> Vec<AppCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Drops the per-frame outputs left over from the previous frame. The
    /// renderer normally consumes them, but it may be disabled or headless.
    pub fn begin_frame(&mut self) {
        self.debug.clear();
        self.ui = None;
    }
}
