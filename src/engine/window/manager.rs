//! Window management implementation.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use winit::dpi::LogicalSize;
use winit::window::{Fullscreen, Window, WindowAttributes};

use crate::engine::context::EngineContext;
use crate::engine::error::EngineError;
use crate::engine::module::{parse_section, to_section, Module, UpdateStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    /// Borderless fullscreen at desktop resolution. Wins over `fullscreen`.
    pub full_desktop: bool,
    pub resizable: bool,
    pub borderless: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 1024,
            fullscreen: false,
            full_desktop: false,
            resizable: true,
            borderless: false,
        }
    }
}

impl WindowSettings {
    /// Attributes the host creates the OS window with.
    pub fn attributes(&self, title: &str) -> WindowAttributes {
        Window::default_attributes()
            .with_title(title)
            .with_inner_size(LogicalSize::new(self.width, self.height))
            .with_resizable(self.resizable)
            .with_decorations(!self.borderless)
    }

    fn fullscreen_mode(&self, window: &Window) -> Option<Fullscreen> {
        if self.full_desktop {
            return Some(Fullscreen::Borderless(None));
        }
        if !self.fullscreen {
            return None;
        }
        let exclusive = window
            .current_monitor()
            .and_then(|monitor| monitor.video_modes().next())
            .map(Fullscreen::Exclusive);
        if exclusive.is_none() {
            warn!("No exclusive video mode available, using borderless fullscreen");
        }
        exclusive.or(Some(Fullscreen::Borderless(None)))
    }

    fn apply(&self, window: &Window, title: &str) {
        window.set_title(title);
        window.set_resizable(self.resizable);
        window.set_decorations(!self.borderless);
        window.set_fullscreen(self.fullscreen_mode(window));
        if window.fullscreen().is_none() {
            // The platform answers with the new size through a Resized event.
            let _ = window.request_inner_size(LogicalSize::new(self.width, self.height));
        }
    }
}

/// Owns the OS window configuration. The host creates the window and hands
/// it over through `EngineContext::window`.
#[derive(Default)]
pub struct ModuleWindow;

impl ModuleWindow {
    pub fn new() -> Self {
        Self
    }

    fn apply_settings(ctx: &mut EngineContext) {
        let Some(window) = ctx.window.handle.clone() else {
            // Headless: the settings describe the surface size.
            ctx.window.width = ctx.window.settings.width;
            ctx.window.height = ctx.window.settings.height;
            return;
        };
        ctx.window.settings.apply(&window, &ctx.app.name);
        let size = window.inner_size();
        ctx.window.width = size.width;
        ctx.window.height = size.height;
        ctx.window.scale_factor = window.scale_factor() as f32;
        debug!(
            "Window settings applied: {}x{} fullscreen={} full_desktop={}",
            size.width, size.height, ctx.window.settings.fullscreen, ctx.window.settings.full_desktop
        );
    }
}

impl Module for ModuleWindow {
    fn name(&self) -> &str {
        "window"
    }

    fn init(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        info!("Init window");
        if ctx.window.scale_factor <= 0.0 {
            ctx.window.scale_factor = 1.0;
        }
        Self::apply_settings(ctx);
        ctx.window.settings_dirty = false;
        Ok(())
    }

    fn pre_update(&mut self, ctx: &mut EngineContext, _dt: f32) -> UpdateStatus {
        if ctx.window.settings_dirty {
            Self::apply_settings(ctx);
            ctx.window.settings_dirty = false;
        }
        UpdateStatus::Continue
    }

    fn load_config(&mut self, ctx: &mut EngineContext, section: &Value) -> Result<(), EngineError> {
        ctx.window.settings = parse_section(self.name(), section)?;
        ctx.window.settings_dirty = true;
        Ok(())
    }

    fn save_config(&self, ctx: &EngineContext) -> Result<Option<Value>, EngineError> {
        to_section(&ctx.window.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_section_keeps_other_defaults() {
        let mut ctx = EngineContext::new();
        let mut window = ModuleWindow::new();
        window
            .load_config(&mut ctx, &json!({"width": 800, "borderless": true}))
            .unwrap();

        let settings = &ctx.window.settings;
        assert_eq!(settings.width, 800);
        assert_eq!(settings.height, WindowSettings::default().height);
        assert!(settings.borderless);
        assert!(settings.resizable);
    }

    #[test]
    fn headless_init_uses_configured_size() {
        let mut ctx = EngineContext::new();
        let mut window = ModuleWindow::new();
        window.load_config(&mut ctx, &json!({"width": 320, "height": 200})).unwrap();
        window.init(&mut ctx).unwrap();

        assert_eq!((ctx.window.width, ctx.window.height), (320, 200));
        assert_eq!(ctx.window.scale_factor, 1.0);
        assert!(!ctx.window.settings_dirty);

        ctx.window.settings.width = 640;
        ctx.window.settings_dirty = true;
        window.pre_update(&mut ctx, 0.0);
        assert_eq!(ctx.window.width, 640);

        let saved = window.save_config(&ctx).unwrap().unwrap();
        assert_eq!(saved["width"], 640);
    }
}
