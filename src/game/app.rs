//! The winit event-loop handler that owns the engine.

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use crate::engine::config::{ConfigDocument, DEFAULT_CONFIG_PATH};
use crate::engine::context::AppInfo;
use crate::engine::input::InputEvent;
use crate::engine::module::{parse_section, UpdateStatus};
use crate::engine::window::WindowSettings;
use crate::engine::{Application, EngineError};
use crate::game::build_modules;

pub struct App {
    config_path: PathBuf,
    window: Option<Arc<Window>>,
    engine: Option<Application>,
    failed: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}

/// Title and window settings needed before the modules exist.
fn startup_settings(config_path: &std::path::Path) -> Result<(AppInfo, WindowSettings), EngineError> {
    let Some(doc) = ConfigDocument::load(config_path)? else {
        return Ok((AppInfo::default(), WindowSettings::default()));
    };
    let settings = match doc.module_section("window") {
        Some(section) => parse_section("window", section)?,
        None => WindowSettings::default(),
    };
    Ok((doc.app_info(), settings))
}

impl App {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            window: None,
            engine: None,
            failed: false,
        }
    }

    /// True once initialization, a frame or cleanup failed.
    pub fn failed(&self) -> bool {
        self.failed
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> Result<(Arc<Window>, Application), EngineError> {
        let (info, settings) = startup_settings(&self.config_path)?;
        let window = event_loop
            .create_window(settings.attributes(&info.name))
            .map_err(|e| EngineError::Window(e.to_string()))?;
        let window = Arc::new(window);

        let mut engine = Application::new(&self.config_path);
        {
            let ctx = engine.context_mut();
            let size = window.inner_size();
            ctx.window.handle = Some(Arc::clone(&window));
            ctx.window.width = size.width;
            ctx.window.height = size.height;
            ctx.window.scale_factor = window.scale_factor() as f32;
        }
        for module in build_modules() {
            engine.add_module(module);
        }
        engine.init()?;
        Ok((window, engine))
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: EngineError) {
        error!("{}", e);
        self.failed = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.engine.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok((window, engine)) => {
                window.request_redraw();
                self.window = Some(window);
                self.engine = Some(engine);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        if let WindowEvent::RedrawRequested = event {
            match engine.update() {
                UpdateStatus::Continue => {
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
                UpdateStatus::Stop => {
                    info!("Exiting");
                    event_loop.exit();
                }
                UpdateStatus::Error => {
                    error!("Exiting with error");
                    self.failed = true;
                    event_loop.exit();
                }
            }
            return;
        }

        let input = &mut engine.context_mut().input;
        for translated in InputEvent::from_window_event(&event) {
            input.push_event(translated);
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let (Some(engine), Some(translated)) = (self.engine.as_mut(), InputEvent::from_device_event(&event)) {
            engine.context_mut().input.push_event(translated);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        let Some(mut engine) = self.engine.take() else {
            return;
        };
        debug!("Event loop exiting, cleaning up");
        if let Err(e) = engine.cleanup() {
            error!("Cleanup failed: {}", e);
            self.failed = true;
        }
        // Modules go before the window they may hold on to.
        drop(engine);
        self.window = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn startup_settings_default_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let (info, settings) = startup_settings(&dir.path().join("config.json")).unwrap();
        assert_eq!(info, AppInfo::default());
        assert_eq!(settings, WindowSettings::default());
    }

    #[test]
    fn startup_settings_read_title_and_window_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let doc = json!({ "App": { "name": "Demo", "window": { "width": 640, "borderless": true } } });
        std::fs::write(&path, doc.to_string()).unwrap();

        let (info, settings) = startup_settings(&path).unwrap();
        assert_eq!(info.name, "Demo");
        assert_eq!(settings.width, 640);
        assert!(settings.borderless);
        assert!(!App::new(&path).failed());
    }
}
