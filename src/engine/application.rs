//! The application: owns the modules and drives their lifecycle.
//!
//! Modules are registered once, in order. Init, Start and every update phase
//! visit them in registration order; CleanUp visits them in reverse. The
//! modules are dropped in reverse registration order as well.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, error, info, warn};

use crate::engine::config::{ConfigDocument, DEFAULT_CONFIG_PATH};
use crate::engine::context::{AppCommand, EngineContext};
use crate::engine::error::EngineError;
use crate::engine::module::{Module, UpdateStatus};
use crate::engine::timer::{self, Timer, DEFAULT_MAX_FPS};

#[derive(Debug, Clone, Copy)]
enum Phase {
    PreUpdate,
    Update,
    PostUpdate,
}

struct ModuleSlot {
    module: Box<dyn Module>,
    enabled: bool,
}

pub struct Application {
    modules: Vec<ModuleSlot>,
    ctx: EngineContext,
    config_path: PathBuf,
    ms_timer: Timer,
    last_sec_frame_time: Timer,
    frame_count: u32,
    last_sec_frame_count: u32,
    last_frame_ms: u32,
    dt: f32,
    capped_ms: i32,
}

impl Default for Application {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}

impl Application {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self::with_context(EngineContext::new(), config_path)
    }

    pub fn with_context(ctx: EngineContext, config_path: impl Into<PathBuf>) -> Self {
        let mut app = Self {
            modules: Vec::new(),
            ctx,
            config_path: config_path.into(),
            ms_timer: Timer::new(),
            last_sec_frame_time: Timer::new(),
            frame_count: 0,
            last_sec_frame_count: 0,
            last_frame_ms: 0,
            dt: 0.0,
            capped_ms: 0,
        };
        app.set_max_fps(DEFAULT_MAX_FPS);
        app
    }

    /// Registers a module. Registration order is update order.
    pub fn add_module(&mut self, module: Box<dyn Module>) {
        let enabled = module.start_enabled();
        debug!("Registering module '{}'", module.name());
        self.modules.push(ModuleSlot { module, enabled });
    }

    pub fn init(&mut self) -> Result<(), EngineError> {
        self.load_config()?;

        for slot in &mut self.modules {
            slot.module.init(&mut self.ctx).map_err(|e| {
                error!("Module '{}' failed to init: {}", slot.module.name(), e);
                e
            })?;
        }

        info!("Application Start --------------");
        for slot in &mut self.modules {
            slot.module.start(&mut self.ctx).map_err(|e| {
                error!("Module '{}' failed to start: {}", slot.module.name(), e);
                e
            })?;
        }

        self.capped_ms = timer::capped_ms(self.ctx.stats.max_fps);
        self.ms_timer.start();
        self.last_sec_frame_time.start();
        Ok(())
    }

    /// Runs one frame: PreUpdate, Update and PostUpdate on every enabled
    /// module. The first non-`Continue` status ends the frame early.
    pub fn update(&mut self) -> UpdateStatus {
        self.prepare_update();

        let mut status = self.run_phase(Phase::PreUpdate);
        if status.is_continue() {
            status = self.run_phase(Phase::Update);
        }
        if status.is_continue() {
            status = self.run_phase(Phase::PostUpdate);
        }

        self.finish_update();
        status
    }

    pub fn cleanup(&mut self) -> Result<(), EngineError> {
        if let Err(e) = self.save_config() {
            error!("Failed to save config: {}", e);
        }

        for slot in self.modules.iter_mut().rev() {
            slot.module.clean_up(&mut self.ctx).map_err(|e| {
                error!("Module '{}' failed to clean up: {}", slot.module.name(), e);
                e
            })?;
        }
        Ok(())
    }

    /// Reads the config file and hands each module its section.
    pub fn load_config(&mut self) -> Result<(), EngineError> {
        let Some(doc) = ConfigDocument::load(&self.config_path)? else {
            warn!(
                "Config file '{}' not found, using defaults",
                self.config_path.display()
            );
            return Ok(());
        };

        self.ctx.app = doc.app_info();
        if let Some(fps) = doc.max_fps() {
            self.set_max_fps(fps);
        }

        for slot in &mut self.modules {
            let name = slot.module.name().to_string();
            match doc.module_section(&name) {
                Some(section) => slot.module.load_config(&mut self.ctx, section).map_err(|e| {
                    error!("Module '{}' rejected its config: {}", name, e);
                    e
                })?,
                None => debug!("No config section for module '{}'", name),
            }
        }
        Ok(())
    }

    /// Writes every module's section back to the config file, keeping keys
    /// no module owns.
    pub fn save_config(&self) -> Result<(), EngineError> {
        let mut doc = ConfigDocument::load(&self.config_path)?.unwrap_or_default();
        doc.set_app_info(&self.ctx.app);
        doc.set_max_fps(self.ctx.stats.max_fps);

        for slot in &self.modules {
            if let Some(section) = slot.module.save_config(&self.ctx)? {
                doc.set_module_section(slot.module.name(), section);
            }
        }

        doc.save(&self.config_path)?;
        info!("Config saved to '{}'", self.config_path.display());
        Ok(())
    }

    pub fn set_max_fps(&mut self, max_fps: i32) {
        self.ctx.stats.max_fps = max_fps;
        self.capped_ms = timer::capped_ms(max_fps);
    }

    /// Frames counted during the last full second.
    pub fn fps(&self) -> u32 {
        self.last_sec_frame_count
    }

    pub fn last_frame_ms(&self) -> u32 {
        self.last_frame_ms
    }

    pub fn capped_ms(&self) -> i32 {
        self.capped_ms
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.ctx
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|slot| slot.module.name()).collect()
    }

    /// Enables or disables a module's update phases. Returns false if no
    /// module has that name.
    pub fn set_module_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.modules.iter_mut().find(|slot| slot.module.name() == name) {
            Some(slot) => {
                slot.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn is_module_enabled(&self, name: &str) -> Option<bool> {
        self.modules
            .iter()
            .find(|slot| slot.module.name() == name)
            .map(|slot| slot.enabled)
    }

    fn prepare_update(&mut self) {
        self.frame_count += 1;
        self.dt = self.ms_timer.read_secs();
        self.ms_timer.start();

        self.ctx.stats.dt = self.dt;
        self.ctx.stats.frame += 1;
        self.ctx.begin_frame();
    }

    fn run_phase(&mut self, phase: Phase) -> UpdateStatus {
        let dt = self.dt;
        for slot in self.modules.iter_mut().filter(|slot| slot.enabled) {
            let status = match phase {
                Phase::PreUpdate => slot.module.pre_update(&mut self.ctx, dt),
                Phase::Update => slot.module.update(&mut self.ctx, dt),
                Phase::PostUpdate => slot.module.post_update(&mut self.ctx, dt),
            };
            if !status.is_continue() {
                debug!("Module '{}' returned {:?} in {:?}", slot.module.name(), status, phase);
                return status;
            }
        }
        UpdateStatus::Continue
    }

    fn finish_update(&mut self) {
        self.apply_commands();

        if self.last_sec_frame_time.read_ms() > 1000 {
            self.last_sec_frame_time.start();
            self.last_sec_frame_count = self.frame_count;
            self.frame_count = 0;
            self.ctx.stats.fps = self.last_sec_frame_count;
            self.ctx.stats.push_fps(self.last_sec_frame_count);
        }

        self.last_frame_ms = self.ms_timer.read_ms();
        self.ctx.stats.last_frame_ms = self.last_frame_ms;
        self.ctx.stats.push_ms(self.last_frame_ms);

        if let Some(delay) = timer::frame_delay(self.capped_ms, self.last_frame_ms) {
            std::thread::sleep(delay);
        }
    }

    fn apply_commands(&mut self) {
        for command in self.ctx.take_commands() {
            match command {
                AppCommand::SetMaxFps(fps) => self.set_max_fps(fps),
                AppCommand::SaveConfig => {
                    if let Err(e) = self.save_config() {
                        error!("Failed to save config: {}", e);
                    }
                }
                AppCommand::LoadConfig => {
                    if let Err(e) = self.load_config() {
                        error!("Failed to load config: {}", e);
                    }
                }
                AppCommand::OpenLink(link) => request_browser(&link),
            }
        }
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        while let Some(slot) = self.modules.pop() {
            debug!("Dropping module '{}'", slot.module.name());
            drop(slot);
        }
    }
}

/// Opens `link` with the platform's default handler.
pub fn request_browser(link: &str) {
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", "", link]);
        command
    };
    #[cfg(target_os = "macos")]
    let mut command = {
        let mut command = Command::new("open");
        command.arg(link);
        command
    };
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let mut command = {
        let mut command = Command::new("xdg-open");
        command.arg(link);
        command
    };

    if let Err(e) = command.spawn() {
        warn!("Could not open '{}': {}", link, e);
    }
}
