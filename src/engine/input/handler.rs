use log::{debug, info};

use crate::engine::context::EngineContext;
use crate::engine::error::EngineError;
use crate::engine::module::{Module, UpdateStatus};

/// Folds the events queued by the host into `EngineContext::input` at the
/// start of every frame.
#[derive(Default)]
pub struct ModuleInput;

impl ModuleInput {
    pub fn new() -> Self {
        Self
    }
}

impl Module for ModuleInput {
    fn name(&self) -> &str {
        "input"
    }

    fn init(&mut self, _ctx: &mut EngineContext) -> Result<(), EngineError> {
        info!("Init input event system");
        Ok(())
    }

    fn pre_update(&mut self, ctx: &mut EngineContext, _dt: f32) -> UpdateStatus {
        ctx.input.advance();

        if let Some((width, height)) = ctx.input.resized() {
            debug!("Window resized to {}x{}", width, height);
            ctx.window.width = width;
            ctx.window.height = height;
            ctx.window.resized = true;
        } else {
            ctx.window.resized = false;
        }
        if let Some(factor) = ctx.input.scale_factor_changed() {
            ctx.window.scale_factor = factor;
        }

        if ctx.input.quit_requested() {
            info!("Quit requested");
            return UpdateStatus::Stop;
        }
        UpdateStatus::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::InputEvent;

    #[test]
    fn resize_is_published_for_one_frame() {
        let mut ctx = EngineContext::new();
        let mut input = ModuleInput::new();
        ctx.input.push_event(InputEvent::Resized {
            width: 640,
            height: 480,
        });

        assert_eq!(input.pre_update(&mut ctx, 0.0), UpdateStatus::Continue);
        assert!(ctx.window.resized);
        assert_eq!((ctx.window.width, ctx.window.height), (640, 480));

        input.pre_update(&mut ctx, 0.0);
        assert!(!ctx.window.resized);
    }

    #[test]
    fn quit_event_stops_the_frame() {
        let mut ctx = EngineContext::new();
        let mut input = ModuleInput::new();
        ctx.input.push_event(InputEvent::Quit);
        assert_eq!(input.pre_update(&mut ctx, 0.0), UpdateStatus::Stop);
    }
}
