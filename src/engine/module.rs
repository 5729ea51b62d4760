//! The module trait every engine subsystem implements.
//!
//! All hooks have no-op defaults so a module only overrides the phases it
//! cares about.

use serde_json::Value;

use crate::engine::context::EngineContext;
use crate::engine::error::EngineError;

/// Result of a per-frame phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    Continue,
    /// Clean shutdown requested.
    Stop,
    /// Unrecoverable failure; the application should shut down.
    Error,
}

impl UpdateStatus {
    pub fn is_continue(self) -> bool {
        self == UpdateStatus::Continue
    }
}

pub trait Module {
    /// Unique module name. Also the key of the module's config section.
    fn name(&self) -> &str;

    /// Whether the module takes part in the update phases right after
    /// registration.
    fn start_enabled(&self) -> bool {
        true
    }

    fn init(&mut self, _ctx: &mut EngineContext) -> Result<(), EngineError> {
        Ok(())
    }

    fn start(&mut self, _ctx: &mut EngineContext) -> Result<(), EngineError> {
        Ok(())
    }

    fn pre_update(&mut self, _ctx: &mut EngineContext, _dt: f32) -> UpdateStatus {
        UpdateStatus::Continue
    }

    fn update(&mut self, _ctx: &mut EngineContext, _dt: f32) -> UpdateStatus {
        UpdateStatus::Continue
    }

    fn post_update(&mut self, _ctx: &mut EngineContext, _dt: f32) -> UpdateStatus {
        UpdateStatus::Continue
    }

    fn clean_up(&mut self, _ctx: &mut EngineContext) -> Result<(), EngineError> {
        Ok(())
    }

    /// Receives this module's section of the config document. Only called
    /// when the section exists.
    fn load_config(&mut self, _ctx: &mut EngineContext, _section: &Value) -> Result<(), EngineError> {
        Ok(())
    }

    /// Returns the section to store under this module's name, or `None` to
    /// leave whatever the document already holds.
    fn save_config(&self, _ctx: &EngineContext) -> Result<Option<Value>, EngineError> {
        Ok(None)
    }
}

/// Deserializes a typed config struct from a module section.
pub fn parse_section<T>(module: &str, section: &Value) -> Result<T, EngineError>
where
    T: serde::de::DeserializeOwned,
{
    T::deserialize(section).map_err(|e| {
        EngineError::Config(format!("invalid '{}' section: {}", module, e))
    })
}

/// Serializes a typed config struct into a module section.
pub fn to_section<T: serde::Serialize>(config: &T) -> Result<Option<Value>, EngineError> {
    Ok(Some(serde_json::to_value(config)?))
}
