//! The in-engine editor built on egui.

pub mod clipboard;
pub mod configuration;
pub mod console;
pub mod hierarchy;
pub mod inspector;
pub mod manager;
pub mod panels;
pub mod raw_input;

pub use manager::{EditorConfig, MenuAction, ModuleEditor};
pub use panels::Panel;
