//! Input handling module
//! Keyboard, mouse and window events are queued by the host and folded into
//! per-frame state by the input module.

pub mod event;
pub mod handler;
pub mod state;

pub use event::{InputEvent, MouseButton};
pub use handler::ModuleInput;
pub use state::{InputState, KeyState};
