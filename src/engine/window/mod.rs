pub mod manager;

pub use manager::{ModuleWindow, WindowSettings};
