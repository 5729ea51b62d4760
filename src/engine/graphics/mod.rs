pub mod renderer;
pub mod settings;
pub mod texture;
pub mod uniforms;
pub mod vertex;

pub use renderer::{ModuleRenderer3D, Renderer};
pub use settings::RenderSettings;
pub use texture::Texture;
pub use vertex::{LineVertex, Vertex};
