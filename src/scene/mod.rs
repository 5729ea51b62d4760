//! Scene graph: game objects, their components and the module that updates
//! them every frame.

pub mod component;
pub mod error;
pub mod game_object;
pub mod graph;
pub mod manager;
pub mod material;
pub mod mesh;
pub mod transform;

pub use component::{Component, ComponentData, ComponentKind, MeshComponent};
pub use error::SceneError;
pub use game_object::{GameObject, GameObjectId};
pub use graph::{Renderable, Scene};
pub use manager::ModuleGOManager;
pub use material::{Material, TextureData};
pub use mesh::{Aabb, MeshData};
pub use transform::Transform;
