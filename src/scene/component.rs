//! Components attached to game objects.

use std::fmt;
use std::sync::Arc;

use glam::Mat4;

use crate::scene::material::Material;
use crate::scene::mesh::{Aabb, MeshData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Transform,
    Mesh,
    Material,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 3] = [ComponentKind::Transform, ComponentKind::Mesh, ComponentKind::Material];

    pub fn label(self) -> &'static str {
        match self {
            ComponentKind::Transform => "Transform",
            ComponentKind::Mesh => "Mesh",
            ComponentKind::Material => "Material",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct MeshComponent {
    mesh: Arc<MeshData>,
    world_aabb: Aabb,
}

impl MeshComponent {
    pub fn new(mesh: Arc<MeshData>) -> Self {
        let world_aabb = mesh.aabb();
        Self { mesh, world_aabb }
    }

    pub fn mesh(&self) -> &Arc<MeshData> {
        &self.mesh
    }

    pub fn set_mesh(&mut self, mesh: Arc<MeshData>) {
        self.world_aabb = mesh.aabb();
        self.mesh = mesh;
    }

    /// Bounds in world space as of the last scene update.
    pub fn world_aabb(&self) -> Aabb {
        self.world_aabb
    }
}

#[derive(Debug, Clone)]
pub enum ComponentData {
    Mesh(MeshComponent),
    Material(Material),
}

impl ComponentData {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentData::Mesh(_) => ComponentKind::Mesh,
            ComponentData::Material(_) => ComponentKind::Material,
        }
    }
}

impl From<MeshComponent> for ComponentData {
    fn from(mesh: MeshComponent) -> Self {
        ComponentData::Mesh(mesh)
    }
}

impl From<Material> for ComponentData {
    fn from(material: Material) -> Self {
        ComponentData::Material(material)
    }
}

/// A non-transform component and its active flag. Transforms live directly on
/// the game object since every object has exactly one.
#[derive(Debug, Clone)]
pub struct Component {
    active: bool,
    data: ComponentData,
}

impl Component {
    pub fn new(data: impl Into<ComponentData>) -> Self {
        Self {
            active: true,
            data: data.into(),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.data.kind()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn data(&self) -> &ComponentData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ComponentData {
        &mut self.data
    }

    /// Per-frame update, called by the scene only while the component and its
    /// object are active.
    pub(crate) fn update(&mut self, global: Mat4, _dt: f32) {
        match &mut self.data {
            ComponentData::Mesh(mesh) => {
                mesh.world_aabb = mesh.mesh.aabb().transformed(global);
            }
            ComponentData::Material(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn mesh_update_moves_world_bounds() {
        let mut component = Component::new(MeshComponent::new(Arc::new(MeshData::cube(1.0))));
        assert_eq!(component.kind(), ComponentKind::Mesh);
        component.update(Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0)), 0.016);

        let ComponentData::Mesh(mesh) = component.data() else {
            panic!("expected a mesh component");
        };
        assert_eq!(mesh.world_aabb().center(), Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn kinds_have_labels() {
        assert_eq!(ComponentKind::Material.to_string(), "Material");
        assert_eq!(ComponentKind::ALL.len(), 3);
    }
}
