use std::fmt;

use crate::scene::component::{Component, ComponentData, ComponentKind, MeshComponent};
use crate::scene::error::SceneError;
use crate::scene::material::Material;
use crate::scene::transform::Transform;

/// Handle to a game object in a [`Scene`](crate::scene::Scene).
///
/// Combines a slot index with a generation, so a handle kept after its object
/// was removed never aliases an object created later in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GameObjectId {
    pub index: u32,
    pub generation: u32,
}

impl fmt::Display for GameObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
pub struct GameObject {
    name: String,
    active: bool,
    pub(crate) parent: Option<GameObjectId>,
    pub(crate) children: Vec<GameObjectId>,
    transform: Transform,
    components: Vec<Component>,
}

impl GameObject {
    pub(crate) fn new(name: impl Into<String>, parent: Option<GameObjectId>) -> Self {
        Self {
            name: name.into(),
            active: true,
            parent,
            children: Vec::new(),
            transform: Transform::default(),
            components: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        if active && !self.active {
            // Globals were not refreshed while inactive.
            self.transform.mark_modified();
        }
        self.active = active;
    }

    pub fn parent(&self) -> Option<GameObjectId> {
        self.parent
    }

    pub fn children(&self) -> &[GameObjectId] {
        &self.children
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Component kinds in order; the transform always comes first.
    pub fn component_kinds(&self) -> Vec<ComponentKind> {
        std::iter::once(ComponentKind::Transform)
            .chain(self.components.iter().map(Component::kind))
            .collect()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut [Component] {
        &mut self.components
    }

    pub fn has_component(&self, kind: ComponentKind) -> bool {
        kind == ComponentKind::Transform || self.component(kind).is_some()
    }

    pub fn component(&self, kind: ComponentKind) -> Option<&Component> {
        self.components.iter().find(|c| c.kind() == kind)
    }

    pub fn component_mut(&mut self, kind: ComponentKind) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.kind() == kind)
    }

    pub fn add_component(&mut self, data: impl Into<ComponentData>) -> Result<&mut Component, SceneError> {
        let data = data.into();
        let kind = data.kind();
        if self.has_component(kind) {
            return Err(SceneError::DuplicateComponent(kind));
        }
        self.components.push(Component::new(data));
        let last = self.components.len() - 1;
        Ok(&mut self.components[last])
    }

    pub fn remove_component(&mut self, kind: ComponentKind) -> Result<Component, SceneError> {
        if kind == ComponentKind::Transform {
            return Err(SceneError::TransformRequired);
        }
        let index = self
            .components
            .iter()
            .position(|c| c.kind() == kind)
            .ok_or(SceneError::MissingComponent(kind))?;
        Ok(self.components.remove(index))
    }

    pub fn mesh(&self) -> Option<&MeshComponent> {
        match self.component(ComponentKind::Mesh).map(Component::data) {
            Some(ComponentData::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn material(&self) -> Option<&Material> {
        match self.component(ComponentKind::Material).map(Component::data) {
            Some(ComponentData::Material(material)) => Some(material),
            _ => None,
        }
    }

    pub fn material_mut(&mut self) -> Option<&mut Material> {
        match self.component_mut(ComponentKind::Material).map(Component::data_mut) {
            Some(ComponentData::Material(material)) => Some(material),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::scene::mesh::MeshData;

    #[test]
    fn transform_is_always_first() {
        let mut go = GameObject::new("obj", None);
        go.add_component(Material::default()).unwrap();
        go.add_component(MeshComponent::new(Arc::new(MeshData::cube(1.0)))).unwrap();
        assert_eq!(
            go.component_kinds(),
            vec![ComponentKind::Transform, ComponentKind::Material, ComponentKind::Mesh]
        );
    }

    #[test]
    fn one_component_per_kind() {
        let mut go = GameObject::new("obj", None);
        go.add_component(Material::default()).unwrap();
        assert_eq!(
            go.add_component(Material::default()).unwrap_err(),
            SceneError::DuplicateComponent(ComponentKind::Material)
        );
    }

    #[test]
    fn transform_cannot_be_removed() {
        let mut go = GameObject::new("obj", None);
        assert_eq!(
            go.remove_component(ComponentKind::Transform).unwrap_err(),
            SceneError::TransformRequired
        );
        assert_eq!(
            go.remove_component(ComponentKind::Mesh).unwrap_err(),
            SceneError::MissingComponent(ComponentKind::Mesh)
        );

        go.add_component(Material::with_color([1.0, 0.0, 0.0, 1.0])).unwrap();
        let removed = go.remove_component(ComponentKind::Material).unwrap();
        assert_eq!(removed.kind(), ComponentKind::Material);
        assert!(go.material().is_none());
    }

    #[test]
    fn material_is_editable_in_place() {
        let mut go = GameObject::new("obj", None);
        go.add_component(Material::default()).unwrap();
        if let Some(material) = go.material_mut() {
            material.color = [0.0, 1.0, 0.0, 1.0];
        }
        assert_eq!(go.material().map(|m| m.color), Some([0.0, 1.0, 0.0, 1.0]));
    }
}
