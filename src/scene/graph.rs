use std::sync::Arc;

use glam::Mat4;
use log::debug;

use crate::scene::component::ComponentKind;
use crate::scene::error::SceneError;
use crate::scene::game_object::{GameObject, GameObjectId};
use crate::scene::material::Material;
use crate::scene::mesh::{Aabb, MeshData};

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    object: Option<GameObject>,
}

/// What the renderer needs to draw one object.
#[derive(Debug, Clone)]
pub struct Renderable {
    pub id: GameObjectId,
    pub mesh: Arc<MeshData>,
    pub model: Mat4,
    pub material: Option<Material>,
}

/// Owns every game object. Objects form a forest; each root is a top-level
/// object of the scene.
#[derive(Debug, Default)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    roots: Vec<GameObjectId>,
    selected: Option<GameObjectId>,
    pending_removal: Vec<GameObjectId>,
    len: usize,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, name: impl Into<String>, parent: Option<GameObjectId>) -> Result<GameObjectId, SceneError> {
        if let Some(parent) = parent {
            self.require(parent)?;
        }

        let id = match self.free.pop() {
            Some(index) => GameObjectId {
                index,
                generation: self.slots[index as usize].generation,
            },
            None => {
                self.slots.push(Slot::default());
                GameObjectId {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        self.slots[id.index as usize].object = Some(GameObject::new(name, parent));
        self.attach(id, parent);
        self.len += 1;
        Ok(id)
    }

    pub fn get(&self, id: GameObjectId) -> Option<&GameObject> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_ref())
    }

    pub fn get_mut(&mut self, id: GameObjectId) -> Option<&mut GameObject> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.object.as_mut())
    }

    pub fn require(&self, id: GameObjectId) -> Result<&GameObject, SceneError> {
        self.get(id).ok_or(SceneError::StaleId(id))
    }

    pub fn require_mut(&mut self, id: GameObjectId) -> Result<&mut GameObject, SceneError> {
        self.get_mut(id).ok_or(SceneError::StaleId(id))
    }

    pub fn contains(&self, id: GameObjectId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn roots(&self) -> &[GameObjectId] {
        &self.roots
    }

    /// Children of `id`, empty when the id is stale.
    pub fn children(&self, id: GameObjectId) -> &[GameObjectId] {
        self.get(id).map(GameObject::children).unwrap_or(&[])
    }

    /// Removes an object and its whole subtree. Returns how many objects went.
    pub fn remove(&mut self, id: GameObjectId) -> Result<usize, SceneError> {
        let parent = self.require(id)?.parent();
        self.detach(id, parent);

        let subtree = self.subtree(id);
        for removed in &subtree {
            let slot = &mut self.slots[removed.index as usize];
            slot.object = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(removed.index);
        }
        if self.selected.is_some_and(|s| subtree.contains(&s)) {
            self.selected = None;
        }
        self.len -= subtree.len();
        debug!("Removed {} game object(s) under {}", subtree.len(), id);
        Ok(subtree.len())
    }

    /// Defers a removal to the next `apply_removals`, so objects can be
    /// deleted while the scene is being iterated.
    pub fn queue_removal(&mut self, id: GameObjectId) {
        if !self.pending_removal.contains(&id) {
            self.pending_removal.push(id);
        }
    }

    pub fn apply_removals(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending_removal);
        // Ids inside an already removed subtree are stale by now.
        pending
            .into_iter()
            .filter_map(|id| self.remove(id).ok())
            .sum()
    }

    pub fn reparent(&mut self, id: GameObjectId, new_parent: Option<GameObjectId>) -> Result<(), SceneError> {
        let old_parent = self.require(id)?.parent();
        if let Some(parent) = new_parent {
            self.require(parent)?;
            if parent == id || self.is_ancestor(id, parent) {
                return Err(SceneError::Cycle { child: id, parent });
            }
        }
        if old_parent == new_parent {
            return Ok(());
        }

        self.detach(id, old_parent);
        self.attach(id, new_parent);
        let object = self.require_mut(id)?;
        object.parent = new_parent;
        object.transform_mut().mark_modified();
        Ok(())
    }

    /// Whether `ancestor` is on the parent chain of `id`.
    pub fn is_ancestor(&self, ancestor: GameObjectId, id: GameObjectId) -> bool {
        let mut current = self.get(id).and_then(GameObject::parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.get(parent).and_then(GameObject::parent);
        }
        false
    }

    /// Every object in pre-order with its depth, roots first.
    pub fn iter_depth_first(&self) -> Vec<(GameObjectId, usize)> {
        let mut out = Vec::with_capacity(self.len);
        let mut stack: Vec<(GameObjectId, usize)> = self.roots.iter().rev().map(|id| (*id, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            stack.extend(self.children(id).iter().rev().map(|child| (*child, depth + 1)));
        }
        out
    }

    pub fn select(&mut self, id: Option<GameObjectId>) -> bool {
        match id {
            Some(id) if !self.contains(id) => false,
            _ => {
                self.selected = id;
                true
            }
        }
    }

    pub fn selected(&self) -> Option<GameObjectId> {
        self.selected.filter(|id| self.contains(*id))
    }

    pub fn find_by_name(&self, name: &str) -> Option<GameObjectId> {
        self.iter_depth_first()
            .into_iter()
            .map(|(id, _)| id)
            .find(|id| self.get(*id).is_some_and(|go| go.name() == name))
    }

    /// Removes every object. Existing ids become stale.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.object.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.roots.clear();
        self.pending_removal.clear();
        self.selected = None;
        self.len = 0;
    }

    /// Propagates transforms down the active part of the tree and updates
    /// active components.
    pub fn update(&mut self, dt: f32) {
        let mut stack: Vec<(GameObjectId, Mat4, bool)> =
            self.roots.iter().rev().map(|id| (*id, Mat4::IDENTITY, false)).collect();

        while let Some((id, parent_global, parent_changed)) = stack.pop() {
            let Some(object) = self.get_mut(id) else {
                continue;
            };
            if !object.is_active() {
                continue;
            }

            let changed = parent_changed || object.transform().is_modified();
            if changed {
                object.transform_mut().refresh(parent_global);
            }
            let global = object.transform().global_matrix();
            for component in object.components_mut() {
                if component.is_active() {
                    component.update(global, dt);
                }
            }
            stack.extend(object.children().iter().rev().map(|child| (*child, global, changed)));
        }
    }

    /// Active objects (with active ancestors) that carry an active mesh.
    pub fn renderables(&self) -> Vec<Renderable> {
        let mut out = Vec::new();
        self.walk_active(|id, object| {
            let Some(mesh) = object.mesh() else {
                return;
            };
            let mesh_active = object
                .component(ComponentKind::Mesh)
                .is_some_and(|c| c.is_active());
            if !mesh_active {
                return;
            }
            let material_active = object
                .component(ComponentKind::Material)
                .is_some_and(|c| c.is_active());
            out.push(Renderable {
                id,
                mesh: mesh.mesh().clone(),
                model: object.transform().global_matrix(),
                material: object.material().filter(|_| material_active).cloned(),
            });
        });
        out
    }

    /// World-space bounds of the meshes under `id`, as of the last update.
    pub fn world_bounds(&self, id: GameObjectId) -> Option<Aabb> {
        self.subtree(id)
            .into_iter()
            .filter_map(|id| self.get(id).and_then(GameObject::mesh))
            .map(|mesh| mesh.world_aabb())
            .reduce(|a, b| a.union(&b))
    }

    fn walk_active(&self, mut visit: impl FnMut(GameObjectId, &GameObject)) {
        let mut stack: Vec<GameObjectId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(object) = self.get(id).filter(|o| o.is_active()) else {
                continue;
            };
            visit(id, object);
            stack.extend(object.children().iter().rev().copied());
        }
    }

    fn subtree(&self, id: GameObjectId) -> Vec<GameObjectId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if self.contains(next) {
                out.push(next);
                stack.extend_from_slice(self.children(next));
            }
        }
        out
    }

    fn attach(&mut self, id: GameObjectId, parent: Option<GameObjectId>) {
        match parent.and_then(|p| self.get_mut(p)) {
            Some(parent) => parent.children.push(id),
            None => self.roots.push(id),
        }
    }

    fn detach(&mut self, id: GameObjectId, parent: Option<GameObjectId>) {
        match parent.and_then(|p| self.get_mut(p)) {
            Some(parent) => parent.children.retain(|child| *child != id),
            None => self.roots.retain(|root| *root != id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    use crate::scene::component::MeshComponent;

    fn cube() -> MeshComponent {
        MeshComponent::new(Arc::new(MeshData::cube(1.0)))
    }

    #[test]
    fn removing_a_parent_removes_its_subtree() {
        let mut scene = Scene::new();
        let root = scene.create("root", None).unwrap();
        let child = scene.create("child", Some(root)).unwrap();
        let grandchild = scene.create("grandchild", Some(child)).unwrap();
        let other = scene.create("other", None).unwrap();
        scene.select(Some(grandchild));

        assert_eq!(scene.remove(root).unwrap(), 3);
        assert_eq!(scene.len(), 1);
        assert!(!scene.contains(child));
        assert!(!scene.contains(grandchild));
        assert_eq!(scene.roots(), &[other]);
        assert_eq!(scene.selected(), None);
    }

    #[test]
    fn stale_ids_do_not_alias_reused_slots() {
        let mut scene = Scene::new();
        let first = scene.create("first", None).unwrap();
        scene.remove(first).unwrap();
        let second = scene.create("second", None).unwrap();

        assert_eq!(first.index, second.index);
        assert_ne!(first, second);
        assert!(scene.get(first).is_none());
        assert_eq!(scene.remove(first), Err(SceneError::StaleId(first)));
        assert_eq!(
            scene.create("orphan", Some(first)),
            Err(SceneError::StaleId(first))
        );
    }

    #[test]
    fn reparent_rejects_cycles() {
        let mut scene = Scene::new();
        let a = scene.create("a", None).unwrap();
        let b = scene.create("b", Some(a)).unwrap();
        let c = scene.create("c", Some(b)).unwrap();

        assert_eq!(
            scene.reparent(a, Some(c)),
            Err(SceneError::Cycle { child: a, parent: c })
        );
        assert!(scene.reparent(a, Some(a)).is_err());

        scene.reparent(c, None).unwrap();
        assert_eq!(scene.roots(), &[a, c]);
        assert!(scene.children(b).is_empty());
        assert_eq!(scene.get(c).and_then(GameObject::parent), None);
    }

    #[test]
    fn globals_follow_parent_changes() {
        let mut scene = Scene::new();
        let parent = scene.create("parent", None).unwrap();
        let child = scene.create("child", Some(parent)).unwrap();
        scene.require_mut(parent).unwrap().transform_mut().set_position(Vec3::new(0.0, 5.0, 0.0));
        scene.require_mut(child).unwrap().transform_mut().set_position(Vec3::X);
        scene.update(0.016);

        let world = |scene: &Scene, id| scene.get(id).unwrap().transform().world_position();
        assert!(world(&scene, child).abs_diff_eq(Vec3::new(1.0, 5.0, 0.0), 1e-6));

        // Only the parent changes; the child global still moves.
        scene.require_mut(parent).unwrap().transform_mut().set_position(Vec3::new(0.0, 0.0, 2.0));
        scene.update(0.016);
        assert!(world(&scene, child).abs_diff_eq(Vec3::new(1.0, 0.0, 2.0), 1e-6));

        scene.reparent(child, None).unwrap();
        scene.update(0.016);
        assert!(world(&scene, child).abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn inactive_subtrees_are_not_rendered() {
        let mut scene = Scene::new();
        let parent = scene.create("parent", None).unwrap();
        let child = scene.create("child", Some(parent)).unwrap();
        let lone = scene.create("lone", None).unwrap();
        scene.require_mut(child).unwrap().add_component(cube()).unwrap();
        scene.require_mut(lone).unwrap().add_component(cube()).unwrap();
        scene.update(0.016);
        assert_eq!(scene.renderables().len(), 2);

        scene.require_mut(parent).unwrap().set_active(false);
        let ids: Vec<_> = scene.renderables().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![lone]);

        scene
            .require_mut(lone)
            .unwrap()
            .component_mut(ComponentKind::Mesh)
            .unwrap()
            .set_active(false);
        assert!(scene.renderables().is_empty());
    }

    #[test]
    fn deferred_removals_tolerate_stale_ids() {
        let mut scene = Scene::new();
        let parent = scene.create("parent", None).unwrap();
        let child = scene.create("child", Some(parent)).unwrap();
        scene.queue_removal(parent);
        scene.queue_removal(child);
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.apply_removals(), 2);
        assert!(scene.is_empty());
    }

    #[test]
    fn depth_first_order_and_bounds() {
        let mut scene = Scene::new();
        let a = scene.create("a", None).unwrap();
        let b = scene.create("b", Some(a)).unwrap();
        let c = scene.create("c", None).unwrap();
        let order: Vec<_> = scene.iter_depth_first();
        assert_eq!(order, vec![(a, 0), (b, 1), (c, 0)]);
        assert_eq!(scene.find_by_name("b"), Some(b));

        scene.require_mut(b).unwrap().add_component(cube()).unwrap();
        scene.require_mut(b).unwrap().transform_mut().set_position(Vec3::new(4.0, 0.0, 0.0));
        scene.update(0.0);
        assert_eq!(scene.world_bounds(a).map(|aabb| aabb.center()), Some(Vec3::new(4.0, 0.0, 0.0)));
        assert_eq!(scene.world_bounds(c), None);

        scene.clear();
        assert!(scene.is_empty());
        assert!(!scene.contains(a));
    }
}
