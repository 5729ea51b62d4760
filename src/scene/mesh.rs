use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat4, Vec3};

use crate::engine::graphics::vertex::{Vertex, CUBE_FACES, CUBE_POSITIONS};
use crate::scene::error::SceneError;

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Ids for GPU-cacheable resources. Unique for the whole process.
pub(crate) fn next_resource_id() -> u64 {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Axis-aligned box enclosing this box after `matrix`.
    pub fn transformed(&self, matrix: Mat4) -> Self {
        let corners = self.corners().map(|c| matrix.transform_point3(c));
        let (min, max) = corners[1..]
            .iter()
            .fold((corners[0], corners[0]), |(min, max), p| (min.min(*p), max.max(*p)));
        Self { min, max }
    }

    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Immutable triangle mesh shared between game objects and the renderer.
#[derive(Debug)]
pub struct MeshData {
    id: u64,
    name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    aabb: Aabb,
}

impl MeshData {
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self, SceneError> {
        let name = name.into();
        let invalid = |reason: String| SceneError::InvalidMesh {
            name: name.clone(),
            reason,
        };
        if indices.len() % 3 != 0 {
            return Err(invalid(format!("{} indices is not a triangle list", indices.len())));
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(invalid(format!("index {} out of {} vertices", bad, vertices.len())));
        }
        let aabb = Aabb::from_points(vertices.iter().map(|v| Vec3::from(v.position)))
            .ok_or_else(|| invalid("no vertices".to_string()))?;

        Ok(Self {
            id: next_resource_id(),
            name,
            vertices,
            indices,
            aabb,
        })
    }

    pub fn cube(size: f32) -> Self {
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];
        for (corners, normal) in CUBE_FACES {
            let base = vertices.len() as u32;
            for (corner, uv) in corners.iter().zip(uvs) {
                let position = Vec3::from(CUBE_POSITIONS[*corner]) * size;
                vertices.push(Vertex::new(position, Vec3::from(normal), uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        let half = Vec3::splat(size * 0.5);
        Self {
            id: next_resource_id(),
            name: "Cube".to_string(),
            vertices,
            indices,
            aabb: Aabb { min: -half, max: half },
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Segments from each vertex along its normal, in mesh space.
    pub fn normal_segments(&self, length: f32) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        self.vertices.iter().map(move |v| {
            let p = Vec3::from(v.position);
            (p, p + Vec3::from(v.normal) * length)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32, z: f32) -> Vertex {
        Vertex::new(Vec3::new(x, y, z), Vec3::Y, [0.0, 0.0])
    }

    #[test]
    fn new_computes_bounds_and_unique_ids() {
        let a = MeshData::new(
            "tri",
            vec![vertex(0.0, 0.0, 0.0), vertex(2.0, 0.0, 0.0), vertex(0.0, 3.0, -1.0)],
            vec![0, 1, 2],
        )
        .unwrap();
        assert_eq!(a.aabb().min, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(a.aabb().max, Vec3::new(2.0, 3.0, 0.0));
        assert_eq!(a.triangle_count(), 1);

        let b = MeshData::cube(1.0);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let err = MeshData::new("bad", vec![vertex(0.0, 0.0, 0.0)], vec![0, 1, 2]).unwrap_err();
        assert!(matches!(err, SceneError::InvalidMesh { .. }));
        assert!(MeshData::new("empty", Vec::new(), Vec::new()).is_err());
    }

    #[test]
    fn cube_has_six_quads() {
        let cube = MeshData::cube(2.0);
        assert_eq!(cube.vertices().len(), 24);
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.aabb().size(), Vec3::splat(2.0));
        assert_eq!(cube.normal_segments(1.0).count(), 24);
    }

    #[test]
    fn transformed_box_encloses_rotation() {
        let aabb = Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        let moved = aabb.transformed(Mat4::from_translation(Vec3::X * 10.0));
        assert_eq!(moved.center(), Vec3::X * 10.0);

        let rotated = aabb.transformed(Mat4::from_rotation_y(std::f32::consts::FRAC_PI_4));
        assert!(rotated.max.x > 1.4 && rotated.max.x < 1.5);
    }
}
