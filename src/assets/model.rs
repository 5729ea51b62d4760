//! glTF 2.0 import: one game object per node, meshes and base-colour
//! materials attached, node transforms preserved.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glam::{Quat, Vec3};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::assets::error::AssetError;
use crate::engine::graphics::vertex::Vertex;
use crate::scene::{GameObjectId, Material, MeshComponent, MeshData, Scene, TextureData, Transform};

/// What an import added to the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub root: GameObjectId,
    pub objects: usize,
    pub meshes: usize,
}

struct Primitive {
    mesh: Arc<MeshData>,
    material: Option<usize>,
}

struct Import {
    meshes: Vec<Vec<Primitive>>,
    materials: Vec<Material>,
    objects: usize,
}

/// Imports the model at `path` under a new root object named after the file.
/// `scale` is applied uniformly to the root.
pub fn import_model(scene: &mut Scene, path: &Path, scale: f32) -> Result<ImportSummary, AssetError> {
    info!("Importing model '{}'", path.display());
    let (document, buffers, images) = gltf::import(path)?;

    let gltf_scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| AssetError::EmptyModel(path.to_path_buf()))?;

    let meshes: Vec<gltf::Mesh> = document.meshes().collect();
    let extracted = meshes
        .par_iter()
        .map(|mesh| extract_mesh(mesh, &buffers))
        .collect::<Result<Vec<_>, AssetError>>()?;
    let mesh_count = extracted.iter().map(Vec::len).sum();

    let mut import = Import {
        meshes: extracted,
        materials: read_materials(&document, &images),
        objects: 1,
    };

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Model".to_string());
    let root = scene.create(name, None)?;
    scene
        .require_mut(root)?
        .transform_mut()
        .set_scale(Vec3::splat(scale));

    for node in gltf_scene.nodes() {
        import.add_node(scene, &node, root)?;
    }

    debug!(
        "Imported {} object(s) and {} mesh(es) from '{}'",
        import.objects,
        mesh_count,
        path.display()
    );
    Ok(ImportSummary {
        root,
        objects: import.objects,
        meshes: mesh_count,
    })
}

impl Import {
    fn add_node(&mut self, scene: &mut Scene, node: &gltf::Node, parent: GameObjectId) -> Result<(), AssetError> {
        let name = node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Node {}", node.index()));
        let id = scene.create(name.clone(), Some(parent))?;
        self.objects += 1;

        let (translation, rotation, scale) = node.transform().decomposed();
        *scene.require_mut(id)?.transform_mut() = Transform::new(
            Vec3::from(translation),
            Quat::from_array(rotation),
            Vec3::from(scale),
        );

        if let Some(mesh) = node.mesh() {
            let primitives = self.meshes.get(mesh.index()).map(Vec::as_slice).unwrap_or(&[]);
            let mut created = 0;
            match primitives {
                [] => {}
                [single] => self.attach(scene, id, single)?,
                many => {
                    // One child per primitive so each keeps its own material.
                    for (i, primitive) in many.iter().enumerate() {
                        let child = scene.create(format!("{} [{}]", name, i), Some(id))?;
                        created += 1;
                        self.attach(scene, child, primitive)?;
                    }
                }
            }
            self.objects += created;
        }

        for child in node.children() {
            self.add_node(scene, &child, id)?;
        }
        Ok(())
    }

    fn attach(&self, scene: &mut Scene, id: GameObjectId, primitive: &Primitive) -> Result<(), AssetError> {
        let object = scene.require_mut(id)?;
        object.add_component(MeshComponent::new(Arc::clone(&primitive.mesh)))?;
        let material = primitive
            .material
            .and_then(|index| self.materials.get(index).cloned())
            .unwrap_or_default();
        object.add_component(material)?;
        Ok(())
    }
}

fn extract_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> Result<Vec<Primitive>, AssetError> {
    let mesh_name = mesh
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Mesh {}", mesh.index()));

    let mut primitives = Vec::new();
    for (i, primitive) in mesh.primitives().enumerate() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            warn!("Skipping primitive {} of '{}': {:?} is not supported", i, mesh_name, primitive.mode());
            continue;
        }

        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            warn!("Skipping primitive {} of '{}': no positions", i, mesh_name);
            continue;
        };
        let positions: Vec<Vec3> = positions.map(Vec3::from).collect();

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        let normals: Vec<Vec3> = match reader.read_normals() {
            Some(normals) => normals.map(Vec3::from).collect(),
            None => smooth_normals(&positions, &indices),
        };
        let tex_coords: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
            Some(coords) => coords.into_f32().collect(),
            None => vec![[0.0, 0.0]; positions.len()],
        };

        let vertices = positions
            .iter()
            .enumerate()
            .map(|(v, position)| {
                Vertex::new(
                    *position,
                    normals.get(v).copied().unwrap_or(Vec3::Y),
                    tex_coords.get(v).copied().unwrap_or([0.0, 0.0]),
                )
            })
            .collect();

        let name = if i == 0 { mesh_name.clone() } else { format!("{} [{}]", mesh_name, i) };
        primitives.push(Primitive {
            mesh: Arc::new(MeshData::new(name, vertices, indices)?),
            material: primitive.material().index(),
        });
    }
    Ok(primitives)
}

/// Area-weighted vertex normals for meshes exported without them.
fn smooth_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
        .collect()
}

fn read_materials(document: &gltf::Document, images: &[gltf::image::Data]) -> Vec<Material> {
    let mut textures: HashMap<usize, Option<Arc<TextureData>>> = HashMap::new();
    document
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            let texture = pbr.base_color_texture().and_then(|info| {
                let source = info.texture().source().index();
                textures
                    .entry(source)
                    .or_insert_with(|| {
                        images
                            .get(source)
                            .and_then(|image| convert_image(image, material.name().unwrap_or("Texture")))
                    })
                    .clone()
            });
            Material {
                color: pbr.base_color_factor(),
                texture,
            }
        })
        .collect()
}

fn convert_image(image: &gltf::image::Data, name: &str) -> Option<Arc<TextureData>> {
    use gltf::image::Format;

    let pixels = match image.format {
        Format::R8G8B8A8 => image.pixels.clone(),
        Format::R8G8B8 => image
            .pixels
            .chunks_exact(3)
            .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
            .collect(),
        Format::R8 => image.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        other => {
            warn!("Texture '{}' uses unsupported format {:?}", name, other);
            return None;
        }
    };
    match TextureData::new(name, image.width, image.height, pixels) {
        Ok(texture) => Some(Arc::new(texture)),
        Err(e) => {
            warn!("Dropping texture '{}': {}", name, e);
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;

    use crate::scene::ComponentKind;

    /// Writes a two-node glTF (a parent translated by (1, 2, 3) and a red
    /// triangle child scaled by 2) and returns the .gltf path.
    pub(crate) fn write_triangle_model(dir: &Path) -> std::path::PathBuf {
        let mut bin = Vec::new();
        for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bin.extend_from_slice(&value.to_le_bytes());
        }
        for index in [0u16, 1, 2] {
            bin.extend_from_slice(&index.to_le_bytes());
        }
        bin.extend_from_slice(&[0, 0]);
        fs::write(dir.join("triangle.bin"), &bin).unwrap();

        let gltf = r#"{
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [ { "nodes": [0] } ],
            "nodes": [
                { "name": "Root", "children": [1], "translation": [1.0, 2.0, 3.0] },
                { "name": "Triangle", "mesh": 0, "scale": [2.0, 2.0, 2.0] }
            ],
            "meshes": [ { "name": "Tri", "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 } ] } ],
            "materials": [ { "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0] } } ],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
                { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
            ],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }
            ],
            "buffers": [ { "uri": "triangle.bin", "byteLength": 44 } ]
        }"#;
        let path = dir.join("triangle.gltf");
        fs::write(&path, gltf).unwrap();
        path
    }

    #[test]
    fn import_builds_node_hierarchy() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_triangle_model(dir.path());
        let mut scene = Scene::new();

        let summary = import_model(&mut scene, &path, 1.0).unwrap();
        assert_eq!(summary.objects, 3);
        assert_eq!(summary.meshes, 1);

        let root = scene.get(summary.root).unwrap();
        assert_eq!(root.name(), "triangle");
        let node = root.children()[0];
        assert_eq!(scene.get(node).unwrap().name(), "Root");
        let triangle = scene.children(node)[0];

        scene.update(0.0);
        let object = scene.get(triangle).unwrap();
        assert_eq!(object.name(), "Triangle");
        assert_eq!(
            object.component_kinds(),
            vec![ComponentKind::Transform, ComponentKind::Mesh, ComponentKind::Material]
        );
        assert_eq!(object.transform().world_position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(object.material().map(|m| m.color), Some([1.0, 0.0, 0.0, 1.0]));

        let mesh = object.mesh().unwrap().mesh();
        assert_eq!(mesh.triangle_count(), 1);
        // Normals are generated when the file has none.
        assert!(mesh
            .vertices()
            .iter()
            .all(|v| Vec3::from(v.normal).abs_diff_eq(Vec3::Z, 1e-5)));
        assert_eq!(scene.renderables().len(), 1);
    }

    #[test]
    fn import_scale_applies_to_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_triangle_model(dir.path());
        let mut scene = Scene::new();
        let summary = import_model(&mut scene, &path, 0.5).unwrap();
        scene.update(0.0);
        let triangle = scene.find_by_name("Triangle").unwrap();
        let world = scene.get(triangle).unwrap().transform().world_position();
        assert!(world.abs_diff_eq(Vec3::new(0.5, 1.0, 1.5), 1e-5));
        assert!(scene.contains(summary.root));
    }

    #[test]
    fn missing_file_is_a_gltf_error() {
        let mut scene = Scene::new();
        let result = import_model(&mut scene, Path::new("does/not/exist.gltf"), 1.0);
        assert!(matches!(result, Err(AssetError::Gltf(_))));
        assert!(scene.is_empty());
    }

    #[test]
    fn generated_normals_face_out_of_the_triangle() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let normals = smooth_normals(&positions, &[0, 1, 2]);
        assert!(normals.iter().all(|n| n.abs_diff_eq(Vec3::Z, 1e-6)));
    }
}
