use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::assets::error::AssetError;
use crate::scene::{GameObjectId, Material, Scene, TextureData};

/// Decodes any format the `image` crate knows into RGBA8.
pub fn load_texture(path: &Path) -> Result<TextureData, AssetError> {
    let decoded = image::open(path)?.to_rgba8();
    let (width, height) = decoded.dimensions();
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Texture".to_string());
    Ok(TextureData::new(name, width, height, decoded.into_raw())?)
}

/// Sets `texture` on the object's material, adding a material if it has
/// none.
pub fn apply_texture(scene: &mut Scene, id: GameObjectId, texture: Arc<TextureData>) -> Result<(), AssetError> {
    let object = scene.require_mut(id)?;
    info!("Applying texture '{}' to '{}'", texture.name(), object.name());
    match object.material_mut() {
        Some(material) => material.set_texture(Some(texture)),
        None => {
            let mut material = Material::default();
            material.set_texture(Some(texture));
            object.add_component(material)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_into_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        image::RgbImage::from_pixel(2, 3, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let texture = load_texture(&path).unwrap();
        assert_eq!((texture.width(), texture.height()), (2, 3));
        assert_eq!(texture.name(), "pixel.png");
        assert_eq!(&texture.pixels()[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn garbage_is_an_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(matches!(load_texture(&path), Err(AssetError::Image(_))));
    }

    #[test]
    fn texture_goes_onto_existing_or_new_material() {
        let mut scene = Scene::new();
        let bare = scene.create("bare", None).unwrap();
        let painted = scene.create("painted", None).unwrap();
        scene
            .require_mut(painted)
            .unwrap()
            .add_component(Material::with_color([0.0, 1.0, 0.0, 1.0]))
            .unwrap();

        let texture = Arc::new(TextureData::checkers(4, 2));
        apply_texture(&mut scene, bare, Arc::clone(&texture)).unwrap();
        apply_texture(&mut scene, painted, Arc::clone(&texture)).unwrap();

        let bare = scene.get(bare).unwrap().material().unwrap();
        assert_eq!(bare.texture.as_ref().map(|t| t.id()), Some(texture.id()));
        let painted = scene.get(painted).unwrap().material().unwrap();
        assert_eq!(painted.color, [0.0, 1.0, 0.0, 1.0]);
        assert!(painted.texture.is_some());
    }
}
