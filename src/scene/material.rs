use std::sync::Arc;

use crate::scene::error::SceneError;
use crate::scene::mesh::next_resource_id;

/// Decoded RGBA8 image, shared between materials and the renderer.
#[derive(Debug)]
pub struct TextureData {
    id: u64,
    name: String,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureData {
    pub fn new(name: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, SceneError> {
        let name = name.into();
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(SceneError::InvalidTexture {
                reason: format!("{}x{} needs {} bytes, got {}", width, height, expected, pixels.len()),
                name,
            });
        }
        Ok(Self {
            id: next_resource_id(),
            name,
            width,
            height,
            pixels,
        })
    }

    /// Black and white checkerboard with `cells` squares per side.
    pub fn checkers(size: u32, cells: u32) -> Self {
        let size = size.max(1);
        let cell = (size / cells.max(1)).max(1);
        let mut pixels = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let value = if ((x / cell) + (y / cell)) % 2 == 0 { 255 } else { 0 };
                pixels.extend_from_slice(&[value, value, value, 255]);
            }
        }
        Self {
            id: next_resource_id(),
            name: "Checkers".to_string(),
            width: size,
            height: size,
            pixels,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

#[derive(Debug, Clone)]
pub struct Material {
    pub color: [f32; 4],
    pub texture: Option<Arc<TextureData>>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0, 1.0],
            texture: None,
        }
    }
}

impl Material {
    pub fn with_color(color: [f32; 4]) -> Self {
        Self { color, texture: None }
    }

    pub fn set_texture(&mut self, texture: Option<Arc<TextureData>>) {
        self.texture = texture;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_count_must_match_size() {
        assert!(TextureData::new("ok", 2, 1, vec![0; 8]).is_ok());
        assert!(matches!(
            TextureData::new("short", 2, 2, vec![0; 8]),
            Err(SceneError::InvalidTexture { .. })
        ));
        assert!(TextureData::new("empty", 0, 0, Vec::new()).is_err());
    }

    #[test]
    fn checkers_alternate() {
        let tex = TextureData::checkers(4, 2);
        assert_eq!(tex.pixels().len(), 64);
        let pixel = |x: usize, y: usize| tex.pixels()[(y * 4 + x) * 4];
        assert_eq!(pixel(0, 0), 255);
        assert_eq!(pixel(2, 0), 0);
        assert_eq!(pixel(2, 2), 255);
    }
}
