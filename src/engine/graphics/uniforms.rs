//! CPU-side layouts of the shader uniforms and the math that fills them.

use glam::{Mat4, Vec3};

use crate::engine::graphics::settings::RenderSettings;
use crate::scene::Material;

pub const Z_NEAR: f32 = 0.125;
pub const Z_FAR: f32 = 512.0;
pub const AMBIENT: f32 = 0.25;
pub const DIFFUSE: f32 = 0.75;

/// Right-handed perspective with a [0, 1] depth range.
pub fn projection(fov_y_degrees: f32, aspect: f32) -> Mat4 {
    let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
    Mat4::perspective_rh(fov_y_degrees.to_radians(), aspect, Z_NEAR, Z_FAR)
}

pub fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    pub light_position: [f32; 4],
    /// ambient, diffuse, enabled (0/1), unused
    pub light: [f32; 4],
}

impl FrameUniform {
    pub fn new(projection: Mat4, view: Mat4, eye: Vec3, lighting: bool) -> Self {
        Self {
            view_proj: (projection * view).to_cols_array_2d(),
            eye: eye.extend(1.0).to_array(),
            // The single light rides on the camera.
            light_position: eye.extend(1.0).to_array(),
            light: [AMBIENT, DIFFUSE, if lighting { 1.0 } else { 0.0 }, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// x: sample the texture
    pub flags: [u32; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, material: Option<&Material>, settings: &RenderSettings) -> Self {
        let color = match material {
            Some(material) if settings.enable_color => material.color,
            _ => [1.0, 1.0, 1.0, 1.0],
        };
        let textured = settings.enable_textures && material.is_some_and(|m| m.texture.is_some());
        Self {
            model: model.to_cols_array_2d(),
            normal: model.inverse().transpose().to_cols_array_2d(),
            color,
            flags: [textured as u32, 0, 0, 0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::scene::TextureData;

    #[test]
    fn uniform_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 112);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 160);
        assert_eq!(align_to(160, 256), 256);
        assert_eq!(align_to(512, 256), 512);
    }

    #[test]
    fn projection_maps_near_and_far_to_depth_range() {
        let proj = projection(60.0, 16.0 / 9.0);
        let near = proj.project_point3(Vec3::new(0.0, 0.0, -Z_NEAR));
        let far = proj.project_point3(Vec3::new(0.0, 0.0, -Z_FAR));
        assert!(near.z.abs() < 1e-4);
        assert!((far.z - 1.0).abs() < 1e-4);
        assert!(projection(60.0, 0.0).is_finite());
    }

    #[test]
    fn flags_follow_settings() {
        let material = Material {
            color: [1.0, 0.0, 0.0, 1.0],
            texture: Some(Arc::new(TextureData::checkers(2, 2))),
        };
        let mut settings = RenderSettings::default();
        let uniform = ObjectUniform::new(Mat4::IDENTITY, Some(&material), &settings);
        assert_eq!(uniform.color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniform.flags[0], 1);

        settings.enable_color = false;
        settings.enable_textures = false;
        let uniform = ObjectUniform::new(Mat4::IDENTITY, Some(&material), &settings);
        assert_eq!(uniform.color, [1.0; 4]);
        assert_eq!(uniform.flags[0], 0);
    }

    #[test]
    fn light_sits_on_the_eye() {
        let eye = Vec3::new(1.0, 2.0, 3.0);
        let frame = FrameUniform::new(Mat4::IDENTITY, Mat4::IDENTITY, eye, false);
        assert_eq!(frame.light_position, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(frame.light[2], 0.0);
    }
}
