use serde::{Deserialize, Serialize};

/// Render flags toggled from the editor and persisted under `"renderer"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub draw_normals: bool,
    pub draw_wireframe: bool,
    pub draw_meshes: bool,
    pub enable_depth: bool,
    pub enable_face_culling: bool,
    pub enable_lighting: bool,
    /// Use the material base colour. Off renders every mesh white.
    pub enable_color: bool,
    pub enable_textures: bool,
    pub vsync: bool,
    pub clear_color: [f32; 4],
    pub normal_length: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            draw_normals: false,
            draw_wireframe: false,
            draw_meshes: true,
            enable_depth: true,
            enable_face_culling: true,
            enable_lighting: true,
            enable_color: true,
            enable_textures: true,
            vsync: true,
            clear_color: [0.1, 0.1, 0.1, 1.0],
            normal_length: 0.2,
        }
    }
}

/// The fixed-function state a mesh pipeline is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub depth: bool,
    pub cull: bool,
    pub wireframe: bool,
}

impl RenderSettings {
    pub fn pipeline_key(&self, wireframe_supported: bool) -> PipelineKey {
        PipelineKey {
            depth: self.enable_depth,
            cull: self.enable_face_culling,
            wireframe: self.draw_wireframe && wireframe_supported,
        }
    }

    pub fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wireframe_needs_adapter_support() {
        let settings = RenderSettings {
            draw_wireframe: true,
            ..Default::default()
        };
        assert!(settings.pipeline_key(true).wireframe);
        assert!(!settings.pipeline_key(false).wireframe);
    }

    #[test]
    fn missing_keys_use_defaults() {
        let settings: RenderSettings =
            serde_json::from_value(serde_json::json!({"enable_depth": false})).unwrap();
        assert!(!settings.enable_depth);
        assert!(settings.draw_meshes);
        assert_eq!(settings.present_mode(), wgpu::PresentMode::AutoVsync);
    }
}
