use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU64;
use std::sync::Arc;

use glam::Mat4;
use log::{debug, error, info, warn};
use serde_json::Value;
use wgpu::util::DeviceExt;
use winit::keyboard::KeyCode;
use winit::window::Window;

use crate::engine::context::{EngineContext, GpuInfo, UiFrame};
use crate::engine::error::EngineError;
use crate::engine::graphics::settings::{PipelineKey, RenderSettings};
use crate::engine::graphics::texture::Texture;
use crate::engine::graphics::uniforms::{align_to, projection, FrameUniform, ObjectUniform};
use crate::engine::graphics::vertex::{LineVertex, Vertex};
use crate::engine::module::{parse_section, to_section, Module, UpdateStatus};
use crate::scene::{MeshData, Renderable};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const NORMAL_COLOR: [f32; 4] = [0.2, 0.8, 1.0, 1.0];
const INITIAL_OBJECTS: u64 = 64;
const INITIAL_LINES: u64 = 4096;

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn new(device: &wgpu::Device, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(mesh.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(mesh.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices().len() as u32,
        }
    }
}

/// Segments along every vertex normal of the renderables, in world space.
pub fn normal_lines(renderables: &[Renderable], length: f32) -> Vec<LineVertex> {
    let mut lines = Vec::new();
    for renderable in renderables {
        for (from, to) in renderable.mesh.normal_segments(length) {
            lines.push(LineVertex::new(renderable.model.transform_point3(from), NORMAL_COLOR));
            lines.push(LineVertex::new(renderable.model.transform_point3(to), NORMAL_COLOR));
        }
    }
    lines
}

fn depth_state(depth: bool) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: depth,
        depth_compare: if depth {
            wgpu::CompareFunction::Less
        } else {
            wgpu::CompareFunction::Always
        },
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            label: Some("Depth Texture"),
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_mesh_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    key: PipelineKey,
) -> wgpu::RenderPipeline {
    debug!("Building mesh pipeline {:?}", key);
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Mesh Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[Vertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: key.cull.then_some(wgpu::Face::Back),
            polygon_mode: if key.wireframe {
                wgpu::PolygonMode::Line
            } else {
                wgpu::PolygonMode::Fill
            },
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(depth_state(key.depth)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

fn create_line_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    depth: bool,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Line Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[LineVertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::LineList,
            ..Default::default()
        },
        depth_stencil: Some(depth_state(depth)),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

/// GPU state and the passes drawn every frame: scene meshes, debug lines and
/// the editor UI on top.
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    wireframe_supported: bool,
    depth_view: wgpu::TextureView,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    object_layout: wgpu::BindGroupLayout,
    object_buffer: wgpu::Buffer,
    object_bind_group: wgpu::BindGroup,
    object_capacity: u64,
    object_stride: u64,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white: Texture,
    mesh_shader: wgpu::ShaderModule,
    mesh_layout: wgpu::PipelineLayout,
    mesh_pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    line_pipeline_depth: wgpu::RenderPipeline,
    line_pipeline_overlay: wgpu::RenderPipeline,
    line_buffer: wgpu::Buffer,
    line_capacity: u64,
    meshes: HashMap<u64, GpuMesh>,
    textures: HashMap<u64, Texture>,
    egui: egui_wgpu::Renderer,
}

impl Renderer {
    pub fn new(window: Arc<Window>, settings: &RenderSettings) -> Result<(Self, GpuInfo), EngineError> {
        pollster::block_on(Self::init_wgpu(window, settings))
    }

    async fn init_wgpu(window: Arc<Window>, settings: &RenderSettings) -> Result<(Self, GpuInfo), EngineError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window).map_err(|e| {
            error!("Failed to create surface: {:?}", e);
            EngineError::Graphics(e.to_string())
        })?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| {
                error!("Failed to request adapter");
                EngineError::Graphics("no compatible GPU adapter".to_string())
            })?;

        let wireframe_supported = adapter.features().contains(wgpu::Features::POLYGON_MODE_LINE);
        let required_features = if wireframe_supported {
            wgpu::Features::POLYGON_MODE_LINE
        } else {
            wgpu::Features::empty()
        };
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("NewGine Device"),
                    required_features,
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await
            .map_err(|e| {
                error!("Failed to request device: {:?}", e);
                EngineError::Graphics(e.to_string())
            })?;

        let adapter_info = adapter.get_info();
        let gpu_info = GpuInfo {
            adapter: adapter_info.name,
            backend: format!("{:?}", adapter_info.backend),
            device_type: format!("{:?}", adapter_info.device_type),
            driver: adapter_info.driver,
            driver_info: adapter_info.driver_info,
            wireframe_supported,
        };

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| EngineError::Graphics("surface reports no formats".to_string()))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: settings.present_mode(),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        // Frame uniform: camera and light
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<FrameUniform>() as u64),
                },
                count: None,
            }],
        });
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Buffer"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        // Per-object uniforms share one buffer addressed with dynamic offsets.
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<ObjectUniform>() as u64),
                },
                count: None,
            }],
        });
        let object_stride = align_to(
            std::mem::size_of::<ObjectUniform>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let (object_buffer, object_bind_group) =
            Self::create_object_buffer(&device, &object_layout, INITIAL_OBJECTS, object_stride);

        let texture_layout = Texture::bind_group_layout(&device);
        let sampler = Texture::sampler(&device);
        let white = Texture::white(&device, &queue, &texture_layout, &sampler);

        let mesh_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("../shaders/mesh.wgsl"))),
        });
        let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &object_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let line_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Line Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("../shaders/line.wgsl"))),
        });
        let line_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Line Pipeline Layout"),
            bind_group_layouts: &[&frame_layout],
            push_constant_ranges: &[],
        });
        let line_pipeline_depth = create_line_pipeline(&device, &line_layout, &line_shader, surface_format, true);
        let line_pipeline_overlay = create_line_pipeline(&device, &line_layout, &line_shader, surface_format, false);
        let line_buffer = Self::create_line_buffer(&device, INITIAL_LINES);

        let mut mesh_pipelines = HashMap::new();
        let key = settings.pipeline_key(wireframe_supported);
        mesh_pipelines.insert(
            key,
            create_mesh_pipeline(&device, &mesh_layout, &mesh_shader, surface_format, key),
        );

        let depth_view = create_depth_view(&device, config.width, config.height);
        let egui = egui_wgpu::Renderer::new(&device, surface_format, None, 1);

        info!(
            "[renderer] {} on {} ({}x{}, {:?})",
            gpu_info.adapter, gpu_info.backend, config.width, config.height, config.present_mode
        );

        let renderer = Self {
            surface,
            device,
            queue,
            config,
            wireframe_supported,
            depth_view,
            frame_buffer,
            frame_bind_group,
            object_layout,
            object_buffer,
            object_bind_group,
            object_capacity: INITIAL_OBJECTS,
            object_stride,
            texture_layout,
            sampler,
            white,
            mesh_shader,
            mesh_layout,
            mesh_pipelines,
            line_pipeline_depth,
            line_pipeline_overlay,
            line_buffer,
            line_capacity: INITIAL_LINES,
            meshes: HashMap::new(),
            textures: HashMap::new(),
            egui,
        };
        Ok((renderer, gpu_info))
    }

    fn create_object_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: u64,
        stride: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Object Buffer"),
            size: capacity * stride,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(std::mem::size_of::<ObjectUniform>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_line_buffer(device: &wgpu::Device, capacity: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Line Buffer"),
            size: capacity * std::mem::size_of::<LineVertex>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn wireframe_supported(&self) -> bool {
        self.wireframe_supported
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, width, height);
        }
    }

    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    fn sync_present_mode(&mut self, settings: &RenderSettings) {
        let mode = settings.present_mode();
        if self.config.present_mode != mode {
            info!("[renderer] Switching present mode to {:?}", mode);
            self.config.present_mode = mode;
            self.reconfigure();
        }
    }

    fn upload_resources(&mut self, renderables: &[Renderable]) {
        let mut live_meshes = HashSet::new();
        let mut live_textures = HashSet::new();
        for renderable in renderables {
            let mesh = &renderable.mesh;
            live_meshes.insert(mesh.id());
            if !self.meshes.contains_key(&mesh.id()) {
                debug!("[renderer] Uploading mesh '{}' ({} triangles)", mesh.name(), mesh.triangle_count());
                self.meshes.insert(mesh.id(), GpuMesh::new(&self.device, mesh));
            }
            if let Some(texture) = renderable.material.as_ref().and_then(|m| m.texture.as_ref()) {
                live_textures.insert(texture.id());
                self.textures.entry(texture.id()).or_insert_with(|| {
                    Texture::from_data(&self.device, &self.queue, &self.texture_layout, &self.sampler, texture)
                });
            }
        }
        // Resources of meshes that were removed or hidden are released.
        self.meshes.retain(|id, _| live_meshes.contains(id));
        self.textures.retain(|id, _| live_textures.contains(id));
    }

    fn write_objects(&mut self, renderables: &[Renderable], settings: &RenderSettings) {
        if renderables.is_empty() {
            return;
        }
        let needed = renderables.len() as u64;
        if needed > self.object_capacity {
            self.object_capacity = needed.next_power_of_two();
            let (buffer, bind_group) =
                Self::create_object_buffer(&self.device, &self.object_layout, self.object_capacity, self.object_stride);
            self.object_buffer = buffer;
            self.object_bind_group = bind_group;
        }

        let stride = self.object_stride as usize;
        let mut bytes = vec![0u8; renderables.len() * stride];
        for (i, renderable) in renderables.iter().enumerate() {
            let uniform = ObjectUniform::new(renderable.model, renderable.material.as_ref(), settings);
            let data = bytemuck::bytes_of(&uniform);
            bytes[i * stride..i * stride + data.len()].copy_from_slice(data);
        }
        self.queue.write_buffer(&self.object_buffer, 0, &bytes);
    }

    fn write_lines(&mut self, lines: &[LineVertex]) {
        if lines.is_empty() {
            return;
        }
        let needed = lines.len() as u64;
        if needed > self.line_capacity {
            self.line_capacity = needed.next_power_of_two();
            self.line_buffer = Self::create_line_buffer(&self.device, self.line_capacity);
        }
        self.queue.write_buffer(&self.line_buffer, 0, bytemuck::cast_slice(lines));
    }

    /// Draws one frame. UI textures are updated before the frame is acquired
    /// and freed after it was presented, whether drawing succeeded or not.
    pub fn render(&mut self, ctx: &mut EngineContext, projection: Mat4) -> Result<(), wgpu::SurfaceError> {
        let settings = ctx.render.clone();
        let ui = ctx.ui.take();
        if let Some(ui) = &ui {
            for (id, delta) in &ui.textures_delta.set {
                self.egui.update_texture(&self.device, &self.queue, *id, delta);
            }
        }
        self.sync_present_mode(&settings);

        let renderables = ctx.scene.renderables();
        self.upload_resources(&renderables);

        let lighting = settings.enable_lighting && !ctx.input.key_pressed(KeyCode::KeyH);
        let frame = FrameUniform::new(projection, ctx.camera.view, ctx.camera.position, lighting);
        self.queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));
        self.write_objects(&renderables, &settings);

        let mut lines = std::mem::take(&mut ctx.debug.lines);
        if settings.draw_normals {
            lines.extend(normal_lines(&renderables, settings.normal_length));
        }
        self.write_lines(&lines);

        let key = settings.pipeline_key(self.wireframe_supported);
        if !self.mesh_pipelines.contains_key(&key) {
            let pipeline = create_mesh_pipeline(&self.device, &self.mesh_layout, &self.mesh_shader, self.config.format, key);
            self.mesh_pipelines.insert(key, pipeline);
        }

        let result = self.draw(&renderables, &settings, key, lines.len() as u32, ui.as_ref());

        if let Some(ui) = &ui {
            for id in &ui.textures_delta.free {
                self.egui.free_texture(id);
            }
        }
        result
    }

    fn draw(
        &mut self,
        renderables: &[Renderable],
        settings: &RenderSettings,
        key: PipelineKey,
        line_count: u32,
        ui: Option<&UiFrame>,
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let [r, g, b, a] = settings.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(pipeline) = self.mesh_pipelines.get(&key).filter(|_| settings.draw_meshes) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
                for (i, renderable) in renderables.iter().enumerate() {
                    let Some(mesh) = self.meshes.get(&renderable.mesh.id()) else {
                        continue;
                    };
                    let texture = renderable
                        .material
                        .as_ref()
                        .and_then(|m| m.texture.as_ref())
                        .filter(|_| settings.enable_textures)
                        .and_then(|t| self.textures.get(&t.id()))
                        .unwrap_or(&self.white);
                    let offset = (i as u64 * self.object_stride) as wgpu::DynamicOffset;
                    render_pass.set_bind_group(1, &self.object_bind_group, &[offset]);
                    render_pass.set_bind_group(2, &texture.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }

            if line_count > 0 {
                let pipeline = if settings.enable_depth {
                    &self.line_pipeline_depth
                } else {
                    &self.line_pipeline_overlay
                };
                let bytes = line_count as u64 * std::mem::size_of::<LineVertex>() as u64;
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.line_buffer.slice(..bytes));
                render_pass.draw(0..line_count, 0..1);
            }
        }

        let mut command_buffers = Vec::new();
        if let Some(ui) = ui {
            let screen = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.config.width, self.config.height],
                pixels_per_point: ui.pixels_per_point,
            };
            command_buffers = self
                .egui
                .update_buffers(&self.device, &self.queue, &mut encoder, &ui.primitives, &screen);
            let mut ui_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("UI Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.egui.render(&mut ui_pass, &ui.primitives, &screen);
        }

        command_buffers.push(encoder.finish());
        self.queue.submit(command_buffers);
        output.present();
        Ok(())
    }
}

/// Owns the renderer and exposes its flags to the rest of the engine through
/// `EngineContext::render`.
#[derive(Default)]
pub struct ModuleRenderer3D {
    renderer: Option<Renderer>,
    projection: Mat4,
    projected_for: Option<(u32, u32, u32)>,
}

impl ModuleRenderer3D {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    fn update_projection(&mut self, ctx: &EngineContext) {
        let key = (ctx.window.width, ctx.window.height, ctx.camera.fov_y_degrees.to_bits());
        if self.projected_for != Some(key) {
            self.projection = projection(ctx.camera.fov_y_degrees, ctx.window.aspect_ratio());
            self.projected_for = Some(key);
            debug!("[renderer] Projection updated for {}x{}", ctx.window.width, ctx.window.height);
        }
    }
}

impl Module for ModuleRenderer3D {
    fn name(&self) -> &str {
        "renderer"
    }

    fn init(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        info!("Creating 3D Renderer context");
        match ctx.window.handle.clone() {
            Some(window) => {
                let (renderer, gpu_info) = Renderer::new(window, &ctx.render)?;
                if ctx.render.draw_wireframe && !renderer.wireframe_supported() {
                    warn!("Wireframe is not supported by this adapter and will be ignored");
                }
                ctx.gpu = Some(gpu_info);
                self.renderer = Some(renderer);
            }
            None => warn!("No window available, rendering is disabled"),
        }
        self.update_projection(ctx);
        Ok(())
    }

    fn pre_update(&mut self, ctx: &mut EngineContext, _dt: f32) -> UpdateStatus {
        if ctx.window.resized {
            if let Some(renderer) = &mut self.renderer {
                renderer.resize(ctx.window.width, ctx.window.height);
            }
        }
        self.update_projection(ctx);
        UpdateStatus::Continue
    }

    fn post_update(&mut self, ctx: &mut EngineContext, _dt: f32) -> UpdateStatus {
        let status = match &mut self.renderer {
            Some(renderer) => match renderer.render(ctx, self.projection) {
                Ok(()) => UpdateStatus::Continue,
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    debug!("[renderer] Surface lost, reconfiguring");
                    renderer.reconfigure();
                    UpdateStatus::Continue
                }
                Err(wgpu::SurfaceError::Timeout) => {
                    warn!("[renderer] Surface timeout, skipping frame");
                    UpdateStatus::Continue
                }
                Err(e) => {
                    error!("Render error: {:?}", e);
                    UpdateStatus::Error
                }
            },
            None => {
                ctx.ui = None;
                UpdateStatus::Continue
            }
        };
        ctx.debug.clear();
        status
    }

    fn clean_up(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        info!("Destroying 3D Renderer");
        self.renderer = None;
        ctx.gpu = None;
        Ok(())
    }

    fn load_config(&mut self, ctx: &mut EngineContext, section: &Value) -> Result<(), EngineError> {
        ctx.render = parse_section(self.name(), section)?;
        Ok(())
    }

    fn save_config(&self, ctx: &EngineContext) -> Result<Option<Value>, EngineError> {
        to_section(&ctx.render)
    }
}
