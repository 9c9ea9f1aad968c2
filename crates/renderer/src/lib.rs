//! Renderer: wgpu init + depth + one draw per scene object.
//! wgpu = 26.x, winit = 0.30.x

use std::num::NonZeroU64;
use std::sync::Arc;

use anyhow::{Context, Result};
use asset::mesh::MeshBuffer;
use bytemuck::{Pod, Zeroable};
use corelib::{
    camera::Camera,
    scene::{MeshHandle, MeshId, Scene},
};
use glam::Mat4;
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    CommandEncoderDescriptor, CompositeAlphaMode, DepthBiasState, DepthStencilState, Device,
    DeviceDescriptor, Extent3d, Features, FragmentState, Instance, InstanceDescriptor, Limits,
    LoadOp, Operations, PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor,
    ShaderModuleDescriptor, ShaderSource, ShaderStages, StoreOp, Surface, SurfaceConfiguration,
    SurfaceError, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
    TextureViewDescriptor, VertexState, util::DeviceExt,
};
use winit::{dpi::PhysicalSize, window::Window};

pub mod mesh;

use mesh::{GpuMesh, VERTEX_LAYOUT};

/// Camera UBO: separate view and projection, as the shader multiplies them.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct CameraUniform {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
}

impl CameraUniform {
    fn from_camera(camera: &Camera) -> Self {
        Self {
            view: camera.view().to_cols_array_2d(),
            projection: camera.proj().to_cols_array_2d(),
        }
    }
}

/// Per-object UBO slot, addressed with a dynamic offset.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct ModelUniform {
    model: [[f32; 4]; 4],
}

const MODEL_UNIFORM_SIZE: u64 = std::mem::size_of::<ModelUniform>() as u64;

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

const CLEAR_COLOR: wgpu::Color = wgpu::Color::WHITE;

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Pipeline & geometry
    pipeline: RenderPipeline,
    meshes: Vec<GpuMesh>,

    // Camera
    camera: Camera,
    camera_bg: BindGroup,
    camera_buf: Buffer,

    // Per-object model matrices
    model_bgl: BindGroupLayout,
    model_bg: BindGroup,
    model_buf: Buffer,
    model_stride: u64,
    model_capacity: usize,
    model_staging: Vec<u8>,

    // Depth
    depth_view: TextureView,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an Arc<Window>.
    pub async fn new(window: Arc<Window>, backends: wgpu::Backends) -> Result<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter")?;
        let info = adapter.get_info();
        log::info!("Adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("objview Device"),
                required_features: Features::empty(),
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                ..Default::default()
            })
            .await
            .context("Failed to request GPU device")?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .context("Surface reports no supported formats")?;

        // Configure surface
        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        // Depth texture
        let depth_view = create_depth_view(&device, &surface_config);

        // ==== Shaders ====
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Mesh WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });

        // ==== Camera BGL/BG ====
        let camera_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Camera BGL"),
            entries: &[uniform_entry(
                false,
                NonZeroU64::new(std::mem::size_of::<CameraUniform>() as u64),
            )],
        });

        let camera = Camera::fixed_viewer(width as f32 / height as f32);
        let camera_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera UBO"),
            contents: bytemuck::bytes_of(&CameraUniform::from_camera(&camera)),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let camera_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera BG"),
            layout: &camera_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buf.as_entire_binding(),
            }],
        });

        // ==== Model BGL/BG (dynamic offset per object) ====
        let model_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Model BGL"),
            entries: &[uniform_entry(true, NonZeroU64::new(MODEL_UNIFORM_SIZE))],
        });
        let model_stride = model_stride(device.limits().min_uniform_buffer_offset_alignment);
        let model_capacity = 1;
        let (model_buf, model_bg) =
            create_model_slots(&device, &model_bgl, model_stride, model_capacity);

        // ==== Pipeline ====
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Mesh PipelineLayout"),
            bind_group_layouts: &[&camera_bgl, &model_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[VERTEX_LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            // OBJ winding is not guaranteed, so both faces are drawn.
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            pipeline,
            meshes: Vec::new(),
            camera,
            camera_bg,
            camera_buf,
            model_bgl,
            model_bg,
            model_buf,
            model_stride,
            model_capacity,
            model_staging: Vec::new(),
            depth_view,
            width,
            height,
        })
    }

    /// Upload a mesh once; the returned handle is shared by every instance.
    pub fn upload_mesh(&mut self, mesh: &MeshBuffer) -> MeshHandle {
        let id = MeshId(self.meshes.len() as u32);
        let gpu = GpuMesh::upload(&self.device, mesh, &format!("Mesh VB #{}", id.0));
        let handle = MeshHandle {
            id,
            vertex_count: gpu.vertex_count(),
        };
        log::debug!("Uploaded mesh {:?} with {} vertices", id, handle.vertex_count);
        self.meshes.push(gpu);
        handle
    }

    /// Resize: reconfigure surface, recreate depth view, refresh projection.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);

        self.camera = self
            .camera
            .with_aspect(self.width as f32 / self.height as f32);
        self.queue.write_buffer(
            &self.camera_buf,
            0,
            bytemuck::bytes_of(&CameraUniform::from_camera(&self.camera)),
        );
    }

    /// Grow the model uniform buffer so every object gets a slot.
    fn ensure_model_capacity(&mut self, objects: usize) {
        if objects <= self.model_capacity {
            return;
        }
        let capacity = objects.next_power_of_two();
        let (buf, bg) = create_model_slots(&self.device, &self.model_bgl, self.model_stride, capacity);
        self.model_buf = buf;
        self.model_bg = bg;
        self.model_capacity = capacity;
        log::debug!("Model uniform buffer grown to {} slots", capacity);
    }

    /// Render one frame: upload model matrices, clear, draw every object.
    pub fn render(&mut self, scene: &Scene) -> Result<(), SurfaceError> {
        self.ensure_model_capacity(scene.len());
        pack_models(
            scene.objects().iter().map(|o| o.model_matrix()),
            self.model_stride,
            &mut self.model_staging,
        );
        if !self.model_staging.is_empty() {
            self.queue.write_buffer(&self.model_buf, 0, &self.model_staging);
        }

        // --- frame & pass
        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(CLEAR_COLOR),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.camera_bg, &[]);

            for (slot, obj) in scene.objects().iter().enumerate() {
                let handle = obj.mesh();
                let Some(mesh) = self.meshes.get(handle.id.0 as usize) else {
                    continue;
                };
                let offset = (slot as u64 * self.model_stride) as u32;
                rpass.set_bind_group(1, &self.model_bg, &[offset]);
                rpass.set_vertex_buffer(0, mesh.vertex_buf.slice(..));
                rpass.draw(0..handle.vertex_count, 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }
}

impl Drop for GpuState {
    fn drop(&mut self) {
        for mesh in self.meshes.drain(..) {
            mesh.vertex_buf.destroy();
        }
        log::info!("GPU resources released");
    }
}

fn uniform_entry(dynamic: bool, min_size: Option<NonZeroU64>) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding: 0,
        visibility: ShaderStages::VERTEX,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size: min_size,
        },
        count: None,
    }
}

/// Distance between model slots, respecting the device's offset alignment.
fn model_stride(min_offset_alignment: u32) -> u64 {
    wgpu::util::align_to(MODEL_UNIFORM_SIZE, u64::from(min_offset_alignment.max(1)))
}

/// Write model matrices into `out`, one per `stride` bytes.
fn pack_models(models: impl Iterator<Item = Mat4>, stride: u64, out: &mut Vec<u8>) {
    out.clear();
    for model in models {
        let start = out.len();
        let slot = ModelUniform {
            model: model.to_cols_array_2d(),
        };
        out.extend_from_slice(bytemuck::bytes_of(&slot));
        out.resize(start + stride as usize, 0);
    }
}

fn create_model_slots(
    device: &Device,
    layout: &BindGroupLayout,
    stride: u64,
    capacity: usize,
) -> (Buffer, BindGroup) {
    let buf = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Model UBO"),
        size: stride * capacity as u64,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Model BG"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buf,
                offset: 0,
                size: NonZeroU64::new(MODEL_UNIFORM_SIZE),
            }),
        }],
    });
    (buf, bg)
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec3;

    #[test]
    fn stride_respects_alignment() {
        assert_eq!(model_stride(256), 256);
        assert_eq!(model_stride(64), 64);
        assert_eq!(model_stride(32), 64);
        assert_eq!(model_stride(0), MODEL_UNIFORM_SIZE);
    }

    #[test]
    fn pack_models_places_each_matrix_at_its_slot() {
        let a = Mat4::from_translation(vec3(1.0, 2.0, 3.0));
        let b = Mat4::from_scale(vec3(2.0, 2.0, 2.0));
        let mut out = Vec::new();
        pack_models([a, b].into_iter(), 256, &mut out);

        assert_eq!(out.len(), 512);
        let first: [f32; 16] = bytemuck::pod_read_unaligned(&out[..64]);
        let second: [f32; 16] = bytemuck::pod_read_unaligned(&out[256..320]);
        assert_eq!(first, a.to_cols_array());
        assert_eq!(second, b.to_cols_array());
        assert!(out[64..256].iter().all(|&byte| byte == 0));
    }

    #[test]
    fn pack_models_reuses_buffer() {
        let mut out = vec![1u8; 1000];
        pack_models(std::iter::empty(), 256, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn camera_uniform_keeps_view_and_projection_apart() {
        let cam = Camera::fixed_viewer(1.0);
        let u = CameraUniform::from_camera(&cam);
        assert_eq!(Mat4::from_cols_array_2d(&u.view), cam.view());
        assert_eq!(Mat4::from_cols_array_2d(&u.projection), cam.proj());
    }
}
