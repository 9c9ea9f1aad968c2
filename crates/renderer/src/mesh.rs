//! GPU-side mesh: one vertex buffer shared by every instance.

use asset::mesh::{MeshBuffer, Vertex};
use wgpu::{Buffer, BufferUsages, Device, VertexBufferLayout, VertexStepMode, util::DeviceExt};

/// Layout of [`Vertex`]: position at location 0, color at location 1.
pub const VERTEX_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
};

pub struct GpuMesh {
    pub(crate) vertex_buf: Buffer,
    pub(crate) vertex_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &Device, mesh: &MeshBuffer, label: &str) -> Self {
        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: BufferUsages::VERTEX,
        });
        Self {
            vertex_buf,
            vertex_count: mesh.vertex_count(),
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}
