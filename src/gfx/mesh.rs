//! GPU mesh upload and the static/skinned model variants.
//!
//! A `MeshHandle` indexes the renderer's model registry. Models are a tagged
//! union over the two vertex layouts with one draw interface; which pipeline
//! a draw uses follows from the variant, never from ambient state.

use wgpu::util::DeviceExt;

use crate::assets::{MeshCpu, SkinnedMeshCpu};

/// Opaque handle into the renderer's model registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub(crate) u32);

impl MeshHandle {
    /// Stand-in for scenes assembled without a renderer (headless tests).
    pub const PLACEHOLDER: Self = Self(u32::MAX);
}

pub struct GpuMesh {
    pub vertex_buf: wgpu::Buffer,
    pub index_buf: wgpu::Buffer,
    pub index_count: u32,
}

pub enum GpuModel {
    Static(GpuMesh),
    Skinned(GpuMesh),
}

impl GpuModel {
    pub fn mesh(&self) -> &GpuMesh {
        match self {
            GpuModel::Static(m) | GpuModel::Skinned(m) => m,
        }
    }

    pub fn is_skinned(&self) -> bool {
        matches!(self, GpuModel::Skinned(_))
    }
}

pub fn upload_mesh(device: &wgpu::Device, cpu: &MeshCpu, label: &str) -> GpuMesh {
    let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&cpu.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&cpu.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    GpuMesh {
        vertex_buf,
        index_buf,
        index_count: cpu.indices.len() as u32,
    }
}

pub fn upload_skinned_mesh(device: &wgpu::Device, cpu: &SkinnedMeshCpu, label: &str) -> GpuMesh {
    let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&cpu.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&cpu.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    GpuMesh {
        vertex_buf,
        index_buf,
        index_count: cpu.indices.len() as u32,
    }
}
