//! Buffer/vertex types shared across pipelines.
//!
//! All types here are `#[repr(C)]` and `bytemuck`-safe so they can be
//! uploaded to GPU buffers without extra copies. WGSL struct layouts in the
//! shader sources mirror these exactly.

use bytemuck::{Pod, Zeroable};

/// Per-frame globals for the geometry pass.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Globals {
    pub view_proj: [[f32; 4]; 4],
    pub prev_view_proj: [[f32; 4]; 4],
    /// Sub-pixel TAA jitter in NDC units (zero when TAA is off), padded.
    pub jitter: [f32; 4],
    pub camera_pos: [f32; 3],
    pub _pad: f32,
}

/// Per-draw model block, indexed with a dynamic offset.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
    pub prev_model: [[f32; 4]; 4],
    pub diffuse: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    /// First palette entry for skinned draws; unused by the static path.
    pub palette_base: u32,
    pub _pad: [f32; 2],
}

/// Dynamic-offset stride for [`ModelUniform`]; wgpu requires 256 alignment.
pub const MODEL_UNIFORM_STRIDE: u64 = 256;

/// Uniforms for the full-screen lighting resolve.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightingUniform {
    pub inverse_view_proj: [[f32; 4]; 4],
    pub sun_view_proj: [[f32; 4]; 4],
    pub sun_direction: [f32; 3],
    pub sun_luminance: f32,
    pub sun_chromaticity: [f32; 3],
    pub pcf_enabled: f32,
    pub spot_position: [f32; 3],
    pub spot_inner_cutoff: f32,
    pub spot_direction: [f32; 3],
    pub spot_outer_cutoff: f32,
    pub spot_chromaticity: [f32; 3],
    pub spot_luminance: f32,
    pub camera_pos: [f32; 3],
    pub shadow_bias: f32,
    pub sky_color: [f32; 3],
    pub _pad: f32,
}

/// Uniforms for the temporal accumulation resolve.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct TaaUniform {
    pub dimensions: [f32; 2],
    pub history_weight: f32,
    pub cross_weight: f32,
}

/// A bare view-projection block, shared by the shadow pass and the debug
/// line overlay.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ViewProjUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Unskinned vertex: position, normal, uv.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub nrm: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2],
    };
}

/// Skinned vertex: adds two bone weights and two bone indices.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct VertexSkinned {
    pub pos: [f32; 3],
    pub nrm: [f32; 3],
    pub uv: [f32; 2],
    pub weights: [f32; 2],
    pub joints: [u32; 2],
}

impl VertexSkinned {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<VertexSkinned>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![
            0 => Float32x3, 1 => Float32x3, 2 => Float32x2,
            3 => Float32x2, 4 => Uint32x2
        ],
    };
}

/// Debug overlay vertex: position + color, drawn as a line list.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LineVertex {
    pub pos: [f32; 3],
    pub color: [f32; 3],
}

impl LineVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<LineVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_uniform_fits_dynamic_stride() {
        assert!(std::mem::size_of::<ModelUniform>() as u64 <= MODEL_UNIFORM_STRIDE);
    }
}
