//! Render-target attachments for the deferred pipeline.
//!
//! One `RenderTargets` bundle holds every intermediate buffer the frame
//! flows through: the G-buffer (diffuse+metallic, normal+roughness, motion,
//! depth), the directional shadow map, the HDR lighting and temporal
//! accumulation buffers, and the LDR post buffer. Screen-sized attachments
//! are recreated on resize; the shadow map is a fixed 4096².

use wgpu::{Device, Texture, TextureFormat, TextureUsages, TextureView};

pub const SHADOW_MAP_SIZE: u32 = 4096;

/// Formats for the pipeline's attachments (all linear).
pub mod formats {
    use wgpu::TextureFormat;
    pub const DIFFUSE_METALLIC: TextureFormat = TextureFormat::Rgba16Float;
    pub const NORMAL_ROUGHNESS: TextureFormat = TextureFormat::Rgba16Float;
    // Screen-space motion vectors (signed, may exceed [-1,1]).
    pub const MOTION: TextureFormat = TextureFormat::Rg16Float;
    pub const DEPTH: TextureFormat = TextureFormat::Depth32Float;
    pub const HDR: TextureFormat = TextureFormat::Rgba16Float;
    // Tonemapped output is already gamma-encoded; stored linearly.
    pub const POST: TextureFormat = TextureFormat::Rgba8Unorm;
}

pub struct RenderTargets {
    size: (u32, u32),
    pub diffuse_metallic: Texture,
    pub diffuse_metallic_view: TextureView,
    pub normal_roughness: Texture,
    pub normal_roughness_view: TextureView,
    pub motion: Texture,
    pub motion_view: TextureView,
    pub motion_prev: Texture,
    pub motion_prev_view: TextureView,
    pub depth: Texture,
    pub depth_view: TextureView,
    pub shadow: Texture,
    pub shadow_view: TextureView,
    pub lighting: Texture,
    pub lighting_view: TextureView,
    pub accumulation: Texture,
    pub accumulation_view: TextureView,
    pub taa: Texture,
    pub taa_view: TextureView,
    pub post: Texture,
    pub post_view: TextureView,
}

fn make(
    device: &Device,
    w: u32,
    h: u32,
    fmt: TextureFormat,
    usage: TextureUsages,
    label: &str,
) -> (Texture, TextureView) {
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: w.max(1),
            height: h.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: fmt,
        usage,
        view_formats: &[],
    });
    let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
    (tex, view)
}

impl RenderTargets {
    pub fn create(device: &Device, width: u32, height: u32) -> Self {
        let attach = TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING;
        let history = attach | TextureUsages::COPY_SRC | TextureUsages::COPY_DST;

        let (diffuse_metallic, diffuse_metallic_view) = make(
            device,
            width,
            height,
            formats::DIFFUSE_METALLIC,
            attach,
            "gbuf-diffuse-metallic",
        );
        let (normal_roughness, normal_roughness_view) = make(
            device,
            width,
            height,
            formats::NORMAL_ROUGHNESS,
            attach,
            "gbuf-normal-roughness",
        );
        let (motion, motion_view) =
            make(device, width, height, formats::MOTION, history, "gbuf-motion");
        let (motion_prev, motion_prev_view) = make(
            device,
            width,
            height,
            formats::MOTION,
            history,
            "gbuf-motion-prev",
        );
        let (depth, depth_view) =
            make(device, width, height, formats::DEPTH, attach, "gbuf-depth");
        let (shadow, shadow_view) = make(
            device,
            SHADOW_MAP_SIZE,
            SHADOW_MAP_SIZE,
            formats::DEPTH,
            attach,
            "shadow-map-sun",
        );
        let (lighting, lighting_view) =
            make(device, width, height, formats::HDR, history, "pbr-lighting");
        let (accumulation, accumulation_view) = make(
            device,
            width,
            height,
            formats::HDR,
            history,
            "taa-accumulation",
        );
        let (taa, taa_view) = make(device, width, height, formats::HDR, history, "taa-resolve");
        let (post, post_view) =
            make(device, width, height, formats::POST, attach, "post-processing");

        Self {
            size: (width, height),
            diffuse_metallic,
            diffuse_metallic_view,
            normal_roughness,
            normal_roughness_view,
            motion,
            motion_view,
            motion_prev,
            motion_prev_view,
            depth,
            depth_view,
            shadow,
            shadow_view,
            lighting,
            lighting_view,
            accumulation,
            accumulation_view,
            taa,
            taa_view,
            post,
            post_view,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}
