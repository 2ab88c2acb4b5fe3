//! Pipeline and bind-group-layout creation.
//!
//! WGSL sources live under `shaders/` next to this file and are embedded at
//! compile time with `include_str!` (no runtime file IO). Each pass owns its
//! own module so binding namespaces stay independent.

use wgpu::{
    BindGroupLayout, ColorTargetState, FragmentState, PipelineLayoutDescriptor, RenderPipeline,
    ShaderModule, ShaderSource, VertexState,
};

use crate::gfx::gbuffer::formats;
use crate::gfx::types::{LineVertex, MODEL_UNIFORM_STRIDE, Vertex, VertexSkinned};

fn shader(device: &wgpu::Device, label: &str, src: &'static str) -> ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: ShaderSource::Wgsl(std::borrow::Cow::Borrowed(src)),
    })
}

pub struct BindGroupLayouts {
    pub globals: BindGroupLayout,
    pub model: BindGroupLayout,
    pub palettes: BindGroupLayout,
    pub lighting: BindGroupLayout,
    pub taa: BindGroupLayout,
    pub blit: BindGroupLayout,
    pub blit_depth: BindGroupLayout,
    pub view_proj: BindGroupLayout,
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    }
}

fn depth_texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Depth,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

pub fn create_bind_group_layouts(device: &wgpu::Device) -> BindGroupLayouts {
    let globals = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("globals-bgl"),
        entries: &[uniform_entry(
            0,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        )],
    });

    // Per-draw model block, indexed with a dynamic offset.
    let model = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("model-bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(MODEL_UNIFORM_STRIDE),
            },
            count: None,
        }],
    });

    let storage_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };
    let palettes = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("palettes-bgl"),
        entries: &[storage_entry(0), storage_entry(1)],
    });

    let lighting = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("lighting-bgl"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
            texture_entry(1),
            texture_entry(2),
            depth_texture_entry(3),
            depth_texture_entry(4),
            sampler_entry(5),
        ],
    });

    let taa = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("taa-bgl"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
            texture_entry(1),
            texture_entry(2),
            texture_entry(3),
            texture_entry(4),
            depth_texture_entry(5),
            sampler_entry(6),
        ],
    });

    let blit = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("blit-bgl"),
        entries: &[texture_entry(0), sampler_entry(1)],
    });

    let blit_depth = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("blit-depth-bgl"),
        entries: &[depth_texture_entry(0)],
    });

    let view_proj = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("view-proj-bgl"),
        entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
    });

    BindGroupLayouts {
        globals,
        model,
        palettes,
        lighting,
        taa,
        blit,
        blit_depth,
        view_proj,
    }
}

pub struct Pipelines {
    pub gbuffer_static: RenderPipeline,
    pub gbuffer_skinned: RenderPipeline,
    pub shadow_static: RenderPipeline,
    pub shadow_skinned: RenderPipeline,
    pub lighting: RenderPipeline,
    pub taa: RenderPipeline,
    /// Copies the lighting buffer into the TAA target when TAA is disabled.
    pub blit_hdr: RenderPipeline,
    pub tonemap: RenderPipeline,
    pub blit: RenderPipeline,
    pub blit_depth: RenderPipeline,
    pub debug: RenderPipeline,
}

fn color_target(format: wgpu::TextureFormat) -> Option<ColorTargetState> {
    Some(ColorTargetState {
        format,
        blend: None,
        write_mask: wgpu::ColorWrites::ALL,
    })
}

/// Full-screen resolve pipeline: fullscreen-triangle vertex stage, single
/// color target, no depth.
fn fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &ShaderModule,
    fs_entry: &str,
    format: wgpu::TextureFormat,
) -> RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: VertexState {
            module,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module,
            entry_point: Some(fs_entry),
            targets: &[color_target(format)],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

pub fn create_pipelines(
    device: &wgpu::Device,
    layouts: &BindGroupLayouts,
    surface_format: wgpu::TextureFormat,
) -> Pipelines {
    let gbuffer_shader = shader(device, "gbuffer-shader", include_str!("shaders/gbuffer.wgsl"));
    let shadow_shader = shader(device, "shadow-shader", include_str!("shaders/shadow.wgsl"));
    let lighting_shader = shader(
        device,
        "lighting-shader",
        include_str!("shaders/lighting.wgsl"),
    );
    let taa_shader = shader(device, "taa-shader", include_str!("shaders/taa.wgsl"));
    let tonemap_shader = shader(device, "tonemap-shader", include_str!("shaders/tonemap.wgsl"));
    let blit_shader = shader(device, "blit-shader", include_str!("shaders/blit.wgsl"));
    let blit_depth_shader = shader(
        device,
        "blit-depth-shader",
        include_str!("shaders/blit_depth.wgsl"),
    );
    let debug_shader = shader(device, "debug-shader", include_str!("shaders/debug.wgsl"));

    let gbuffer_static_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("gbuffer-static-layout"),
        bind_group_layouts: &[&layouts.globals, &layouts.model],
        push_constant_ranges: &[],
    });
    let gbuffer_skinned_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("gbuffer-skinned-layout"),
        bind_group_layouts: &[&layouts.globals, &layouts.model, &layouts.palettes],
        push_constant_ranges: &[],
    });
    let shadow_static_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("shadow-static-layout"),
        bind_group_layouts: &[&layouts.view_proj, &layouts.model],
        push_constant_ranges: &[],
    });
    let shadow_skinned_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("shadow-skinned-layout"),
        bind_group_layouts: &[&layouts.view_proj, &layouts.model, &layouts.palettes],
        push_constant_ranges: &[],
    });

    let gbuffer_targets = [
        color_target(formats::DIFFUSE_METALLIC),
        color_target(formats::NORMAL_ROUGHNESS),
        color_target(formats::MOTION),
    ];

    // Reversed-Z: clear to 0, pass what is greater.
    let gbuffer_depth = wgpu::DepthStencilState {
        format: formats::DEPTH,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Greater,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    };

    let gbuffer_pipeline = |label: &str,
                            layout: &wgpu::PipelineLayout,
                            vs_entry: &str,
                            vertex_layout: wgpu::VertexBufferLayout<'static>| {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: VertexState {
                module: &gbuffer_shader,
                entry_point: Some(vs_entry),
                buffers: &[vertex_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(FragmentState {
                module: &gbuffer_shader,
                entry_point: Some("fs_gbuffer"),
                targets: &gbuffer_targets,
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(gbuffer_depth.clone()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    };

    let gbuffer_static =
        gbuffer_pipeline("gbuffer-static", &gbuffer_static_layout, "vs_static", Vertex::LAYOUT);
    let gbuffer_skinned = gbuffer_pipeline(
        "gbuffer-skinned",
        &gbuffer_skinned_layout,
        "vs_skinned",
        VertexSkinned::LAYOUT,
    );

    // Depth-only shadow pass, conventional Z.
    let shadow_pipeline = |label: &str,
                           layout: &wgpu::PipelineLayout,
                           vs_entry: &str,
                           vertex_layout: wgpu::VertexBufferLayout<'static>| {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: VertexState {
                module: &shadow_shader,
                entry_point: Some(vs_entry),
                buffers: &[vertex_layout],
                compilation_options: Default::default(),
            },
            fragment: None,
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: formats::DEPTH,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    };

    let shadow_static =
        shadow_pipeline("shadow-static", &shadow_static_layout, "vs_static", Vertex::LAYOUT);
    let shadow_skinned = shadow_pipeline(
        "shadow-skinned",
        &shadow_skinned_layout,
        "vs_skinned",
        VertexSkinned::LAYOUT,
    );

    let lighting_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("lighting-layout"),
        bind_group_layouts: &[&layouts.lighting],
        push_constant_ranges: &[],
    });
    let lighting = fullscreen_pipeline(
        device,
        "lighting-pipeline",
        &lighting_layout,
        &lighting_shader,
        "fs_lighting",
        formats::HDR,
    );

    let taa_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("taa-layout"),
        bind_group_layouts: &[&layouts.taa],
        push_constant_ranges: &[],
    });
    let taa = fullscreen_pipeline(
        device,
        "taa-pipeline",
        &taa_layout,
        &taa_shader,
        "fs_taa",
        formats::HDR,
    );

    let blit_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("blit-layout"),
        bind_group_layouts: &[&layouts.blit],
        push_constant_ranges: &[],
    });
    let tonemap = fullscreen_pipeline(
        device,
        "tonemap-pipeline",
        &blit_layout,
        &tonemap_shader,
        "fs_tonemap",
        formats::POST,
    );
    let blit = fullscreen_pipeline(
        device,
        "blit-pipeline",
        &blit_layout,
        &blit_shader,
        "fs_blit",
        surface_format,
    );
    let blit_hdr = fullscreen_pipeline(
        device,
        "blit-hdr-pipeline",
        &blit_layout,
        &blit_shader,
        "fs_blit",
        formats::HDR,
    );

    let blit_depth_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("blit-depth-layout"),
        bind_group_layouts: &[&layouts.blit_depth],
        push_constant_ranges: &[],
    });
    let blit_depth = fullscreen_pipeline(
        device,
        "blit-depth-pipeline",
        &blit_depth_layout,
        &blit_depth_shader,
        "fs_blit_depth",
        surface_format,
    );

    let debug_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("debug-layout"),
        bind_group_layouts: &[&layouts.view_proj],
        push_constant_ranges: &[],
    });
    let debug = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("debug-lines"),
        layout: Some(&debug_layout),
        vertex: VertexState {
            module: &debug_shader,
            entry_point: Some("vs_line"),
            buffers: &[LineVertex::LAYOUT],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: &debug_shader,
            entry_point: Some("fs_line"),
            targets: &[color_target(surface_format)],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::LineList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    Pipelines {
        gbuffer_static,
        gbuffer_skinned,
        shadow_static,
        shadow_skinned,
        lighting,
        taa,
        blit_hdr,
        tonemap,
        blit,
        blit_depth,
        debug,
    }
}
