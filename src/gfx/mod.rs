//! gfx: the deferred renderer.
//!
//! Owns winit/wgpu initialization and runs the fixed multi-pass pipeline
//! every submitted frame: G-buffer → directional shadow → PBR lighting
//! resolve → temporal accumulation → tonemap → history copy → final blit →
//! debug overlay.
//!
//! Files
//! - camera.rs: reversed-Z projection and shadow framing helpers
//! - types.rs: POD buffer structs and vertex layouts
//! - mesh.rs: GPU mesh upload and the static/skinned model variants
//! - gbuffer.rs: render-target attachments
//! - pipeline.rs: bind group layouts + pipelines (WGSL under `shaders/`)
//! - debug.rs: queued line/box overlay
//! - util.rs: jitter/motion/luma helpers with CPU references

pub mod camera;
pub mod debug;
mod gbuffer;
mod mesh;
mod pipeline;
pub mod types;
pub mod util;

pub use mesh::MeshHandle;

use anyhow::Context;
use glam::{Mat4, Vec2, Vec3};
use wgpu::{SurfaceError, SurfaceTargetUnsafe, rwh::HasDisplayHandle, rwh::HasWindowHandle};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::assets::{MeshCpu, SkinnedMeshCpu};
use crate::core::data::tuning::Tuning;
use crate::scene::Scene;
use debug::DebugLines;
use gbuffer::RenderTargets;
use mesh::GpuModel;
use pipeline::{BindGroupLayouts, Pipelines};
use types::{
    Globals, LightingUniform, MODEL_UNIFORM_STRIDE, ModelUniform, TaaUniform, ViewProjUniform,
};

const SKY_COLOR: [f32; 3] = [0.7578125, 0.81640625, 0.953125];

/// Which buffer the final blit shows; a debug key cycles through them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlitSource {
    Final,
    DiffuseMetallic,
    NormalRoughness,
    Motion,
    Depth,
    ShadowMap,
    Lighting,
    Accumulation,
    Taa,
}

impl BlitSource {
    fn next(self) -> Self {
        use BlitSource::*;
        match self {
            Final => DiffuseMetallic,
            DiffuseMetallic => NormalRoughness,
            NormalRoughness => Motion,
            Motion => Depth,
            Depth => ShadowMap,
            ShadowMap => Lighting,
            Lighting => Accumulation,
            Accumulation => Taa,
            Taa => Final,
        }
    }
}

struct DrawCmd {
    mesh: u32,
    offset: u32,
    skinned: bool,
}

/// Bind groups that reference screen-sized attachments; rebuilt on resize.
struct FrameBindGroups {
    lighting: wgpu::BindGroup,
    taa: wgpu::BindGroup,
    taa_disabled_copy: wgpu::BindGroup,
    tonemap: wgpu::BindGroup,
    blit_post: wgpu::BindGroup,
    blit_diffuse: wgpu::BindGroup,
    blit_normal: wgpu::BindGroup,
    blit_motion: wgpu::BindGroup,
    blit_lighting: wgpu::BindGroup,
    blit_accumulation: wgpu::BindGroup,
    blit_taa: wgpu::BindGroup,
    blit_depth: wgpu::BindGroup,
    blit_shadow: wgpu::BindGroup,
}

/// Renderer owns the GPU state and per-frame resources.
///
/// The game loop owns a `Renderer` and calls `resize` and `submit` based on
/// window events. Every setup failure is a constructor-time error; there is
/// no degraded-mode path.
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    max_dim: u32,


    layouts: BindGroupLayouts,
    pipelines: Pipelines,
    targets: RenderTargets,
    frame_groups: FrameBindGroups,
    sampler: wgpu::Sampler,

    globals_buf: wgpu::Buffer,
    globals_bg: wgpu::BindGroup,
    sun_buf: wgpu::Buffer,
    sun_bg: wgpu::BindGroup,
    debug_buf: wgpu::Buffer,
    debug_bg: wgpu::BindGroup,
    lighting_buf: wgpu::Buffer,
    taa_buf: wgpu::Buffer,

    model_buf: wgpu::Buffer,
    model_bg: wgpu::BindGroup,
    model_capacity: u32,

    palettes_buf: wgpu::Buffer,
    prev_palettes_buf: wgpu::Buffer,
    palettes_bg: wgpu::BindGroup,
    palettes_capacity: u32,

    models: Vec<GpuModel>,

    debug_lines: DebugLines,
    debug_vb: wgpu::Buffer,
    debug_vb_capacity: u32,

    frame_id: u64,
    enable_taa: bool,
    enable_pcf: bool,
    blit_source: BlitSource,
    prev_view_proj: Mat4,

    taa_history_weight: f32,
    taa_cross_weight: f32,
    shadow_pcf_bias: f32,
}

impl Renderer {
    /// Create a renderer bound to a window surface.
    pub async fn new(window: &Window, tuning: &Tuning) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::default();
        // Create a surface without borrowing `window` for its lifetime.
        let raw_display = window.display_handle()?.as_raw();
        let raw_window = window.window_handle()?.as_raw();
        let surface = unsafe {
            instance.create_surface_unsafe(SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: raw_display,
                raw_window_handle: raw_window,
            })
        }
        .context("create wgpu surface (unsafe)")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
            })
            .await
            .context("request adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("wgpu-device"),
                required_features: wgpu::Features::empty(),
                // Base WebGPU limits; the 4096² shadow map exceeds the
                // downlevel 2048 texture cap.
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::default(),
            })
            .await
            .context("request device")?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        // Tonemap already gamma-encodes, so the surface must stay linear.
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(caps.formats[0]);
        let present_mode = caps
            .present_modes
            .iter()
            .copied()
            .find(|m| *m == wgpu::PresentMode::Mailbox)
            .unwrap_or(wgpu::PresentMode::Fifo);
        let alpha_mode = caps.alpha_modes[0];
        let max_dim = device.limits().max_texture_dimension_2d.max(1);
        let (w, h) = util::scale_to_max((size.width, size.height), max_dim);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: w,
            height: h,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let layouts = pipeline::create_bind_group_layouts(&device);
        let pipelines = pipeline::create_pipelines(&device, &layouts, config.format);
        let targets = RenderTargets::create(&device, config.width, config.height);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("frame-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        let uniform_buf = |label: &str, size: u64| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let globals_buf = uniform_buf("globals", std::mem::size_of::<Globals>() as u64);
        let sun_buf = uniform_buf("sun-view-proj", std::mem::size_of::<ViewProjUniform>() as u64);
        let debug_buf =
            uniform_buf("debug-view-proj", std::mem::size_of::<ViewProjUniform>() as u64);
        let lighting_buf = uniform_buf("lighting", std::mem::size_of::<LightingUniform>() as u64);
        let taa_buf = uniform_buf("taa", std::mem::size_of::<TaaUniform>() as u64);

        let single_bg = |label: &str, layout: &wgpu::BindGroupLayout, buf: &wgpu::Buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(label),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buf.as_entire_binding(),
                }],
            })
        };
        let globals_bg = single_bg("globals-bg", &layouts.globals, &globals_buf);
        let sun_bg = single_bg("sun-bg", &layouts.view_proj, &sun_buf);
        let debug_bg = single_bg("debug-bg", &layouts.view_proj, &debug_buf);

        let model_capacity = 256u32;
        let (model_buf, model_bg) = create_model_buffer(&device, &layouts, model_capacity);

        let palettes_capacity = 256u32;
        let (palettes_buf, prev_palettes_buf, palettes_bg) =
            create_palette_buffers(&device, &layouts, palettes_capacity);

        let frame_groups = create_frame_bind_groups(
            &device,
            &layouts,
            &targets,
            &sampler,
            &lighting_buf,
            &taa_buf,
        );

        let debug_vb_capacity = 1024u32;
        let debug_vb = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("debug-lines-vb"),
            size: debug_vb_capacity as u64 * std::mem::size_of::<types::LineVertex>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::info!(
            "renderer up: {}x{} {:?}, shadow map {}²",
            config.width,
            config.height,
            config.format,
            gbuffer::SHADOW_MAP_SIZE
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size: PhysicalSize::new(w, h),
            max_dim,
            layouts,
            pipelines,
            targets,
            frame_groups,
            sampler,
            globals_buf,
            globals_bg,
            sun_buf,
            sun_bg,
            debug_buf,
            debug_bg,
            lighting_buf,
            taa_buf,
            model_buf,
            model_bg,
            model_capacity,
            palettes_buf,
            prev_palettes_buf,
            palettes_bg,
            palettes_capacity,
            models: Vec::new(),
            debug_lines: DebugLines::default(),
            debug_vb,
            debug_vb_capacity,
            frame_id: 0,
            enable_taa: true,
            enable_pcf: true,
            blit_source: BlitSource::Final,
            prev_view_proj: Mat4::IDENTITY,
            taa_history_weight: tuning.taa_history_weight,
            taa_cross_weight: tuning.taa_cross_weight,
            shadow_pcf_bias: tuning.shadow_pcf_bias,
        })
    }

    pub fn upload_model(&mut self, cpu: &MeshCpu, label: &str) -> MeshHandle {
        let mesh = mesh::upload_mesh(&self.device, cpu, label);
        self.models.push(GpuModel::Static(mesh));
        MeshHandle(self.models.len() as u32 - 1)
    }

    pub fn upload_skinned_model(&mut self, cpu: &SkinnedMeshCpu, label: &str) -> MeshHandle {
        let mesh = mesh::upload_skinned_mesh(&self.device, cpu, label);
        self.models.push(GpuModel::Skinned(mesh));
        MeshHandle(self.models.len() as u32 - 1)
    }

    pub fn toggle_taa(&mut self) {
        self.enable_taa = !self.enable_taa;
        log::info!("taa: {}", if self.enable_taa { "on" } else { "off" });
    }

    pub fn toggle_pcf(&mut self) {
        self.enable_pcf = !self.enable_pcf;
        log::info!("pcf: {}", if self.enable_pcf { "on" } else { "off" });
    }

    pub fn cycle_blit_source(&mut self) {
        self.blit_source = self.blit_source.next();
        log::info!("blit source: {:?}", self.blit_source);
    }

    /// Queue accessor for the debug overlay; cleared after every frame.
    pub fn debug(&mut self) -> &mut DebugLines {
        &mut self.debug_lines
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Resize the swapchain and every screen-sized attachment.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        let (w, h) = util::scale_to_max((new_size.width, new_size.height), self.max_dim);
        if (w, h) != (new_size.width, new_size.height) {
            log::warn!(
                "clamping surface from {}x{} to {}x{} (max_dim={})",
                new_size.width,
                new_size.height,
                w,
                h,
                self.max_dim
            );
        }
        self.size = PhysicalSize::new(w, h);
        self.config.width = w;
        self.config.height = h;
        self.surface.configure(&self.device, &self.config);
        self.targets = RenderTargets::create(&self.device, w, h);
        self.frame_groups = create_frame_bind_groups(
            &self.device,
            &self.layouts,
            &self.targets,
            &self.sampler,
            &self.lighting_buf,
            &self.taa_buf,
        );
    }

    /// Render one frame of the scene.
    pub fn submit(&mut self, scene: &mut Scene) -> Result<(), SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let aspect = self.config.width as f32 / self.config.height as f32;
        let view_proj = camera::view_proj(&scene.camera, aspect);
        let jitter = if self.enable_taa {
            util::taa_jitter(self.frame_id, self.config.width, self.config.height)
        } else {
            Vec2::ZERO
        };

        self.write_frame_uniforms(scene, view_proj, jitter);
        let draws = self.build_draw_list(scene);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        self.pass_gbuffer(&mut encoder, &draws);
        self.pass_shadow(&mut encoder, &draws, scene.directional_light.is_some());
        self.pass_lighting(&mut encoder);
        self.pass_taa(&mut encoder);
        self.pass_tonemap(&mut encoder);
        self.copy_history(&mut encoder);
        self.pass_blit(&mut encoder, &surface_view);
        self.pass_debug(&mut encoder, &surface_view);

        self.queue.submit(Some(encoder.finish()));
        frame.present();

        self.prev_view_proj = view_proj;
        self.frame_id += 1;
        self.debug_lines.clear();
        Ok(())
    }

    fn write_frame_uniforms(&mut self, scene: &Scene, view_proj: Mat4, jitter: Vec2) {
        let camera_pos = scene.camera.eye();
        let globals = Globals {
            view_proj: view_proj.to_cols_array_2d(),
            prev_view_proj: self.prev_view_proj.to_cols_array_2d(),
            jitter: [jitter.x, jitter.y, 0.0, 0.0],
            camera_pos: camera_pos.to_array(),
            _pad: 0.0,
        };
        self.queue
            .write_buffer(&self.globals_buf, 0, bytemuck::bytes_of(&globals));

        let sun_view_proj = match scene.directional_light {
            Some(sun) => camera::sun_view_proj(&scene.camera, sun.direction),
            None => Mat4::IDENTITY,
        };
        self.queue.write_buffer(
            &self.sun_buf,
            0,
            bytemuck::bytes_of(&ViewProjUniform {
                view_proj: sun_view_proj.to_cols_array_2d(),
            }),
        );
        self.queue.write_buffer(
            &self.debug_buf,
            0,
            bytemuck::bytes_of(&ViewProjUniform {
                view_proj: view_proj.to_cols_array_2d(),
            }),
        );

        let sun = scene
            .directional_light
            .unwrap_or(crate::scene::DirectionalLight {
                direction: Vec3::NEG_Y,
                chromaticity: Vec3::ONE,
                luminance: 0.0,
            });
        let spot = scene.spot_light.unwrap_or(crate::scene::SpotLight {
            position: Vec3::ZERO,
            direction: Vec3::NEG_Y,
            chromaticity: Vec3::ONE,
            luminance: 0.0,
            inner_cutoff: 0.0,
            outer_cutoff: 0.5,
        });
        let lighting = LightingUniform {
            inverse_view_proj: view_proj.inverse().to_cols_array_2d(),
            sun_view_proj: sun_view_proj.to_cols_array_2d(),
            sun_direction: sun.direction.to_array(),
            sun_luminance: sun.luminance,
            sun_chromaticity: sun.chromaticity.to_array(),
            pcf_enabled: if self.enable_pcf { 1.0 } else { 0.0 },
            spot_position: spot.position.to_array(),
            spot_inner_cutoff: spot.inner_cutoff.cos(),
            spot_direction: spot.direction.to_array(),
            spot_outer_cutoff: spot.outer_cutoff.cos(),
            spot_chromaticity: spot.chromaticity.to_array(),
            spot_luminance: spot.luminance,
            camera_pos: camera_pos.to_array(),
            shadow_bias: self.shadow_pcf_bias,
            sky_color: SKY_COLOR,
            _pad: 0.0,
        };
        self.queue
            .write_buffer(&self.lighting_buf, 0, bytemuck::bytes_of(&lighting));

        let taa = TaaUniform {
            dimensions: [self.config.width as f32, self.config.height as f32],
            history_weight: self.taa_history_weight,
            cross_weight: self.taa_cross_weight,
        };
        self.queue
            .write_buffer(&self.taa_buf, 0, bytemuck::bytes_of(&taa));
    }

    /// Fill the per-draw model uniforms and skinning palettes, advancing each
    /// actor's `prev_transform` to the state just rendered.
    fn build_draw_list(&mut self, scene: &mut Scene) -> Vec<DrawCmd> {
        let mut draws = Vec::with_capacity(scene.len());
        let mut uniforms: Vec<u8> =
            Vec::with_capacity(scene.len() * MODEL_UNIFORM_STRIDE as usize);
        let mut palettes: Vec<[f32; 16]> = Vec::new();
        let mut prev_palettes: Vec<[f32; 16]> = Vec::new();

        for (_, actor) in scene.iter_mut() {
            let Some(model) = self.models.get(actor.mesh.0 as usize) else {
                continue;
            };
            let skinned = model.is_skinned();
            let mut palette_base = 0u32;
            if skinned {
                let Some(anim) = actor.anim.as_ref() else {
                    continue;
                };
                palette_base = palettes.len() as u32;
                palettes.extend(anim.palette.iter().map(|m| m.to_cols_array()));
                prev_palettes.extend(anim.prev_palette.iter().map(|m| m.to_cols_array()));
            }

            let offset = draws.len() as u32 * MODEL_UNIFORM_STRIDE as u32;
            let uniform = ModelUniform {
                model: actor.transform.to_cols_array_2d(),
                prev_model: actor.prev_transform.to_cols_array_2d(),
                diffuse: actor.material.diffuse,
                metallic: actor.material.metallic,
                roughness: actor.material.roughness,
                palette_base,
                _pad: [0.0; 2],
            };
            let start = uniforms.len();
            uniforms.resize(start + MODEL_UNIFORM_STRIDE as usize, 0);
            uniforms[start..start + std::mem::size_of::<ModelUniform>()]
                .copy_from_slice(bytemuck::bytes_of(&uniform));

            draws.push(DrawCmd {
                mesh: actor.mesh.0,
                offset,
                skinned,
            });
            actor.prev_transform = actor.transform;
        }

        let draw_count = draws.len() as u32;
        if draw_count > self.model_capacity {
            self.model_capacity = draw_count.next_power_of_two();
            let (buf, bg) = create_model_buffer(&self.device, &self.layouts, self.model_capacity);
            self.model_buf = buf;
            self.model_bg = bg;
        }
        if !uniforms.is_empty() {
            self.queue.write_buffer(&self.model_buf, 0, &uniforms);
        }

        let mat_count = palettes.len() as u32;
        if mat_count > self.palettes_capacity {
            self.palettes_capacity = mat_count.next_power_of_two();
            let (curr, prev, bg) =
                create_palette_buffers(&self.device, &self.layouts, self.palettes_capacity);
            self.palettes_buf = curr;
            self.prev_palettes_buf = prev;
            self.palettes_bg = bg;
        }
        if mat_count > 0 {
            self.queue
                .write_buffer(&self.palettes_buf, 0, bytemuck::cast_slice(&palettes));
            self.queue.write_buffer(
                &self.prev_palettes_buf,
                0,
                bytemuck::cast_slice(&prev_palettes),
            );
        }

        draws
    }

    fn draw_actors(&self, rpass: &mut wgpu::RenderPass<'_>, draws: &[DrawCmd], shadow: bool) {
        for draw in draws {
            let model = &self.models[draw.mesh as usize];
            let pipeline = match (shadow, draw.skinned) {
                (false, false) => &self.pipelines.gbuffer_static,
                (false, true) => &self.pipelines.gbuffer_skinned,
                (true, false) => &self.pipelines.shadow_static,
                (true, true) => &self.pipelines.shadow_skinned,
            };
            rpass.set_pipeline(pipeline);
            let frame_bg = if shadow { &self.sun_bg } else { &self.globals_bg };
            rpass.set_bind_group(0, frame_bg, &[]);
            rpass.set_bind_group(1, &self.model_bg, &[draw.offset]);
            if draw.skinned {
                rpass.set_bind_group(2, &self.palettes_bg, &[]);
            }
            let mesh = model.mesh();
            rpass.set_vertex_buffer(0, mesh.vertex_buf.slice(..));
            rpass.set_index_buffer(mesh.index_buf.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }

    fn pass_gbuffer(&self, encoder: &mut wgpu::CommandEncoder, draws: &[DrawCmd]) {
        let color = |view| {
            Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })
        };
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("gbuffer-pass"),
            color_attachments: &[
                color(&self.targets.diffuse_metallic_view),
                color(&self.targets.normal_roughness_view),
                color(&self.targets.motion_view),
            ],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.targets.depth_view,
                // Reversed-Z clear.
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        self.draw_actors(&mut rpass, draws, false);
    }

    fn pass_shadow(&self, encoder: &mut wgpu::CommandEncoder, draws: &[DrawCmd], lit: bool) {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("shadow-pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.targets.shadow_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        if lit {
            self.draw_actors(&mut rpass, draws, true);
        }
    }

    fn fullscreen_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        target: &wgpu::TextureView,
        pipeline: &wgpu::RenderPipeline,
        bind_group: &wgpu::BindGroup,
    ) {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: SKY_COLOR[0] as f64,
                        g: SKY_COLOR[1] as f64,
                        b: SKY_COLOR[2] as f64,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }

    fn pass_lighting(&self, encoder: &mut wgpu::CommandEncoder) {
        self.fullscreen_pass(
            encoder,
            "lighting-pass",
            &self.targets.lighting_view,
            &self.pipelines.lighting,
            &self.frame_groups.lighting,
        );
    }

    fn pass_taa(&self, encoder: &mut wgpu::CommandEncoder) {
        if self.enable_taa {
            self.fullscreen_pass(
                encoder,
                "taa-pass",
                &self.targets.taa_view,
                &self.pipelines.taa,
                &self.frame_groups.taa,
            );
        } else {
            self.fullscreen_pass(
                encoder,
                "taa-pass-disabled",
                &self.targets.taa_view,
                &self.pipelines.blit_hdr,
                &self.frame_groups.taa_disabled_copy,
            );
        }
    }

    fn pass_tonemap(&self, encoder: &mut wgpu::CommandEncoder) {
        self.fullscreen_pass(
            encoder,
            "tonemap-pass",
            &self.targets.post_view,
            &self.pipelines.tonemap,
            &self.frame_groups.tonemap,
        );
    }

    /// Blit this frame's TAA output and motion vectors into the buffers the
    /// next frame reads as "previous".
    fn copy_history(&self, encoder: &mut wgpu::CommandEncoder) {
        let extent = wgpu::Extent3d {
            width: self.config.width,
            height: self.config.height,
            depth_or_array_layers: 1,
        };
        encoder.copy_texture_to_texture(
            self.targets.taa.as_image_copy(),
            self.targets.accumulation.as_image_copy(),
            extent,
        );
        encoder.copy_texture_to_texture(
            self.targets.motion.as_image_copy(),
            self.targets.motion_prev.as_image_copy(),
            extent,
        );
    }

    fn pass_blit(&self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView) {
        use BlitSource::*;
        let (pipeline, bind_group) = match self.blit_source {
            Final => (&self.pipelines.blit, &self.frame_groups.blit_post),
            DiffuseMetallic => (&self.pipelines.blit, &self.frame_groups.blit_diffuse),
            NormalRoughness => (&self.pipelines.blit, &self.frame_groups.blit_normal),
            Motion => (&self.pipelines.blit, &self.frame_groups.blit_motion),
            Lighting => (&self.pipelines.blit, &self.frame_groups.blit_lighting),
            Accumulation => (&self.pipelines.blit, &self.frame_groups.blit_accumulation),
            Taa => (&self.pipelines.blit, &self.frame_groups.blit_taa),
            Depth => (&self.pipelines.blit_depth, &self.frame_groups.blit_depth),
            ShadowMap => (&self.pipelines.blit_depth, &self.frame_groups.blit_shadow),
        };
        self.fullscreen_pass(encoder, "blit-pass", surface_view, pipeline, bind_group);
    }

    fn pass_debug(&mut self, encoder: &mut wgpu::CommandEncoder, surface_view: &wgpu::TextureView) {
        if self.debug_lines.is_empty() {
            return;
        }
        let vertices = self.debug_lines.vertices();
        let count = vertices.len() as u32;
        if count > self.debug_vb_capacity {
            self.debug_vb_capacity = count.next_power_of_two();
            self.debug_vb = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("debug-lines-vb"),
                size: self.debug_vb_capacity as u64
                    * std::mem::size_of::<types::LineVertex>() as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
        }
        self.queue
            .write_buffer(&self.debug_vb, 0, bytemuck::cast_slice(vertices));

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("debug-overlay"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        rpass.set_pipeline(&self.pipelines.debug);
        rpass.set_bind_group(0, &self.debug_bg, &[]);
        rpass.set_vertex_buffer(0, self.debug_vb.slice(..));
        rpass.draw(0..count, 0..1);
    }
}

fn create_model_buffer(
    device: &wgpu::Device,
    layouts: &BindGroupLayouts,
    capacity: u32,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buf = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("model-uniforms"),
        size: capacity as u64 * MODEL_UNIFORM_STRIDE,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("model-bg"),
        layout: &layouts.model,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buf,
                offset: 0,
                size: wgpu::BufferSize::new(MODEL_UNIFORM_STRIDE),
            }),
        }],
    });
    (buf, bg)
}

fn create_palette_buffers(
    device: &wgpu::Device,
    layouts: &BindGroupLayouts,
    capacity: u32,
) -> (wgpu::Buffer, wgpu::Buffer, wgpu::BindGroup) {
    let make = |label: &str| {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: capacity as u64 * 64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    };
    let curr = make("palettes");
    let prev = make("palettes-prev");
    let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("palettes-bg"),
        layout: &layouts.palettes,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: curr.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: prev.as_entire_binding(),
            },
        ],
    });
    (curr, prev, bg)
}

fn create_frame_bind_groups(
    device: &wgpu::Device,
    layouts: &BindGroupLayouts,
    targets: &RenderTargets,
    sampler: &wgpu::Sampler,
    lighting_buf: &wgpu::Buffer,
    taa_buf: &wgpu::Buffer,
) -> FrameBindGroups {
    fn tex(view: &wgpu::TextureView, binding: u32) -> wgpu::BindGroupEntry<'_> {
        wgpu::BindGroupEntry {
            binding,
            resource: wgpu::BindingResource::TextureView(view),
        }
    }
    let samp = |binding: u32| wgpu::BindGroupEntry {
        binding,
        resource: wgpu::BindingResource::Sampler(sampler),
    };

    let lighting = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("lighting-bg"),
        layout: &layouts.lighting,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: lighting_buf.as_entire_binding(),
            },
            tex(&targets.diffuse_metallic_view, 1),
            tex(&targets.normal_roughness_view, 2),
            tex(&targets.depth_view, 3),
            tex(&targets.shadow_view, 4),
            samp(5),
        ],
    });

    let taa = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("taa-bg"),
        layout: &layouts.taa,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: taa_buf.as_entire_binding(),
            },
            tex(&targets.lighting_view, 1),
            tex(&targets.accumulation_view, 2),
            tex(&targets.motion_view, 3),
            tex(&targets.motion_prev_view, 4),
            tex(&targets.depth_view, 5),
            samp(6),
        ],
    });

    let blit_bg = |label: &str, view: &wgpu::TextureView| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layouts.blit,
            entries: &[tex(view, 0), samp(1)],
        })
    };
    let depth_bg = |label: &str, view: &wgpu::TextureView| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layouts.blit_depth,
            entries: &[tex(view, 0)],
        })
    };

    FrameBindGroups {
        lighting,
        taa,
        taa_disabled_copy: blit_bg("taa-disabled-copy-bg", &targets.lighting_view),
        tonemap: blit_bg("tonemap-bg", &targets.taa_view),
        blit_post: blit_bg("blit-post-bg", &targets.post_view),
        blit_diffuse: blit_bg("blit-diffuse-bg", &targets.diffuse_metallic_view),
        blit_normal: blit_bg("blit-normal-bg", &targets.normal_roughness_view),
        blit_motion: blit_bg("blit-motion-bg", &targets.motion_view),
        blit_lighting: blit_bg("blit-lighting-bg", &targets.lighting_view),
        blit_accumulation: blit_bg("blit-accumulation-bg", &targets.accumulation_view),
        blit_taa: blit_bg("blit-taa-bg", &targets.taa_view),
        blit_depth: depth_bg("blit-depth-bg", &targets.depth_view),
        blit_shadow: depth_bg("blit-shadow-bg", &targets.shadow_view),
    }
}
