use anyhow::{Context, Result};
use crossbeam_channel as xchan;
use std::{sync::Arc, time::Instant};
use tracing::info;
use wgpu::util::DeviceExt;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::ShowcaseConfig;
use crate::motion::marquee::Marquee;
use crate::motion::rig::{HoverTrigger, Rig};
use crate::motion::stack::CardStack;
use crate::motion::value::{Value, Value2};
use crate::render::loader::{LoaderEvent, LoaderMsg, spawn_loader};

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    pos: [f32; 2],
    uv: [f32; 2],
}

const QUAD: [Vertex; 4] = [
    //   NDC pos         UV
    Vertex {
        pos: [-1.0, -1.0],
        uv: [0.0, 1.0],
    }, // bottom-left
    Vertex {
        pos: [1.0, -1.0],
        uv: [1.0, 1.0],
    }, // bottom-right
    Vertex {
        pos: [-1.0, 1.0],
        uv: [0.0, 0.0],
    }, // top-left
    Vertex {
        pos: [1.0, 1.0],
        uv: [1.0, 0.0],
    }, // top-right
];

// Five vec4 blocks, see distortion.wgsl.
const PARAMS_SIZE: u64 = 80;

/// Run the showcase window until the user closes it.
///
/// # Errors
/// Returns an error if the rendering backend fails to initialize or submit
/// work. A missing or broken showcase image is not an error; the card just
/// renders transparent.
pub fn run_showcase(cfg: &ShowcaseConfig) -> Result<()> {
    info!(image = %cfg.image_path.display(), "starting showcase viewer");
    let motion = Motion::build(cfg)?;
    let event_loop = EventLoop::new()?;
    let mut app = App::new(cfg.clone(), motion);
    event_loop.run_app(&mut app)?;
    Ok(())
}

struct Tex {
    view: wgpu::TextureView,
    w: u32,
    h: u32,
}

struct Gpu {
    _instance: wgpu::Instance,
    surface: wgpu::Surface<'static>,
    _adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    pipeline: wgpu::RenderPipeline,
    bind_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    vbuf: wgpu::Buffer,
    params_buf: wgpu::Buffer,

    tex: Tex,
    sampler: wgpu::Sampler,

    uv_scale: [f32; 2],
    /// 0 until an image decodes; stays 0 forever on decode failure.
    fill_alpha: f32,
}

/// Motion graph outputs read once per frame when packing uniforms.
struct Motion {
    rig: Rig,
    pointer: Value2,
    scroll: Value,
    tilt_deg: Value,
    parallax: Value,
    fade: Value,
    smooth_velocity: Value,
    hover: Value,
    hover_trigger: HoverTrigger,
    marquee: Marquee,
    stack: CardStack,
    progress_map: crate::motion::map::PiecewiseMap,
    clip_inset: Value,
    clip_radius: Value,
}

impl Motion {
    fn build(cfg: &ShowcaseConfig) -> Result<Self> {
        let mut rig = Rig::new();
        let pointer = Value2::new(0.0, 0.0);
        let scroll = rig.signal(0.0);

        // Hero tilt: spring the raw pointer, then map onto degrees.
        rig.begin_effect();
        let deg = cfg.tilt.max_degrees;
        let smooth_y = rig.spring(&pointer.y, cfg.tilt.spring);
        let tilt_deg = rig.map(&smooth_y, &[-1.0, 1.0], &[deg, -deg])?;

        // Scroll parallax and hero fade.
        rig.begin_effect();
        let parallax = rig.map(
            &scroll,
            &[0.0, cfg.parallax.scroll_range_px],
            &[0.0, cfg.parallax.travel_px],
        )?;
        let fade = rig.map(&scroll, &[0.0, cfg.parallax.fade_range_px], &[1.0, 0.0])?;

        // Velocity marquee: differentiate scroll, smooth it, boost the strip.
        rig.begin_effect();
        let velocity = rig.velocity(&scroll);
        let smooth_velocity = rig.spring(&velocity, cfg.marquee.spring);

        // Card reveal: clip inset opens and corners relax as you scroll in.
        rig.begin_effect();
        let clip_inset = rig.map(&scroll, &[0.0, cfg.parallax.scroll_range_px], &[48.0, 8.0])?;
        let clip_radius = rig.map(&scroll, &[0.0, cfg.parallax.scroll_range_px], &[32.0, 16.0])?;

        // Distortion hover ramp.
        rig.begin_effect();
        let (hover_trigger, hover) = rig.hover(cfg.hover.ramp, cfg.hover.decay);

        let cards = cfg.stack.cards;
        let section_len = cfg.parallax.scroll_range_px * cards as f32;
        let progress_map =
            crate::motion::map::PiecewiseMap::new(&[0.0, section_len], &[0.0, 1.0])?;

        Ok(Self {
            rig,
            pointer,
            scroll,
            tilt_deg,
            parallax,
            fade,
            smooth_velocity,
            hover,
            hover_trigger,
            marquee: Marquee::new(cfg.marquee.base_velocity),
            stack: CardStack::new(cards)?,
            progress_map,
            clip_inset,
            clip_radius,
        })
    }
}

struct App {
    cfg: ShowcaseConfig,
    motion: Motion,
    jitter_seed: f32,

    // timing
    started: Instant,
    last_frame: Instant,

    // window/gpu
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,

    // decode pipeline
    tx_req: xchan::Sender<LoaderMsg>,
    rx_res: xchan::Receiver<LoaderEvent>,
}

impl App {
    fn new(cfg: ShowcaseConfig, motion: Motion) -> Self {
        let (tx_req, rx_req) = xchan::unbounded::<LoaderMsg>();
        let (tx_res, rx_res) = xchan::unbounded::<LoaderEvent>();
        spawn_loader(rx_req, tx_res);

        Self {
            cfg,
            motion,
            jitter_seed: rand::random::<f32>() * 100.0,
            started: Instant::now(),
            last_frame: Instant::now(),
            window: None,
            gpu: None,
            tx_req,
            rx_res,
        }
    }
}

impl ApplicationHandler for App {
    #[allow(clippy::too_many_lines)]
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // ----- window -----
        let attrs = WindowAttributes::default()
            .with_title("dada studio showcase")
            .with_inner_size(PhysicalSize::new(1280, 800));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));
        self.window = Some(window.clone());

        // ----- kick off the image decode -----
        let _ = self
            .tx_req
            .send(LoaderMsg::Decode(self.cfg.image_path.clone()));

        // ----- GPU init -----
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");

        let gpu_init = async move {
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: Some(&surface),
                    force_fallback_adapter: false,
                })
                .await
                .context("no compatible GPU adapter found")?;

            let (device, queue) = adapter
                .request_device(
                    &wgpu::DeviceDescriptor {
                        label: Some("device"),
                        required_features: wgpu::Features::empty(),
                        required_limits: wgpu::Limits::default(),
                    },
                    None,
                )
                .await?;

            let caps = surface.get_capabilities(&adapter);
            let format = caps
                .formats
                .iter()
                .copied()
                .find(wgpu::TextureFormat::is_srgb)
                .unwrap_or(caps.formats[0]);
            let PhysicalSize { width, height } = window.inner_size();
            let config = wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: width.max(1),
                height: height.max(1),
                present_mode: wgpu::PresentMode::AutoVsync,
                alpha_mode: caps.alpha_modes[0],
                view_formats: vec![],
                desired_maximum_frame_latency: 1,
            };
            surface.configure(&device, &config);

            // Placeholder texture until (unless) the showcase image decodes.
            let tex = upload_texture(&device, &queue, &[0, 0, 0, 0], 1, 1);

            let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            });

            let params_buf = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("params"),
                size: PARAMS_SIZE,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            let vbuf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("quad"),
                contents: bytemuck::cast_slice(&QUAD),
                usage: wgpu::BufferUsages::VERTEX,
            });

            let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("distortion"),
                source: wgpu::ShaderSource::Wgsl(include_str!("shaders/distortion.wgsl").into()),
            });

            let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("bind_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

            let bind_group = make_bind_group(&device, &bind_layout, &tex, &sampler, &params_buf);

            let vlayout = wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
            };

            let pip_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("pipe_layout"),
                bind_group_layouts: &[&bind_layout],
                push_constant_ranges: &[],
            });

            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("pipeline"),
                layout: Some(&pip_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[vlayout],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: None,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

            Ok::<Gpu, anyhow::Error>(Gpu {
                _instance: instance,
                surface,
                _adapter: adapter,
                device,
                queue,
                config,
                pipeline,
                bind_layout,
                bind_group,
                vbuf,
                params_buf,
                tex,
                sampler,
                uv_scale: [1.0, 1.0],
                fill_alpha: 0.0,
            })
        };

        self.gpu = Some(pollster::block_on(gpu_init).expect("GPU init"));
        self.started = Instant::now();
        self.last_frame = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(win) = &self.window else { return };
        if win.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                let _ = self.tx_req.send(LoaderMsg::Quit);
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Released {
                    use winit::keyboard::{KeyCode, PhysicalKey};
                    if let PhysicalKey::Code(KeyCode::Escape | KeyCode::KeyQ) = event.physical_key {
                        let _ = self.tx_req.send(LoaderMsg::Quit);
                        event_loop.exit();
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let size = win.inner_size();
                let (w, h) = (size.width.max(1) as f32, size.height.max(1) as f32);
                // Normalize to -1..1 around the window center.
                let x = (position.x as f32 - w / 2.0) / (w / 2.0);
                let y = (position.y as f32 - h / 2.0) / (h / 2.0);
                self.motion.pointer.set(x, y);
                self.motion.hover_trigger.fire();
            }
            WindowEvent::CursorLeft { .. } => {
                self.motion.pointer.set(0.0, 0.0);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, lines) => lines * 40.0,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };
                // Wheel-down scrolls the page forward.
                let next = (self.motion.scroll.get() - dy).max(0.0);
                self.motion.scroll.set(next);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(gpu) = &mut self.gpu
                    && width > 0
                    && height > 0
                {
                    gpu.config.width = width;
                    gpu.config.height = height;
                    gpu.surface.configure(&gpu.device, &gpu.config);
                    gpu.uv_scale = compute_uv_scale(width, height, gpu.tex.w, gpu.tex.h);
                }
            }
            WindowEvent::RedrawRequested => self.draw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _el: &ActiveEventLoop) {
        let Some(gpu) = &mut self.gpu else { return };

        // Receive decode results (non-blocking).
        while let Ok(event) = self.rx_res.try_recv() {
            match event {
                LoaderEvent::Ready { size, pixels } => {
                    gpu.tex = upload_texture(&gpu.device, &gpu.queue, &pixels, size.0, size.1);
                    gpu.uv_scale =
                        compute_uv_scale(gpu.config.width, gpu.config.height, gpu.tex.w, gpu.tex.h);
                    gpu.fill_alpha = 1.0;
                    gpu.bind_group = make_bind_group(
                        &gpu.device,
                        &gpu.bind_layout,
                        &gpu.tex,
                        &gpu.sampler,
                        &gpu.params_buf,
                    );
                }
                LoaderEvent::Failed(_) => {
                    // Purely decorative: stay transparent instead of failing.
                    gpu.fill_alpha = 0.0;
                }
            }
        }

        // Signals were written by events; smooth, map, then bind.
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.motion.rig.step(dt);
        let marquee_offset = self
            .motion
            .marquee
            .advance(self.motion.smooth_velocity.get(), dt);

        let progress = self.motion.progress_map.map(self.motion.scroll.get());
        let card_scale = self.motion.stack.card_scale(0, progress);

        let params: [f32; 20] = [
            gpu.uv_scale[0],
            gpu.uv_scale[1],
            gpu.fill_alpha,
            (now - self.started).as_secs_f32(),
            self.motion.pointer.x.get(),
            self.motion.pointer.y.get(),
            self.motion.hover.get(),
            self.jitter_seed,
            self.cfg.hover.aberration_px,
            self.cfg.hover.jitter_px,
            self.motion.parallax.get(),
            card_scale,
            self.motion.clip_inset.get(),
            self.motion.clip_inset.get(),
            self.motion.clip_radius.get(),
            marquee_offset,
            gpu.config.width as f32,
            gpu.config.height as f32,
            self.motion.fade.get(),
            self.motion.tilt_deg.get(),
        ];
        gpu.queue
            .write_buffer(&gpu.params_buf, 0, bytemuck::bytes_of(&params));

        if let Some(win) = &self.window {
            win.request_redraw();
        }
    }
}

impl App {
    fn draw(&self) {
        let Some(gpu) = &self.gpu else { return };
        let Ok(frame) = gpu.surface.get_current_texture() else {
            return;
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("rpass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.009,
                            g: 0.009,
                            b: 0.009,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&gpu.pipeline);
            rpass.set_bind_group(0, &gpu.bind_group, &[]);
            rpass.set_vertex_buffer(0, gpu.vbuf.slice(..));
            rpass.draw(0..4, 0..1);
        }
        gpu.queue.submit([encoder.finish()]);
        frame.present();
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pixels: &[u8],
    w: u32,
    h: u32,
) -> Tex {
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("showcase"),
        size: wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        tex.as_image_copy(),
        pixels,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * w),
            rows_per_image: Some(h),
        },
        wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
    );
    Tex {
        view: tex.create_view(&wgpu::TextureViewDescriptor::default()),
        w,
        h,
    }
}

fn make_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    tex: &Tex,
    sampler: &wgpu::Sampler,
    params_buf: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("bind_group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&tex.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: params_buf.as_entire_binding(),
            },
        ],
    })
}

/// UV scale that makes the image cover the surface without stretching,
/// recomputed whenever the surface or image dimensions change.
#[allow(clippy::cast_precision_loss)]
pub fn compute_uv_scale(win_w: u32, win_h: u32, img_w: u32, img_h: u32) -> [f32; 2] {
    let ww = win_w as f32;
    let wh = win_h as f32;
    let iw = img_w as f32;
    let ih = img_h as f32;

    if ww == 0.0 || wh == 0.0 || iw == 0.0 || ih == 0.0 {
        return [1.0, 1.0];
    }

    let win_ar = ww / wh;
    let img_ar = iw / ih;

    if img_ar > win_ar {
        // Image is wider than the surface: shrink the sampled area
        // horizontally so the visible crop keeps the image's aspect.
        [win_ar / img_ar, 1.0]
    } else {
        // Image is taller: shrink the sampled area vertically.
        [1.0, img_ar / win_ar]
    }
}
