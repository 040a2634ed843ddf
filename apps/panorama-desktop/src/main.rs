use anyhow::{Context, Result, bail};
use clap::Parser;
use panorama_render::{FACE_COUNT, Face, RenderContext, RotatingPanorama, SkyboxConfig};
use panorama_render_wgpu::{WgpuSkyboxBackend, procedural_face};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Panorama ticks per second of wall-clock time.
const TICKS_PER_SECOND: f32 = 20.0;
/// Seconds for the panorama to fade in from transparent.
const FADE_IN_SECONDS: f32 = 1.0;
const FACE_SIZE: u32 = 256;

#[derive(Parser)]
#[command(name = "panorama-desktop", about = "Rotating skybox panorama viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Leave this face without a texture so it draws with the fallback
    #[arg(long)]
    missing_face: Option<usize>,

    /// Config file (.yaml, .yml or .json)
    #[arg(long)]
    config: Option<PathBuf>,
}

struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    backend: WgpuSkyboxBackend,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Panorama")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("find adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("panorama_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&fallback_format) = surface_caps.formats.first() else {
            bail!("surface reports no formats");
        };
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(fallback_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let backend = WgpuSkyboxBackend::new(&device, &queue, surface_format);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            backend,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
    }

    fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }
}

struct PanoramaApp {
    panorama: RotatingPanorama,
    ctx: RenderContext,
    missing_face: Option<Face>,
    gpu: Option<Gpu>,
    started: Instant,
    last_frame: Instant,
}

impl PanoramaApp {
    fn new(config: SkyboxConfig, missing_face: Option<Face>) -> Self {
        let now = Instant::now();
        Self {
            panorama: RotatingPanorama::new(config),
            ctx: RenderContext::new(),
            missing_face,
            gpu: None,
            started: now,
            last_frame: now,
        }
    }

    fn upload_faces(&self, gpu: &mut Gpu) -> Result<()> {
        for (face, texture) in Face::ALL.into_iter().zip(self.panorama.faces().iter()) {
            if Some(face) == self.missing_face {
                tracing::info!(face = face.index(), %texture, "leaving face without texture");
                continue;
            }
            gpu.backend
                .textures_mut()
                .upload_rgba8(
                    &gpu.device,
                    &gpu.queue,
                    texture.clone(),
                    FACE_SIZE,
                    FACE_SIZE,
                    &procedural_face(face, FACE_SIZE),
                )
                .with_context(|| format!("uploading {texture}"))?;
        }
        Ok(())
    }

    fn redraw(&mut self) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.panorama.advance(dt * TICKS_PER_SECOND);
        let alpha = now.duration_since(self.started).as_secs_f32() / FADE_IN_SECONDS;

        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = gpu.window.inner_size();
                gpu.resize(size);
                return;
            }
            Err(e) => {
                tracing::error!("failed to acquire frame: {e}");
                return;
            }
        };
        let view = output.texture.create_view(&Default::default());
        let aspect = gpu.aspect();

        if let Err(e) = self
            .panorama
            .render(&mut self.ctx, &mut gpu.backend, alpha, aspect)
        {
            tracing::error!("panorama draw failed: {e}");
        }

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("panorama_encoder"),
            });
        gpu.backend.encode(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &view,
            Some(wgpu::Color::BLACK),
        );
        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

impl ApplicationHandler for PanoramaApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let init = Gpu::new(event_loop).and_then(|mut gpu| {
            self.upload_faces(&mut gpu)?;
            Ok(gpu)
        });
        match init {
            Ok(gpu) => {
                self.started = Instant::now();
                self.last_frame = self.started;
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("GPU initialization failed: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(size);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let missing_face = match cli.missing_face {
        Some(index) => match Face::ALL.get(index).copied() {
            Some(face) => Some(face),
            None => bail!("--missing-face must be below {FACE_COUNT}, got {index}"),
        },
        None => None,
    };
    let config = match &cli.config {
        Some(path) => SkyboxConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SkyboxConfig::default(),
    };

    tracing::info!("panorama-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = PanoramaApp::new(config, missing_face);
    event_loop.run_app(&mut app)?;

    Ok(())
}
