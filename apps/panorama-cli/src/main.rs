use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use panorama_render::{
    FACE_COUNT, Face, FaceSet, RecordingBackend, RenderContext, RotatingPanorama, SkyboxConfig,
    SkyboxRenderer,
};
use panorama_render_wgpu::{HeadlessGpu, OFFSCREEN_FORMAT, WgpuSkyboxBackend, procedural_face};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "panorama-cli", about = "CLI tool for the skybox renderer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print versions and the default configuration
    Info,
    /// Load and validate a config file, then print its projection
    CheckConfig {
        /// Path to a .yaml, .yml or .json config
        path: PathBuf,
        /// Aspect ratio used for the printed projection
        #[arg(long, default_value_t = 16.0 / 9.0)]
        aspect: f32,
    },
    /// Draw once against a recording backend and print the command stream
    Trace {
        /// Yaw in degrees
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        yaw: f32,
        /// Pitch in degrees (accepted, not applied)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        pitch: f32,
        /// Blend factor in [0, 1]
        #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
        alpha: f32,
        /// Viewport width over height
        #[arg(long, default_value_t = 16.0 / 9.0)]
        aspect: f32,
        /// Make this face's texture unavailable
        #[arg(long)]
        missing_face: Option<usize>,
        /// Print commands as JSON
        #[arg(long)]
        json: bool,
        /// Config file to use instead of the defaults
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Render the rotating panorama offscreen with generated face textures
    Render {
        #[arg(long, default_value = "1280")]
        width: u32,
        #[arg(long, default_value = "720")]
        height: u32,
        /// Frames to render, one tick apart
        #[arg(long, default_value = "60")]
        frames: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => info()?,
        Commands::CheckConfig { path, aspect } => check_config(path, aspect)?,
        Commands::Trace {
            yaw,
            pitch,
            alpha,
            aspect,
            missing_face,
            json,
            config,
        } => {
            let config = load_config(config)?;
            trace(config, yaw, pitch, alpha, aspect, missing_face, json)?;
        }
        Commands::Render {
            width,
            height,
            frames,
        } => render(width, height, frames)?,
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<SkyboxConfig> {
    match path {
        Some(path) => SkyboxConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(SkyboxConfig::default()),
    }
}

fn info() -> anyhow::Result<()> {
    println!("panorama-cli v{}", env!("CARGO_PKG_VERSION"));
    println!("render: {}", panorama_render::crate_info());
    println!("faces: {FACE_COUNT}");
    println!("default config:");
    print!("{}", serde_yaml::to_string(&SkyboxConfig::default())?);
    Ok(())
}

fn check_config(path: PathBuf, aspect: f32) -> anyhow::Result<()> {
    let config = SkyboxConfig::load(&path)
        .with_context(|| format!("loading config {}", path.display()))?;
    println!("{}: OK", path.display());
    print!("{}", serde_yaml::to_string(&config)?);
    println!("projection (aspect {aspect}):");
    for row in 0..4 {
        println!("  {:?}", config.projection(aspect).row(row).to_array());
    }
    Ok(())
}

fn trace(
    config: SkyboxConfig,
    yaw: f32,
    pitch: f32,
    alpha: f32,
    aspect: f32,
    missing_face: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let faces = FaceSet::panorama(&config.panorama.texture_prefix);
    let mut backend = RecordingBackend::new();
    if let Some(index) = missing_face {
        let Some(face) = Face::ALL.get(index).copied() else {
            bail!("--missing-face must be below {FACE_COUNT}, got {index}");
        };
        if let Some(texture) = faces.get(face) {
            backend = backend.with_missing_texture(texture.clone());
        }
    }

    let mut ctx = RenderContext::new();
    let before = ctx.clone();
    let mut renderer = SkyboxRenderer::new(config);
    let report = renderer
        .draw(&mut ctx, &mut backend, &faces, yaw, pitch, alpha, aspect)
        .context("skybox draw failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(backend.commands())?);
    } else {
        print!("{}", backend.dump());
        println!(
            "batches={} fallback_faces={:?}",
            report.batches, report.fallback_faces
        );
    }

    if ctx != before {
        bail!("render state not restored after draw");
    }
    tracing::info!(depth = ctx.depth(), "render state balanced");
    Ok(())
}

fn render(width: u32, height: u32, frames: u32) -> anyhow::Result<()> {
    let gpu = HeadlessGpu::new().context("creating headless GPU")?;
    let mut backend = WgpuSkyboxBackend::new(&gpu.device, &gpu.queue, OFFSCREEN_FORMAT);
    let mut panorama = RotatingPanorama::new(SkyboxConfig::default());

    const FACE_SIZE: u32 = 64;
    for (face, texture) in Face::ALL.into_iter().zip(panorama.faces().iter()) {
        backend
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

    let (_target, view) = gpu.create_target(width, height);
    let aspect = width.max(1) as f32 / height.max(1) as f32;
    let mut ctx = RenderContext::new();
    let mut total_draws = 0;

    for frame in 0..frames {
        let report = panorama.render(&mut ctx, &mut backend, 1.0, aspect)?;
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("panorama_frame"),
            });
        let draws = backend.encode(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &view,
            Some(wgpu::Color::BLACK),
        );
        gpu.queue.submit(std::iter::once(encoder.finish()));
        let _ = gpu.device.poll(wgpu::Maintain::Wait);

        let (yaw, pitch) = panorama.angles();
        tracing::debug!(frame, yaw, pitch, draws, fallback = ?report.fallback_faces, "frame rendered");
        total_draws += draws;
        panorama.advance(1.0);
    }

    println!(
        "rendered {frames} frames at {width}x{height} on {} ({} draw calls)",
        gpu.adapter_info.name, total_draws
    );
    Ok(())
}
