mod scene;

use anyhow::{Context, Result};
use clap::Parser;
use scene::Scene;
use softraster_core::logging::{LogConfig, LogLevel};
use softraster_core::{open_renderer, PixelMode};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "softraster", about = "Render a scene with the software rasterizer")]
struct Args {
    /// Scene description (JSON); the built-in demo scene when omitted
    scene: Option<PathBuf>,

    /// Where to write the rendered frame
    #[arg(short, long, default_value = "frame.png")]
    output: PathBuf,

    /// Override the scene's pixel mode: rgb565, rgb24 or rgba32
    #[arg(long)]
    mode: Option<PixelMode>,

    /// Core log level: off, error, warn, info, debug, trace
    #[arg(long, default_value = "warn")]
    log_level: LogLevel,

    /// Send core logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the demo scene as JSON to this file and exit
    #[arg(long)]
    dump_demo: Option<PathBuf>,

    /// Print the surface debug state after rendering
    #[arg(long, default_value_t = false)]
    debug: bool,
}

fn write_png(path: &Path, width: u32, height: u32, rgb: &[u8]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(rgb)?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = LogConfig::global();
    config.set_global_level(args.log_level);
    if let Some(path) = &args.log_file {
        config
            .set_log_file(path.clone())
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
    }

    if let Some(path) = &args.dump_demo {
        let mut f = File::create(path)?;
        write!(f, "{}", serde_json::to_string_pretty(&Scene::demo())?)?;
        log::info!("Wrote demo scene to {}", path.display());
        return Ok(());
    }

    let mut scene = match &args.scene {
        Some(path) => Scene::load(path)?,
        None => Scene::demo(),
    };
    if let Some(mode) = args.mode {
        scene.mode = mode;
    }

    let mut renderer = open_renderer(scene.mode, scene.width, scene.height)?;
    log::info!(
        "Rendering {} commands on a {}x{} {} surface",
        scene.commands.len(),
        renderer.width(),
        renderer.height(),
        renderer.name()
    );
    scene.render(renderer.as_mut())?;

    let (width, height) = (renderer.width(), renderer.height());
    let mut rgb = vec![0u8; width as usize * height as usize * 3];
    renderer.read_rgb24(&mut rgb);
    write_png(&args.output, width, height, &rgb)?;
    println!("Wrote {}x{} frame to {}", width, height, args.output.display());

    if args.debug {
        println!("{}", serde_json::to_string_pretty(&renderer.debug_state())?);
    }

    config.clear_log_file();
    Ok(())
}
