use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "thumbkit", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a render request JSON into a PNG thumbnail.
    Render(RenderArgs),
    /// Print the filter expression for a set of filter knobs.
    FilterExpr(FilterArgs),
    /// Cut the subject out of an image by keying its corner color.
    RemoveBg(RemoveBgArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input render request JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Font file to register (repeatable).
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,

    /// Directory of font files to register.
    #[arg(long)]
    fonts_dir: Option<PathBuf>,

    /// Family used for generic or unregistered font families.
    #[arg(long)]
    fallback_family: Option<String>,

    /// Decode the two images one after the other.
    #[arg(long, default_value_t = false)]
    sequential: bool,
}

#[derive(Parser, Debug)]
struct FilterArgs {
    /// Brightness in percent (neutral 100).
    #[arg(long, default_value_t = 100.0)]
    brightness: f64,

    /// Contrast in percent (neutral 100).
    #[arg(long, default_value_t = 100.0)]
    contrast: f64,

    /// Saturation in percent (neutral 100).
    #[arg(long, default_value_t = 100.0)]
    saturation: f64,

    /// Blur radius in pixels.
    #[arg(long, default_value_t = 0.0)]
    blur: f64,

    /// Hue rotation in degrees.
    #[arg(long, default_value_t = 0.0)]
    hue_rotate: f64,

    /// Grayscale amount in percent.
    #[arg(long, default_value_t = 0.0)]
    grayscale: f64,

    /// Sepia amount in percent.
    #[arg(long, default_value_t = 0.0)]
    sepia: f64,
}

#[derive(Parser, Debug)]
struct RemoveBgArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Key tolerance, 0..=1.
    #[arg(long, default_value_t = 0.1)]
    tolerance: f32,

    /// Feather width beyond the tolerance, 0..=1.
    #[arg(long, default_value_t = 0.05)]
    feather: f32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("THUMBKIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::FilterExpr(args) => cmd_filter_expr(args),
        Command::RemoveBg(args) => cmd_remove_bg(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let request = thumbkit::RenderRequest::from_path(&args.in_path)?;
    let base_dir = args.in_path.parent().unwrap_or_else(|| Path::new("."));

    let mut fonts = thumbkit::FontBook::new();
    for path in &args.fonts {
        fonts
            .add_file(path)
            .with_context(|| format!("load font '{}'", path.display()))?;
    }
    if let Some(dir) = &args.fonts_dir {
        let added = fonts
            .add_dir(dir)
            .with_context(|| format!("scan fonts dir '{}'", dir.display()))?;
        tracing::debug!(added, dir = %dir.display(), "registered font directory");
    }

    let opts = thumbkit::CompositorOpts {
        fonts,
        fallback_family: args.fallback_family,
        parallel_decode: !args.sequential,
        ..thumbkit::CompositorOpts::default()
    };
    let loader = thumbkit::ImageLoader::new(thumbkit::ObjectStore::new()).with_base_dir(base_dir);
    let thumb = thumbkit::create_thumbnail(&loader, &request, &opts)?;

    write_output(&args.out, &thumb.png)?;
    eprintln!("wrote {} ({}x{})", args.out.display(), thumb.width, thumb.height);
    Ok(())
}

fn cmd_filter_expr(args: FilterArgs) -> anyhow::Result<()> {
    let filters = thumbkit::ImageFilterSet {
        brightness: args.brightness,
        contrast: args.contrast,
        saturation: args.saturation,
        blur: args.blur,
        hue_rotate: args.hue_rotate,
        grayscale: args.grayscale,
        sepia: args.sepia,
    };
    println!("{}", thumbkit::build_filter_expression(&filters));
    Ok(())
}

fn cmd_remove_bg(args: RemoveBgArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read image '{}'", args.in_path.display()))?;
    let image = thumbkit::decode_image(&bytes)?;
    let remover = thumbkit::ColorKeyRemover::new(args.tolerance, args.feather)?;

    let task = thumbkit::spawn_removal(Arc::new(remover), image)?;
    let cutout = task.wait(|pct| tracing::info!(progress = pct, "removing background"))?;
    let png = thumbkit::encode_png(&cutout)?;

    write_output(&args.out, &png)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write png '{}'", path.display()))
}
