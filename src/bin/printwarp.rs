use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "printwarp", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a design onto a product mockup and write a PNG.
    Render(RenderArgs),
    /// Print the printable-area bounds of a product mask as JSON.
    Bounds(BoundsArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Product profile JSON.
    #[arg(long)]
    config: PathBuf,

    /// Design image (PNG, JPEG, ...).
    #[arg(long)]
    design: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Design scale in percent of the fitted size (0-200).
    #[arg(long)]
    scale: Option<f32>,

    /// Horizontal anchor in percent (0-100, 50 centers).
    #[arg(long)]
    offset_x: Option<f32>,

    /// Vertical anchor in percent (0-100, 50 centers).
    #[arg(long)]
    offset_y: Option<f32>,

    /// Displacement intensity in percent (0-100).
    #[arg(long)]
    intensity: Option<f32>,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct BoundsArgs {
    /// Product profile JSON.
    #[arg(long)]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Bounds(args) => cmd_bounds(args),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut config = printwarp::MockupConfig::from_path(&args.config)?;
    if args.threads.is_some() {
        config.engine.threads = args.threads;
    }

    let mut sess = printwarp::MockupSession::open(&config)?;
    if !sess.assets_ready() {
        anyhow::bail!(
            "product '{}' is missing its base photo or mask; nothing to render",
            config.product
        );
    }

    let bytes = std::fs::read(&args.design)
        .with_context(|| format!("read design '{}'", args.design.display()))?;
    sess.set_design_bytes(&bytes)?;

    let params = printwarp::RenderParameters {
        scale: args.scale.unwrap_or(sess.params().scale),
        offset_x: args.offset_x.unwrap_or(sess.params().offset_x),
        offset_y: args.offset_y.unwrap_or(sess.params().offset_y),
        displacement_intensity: args.intensity.unwrap_or(sess.params().displacement_intensity),
    };
    params.validate()?;
    sess.set_params(params);

    let frame = sess.render()?.context("render produced no output")?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        frame.as_bytes(),
        frame.width(),
        frame.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_bounds(args: BoundsArgs) -> anyhow::Result<()> {
    let config = printwarp::MockupConfig::from_path(&args.config)?;
    let sess = printwarp::MockupSession::open(&config)?;
    let mockup = sess
        .mockup()
        .context("product is missing its base photo or mask")?;

    let bounds = mockup.bounds();
    let out = serde_json::json!({
        "product": config.product,
        "width": mockup.base().width(),
        "height": mockup.base().height(),
        "empty": bounds.is_empty(),
        "bounds": bounds,
        "displacement": mockup.displacement_source(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
