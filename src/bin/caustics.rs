use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use reflective_caustics::{
    BlendMode, CausticsPipeline, DebugView, FrameTargets, ReceiverRegistry, Scene, WorldSource,
    write_frame_png, write_intensity_png,
};

#[derive(Parser, Debug)]
#[command(name = "caustics", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate receiver caustics textures as 16-bit PNGs.
    Generate(GenerateArgs),
    /// Generate, preview the scene camera, composite and write the frame.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory; one `<receiver>.png` per receiver.
    #[arg(long)]
    out_dir: PathBuf,

    /// Multiplier applied before quantisation.
    #[arg(long, default_value_t = 1.0)]
    exposure: f32,

    /// Time in seconds for procedural water.
    #[arg(long, default_value_t = 0.0)]
    time: f32,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Also write the published debug textures.
    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input scene JSON (must declare a camera).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Time in seconds for procedural water.
    #[arg(long, default_value_t = 0.0)]
    time: f32,

    /// Use multiplicative composition instead of the scene's blend mode.
    #[arg(long, default_value_t = false)]
    multiply: bool,

    /// Reconstruct world positions from depth instead of the position buffer.
    #[arg(long, default_value_t = false)]
    from_depth: bool,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let scene = Scene::from_path(&args.in_path)?;
    let registry = Arc::new(ReceiverRegistry::new());
    let mut opts = scene.pipeline_opts(args.threads);
    opts.generation.publish_debug |= args.debug;
    let built = scene.build(&registry, args.time)?;
    let mut pipeline = CausticsPipeline::new(Arc::clone(&registry), opts)?;

    let stats = pipeline.generate_only();
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    for receiver in &built.receivers {
        let Some(texture) = receiver.texture_snapshot() else {
            eprintln!("skipped {} (inactive)", receiver.name());
            continue;
        };
        let path = args.out_dir.join(format!("{}.png", receiver.name()));
        write_intensity_png(&texture, args.exposure, &path)?;
        eprintln!("wrote {} (max {:.4})", path.display(), texture.max_value());
    }

    if args.debug {
        let inspector = pipeline.inspector();
        for view in DebugView::ALL {
            let Some(name) = view.texture_name() else {
                continue;
            };
            match inspector.preview(view, 0) {
                Ok(p) => {
                    let path = args.out_dir.join(format!("{name}.png"));
                    write_intensity_png(&p.texture, 1.0, &path)?;
                    eprintln!("wrote {}", path.display());
                }
                Err(e) => eprintln!("{}: {e}", view.label()),
            }
        }
    }

    eprintln!(
        "generated {} receiver(s), {} samples, {} splats",
        stats.generation.receivers_rendered, stats.generation.samples, stats.generation.splats
    );
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let scene = Scene::from_path(&args.in_path)?;
    let registry = Arc::new(ReceiverRegistry::new());
    let built = scene.build(&registry, args.time)?;
    let camera = built
        .camera
        .with_context(|| format!("scene '{}' declares no camera", args.in_path.display()))?;

    let mut pipeline = CausticsPipeline::new(Arc::clone(&registry), scene.pipeline_opts(args.threads))?;
    if args.multiply {
        pipeline.composite_mut().set_blend(BlendMode::Multiply);
    }

    let mut preview = camera.render(&registry.receivers())?;
    let world = if args.from_depth {
        WorldSource::Depth(&preview.depth)
    } else {
        WorldSource::Positions(&preview.positions)
    };
    let mut targets = FrameTargets {
        color: Some(&mut preview.color),
        world: Some(world),
    };
    let stats = pipeline.render_frame(&mut targets);

    ensure_parent(&args.out)?;
    write_frame_png(&preview.color, &args.out)?;
    eprintln!(
        "wrote {} ({} pixel(s) lit by {} receiver(s))",
        args.out.display(),
        stats.composite.pixels_matched,
        stats.composite.receivers_bound
    );
    Ok(())
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}
