use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "inkframe", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a device configuration and compile its scene.
    Check(CheckArgs),
    /// Render the scene once into a PNG.
    Render(RenderArgs),
    /// Refresh periodically, rewriting the PNG whenever the frame changes.
    Run(RunArgs),
    /// Dispatch an event, then wait for any render it triggered.
    Event(EventArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Device configuration JSON.
    #[arg(long)]
    config: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Device configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Device configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Stop after this many refreshes.
    #[arg(long)]
    iterations: Option<u64>,

    /// Override the configured interval, in seconds.
    #[arg(long)]
    interval: Option<f64>,
}

#[derive(Parser, Debug)]
struct EventArgs {
    /// Device configuration JSON.
    #[arg(long)]
    config: PathBuf,

    /// Event keyword, e.g. `button_press`.
    #[arg(long)]
    event: String,

    /// Event payload as a JSON object.
    #[arg(long, default_value = "{}")]
    payload: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
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
        Command::Check(args) => cmd_check(args),
        Command::Render(args) => cmd_render(args),
        Command::Run(args) => cmd_run(args),
        Command::Event(args) => cmd_event(args),
    }
}

fn load(path: &Path) -> anyhow::Result<inkframe::DeviceConfig> {
    let device = inkframe::DeviceConfig::from_path(path)
        .with_context(|| format!("load device config '{}'", path.display()))?;
    device
        .validate()
        .with_context(|| format!("validate device config '{}'", path.display()))?;
    Ok(device)
}

fn coordinator(
    device: inkframe::DeviceConfig,
    out: &Path,
) -> anyhow::Result<inkframe::RenderCoordinator> {
    let driver = inkframe::PngDriver::new(out);
    inkframe::RenderCoordinator::new(device, inkframe::AppRegistry::with_builtins(), driver)
        .context("start render coordinator")
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let device = load(&args.config)?;
    let graph = inkframe::compile_scene(&device.scene).context("compile scene")?;
    let registry = inkframe::AppRegistry::with_builtins();
    let unregistered: Vec<&str> = graph
        .nodes()
        .filter(|n| n.kind == inkframe::NodeKind::App && !registry.contains(n.keyword()))
        .map(|n| n.id.as_str())
        .collect();

    println!(
        "{}: scene '{}' ok, {} nodes, {} edges",
        device.name,
        graph.scene_id(),
        graph.node_count(),
        graph.edge_count()
    );
    if !unregistered.is_empty() {
        println!("unregistered apps at nodes: {}", unregistered.join(", "));
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let device = load(&args.config)?;
    let coord = coordinator(device, &args.out)?;
    let outcome = coord.render_now("cli").context("render")?;
    coord.power_off().context("power off display")?;

    match outcome {
        inkframe::RenderOutcome::Written { .. } => eprintln!("wrote {}", args.out.display()),
        other => eprintln!("nothing written ({other:?})"),
    }
    Ok(())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let device = load(&args.config)?;
    let interval = match args.interval {
        Some(secs) => inkframe::interval_from_secs(secs).context("--interval")?,
        None => device.interval()?,
    };
    let coord = coordinator(device, &args.out)?;

    let mut scheduler = inkframe::Scheduler::new(interval);
    if let Some(n) = args.iterations {
        scheduler = scheduler.limit(n.max(1));
    }
    let handle = scheduler
        .start(coord.clone())
        .context("start scheduler")?;
    handle.join();
    coord.power_off().context("power off display")?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_event(args: EventArgs) -> anyhow::Result<()> {
    let device = load(&args.config)?;
    let payload: inkframe::JsonMap =
        serde_json::from_str(&args.payload).context("parse --payload as a JSON object")?;
    let coord = coordinator(device, &args.out)?;

    let ctx = coord
        .dispatch_event(&args.event, payload)
        .with_context(|| format!("dispatch '{}'", args.event))?;
    coord.wait_idle();
    coord.power_off().context("power off display")?;

    println!(
        "{}: ran [{}], errored [{}]",
        args.event,
        ctx.apps_ran.join(", "),
        ctx.apps_errored.join(", ")
    );
    Ok(())
}
