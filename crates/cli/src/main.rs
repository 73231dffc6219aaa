//! rtplan CLI - regional transportation-planning spatial metrics

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geo::BoundingRect;
use indicatif::{ProgressBar, ProgressStyle};
use rtplan_analyses::analysis;
use rtplan_core::config::Config;
use rtplan_core::io::Container;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "rtplan")]
#[command(author, version, about = "Regional transportation-planning spatial metrics", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every analysis enabled in the configuration
    Run {
        /// Path to the TOML configuration file
        #[arg(short, long, default_value = "configs/config.toml")]
        config: PathBuf,
    },
    /// List the layers of a container
    Layers {
        /// Container directory
        container: PathBuf,
    },
    /// Show information about a layer
    Info {
        /// Container directory
        container: PathBuf,
        /// Layer name
        layer: String,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

// ─── Commands ───────────────────────────────────────────────────────────

fn cmd_run(config_path: &PathBuf) -> Result<()> {
    let config = Config::from_path(config_path)
        .with_context(|| format!("failed to load configuration {}", config_path.display()))?;
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("failed to create {}", config.output_dir.display()))?;

    let start = Instant::now();
    let outcomes = analysis::run_enabled(&config);
    if outcomes.is_empty() {
        println!("No analyses enabled in {}", config_path.display());
        return Ok(());
    }

    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| o.result.is_err())
        .map(|o| o.name)
        .collect();
    println!(
        "{}/{} analyses succeeded in {:.2?}",
        outcomes.len() - failed.len(),
        outcomes.len(),
        start.elapsed()
    );
    if !failed.is_empty() {
        anyhow::bail!("failed analyses: {}", failed.join(", "));
    }
    Ok(())
}

fn cmd_layers(container: &PathBuf) -> Result<()> {
    let container = Container::open(container).context("failed to open container")?;
    for name in container.list_layers().context("failed to list layers")? {
        println!("{}", name);
    }
    Ok(())
}

fn cmd_info(container: &PathBuf, layer_name: &str) -> Result<()> {
    let pb = spinner("Reading layer...");
    let container = Container::open(container).context("failed to open container")?;
    let layer = container
        .read_layer(layer_name)
        .context("failed to read layer")?;
    pb.finish_and_clear();
    info!("Layer: {}", layer.name());

    println!("Layer: {}", layer.name());
    println!("Records: {}", layer.len());
    println!("CRS: {}", layer.crs());
    match layer.geometry_family() {
        Some(family) => println!("Geometry: {}", family),
        None => println!("Geometry: none"),
    }

    let bounds = layer
        .iter()
        .filter_map(|f| f.geometry.as_ref().and_then(|g| g.bounding_rect()))
        .reduce(|a, b| {
            geo_types::Rect::new(
                geo_types::Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                geo_types::Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                },
            )
        });
    if let Some(rect) = bounds {
        println!(
            "Bounds: ({:.3}, {:.3}) - ({:.3}, {:.3})",
            rect.min().x,
            rect.min().y,
            rect.max().x,
            rect.max().y
        );
    }

    let columns: BTreeSet<&str> = layer
        .iter()
        .flat_map(|f| f.properties.keys().map(String::as_str))
        .collect();
    if !columns.is_empty() {
        println!("Columns:");
        for column in columns {
            println!("  {}", column);
        }
    }
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match &cli.command {
        Commands::Run { config } => cmd_run(config),
        Commands::Layers { container } => cmd_layers(container),
        Commands::Info { container, layer } => cmd_info(container, layer),
    }
}
