//! marker-icons CLI - Render status-tinted map markers to PNG

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use marker_icons::{Bitmap, IconCategory, PreloadConfig, Session, ThemeMode, map_icon_key};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "marker-icons")]
#[command(author, version, about = "Render status-tinted map marker icons", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preload every marker and write it as a PNG
    Render {
        /// JSON configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Output directory
        #[arg(short, long)]
        out: PathBuf,
        /// Session JSON with server and user preferences
        #[arg(long)]
        session: Option<PathBuf>,
        /// Force the dark palette
        #[arg(long)]
        dark: bool,
    },
    /// List the supported icon categories
    Categories,
    /// Show which icon a device category is drawn with
    Resolve {
        /// Device category as reported by the server
        category: String,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let default = if verbose { "marker_icons=debug" } else { "marker_icons=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn read_session(path: &Path) -> Result<Session> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session {}", path.display()))?;
    Session::from_json(&json).with_context(|| format!("Invalid session {}", path.display()))
}

fn write_png(bitmap: &Bitmap, path: &Path) -> Result<()> {
    bitmap
        .data
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

async fn render(
    config_path: PathBuf,
    out: PathBuf,
    session: Option<PathBuf>,
    dark: bool,
) -> Result<()> {
    let mut config = PreloadConfig::load(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    if let Some(path) = session {
        config.apply_session(&read_session(&path)?);
    }
    if dark {
        config.theme = ThemeMode::Dark;
    }

    let loader = config.loader().context("Failed to create HTTP client")?;
    let preloader = config.preloader(loader).context("Invalid configuration")?;

    let start = Instant::now();
    let cache = preloader.run().await;
    info!(
        "Preloaded {} markers ({} degraded) in {:.2?}",
        cache.len(),
        cache.degraded_count(),
        start.elapsed()
    );

    std::fs::create_dir_all(&out)
        .with_context(|| format!("Failed to create {}", out.display()))?;
    write_png(cache.background(), &out.join("background.png"))?;
    write_png(cache.direction(), &out.join("direction.png"))?;
    for (key, icon) in cache.iter() {
        write_png(icon.bitmap(), &out.join(format!("{key}.png")))?;
    }
    info!("Wrote {} files to {}", cache.len() + 2, out.display());
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Render {
            config,
            out,
            session,
            dark,
        } => render(config, out, session, dark).await?,

        Commands::Categories => {
            for category in IconCategory::ALL {
                println!("{category}");
            }
        }

        Commands::Resolve { category } => {
            let resolved = map_icon_key(&category);
            println!("{category} -> {resolved} ({})", resolved.file_name());
        }
    }

    Ok(())
}
