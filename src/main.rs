//! mediaview - media carousel and drag-to-rotate 3D viewer.
//!
//! Two windows share one wgpu renderer:
//! - `viewer`: image, video or glTF model on a scene root, rotated by dragging
//! - `carousel`: full-window slideshow that auto-advances through a playlist

mod app;
mod assets;
mod carousel;
mod config;
mod render;
mod scene;
mod ui;
mod video;

use clap::{Parser, Subcommand};
use config::AppConfig;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "mediaview", version, about)]
struct Cli {
    /// JSON config file; defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory relative media paths are resolved against.
    #[arg(long)]
    assets: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Drag-to-rotate viewer with image, video and 3d modes
    Viewer,
    /// Auto-advancing image and video slideshow
    Carousel,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match AppConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("{}", err);
                std::process::exit(1);
            }
        },
        None => AppConfig::default(),
    };
    if let Some(root) = cli.assets {
        config.asset_root = root;
    }
    log::info!("Assets from {}", config.asset_root.display());

    let result = match cli.command {
        Command::Viewer => app::run_viewer(&config),
        Command::Carousel => app::run_carousel(&config),
    };

    match result {
        Ok(()) => log::info!("Goodbye!"),
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(1);
        }
    }
}
