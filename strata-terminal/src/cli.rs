/// Command-line options for the terminal viewer
use std::path::PathBuf;

use clap::Parser;
use strata_core::{default_seed, SeedLayer};

/// Strata terminal viewer - layered mesh scenes with volume readouts
#[derive(Parser, Debug)]
#[command(name = "strata-terminal")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// STL files to add as layers
    pub files: Vec<PathBuf>,

    /// Initial background brightness, 0 (black) to 1 (white)
    #[arg(short, long, default_value_t = 1.0)]
    pub brightness: f32,

    /// Target frames per second
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=120))]
    pub fps: u32,

    /// Start without the built-in demo layers
    #[arg(long)]
    pub empty: bool,
}

/// Resolved startup configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub files: Vec<PathBuf>,
    pub brightness: f32,
    pub fps: u32,
    /// Layers restored on startup and by reset
    pub seed: Vec<SeedLayer>,
}

impl From<Cli> for AppConfig {
    fn from(cli: Cli) -> Self {
        Self {
            files: cli.files,
            brightness: cli.brightness,
            fps: cli.fps,
            seed: if cli.empty { Vec::new() } else { default_seed() },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            brightness: 1.0,
            fps: 30,
            seed: default_seed(),
        }
    }
}
