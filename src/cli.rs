//! CLI argument parsing for safety-gate

use crate::gate::GateConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the gate decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable verdict summary (default)
    Text,
    /// Full decision as JSON for machine parsing
    Json,
}

/// Built-in configuration presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    Default,
    /// alpha 0.01, 99% intervals, at least 10 samples per group
    Strict,
    /// alpha 0.10, 90% intervals
    Permissive,
}

impl Preset {
    pub fn config(&self) -> GateConfig {
        match self {
            Preset::Default => GateConfig::default(),
            Preset::Strict => GateConfig::strict(),
            Preset::Permissive => GateConfig::permissive(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "safety-gate")]
#[command(version)]
#[command(
    about = "Regression gate for model releases: OK (exit 0), WARN (exit 2) or BLOCK (exit 1)",
    long_about = None
)]
pub struct Cli {
    /// Recorded baseline vs candidate run (JSON)
    #[arg(short = 'i', long = "input", value_name = "RUN_JSON")]
    pub input: PathBuf,

    /// Gate configuration file (.toml, .yaml or .yml)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Preset used when no config file is given
    #[arg(long = "preset", value_enum, default_value = "default", conflicts_with = "config")]
    pub preset: Preset,

    /// JSON-lines history file for erosion trend analysis
    #[arg(long = "history", value_name = "FILE")]
    pub history: Option<PathBuf>,

    /// Append the candidate run to history under this version label
    #[arg(long = "record", value_name = "VERSION", requires = "history")]
    pub record: Option<String>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write the decision to a file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Override the resampling seed
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,

    /// Override the number of bootstrap resamples
    #[arg(long = "bootstrap", value_name = "N")]
    pub bootstrap: Option<usize>,

    /// Override the number of permutations
    #[arg(long = "permutations", value_name = "N")]
    pub permutations: Option<usize>,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply_overrides(&self, config: &mut GateConfig) {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(n) = self.bootstrap {
            config.n_bootstrap = n;
        }
        if let Some(n) = self.permutations {
            config.n_permutations = n;
        }
    }
}
