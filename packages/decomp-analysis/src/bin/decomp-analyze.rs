//! Decomp Analysis CLI
//!
//! Runs register ModRef and pointer discovery over a serialized module and
//! prints the debug dumps (or a JSON report).
//!
//! # Usage
//!
//! ```bash
//! # Text dumps with the balanced preset
//! cargo run --bin decomp-analyze -- module.json
//!
//! # Thorough preset, JSON output
//! cargo run --bin decomp-analyze -- module.json --preset thorough --json
//!
//! # Configuration file, per-SCC logging
//! RUST_LOG=decomp_analysis=debug cargo run --bin decomp-analyze -- module.json --config analysis.yaml
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use decomp_analysis::config::{AnalysisConfig, Architecture, Preset};
use decomp_analysis::usecases::{AnalysisInput, AnalysisService};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "decomp-analyze")]
#[command(about = "Register ModRef and pointer discovery over a lifted module", long_about = None)]
struct Cli {
    /// Input JSON: { "module": ..., "candidates"?: [...], "mapped_ranges"?: [...] }
    input: PathBuf,

    /// YAML configuration file (takes precedence over --preset)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preset: fast, balanced, thorough
    #[arg(short, long, default_value = "balanced")]
    preset: String,

    /// Override the register file
    #[arg(long, value_parser = parse_architecture)]
    arch: Option<Architecture>,

    /// Print a JSON report instead of the text dumps
    #[arg(long)]
    json: bool,
}

fn parse_architecture(s: &str) -> Result<Architecture, String> {
    match s.to_lowercase().as_str() {
        "x86_64" | "x86-64" | "amd64" => Ok(Architecture::X86_64),
        "aarch64" | "arm64" => Ok(Architecture::Aarch64),
        other => Err(format!("unknown architecture '{}'", other)),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

fn load_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_yaml_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => {
            let preset = Preset::from_str(&cli.preset).map_err(anyhow::Error::msg)?;
            AnalysisConfig::preset(preset)
        }
    };
    if let Some(arch) = cli.arch {
        config = config.architecture(arch);
    }
    Ok(config.build()?)
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let input = AnalysisInput::from_json_file(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;

    let service = AnalysisService::new(config)?;
    let outcome = service.run(&input)?;

    if cli.json {
        let report = outcome.report(&input.module);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", outcome.render_text(&input.module));
    }
    Ok(())
}
