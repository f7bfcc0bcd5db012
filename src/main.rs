use anyhow::{Context, Result};
use clap::Parser;
use safety_gate::cli::{Cli, OutputFormat};
use safety_gate::config_loader;
use safety_gate::gate::{self, GateConfig, GateDecision};
use safety_gate::history::{HistoricalRun, HistoryStore, JsonlHistory};
use safety_gate::runner::RunResult;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `--debug` raises everything to TRACE
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Cli) -> Result<GateConfig> {
    let mut config = match &args.config {
        Some(path) => config_loader::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => args.preset.config(),
    };

    args.apply_overrides(&mut config);
    config.validate().context("Invalid configuration after overrides")?;
    Ok(config)
}

fn load_run(args: &Cli) -> Result<RunResult> {
    let content = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read run file {}", args.input.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse run file {}", args.input.display()))
}

fn render(decision: &GateDecision, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(decision.to_report_string()),
        OutputFormat::Json => decision
            .to_json()
            .context("Failed to serialize gate decision"),
    }
}

fn run(args: &Cli) -> Result<GateDecision> {
    let config = load_config(args)?;
    let run = load_run(args)?;
    let directions = config.direction_table();

    let history = args
        .history
        .as_ref()
        .map(|path| {
            JsonlHistory::open(path)
                .with_context(|| format!("Failed to open history {}", path.display()))
        })
        .transpose()?;

    let decision = gate::evaluate(
        &run,
        &config,
        &directions,
        history.as_ref().map(|h| h as &dyn HistoryStore),
    );

    if let (Some(label), Some(store)) = (&args.record, &history) {
        store
            .append(HistoricalRun::from_candidate(&run, label, decision.verdict))
            .context("Failed to record run in history")?;
    }

    let output = render(&decision, args.format)?;
    match &args.output {
        Some(path) => std::fs::write(path, output)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", output),
    }

    Ok(decision)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    // Any error above exits 1 through anyhow, same as BLOCK
    let decision = run(&args)?;
    std::process::exit(decision.exit_code());
}
