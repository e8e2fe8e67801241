mod replay;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use contest_common::{canonical_json_schema, load_config, AppConfig, LogFormat};
use contest_reconcile::{EventKind, Orchestrator, ReconcileLog, ValidationGate};

#[derive(Parser)]
#[command(name = "replay", about = "Replay recorded extraction responses through the reconciliation chain")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile every item in a replay file and print the results as JSON.
    Run {
        /// Replay file with items and recorded backend responses
        input: PathBuf,
        /// Config TOML (overrides RECONCILE_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write results here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Items reconciled at once (overrides RECONCILE_CONCURRENCY)
        #[arg(long)]
        concurrency: Option<usize>,
        /// Persist a run log under DATA_DIR/reconcile-runs
        #[arg(long)]
        save_log: bool,
    },
    /// Print the canonical record's JSON Schema.
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::from_default_env().add_directive("contest=info".parse()?);
    match LogFormat::from_env() {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&canonical_json_schema())?);
            Ok(())
        }
        Command::Run {
            input,
            config,
            output,
            concurrency,
            save_log,
        } => run(input, config, output, concurrency, save_log).await,
    }
}

async fn run(
    input: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    concurrency: Option<usize>,
    save_log: bool,
) -> Result<()> {
    let app_config = AppConfig::from_env()?;
    let file_config = match config {
        Some(path) => load_config(&path)?,
        None => app_config.file_config()?,
    };
    let concurrency = concurrency.unwrap_or(app_config.concurrency).max(1);

    let replay = replay::load_replay_file(&input)?;
    let items = replay.contest_items();
    let chain: Vec<String> = file_config
        .chain
        .sources
        .iter()
        .map(|e| e.tag.to_string())
        .collect();
    info!(items = items.len(), chain = ?chain, concurrency, "Starting replay");

    let orchestrator = Orchestrator::builder()
        .backends(replay.backends(&file_config.chain))
        .gate(ValidationGate::new(file_config.schema))
        .build();

    let mut run_log = ReconcileLog::default();
    run_log.log(EventKind::RunStarted {
        items: items.len(),
        chain,
    });

    let results = orchestrator.reconcile_all(&items, concurrency).await;
    for result in &results {
        run_log.log_item(result);
    }

    let stats = run_log.stats();
    info!(
        run_id = %run_log.run_id,
        items = stats.items,
        accepted = stats.accepted,
        degraded = stats.degraded,
        exhausted = stats.exhausted,
        soft_failures = stats.soft_failures,
        calls_saved = stats.calls_saved,
        "Replay complete"
    );

    let json = serde_json::to_string_pretty(&results)?;
    match output {
        Some(path) => std::fs::write(&path, json)
            .with_context(|| format!("Failed to write results to {}", path.display()))?,
        None => println!("{json}"),
    }

    if save_log {
        run_log.save(&app_config.data_dir)?;
    }

    Ok(())
}
