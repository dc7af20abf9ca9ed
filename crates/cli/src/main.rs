mod demo;
mod serve;

use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use curio_core::TransitionPolicy;
use curio_engine::EngineConfig;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Museum artifact rental lifecycle engine.
#[derive(Parser)]
#[command(name = "curio", version, about = "Museum artifact rental lifecycle engine")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server with a periodic overdue scanner
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
        /// Below this total amount, exchange-initiated requests need only
        /// the exchange's approval. Unset: every request needs both sides.
        #[arg(long)]
        single_side_threshold: Option<Decimal>,
        /// Seconds between overdue scanner sweeps
        #[arg(long, default_value = "86400")]
        scan_interval_secs: u64,
    },

    /// Run one overdue sweep and print the report
    Scan,

    /// Walk a scripted rental through its full lifecycle and print the trail
    Demo {
        /// Request the digitization branch (3D model upload and review)
        #[arg(long)]
        virtual_museum: bool,
    },
}

fn engine_config(threshold: Option<Decimal>, scan_interval_secs: u64) -> EngineConfig {
    EngineConfig {
        policy: TransitionPolicy {
            single_side_threshold: threshold,
        },
        scan_interval: Duration::from_secs(scan_interval_secs.max(1)),
        ..EngineConfig::default()
    }
}

/// One sweep against a fresh in-memory backend. Mostly useful as a smoke
/// test; a durable backend would make this an operational command.
async fn scan(output: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let store = std::sync::Arc::new(curio_storage::MemoryStore::new());
    let engine = curio_engine::Engine::new(store, EngineConfig::default());
    let report = engine.sweep_overdue().await?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => println!(
            "scanned {} / marked overdue {} / skipped {}",
            report.scanned, report.marked_overdue, report.skipped
        ),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Serve {
            port,
            single_side_threshold,
            scan_interval_secs,
        } => {
            serve::start_server(port, engine_config(single_side_threshold, scan_interval_secs))
                .await
        }
        Commands::Scan => scan(cli.output).await,
        Commands::Demo { virtual_museum } => demo::run(virtual_museum, cli.output).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
