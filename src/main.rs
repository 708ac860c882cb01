use clap::Parser;
use lounge_ledger::application::engine::LedgerEngine;
use lounge_ledger::config::Config;
use lounge_ledger::domain::command::Command;
use lounge_ledger::domain::ports::{AccountStoreBox, SystemClock};
use lounge_ledger::infrastructure::in_memory::InMemoryAccountStore;
use lounge_ledger::infrastructure::sqlite::SqliteAccountStore;
use lounge_ledger::interfaces::csv::event_reader::EventReader;
use lounge_ledger::interfaces::text::{render_error, render_outcome};
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input events CSV file (identity,command,args)
    input: PathBuf,

    /// Path to the persistent database (optional). If provided, uses SQLite;
    /// otherwise state lives in memory for the duration of the run.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Fee charged per hour of attendance
    #[arg(long, default_value = "6.0")]
    hourly_rate: Decimal,

    /// Sessions up to this many seconds are free
    #[arg(long, default_value_t = 120)]
    grace_period: i64,

    /// Administrator identity, may be given multiple times
    #[arg(long = "admin")]
    admins: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("lounge-ledger {} starting", env!("CARGO_PKG_VERSION"));

    let config = Config {
        hourly_rate: cli.hourly_rate,
        grace_period_secs: cli.grace_period,
        admins: cli.admins.into_iter().collect(),
    };

    // A storage failure here disables the service entirely rather than
    // running with partial state.
    let store: AccountStoreBox = if let Some(db_path) = cli.db_path {
        Box::new(SqliteAccountStore::open(db_path).into_diagnostic()?)
    } else {
        Box::new(InMemoryAccountStore::new())
    };

    let engine = LedgerEngine::new(store, Box::new(SystemClock), config.clone());

    // Replay the inbound event stream, one rendered line per event.
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = EventReader::new(file);
    for event in reader.events() {
        match event {
            Ok(event) => {
                let result = match Command::parse(&event.command, &event.args) {
                    Ok(command) => engine.execute(&event.identity, command).await,
                    Err(e) => Err(e),
                };
                let line = match result {
                    Ok(outcome) => render_outcome(&outcome, &config),
                    Err(e) => render_error(&e),
                };
                println!("{line}");
            }
            Err(e) => {
                eprintln!("Error reading event: {e}");
            }
        }
    }

    Ok(())
}
