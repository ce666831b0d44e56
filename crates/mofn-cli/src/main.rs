//! # mofn CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mofn_cli::chain::{run_init, run_status, InitArgs, StatusArgs};
use mofn_cli::query::{run_query, run_show, QueryArgs, ShowArgs};
use mofn_cli::tx::{run_tx, TxArgs};
use mofn_cli::{LedgerLocation, DEFAULT_LEDGER_PATH};

/// M-of-N escrow ledger CLI.
///
/// Deploys a local ledger file, submits escrow transactions against it,
/// and evaluates read-only queries.
#[derive(Parser, Debug)]
#[command(name = "mofn", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the ledger file.
    #[arg(long, global = true, default_value = DEFAULT_LEDGER_PATH)]
    ledger: PathBuf,

    /// Epoch width used when a new ledger is deployed.
    #[arg(long, global = true)]
    blocks_per_epoch: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Deploy a new ledger file.
    Init(InitArgs),

    /// Show chain tip, epoch, and account count.
    Status(StatusArgs),

    /// Submit a state-changing transaction (mines one block).
    Tx(TxArgs),

    /// Evaluate a read-only function.
    Query(QueryArgs),

    /// Print one account in full.
    Show(ShowArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let location = LedgerLocation {
        path: cli.ledger,
        blocks_per_epoch: cli.blocks_per_epoch,
    };
    tracing::debug!(ledger = %location.path.display(), "resolved ledger file");

    let result = match cli.command {
        Commands::Init(args) => run_init(&args, &location),
        Commands::Status(args) => run_status(&args, &location),
        Commands::Tx(args) => run_tx(&args, &location),
        Commands::Query(args) => run_query(&args, &location),
        Commands::Show(args) => run_show(&args, &location),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
