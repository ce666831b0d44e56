//! # mofn-cli: M-of-N Escrow Command-Line Interface
//!
//! Drives a ledger kept in a local JSON file. Every `tx` mines one block
//! and rewrites the file; queries and inspection never modify it.
//!
//! Writing commands take the ledger's write lock first and refuse to run
//! while another writer (a second CLI or a running API server) holds it.
//!
//! ## Subcommands
//!
//! - `init`: deploy a fresh ledger file.
//! - `status`: tip height, epoch, and account count.
//! - `tx`: submit a state-changing call and print its receipt.
//! - `query`: evaluate a read-only getter and print the Clarity response.
//! - `show`: print one account in full.
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers delegate to `mofn-state`; no escrow rules live here.
//! - Handlers return the process exit code.

pub mod chain;
pub mod query;
pub mod tx;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use mofn_core::EpochSchedule;
use mofn_state::{persist, Ledger, LedgerLock};

/// Default ledger file, relative to the working directory.
pub const DEFAULT_LEDGER_PATH: &str = ".mofn/ledger.json";

/// Where the ledger lives and how a fresh one is deployed.
#[derive(Debug, Clone)]
pub struct LedgerLocation {
    /// Ledger file path.
    pub path: PathBuf,
    /// Epoch width for newly deployed ledgers. An existing file keeps its own.
    pub blocks_per_epoch: Option<u64>,
}

impl LedgerLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            blocks_per_epoch: None,
        }
    }

    /// The schedule a fresh deployment would use.
    pub fn schedule(&self) -> Result<EpochSchedule> {
        match self.blocks_per_epoch {
            Some(width) => EpochSchedule::new(width).context("invalid --blocks-per-epoch"),
            None => Ok(EpochSchedule::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the ledger's write lock. Hold the guard across open and save.
    pub fn lock(&self) -> Result<LedgerLock> {
        LedgerLock::acquire(&self.path)
            .with_context(|| format!("cannot write ledger {}", self.path.display()))
    }

    /// Load the ledger file, deploying in memory if it does not exist yet.
    pub fn open(&self) -> Result<Ledger> {
        let ledger = persist::load_or_deploy(&self.path, self.schedule()?)
            .with_context(|| format!("failed to open ledger {}", self.path.display()))?;
        if let Some(width) = self.blocks_per_epoch {
            let actual = ledger.schedule().blocks_per_epoch();
            if actual != width {
                tracing::warn!(
                    requested = width,
                    actual,
                    "ledger file already fixes the epoch width; ignoring --blocks-per-epoch"
                );
            }
        }
        Ok(ledger)
    }

    /// Write `ledger` back to the file.
    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        persist::save(ledger, &self.path)
            .with_context(|| format!("failed to save ledger {}", self.path.display()))
    }
}
