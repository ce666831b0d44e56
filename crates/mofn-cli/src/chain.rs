//! # Init and Status Subcommands
//!
//! `mofn init` deploys a ledger file; `mofn status` summarises it.

use anyhow::{bail, Result};
use clap::Args;

use mofn_state::Ledger;

use crate::LedgerLocation;

/// Arguments for `mofn init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Replace an existing ledger file.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for `mofn status`.
#[derive(Args, Debug)]
pub struct StatusArgs {}

/// Deploy a new ledger and write it to the ledger file.
pub fn run_init(args: &InitArgs, location: &LedgerLocation) -> Result<u8> {
    let _lock = location.lock()?;
    if location.path().exists() && !args.force {
        bail!(
            "ledger already exists: {} (use --force to replace it)",
            location.path().display()
        );
    }

    let schedule = location.schedule()?;
    let ledger = Ledger::deploy(schedule);
    location.save(&ledger)?;

    println!(
        "OK: deployed ledger at {} (tip {}, {} blocks per epoch)",
        location.path().display(),
        ledger.tip(),
        schedule.blocks_per_epoch()
    );
    Ok(0)
}

/// Print chain tip, epoch, and account count.
pub fn run_status(_args: &StatusArgs, location: &LedgerLocation) -> Result<u8> {
    let ledger = location.open()?;
    let tip = ledger.tip();
    let schedule = ledger.schedule();

    println!("Ledger: {}", location.path().display());
    if !location.path().exists() {
        println!("  (not yet written; run `mofn init`)");
    }
    println!("  Tip: {tip}");
    println!(
        "  Epoch: {} ({} blocks per epoch)",
        schedule.epoch_of(tip).0,
        schedule.blocks_per_epoch()
    );
    println!("  Accounts: {}", ledger.queries().get_open_accounts());
    Ok(0)
}
