//! # Tx Subcommand
//!
//! Submits one state-changing call. The call is mined even when the
//! contract aborts it, so the ledger file is rewritten either way.
//!
//! ```text
//! mofn tx create u2 u3 --sender ST37X0038BZV6YV0MQCJ0G6QMZZ75QS64KA69V9D
//! mofn tx deposit u1 u1000 --sender SZ2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQ9H6DPR
//! ```
//!
//! Exit code 0 means committed, 2 means aborted by the contract.

use anyhow::{Context, Result};
use clap::Args;

use mofn_core::Principal;

use crate::LedgerLocation;

/// Exit code for a transaction the contract aborted.
pub const EXIT_ABORTED: u8 = 2;

/// Arguments for `mofn tx`.
#[derive(Args, Debug)]
pub struct TxArgs {
    /// Contract function (`create`, `add-participant`, `set-receiver`,
    /// `deposit`, `add-signature`, `withdraw`).
    pub method: String,

    /// Clarity literal arguments (`u1000`, principals).
    pub args: Vec<String>,

    /// Principal signing the transaction.
    #[arg(long)]
    pub sender: String,

    /// Print the receipt as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the tx subcommand.
pub fn run_tx(args: &TxArgs, location: &LedgerLocation) -> Result<u8> {
    let sender = Principal::new(args.sender.as_str()).context("invalid --sender")?;
    let _lock = location.lock()?;
    let ledger = location.open()?;

    let receipt = ledger
        .submit(&args.method, args.args.as_slice(), &sender)
        .with_context(|| format!("rejected call to {}", args.method))?;
    location.save(&ledger)?;

    if args.json {
        let body = serde_json::json!({
            "height": receipt.height.get(),
            "method": receipt.method.as_str(),
            "sender": receipt.sender.as_str(),
            "committed": receipt.is_committed(),
            "result": receipt.legacy_text(),
            "output": receipt.output(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{receipt}");
        println!("  Block: {}", receipt.height);
        if let Some(e) = receipt.error() {
            println!("  Reason: {e}");
        }
    }

    Ok(if receipt.is_committed() { 0 } else { EXIT_ABORTED })
}
