//! # Query and Show Subcommands
//!
//! Read-only: neither command mines a block or writes the ledger file.

use anyhow::{Context, Result};
use clap::Args;

use mofn_core::clarity::parse_uint;
use mofn_core::AccountNumber;
use mofn_state::EscrowAccount;

use crate::LedgerLocation;

/// Arguments for `mofn query`.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Read-only function (`get-m`, `get-participants`, `get-balance`, ...).
    pub method: String,

    /// Clarity literal arguments.
    pub args: Vec<String>,
}

/// Arguments for `mofn show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Account number (`3` or `u3`).
    pub account: String,

    /// Print the account as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Evaluate a read-only function and print the Clarity response.
pub fn run_query(args: &QueryArgs, location: &LedgerLocation) -> Result<u8> {
    let ledger = location.open()?;
    let value = ledger
        .query(&args.method, args.args.as_slice())
        .with_context(|| format!("rejected query {}", args.method))?;
    println!("{value}");
    Ok(0)
}

/// Print one account.
pub fn run_show(args: &ShowArgs, location: &LedgerLocation) -> Result<u8> {
    let number = parse_uint(&args.account)
        .ok()
        .and_then(|n| u64::try_from(n).ok())
        .map(AccountNumber)
        .with_context(|| format!("invalid account number: {}", args.account))?;

    let ledger = location.open()?;
    let account = ledger
        .store()
        .get(number)
        .with_context(|| format!("account not found: {number}"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&account)?);
    } else {
        print_account(&account, ledger.schedule().blocks_per_epoch());
    }
    Ok(0)
}

fn print_account(account: &EscrowAccount, blocks_per_epoch: u64) {
    println!("Account: {}", account.number);
    println!("  Phase: {}", account.phase());
    println!("  Owner: {}", account.owner);
    println!("  Threshold: {}-of-{}", account.m, account.n);
    println!("  Participants ({}):", account.participants.len());
    for p in &account.participants {
        println!("    {p}");
    }
    match (&account.receiver, account.receiver_set_at, account.receiver_epoch) {
        (Some(r), Some(at), Some(epoch)) => println!(
            "  Receiver: {r} (set at block {at}, epoch {} of {blocks_per_epoch} blocks)",
            epoch.0
        ),
        (Some(r), _, _) => println!("  Receiver: {r}"),
        _ => println!("  Receiver: none"),
    }
    println!("  Signatures ({}/{}):", account.signatures.len(), account.m);
    for s in &account.signatures {
        println!("    {s}");
    }
    println!("  Balance: {}", account.balance);
    println!("  History: {}", account.history_len());
    let first = account.history_pruned;
    if first > 0 {
        println!("    ({first} older events not retained)");
    }
    for (i, e) in account.history.iter().enumerate() {
        println!(
            "    [{}] block {} by {}: {:?}",
            first + i as u64,
            e.height,
            e.sender,
            e.action
        );
    }
}
