//! # API Route Modules
//!
//! - `transactions`: submit state-changing contract calls; each mines a block.
//! - `queries`: evaluate read-only contract calls.
//! - `accounts`: inspect escrow accounts as structured JSON.
//! - `chain`: tip height, epoch, and account count.

pub mod accounts;
pub mod chain;
pub mod queries;
pub mod transactions;
