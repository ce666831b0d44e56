//! # Application State
//!
//! Shared state handed to every handler: the ledger, the server
//! configuration, and the locks that order ledger file writes.
//!
//! A state bootstrapped from a ledger file holds that file's write lock
//! for as long as any clone of it is alive, so the CLI cannot commit
//! blocks the server would later overwrite.
//!
//! The ledger itself serialises transaction submission. Saving happens
//! after submission under a separate lock and always captures the ledger
//! as it is at save time, so the last write to finish holds the newest
//! state even when two requests race.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use mofn_core::EpochSchedule;
use mofn_state::{persist, Ledger, LedgerLock, PersistError};

/// Invalid environment configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable holds an unusable value.
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Server configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
    /// Epoch width for a freshly deployed ledger.
    pub schedule: EpochSchedule,
    /// Ledger file to load at startup and save after every transaction.
    /// If `None`, the ledger lives in memory only.
    pub ledger_file: Option<PathBuf>,
}

impl AppConfig {
    /// Read `PORT`, `AUTH_TOKEN`, `MOFN_BLOCKS_PER_EPOCH`, and
    /// `MOFN_LEDGER_FILE` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidVar {
                name: "PORT",
                value: v.clone(),
                reason: "expected a port number",
            })?,
            None => defaults.port,
        };

        let schedule = match lookup("MOFN_BLOCKS_PER_EPOCH") {
            Some(v) => v
                .parse::<u64>()
                .ok()
                .and_then(|n| EpochSchedule::new(n).ok())
                .ok_or_else(|| ConfigError::InvalidVar {
                    name: "MOFN_BLOCKS_PER_EPOCH",
                    value: v.clone(),
                    reason: "expected a positive integer",
                })?,
            None => defaults.schedule,
        };

        Ok(Self {
            port,
            auth_token: lookup("AUTH_TOKEN").filter(|t| !t.is_empty()),
            schedule,
            ledger_file: lookup("MOFN_LEDGER_FILE")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        })
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("schedule", &self.schedule)
            .field("ledger_file", &self.ledger_file)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            schedule: EpochSchedule::default(),
            ledger_file: None,
        }
    }
}

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub config: AppConfig,
    save_lock: Arc<Mutex<()>>,
    file_lock: Option<Arc<LedgerLock>>,
}

impl AppState {
    /// In-memory ledger with default configuration.
    pub fn new() -> Self {
        let config = AppConfig::default();
        let ledger = Ledger::deploy(config.schedule);
        Self::with_config(config, ledger)
    }

    /// Serve `ledger` under `config`.
    pub fn with_config(config: AppConfig, ledger: Ledger) -> Self {
        Self {
            ledger: Arc::new(ledger),
            config,
            save_lock: Arc::new(Mutex::new(())),
            file_lock: None,
        }
    }

    /// Lock and load the configured ledger file, or deploy a fresh ledger.
    ///
    /// Fails with [`PersistError::Locked`] while another writer holds the
    /// file. The lock is released when the last clone is dropped.
    pub fn bootstrap(config: AppConfig) -> Result<Self, PersistError> {
        let Some(path) = config.ledger_file.clone() else {
            let ledger = Ledger::deploy(config.schedule);
            return Ok(Self::with_config(config, ledger));
        };
        let lock = LedgerLock::acquire(&path)?;
        let ledger = persist::load_or_deploy(&path, config.schedule)?;
        let mut state = Self::with_config(config, ledger);
        state.file_lock = Some(Arc::new(lock));
        Ok(state)
    }

    /// Write the ledger file. Returns `false` when none is configured.
    ///
    /// Blocking; async callers go through `spawn_blocking`.
    pub fn save(&self) -> Result<bool, PersistError> {
        let Some(path) = &self.config.ledger_file else {
            return Ok(false);
        };
        let _guard = self.save_lock.lock();
        persist::save(&self.ledger, path)?;
        Ok(true)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.auth_token.is_none());
        assert_eq!(config.schedule.blocks_per_epoch(), 10);
        assert!(config.ledger_file.is_none());
    }

    #[test]
    fn reads_all_variables() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("AUTH_TOKEN", "tok"),
            ("MOFN_BLOCKS_PER_EPOCH", "25"),
            ("MOFN_LEDGER_FILE", "/tmp/ledger.json"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.auth_token.as_deref(), Some("tok"));
        assert_eq!(config.schedule.blocks_per_epoch(), 25);
        assert_eq!(config.ledger_file, Some(PathBuf::from("/tmp/ledger.json")));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(AppConfig::from_lookup(lookup(&[("PORT", "http")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("MOFN_BLOCKS_PER_EPOCH", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("MOFN_BLOCKS_PER_EPOCH", "-3")])).is_err());
    }

    #[test]
    fn empty_token_disables_auth() {
        let config = AppConfig::from_lookup(lookup(&[("AUTH_TOKEN", "")])).unwrap();
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn debug_redacts_token() {
        let config = AppConfig {
            auth_token: Some("hunter2".into()),
            ..AppConfig::default()
        };
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn save_without_file_is_noop() {
        assert!(!AppState::new().save().unwrap());
    }

    #[test]
    fn bootstrap_round_trips_ledger_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            ledger_file: Some(dir.path().join("ledger.json")),
            ..AppConfig::default()
        };
        let state = AppState::bootstrap(config.clone()).unwrap();
        let owner = mofn_core::Principal::new("ST37X0038BZV6YV0MQCJ0G6QMZZ75QS64KA69V9D").unwrap();
        state.ledger.submit("create", &["u2", "u3"], &owner).unwrap();
        assert!(state.save().unwrap());
        let tip = state.ledger.tip();
        drop(state);

        let reloaded = AppState::bootstrap(config).unwrap();
        assert_eq!(reloaded.ledger.tip(), tip);
        assert_eq!(reloaded.ledger.store().open_account_count(), 1);
    }

    #[test]
    fn bootstrap_holds_file_lock_for_every_clone() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            ledger_file: Some(dir.path().join("ledger.json")),
            ..AppConfig::default()
        };
        let state = AppState::bootstrap(config.clone()).unwrap();
        let clone = state.clone();
        drop(state);
        assert!(matches!(
            AppState::bootstrap(config.clone()),
            Err(PersistError::Locked { .. })
        ));

        drop(clone);
        assert!(AppState::bootstrap(config).is_ok());
    }
}
