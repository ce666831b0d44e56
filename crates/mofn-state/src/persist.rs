//! # Ledger Files
//!
//! A [`LedgerFile`] is the on-disk JSON image of a [`Ledger`]: the epoch
//! width, the chain tip, the next account number, and every account with
//! its history. Saving writes a sibling temp file and renames it over the
//! target, so readers never observe a half-written ledger.
//!
//! Balances are 128-bit and serialized as JSON integers; `serde_json`
//! reads them back exactly.
//!
//! Writers coordinate through a [`LedgerLock`]: an exclusive advisory lock
//! on a `<file>.lock` sidecar. A process must hold it across
//! load, submit, and save, otherwise a concurrent writer's blocks are
//! overwritten and its account numbers reissued.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mofn_core::{AccountNumber, BlockHeight, EpochSchedule};

use crate::account::EscrowAccount;
use crate::ledger::{Ledger, LedgerSnapshot};
use crate::store::{StoreError, StoreSnapshot};

/// Current ledger file format.
pub const LEDGER_FILE_VERSION: u32 = 1;

/// Errors reading or writing ledger files.
#[derive(Error, Debug)]
pub enum PersistError {
    /// Filesystem failure.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid ledger JSON.
    #[error("malformed ledger file: {0}")]
    Json(#[from] serde_json::Error),

    /// Written by an incompatible format version.
    #[error("unsupported ledger file version {found} (expected {})", LEDGER_FILE_VERSION)]
    UnsupportedVersion { found: u32 },

    /// The accounts are internally inconsistent.
    #[error("inconsistent ledger state: {0}")]
    Store(#[from] StoreError),

    /// Another process holds the ledger's write lock.
    #[error("ledger is locked by another writer: {}", .path.display())]
    Locked { path: PathBuf },
}

/// Exclusive write lock on a ledger file, released on drop.
#[derive(Debug)]
pub struct LedgerLock {
    path: PathBuf,
    file: File,
}

impl LedgerLock {
    /// Take the lock for the ledger at `ledger_path` without blocking.
    ///
    /// Fails with [`PersistError::Locked`] when another handle holds it,
    /// including one opened earlier by this same process.
    pub fn acquire(ledger_path: &Path) -> Result<Self, PersistError> {
        let path = sidecar_path(ledger_path, ".lock");
        let io_err = |source: std::io::Error| PersistError::Io {
            path: path.clone(),
            source,
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(io_err)?;
        match file.try_lock_exclusive() {
            Ok(()) => {}
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                return Err(PersistError::Locked { path });
            }
            Err(source) => return Err(PersistError::Io { path, source }),
        }
        tracing::debug!(path = %path.display(), "ledger lock acquired");
        Ok(Self { path, file })
    }

    /// The sidecar file carrying the lock.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release ledger lock");
        }
    }
}

/// On-disk ledger image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFile {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub blocks_per_epoch: EpochSchedule,
    pub tip: BlockHeight,
    pub next_account: AccountNumber,
    pub accounts: Vec<EscrowAccount>,
}

impl LedgerFile {
    /// Capture the current state of `ledger`.
    pub fn capture(ledger: &Ledger) -> Self {
        let LedgerSnapshot {
            blocks_per_epoch,
            tip,
            store,
        } = ledger.snapshot();
        Self {
            version: LEDGER_FILE_VERSION,
            saved_at: Utc::now(),
            blocks_per_epoch,
            tip,
            next_account: store.next_account,
            accounts: store.accounts,
        }
    }

    /// Rebuild the ledger this file describes.
    pub fn into_ledger(self) -> Result<Ledger, PersistError> {
        if self.version != LEDGER_FILE_VERSION {
            return Err(PersistError::UnsupportedVersion {
                found: self.version,
            });
        }
        let snapshot = LedgerSnapshot {
            blocks_per_epoch: self.blocks_per_epoch,
            tip: self.tip,
            store: StoreSnapshot {
                next_account: self.next_account,
                accounts: self.accounts,
            },
        };
        Ok(Ledger::restore(snapshot)?)
    }

    /// Read and parse a ledger file.
    pub fn read(path: &Path) -> Result<Self, PersistError> {
        let text = std::fs::read_to_string(path).map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write atomically via a temp file in the same directory.
    pub fn write(&self, path: &Path) -> Result<(), PersistError> {
        let io_err = |p: &Path| {
            let p = p.to_path_buf();
            move |source: std::io::Error| PersistError::Io { path: p, source }
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err(dir))?;
        }
        let tmp = sidecar_path(path, ".tmp");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&tmp, json).map_err(io_err(&tmp))?;
        std::fs::rename(&tmp, path).map_err(io_err(path))?;
        Ok(())
    }
}

fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ledger.json".into());
    name.push(suffix);
    path.with_file_name(name)
}

/// Save `ledger` to `path`.
pub fn save(ledger: &Ledger, path: &Path) -> Result<(), PersistError> {
    LedgerFile::capture(ledger).write(path)?;
    tracing::debug!(path = %path.display(), tip = %ledger.tip(), "ledger saved");
    Ok(())
}

/// Load the ledger stored at `path`.
pub fn load(path: &Path) -> Result<Ledger, PersistError> {
    let ledger = LedgerFile::read(path)?.into_ledger()?;
    tracing::debug!(path = %path.display(), tip = %ledger.tip(), "ledger loaded");
    Ok(ledger)
}

/// Load the ledger at `path`, or deploy a fresh one if the file does not
/// exist yet.
pub fn load_or_deploy(path: &Path, schedule: EpochSchedule) -> Result<Ledger, PersistError> {
    if path.exists() {
        load(path)
    } else {
        tracing::info!(path = %path.display(), "no ledger file found, deploying a new ledger");
        Ok(Ledger::deploy(schedule))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mofn_core::Principal;

    const OWNER: &str = "ST37X0038BZV6YV0MQCJ0G6QMZZ75QS64KA69V9D";
    const ALICE: &str = "SZ2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKQ9H6DPR";
    const RECEIVER: &str = "SP138CBPVKYBQQ480EZXJQK89HCHY32XBQ0T4BCCD";

    fn populated() -> Ledger {
        let ledger = Ledger::deploy(EpochSchedule::new(5).unwrap());
        let owner = Principal::new(OWNER).unwrap();
        ledger.submit("create", &["u1", "u1"], &owner).unwrap();
        ledger.submit("add-participant", &["u1", ALICE], &owner).unwrap();
        ledger.submit("set-receiver", &["u1", RECEIVER], &owner).unwrap();
        ledger
            .submit("deposit", &["u1", "u340282366920938463463374607431768211455"], &owner)
            .unwrap();
        ledger
    }

    #[test]
    fn save_then_load_restores_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.json");
        let ledger = populated();
        save(&ledger, &path).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.snapshot(), ledger.snapshot());
        assert_eq!(loaded.schedule().blocks_per_epoch(), 5);
        assert_eq!(
            loaded.query("get-balance", &["u1"]).unwrap().to_string(),
            "(ok u340282366920938463463374607431768211455)"
        );
        assert!(!sidecar_path(&path, ".tmp").exists());
    }

    #[test]
    fn missing_file_deploys_fresh_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let ledger =
            load_or_deploy(&dir.path().join("absent.json"), EpochSchedule::default()).unwrap();
        assert_eq!(ledger.tip(), BlockHeight(1));
        assert_eq!(ledger.store().open_account_count(), 0);
    }

    #[test]
    fn rejects_unknown_version() {
        let mut file = LedgerFile::capture(&populated());
        file.version = 99;
        assert!(matches!(
            file.into_ledger(),
            Err(PersistError::UnsupportedVersion { found: 99 })
        ));
    }

    #[test]
    fn rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load(&path), Err(PersistError::Json(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(&dir.path().join("nope.json")),
            Err(PersistError::Io { .. })
        ));
    }

    #[test]
    fn lock_is_exclusive_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.json");

        let held = LedgerLock::acquire(&path).unwrap();
        assert_eq!(held.path(), dir.path().join("nested").join("ledger.json.lock"));
        assert!(matches!(
            LedgerLock::acquire(&path),
            Err(PersistError::Locked { .. })
        ));
        assert!(!path.exists());

        drop(held);
        assert!(LedgerLock::acquire(&path).is_ok());
    }

    #[test]
    fn file_layout_is_flat() {
        let file = LedgerFile::capture(&populated());
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&file).unwrap()).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["blocks_per_epoch"], 5);
        assert_eq!(json["tip"], 5);
        assert_eq!(json["next_account"], 2);
        assert_eq!(json["accounts"][0]["owner"], OWNER);
    }
}
