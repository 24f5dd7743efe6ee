//! Credit/key store: a reference implementation of the optional
//! key→integer-balance external collaborator. Exists so the HTTP surface's
//! `401`/`402` paths are exercised by something real in tests, without
//! committing the core engine to any notion of credits.
//!
//! Persisted as a JSON map with write-to-temp-then-rename, guarded by a
//! single-process mutex (not safe across processes without an external
//! lock — a multi-process deployment should replace this with a database).

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("insufficient_credit")]
    InsufficientCredit,
    #[error("credit store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("credit store file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A key→integer-balance map. `None` path means in-memory only (no persistence).
pub struct CreditStore {
    path: Option<PathBuf>,
    balances: Mutex<HashMap<String, i64>>,
}

impl CreditStore {
    /// An in-memory-only store: writes never touch disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self { path: None, balances: Mutex::new(HashMap::new()) }
    }

    /// Load balances from `path` if it exists, else start empty. Every
    /// subsequent write persists back to `path` via write-to-temp-then-rename.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let balances = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            HashMap::new()
        };
        Ok(Self { path: Some(path), balances: Mutex::new(balances) })
    }

    /// Current balance for `key`, `0` if never set.
    #[must_use]
    pub fn get(&self, key: &str) -> i64 {
        *self.lock().get(key).unwrap_or(&0)
    }

    /// Set `key`'s balance to exactly `value`.
    pub fn set(&self, key: &str, value: i64) -> Result<(), StoreError> {
        let mut balances = self.lock();
        balances.insert(key.to_string(), value);
        self.persist(&balances)
    }

    /// Add `delta` to `key`'s balance (may be negative), returning the new balance.
    pub fn add(&self, key: &str, delta: i64) -> Result<i64, StoreError> {
        let mut balances = self.lock();
        let entry = balances.entry(key.to_string()).or_insert(0);
        *entry += delta;
        let new_balance = *entry;
        self.persist(&balances)?;
        Ok(new_balance)
    }

    /// Deduct `amount` (≥1) from `key`'s balance. Fails without mutating
    /// anything when the balance is insufficient.
    pub fn charge(&self, key: &str, amount: u64) -> Result<i64, StoreError> {
        let mut balances = self.lock();
        let current = *balances.get(key).unwrap_or(&0);
        let amount = i64::try_from(amount).unwrap_or(i64::MAX);
        if current < amount {
            return Err(StoreError::InsufficientCredit);
        }
        let new_balance = current - amount;
        balances.insert(key.to_string(), new_balance);
        self.persist(&balances)?;
        Ok(new_balance)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, i64>> {
        self.balances.lock().expect("credit store mutex poisoned")
    }

    fn persist(&self, balances: &HashMap<String, i64>) -> Result<(), StoreError> {
        let Some(path) = &self.path else { return Ok(()) };
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(serde_json::to_string(balances)?.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}
