//! Process-wide configuration: a small typed config struct loaded
//! from environment variables under the `REPAIR_` prefix, rather than ad hoc
//! `env::var` calls scattered through handlers. No remote config source, no
//! hot reload.

use std::path::PathBuf;

/// Runtime configuration for `repair-service`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP listener binds to.
    pub bind_addr: String,
    /// Path to the credit/key store's JSON file. `None` disables metering
    /// entirely (no `401`/`402` responses; every request is served).
    pub credit_store_path: Option<PathBuf>,
}

impl Config {
    /// `REPAIR_BIND_ADDR` (default `0.0.0.0:8080`), `REPAIR_CREDIT_STORE_PATH` (unset disables metering).
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("REPAIR_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            credit_store_path: std::env::var("REPAIR_CREDIT_STORE_PATH").ok().map(PathBuf::from),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self { bind_addr: "0.0.0.0:8080".to_string(), credit_store_path: None }
    }
}
