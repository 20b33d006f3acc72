//! Key-value persistence port and its backends.
//!
//! The engine and the record store only ever see [`KvStore`]. Values are
//! JSON text blobs under a handful of fixed keys.

mod config;
pub mod database;
mod file;
mod memory;

pub use config::{Config, DisplayConfig, StorageBackend, StorageConfig, TimerConfig};
pub use database::SqliteStore;
pub use file::FileStore;
pub use memory::MemoryStore;

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::StorageError;

/// Persisted per-installation identifier.
pub const DEVICE_ID_KEY: &str = "device_id";
/// Serialized [`TimerState`](crate::timer::TimerState), absent when idle.
pub const TIMER_STATE_KEY: &str = "timer_state";
/// Serialized record log.
pub const RECORDS_KEY: &str = "records";

/// Minimal blob storage the core depends on.
pub trait KvStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Shared handle to a store; the engine and record store hold clones.
pub type SharedStore = Arc<dyn KvStore>;

/// Open the backend selected in config, rooted at [`data_dir`].
pub fn open_store(config: &Config) -> Result<SharedStore, Box<dyn std::error::Error>> {
    let dir = data_dir()?;
    let store: SharedStore = match config.storage.backend {
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(&dir.join("pomolog.db"))?),
        StorageBackend::File => Arc::new(FileStore::new(dir.join("kv"))?),
    };
    Ok(store)
}

/// Returns the stored device id, generating and persisting one if absent.
pub fn device_id(store: &dyn KvStore) -> Result<String, StorageError> {
    if let Some(existing) = store.load(DEVICE_ID_KEY)? {
        let existing = existing.trim();
        if !existing.is_empty() {
            return Ok(existing.to_string());
        }
    }
    let id = uuid::Uuid::new_v4().to_string();
    store.save(DEVICE_ID_KEY, &id)?;
    tracing::info!(device_id = %id, "generated new device id");
    Ok(id)
}

/// Returns the data directory.
///
/// `POMOLOG_DATA_DIR` wins when set. Otherwise `~/.config/pomolog[-dev]/`
/// based on POMOLOG_ENV (set POMOLOG_ENV=dev for a development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let dir = match std::env::var_os("POMOLOG_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOLOG_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomolog-dev")
            } else {
                base_dir.join("pomolog")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
