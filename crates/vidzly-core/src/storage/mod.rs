mod config;
pub mod database;
pub mod memory;

pub use config::{
    Config, CooldownConfig, CurationConfig, GeneratorConfig, NotificationsConfig, StreakConfig,
};
pub use database::SqliteStore;
pub use memory::MemoryStore;

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ConfigError, StoreError};

/// Record keys, one per logical entity group.
pub mod keys {
    pub const PROGRESS: &str = "progress";
    pub const EARNED_BADGES: &str = "earned_badges";
    pub const STREAK: &str = "streak";
    pub const LAST_ACTIVE: &str = "last_active";
    pub const COOLDOWNS: &str = "cooldowns";
    pub const PLATFORM_ALERTS: &str = "platform_alerts";
    pub const ANNOUNCED_FEATURES: &str = "announced_features";
    pub const PERMISSION_ANNOUNCED: &str = "permission_announced";
    pub const NOTIFICATION_LOG: &str = "notification_log";
    pub const CURATED_FEEDS: &str = "curated_feeds";
    pub const NOTIFICATION_PREFS: &str = "notification_prefs";
    pub const CATALOG: &str = "catalog";
}

/// Synchronous key-value store scoped to one user profile.
///
/// No transactional guarantee across keys: every record is written as a
/// single value so a write is either fully visible or not at all.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

pub type SharedStore = Arc<dyn KvStore>;

/// Read and decode a JSON record.
///
/// # Errors
/// Returns an error if the store read fails or the stored value does not
/// decode as `T`.
pub fn read_record<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Serialization {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Encode and write a JSON record.
///
/// # Errors
/// Returns an error if encoding or the store write fails.
pub fn write_record<T: Serialize>(
    store: &dyn KvStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Serialization {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

/// Load a record, falling back to `T::default()` when it is absent,
/// unreadable or corrupt. Failures are logged, never propagated.
pub fn load_or_default<T: DeserializeOwned + Default>(store: &dyn KvStore, key: &str) -> T {
    match read_record(store, key) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to load record, using defaults");
            T::default()
        }
    }
}

/// Persist a record, logging on failure. Returns whether the write landed.
pub fn persist<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) -> bool {
    match write_record(store, key, value) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to persist record, keeping in-memory state");
            false
        }
    }
}

/// Returns the data directory.
///
/// `VIDZLY_DATA_DIR` overrides everything; otherwise `~/.config/vidzly[-dev]/`
/// based on `VIDZLY_ENV` (set `VIDZLY_ENV=dev` for a development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("VIDZLY_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("VIDZLY_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("vidzly-dev")
            } else {
                base_dir.join("vidzly")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Counter {
        n: u32,
    }

    #[test]
    fn record_roundtrip_through_store() {
        let store = MemoryStore::new();
        write_record(&store, "counter", &Counter { n: 7 }).unwrap();
        let loaded: Option<Counter> = read_record(&store, "counter").unwrap();
        assert_eq!(loaded, Some(Counter { n: 7 }));
    }

    #[test]
    fn corrupt_record_loads_as_default() {
        let store = MemoryStore::new();
        store.set("counter", "{not json").unwrap();
        assert!(read_record::<Counter>(&store, "counter").is_err());
        assert_eq!(load_or_default::<Counter>(&store, "counter"), Counter::default());
    }

    #[test]
    fn persist_reports_failure_without_panicking() {
        let store = MemoryStore::new();
        store.set_failing(true);
        assert!(!persist(&store, "counter", &Counter { n: 1 }));
        store.set_failing(false);
        assert!(persist(&store, "counter", &Counter { n: 1 }));
    }
}
