mod config;
pub mod database;

pub use config::{Config, GenerationConfig, NotificationsConfig, ShortcutsConfig, TimerConfig};
pub use database::Database;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::StoreError;

/// Returns `~/.config/celspeak[-dev]/` based on CELSPEAK_ENV.
///
/// Set CELSPEAK_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("CELSPEAK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("celspeak-dev")
    } else {
        base_dir.join("celspeak")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Durable key-value capability behind the two persisted slots.
///
/// Read once at startup, written after every change. Last write wins.
pub trait DurableStore: Send {
    fn load_practice_count(&self) -> Result<Option<u64>, StoreError>;
    fn save_practice_count(&self, count: u64) -> Result<(), StoreError>;
    fn load_custom_text(&self) -> Result<Option<String>, StoreError>;
    fn save_custom_text(&self, text: &str) -> Result<(), StoreError>;
}

pub(crate) const COUNT_KEY: &str = "practice_count";
pub(crate) const CUSTOM_TEXT_KEY: &str = "custom_text";

/// Parse a stored counter. Garbage reads as "absent" rather than failing
/// startup.
pub(crate) fn parse_count(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}

#[derive(Debug, Default)]
struct MemoryState {
    values: HashMap<String, String>,
    fail_writes: bool,
}

/// In-process store. Clones share the same slots, so tests can keep a handle
/// after moving one into the controller.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().values.get(key).cloned()
    }

    pub fn set_raw(&self, key: &str, value: &str) {
        self.lock().values.insert(key.to_string(), value.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(StoreError::QueryFailed("write refused".into()));
        }
        state.values.insert(key.to_string(), value);
        Ok(())
    }
}

impl DurableStore for MemoryStore {
    fn load_practice_count(&self) -> Result<Option<u64>, StoreError> {
        Ok(self.raw(COUNT_KEY).as_deref().and_then(parse_count))
    }

    fn save_practice_count(&self, count: u64) -> Result<(), StoreError> {
        self.write(COUNT_KEY, count.to_string())
    }

    fn load_custom_text(&self) -> Result<Option<String>, StoreError> {
        Ok(self.raw(CUSTOM_TEXT_KEY))
    }

    fn save_custom_text(&self, text: &str) -> Result<(), StoreError> {
        self.write(CUSTOM_TEXT_KEY, text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_shares_slots_between_clones() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.save_practice_count(4).unwrap();
        store.save_custom_text("hello").unwrap();
        assert_eq!(handle.load_practice_count().unwrap(), Some(4));
        assert_eq!(handle.load_custom_text().unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn garbage_count_reads_as_absent() {
        let store = MemoryStore::new();
        store.set_raw(COUNT_KEY, "NaN");
        assert_eq!(store.load_practice_count().unwrap(), None);
        assert_eq!(parse_count(" 12 "), Some(12));
    }

    #[test]
    fn failing_writes_report_errors() {
        let store = MemoryStore::new();
        store.fail_writes(true);
        assert!(store.save_practice_count(1).is_err());
        assert!(store.raw(COUNT_KEY).is_none());
    }
}
