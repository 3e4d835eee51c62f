//! In-memory [`KeyValueStore`] with fault injection.
//!
//! Used by tests and by callers that want a throwaway session. Reads and
//! writes can be made to fail on demand to exercise the clients' storage
//! failure paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::KeyValueStore;
use crate::error::{Error, Result};

/// A store that lives only as long as the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<BTreeMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent read fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write or delete fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of keys held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(flag: &AtomicBool, op: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::other(format!(
                "simulated {op} failure"
            ))));
        }
        Ok(())
    }

    fn items(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| Error::internal("memory store lock poisoned"))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Self::check(&self.fail_reads, "read")?;
        Ok(self.items()?.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        Self::check(&self.fail_writes, "write")?;
        self.items()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        Self::check(&self.fail_writes, "write")?;
        self.items()?.remove(key);
        Ok(())
    }
}
