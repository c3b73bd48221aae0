//! In-process key-value store.
//!
//! Backs ephemeral sessions and tests. Availability and a byte quota can be
//! configured to reproduce the failure modes of real local storage.

use super::{KvError, KvResult, KvStore};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// Single-threaded in-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RefCell<BTreeMap<String, String>>,
    unavailable: Cell<bool>,
    quota_bytes: Option<usize>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects writes once keys plus values would
    /// exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Toggles availability. While unavailable every operation fails with
    /// [`KvError::Unavailable`] and stored entries are untouched.
    pub fn set_available(&self, available: bool) {
        self.unavailable.set(!available);
    }

    /// Current stored footprint in bytes (keys plus values).
    pub fn used_bytes(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn ensure_available(&self) -> KvResult<()> {
        if self.unavailable.get() {
            return Err(KvError::Unavailable);
        }
        Ok(())
    }
}

impl KvStore for MemoryKvStore {
    fn read(&self, key: &str) -> KvResult<Option<String>> {
        self.ensure_available()?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> KvResult<()> {
        self.ensure_available()?;

        if let Some(limit) = self.quota_bytes {
            let replaced = self
                .entries
                .borrow()
                .get(key)
                .map_or(0, |old| key.len() + old.len());
            let required = self.used_bytes() - replaced + key.len() + value.len();
            if required > limit {
                return Err(KvError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    limit,
                });
            }
        }

        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> KvResult<()> {
        self.ensure_available()?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryKvStore;
    use crate::kv::{KvError, KvStore};

    #[test]
    fn unavailable_store_rejects_every_operation_and_keeps_entries() {
        let kv = MemoryKvStore::new();
        kv.write("auth_token", "abc").unwrap();

        kv.set_available(false);
        assert!(matches!(kv.read("auth_token"), Err(KvError::Unavailable)));
        assert!(matches!(kv.write("auth_token", "x"), Err(KvError::Unavailable)));
        assert!(matches!(kv.remove("auth_token"), Err(KvError::Unavailable)));

        kv.set_available(true);
        assert_eq!(kv.read("auth_token").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn quota_counts_replaced_value_only_once() {
        // "todos" (5) + "12345" (5) = 10 bytes.
        let kv = MemoryKvStore::with_quota(10);
        kv.write("todos", "12345").unwrap();
        kv.write("todos", "54321").unwrap();

        let err = kv.write("todos", "123456").unwrap_err();
        assert!(matches!(
            err,
            KvError::QuotaExceeded {
                required: 11,
                limit: 10,
                ..
            }
        ));
        assert_eq!(kv.read("todos").unwrap().as_deref(), Some("54321"));
        assert_eq!(kv.used_bytes(), 10);
    }
}
