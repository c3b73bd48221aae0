//! Durable key-value substrate shared by every store.
//!
//! # Responsibility
//! - Define the string-keyed, string-valued storage contract.
//! - Provide a SQLite-backed durable implementation and an in-memory one.
//! - Bind typed values to single keys through [`PersistentSlot`].
//!
//! # Invariants
//! - The substrate is passive: it never initiates change.
//! - Operations on distinct keys are independent; there are no multi-key
//!   transactions at this layer.
//! - Removing a missing key succeeds.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod slot;
mod sqlite;

pub use memory::MemoryKvStore;
pub use slot::{PersistentSlot, SlotError, SlotResult};
pub use sqlite::SqliteKvStore;

pub type KvResult<T> = Result<T, KvError>;

/// Substrate-level storage failure.
#[derive(Debug)]
pub enum KvError {
    /// Backing database rejected the operation.
    Db(DbError),
    /// Storage is disabled or blocked by the environment.
    Unavailable,
    /// Write would grow the store past its byte quota.
    QuotaExceeded {
        key: String,
        required: usize,
        limit: usize,
    },
}

impl Display for KvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable => write!(f, "storage is unavailable"),
            Self::QuotaExceeded {
                key,
                required,
                limit,
            } => write!(
                f,
                "storage quota exceeded writing `{key}`: {required} bytes needed, limit {limit}"
            ),
        }
    }
}

impl Error for KvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable | Self::QuotaExceeded { .. } => None,
        }
    }
}

impl From<DbError> for KvError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for KvError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Synchronous string key-value storage contract.
pub trait KvStore {
    fn read(&self, key: &str) -> KvResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> KvResult<()>;
    fn remove(&self, key: &str) -> KvResult<()>;
}

impl<S: KvStore + ?Sized> KvStore for &S {
    fn read(&self, key: &str) -> KvResult<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> KvResult<()> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> KvResult<()> {
        (**self).remove(key)
    }
}
