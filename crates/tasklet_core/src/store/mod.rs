//! Write-through state stores.
//!
//! # Responsibility
//! - Own in-memory application state (session, task list).
//! - Rehydrate that state from the durable substrate on open.
//! - Persist the full updated state before every mutator returns.
//!
//! # Invariants
//! - In-memory state is updated before any durable write and stays
//!   authoritative when the write fails.
//! - Storage and decode failures degrade to warnings; they never panic and
//!   never roll back in-memory state.
//! - Ambiguous or corrupt persisted state rehydrates to the less privileged
//!   outcome (logged out, empty list).

use crate::kv::{KvError, SlotError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod session_store;
pub mod task_store;

pub use session_store::{SessionStore, SESSION_CREDENTIAL_KEY, SESSION_IDENTITY_KEY};
pub use task_store::{TaskListStore, TASK_LIST_KEY};

/// Non-fatal persistence problem surfaced alongside a store result.
#[derive(Debug)]
pub enum StoreWarning {
    /// Durable write or remove failed; memory holds the newer state.
    WriteFailed { key: &'static str, source: KvError },
    /// Durable read failed during rehydration; the default state was used.
    ReadFailed { key: &'static str, source: KvError },
    /// Write withheld because the key was never read; storage keeps its
    /// previous contents.
    WriteSkipped { key: &'static str },
    /// Persisted data could not be used as-is.
    CorruptData { key: &'static str, detail: String },
}

impl StoreWarning {
    pub fn key(&self) -> &'static str {
        match self {
            Self::WriteFailed { key, .. }
            | Self::ReadFailed { key, .. }
            | Self::WriteSkipped { key }
            | Self::CorruptData { key, .. } => *key,
        }
    }

    /// Stable short code used in log lines and FFI messages.
    pub fn code(&self) -> &'static str {
        match self {
            Self::WriteFailed { .. } => "write_failed",
            Self::ReadFailed { .. } => "read_failed",
            Self::WriteSkipped { .. } => "write_skipped",
            Self::CorruptData { .. } => "corrupt_data",
        }
    }

    pub(crate) fn from_slot(key: &'static str, err: SlotError, writing: bool) -> Self {
        match err {
            SlotError::Kv(source) if writing => Self::WriteFailed { key, source },
            SlotError::Kv(source) => Self::ReadFailed { key, source },
            SlotError::Encode(source) => Self::CorruptData {
                key,
                detail: source.to_string(),
            },
            SlotError::Decode { source, .. } => Self::CorruptData {
                key,
                detail: source.to_string(),
            },
        }
    }
}

impl Display for StoreWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WriteFailed { key, source } => {
                write!(f, "could not persist `{key}`: {source}")
            }
            Self::ReadFailed { key, source } => write!(f, "could not read `{key}`: {source}"),
            Self::WriteSkipped { key } => {
                write!(f, "did not persist `{key}`: stored value was never loaded")
            }
            Self::CorruptData { key, detail } => {
                write!(f, "ignored corrupt data under `{key}`: {detail}")
            }
        }
    }
}

impl Error for StoreWarning {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::WriteFailed { source, .. } | Self::ReadFailed { source, .. } => Some(source),
            Self::WriteSkipped { .. } | Self::CorruptData { .. } => None,
        }
    }
}

/// Result of a store operation that cannot fail outright.
///
/// `value` is always meaningful. `warnings` lists persistence problems that
/// were absorbed; when empty the durable store reflects the new state.
#[derive(Debug)]
#[must_use = "persistence warnings should be surfaced to the caller"]
pub struct Outcome<T> {
    pub value: T,
    pub warnings: Vec<StoreWarning>,
}

impl<T> Outcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(value: T, warnings: Vec<StoreWarning>) -> Self {
        Self { value, warnings }
    }

    /// Whether the durable store is known to reflect the in-memory state.
    pub fn is_persisted(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Drops warnings and keeps the value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Converts the first warning into an error, for callers that treat
    /// degraded persistence as failure.
    pub fn into_result(self) -> Result<T, StoreWarning> {
        match self.warnings.into_iter().next() {
            Some(warning) => Err(warning),
            None => Ok(self.value),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}
