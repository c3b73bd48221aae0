//! Typed persistent slot: one key holding one JSON-encoded value.

use super::{KvError, KvStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub type SlotResult<T> = Result<T, SlotError>;

/// Failure loading or saving a typed slot.
#[derive(Debug)]
pub enum SlotError {
    /// The substrate itself failed.
    Kv(KvError),
    /// Value could not be serialized.
    Encode(serde_json::Error),
    /// Persisted text is not a valid encoding of the slot type.
    Decode {
        key: &'static str,
        source: serde_json::Error,
    },
}

impl Display for SlotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kv(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode value: {err}"),
            Self::Decode { key, source } => {
                write!(f, "malformed persisted value under `{key}`: {source}")
            }
        }
    }
}

impl Error for SlotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Kv(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Decode { source, .. } => Some(source),
        }
    }
}

impl From<KvError> for SlotError {
    fn from(value: KvError) -> Self {
        Self::Kv(value)
    }
}

/// Binds a fixed key of a [`KvStore`] to a serializable value type.
///
/// # Invariants
/// - `save` always rewrites the whole value; there is no delta encoding.
/// - `load` distinguishes "absent" (`Ok(None)`) from "present but malformed"
///   (`Err(SlotError::Decode)`).
pub struct PersistentSlot<S, T> {
    kv: S,
    key: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<S: KvStore, T: Serialize + DeserializeOwned> PersistentSlot<S, T> {
    pub fn new(kv: S, key: &'static str) -> Self {
        Self {
            kv,
            key,
            _value: PhantomData,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn load(&self) -> SlotResult<Option<T>> {
        let Some(raw) = self.kv.read(self.key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| SlotError::Decode {
                key: self.key,
                source,
            })
    }

    pub fn save(&self, value: &T) -> SlotResult<()> {
        let encoded = serde_json::to_string(value).map_err(SlotError::Encode)?;
        self.kv.write(self.key, &encoded)?;
        Ok(())
    }

    pub fn clear(&self) -> SlotResult<()> {
        self.kv.remove(self.key)?;
        Ok(())
    }
}
