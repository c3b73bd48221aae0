//! Core state management for tasklet.
//! Owns the session and task list state and keeps both mirrored to a
//! durable local key-value store.

pub mod api_config;
pub mod db;
pub mod kv;
pub mod logging;
pub mod model;
pub mod store;

pub use api_config::{request_headers, ApiConfig};
pub use kv::{
    KvError, KvResult, KvStore, MemoryKvStore, PersistentSlot, SlotError, SqliteKvStore,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::session::Session;
pub use model::task::{Task, TaskId};
pub use store::{Outcome, SessionStore, StoreWarning, TaskListStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
