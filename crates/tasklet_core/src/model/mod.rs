//! Domain records held by the stores.
//!
//! Stores own these values exclusively; the durable substrate only ever
//! sees their serialized form.

pub mod session;
pub mod task;
