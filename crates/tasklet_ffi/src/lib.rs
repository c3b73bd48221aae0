//! Flutter-facing bindings for tasklet core.

pub mod api;
