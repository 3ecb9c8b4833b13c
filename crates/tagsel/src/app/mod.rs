//! Match aggregation, selection sessions, and the host-facing find-tag flow.

pub mod aggregate;
pub mod artifacts;
pub mod find;
pub mod history;
pub mod naming;
pub mod preview;
pub mod probe;
pub mod selection;
pub mod store;
