//! Adapters for the filesystem, configuration, search backends, and terminal output.

pub mod config;
pub mod grep;
pub mod highlight;
pub mod logging;
pub mod table;
pub mod workspace;
