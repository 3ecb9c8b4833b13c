//! Domain types shared by the aggregation engine and its hosts.

pub mod errors;
pub mod model;
