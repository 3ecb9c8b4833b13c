//! Terminal front end for selection sessions.

pub mod app;
pub mod components;
