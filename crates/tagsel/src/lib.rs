pub mod app;
pub mod domain;
pub mod infra;
pub mod ui;

pub use app::find::{FindOutcome, Navigator, TagFinder};
pub use domain::errors::TagError;

/// Install stderr logging at the level implied by `verbosity`.
pub fn init(verbosity: u8) {
    infra::logging::init(verbosity);
}
