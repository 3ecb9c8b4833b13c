//! Widgets drawn by the selection screen.

pub mod number_prompt;
pub mod preview;
pub mod tag_list;
