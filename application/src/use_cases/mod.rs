//! Use cases orchestrating the review pipeline

pub mod consult_panel;
pub mod guarded_review;
pub mod handle_task;
