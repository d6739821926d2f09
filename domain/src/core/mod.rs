//! Core domain primitives

pub mod error;
pub mod task;

pub use error::DomainError;
pub use task::{Task, TaskId};
