//! Task entity

use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static TASK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique task identifier, e.g. `task_20260827_0042` (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Generate the next task id from the current date and a process-wide
    /// counter.
    pub fn generate() -> Self {
        let n = TASK_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
        Self(format!("task_{}_{:04}", Utc::now().format("%Y%m%d"), n))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A task submitted for panel review. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub submitted_at: DateTime<Utc>,
}

impl Task {
    /// Create a task from raw text.
    ///
    /// Fails with [`DomainError::EmptyTask`] if the text is empty or
    /// whitespace only.
    pub fn new(text: impl Into<String>) -> Result<Self, DomainError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(DomainError::EmptyTask);
        }
        Ok(Self {
            id: TaskId::generate(),
            text,
            submitted_at: Utc::now(),
        })
    }

    /// Short summary of the task text for logs and audit records.
    pub fn summary(&self) -> &str {
        let end = self
            .text
            .char_indices()
            .nth(100)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len());
        &self.text[..end]
    }
}
