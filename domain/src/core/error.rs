//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Task text cannot be empty")]
    EmptyTask,

    #[error("Unknown agent role: {0}")]
    UnknownRole(String),

    #[error("Unknown circuit mode: {0}")]
    UnknownCircuitMode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            DomainError::UnknownRole("wizard".into()).to_string(),
            "Unknown agent role: wizard"
        );
        assert_eq!(
            DomainError::EmptyTask.to_string(),
            "Task text cannot be empty"
        );
    }
}
