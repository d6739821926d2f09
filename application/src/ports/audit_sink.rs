//! Port for structured audit logging.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures the decision
//! trail of each task (routing, panel outcomes, reviewer verdicts,
//! breaker transitions) in a machine-readable format (JSONL).

use chrono::{DateTime, Utc};
use serde_json::Value;

/// A structured audit event.
pub struct AuditEvent {
    /// Event type identifier (e.g., "task_routed", "override_applied").
    pub event_type: &'static str,
    pub at: DateTime<Utc>,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl AuditEvent {
    /// Create an audit event stamped with the current UTC time.
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            at: Utc::now(),
            payload,
        }
    }
}

/// Implementations write each event as a single record (e.g., one JSONL
/// line). `record` is intentionally synchronous and non-fallible so that
/// audit failures never disrupt task handling.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// No-op sink for tests and when auditing is disabled.
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) {}
}
