//! Core types for the case kernel.

pub mod alert;
pub mod case;
pub mod audit;
pub mod update;

pub use alert::{AlertId, Alert, AiTriage, Indicator, Severity};
pub use case::{
    CaseId, Case, CaseStatus, CaseIoc, TimelineEntry, TimelineKind,
    Confidence, ConfidenceError, ResponsePlan, Action, ActionStatus,
};
pub use audit::{AuditId, AuditLogEntry, AuditEvent, Actor, AuditKind};
pub use update::{AlertUpdate, CaseUpdate};

/// Error returned when a string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    /// Which enumeration was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
