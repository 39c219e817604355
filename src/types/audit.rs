//! Audit trail types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::alert::AlertId;
use super::case::CaseId;
use super::ParseEnumError;

/// Unique identifier for an audit entry (e.g. `LOG-1718000000000-7`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditId(String);

impl AuditId {
    /// Create an audit ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuditId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who performed an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Actor {
    /// Model-driven operation.
    #[serde(rename = "AI")]
    Ai,
    /// Analyst-driven operation.
    Human,
    /// Store initialization and housekeeping.
    System,
}

impl FromStr for Actor {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ai" => Ok(Self::Ai),
            "human" => Ok(Self::Human),
            "system" => Ok(Self::System),
            _ => Err(ParseEnumError::new("actor", s)),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ai => write!(f, "AI"),
            Self::Human => write!(f, "Human"),
            Self::System => write!(f, "System"),
        }
    }
}

/// Category of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditKind {
    /// Alert triage.
    Triage,
    /// Case creation, linking, hypothesis generation.
    Investigation,
    /// Response plan drafting and approval.
    ActionApproval,
    /// Response action execution.
    ActionExecution,
    /// Report generation and system notices.
    #[serde(rename = "REPORT_GEN")]
    ReportGeneration,
}

impl FromStr for AuditKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "triage" => Ok(Self::Triage),
            "investigation" => Ok(Self::Investigation),
            "action_approval" | "actionapproval" => Ok(Self::ActionApproval),
            "action_execution" | "actionexecution" => Ok(Self::ActionExecution),
            "report_gen" | "report_generation" | "reportgeneration" => Ok(Self::ReportGeneration),
            _ => Err(ParseEnumError::new("audit kind", s)),
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Triage => write!(f, "TRIAGE"),
            Self::Investigation => write!(f, "INVESTIGATION"),
            Self::ActionApproval => write!(f, "ACTION_APPROVAL"),
            Self::ActionExecution => write!(f, "ACTION_EXECUTION"),
            Self::ReportGeneration => write!(f, "REPORT_GEN"),
        }
    }
}

/// A recorded audit entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    /// Unique entry ID.
    pub id: AuditId,
    /// When the entry was appended.
    pub timestamp: DateTime<Utc>,
    /// Who acted.
    pub actor: Actor,
    /// What kind of action.
    pub kind: AuditKind,
    /// Case the action concerns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_id: Option<CaseId>,
    /// Alert the action concerns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<AlertId>,
    /// Free text.
    pub details: String,
}

/// An audit event before the store assigns its ID and timestamp.
///
/// ```rust,ignore
/// let event = AuditEvent::new(Actor::Human, AuditKind::ActionExecution, "Executed action act_1")
///     .for_case(case_id);
/// store.add_audit_log(event);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Who acted.
    pub actor: Actor,
    /// What kind of action.
    pub kind: AuditKind,
    /// Free text.
    pub details: String,
    /// Case the action concerns.
    pub case_id: Option<CaseId>,
    /// Alert the action concerns.
    pub alert_id: Option<AlertId>,
}

impl AuditEvent {
    /// Create an event with no case or alert scope.
    pub fn new(actor: Actor, kind: AuditKind, details: impl Into<String>) -> Self {
        Self {
            actor,
            kind,
            details: details.into(),
            case_id: None,
            alert_id: None,
        }
    }

    /// Scope the event to a case.
    pub fn for_case(mut self, case_id: CaseId) -> Self {
        self.case_id = Some(case_id);
        self
    }

    /// Scope the event to an alert.
    pub fn for_alert(mut self, alert_id: AlertId) -> Self {
        self.alert_id = Some(alert_id);
        self
    }
}
