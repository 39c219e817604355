//! Case types: investigations grouping one or more alerts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::alert::AlertId;
use super::ParseEnumError;

/// Unique identifier for a case (e.g. `CASE-1001`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    /// Create a case ID from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CaseId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Case status.
///
/// Open → Investigating → Contained → Closed by convention. No transition
/// table is enforced; any status may be set by `update_case`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CaseStatus {
    /// Newly created.
    #[default]
    Open,
    /// Under active investigation.
    Investigating,
    /// Threat contained, remediation pending.
    Contained,
    /// Done.
    Closed,
}

impl CaseStatus {
    /// Whether the case still accepts work (anything but `Closed`).
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

impl FromStr for CaseStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "investigating" => Ok(Self::Investigating),
            "contained" => Ok(Self::Contained),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseEnumError::new("case status", s)),
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Investigating => write!(f, "Investigating"),
            Self::Contained => write!(f, "Contained"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Origin of a timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineKind {
    /// An alert fired or was linked.
    Alert,
    /// Analyst or system note.
    Note,
    /// Model-generated finding.
    Ai,
}

impl FromStr for TimelineKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alert" => Ok(Self::Alert),
            "note" => Ok(Self::Note),
            "ai" => Ok(Self::Ai),
            _ => Err(ParseEnumError::new("timeline kind", s)),
        }
    }
}

/// One entry in a case timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// When the described event happened.
    pub timestamp: DateTime<Utc>,
    /// Human-readable description.
    pub description: String,
    /// Entry origin.
    pub kind: TimelineKind,
}

impl TimelineEntry {
    /// Create a timeline entry.
    pub fn new(timestamp: DateTime<Utc>, description: impl Into<String>, kind: TimelineKind) -> Self {
        Self {
            timestamp,
            description: description.into(),
            kind,
        }
    }
}

/// An aggregated indicator on a case with its sighting count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseIoc {
    /// Free-form indicator type tag.
    #[serde(rename = "type")]
    pub ioc_type: String,
    /// Indicator value.
    pub value: String,
    /// Number of contributing alerts.
    pub count: u32,
}

/// Error for confidence values outside 0..=100.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Confidence must be within 0..=100, got {0}")]
pub struct ConfidenceError(pub i64);

/// Investigation confidence percentage, guaranteed to lie within 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Confidence(u8);

impl Confidence {
    /// Create a confidence value.
    pub fn new(value: u8) -> Result<Self, ConfidenceError> {
        if value > 100 {
            return Err(ConfidenceError(value as i64));
        }
        Ok(Self(value))
    }

    /// Create a confidence value, clamping anything above 100.
    pub const fn clamped(value: u8) -> Self {
        if value > 100 {
            Self(100)
        } else {
            Self(value)
        }
    }

    /// Get the percentage.
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Confidence {
    type Error = ConfidenceError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| ConfidenceError(value))
            .and_then(Self::new)
    }
}

impl From<Confidence> for u8 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a response action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    /// Drafted, not yet acted on.
    Proposed,
    /// Approved by an analyst.
    Approved,
    /// Carried out.
    Executed,
    /// Attempted and failed.
    Failed,
}

impl ActionStatus {
    /// Whether an action in this status may be executed.
    pub fn is_executable(&self) -> bool {
        matches!(self, Self::Proposed | Self::Approved)
    }
}

impl FromStr for ActionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "proposed" => Ok(Self::Proposed),
            "approved" => Ok(Self::Approved),
            "executed" => Ok(Self::Executed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseEnumError::new("action status", s)),
        }
    }
}

/// A remediation step in a response plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Action ID, unique within its plan.
    pub id: String,
    /// Free-form action tag (block_ip, reset_creds, ...).
    #[serde(rename = "type")]
    pub action_type: String,
    /// Human-readable label.
    pub label: String,
    /// Current status.
    pub status: ActionStatus,
    /// Expected side effects of running the action.
    pub impact_note: String,
}

impl Action {
    /// Create a proposed action.
    pub fn proposed(
        id: impl Into<String>,
        action_type: impl Into<String>,
        label: impl Into<String>,
        impact_note: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            action_type: action_type.into(),
            label: label.into(),
            status: ActionStatus::Proposed,
            impact_note: impact_note.into(),
        }
    }
}

/// Proposed remediation actions plus rollback steps.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePlan {
    /// Ordered actions.
    pub actions: Vec<Action>,
    /// Ordered rollback steps.
    pub rollback_steps: Vec<String>,
}

impl ResponsePlan {
    /// Find an action by ID.
    pub fn action(&self, id: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.id == id)
    }

    /// Actions that have been executed, in plan order.
    pub fn executed_actions(&self) -> impl Iterator<Item = &Action> {
        self.actions
            .iter()
            .filter(|a| a.status == ActionStatus::Executed)
    }
}

/// An investigation grouping one or more alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    /// Unique case ID.
    pub id: CaseId,
    /// Current status.
    pub status: CaseStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
    /// Case summary.
    pub summary: String,
    /// Linked alerts in link order, without duplicates.
    pub linked_alert_ids: Vec<AlertId>,
    /// Ordered timeline.
    pub timeline: Vec<TimelineEntry>,
    /// Aggregated indicators, unique by (type, value).
    pub iocs: Vec<CaseIoc>,
    /// Investigation hypothesis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypothesis: Option<String>,
    /// Confidence in the hypothesis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    /// Attack phase (e.g. a MITRE ATT&CK tactic).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Hunting queries suggested by the investigation.
    #[serde(default)]
    pub example_queries: Vec<String>,
    /// Current response plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_plan: Option<ResponsePlan>,
}

impl Case {
    /// Whether the given alert is linked to this case.
    pub fn is_linked(&self, alert_id: &AlertId) -> bool {
        self.linked_alert_ids.contains(alert_id)
    }

    /// Look up the aggregated indicator for a `(type, value)` pair.
    pub fn ioc(&self, ioc_type: &str, value: &str) -> Option<&CaseIoc> {
        self.iocs
            .iter()
            .find(|i| i.ioc_type == ioc_type && i.value == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_bounds() {
        assert_eq!(Confidence::new(0).unwrap().value(), 0);
        assert_eq!(Confidence::new(100).unwrap().value(), 100);
        assert_eq!(Confidence::new(101), Err(ConfidenceError(101)));
        assert_eq!(Confidence::try_from(-5i64), Err(ConfidenceError(-5)));
        assert_eq!(Confidence::try_from(300i64), Err(ConfidenceError(300)));
        assert_eq!(Confidence::clamped(250).value(), 100);
    }

    #[test]
    fn test_confidence_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Confidence>("95").is_ok());
        assert!(serde_json::from_str::<Confidence>("-1").is_err());
        assert!(serde_json::from_str::<Confidence>("250").is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("investigating".parse::<CaseStatus>().unwrap(), CaseStatus::Investigating);
        assert!("resolved".parse::<CaseStatus>().is_err());
        assert!("proposed".parse::<ActionStatus>().unwrap().is_executable());
        assert!(!ActionStatus::Executed.is_executable());
    }

    #[test]
    fn test_action_wire_shape() {
        let action = Action::proposed("act_1", "block_ip", "Block IP", "Low risk");
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "block_ip");
        assert_eq!(json["status"], "proposed");
        assert_eq!(json["impactNote"], "Low risk");
    }
}
