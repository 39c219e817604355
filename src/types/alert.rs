//! Alert types for the case kernel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ParseEnumError;

/// Identifier of an alert as issued by its detection source (e.g. `AL-1001`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertId(String);

impl AlertId {
    /// Create an alert ID from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AlertId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AlertId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Severity reported by a detection source or assessed by triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Low severity.
    Low,
    /// Medium severity.
    Medium,
    /// High severity.
    High,
    /// Critical severity.
    Critical,
}

impl Severity {
    /// All severities in ascending order.
    pub const ALL: [Severity; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];
}

impl FromStr for Severity {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(ParseEnumError::new("severity", s)),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

/// A typed indicator extracted from an alert (IP, Path, UserAgent, ...).
///
/// Identity is the exact `(type, value)` pair. No normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Indicator {
    /// Free-form indicator type tag.
    #[serde(rename = "type")]
    pub ioc_type: String,
    /// Indicator value.
    pub value: String,
}

impl Indicator {
    /// Create a new indicator.
    pub fn new(ioc_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            ioc_type: ioc_type.into(),
            value: value.into(),
        }
    }
}

/// Structured triage assessment attached to an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiTriage {
    /// Short narrative summary.
    pub summary: String,
    /// Assessed severity.
    pub severity: Severity,
    /// Why this severity was chosen.
    pub rationale: String,
    /// Extracted indicators.
    pub iocs: Vec<Indicator>,
    /// Checks the analyst should run next.
    pub recommended_checks: Vec<String>,
}

/// An observation from a detection source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Unique alert ID. Immutable once created.
    pub id: AlertId,
    /// Detection source (WAF-Edge, EDR, ...).
    pub source_system: String,
    /// When the source observed the event.
    pub timestamp: DateTime<Utc>,
    /// Severity as reported by the source.
    pub raw_severity: Severity,
    /// Alert title.
    pub title: String,
    /// Alert description.
    pub description: String,
    /// Opaque source payload.
    pub raw_event: serde_json::Map<String, serde_json::Value>,
    /// Triage result, once one has been attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_triage: Option<AiTriage>,
}

impl Alert {
    /// Create an untriaged alert with an empty raw event.
    pub fn new(
        id: impl Into<AlertId>,
        source_system: impl Into<String>,
        timestamp: DateTime<Utc>,
        raw_severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_system: source_system.into(),
            timestamp,
            raw_severity,
            title: title.into(),
            description: description.into(),
            raw_event: serde_json::Map::new(),
            ai_triage: None,
        }
    }

    /// Attach a raw event payload.
    pub fn with_raw_event(mut self, raw_event: serde_json::Map<String, serde_json::Value>) -> Self {
        self.raw_event = raw_event;
        self
    }

    /// Attach a triage result.
    pub fn with_triage(mut self, triage: AiTriage) -> Self {
        self.ai_triage = Some(triage);
        self
    }

    /// Indicators from the attached triage, or an empty slice if untriaged.
    pub fn triage_iocs(&self) -> &[Indicator] {
        self.ai_triage
            .as_ref()
            .map(|t| t.iocs.as_slice())
            .unwrap_or(&[])
    }

    /// Whether triage has run for this alert.
    pub fn is_triaged(&self) -> bool {
        self.ai_triage.is_some()
    }
}
