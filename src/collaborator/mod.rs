//! The AI collaborator seam.
//!
//! The store never calls a model. Workflow handlers call a [`Collaborator`],
//! validate what comes back, and only then write to the store. Anything that
//! fails validation is treated like a collaborator failure.
//!
//! ## Contract
//!
//! | Call | Input | Output |
//! |------|-------|--------|
//! | `triage_alert` | one alert | [`AiTriage`] |
//! | `investigate_case` | case + linked alerts | [`Investigation`] |
//! | `draft_response_plan` | case + linked alerts | [`ResponsePlan`] (all actions proposed) |
//! | `generate_report` | case | markdown string |

pub mod report;
pub mod stub;

use std::collections::HashSet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{
    ActionStatus, AiTriage, Alert, Case, Confidence, ConfidenceError, ResponsePlan,
};

pub use report::render_incident_report;
pub use stub::StubCollaborator;

/// Result of a case investigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investigation {
    /// What the analyst should believe is happening.
    pub hypothesis: String,
    /// Confidence in the hypothesis.
    pub confidence: Confidence,
    /// Attack phase.
    pub phase: String,
    /// Hunting queries to confirm or refute the hypothesis.
    pub example_queries: Vec<String>,
}

/// Output that parsed but violates the data model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// An indicator has an empty type or value.
    #[error("Indicator {index} has an empty {field}")]
    EmptyIndicatorField {
        /// Position in the indicator list.
        index: usize,
        /// `type` or `value`.
        field: &'static str,
    },

    /// The hypothesis is blank.
    #[error("Investigation hypothesis is empty")]
    EmptyHypothesis,

    /// Confidence outside 0..=100.
    #[error(transparent)]
    Confidence(#[from] ConfidenceError),

    /// An action has an empty id or label.
    #[error("Action {index} has an empty {field}")]
    EmptyActionField {
        /// Position in the action list.
        index: usize,
        /// `id` or `label`.
        field: &'static str,
    },

    /// Two actions share an id.
    #[error("Duplicate action id: {0}")]
    DuplicateActionId(String),

    /// A drafted action is not in the proposed state.
    #[error("Drafted action {id} has status {status:?}, expected proposed")]
    ActionNotProposed {
        /// Offending action.
        id: String,
        /// Its status.
        status: ActionStatus,
    },
}

/// Errors surfaced by a collaborator call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// Provider unreachable, quota exhausted, timed out, ...
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    /// Payload could not be parsed into the expected shape.
    #[error("Malformed collaborator payload: {0}")]
    MalformedPayload(String),

    /// Payload parsed but failed validation.
    #[error("Invalid collaborator output: {0}")]
    Invalid(#[from] ValidationError),
}

/// External assistant producing triage, investigation, plans and reports.
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Assess a single alert.
    async fn triage_alert(&self, alert: &Alert) -> Result<AiTriage, CollaboratorError>;

    /// Form a hypothesis for a case from its linked alerts.
    async fn investigate_case(
        &self,
        case: &Case,
        alerts: &[Alert],
    ) -> Result<Investigation, CollaboratorError>;

    /// Propose remediation actions for a case.
    async fn draft_response_plan(
        &self,
        case: &Case,
        alerts: &[Alert],
    ) -> Result<ResponsePlan, CollaboratorError>;

    /// Render a human-readable report.
    async fn generate_report(&self, case: &Case) -> Result<String, CollaboratorError>;
}

/// Check a triage result before it is attached to an alert.
pub fn validate_triage(triage: &AiTriage) -> Result<(), ValidationError> {
    for (index, ioc) in triage.iocs.iter().enumerate() {
        if ioc.ioc_type.trim().is_empty() {
            return Err(ValidationError::EmptyIndicatorField { index, field: "type" });
        }
        if ioc.value.trim().is_empty() {
            return Err(ValidationError::EmptyIndicatorField { index, field: "value" });
        }
    }
    Ok(())
}

/// Check an investigation before it is written to a case.
pub fn validate_investigation(investigation: &Investigation) -> Result<(), ValidationError> {
    if investigation.hypothesis.trim().is_empty() {
        return Err(ValidationError::EmptyHypothesis);
    }
    Ok(())
}

/// Check a freshly drafted response plan.
pub fn validate_response_plan(plan: &ResponsePlan) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for (index, action) in plan.actions.iter().enumerate() {
        if action.id.trim().is_empty() {
            return Err(ValidationError::EmptyActionField { index, field: "id" });
        }
        if action.label.trim().is_empty() {
            return Err(ValidationError::EmptyActionField { index, field: "label" });
        }
        if !seen.insert(action.id.as_str()) {
            return Err(ValidationError::DuplicateActionId(action.id.clone()));
        }
        if action.status != ActionStatus::Proposed {
            return Err(ValidationError::ActionNotProposed {
                id: action.id.clone(),
                status: action.status,
            });
        }
    }
    Ok(())
}

fn parse_json<T: serde::de::DeserializeOwned>(payload: &str) -> Result<T, CollaboratorError> {
    serde_json::from_str(payload).map_err(|e| CollaboratorError::MalformedPayload(e.to_string()))
}

/// Parse and validate a raw triage payload.
pub fn parse_triage_json(payload: &str) -> Result<AiTriage, CollaboratorError> {
    let triage: AiTriage = parse_json(payload)?;
    validate_triage(&triage)?;
    Ok(triage)
}

/// Parse and validate a raw investigation payload.
///
/// Out-of-range confidence is reported as [`ValidationError::Confidence`]
/// rather than as a malformed payload.
pub fn parse_investigation_json(payload: &str) -> Result<Investigation, CollaboratorError> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct RawInvestigation {
        hypothesis: String,
        confidence: i64,
        phase: String,
        #[serde(default)]
        example_queries: Vec<String>,
    }

    let raw: RawInvestigation = parse_json(payload)?;
    let investigation = Investigation {
        hypothesis: raw.hypothesis,
        confidence: Confidence::try_from(raw.confidence).map_err(ValidationError::from)?,
        phase: raw.phase,
        example_queries: raw.example_queries,
    };
    validate_investigation(&investigation)?;
    Ok(investigation)
}

/// Parse and validate a raw response-plan payload.
pub fn parse_response_plan_json(payload: &str) -> Result<ResponsePlan, CollaboratorError> {
    let plan: ResponsePlan = parse_json(payload)?;
    validate_response_plan(&plan)?;
    Ok(plan)
}
