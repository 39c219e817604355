//! Per-field update requests for alerts and cases.
//!
//! Each field is `Some` only when the caller wants it changed. Fields that
//! carry store invariants (`linked_alert_ids`, `iocs`) are deliberately absent
//! from [`CaseUpdate`]; they change only through linking.

use super::alert::{AiTriage, Alert};
use super::case::{Case, CaseStatus, Confidence, ResponsePlan, TimelineEntry};

/// Fields of an alert that may change after ingestion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertUpdate {
    /// Attach or replace the triage result.
    pub ai_triage: Option<AiTriage>,
}

impl AlertUpdate {
    /// Update that attaches a triage result.
    pub fn triage(triage: AiTriage) -> Self {
        Self {
            ai_triage: Some(triage),
        }
    }

    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.ai_triage.is_none()
    }

    pub(crate) fn apply(self, alert: &mut Alert) {
        if let Some(triage) = self.ai_triage {
            alert.ai_triage = Some(triage);
        }
    }
}

/// Fields of a case that may be replaced by `update_case`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseUpdate {
    /// New status.
    pub status: Option<CaseStatus>,
    /// New summary.
    pub summary: Option<String>,
    /// New hypothesis.
    pub hypothesis: Option<String>,
    /// New confidence.
    pub confidence: Option<Confidence>,
    /// New attack phase.
    pub phase: Option<String>,
    /// Replacement hunting queries.
    pub example_queries: Option<Vec<String>>,
    /// Replacement response plan.
    pub response_plan: Option<ResponsePlan>,
    /// Replacement timeline.
    pub timeline: Option<Vec<TimelineEntry>>,
}

impl CaseUpdate {
    /// Set the status.
    pub fn with_status(mut self, status: CaseStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Set the hypothesis.
    pub fn with_hypothesis(mut self, hypothesis: impl Into<String>) -> Self {
        self.hypothesis = Some(hypothesis.into());
        self
    }

    /// Set the confidence.
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Set the phase.
    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    /// Replace the example queries.
    pub fn with_example_queries(mut self, queries: Vec<String>) -> Self {
        self.example_queries = Some(queries);
        self
    }

    /// Replace the response plan.
    pub fn with_response_plan(mut self, plan: ResponsePlan) -> Self {
        self.response_plan = Some(plan);
        self
    }

    /// Replace the timeline.
    pub fn with_timeline(mut self, timeline: Vec<TimelineEntry>) -> Self {
        self.timeline = Some(timeline);
        self
    }

    /// Whether the update changes nothing beyond `updated_at`.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.summary.is_none()
            && self.hypothesis.is_none()
            && self.confidence.is_none()
            && self.phase.is_none()
            && self.example_queries.is_none()
            && self.response_plan.is_none()
            && self.timeline.is_none()
    }

    pub(crate) fn apply(self, case: &mut Case) {
        if let Some(status) = self.status {
            case.status = status;
        }
        if let Some(summary) = self.summary {
            case.summary = summary;
        }
        if let Some(hypothesis) = self.hypothesis {
            case.hypothesis = Some(hypothesis);
        }
        if let Some(confidence) = self.confidence {
            case.confidence = Some(confidence);
        }
        if let Some(phase) = self.phase {
            case.phase = Some(phase);
        }
        if let Some(queries) = self.example_queries {
            case.example_queries = queries;
        }
        if let Some(plan) = self.response_plan {
            case.response_plan = Some(plan);
        }
        if let Some(timeline) = self.timeline {
            case.timeline = timeline;
        }
    }
}
