//! Analyst console workflow.
//!
//! [`Console`] drives the AI-assisted steps against a shared [`CaseStore`]:
//! read a snapshot, await the collaborator without holding any store lock,
//! then write the result back through a named store operation. Every step is
//! recorded in the audit log.
//!
//! ```text
//! triage_alert ─→ create_case ─→ link_alert ─→ investigate_case
//!                                                    ↓
//!             generate_report ←─ execute_action ←─ draft_response_plan
//! ```

use std::sync::Arc;
use chrono::Utc;

use crate::collaborator::{
    render_incident_report, validate_investigation, validate_response_plan, validate_triage,
    Collaborator, CollaboratorError, Investigation, StubCollaborator,
};
use crate::config::{CaseLockPolicy, ConsoleConfig};
use crate::store::{CaseLockGuard, CaseLocks, CaseStore, LinkOutcome};
use crate::types::{
    ActionStatus, Actor, AiTriage, AlertId, AlertUpdate, AuditEvent, AuditKind, Case, CaseId,
    CaseUpdate, ResponsePlan, TimelineEntry, TimelineKind,
};

/// Errors from workflow handlers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    /// The referenced alert does not exist.
    #[error("Alert not found: {0}")]
    AlertNotFound(AlertId),

    /// The referenced case does not exist.
    #[error("Case not found: {0}")]
    CaseNotFound(CaseId),

    /// The collaborator failed and fallback is disabled.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

/// Result of [`Console::execute_action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action is now marked executed.
    Executed,
    /// No case with that ID.
    CaseNotFound,
    /// The case has no plan, or the plan has no such action.
    ActionNotFound,
    /// The action was executed earlier; nothing changed.
    AlreadyExecuted,
    /// The action is in a state that cannot be executed (e.g. failed).
    NotExecutable,
}

/// Workflow handlers over a shared store and collaborator.
pub struct Console {
    store: Arc<CaseStore>,
    collaborator: Arc<dyn Collaborator>,
    fallback: StubCollaborator,
    config: ConsoleConfig,
    locks: CaseLocks,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("config", &self.config)
            .field("locked_cases", &self.locks.len())
            .finish_non_exhaustive()
    }
}

impl Console {
    /// Create a console.
    pub fn new(
        store: Arc<CaseStore>,
        collaborator: Arc<dyn Collaborator>,
        config: ConsoleConfig,
    ) -> Self {
        Self {
            store,
            collaborator,
            fallback: StubCollaborator::new(),
            config,
            locks: CaseLocks::new(),
        }
    }

    /// Create a console backed by the deterministic stand-in collaborator.
    pub fn with_stub(store: Arc<CaseStore>, config: ConsoleConfig) -> Self {
        Self::new(store, Arc::new(StubCollaborator::new()), config)
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<CaseStore> {
        &self.store
    }

    /// Active configuration.
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────
    // Alerts and cases
    // ─────────────────────────────────────────────────────────────────────

    /// Triage an alert and attach the result.
    pub async fn triage_alert(&self, alert_id: &AlertId) -> Result<AiTriage, WorkflowError> {
        let alert = self
            .store
            .get_alert(alert_id)
            .ok_or_else(|| WorkflowError::AlertNotFound(alert_id.clone()))?;

        self.store.add_audit_log(
            AuditEvent::new(Actor::Ai, AuditKind::Triage, format!("Analyzing alert {alert_id}..."))
                .for_alert(alert_id.clone()),
        );

        let result = self.collaborator.triage_alert(&alert).await.and_then(|triage| {
            validate_triage(&triage)?;
            Ok(triage)
        });
        let triage = self.resolve("triage", result, || self.fallback.triage(&alert))?;

        self.store.update_alert(alert_id, AlertUpdate::triage(triage.clone()));
        self.store.add_audit_log(
            AuditEvent::new(Actor::Ai, AuditKind::Triage, format!("Completed triage for {alert_id}"))
                .for_alert(alert_id.clone()),
        );

        tracing::info!(
            alert_id = %alert_id,
            severity = %triage.severity,
            iocs = triage.iocs.len(),
            "Alert triaged"
        );
        Ok(triage)
    }

    /// Open a case from an alert (or return the case already holding it).
    pub fn create_case(&self, alert_id: &AlertId) -> Result<Case, WorkflowError> {
        let alert = self
            .store
            .get_alert(alert_id)
            .ok_or_else(|| WorkflowError::AlertNotFound(alert_id.clone()))?;
        Ok(self.store.create_case(&alert))
    }

    /// Link an alert to a case.
    pub fn link_alert(
        &self,
        case_id: &CaseId,
        alert_id: &AlertId,
    ) -> Result<LinkOutcome, WorkflowError> {
        let alert = self
            .store
            .get_alert(alert_id)
            .ok_or_else(|| WorkflowError::AlertNotFound(alert_id.clone()))?;
        Ok(self.store.link_alert_to_case(case_id, &alert))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Investigation and response
    // ─────────────────────────────────────────────────────────────────────

    /// Form a hypothesis for a case and append it to the timeline.
    ///
    /// The timeline written back is the snapshot read before the
    /// collaborator call plus one AI entry. Without per-case locking, a
    /// concurrent update landing in between is overwritten.
    pub async fn investigate_case(&self, case_id: &CaseId) -> Result<Investigation, WorkflowError> {
        let _guard = self.lock(case_id).await;
        let case = self.case(case_id)?;

        self.store.add_audit_log(
            AuditEvent::new(
                Actor::Ai,
                AuditKind::Investigation,
                format!("Generating investigation hypothesis for Case {case_id}"),
            )
            .for_case(case_id.clone()),
        );

        let alerts = self.store.linked_alerts(case_id);
        let result = self
            .collaborator
            .investigate_case(&case, &alerts)
            .await
            .and_then(|investigation| {
                validate_investigation(&investigation)?;
                Ok(investigation)
            });
        let investigation =
            self.resolve("investigation", result, || self.fallback.investigation(&alerts))?;

        let mut timeline = case.timeline;
        timeline.push(TimelineEntry::new(
            Utc::now(),
            format!("AI Investigation: {}", investigation.hypothesis),
            TimelineKind::Ai,
        ));
        self.store.update_case(
            case_id,
            CaseUpdate::default()
                .with_hypothesis(investigation.hypothesis.clone())
                .with_confidence(investigation.confidence)
                .with_phase(investigation.phase.clone())
                .with_example_queries(investigation.example_queries.clone())
                .with_timeline(timeline),
        );

        tracing::info!(
            case_id = %case_id,
            confidence = %investigation.confidence,
            phase = %investigation.phase,
            "Case investigated"
        );
        Ok(investigation)
    }

    /// Draft a response plan, replacing any existing one.
    pub async fn draft_response_plan(&self, case_id: &CaseId) -> Result<ResponsePlan, WorkflowError> {
        let _guard = self.lock(case_id).await;
        let case = self.case(case_id)?;

        self.store.add_audit_log(
            AuditEvent::new(
                Actor::Ai,
                AuditKind::ActionApproval,
                format!("Drafting response plan for Case {case_id}"),
            )
            .for_case(case_id.clone()),
        );

        let alerts = self.store.linked_alerts(case_id);
        let result = self
            .collaborator
            .draft_response_plan(&case, &alerts)
            .await
            .and_then(|plan| {
                validate_response_plan(&plan)?;
                Ok(plan)
            });
        let plan = self.resolve("response_plan", result, || self.fallback.response_plan(&alerts))?;

        self.store
            .update_case(case_id, CaseUpdate::default().with_response_plan(plan.clone()));

        tracing::info!(case_id = %case_id, actions = plan.actions.len(), "Response plan drafted");
        Ok(plan)
    }

    /// Mark a proposed or approved action as executed.
    pub async fn execute_action(&self, case_id: &CaseId, action_id: &str) -> ActionOutcome {
        let _guard = self.lock(case_id).await;
        let Some(case) = self.store.get_case(case_id) else {
            return ActionOutcome::CaseNotFound;
        };
        let Some(mut plan) = case.response_plan else {
            return ActionOutcome::ActionNotFound;
        };
        let Some(action) = plan.actions.iter_mut().find(|a| a.id == action_id) else {
            return ActionOutcome::ActionNotFound;
        };

        let status = action.status;
        if status == ActionStatus::Executed {
            return ActionOutcome::AlreadyExecuted;
        }
        if !status.is_executable() {
            tracing::debug!(case_id = %case_id, action_id, ?status, "Action not executable");
            return ActionOutcome::NotExecutable;
        }
        action.status = ActionStatus::Executed;

        self.store
            .update_case(case_id, CaseUpdate::default().with_response_plan(plan));
        self.store.add_audit_log(
            AuditEvent::new(
                Actor::Human,
                AuditKind::ActionExecution,
                format!("Executed action {action_id}"),
            )
            .for_case(case_id.clone()),
        );

        tracing::info!(case_id = %case_id, action_id, "Action executed");
        ActionOutcome::Executed
    }

    /// Produce the markdown incident report for a case.
    pub async fn generate_report(&self, case_id: &CaseId) -> Result<String, WorkflowError> {
        let case = self.case(case_id)?;

        self.store.add_audit_log(
            AuditEvent::new(
                Actor::Ai,
                AuditKind::ReportGeneration,
                format!("Generating final report for Case {case_id}"),
            )
            .for_case(case_id.clone()),
        );

        let result = self.collaborator.generate_report(&case).await;
        let report = self.resolve("report", result, || render_incident_report(&case))?;
        Ok(report)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn case(&self, case_id: &CaseId) -> Result<Case, WorkflowError> {
        self.store
            .get_case(case_id)
            .ok_or_else(|| WorkflowError::CaseNotFound(case_id.clone()))
    }

    async fn lock(&self, case_id: &CaseId) -> Option<CaseLockGuard> {
        match self.config.case_locks {
            CaseLockPolicy::None => None,
            CaseLockPolicy::PerCase => Some(self.locks.acquire(case_id).await),
        }
    }

    /// Substitute the stand-in result on failure when fallback is enabled.
    fn resolve<T>(
        &self,
        step: &'static str,
        result: Result<T, CollaboratorError>,
        fallback: impl FnOnce() -> T,
    ) -> Result<T, WorkflowError> {
        match result {
            Ok(value) => Ok(value),
            Err(error) if self.config.fallback_on_failure => {
                tracing::warn!(step, error = %error, "Collaborator failed, using deterministic fallback");
                Ok(fallback())
            }
            Err(error) => {
                tracing::error!(step, error = %error, "Collaborator failed");
                Err(error.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::ValidationError;
    use crate::types::{Action, Alert};
    use async_trait::async_trait;

    /// Always unavailable.
    struct Down;

    #[async_trait]
    impl Collaborator for Down {
        async fn triage_alert(&self, _: &Alert) -> Result<AiTriage, CollaboratorError> {
            Err(CollaboratorError::Unavailable("quota exhausted".into()))
        }
        async fn investigate_case(&self, _: &Case, _: &[Alert]) -> Result<Investigation, CollaboratorError> {
            Err(CollaboratorError::Unavailable("quota exhausted".into()))
        }
        async fn draft_response_plan(&self, _: &Case, _: &[Alert]) -> Result<ResponsePlan, CollaboratorError> {
            Err(CollaboratorError::Unavailable("quota exhausted".into()))
        }
        async fn generate_report(&self, _: &Case) -> Result<String, CollaboratorError> {
            Err(CollaboratorError::Unavailable("quota exhausted".into()))
        }
    }

    /// Returns a plan whose first action is already executed.
    struct BadPlanner;

    #[async_trait]
    impl Collaborator for BadPlanner {
        async fn triage_alert(&self, alert: &Alert) -> Result<AiTriage, CollaboratorError> {
            Ok(StubCollaborator::new().triage(alert))
        }
        async fn investigate_case(&self, _: &Case, alerts: &[Alert]) -> Result<Investigation, CollaboratorError> {
            Ok(StubCollaborator::new().investigation(alerts))
        }
        async fn draft_response_plan(&self, _: &Case, _: &[Alert]) -> Result<ResponsePlan, CollaboratorError> {
            let mut action = Action::proposed("x", "block_ip", "Block", "");
            action.status = ActionStatus::Executed;
            Ok(ResponsePlan {
                actions: vec![action],
                rollback_steps: vec![],
            })
        }
        async fn generate_report(&self, case: &Case) -> Result<String, CollaboratorError> {
            Ok(render_incident_report(case))
        }
    }

    fn console(collaborator: Arc<dyn Collaborator>, config: ConsoleConfig) -> Console {
        Console::new(Arc::new(CaseStore::seeded()), collaborator, config)
    }

    #[tokio::test]
    async fn test_triage_attaches_result_and_audits() {
        let console = Console::with_stub(Arc::new(CaseStore::seeded()), ConsoleConfig::default());
        let id = AlertId::new("AL-1001");

        let triage = console.triage_alert(&id).await.unwrap();
        assert_eq!(triage.iocs.len(), 2);

        let alert = console.store().get_alert(&id).unwrap();
        assert_eq!(alert.ai_triage, Some(triage));

        let logs = console.store().get_audit_logs(None);
        assert_eq!(logs[0].details, "Completed triage for AL-1001");
        assert_eq!(logs[1].details, "Analyzing alert AL-1001...");
        assert!(logs[..2].iter().all(|l| l.actor == Actor::Ai && l.kind == AuditKind::Triage));
    }

    #[tokio::test]
    async fn test_triage_missing_alert() {
        let console = Console::with_stub(Arc::new(CaseStore::new()), ConsoleConfig::default());
        let err = console.triage_alert(&AlertId::new("AL-0")).await.unwrap_err();
        assert_eq!(err, WorkflowError::AlertNotFound(AlertId::new("AL-0")));
        assert_eq!(console.store().get_audit_logs(None).len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_on_collaborator_failure() {
        let console = console(Arc::new(Down), ConsoleConfig::default());
        let id = AlertId::new("AL-1002");

        let triage = console.triage_alert(&id).await.unwrap();
        assert_eq!(triage, StubCollaborator::new().triage(&console.store().get_alert(&id).unwrap()));

        let case = console.create_case(&id).unwrap();
        let investigation = console.investigate_case(&case.id).await.unwrap();
        assert_eq!(investigation.phase, "Credential Access");

        let case = console.store().get_case(&case.id).unwrap();
        assert_eq!(case.confidence.map(|c| c.value()), Some(98));
        assert_eq!(case.timeline.last().map(|e| e.kind), Some(TimelineKind::Ai));

        let report = console.generate_report(&case.id).await.unwrap();
        assert!(report.starts_with("# Incident Report: CASE-1001"));
    }

    #[tokio::test]
    async fn test_failure_without_fallback_is_returned() {
        let console = console(Arc::new(Down), ConsoleConfig::default().with_fallback(false));
        let id = AlertId::new("AL-1001");

        let err = console.triage_alert(&id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Collaborator(CollaboratorError::Unavailable(_))));

        // Start entry is written, the alert is untouched.
        let logs = console.store().get_audit_logs(None);
        assert_eq!(logs[0].details, "Analyzing alert AL-1001...");
        assert!(console.store().get_alert(&id).unwrap().ai_triage.is_none());
    }

    #[tokio::test]
    async fn test_invalid_plan_is_treated_as_failure() {
        let strict = console(Arc::new(BadPlanner), ConsoleConfig::default().with_fallback(false));
        let case = strict.create_case(&AlertId::new("AL-1001")).unwrap();
        let err = strict.draft_response_plan(&case.id).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Collaborator(CollaboratorError::Invalid(ValidationError::ActionNotProposed { .. }))
        ));
        assert!(strict.store().get_case(&case.id).unwrap().response_plan.is_none());

        let lenient = console(Arc::new(BadPlanner), ConsoleConfig::default());
        let case = lenient.create_case(&AlertId::new("AL-1001")).unwrap();
        let plan = lenient.draft_response_plan(&case.id).await.unwrap();
        assert_eq!(plan.actions[0].label, "Block IP 192.168.45.12 on Edge Firewall");
    }

    #[tokio::test]
    async fn test_execute_action_outcomes() {
        let console = Console::with_stub(Arc::new(CaseStore::seeded()), ConsoleConfig::default());
        let case = console.create_case(&AlertId::new("AL-1001")).unwrap();

        assert_eq!(console.execute_action(&case.id, "act_1").await, ActionOutcome::ActionNotFound);
        assert_eq!(
            console.execute_action(&CaseId::new("CASE-9"), "act_1").await,
            ActionOutcome::CaseNotFound
        );

        console.draft_response_plan(&case.id).await.unwrap();
        let before = console.store().revision();
        assert_eq!(console.execute_action(&case.id, "act_1").await, ActionOutcome::Executed);
        assert_eq!(console.store().revision(), before + 2);
        assert_eq!(console.execute_action(&case.id, "act_1").await, ActionOutcome::AlreadyExecuted);
        assert_eq!(console.store().revision(), before + 2);

        let logs = console.store().get_audit_logs(Some(&case.id));
        assert_eq!(logs[0].actor, Actor::Human);
        assert_eq!(logs[0].kind, AuditKind::ActionExecution);
        assert_eq!(logs[0].details, "Executed action act_1");

        let plan = console.store().get_case(&case.id).unwrap().response_plan.unwrap();
        assert_eq!(plan.action("act_1").map(|a| a.status), Some(ActionStatus::Executed));
        assert_eq!(plan.action("act_2").map(|a| a.status), Some(ActionStatus::Proposed));
    }

    #[tokio::test]
    async fn test_failed_action_is_not_executable() {
        let console = Console::with_stub(Arc::new(CaseStore::seeded()), ConsoleConfig::default());
        let case = console.create_case(&AlertId::new("AL-1001")).unwrap();
        let mut plan = console.draft_response_plan(&case.id).await.unwrap();
        plan.actions[1].status = ActionStatus::Failed;
        console
            .store()
            .update_case(&case.id, CaseUpdate::default().with_response_plan(plan));

        assert_eq!(console.execute_action(&case.id, "act_2").await, ActionOutcome::NotExecutable);
    }

    #[tokio::test]
    async fn test_link_alert_missing_alert() {
        let console = Console::with_stub(Arc::new(CaseStore::seeded()), ConsoleConfig::default());
        let case = console.create_case(&AlertId::new("AL-1001")).unwrap();
        assert_eq!(
            console.link_alert(&case.id, &AlertId::new("AL-404")),
            Err(WorkflowError::AlertNotFound(AlertId::new("AL-404")))
        );
        assert_eq!(
            console.link_alert(&case.id, &AlertId::new("AL-1002")),
            Ok(LinkOutcome::Linked)
        );
    }
}
