//! The case/alert store.
//!
//! [`CaseStore`] is the only owner of the alert, case and audit collections.
//! Queries hand out owned copies; every write goes through a named operation
//! that commits under the state lock, releases it, and then notifies
//! listeners exactly once.
//!
//! ## Ordering
//!
//! - Alerts: ingested alerts newest-first, seed alerts in seed order at the tail
//! - Cases: creation order
//! - Audit log: newest-first
//!
//! ## Known race
//!
//! Handlers that read a case, await a collaborator, then call
//! [`CaseStore::update_case`] can overwrite each other (last writer wins).
//! [`CaseLocks`] serializes such read-await-write sequences per case when a
//! caller opts in.

pub mod locks;
pub mod seed;

use std::collections::VecDeque;
use chrono::Utc;
use parking_lot::RwLock;

use crate::audit::AuditLog;
use crate::ids::IdGenerator;
use crate::ioc::{merge_iocs, seed_iocs};
use crate::notify::{ListenerRegistry, Subscription};
use crate::snapshot::StoreSnapshot;
use crate::types::{
    Actor, Alert, AlertId, AlertUpdate, AuditEvent, AuditKind, AuditLogEntry,
    Case, CaseId, CaseStatus, CaseUpdate, TimelineEntry, TimelineKind,
};

pub use locks::{CaseLockGuard, CaseLocks};
pub use seed::seed_alerts;

/// Result of [`CaseStore::link_alert_to_case`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The alert was linked.
    Linked,
    /// The alert was already linked to that case; nothing changed.
    AlreadyLinked,
    /// No case with that ID; nothing changed.
    CaseNotFound,
}

#[derive(Debug, Default)]
struct StoreState {
    alerts: VecDeque<Alert>,
    cases: Vec<Case>,
    audit: AuditLog,
    revision: u64,
}

/// In-memory source of truth for alerts, cases and the audit trail.
///
/// Create one per process and share it by `Arc`.
#[derive(Debug)]
pub struct CaseStore {
    state: RwLock<StoreState>,
    listeners: ListenerRegistry,
    ids: IdGenerator,
}

impl CaseStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::init(Vec::new(), "System initialized")
    }

    /// Create a store holding the given alerts, in the given order.
    pub fn with_alerts(alerts: Vec<Alert>) -> Self {
        Self::init(alerts, "System initialized with seed data")
    }

    /// Create a store holding the built-in seed alerts.
    pub fn seeded() -> Self {
        Self::with_alerts(seed_alerts())
    }

    fn init(alerts: Vec<Alert>, details: &str) -> Self {
        let store = Self {
            state: RwLock::new(StoreState {
                alerts: alerts.into(),
                ..StoreState::default()
            }),
            listeners: ListenerRegistry::new(),
            ids: IdGenerator::new(),
        };
        {
            let mut state = store.state.write();
            store.append_audit(
                &mut state,
                AuditEvent::new(Actor::System, AuditKind::ReportGeneration, details),
            );
        }
        tracing::debug!(alerts = store.state.read().alerts.len(), "Case store initialized");
        store
    }

    // ─────────────────────────────────────────────────────────────────────
    // Alerts
    // ─────────────────────────────────────────────────────────────────────

    /// All alerts, newest ingested first.
    pub fn list_alerts(&self) -> Vec<Alert> {
        self.state.read().alerts.iter().cloned().collect()
    }

    /// Fetch an alert by ID.
    pub fn get_alert(&self, id: &AlertId) -> Option<Alert> {
        self.state.read().alerts.iter().find(|a| &a.id == id).cloned()
    }

    /// Prepend an alert.
    ///
    /// Duplicate IDs are not rejected; a warning is logged.
    pub fn add_alert(&self, alert: Alert) {
        self.commit(|state| {
            if state.alerts.iter().any(|a| a.id == alert.id) {
                tracing::warn!(alert_id = %alert.id, "Adding alert with an ID that already exists");
            }
            tracing::debug!(alert_id = %alert.id, severity = %alert.raw_severity, "Alert added");
            state.alerts.push_front(alert);
            Some(())
        });
    }

    /// Apply a field update to an alert.
    ///
    /// Returns `false` (and does not notify) if the alert does not exist.
    pub fn update_alert(&self, id: &AlertId, update: AlertUpdate) -> bool {
        self.commit(|state| {
            let alert = state.alerts.iter_mut().find(|a| &a.id == id)?;
            update.apply(alert);
            tracing::debug!(alert_id = %id, "Alert updated");
            Some(())
        })
        .is_some()
    }

    /// Ingest an alert under a freshly generated ID.
    pub fn ingest_alert(&self, mut alert: Alert) -> AlertId {
        alert.id = self.ids.next_alert_id();
        let id = alert.id.clone();
        self.add_alert(alert);
        id
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cases
    // ─────────────────────────────────────────────────────────────────────

    /// All cases in creation order.
    pub fn list_cases(&self) -> Vec<Case> {
        self.state.read().cases.clone()
    }

    /// Fetch a case by ID.
    pub fn get_case(&self, id: &CaseId) -> Option<Case> {
        self.state.read().cases.iter().find(|c| &c.id == id).cloned()
    }

    /// Alerts linked to a case, in link order.
    ///
    /// Linked IDs with no matching alert are skipped.
    pub fn linked_alerts(&self, case_id: &CaseId) -> Vec<Alert> {
        let state = self.state.read();
        let Some(case) = state.cases.iter().find(|c| &c.id == case_id) else {
            return Vec::new();
        };
        case.linked_alert_ids
            .iter()
            .filter_map(|id| state.alerts.iter().find(|a| &a.id == id).cloned())
            .collect()
    }

    /// Create a case from an alert, or return the case that already holds it.
    ///
    /// A new case starts with IOCs from the alert's triage (if any). An
    /// existing case is returned unchanged: IOCs are never re-seeded.
    pub fn create_case(&self, from_alert: &Alert) -> Case {
        let (case, created) = {
            let mut state = self.state.write();
            let existing = state.cases.iter().find(|c| c.is_linked(&from_alert.id)).cloned();
            match existing {
                Some(existing) => (existing, false),
                None => {
                    let case = self.new_case(from_alert);
                    state.cases.push(case.clone());
                    self.append_audit(
                        &mut state,
                        AuditEvent::new(
                            Actor::Human,
                            AuditKind::Investigation,
                            format!("Created case {} from alert {}", case.id, from_alert.id),
                        )
                        .for_case(case.id.clone())
                        .for_alert(from_alert.id.clone()),
                    );
                    state.revision += 1;
                    (case, true)
                }
            }
        };

        if created {
            tracing::info!(
                case_id = %case.id,
                alert_id = %from_alert.id,
                iocs = case.iocs.len(),
                "Case created"
            );
            self.listeners.notify();
        } else {
            tracing::debug!(case_id = %case.id, alert_id = %from_alert.id, "Alert already belongs to a case");
        }
        case
    }

    fn new_case(&self, from_alert: &Alert) -> Case {
        let now = Utc::now();
        Case {
            id: self.ids.next_case_id(),
            status: CaseStatus::Open,
            created_at: now,
            updated_at: now,
            summary: format!("Investigation started from alert: {}", from_alert.title),
            linked_alert_ids: vec![from_alert.id.clone()],
            timeline: vec![
                TimelineEntry::new(
                    from_alert.timestamp,
                    format!("Alert Triggered: {}", from_alert.title),
                    TimelineKind::Alert,
                ),
                TimelineEntry::new(now, "Case created by Human Analyst", TimelineKind::Note),
            ],
            iocs: seed_iocs(from_alert.triage_iocs()),
            hypothesis: None,
            confidence: None,
            phase: None,
            example_queries: Vec::new(),
            response_plan: None,
        }
    }

    /// Link an alert to an existing case, merging its IOCs.
    pub fn link_alert_to_case(&self, case_id: &CaseId, alert: &Alert) -> LinkOutcome {
        let mut outcome = LinkOutcome::CaseNotFound;
        self.commit(|state| {
            let case = state.cases.iter_mut().find(|c| &c.id == case_id)?;
            if case.is_linked(&alert.id) {
                outcome = LinkOutcome::AlreadyLinked;
                return None;
            }

            let now = Utc::now();
            case.linked_alert_ids.push(alert.id.clone());
            let new_iocs = merge_iocs(&mut case.iocs, alert.triage_iocs());
            case.timeline.push(TimelineEntry::new(
                alert.timestamp,
                format!("Linked Alert: {}", alert.title),
                TimelineKind::Alert,
            ));
            case.timeline.push(TimelineEntry::new(
                now,
                format!("Linked alert {} to case", alert.id),
                TimelineKind::Note,
            ));
            case.updated_at = now;

            self.append_audit(
                state,
                AuditEvent::new(
                    Actor::Human,
                    AuditKind::Investigation,
                    format!("Linked alert {} to case {}", alert.id, case_id),
                )
                .for_case(case_id.clone())
                .for_alert(alert.id.clone()),
            );
            tracing::info!(case_id = %case_id, alert_id = %alert.id, new_iocs, "Alert linked to case");
            outcome = LinkOutcome::Linked;
            Some(())
        });
        outcome
    }

    /// Apply a field update to a case, refreshing `updated_at`.
    ///
    /// Returns `false` (and does not notify) if the case does not exist.
    pub fn update_case(&self, id: &CaseId, update: CaseUpdate) -> bool {
        self.commit(|state| {
            let case = state.cases.iter_mut().find(|c| &c.id == id)?;
            update.apply(case);
            case.updated_at = Utc::now();
            tracing::debug!(case_id = %id, status = %case.status, "Case updated");
            Some(())
        })
        .is_some()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Audit log
    // ─────────────────────────────────────────────────────────────────────

    /// Append an audit entry. The only write path to the audit log.
    pub fn add_audit_log(&self, event: AuditEvent) -> AuditLogEntry {
        let entry = {
            let mut state = self.state.write();
            let entry = self.append_audit(&mut state, event);
            state.revision += 1;
            entry
        };
        self.listeners.notify();
        entry
    }

    /// Audit entries, newest first, optionally restricted to one case.
    pub fn get_audit_logs(&self, case_id: Option<&CaseId>) -> Vec<AuditLogEntry> {
        let state = self.state.read();
        match case_id {
            Some(id) => state.audit.for_case(id),
            None => state.audit.entries(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Observation
    // ─────────────────────────────────────────────────────────────────────

    /// Register a listener run after every applied mutation.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    /// Number of applied mutations since construction.
    pub fn revision(&self) -> u64 {
        self.state.read().revision
    }

    /// Consistent copy of all collections.
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read();
        StoreSnapshot::new(
            state.revision,
            state.alerts.iter().cloned().collect(),
            state.cases.clone(),
            state.audit.entries(),
        )
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    /// Run a mutation under the write lock; notify iff it returned `Some`.
    fn commit<R>(&self, mutation: impl FnOnce(&mut StoreState) -> Option<R>) -> Option<R> {
        let result = {
            let mut state = self.state.write();
            let result = mutation(&mut *state);
            if result.is_some() {
                state.revision += 1;
            }
            result
        };
        if result.is_some() {
            self.listeners.notify();
        }
        result
    }

    fn append_audit(&self, state: &mut StoreState, event: AuditEvent) -> AuditLogEntry {
        let entry = AuditLogEntry {
            id: self.ids.next_audit_id(),
            timestamp: Utc::now(),
            actor: event.actor,
            kind: event.kind,
            case_id: event.case_id,
            alert_id: event.alert_id,
            details: event.details,
        };
        state.audit.append(entry.clone());
        entry
    }
}

impl Default for CaseStore {
    fn default() -> Self {
        Self::new()
    }
}
