//! Property tests for store invariants over arbitrary operation sequences.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use proptest::prelude::*;
use case_kernel::{
    Actor, AiTriage, Alert, AuditEvent, AuditKind, CaseId, CaseStatus, CaseStore, CaseUpdate,
    Indicator, Severity,
};

const ALERT_POOL: usize = 6;
const IOC_POOL: [(&str, &str); 4] = [
    ("IP", "1.2.3.4"),
    ("IP", "10.0.0.1"),
    ("Path", "/search"),
    ("User", "admin"),
];

#[derive(Debug, Clone)]
enum Op {
    AddAlert(usize),
    CreateCase(usize),
    Link(usize, usize),
    SetStatus(usize, CaseStatus),
    UpdateMissingCase,
    Audit(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let status = prop_oneof![
        Just(CaseStatus::Open),
        Just(CaseStatus::Investigating),
        Just(CaseStatus::Contained),
        Just(CaseStatus::Closed),
    ];
    prop_oneof![
        (0..ALERT_POOL).prop_map(Op::AddAlert),
        (0..ALERT_POOL).prop_map(Op::CreateCase),
        (0..4usize, 0..ALERT_POOL).prop_map(|(c, a)| Op::Link(c, a)),
        (0..4usize, status).prop_map(|(c, s)| Op::SetStatus(c, s)),
        Just(Op::UpdateMissingCase),
        (0..4usize).prop_map(Op::Audit),
    ]
}

/// Alert `i` carries a deterministic subset of the indicator pool.
fn pool_alert(i: usize) -> Alert {
    let iocs = IOC_POOL
        .iter()
        .enumerate()
        .filter(|(bit, _)| (i >> bit) & 1 == 1)
        .map(|(_, (t, v))| Indicator::new(*t, *v))
        .collect();
    Alert::new(
        format!("AL-{}", 1000 + i),
        "prop",
        Utc::now(),
        Severity::Medium,
        format!("Alert {i}"),
        "generated",
    )
    .with_triage(AiTriage {
        summary: String::new(),
        severity: Severity::Medium,
        rationale: String::new(),
        iocs,
        recommended_checks: Vec::new(),
    })
}

fn case_at(store: &CaseStore, idx: usize) -> Option<CaseId> {
    let cases = store.list_cases();
    if cases.is_empty() {
        return None;
    }
    Some(cases[idx % cases.len()].id.clone())
}

fn apply(store: &CaseStore, op: &Op) {
    match op {
        Op::AddAlert(i) => store.add_alert(pool_alert(*i)),
        Op::CreateCase(i) => {
            store.create_case(&pool_alert(*i));
        }
        Op::Link(c, a) => {
            if let Some(id) = case_at(store, *c) {
                store.link_alert_to_case(&id, &pool_alert(*a));
            }
        }
        Op::SetStatus(c, status) => {
            if let Some(id) = case_at(store, *c) {
                store.update_case(&id, CaseUpdate::default().with_status(*status));
            }
        }
        Op::UpdateMissingCase => {
            store.update_case(&CaseId::new("CASE-0"), CaseUpdate::default());
        }
        Op::Audit(c) => {
            let mut event = AuditEvent::new(Actor::Human, AuditKind::Investigation, "note");
            if let Some(id) = case_at(store, *c) {
                event = event.for_case(id);
            }
            store.add_audit_log(event);
        }
    }
}

proptest! {
    #[test]
    fn prop_create_case_is_idempotent(ops in prop::collection::vec(op_strategy(), 0..30), i in 0..ALERT_POOL) {
        let store = CaseStore::new();
        for op in &ops {
            apply(&store, op);
        }

        let before = store.list_cases().len();
        let first = store.create_case(&pool_alert(i));
        let after_first = store.list_cases().len();
        let second = store.create_case(&pool_alert(i));

        prop_assert_eq!(&first.id, &second.id);
        prop_assert!(after_first == before || after_first == before + 1);
        prop_assert_eq!(store.list_cases().len(), after_first);
    }

    #[test]
    fn prop_link_is_idempotent(ops in prop::collection::vec(op_strategy(), 1..30), a in 0..ALERT_POOL) {
        let store = CaseStore::new();
        store.create_case(&pool_alert((a + 1) % ALERT_POOL));
        for op in &ops {
            apply(&store, op);
        }

        let case_id = store.list_cases()[0].id.clone();
        let alert = pool_alert(a);
        store.link_alert_to_case(&case_id, &alert);
        let once = store.get_case(&case_id).unwrap();
        store.link_alert_to_case(&case_id, &alert);
        let twice = store.get_case(&case_id).unwrap();

        prop_assert_eq!(once.linked_alert_ids.iter().filter(|id| **id == alert.id).count(), 1);
        prop_assert_eq!(&once, &twice);
    }

    #[test]
    fn prop_iocs_stay_unique(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let store = CaseStore::new();
        for op in &ops {
            apply(&store, op);
        }

        for case in store.list_cases() {
            for (i, ioc) in case.iocs.iter().enumerate() {
                prop_assert!(ioc.count >= 1);
                prop_assert!(case.iocs[i + 1..]
                    .iter()
                    .all(|o| o.ioc_type != ioc.ioc_type || o.value != ioc.value));
                prop_assert!(ioc.count as usize <= case.linked_alert_ids.len());
            }
        }
    }

    #[test]
    fn prop_audit_log_only_grows(ops in prop::collection::vec(op_strategy(), 0..40)) {
        let store = CaseStore::new();
        let mut last = store.get_audit_logs(None).len();
        for op in &ops {
            apply(&store, op);
            let len = store.get_audit_logs(None).len();
            prop_assert!(len >= last);
            last = len;
        }

        let all = store.get_audit_logs(None);
        for case in store.list_cases() {
            let filtered = store.get_audit_logs(Some(&case.id));
            prop_assert!(filtered.iter().all(|e| e.case_id.as_ref() == Some(&case.id)));
            prop_assert!(filtered.iter().all(|e| all.contains(e)));
        }
    }

    #[test]
    fn prop_notifies_once_per_applied_mutation(
        ops in prop::collection::vec(op_strategy(), 0..30),
        tail in prop::collection::vec(op_strategy(), 0..10),
    ) {
        let store = CaseStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let subscription = store.subscribe(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        for op in &ops {
            let revision = store.revision();
            let before = calls.load(Ordering::SeqCst);
            apply(&store, op);
            let applied = (store.revision() - revision) as usize;
            prop_assert!(applied <= 1);
            prop_assert_eq!(calls.load(Ordering::SeqCst) - before, applied);
        }

        prop_assert!(subscription.unsubscribe());
        let frozen = calls.load(Ordering::SeqCst);
        for op in &tail {
            apply(&store, op);
        }
        prop_assert_eq!(calls.load(Ordering::SeqCst), frozen);
    }
}
