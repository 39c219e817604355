//! Identifier generation for cases, audit entries and ingested alerts.
//!
//! Case and alert IDs come from monotonic counters so they stay short and
//! readable in the console. Audit IDs embed the wall-clock millisecond plus a
//! sequence number, so two entries appended in the same millisecond never
//! collide.

use std::sync::atomic::{AtomicU64, Ordering};
use chrono::Utc;

use crate::types::{AlertId, AuditId, CaseId};

/// First case number handed out.
pub const FIRST_CASE_NUMBER: u64 = 1001;

/// First alert number handed out for ingested alerts.
///
/// Sits above the seed range so generated IDs never shadow seed alerts.
pub const FIRST_ALERT_NUMBER: u64 = 5001;

/// Thread-safe identifier generator.
#[derive(Debug)]
pub struct IdGenerator {
    next_case: AtomicU64,
    next_alert: AtomicU64,
    log_seq: AtomicU64,
}

impl IdGenerator {
    /// Create a generator starting at the default counters.
    pub fn new() -> Self {
        Self {
            next_case: AtomicU64::new(FIRST_CASE_NUMBER),
            next_alert: AtomicU64::new(FIRST_ALERT_NUMBER),
            log_seq: AtomicU64::new(0),
        }
    }

    /// Next case ID (`CASE-1001`, `CASE-1002`, ...).
    pub fn next_case_id(&self) -> CaseId {
        let n = self.next_case.fetch_add(1, Ordering::Relaxed);
        CaseId::new(format!("CASE-{n}"))
    }

    /// Next alert ID for an ingested alert (`AL-5001`, ...).
    pub fn next_alert_id(&self) -> AlertId {
        let n = self.next_alert.fetch_add(1, Ordering::Relaxed);
        AlertId::new(format!("AL-{n}"))
    }

    /// Next audit entry ID (`LOG-{unix_millis}-{seq}`).
    pub fn next_audit_id(&self) -> AuditId {
        let seq = self.log_seq.fetch_add(1, Ordering::Relaxed);
        AuditId::new(format!("LOG-{}-{}", Utc::now().timestamp_millis(), seq))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
