//! Append-only audit log.
//!
//! Entries are kept newest-first. There is no update or delete path.

use std::collections::VecDeque;

use crate::types::{AuditLogEntry, CaseId};

/// Append-only, newest-first sequence of audit entries.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    entries: VecDeque<AuditLogEntry>,
}

impl AuditLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry at the front.
    pub fn append(&mut self, entry: AuditLogEntry) {
        self.entries.push_front(entry);
    }

    /// All entries, newest first.
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Entries for one case, newest first.
    pub fn for_case(&self, case_id: &CaseId) -> Vec<AuditLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.case_id.as_ref() == Some(case_id))
            .cloned()
            .collect()
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&AuditLogEntry> {
        self.entries.front()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Actor, AuditId, AuditKind};
    use chrono::Utc;

    fn entry(id: &str, case: Option<&str>) -> AuditLogEntry {
        AuditLogEntry {
            id: AuditId::new(id),
            timestamp: Utc::now(),
            actor: Actor::Human,
            kind: AuditKind::Investigation,
            case_id: case.map(CaseId::from),
            alert_id: None,
            details: String::new(),
        }
    }

    #[test]
    fn test_newest_first() {
        let mut log = AuditLog::new();
        log.append(entry("1", None));
        log.append(entry("2", None));
        log.append(entry("3", None));

        let ids: Vec<_> = log.entries().into_iter().map(|e| e.id.to_string()).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);
        assert_eq!(log.latest().map(|e| e.id.as_str()), Some("3"));
    }

    #[test]
    fn test_filter_by_case_keeps_order() {
        let mut log = AuditLog::new();
        log.append(entry("1", Some("CASE-1")));
        log.append(entry("2", Some("CASE-2")));
        log.append(entry("3", Some("CASE-1")));
        log.append(entry("4", None));

        let filtered = log.for_case(&CaseId::new("CASE-1"));
        let ids: Vec<_> = filtered.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
        assert_eq!(log.len(), 4);
    }
}
