//! Store snapshots with deterministic fingerprints.
//!
//! A [`StoreSnapshot`] is a consistent copy of every collection taken under a
//! single read lock. Its `fingerprint` is the xxh64 of the canonical JSON of
//! the three collections, so equal state always yields an equal fingerprint
//! and a view can skip re-rendering when nothing changed.
//!
//! ## Determinism
//!
//! - Struct fields serialize in declaration order
//! - Collections serialize in store order (alerts and audit newest-first)
//! - Raw event payloads are `serde_json::Map`, which iterates in key order

use std::hash::Hasher;
use std::io;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::Xxh64;

use crate::types::{Alert, AuditLogEntry, Case};
use crate::CASE_KERNEL_SCHEMA_VERSION;

/// `io::Write` adapter that feeds serialized bytes straight into xxh64.
struct HashWriter(Xxh64);

impl io::Write for HashWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Compute the canonical xxh64 of a serializable value as 16 hex chars.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut writer = HashWriter(Xxh64::new(0));
    serde_json::to_writer(&mut writer, value)?;
    Ok(format!("{:016x}", writer.0.finish()))
}

#[derive(Serialize)]
struct FingerprintInput<'a> {
    schema_version: &'a str,
    alerts: &'a [Alert],
    cases: &'a [Case],
    audit_log: &'a [AuditLogEntry],
}

/// Consistent copy of the store's collections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// Store revision the copy was taken at.
    pub revision: u64,
    /// Alerts in store order.
    pub alerts: Vec<Alert>,
    /// Cases in creation order.
    pub cases: Vec<Case>,
    /// Audit entries, newest first.
    pub audit_log: Vec<AuditLogEntry>,
    /// Hex xxh64 over the collections.
    pub fingerprint: String,
}

impl StoreSnapshot {
    /// Build a snapshot and compute its fingerprint.
    pub fn new(
        revision: u64,
        alerts: Vec<Alert>,
        cases: Vec<Case>,
        audit_log: Vec<AuditLogEntry>,
    ) -> Self {
        let mut snapshot = Self {
            revision,
            alerts,
            cases,
            audit_log,
            fingerprint: String::new(),
        };
        snapshot.fingerprint = snapshot.compute_fingerprint();
        snapshot
    }

    /// Recompute the fingerprint and compare it with the stored one.
    pub fn verify(&self) -> bool {
        self.compute_fingerprint() == self.fingerprint
    }

    /// Whether two snapshots hold identical collections.
    pub fn same_state(&self, other: &StoreSnapshot) -> bool {
        self.fingerprint == other.fingerprint
    }

    fn compute_fingerprint(&self) -> String {
        let input = FingerprintInput {
            schema_version: CASE_KERNEL_SCHEMA_VERSION,
            alerts: &self.alerts,
            cases: &self.cases,
            audit_log: &self.audit_log,
        };
        canonical_hash_hex(&input).unwrap_or_else(|e| {
            // Only reachable if a Serialize impl fails, which none of ours do.
            tracing::error!(error = %e, "Snapshot fingerprint serialization failed");
            String::new()
        })
    }
}
