//! # case-kernel
//!
//! In-memory state for a security-operations console: alerts, the cases that
//! group them, aggregated indicators of compromise, and an append-only audit
//! trail, with change notification for whatever renders them.
//!
//! ## Architecture
//!
//! ```text
//! Collaborator ─→ Console (workflow) ─→ CaseStore ─→ listeners
//!  (AI seam)        read/await/write      RwLock      notify once per op
//!                                            ↓
//!                                      StoreSnapshot (xxh64 fingerprint)
//! ```
//!
//! ## Guarantees
//!
//! - One case per originating alert: `create_case` on a linked alert returns
//!   the existing case
//! - An alert is linked to a case at most once; IOC counts are bumped only
//!   when a link actually happens
//! - The audit log only grows; filtered views are subsets of the full log
//! - Listeners run after the lock is released, once per applied mutation,
//!   never for a no-op

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod ids;
pub mod ioc;
pub mod audit;
pub mod notify;
pub mod store;
pub mod snapshot;
pub mod collaborator;
pub mod workflow;
pub mod config;

// Re-exports
pub use types::{
    Action, ActionStatus, Actor, AiTriage, Alert, AlertId, AlertUpdate, AuditEvent, AuditId,
    AuditKind, AuditLogEntry, Case, CaseId, CaseIoc, CaseStatus, CaseUpdate, Confidence,
    ConfidenceError, Indicator, ParseEnumError, ResponsePlan, Severity, TimelineEntry,
    TimelineKind,
};
pub use ids::IdGenerator;
pub use ioc::{merge_iocs, seed_iocs};
pub use audit::AuditLog;
pub use notify::{ListenerRegistry, Subscription};
pub use store::{seed_alerts, CaseLockGuard, CaseLocks, CaseStore, LinkOutcome};
pub use snapshot::{canonical_hash_hex, StoreSnapshot};
pub use collaborator::{
    parse_investigation_json, parse_response_plan_json, parse_triage_json,
    render_incident_report, Collaborator, CollaboratorError, Investigation, StubCollaborator,
    ValidationError,
};
pub use workflow::{ActionOutcome, Console, WorkflowError};
pub use config::{CaseLockPolicy, ConfigError, ConsoleConfig};

/// Schema version for serialized store snapshots.
/// Increment on breaking changes to any serialized type.
pub const CASE_KERNEL_SCHEMA_VERSION: &str = "1.0.0";
