//! Optional per-case mutation locks.
//!
//! A handler that reads a case, awaits a collaborator and then writes back
//! holds the case's lock across the whole sequence. Other handlers for the
//! same case wait; handlers for other cases do not.

use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::types::CaseId;

/// Guard held while a case's read-await-write sequence runs.
pub type CaseLockGuard = OwnedMutexGuard<()>;

/// Registry of async mutexes keyed by case ID.
#[derive(Debug, Clone, Default)]
pub struct CaseLocks {
    locks: Arc<Mutex<HashMap<CaseId, Arc<AsyncMutex<()>>>>>,
}

impl CaseLocks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a case, waiting if another handler holds it.
    pub async fn acquire(&self, case_id: &CaseId) -> CaseLockGuard {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(case_id.clone()).or_default())
        };
        tracing::trace!(case_id = %case_id, "Waiting for case lock");
        lock.lock_owned().await
    }

    /// Try to acquire the lock without waiting.
    pub fn try_acquire(&self, case_id: &CaseId) -> Option<CaseLockGuard> {
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(case_id.clone()).or_default())
        };
        lock.try_lock_owned().ok()
    }

    /// Number of cases that have had a lock created.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Whether no lock has been created yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
