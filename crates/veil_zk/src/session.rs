//! Batch proving sessions
//!
//! A batch collects heterogeneous prove requests and executes them together
//! on the rayon pool. Lifecycle: `Open -> Processing -> Completed`; requests
//! can only be queued while a batch is `Open`.
//!
//! Completed batches stay queryable until cleared. Once more than the
//! retention bound have completed, the oldest completed batches are dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ZkError};
use crate::proof::StatementKind;
use crate::request::ProofRequest;

/// Batch lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    Open,
    Processing,
    Completed,
}

/// Status and counts of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: u64,
    pub status: BatchStatus,
    pub total_requests: usize,
    pub range_proofs: usize,
    pub equality_proofs: usize,
    pub threshold_proofs: usize,
    pub membership_proofs: usize,
    pub improvement_proofs: usize,
    pub consistency_proofs: usize,
    /// Items that produced a proof; zero until completed
    pub succeeded: usize,
    /// Items whose prover refused; zero until completed
    pub failed: usize,
}

struct BatchSession {
    status: BatchStatus,
    requests: Vec<ProofRequest>,
    succeeded: usize,
    failed: usize,
}

/// Completed batches kept by [`BatchManager::new`]
pub const DEFAULT_COMPLETED_RETENTION: usize = 256;

/// Owns all open and finished batches
pub struct BatchManager {
    sessions: Mutex<HashMap<u64, BatchSession>>,
    next_id: AtomicU64,
    max_completed: usize,
}

impl BatchManager {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_COMPLETED_RETENTION)
    }

    /// Keep at most `max_completed` completed batches
    pub fn with_retention(max_completed: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            max_completed,
        }
    }

    /// Open a new batch and return its id
    pub fn create(&self) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.sessions.lock().insert(
            id,
            BatchSession {
                status: BatchStatus::Open,
                requests: Vec::new(),
                succeeded: 0,
                failed: 0,
            },
        );
        log::debug!("opened batch {}", id);
        id
    }

    /// Queue a request; the batch must be open
    pub fn add(&self, batch_id: u64, request: ProofRequest) -> Result<()> {
        let mut sessions = self.sessions.lock();
        match sessions.get_mut(&batch_id) {
            Some(session) if session.status == BatchStatus::Open => {
                log::trace!("batch {} queued {} request", batch_id, request.kind());
                session.requests.push(request);
                Ok(())
            }
            _ => Err(ZkError::InvalidBatchId(batch_id)),
        }
    }

    /// Current status and per-kind counts
    pub fn status(&self, batch_id: u64) -> Result<BatchReport> {
        let sessions = self.sessions.lock();
        let session = sessions
            .get(&batch_id)
            .ok_or(ZkError::InvalidBatchId(batch_id))?;

        let count = |kind: StatementKind| session.requests.iter().filter(|r| r.kind() == kind).count();
        Ok(BatchReport {
            batch_id,
            status: session.status,
            total_requests: session.requests.len(),
            range_proofs: count(StatementKind::Range),
            equality_proofs: count(StatementKind::Equality),
            threshold_proofs: count(StatementKind::Threshold),
            membership_proofs: count(StatementKind::Membership),
            improvement_proofs: count(StatementKind::Improvement),
            consistency_proofs: count(StatementKind::Consistency),
            succeeded: session.succeeded,
            failed: session.failed,
        })
    }

    /// Execute every queued request with `prove`, in order
    ///
    /// The lock is not held while proving, so other batches stay usable. The
    /// completed batch is retained for status queries until cleared or
    /// pushed out by newer completed batches.
    pub fn process<F>(&self, batch_id: u64, prove: F) -> Result<Vec<Result<Vec<u8>>>>
    where
        F: Fn(&ProofRequest) -> Result<Vec<u8>> + Sync,
    {
        let requests = {
            let mut sessions = self.sessions.lock();
            match sessions.get_mut(&batch_id) {
                Some(session) if session.status == BatchStatus::Open => {
                    session.status = BatchStatus::Processing;
                    session.requests.clone()
                }
                _ => return Err(ZkError::InvalidBatchId(batch_id)),
            }
        };

        log::debug!("processing batch {} with {} requests", batch_id, requests.len());
        let results: Vec<Result<Vec<u8>>> = requests.par_iter().map(&prove).collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        for (i, result) in results.iter().enumerate() {
            if let Err(e) = result {
                log::warn!("batch {} item {} failed: {}", batch_id, i, e);
            }
        }

        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.get_mut(&batch_id) {
            session.status = BatchStatus::Completed;
            session.succeeded = results.len() - failed;
            session.failed = failed;
        }
        self.prune_completed(&mut sessions);
        Ok(results)
    }

    /// Drop the oldest completed batches beyond the retention bound
    fn prune_completed(&self, sessions: &mut HashMap<u64, BatchSession>) {
        let mut completed: Vec<u64> = sessions
            .iter()
            .filter(|(_, s)| s.status == BatchStatus::Completed)
            .map(|(id, _)| *id)
            .collect();
        if completed.len() <= self.max_completed {
            return;
        }
        completed.sort_unstable();
        let excess = completed.len() - self.max_completed;
        for id in &completed[..excess] {
            log::debug!("releasing completed batch {}", id);
            sessions.remove(id);
        }
    }

    /// Release a batch in any state
    pub fn clear(&self, batch_id: u64) -> Result<()> {
        self.sessions
            .lock()
            .remove(&batch_id)
            .map(|_| ())
            .ok_or(ZkError::InvalidBatchId(batch_id))
    }

    /// Number of batches held
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BatchManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prove_bytes(request: &ProofRequest) -> Result<Vec<u8>> {
        request.prove()?.to_bytes()
    }

    #[test]
    fn test_batch_lifecycle() {
        let manager = BatchManager::new();
        let id = manager.create();
        assert_eq!(manager.status(id).unwrap().status, BatchStatus::Open);

        manager
            .add(
                id,
                ProofRequest::Range {
                    value: 10,
                    low: 0,
                    high: 20,
                },
            )
            .unwrap();
        manager
            .add(
                id,
                ProofRequest::Improvement {
                    old_value: 2,
                    new_value: 1,
                },
            )
            .unwrap();
        manager
            .add(
                id,
                ProofRequest::Equality {
                    a: 4,
                    b: 4,
                    context: vec![],
                },
            )
            .unwrap();

        let report = manager.status(id).unwrap();
        assert_eq!(report.total_requests, 3);
        assert_eq!(report.range_proofs, 1);
        assert_eq!(report.improvement_proofs, 1);
        assert_eq!(report.equality_proofs, 1);

        let results = manager.process(id, prove_bytes).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ZkError::PreconditionViolation(_))));
        assert!(results[2].is_ok());

        let report = manager.status(id).unwrap();
        assert_eq!(report.status, BatchStatus::Completed);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_closed_batch_rejects_requests() {
        let manager = BatchManager::new();
        let id = manager.create();
        manager.process(id, prove_bytes).unwrap();

        let request = ProofRequest::Consistency { sequence: vec![1] };
        assert_eq!(manager.add(id, request), Err(ZkError::InvalidBatchId(id)));
        // Cannot process twice
        assert!(manager.process(id, prove_bytes).is_err());
    }

    #[test]
    fn test_unknown_batch() {
        let manager = BatchManager::new();
        assert_eq!(manager.status(99), Err(ZkError::InvalidBatchId(99)));
        assert_eq!(manager.clear(99), Err(ZkError::InvalidBatchId(99)));
    }

    #[test]
    fn test_ids_are_unique_and_clearable() {
        let manager = BatchManager::new();
        let a = manager.create();
        let b = manager.create();
        assert!(b > a);
        assert_eq!(manager.len(), 2);
        manager.clear(a).unwrap();
        assert!(manager.status(a).is_err());
        assert!(manager.status(b).is_ok());
    }

    #[test]
    fn test_completed_batches_are_bounded() {
        let manager = BatchManager::with_retention(2);
        let ids: Vec<u64> = (0..4).map(|_| manager.create()).collect();
        let open = manager.create();

        for id in &ids {
            manager.process(*id, prove_bytes).unwrap();
        }

        // The two oldest completed batches were released
        assert_eq!(manager.status(ids[0]), Err(ZkError::InvalidBatchId(ids[0])));
        assert!(manager.status(ids[1]).is_err());
        assert!(manager.status(ids[2]).is_ok());
        assert!(manager.status(ids[3]).is_ok());
        // Open batches never count against the bound
        assert_eq!(manager.status(open).unwrap().status, BatchStatus::Open);
        assert_eq!(manager.len(), 3);
    }

    #[test]
    fn test_empty_batch() {
        let manager = BatchManager::new();
        let id = manager.create();
        assert!(manager.process(id, prove_bytes).unwrap().is_empty());
        assert_eq!(manager.status(id).unwrap().status, BatchStatus::Completed);
    }
}
