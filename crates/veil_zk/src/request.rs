//! Prove requests as a closed set of statement variants
//!
//! Batches and the proof cache handle statements generically through
//! [`ProofRequest`]: one variant per base statement, each carrying exactly
//! the parameters its prover takes.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{Result, ZkError};
use crate::proof::{Proof, StatementKind};
use crate::statement;

/// A pending prove call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofRequest {
    Range {
        value: u64,
        low: u64,
        high: u64,
    },
    Equality {
        a: u64,
        b: u64,
        context: Vec<u8>,
    },
    Threshold {
        values: Vec<u64>,
        threshold: u64,
    },
    Membership {
        value: u64,
        set: Vec<u64>,
    },
    Improvement {
        old_value: u64,
        new_value: u64,
    },
    Consistency {
        sequence: Vec<u64>,
    },
}

impl ProofRequest {
    /// Statement kind this request proves
    pub fn kind(&self) -> StatementKind {
        match self {
            ProofRequest::Range { .. } => StatementKind::Range,
            ProofRequest::Equality { .. } => StatementKind::Equality,
            ProofRequest::Threshold { .. } => StatementKind::Threshold,
            ProofRequest::Membership { .. } => StatementKind::Membership,
            ProofRequest::Improvement { .. } => StatementKind::Improvement,
            ProofRequest::Consistency { .. } => StatementKind::Consistency,
        }
    }

    /// Reject requests larger than the configured statement limits
    pub fn check_limits(&self, config: &EngineConfig) -> Result<()> {
        let (len, max, what) = match self {
            ProofRequest::Threshold { values, .. } => {
                (values.len(), config.max_threshold_values, "threshold values")
            }
            ProofRequest::Membership { set, .. } => (set.len(), config.max_set_size, "set elements"),
            ProofRequest::Consistency { sequence } => {
                (sequence.len(), config.max_sequence_len, "sequence values")
            }
            _ => return Ok(()),
        };
        if len > max {
            return Err(ZkError::InvalidInput(format!(
                "{} {} exceeds configured limit {}",
                len, what, max
            )));
        }
        Ok(())
    }

    /// Run the statement's prover
    pub fn prove(&self) -> Result<Proof> {
        match self {
            ProofRequest::Range { value, low, high } => statement::prove_range(*value, *low, *high),
            ProofRequest::Equality { a, b, context } => {
                statement::prove_equality_with_context(*a, *b, context)
            }
            ProofRequest::Threshold { values, threshold } => {
                statement::prove_threshold(values, *threshold)
            }
            ProofRequest::Membership { value, set } => statement::prove_membership(*value, set),
            ProofRequest::Improvement {
                old_value,
                new_value,
            } => statement::prove_improvement(*old_value, *new_value),
            ProofRequest::Consistency { sequence } => statement::prove_consistency(sequence),
        }
    }
}
