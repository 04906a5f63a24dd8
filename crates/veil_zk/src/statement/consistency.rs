//! Consistency statement: a hidden sequence is non-decreasing
//!
//! The first value is shown to lie in the secret domain and every adjacent
//! difference `C_{i+1} - C_i` to be a non-negative 64-bit quantity. Nothing
//! about the sequence beyond its length is public.

use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};

use crate::commitment::{check_domain, random_blinding, PedersenCommitment};
use crate::config::limits;
use crate::error::{Result, ZkError};
use crate::proof::{Proof, PublicInputs, StatementKind};
use crate::sigma::RangeArgument;
use crate::transcript::Transcript;

use super::statement_transcript;
use super::threshold::DOMAIN_BITS;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConsistencyArgument {
    first: RangeArgument,
    steps: Vec<RangeArgument>,
}

/// Prove that `sequence` is non-decreasing
pub fn prove_consistency(sequence: &[u64]) -> Result<Proof> {
    if sequence.is_empty() {
        return Err(ZkError::InvalidInput("sequence is empty".into()));
    }
    if sequence.len() > limits::MAX_COMMITMENTS {
        return Err(ZkError::InvalidInput(format!(
            "sequence of {} values exceeds limit {}",
            sequence.len(),
            limits::MAX_COMMITMENTS
        )));
    }
    for v in sequence {
        check_domain(*v)?;
    }
    if let Some(i) = sequence.windows(2).position(|w| w[1] < w[0]) {
        return Err(ZkError::precondition(format!(
            "sequence decreases at position {}",
            i + 1
        )));
    }

    let blindings: Vec<Scalar> = sequence.iter().map(|_| random_blinding()).collect();
    let commitments = sequence
        .iter()
        .zip(blindings.iter())
        .map(|(v, r)| PedersenCommitment::commit_with_blinding(*v, r).map(|c| c.to_bytes()))
        .collect::<Result<Vec<_>>>()?;

    let t = statement_transcript(StatementKind::Consistency, &commitments);
    let first = RangeArgument::prove(sequence[0], &blindings[0], DOMAIN_BITS, &part(&t, 0))?;
    let steps = (1..sequence.len())
        .map(|i| {
            RangeArgument::prove(
                sequence[i] - sequence[i - 1],
                &(blindings[i] - blindings[i - 1]),
                64,
                &part(&t, i),
            )
        })
        .collect::<Result<Vec<_>>>()?;

    Proof::new(
        PublicInputs::Consistency {
            length: sequence.len() as u32,
        },
        commitments,
        &ConsistencyArgument { first, steps },
    )
}

/// Verify a consistency proof
pub fn verify_consistency(proof: &Proof) -> bool {
    verify_embedded(proof)
}

pub(crate) fn verify_embedded(proof: &Proof) -> bool {
    let PublicInputs::Consistency { length } = proof.public_inputs else {
        return false;
    };
    if length == 0 {
        return false;
    }
    let Some(points) = proof.commitment_points(length as usize) else {
        return false;
    };
    let Some(argument) = proof.decode_argument::<ConsistencyArgument>() else {
        return false;
    };
    if argument.steps.len() + 1 != points.len() {
        return false;
    }

    let t = statement_transcript(StatementKind::Consistency, &proof.commitments);
    if !argument.first.verify(&points[0], DOMAIN_BITS, &part(&t, 0)) {
        return false;
    }
    argument
        .steps
        .iter()
        .zip(points.windows(2))
        .enumerate()
        .all(|(i, (step, pair))| step.verify(&(pair[1] - pair[0]), 64, &part(&t, i + 1)))
}

fn part(base: &Transcript, index: usize) -> Transcript {
    let mut t = base.clone();
    t.append_u64(b"part", index as u64);
    t
}
