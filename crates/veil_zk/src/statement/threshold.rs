//! Threshold statement: the sum of hidden values reaches a public threshold
//!
//! Each value is committed separately and shown to lie in the secret domain,
//! which keeps the homomorphic sum far below the group order. The sum minus
//! the threshold is then shown to be a non-negative 64-bit quantity.

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};
use serde::{Deserialize, Serialize};

use crate::commitment::{check_domain, random_blinding, value_point, PedersenCommitment};
use crate::config::limits;
use crate::error::{Result, ZkError};
use crate::proof::{Proof, PublicInputs, StatementKind};
use crate::sigma::RangeArgument;
use crate::transcript::Transcript;

use super::statement_transcript;

/// Bits of the secret domain `[0, 2^63)`
pub(crate) const DOMAIN_BITS: usize = 63;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ThresholdArgument {
    /// One domain argument per committed value
    values: Vec<RangeArgument>,
    /// Argument over `sum(C_i) - threshold*G`
    excess: RangeArgument,
}

/// Prove `sum(values) >= threshold`
pub fn prove_threshold(values: &[u64], threshold: u64) -> Result<Proof> {
    if values.is_empty() {
        return Err(ZkError::InvalidInput(
            "threshold statement needs at least one value".into(),
        ));
    }
    if values.len() > limits::MAX_COMMITMENTS {
        return Err(ZkError::InvalidInput(format!(
            "{} values exceeds limit {}",
            values.len(),
            limits::MAX_COMMITMENTS
        )));
    }
    for v in values {
        check_domain(*v)?;
    }

    let total = values.iter().try_fold(0u64, |acc, v| {
        acc.checked_add(*v)
            .ok_or_else(|| ZkError::Overflow("sum of threshold values exceeds u64".into()))
    })?;
    if total < threshold {
        return Err(ZkError::precondition("sum of values is below the threshold"));
    }

    let blindings: Vec<Scalar> = values.iter().map(|_| random_blinding()).collect();
    let commitments = values
        .iter()
        .zip(blindings.iter())
        .map(|(v, r)| PedersenCommitment::commit_with_blinding(*v, r).map(|c| c.to_bytes()))
        .collect::<Result<Vec<_>>>()?;

    let t = transcript(&commitments, threshold);
    let value_args = values
        .iter()
        .zip(blindings.iter())
        .enumerate()
        .map(|(i, (v, r))| RangeArgument::prove(*v, r, DOMAIN_BITS, &value_transcript(&t, i)))
        .collect::<Result<Vec<_>>>()?;

    let blinding_sum: Scalar = blindings.iter().sum();
    let excess = RangeArgument::prove(total - threshold, &blinding_sum, 64, &excess_transcript(&t))?;

    Proof::new(
        PublicInputs::Threshold {
            threshold,
            count: values.len() as u32,
        },
        commitments,
        &ThresholdArgument {
            values: value_args,
            excess,
        },
    )
}

/// Verify a threshold proof for the given threshold
pub fn verify_threshold(proof: &Proof, threshold: u64) -> bool {
    match proof.public_inputs {
        PublicInputs::Threshold { threshold: t, .. } if t == threshold => verify_embedded(proof),
        _ => false,
    }
}

pub(crate) fn verify_embedded(proof: &Proof) -> bool {
    let PublicInputs::Threshold { threshold, count } = proof.public_inputs else {
        return false;
    };
    if count == 0 {
        return false;
    }
    let Some(points) = proof.commitment_points(count as usize) else {
        return false;
    };
    let Some(argument) = proof.decode_argument::<ThresholdArgument>() else {
        return false;
    };
    if argument.values.len() != points.len() {
        return false;
    }

    let t = transcript(&proof.commitments, threshold);
    let values_ok = argument
        .values
        .iter()
        .zip(points.iter())
        .enumerate()
        .all(|(i, (arg, point))| arg.verify(point, DOMAIN_BITS, &value_transcript(&t, i)));
    if !values_ok {
        return false;
    }

    let sum: RistrettoPoint = points.iter().sum();
    let excess = sum - value_point(threshold);
    argument.excess.verify(&excess, 64, &excess_transcript(&t))
}

fn transcript(commitments: &[[u8; 32]], threshold: u64) -> Transcript {
    let mut t = statement_transcript(StatementKind::Threshold, commitments);
    t.append_u64(b"threshold", threshold);
    t
}

fn value_transcript(base: &Transcript, index: usize) -> Transcript {
    let mut t = base.clone();
    t.append_u64(b"value", index as u64);
    t
}

fn excess_transcript(base: &Transcript) -> Transcript {
    let mut t = base.clone();
    t.append_message(b"part", b"excess");
    t
}
