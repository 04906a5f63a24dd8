//! Equality statement: a committed value equals a public target
//!
//! With `C = a*G + r*H`, the point `C - b*G` equals `r*H` exactly when
//! `a == b`; the argument is a proof of knowledge of that `r`.

use crate::commitment::{check_domain, random_blinding, value_point, PedersenCommitment};
use crate::error::{Result, ZkError};
use crate::proof::{Proof, PublicInputs, StatementKind};
use crate::sigma::BlindingProof;
use crate::transcript::Transcript;

use super::statement_transcript;

/// Prove `a == b` for a hidden `a` and public `b`
pub fn prove_equality(a: u64, b: u64) -> Result<Proof> {
    prove_equality_with_context(a, b, &[])
}

/// Prove `a == b`, binding an application context into the argument
pub fn prove_equality_with_context(a: u64, b: u64, context: &[u8]) -> Result<Proof> {
    check_domain(a)?;
    if a != b {
        return Err(ZkError::precondition("committed value differs from target"));
    }

    let blinding = random_blinding();
    let commitment = PedersenCommitment::commit_with_blinding(a, &blinding)?;
    let commitments = vec![commitment.to_bytes()];

    let residual = PedersenCommitment::raw_point(a, &blinding) - value_point(b);
    let t = transcript(&commitments, b, context);
    let argument = BlindingProof::prove(&blinding, &residual, &t);

    Proof::new(
        PublicInputs::Equality {
            target: b,
            context: context.to_vec(),
        },
        commitments,
        &argument,
    )
}

/// Verify an equality proof without context
pub fn verify_equality(proof: &Proof, b: u64) -> bool {
    verify_equality_with_context(proof, b, &[])
}

/// Verify an equality proof under the given context
pub fn verify_equality_with_context(proof: &Proof, b: u64, context: &[u8]) -> bool {
    match &proof.public_inputs {
        PublicInputs::Equality {
            target,
            context: embedded,
        } if *target == b && embedded.as_slice() == context => verify_embedded(proof),
        _ => false,
    }
}

pub(crate) fn verify_embedded(proof: &Proof) -> bool {
    let PublicInputs::Equality { target, context } = &proof.public_inputs else {
        return false;
    };
    let Some(points) = proof.commitment_points(1) else {
        return false;
    };
    let Some(argument) = proof.decode_argument::<BlindingProof>() else {
        return false;
    };

    let residual = points[0] - value_point(*target);
    let t = transcript(&proof.commitments, *target, context);
    argument.verify(&residual, &t)
}

fn transcript(commitments: &[[u8; 32]], target: u64, context: &[u8]) -> Transcript {
    let mut t = statement_transcript(StatementKind::Equality, commitments);
    t.append_u64(b"target", target);
    t.append_message(b"context", context);
    t
}
