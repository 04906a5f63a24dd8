//! Membership statement: a committed value belongs to a public ordered set
//!
//! For each element `s_j` the verifier forms `C - s_j*G`; exactly one of these
//! commits to zero, and a 1-of-n OR-proof shows knowledge of its blinding
//! without revealing which. The set order is part of the statement and is
//! bound through its Merkle root.

use curve25519_dalek::ristretto::RistrettoPoint;

use crate::commitment::{check_domain, random_blinding, value_point, PedersenCommitment};
use crate::config::limits;
use crate::error::{Result, ZkError};
use crate::merkle::{Hash, MerkleTree};
use crate::proof::{Proof, PublicInputs, StatementKind};
use crate::sigma::OrProof;
use crate::transcript::Transcript;

use super::statement_transcript;

/// Prove `value` is an element of `set`
pub fn prove_membership(value: u64, set: &[u64]) -> Result<Proof> {
    check_set(set)?;
    check_domain(value)?;
    let index = set
        .iter()
        .position(|s| *s == value)
        .ok_or_else(|| ZkError::precondition("value is not a member of the set"))?;

    let root = MerkleTree::from_values(set)?.root();
    let blinding = random_blinding();
    let commitment = PedersenCommitment::commit_with_blinding(value, &blinding)?;
    let commitments = vec![commitment.to_bytes()];

    let point = PedersenCommitment::raw_point(value, &blinding);
    let branches = branch_points(&point, set);
    let t = transcript(&commitments, &root);
    let argument = OrProof::prove(index, &blinding, &branches, &t)?;

    Proof::new(
        PublicInputs::Membership {
            set: set.to_vec(),
            root,
        },
        commitments,
        &argument,
    )
}

/// Verify a membership proof against the given ordered set
pub fn verify_membership(proof: &Proof, set: &[u64]) -> bool {
    match &proof.public_inputs {
        PublicInputs::Membership { set: embedded, .. } if embedded.as_slice() == set => {
            verify_embedded(proof)
        }
        _ => false,
    }
}

pub(crate) fn verify_embedded(proof: &Proof) -> bool {
    let PublicInputs::Membership { set, root } = &proof.public_inputs else {
        return false;
    };
    if check_set(set).is_err() {
        return false;
    }
    match MerkleTree::from_values(set) {
        Ok(tree) if tree.root() == *root => {}
        _ => return false,
    }
    let Some(points) = proof.commitment_points(1) else {
        return false;
    };
    let Some(argument) = proof.decode_argument::<OrProof>() else {
        return false;
    };

    let branches = branch_points(&points[0], set);
    let t = transcript(&proof.commitments, root);
    argument.verify(&branches, &t)
}

fn check_set(set: &[u64]) -> Result<()> {
    if set.is_empty() {
        return Err(ZkError::InvalidInput("membership set is empty".into()));
    }
    if set.len() > limits::MAX_COMMITMENTS {
        return Err(ZkError::InvalidInput(format!(
            "set of {} elements exceeds limit {}",
            set.len(),
            limits::MAX_COMMITMENTS
        )));
    }
    Ok(())
}

fn branch_points(commitment: &RistrettoPoint, set: &[u64]) -> Vec<RistrettoPoint> {
    set.iter().map(|s| commitment - value_point(*s)).collect()
}

fn transcript(commitments: &[[u8; 32]], root: &Hash) -> Transcript {
    let mut t = statement_transcript(StatementKind::Membership, commitments);
    t.append_message(b"set-root", root);
    t
}
