//! Statement provers and verifiers
//!
//! Each sub-module exposes a `prove_*` function that refuses false statements
//! and a `verify_*` function that checks a proof against caller-supplied public
//! parameters. [`verify_embedded`] checks a proof against the public inputs it
//! carries, which is what kind-only dispatch (parallel verification, composite
//! members, proof chains) relies on.

pub mod consistency;
pub mod equality;
pub mod improvement;
pub mod membership;
pub mod range;
pub mod threshold;

pub use consistency::{prove_consistency, verify_consistency};
pub use equality::{
    prove_equality, prove_equality_with_context, verify_equality, verify_equality_with_context,
};
pub use improvement::{prove_improvement, verify_improvement};
pub use membership::{prove_membership, verify_membership};
pub use range::{prove_range, verify_range};
pub use threshold::{prove_threshold, verify_threshold};

use crate::proof::{Proof, PublicInputs, StatementKind};
use crate::transcript::Transcript;

/// Transcript shared by all statements: domain, kind and embedded commitments
pub(crate) fn statement_transcript(kind: StatementKind, commitments: &[[u8; 32]]) -> Transcript {
    let mut t = Transcript::new(b"veil_zk/statement/v1");
    t.append_message(b"kind", kind.as_str().as_bytes());
    t.append_u64(b"commitments", commitments.len() as u64);
    for c in commitments {
        t.append_point_bytes(b"C", c);
    }
    t
}

/// Verify a proof against its own embedded public inputs
pub fn verify_embedded(proof: &Proof) -> bool {
    match proof.public_inputs {
        PublicInputs::Range { .. } => range::verify_embedded(proof),
        PublicInputs::Equality { .. } => equality::verify_embedded(proof),
        PublicInputs::Threshold { .. } => threshold::verify_embedded(proof),
        PublicInputs::Membership { .. } => membership::verify_embedded(proof),
        PublicInputs::Improvement { .. } => improvement::verify_embedded(proof),
        PublicInputs::Consistency { .. } => consistency::verify_embedded(proof),
        PublicInputs::Tvc { .. } => crate::tvc::proof::verify_embedded(proof),
    }
}

/// Verify a proof claimed to be of `kind`; a proof of another kind fails
pub fn verify_as(proof: &Proof, kind: StatementKind) -> bool {
    proof.kind == kind && proof.public_inputs.kind() == kind && verify_embedded(proof)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_as_checks_kind() {
        let proof = prove_range(10, 0, 20).unwrap();
        assert!(verify_as(&proof, StatementKind::Range));
        assert!(!verify_as(&proof, StatementKind::Equality));
        assert!(!verify_as(&proof, StatementKind::Composite));
    }

    #[test]
    fn test_transcript_binds_commitments() {
        let a = statement_transcript(StatementKind::Range, &[[1u8; 32]]);
        let b = statement_transcript(StatementKind::Range, &[[2u8; 32]]);
        let c = statement_transcript(StatementKind::Equality, &[[1u8; 32]]);
        assert_ne!(a.challenge_scalar(b"x"), b.challenge_scalar(b"x"));
        assert_ne!(a.challenge_scalar(b"x"), c.challenge_scalar(b"x"));
    }
}
