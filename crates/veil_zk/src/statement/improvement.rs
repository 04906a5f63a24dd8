//! Improvement statement: a hidden new value strictly exceeds a public old one

use crate::commitment::{check_domain, generator_g, random_blinding, value_point, PedersenCommitment};
use crate::error::{Result, ZkError};
use crate::proof::{Proof, PublicInputs, StatementKind};
use crate::sigma::RangeArgument;
use crate::transcript::Transcript;

use super::statement_transcript;

/// Prove `new_value > old_value`
pub fn prove_improvement(old_value: u64, new_value: u64) -> Result<Proof> {
    check_domain(old_value)?;
    check_domain(new_value)?;
    if new_value <= old_value {
        return Err(ZkError::precondition(format!(
            "new value does not exceed {}",
            old_value
        )));
    }

    let blinding = random_blinding();
    let commitment = PedersenCommitment::commit_with_blinding(new_value, &blinding)?;
    let commitments = vec![commitment.to_bytes()];

    // C - (old+1)*G commits to new - old - 1 >= 0
    let t = transcript(&commitments, old_value);
    let argument = RangeArgument::prove(new_value - old_value - 1, &blinding, 64, &t)?;

    Proof::new(PublicInputs::Improvement { old_value }, commitments, &argument)
}

/// Verify an improvement proof over the given old value
pub fn verify_improvement(proof: &Proof, old_value: u64) -> bool {
    match proof.public_inputs {
        PublicInputs::Improvement { old_value: o } if o == old_value => verify_embedded(proof),
        _ => false,
    }
}

pub(crate) fn verify_embedded(proof: &Proof) -> bool {
    let PublicInputs::Improvement { old_value } = proof.public_inputs else {
        return false;
    };
    let Some(points) = proof.commitment_points(1) else {
        return false;
    };
    let Some(argument) = proof.decode_argument::<RangeArgument>() else {
        return false;
    };

    let gap = points[0] - value_point(old_value) - generator_g();
    argument.verify(&gap, 64, &transcript(&proof.commitments, old_value))
}

fn transcript(commitments: &[[u8; 32]], old_value: u64) -> Transcript {
    let mut t = statement_transcript(StatementKind::Improvement, commitments);
    t.append_u64(b"old", old_value);
    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_improvement_proof() {
        let proof = prove_improvement(1, 2).unwrap();
        assert!(verify_improvement(&proof, 1));
        assert!(!verify_improvement(&proof, 2));
        assert!(!verify_improvement(&proof, 0));
    }

    #[test]
    fn test_improvement_refused() {
        assert!(matches!(
            prove_improvement(2, 1),
            Err(ZkError::PreconditionViolation(_))
        ));
        assert!(matches!(
            prove_improvement(5, 5),
            Err(ZkError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_large_gap() {
        let proof = prove_improvement(0, crate::commitment::MAX_SECRET).unwrap();
        assert!(verify_improvement(&proof, 0));
    }

    #[test]
    fn test_lowered_old_value_in_proof() {
        // Claiming a higher baseline than proven must fail
        let mut proof = prove_improvement(10, 20).unwrap();
        proof.public_inputs = PublicInputs::Improvement { old_value: 25 };
        assert!(!verify_improvement(&proof, 25));
    }
}
