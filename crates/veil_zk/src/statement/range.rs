//! Range statement: a committed value lies in `[low, high]`

use crate::commitment::{check_domain, random_blinding, PedersenCommitment};
use crate::error::{Result, ZkError};
use crate::proof::{Proof, PublicInputs, StatementKind};
use crate::sigma::IntervalArgument;

use super::statement_transcript;

/// Prove `low <= value <= high`
pub fn prove_range(value: u64, low: u64, high: u64) -> Result<Proof> {
    check_domain(value)?;
    if low > high {
        return Err(ZkError::InvalidInput(format!(
            "empty range [{}, {}]",
            low, high
        )));
    }
    if value < low || value > high {
        return Err(ZkError::precondition(format!(
            "value not in [{}, {}]",
            low, high
        )));
    }

    let blinding = random_blinding();
    let commitment = PedersenCommitment::commit_with_blinding(value, &blinding)?;
    let commitments = vec![commitment.to_bytes()];

    let t = statement_transcript(StatementKind::Range, &commitments);
    let argument = IntervalArgument::prove(value, &blinding, low, high, &t)?;

    Proof::new(PublicInputs::Range { low, high }, commitments, &argument)
}

/// Verify a range proof for the given bounds
pub fn verify_range(proof: &Proof, low: u64, high: u64) -> bool {
    match proof.public_inputs {
        PublicInputs::Range { low: l, high: h } if l == low && h == high => verify_embedded(proof),
        _ => false,
    }
}

pub(crate) fn verify_embedded(proof: &Proof) -> bool {
    let PublicInputs::Range { low, high } = proof.public_inputs else {
        return false;
    };
    let Some(points) = proof.commitment_points(1) else {
        return false;
    };
    let Some(argument) = proof.decode_argument::<IntervalArgument>() else {
        return false;
    };

    let t = statement_transcript(StatementKind::Range, &proof.commitments);
    argument.verify(&points[0], low, high, &t)
}
