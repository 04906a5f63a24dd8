//! Freshness proof for a received TVC code
//!
//! The receiver commits to the decoded secret `s` and timestamp `t`, proves
//! knowledge of the opening of `C_s`, and proves `t` lies in the inclusive
//! window `[now - tolerance, now + tolerance]` (saturating at the `u64` ends).

use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::commitment::{random_blinding, PedersenCommitment};
use crate::error::{Result, ZkError};
use crate::proof::{Proof, PublicInputs, StatementKind};
use crate::sigma::{IntervalArgument, OpeningProof};
use crate::statement::statement_transcript;
use crate::transcript::Transcript;

/// Public inputs of a reception proof
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceptionInputs {
    /// SHA-256 over the secret and timestamp commitments
    pub commitment_digest: [u8; 32],
    /// Verifier's notion of the current time
    pub now: u64,
    /// Allowed distance from `now`, inclusive
    pub tolerance: u64,
}

impl ReceptionInputs {
    /// Inclusive window of accepted timestamps
    pub fn window(&self) -> (u64, u64) {
        window(self.now, self.tolerance)
    }
}

impl From<ReceptionInputs> for PublicInputs {
    fn from(inputs: ReceptionInputs) -> Self {
        PublicInputs::Tvc {
            commitment_digest: inputs.commitment_digest,
            now: inputs.now,
            tolerance: inputs.tolerance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ReceptionArgument {
    opening: OpeningProof,
    window: IntervalArgument,
}

fn window(now: u64, tolerance: u64) -> (u64, u64) {
    (now.saturating_sub(tolerance), now.saturating_add(tolerance))
}

fn commitment_digest(commitments: &[[u8; 32]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"veil_zk/tvc");
    for c in commitments {
        hasher.update(c);
    }
    hasher.finalize().into()
}

fn transcript(commitments: &[[u8; 32]], now: u64, tolerance: u64, part: &[u8]) -> Transcript {
    let mut t = statement_transcript(StatementKind::Tvc, commitments);
    t.append_u64(b"now", now);
    t.append_u64(b"tolerance", tolerance);
    t.append_message(b"part", part);
    t
}

/// Prove knowledge of `(secret, timestamp)` with `|timestamp - now| <= tolerance`
pub fn prove_reception(
    secret: u64,
    timestamp: u64,
    now: u64,
    tolerance: u64,
) -> Result<(Proof, ReceptionInputs)> {
    let (low, high) = window(now, tolerance);
    if timestamp < low || timestamp > high {
        return Err(ZkError::precondition(format!(
            "timestamp outside {} +/- {}",
            now, tolerance
        )));
    }

    let r_s = random_blinding();
    let r_t = random_blinding();
    // Nonces and timestamps span the full u64 range carried by the signal
    let c_s = PedersenCommitment::raw_point(secret, &r_s);
    let c_t = PedersenCommitment::raw_point(timestamp, &r_t);
    let commitments = vec![c_s.compress().to_bytes(), c_t.compress().to_bytes()];

    let opening = OpeningProof::prove(
        &Scalar::from(secret),
        &r_s,
        &c_s,
        &transcript(&commitments, now, tolerance, b"opening"),
    );
    let window = IntervalArgument::prove(
        timestamp,
        &r_t,
        low,
        high,
        &transcript(&commitments, now, tolerance, b"window"),
    )?;

    let inputs = ReceptionInputs {
        commitment_digest: commitment_digest(&commitments),
        now,
        tolerance,
    };
    let proof = Proof::new(
        inputs.into(),
        commitments,
        &ReceptionArgument { opening, window },
    )?;
    Ok((proof, inputs))
}

/// Verify a reception proof against the published inputs
pub fn verify_reception(proof: &Proof, inputs: &ReceptionInputs) -> bool {
    proof.public_inputs == PublicInputs::from(*inputs) && verify_embedded(proof)
}

pub(crate) fn verify_embedded(proof: &Proof) -> bool {
    let PublicInputs::Tvc {
        commitment_digest: digest,
        now,
        tolerance,
    } = proof.public_inputs
    else {
        return false;
    };
    let Some(points) = proof.commitment_points(2) else {
        return false;
    };
    if commitment_digest(&proof.commitments) != digest {
        return false;
    }
    let Some(argument) = proof.decode_argument::<ReceptionArgument>() else {
        return false;
    };

    let (low, high) = window(now, tolerance);
    argument.opening.verify(
        &points[0],
        &transcript(&proof.commitments, now, tolerance, b"opening"),
    ) && argument.window.verify(
        &points[1],
        low,
        high,
        &transcript(&proof.commitments, now, tolerance, b"window"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reception_proof() {
        let (proof, inputs) = prove_reception(12345, 1_000, 1_003, 5).unwrap();
        assert!(verify_reception(&proof, &inputs));
        assert_eq!(inputs.window(), (998, 1_008));
    }

    #[test]
    fn test_boundary_inclusive() {
        let (proof, inputs) = prove_reception(1, 1_010, 1_000, 10).unwrap();
        assert!(verify_reception(&proof, &inputs));
        let (proof, inputs) = prove_reception(1, 990, 1_000, 10).unwrap();
        assert!(verify_reception(&proof, &inputs));
    }

    #[test]
    fn test_outside_tolerance_refused() {
        assert!(matches!(
            prove_reception(1, 1_011, 1_000, 10),
            Err(ZkError::PreconditionViolation(_))
        ));
        assert!(matches!(
            prove_reception(1, 989, 1_000, 10),
            Err(ZkError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_shifted_now_rejected() {
        // A proof at the edge of the window does not verify for a later now
        let (proof, inputs) = prove_reception(1, 1_010, 1_000, 10).unwrap();
        let shifted = ReceptionInputs {
            now: 1_021,
            ..inputs
        };
        assert!(!verify_reception(&proof, &shifted));

        let mut forged = proof.clone();
        forged.public_inputs = shifted.into();
        assert!(!verify_reception(&forged, &shifted));
    }

    #[test]
    fn test_saturating_window() {
        let (proof, inputs) = prove_reception(1, 3, 2, 100).unwrap();
        assert_eq!(inputs.window(), (0, 102));
        assert!(verify_reception(&proof, &inputs));
    }

    #[test]
    fn test_full_u64_secret_and_timestamp() {
        let t = (1u64 << 63) + 5;
        let (proof, inputs) = prove_reception(u64::MAX, t, t, 10).unwrap();
        assert!(verify_reception(&proof, &inputs));

        let (proof, inputs) = prove_reception(1, u64::MAX, u64::MAX - 3, 10).unwrap();
        assert_eq!(inputs.window(), (u64::MAX - 13, u64::MAX));
        assert!(verify_reception(&proof, &inputs));
    }

    #[test]
    fn test_digest_binds_commitments() {
        let (mut proof, inputs) = prove_reception(5, 50, 50, 0).unwrap();
        proof.commitments.swap(0, 1);
        assert!(!verify_reception(&proof, &inputs));
    }
}
