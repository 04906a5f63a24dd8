//! Pedersen commitments over Ristretto
//!
//! Every statement prover commits to its secret(s) here before building
//! an argument about the committed value.

use std::sync::OnceLock;

use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT,
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use crate::error::{Result, ZkError};

/// Largest secret accepted by the commitment scheme (2^63 - 1).
///
/// Secrets must fit a signed 64-bit integer so that sums of a bounded number
/// of them never leave the range the statement arguments reason about.
pub const MAX_SECRET: u64 = i64::MAX as u64;

/// First generator G (the Ristretto basepoint)
pub fn generator_g() -> RistrettoPoint {
    RISTRETTO_BASEPOINT_POINT
}

/// Second generator H (derived from hashing G)
pub fn generator_h() -> RistrettoPoint {
    static H: OnceLock<RistrettoPoint> = OnceLock::new();
    *H.get_or_init(|| {
        let mut hasher = Sha512::new();
        hasher.update(RISTRETTO_BASEPOINT_POINT.compress().as_bytes());
        hasher.update(b"veil_zk_pedersen_h");
        RistrettoPoint::from_uniform_bytes(&hasher.finalize().into())
    })
}

/// Reject secrets outside `[0, MAX_SECRET]`
pub fn check_domain(value: u64) -> Result<()> {
    if value > MAX_SECRET {
        return Err(ZkError::Domain {
            value,
            max: MAX_SECRET,
        });
    }
    Ok(())
}

/// Decompress a 32-byte point encoding
pub(crate) fn decompress(bytes: &[u8; 32]) -> Option<RistrettoPoint> {
    CompressedRistretto(*bytes).decompress()
}

/// `v*G` for a public integer
pub(crate) fn value_point(value: u64) -> RistrettoPoint {
    generator_g() * Scalar::from(value)
}

/// Fresh uniformly random blinding factor
pub(crate) fn random_blinding() -> Scalar {
    Scalar::random(&mut OsRng)
}

/// Pedersen commitment
///
/// A Pedersen commitment to value `v` with blinding factor `r` is:
/// `C = v*G + r*H`
///
/// where G and H are independent generator points.
///
/// Properties:
/// - **Hiding**: Given C, you cannot determine v
/// - **Binding**: Given C, you cannot find different (v', r') such that C = v'*G + r'*H
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PedersenCommitment {
    /// Compressed point representation
    pub point: [u8; 32],
}

impl PedersenCommitment {
    /// Create a commitment with a specific blinding factor
    pub fn commit_with_blinding(value: u64, blinding: &Scalar) -> Result<Self> {
        check_domain(value)?;
        Ok(Self::from_point(&Self::raw_point(value, blinding)))
    }

    /// `v*G + r*H` without the domain check
    pub(crate) fn raw_point(value: u64, blinding: &Scalar) -> RistrettoPoint {
        value_point(value) + generator_h() * blinding
    }

    /// Compress a point into a commitment
    pub fn from_point(point: &RistrettoPoint) -> Self {
        Self {
            point: point.compress().to_bytes(),
        }
    }

    /// Get the commitment bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        self.point
    }
}

/// `commit(secret, randomness) -> Commitment`
///
/// Deterministic in both arguments; callers supply fresh randomness for
/// hiding.
pub fn commit(secret: u64, randomness: &Scalar) -> Result<PedersenCommitment> {
    PedersenCommitment::commit_with_blinding(secret, randomness)
}
