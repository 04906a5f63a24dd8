//! Sigma-protocol building blocks
//!
//! All statement arguments are assembled from four non-interactive proofs:
//!
//! - [`BlindingProof`]: Schnorr proof of knowledge of `x` with `P = x*H`
//! - [`OpeningProof`]: knowledge of `(v, r)` with `C = v*G + r*H`
//! - [`OrProof`]: knowledge of `x` with `P_j = x*H` for one hidden index `j`
//! - [`RangeArgument`]: bit decomposition showing a committed value lies in `[0, 2^n)`
//!
//! Challenges come from a caller-supplied [`Transcript`] that already holds the
//! statement's public inputs.

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar, traits::VartimeMultiscalarMul};
use serde::{Deserialize, Serialize};

use crate::commitment::{decompress, generator_g, generator_h, random_blinding, value_point};
use crate::error::{Result, ZkError};
use crate::transcript::Transcript;

/// Parse a canonically encoded scalar
pub(crate) fn canonical_scalar(bytes: &[u8; 32]) -> Option<Scalar> {
    Option::from(Scalar::from_canonical_bytes(*bytes))
}

/// Bits needed so that `[0, 2^n)` contains `width`; at least one
pub fn bits_for_width(width: u64) -> usize {
    (64 - width.leading_zeros() as usize).max(1)
}

/// `2^i` as a scalar, `i < 64`
fn pow2(i: usize) -> Scalar {
    Scalar::from(1u64 << i)
}

/// Schnorr proof of knowledge of `x` such that `P = x*H`
///
/// Used wherever a statement reduces to "this point commits to zero", e.g.
/// `C - b*G` for a commitment `C` to the public value `b`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlindingProof {
    /// R = k*H
    pub commitment: [u8; 32],
    /// s = k + c*x
    pub response: [u8; 32],
}

impl BlindingProof {
    /// Prove knowledge of `secret` with `public = secret*H`
    pub fn prove(secret: &Scalar, public: &RistrettoPoint, transcript: &Transcript) -> Self {
        let h = generator_h();
        let k = random_blinding();
        let r = h * k;
        let r_bytes = r.compress().to_bytes();

        let mut t = transcript.clone();
        t.append_point(b"P", public);
        t.append_point_bytes(b"R", &r_bytes);
        let c = t.challenge_scalar(b"c");

        Self {
            commitment: r_bytes,
            response: (k + c * secret).to_bytes(),
        }
    }

    /// Verify: s*H == R + c*P
    pub fn verify(&self, public: &RistrettoPoint, transcript: &Transcript) -> bool {
        let (Some(r), Some(s)) = (
            decompress(&self.commitment),
            canonical_scalar(&self.response),
        ) else {
            return false;
        };

        let mut t = transcript.clone();
        t.append_point(b"P", public);
        t.append_point_bytes(b"R", &self.commitment);
        let c = t.challenge_scalar(b"c");

        generator_h() * s == r + public * c
    }
}

/// Proof of knowledge of an opening `(v, r)` of `C = v*G + r*H`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpeningProof {
    /// R = k1*G + k2*H
    pub commitment: [u8; 32],
    /// z1 = k1 + c*v
    pub response_value: [u8; 32],
    /// z2 = k2 + c*r
    pub response_blinding: [u8; 32],
}

impl OpeningProof {
    /// Prove knowledge of the opening of `commitment`
    pub fn prove(
        value: &Scalar,
        blinding: &Scalar,
        commitment: &RistrettoPoint,
        transcript: &Transcript,
    ) -> Self {
        let k1 = random_blinding();
        let k2 = random_blinding();
        let r = generator_g() * k1 + generator_h() * k2;
        let r_bytes = r.compress().to_bytes();

        let mut t = transcript.clone();
        t.append_point(b"C", commitment);
        t.append_point_bytes(b"R", &r_bytes);
        let c = t.challenge_scalar(b"c");

        Self {
            commitment: r_bytes,
            response_value: (k1 + c * value).to_bytes(),
            response_blinding: (k2 + c * blinding).to_bytes(),
        }
    }

    /// Verify: z1*G + z2*H == R + c*C
    pub fn verify(&self, commitment: &RistrettoPoint, transcript: &Transcript) -> bool {
        let (Some(r), Some(z1), Some(z2)) = (
            decompress(&self.commitment),
            canonical_scalar(&self.response_value),
            canonical_scalar(&self.response_blinding),
        ) else {
            return false;
        };

        let mut t = transcript.clone();
        t.append_point(b"C", commitment);
        t.append_point_bytes(b"R", &self.commitment);
        let c = t.challenge_scalar(b"c");

        let lhs = RistrettoPoint::vartime_multiscalar_mul([z1, z2], [generator_g(), generator_h()]);
        lhs == r + commitment * c
    }
}

/// Disjunctive (CDS) proof: knowledge of `x` with `publics[j] = x*H` for some `j`
///
/// The simulated branches are indistinguishable from the real one, so the
/// proof does not reveal `j`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrProof {
    /// Per-branch challenges; they sum to the transcript challenge
    pub challenges: Vec<[u8; 32]>,
    /// Per-branch responses
    pub responses: Vec<[u8; 32]>,
}

impl OrProof {
    /// Prove knowledge of `secret` for branch `index`
    pub fn prove(
        index: usize,
        secret: &Scalar,
        publics: &[RistrettoPoint],
        transcript: &Transcript,
    ) -> Result<Self> {
        if index >= publics.len() {
            return Err(ZkError::Crypto(format!(
                "OR-proof branch {} out of {}",
                index,
                publics.len()
            )));
        }

        let h = generator_h();
        let k = random_blinding();
        let mut challenges = vec![Scalar::ZERO; publics.len()];
        let mut responses = vec![Scalar::ZERO; publics.len()];

        let mut t = transcript.clone();
        t.append_u64(b"branches", publics.len() as u64);
        for (j, public) in publics.iter().enumerate() {
            let r = if j == index {
                h * k
            } else {
                challenges[j] = random_blinding();
                responses[j] = random_blinding();
                h * responses[j] - public * challenges[j]
            };
            t.append_point(b"R", &r);
        }
        let c = t.challenge_scalar(b"c");

        let simulated: Scalar = challenges.iter().sum();
        challenges[index] = c - simulated;
        responses[index] = k + challenges[index] * secret;

        Ok(Self {
            challenges: challenges.iter().map(Scalar::to_bytes).collect(),
            responses: responses.iter().map(Scalar::to_bytes).collect(),
        })
    }

    /// Verify against the same branch points used to prove
    pub fn verify(&self, publics: &[RistrettoPoint], transcript: &Transcript) -> bool {
        if self.challenges.len() != publics.len() || self.responses.len() != publics.len() {
            return false;
        }

        let h = generator_h();
        let mut t = transcript.clone();
        t.append_u64(b"branches", publics.len() as u64);

        let mut challenge_sum = Scalar::ZERO;
        for ((c_bytes, s_bytes), public) in self
            .challenges
            .iter()
            .zip(self.responses.iter())
            .zip(publics.iter())
        {
            let (Some(c), Some(s)) = (canonical_scalar(c_bytes), canonical_scalar(s_bytes)) else {
                return false;
            };
            let r = RistrettoPoint::vartime_multiscalar_mul([s, -c], [h, *public]);
            t.append_point(b"R", &r);
            challenge_sum += c;
        }

        challenge_sum == t.challenge_scalar(b"c")
    }
}

/// One committed bit and its proof that it is 0 or 1
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BitCommitment {
    /// C_i = b_i*G + r_i*H
    pub commitment: [u8; 32],
    /// C_i opens to 0 or C_i - G opens to 0
    pub proof: OrProof,
}

/// Proof that a committed value `D = x*G + rho*H` satisfies `0 <= x < 2^n`
///
/// The bit commitments are chosen so that `sum(2^i * C_i) == D`, which the
/// verifier checks alongside every bit proof.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RangeArgument {
    /// Least significant bit first
    pub bits: Vec<BitCommitment>,
}

impl RangeArgument {
    /// Prove `value < 2^n_bits` for the point `value*G + blinding*H`
    pub fn prove(value: u64, blinding: &Scalar, n_bits: usize, transcript: &Transcript) -> Result<Self> {
        if n_bits == 0 || n_bits > 64 {
            return Err(ZkError::Crypto(format!("unsupported bit width {}", n_bits)));
        }
        if n_bits < 64 && value >> n_bits != 0 {
            return Err(ZkError::precondition(format!(
                "value does not fit in {} bits",
                n_bits
            )));
        }

        // r_{n-1} absorbs the remainder so the weighted blinding sum is `blinding`
        let mut blindings: Vec<Scalar> = (0..n_bits - 1).map(|_| random_blinding()).collect();
        let partial: Scalar = blindings
            .iter()
            .enumerate()
            .map(|(i, r)| pow2(i) * r)
            .sum();
        blindings.push((blinding - partial) * pow2(n_bits - 1).invert());

        let g = generator_g();
        let h = generator_h();
        let mut bits = Vec::with_capacity(n_bits);
        for (i, r) in blindings.iter().enumerate() {
            let bit = (value >> i) & 1;
            let point = g * Scalar::from(bit) + h * r;
            let t = Self::bit_transcript(transcript, i, &point);
            let proof = OrProof::prove(bit as usize, r, &[point, point - g], &t)?;
            bits.push(BitCommitment {
                commitment: point.compress().to_bytes(),
                proof,
            });
        }

        Ok(Self { bits })
    }

    /// Verify against the committed point and the expected bit width
    pub fn verify(&self, committed: &RistrettoPoint, n_bits: usize, transcript: &Transcript) -> bool {
        if self.bits.len() != n_bits || n_bits == 0 || n_bits > 64 {
            return false;
        }

        let g = generator_g();
        let mut points = Vec::with_capacity(n_bits);
        for bit in &self.bits {
            match decompress(&bit.commitment) {
                Some(p) => points.push(p),
                None => return false,
            }
        }

        let weights: Vec<Scalar> = (0..n_bits).map(pow2).collect();
        let recomposed = RistrettoPoint::vartime_multiscalar_mul(&weights, &points);
        if recomposed != *committed {
            return false;
        }

        self.bits.iter().zip(points.iter()).enumerate().all(|(i, (bit, point))| {
            let t = Self::bit_transcript(transcript, i, point);
            bit.proof.verify(&[*point, point - g], &t)
        })
    }

    fn bit_transcript(base: &Transcript, index: usize, point: &RistrettoPoint) -> Transcript {
        let mut t = base.clone();
        t.append_u64(b"bit", index as u64);
        t.append_point(b"C", point);
        t
    }
}

/// Proof that a committed value lies in the closed interval `[low, high]`
///
/// Shows `v - low` and `high - v` are both in `[0, 2^n)` with
/// `n = bits_for_width(high - low)`; since the two sum to `high - low`,
/// neither can exceed it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntervalArgument {
    /// Argument over `C - low*G`
    pub lower: RangeArgument,
    /// Argument over `high*G - C`
    pub upper: RangeArgument,
}

impl IntervalArgument {
    /// Prove `low <= value <= high` for `C = value*G + blinding*H`
    pub fn prove(
        value: u64,
        blinding: &Scalar,
        low: u64,
        high: u64,
        transcript: &Transcript,
    ) -> Result<Self> {
        if low > high || value < low || value > high {
            return Err(ZkError::precondition(format!(
                "value not in [{}, {}]",
                low, high
            )));
        }
        let n_bits = bits_for_width(high - low);
        let (lower_t, upper_t) = Self::side_transcripts(transcript, low, high);
        Ok(Self {
            lower: RangeArgument::prove(value - low, blinding, n_bits, &lower_t)?,
            upper: RangeArgument::prove(high - value, &-blinding, n_bits, &upper_t)?,
        })
    }

    /// Verify for the commitment point and public bounds
    pub fn verify(&self, committed: &RistrettoPoint, low: u64, high: u64, transcript: &Transcript) -> bool {
        if low > high {
            return false;
        }
        let n_bits = bits_for_width(high - low);
        let (lower_t, upper_t) = Self::side_transcripts(transcript, low, high);
        let lower_point = committed - value_point(low);
        let upper_point = value_point(high) - committed;
        self.lower.verify(&lower_point, n_bits, &lower_t)
            && self.upper.verify(&upper_point, n_bits, &upper_t)
    }

    fn side_transcripts(base: &Transcript, low: u64, high: u64) -> (Transcript, Transcript) {
        let mut t = base.clone();
        t.append_u64(b"low", low);
        t.append_u64(b"high", high);
        let mut lower = t.clone();
        lower.append_message(b"side", b"lower");
        let mut upper = t;
        upper.append_message(b"side", b"upper");
        (lower, upper)
    }
}
