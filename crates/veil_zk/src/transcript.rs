//! Fiat-Shamir transcript
//!
//! Messages are absorbed with a label and a length prefix so that distinct
//! message sequences never hash to the same input.

use curve25519_dalek::{ristretto::RistrettoPoint, scalar::Scalar};
use sha2::{Digest, Sha512};

/// Hash-based transcript producing challenge scalars
#[derive(Clone)]
pub struct Transcript {
    hasher: Sha512,
}

impl Transcript {
    /// Start a transcript under a protocol domain label
    pub fn new(domain: &[u8]) -> Self {
        let mut transcript = Self {
            hasher: Sha512::new(),
        };
        transcript.append_message(b"dom-sep", domain);
        transcript
    }

    /// Absorb a labelled message
    pub fn append_message(&mut self, label: &[u8], message: &[u8]) {
        self.hasher.update((label.len() as u64).to_le_bytes());
        self.hasher.update(label);
        self.hasher.update((message.len() as u64).to_le_bytes());
        self.hasher.update(message);
    }

    /// Absorb a labelled integer
    pub fn append_u64(&mut self, label: &[u8], value: u64) {
        self.append_message(label, &value.to_le_bytes());
    }

    /// Absorb a compressed point encoding
    pub fn append_point_bytes(&mut self, label: &[u8], point: &[u8; 32]) {
        self.append_message(label, point);
    }

    /// Absorb a point
    pub fn append_point(&mut self, label: &[u8], point: &RistrettoPoint) {
        self.append_message(label, point.compress().as_bytes());
    }

    /// Derive a challenge scalar; the transcript itself is left untouched
    pub fn challenge_scalar(&self, label: &[u8]) -> Scalar {
        let mut hasher = self.hasher.clone();
        hasher.update((label.len() as u64).to_le_bytes());
        hasher.update(label);
        let wide: [u8; 64] = hasher.finalize().into();
        Scalar::from_bytes_mod_order_wide(&wide)
    }
}
