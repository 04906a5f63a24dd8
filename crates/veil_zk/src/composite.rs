//! Composite proofs
//!
//! A composite bundles an ordered list of proofs with an integrity tag over
//! their canonical encodings. It verifies only if the tag matches and every
//! member verifies under its own statement kind.
//!
//! ## Example
//!
//! ```rust
//! use veil_zk::{compose, verify_composite, prove_equality, prove_range};
//!
//! let members = vec![
//!     prove_range(10, 0, 20).unwrap(),
//!     prove_equality(42, 42).unwrap(),
//! ];
//! let composite = compose(&members).unwrap();
//! assert!(verify_composite(&composite));
//! ```

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Instant;
use subtle::ConstantTimeEq;

use crate::config::limits;
use crate::error::{Result, ZkError};
use crate::metadata::MetadataEnvelope;
use crate::proof::{codec, Proof, StatementKind, PROOF_VERSION};
use crate::statement::verify_embedded;

/// Ordered bundle of member proofs with an aggregate tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeProof {
    /// Encoding version
    pub version: u16,
    /// Canonical bytes of each member, in order
    members: Vec<Vec<u8>>,
    /// SHA-256 over the member count and each length-prefixed member
    tag: [u8; 32],
    /// Optional metadata; not covered by the tag
    pub metadata: Option<MetadataEnvelope>,
}

impl CompositeProof {
    /// Number of member proofs
    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The aggregate tag
    pub fn tag(&self) -> &[u8; 32] {
        &self.tag
    }

    /// Canonical bytes of each member
    pub fn member_bytes(&self) -> &[Vec<u8>] {
        &self.members
    }

    /// Parse every member
    pub fn members(&self) -> Result<Vec<Proof>> {
        self.members.iter().map(|m| Proof::from_bytes(m)).collect()
    }

    /// Return a copy carrying the given metadata
    pub fn with_metadata(mut self, metadata: MetadataEnvelope) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Check only the aggregate tag
    pub fn tag_matches(&self) -> bool {
        compute_tag(&self.members)[..].ct_eq(&self.tag[..]).into()
    }

    /// Tag check plus every member, reported per item
    pub fn verify_detailed(&self) -> Vec<Result<bool>> {
        self.members
            .par_iter()
            .map(|bytes| Proof::from_bytes(bytes).map(|p| verify_embedded(&p)))
            .collect()
    }

    /// Verify with a summary of the member results
    pub fn verify_report(&self) -> CompositeReport {
        let start = Instant::now();
        let tag_valid = self.tag_matches();
        let results = self.verify_detailed();

        let valid_count = results.iter().filter(|r| matches!(r, Ok(true))).count();
        let invalid_count = results.iter().filter(|r| matches!(r, Ok(false))).count();
        let error_count = results.iter().filter(|r| r.is_err()).count();

        CompositeReport {
            all_valid: tag_valid && !results.is_empty() && valid_count == results.len(),
            tag_valid,
            valid_count,
            invalid_count,
            error_count,
            total_count: results.len(),
            verification_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        codec::encode(self)
    }

    /// Parse composite bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let composite: CompositeProof = codec::decode(bytes, limits::MAX_COMPOSITE_PROOF_BYTES)?;
        if composite.version != PROOF_VERSION {
            return Err(ZkError::MalformedProof(format!(
                "unsupported composite version {}",
                composite.version
            )));
        }
        Ok(composite)
    }
}

/// Outcome of verifying a composite
#[derive(Debug, Clone)]
pub struct CompositeReport {
    /// Tag matches and every member verified
    pub all_valid: bool,
    /// Aggregate tag matches the members
    pub tag_valid: bool,
    pub valid_count: usize,
    pub invalid_count: usize,
    /// Members that could not be parsed
    pub error_count: usize,
    pub total_count: usize,
    /// Time taken to verify (milliseconds)
    pub verification_time_ms: u64,
}

fn compute_tag(members: &[Vec<u8>]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"veil_zk/composite");
    hasher.update((members.len() as u64).to_le_bytes());
    for member in members {
        hasher.update((member.len() as u64).to_le_bytes());
        hasher.update(member);
    }
    hasher.finalize().into()
}

/// Bundle proofs into a composite; member metadata is kept as encoded
pub fn compose(proofs: &[Proof]) -> Result<CompositeProof> {
    if proofs.is_empty() {
        return Err(ZkError::InvalidInput("cannot compose zero proofs".into()));
    }
    let members = proofs
        .iter()
        .map(Proof::to_bytes)
        .collect::<Result<Vec<_>>>()?;
    let total: usize = members.iter().map(Vec::len).sum();
    if total > limits::MAX_COMPOSITE_PROOF_BYTES {
        return Err(ZkError::InvalidInput(format!(
            "composite of {} bytes exceeds limit {}",
            total,
            limits::MAX_COMPOSITE_PROOF_BYTES
        )));
    }

    let tag = compute_tag(&members);
    Ok(CompositeProof {
        version: PROOF_VERSION,
        members,
        tag,
        metadata: None,
    })
}

/// True iff the tag matches and every member verifies
pub fn verify_composite(composite: &CompositeProof) -> bool {
    if composite.is_empty() || !composite.tag_matches() {
        return false;
    }
    composite
        .verify_detailed()
        .into_iter()
        .all(|r| matches!(r, Ok(true)))
}

/// Verify each proof under its own kind; all must pass
pub fn validate_proof_chain(proofs: &[Proof]) -> bool {
    proofs
        .par_iter()
        .all(|p| p.kind != StatementKind::Composite && verify_embedded(p))
}
