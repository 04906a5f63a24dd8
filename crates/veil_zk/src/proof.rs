//! Proof envelope and byte codec
//!
//! Every statement produces a [`Proof`]: kind tag, public inputs, embedded
//! commitments and an opaque per-kind argument. The envelope is encoded with
//! bincode so a proof round-trips through bytes unchanged.

use std::fmt;
use std::str::FromStr;

use curve25519_dalek::ristretto::RistrettoPoint;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::commitment::decompress;
use crate::config::limits;
use crate::error::{Result, ZkError};
use crate::metadata::MetadataEnvelope;

/// Current proof encoding version
pub const PROOF_VERSION: u16 = 1;

/// Types of statements the engine can prove
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatementKind {
    /// Value lies in a closed interval
    Range,
    /// Committed value equals a public value
    Equality,
    /// Sum of hidden values reaches a threshold
    Threshold,
    /// Value belongs to a public ordered set
    Membership,
    /// New value strictly exceeds an old one
    Improvement,
    /// Hidden sequence is non-decreasing
    Consistency,
    /// Aggregate of other proofs
    Composite,
    /// Temporal Visual Code freshness proof
    Tvc,
}

impl StatementKind {
    /// The six base statements accepted by batches and the cache
    pub const STATEMENTS: [StatementKind; 6] = [
        StatementKind::Range,
        StatementKind::Equality,
        StatementKind::Threshold,
        StatementKind::Membership,
        StatementKind::Improvement,
        StatementKind::Consistency,
    ];

    /// Lowercase name used at API boundaries
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Range => "range",
            StatementKind::Equality => "equality",
            StatementKind::Threshold => "threshold",
            StatementKind::Membership => "membership",
            StatementKind::Improvement => "improvement",
            StatementKind::Consistency => "consistency",
            StatementKind::Composite => "composite",
            StatementKind::Tvc => "tvc",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementKind {
    type Err = ZkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "range" => Ok(StatementKind::Range),
            "equality" => Ok(StatementKind::Equality),
            "threshold" => Ok(StatementKind::Threshold),
            "membership" => Ok(StatementKind::Membership),
            "improvement" => Ok(StatementKind::Improvement),
            "consistency" => Ok(StatementKind::Consistency),
            "composite" => Ok(StatementKind::Composite),
            "tvc" => Ok(StatementKind::Tvc),
            _ => Err(ZkError::UnsupportedStatementKind(s.to_string())),
        }
    }
}

/// Public parameters of a statement, embedded in its proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublicInputs {
    Range {
        low: u64,
        high: u64,
    },
    Equality {
        target: u64,
        context: Vec<u8>,
    },
    Threshold {
        threshold: u64,
        count: u32,
    },
    Membership {
        set: Vec<u64>,
        root: [u8; 32],
    },
    Improvement {
        old_value: u64,
    },
    Consistency {
        length: u32,
    },
    Tvc {
        /// SHA-256 over the secret and timestamp commitments
        commitment_digest: [u8; 32],
        now: u64,
        tolerance: u64,
    },
}

impl PublicInputs {
    /// Statement kind these inputs belong to
    pub fn kind(&self) -> StatementKind {
        match self {
            PublicInputs::Range { .. } => StatementKind::Range,
            PublicInputs::Equality { .. } => StatementKind::Equality,
            PublicInputs::Threshold { .. } => StatementKind::Threshold,
            PublicInputs::Membership { .. } => StatementKind::Membership,
            PublicInputs::Improvement { .. } => StatementKind::Improvement,
            PublicInputs::Consistency { .. } => StatementKind::Consistency,
            PublicInputs::Tvc { .. } => StatementKind::Tvc,
        }
    }
}

/// A zero-knowledge proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Encoding version
    pub version: u16,
    /// Type of statement
    pub kind: StatementKind,
    /// Public parameters the argument was produced for
    pub public_inputs: PublicInputs,
    /// Compressed commitment points
    pub commitments: Vec<[u8; 32]>,
    /// Encoded statement-specific argument
    pub argument: Vec<u8>,
    /// Optional metadata, outside the cryptographic argument
    pub metadata: Option<MetadataEnvelope>,
}

impl Proof {
    pub(crate) fn new<A: Serialize>(
        public_inputs: PublicInputs,
        commitments: Vec<[u8; 32]>,
        argument: &A,
    ) -> Result<Self> {
        Ok(Self {
            version: PROOF_VERSION,
            kind: public_inputs.kind(),
            public_inputs,
            commitments,
            argument: codec::encode(argument)?,
            metadata: None,
        })
    }

    /// Serialize to canonical bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        codec::encode(self)
    }

    /// Parse and structurally validate proof bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let proof: Proof = codec::decode(bytes, limits::MAX_PROOF_BYTES)?;
        if proof.version != PROOF_VERSION {
            return Err(ZkError::MalformedProof(format!(
                "unsupported version {}",
                proof.version
            )));
        }
        if proof.kind != proof.public_inputs.kind() {
            return Err(ZkError::MalformedProof(format!(
                "kind {} does not match public inputs for {}",
                proof.kind,
                proof.public_inputs.kind()
            )));
        }
        if proof.commitments.len() > limits::MAX_COMMITMENTS {
            return Err(ZkError::MalformedProof(format!(
                "{} commitments exceeds limit {}",
                proof.commitments.len(),
                limits::MAX_COMMITMENTS
            )));
        }
        if let Some(metadata) = &proof.metadata {
            if metadata.byte_size() > limits::MAX_METADATA_BYTES {
                return Err(ZkError::MalformedProof("metadata too large".into()));
            }
        }
        Ok(proof)
    }

    /// Return a copy carrying the given metadata
    pub fn with_metadata(mut self, metadata: MetadataEnvelope) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Decode the statement-specific argument; `None` if it does not parse
    pub(crate) fn decode_argument<A: DeserializeOwned>(&self) -> Option<A> {
        codec::decode(&self.argument, limits::MAX_PROOF_BYTES).ok()
    }

    /// Decompress exactly `expected` embedded commitments
    pub(crate) fn commitment_points(&self, expected: usize) -> Option<Vec<RistrettoPoint>> {
        if self.commitments.len() != expected {
            return None;
        }
        self.commitments.iter().map(decompress).collect()
    }

    /// Summary of the envelope without verifying it
    pub fn info(&self) -> ProofInfo {
        ProofInfo {
            version: self.version,
            kind: self.kind,
            argument_size: self.argument.len(),
            commitment_count: self.commitments.len(),
            has_metadata: self.metadata.is_some(),
        }
    }
}

/// Structural summary of a proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofInfo {
    pub version: u16,
    pub kind: StatementKind,
    pub argument_size: usize,
    pub commitment_count: usize,
    pub has_metadata: bool,
}

/// Bincode helpers shared by every encoded type in the crate
pub(crate) mod codec {
    use super::*;

    pub(crate) fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
        Ok(bincode::serde::encode_to_vec(value, bincode::config::standard())?)
    }

    /// Decode, rejecting oversized input and trailing bytes
    pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8], limit: usize) -> Result<T> {
        if bytes.len() > limit {
            return Err(ZkError::MalformedProof(format!(
                "{} bytes exceeds limit {}",
                bytes.len(),
                limit
            )));
        }
        let (value, consumed) =
            bincode::serde::decode_from_slice::<T, _>(bytes, bincode::config::standard())
                .map_err(|e| ZkError::MalformedProof(e.to_string()))?;
        if consumed != bytes.len() {
            return Err(ZkError::MalformedProof(format!(
                "{} trailing bytes",
                bytes.len() - consumed
            )));
        }
        Ok(value)
    }
}
