#![doc = include_str!("../README.md")]
//! # Veil ZK - Zero-Knowledge Statement Proofs
//!
//! Prove facts about secret integers without revealing them, and prove that a
//! Temporal Visual Code was captured recently.
//!
//! ## Features
//!
//! - **Pedersen Commitments**: Hiding and binding commitments over Ristretto
//! - **Statement Proofs**: Range, equality, threshold, membership, improvement, consistency
//! - **Composite Proofs**: Tamper-evident bundles of heterogeneous proofs
//! - **Metadata**: Ordered key/value envelopes that never affect verification
//! - **Proof Cache**: Fingerprint-keyed memoization with TTL and LRU eviction
//! - **Parallel Verification**: Order-preserving verification on the rayon pool
//! - **Batch Sessions**: Queue heterogeneous prove requests and run them together
//! - **TVC**: Brightness-signal codec and freshness proofs for received codes
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         ZkEngine                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Cache  │  Batches  │  Parallel  │  Composite  │  Monitor   │
//! └─────────────────────────────────────────────────────────────┘
//!      │          │           │             │
//!      └──────────┴─── ProofRequest ────────┘
//!                          │
//!   ┌──────────────────────┴──────────────────────┐
//!   │ Statements: range, equality, threshold,     │   TVC: signal codec
//!   │ membership, improvement, consistency        │        reception proof
//!   └──────────────────────┬──────────────────────┘
//!                          │
//!        Sigma protocols: Schnorr, opening, OR, bit-range
//!                          │
//!        Pedersen commitments + Fiat-Shamir transcript
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use veil_zk::{ZkEngine, StatementKind};
//!
//! let engine = ZkEngine::default();
//!
//! // Prove 10 lies in [0, 20] without revealing it
//! let proof = engine.prove_range(10, 0, 20).unwrap();
//! assert!(engine.verify_range(&proof, 0, 20).unwrap());
//!
//! // The prover refuses false statements
//! assert!(engine.prove_range(25, 0, 20).is_err());
//!
//! // Verify several proofs at once, in order
//! let sum = engine.prove_threshold(&[1, 2, 3], 5).unwrap();
//! let results = engine.verify_proofs_parallel(&[
//!     (proof, StatementKind::Range),
//!     (sum, StatementKind::Threshold),
//! ]);
//! assert_eq!(results, vec![true, true]);
//! ```
//!
//! ## Security Considerations
//!
//! - **Secret domain**: secrets must lie in `[0, 2^63)`; sums and differences
//!   of committed values then stay far below the group order
//! - **Cached proofs**: the cache returns byte-identical proofs for repeated
//!   requests, so two cached proofs of the same statement are linkable
//! - **Side-channel attacks**: verification uses variable-time arithmetic on
//!   public data only
//! - **Production use**: Audit before using in production systems

pub mod cache;
pub mod commitment;
pub mod composite;
pub mod config;
pub mod engine;
pub mod error;
pub mod merkle;
pub mod metadata;
pub mod metrics;
pub mod parallel;
pub mod proof;
pub mod request;
pub mod session;
pub mod sigma;
pub mod statement;
pub mod transcript;
pub mod tvc;

// Re-export main types
pub use cache::{CacheStats, Fingerprint, ProofCache};
pub use commitment::{commit, PedersenCommitment, MAX_SECRET};
pub use composite::{compose, validate_proof_chain, verify_composite, CompositeProof, CompositeReport};
pub use config::{CacheConfig, EngineConfig, TvcConfig};
pub use engine::ZkEngine;
pub use error::{Result, ZkError};
pub use metadata::{attach_metadata, extract_metadata, MetadataEnvelope};
pub use metrics::{BenchmarkReport, Operation, OperationMetrics, PerformanceMetrics, PerformanceMonitor};
pub use parallel::{verify_proof, verify_proofs_parallel, verify_proofs_parallel_detailed};
pub use proof::{Proof, ProofInfo, PublicInputs, StatementKind};
pub use request::ProofRequest;
pub use session::{BatchManager, BatchReport, BatchStatus};
pub use statement::{
    prove_consistency, prove_equality, prove_equality_with_context, prove_improvement,
    prove_membership, prove_range, prove_threshold, verify_consistency, verify_equality,
    verify_equality_with_context, verify_improvement, verify_membership, verify_range,
    verify_threshold,
};
pub use tvc::{prove_reception, verify_reception, ReceptionInputs, TvcCodec};
