//! Error types for ZK operations

use thiserror::Error;

/// Result type for ZK operations
pub type Result<T> = std::result::Result<T, ZkError>;

/// ZK proof errors
///
/// Verification never reports a cryptographically failing proof through this
/// type; that is an `Ok(false)`. Errors are reserved for refused statements,
/// unparseable input and references to resources that do not exist.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ZkError {
    /// Value outside the accepted numeric domain
    #[error("Value {value} outside accepted domain [0, {max}]")]
    Domain { value: u64, max: u64 },

    /// The statement is false for the supplied witness; no proof is produced
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    /// Arithmetic overflow in an aggregate computation
    #[error("Integer overflow: {0}")]
    Overflow(String),

    /// Proof bytes could not be parsed
    #[error("Malformed proof: {0}")]
    MalformedProof(String),

    /// Unknown batch, or a batch that is no longer accepting the operation
    #[error("Invalid batch id {0}")]
    InvalidBatchId(u64),

    /// Fingerprint with no cache entry
    #[error("No cache entry for key {0}")]
    InvalidCacheKey(String),

    /// Unknown proof-type name
    #[error("Unsupported statement kind: {0}")]
    UnsupportedStatementKind(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// TVC frame sequence could not be decoded
    #[error("Malformed signal: {0}")]
    MalformedSignal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Cryptographic error
    #[error("Cryptographic error: {0}")]
    Crypto(String),
}

impl ZkError {
    /// Shorthand for a refused statement
    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        ZkError::PreconditionViolation(msg.into())
    }
}

impl From<bincode::error::EncodeError> for ZkError {
    fn from(e: bincode::error::EncodeError) -> Self {
        ZkError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for ZkError {
    fn from(e: serde_json::Error) -> Self {
        ZkError::Serialization(e.to_string())
    }
}
