//! Metadata envelope
//!
//! An insertion-ordered map of UTF-8 keys to opaque byte values carried next
//! to a proof. Metadata is never part of a Fiat-Shamir transcript or a
//! composite tag, so attaching or replacing it leaves verification unchanged.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::limits;
use crate::error::{Result, ZkError};
use crate::proof::Proof;

/// Ordered key/value metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEnvelope {
    entries: IndexMap<String, Vec<u8>>,
}

impl MetadataEnvelope {
    /// Empty envelope
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry; a replaced key keeps its position
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Result<()> {
        let key = key.into();
        let value = value.into();
        let replaced = self
            .entries
            .get(&key)
            .map(|old| key.len() + old.len())
            .unwrap_or(0);
        if self.byte_size() - replaced + key.len() + value.len() > limits::MAX_METADATA_BYTES {
            return Err(ZkError::InvalidInput(format!(
                "metadata exceeds {} bytes",
                limits::MAX_METADATA_BYTES
            )));
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total key and value bytes
    pub fn byte_size(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl TryFrom<Vec<(String, Vec<u8>)>> for MetadataEnvelope {
    type Error = ZkError;

    fn try_from(pairs: Vec<(String, Vec<u8>)>) -> Result<Self> {
        let mut envelope = MetadataEnvelope::new();
        for (key, value) in pairs {
            envelope.insert(key, value)?;
        }
        Ok(envelope)
    }
}

/// Attach metadata to a proof, replacing any already present
pub fn attach_metadata(proof: Proof, metadata: MetadataEnvelope) -> Proof {
    proof.with_metadata(metadata)
}

/// Metadata carried by a proof; empty if none was attached
pub fn extract_metadata(proof: &Proof) -> MetadataEnvelope {
    proof.metadata.clone().unwrap_or_default()
}
