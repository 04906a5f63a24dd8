//! Merkle root over an ordered public set
//!
//! Membership statements bind their candidate set into the transcript by
//! root hash, so the proof commits to the exact ordered list of elements.

use sha2::{Digest, Sha256};

use crate::error::{Result, ZkError};

/// Hash type for Merkle tree nodes
pub type Hash = [u8; 32];

/// Merkle tree over a list of leaves
#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// All nodes in the tree (leaves + internal nodes)
    nodes: Vec<Hash>,
    /// Number of leaves
    leaf_count: usize,
}

impl MerkleTree {
    /// Build a tree from raw leaves
    pub fn new(leaves: &[&[u8]]) -> Result<Self> {
        if leaves.is_empty() {
            return Err(ZkError::InvalidInput("Merkle tree needs at least one leaf".into()));
        }

        let mut nodes: Vec<Hash> = leaves.iter().map(|leaf| Self::hash_leaf(leaf)).collect();
        let leaf_count = nodes.len();

        // Pad to power of 2
        nodes.resize(leaf_count.next_power_of_two(), [0u8; 32]);

        let mut level_start = 0;
        let mut level_size = nodes.len();
        while level_size > 1 {
            let next_level: Vec<Hash> = nodes[level_start..level_start + level_size]
                .chunks_exact(2)
                .map(|pair| Self::hash_internal(&pair[0], &pair[1]))
                .collect();
            level_start += level_size;
            level_size = next_level.len();
            nodes.extend(next_level);
        }

        Ok(Self { nodes, leaf_count })
    }

    /// Tree over the little-endian encodings of a set of integers
    pub fn from_values(values: &[u64]) -> Result<Self> {
        let encoded: Vec<[u8; 8]> = values.iter().map(|v| v.to_le_bytes()).collect();
        let leaves: Vec<&[u8]> = encoded.iter().map(|e| e.as_slice()).collect();
        Self::new(&leaves)
    }

    /// Hash a leaf (with domain separator)
    fn hash_leaf(data: &[u8]) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update([0x00]);
        hasher.update(data);
        hasher.finalize().into()
    }

    /// Hash two internal nodes
    fn hash_internal(left: &Hash, right: &Hash) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update([0x01]);
        hasher.update(left);
        hasher.update(right);
        hasher.finalize().into()
    }

    /// Get the root hash
    pub fn root(&self) -> Hash {
        *self.nodes.last().unwrap_or(&[0u8; 32])
    }

    /// Get the number of leaves
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }
}
