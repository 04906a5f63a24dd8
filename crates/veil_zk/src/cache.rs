//! Memoizing proof cache
//!
//! Entries are keyed by a [`Fingerprint`] of the statement kind and its
//! canonically encoded parameters, and hold the proof bytes exactly as first
//! produced. A hit returns those bytes without running the prover.
//!
//! Entries expire after the configured TTL; when the cache is full the least
//! recently used entry is evicted.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::CacheConfig;
use crate::error::{Result, ZkError};
use crate::proof::codec;
use crate::request::ProofRequest;

/// Cache key: BLAKE3 over the statement kind and encoded request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Fingerprint a prove request
    pub fn of(request: &ProofRequest) -> Result<Self> {
        let encoded = codec::encode(request)?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"veil_zk/fingerprint/v1");
        hasher.update(request.kind().as_str().as_bytes());
        hasher.update(&(encoded.len() as u64).to_le_bytes());
        hasher.update(&encoded);
        Ok(Self(*hasher.finalize().as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a hex fingerprint
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| ZkError::InvalidCacheKey(s.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ZkError::InvalidCacheKey(s.to_string()))?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

struct CacheEntry {
    bytes: Vec<u8>,
    created_at: Instant,
    /// Milliseconds since the cache epoch
    last_access: AtomicU64,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub max_entries: usize,
}

/// Thread-safe proof cache
pub struct ProofCache {
    config: CacheConfig,
    entries: RwLock<HashMap<Fingerprint, CacheEntry>>,
    epoch: Instant,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ProofCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(HashMap::new()),
            epoch: Instant::now(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn is_live(&self, entry: &CacheEntry) -> bool {
        entry.created_at.elapsed() < self.config.ttl
    }

    /// Look up live bytes, counting a hit or miss
    pub fn get(&self, key: &Fingerprint) -> Option<Vec<u8>> {
        let entries = self.entries.read();
        match entries.get(key) {
            Some(entry) if self.is_live(entry) => {
                entry.last_access.store(self.now_ms(), Ordering::Relaxed);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.bytes.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store bytes; if a live entry already exists it wins and is returned
    pub fn insert(&self, key: Fingerprint, bytes: Vec<u8>) -> Vec<u8> {
        if self.config.max_entries == 0 {
            return bytes;
        }

        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(&key) {
            if self.is_live(existing) {
                return existing.bytes.clone();
            }
        }

        if !entries.contains_key(&key) && entries.len() >= self.config.max_entries {
            let ttl = self.config.ttl;
            entries.retain(|_, e| e.created_at.elapsed() < ttl);
            if entries.len() >= self.config.max_entries {
                if let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.last_access.load(Ordering::Relaxed))
                    .map(|(k, _)| *k)
                {
                    log::trace!("evicting least recently used proof {}", oldest);
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                bytes: bytes.clone(),
                created_at: Instant::now(),
                last_access: AtomicU64::new(self.now_ms()),
            },
        );
        bytes
    }

    /// Return cached bytes for `key`, or compute, store and return them
    ///
    /// The flag is `true` on a hit. Concurrent misses on the same key may
    /// both compute; the first stored result is the one every caller sees.
    pub fn get_or_insert_with<F>(&self, key: Fingerprint, compute: F) -> Result<(Vec<u8>, bool)>
    where
        F: FnOnce() -> Result<Vec<u8>>,
    {
        if let Some(bytes) = self.get(&key) {
            return Ok((bytes, true));
        }
        let bytes = compute()?;
        Ok((self.insert(key, bytes), false))
    }

    /// Bytes of a live entry
    pub fn get_entry(&self, key: &Fingerprint) -> Result<Vec<u8>> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|e| self.is_live(e))
            .map(|e| e.bytes.clone())
            .ok_or_else(|| ZkError::InvalidCacheKey(key.to_hex()))
    }

    /// Remove one entry
    pub fn evict(&self, key: &Fingerprint) -> Result<()> {
        self.entries
            .write()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| ZkError::InvalidCacheKey(key.to_hex()))
    }

    /// Remove all entries and reset counters
    pub fn clear(&self) {
        self.entries.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            max_entries: self.config.max_entries,
        }
    }
}

impl Default for ProofCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
