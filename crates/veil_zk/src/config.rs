//! Configuration for the proof engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Hard limits applied when parsing or accepting untrusted input.
pub mod limits {
    /// Maximum size (in bytes) accepted for a single serialized `Proof`.
    pub const MAX_PROOF_BYTES: usize = 1024 * 1024;

    /// Maximum size (in bytes) accepted for a serialized `CompositeProof`.
    pub const MAX_COMPOSITE_PROOF_BYTES: usize = 4 * 1024 * 1024;

    /// Maximum total size of keys and values in one metadata envelope.
    pub const MAX_METADATA_BYTES: usize = 64 * 1024;

    /// Maximum number of commitments a proof may embed.
    pub const MAX_COMMITMENTS: usize = 4096;

    /// Highest frame rate the TVC codec encodes or decodes at.
    pub const MAX_TVC_FPS: u32 = 1000;
}

/// Main configuration for a `ZkEngine`.
///
/// Aggregates the cache and TVC settings together with the statement size
/// limits enforced at prove time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Proof cache settings.
    pub cache: CacheConfig,
    /// Temporal Visual Code modulation settings.
    pub tvc: TvcConfig,
    /// Whether prove/verify calls are timed from the start.
    pub monitoring_enabled: bool,
    /// Largest public set accepted by a membership statement.
    pub max_set_size: usize,
    /// Longest sequence accepted by a consistency statement.
    pub max_sequence_len: usize,
    /// Most values accepted by a threshold statement.
    pub max_threshold_values: usize,
    /// Completed batches kept for status queries before the oldest is released.
    pub max_completed_batches: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            tvc: TvcConfig::default(),
            monitoring_enabled: true,
            max_set_size: 1024,
            max_sequence_len: 1024,
            max_threshold_values: 256,
            max_completed_batches: 256,
        }
    }
}

impl EngineConfig {
    /// Small cache and tight statement limits for constrained devices.
    pub fn low_memory() -> Self {
        Self {
            cache: CacheConfig {
                max_entries: 64,
                ttl: Duration::from_secs(300),
            },
            tvc: TvcConfig::default(),
            monitoring_enabled: false,
            max_set_size: 128,
            max_sequence_len: 128,
            max_threshold_values: 32,
            max_completed_batches: 16,
        }
    }

    /// Large cache for servers proving many repeated statements.
    pub fn high_throughput() -> Self {
        Self {
            cache: CacheConfig {
                max_entries: 100_000,
                ttl: Duration::from_secs(6 * 3600),
            },
            tvc: TvcConfig::default(),
            monitoring_enabled: true,
            max_set_size: 4096,
            max_sequence_len: 4096,
            max_threshold_values: 1024,
            max_completed_batches: 4096,
        }
    }
}

/// Configuration for the in-process proof cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entries kept before the least recently used one is evicted.
    pub max_entries: usize,
    /// Lifetime of an entry; older entries count as misses.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Modulation parameters of the Temporal Visual Code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvcConfig {
    /// Symbols (bits) transmitted per second; each symbol spans
    /// `max(1, fps / symbol_rate_hz)` frames.
    pub symbol_rate_hz: u32,
    /// Brightness of a `1` symbol.
    pub high_level: f32,
    /// Brightness of a `0` symbol.
    pub low_level: f32,
    /// Mean brightness above which a symbol decodes as `1`.
    pub decision_threshold: f32,
}

impl Default for TvcConfig {
    fn default() -> Self {
        Self {
            symbol_rate_hz: 10,
            high_level: 0.8,
            low_level: 0.2,
            decision_threshold: 0.5,
        }
    }
}

impl TvcConfig {
    /// Frames spent on one symbol at the given frame rate.
    pub fn frames_per_symbol(&self, fps: u32) -> usize {
        let rate = self.symbol_rate_hz.max(1);
        (fps / rate).max(1) as usize
    }
}
