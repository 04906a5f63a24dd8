//! The proof engine facade
//!
//! [`ZkEngine`] owns the configuration, proof cache, batch sessions and
//! performance monitor, and exposes every operation over encoded proof bytes.
//! It is `Sync`; share it behind an `Arc` to use it from several threads.

use log::{debug, trace};
use rand::Rng;
use rayon::prelude::*;

use crate::cache::{CacheStats, Fingerprint, ProofCache};
use crate::composite::{self, CompositeProof};
use crate::config::EngineConfig;
use crate::error::{Result, ZkError};
use crate::metadata::MetadataEnvelope;
use crate::metrics::{run_benchmark, BenchmarkReport, Operation, PerformanceMetrics, PerformanceMonitor};
use crate::parallel;
use crate::proof::{Proof, ProofInfo, StatementKind};
use crate::request::ProofRequest;
use crate::session::{BatchManager, BatchReport};
use crate::statement;
use crate::tvc::{self, ReceptionInputs, TvcCodec};

/// Zero-knowledge proof engine
pub struct ZkEngine {
    config: EngineConfig,
    cache: ProofCache,
    monitor: PerformanceMonitor,
    batches: BatchManager,
    codec: TvcCodec,
}

impl ZkEngine {
    /// Create an engine with the given configuration
    pub fn new(config: EngineConfig) -> Self {
        Self {
            cache: ProofCache::new(config.cache.clone()),
            monitor: PerformanceMonitor::new(config.monitoring_enabled),
            batches: BatchManager::with_retention(config.max_completed_batches),
            codec: TvcCodec::new(config.tvc.clone()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- generic prove / verify ----

    /// Prove a request and encode the proof
    pub fn prove(&self, request: &ProofRequest) -> Result<Vec<u8>> {
        request.check_limits(&self.config)?;
        let kind = request.kind();
        debug!("proving {} statement", kind);
        self.monitor
            .time(kind, Operation::Prove, || request.prove()?.to_bytes())
    }

    /// Prove through the cache; repeated identical requests return identical bytes
    pub fn prove_cached(&self, request: &ProofRequest) -> Result<Vec<u8>> {
        request.check_limits(&self.config)?;
        let key = Fingerprint::of(request)?;
        let (bytes, hit) = self.cache.get_or_insert_with(key, || self.prove(request))?;
        if hit {
            trace!("cache hit for {} proof {}", request.kind(), key);
            self.monitor.record_cache_hit();
        } else {
            trace!("cache miss for {} proof {}", request.kind(), key);
            self.monitor.record_cache_miss();
        }
        Ok(bytes)
    }

    /// Verify encoded proof bytes claimed to be of `kind`
    pub fn verify(&self, proof: &[u8], kind: StatementKind) -> Result<bool> {
        self.monitor.time(kind, Operation::Verify, || {
            let valid = parallel::verify_proof(proof, kind)?;
            trace!("{} proof verified: {}", kind, valid);
            Ok(valid)
        })
    }

    /// Parse, check the caller's public parameters with `check`, and record the call
    fn verify_with<F>(&self, proof: &[u8], kind: StatementKind, check: F) -> Result<bool>
    where
        F: FnOnce(&Proof) -> bool,
    {
        self.monitor.time(kind, Operation::Verify, || {
            let proof = Proof::from_bytes(proof)?;
            let valid = check(&proof);
            trace!("{} proof verified: {}", kind, valid);
            Ok(valid)
        })
    }

    // ---- range ----

    pub fn prove_range(&self, value: u64, low: u64, high: u64) -> Result<Vec<u8>> {
        self.prove(&ProofRequest::Range { value, low, high })
    }

    pub fn prove_range_cached(&self, value: u64, low: u64, high: u64) -> Result<Vec<u8>> {
        self.prove_cached(&ProofRequest::Range { value, low, high })
    }

    pub fn verify_range(&self, proof: &[u8], low: u64, high: u64) -> Result<bool> {
        self.verify_with(proof, StatementKind::Range, |p| {
            statement::verify_range(p, low, high)
        })
    }

    // ---- equality ----

    pub fn prove_equality(&self, a: u64, b: u64) -> Result<Vec<u8>> {
        self.prove_equality_with_context(a, b, &[])
    }

    pub fn prove_equality_with_context(&self, a: u64, b: u64, context: &[u8]) -> Result<Vec<u8>> {
        self.prove(&ProofRequest::Equality {
            a,
            b,
            context: context.to_vec(),
        })
    }

    pub fn prove_equality_cached(&self, a: u64, b: u64) -> Result<Vec<u8>> {
        self.prove_cached(&ProofRequest::Equality {
            a,
            b,
            context: Vec::new(),
        })
    }

    pub fn verify_equality(&self, proof: &[u8], b: u64) -> Result<bool> {
        self.verify_equality_with_context(proof, b, &[])
    }

    pub fn verify_equality_with_context(&self, proof: &[u8], b: u64, context: &[u8]) -> Result<bool> {
        self.verify_with(proof, StatementKind::Equality, |p| {
            statement::verify_equality_with_context(p, b, context)
        })
    }

    // ---- threshold ----

    pub fn prove_threshold(&self, values: &[u64], threshold: u64) -> Result<Vec<u8>> {
        self.prove(&ProofRequest::Threshold {
            values: values.to_vec(),
            threshold,
        })
    }

    pub fn prove_threshold_cached(&self, values: &[u64], threshold: u64) -> Result<Vec<u8>> {
        self.prove_cached(&ProofRequest::Threshold {
            values: values.to_vec(),
            threshold,
        })
    }

    pub fn verify_threshold(&self, proof: &[u8], threshold: u64) -> Result<bool> {
        self.verify_with(proof, StatementKind::Threshold, |p| {
            statement::verify_threshold(p, threshold)
        })
    }

    // ---- membership ----

    pub fn prove_membership(&self, value: u64, set: &[u64]) -> Result<Vec<u8>> {
        self.prove(&ProofRequest::Membership {
            value,
            set: set.to_vec(),
        })
    }

    pub fn prove_membership_cached(&self, value: u64, set: &[u64]) -> Result<Vec<u8>> {
        self.prove_cached(&ProofRequest::Membership {
            value,
            set: set.to_vec(),
        })
    }

    pub fn verify_membership(&self, proof: &[u8], set: &[u64]) -> Result<bool> {
        self.verify_with(proof, StatementKind::Membership, |p| {
            statement::verify_membership(p, set)
        })
    }

    // ---- improvement ----

    pub fn prove_improvement(&self, old_value: u64, new_value: u64) -> Result<Vec<u8>> {
        self.prove(&ProofRequest::Improvement {
            old_value,
            new_value,
        })
    }

    pub fn prove_improvement_cached(&self, old_value: u64, new_value: u64) -> Result<Vec<u8>> {
        self.prove_cached(&ProofRequest::Improvement {
            old_value,
            new_value,
        })
    }

    pub fn verify_improvement(&self, proof: &[u8], old_value: u64) -> Result<bool> {
        self.verify_with(proof, StatementKind::Improvement, |p| {
            statement::verify_improvement(p, old_value)
        })
    }

    // ---- consistency ----

    pub fn prove_consistency(&self, sequence: &[u64]) -> Result<Vec<u8>> {
        self.prove(&ProofRequest::Consistency {
            sequence: sequence.to_vec(),
        })
    }

    pub fn prove_consistency_cached(&self, sequence: &[u64]) -> Result<Vec<u8>> {
        self.prove_cached(&ProofRequest::Consistency {
            sequence: sequence.to_vec(),
        })
    }

    pub fn verify_consistency(&self, proof: &[u8]) -> Result<bool> {
        self.verify_with(proof, StatementKind::Consistency, statement::verify_consistency)
    }

    // ---- metadata, composition, inspection ----

    /// Attach metadata, replacing any already present
    pub fn attach_metadata(&self, proof: &[u8], metadata: MetadataEnvelope) -> Result<Vec<u8>> {
        Proof::from_bytes(proof)?.with_metadata(metadata).to_bytes()
    }

    /// Metadata carried by a proof; empty if none
    pub fn extract_metadata(&self, proof: &[u8]) -> Result<MetadataEnvelope> {
        Ok(crate::metadata::extract_metadata(&Proof::from_bytes(proof)?))
    }

    /// Bundle encoded proofs into an encoded composite
    pub fn compose(&self, proofs: &[Vec<u8>]) -> Result<Vec<u8>> {
        let parsed = proofs
            .iter()
            .map(|p| Proof::from_bytes(p))
            .collect::<Result<Vec<_>>>()?;
        debug!("composing {} proofs", parsed.len());
        composite::compose(&parsed)?.to_bytes()
    }

    pub fn verify_composite(&self, composite: &[u8]) -> Result<bool> {
        self.verify(composite, StatementKind::Composite)
    }

    /// Every proof verifies under its own kind; malformed proofs fail the chain
    pub fn validate_proof_chain(&self, proofs: &[Vec<u8>]) -> bool {
        let parsed: Result<Vec<Proof>> = proofs.iter().map(|p| Proof::from_bytes(p)).collect();
        match parsed {
            Ok(parsed) => composite::validate_proof_chain(&parsed),
            Err(e) => {
                debug!("proof chain rejected: {}", e);
                false
            }
        }
    }

    /// Structural summary of a proof or composite
    pub fn get_proof_info(&self, proof: &[u8]) -> Result<ProofInfo> {
        match Proof::from_bytes(proof) {
            Ok(p) => Ok(p.info()),
            Err(e) => {
                let composite = CompositeProof::from_bytes(proof).map_err(|_| e)?;
                Ok(ProofInfo {
                    version: composite.version,
                    kind: StatementKind::Composite,
                    argument_size: composite.member_bytes().iter().map(Vec::len).sum(),
                    commitment_count: 0,
                    has_metadata: composite.metadata.is_some(),
                })
            }
        }
    }

    // ---- parallel verification ----

    /// Verify items concurrently; malformed items report `false`
    pub fn verify_proofs_parallel(&self, items: &[(Vec<u8>, StatementKind)]) -> Vec<bool> {
        items
            .par_iter()
            .map(|(bytes, kind)| matches!(self.verify(bytes, *kind), Ok(true)))
            .collect()
    }

    /// Verify items concurrently, keeping parse errors per item
    pub fn verify_proofs_parallel_detailed(&self, items: &[(Vec<u8>, StatementKind)]) -> Vec<Result<bool>> {
        items
            .par_iter()
            .map(|(bytes, kind)| self.verify(bytes, *kind))
            .collect()
    }

    /// `Ok(())` if all items verify, else the lowest failing index
    pub fn verify_all_or_first_failure(
        &self,
        items: &[(Vec<u8>, StatementKind)],
    ) -> std::result::Result<(), usize> {
        parallel::first_failure_with(items, |bytes, kind| self.verify(bytes, kind))
    }

    // ---- cache ----

    pub fn clear_cache(&self) {
        debug!("clearing proof cache");
        self.cache.clear();
    }

    pub fn get_cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Cached bytes for a fingerprint
    pub fn get_cache_entry(&self, key: &Fingerprint) -> Result<Vec<u8>> {
        self.cache.get_entry(key)
    }

    pub fn evict_cache_entry(&self, key: &Fingerprint) -> Result<()> {
        self.cache.evict(key)
    }

    // ---- batches ----

    pub fn create_proof_batch(&self) -> u64 {
        self.batches.create()
    }

    /// Queue any request on an open batch
    pub fn batch_add(&self, batch_id: u64, request: ProofRequest) -> Result<()> {
        self.batches.add(batch_id, request)
    }

    pub fn batch_add_range_proof(&self, batch_id: u64, value: u64, low: u64, high: u64) -> Result<()> {
        self.batch_add(batch_id, ProofRequest::Range { value, low, high })
    }

    pub fn batch_add_equality_proof(&self, batch_id: u64, a: u64, b: u64) -> Result<()> {
        self.batch_add(
            batch_id,
            ProofRequest::Equality {
                a,
                b,
                context: Vec::new(),
            },
        )
    }

    pub fn batch_add_threshold_proof(&self, batch_id: u64, values: &[u64], threshold: u64) -> Result<()> {
        self.batch_add(
            batch_id,
            ProofRequest::Threshold {
                values: values.to_vec(),
                threshold,
            },
        )
    }

    pub fn batch_add_membership_proof(&self, batch_id: u64, value: u64, set: &[u64]) -> Result<()> {
        self.batch_add(
            batch_id,
            ProofRequest::Membership {
                value,
                set: set.to_vec(),
            },
        )
    }

    pub fn batch_add_improvement_proof(&self, batch_id: u64, old_value: u64, new_value: u64) -> Result<()> {
        self.batch_add(
            batch_id,
            ProofRequest::Improvement {
                old_value,
                new_value,
            },
        )
    }

    pub fn batch_add_consistency_proof(&self, batch_id: u64, sequence: &[u64]) -> Result<()> {
        self.batch_add(
            batch_id,
            ProofRequest::Consistency {
                sequence: sequence.to_vec(),
            },
        )
    }

    pub fn get_batch_status(&self, batch_id: u64) -> Result<BatchReport> {
        self.batches.status(batch_id)
    }

    /// Run every queued request; results are in queue order
    pub fn process_batch(&self, batch_id: u64) -> Result<Vec<Result<Vec<u8>>>> {
        self.batches.process(batch_id, |request| self.prove(request))
    }

    pub fn clear_batch(&self, batch_id: u64) -> Result<()> {
        self.batches.clear(batch_id)
    }

    // ---- TVC ----

    pub fn tvc_encode(&self, secret: u64, timestamp: u64, fps: u32) -> Result<Vec<f32>> {
        self.codec.encode(secret, timestamp, fps)
    }

    pub fn tvc_encode_with_noise<R: Rng + ?Sized>(
        &self,
        secret: u64,
        timestamp: u64,
        fps: u32,
        amplitude: f32,
        rng: &mut R,
    ) -> Result<Vec<f32>> {
        self.codec
            .encode_with_noise(secret, timestamp, fps, amplitude, rng)
    }

    pub fn tvc_decode(&self, frames: &[f32], fps: u32) -> Result<(u64, u64)> {
        self.codec.decode(frames, fps).map_err(|e| {
            log::warn!("rejected TVC capture of {} frames: {}", frames.len(), e);
            e
        })
    }

    /// Prove a captured code is fresh; returns the proof and its public inputs
    pub fn tvc_prove_reception(
        &self,
        secret: u64,
        timestamp: u64,
        now: u64,
        tolerance: u64,
    ) -> Result<(Vec<u8>, ReceptionInputs)> {
        self.monitor.time(StatementKind::Tvc, Operation::Prove, || {
            let (proof, inputs) = tvc::prove_reception(secret, timestamp, now, tolerance)?;
            Ok((proof.to_bytes()?, inputs))
        })
    }

    pub fn tvc_verify_reception(&self, proof: &[u8], inputs: &ReceptionInputs) -> Result<bool> {
        self.verify_with(proof, StatementKind::Tvc, |p| tvc::verify_reception(p, inputs))
    }

    // ---- monitoring ----

    pub fn enable_performance_monitoring(&self, enabled: bool) {
        self.monitor.set_enabled(enabled);
    }

    pub fn get_performance_metrics(&self) -> PerformanceMetrics {
        self.monitor.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.monitor.reset();
    }

    /// Time `iterations` fresh proofs of a fixed statement of the named kind
    pub fn benchmark_proof_generation(&self, proof_type: &str, iterations: u32) -> Result<BenchmarkReport> {
        let kind: StatementKind = proof_type.parse()?;
        if iterations == 0 {
            return Err(ZkError::InvalidInput("iterations must be at least 1".into()));
        }
        debug!("benchmarking {} x{}", kind, iterations);

        if kind == StatementKind::Tvc {
            return run_benchmark(kind, iterations, || {
                self.tvc_prove_reception(12345, 1_000, 1_000, 10).map(|_| ())
            });
        }
        let request = benchmark_fixture(kind)?;
        run_benchmark(kind, iterations, || self.prove(&request).map(|_| ()))
    }
}

impl Default for ZkEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn benchmark_fixture(kind: StatementKind) -> Result<ProofRequest> {
    Ok(match kind {
        StatementKind::Range => ProofRequest::Range {
            value: 50,
            low: 0,
            high: 100,
        },
        StatementKind::Equality => ProofRequest::Equality {
            a: 42,
            b: 42,
            context: Vec::new(),
        },
        StatementKind::Threshold => ProofRequest::Threshold {
            values: vec![10, 20, 30],
            threshold: 50,
        },
        StatementKind::Membership => ProofRequest::Membership {
            value: 3,
            set: vec![1, 2, 3, 4, 5],
        },
        StatementKind::Improvement => ProofRequest::Improvement {
            old_value: 10,
            new_value: 20,
        },
        StatementKind::Consistency => ProofRequest::Consistency {
            sequence: vec![1, 2, 3, 4],
        },
        StatementKind::Composite | StatementKind::Tvc => {
            return Err(ZkError::UnsupportedStatementKind(kind.to_string()))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_roundtrip() {
        let engine = ZkEngine::default();
        let proof = engine.prove_range(10, 0, 20).unwrap();
        assert!(engine.verify_range(&proof, 0, 20).unwrap());
        assert!(engine.verify(&proof, StatementKind::Range).unwrap());
        assert!(!engine.verify(&proof, StatementKind::Threshold).unwrap());
    }

    #[test]
    fn test_verify_malformed_bytes_errors() {
        let engine = ZkEngine::default();
        assert!(matches!(
            engine.verify_range(&[1, 2, 3], 0, 20),
            Err(ZkError::MalformedProof(_))
        ));
    }

    #[test]
    fn test_limits_enforced() {
        let engine = ZkEngine::new(EngineConfig::low_memory());
        let set: Vec<u64> = (0..1000).collect();
        assert!(matches!(
            engine.prove_membership(1, &set),
            Err(ZkError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_proof_info() {
        let engine = ZkEngine::default();
        let proof = engine.prove_threshold(&[1, 2], 3).unwrap();
        let info = engine.get_proof_info(&proof).unwrap();
        assert_eq!(info.kind, StatementKind::Threshold);
        assert_eq!(info.commitment_count, 2);

        let composite = engine.compose(&[proof]).unwrap();
        let info = engine.get_proof_info(&composite).unwrap();
        assert_eq!(info.kind, StatementKind::Composite);

        assert!(engine.get_proof_info(&[0xff]).is_err());
    }

    #[test]
    fn test_benchmark_fixtures_prove() {
        for kind in StatementKind::STATEMENTS {
            assert!(benchmark_fixture(kind).unwrap().prove().is_ok(), "{}", kind);
        }
        assert!(benchmark_fixture(StatementKind::Composite).is_err());
    }

    #[test]
    fn test_first_failure_is_monitored() {
        let engine = ZkEngine::default();
        let proof = engine.prove_range(3, 0, 7).unwrap();
        let items = vec![
            (proof.clone(), StatementKind::Range),
            (proof, StatementKind::Range),
        ];
        assert_eq!(engine.verify_all_or_first_failure(&items), Ok(()));

        let metrics = engine.get_performance_metrics();
        let verify = metrics.get(StatementKind::Range, Operation::Verify).unwrap();
        assert_eq!(verify.calls, 2);
        assert_eq!(verify.successes, 2);
    }

    #[test]
    fn test_monitoring_toggle() {
        let engine = ZkEngine::default();
        engine.enable_performance_monitoring(false);
        engine.prove_equality(1, 1).unwrap();
        assert!(engine.get_performance_metrics().operations.is_empty());

        engine.enable_performance_monitoring(true);
        engine.prove_equality(1, 1).unwrap();
        let metrics = engine.get_performance_metrics();
        assert_eq!(
            metrics
                .get(StatementKind::Equality, Operation::Prove)
                .unwrap()
                .calls,
            1
        );
        engine.reset_metrics();
        assert!(engine.get_performance_metrics().operations.is_empty());
    }
}
