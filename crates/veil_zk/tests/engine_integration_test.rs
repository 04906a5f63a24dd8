//! Integration tests for the proof engine

use std::sync::Arc;
use std::thread;

use rand::{rngs::StdRng, SeedableRng};
use veil_zk::{
    EngineConfig, MetadataEnvelope, Operation, ProofRequest, StatementKind, ZkEngine, ZkError,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_concrete_scenarios() {
    init_logging();
    let engine = ZkEngine::default();

    let proof = engine.prove_range(10, 0, 20).unwrap();
    assert!(engine.verify_range(&proof, 0, 20).unwrap());
    assert!(matches!(
        engine.prove_range(25, 0, 20),
        Err(ZkError::PreconditionViolation(_))
    ));

    let proof = engine.prove_threshold(&[1, 2, 3], 5).unwrap();
    assert!(engine.verify_threshold(&proof, 5).unwrap());

    let proof = engine.prove_improvement(1, 2).unwrap();
    assert!(engine.verify_improvement(&proof, 1).unwrap());
    assert!(engine.prove_improvement(2, 1).is_err());

    assert!(matches!(
        engine.benchmark_proof_generation("range", 0),
        Err(ZkError::InvalidInput(_))
    ));
    assert!(matches!(
        engine.benchmark_proof_generation("invalid_type", 1),
        Err(ZkError::UnsupportedStatementKind(_))
    ));
}

#[test]
fn test_completeness_all_statements() {
    let engine = ZkEngine::default();

    let p = engine.prove_equality(42, 42).unwrap();
    assert!(engine.verify_equality(&p, 42).unwrap());

    let p = engine.prove_equality_with_context(9, 9, b"ctx").unwrap();
    assert!(engine.verify_equality_with_context(&p, 9, b"ctx").unwrap());
    assert!(!engine.verify_equality(&p, 9).unwrap());

    let p = engine.prove_membership(3, &[1, 2, 3, 4, 5]).unwrap();
    assert!(engine.verify_membership(&p, &[1, 2, 3, 4, 5]).unwrap());

    let p = engine.prove_consistency(&[1, 2, 3, 4]).unwrap();
    assert!(engine.verify_consistency(&p).unwrap());
}

#[test]
fn test_soundness_refusals() {
    let engine = ZkEngine::default();
    assert!(engine.prove_equality(1, 2).is_err());
    assert!(engine.prove_threshold(&[1, 1], 3).is_err());
    assert!(engine.prove_membership(6, &[1, 2, 3]).is_err());
    assert!(engine.prove_consistency(&[3, 2]).is_err());
    assert!(matches!(
        engine.prove_range(u64::MAX, 0, u64::MAX),
        Err(ZkError::Domain { .. })
    ));
    let max = veil_zk::MAX_SECRET;
    assert!(matches!(
        engine.prove_threshold(&[max, max, max], 0),
        Err(ZkError::Overflow(_))
    ));
}

#[test]
fn test_byte_mutation_never_verifies() {
    let engine = ZkEngine::default();
    let proof = engine.prove_range(7, 0, 15).unwrap();

    // Sample positions across the encoding
    let step = (proof.len() / 64).max(1);
    for i in (0..proof.len()).step_by(step) {
        let mut mutated = proof.clone();
        mutated[i] ^= 0x01;
        assert!(
            !matches!(engine.verify_range(&mutated, 0, 15), Ok(true)),
            "mutation at byte {} verified",
            i
        );
    }
}

#[test]
fn test_metadata_roundtrip() {
    let engine = ZkEngine::default();
    let proof = engine.prove_range(5, 0, 10).unwrap();

    let mut metadata = MetadataEnvelope::new();
    metadata.insert("z-last", vec![0u8, 1, 2]).unwrap();
    metadata.insert("a-first", b"value".to_vec()).unwrap();
    metadata.insert("empty", Vec::new()).unwrap();

    let tagged = engine.attach_metadata(&proof, metadata.clone()).unwrap();
    assert_eq!(engine.extract_metadata(&tagged).unwrap(), metadata);
    assert!(engine.verify_range(&tagged, 0, 10).unwrap());
    assert!(engine.get_proof_info(&tagged).unwrap().has_metadata);
    assert!(engine.extract_metadata(&proof).unwrap().is_empty());
}

#[test]
fn test_composite_integrity() {
    let engine = ZkEngine::default();
    let p1 = engine.prove_range(10, 0, 20).unwrap();
    let p2 = engine.prove_equality(3, 3).unwrap();
    let p3 = engine.prove_consistency(&[1, 1, 2]).unwrap();

    let composite = engine.compose(&[p1.clone(), p2.clone(), p3.clone()]).unwrap();
    assert!(engine.verify_composite(&composite).unwrap());

    let swapped = engine.compose(&[p2.clone(), p1.clone(), p3.clone()]).unwrap();
    assert_ne!(swapped, composite);
    assert!(engine.verify_composite(&swapped).unwrap());

    // Corrupt a byte near the end of the encoded composite (inside the tag)
    let mut corrupted = composite.clone();
    let idx = corrupted.len() - 5;
    corrupted[idx] ^= 0xff;
    assert!(!matches!(engine.verify_composite(&corrupted), Ok(true)));

    assert!(engine.validate_proof_chain(&[p1.clone(), p2, p3]));
    assert!(!engine.validate_proof_chain(&[p1, vec![0u8; 4]]));
}

#[test]
fn test_cache_determinism() {
    let engine = ZkEngine::default();

    let first = engine.prove_range_cached(10, 0, 20).unwrap();
    let second = engine.prove_range_cached(10, 0, 20).unwrap();
    assert_eq!(first, second);

    // The second call ran no prover
    let metrics = engine.get_performance_metrics();
    let prove = metrics.get(StatementKind::Range, Operation::Prove).unwrap();
    assert_eq!(prove.calls, 1);
    assert_eq!(metrics.cache_hits, 1);
    assert_eq!(metrics.cache_misses, 1);

    // Different parameters produce a different proof
    let other = engine.prove_range_cached(11, 0, 20).unwrap();
    assert_ne!(first, other);
    assert!(engine.verify_range(&other, 0, 20).unwrap());

    let stats = engine.get_cache_stats();
    assert_eq!(stats.size, 2);
    engine.clear_cache();
    assert_eq!(engine.get_cache_stats().size, 0);

    let fresh = engine.prove_range_cached(10, 0, 20).unwrap();
    assert_ne!(fresh, first);
}

#[test]
fn test_cached_variants() {
    let engine = ZkEngine::default();
    let pairs = [
        (
            engine.prove_equality_cached(4, 4).unwrap(),
            engine.prove_equality_cached(4, 4).unwrap(),
        ),
        (
            engine.prove_threshold_cached(&[5, 6], 10).unwrap(),
            engine.prove_threshold_cached(&[5, 6], 10).unwrap(),
        ),
        (
            engine.prove_membership_cached(2, &[1, 2]).unwrap(),
            engine.prove_membership_cached(2, &[1, 2]).unwrap(),
        ),
        (
            engine.prove_improvement_cached(1, 5).unwrap(),
            engine.prove_improvement_cached(1, 5).unwrap(),
        ),
        (
            engine.prove_consistency_cached(&[2, 3]).unwrap(),
            engine.prove_consistency_cached(&[2, 3]).unwrap(),
        ),
    ];
    for (a, b) in &pairs {
        assert_eq!(a, b);
    }
    assert_eq!(engine.get_cache_stats().hits, 5);
}

#[test]
fn test_concurrent_cache_access() {
    let engine = Arc::new(ZkEngine::default());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.prove_membership_cached(2, &[1, 2, 3]).unwrap())
        })
        .collect();
    let results: Vec<Vec<u8>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(engine.get_cache_stats().size, 1);
    assert!(engine.verify_membership(&results[0], &[1, 2, 3]).unwrap());
}

#[test]
fn test_parallel_order_preservation() {
    let engine = ZkEngine::default();
    let range = engine.prove_range(1, 0, 3).unwrap();
    let equality = engine.prove_equality(8, 8).unwrap();

    let items = vec![
        (range.clone(), StatementKind::Range),
        (equality.clone(), StatementKind::Range),
        (equality.clone(), StatementKind::Equality),
        (vec![9, 9, 9], StatementKind::Membership),
        (range.clone(), StatementKind::Range),
    ];
    assert_eq!(
        engine.verify_proofs_parallel(&items),
        vec![true, false, true, false, true]
    );

    let detailed = engine.verify_proofs_parallel_detailed(&items);
    assert_eq!(detailed.len(), 5);
    assert!(detailed[3].is_err());
    assert_eq!(engine.verify_all_or_first_failure(&items), Err(1));
}

#[test]
fn test_batch_session() {
    let engine = ZkEngine::default();
    let id = engine.create_proof_batch();

    engine.batch_add_range_proof(id, 10, 0, 20).unwrap();
    engine.batch_add_equality_proof(id, 5, 5).unwrap();
    engine.batch_add_threshold_proof(id, &[1, 2], 4).unwrap();
    engine.batch_add_membership_proof(id, 4, &[1, 2, 3]).unwrap();
    engine.batch_add_improvement_proof(id, 3, 4).unwrap();
    engine.batch_add_consistency_proof(id, &[1, 2]).unwrap();

    let status = engine.get_batch_status(id).unwrap();
    assert_eq!(status.total_requests, 6);
    assert_eq!(status.membership_proofs, 1);

    let results = engine.process_batch(id).unwrap();
    assert_eq!(results.len(), 6);
    assert!(engine.verify_range(results[0].as_ref().unwrap(), 0, 20).unwrap());
    assert!(engine.verify_equality(results[1].as_ref().unwrap(), 5).unwrap());
    assert!(results[2].is_err());
    assert!(matches!(results[3], Err(ZkError::PreconditionViolation(_))));
    assert!(engine.verify_improvement(results[4].as_ref().unwrap(), 3).unwrap());
    assert!(engine.verify_consistency(results[5].as_ref().unwrap()).unwrap());

    let status = engine.get_batch_status(id).unwrap();
    assert_eq!(status.succeeded, 4);
    assert_eq!(status.failed, 2);

    assert_eq!(
        engine.batch_add_range_proof(id, 1, 0, 2),
        Err(ZkError::InvalidBatchId(id))
    );
    engine.clear_batch(id).unwrap();
    assert!(engine.get_batch_status(id).is_err());
    assert!(engine.get_batch_status(12_345).is_err());
}

#[test]
fn test_tvc_pipeline() {
    let engine = ZkEngine::default();
    for (s, t, fps) in [(1u64, 2u64, 30u32), (987_654_321, 1_700_000_000, 60), (0, 0, 10)] {
        let frames = engine.tvc_encode(s, t, fps).unwrap();
        assert_eq!(engine.tvc_decode(&frames, fps).unwrap(), (s, t));
    }

    let mut rng = StdRng::seed_from_u64(42);
    let frames = engine
        .tvc_encode_with_noise(55, 1_000, 30, 0.05, &mut rng)
        .unwrap();
    let (s, t) = engine.tvc_decode(&frames, 30).unwrap();
    assert_eq!((s, t), (55, 1_000));

    assert!(matches!(
        engine.tvc_encode(1, 2, u32::MAX),
        Err(ZkError::InvalidInput(_))
    ));

    let (proof, inputs) = engine.tvc_prove_reception(s, t, 1_004, 4).unwrap();
    assert!(engine.tvc_verify_reception(&proof, &inputs).unwrap());
    assert!(engine.verify(&proof, StatementKind::Tvc).unwrap());
}

#[test]
fn test_tvc_full_range_nonce() {
    let engine = ZkEngine::default();
    let frames = engine.tvc_encode(u64::MAX, 1_000, 30).unwrap();
    let (s, t) = engine.tvc_decode(&frames, 30).unwrap();
    assert_eq!((s, t), (u64::MAX, 1_000));

    let (proof, inputs) = engine.tvc_prove_reception(s, t, 1_000, 10).unwrap();
    assert!(engine.tvc_verify_reception(&proof, &inputs).unwrap());
    assert!(engine.verify(&proof, StatementKind::Tvc).unwrap());

    let late = (1u64 << 63) + 5;
    let (proof, inputs) = engine.tvc_prove_reception(1, late, late, 10).unwrap();
    assert!(engine.tvc_verify_reception(&proof, &inputs).unwrap());
}

#[test]
fn test_tvc_tolerance_boundary() {
    let engine = ZkEngine::default();
    let now = 10_000;
    let tolerance = 30;

    for t in [now - tolerance, now + tolerance] {
        let (proof, inputs) = engine.tvc_prove_reception(7, t, now, tolerance).unwrap();
        assert!(engine.tvc_verify_reception(&proof, &inputs).unwrap());
    }
    for t in [now - tolerance - 1, now + tolerance + 1] {
        assert!(matches!(
            engine.tvc_prove_reception(7, t, now, tolerance),
            Err(ZkError::PreconditionViolation(_))
        ));
    }

    // An edge proof checked against a later clock is rejected
    let (proof, inputs) = engine
        .tvc_prove_reception(7, now + tolerance, now, tolerance)
        .unwrap();
    let later = veil_zk::ReceptionInputs {
        now: now - 1,
        ..inputs
    };
    assert!(!engine.tvc_verify_reception(&proof, &later).unwrap());
}

#[test]
fn test_benchmark_report() {
    let engine = ZkEngine::default();
    for kind in ["range", "equality", "threshold", "membership", "improvement", "consistency", "tvc"] {
        let report = engine.benchmark_proof_generation(kind, 2).unwrap();
        assert_eq!(report.proof_type, kind);
        assert_eq!(report.iterations, 2);
        assert_eq!(report.successful_iterations, 2);
        assert_eq!(report.success_rate, 100.0);
        assert!(report.proofs_per_second > 0.0);
    }
    assert!(matches!(
        engine.benchmark_proof_generation("composite", 1),
        Err(ZkError::UnsupportedStatementKind(_))
    ));
}

#[test]
fn test_low_memory_config() {
    let engine = ZkEngine::new(EngineConfig::low_memory());
    assert!(!engine.config().monitoring_enabled);
    let request = ProofRequest::Consistency {
        sequence: (0..200).collect(),
    };
    assert!(matches!(
        engine.prove(&request),
        Err(ZkError::InvalidInput(_))
    ));
}
