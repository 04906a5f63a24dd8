//! Benchmarks for ZK operations

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use curve25519_dalek::scalar::Scalar;
use rand::rngs::OsRng;
use veil_zk::{commit, merkle::MerkleTree, StatementKind, TvcCodec, ZkEngine};

fn benchmark_pedersen_commit(c: &mut Criterion) {
    let blinding = Scalar::random(&mut OsRng);

    c.bench_function("pedersen_commit", |b| {
        b.iter(|| black_box(commit(black_box(42u64), &blinding).unwrap()))
    });
}

fn benchmark_merkle_from_values(c: &mut Criterion) {
    let values: Vec<u64> = (0..1000).collect();

    c.bench_function("merkle_from_values_1000", |b| {
        b.iter(|| black_box(MerkleTree::from_values(black_box(&values)).unwrap()))
    });
}

fn benchmark_range(c: &mut Criterion) {
    let engine = ZkEngine::default();
    let proof = engine.prove_range(50, 0, 100).unwrap();

    c.bench_function("range_prove", |b| {
        b.iter(|| black_box(engine.prove_range(black_box(50), 0, 100).unwrap()))
    });
    c.bench_function("range_verify", |b| {
        b.iter(|| black_box(engine.verify_range(black_box(&proof), 0, 100).unwrap()))
    });
}

fn benchmark_membership(c: &mut Criterion) {
    let engine = ZkEngine::default();
    let mut group = c.benchmark_group("membership_prove");

    for size in [4usize, 16, 64].iter() {
        let set: Vec<u64> = (0..*size as u64).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &set, |b, set| {
            b.iter(|| black_box(engine.prove_membership(black_box(1), set).unwrap()))
        });
    }

    group.finish();
}

fn benchmark_threshold(c: &mut Criterion) {
    let engine = ZkEngine::default();
    let values = [10u64, 20, 30];

    c.bench_function("threshold_prove_3", |b| {
        b.iter(|| black_box(engine.prove_threshold(black_box(&values), 50).unwrap()))
    });
}

fn benchmark_cached_prove(c: &mut Criterion) {
    let engine = ZkEngine::default();
    engine.prove_range_cached(50, 0, 100).unwrap();

    c.bench_function("range_prove_cached_hit", |b| {
        b.iter(|| black_box(engine.prove_range_cached(black_box(50), 0, 100).unwrap()))
    });
}

fn benchmark_parallel_verification(c: &mut Criterion) {
    let engine = ZkEngine::default();
    let mut group = c.benchmark_group("parallel_verification");

    for size in [10, 50, 100].iter() {
        // Generate proofs once
        let items: Vec<(Vec<u8>, StatementKind)> = (0..*size)
            .map(|i| (engine.prove_range(i, 0, 200).unwrap(), StatementKind::Range))
            .collect();

        group.bench_with_input(BenchmarkId::new("sequential", size), &items, |b, items| {
            b.iter(|| {
                for (bytes, kind) in items {
                    black_box(engine.verify(bytes, *kind).unwrap());
                }
            })
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), &items, |b, items| {
            b.iter(|| black_box(engine.verify_proofs_parallel(items)))
        });
    }

    group.finish();
}

fn benchmark_tvc(c: &mut Criterion) {
    let codec = TvcCodec::default();
    let frames = codec.encode(12345, 1_700_000_000, 30).unwrap();

    c.bench_function("tvc_encode", |b| {
        b.iter(|| black_box(codec.encode(black_box(12345), 1_700_000_000, 30).unwrap()))
    });
    c.bench_function("tvc_decode", |b| {
        b.iter(|| black_box(codec.decode(black_box(&frames), 30).unwrap()))
    });

    let engine = ZkEngine::default();
    c.bench_function("tvc_prove_reception", |b| {
        b.iter(|| {
            black_box(
                engine
                    .tvc_prove_reception(12345, black_box(1_000), 1_000, 10)
                    .unwrap(),
            )
        })
    });
}

criterion_group!(
    benches,
    benchmark_pedersen_commit,
    benchmark_merkle_from_values,
    benchmark_range,
    benchmark_membership,
    benchmark_threshold,
    benchmark_cached_prove,
    benchmark_parallel_verification,
    benchmark_tvc,
);

criterion_main!(benches);
