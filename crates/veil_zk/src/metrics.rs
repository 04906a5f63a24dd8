//! Performance monitoring
//!
//! A [`PerformanceMonitor`] is owned by the engine and records latency
//! statistics per statement kind and operation. Timing aggregates cover
//! successful calls only; failed calls still count towards `calls`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ZkError};
use crate::proof::StatementKind;

/// Timed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operation {
    Prove,
    Verify,
}

/// Running statistics (Welford) for one kind and operation
#[derive(Debug, Clone, Default)]
struct Accumulator {
    calls: u64,
    successes: u64,
    total_ms: f64,
    min_ms: f64,
    max_ms: f64,
    mean_ms: f64,
    m2: f64,
}

impl Accumulator {
    fn record(&mut self, elapsed_ms: Option<f64>) {
        self.calls += 1;
        let Some(x) = elapsed_ms else {
            return;
        };
        self.successes += 1;
        self.total_ms += x;
        if self.successes == 1 {
            self.min_ms = x;
            self.max_ms = x;
        } else {
            self.min_ms = self.min_ms.min(x);
            self.max_ms = self.max_ms.max(x);
        }
        let delta = x - self.mean_ms;
        self.mean_ms += delta / self.successes as f64;
        self.m2 += delta * (x - self.mean_ms);
    }

    fn snapshot(&self, kind: StatementKind, operation: Operation) -> OperationMetrics {
        OperationMetrics {
            kind,
            operation,
            calls: self.calls,
            successes: self.successes,
            total_time_ms: self.total_ms,
            min_time_ms: self.min_ms,
            max_time_ms: self.max_ms,
            avg_time_ms: self.mean_ms,
            std_dev_ms: if self.successes > 1 {
                (self.m2 / (self.successes - 1) as f64).sqrt()
            } else {
                0.0
            },
        }
    }
}

/// Statistics of one kind and operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationMetrics {
    pub kind: StatementKind,
    pub operation: Operation,
    pub calls: u64,
    pub successes: u64,
    pub total_time_ms: f64,
    pub min_time_ms: f64,
    pub max_time_ms: f64,
    pub avg_time_ms: f64,
    pub std_dev_ms: f64,
}

/// Snapshot of everything the monitor has recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Sorted by kind, then operation
    pub operations: Vec<OperationMetrics>,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl PerformanceMetrics {
    /// Statistics for one kind and operation, if any call was recorded
    pub fn get(&self, kind: StatementKind, operation: Operation) -> Option<&OperationMetrics> {
        self.operations
            .iter()
            .find(|m| m.kind == kind && m.operation == operation)
    }

    /// Fraction of cache lookups that hit
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / total as f64
    }
}

/// Latency and cache counters around prove/verify calls
pub struct PerformanceMonitor {
    enabled: AtomicBool,
    stats: Mutex<HashMap<(StatementKind, Operation), Accumulator>>,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl PerformanceMonitor {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            stats: Mutex::new(HashMap::new()),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Record one call; `None` marks a failure
    pub fn record(&self, kind: StatementKind, operation: Operation, elapsed: Option<Duration>) {
        if !self.is_enabled() {
            return;
        }
        self.stats
            .lock()
            .entry((kind, operation))
            .or_default()
            .record(elapsed.map(|d| d.as_secs_f64() * 1000.0));
    }

    /// Run `f`, recording its latency when it succeeds
    pub fn time<T>(
        &self,
        kind: StatementKind,
        operation: Operation,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        if !self.is_enabled() {
            return f();
        }
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();
        self.record(kind, operation, result.as_ref().ok().map(|_| elapsed));
        result
    }

    pub fn record_cache_hit(&self) {
        if self.is_enabled() {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_cache_miss(&self) {
        if self.is_enabled() {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Current statistics
    pub fn snapshot(&self) -> PerformanceMetrics {
        let mut operations: Vec<OperationMetrics> = self
            .stats
            .lock()
            .iter()
            .map(|((kind, op), acc)| acc.snapshot(*kind, *op))
            .collect();
        operations.sort_by_key(|m| (m.kind, m.operation));
        PerformanceMetrics {
            operations,
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }

    /// Drop all recorded statistics
    pub fn reset(&self) {
        self.stats.lock().clear();
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Result of a proof-generation benchmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub proof_type: String,
    pub iterations: u32,
    pub successful_iterations: u32,
    /// Percentage of iterations that produced a proof
    pub success_rate: f64,
    pub total_time_ms: f64,
    pub avg_time_ms: f64,
    pub min_time_ms: f64,
    pub max_time_ms: f64,
    pub std_dev_ms: f64,
    pub proofs_per_second: f64,
}

/// Run `iteration` `iterations` times and summarise successful runs
pub fn run_benchmark<F>(
    kind: StatementKind,
    iterations: u32,
    mut iteration: F,
) -> Result<BenchmarkReport>
where
    F: FnMut() -> Result<()>,
{
    if iterations == 0 {
        return Err(ZkError::InvalidInput("iterations must be at least 1".into()));
    }

    let mut samples_ms = Vec::with_capacity(iterations as usize);
    for i in 0..iterations {
        let start = Instant::now();
        match iteration() {
            Ok(()) => samples_ms.push(start.elapsed().as_secs_f64() * 1000.0),
            Err(e) => log::warn!("{} benchmark iteration {} failed: {}", kind, i, e),
        }
    }

    let n = samples_ms.len();
    let total: f64 = samples_ms.iter().sum();
    let avg = if n > 0 { total / n as f64 } else { 0.0 };
    let min = if n > 0 {
        samples_ms.iter().copied().fold(f64::INFINITY, f64::min)
    } else {
        0.0
    };
    let std_dev = if n > 1 {
        let var = samples_ms.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    } else {
        0.0
    };

    Ok(BenchmarkReport {
        proof_type: kind.to_string(),
        iterations,
        successful_iterations: n as u32,
        success_rate: n as f64 / iterations as f64 * 100.0,
        total_time_ms: total,
        avg_time_ms: avg,
        min_time_ms: min,
        max_time_ms: samples_ms.iter().copied().fold(0.0, f64::max),
        std_dev_ms: std_dev,
        proofs_per_second: if total > 0.0 { n as f64 / (total / 1000.0) } else { 0.0 },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_records_prove_and_verify() {
        let monitor = PerformanceMonitor::new(true);
        monitor
            .time(StatementKind::Range, Operation::Prove, || Ok(()))
            .unwrap();
        monitor
            .time(StatementKind::Range, Operation::Prove, || Ok(()))
            .unwrap();
        let _ = monitor.time(StatementKind::Range, Operation::Verify, || {
            Err::<(), _>(ZkError::precondition("x"))
        });

        let metrics = monitor.snapshot();
        let prove = metrics.get(StatementKind::Range, Operation::Prove).unwrap();
        assert_eq!(prove.calls, 2);
        assert_eq!(prove.successes, 2);
        assert!(prove.min_time_ms <= prove.max_time_ms);

        let verify = metrics.get(StatementKind::Range, Operation::Verify).unwrap();
        assert_eq!(verify.calls, 1);
        assert_eq!(verify.successes, 0);
        assert_eq!(verify.total_time_ms, 0.0);
    }

    #[test]
    fn test_welford_statistics() {
        let mut acc = Accumulator::default();
        for x in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            acc.record(Some(x));
        }
        let m = acc.snapshot(StatementKind::Range, Operation::Prove);
        assert!((m.avg_time_ms - 5.0).abs() < 1e-9);
        assert_eq!(m.min_time_ms, 2.0);
        assert_eq!(m.max_time_ms, 9.0);
        assert!((m.std_dev_ms - (32.0f64 / 7.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_disabled_monitor() {
        let monitor = PerformanceMonitor::new(false);
        monitor
            .time(StatementKind::Equality, Operation::Prove, || Ok(()))
            .unwrap();
        monitor.record_cache_hit();
        let metrics = monitor.snapshot();
        assert!(metrics.operations.is_empty());
        assert_eq!(metrics.cache_hits, 0);

        monitor.set_enabled(true);
        monitor.record_cache_hit();
        monitor.record_cache_miss();
        assert_eq!(monitor.snapshot().cache_hit_rate(), 0.5);
    }

    #[test]
    fn test_reset() {
        let monitor = PerformanceMonitor::default();
        monitor.record(StatementKind::Tvc, Operation::Verify, Some(Duration::from_millis(1)));
        monitor.record_cache_miss();
        monitor.reset();
        let metrics = monitor.snapshot();
        assert!(metrics.operations.is_empty());
        assert_eq!(metrics.cache_misses, 0);
    }

    #[test]
    fn test_benchmark_report() {
        let mut calls = 0;
        let report = run_benchmark(StatementKind::Range, 4, || {
            calls += 1;
            if calls % 2 == 0 {
                Err(ZkError::precondition("odd"))
            } else {
                Ok(())
            }
        })
        .unwrap();
        assert_eq!(report.proof_type, "range");
        assert_eq!(report.iterations, 4);
        assert_eq!(report.successful_iterations, 2);
        assert_eq!(report.success_rate, 50.0);
        assert!(report.min_time_ms <= report.max_time_ms);
    }

    #[test]
    fn test_benchmark_zero_iterations() {
        assert!(matches!(
            run_benchmark(StatementKind::Range, 0, || Ok(())),
            Err(ZkError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_benchmark_json_keys() {
        let report = run_benchmark(StatementKind::Equality, 1, || Ok(())).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        for key in [
            "proof_type",
            "iterations",
            "successful_iterations",
            "success_rate",
            "total_time_ms",
            "avg_time_ms",
            "min_time_ms",
            "max_time_ms",
            "std_dev_ms",
            "proofs_per_second",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }
}
