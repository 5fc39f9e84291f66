//! Per-run stopwatch table
//!
//! Keyed by operation name. Concurrent tasks must use distinct names; a
//! second `start` on the same name simply overwrites the start time.

use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Default)]
struct Entry {
    started: Option<Instant>,
    duration: Option<Duration>,
    count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OperationStats {
    /// Seconds
    pub duration: f64,
    pub count: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub total_operations: usize,
    /// Sum of completed operation durations, in seconds
    pub total_time: f64,
    pub operations: BTreeMap<String, OperationStats>,
}

#[derive(Debug, Default)]
pub struct PerformanceMonitor {
    entries: DashMap<String, Entry>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self, operation: &str) {
        let mut entry = self.entries.entry(operation.to_string()).or_default();
        entry.started = Some(Instant::now());
        entry.count += 1;
    }

    /// Stop the stopwatch; `None` if `operation` was never started
    pub fn end(&self, operation: &str) -> Option<Duration> {
        let mut entry = self.entries.get_mut(operation)?;
        let started = entry.started?;
        let elapsed = started.elapsed();
        entry.duration = Some(elapsed);
        Some(elapsed)
    }

    /// Time a future under `operation`
    pub async fn measure<F, T>(&self, operation: &str, future: F) -> T
    where
        F: Future<Output = T>,
    {
        self.start(operation);
        let output = future.await;
        self.end(operation);
        output
    }

    /// Last completed duration of `operation`
    pub fn duration(&self, operation: &str) -> Option<Duration> {
        self.entries.get(operation).and_then(|e| e.duration)
    }

    pub fn summary(&self) -> PerformanceSummary {
        let completed: Vec<(String, Duration, u32)> = self
            .entries
            .iter()
            .filter_map(|e| e.duration.map(|d| (e.key().clone(), d, e.count)))
            .collect();

        let total: f64 = completed.iter().map(|(_, d, _)| d.as_secs_f64()).sum();
        let operations = completed
            .into_iter()
            .map(|(name, duration, count)| {
                let secs = duration.as_secs_f64();
                let percentage = if total > 0.0 { secs / total * 100.0 } else { 0.0 };
                (
                    name,
                    OperationStats {
                        duration: secs,
                        count,
                        percentage,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();

        PerformanceSummary {
            total_operations: operations.len(),
            total_time: total,
            operations,
        }
    }

    pub fn reset(&self) {
        self.entries.clear();
    }
}
