//! Common helpers for the collective integration tests.

#![allow(dead_code)]

use boost_collective::*;
use rand::prelude::*;
use std::thread;

/// Deterministic per-rank buffers in `[-scale, scale)`
pub fn create_rank_buffers(num_ranks: usize, count: usize, seed: u64, scale: f64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..num_ranks)
        .map(|_| (0..count).map(|_| rng.gen_range(-scale..scale)).collect())
        .collect()
}

/// Elementwise sum folded rank by rank, position by position
pub fn expected_sum(buffers: &[Vec<f64>]) -> Vec<f64> {
    let count = buffers.first().map_or(0, |b| b.len());
    let mut out = vec![0.0; count];
    for buffer in buffers {
        for (acc, &value) in out.iter_mut().zip(buffer) {
            *acc += value;
        }
    }
    out
}

/// Run one reduction per rank on its own thread and collect every rank's
/// output, ordered by rank
pub fn reduce_on_threads(buffers: Vec<Vec<f64>>, count: usize, logger: &Logger) -> Vec<Vec<f64>> {
    let group = LocalCollective::new(buffers.len()).expect("non-empty rank group");
    let contexts = group.launch_contexts();

    thread::scope(|s| {
        let handles: Vec<_> = contexts
            .into_iter()
            .zip(buffers)
            .map(|(ctx, mut buffer)| {
                s.spawn(move || {
                    sum_all_reduce(&ctx, &mut buffer, count, logger);
                    buffer
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("rank thread panicked"))
            .collect()
    })
}

/// Quiet logger for tests
pub fn test_logger() -> Logger {
    Logger::new("boost_collective_test").with_level(LogLevel::Warning)
}
