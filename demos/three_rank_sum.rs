//! Three ranks on threads of one process sum their partial gradients.
//!
//! Run with `cargo run --example three_rank_sum`.

use anyhow::{bail, Context};
use boost_collective::{sum_all_reduce, ConfigBuilder, LocalCollective, Logger};
use std::thread;

fn main() -> anyhow::Result<()> {
    let config = ConfigBuilder::new()
        .num_ranks(3)
        .verbosity(2)
        .build()
        .context("building configuration")?;
    let logger = Logger::init(&config);
    let group = LocalCollective::from_config(&config).context("creating rank group")?;

    let partials = vec![vec![1.0, 2.0], vec![3.0, -1.0], vec![0.5, 0.5]];

    let results: Vec<Vec<f64>> = thread::scope(|s| {
        let handles: Vec<_> = group
            .launch_contexts()
            .into_iter()
            .zip(partials)
            .map(|(ctx, mut buffer)| {
                let logger = &logger;
                s.spawn(move || {
                    sum_all_reduce(&ctx, &mut buffer, 2, logger);
                    buffer
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join()).collect::<Result<_, _>>()
    })
    .map_err(|_| anyhow::anyhow!("a rank aborted"))?;

    for (rank, result) in results.iter().enumerate() {
        logger.info(&format!("rank {}: {:?}", rank, result));
    }

    if results.iter().any(|r| r != &vec![4.5, 1.5]) {
        bail!("ranks disagree on the sum: {:?}", results);
    }
    Ok(())
}
