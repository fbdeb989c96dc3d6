//! Sum all-reduce over the communicator of a task context.
//!
//! The reduction is an all-gather followed by a local sum. Every rank ends
//! up with the whole `num_ranks * count` staging buffer and folds it in the
//! same order (ranks ascending, then positions ascending), so all ranks
//! produce bit-identical results and reruns are reproducible. Swapping in a
//! tree or ring reduction changes the summation order and therefore the
//! floating-point result.

use crate::core::context::TaskContext;
use crate::core::error::{CollectiveError, Result};
use crate::core::network::{CollDataType, CollStatus, Communicator};
use crate::core::utils::log::{LogLevel, Logger};

/// Replace `buffer[..count]` with its elementwise sum across every rank of
/// the context's first communicator.
///
/// Returns without touching the buffer when the context has no
/// communicators. Every rank bound to the communicator must call this with
/// the same `count`, otherwise the transport fails or blocks.
///
/// # Panics
///
/// Aborts the calling task through [`Logger::fatal`] when `buffer` holds
/// fewer than `count` values or the all-gather does not succeed.
pub fn sum_all_reduce<C>(context: &C, buffer: &mut [f64], count: usize, logger: &Logger)
where
    C: TaskContext + ?Sized,
{
    crate::check_ge!(logger, buffer.len(), count);

    if let Err(err) = try_sum_all_reduce(context, buffer, count, logger) {
        logger.fatal_fmt(format_args!("sum_all_reduce: {}", err));
    }
}

/// Fallible form of [`sum_all_reduce`]. On error the buffer is left
/// unmodified.
pub fn try_sum_all_reduce<C>(
    context: &C,
    buffer: &mut [f64],
    count: usize,
    logger: &Logger,
) -> Result<()>
where
    C: TaskContext + ?Sized,
{
    if buffer.len() < count {
        return Err(CollectiveError::BufferTooShort {
            count,
            length: buffer.len(),
        });
    }

    let comm = match context.communicators().first() {
        Some(comm) => comm,
        None => return Ok(()),
    };
    let num_ranks = context.launch_domain().volume();

    let staging_len = num_ranks.checked_mul(count).ok_or_else(|| {
        CollectiveError::invalid_parameter(
            "count",
            count.to_string(),
            format!("staging for {} ranks overflows usize", num_ranks),
        )
    })?;
    let mut gather_result: Vec<f64> = Vec::new();
    gather_result.try_reserve_exact(staging_len).map_err(|e| {
        CollectiveError::invalid_parameter(
            "count",
            count.to_string(),
            format!("cannot allocate staging for {} ranks: {}", num_ranks, e),
        )
    })?;
    gather_result.resize(staging_len, 0.0);
    let status = match comm {
        Communicator::Cpu(cpu) => {
            cpu.all_gather(&buffer[..count], &mut gather_result, count, CollDataType::Float64)
        }
    };
    if status != CollStatus::Success {
        return Err(CollectiveError::transport(status, "CPU communicator failed."));
    }

    accumulate_blocks(&gather_result, &mut buffer[..count], num_ranks)?;

    if logger.enabled(LogLevel::Debug) {
        logger.debug(&format!(
            "sum_all_reduce: reduced {} values across {} ranks",
            count, num_ranks
        ));
    }
    Ok(())
}

/// Fold `num_ranks` contiguous blocks of `out.len()` values into `out`.
///
/// `out` is zeroed first. Rank order is the outer loop and position the
/// inner one; this order is part of the result's definition.
pub fn accumulate_blocks(staging: &[f64], out: &mut [f64], num_ranks: usize) -> Result<()> {
    let count = out.len();
    match num_ranks.checked_mul(count) {
        Some(expected) if expected == staging.len() => {}
        Some(expected) => {
            return Err(CollectiveError::StagingSizeMismatch {
                expected,
                actual: staging.len(),
            })
        }
        None => {
            return Err(CollectiveError::invalid_parameter(
                "num_ranks",
                num_ranks.to_string(),
                format!("blocks of {} values overflow usize", count),
            ))
        }
    }

    out.fill(0.0);
    if count == 0 {
        return Ok(());
    }
    for block in staging.chunks_exact(count) {
        for (acc, &value) in out.iter_mut().zip(block) {
            *acc += value;
        }
    }
    Ok(())
}
