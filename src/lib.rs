//! # Boost Collective
//!
//! Deterministic sum all-reduce for data-parallel tasks.
//!
//! Each rank of a launch owns a buffer of `f64` partial results (gradient
//! sums, histogram statistics, ...). [`sum_all_reduce`] replaces that buffer
//! with the elementwise sum over every rank, identically on all of them. The
//! reduction gathers every rank's buffer and sums locally in a fixed order,
//! so results are bit-for-bit reproducible.
//!
//! ## Quick Start
//!
//! ```rust
//! use boost_collective::{sum_all_reduce, ConfigBuilder, LocalCollective, Logger};
//! use std::thread;
//!
//! # fn main() -> boost_collective::Result<()> {
//! let config = ConfigBuilder::new().num_ranks(3).build()?;
//! let logger = Logger::from_config(&config);
//! let group = LocalCollective::from_config(&config)?;
//!
//! let inputs = [[1.0, 2.0], [3.0, -1.0], [0.5, 0.5]];
//! thread::scope(|s| {
//!     for (ctx, input) in group.launch_contexts().into_iter().zip(inputs) {
//!         let logger = &logger;
//!         s.spawn(move || {
//!             let mut buffer = input;
//!             sum_all_reduce(&ctx, &mut buffer, 2, logger);
//!             assert_eq!(buffer, [4.5, 1.5]);
//!         });
//!     }
//! });
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: error type, transport and communicator handles, task context,
//!   the reduction and the logging sink
//! - [`config`]: configuration loading and validation

#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    non_snake_case,
    non_upper_case_globals
)]

pub mod config;
pub mod core;

pub use crate::config::{CollectiveConfig, ConfigBuilder};
pub use crate::core::{
    allreduce::{accumulate_blocks, sum_all_reduce, try_sum_all_reduce},
    context::{Domain, LaunchContext, TaskContext},
    error::{CollectiveError, Result},
    network::{
        CollDataType, CollStatus, CollectiveTransport, Communicator, CpuCommunicator,
        LocalCollective, LocalRank,
    },
    utils::log::{LogCallback, LogLevel, Logger},
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
