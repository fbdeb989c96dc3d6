//! Core infrastructure for the collective primitives.
//!
//! # Organization
//!
//! - [`error`]: Error type and `Result` alias
//! - [`network`]: Transport trait, communicator handles and the in-process
//!   shared-memory transport
//! - [`context`]: Task context and launch domain
//! - [`allreduce`]: The sum all-reduce itself
//! - [`utils`]: Logging sink and check macros
//!
//! # Usage
//!
//! ```rust
//! use boost_collective::core::{
//!     allreduce::sum_all_reduce,
//!     context::LaunchContext,
//!     utils::log::Logger,
//! };
//!
//! let logger = Logger::default();
//! let mut gradients = vec![0.25, -1.0];
//!
//! // Without communicators the reduction is the identity
//! sum_all_reduce(&LaunchContext::single(), &mut gradients, 2, &logger);
//! assert_eq!(gradients, vec![0.25, -1.0]);
//! ```

pub mod allreduce;
pub mod context;
pub mod error;
pub mod network;
pub mod utils;

// Re-export commonly used items for convenience
pub use allreduce::{sum_all_reduce, try_sum_all_reduce};
pub use context::{Domain, LaunchContext, TaskContext};
pub use error::{CollectiveError, Result};
pub use network::{
    CollDataType, CollStatus, CollectiveTransport, Communicator, CpuCommunicator,
    LocalCollective, LocalRank,
};
pub use utils::log::{LogLevel, Logger};
