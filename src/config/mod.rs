//! Configuration management for the collective primitives.
//!
//! Covers the logging sink (name and verbosity) and the size of an
//! in-process rank group. Values come from defaults, a `.json`/`.toml` file,
//! the `BOOST_COLLECTIVE_*` environment variables or the builder.

pub mod core;

pub use self::core::{
    CollectiveConfig, ConfigBuilder, DEFAULT_NUM_RANKS, DEFAULT_VERBOSITY, ENV_LOGGER_NAME,
    ENV_NUM_RANKS, ENV_VERBOSITY,
};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "boost_collective.toml";
