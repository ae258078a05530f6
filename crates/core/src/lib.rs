//! Core types and configuration for the tickday pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Raw and session-filtered tick record types
//! - Per-day aggregation row types
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
