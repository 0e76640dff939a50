//! # Arena Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Fixture grids, scenarios, and input scripts
//! - Determinism test harness for scripted and key-driven runs
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
