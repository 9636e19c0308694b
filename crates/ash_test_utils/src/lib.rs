//! # Ashfall Test Utilities
//!
//! Shared testing utilities for all crates:
//! - A scriptable mock world (terrain, units, presentation hooks)
//! - Missile type fixtures
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod world;

/// Re-export proptest for convenience.
pub use proptest;
