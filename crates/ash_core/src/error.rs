//! Error types for the simulation core.
//!
//! Most failure modes in this crate are deliberately *not* errors:
//! out-of-map impacts and dead targets are silent no-ops, and contract
//! violations (mismatched slot pointers, exhausted pools) abort via
//! assertions. Only recoverable failures surface as [`SimError`].

use thiserror::Error;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for the missile simulation core.
#[derive(Debug, Error)]
pub enum SimError {
    /// A missile-type identifier could not be resolved.
    #[error("Unknown missile type: {0}")]
    UnknownMissileType(String),

    /// A missile-type identifier was registered twice.
    #[error("Duplicate missile type: {0}")]
    DuplicateMissileType(String),

    /// Failed to parse saved state or a data file.
    #[error("Failed to parse {what}: {message}")]
    ParseError {
        /// What was being parsed (save state, type definitions).
        what: String,
        /// Underlying parser message.
        message: String,
    },

    /// Failed to serialize state.
    #[error("Failed to serialize {what}: {message}")]
    SerializeError {
        /// What was being serialized.
        what: String,
        /// Underlying serializer message.
        message: String,
    },

    /// Save file version does not match this build.
    #[error("Save version mismatch: expected {expected}, got {got}")]
    SaveVersionMismatch {
        /// Version this build writes.
        expected: u32,
        /// Version found in the file.
        got: u32,
    },
}
