use std::io;
use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Run errors
// =============================================================================

/// Errors raised by a single sort run or by the synchronizer.
///
/// `OutOfRange` and `InvalidBounds` stay local to the run that produced them.
/// `SynchronizerMisuse` means the coordination itself is broken.
#[derive(Error, Debug)]
pub enum SortError {
    #[error("index {index} is out of range for an array of length {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("invalid bounds: lo ({lo}) is greater than hi ({hi})")]
    InvalidBounds { lo: usize, hi: usize },

    #[error("synchronizer misuse: {operation} called for {participant}")]
    SynchronizerMisuse {
        participant: String,
        operation: &'static str,
    },

    #[error("failed to spawn sort thread: {0}")]
    Spawn(#[from] io::Error),
}

impl SortError {
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Self::OutOfRange { index, len }
    }

    pub fn misuse(participant: impl std::fmt::Debug, operation: &'static str) -> Self {
        Self::SynchronizerMisuse {
            participant: format!("{participant:?}"),
            operation,
        }
    }

    /// Misuse indicates a coordination bug rather than a runtime condition.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SynchronizerMisuse { .. })
    }
}

// =============================================================================
// Configuration errors
// =============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
