//! Run configuration for one archiver invocation.
//!
//! # Invariants
//! - Exactly one operation per run, enforced by the `Operation` enum.
//! - The options value is built once at the CLI boundary and never mutated
//!   by the engine.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The one operation this invocation performs.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Print the archive's entries.
    List = 0,
    /// Materialize the archive's entries on the filesystem.
    Extract = 1,
    /// Serialize filesystem paths into a new archive.
    Create = 2,
}

/// Immutable options threaded through every engine call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchiveOptions {
    pub operation: Operation,
    /// The archive file to read or write.
    pub archive: PathBuf,
    /// Change to this directory before the operation, restore after.
    pub directory: Option<PathBuf>,
    /// Stage the archive through gzip on open/close.
    pub compress: bool,
    /// Long listing / per-entry extract trace.
    pub verbose: bool,
    /// Input paths for `Create`; empty otherwise.
    pub paths: Vec<PathBuf>,
}

/// Validation error for a freshly parsed configuration.
///
/// Treated as a usage mistake, not hostile input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionsError {
    /// `Create` was requested without any input paths.
    CreateWithoutPaths,
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionsError::CreateWithoutPaths => {
                write!(f, "refusing to create an empty archive: no input paths")
            }
        }
    }
}

impl ArchiveOptions {
    /// Validate cross-field invariants once at startup.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.operation == Operation::Create && self.paths.is_empty() {
            return Err(OptionsError::CreateWithoutPaths);
        }
        Ok(())
    }
}
