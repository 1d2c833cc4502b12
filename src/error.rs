/*
 * Copyright (c) 2020 - 2021.  Shoyo Inokuchi.
 * Please refer to github.com/shoyo/jin for more information about this project and its license.
 */

//! Crate-wide error taxonomy.
//!
//! Every public operation in this crate returns [`Result`]. There is no
//! partial-success status code; failures are reported through the
//! variant that best describes what went wrong.

use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: io::Error,
    },

    #[error("argument error: {0}")]
    Argument(String),

    #[error("state error: {0}")]
    State(String),

    #[error("capacity error: record needs {needed} bytes but only {available} are available")]
    Capacity { needed: usize, available: usize },

    #[error(transparent)]
    Index(#[from] IndexError),
}

impl EngineError {
    pub fn io(source: io::Error) -> Self {
        EngineError::Io { path: None, source }
    }

    pub fn io_at(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EngineError::Io {
            path: Some(path.into()),
            source,
        }
    }

    pub fn argument(msg: impl Into<String>) -> Self {
        EngineError::Argument(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        EngineError::State(msg.into())
    }

    pub fn capacity_unavailable(needed: usize, available: usize) -> Self {
        EngineError::Capacity { needed, available }
    }
}

impl From<io::Error> for EngineError {
    fn from(source: io::Error) -> Self {
        EngineError::io(source)
    }
}

/// Index-specific failures, corresponding 1:1 to the four error codes
/// (1-4) the index manager historically reported.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Code 1: a lookup or delete found no matching key.
    #[error("entry not found for the given key")]
    EntryNotFound,

    /// Code 2: a destroy was attempted while handles are still open.
    #[error("cannot destroy index file: handles are still open")]
    HandlesOpen,

    /// Code 3: a delete found the key but the stored RID didn't match.
    #[error("rid mismatch: key exists but points at a different record")]
    RidMismatch,

    /// Code 4: an insert found the key already present.
    #[error("duplicate key")]
    DuplicateKey,
}
