//! Error types for the memoization cache
//!
//! Provides unified error handling using thiserror.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache key derivation, encoding and storage.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A value could not be encoded or decoded by the result codec
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Filesystem access failed
    #[error("I/O {operation} failed for {}: {source}", path.display())]
    Io {
        /// Operation that failed (e.g. "read", "rename", "create_dir")
        operation: &'static str,
        /// Path involved in the failed operation
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The configured cache path cannot hold cache entries
    #[error("Invalid cache directory: {0}")]
    InvalidCacheDir(String),

    /// The computation identifier cannot be used as a file name prefix
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A named argument's name is not a plain identifier
    #[error("Invalid argument name: {0:?}")]
    InvalidArgumentName(String),

    /// A stored entry exists but its header cannot be parsed
    #[error("Corrupt cache entry: {0}")]
    Corrupt(String),
}

impl CacheError {
    /// Creates an I/O error with path and operation context.
    pub fn io(operation: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<bincode::Error> for CacheError {
    fn from(err: bincode::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

// == Obtain Error ==
/// Error returned by [`MemoCache::obtain`](crate::MemoCache::obtain).
///
/// Keeps the wrapped computation's own failure separate from cache failures,
/// so a caller can always recover the original error unchanged.
#[derive(Error, Debug)]
pub enum ObtainError<E> {
    /// The wrapped computation failed; nothing was written to the store
    #[error("computation failed: {0}")]
    Compute(E),

    /// The cache itself failed (encoding, corrupt entry, unreadable store)
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl<E> ObtainError<E> {
    /// Returns the computation's error, if that is what failed.
    pub fn into_compute(self) -> Option<E> {
        match self {
            ObtainError::Compute(err) => Some(err),
            ObtainError::Cache(_) => None,
        }
    }

    /// Returns true if the failure came from the cache rather than the computation.
    pub fn is_cache_error(&self) -> bool {
        matches!(self, ObtainError::Cache(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
