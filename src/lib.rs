//! Disk Memo - Disk-persistent memoization for deterministic computations
//!
//! Wraps a computation so that repeated calls with equal arguments return a
//! stored result instead of re-running it, across process restarts. Entries
//! can be given a validity window after which they are recomputed.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{
    Args, BincodeCodec, CacheEntry, CacheKey, CacheStore, DebugRepr, Identifier, JsonCodec,
    KeyCodec, MemoCache, MemoStats, ResultCodec, SerdeRepr, StableRepr,
};
pub use config::{KeyScope, MemoConfig};
pub use error::{CacheError, ObtainError, Result};
