//! Cache Module
//!
//! Provides disk-persistent memoization: key derivation, result encoding,
//! the directory-backed store and the cache that ties them together.

mod codec;
mod entry;
mod key;
mod memo;
mod stats;
mod store;


// Re-export public types
pub use codec::{BincodeCodec, JsonCodec, ResultCodec};
pub use entry::{CacheEntry, FORMAT_VERSION};
pub use key::{Args, CacheKey, DebugRepr, Identifier, KeyCodec, SerdeRepr, StableRepr};
pub use key::{DIGEST_LEN, ENTRY_SUFFIX};
pub use memo::MemoCache;
pub use stats::MemoStats;
pub use store::CacheStore;
