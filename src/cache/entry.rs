//! Cache Entry Module
//!
//! Defines a stored computation result and its on-disk format.
//!
//! An entry file holds one JSON header line followed by the raw encoded
//! payload:
//!
//! ```text
//! {"format":1,"prefix":"plus","args":"(3, 2){}","codec":"json","created_at":"..."}\n
//! <payload bytes>
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::key::CacheKey;
use crate::error::{CacheError, Result};

/// Version of the entry file layout. Entries with another version are ignored.
pub const FORMAT_VERSION: u32 = 1;

// == Cache Entry ==
/// A stored computation result with its metadata.
///
/// Entries are immutable once written; writing the same key again replaces the
/// whole file.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Key the entry was stored under
    pub key: CacheKey,
    /// Name of the codec that produced the payload
    pub codec: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Encoded result
    pub payload: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryHeader {
    format: u32,
    prefix: String,
    args: String,
    codec: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct VersionField {
    format: u32,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stamped with the current time.
    pub fn new(key: CacheKey, codec: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            key,
            codec: codec.into(),
            created_at: Utc::now(),
            payload,
        }
    }

    // == Age ==
    /// Time elapsed since the entry was created.
    ///
    /// Clamped to zero if the clock moved backwards since the write.
    pub fn age(&self) -> Duration {
        age_since(self.created_at)
    }

    // == Freshness ==
    /// Returns true if the entry is usable under `ttl`.
    ///
    /// No TTL means the entry never expires. Otherwise it stays fresh while
    /// its age is at most `ttl`.
    pub fn is_fresh(&self, ttl: Option<Duration>) -> bool {
        ttl.map_or(true, |ttl| self.age() <= ttl)
    }

    /// Serializes header and payload into the file layout.
    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>> {
        let header = EntryHeader {
            format: FORMAT_VERSION,
            prefix: self.key.prefix().to_string(),
            args: self.key.args().to_string(),
            codec: self.codec.clone(),
            created_at: self.created_at,
        };
        let mut bytes = serde_json::to_vec(&header)?;
        bytes.push(b'\n');
        bytes.extend_from_slice(&self.payload);
        Ok(bytes)
    }

    /// Parses an entry file stored under `digest`.
    ///
    /// Returns `Ok(None)` for entries written in another format version.
    pub(crate) fn from_bytes(digest: &str, bytes: &[u8]) -> Result<Option<Self>> {
        let split = bytes
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| CacheError::Corrupt(format!("entry {digest} has no header line")))?;
        let Some(header) = parse_header(digest, &bytes[..split])? else {
            return Ok(None);
        };

        Ok(Some(Self {
            key: CacheKey::from_parts(header.prefix, digest.to_string(), header.args),
            codec: header.codec,
            created_at: header.created_at,
            payload: bytes[split + 1..].to_vec(),
        }))
    }
}

fn parse_header(digest: &str, line: &[u8]) -> Result<Option<EntryHeader>> {
    let version: VersionField = serde_json::from_slice(line)
        .map_err(|e| CacheError::Corrupt(format!("entry {digest}: {e}")))?;
    if version.format != FORMAT_VERSION {
        tracing::trace!(
            "Ignoring entry {} with format version {}",
            digest,
            version.format
        );
        return Ok(None);
    }
    serde_json::from_slice(line)
        .map(Some)
        .map_err(|e| CacheError::Corrupt(format!("entry {digest}: {e}")))
}

// == Utility Functions ==
/// Elapsed time since `created_at`, zero if it lies in the future.
fn age_since(created_at: DateTime<Utc>) -> Duration {
    (Utc::now() - created_at).to_std().unwrap_or(Duration::ZERO)
}
