//! Memo Cache Module
//!
//! Ties key derivation, result encoding and the directory store together
//! behind a single get-or-compute call.
//!
//! Nothing is kept in memory between calls: every call re-reads the store, so
//! several processes sharing one cache directory always see each other's
//! writes. Concurrent misses on the same key are not coordinated; each caller
//! computes and writes, and the last completed write wins.

use std::convert::Infallible;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::cache::codec::{JsonCodec, ResultCodec};
use crate::cache::entry::CacheEntry;
use crate::cache::key::{Args, CacheKey, Identifier, KeyCodec};
use crate::cache::stats::{MemoStats, StatsRecorder};
use crate::cache::store::CacheStore;
use crate::config::MemoConfig;
use crate::error::{ObtainError, Result};

/// Logs at info level when verbose, debug otherwise.
macro_rules! diag {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

// == Memo Cache ==
/// Disk-persistent memoization of deterministic computations.
///
/// # Example
/// ```no_run
/// use disk_memo::{args, Identifier, MemoCache, MemoConfig};
///
/// let cache = MemoCache::open(MemoConfig::new("cache"))?;
/// let sum = cache.obtain_infallible(&Identifier::new("plus"), &args!(3, 2), || 3 + 2)?;
/// assert_eq!(sum, 5);
/// # Ok::<(), disk_memo::CacheError>(())
/// ```
#[derive(Debug)]
pub struct MemoCache<C: ResultCodec = JsonCodec> {
    store: CacheStore,
    keys: KeyCodec,
    codec: C,
    config: MemoConfig,
    stats: StatsRecorder,
}

impl MemoCache<JsonCodec> {
    // == Constructor ==
    /// Opens a JSON-encoded cache in `config.cache_path`, creating it if absent.
    pub fn open(config: MemoConfig) -> Result<Self> {
        Self::with_codec(config, JsonCodec)
    }
}

impl<C: ResultCodec> MemoCache<C> {
    /// Opens a cache that encodes results with `codec`.
    pub fn with_codec(config: MemoConfig, codec: C) -> Result<Self> {
        let store = CacheStore::open(&config.cache_path)?;
        diag!(
            config.verbose,
            "Opened memo cache at {} (codec {})",
            store.root().display(),
            codec.name()
        );
        Ok(Self {
            store,
            keys: KeyCodec::new(config.key_scope),
            codec,
            config,
            stats: StatsRecorder::default(),
        })
    }

    pub fn config(&self) -> &MemoConfig {
        &self.config
    }

    /// The underlying store, for out-of-band inspection and cleanup.
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Key under which `identifier` called with `args` is stored.
    pub fn key_for(&self, identifier: &Identifier, args: &Args) -> Result<CacheKey> {
        self.keys.derive(identifier, args)
    }

    // == Obtain ==
    /// Returns the stored result for `identifier`/`args`, computing it on a miss.
    ///
    /// Uses the configured `invalidation_period` as the validity window.
    /// See [`obtain_with_ttl`](Self::obtain_with_ttl).
    pub fn obtain<T, E, F>(
        &self,
        identifier: &Identifier,
        args: &Args,
        compute: F,
    ) -> std::result::Result<T, ObtainError<E>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        self.obtain_with_ttl(identifier, args, self.config.invalidation_period, compute)
    }

    /// Returns the stored result if it is younger than `ttl`, computing it otherwise.
    ///
    /// On a hit `compute` is not called at all. On a miss the fresh value is
    /// encoded and written; a failed write is logged and the value is still
    /// returned. If `compute` fails its error comes back unchanged as
    /// [`ObtainError::Compute`] and the store is left untouched.
    pub fn obtain_with_ttl<T, E, F>(
        &self,
        identifier: &Identifier,
        args: &Args,
        ttl: Option<Duration>,
        compute: F,
    ) -> std::result::Result<T, ObtainError<E>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        let verbose = self.config.verbose;
        let key = self.keys.derive(identifier, args)?;

        match self.store.read(&key)? {
            Some(entry) if entry.codec != self.codec.name() => {
                diag!(
                    verbose,
                    "Cache entry {} was written by codec {}, re-running {}",
                    key,
                    entry.codec,
                    identifier
                );
                self.stats.record_miss();
            }
            Some(entry) if entry.is_fresh(ttl) => {
                diag!(
                    verbose,
                    "Cache exists for {}, loading it from {}",
                    identifier,
                    key.file_name()
                );
                let value = self.codec.decode(&entry.payload)?;
                self.stats.record_hit();
                return Ok(value);
            }
            Some(entry) => {
                diag!(
                    verbose,
                    "Cache for {} is {:?} old and became invalid, re-running",
                    identifier,
                    entry.age()
                );
                self.stats.record_stale();
            }
            None => {
                diag!(verbose, "No cache exists for {}, running", identifier);
                self.stats.record_miss();
            }
        }

        let value = compute().map_err(ObtainError::Compute)?;
        let payload = self.codec.encode(&value)?;
        let entry = CacheEntry::new(key, self.codec.name(), payload);

        match self.store.write(&entry) {
            Ok(()) => diag!(
                verbose,
                "Stored result of {} in {}",
                identifier,
                entry.key.file_name()
            ),
            Err(err) => {
                warn!("Failed to store result of {}: {}", identifier, err);
                self.stats.record_write_failure();
            }
        }
        Ok(value)
    }

    /// Like [`obtain`](Self::obtain) for computations that cannot fail.
    pub fn obtain_infallible<T, F>(
        &self,
        identifier: &Identifier,
        args: &Args,
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        self.obtain(identifier, args, || Ok::<T, Infallible>(compute()))
            .map_err(|err| match err {
                ObtainError::Compute(never) => match never {},
                ObtainError::Cache(err) => err,
            })
    }

    // == Lookup ==
    /// Returns the stored result if one is fresh under `ttl`, without computing.
    pub fn lookup<T>(
        &self,
        identifier: &Identifier,
        args: &Args,
        ttl: Option<Duration>,
    ) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let key = self.keys.derive(identifier, args)?;
        match self.store.read(&key)? {
            Some(entry) if entry.codec == self.codec.name() && entry.is_fresh(ttl) => {
                Ok(Some(self.codec.decode(&entry.payload)?))
            }
            _ => Ok(None),
        }
    }

    // == Invalidate ==
    /// Removes every stored result of `identifier`.
    ///
    /// Use after changing a computation's logic; keys do not capture it.
    pub fn invalidate(&self, identifier: &Identifier) -> Result<usize> {
        let prefix = self.keys.prefix(identifier)?;
        let removed = self.store.delete_all(&prefix)?;
        diag!(
            self.config.verbose,
            "Invalidated {} entries for {}",
            removed,
            identifier
        );
        Ok(removed)
    }

    /// Removes results of `identifier` older than `max_age`.
    pub fn purge_older_than(&self, identifier: &Identifier, max_age: Duration) -> Result<usize> {
        let prefix = self.keys.prefix(identifier)?;
        self.store.purge_older_than(&prefix, max_age)
    }

    // == Stats ==
    /// Returns current counters for this cache value.
    pub fn stats(&self) -> MemoStats {
        self.stats.snapshot()
    }
}
