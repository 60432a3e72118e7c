//! Cache Store Module
//!
//! Durable key-value layer backed by a directory of entry files.
//!
//! Each entry lives in `{root}/{prefix}.{digest}.cache`. Writes go to a
//! temporary file in the same directory and are renamed into place, so a
//! reader either sees the previous complete entry or the new complete entry.

use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::cache::entry::CacheEntry;
use crate::cache::key::{validate_prefix, CacheKey};
use crate::error::{CacheError, Result};

/// Prefix of in-flight temporary files; never matches an entry file name.
const TMP_PREFIX: &str = ".tmp";

// == Cache Store ==
/// Directory-backed store of cache entries, namespaced by identifier prefix.
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Directory holding entry files
    root: PathBuf,
}

impl CacheStore {
    // == Constructor ==
    /// Opens the store at `root`, creating the directory if absent.
    ///
    /// Fails immediately if the directory cannot be created, if the path
    /// exists but is not a directory, or if it is read-only.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        match fs::metadata(&root) {
            Ok(meta) if !meta.is_dir() => {
                return Err(CacheError::InvalidCacheDir(format!(
                    "{} exists but is not a directory",
                    root.display()
                )));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                fs::create_dir_all(&root).map_err(|e| CacheError::io("create_dir", &root, e))?;
                debug!("Created cache directory {}", root.display());
            }
            Err(e) => return Err(CacheError::io("stat", &root, e)),
        }

        // Permission bits alone ignore ownership and ACLs.
        tempfile::tempfile_in(&root).map_err(|e| {
            CacheError::InvalidCacheDir(format!("{} is not writable: {e}", root.display()))
        })?;

        Ok(Self { root })
    }

    /// Directory holding the entry files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of the entry file for `key`.
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    // == Exists ==
    /// Returns true if [`read`](Self::read) would find an entry for `key`.
    ///
    /// Only the header line is read. Unreadable or corrupt files count as
    /// absent here; `read` reports them as errors.
    pub fn exists(&self, key: &CacheKey) -> bool {
        matches!(self.read_header(key), Ok(Some(_)))
    }

    // == Read ==
    /// Reads the entry stored under `key`.
    ///
    /// Returns `Ok(None)` if there is no entry, if it was written in another
    /// format version, or if it records different arguments than `key` (a
    /// digest collision). I/O failures other than a missing file are errors.
    pub fn read(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io("read", &path, e)),
        };

        let Some(entry) = CacheEntry::from_bytes(key.digest(), &bytes)? else {
            return Ok(None);
        };
        if entry.key != *key {
            debug!(
                "Entry {} records arguments {} instead of {}, ignoring",
                key,
                entry.key.args(),
                key.args()
            );
            return Ok(None);
        }
        Ok(Some(entry))
    }

    // == Write ==
    /// Atomically writes `entry`, replacing any previous entry for its key.
    pub fn write(&self, entry: &CacheEntry) -> Result<()> {
        let path = self.entry_path(&entry.key);
        let bytes = entry.to_bytes()?;

        let mut tmp = tempfile::Builder::new()
            .prefix(TMP_PREFIX)
            .tempfile_in(&self.root)
            .map_err(|e| CacheError::io("create", &self.root, e))?;
        write_synced(&mut tmp, &bytes).map_err(|e| CacheError::io("write", tmp.path(), e))?;

        tmp.persist(&path)
            .map_err(|e| CacheError::io("rename", &path, e.error))?;
        trace!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    // == Age ==
    /// Time since the entry for `key` was created, or None if absent.
    ///
    /// Only the header line is read. Absent has the same meaning as for
    /// [`read`](Self::read).
    pub fn age(&self, key: &CacheKey) -> Result<Option<Duration>> {
        Ok(self.read_header(key)?.map(|entry| entry.age()))
    }

    // == Delete ==
    /// Removes the entry for `key`. Returns false if there was none.
    pub fn delete(&self, key: &CacheKey) -> Result<bool> {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io("remove", &path, e)),
        }
    }

    // == Delete All ==
    /// Removes every entry of the computation with identifier prefix `prefix`.
    ///
    /// Entries of other identifiers, including ones whose prefix merely starts
    /// with the same text, are left alone. Returns the number removed.
    pub fn delete_all(&self, prefix: &str) -> Result<usize> {
        let mut removed = 0;
        for (_, path) in self.entry_files(prefix)? {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                // Another process removed it first.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::io("remove", &path, e)),
            }
        }
        debug!("Removed {} entries for {}", removed, prefix);
        Ok(removed)
    }

    // == Entries ==
    /// Reads every current-format entry stored for `prefix`.
    pub fn entries(&self, prefix: &str) -> Result<Vec<CacheEntry>> {
        let mut entries = Vec::new();
        for (digest, path) in self.entry_files(prefix)? {
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(CacheError::io("read", &path, e)),
            };
            if let Some(entry) = CacheEntry::from_bytes(&digest, &bytes)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    // == Purge Older Than ==
    /// Removes the entries of `prefix` older than `max_age`.
    ///
    /// Returns the number of entries removed. Never called implicitly: the
    /// cache only drops entries when asked to.
    pub fn purge_older_than(&self, prefix: &str, max_age: Duration) -> Result<usize> {
        let expired: Vec<CacheEntry> = self
            .entries(prefix)?
            .into_iter()
            .filter(|entry| !entry.is_fresh(Some(max_age)))
            .collect();

        let mut removed = 0;
        for entry in expired {
            if self.delete(&entry.key)? {
                removed += 1;
            }
        }
        debug!("Purged {} expired entries for {}", removed, prefix);
        Ok(removed)
    }

    /// Parses just the header of the entry for `key`, with an empty payload.
    ///
    /// Applies the same format version and argument checks as `read`.
    fn read_header(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(key);
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io("open", &path, e)),
        };

        let mut line = Vec::new();
        BufReader::new(file)
            .read_until(b'\n', &mut line)
            .map_err(|e| CacheError::io("read", &path, e))?;

        let entry = CacheEntry::from_bytes(key.digest(), &line)?;
        Ok(entry.filter(|entry| entry.key == *key))
    }

    /// Lists `(digest, path)` of every entry file belonging to `prefix`.
    fn entry_files(&self, prefix: &str) -> Result<Vec<(String, PathBuf)>> {
        validate_prefix(prefix)?;
        let dir = fs::read_dir(&self.root).map_err(|e| CacheError::io("read_dir", &self.root, e))?;

        let mut files = Vec::new();
        for dir_entry in dir {
            let dir_entry = dir_entry.map_err(|e| CacheError::io("read_dir", &self.root, e))?;
            let file_name = dir_entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if let Some(digest) = CacheKey::digest_of_file(prefix, name) {
                files.push((digest.to_string(), dir_entry.path()));
            }
        }
        Ok(files)
    }
}

fn write_synced(tmp: &mut NamedTempFile, bytes: &[u8]) -> io::Result<()> {
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()
}
