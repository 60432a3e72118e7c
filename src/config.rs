//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default directory for cache entries, relative to the working directory.
pub const DEFAULT_CACHE_PATH: &str = "cache";

// == Key Scope ==
/// Which part of an [`Identifier`](crate::Identifier) participates in cache keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyScope {
    /// Only the bare computation name. Two computations sharing a name share entries.
    #[default]
    Name,
    /// The module path plus the name, when the identifier carries a module path.
    Qualified,
}

impl FromStr for KeyScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(KeyScope::Name),
            "qualified" => Ok(KeyScope::Qualified),
            other => Err(format!("unknown key scope: {other}")),
        }
    }
}

/// Memoization cache configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct MemoConfig {
    /// Directory holding cache entries; created if absent
    pub cache_path: PathBuf,
    /// How long an entry stays usable, None = forever
    pub invalidation_period: Option<Duration>,
    /// Report hits, misses and writes at info level instead of debug
    pub verbose: bool,
    /// Identifier scope used for key derivation
    pub key_scope: KeyScope,
}

impl MemoConfig {
    /// Creates a config rooted at `cache_path` with all other values defaulted.
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            ..Self::default()
        }
    }

    /// Sets the validity window applied when no per-call TTL is given.
    pub fn with_invalidation_period(mut self, period: Duration) -> Self {
        self.invalidation_period = Some(period);
        self
    }

    /// Toggles verbose diagnostics.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Selects how identifiers are turned into key prefixes.
    pub fn with_key_scope(mut self, key_scope: KeyScope) -> Self {
        self.key_scope = key_scope;
        self
    }

    /// Creates a new MemoConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MEMO_CACHE_PATH` - Cache directory (default: `cache`)
    /// - `MEMO_INVALIDATION_PERIOD` - Validity window in seconds, fractional allowed (default: unset)
    /// - `MEMO_VERBOSE` - `true`/`1` enables verbose diagnostics (default: false)
    /// - `MEMO_KEY_SCOPE` - `name` or `qualified` (default: name)
    ///
    /// Unparsable or negative values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_path: env::var("MEMO_CACHE_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_path),
            invalidation_period: env::var("MEMO_INVALIDATION_PERIOD")
                .ok()
                .and_then(|v| parse_period(&v)),
            verbose: env::var("MEMO_VERBOSE")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.verbose),
            key_scope: env::var("MEMO_KEY_SCOPE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.key_scope),
        }
    }
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            invalidation_period: None,
            verbose: false,
            key_scope: KeyScope::Name,
        }
    }
}

/// Parses a non-negative number of seconds into a Duration.
fn parse_period(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = MemoConfig::default();
        assert_eq!(config.cache_path, PathBuf::from("cache"));
        assert!(config.invalidation_period.is_none());
        assert!(!config.verbose);
        assert_eq!(config.key_scope, KeyScope::Name);
    }

    #[test]
    fn test_config_builders() {
        let config = MemoConfig::new("/tmp/memo")
            .with_invalidation_period(Duration::from_secs(5))
            .with_verbose(true)
            .with_key_scope(KeyScope::Qualified);

        assert_eq!(config.cache_path, PathBuf::from("/tmp/memo"));
        assert_eq!(config.invalidation_period, Some(Duration::from_secs(5)));
        assert!(config.verbose);
        assert_eq!(config.key_scope, KeyScope::Qualified);
    }

    // All environment manipulation lives in one test so parallel tests cannot race on it.
    #[test]
    fn test_config_from_env() {
        env::remove_var("MEMO_CACHE_PATH");
        env::remove_var("MEMO_INVALIDATION_PERIOD");
        env::remove_var("MEMO_VERBOSE");
        env::remove_var("MEMO_KEY_SCOPE");

        let config = MemoConfig::from_env();
        assert_eq!(config.cache_path, PathBuf::from("cache"));
        assert!(config.invalidation_period.is_none());
        assert!(!config.verbose);
        assert_eq!(config.key_scope, KeyScope::Name);

        env::set_var("MEMO_CACHE_PATH", "/var/tmp/memo");
        env::set_var("MEMO_INVALIDATION_PERIOD", "1.5");
        env::set_var("MEMO_VERBOSE", "true");
        env::set_var("MEMO_KEY_SCOPE", "Qualified");

        let config = MemoConfig::from_env();
        assert_eq!(config.cache_path, PathBuf::from("/var/tmp/memo"));
        assert_eq!(config.invalidation_period, Some(Duration::from_millis(1500)));
        assert!(config.verbose);
        assert_eq!(config.key_scope, KeyScope::Qualified);

        env::set_var("MEMO_INVALIDATION_PERIOD", "-3");
        env::set_var("MEMO_VERBOSE", "maybe");
        env::set_var("MEMO_KEY_SCOPE", "module");

        let config = MemoConfig::from_env();
        assert!(config.invalidation_period.is_none());
        assert!(!config.verbose);
        assert_eq!(config.key_scope, KeyScope::Name);

        env::remove_var("MEMO_CACHE_PATH");
        env::remove_var("MEMO_INVALIDATION_PERIOD");
        env::remove_var("MEMO_VERBOSE");
        env::remove_var("MEMO_KEY_SCOPE");
    }

    #[test]
    fn test_parse_period() {
        assert_eq!(parse_period("0"), Some(Duration::ZERO));
        assert_eq!(parse_period(" 2 "), Some(Duration::from_secs(2)));
        assert_eq!(parse_period("abc"), None);
        assert_eq!(parse_period("NaN"), None);
    }
}
