//! Cache provider selection
//!
//! `orm.cache.provider` picks one of the cache backends; its parameters live
//! in a sibling block named after the provider:
//!
//! ```yaml
//! orm:
//!   cache:
//!     provider: redis
//!     redis:
//!       host: 127.0.0.1
//!       port: 6379
//!       timeout: 2.5
//!       retry_interval: 100
//!       dbIndex: 1
//! ```
//!
//! Resolution here is pure: it builds a [`CacheProviderSpec`] and never
//! touches the network. Connecting happens later in
//! [`crate::client::CacheConnector`].

use crate::error::{ResolveError, ResolveResult};
use ormwire_core::coerce::{as_f64, as_string, as_u64, lookup};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Default file extension for filesystem cache entries
pub const DEFAULT_FILE_EXTENSION: &str = ".cache.data";

/// Default Redis port
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Default Memcache port
pub const DEFAULT_MEMCACHE_PORT: u16 = 11211;

/// Default Memcache connect timeout in seconds
pub const DEFAULT_MEMCACHE_TIMEOUT: f64 = 1.0;

/// Selected cache backend and its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum CacheProviderSpec {
    /// No caching layer
    None,
    /// Process-local in-memory cache
    Array,
    /// One file per entry under a directory
    #[serde(rename = "file")]
    Filesystem(FilesystemParams),
    /// Redis server
    Redis(RedisParams),
    /// Memcache server
    #[serde(rename = "memcached")]
    Memcache(MemcacheParams),
}

/// Filesystem cache parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesystemParams {
    pub directory: PathBuf,
    pub extension: String,
}

/// Redis client parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedisParams {
    pub host: String,
    pub port: u16,
    /// Connect timeout in seconds; `0` means no timeout
    pub timeout: f64,
    /// Delay before the single reconnect attempt, in milliseconds; `0` disables the retry
    pub retry_interval: u64,
    /// Database selected after connecting
    #[serde(rename = "dbIndex")]
    pub db_index: u32,
}

/// Memcache client parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemcacheParams {
    pub host: String,
    pub port: u16,
    /// Connect timeout in seconds
    pub timeout: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

impl CacheProviderSpec {
    /// Canonical provider name
    pub fn provider_name(&self) -> &'static str {
        match self {
            CacheProviderSpec::None => "none",
            CacheProviderSpec::Array => "array",
            CacheProviderSpec::Filesystem(_) => "file",
            CacheProviderSpec::Redis(_) => "redis",
            CacheProviderSpec::Memcache(_) => "memcached",
        }
    }

    /// Whether a caching layer is configured at all
    pub fn is_enabled(&self) -> bool {
        !matches!(self, CacheProviderSpec::None)
    }
}

impl Default for CacheProviderSpec {
    fn default() -> Self {
        Self::None
    }
}

/// Build a cache provider spec from the `orm.cache` block
///
/// An absent or unrecognized `provider` yields [`CacheProviderSpec::None`].
/// A recognized provider with a required parameter missing is an error.
pub fn resolve_cache_provider(raw: &Value) -> ResolveResult<CacheProviderSpec> {
    let provider = match lookup(raw, &["provider"]).and_then(as_string) {
        Some(provider) => provider,
        None => {
            tracing::debug!("No cache provider configured");
            return Ok(CacheProviderSpec::None);
        }
    };

    let canonical = match provider.as_str() {
        "array" => "array",
        "file" | "filesystem" => "file",
        "redis" => "redis",
        "memcached" => "memcached",
        other => {
            tracing::warn!("Unknown cache provider '{}', caching disabled", other);
            return Ok(CacheProviderSpec::None);
        }
    };

    let empty = Value::Object(Default::default());
    let params = lookup(raw, &[provider.as_str(), canonical]).unwrap_or(&empty);
    let section = format!("orm.cache.{}", provider);

    let spec = match canonical {
        "array" => CacheProviderSpec::Array,
        "file" => CacheProviderSpec::Filesystem(FilesystemParams {
            directory: required_string(params, &section, &["directory", "path"])?.into(),
            extension: optional_string(params, &["extension"])
                .unwrap_or_else(|| DEFAULT_FILE_EXTENSION.to_string()),
        }),
        "redis" => CacheProviderSpec::Redis(RedisParams {
            host: required_string(params, &section, &["host"])?,
            port: optional_port(params, &section)?.unwrap_or(DEFAULT_REDIS_PORT),
            timeout: optional_f64(params, &section, &["timeout"])?.unwrap_or(0.0),
            retry_interval: optional_u64(params, &section, &["retry_interval", "retryInterval"])?
                .unwrap_or(0),
            db_index: optional_u32(params, &section, &["dbIndex", "db_index"])?.unwrap_or(0),
        }),
        _ => CacheProviderSpec::Memcache(MemcacheParams {
            host: required_string(params, &section, &["host"])?,
            port: optional_port(params, &section)?.unwrap_or(DEFAULT_MEMCACHE_PORT),
            timeout: optional_f64(params, &section, &["timeout"])?
                .unwrap_or(DEFAULT_MEMCACHE_TIMEOUT),
            weight: optional_u32(params, &section, &["weight"])?,
        }),
    };

    tracing::debug!("Resolved cache provider '{}'", spec.provider_name());
    Ok(spec)
}

fn required_string(params: &Value, section: &str, keys: &[&str]) -> ResolveResult<String> {
    optional_string(params, keys)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ResolveError::missing(section, keys[0]))
}

fn optional_string(params: &Value, keys: &[&str]) -> Option<String> {
    lookup(params, keys).and_then(as_string)
}

fn optional_u64(params: &Value, section: &str, keys: &[&str]) -> ResolveResult<Option<u64>> {
    match lookup(params, keys) {
        None => Ok(None),
        Some(value) => as_u64(value).map(Some).ok_or_else(|| {
            ResolveError::invalid(
                format!("{}.{}", section, keys[0]),
                format!("expected a non-negative integer, got {}", value),
            )
        }),
    }
}

fn optional_u32(params: &Value, section: &str, keys: &[&str]) -> ResolveResult<Option<u32>> {
    match optional_u64(params, section, keys)? {
        None => Ok(None),
        Some(n) => u32::try_from(n).map(Some).map_err(|_| {
            ResolveError::invalid(format!("{}.{}", section, keys[0]), "value out of range")
        }),
    }
}

fn optional_port(params: &Value, section: &str) -> ResolveResult<Option<u16>> {
    match optional_u64(params, section, &["port"])? {
        None => Ok(None),
        Some(n) => u16::try_from(n)
            .map(Some)
            .map_err(|_| ResolveError::invalid(format!("{}.port", section), "not a port number")),
    }
}

fn optional_f64(params: &Value, section: &str, keys: &[&str]) -> ResolveResult<Option<f64>> {
    match lookup(params, keys) {
        None => Ok(None),
        Some(value) => as_f64(value)
            .filter(|f| f.is_finite() && *f >= 0.0)
            .filter(|f| std::time::Duration::try_from_secs_f64(*f).is_ok())
            .map(Some)
            .ok_or_else(|| {
                ResolveError::invalid(
                    format!("{}.{}", section, keys[0]),
                    format!("expected a non-negative number of seconds, got {}", value),
                )
            }),
    }
}
