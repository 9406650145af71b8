//! Cache client instantiation
//!
//! [`crate::cache::resolve_cache_provider`] only describes the backend. This
//! module turns a [`CacheProviderSpec`] into a live cache handle, which for
//! Redis and Memcache means opening a network connection. Keeping the two
//! steps apart lets resolution be tested without a server.

use crate::cache::{CacheProviderSpec, FilesystemParams, MemcacheParams, RedisParams};
use crate::error::{ResolveError, ResolveResult};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpStream;

/// Cache handle handed to the ORM
///
/// The ORM owns the caching semantics; this layer only constructs the
/// backend and tells it apart.
pub trait CacheBackend: Send + Sync + fmt::Debug {
    /// Canonical provider name (`array`, `file`, `redis`, `memcached`)
    fn provider(&self) -> &'static str;
}

/// Cache handle shared by the metadata, query and result cache roles
pub type SharedCache = Arc<dyn CacheBackend>;

/// Process-local in-memory cache
#[derive(Debug, Default)]
pub struct ArrayCache;

impl ArrayCache {
    pub fn new() -> Self {
        Self
    }
}

impl CacheBackend for ArrayCache {
    fn provider(&self) -> &'static str {
        "array"
    }
}

/// Filesystem cache rooted at a directory
#[derive(Debug)]
pub struct FilesystemCache {
    directory: PathBuf,
    extension: String,
}

impl FilesystemCache {
    /// Create the cache, making sure the directory exists
    pub async fn open(params: &FilesystemParams) -> ResolveResult<Self> {
        tokio::fs::create_dir_all(&params.directory)
            .await
            .map_err(|e| connection_error("file", e))?;

        Ok(Self {
            directory: params.directory.clone(),
            extension: params.extension.clone(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl CacheBackend for FilesystemCache {
    fn provider(&self) -> &'static str {
        "file"
    }
}

/// Redis cache over a multiplexed connection
pub struct RedisCache {
    params: RedisParams,
    connection: redis::aio::MultiplexedConnection,
}

impl RedisCache {
    /// Connect and select the configured database
    ///
    /// A failed first attempt is retried once after `retry_interval`
    /// milliseconds when that interval is non-zero.
    pub async fn connect(params: &RedisParams) -> ResolveResult<Self> {
        let url = format!("redis://{}:{}/{}", params.host, params.port, params.db_index);
        let client = redis::Client::open(url.as_str()).map_err(|e| connection_error("redis", e))?;

        tracing::info!(
            "Connecting to redis at {}:{} (db {})",
            params.host,
            params.port,
            params.db_index
        );

        let connection = match with_timeout(
            "redis",
            params.timeout,
            client.get_multiplexed_async_connection(),
        )
        .await
        {
            Ok(connection) => connection,
            Err(err) if params.retry_interval > 0 => {
                tracing::warn!(
                    "Redis connection failed ({}), retrying in {}ms",
                    err,
                    params.retry_interval
                );
                tokio::time::sleep(Duration::from_millis(params.retry_interval)).await;
                with_timeout(
                    "redis",
                    params.timeout,
                    client.get_multiplexed_async_connection(),
                )
                .await?
            }
            Err(err) => return Err(err),
        };

        Ok(Self {
            params: params.clone(),
            connection,
        })
    }

    pub fn params(&self) -> &RedisParams {
        &self.params
    }

    /// Clone of the underlying connection for direct commands
    pub fn connection(&self) -> redis::aio::MultiplexedConnection {
        self.connection.clone()
    }
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl CacheBackend for RedisCache {
    fn provider(&self) -> &'static str {
        "redis"
    }
}

/// Memcache cache over a TCP connection
#[derive(Debug)]
pub struct MemcacheCache {
    params: MemcacheParams,
    stream: tokio::sync::Mutex<TcpStream>,
}

impl MemcacheCache {
    /// Open the TCP connection within the configured timeout
    pub async fn connect(params: &MemcacheParams) -> ResolveResult<Self> {
        tracing::info!("Connecting to memcached at {}:{}", params.host, params.port);

        let stream = with_timeout(
            "memcached",
            params.timeout,
            TcpStream::connect((params.host.as_str(), params.port)),
        )
        .await?;

        Ok(Self {
            params: params.clone(),
            stream: tokio::sync::Mutex::new(stream),
        })
    }

    pub fn params(&self) -> &MemcacheParams {
        &self.params
    }

    /// Exclusive access to the underlying stream
    pub async fn stream(&self) -> tokio::sync::MutexGuard<'_, TcpStream> {
        self.stream.lock().await
    }
}

impl CacheBackend for MemcacheCache {
    fn provider(&self) -> &'static str {
        "memcached"
    }
}

/// Turns cache specs into live cache handles
#[async_trait]
pub trait CacheConnector: Send + Sync {
    /// Instantiate the backend; [`CacheProviderSpec::None`] yields `None`
    async fn connect(&self, spec: &CacheProviderSpec) -> ResolveResult<Option<SharedCache>>;
}

/// Connector that opens real connections
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkCacheConnector;

#[async_trait]
impl CacheConnector for NetworkCacheConnector {
    async fn connect(&self, spec: &CacheProviderSpec) -> ResolveResult<Option<SharedCache>> {
        let cache: SharedCache = match spec {
            CacheProviderSpec::None => return Ok(None),
            CacheProviderSpec::Array => Arc::new(ArrayCache::new()),
            CacheProviderSpec::Filesystem(params) => Arc::new(FilesystemCache::open(params).await?),
            CacheProviderSpec::Redis(params) => Arc::new(RedisCache::connect(params).await?),
            CacheProviderSpec::Memcache(params) => Arc::new(MemcacheCache::connect(params).await?),
        };

        Ok(Some(cache))
    }
}

/// Stand-in backend returned by [`MockCacheConnector`]
#[derive(Debug)]
pub struct StubCache {
    provider: &'static str,
}

impl CacheBackend for StubCache {
    fn provider(&self) -> &'static str {
        self.provider
    }
}

/// Mock connector for testing
///
/// Records every spec it is asked to connect and returns a [`StubCache`]
/// without any I/O, or fails every call when built with [`Self::failing`].
#[derive(Debug, Default)]
pub struct MockCacheConnector {
    requests: Mutex<Vec<CacheProviderSpec>>,
    failure: Option<String>,
}

impl MockCacheConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector whose every connection attempt fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            failure: Some(message.into()),
        }
    }

    /// Specs requested so far
    pub fn requests(&self) -> Vec<CacheProviderSpec> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CacheConnector for MockCacheConnector {
    async fn connect(&self, spec: &CacheProviderSpec) -> ResolveResult<Option<SharedCache>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(spec.clone());
        }

        if !spec.is_enabled() {
            return Ok(None);
        }

        if let Some(message) = &self.failure {
            return Err(ResolveError::CacheConnection {
                provider: spec.provider_name().to_string(),
                message: message.clone(),
            });
        }

        Ok(Some(Arc::new(StubCache {
            provider: spec.provider_name(),
        })))
    }
}

fn connection_error(provider: &str, err: impl fmt::Display) -> ResolveError {
    ResolveError::CacheConnection {
        provider: provider.to_string(),
        message: err.to_string(),
    }
}

/// Await `fut`, bounded by `seconds` when it is positive
async fn with_timeout<T, E, F>(provider: &str, seconds: f64, fut: F) -> ResolveResult<T>
where
    E: fmt::Display,
    F: Future<Output = Result<T, E>>,
{
    if seconds > 0.0 || !seconds.is_finite() {
        let limit = Duration::try_from_secs_f64(seconds)
            .map_err(|e| connection_error(provider, format!("invalid timeout {}: {}", seconds, e)))?;
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(|e| connection_error(provider, e)),
            Err(_) => Err(connection_error(
                provider,
                format!("timed out after {}s", seconds),
            )),
        }
    } else {
        fut.await.map_err(|e| connection_error(provider, e))
    }
}
