//! Assembled ORM configuration
//!
//! [`OrmConfiguration`] is what the external ORM bootstrap receives: the
//! resolved specs plus live objects (cache handle, event manager).

use crate::cache::CacheProviderSpec;
use crate::client::{ArrayCache, CacheConnector, SharedCache};
use crate::connection::ConnectionConfig;
use crate::error::ResolveResult;
use crate::events::EventManager;
use crate::metadata::MetadataDriverSpec;
use crate::options::OrmOptions;
use crate::resolver::ResolvedConfig;
use std::sync::Arc;

/// The three cache roles of the ORM
///
/// All roles point at the same instance; they are never independent copies.
#[derive(Debug, Clone, Default)]
pub struct CacheRoles {
    pub metadata: Option<SharedCache>,
    pub query: Option<SharedCache>,
    pub result: Option<SharedCache>,
}

impl CacheRoles {
    /// Wire one cache into every role
    pub fn shared(cache: Option<SharedCache>) -> Self {
        Self {
            metadata: cache.clone(),
            query: cache.clone(),
            result: cache,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.metadata.is_some()
    }

    /// Whether all three roles hold the identical instance (or are all empty)
    pub fn shares_instance(&self) -> bool {
        match (&self.metadata, &self.query, &self.result) {
            (Some(m), Some(q), Some(r)) => Arc::ptr_eq(m, q) && Arc::ptr_eq(m, r),
            (None, None, None) => true,
            _ => false,
        }
    }
}

/// Fully assembled configuration for the ORM bootstrap
#[derive(Debug, Clone)]
pub struct OrmConfiguration {
    pub connection: ConnectionConfig,
    pub metadata_driver: MetadataDriverSpec,
    pub options: OrmOptions,
    pub caches: CacheRoles,
    pub event_manager: EventManager,
    pub dev_mode: bool,
}

impl OrmConfiguration {
    /// Instantiate the cache client and wire everything together
    ///
    /// In dev mode without a configured cache, an in-memory array cache fills
    /// the cache roles.
    pub async fn assemble(
        resolved: ResolvedConfig,
        connector: &dyn CacheConnector,
    ) -> ResolveResult<Self> {
        let mut cache = connector.connect(&resolved.cache).await?;

        if cache.is_none() && resolved.dev_mode {
            tracing::debug!("Dev mode without cache provider, using array cache");
            cache = Some(Arc::new(ArrayCache::new()));
        }

        if let Some(cache) = &cache {
            tracing::info!("Using {} cache for metadata, query and result caching", cache.provider());
        }

        let event_manager = resolved.table_prefix.event_manager();

        Ok(Self {
            connection: resolved.connection,
            metadata_driver: resolved.metadata,
            options: resolved.options,
            caches: CacheRoles::shared(cache),
            event_manager,
            dev_mode: resolved.dev_mode,
        })
    }

    /// Provider of the wired cache, `none` when caching is off
    pub fn cache_provider(&self) -> &'static str {
        self.caches
            .metadata
            .as_ref()
            .map(|cache| cache.provider())
            .unwrap_or(CacheProviderSpec::None.provider_name())
    }
}
