//! Entity manager factory
//!
//! The factory owns the resolver and a bootstrap implementation for the
//! external ORM. The entity manager is built on first request and reused
//! afterwards; concurrent first requests still build it only once.

use crate::client::{CacheConnector, NetworkCacheConnector};
use crate::configuration::OrmConfiguration;
use crate::error::{ResolveError, ResolveResult};
use crate::resolver::ConfigurationResolver;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Bridge to the external ORM's bootstrap call
#[async_trait]
pub trait OrmBootstrap: Send + Sync {
    /// Handle produced by the ORM
    type EntityManager: Send + Sync;

    /// Build an entity manager from the assembled configuration
    async fn create(&self, configuration: OrmConfiguration) -> ResolveResult<Self::EntityManager>;
}

/// Builds the entity manager at most once
pub struct EntityManagerFactory<B: OrmBootstrap, C: CacheConnector = NetworkCacheConnector> {
    resolver: ConfigurationResolver,
    bootstrap: B,
    connector: C,
    entity_manager: OnceCell<Arc<B::EntityManager>>,
}

impl<B: OrmBootstrap> EntityManagerFactory<B, NetworkCacheConnector> {
    /// Create a factory that connects real cache clients
    pub fn new(resolver: ConfigurationResolver, bootstrap: B) -> Self {
        Self::with_connector(resolver, bootstrap, NetworkCacheConnector)
    }
}

impl<B: OrmBootstrap, C: CacheConnector> EntityManagerFactory<B, C> {
    /// Create a factory with a custom cache connector
    pub fn with_connector(resolver: ConfigurationResolver, bootstrap: B, connector: C) -> Self {
        Self {
            resolver,
            bootstrap,
            connector,
            entity_manager: OnceCell::new(),
        }
    }

    pub fn resolver(&self) -> &ConfigurationResolver {
        &self.resolver
    }

    /// Get the entity manager, building it on first call
    ///
    /// A failed build is not cached; the next call tries again.
    pub async fn entity_manager(&self) -> ResolveResult<Arc<B::EntityManager>> {
        self.entity_manager
            .get_or_try_init(|| async {
                let configuration = self.resolver.assemble(&self.connector).await?;
                tracing::info!("Creating entity manager");
                let entity_manager = self.bootstrap.create(configuration).await?;
                Ok::<_, ResolveError>(Arc::new(entity_manager))
            })
            .await
            .cloned()
    }

    /// Whether the entity manager has been built
    pub fn is_initialized(&self) -> bool {
        self.entity_manager.initialized()
    }
}
