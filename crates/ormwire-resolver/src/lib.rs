//! ORM bootstrap configuration resolver
//!
//! This crate turns a key/value settings tree into everything an ORM needs to
//! start: normalized connection parameters, a cache backend, a metadata
//! driver, ORM-wide options and the table-prefix listener. It decides *which*
//! backend to construct and *what* to hand it; persistence itself belongs to
//! the ORM.
//!
//! # Pipeline
//!
//! ```text
//! Settings ──► ConfigurationResolver::resolve ──► ResolvedConfig   (pure)
//!                                                      │
//!                             CacheConnector::connect  ▼           (I/O)
//!                                                OrmConfiguration
//!                                                      │
//!                              OrmBootstrap::create    ▼
//!                                                 entity manager   (memoized)
//! ```
//!
//! # Settings schema
//!
//! | key | meaning |
//! |-----|---------|
//! | `db.default` | name of the connection to use |
//! | `db.connections.<name>` | `driver`, `host`, `port`, `user`/`username`, `password`/`pass`, `dbname`/`database`, `prefix` |
//! | `db.dbprefix` | table prefix when the connection sets none |
//! | `orm.cache.provider` | `array`, `file`/`filesystem`, `redis`, `memcached`; anything else disables caching |
//! | `orm.metadata` | `driver` (`annotation`, `yaml`, `xml`, `static`), `paths`, `simple` |
//! | `orm.proxy` / `orm.proxy_classes` | `directory`, `namespace`, `auto_generate` |
//! | `orm.default_repository`, `orm.sql_logger` | passed through |
//! | `orm.dql.*` | `datetime_functions`, `numeric_functions`, `string_functions`, `mapping_types` |
//! | `app.debug` | dev mode |
//!
//! # Example
//!
//! ```no_run
//! use ormwire_core::Settings;
//! use ormwire_resolver::{
//!     ConfigurationResolver, EntityManagerFactory, OrmBootstrap, OrmConfiguration, ResolveResult,
//! };
//!
//! struct Bootstrap;
//!
//! #[async_trait::async_trait]
//! impl OrmBootstrap for Bootstrap {
//!     type EntityManager = OrmConfiguration;
//!
//!     async fn create(&self, configuration: OrmConfiguration) -> ResolveResult<OrmConfiguration> {
//!         Ok(configuration)
//!     }
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = ConfigurationResolver::new(Settings::load("config/orm")?);
//! let factory = EntityManagerFactory::new(resolver, Bootstrap);
//!
//! let first = factory.entity_manager().await?;
//! let second = factory.entity_manager().await?;
//! assert!(std::sync::Arc::ptr_eq(&first, &second));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod configuration;
pub mod connection;
pub mod dql;
pub mod error;
pub mod events;
pub mod factory;
pub mod metadata;
pub mod options;
pub mod prefix;
pub mod resolver;

// Re-exports - Specs
pub use cache::{resolve_cache_provider, CacheProviderSpec, FilesystemParams, MemcacheParams, RedisParams};
pub use connection::{canonical_driver, resolve_connection, ConnectionConfig, DRIVER_ALIASES};
pub use metadata::{resolve_metadata_driver, MetadataDriverSpec};
pub use options::{assemble_orm_options, OrmOptions, ProxyOptions};
pub use prefix::{resolve_table_prefix_hook, TablePrefixHook, TablePrefixListener};

// Re-exports - DQL
pub use dql::{DqlFunctions, FunctionFamily, FunctionMap, TypeRegistry};

// Re-exports - Events
pub use events::{
    AssociationKind, AssociationMapping, ClassMetadata, Event, EventListener, EventManager,
    InheritanceType,
};

// Re-exports - Clients
pub use client::{
    ArrayCache, CacheBackend, CacheConnector, FilesystemCache, MemcacheCache, MockCacheConnector,
    NetworkCacheConnector, RedisCache, SharedCache, StubCache,
};

// Re-exports - Assembly
pub use configuration::{CacheRoles, OrmConfiguration};
pub use factory::{EntityManagerFactory, OrmBootstrap};
pub use resolver::{ConfigurationResolver, ResolvedConfig};

// Re-exports - Error
pub use error::{ResolveError, ResolveResult};
