//! Configuration resolver
//!
//! Reads the `db`, `orm` and `app` sections of [`Settings`] and produces
//! normalized specs. Everything here is a pure function of the settings;
//! the only I/O happens in [`ConfigurationResolver::assemble`], which
//! connects the cache client.

use crate::cache::{resolve_cache_provider, CacheProviderSpec};
use crate::client::CacheConnector;
use crate::configuration::OrmConfiguration;
use crate::connection::{resolve_connection, ConnectionConfig};
use crate::error::{ResolveError, ResolveResult};
use crate::metadata::{resolve_metadata_driver, MetadataDriverSpec};
use crate::options::{assemble_orm_options, OrmOptions};
use crate::prefix::{resolve_table_prefix_hook, TablePrefixHook};
use ormwire_core::coerce::{as_string, lookup};
use ormwire_core::Settings;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every spec resolved from one settings snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConfig {
    /// Name of the selected connection (`db.default`)
    pub connection_name: String,
    pub connection: ConnectionConfig,
    pub cache: CacheProviderSpec,
    pub metadata: MetadataDriverSpec,
    pub options: OrmOptions,
    pub table_prefix: TablePrefixHook,
    /// `app.debug`
    pub dev_mode: bool,
}

/// Resolves ORM bootstrap parameters from settings
///
/// # Example
///
/// ```rust
/// use ormwire_core::Settings;
/// use ormwire_resolver::{CacheProviderSpec, ConfigurationResolver};
///
/// let settings = Settings::from_yaml_str(r#"
/// db:
///   default: main
///   connections:
///     main: { driver: mysql, username: root, database: app }
/// orm:
///   cache: { provider: array }
///   metadata: { driver: yaml, paths: [config/mapping] }
/// "#).unwrap();
///
/// let resolved = ConfigurationResolver::new(settings).resolve().unwrap();
/// assert_eq!(resolved.connection.driver.as_deref(), Some("pdo_mysql"));
/// assert_eq!(resolved.connection.user.as_deref(), Some("root"));
/// assert_eq!(resolved.cache, CacheProviderSpec::Array);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigurationResolver {
    settings: Settings,
}

impl ConfigurationResolver {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Name of the default connection
    pub fn connection_name(&self) -> ResolveResult<String> {
        self.settings
            .string("db.default")?
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ResolveError::missing("db", "default"))
    }

    /// Raw block of the default connection
    fn connection_block(&self, name: &str) -> ResolveResult<Value> {
        let connections = self.settings.value("db.connections")?.unwrap_or(Value::Null);
        lookup(&connections, &[name])
            .filter(|block| block.is_object())
            .cloned()
            .ok_or_else(|| ResolveError::UnknownConnection(name.to_string()))
    }

    /// Normalized parameters of the default connection
    pub fn connection(&self) -> ResolveResult<ConnectionConfig> {
        let name = self.connection_name()?;
        let config = resolve_connection(&self.connection_block(&name)?)?;
        tracing::debug!("Resolved connection '{}'", name);
        Ok(config)
    }

    /// Table prefix from the connection block, falling back to `db.dbprefix`
    pub fn table_prefix(&self) -> ResolveResult<TablePrefixHook> {
        let name = self.connection_name()?;
        let from_connection = lookup(&self.connection_block(&name)?, &["prefix"]).and_then(as_string);
        let prefix = match from_connection {
            Some(prefix) => Some(prefix),
            None => self.settings.string("db.dbprefix")?,
        };
        Ok(resolve_table_prefix_hook(prefix.as_deref()))
    }

    /// Cache provider from `orm.cache`
    pub fn cache_provider(&self) -> ResolveResult<CacheProviderSpec> {
        let raw = self.settings.value("orm.cache")?.unwrap_or(Value::Null);
        resolve_cache_provider(&raw)
    }

    /// Metadata driver from `orm.metadata`
    pub fn metadata_driver(&self) -> ResolveResult<MetadataDriverSpec> {
        let raw = self
            .settings
            .value("orm.metadata")?
            .ok_or_else(|| ResolveError::missing("orm", "metadata"))?;
        resolve_metadata_driver(&raw)
    }

    /// Whether `app.debug` is on
    pub fn dev_mode(&self) -> ResolveResult<bool> {
        Ok(self.settings.flag("app.debug", false)?)
    }

    /// ORM-wide options from `orm`
    pub fn orm_options(&self) -> ResolveResult<OrmOptions> {
        let raw = self
            .settings
            .value("orm")?
            .unwrap_or_else(|| Value::Object(Default::default()));
        assemble_orm_options(&raw, self.dev_mode()?)
    }

    /// Resolve every spec without any I/O
    pub fn resolve(&self) -> ResolveResult<ResolvedConfig> {
        let resolved = ResolvedConfig {
            connection_name: self.connection_name()?,
            connection: self.connection()?,
            cache: self.cache_provider()?,
            metadata: self.metadata_driver()?,
            options: self.orm_options()?,
            table_prefix: self.table_prefix()?,
            dev_mode: self.dev_mode()?,
        };

        tracing::info!(
            "Resolved ORM configuration: connection '{}', cache '{}', metadata '{}'",
            resolved.connection_name,
            resolved.cache.provider_name(),
            resolved.metadata.name()
        );
        Ok(resolved)
    }

    /// Resolve, then connect the cache client and assemble the configuration
    pub async fn assemble(&self, connector: &dyn CacheConnector) -> ResolveResult<OrmConfiguration> {
        OrmConfiguration::assemble(self.resolve()?, connector).await
    }
}
