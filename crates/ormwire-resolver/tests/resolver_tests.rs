//! Integration tests for resolving a complete settings tree

use ormwire_core::Settings;
use ormwire_resolver::{
    CacheProviderSpec, ClassMetadata, ConfigurationResolver, MetadataDriverSpec,
    MockCacheConnector, RedisParams, ResolveError,
};
use std::path::PathBuf;

const CONFIG: &str = r#"
app:
  debug: false
db:
  default: mysql
  dbprefix: shop_
  connections:
    mysql:
      driver: mysql
      host: 127.0.0.1
      port: 3306
      username: shop
      pass: secret
      database: shop
      charset: utf8mb4
orm:
  cache:
    provider: redis
    redis:
      host: cache.internal
      port: 6380
      timeout: 2.5
      retry_interval: 100
      dbIndex: 4
  metadata:
    driver: annotation
    paths:
      - src/Entity
      - src/Legacy/Entity
    simple: false
  proxy_classes:
    directory: /var/cache/proxies
    namespace: Shop\Proxies
    auto_generate: true
  default_repository: Shop\Repository\BaseRepository
  dql:
    numeric_functions:
      SIN: Shop\Dql\Sin
      HAVERSINE: Shop\Dql\Haversine
    mapping_types:
      enum: string
"#;

fn resolver() -> ConfigurationResolver {
    ConfigurationResolver::new(Settings::from_yaml_str(CONFIG).unwrap())
}

#[test]
fn test_full_resolution() {
    let resolved = resolver().resolve().unwrap();

    assert_eq!(resolved.connection_name, "mysql");
    assert_eq!(resolved.connection.driver.as_deref(), Some("pdo_mysql"));
    assert_eq!(resolved.connection.port, Some(3306));
    assert_eq!(resolved.connection.user.as_deref(), Some("shop"));
    assert_eq!(resolved.connection.password.as_deref(), Some("secret"));
    assert_eq!(resolved.connection.dbname.as_deref(), Some("shop"));
    assert_eq!(
        resolved.connection.extra.get("charset"),
        Some(&serde_json::json!("utf8mb4"))
    );

    assert_eq!(
        resolved.cache,
        CacheProviderSpec::Redis(RedisParams {
            host: "cache.internal".to_string(),
            port: 6380,
            timeout: 2.5,
            retry_interval: 100,
            db_index: 4,
        })
    );

    assert_eq!(
        resolved.metadata,
        MetadataDriverSpec::Annotation {
            paths: vec![PathBuf::from("src/Entity"), PathBuf::from("src/Legacy/Entity")],
            simple: false,
        }
    );

    assert_eq!(resolved.options.proxy.directory, Some(PathBuf::from("/var/cache/proxies")));
    assert!(resolved.options.proxy.auto_generate);
    assert_eq!(resolved.options.default_repository, "Shop\\Repository\\BaseRepository");
    assert_eq!(
        resolved.options.functions.numeric.get("SIN").map(String::as_str),
        Some("Shop\\Dql\\Sin")
    );
    assert!(resolved.options.functions.numeric.contains_key("HAVERSINE"));
    assert_eq!(resolved.options.mapping_types.get("enum"), Some("string"));

    assert_eq!(resolved.table_prefix.prefix.as_deref(), Some("shop_"));
    assert!(!resolved.dev_mode);
}

#[test]
fn test_resolution_round_trips() {
    let first = resolver().resolve().unwrap();
    let second = resolver().resolve().unwrap();
    assert_eq!(first, second);

    let serialized = serde_json::to_string(&first).unwrap();
    let restored = serde_json::from_str(&serialized).unwrap();
    assert_eq!(first, restored);
}

#[tokio::test]
async fn test_assemble_shares_cache_and_registers_prefix() {
    let connector = MockCacheConnector::new();
    let configuration = resolver().assemble(&connector).await.unwrap();

    assert_eq!(configuration.cache_provider(), "redis");
    assert!(configuration.caches.shares_instance());
    assert_eq!(connector.requests().len(), 1);

    let mut metadata = ClassMetadata::new("Product", "products");
    configuration
        .event_manager
        .dispatch_load_class_metadata(&mut metadata);
    assert_eq!(metadata.table_name, "shop_products");
}

#[tokio::test]
async fn test_cache_connection_failure_propagates() {
    let connector = MockCacheConnector::failing("connection refused");
    let err = resolver().assemble(&connector).await.unwrap_err();

    assert!(matches!(err, ResolveError::CacheConnection { ref provider, .. } if provider == "redis"));
}

#[tokio::test]
async fn test_dev_mode_falls_back_to_array_cache() {
    let settings = Settings::from_yaml_str(
        r#"
app: { debug: true }
db:
  default: lite
  connections:
    lite: { driver: sqlite3, path: /tmp/app.db }
orm:
  metadata: { driver: static, paths: [src/Entity] }
"#,
    )
    .unwrap();

    let configuration = ConfigurationResolver::new(settings)
        .assemble(&MockCacheConnector::new())
        .await
        .unwrap();

    assert_eq!(configuration.cache_provider(), "array");
    assert!(configuration.options.proxy.auto_generate);
    assert_eq!(configuration.connection.driver.as_deref(), Some("pdo_sqlite"));
    assert!(configuration.event_manager.listeners(ormwire_resolver::Event::LoadClassMetadata).is_empty());
}

#[tokio::test]
async fn test_no_cache_outside_dev_mode() {
    let settings = Settings::from_yaml_str(
        r#"
db:
  default: main
  connections:
    main: { driver: pgsql }
orm:
  cache: { provider: apc }
  metadata: { driver: xml, paths: [mapping] }
"#,
    )
    .unwrap();

    let configuration = ConfigurationResolver::new(settings)
        .assemble(&MockCacheConnector::new())
        .await
        .unwrap();

    assert_eq!(configuration.cache_provider(), "none");
    assert!(!configuration.caches.is_enabled());
}

#[test]
fn test_unsupported_metadata_driver_stops_resolution() {
    let settings = Settings::from_yaml_str(
        r#"
db:
  default: main
  connections:
    main: { driver: pgsql }
orm:
  metadata: { driver: php, paths: [mapping] }
"#,
    )
    .unwrap();

    let err = ConfigurationResolver::new(settings).resolve().unwrap_err();
    assert_eq!(err.to_string(), "Unsupported driver: php");
}

#[test]
fn test_mixed_case_keys_survive_file_loading() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("orm.yaml"),
        r#"
db:
  default: main
  connections:
    main:
      driver: mysql
      serverVersion: "8.0"
orm:
  metadata: { driver: yaml, paths: [config/mapping] }
  dql:
    mapping_types:
      UuidBinary: App\UuidBinaryType
"#,
    )
    .unwrap();

    let settings = Settings::builder()
        .add_file(temp_dir.path().join("orm"), true)
        .build()
        .unwrap();
    let resolved = ConfigurationResolver::new(settings).resolve().unwrap();

    assert_eq!(
        resolved.options.mapping_types.get("UuidBinary"),
        Some("App\\UuidBinaryType")
    );
    assert_eq!(resolved.options.mapping_types.get("uuidbinary"), None);
    assert_eq!(
        resolved.connection.extra.get("serverVersion"),
        Some(&serde_json::json!("8.0"))
    );
}
