//! Integration tests for entity manager memoization

use async_trait::async_trait;
use ormwire_core::Settings;
use ormwire_resolver::{
    ConfigurationResolver, EntityManagerFactory, MockCacheConnector, OrmBootstrap,
    OrmConfiguration, ResolveError, ResolveResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Bootstrap that counts how often it is invoked
struct CountingBootstrap {
    calls: Arc<AtomicUsize>,
    fail_first: bool,
}

#[derive(Debug)]
struct FakeEntityManager {
    driver: Option<String>,
    cache: &'static str,
}

#[async_trait]
impl OrmBootstrap for CountingBootstrap {
    type EntityManager = FakeEntityManager;

    async fn create(&self, configuration: OrmConfiguration) -> ResolveResult<FakeEntityManager> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if self.fail_first && call == 0 {
            return Err(ResolveError::Bootstrap("database unavailable".to_string()));
        }

        Ok(FakeEntityManager {
            driver: configuration.connection.driver.clone(),
            cache: configuration.cache_provider(),
        })
    }
}

fn resolver() -> ConfigurationResolver {
    let settings = Settings::from_yaml_str(
        r#"
db:
  default: main
  connections:
    main: { driver: postgres, host: db }
orm:
  cache: { provider: memcached, memcached: { host: mc } }
  metadata: { driver: yaml, paths: [config/doctrine] }
"#,
    )
    .unwrap();
    ConfigurationResolver::new(settings)
}

fn factory(fail_first: bool) -> (EntityManagerFactory<CountingBootstrap, MockCacheConnector>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let bootstrap = CountingBootstrap {
        calls: calls.clone(),
        fail_first,
    };
    (
        EntityManagerFactory::with_connector(resolver(), bootstrap, MockCacheConnector::new()),
        calls,
    )
}

#[tokio::test]
async fn test_entity_manager_is_memoized() {
    let (factory, calls) = factory(false);
    assert!(!factory.is_initialized());

    let first = factory.entity_manager().await.unwrap();
    let second = factory.entity_manager().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(factory.is_initialized());
    assert_eq!(first.driver.as_deref(), Some("pdo_pgsql"));
    assert_eq!(first.cache, "memcached");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_calls_build_once() {
    let (factory, calls) = factory(false);
    let factory = Arc::new(factory);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let factory = factory.clone();
            tokio::spawn(async move { factory.entity_manager().await.unwrap() })
        })
        .collect();

    let mut managers = Vec::new();
    for handle in handles {
        managers.push(handle.await.unwrap());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(managers.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[tokio::test]
async fn test_failed_build_is_retried() {
    let (factory, calls) = factory(true);

    let err = factory.entity_manager().await.unwrap_err();
    assert_eq!(err.to_string(), "Bootstrap error: database unavailable");
    assert!(!factory.is_initialized());

    factory.entity_manager().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
