//! Integration tests for loading containers from definition files

use ormwire_container::{
    ContainerAccessor, ContainerAware, ContainerError, ContainerSource, FileLocator,
    ServiceContainer, YamlDefinitionLoader,
};
use serde_yaml::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn accessor(dir: &TempDir) -> ContainerAccessor {
    ContainerAccessor::with_locator(FileLocator::new().with_dir(dir.path()))
}

#[test]
fn test_later_files_override_earlier_ones() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "services.yaml",
        r#"
parameters:
  database_host: localhost
  database_name: app
services:
  mailer:
    class: App\SmtpMailer
  logger: ~
"#,
    );
    write(
        dir.path(),
        "services_prod.yaml",
        r#"
parameters:
  database_host: db.prod
services:
  mailer:
    class: App\QueueMailer
"#,
    );

    let accessor = accessor(&dir);
    let container = accessor
        .set(["services.yaml", "services_prod.yaml"])
        .unwrap()
        .get()
        .unwrap();

    assert_eq!(container.parameter("database_host"), Some(&Value::from("db.prod")));
    assert_eq!(container.parameter("database_name"), Some(&Value::from("app")));
    assert_eq!(
        container.definition("mailer").unwrap().class.as_deref(),
        Some("App\\QueueMailer")
    );
    assert!(container.has_definition("logger"));
    assert_eq!(container.loaded_files().len(), 2);
}

#[test]
fn test_file_order_matters() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.yaml", "parameters:\n  env: a\n");
    write(dir.path(), "b.yaml", "parameters:\n  env: b\n");

    let accessor = accessor(&dir);

    let env: String = accessor.set(["a.yaml", "b.yaml"]).unwrap().get().unwrap().parameter_as("env").unwrap();
    assert_eq!(env, "b");

    let env: String = accessor.set(["b.yaml", "a.yaml"]).unwrap().get().unwrap().parameter_as("env").unwrap();
    assert_eq!(env, "a");
}

#[test]
fn test_imports_resolve_relative_to_importing_file() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "config/services.yaml",
        r#"
imports:
  - packages/orm.yaml
  - { resource: local.yaml, ignore_errors: true }
parameters:
  cache_provider: redis
services:
  entity_manager:
    class: App\EntityManager
    arguments: ['%cache_provider%', '%orm_dir%/proxies']
"#,
    );
    write(
        dir.path(),
        "config/packages/orm.yaml",
        r#"
parameters:
  cache_provider: array
  orm_dir: /var/cache/orm
services:
  entity_manager:
    class: App\LegacyEntityManager
  em: '@entity_manager'
"#,
    );

    let mut container = ServiceContainer::new();
    YamlDefinitionLoader::new(FileLocator::new().with_dir(dir.path()))
        .load(&mut container, "config/services.yaml")
        .unwrap();

    assert_eq!(
        container.definition("em").unwrap().class.as_deref(),
        Some("App\\EntityManager")
    );
    assert_eq!(
        container.arguments("entity_manager").unwrap(),
        vec![Value::from("redis"), Value::from("/var/cache/orm/proxies")]
    );

    let loaded = container.loaded_files();
    assert_eq!(loaded.len(), 2);
    assert!(loaded[0].ends_with("packages/orm.yaml"));
    assert!(loaded[1].ends_with("config/services.yaml"));
}

#[test]
fn test_missing_import_fails() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "services.yaml", "imports:\n  - absent.yaml\n");

    let err = accessor(&dir).set(["services.yaml"]).unwrap_err();
    assert!(matches!(err, ContainerError::DefinitionNotFound { ref name } if name == "absent.yaml"));
}

#[test]
fn test_circular_import_rejected() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.yaml", "imports:\n  - b.yaml\n");
    write(dir.path(), "b.yaml", "imports:\n  - a.yaml\n");

    let err = accessor(&dir).set(["a.yaml"]).unwrap_err();
    assert!(matches!(err, ContainerError::CircularImport { ref path } if path.ends_with("a.yaml")));
}

#[test]
fn test_same_file_imported_twice_is_not_circular() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "common.yaml", "parameters:\n  shared: true\n");
    write(dir.path(), "a.yaml", "imports:\n  - common.yaml\n");
    write(dir.path(), "b.yaml", "imports:\n  - common.yaml\n");

    let accessor = accessor(&dir);
    let container = accessor.set(["a.yaml", "b.yaml"]).unwrap().get().unwrap();

    assert!(container.parameter_as::<bool>("shared").unwrap());
}

#[test]
fn test_live_instances_are_shared_through_handle() {
    let accessor = ContainerAccessor::new();
    accessor.set(ServiceContainer::new()).unwrap();

    let container = accessor.get().unwrap();
    container.set("connection_count", Arc::new(3usize));

    let again = accessor.get().unwrap();
    assert_eq!(*again.get::<usize>("connection_count").unwrap(), 3);
}

struct Repository {
    accessor: ContainerAccessor,
}

impl ContainerAware for Repository {
    fn accessor(&self) -> &ContainerAccessor {
        &self.accessor
    }
}

#[test]
fn test_container_aware_with_own_accessor() {
    let repository = Repository {
        accessor: ContainerAccessor::new(),
    };
    assert!(repository.container().is_none());

    let mut container = ServiceContainer::new();
    container.set_parameter("table_prefix", "shop_");
    repository
        .set_container(ContainerSource::from(container))
        .unwrap();

    let prefix: String = repository.container().unwrap().parameter_as("table_prefix").unwrap();
    assert_eq!(prefix, "shop_");
}

struct GlobalUser;

impl ContainerAware for GlobalUser {}

#[test]
fn test_container_aware_defaults_to_global() {
    let handle = Arc::new(ServiceContainer::new());
    GlobalUser.set_container(handle.clone().into()).unwrap();

    assert!(Arc::ptr_eq(&GlobalUser.container().unwrap(), &handle));
    assert!(Arc::ptr_eq(&ContainerAccessor::global().get().unwrap(), &handle));
}
