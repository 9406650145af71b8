//! Integration tests for file-backed settings

use ormwire_core::Settings;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_yaml_file_by_base_name() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("orm");
    fs::write(
        temp_dir.path().join("orm.yaml"),
        r#"
db:
  default: mysql
  connections:
    mysql:
      driver: mysql
      host: 127.0.0.1
      port: 3306
orm:
  metadata:
    driver: yaml
    paths: [a, b]
"#,
    )
    .unwrap();

    let settings = Settings::builder().add_file(&base, true).build().unwrap();

    assert_eq!(settings.string("db.default").unwrap(), Some("mysql".to_string()));
    assert_eq!(
        settings.get::<Vec<String>>("orm.metadata.paths").unwrap(),
        Some(vec!["a".to_string(), "b".to_string()])
    );
    assert_eq!(
        settings.string("db.connections.mysql.port").unwrap(),
        Some("3306".to_string())
    );
}

#[test]
fn test_missing_required_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let result = Settings::builder()
        .add_file(temp_dir.path().join("absent"), true)
        .build();

    assert!(result.is_err());
}

#[test]
fn test_missing_optional_file_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let settings = Settings::builder()
        .add_file(temp_dir.path().join("absent"), false)
        .build()
        .unwrap();

    assert!(settings.value("db").unwrap().is_none());
}

#[test]
fn test_later_file_overrides_earlier() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("base.yaml"), "orm:\n  default_repository: Base\n").unwrap();
    fs::write(temp_dir.path().join("local.yaml"), "orm:\n  default_repository: Local\n").unwrap();

    let settings = Settings::builder()
        .add_file(temp_dir.path().join("base"), true)
        .add_file(temp_dir.path().join("local"), true)
        .build()
        .unwrap();

    assert_eq!(
        settings.string("orm.default_repository").unwrap(),
        Some("Local".to_string())
    );
}
