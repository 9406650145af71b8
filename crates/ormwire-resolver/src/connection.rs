//! Connection parameter normalization
//!
//! Connection blocks come from `db.connections.<name>` and may use short
//! driver names (`mysql`, `pgsql`) and legacy key names (`username`, `pass`,
//! `database`). Resolution rewrites both into canonical form.

use crate::error::{ResolveError, ResolveResult};
use ormwire_core::coerce::{as_string, as_u64, lookup};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Short driver names and the canonical driver identifiers they stand for
pub const DRIVER_ALIASES: &[(&str, &str)] = &[
    ("db2", "ibm_db2"),
    ("mssql", "pdo_sqlsrv"),
    ("mysql", "pdo_mysql"),
    ("mysql2", "pdo_mysql"),
    ("postgres", "pdo_pgsql"),
    ("postgresql", "pdo_pgsql"),
    ("pgsql", "pdo_pgsql"),
    ("sqlite", "pdo_sqlite"),
    ("sqlite3", "pdo_sqlite"),
];

/// Legacy key names and the canonical keys they map onto
pub const LEGACY_KEYS: &[(&str, &str)] = &[
    ("username", "user"),
    ("pass", "password"),
    ("database", "dbname"),
];

/// Keys consumed by resolution; everything else passes through in `extra`
const CONSUMED_KEYS: &[&str] = &[
    "driver", "host", "port", "user", "username", "password", "pass", "dbname", "database",
    "prefix",
];

/// Normalized database connection parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Canonical driver identifier (or the input value when no alias matched)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dbname: Option<String>,

    /// Driver-specific parameters passed through untouched (charset, unix_socket, ...)
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, Value>,
}

/// Map a short driver alias to its canonical identifier
pub fn canonical_driver(driver: &str) -> Option<&'static str> {
    DRIVER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == driver)
        .map(|(_, canonical)| *canonical)
}

/// Normalize a raw connection block
///
/// Missing fields stay absent; the only failure is a `port` that is not a
/// valid port number.
pub fn resolve_connection(raw: &Value) -> ResolveResult<ConnectionConfig> {
    if !raw.is_object() {
        return Err(ResolveError::invalid("connection", "expected a mapping"));
    }

    let driver = lookup(raw, &["driver"]).and_then(as_string).map(|driver| {
        match canonical_driver(&driver) {
            Some(canonical) => {
                tracing::debug!("Resolved driver alias '{}' to '{}'", driver, canonical);
                canonical.to_string()
            }
            None => driver,
        }
    });

    let port = match lookup(raw, &["port"]) {
        None => None,
        Some(value) => {
            let port = as_u64(value)
                .filter(|p| *p <= u64::from(u16::MAX))
                .ok_or_else(|| {
                    ResolveError::invalid("port", format!("expected a port number, got {}", value))
                })?;
            Some(port as u16)
        }
    };

    let extra = raw
        .as_object()
        .map(|map| {
            map.iter()
                .filter(|(key, value)| {
                    !value.is_null()
                        && !CONSUMED_KEYS.iter().any(|c| c.eq_ignore_ascii_case(key))
                })
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default();

    Ok(ConnectionConfig {
        driver,
        host: lookup(raw, &["host"]).and_then(as_string),
        port,
        user: canonical_or_legacy(raw, "user"),
        password: canonical_or_legacy(raw, "password"),
        dbname: canonical_or_legacy(raw, "dbname"),
        extra,
    })
}

/// Read the canonical key, falling back to its legacy alias
fn canonical_or_legacy(raw: &Value, canonical: &str) -> Option<String> {
    if let Some(value) = lookup(raw, &[canonical]).and_then(as_string) {
        return Some(value);
    }

    LEGACY_KEYS
        .iter()
        .filter(|(_, target)| *target == canonical)
        .find_map(|(legacy, _)| lookup(raw, &[legacy]).and_then(as_string))
}
