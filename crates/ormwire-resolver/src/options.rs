//! ORM-wide options: proxies, default repository, SQL logger, DQL extensions

use crate::dql::{DqlFunctions, FunctionFamily, TypeRegistry};
use crate::error::{ResolveError, ResolveResult};
use ormwire_core::coerce::{as_bool, as_string, as_string_table, lookup};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Repository class used when an entity names none
pub const DEFAULT_REPOSITORY_CLASS: &str = "EntityRepository";

/// Namespace for generated proxies when none is configured
pub const DEFAULT_PROXY_NAMESPACE: &str = "Proxies";

/// Proxy generation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub auto_generate: bool,
}

impl ProxyOptions {
    /// Configured directory, or the system temp dir
    pub fn effective_directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Configured namespace, or [`DEFAULT_PROXY_NAMESPACE`]
    pub fn effective_namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_PROXY_NAMESPACE)
    }
}

/// ORM-wide options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrmOptions {
    pub proxy: ProxyOptions,
    pub default_repository: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_logger: Option<String>,
    pub functions: DqlFunctions,
    pub mapping_types: TypeRegistry,
}

/// Build ORM options from the `orm` block
///
/// Built-in DQL functions and mapping types are the base layer; entries under
/// `orm.dql.*` are upserted on top. When `auto_generate` is not set, proxies
/// are generated in dev mode only.
pub fn assemble_orm_options(orm: &Value, dev_mode: bool) -> ResolveResult<OrmOptions> {
    let proxy = ProxyOptions {
        directory: proxy_field(orm, "directory").map(PathBuf::from),
        namespace: proxy_field(orm, "namespace"),
        auto_generate: match proxy_value(orm, "auto_generate") {
            None => dev_mode,
            Some(value) => as_bool(value).ok_or_else(|| {
                ResolveError::invalid("orm.proxy.auto_generate", "expected a boolean")
            })?,
        },
    };

    let mut functions = DqlFunctions::builtin();
    let mut mapping_types = TypeRegistry::builtin();

    if let Some(dql) = lookup(orm, &["dql"]) {
        for family in [
            FunctionFamily::Datetime,
            FunctionFamily::Numeric,
            FunctionFamily::String,
        ] {
            if let Some(table) = lookup(dql, &[family.config_key()]) {
                functions.merge(family, string_table(table, family.config_key())?);
            }
        }

        if let Some(types) = lookup(dql, &["mapping_types"]) {
            for (name, class) in string_table(types, "mapping_types")? {
                mapping_types.register(&name, class);
            }
        }
    }

    Ok(OrmOptions {
        proxy,
        default_repository: lookup(orm, &["default_repository"])
            .and_then(as_string)
            .unwrap_or_else(|| DEFAULT_REPOSITORY_CLASS.to_string()),
        sql_logger: lookup(orm, &["sql_logger"]).and_then(as_string),
        functions,
        mapping_types,
    })
}

fn proxy_value<'a>(orm: &'a Value, field: &str) -> Option<&'a Value> {
    ["proxy", "proxy_classes"]
        .into_iter()
        .filter_map(|section| lookup(orm, &[section]))
        .find_map(|block| lookup(block, &[field]))
}

fn proxy_field(orm: &Value, field: &str) -> Option<String> {
    proxy_value(orm, field).and_then(as_string)
}

fn string_table(value: &Value, key: &str) -> ResolveResult<Vec<(String, String)>> {
    as_string_table(value).ok_or_else(|| {
        ResolveError::invalid(
            format!("orm.dql.{}", key),
            "expected a mapping of name to class",
        )
    })
}
