//! Layered settings source
//!
//! [`Settings`] holds one merged [`serde_json::Value`] tree built from, in
//! order of precedence (lowest first):
//!
//! 1. a base file (`config/orm.yaml`, `.yml` or `.json`, resolved by name)
//! 2. environment variables prefixed with `ORMWIRE__`, nested with `__`
//!    (`ORMWIRE__DB__DEFAULT=pgsql` overrides `db.default`)
//!
//! A `.env` file in the working directory is read first when present.
//!
//! Files are parsed with `serde_yaml`/`serde_json` so user-defined keys keep
//! their case (`serverVersion`, `UuidBinary`). Environment variables are
//! collected through `config::Environment`, which lowercases them; they are
//! merged onto existing keys case-insensitively.

use crate::error::{Result, SettingsError};
use config::{Config, Environment};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "ORMWIRE";

/// Separator between nested key segments in environment overrides
pub const ENV_SEPARATOR: &str = "__";

/// Extensions tried, in order, when a file is added by base name
const FILE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Format of an inline or on-disk source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Yaml,
    Json,
}

impl SourceFormat {
    fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(SourceFormat::Yaml),
            "json" => Some(SourceFormat::Json),
            _ => None,
        }
    }

    fn parse(self, content: &str) -> std::result::Result<Value, String> {
        match self {
            SourceFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            SourceFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Immutable key/value configuration read through dotted paths
#[derive(Debug, Clone)]
pub struct Settings {
    root: Value,
}

impl Settings {
    /// Create a builder for custom source stacks
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Load settings the standard way: `.env`, base file, then environment
    ///
    /// # Arguments
    /// * `base` - File name without extension (e.g. `config/orm`); the format
    ///   is picked from whichever extension exists on disk
    pub fn load(base: impl AsRef<Path>) -> Result<Self> {
        Self::builder()
            .with_dotenv(true)
            .add_file(base, true)
            .with_env_prefix(ENV_PREFIX)
            .build()
    }

    /// Build settings from an inline YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Self::builder().add_str(content, SourceFormat::Yaml).build()
    }

    /// Build settings from a JSON value (handy for tests and embedders)
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        Ok(Self {
            root: root_mapping(value.clone(), "<json>")?,
        })
    }

    /// Read and deserialize the value at a dotted path
    ///
    /// Absent keys yield `Ok(None)`; a key whose value cannot be converted to
    /// `T` is an error.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.raw(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| SettingsError::Deserialize {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
        }
    }

    /// Read the raw value at a dotted path; explicit nulls read as absent
    pub fn value(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.raw(key).cloned())
    }

    /// Read a scalar as a string (numbers and booleans are rendered)
    pub fn string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.raw(key).and_then(crate::coerce::as_string))
    }

    /// Read a boolean flag, accepting `true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`
    pub fn flag(&self, key: &str, default: bool) -> Result<bool> {
        match self.raw(key) {
            None => Ok(default),
            Some(value) => {
                crate::coerce::as_bool(value).ok_or_else(|| SettingsError::Deserialize {
                    key: key.to_string(),
                    message: format!("expected a boolean, got {}", value),
                })
            }
        }
    }

    /// Check whether a non-null value exists at the path
    pub fn contains(&self, key: &str) -> bool {
        self.raw(key).is_some()
    }

    /// The whole merged tree
    pub fn root(&self) -> &Value {
        &self.root
    }

    fn raw(&self, key: &str) -> Option<&Value> {
        key.split('.')
            .try_fold(&self.root, |node, segment| {
                crate::coerce::lookup(node, &[segment])
            })
            .filter(|value| !value.is_null())
    }
}

enum Source {
    File { base: PathBuf, required: bool },
    Inline { content: String, format: SourceFormat },
    Environment { prefix: String, vars: Option<config::Map<String, String>> },
}

/// Builder assembling the source stack behind [`Settings`]
pub struct SettingsBuilder {
    sources: Vec<Source>,
    overrides: Vec<(String, Value)>,
    dotenv: bool,
}

impl SettingsBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            overrides: Vec::new(),
            dotenv: false,
        }
    }

    /// Read `.env` from the working directory before building
    pub fn with_dotenv(mut self, enable: bool) -> Self {
        self.dotenv = enable;
        self
    }

    /// Add a file source by name; later sources override earlier ones
    pub fn add_file(mut self, base: impl AsRef<Path>, required: bool) -> Self {
        self.sources.push(Source::File {
            base: base.as_ref().to_path_buf(),
            required,
        });
        self
    }

    /// Add an inline document in the given format
    pub fn add_str(mut self, content: &str, format: SourceFormat) -> Self {
        self.sources.push(Source::Inline {
            content: content.to_string(),
            format,
        });
        self
    }

    /// Add environment overrides with the given prefix
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.sources.push(Source::Environment {
            prefix: prefix.to_string(),
            vars: None,
        });
        self
    }

    /// Add environment overrides read from `vars` instead of the process
    pub fn with_env_vars<I>(mut self, prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.sources.push(Source::Environment {
            prefix: prefix.to_string(),
            vars: Some(vars.into_iter().collect()),
        });
        self
    }

    /// Override a single dotted key; overrides win over every source
    pub fn set_override(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.overrides.push((key.to_string(), value.into()));
        self
    }

    /// Build the settings
    pub fn build(self) -> Result<Settings> {
        if self.dotenv {
            if let Ok(path) = dotenvy::dotenv() {
                tracing::debug!("Loaded environment from {}", path.display());
            }
        }

        let mut root = Value::Object(Map::new());

        for source in self.sources {
            let layer = match source {
                Source::File { base, required } => match locate(&base) {
                    Some((path, format)) => read_file(&path, format)?,
                    None if required => {
                        return Err(SettingsError::Load(format!(
                            "configuration file \"{}\" not found",
                            base.display()
                        )))
                    }
                    None => continue,
                },
                Source::Inline { content, format } => {
                    let parsed = format.parse(&content).map_err(SettingsError::Load)?;
                    root_mapping(parsed, "<inline>")?
                }
                Source::Environment { prefix, vars } => environment(&prefix, vars)?,
            };
            merge(&mut root, layer);
        }

        for (key, value) in self.overrides {
            insert_path(&mut root, &key, value);
        }

        Ok(Settings { root })
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Find `base` as given, or with one of [`FILE_EXTENSIONS`] appended
fn locate(base: &Path) -> Option<(PathBuf, SourceFormat)> {
    if base.is_file() {
        if let Some(format) = base
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(SourceFormat::from_extension)
        {
            return Some((base.to_path_buf(), format));
        }
    }

    FILE_EXTENSIONS.iter().find_map(|extension| {
        let mut name = OsString::from(base.as_os_str());
        name.push(".");
        name.push(extension);
        let candidate = PathBuf::from(name);
        let format = SourceFormat::from_extension(extension)?;
        candidate.is_file().then_some((candidate, format))
    })
}

fn read_file(path: &Path, format: SourceFormat) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    let parsed = format
        .parse(&content)
        .map_err(|e| SettingsError::Load(format!("{}: {}", path.display(), e)))?;

    tracing::debug!("Loaded settings from {}", path.display());
    root_mapping(parsed, &path.display().to_string())
}

fn environment(prefix: &str, vars: Option<config::Map<String, String>>) -> Result<Value> {
    let source = Environment::with_prefix(prefix)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
        .source(vars);

    let value = Config::builder()
        .add_source(source)
        .build()?
        .try_deserialize::<Value>()?;

    root_mapping(value, "<environment>")
}

fn root_mapping(value: Value, origin: &str) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(_) => Ok(value),
        other => Err(SettingsError::Load(format!(
            "{}: expected a mapping at the top level, got {}",
            origin, other
        ))),
    }
}

/// Key in `map` equal to `key`, or matching it ignoring ASCII case
fn existing_key(map: &Map<String, Value>, key: &str) -> String {
    if map.contains_key(key) {
        return key.to_string();
    }
    map.keys()
        .find(|candidate| candidate.eq_ignore_ascii_case(key))
        .cloned()
        .unwrap_or_else(|| key.to_string())
}

/// Deep-merge `layer` onto `base`; mappings merge, anything else replaces
fn merge(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                let key = existing_key(base, &key);
                let nested = value.is_object() && base.get(&key).is_some_and(Value::is_object);
                match base.get_mut(&key) {
                    Some(existing) if nested => merge(existing, value),
                    _ => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

fn insert_path(root: &mut Value, key: &str, value: Value) {
    let mut layer = value;
    for segment in key.rsplit('.') {
        let mut map = Map::new();
        map.insert(segment.to_string(), layer);
        layer = Value::Object(map);
    }
    merge(root, layer);
}
