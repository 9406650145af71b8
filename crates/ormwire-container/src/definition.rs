//! Declarative service definitions
//!
//! A definition file has three optional top-level sections:
//!
//! ```yaml
//! imports:
//!   - services/cache.yaml
//!   - { resource: local.yaml, ignore_errors: true }
//!
//! parameters:
//!   database_host: 127.0.0.1
//!
//! services:
//!   connection:
//!     class: App\Database\Connection
//!     arguments: ['%database_host%', '@logger']
//!     calls:
//!       - { method: setLogger, arguments: ['@logger'] }
//!     tags: [orm.connection]
//!   logger: ~
//!   db: '@connection'
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Method invoked on a service after construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

/// Tag attached to a service, either a bare name or a name with attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tag {
    Name(String),
    Attributes {
        name: String,
        #[serde(flatten)]
        attributes: BTreeMap<String, Value>,
    },
}

impl Tag {
    pub fn name(&self) -> &str {
        match self {
            Tag::Name(name) => name,
            Tag::Attributes { name, .. } => name,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One service definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Class to instantiate; defaults to the service id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    #[serde(default)]
    pub arguments: Vec<Value>,

    #[serde(default)]
    pub calls: Vec<MethodCall>,

    #[serde(default)]
    pub tags: Vec<Tag>,

    /// One instance per container rather than one per request
    #[serde(default = "default_true")]
    pub shared: bool,

    #[serde(default = "default_true")]
    pub public: bool,

    /// Id of the service this one stands for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ServiceDefinition {
    /// Definition whose class is `class`
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: Some(class.into()),
            arguments: Vec::new(),
            calls: Vec::new(),
            tags: Vec::new(),
            shared: true,
            public: true,
            alias: None,
        }
    }

    /// Definition that points at another service
    pub fn alias(target: impl Into<String>) -> Self {
        Self {
            class: None,
            alias: Some(target.into()),
            ..Self::new("")
        }
    }

    pub fn with_argument(mut self, argument: impl Into<Value>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag.name() == name)
    }
}

/// Entry under `services`: `~`, an `'@target'` alias, or a full definition
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum ServiceEntry {
    Alias(String),
    Definition(ServiceDefinition),
}

/// Entry under `imports`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Import {
    Path(String),
    Resource {
        resource: String,
        #[serde(default)]
        ignore_errors: bool,
    },
}

impl Import {
    pub fn resource(&self) -> &str {
        match self {
            Import::Path(path) => path,
            Import::Resource { resource, .. } => resource,
        }
    }

    pub fn ignore_errors(&self) -> bool {
        matches!(self, Import::Resource { ignore_errors: true, .. })
    }
}

/// Parsed contents of one definition file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionFile {
    #[serde(default)]
    pub imports: Vec<Import>,

    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,

    #[serde(default)]
    services: BTreeMap<String, Option<ServiceEntry>>,
}

impl DefinitionFile {
    /// Parse YAML content; an empty document yields an empty file
    ///
    /// A string entry under `services` must be an `'@target'` alias.
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        let file = serde_yaml::from_str::<Option<Self>>(content)?.unwrap_or_default();

        for (id, entry) in &file.services {
            if let Some(ServiceEntry::Alias(target)) = entry {
                if !target.starts_with('@') {
                    return Err(serde_yaml::Error::custom(format!(
                        "service '{}' must be a mapping, '~' or an '@' alias, got '{}'",
                        id, target
                    )));
                }
            }
        }
        Ok(file)
    }

    /// Service definitions with shorthand entries expanded
    pub fn services(&self) -> impl Iterator<Item = (&str, ServiceDefinition)> + '_ {
        self.services.iter().map(|(id, entry)| {
            let definition = match entry {
                None => ServiceDefinition::new(id.as_str()),
                Some(ServiceEntry::Alias(target)) => {
                    ServiceDefinition::alias(target.trim_start_matches('@'))
                }
                Some(ServiceEntry::Definition(definition)) => {
                    let mut definition = definition.clone();
                    if definition.class.is_none() && definition.alias.is_none() {
                        definition.class = Some(id.clone());
                    }
                    definition
                }
            };
            (id.as_str(), definition)
        })
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}
