//! Service container: parameters, service definitions and live instances

use crate::definition::{DefinitionFile, ServiceDefinition};
use crate::error::{ContainerError, ContainerResult};
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::any::{type_name, Any};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Live service instance
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Merged container state
///
/// Definitions and parameters are plain data merged from definition files,
/// later entries replacing earlier ones with the same key. Live instances are
/// registered at runtime and can be read from any thread.
#[derive(Default)]
pub struct ServiceContainer {
    parameters: BTreeMap<String, Value>,
    definitions: BTreeMap<String, ServiceDefinition>,
    instances: RwLock<HashMap<String, Instance>>,
    loaded_files: Vec<PathBuf>,
}

impl ServiceContainer {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- parameters ----

    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.parameters.insert(name.into(), value.into());
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    /// Read a parameter as `T`, with placeholders resolved
    pub fn parameter_as<T: DeserializeOwned>(&self, name: &str) -> ContainerResult<T> {
        let raw = self
            .parameters
            .get(name)
            .ok_or_else(|| ContainerError::ParameterNotFound {
                name: name.to_string(),
            })?;
        let resolved = self.resolve_value(raw)?;
        Ok(serde_yaml::from_value(resolved)?)
    }

    /// Replace `%name%` placeholders in `value`
    ///
    /// A string that is exactly one placeholder takes the parameter's value
    /// as-is; placeholders embedded in longer strings are interpolated as
    /// text. `%%` stands for a literal `%`. Sequences and mappings are
    /// resolved recursively.
    pub fn resolve_value(&self, value: &Value) -> ContainerResult<Value> {
        self.resolve_with_stack(value, &mut Vec::new())
    }

    fn resolve_with_stack(&self, value: &Value, stack: &mut Vec<String>) -> ContainerResult<Value> {
        match value {
            Value::String(text) => self.resolve_string(text, stack),
            Value::Sequence(items) => items
                .iter()
                .map(|item| self.resolve_with_stack(item, stack))
                .collect::<ContainerResult<Vec<_>>>()
                .map(Value::Sequence),
            Value::Mapping(mapping) => {
                let mut resolved = serde_yaml::Mapping::new();
                for (key, item) in mapping {
                    resolved.insert(key.clone(), self.resolve_with_stack(item, stack)?);
                }
                Ok(Value::Mapping(resolved))
            }
            other => Ok(other.clone()),
        }
    }

    fn resolve_string(&self, text: &str, stack: &mut Vec<String>) -> ContainerResult<Value> {
        if let Some(name) = whole_placeholder(text) {
            return self.lookup_parameter(name, stack);
        }

        let mut output = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find('%') {
            output.push_str(&rest[..start]);
            let after = &rest[start + 1..];

            if let Some(tail) = after.strip_prefix('%') {
                output.push('%');
                rest = tail;
                continue;
            }

            match after.find('%') {
                Some(end) if is_parameter_name(&after[..end]) => {
                    let value = self.lookup_parameter(&after[..end], stack)?;
                    output.push_str(&scalar_text(&value, &after[..end])?);
                    rest = &after[end + 1..];
                }
                _ => {
                    output.push('%');
                    rest = after;
                }
            }
        }
        output.push_str(rest);

        Ok(Value::String(output))
    }

    fn lookup_parameter(&self, name: &str, stack: &mut Vec<String>) -> ContainerResult<Value> {
        let raw = self
            .parameters
            .get(name)
            .ok_or_else(|| ContainerError::ParameterNotFound {
                name: name.to_string(),
            })?;

        if stack.iter().any(|seen| seen == name) {
            return Err(ContainerError::InvalidDefinition {
                path: PathBuf::from(format!("%{}%", name)),
                message: "parameter refers to itself".to_string(),
            });
        }

        stack.push(name.to_string());
        let resolved = self.resolve_with_stack(raw, stack);
        stack.pop();
        resolved
    }

    // ---- definitions ----

    pub fn set_definition(&mut self, id: impl Into<String>, definition: ServiceDefinition) {
        self.definitions.insert(id.into(), definition);
    }

    /// Definition registered under `id`, following aliases
    pub fn definition(&self, id: &str) -> Option<&ServiceDefinition> {
        let mut current = id;
        // Bounded by the number of definitions so alias cycles terminate
        for _ in 0..=self.definitions.len() {
            let definition = self.definitions.get(current)?;
            match &definition.alias {
                Some(target) => current = target,
                None => return Some(definition),
            }
        }
        None
    }

    pub fn has_definition(&self, id: &str) -> bool {
        self.definitions.contains_key(id)
    }

    pub fn definitions(&self) -> &BTreeMap<String, ServiceDefinition> {
        &self.definitions
    }

    /// Ids of services carrying `tag`
    pub fn tagged(&self, tag: &str) -> Vec<&str> {
        self.definitions
            .iter()
            .filter(|(_, definition)| definition.has_tag(tag))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Constructor arguments of `id` with parameter placeholders resolved
    pub fn arguments(&self, id: &str) -> ContainerResult<Vec<Value>> {
        let definition = self
            .definition(id)
            .ok_or_else(|| ContainerError::ServiceNotFound { id: id.to_string() })?;

        definition
            .arguments
            .iter()
            .map(|argument| self.resolve_value(argument))
            .collect()
    }

    /// Merge a parsed definition file; its entries replace existing ones
    pub fn merge(&mut self, file: &DefinitionFile) {
        for (name, value) in &file.parameters {
            if self.parameters.insert(name.clone(), value.clone()).is_some() {
                tracing::debug!("Parameter '{}' overridden", name);
            }
        }

        for (id, definition) in file.services() {
            if self.definitions.insert(id.to_string(), definition).is_some() {
                tracing::debug!("Service '{}' overridden", id);
            }
        }
    }

    pub(crate) fn record_loaded(&mut self, path: &Path) {
        self.loaded_files.push(path.to_path_buf());
    }

    /// Definition files merged into this container, in load order
    pub fn loaded_files(&self) -> &[PathBuf] {
        &self.loaded_files
    }

    // ---- live instances ----

    /// Register a live instance under `id`, replacing any previous one
    pub fn set<T: Any + Send + Sync>(&self, id: impl Into<String>, instance: Arc<T>) {
        self.instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into(), instance);
    }

    /// Live instance registered under `id` (or the service it aliases)
    pub fn get<T: Any + Send + Sync>(&self, id: &str) -> ContainerResult<Arc<T>> {
        self.get_any(id)?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                id: id.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Type-erased live instance registered under `id`
    pub fn get_any(&self, id: &str) -> ContainerResult<Instance> {
        let instances = self.instances.read().unwrap_or_else(PoisonError::into_inner);

        if let Some(instance) = instances.get(id) {
            return Ok(instance.clone());
        }

        let target = self.resolve_alias(id);
        instances
            .get(target)
            .cloned()
            .ok_or_else(|| ContainerError::ServiceNotFound { id: id.to_string() })
    }

    pub fn has_instance(&self, id: &str) -> bool {
        self.get_any(id).is_ok()
    }

    /// Whether `id` is defined or has a live instance
    pub fn has(&self, id: &str) -> bool {
        self.has_definition(id) || self.has_instance(id)
    }

    fn resolve_alias<'a>(&'a self, id: &'a str) -> &'a str {
        let mut current = id;
        for _ in 0..=self.definitions.len() {
            match self.definitions.get(current).and_then(|d| d.alias.as_deref()) {
                Some(target) => current = target,
                None => break,
            }
        }
        current
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let instance_ids: Vec<String> = self
            .instances
            .read()
            .map(|instances| instances.keys().cloned().collect())
            .unwrap_or_default();

        f.debug_struct("ServiceContainer")
            .field("parameters", &self.parameters.keys().collect::<Vec<_>>())
            .field("definitions", &self.definitions.keys().collect::<Vec<_>>())
            .field("instances", &instance_ids)
            .field("loaded_files", &self.loaded_files)
            .finish()
    }
}

fn whole_placeholder(text: &str) -> Option<&str> {
    let name = text.strip_prefix('%')?.strip_suffix('%')?;
    is_parameter_name(name).then_some(name)
}

fn is_parameter_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(char::is_whitespace) && !name.contains('%')
}

fn scalar_text(value: &Value, name: &str) -> ContainerResult<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null => Ok(String::new()),
        _ => Err(ContainerError::InvalidDefinition {
            path: PathBuf::from(format!("%{}%", name)),
            message: "only scalar parameters can be embedded in a string".to_string(),
        }),
    }
}
