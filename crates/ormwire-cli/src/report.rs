//! JSON report printed by the binary

use ormwire_container::ServiceContainer;
use ormwire_resolver::{OrmConfiguration, ResolvedConfig};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// What the binary prints
#[derive(Debug, Serialize)]
pub struct Report {
    pub resolved: ResolvedConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiring: Option<WiringReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerReport>,
}

/// Outcome of connecting cache clients
#[derive(Debug, Serialize)]
pub struct WiringReport {
    pub cache_backend: &'static str,
    pub shared_cache_instance: bool,
    pub prefix_listeners: usize,
    pub proxy_directory: PathBuf,
    pub proxy_namespace: String,
}

impl WiringReport {
    pub fn from_configuration(configuration: &OrmConfiguration) -> Self {
        Self {
            cache_backend: configuration.cache_provider(),
            shared_cache_instance: configuration.caches.shares_instance(),
            prefix_listeners: configuration
                .event_manager
                .listeners(ormwire_resolver::Event::LoadClassMetadata)
                .len(),
            proxy_directory: configuration.options.proxy.effective_directory(),
            proxy_namespace: configuration.options.proxy.effective_namespace().to_string(),
        }
    }
}

/// Summary of a container built from definition files
#[derive(Debug, Serialize)]
pub struct ContainerReport {
    pub files: Vec<PathBuf>,
    pub services: Vec<String>,
    pub parameters: BTreeMap<String, serde_yaml::Value>,
}

impl ContainerReport {
    pub fn from_container(container: &ServiceContainer) -> Self {
        Self {
            files: container.loaded_files().to_vec(),
            services: container.definitions().keys().cloned().collect(),
            parameters: container.parameters().clone(),
        }
    }
}
