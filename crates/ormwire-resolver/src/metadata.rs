//! Metadata driver selection
//!
//! The metadata driver decides where entity mapping information comes from.
//! Unlike cache providers there is no fallback: without a driver no entity
//! can be mapped, so an unknown discriminator is rejected.

use crate::error::{ResolveError, ResolveResult};
use ormwire_core::coerce::{as_bool, as_string, as_string_list, lookup};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Selected metadata driver and the paths it scans
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "driver", rename_all = "lowercase")]
pub enum MetadataDriverSpec {
    /// Mapping read from source annotations
    Annotation {
        paths: Vec<PathBuf>,
        /// Use the simple (namespace-less) annotation reader
        simple: bool,
    },
    /// Mapping read from YAML descriptors
    Yaml { paths: Vec<PathBuf> },
    /// Mapping read from XML descriptors
    Xml { paths: Vec<PathBuf> },
    /// Mapping provided by a static method on each entity
    Static { paths: Vec<PathBuf> },
}

impl MetadataDriverSpec {
    /// Driver discriminator
    pub fn name(&self) -> &'static str {
        match self {
            MetadataDriverSpec::Annotation { .. } => "annotation",
            MetadataDriverSpec::Yaml { .. } => "yaml",
            MetadataDriverSpec::Xml { .. } => "xml",
            MetadataDriverSpec::Static { .. } => "static",
        }
    }

    /// Mapping paths, in configured order
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            MetadataDriverSpec::Annotation { paths, .. }
            | MetadataDriverSpec::Yaml { paths }
            | MetadataDriverSpec::Xml { paths }
            | MetadataDriverSpec::Static { paths } => paths,
        }
    }
}

/// Build a metadata driver spec from the `orm.metadata` block
///
/// # Errors
/// * [`ResolveError::UnsupportedDriver`] when `driver` is absent or unknown
/// * [`ResolveError::MissingField`] when `paths` is absent
/// * [`ResolveError::InvalidValue`] when `paths` or `simple` has the wrong shape
pub fn resolve_metadata_driver(raw: &Value) -> ResolveResult<MetadataDriverSpec> {
    let driver = lookup(raw, &["driver"])
        .and_then(as_string)
        .unwrap_or_default();

    if !matches!(driver.as_str(), "annotation" | "yaml" | "xml" | "static") {
        return Err(ResolveError::UnsupportedDriver(driver));
    }

    let paths = match lookup(raw, &["paths"]) {
        None => return Err(ResolveError::missing("orm.metadata", "paths")),
        Some(value) => as_string_list(value)
            .ok_or_else(|| {
                ResolveError::invalid("orm.metadata.paths", "expected a list of paths")
            })?
            .into_iter()
            .map(PathBuf::from)
            .collect::<Vec<_>>(),
    };

    let spec = match driver.as_str() {
        "annotation" => {
            let simple = match lookup(raw, &["simple"]) {
                None | Some(Value::Null) => false,
                Some(value) => as_bool(value).ok_or_else(|| {
                    ResolveError::invalid("orm.metadata.simple", "expected a boolean")
                })?,
            };
            MetadataDriverSpec::Annotation { paths, simple }
        }
        "yaml" => MetadataDriverSpec::Yaml { paths },
        "xml" => MetadataDriverSpec::Xml { paths },
        _ => MetadataDriverSpec::Static { paths },
    };

    tracing::debug!(
        "Resolved metadata driver '{}' with {} path(s)",
        spec.name(),
        spec.paths().len()
    );
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_driver_is_rejected() {
        let err = resolve_metadata_driver(&json!({ "driver": "bogus", "paths": [] })).unwrap_err();

        assert!(matches!(err, ResolveError::UnsupportedDriver(ref d) if d == "bogus"));
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn test_absent_driver_is_rejected() {
        let err = resolve_metadata_driver(&json!({ "paths": ["a"] })).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported driver: ");
    }

    #[test]
    fn test_yaml_paths_keep_order() {
        let spec = resolve_metadata_driver(&json!({ "driver": "yaml", "paths": ["a", "b"] })).unwrap();

        assert_eq!(
            spec,
            MetadataDriverSpec::Yaml {
                paths: vec![PathBuf::from("a"), PathBuf::from("b")]
            }
        );
    }

    #[test]
    fn test_annotation_simple_defaults_to_false() {
        let spec = resolve_metadata_driver(&json!({ "driver": "annotation", "paths": "src/Entity" })).unwrap();

        assert_eq!(
            spec,
            MetadataDriverSpec::Annotation {
                paths: vec![PathBuf::from("src/Entity")],
                simple: false,
            }
        );

        let spec = resolve_metadata_driver(&json!({
            "driver": "annotation",
            "paths": "src/Entity",
            "simple": null
        }))
        .unwrap();
        assert!(matches!(spec, MetadataDriverSpec::Annotation { simple: false, .. }));
    }

    #[test]
    fn test_annotation_simple_explicit() {
        let spec = resolve_metadata_driver(&json!({
            "driver": "annotation",
            "paths": [],
            "simple": "false"
        }))
        .unwrap();

        assert!(matches!(spec, MetadataDriverSpec::Annotation { simple: false, .. }));
    }

    #[test]
    fn test_xml_and_static() {
        let xml = resolve_metadata_driver(&json!({ "driver": "xml", "paths": ["x"] })).unwrap();
        let stat = resolve_metadata_driver(&json!({ "driver": "static", "paths": ["s"] })).unwrap();

        assert_eq!(xml.name(), "xml");
        assert_eq!(stat.name(), "static");
        assert_eq!(stat.paths(), &[PathBuf::from("s")]);
    }

    #[test]
    fn test_paths_required() {
        let err = resolve_metadata_driver(&json!({ "driver": "xml" })).unwrap_err();
        assert!(matches!(err, ResolveError::MissingField { ref field, .. } if field == "paths"));
    }
}
