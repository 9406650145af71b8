//! Definition file discovery and loading

use crate::container::ServiceContainer;
use crate::definition::DefinitionFile;
use crate::error::{ContainerError, ContainerResult};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Finds definition files by name
///
/// Lookup order: an absolute path as given, then the directory of the file
/// doing the import (if any), then each search directory, then the working
/// directory.
#[derive(Debug, Clone, Default)]
pub struct FileLocator {
    search_dirs: Vec<PathBuf>,
}

impl FileLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory to search, after the ones already added
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Locate `name`, trying `current_dir` before the search directories
    pub fn locate(&self, name: &Path, current_dir: Option<&Path>) -> ContainerResult<PathBuf> {
        let not_found = || ContainerError::DefinitionNotFound {
            name: name.display().to_string(),
        };

        if name.is_absolute() {
            return if name.is_file() {
                Ok(name.absolutize()?.to_path_buf())
            } else {
                Err(not_found())
            };
        }

        let candidates = current_dir
            .into_iter()
            .chain(self.search_dirs.iter().map(PathBuf::as_path))
            .map(|dir| dir.join(name))
            .chain(std::iter::once(name.to_path_buf()));

        for candidate in candidates {
            if candidate.is_file() {
                let absolute = candidate.absolutize()?.to_path_buf();
                return Ok(absolute);
            }
        }

        Err(not_found())
    }
}

/// Loads YAML definition files, with their imports, into a container
#[derive(Debug, Clone, Default)]
pub struct YamlDefinitionLoader {
    locator: FileLocator,
}

impl YamlDefinitionLoader {
    pub fn new(locator: FileLocator) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &FileLocator {
        &self.locator
    }

    /// Load `name` and everything it imports into `container`
    ///
    /// Imports are merged before the importing file's own entries, so a file
    /// always overrides what it imports.
    pub fn load(&self, container: &mut ServiceContainer, name: impl AsRef<Path>) -> ContainerResult<()> {
        let path = self.locator.locate(name.as_ref(), None)?;
        self.load_file(container, &path, &mut Vec::new())
    }

    fn load_file(
        &self,
        container: &mut ServiceContainer,
        path: &Path,
        stack: &mut Vec<PathBuf>,
    ) -> ContainerResult<()> {
        if stack.iter().any(|loading| loading == path) {
            return Err(ContainerError::CircularImport {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let file = DefinitionFile::parse(&content).map_err(|e| ContainerError::InvalidDefinition {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if let Some(id) = file.services().map(|(id, _)| id).find(|id| id.trim().is_empty()) {
            return Err(ContainerError::InvalidDefinition {
                path: path.to_path_buf(),
                message: format!("invalid service id '{}'", id),
            });
        }

        stack.push(path.to_path_buf());
        let current_dir = path.parent();

        for import in &file.imports {
            let located = match self.locator.locate(Path::new(import.resource()), current_dir) {
                Ok(located) => located,
                Err(ContainerError::DefinitionNotFound { name }) if import.ignore_errors() => {
                    tracing::warn!("Skipping missing import '{}' from {}", name, path.display());
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.load_file(container, &located, stack)?;
        }

        stack.pop();

        container.merge(&file);
        container.record_loaded(path);
        tracing::info!(
            "Loaded {} service(s) and {} parameter(s) from {}",
            file.service_count(),
            file.parameters.len(),
            path.display()
        );

        Ok(())
    }
}
