//! Process-wide container handle

use crate::container::ServiceContainer;
use crate::error::ContainerResult;
use crate::loader::{FileLocator, YamlDefinitionLoader};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// What to install in a [`ContainerAccessor`]
#[derive(Debug, Clone)]
pub enum ContainerSource {
    /// An already built container, stored as-is
    Handle(Arc<ServiceContainer>),
    /// Definition files merged in order into a fresh container
    Files(Vec<PathBuf>),
}

impl From<Arc<ServiceContainer>> for ContainerSource {
    fn from(container: Arc<ServiceContainer>) -> Self {
        ContainerSource::Handle(container)
    }
}

impl From<ServiceContainer> for ContainerSource {
    fn from(container: ServiceContainer) -> Self {
        ContainerSource::Handle(Arc::new(container))
    }
}

impl From<Vec<PathBuf>> for ContainerSource {
    fn from(files: Vec<PathBuf>) -> Self {
        ContainerSource::Files(files)
    }
}

impl From<&[&str]> for ContainerSource {
    fn from(files: &[&str]) -> Self {
        ContainerSource::Files(files.iter().map(PathBuf::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ContainerSource {
    fn from(files: [&str; N]) -> Self {
        ContainerSource::Files(files.iter().map(PathBuf::from).collect())
    }
}

/// Holder of the current container handle
///
/// [`ContainerAccessor::global`] is the process-wide instance; owned
/// accessors work the same way for callers that pass the handle around
/// explicitly.
#[derive(Debug, Default)]
pub struct ContainerAccessor {
    handle: RwLock<Option<Arc<ServiceContainer>>>,
    loader: YamlDefinitionLoader,
}

static GLOBAL: OnceLock<ContainerAccessor> = OnceLock::new();

impl ContainerAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accessor that resolves definition files through `locator`
    pub fn with_locator(locator: FileLocator) -> Self {
        Self {
            handle: RwLock::new(None),
            loader: YamlDefinitionLoader::new(locator),
        }
    }

    /// The process-wide accessor, created on first use
    pub fn global() -> &'static ContainerAccessor {
        GLOBAL.get_or_init(ContainerAccessor::new)
    }

    /// Current container, `None` until [`Self::set`] succeeds
    pub fn get(&self) -> Option<Arc<ServiceContainer>> {
        self.handle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }

    /// Install a container
    ///
    /// For [`ContainerSource::Files`], every file is loaded before the handle
    /// is replaced; if any file fails the previous handle stays in place.
    pub fn set(&self, source: impl Into<ContainerSource>) -> ContainerResult<&Self> {
        let container = match source.into() {
            ContainerSource::Handle(container) => container,
            ContainerSource::Files(files) => Arc::new(self.build(&files)?),
        };

        *self.handle.write().unwrap_or_else(PoisonError::into_inner) = Some(container);
        Ok(self)
    }

    /// Drop the current container
    pub fn clear(&self) -> Option<Arc<ServiceContainer>> {
        self.handle
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn build(&self, files: &[PathBuf]) -> ContainerResult<ServiceContainer> {
        let mut container = ServiceContainer::new();
        for file in files {
            self.loader.load(&mut container, file)?;
        }

        tracing::info!(
            "Built container from {} definition file(s): {} service(s), {} parameter(s)",
            files.len(),
            container.definitions().len(),
            container.parameters().len()
        );
        Ok(container)
    }
}

/// Types that read and install the shared container
///
/// The defaults go through [`ContainerAccessor::global`]; implementors that
/// own an accessor override [`ContainerAware::accessor`].
pub trait ContainerAware {
    fn accessor(&self) -> &ContainerAccessor {
        ContainerAccessor::global()
    }

    fn container(&self) -> Option<Arc<ServiceContainer>> {
        self.accessor().get()
    }

    fn set_container(&self, source: ContainerSource) -> ContainerResult<()> {
        self.accessor().set(source).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContainerError;

    #[test]
    fn test_empty_until_set() {
        let accessor = ContainerAccessor::new();
        assert!(accessor.get().is_none());
        assert!(!accessor.is_set());
    }

    #[test]
    fn test_handle_stored_directly() {
        let container = Arc::new(ServiceContainer::new());
        let accessor = ContainerAccessor::new();

        let stored = accessor.set(container.clone()).unwrap().get().unwrap();
        assert!(Arc::ptr_eq(&stored, &container));
    }

    #[test]
    fn test_failed_load_keeps_previous_handle() {
        let container = Arc::new(ServiceContainer::new());
        let accessor = ContainerAccessor::new();
        accessor.set(container.clone()).unwrap();

        let err = accessor.set(["definitely/not/here.yaml"]).unwrap_err();
        assert!(matches!(err, ContainerError::DefinitionNotFound { .. }));
        assert!(Arc::ptr_eq(&accessor.get().unwrap(), &container));
    }

    #[test]
    fn test_clear() {
        let accessor = ContainerAccessor::new();
        accessor.set(ServiceContainer::new()).unwrap();

        assert!(accessor.clear().is_some());
        assert!(accessor.get().is_none());
    }
}
