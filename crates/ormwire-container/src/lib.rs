//! Process-wide service container accessor
//!
//! A [`ServiceContainer`] holds parameters and service definitions merged
//! from YAML definition files, plus live instances registered at runtime.
//! [`ContainerAccessor`] stores the current container; it is either handed a
//! built container or a list of definition files to merge in order.
//!
//! # Example
//!
//! ```no_run
//! use ormwire_container::{ContainerAccessor, FileLocator};
//!
//! let accessor = ContainerAccessor::with_locator(FileLocator::new().with_dir("config"));
//! accessor.set(["services.yaml", "services_prod.yaml"])?;
//!
//! let container = accessor.get().expect("container installed");
//! let host: String = container.parameter_as("database_host")?;
//! # Ok::<(), ormwire_container::ContainerError>(())
//! ```

pub mod accessor;
pub mod container;
pub mod definition;
pub mod error;
pub mod loader;

pub use accessor::{ContainerAccessor, ContainerAware, ContainerSource};
pub use container::{Instance, ServiceContainer};
pub use definition::{DefinitionFile, Import, MethodCall, ServiceDefinition, Tag};
pub use error::{ContainerError, ContainerResult};
pub use loader::{FileLocator, YamlDefinitionLoader};
