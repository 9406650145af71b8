//! ORM lifecycle events and listener registry

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Events a listener can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// Fired once per entity class after its mapping has been read
    LoadClassMetadata,
}

/// Inheritance strategy of a mapped class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InheritanceType {
    #[default]
    None,
    SingleTable,
    Joined,
    TablePerClass,
}

/// Association cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

/// Association mapping as seen by metadata listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationMapping {
    pub field: String,
    pub kind: AssociationKind,
    pub owning_side: bool,
    /// Join table name (many-to-many only)
    pub join_table: Option<String>,
}

/// Mapping information for one entity class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMetadata {
    pub name: String,
    pub root_entity_name: String,
    pub inheritance: InheritanceType,
    pub table_name: String,
    pub associations: Vec<AssociationMapping>,
}

impl ClassMetadata {
    /// Metadata for a standalone entity (its own inheritance root)
    pub fn new(name: impl Into<String>, table_name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            root_entity_name: name.clone(),
            name,
            inheritance: InheritanceType::None,
            table_name: table_name.into(),
            associations: Vec::new(),
        }
    }

    /// Mark the class as part of an inheritance hierarchy
    pub fn with_inheritance(mut self, inheritance: InheritanceType, root: impl Into<String>) -> Self {
        self.inheritance = inheritance;
        self.root_entity_name = root.into();
        self
    }

    /// Add an association mapping
    pub fn with_association(mut self, association: AssociationMapping) -> Self {
        self.associations.push(association);
        self
    }

    pub fn is_inheritance_root(&self) -> bool {
        self.name == self.root_entity_name
    }
}

/// Receives ORM lifecycle events
pub trait EventListener: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Called for [`Event::LoadClassMetadata`]
    fn on_load_class_metadata(&self, _metadata: &mut ClassMetadata) {}
}

/// Listener registry handed to the ORM bootstrap
#[derive(Clone, Default)]
pub struct EventManager {
    listeners: HashMap<Event, Vec<Arc<dyn EventListener>>>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; listeners run in registration order
    pub fn add_listener(&mut self, event: Event, listener: Arc<dyn EventListener>) {
        tracing::debug!("Registering listener '{}' for {:?}", listener.name(), event);
        self.listeners.entry(event).or_default().push(listener);
    }

    pub fn has_listeners(&self, event: Event) -> bool {
        self.listeners.get(&event).is_some_and(|l| !l.is_empty())
    }

    /// Listeners registered for an event
    pub fn listeners(&self, event: Event) -> &[Arc<dyn EventListener>] {
        self.listeners.get(&event).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Run every `LoadClassMetadata` listener against `metadata`
    pub fn dispatch_load_class_metadata(&self, metadata: &mut ClassMetadata) {
        for listener in self.listeners(Event::LoadClassMetadata) {
            listener.on_load_class_metadata(metadata);
        }
    }
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (event, listeners) in &self.listeners {
            let names: Vec<&str> = listeners.iter().map(|l| l.name()).collect();
            map.entry(event, &names);
        }
        map.finish()
    }
}
