//! Table prefix hook
//!
//! When a prefix is configured, a `LoadClassMetadata` listener rewrites every
//! mapped table name so several applications can share one schema.

use crate::events::{AssociationKind, ClassMetadata, Event, EventListener, EventManager, InheritanceType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Optional table prefix; active only when non-empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablePrefixHook {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl TablePrefixHook {
    pub fn is_active(&self) -> bool {
        self.prefix.is_some()
    }

    /// Listener for the configured prefix, if any
    pub fn listener(&self) -> Option<TablePrefixListener> {
        self.prefix.as_deref().map(TablePrefixListener::new)
    }

    /// Event manager with the prefix listener registered when active
    pub fn event_manager(&self) -> EventManager {
        let mut manager = EventManager::new();
        if let Some(listener) = self.listener() {
            manager.add_listener(Event::LoadClassMetadata, Arc::new(listener));
        }
        manager
    }
}

/// Build the hook from a configured prefix; absent or empty disables it
pub fn resolve_table_prefix_hook(prefix: Option<&str>) -> TablePrefixHook {
    TablePrefixHook {
        prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
    }
}

/// Rewrites table names at metadata-load time
#[derive(Debug, Clone)]
pub struct TablePrefixListener {
    prefix: String,
}

impl TablePrefixListener {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn apply(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }
}

impl EventListener for TablePrefixListener {
    fn name(&self) -> &str {
        "table_prefix"
    }

    fn on_load_class_metadata(&self, metadata: &mut ClassMetadata) {
        // Single-table children share the root's table, which the root already prefixed
        if metadata.inheritance != InheritanceType::SingleTable || metadata.is_inheritance_root() {
            metadata.table_name = self.apply(&metadata.table_name);
        }

        for association in &mut metadata.associations {
            if association.kind == AssociationKind::ManyToMany && association.owning_side {
                if let Some(join_table) = association.join_table.as_mut() {
                    *join_table = self.apply(join_table);
                }
            }
        }
    }
}
