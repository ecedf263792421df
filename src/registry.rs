use std::sync::{Arc, LazyLock};

use dashmap::DashMap;

use crate::components::ComponentClass;
use crate::error::{ComponentError, Result};

static GLOBAL_REGISTRY: LazyLock<Arc<ComponentRegistry>> =
    LazyLock::new(|| Arc::new(ComponentRegistry::new()));

/// [ComponentRegistry]
///
/// Maps component keys to their classes. Written at startup, read whenever a
/// host loads or adds a component
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    classes: DashMap<String, Arc<ComponentClass>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> Arc<ComponentRegistry> {
        GLOBAL_REGISTRY.clone()
    }

    /// Publishes `class` under its key. A class already registered under
    /// that key is replaced and returned
    pub fn register(&self, class: Arc<ComponentClass>) -> Option<Arc<ComponentClass>> {
        let key = class.component_key().to_owned();
        tracing::debug!("registering component '{}' in slot '{}'", key, class.component_slot());

        let previous = self.classes.insert(key.clone(), class);
        if previous.is_some() {
            tracing::warn!("component '{}' was registered twice, the latest class wins", key);
        }
        previous
    }

    pub fn resolve(&self, key: &str) -> Result<Arc<ComponentClass>> {
        self.classes
            .get(key)
            .map(|class| class.value().clone())
            .ok_or_else(|| {
                ComponentError::DoesNotExist(format!(
                    "component with key '{}' has not been found, make sure it has been registered before being used",
                    key
                ))
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.classes.contains_key(key)
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.classes.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
