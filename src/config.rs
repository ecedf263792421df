//! Host type definitions loaded from TOML
//!
//! ```toml
//! [[host_type]]
//! name = "creature"
//! [[host_type.components]]
//! key = "health"
//! overrides = { current = 80 }
//!
//! [[host_type]]
//! name = "character"
//! extends = "creature"
//! [[host_type.components]]
//! key = "inventory"
//! ```

use std::collections::HashMap;
use std::path::Path;

use itertools::Itertools;
use serde::Deserialize;

use crate::error::{ComponentError, Result};
use crate::holder::{ComponentDeclaration, HostType};
use crate::registry::ComponentRegistry;

#[derive(Debug, Deserialize)]
struct HostTypesFile {
    #[serde(default, rename = "host_type")]
    host_types: Vec<HostTypeDef>,
}

#[derive(Debug, Deserialize)]
struct HostTypeDef {
    name: String,
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    components: Vec<ComponentDeclaration>,
}

/// [HostTypes]
///
/// Host types by name, in definition order
#[derive(Debug, Clone, Default)]
pub struct HostTypes {
    types: Vec<HostType>,
    by_name: HashMap<String, usize>,
}

impl HostTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: HostTypesFile = toml::from_str(content)?;

        let mut types = Self::new();
        for def in file.host_types {
            let mut host_type = match &def.extends {
                Some(parent) => {
                    let parent = types.get(parent).ok_or_else(|| {
                        ComponentError::Config(format!(
                            "host type '{}' extends '{}', which is not defined before it",
                            def.name, parent
                        ))
                    })?;
                    HostType::extending(def.name.clone(), parent)
                }
                None => HostType::new(def.name.clone()),
            };

            for declaration in def.components {
                host_type.declare(declaration);
            }
            types.insert(host_type)?;
        }

        tracing::debug!("loaded host types: {}", types.names().join(", "));
        Ok(types)
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn insert(&mut self, host_type: HostType) -> Result<()> {
        if self.by_name.contains_key(host_type.name()) {
            return Err(ComponentError::Config(format!(
                "host type '{}' is defined twice",
                host_type.name()
            )));
        }
        self.by_name.insert(host_type.name().to_owned(), self.types.len());
        self.types.push(host_type);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&HostType> {
        self.by_name.get(name).map(|&i| &self.types[i])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(HostType::name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HostType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Fails listing every declared component key the registry can't resolve
    pub fn validate(&self, registry: &ComponentRegistry) -> Result<()> {
        let missing = self
            .types
            .iter()
            .flat_map(|t| t.components().iter().map(move |d| (t.name(), d.key.as_str())))
            .filter(|(_, key)| !registry.contains(key))
            .map(|(name, key)| format!("{} (in '{}')", key, name))
            .unique()
            .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ComponentError::Config(format!(
                "unregistered components: {}",
                missing.join(", ")
            )))
        }
    }
}
