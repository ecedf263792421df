//!
//!
//! In-memory stores and host
//!
//! Reference implementations of the store contracts. They back the test
//! suites and are handy for tools that mount components on scratch objects
//!

use std::collections::{BTreeMap, HashMap};

use crate::store::{AttributeStore, CmdSet, CmdSetStore, TagStore};
use crate::{Host, HostId, Value};

/// [MemoryAttributes]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemoryAttributes(BTreeMap<String, Value>);

/// [MemoryTags]
///
/// Tags by category, each category keeps insertion order and holds no
/// duplicates
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemoryTags(BTreeMap<String, Vec<String>>);

/// [MemoryCmdSets]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemoryCmdSets(Vec<CmdSet>);

/// [MemoryHost]
///
/// A host that keeps everything in maps. `restart` drops the in-memory
/// attributes the way a server reload would, persisted attributes and tags
/// survive
#[derive(Debug, Clone)]
pub struct MemoryHost {
    id: HostId,
    name: String,
    attributes: MemoryAttributes,
    nattributes: MemoryAttributes,
    tags: MemoryTags,
    cmdsets: MemoryCmdSets,
    properties: HashMap<String, Value>,
}

// Impl's

// `MemoryAttributes`
impl MemoryAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl AttributeStore for MemoryAttributes {
    fn get(&self, key: &str) -> Option<Value> {
        self.0.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_owned(), value);
    }

    fn delete(&mut self, key: &str) -> bool {
        self.0.remove(key).is_some()
    }

    fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

// `MemoryTags`
impl MemoryTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl TagStore for MemoryTags {
    fn add(&mut self, tag: &str, category: &str) {
        let tags = self.0.entry(category.to_owned()).or_default();
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_owned());
        }
    }

    fn remove(&mut self, tag: &str, category: &str) {
        if let Some(tags) = self.0.get_mut(category) {
            tags.retain(|t| t != tag);
            if tags.is_empty() {
                self.0.remove(category);
            }
        }
    }

    fn clear(&mut self, category: &str) {
        self.0.remove(category);
    }

    fn get(&self, category: &str) -> Vec<String> {
        self.0.get(category).cloned().unwrap_or_default()
    }
}

// `MemoryCmdSets`
impl MemoryCmdSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CmdSet> {
        self.0.iter()
    }
}

impl CmdSetStore for MemoryCmdSets {
    fn add(&mut self, cmdset: &CmdSet) {
        if !self.contains(cmdset) {
            self.0.push(cmdset.clone());
        }
    }

    fn remove(&mut self, cmdset: &CmdSet) {
        self.0.retain(|c| c != cmdset);
    }

    fn contains(&self, cmdset: &CmdSet) -> bool {
        self.0.contains(cmdset)
    }
}

// `MemoryHost`
impl MemoryHost {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: HostId(id),
            name: name.into(),
            attributes: MemoryAttributes::new(),
            nattributes: MemoryAttributes::new(),
            tags: MemoryTags::new(),
            cmdsets: MemoryCmdSets::new(),
            properties: HashMap::new(),
        }
    }

    /// Sets a named attribute on the host object itself
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_property(name, value);
        self
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    /// Simulates a process restart: in-memory attributes are lost
    pub fn restart(&mut self) {
        self.nattributes = MemoryAttributes::new();
    }

    pub fn memory_attributes(&self) -> &MemoryAttributes {
        &self.attributes
    }

    pub fn memory_tags(&self) -> &MemoryTags {
        &self.tags
    }

    pub fn memory_cmdsets(&self) -> &MemoryCmdSets {
        &self.cmdsets
    }
}

impl Host for MemoryHost {
    fn id(&self) -> HostId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> &dyn AttributeStore {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut dyn AttributeStore {
        &mut self.attributes
    }

    fn nattributes(&self) -> &dyn AttributeStore {
        &self.nattributes
    }

    fn nattributes_mut(&mut self) -> &mut dyn AttributeStore {
        &mut self.nattributes
    }

    fn tags(&self) -> &dyn TagStore {
        &self.tags
    }

    fn tags_mut(&mut self) -> &mut dyn TagStore {
        &mut self.tags
    }

    fn cmdset(&self) -> &dyn CmdSetStore {
        &self.cmdsets
    }

    fn cmdset_mut(&mut self) -> &mut dyn CmdSetStore {
        &mut self.cmdsets
    }

    fn host_attribute(&self, name: &str) -> Option<Value> {
        self.properties.get(name).cloned()
    }
}
