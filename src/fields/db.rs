use gearbox_core::{Host, Value};

use super::storage_key;

/// [DbField]
///
/// A component value kept in the host's persisted attributes under
/// `"<slot>::<name>"`. Reading an unset field yields its default
///
/// With `autocreate`, the default is written as soon as the owning component
/// is added to a host instead of only being reported on read
#[derive(Debug, Clone, Default)]
pub struct DbField {
    default: Value,
    autocreate: bool,
    name: String,
    key: String,
}

/// [NdbField]
///
/// Like [DbField], but backed by the host's in-memory attributes
#[derive(Debug, Clone, Default)]
pub struct NdbField {
    default: Value,
    autocreate: bool,
    name: String,
    key: String,
}

// Impl's

// `DbField`
impl DbField {
    pub fn new(default: impl Into<Value>) -> Self {
        Self {
            default: default.into(),
            ..Default::default()
        }
    }

    /// A field with no default, reads as null until set
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn autocreate(mut self) -> Self {
        self.autocreate = true;
        self
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn set_name(&mut self, slot: &str, name: &str) {
        self.bind(name, storage_key(slot, name));
    }

    pub(crate) fn bind(&mut self, name: &str, key: String) {
        self.name = name.to_owned();
        self.key = key;
    }

    pub(crate) fn set_default(&mut self, default: Value) {
        self.default = default;
    }

    /// The stored value, `None` when nothing was ever written
    pub fn stored(&self, host: &dyn Host) -> Option<Value> {
        host.attributes().get(&self.key)
    }

    pub fn get(&self, host: &dyn Host) -> Value {
        host.attributes().get_or(&self.key, self.default.clone())
    }

    pub fn set(&self, host: &mut dyn Host, value: Value) {
        host.attributes_mut().set(&self.key, value);
    }

    pub fn delete(&self, host: &mut dyn Host) {
        host.attributes_mut().delete(&self.key);
    }

    pub fn at_added(&self, host: &mut dyn Host) {
        if self.autocreate && !host.attributes().has(&self.key) {
            tracing::debug!("autocreating {} on {}", self.key, host.name());
            self.set(host, self.default.clone());
        }
    }
}

// `NdbField`
impl NdbField {
    pub fn new(default: impl Into<Value>) -> Self {
        Self {
            default: default.into(),
            ..Default::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn autocreate(mut self) -> Self {
        self.autocreate = true;
        self
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn set_name(&mut self, slot: &str, name: &str) {
        self.name = name.to_owned();
        self.key = storage_key(slot, name);
    }

    pub fn get(&self, host: &dyn Host) -> Value {
        host.nattributes().get_or(&self.key, self.default.clone())
    }

    pub fn set(&self, host: &mut dyn Host, value: Value) {
        host.nattributes_mut().set(&self.key, value);
    }

    pub fn delete(&self, host: &mut dyn Host) {
        host.nattributes_mut().delete(&self.key);
    }

    pub fn at_added(&self, host: &mut dyn Host) {
        if self.autocreate {
            self.set(host, self.default.clone());
        }
    }
}
