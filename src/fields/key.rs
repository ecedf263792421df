use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Debug};
use std::sync::Arc;

use gearbox_core::{Host, Identifier, Value};

use super::{storage_key, DbField};
use crate::error::{ComponentError, Result};

/// [KeyListing]
///
/// An external mapping from identifiers to the objects they name, e.g. a
/// table of item prototypes
pub trait KeyListing: Send + Sync {
    fn lookup(&self, id: &Identifier) -> Option<Value>;
}

impl KeyListing for HashMap<Identifier, Value> {
    fn lookup(&self, id: &Identifier) -> Option<Value> {
        self.get(id).cloned()
    }
}

impl KeyListing for BTreeMap<Identifier, Value> {
    fn lookup(&self, id: &Identifier) -> Option<Value> {
        self.get(id).cloned()
    }
}

/// [KeyField]
///
/// Persists only the identifier of a keyed object under
/// `"<slot>::<name>_key"` and resolves it through a [KeyListing] on read
///
/// Accepts a string, an integer, or an object with a `key` member, which is
/// normalized to its key before being stored
#[derive(Clone)]
pub struct KeyField {
    inner: DbField,
    listing: Arc<dyn KeyListing>,
    default: Option<Value>,
}

impl KeyField {
    pub fn new(listing: Arc<dyn KeyListing>) -> Self {
        Self {
            inner: DbField::empty(),
            listing,
            default: None,
        }
    }

    /// The default must normalize to an identifier, which is checked when
    /// the field is attached to its class
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn autocreate(mut self) -> Self {
        self.inner = self.inner.autocreate();
        self
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn key(&self) -> &str {
        self.inner.key()
    }

    pub(crate) fn set_name(&mut self, slot: &str, name: &str) -> Result<()> {
        self.inner.bind(name, storage_key(slot, &format!("{}_key", name)));

        if let Some(default) = self.default.clone().filter(|d| !d.is_null()) {
            let id = self.normalize(&default)?;
            self.inner.set_default(id.to_value());
        }
        Ok(())
    }

    fn normalize(&self, value: &Value) -> Result<Identifier> {
        Identifier::from_value(value).ok_or_else(|| ComponentError::InvalidKey {
            field: self.name().to_owned(),
            value: value.clone(),
        })
    }

    /// Fails for values that don't normalize to an identifier
    pub fn check(&self, value: &Value) -> Result<()> {
        self.normalize(value).map(|_| ())
    }

    /// The stored identifier, or the default one
    pub fn identifier(&self, host: &dyn Host) -> Option<Identifier> {
        Identifier::from_value(&self.inner.get(host))
    }

    /// The object the stored identifier names, null when the listing has no
    /// entry for it
    pub fn get(&self, host: &dyn Host) -> Value {
        self.identifier(host)
            .and_then(|id| self.listing.lookup(&id))
            .unwrap_or(Value::Null)
    }

    pub fn set(&self, host: &mut dyn Host, value: Value) -> Result<()> {
        let id = self.normalize(&value)?;
        self.inner.set(host, id.to_value());
        Ok(())
    }

    pub fn delete(&self, host: &mut dyn Host) {
        self.inner.delete(host);
    }

    pub fn at_added(&self, host: &mut dyn Host) {
        self.inner.at_added(host);
    }
}

impl Debug for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyField")
            .field("inner", &self.inner)
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::sync::Arc;

    use gearbox_core::memory::MemoryHost;
    use gearbox_core::{AttributeStore, Host, Identifier, Value};
    use serde_json::json;

    use super::KeyField;
    use crate::error::ComponentError;

    fn armory() -> Arc<HashMap<Identifier, Value>> {
        let mut listing: HashMap<Identifier, Value> = HashMap::new();
        listing.insert("sword1".into(), json!({ "key": "sword1", "damage": 6 }));
        listing.insert(Identifier::Int(7), json!({ "key": 7, "damage": 2 }));
        Arc::new(listing)
    }

    fn weapon() -> KeyField {
        let mut field = KeyField::new(armory());
        field.set_name("equipment", "weapon").unwrap();
        field
    }

    #[test]
    fn keyed_objects_are_stored_by_key_and_resolved_on_read() {
        let mut host = MemoryHost::new(1, "knight");
        let weapon = weapon();
        assert_eq!(weapon.key(), "equipment::weapon_key");

        weapon.set(&mut host, json!({ "key": "sword1", "damage": 99 })).unwrap();

        assert_eq!(host.attributes().get("equipment::weapon_key"), Some(json!("sword1")));
        assert_eq!(weapon.get(&host), json!({ "key": "sword1", "damage": 6 }));
    }

    #[test]
    fn plain_integers_are_stored_directly() {
        let mut host = MemoryHost::new(1, "knight");
        let weapon = weapon();

        weapon.set(&mut host, json!(7)).unwrap();
        assert_eq!(host.attributes().get("equipment::weapon_key"), Some(json!(7)));
        assert_eq!(weapon.identifier(&host), Some(Identifier::Int(7)));
        assert_eq!(weapon.get(&host), json!({ "key": 7, "damage": 2 }));
    }

    #[test]
    fn unknown_identifiers_read_as_null() {
        let mut host = MemoryHost::new(1, "knight");
        let weapon = weapon();

        assert_eq!(weapon.get(&host), Value::Null);
        weapon.set(&mut host, json!("club")).unwrap();
        assert_eq!(weapon.get(&host), Value::Null);
    }

    #[test]
    fn unkeyed_values_fail() {
        let mut host = MemoryHost::new(1, "knight");
        let weapon = weapon();

        let err = weapon.set(&mut host, json!({ "damage": 6 })).unwrap_err();
        assert!(matches!(err, ComponentError::InvalidKey { .. }));
        assert!(!host.attributes().has("equipment::weapon_key"));

        let mut bad = KeyField::new(armory()).with_default(json!(true));
        assert!(bad.set_name("equipment", "weapon").is_err());
    }

    #[test]
    fn keyed_default_is_normalized() {
        let mut host = MemoryHost::new(1, "knight");
        let mut weapon = KeyField::new(armory())
            .with_default(json!({ "key": "sword1" }))
            .autocreate();
        weapon.set_name("equipment", "weapon").unwrap();

        assert_eq!(weapon.get(&host), json!({ "key": "sword1", "damage": 6 }));

        weapon.at_added(&mut host);
        assert_eq!(host.attributes().get("equipment::weapon_key"), Some(json!("sword1")));
    }
}
