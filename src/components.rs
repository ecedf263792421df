use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use itertools::Itertools;

use gearbox_core::signals::{ListenerFn, ResponderFn};
use gearbox_core::{AttributeStore, CmdSet, Host, HostId, SignalOwner, SlotId, Value};

use crate::error::{ComponentError, Result};
use crate::fields::{Field, FieldKind};
use crate::registry::ComponentRegistry;

/// [ComponentClass]
///
/// The blueprint of a component: its identity, its field table, and what it
/// contributes to a host (a command set, signal listeners and responders)
///
/// The key is what the registry and the persisted component list know a
/// component by, the slot is the namespace its fields are stored under. A
/// host holds at most one component per slot
pub struct ComponentClass {
    key: String,
    slot: String,
    slot_id: SlotId,
    fields: Vec<Field>,
    cmd_set: Option<CmdSet>,
    listeners: Vec<(String, ListenerFn)>,
    responders: Vec<(String, ResponderFn)>,
}

/// [ComponentClassBuilder]
///
/// Declares a [ComponentClass]. Fields are only bound to the slot in
/// [ComponentClassBuilder::build], after the identity has been validated
pub struct ComponentClassBuilder {
    key: String,
    slot: String,
    legacy_name: Option<String>,
    fields: Vec<(String, Field)>,
    cmd_set: Option<CmdSet>,
    listeners: Vec<(String, ListenerFn)>,
    responders: Vec<(String, ResponderFn)>,
}

/// [ComponentInstance]
///
/// A component bound to (at most) one host. The instance stores no field
/// values itself, they live on the host under the class's storage keys.
/// Overrides given at creation wait on the instance until it is added
#[derive(Debug, Clone)]
pub struct ComponentInstance {
    class: Arc<ComponentClass>,
    host: Option<HostId>,
    transient: HashMap<String, Value>,
    pending: Vec<(String, Value)>,
}

// Impl's

// `ComponentClass`
impl ComponentClass {
    pub fn builder(key: impl Into<String>, slot: impl Into<String>) -> ComponentClassBuilder {
        ComponentClassBuilder {
            key: key.into(),
            slot: slot.into(),
            legacy_name: None,
            fields: Vec::new(),
            cmd_set: None,
            listeners: Vec::new(),
            responders: Vec::new(),
        }
    }

    /// Older components declare a single name used as both key and slot
    pub fn legacy(name: impl Into<String>) -> ComponentClassBuilder {
        let mut builder = Self::builder("", "");
        builder.legacy_name = Some(name.into());
        builder
    }

    pub fn component_key(&self) -> &str {
        &self.key
    }

    pub fn component_slot(&self) -> &str {
        &self.slot
    }

    pub fn slot_id(&self) -> SlotId {
        self.slot_id
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn cmd_set(&self) -> Option<&CmdSet> {
        self.cmd_set.as_ref()
    }

    /// Listeners and responders this component subscribes on its host,
    /// owned by its slot
    pub fn signal_owner(&self) -> SignalOwner {
        SignalOwner::new(
            self.slot.clone(),
            self.listeners.clone(),
            self.responders.clone(),
        )
    }

    fn field_names(&self, pred: impl Fn(&Field) -> bool) -> impl Iterator<Item = &str> {
        self.fields.iter().filter(move |f| pred(f)).map(Field::name)
    }

    /// Names of the persisted attribute fields (db, host and key fields)
    pub fn db_field_names(&self) -> impl Iterator<Item = &str> {
        self.field_names(Field::is_db)
    }

    pub fn ndb_field_names(&self) -> impl Iterator<Item = &str> {
        self.field_names(|f| f.kind() == FieldKind::Ndb)
    }

    pub fn tag_field_names(&self) -> impl Iterator<Item = &str> {
        self.field_names(|f| f.kind() == FieldKind::Tag)
    }

    /// Persisted then in-memory attribute field names
    pub fn all_db_field_names(&self) -> impl Iterator<Item = &str> {
        itertools::chain(self.db_field_names(), self.ndb_field_names())
    }
}

impl Debug for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentClass")
            .field("key", &self.key)
            .field("slot", &self.slot)
            .field("fields", &self.fields)
            .field("cmd_set", &self.cmd_set)
            .field("signals", &self.signal_owner())
            .finish()
    }
}

// `ComponentClassBuilder`
impl ComponentClassBuilder {
    pub fn field(mut self, name: impl Into<String>, field: impl Into<Field>) -> Self {
        self.fields.push((name.into(), field.into()));
        self
    }

    pub fn cmd_set(mut self, cmd_set: CmdSet) -> Self {
        self.cmd_set = Some(cmd_set);
        self
    }

    pub fn listener(mut self, event: impl Into<String>, listener: ListenerFn) -> Self {
        self.listeners.push((event.into(), listener));
        self
    }

    pub fn responder(mut self, event: impl Into<String>, responder: ResponderFn) -> Self {
        self.responders.push((event.into(), responder));
        self
    }

    fn identity(&self) -> Result<(String, String)> {
        match (self.key.is_empty(), self.slot.is_empty()) {
            (false, false) => Ok((self.key.clone(), self.slot.clone())),
            (true, true) => match self.legacy_name.as_deref() {
                Some(name) if !name.is_empty() => Ok((name.to_owned(), name.to_owned())),
                _ => Err(ComponentError::MissingIdentity(
                    "all components must have a slot and a key, or a legacy name".to_owned(),
                )),
            },
            (true, false) => Err(ComponentError::MissingIdentity(format!(
                "a component_key is required for slot '{}'",
                self.slot
            ))),
            (false, true) => Err(ComponentError::MissingIdentity(format!(
                "a component_slot is required for '{}'",
                self.key
            ))),
        }
    }

    pub fn build(self) -> Result<Arc<ComponentClass>> {
        let (key, slot) = self.identity()?;

        if let Some(name) = self.fields.iter().map(|(name, _)| name).duplicates().next() {
            return Err(ComponentError::DuplicateField {
                slot,
                field: name.clone(),
            });
        }

        let mut fields = Vec::with_capacity(self.fields.len());
        for (name, mut field) in self.fields {
            field.attach(&slot, &name)?;
            fields.push(field);
        }

        Ok(Arc::new(ComponentClass {
            slot_id: SlotId::of(&slot),
            key,
            slot,
            fields,
            cmd_set: self.cmd_set,
            listeners: self.listeners,
            responders: self.responders,
        }))
    }

    /// Builds the class and publishes it under its key
    pub fn register(self, registry: &ComponentRegistry) -> Result<Arc<ComponentClass>> {
        let class = self.build()?;
        registry.register(class.clone());
        Ok(class)
    }
}

// `ComponentInstance`
impl ComponentInstance {
    pub fn new(class: Arc<ComponentClass>, host: Option<HostId>) -> Self {
        Self {
            class,
            host,
            transient: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// A fresh instance for `host`, nothing is written to the host
    pub fn default_create(class: &Arc<ComponentClass>, host: &dyn Host) -> Self {
        Self::new(class.clone(), Some(host.id()))
    }

    /// A fresh instance for `host` with `overrides` on top
    ///
    /// Overrides naming a declared field are validated here and written
    /// through that field when the instance is added to the host. Any other
    /// override is kept on the instance only. Nothing is written to `host`
    pub fn create<I, K>(class: &Arc<ComponentClass>, host: &dyn Host, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut instance = Self::default_create(class, host);
        for (name, value) in overrides {
            let name = name.into();
            match class.field(&name) {
                Some(field) => {
                    field.check(&value)?;
                    instance.pending.push((name, value));
                }
                None => {
                    tracing::warn!(
                        "override '{}' is not a field of component '{}', it will not persist",
                        name,
                        class.component_key()
                    );
                    instance.transient.insert(name, value);
                }
            }
        }
        Ok(instance)
    }

    /// Rehydrates an instance against a host that already holds its values
    pub fn load(class: &Arc<ComponentClass>, host: &dyn Host) -> Self {
        tracing::debug!("loading component '{}' on {}", class.component_key(), host.name());
        Self::new(class.clone(), Some(host.id()))
    }

    pub fn class(&self) -> &Arc<ComponentClass> {
        &self.class
    }

    pub fn component_key(&self) -> &str {
        self.class.component_key()
    }

    pub fn component_slot(&self) -> &str {
        self.class.component_slot()
    }

    pub fn slot_id(&self) -> SlotId {
        self.class.slot_id()
    }

    /// The host this instance is bound to
    pub fn host(&self) -> Option<HostId> {
        self.host
    }

    pub fn at_added(&mut self, host: &mut dyn Host) -> Result<()> {
        if let Some(bound) = self.host.filter(|bound| *bound != host.id()) {
            return Err(ComponentError::RegisterTwice(format!(
                "component '{}' is bound to {} and must not register twice (on {})",
                self.component_slot(),
                bound,
                host.name()
            )));
        }

        if let Some(cmd_set) = self.class.cmd_set() {
            host.cmdset_mut().add(cmd_set);
        }

        self.host = Some(host.id());
        Ok(())
    }

    pub fn at_removed(&mut self, host: &mut dyn Host) -> Result<()> {
        if self.host != Some(host.id()) {
            return Err(ComponentError::HostMismatch {
                slot: self.component_slot().to_owned(),
                expected: self.host.map_or_else(|| "no host".to_owned(), |h| h.to_string()),
                found: format!("{} ({})", host.name(), host.id()),
            });
        }

        if let Some(cmd_set) = self.class.cmd_set() {
            host.cmdset_mut().remove(cmd_set);
        }

        self.host = None;
        Ok(())
    }

    /// Deletes every value this component keeps on `host`
    pub fn cleanup(&self, host: &mut dyn Host) {
        tracing::debug!(
            "cleaning up component '{}' ({}) on {}",
            self.component_key(),
            self.class.fields().iter().map(Field::name).join(", "),
            host.name()
        );
        for field in self.class.fields() {
            field.delete(host);
        }
    }

    fn declared(&self, name: &str) -> Result<&Field> {
        self.class.field(name).ok_or_else(|| ComponentError::UnknownField {
            slot: self.component_slot().to_owned(),
            field: name.to_owned(),
        })
    }

    /// Reads a field, or a transient override set at creation
    pub fn get(&self, host: &dyn Host, name: &str) -> Result<Value> {
        match self.class.field(name) {
            Some(field) => Ok(field.get(host)),
            None => self.transient.get(name).cloned().ok_or_else(|| ComponentError::UnknownField {
                slot: self.component_slot().to_owned(),
                field: name.to_owned(),
            }),
        }
    }

    pub fn set(&self, host: &mut dyn Host, name: &str, value: impl Into<Value>) -> Result<()> {
        self.declared(name)?.set(host, value.into())
    }

    pub fn delete(&self, host: &mut dyn Host, name: &str) -> Result<()> {
        self.declared(name)?.delete(host);
        Ok(())
    }

    pub fn transient(&self, name: &str) -> Option<&Value> {
        self.transient.get(name)
    }

    /// Field overrides still waiting to be written, in creation order
    pub fn pending_overrides(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.pending.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// The declared fields [ComponentInstance::apply_overrides] will write
    pub(crate) fn pending_fields(&self) -> impl Iterator<Item = &Field> {
        self.class
            .fields()
            .iter()
            .filter(|field| self.pending.iter().any(|(name, _)| name == field.name()))
    }

    /// Writes the creation overrides through their fields
    pub(crate) fn apply_overrides(&mut self, host: &mut dyn Host) -> Result<()> {
        for (name, value) in std::mem::take(&mut self.pending) {
            self.declared(&name)?.set(host, value)?;
        }
        Ok(())
    }

    /// Shortcut to the host's persisted attributes
    pub fn attributes<'h>(&self, host: &'h dyn Host) -> &'h dyn AttributeStore {
        host.attributes()
    }

    /// Shortcut to the host's in-memory attributes
    pub fn nattributes<'h>(&self, host: &'h dyn Host) -> &'h dyn AttributeStore {
        host.nattributes()
    }

    pub fn db_field_names(&self) -> impl Iterator<Item = &str> {
        self.class.db_field_names()
    }

    pub fn ndb_field_names(&self) -> impl Iterator<Item = &str> {
        self.class.ndb_field_names()
    }

    pub fn tag_field_names(&self) -> impl Iterator<Item = &str> {
        self.class.tag_field_names()
    }
}
