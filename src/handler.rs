use std::collections::HashMap;
use std::sync::Arc;

use gearbox_core::{Host, HostId, Signals, SlotId, Value};

use crate::components::{ComponentClass, ComponentInstance};
use crate::error::{ComponentError, Result};
use crate::registry::ComponentRegistry;

/// Host attribute holding the ordered list of attached component keys
pub const COMPONENT_KEYS: &str = "component_keys";

/// Older hosts recorded their components under this attribute
pub const LEGACY_COMPONENT_NAMES: &str = "component_names";

/// Tag category listing the components a host implements
pub const COMPONENT_TAG_CATEGORY: &str = "components";

/// [ComponentHandler]
///
/// The per-host registry of attached component instances. Instances are
/// cached by slot, with a secondary index from component key to slot, and
/// the keys are persisted on the host so [ComponentHandler::initialize] can
/// bring them back after a restart
#[derive(Debug)]
pub struct ComponentHandler {
    host: HostId,
    registry: Arc<ComponentRegistry>,
    instances: HashMap<SlotId, ComponentInstance>,
    keys: HashMap<String, SlotId>,
}

fn read_keys(value: Option<Value>) -> Option<Vec<String>> {
    match value? {
        Value::Array(entries) => Some(
            entries
                .into_iter()
                .filter_map(|entry| entry.as_str().map(str::to_owned))
                .collect(),
        ),
        _ => None,
    }
}

fn write_keys(host: &mut dyn Host, keys: &[String]) {
    let list = keys.iter().cloned().map(Value::String).collect();
    host.attributes_mut().set(COMPONENT_KEYS, Value::Array(list));
}

impl ComponentHandler {
    pub fn new(host: &dyn Host, registry: Arc<ComponentRegistry>) -> Self {
        Self {
            host: host.id(),
            registry,
            instances: HashMap::new(),
            keys: HashMap::new(),
        }
    }

    pub fn host(&self) -> HostId {
        self.host
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// The persisted component keys of `host`, in the order they were added
    ///
    /// A host without the list gets an empty one, seeded from the legacy
    /// `component_names` attribute when present
    pub fn db_keys(&self, host: &mut dyn Host) -> Vec<String> {
        if let Some(keys) = read_keys(host.attributes().get(COMPONENT_KEYS)) {
            return keys;
        }

        let keys = read_keys(host.attributes().get(LEGACY_COMPONENT_NAMES)).unwrap_or_default();
        if !keys.is_empty() {
            tracing::debug!("migrating legacy component names of {}: {:?}", host.name(), keys);
        }
        write_keys(host, &keys);
        keys
    }

    fn unregistered(slot: &str, host: &dyn Host) -> ComponentError {
        ComponentError::IsNotRegistered(format!(
            "Cannot remove {} from {} as it is not registered.",
            slot,
            host.name()
        ))
    }

    /// Attaches `instance` to `host`
    ///
    /// Persists its key, caches it, wires its signals, tags the host with
    /// the component key, writes the creation overrides, runs the field
    /// hooks (tag defaults, autocreate) and finally the instance's own
    /// `at_added`. If any step fails the earlier ones are undone and the
    /// fields hold what they held before
    pub fn add(
        &mut self,
        mut instance: ComponentInstance,
        host: &mut dyn Host,
        signals: &mut dyn Signals,
    ) -> Result<()> {
        let slot = instance.slot_id();
        if let Some(occupant) = self.instances.get(&slot) {
            let held = if occupant.component_slot() == instance.component_slot() {
                format!("{} (held by '{}')", occupant.component_slot(), occupant.component_key())
            } else {
                // distinct slot names hashing to one id
                tracing::error!(
                    "slot '{}' collides with slot '{}' on {}",
                    instance.component_slot(),
                    occupant.component_slot(),
                    host.name()
                );
                format!(
                    "{} (id collides with slot '{}' held by '{}')",
                    instance.component_slot(),
                    occupant.component_slot(),
                    occupant.component_key()
                )
            };
            return Err(ComponentError::SlotOccupied {
                slot: held,
                host: host.name().to_owned(),
            });
        }

        let key = instance.component_key().to_owned();
        let class = instance.class().clone();
        tracing::debug!("adding component '{}' to {}", key, host.name());

        let mut keys = self.db_keys(host);
        let persisted = !keys.contains(&key);
        if persisted {
            keys.push(key.clone());
            write_keys(host, &keys);
        }

        let owner = class.signal_owner();
        signals.add_object_listeners_and_responders(&owner);
        host.tags_mut().add(&key, COMPONENT_TAG_CATEGORY);

        let snapshots: Vec<_> = instance
            .pending_fields()
            .map(|field| (field.clone(), field.stored(host)))
            .collect();

        let attached = instance
            .apply_overrides(host)
            .and_then(|_| class.fields().iter().try_for_each(|field| field.at_added(host)))
            .and_then(|_| instance.at_added(host));

        if let Err(err) = attached {
            tracing::warn!("rolling back component '{}' on {}: {}", key, host.name(), err);
            for field in class.fields() {
                field.at_removed(host);
            }
            for (field, stored) in snapshots.into_iter().rev() {
                field.restore(host, stored);
            }
            host.tags_mut().remove(&key, COMPONENT_TAG_CATEGORY);
            signals.remove_object_listeners_and_responders(&owner);
            if persisted {
                keys.retain(|k| *k != key);
                write_keys(host, &keys);
            }
            return Err(err);
        }

        self.keys.insert(key, slot);
        self.instances.insert(slot, instance);
        Ok(())
    }

    /// Resolves `key`, creates a default instance for `host` and adds it
    pub fn add_default(
        &mut self,
        key: &str,
        host: &mut dyn Host,
        signals: &mut dyn Signals,
    ) -> Result<()> {
        let class = self.registry.resolve(key)?;
        let instance = ComponentInstance::default_create(&class, host);
        self.add(instance, host, signals)
    }

    /// Detaches the component of `class` from `host` and returns it, so the
    /// caller may [ComponentInstance::cleanup] its persisted values
    pub fn remove(
        &mut self,
        class: &ComponentClass,
        host: &mut dyn Host,
        signals: &mut dyn Signals,
    ) -> Result<ComponentInstance> {
        let occupant = self
            .instances
            .get(&class.slot_id())
            .map(|instance| instance.component_key().to_owned());

        match occupant {
            Some(key) if key == class.component_key() => self.detach(class.slot_id(), host, signals),
            Some(key) => Err(ComponentError::IsNotRegistered(format!(
                "Cannot remove {} from {}: slot {} holds {}",
                class.component_key(),
                host.name(),
                class.component_slot(),
                key
            ))),
            None => Err(Self::unregistered(class.component_slot(), host)),
        }
    }

    pub fn remove_by_slot_key(
        &mut self,
        slot: &str,
        host: &mut dyn Host,
        signals: &mut dyn Signals,
    ) -> Result<ComponentInstance> {
        let slot_id = SlotId::of(slot);
        if !self.has_slot(slot) {
            return Err(Self::unregistered(slot, host));
        }
        self.detach(slot_id, host, signals)
    }

    fn detach(
        &mut self,
        slot: SlotId,
        host: &mut dyn Host,
        signals: &mut dyn Signals,
    ) -> Result<ComponentInstance> {
        let mut instance = match self.instances.remove(&slot) {
            Some(instance) => instance,
            None => return Err(Self::unregistered(&slot.to_string(), host)),
        };

        // at_removed only fails before it touches the host
        if let Err(err) = instance.at_removed(host) {
            self.instances.insert(slot, instance);
            return Err(err);
        }

        let key = instance.component_key().to_owned();
        tracing::debug!("removing component '{}' from {}", key, host.name());

        let class = instance.class().clone();
        for field in class.fields() {
            field.at_removed(host);
        }
        host.tags_mut().remove(&key, COMPONENT_TAG_CATEGORY);
        signals.remove_object_listeners_and_responders(&class.signal_owner());

        let mut keys = self.db_keys(host);
        keys.retain(|k| *k != key);
        write_keys(host, &keys);

        self.keys.remove(&key);
        Ok(instance)
    }

    pub fn get_by_key(&self, key: &str) -> Option<&ComponentInstance> {
        self.keys.get(key).and_then(|slot| self.instances.get(slot))
    }

    pub fn get_by_key_mut(&mut self, key: &str) -> Option<&mut ComponentInstance> {
        let slot = self.keys.get(key)?;
        self.instances.get_mut(slot)
    }

    pub fn get_by_slot(&self, slot: &str) -> Option<&ComponentInstance> {
        self.instances
            .get(&SlotId::of(slot))
            .filter(|instance| instance.component_slot() == slot)
    }

    pub fn get_by_slot_mut(&mut self, slot: &str) -> Option<&mut ComponentInstance> {
        self.instances
            .get_mut(&SlotId::of(slot))
            .filter(|instance| instance.component_slot() == slot)
    }

    pub fn has_slot(&self, slot: &str) -> bool {
        self.get_by_slot(slot).is_some()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// Occupied slots, in no particular order
    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.instances.values().map(ComponentInstance::component_slot)
    }

    pub fn instances(&self) -> impl Iterator<Item = &ComponentInstance> {
        self.instances.values()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Loads and caches every component persisted on `host`
    pub fn initialize(&mut self, host: &mut dyn Host, signals: &mut dyn Signals) -> Result<()> {
        let keys = self.db_keys(host);
        tracing::debug!("initializing {} component(s) on {}", keys.len(), host.name());

        for key in keys {
            let class = self.registry.resolve(&key).map_err(|_| {
                ComponentError::DoesNotExist(format!(
                    "Could not initialize runtime component {} of {}",
                    key,
                    host.name()
                ))
            })?;

            let slot = class.slot_id();
            if self.instances.contains_key(&slot) {
                tracing::warn!(
                    "skipping component '{}' on {}: slot '{}' is already loaded",
                    key,
                    host.name(),
                    class.component_slot()
                );
                continue;
            }

            let instance = ComponentInstance::load(&class, host);
            signals.add_object_listeners_and_responders(&class.signal_owner());
            self.keys.insert(key, slot);
            self.instances.insert(slot, instance);
        }
        Ok(())
    }
}
