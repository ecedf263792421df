use std::sync::Arc;

use serde::{Deserialize, Serialize};

use gearbox_core::{Host, Signals, SignalsHandler, Value};

use crate::components::{ComponentClass, ComponentInstance};
use crate::error::Result;
use crate::handler::ComponentHandler;
use crate::registry::ComponentRegistry;

/// [ComponentDeclaration]
///
/// A component every host of a [HostType] starts with, and the field values
/// it starts with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDeclaration {
    pub key: String,
    #[serde(default)]
    pub overrides: serde_json::Map<String, Value>,
}

/// [HostType]
///
/// A named, ordered list of component declarations. A type extending another
/// starts with a copy of its parent's list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostType {
    name: String,
    components: Vec<ComponentDeclaration>,
}

/// [ComponentHolder]
///
/// A host with components. Owns the host, its [ComponentHandler] and its
/// [Signals] facility, and drives them through the host lifecycle:
/// [ComponentHolder::basetype_setup] when the host is first created and
/// [ComponentHolder::at_init] every time it is loaded
pub struct ComponentHolder<H: Host, S: Signals + Default = SignalsHandler> {
    host: H,
    host_type: HostType,
    registry: Arc<ComponentRegistry>,
    handler: ComponentHandler,
    signals: S,
}

/// [Components]
///
/// Mutable access to a holder's handler, with the host and signals the
/// handler operations need already bound
pub struct Components<'a> {
    handler: &'a mut ComponentHandler,
    host: &'a mut dyn Host,
    signals: &'a mut dyn Signals,
}

/// [ComponentRef]
///
/// A component of a holder, read through its host
pub struct ComponentRef<'a> {
    instance: &'a ComponentInstance,
    host: &'a dyn Host,
}

/// [ComponentMut]
pub struct ComponentMut<'a> {
    instance: &'a ComponentInstance,
    host: &'a mut dyn Host,
}

// Impl's

// `ComponentDeclaration`
impl ComponentDeclaration {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            overrides: serde_json::Map::new(),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.insert(field.into(), value.into());
        self
    }
}

// `HostType`
impl HostType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
        }
    }

    /// Parent declarations first, then whatever is declared on the new type
    pub fn extending(name: impl Into<String>, parent: &HostType) -> Self {
        Self {
            name: name.into(),
            components: parent.components.clone(),
        }
    }

    pub fn component(mut self, declaration: ComponentDeclaration) -> Self {
        self.components.push(declaration);
        self
    }

    pub fn declare(&mut self, declaration: ComponentDeclaration) {
        self.components.push(declaration);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> &[ComponentDeclaration] {
        &self.components
    }

    pub fn declares(&self, key: &str) -> bool {
        self.components.iter().any(|d| d.key == key)
    }
}

// `ComponentHolder`
impl<H: Host, S: Signals + Default> ComponentHolder<H, S> {
    /// Wraps `host` without touching it. Call [ComponentHolder::basetype_setup]
    /// for a new host or [ComponentHolder::at_init] for an existing one
    pub fn new(host: H, host_type: HostType, registry: Arc<ComponentRegistry>) -> Self {
        let handler = ComponentHandler::new(&host, registry.clone());
        Self {
            host,
            host_type,
            registry,
            handler,
            signals: S::default(),
        }
    }

    fn reset(&mut self) {
        self.handler = ComponentHandler::new(&self.host, self.registry.clone());
        self.signals = S::default();
    }

    /// First-time creation: creates and adds every component declared by the
    /// host type, in order, then triggers `at_basetype_setup`
    pub fn basetype_setup(&mut self) -> Result<()> {
        self.reset();
        tracing::debug!(
            "setting up {} as '{}' with {} component(s)",
            self.host.name(),
            self.host_type.name(),
            self.host_type.components().len()
        );

        for declaration in self.host_type.components() {
            let class = self.registry.resolve(&declaration.key)?;
            let overrides = declaration
                .overrides
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()));
            let instance = ComponentInstance::create(&class, &self.host, overrides)?;
            self.handler.add(instance, &mut self.host, &mut self.signals)?;
        }

        self.signals.trigger(&mut self.host, "at_basetype_setup", &[]);
        Ok(())
    }

    /// Every load: rehydrates the persisted components, then triggers
    /// `at_after_init`
    pub fn at_init(&mut self) -> Result<()> {
        self.reset();
        self.handler.initialize(&mut self.host, &mut self.signals)?;
        self.signals.trigger(&mut self.host, "at_after_init", &[]);
        Ok(())
    }

    pub fn at_post_puppet(&mut self, args: &[Value]) {
        self.signals.trigger(&mut self.host, "at_post_puppet", args);
    }

    pub fn at_post_unpuppet(&mut self, args: &[Value]) {
        self.signals.trigger(&mut self.host, "at_post_unpuppet", args);
    }

    pub fn trigger(&mut self, event: &str, args: &[Value]) {
        self.signals.trigger(&mut self.host, event, args);
    }

    pub fn query(&self, event: &str, args: &[Value]) -> Vec<Value> {
        self.signals.query(&self.host, event, args)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn host_type(&self) -> &HostType {
        &self.host_type
    }

    pub fn signals(&self) -> &S {
        &self.signals
    }

    pub fn components(&self) -> &ComponentHandler {
        &self.handler
    }

    /// Shorthand for [ComponentHolder::components]
    pub fn cmp(&self) -> &ComponentHandler {
        self.components()
    }

    pub fn components_mut(&mut self) -> Components<'_> {
        Components {
            handler: &mut self.handler,
            host: &mut self.host,
            signals: &mut self.signals,
        }
    }

    /// The component in `slot`, if any
    pub fn component(&self, slot: &str) -> Option<ComponentRef<'_>> {
        let instance = self.handler.get_by_slot(slot)?;
        Some(ComponentRef {
            instance,
            host: &self.host,
        })
    }

    pub fn component_mut(&mut self, slot: &str) -> Option<ComponentMut<'_>> {
        let instance = self.handler.get_by_slot(slot)?;
        Some(ComponentMut {
            instance,
            host: &mut self.host,
        })
    }

    /// A component declared by the host type, looked up by key. Components
    /// added at runtime are not reachable this way
    pub fn class_component(&self, key: &str) -> Option<ComponentRef<'_>> {
        if !self.host_type.declares(key) {
            return None;
        }
        let instance = self.handler.get_by_key(key)?;
        Some(ComponentRef {
            instance,
            host: &self.host,
        })
    }

    /// Releases the host, dropping the runtime state
    pub fn into_host(self) -> H {
        self.host
    }
}

// `Components`
impl Components<'_> {
    pub fn handler(&self) -> &ComponentHandler {
        &*self.handler
    }

    pub fn add(&mut self, instance: ComponentInstance) -> Result<()> {
        self.handler.add(instance, &mut *self.host, &mut *self.signals)
    }

    pub fn add_default(&mut self, key: &str) -> Result<()> {
        self.handler.add_default(key, &mut *self.host, &mut *self.signals)
    }

    /// Resolves `key`, creates an instance with `overrides` and adds it
    pub fn create<I, K>(&mut self, key: &str, overrides: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let class = self.handler.registry().resolve(key)?;
        let instance = ComponentInstance::create(&class, &*self.host, overrides)?;
        self.add(instance)
    }

    pub fn remove(&mut self, class: &ComponentClass) -> Result<ComponentInstance> {
        self.handler.remove(class, &mut *self.host, &mut *self.signals)
    }

    pub fn remove_by_slot_key(&mut self, slot: &str) -> Result<ComponentInstance> {
        self.handler.remove_by_slot_key(slot, &mut *self.host, &mut *self.signals)
    }

    /// Removes the component in `slot` and deletes its stored values
    pub fn discard(&mut self, slot: &str) -> Result<()> {
        let instance = self.remove_by_slot_key(slot)?;
        instance.cleanup(&mut *self.host);
        Ok(())
    }
}

// `ComponentRef`
impl<'a> ComponentRef<'a> {
    pub fn instance(&self) -> &'a ComponentInstance {
        self.instance
    }

    pub fn component_key(&self) -> &'a str {
        self.instance.component_key()
    }

    pub fn get(&self, field: &str) -> Result<Value> {
        self.instance.get(self.host, field)
    }
}

// `ComponentMut`
impl ComponentMut<'_> {
    pub fn instance(&self) -> &ComponentInstance {
        self.instance
    }

    pub fn get(&self, field: &str) -> Result<Value> {
        self.instance.get(&*self.host, field)
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.instance.set(&mut *self.host, field, value)
    }

    pub fn delete(&mut self, field: &str) -> Result<()> {
        self.instance.delete(&mut *self.host, field)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use gearbox_core::memory::MemoryHost;
    use gearbox_core::signals::ListenerFn;
    use gearbox_core::{AttributeStore, Host, TagStore, Value};
    use serde_json::json;

    use super::{ComponentDeclaration, ComponentHolder, HostType};
    use crate::components::ComponentClass;
    use crate::error::ComponentError;
    use crate::fields::{DbField, TagField};
    use crate::handler::COMPONENT_KEYS;
    use crate::registry::ComponentRegistry;

    fn count_init(host: &mut dyn Host, _args: &[Value]) {
        let n = host.nattributes().get("inits").and_then(|v| v.as_i64()).unwrap_or(0);
        host.nattributes_mut().set("inits", json!(n + 1));
    }

    fn registry() -> Arc<ComponentRegistry> {
        let registry = Arc::new(ComponentRegistry::new());
        ComponentClass::builder("health", "health")
            .field("current", DbField::new(100))
            .listener("at_after_init", count_init as ListenerFn)
            .register(&registry)
            .unwrap();
        ComponentClass::builder("faction", "faction")
            .field("side", TagField::new().with_default("neutral").enforce_single())
            .register(&registry)
            .unwrap();
        registry
    }

    fn creature() -> HostType {
        HostType::new("creature").component(ComponentDeclaration::new("health").with("current", 80))
    }

    #[test]
    fn extending_concatenates_parent_first() {
        let orc = HostType::extending("orc", &creature()).component(ComponentDeclaration::new("faction"));
        let keys: Vec<&str> = orc.components().iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, ["health", "faction"]);
        assert_eq!(creature().components().len(), 1);
    }

    #[test]
    fn basetype_setup_creates_declared_components() {
        let orc = HostType::extending("orc", &creature()).component(ComponentDeclaration::new("faction"));
        let mut holder: ComponentHolder<MemoryHost> =
            ComponentHolder::new(MemoryHost::new(1, "orc"), orc, registry());
        holder.basetype_setup().unwrap();

        assert_eq!(holder.component("health").unwrap().get("current").unwrap(), json!(80));
        assert_eq!(holder.component("faction").unwrap().get("side").unwrap(), json!("neutral"));
        assert!(holder.host().tags().has("neutral", "faction::side"));
        assert_eq!(holder.cmp().len(), 2);
        assert_eq!(holder.signals().triggered(), ["at_basetype_setup".to_owned()]);
        assert!(holder.component("mana").is_none());
    }

    #[test]
    fn declared_components_sharing_a_slot_keep_the_first() {
        let registry = registry();
        ComponentClass::builder("undead_health", "health")
            .field("current", DbField::new(1))
            .register(&registry)
            .unwrap();
        let lich = HostType::extending("lich", &creature())
            .component(ComponentDeclaration::new("undead_health").with("current", 1));
        let mut holder: ComponentHolder<MemoryHost> =
            ComponentHolder::new(MemoryHost::new(1, "lich"), lich, registry);

        let err = holder.basetype_setup().unwrap_err();
        assert!(matches!(err, ComponentError::SlotOccupied { .. }));
        assert_eq!(holder.component("health").unwrap().component_key(), "health");
        assert_eq!(holder.host().attributes().get("health::current"), Some(json!(80)));
    }

    #[test]
    fn failing_create_writes_nothing() {
        let mut holder: ComponentHolder<MemoryHost> =
            ComponentHolder::new(MemoryHost::new(1, "wolf"), creature(), registry());
        holder.basetype_setup().unwrap();

        let err = holder
            .components_mut()
            .create("health", [("current", json!(1))])
            .unwrap_err();
        assert!(matches!(err, ComponentError::SlotOccupied { .. }));
        assert_eq!(holder.component("health").unwrap().get("current").unwrap(), json!(80));

        let err = holder
            .components_mut()
            .create("faction", [("side", json!({ "pack": true }))])
            .unwrap_err();
        assert!(matches!(err, ComponentError::InvalidTag { .. }));
        assert!(!holder.components().has_slot("faction"));
        assert!(holder.host().tags().get("faction::side").is_empty());

        holder.components_mut().add_default("faction").unwrap();
        assert_eq!(holder.component("faction").unwrap().get("side").unwrap(), json!("neutral"));
    }

    #[test]
    fn at_init_rehydrates_and_notifies() {
        let registry = registry();
        let mut holder: ComponentHolder<MemoryHost> =
            ComponentHolder::new(MemoryHost::new(1, "wolf"), creature(), registry.clone());
        holder.basetype_setup().unwrap();
        holder.component_mut("health").unwrap().set("current", 12).unwrap();

        let mut host = holder.into_host();
        host.restart();

        let mut holder: ComponentHolder<MemoryHost> = ComponentHolder::new(host, creature(), registry);
        holder.at_init().unwrap();

        assert_eq!(holder.component("health").unwrap().get("current").unwrap(), json!(12));
        assert_eq!(holder.host().nattributes().get("inits"), Some(json!(1)));
        assert_eq!(holder.class_component("health").unwrap().component_key(), "health");
    }

    #[test]
    fn runtime_components_through_the_view() {
        let mut holder: ComponentHolder<MemoryHost> =
            ComponentHolder::new(MemoryHost::new(1, "wolf"), creature(), registry());
        holder.basetype_setup().unwrap();

        holder
            .components_mut()
            .create("faction", [("side", json!("pack"))])
            .unwrap();
        assert_eq!(holder.component("faction").unwrap().get("side").unwrap(), json!("pack"));
        assert!(holder.class_component("faction").is_none());

        holder.components_mut().discard("faction").unwrap();
        assert!(!holder.components().has_slot("faction"));
        assert!(holder.host().tags().get("faction::side").is_empty());
        assert_eq!(holder.host().attributes().get(COMPONENT_KEYS), Some(json!(["health"])));

        let err = holder.components_mut().remove_by_slot_key("faction").unwrap_err();
        assert!(matches!(err, ComponentError::IsNotRegistered(_)));
    }

    #[test]
    fn puppet_hooks_trigger_signals() {
        let mut holder: ComponentHolder<MemoryHost> =
            ComponentHolder::new(MemoryHost::new(1, "hero"), HostType::new("character"), registry());
        holder.at_init().unwrap();
        holder.at_post_puppet(&[json!("account")]);
        holder.at_post_unpuppet(&[]);

        assert_eq!(
            holder.signals().triggered(),
            ["at_after_init".to_owned(), "at_post_puppet".to_owned(), "at_post_unpuppet".to_owned()]
        );
        assert!(holder.components().is_empty());
    }
}
