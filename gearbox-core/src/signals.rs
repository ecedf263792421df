//!
//!
//! Signals
//!
//! Named events fired at a host. Components subscribe listeners (called for
//! their side effects) and responders (queried for a value) when they are
//! added to a host, and unsubscribe when removed
//!

use std::collections::HashMap;
use std::fmt::{self, Debug};

use crate::{Host, Value};

pub type ListenerFn = fn(&mut dyn Host, &[Value]);
pub type ResponderFn = fn(&dyn Host, &[Value]) -> Value;

/// [SignalOwner]
///
/// The listeners and responders contributed by one owner, usually a
/// component identified by its slot
#[derive(Clone, Default)]
pub struct SignalOwner {
    owner: String,
    listeners: Vec<(String, ListenerFn)>,
    responders: Vec<(String, ResponderFn)>,
}

impl SignalOwner {
    pub fn new(
        owner: impl Into<String>,
        listeners: Vec<(String, ListenerFn)>,
        responders: Vec<(String, ResponderFn)>,
    ) -> Self {
        Self {
            owner: owner.into(),
            listeners,
            responders,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn listeners(&self) -> &[(String, ListenerFn)] {
        &self.listeners
    }

    pub fn responders(&self) -> &[(String, ResponderFn)] {
        &self.responders
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty() && self.responders.is_empty()
    }
}

impl Debug for SignalOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners: Vec<&str> = self.listeners.iter().map(|(e, _)| e.as_str()).collect();
        let responders: Vec<&str> = self.responders.iter().map(|(e, _)| e.as_str()).collect();
        f.debug_struct("SignalOwner")
            .field("owner", &self.owner)
            .field("listeners", &listeners)
            .field("responders", &responders)
            .finish()
    }
}

/// [Signals]
///
/// The signal facility of a single host
pub trait Signals {
    /// Calls every listener subscribed to `event`
    fn trigger(&mut self, host: &mut dyn Host, event: &str, args: &[Value]);

    /// Collects a value from every responder subscribed to `event`
    fn query(&self, host: &dyn Host, event: &str, args: &[Value]) -> Vec<Value>;

    fn add_object_listeners_and_responders(&mut self, owner: &SignalOwner);
    fn remove_object_listeners_and_responders(&mut self, owner: &SignalOwner);
}

/// [SignalsHandler]
///
/// Default in-process [Signals] implementation. Listeners run in the order
/// they subscribed
#[derive(Default)]
pub struct SignalsHandler {
    listeners: HashMap<String, Vec<(String, ListenerFn)>>,
    responders: HashMap<String, Vec<(String, ResponderFn)>>,
    triggered: Vec<String>,
}

impl SignalsHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event triggered so far, oldest first
    pub fn triggered(&self) -> &[String] {
        &self.triggered
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, |l| l.len())
    }

    pub fn responder_count(&self, event: &str) -> usize {
        self.responders.get(event).map_or(0, |r| r.len())
    }
}

impl Signals for SignalsHandler {
    fn trigger(&mut self, host: &mut dyn Host, event: &str, args: &[Value]) {
        tracing::debug!("triggering '{}' on {}", event, host.name());

        if let Some(listeners) = self.listeners.get(event) {
            for (_, listener) in listeners {
                listener(host, args);
            }
        }
        self.triggered.push(event.to_owned());
    }

    fn query(&self, host: &dyn Host, event: &str, args: &[Value]) -> Vec<Value> {
        self.responders
            .get(event)
            .map(|responders| responders.iter().map(|(_, r)| r(host, args)).collect())
            .unwrap_or_default()
    }

    fn add_object_listeners_and_responders(&mut self, owner: &SignalOwner) {
        for (event, listener) in owner.listeners() {
            self.listeners
                .entry(event.clone())
                .or_default()
                .push((owner.owner().to_owned(), *listener));
        }
        for (event, responder) in owner.responders() {
            self.responders
                .entry(event.clone())
                .or_default()
                .push((owner.owner().to_owned(), *responder));
        }
    }

    fn remove_object_listeners_and_responders(&mut self, owner: &SignalOwner) {
        let name = owner.owner();
        self.listeners.values_mut().for_each(|l| l.retain(|(o, _)| o != name));
        self.responders.values_mut().for_each(|r| r.retain(|(o, _)| o != name));
        self.listeners.retain(|_, l| !l.is_empty());
        self.responders.retain(|_, r| !r.is_empty());
    }
}

impl Debug for SignalsHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut listened: Vec<&String> = self.listeners.keys().collect();
        listened.sort();
        f.debug_struct("SignalsHandler")
            .field("listened", &listened)
            .field("triggered", &self.triggered)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::{SignalOwner, Signals, SignalsHandler};
    use crate::memory::MemoryHost;
    use crate::{AttributeStore, Host, Value};

    fn count_up(host: &mut dyn Host, _args: &[Value]) {
        let n = host.nattributes().get("count").and_then(|v| v.as_i64()).unwrap_or(0);
        host.nattributes_mut().set("count", json!(n + 1));
    }

    fn report_name(host: &dyn Host, _args: &[Value]) -> Value {
        json!(host.name())
    }

    fn owner(name: &str) -> SignalOwner {
        SignalOwner::new(
            name,
            vec![("tick".to_owned(), count_up as super::ListenerFn)],
            vec![("who".to_owned(), report_name as super::ResponderFn)],
        )
    }

    #[test]
    fn listeners_run_on_trigger() {
        let mut host = MemoryHost::new(1, "clock");
        let mut signals = SignalsHandler::new();
        signals.add_object_listeners_and_responders(&owner("a"));
        signals.add_object_listeners_and_responders(&owner("b"));

        signals.trigger(&mut host, "tick", &[]);
        assert_eq!(host.nattributes().get("count"), Some(json!(2)));
        assert_eq!(signals.query(&host, "who", &[]), vec![json!("clock"), json!("clock")]);
        assert_eq!(signals.triggered(), ["tick".to_owned()]);
    }

    #[test]
    fn removing_an_owner_drops_only_its_subscriptions() {
        let mut host = MemoryHost::new(1, "clock");
        let mut signals = SignalsHandler::new();
        signals.add_object_listeners_and_responders(&owner("a"));
        signals.add_object_listeners_and_responders(&owner("b"));
        signals.remove_object_listeners_and_responders(&owner("a"));

        assert_eq!(signals.listener_count("tick"), 1);
        assert_eq!(signals.responder_count("who"), 1);

        signals.remove_object_listeners_and_responders(&owner("b"));
        signals.trigger(&mut host, "tick", &[]);
        assert_eq!(host.nattributes().get("count"), None);
        assert!(signals.query(&host, "who", &[]).is_empty());
    }
}
