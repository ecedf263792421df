//!
//!
//! The host contract
//!
//!

use crate::store::{AttributeStore, CmdSetStore, TagStore};
use crate::{HostId, Value};

/// [Host]
///
/// A persistent game object components can be mounted on. Rooms, characters
/// and items all implement this one trait
pub trait Host {
    fn id(&self) -> HostId;

    /// Display name, only used in diagnostics
    fn name(&self) -> &str;

    /// Persisted attributes
    fn attributes(&self) -> &dyn AttributeStore;
    fn attributes_mut(&mut self) -> &mut dyn AttributeStore;

    /// In-memory attributes, lost on restart
    fn nattributes(&self) -> &dyn AttributeStore;
    fn nattributes_mut(&mut self) -> &mut dyn AttributeStore;

    fn tags(&self) -> &dyn TagStore;
    fn tags_mut(&mut self) -> &mut dyn TagStore;

    fn cmdset(&self) -> &dyn CmdSetStore;
    fn cmdset_mut(&mut self) -> &mut dyn CmdSetStore;

    /// A named attribute on the host object itself, as opposed to one kept in
    /// its attribute store
    fn host_attribute(&self, name: &str) -> Option<Value>;
}
