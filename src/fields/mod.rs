//! Fields
//!
//! Declarative, slot-scoped values of a component. Every field computes its
//! storage key from the slot of the class it is attached to, so two
//! components mounted on one host never share a key as long as their slots
//! differ
//!
//! | Field        | Backing store                                   |
//! |--------------|-------------------------------------------------|
//! | [DbField]    | persisted attributes                            |
//! | [NdbField]   | in-memory attributes                            |
//! | [TagField]   | tags, one category per field                    |
//! | [HostField]  | persisted override, falls back to the host      |
//! | [KeyField]   | persisted identifier, resolved through a listing|

mod db;
mod host;
mod key;
mod tag;

pub use db::{DbField, NdbField};
pub use host::HostField;
pub use key::{KeyField, KeyListing};
pub use tag::TagField;

use gearbox_core::{Host, Value};

use crate::error::Result;

/// Joins a slot and a field name into a storage key
pub(crate) fn storage_key(slot: &str, name: &str) -> String {
    format!("{}::{}", slot, name)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Db,
    Ndb,
    Tag,
    Host,
    Key,
}

/// What a field holds on a host at some point, so it can be put back
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Stored {
    Attribute(Option<Value>),
    Memory(Option<Value>),
    Tags(Vec<String>),
}

/// [Field]
///
/// One entry of a component class's field table
#[derive(Debug, Clone)]
pub enum Field {
    Db(DbField),
    Ndb(NdbField),
    Tag(TagField),
    Host(HostField),
    Key(KeyField),
}

impl Field {
    /// Binds the field to its owning class, computing its storage key from
    /// the class slot. Defaults that need normalizing are checked here
    pub(crate) fn attach(&mut self, slot: &str, name: &str) -> Result<()> {
        match self {
            Field::Db(f) => f.set_name(slot, name),
            Field::Ndb(f) => f.set_name(slot, name),
            Field::Tag(f) => return f.set_name(slot, name),
            Field::Host(f) => f.set_name(slot, name),
            Field::Key(f) => return f.set_name(slot, name),
        }
        Ok(())
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Db(_) => FieldKind::Db,
            Field::Ndb(_) => FieldKind::Ndb,
            Field::Tag(_) => FieldKind::Tag,
            Field::Host(_) => FieldKind::Host,
            Field::Key(_) => FieldKind::Key,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Field::Db(f) => f.name(),
            Field::Ndb(f) => f.name(),
            Field::Tag(f) => f.name(),
            Field::Host(f) => f.name(),
            Field::Key(f) => f.name(),
        }
    }

    /// The attribute key, or for tag fields the tag category
    pub fn storage_key(&self) -> &str {
        match self {
            Field::Db(f) => f.key(),
            Field::Ndb(f) => f.key(),
            Field::Tag(f) => f.category(),
            Field::Host(f) => f.key(),
            Field::Key(f) => f.key(),
        }
    }

    /// Fields kept in the persisted attribute store
    pub fn is_db(&self) -> bool {
        matches!(self.kind(), FieldKind::Db | FieldKind::Host | FieldKind::Key)
    }

    pub fn get(&self, host: &dyn Host) -> Value {
        match self {
            Field::Db(f) => f.get(host),
            Field::Ndb(f) => f.get(host),
            Field::Tag(f) => f.get(host),
            Field::Host(f) => f.get(host),
            Field::Key(f) => f.get(host),
        }
    }

    /// Validates `value` the way [Field::set] would, without writing it
    pub fn check(&self, value: &Value) -> Result<()> {
        match self {
            Field::Db(_) | Field::Ndb(_) => Ok(()),
            Field::Tag(f) => f.check(value),
            Field::Host(f) => f.check(),
            Field::Key(f) => f.check(value),
        }
    }

    pub(crate) fn stored(&self, host: &dyn Host) -> Stored {
        match self {
            Field::Ndb(f) => Stored::Memory(host.nattributes().get(f.key())),
            Field::Tag(f) => Stored::Tags(host.tags().get(f.category())),
            _ => Stored::Attribute(host.attributes().get(self.storage_key())),
        }
    }

    pub(crate) fn restore(&self, host: &mut dyn Host, stored: Stored) {
        let key = self.storage_key();
        match stored {
            Stored::Attribute(Some(value)) => host.attributes_mut().set(key, value),
            Stored::Attribute(None) => {
                host.attributes_mut().delete(key);
            }
            Stored::Memory(Some(value)) => host.nattributes_mut().set(key, value),
            Stored::Memory(None) => {
                host.nattributes_mut().delete(key);
            }
            Stored::Tags(tags) => {
                let store = host.tags_mut();
                store.clear(key);
                for tag in &tags {
                    store.add(tag, key);
                }
            }
        }
    }

    pub fn set(&self, host: &mut dyn Host, value: Value) -> Result<()> {
        match self {
            Field::Db(f) => f.set(host, value),
            Field::Ndb(f) => f.set(host, value),
            Field::Tag(f) => return f.set(host, value),
            Field::Host(f) => return f.set(host, value),
            Field::Key(f) => return f.set(host, value),
        }
        Ok(())
    }

    pub fn delete(&self, host: &mut dyn Host) {
        match self {
            Field::Db(f) => f.delete(host),
            Field::Ndb(f) => f.delete(host),
            Field::Tag(f) => f.delete(host),
            Field::Host(f) => f.delete(host),
            Field::Key(f) => f.delete(host),
        }
    }

    /// Called by the handler once the owning component is added to `host`
    pub fn at_added(&self, host: &mut dyn Host) -> Result<()> {
        match self {
            Field::Db(f) => f.at_added(host),
            Field::Ndb(f) => f.at_added(host),
            Field::Tag(f) => return f.at_added(host),
            Field::Host(f) => f.at_added(host),
            Field::Key(f) => f.at_added(host),
        }
        Ok(())
    }

    /// Called by the handler when the owning component is removed from `host`
    ///
    /// Tags and in-memory values belong to the attachment and are dropped,
    /// persisted values stay until the component is cleaned up
    pub fn at_removed(&self, host: &mut dyn Host) {
        match self {
            Field::Tag(f) => f.delete(host),
            Field::Ndb(f) => f.delete(host),
            Field::Db(_) | Field::Host(_) | Field::Key(_) => {}
        }
    }
}

impl From<DbField> for Field {
    fn from(value: DbField) -> Self {
        Field::Db(value)
    }
}

impl From<NdbField> for Field {
    fn from(value: NdbField) -> Self {
        Field::Ndb(value)
    }
}

impl From<TagField> for Field {
    fn from(value: TagField) -> Self {
        Field::Tag(value)
    }
}

impl From<HostField> for Field {
    fn from(value: HostField) -> Self {
        Field::Host(value)
    }
}

impl From<KeyField> for Field {
    fn from(value: KeyField) -> Self {
        Field::Key(value)
    }
}

#[cfg(test)]
mod test {
    use gearbox_core::memory::MemoryHost;
    use gearbox_core::{AttributeStore, Host, TagStore};
    use serde_json::json;

    use super::*;

    #[test]
    fn storage_keys_are_slot_scoped() {
        let mut current: Field = DbField::new(100).into();
        current.attach("health", "current").unwrap();
        assert_eq!(current.storage_key(), "health::current");
        assert_eq!(current.name(), "current");
        assert_eq!(current.kind(), FieldKind::Db);

        let mut mood: Field = TagField::new().into();
        mood.attach("npc", "mood").unwrap();
        assert_eq!(mood.storage_key(), "npc::mood");
        assert!(!mood.is_db());
    }

    #[test]
    fn removal_drops_attachment_state_only() {
        let mut host = MemoryHost::new(1, "goblin");

        let mut hp: Field = DbField::new(10).into();
        hp.attach("health", "hp").unwrap();
        let mut regen: Field = NdbField::new(1).into();
        regen.attach("health", "regen").unwrap();
        let mut state: Field = TagField::new().into();
        state.attach("health", "state").unwrap();

        hp.set(&mut host, json!(4)).unwrap();
        regen.set(&mut host, json!(2)).unwrap();
        state.set(&mut host, json!("wounded")).unwrap();

        for field in [&hp, &regen, &state] {
            field.at_removed(&mut host);
        }

        assert_eq!(host.attributes().get("health::hp"), Some(json!(4)));
        assert_eq!(host.nattributes().get("health::regen"), None);
        assert!(host.tags().get("health::state").is_empty());
    }

    #[test]
    fn check_matches_set_without_writing() {
        let mut host = MemoryHost::new(1, "goblin");

        let mut speed: Field = HostField::new(3).into();
        speed.attach("movement", "speed").unwrap();
        let mut mood: Field = TagField::new().into();
        mood.attach("npc", "mood").unwrap();
        let mut hp: Field = DbField::new(10).into();
        hp.attach("health", "hp").unwrap();

        assert!(speed.check(&json!(4)).is_err());
        assert!(mood.check(&json!({ "angry": true })).is_err());
        assert!(mood.check(&json!("angry")).is_ok());
        assert!(hp.check(&json!([1])).is_ok());
        assert!(host.memory_attributes().is_empty());

        hp.set(&mut host, json!(2)).unwrap();
        assert!(speed.set(&mut host, json!(4)).is_err());
    }

    #[test]
    fn stored_state_can_be_put_back() {
        let mut host = MemoryHost::new(1, "goblin");

        let mut hp: Field = DbField::new(10).into();
        hp.attach("health", "hp").unwrap();
        let mut state: Field = TagField::new().into();
        state.attach("health", "state").unwrap();

        hp.set(&mut host, json!(4)).unwrap();
        state.set(&mut host, json!("wounded")).unwrap();
        let before = (hp.stored(&host), state.stored(&host));

        hp.set(&mut host, json!(1)).unwrap();
        state.set(&mut host, json!("dead")).unwrap();
        hp.restore(&mut host, before.0);
        state.restore(&mut host, before.1);

        assert_eq!(hp.get(&host), json!(4));
        assert_eq!(host.tags().get("health::state"), vec!["wounded".to_owned()]);

        let empty = hp.stored(&MemoryHost::new(2, "imp"));
        hp.restore(&mut host, empty);
        assert!(!host.attributes().has("health::hp"));
    }
}
