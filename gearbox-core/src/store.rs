//!
//!
//! Store contracts a host exposes to the component engine
//!
//!

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::Value;

/// [AttributeStore]
///
/// A flat keyed attribute store. Hosts expose two of these, one which is
/// persisted across restarts and one which lives only in memory
pub trait AttributeStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value);

    /// Removes the attribute, returns `true` if it existed
    fn delete(&mut self, key: &str) -> bool;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }
}

/// [TagStore]
///
/// Tags are plain strings grouped under a category, used to filter hosts
pub trait TagStore {
    fn add(&mut self, tag: &str, category: &str);
    fn remove(&mut self, tag: &str, category: &str);
    fn clear(&mut self, category: &str);

    /// All tags in the category, in the order they were added
    fn get(&self, category: &str) -> Vec<String>;

    fn has(&self, tag: &str, category: &str) -> bool {
        self.get(category).iter().any(|t| t == tag)
    }
}

/// [CmdSet]
///
/// A named command set. Dispatch is done elsewhere, the component engine
/// only merges sets onto and off of hosts
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct CmdSet {
    key: String,
}

impl CmdSet {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Display for CmdSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CmdSet({})", self.key)
    }
}

/// [CmdSetStore]
pub trait CmdSetStore {
    fn add(&mut self, cmdset: &CmdSet);
    fn remove(&mut self, cmdset: &CmdSet);
    fn contains(&self, cmdset: &CmdSet) -> bool;
}
