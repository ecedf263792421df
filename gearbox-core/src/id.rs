//!
//!
//! ID types for hosts and component slots
//!
//!

use std::fmt::{self, Debug, Display};

use serde::{Deserialize, Serialize};

/// [HostId]
///
/// Identifies a single persistent host object. Component instances remember
/// the id of the host they are bound to rather than the host itself
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct HostId(pub u64);

/// [SlotId]
///
/// A stable id for a component slot name
///
/// SlotId's are simply a compile time FNV-1a hash of the slot name, the
/// same way the name would hash across builds and processes
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(pub(crate) u64);

// Impl's

// `HostId`
impl HostId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for HostId {
    fn from(value: u64) -> Self {
        HostId(value)
    }
}

impl Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// `SlotId`
impl SlotId {
    pub const fn of(slot: &str) -> Self {
        SlotId(const_fnv1a_hash::fnv1a_hash_str_64(slot))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<&str> for SlotId {
    fn from(value: &str) -> Self {
        SlotId::of(value)
    }
}

impl Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotId({:X})", self.0)
    }
}

impl Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0)
    }
}

#[test]
fn test_slot_id() {
    const HEALTH: SlotId = SlotId::of("health");

    assert_eq!(HEALTH, SlotId::of("health"));
    assert_eq!(HEALTH, SlotId::from("health"));
    assert_ne!(HEALTH, SlotId::of("Health"));
    assert_ne!(SlotId::of("inventory"), SlotId::of("equipment"));
}
