//!
//!
//! Gearbox Core Lib
//!
//! Contracts shared between the component engine and the hosts it is
//! mounted on: ids, values, the attribute/tag/cmdset stores, and signals
//!

pub mod id;
pub mod value;
pub mod store;
pub mod host;
pub mod signals;
pub mod memory;

mod prelude {
    pub use crate::host::Host;
    pub use crate::id::{HostId, SlotId};
    pub use crate::signals::{Signals, SignalOwner, SignalsHandler};
    pub use crate::store::{AttributeStore, CmdSet, CmdSetStore, TagStore};
    pub use crate::value::{Identifier, Value};
}

pub use prelude::*;
