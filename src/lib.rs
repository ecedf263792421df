//!
//! Gearbox is a component layer for persistent game objects: reusable bundles of persisted fields,
//! in-memory fields, tags, command sets and signal listeners, mounted on hosts at runtime or by host type
//!

pub mod error;
pub mod registry;
pub mod components;
pub mod fields;
pub mod handler;
pub mod holder;
pub mod config;

pub use gearbox_core::*;

pub use error::{ComponentError, Result};
pub use registry::ComponentRegistry;
pub use components::{ComponentClass, ComponentClassBuilder, ComponentInstance};
pub use fields::{DbField, Field, FieldKind, HostField, KeyField, KeyListing, NdbField, TagField};
pub use handler::ComponentHandler;
pub use holder::{ComponentDeclaration, ComponentHolder, ComponentMut, ComponentRef, Components, HostType};
pub use config::HostTypes;
