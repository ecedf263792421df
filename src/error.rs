use thiserror::Error;

use gearbox_core::Value;

#[derive(Error, Debug)]
pub enum ComponentError {
    /// A component key could not be resolved through the registry
    #[error("{0}")]
    DoesNotExist(String),

    #[error("{0}")]
    IsNotRegistered(String),

    /// A component instance was bound to a second host
    #[error("{0}")]
    RegisterTwice(String),

    #[error("invalid component class: {0}")]
    MissingIdentity(String),

    #[error("field '{field}' is declared twice on component slot '{slot}'")]
    DuplicateField { slot: String, field: String },

    #[error("component '{slot}' has no field named '{field}'")]
    UnknownField { slot: String, field: String },

    #[error("cannot set non-overridable host field '{field}'")]
    NotOverridable { field: String },

    #[error("key field '{field}' only supports str, int, or instances with keys, got {value}")]
    InvalidKey { field: String, value: Value },

    #[error("tag field '{field}' only supports str or int tags, got {value}")]
    InvalidTag { field: String, value: Value },

    #[error("component '{slot}' attempted to remove from the wrong host: bound to {expected}, got {found}")]
    HostMismatch {
        slot: String,
        expected: String,
        found: String,
    },

    #[error("slot '{slot}' is already occupied on {host}")]
    SlotOccupied { slot: String, host: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ComponentError>;
