use gearbox_core::{Host, Value};

use super::DbField;
use crate::error::{ComponentError, Result};

/// [HostField]
///
/// A value derived from a named attribute of the host object, by default
/// `"<slot>_<name>"`, or a fixed fallback when the host doesn't have it
///
/// An overridable field may be written, the override is persisted like a
/// [DbField] and wins over the host attribute while it is non-null.
/// Writing a non-overridable field fails
#[derive(Debug, Clone, Default)]
pub struct HostField {
    inner: DbField,
    overridable: bool,
    fallback: Value,
    host_attribute: Option<String>,
}

impl HostField {
    pub fn new(fallback: impl Into<Value>) -> Self {
        Self {
            fallback: fallback.into(),
            ..Default::default()
        }
    }

    pub fn overridable(mut self) -> Self {
        self.overridable = true;
        self
    }

    /// Writes an empty override when the component is added, reads still
    /// fall through to the host until a value is set
    pub fn autocreate(mut self) -> Self {
        self.inner = self.inner.autocreate();
        self
    }

    /// Reads from this host attribute instead of `"<slot>_<name>"`
    pub fn host_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.host_attribute = Some(attribute.into());
        self
    }

    pub fn is_overridable(&self) -> bool {
        self.overridable
    }

    pub fn attribute_name(&self) -> &str {
        self.host_attribute.as_deref().unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn key(&self) -> &str {
        self.inner.key()
    }

    pub(crate) fn set_name(&mut self, slot: &str, name: &str) {
        self.inner.set_name(slot, name);
        if self.host_attribute.is_none() {
            self.host_attribute = Some(format!("{}_{}", slot, name));
        }
    }

    pub fn get(&self, host: &dyn Host) -> Value {
        if self.overridable {
            if let Some(value) = self.inner.stored(host).filter(|v| !v.is_null()) {
                return value;
            }
        }

        host.host_attribute(self.attribute_name())
            .unwrap_or_else(|| self.fallback.clone())
    }

    pub fn check(&self) -> Result<()> {
        if self.overridable {
            Ok(())
        } else {
            Err(ComponentError::NotOverridable {
                field: self.name().to_owned(),
            })
        }
    }

    pub fn set(&self, host: &mut dyn Host, value: Value) -> Result<()> {
        self.check()?;
        self.inner.set(host, value);
        Ok(())
    }

    /// Drops the override, if any
    pub fn delete(&self, host: &mut dyn Host) {
        self.inner.delete(host);
    }

    pub fn at_added(&self, host: &mut dyn Host) {
        self.inner.at_added(host);
    }
}
