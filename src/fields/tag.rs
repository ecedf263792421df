use gearbox_core::{Host, Value};

use super::storage_key;
use crate::error::{ComponentError, Result};

/// [TagField]
///
/// A component value stored as tags on the host, in a category of its own
/// (`"<slot>::<name>"`) so hosts can be filtered by it
///
/// With `enforce_single` every write replaces the previous tag, otherwise
/// writes accumulate. The default tag is applied when the component is
/// added and the whole category is cleared when it is removed
#[derive(Debug, Clone, Default)]
pub struct TagField {
    default: Option<Value>,
    enforce_single: bool,
    name: String,
    category: String,
}

impl TagField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn enforce_single(mut self) -> Self {
        self.enforce_single = true;
        self
    }

    pub fn is_single(&self) -> bool {
        self.enforce_single
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub(crate) fn set_name(&mut self, slot: &str, name: &str) -> Result<()> {
        self.name = name.to_owned();
        self.category = storage_key(slot, name);
        match &self.default {
            Some(default) if !default.is_null() => self.tag_of(default).map(|_| ()),
            _ => Ok(()),
        }
    }

    fn tag_of(&self, value: &Value) -> Result<String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(ComponentError::InvalidTag {
                field: self.name.clone(),
                value: value.clone(),
            }),
        }
    }

    /// Fails for values that can't be a tag, touches no host
    pub fn check(&self, value: &Value) -> Result<()> {
        self.tag_of(value).map(|_| ())
    }

    /// No tag reads as the default, one tag as a string, several as an array
    pub fn get(&self, host: &dyn Host) -> Value {
        let mut tags = host.tags().get(&self.category);
        match tags.len() {
            0 => self.default.clone().unwrap_or(Value::Null),
            1 => Value::String(tags.remove(0)),
            _ => Value::Array(tags.into_iter().map(Value::String).collect()),
        }
    }

    pub fn set(&self, host: &mut dyn Host, value: Value) -> Result<()> {
        let tag = self.tag_of(&value)?;
        let tags = host.tags_mut();
        if self.enforce_single {
            tags.clear(&self.category);
        }
        tags.add(&tag, &self.category);
        Ok(())
    }

    pub fn delete(&self, host: &mut dyn Host) {
        host.tags_mut().clear(&self.category);
    }

    /// Applies the default unless the category already holds a tag, e.g. one
    /// written by a creation override
    pub fn at_added(&self, host: &mut dyn Host) -> Result<()> {
        match &self.default {
            Some(default) if !default.is_null() && host.tags().get(&self.category).is_empty() => {
                self.set(host, default.clone())
            }
            _ => Ok(()),
        }
    }
}
