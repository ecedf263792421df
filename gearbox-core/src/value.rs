//!
//!
//! Values stored on hosts, and identifiers used to reference keyed objects
//!
//!

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Every attribute value is a self-describing JSON value, serialization of
/// persisted values is left to the attribute store
pub use serde_json::Value;

/// [Identifier]
///
/// The normalized form of a reference to a keyed object: either a plain
/// string or an integer
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Int(i64),
    Str(String),
}

impl Identifier {
    /// Normalizes a value into an identifier
    ///
    /// Strings and integers are taken as-is. An object is accepted when it
    /// carries a truthy `key` member (a non-empty string or a non-zero
    /// integer), which is then used. Anything else yields `None`
    pub fn from_value(value: &Value) -> Option<Identifier> {
        match value {
            Value::String(s) => Some(Identifier::Str(s.clone())),
            Value::Number(n) => n.as_i64().map(Identifier::Int),
            Value::Object(map) => match map.get("key") {
                Some(Value::String(s)) if !s.is_empty() => Some(Identifier::Str(s.clone())),
                Some(Value::Number(n)) => n.as_i64().filter(|i| *i != 0).map(Identifier::Int),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Identifier::Int(i) => Value::from(*i),
            Identifier::Str(s) => Value::String(s.clone()),
        }
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier::Str(value.to_owned())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Identifier::Str(value)
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Identifier::Int(value)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Int(i) => write!(f, "{}", i),
            Identifier::Str(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::{Identifier, Value};

    #[test]
    fn identifiers_from_plain_values() {
        assert_eq!(Identifier::from_value(&json!("sword1")), Some("sword1".into()));
        assert_eq!(Identifier::from_value(&json!(7)), Some(Identifier::Int(7)));
        assert_eq!(Identifier::from_value(&json!("")), Some("".into()));
    }

    #[test]
    fn identifiers_from_keyed_objects() {
        let sword = json!({ "key": "sword1", "damage": 4 });
        assert_eq!(Identifier::from_value(&sword), Some("sword1".into()));

        let numbered = json!({ "key": 12 });
        assert_eq!(Identifier::from_value(&numbered), Some(Identifier::Int(12)));
    }

    #[test]
    fn rejects_unkeyed_values() {
        assert_eq!(Identifier::from_value(&json!({ "key": "" })), None);
        assert_eq!(Identifier::from_value(&json!({ "key": 0 })), None);
        assert_eq!(Identifier::from_value(&json!({ "name": "sword" })), None);
        assert_eq!(Identifier::from_value(&json!(1.5)), None);
        assert_eq!(Identifier::from_value(&json!([1, 2])), None);
        assert_eq!(Identifier::from_value(&Value::Null), None);
    }

    #[test]
    fn identifier_value_forms() {
        assert_eq!(Identifier::Int(3).to_value(), json!(3));
        assert_eq!(Identifier::from("axe").to_value(), json!("axe"));
        assert_eq!(serde_json::to_value(Identifier::Int(3)).unwrap(), json!(3));
    }
}
