//! Dynamic values
//!
//! [`Value`] is what flows through the name-based invocation surface: the
//! arguments and results of generated accessors and hand-written methods,
//! settings passed to constructors and event parameters.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::eventing::{Listener, ListenerContext};
use crate::object::ManagedObject;

/// Settings applied to a new or existing object, keyed by feature name
pub type Settings = IndexMap<String, Value>;

/// A dynamically typed value
#[derive(Clone, Default)]
pub enum Value {
    /// No value
    #[default]
    Undefined,
    /// Plain data (property values, ids, numbers, ...)
    Data(JsonValue),
    /// A single managed object
    Object(ManagedObject),
    /// An ordered list of managed objects
    Objects(Vec<ManagedObject>),
    /// Named values, e.g. event parameters or nested settings
    Map(IndexMap<String, Value>),
    /// An event listener
    Listener(Listener),
    /// A listener context object
    Context(ListenerContext),
}

impl Value {
    /// Whether this is [`Value::Undefined`]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Undefined or JSON null
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Data(JsonValue::Null))
    }

    /// Borrow plain data
    pub fn as_data(&self) -> Option<&JsonValue> {
        match self {
            Value::Data(v) => Some(v),
            _ => None,
        }
    }

    /// Take plain data; undefined becomes JSON null
    pub fn into_data(self) -> Option<JsonValue> {
        match self {
            Value::Data(v) => Some(v),
            Value::Undefined => Some(JsonValue::Null),
            _ => None,
        }
    }

    /// String content of plain data
    pub fn as_str(&self) -> Option<&str> {
        self.as_data().and_then(JsonValue::as_str)
    }

    /// Boolean content of plain data
    pub fn as_bool(&self) -> Option<bool> {
        self.as_data().and_then(JsonValue::as_bool)
    }

    /// Integer content of plain data
    pub fn as_i64(&self) -> Option<i64> {
        self.as_data().and_then(JsonValue::as_i64)
    }

    /// Borrow a single object
    pub fn as_object(&self) -> Option<&ManagedObject> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Take a single object
    pub fn into_object(self) -> Option<ManagedObject> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Borrow an object list
    pub fn as_objects(&self) -> Option<&[ManagedObject]> {
        match self {
            Value::Objects(list) => Some(list),
            _ => None,
        }
    }

    /// Take the objects held by this value; a single object becomes a one-element list
    pub fn into_objects(self) -> Vec<ManagedObject> {
        match self {
            Value::Objects(list) => list,
            Value::Object(o) => vec![o],
            _ => Vec::new(),
        }
    }

    /// Borrow named values
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow a listener
    pub fn as_listener(&self) -> Option<&Listener> {
        match self {
            Value::Listener(l) => Some(l),
            _ => None,
        }
    }

    /// Borrow a listener context
    pub fn as_context(&self) -> Option<&ListenerContext> {
        match self {
            Value::Context(c) => Some(c),
            _ => None,
        }
    }

    /// Short description of the variant, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Data(_) => "data",
            Value::Object(_) => "object",
            Value::Objects(_) => "object list",
            Value::Map(_) => "map",
            Value::Listener(_) => "listener",
            Value::Context(_) => "context",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Data(a), Value::Data(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Objects(a), Value::Objects(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Listener(a), Value::Listener(b)) => a.ptr_eq(b),
            (Value::Context(a), Value::Context(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Data(v) => write!(f, "Data({v})"),
            Value::Object(o) => write!(f, "Object({})", o.id()),
            Value::Objects(list) => f
                .debug_tuple("Objects")
                .field(&list.iter().map(ManagedObject::id).collect::<Vec<_>>())
                .finish(),
            Value::Map(map) => f.debug_map().entries(map.iter()).finish(),
            Value::Listener(_) => f.write_str("Listener(..)"),
            Value::Context(_) => f.write_str("Context(..)"),
        }
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        Value::Data(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Data(JsonValue::String(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Data(JsonValue::String(s))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Data(JsonValue::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Data(JsonValue::from(n))
    }
}

impl From<ManagedObject> for Value {
    fn from(o: ManagedObject) -> Self {
        Value::Object(o)
    }
}

impl From<&ManagedObject> for Value {
    fn from(o: &ManagedObject) -> Self {
        Value::Object(o.clone())
    }
}

impl From<Option<ManagedObject>> for Value {
    fn from(o: Option<ManagedObject>) -> Self {
        o.map(Value::Object).unwrap_or_default()
    }
}

impl From<Vec<ManagedObject>> for Value {
    fn from(list: Vec<ManagedObject>) -> Self {
        Value::Objects(list)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<Listener> for Value {
    fn from(l: Listener) -> Self {
        Value::Listener(l)
    }
}

impl From<ListenerContext> for Value {
    fn from(c: ListenerContext) -> Self {
        Value::Context(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nullish() {
        assert!(Value::Undefined.is_nullish());
        assert!(Value::Data(JsonValue::Null).is_nullish());
        assert!(!Value::from(0_i64).is_nullish());
    }

    #[test]
    fn test_data_accessors() {
        let v = Value::from("text");
        assert_eq!(v.as_str(), Some("text"));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(json!(7)).as_i64(), Some(7));
        assert_eq!(Value::Undefined.into_data(), Some(JsonValue::Null));
    }

    #[test]
    fn test_listener_equality_is_identity() {
        let a = Listener::new(|_, _| {});
        let b = Listener::new(|_, _| {});
        assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
        assert_ne!(Value::from(a), Value::from(b));
    }
}
