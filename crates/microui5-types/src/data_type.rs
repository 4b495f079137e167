//! Data type descriptors
//!
//! A [`DataType`] is immutable once created and shared through `Arc`.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::error::TypeError;

/// Structural kind of a data type
#[derive(Debug, Clone)]
pub enum DataTypeKind {
    /// Accepts every value
    Any,
    /// JSON string
    String,
    /// JSON boolean
    Boolean,
    /// Number without fractional part
    Int,
    /// Any JSON number
    Float,
    /// Object, array or null
    Object,
    /// String restricted by a pattern
    Pattern(Regex),
    /// Homogeneous array of the component type
    Array(Arc<DataType>),
    /// One of a fixed set of string values
    Enum(Vec<String>),
}

/// Runtime type descriptor for property values
#[derive(Debug, Clone)]
pub struct DataType {
    name: String,
    kind: DataTypeKind,
    default_value: Value,
}

impl DataType {
    /// Create a type with an explicit default value
    pub fn new(name: impl Into<String>, kind: DataTypeKind, default_value: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            default_value,
        }
    }

    /// Create a primitive type using the intrinsic default of its kind
    pub fn primitive(name: impl Into<String>, kind: DataTypeKind) -> Self {
        let default_value = match &kind {
            DataTypeKind::String | DataTypeKind::Pattern(_) => Value::String(String::new()),
            DataTypeKind::Boolean => Value::Bool(false),
            DataTypeKind::Int => Value::from(0),
            DataTypeKind::Float => Value::from(0.0),
            DataTypeKind::Array(_) => Value::Array(Vec::new()),
            DataTypeKind::Enum(values) => values
                .first()
                .map(|v| Value::String(v.clone()))
                .unwrap_or(Value::Null),
            DataTypeKind::Any | DataTypeKind::Object => Value::Null,
        };
        Self::new(name, kind, default_value)
    }

    /// Create the array type `<component>[]`
    pub fn array_of(component: Arc<DataType>) -> Self {
        let name = format!("{}[]", component.name);
        Self::primitive(name, DataTypeKind::Array(component))
    }

    /// Type name as used in schema declarations
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Structural kind
    pub fn kind(&self) -> &DataTypeKind {
        &self.kind
    }

    /// Value a property of this type has when nothing was declared or set
    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    /// Whether this is an array type
    pub fn is_array_type(&self) -> bool {
        matches!(self.kind, DataTypeKind::Array(_))
    }

    /// Component type of an array type
    pub fn component_type(&self) -> Option<&Arc<DataType>> {
        match &self.kind {
            DataTypeKind::Array(component) => Some(component),
            _ => None,
        }
    }

    /// Check whether a value is acceptable for this type
    pub fn is_valid_value(&self, value: &Value) -> bool {
        match &self.kind {
            DataTypeKind::Any => true,
            DataTypeKind::String => value.is_string(),
            DataTypeKind::Boolean => value.is_boolean(),
            DataTypeKind::Int => match value {
                Value::Number(n) => {
                    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
                }
                _ => false,
            },
            DataTypeKind::Float => value.is_number(),
            DataTypeKind::Object => value.is_object() || value.is_array() || value.is_null(),
            DataTypeKind::Pattern(pattern) => value.as_str().is_some_and(|s| pattern.is_match(s)),
            DataTypeKind::Array(component) => match value {
                Value::Null => true,
                Value::Array(items) => items.iter().all(|item| component.is_valid_value(item)),
                _ => false,
            },
            DataTypeKind::Enum(values) => match value.as_str() {
                Some(s) => values.iter().any(|v| v == s),
                None => false,
            },
        }
    }

    /// Like [`is_valid_value`](Self::is_valid_value) but reports the mismatch
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        if self.is_valid_value(value) {
            Ok(())
        } else {
            Err(TypeError::InvalidValue {
                type_name: self.name.clone(),
                value: value.to_string(),
                actual: json_kind(value).to_string(),
            })
        }
    }

    /// Convert the string representation of a value into a typed value
    pub fn parse_value(&self, input: &str) -> Result<Value, TypeError> {
        let parse_error = || TypeError::Parse {
            type_name: self.name.clone(),
            input: input.to_string(),
        };

        let value = match &self.kind {
            DataTypeKind::String | DataTypeKind::Pattern(_) | DataTypeKind::Enum(_) => {
                Value::String(input.to_string())
            }
            DataTypeKind::Boolean => match input.trim() {
                "true" => Value::Bool(true),
                "false" | "" => Value::Bool(false),
                _ => return Err(parse_error()),
            },
            DataTypeKind::Int => {
                let n = input.trim().parse::<i64>().map_err(|_| parse_error())?;
                Value::from(n)
            }
            DataTypeKind::Float => {
                let f = input.trim().parse::<f64>().map_err(|_| parse_error())?;
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(parse_error)?
            }
            DataTypeKind::Any | DataTypeKind::Object => {
                serde_json::from_str(input).map_err(|_| parse_error())?
            }
            DataTypeKind::Array(component) => {
                let inner = input.trim();
                let inner = inner
                    .strip_prefix('[')
                    .and_then(|s| s.strip_suffix(']'))
                    .unwrap_or(inner);
                if inner.trim().is_empty() {
                    Value::Array(Vec::new())
                } else {
                    let items = inner
                        .split(',')
                        .map(|part| component.parse_value(part.trim()))
                        .collect::<Result<Vec<_>, _>>()?;
                    Value::Array(items)
                }
            }
        };

        self.validate(&value).map_err(|_| parse_error())?;
        Ok(value)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Short name of the JSON kind of a value, used in diagnostics
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitive_defaults() {
        let string = DataType::primitive("string", DataTypeKind::String);
        assert_eq!(string.default_value(), &json!(""));
        let boolean = DataType::primitive("boolean", DataTypeKind::Boolean);
        assert_eq!(boolean.default_value(), &json!(false));
        let int = DataType::primitive("int", DataTypeKind::Int);
        assert_eq!(int.default_value(), &json!(0));
        let any = DataType::primitive("any", DataTypeKind::Any);
        assert_eq!(any.default_value(), &Value::Null);
    }

    #[test]
    fn test_int_accepts_integral_floats() {
        let int = DataType::primitive("int", DataTypeKind::Int);
        assert!(int.is_valid_value(&json!(3)));
        assert!(int.is_valid_value(&json!(3.0)));
        assert!(!int.is_valid_value(&json!(3.5)));
        assert!(!int.is_valid_value(&json!("3")));
    }

    #[test]
    fn test_enum_default_is_first_value() {
        let ty = DataType::primitive(
            "sap.m.ButtonType",
            DataTypeKind::Enum(vec!["Default".into(), "Emphasized".into()]),
        );
        assert_eq!(ty.default_value(), &json!("Default"));
        assert!(ty.is_valid_value(&json!("Emphasized")));
        assert!(!ty.is_valid_value(&json!("Other")));
    }

    #[test]
    fn test_array_validation() {
        let int = Arc::new(DataType::primitive("int", DataTypeKind::Int));
        let ints = DataType::array_of(int);
        assert_eq!(ints.name(), "int[]");
        assert!(ints.is_valid_value(&json!([1, 2, 3])));
        assert!(ints.is_valid_value(&Value::Null));
        assert!(!ints.is_valid_value(&json!([1, "2"])));
    }

    #[test]
    fn test_parse_value() {
        let boolean = DataType::primitive("boolean", DataTypeKind::Boolean);
        assert_eq!(boolean.parse_value("true").unwrap(), json!(true));
        assert!(boolean.parse_value("yes").is_err());

        let float = Arc::new(DataType::primitive("float", DataTypeKind::Float));
        let floats = DataType::array_of(float);
        assert_eq!(floats.parse_value("[1.5, 2]").unwrap(), json!([1.5, 2.0]));
        assert_eq!(floats.parse_value("").unwrap(), json!([]));
    }

    #[test]
    fn test_validate_reports_kind() {
        let string = DataType::primitive("string", DataTypeKind::String);
        let err = string.validate(&json!(1)).unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidValue {
                type_name: "string".into(),
                value: "1".into(),
                actual: "number".into(),
            }
        );
    }
}
