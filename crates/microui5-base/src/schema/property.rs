//! Property entity

use std::sync::Arc;

use microui5_types::{DataType, TypeRegistry};
use once_cell::sync::OnceCell;
use serde_json::{Map, Value as JsonValue};

use super::decl::{AppData, PropertyDecl};
use super::{delegate, AccessorNames, Visibility};
use crate::error::Result;
use crate::metadata::naming::capitalize;
use crate::metadata::AccessorOp;
use crate::object::ManagedObject;
use crate::value::Value;

/// Binding descriptor stored for bound properties and aggregations
///
/// Only the path and parameters are recorded; resolving them against a
/// model is up to the caller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BindingInfo {
    /// Binding path
    pub path: String,
    /// Additional binding parameters
    pub parameters: Map<String, JsonValue>,
}

impl BindingInfo {
    /// Binding to a path without parameters
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            parameters: Map::new(),
        }
    }

    /// Accept a bare path or an object with a `path` key
    pub fn from_value(value: &Value) -> Option<Self> {
        match value.as_data()? {
            JsonValue::String(path) => Some(Self::new(path.clone())),
            JsonValue::Object(map) => {
                let path = map.get("path")?.as_str()?.to_string();
                let parameters = map
                    .iter()
                    .filter(|(k, _)| k.as_str() != "path")
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                Some(Self { path, parameters })
            }
            _ => None,
        }
    }

    /// Convert back into a dynamic value
    pub fn to_value(&self) -> Value {
        let mut map = self.parameters.clone();
        map.insert("path".to_string(), JsonValue::String(self.path.clone()));
        Value::Data(JsonValue::Object(map))
    }
}

impl From<&str> for BindingInfo {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// A declared property
#[derive(Debug)]
pub struct PropertyInfo {
    class_name: String,
    name: String,
    type_name: String,
    group: String,
    default_value: Option<JsonValue>,
    bindable: bool,
    visibility: Visibility,
    deprecated: bool,
    selector: Option<String>,
    app_data: AppData,
    accessors: AccessorNames,
    types: Arc<TypeRegistry>,
    resolved_type: OnceCell<Option<Arc<DataType>>>,
}

impl PropertyInfo {
    pub(crate) fn new(
        class_name: &str,
        name: &str,
        decl: PropertyDecl,
        types: Arc<TypeRegistry>,
    ) -> Self {
        let n = capitalize(name);
        let mut accessors = AccessorNames::default();
        accessors.push(AccessorOp::Get, format!("get{n}"));
        accessors.push(AccessorOp::Set, format!("set{n}"));
        if decl.bindable {
            accessors.push(AccessorOp::Bind, format!("bind{n}"));
            accessors.push(AccessorOp::Unbind, format!("unbind{n}"));
        }

        Self {
            class_name: class_name.to_string(),
            name: name.to_string(),
            type_name: decl.type_name,
            group: decl.group,
            default_value: decl.default_value,
            bindable: decl.bindable,
            visibility: decl.visibility,
            deprecated: decl.deprecated,
            selector: decl.selector,
            app_data: decl.app_data,
            accessors,
            types,
            resolved_type: OnceCell::new(),
        }
    }

    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique id; for properties the name itself
    pub fn uid(&self) -> &str {
        &self.name
    }

    /// Declaring class
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Declared type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Group hint
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Whether bind/unbind accessors exist
    pub fn is_bindable(&self) -> bool {
        self.bindable
    }

    /// Public or hidden
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Deprecation flag
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Design-time selector
    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    /// Unrecognized declaration keys
    pub fn app_data(&self) -> &AppData {
        &self.app_data
    }

    /// Generated accessor names
    pub fn accessors(&self) -> &AccessorNames {
        &self.accessors
    }

    /// Name of the getter, `get<Name>`
    pub fn getter(&self) -> &str {
        self.accessors.get(AccessorOp::Get).unwrap_or_default()
    }

    /// Name of the setter, `set<Name>`
    pub fn setter(&self) -> &str {
        self.accessors.get(AccessorOp::Set).unwrap_or_default()
    }

    /// Resolved data type, memoized after the first lookup
    pub fn get_type(&self) -> Option<Arc<DataType>> {
        self.resolved_type
            .get_or_init(|| self.types.resolve(&self.type_name))
            .clone()
    }

    /// Explicit default, or the intrinsic default of the type
    pub fn get_default_value(&self) -> JsonValue {
        match &self.default_value {
            Some(value) => value.clone(),
            None => self
                .get_type()
                .map(|ty| ty.default_value().clone())
                .unwrap_or(JsonValue::Null),
        }
    }

    fn run(
        &self,
        op: AccessorOp,
        instance: &ManagedObject,
        args: &[Value],
        fallback: impl FnOnce() -> Result<Value>,
    ) -> Result<Value> {
        let (visibility, accessors) = (self.visibility, &self.accessors);
        delegate(visibility, accessors, op, instance, args, fallback)
    }

    /// Read the property of `instance`, honoring overridden getters
    pub fn get(&self, instance: &ManagedObject) -> Result<JsonValue> {
        let value = self.run(AccessorOp::Get, instance, &[], || {
            Ok(Value::Data(instance.get_property(&self.name)))
        })?;
        Ok(value.into_data().unwrap_or(JsonValue::Null))
    }

    /// Write the property of `instance`, honoring overridden setters
    pub fn set(&self, instance: &ManagedObject, value: JsonValue) -> Result<()> {
        let args = [Value::Data(value.clone())];
        self.run(AccessorOp::Set, instance, &args, || {
            instance
                .set_property(&self.name, value)
                .map(|_| Value::Undefined)
        })?;
        Ok(())
    }

    /// Bind the property of `instance`
    pub fn bind(&self, instance: &ManagedObject, binding: BindingInfo) -> Result<()> {
        let args = [binding.to_value()];
        self.run(AccessorOp::Bind, instance, &args, || {
            instance
                .bind_property(&self.name, binding)
                .map(|_| Value::Undefined)
        })?;
        Ok(())
    }

    /// Remove the binding of the property of `instance`
    pub fn unbind(&self, instance: &ManagedObject) -> Result<()> {
        self.run(AccessorOp::Unbind, instance, &[], || {
            instance
                .unbind_property(&self.name)
                .map(|_| Value::Undefined)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(decl: PropertyDecl) -> PropertyInfo {
        PropertyInfo::new("test.Widget", "text", decl, Arc::new(TypeRegistry::new()))
    }

    #[test]
    fn test_accessor_names() {
        let plain = info(PropertyDecl::new("string"));
        assert_eq!(plain.getter(), "getText");
        assert_eq!(plain.setter(), "setText");
        assert_eq!(plain.accessors().get(AccessorOp::Bind), None);

        let bindable = info(PropertyDecl::new("string").bindable());
        let accessors = bindable.accessors();
        assert_eq!(accessors.get(AccessorOp::Bind), Some("bindText"));
        assert_eq!(accessors.get(AccessorOp::Unbind), Some("unbindText"));
    }

    #[test]
    fn test_default_value_falls_back_to_type() {
        let default_of = |decl: PropertyDecl| info(decl).get_default_value();
        assert_eq!(default_of(PropertyDecl::new("boolean")), json!(false));
        assert_eq!(default_of(PropertyDecl::new("int")), json!(0));
        let explicit = PropertyDecl::new("int").with_default(json!(5));
        assert_eq!(default_of(explicit), json!(5));
        let unknown = PropertyDecl::new("no.such.Type");
        assert_eq!(default_of(unknown), JsonValue::Null);
    }

    #[test]
    fn test_type_is_memoized() {
        let prop = info(PropertyDecl::new("string[]"));
        let first = prop.get_type().unwrap();
        let second = prop.get_type().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(prop.uid(), "text");
    }

    #[test]
    fn test_binding_info_from_value() {
        let simple = BindingInfo::from_value(&Value::from("/name")).unwrap();
        assert_eq!(simple.path, "/name");

        let value = Value::from(json!({ "path": "/items", "mode": "OneWay" }));
        let full = BindingInfo::from_value(&value).unwrap();
        assert_eq!(full.path, "/items");
        assert_eq!(full.parameters.get("mode"), Some(&json!("OneWay")));
        assert!(BindingInfo::from_value(&Value::from(1_i64)).is_none());
    }
}
