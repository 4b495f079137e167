//! Declarative schema input
//!
//! The shapes an application uses to describe a class. Every feature map
//! accepts either a full record or a bare type name:
//!
//! ```json
//! {
//!   "properties": {
//!     "text": "string",
//!     "width": { "type": "sap.ui.core.CSSSize", "defaultValue": "auto" }
//!   },
//!   "aggregations": { "items": { "type": "sap.ui.core.Control", "multiple": true } },
//!   "defaultAggregation": "items"
//! }
//! ```
//!
//! Keys that are not part of a record are kept as `app_data`.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, Result};
use crate::metadata::Method;
use crate::object::ManagedObject;
use crate::value::Value;

use super::Visibility;

/// Opaque extra fields of a declaration
pub type AppData = Map<String, JsonValue>;

/// Locates the target of a forwarded aggregation from the source instance
pub type TargetFn = Arc<dyn Fn(&ManagedObject) -> Option<ManagedObject> + Send + Sync>;

fn default_control_type() -> String {
    "sap.ui.core.Control".to_string()
}

fn default_true() -> bool {
    true
}

/// Accept `true`/`false` or the legacy string `"bindable"`
fn bindable_flag<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Text(s) => s == "bindable",
    })
}

/// Feature maps whose entries may be written as a bare type name
fn shorthand_map<'de, D, T>(deserializer: D) -> std::result::Result<IndexMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + From<String>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry<T> {
        TypeName(String),
        Full(T),
    }
    let raw = IndexMap::<String, Entry<T>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(name, entry)| {
            let decl = match entry {
                Entry::TypeName(type_name) => T::from(type_name),
                Entry::Full(decl) => decl,
            };
            (name, decl)
        })
        .collect())
}

// ============================================================================
// Feature declarations
// ============================================================================

/// Declaration of a property
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyDecl {
    /// Name of the data type
    #[serde(rename = "type")]
    pub type_name: String,
    /// Grouping hint for tools
    pub group: String,
    /// Explicit default; `None` (or `null`) means the type's default
    pub default_value: Option<JsonValue>,
    /// Generate bind/unbind accessors
    #[serde(deserialize_with = "bindable_flag")]
    pub bindable: bool,
    /// Public or hidden
    pub visibility: Visibility,
    /// Deprecated features warn when their mutators are used
    pub deprecated: bool,
    /// Selector for design-time tools
    pub selector: Option<String>,
    /// Unrecognized keys
    #[serde(flatten)]
    pub app_data: AppData,
}

impl Default for PropertyDecl {
    fn default() -> Self {
        Self {
            type_name: "string".to_string(),
            group: "Misc".to_string(),
            default_value: None,
            bindable: false,
            visibility: Visibility::Public,
            deprecated: false,
            selector: None,
            app_data: AppData::new(),
        }
    }
}

impl From<String> for PropertyDecl {
    fn from(type_name: String) -> Self {
        Self::new(type_name)
    }
}

impl PropertyDecl {
    /// Property of the given type
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// Set an explicit default value
    pub fn with_default(mut self, value: JsonValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Generate bind/unbind accessors
    pub fn bindable(mut self) -> Self {
        self.bindable = true;
        self
    }

    /// Hide the property from the generated accessor surface
    pub fn hidden(mut self) -> Self {
        self.visibility = Visibility::Hidden;
        self
    }

    /// Mark the property deprecated
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }
}

/// How the target of a forwarded aggregation is found
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForwardingDecl {
    /// Aggregation on the target object
    pub aggregation: String,
    /// Name of a method on the source returning the target
    pub getter: Option<String>,
    /// The target is the registered object with id `source id + suffix`
    pub id_suffix: Option<String>,
    /// Binding of the source aggregation is forwarded as well
    pub forward_binding: bool,
    /// Function returning the target
    #[serde(skip)]
    pub getter_fn: Option<TargetFn>,
}

impl ForwardingDecl {
    /// Forward to `aggregation` on the object returned by the method `getter`
    pub fn by_getter(aggregation: impl Into<String>, getter: impl Into<String>) -> Self {
        Self {
            aggregation: aggregation.into(),
            getter: Some(getter.into()),
            ..Self::default()
        }
    }

    /// Forward to `aggregation` on the object registered under `source id + suffix`
    pub fn by_id_suffix(aggregation: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            aggregation: aggregation.into(),
            id_suffix: Some(suffix.into()),
            ..Self::default()
        }
    }

    /// Forward to `aggregation` on the object returned by `getter`
    pub fn by_function(
        aggregation: impl Into<String>,
        getter: impl Fn(&ManagedObject) -> Option<ManagedObject> + Send + Sync + 'static,
    ) -> Self {
        Self {
            aggregation: aggregation.into(),
            getter_fn: Some(Arc::new(getter)),
            ..Self::default()
        }
    }

    /// Also forward bindings
    pub fn with_forward_binding(mut self) -> Self {
        self.forward_binding = true;
        self
    }

    /// Exactly one way of locating the target must be given
    pub(crate) fn check(&self, source: &str) -> Result<()> {
        let locators = [
            self.getter.is_some(),
            self.id_suffix.is_some(),
            self.getter_fn.is_some(),
        ];
        let given = locators.into_iter().filter(|given| *given).count();
        if given != 1 {
            let target = &self.aggregation;
            return Err(Error::configuration(format!(
                "Either getter or idSuffix must be given for forwarding the aggregation \
                 {source} to the aggregation {target}"
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for ForwardingDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardingDecl")
            .field("aggregation", &self.aggregation)
            .field("getter", &self.getter)
            .field("id_suffix", &self.id_suffix)
            .field("forward_binding", &self.forward_binding)
            .field("getter_fn", &self.getter_fn.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Declaration of an aggregation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregationDecl {
    /// Class or interface name of the children
    #[serde(rename = "type")]
    pub type_name: String,
    /// Plain data types also accepted by a single aggregation
    pub alt_types: Vec<String>,
    /// 0..n children instead of 0..1
    #[serde(default = "default_true")]
    pub multiple: bool,
    /// Singular used in accessor names; guessed from the name when absent
    pub singular_name: Option<String>,
    /// Generate bind/unbind accessors
    #[serde(deserialize_with = "bindable_flag")]
    pub bindable: bool,
    /// Public or hidden
    pub visibility: Visibility,
    /// Deprecated features warn when their mutators are used
    pub deprecated: bool,
    /// Selector for design-time tools
    pub selector: Option<String>,
    /// Redirect storage to another object
    pub forwarding: Option<ForwardingDecl>,
    /// Unrecognized keys
    #[serde(flatten)]
    pub app_data: AppData,
}

impl Default for AggregationDecl {
    fn default() -> Self {
        Self {
            type_name: default_control_type(),
            alt_types: Vec::new(),
            multiple: true,
            singular_name: None,
            bindable: false,
            visibility: Visibility::Public,
            deprecated: false,
            selector: None,
            forwarding: None,
            app_data: AppData::new(),
        }
    }
}

impl From<String> for AggregationDecl {
    fn from(type_name: String) -> Self {
        Self::multiple(type_name)
    }
}

impl AggregationDecl {
    /// 0..n aggregation of the given type
    pub fn multiple(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// 0..1 aggregation of the given type
    pub fn single(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            multiple: false,
            ..Self::default()
        }
    }

    /// Explicit singular name
    pub fn with_singular_name(mut self, singular: impl Into<String>) -> Self {
        self.singular_name = Some(singular.into());
        self
    }

    /// Accept plain values of these data types
    pub fn with_alt_types<I, S>(mut self, alt_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alt_types = alt_types.into_iter().map(Into::into).collect();
        self
    }

    /// Forward storage to another object
    pub fn with_forwarding(mut self, forwarding: ForwardingDecl) -> Self {
        self.forwarding = Some(forwarding);
        self
    }

    /// Generate bind/unbind accessors
    pub fn bindable(mut self) -> Self {
        self.bindable = true;
        self
    }

    /// Hide the aggregation from the generated accessor surface
    pub fn hidden(mut self) -> Self {
        self.visibility = Visibility::Hidden;
        self
    }

    /// Mark the aggregation deprecated
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }
}

/// Declaration of an association
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssociationDecl {
    /// Class or interface name of the referenced objects
    #[serde(rename = "type")]
    pub type_name: String,
    /// 0..n references instead of 0..1
    pub multiple: bool,
    /// Singular used in accessor names; guessed from the name when absent
    pub singular_name: Option<String>,
    /// Public or hidden
    pub visibility: Visibility,
    /// Deprecated features warn when their mutators are used
    pub deprecated: bool,
    /// Unrecognized keys
    #[serde(flatten)]
    pub app_data: AppData,
}

impl Default for AssociationDecl {
    fn default() -> Self {
        Self {
            type_name: default_control_type(),
            multiple: false,
            singular_name: None,
            visibility: Visibility::Public,
            deprecated: false,
            app_data: AppData::new(),
        }
    }
}

impl From<String> for AssociationDecl {
    fn from(type_name: String) -> Self {
        Self::single(type_name)
    }
}

impl AssociationDecl {
    /// 0..1 association of the given type
    pub fn single(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// 0..n association of the given type
    pub fn multiple(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            multiple: true,
            ..Self::default()
        }
    }

    /// Explicit singular name
    pub fn with_singular_name(mut self, singular: impl Into<String>) -> Self {
        self.singular_name = Some(singular.into());
        self
    }
}

/// Declaration of an event
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDecl {
    /// `fire<Name>` reports whether the default action should run
    pub allow_prevent_default: bool,
    /// `fire<Name>` bubbles to the parent
    pub enable_event_bubbling: bool,
    /// Documented parameters (name → description record)
    pub parameters: IndexMap<String, JsonValue>,
    /// Public or hidden
    pub visibility: Visibility,
    /// Deprecated features warn when their mutators are used
    pub deprecated: bool,
    /// Unrecognized keys
    #[serde(flatten)]
    pub app_data: AppData,
}

impl From<String> for EventDecl {
    fn from(_: String) -> Self {
        Self::default()
    }
}

impl EventDecl {
    /// Let `fire<Name>` report prevented defaults
    pub fn allow_prevent_default(mut self) -> Self {
        self.allow_prevent_default = true;
        self
    }

    /// Let `fire<Name>` bubble to the parent
    pub fn bubbling(mut self) -> Self {
        self.enable_event_bubbling = true;
        self
    }
}

/// Declaration of a special setting
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpecialSettingDecl {
    /// Name of the data type
    #[serde(rename = "type")]
    pub type_name: String,
    /// Public or hidden
    pub visibility: Visibility,
    /// Deprecated
    pub deprecated: bool,
    /// Unrecognized keys
    #[serde(flatten)]
    pub app_data: AppData,
}

impl Default for SpecialSettingDecl {
    fn default() -> Self {
        Self {
            type_name: "any".to_string(),
            visibility: Visibility::Public,
            deprecated: false,
            app_data: AppData::new(),
        }
    }
}

impl From<String> for SpecialSettingDecl {
    fn from(type_name: String) -> Self {
        Self {
            type_name,
            ..Self::default()
        }
    }
}

// ============================================================================
// Class declarations
// ============================================================================

/// The `metadata` block of a class declaration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataInfo {
    /// Class cannot be instantiated
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    /// Class cannot be extended
    #[serde(rename = "final")]
    pub is_final: bool,
    /// Class is deprecated
    pub deprecated: bool,
    /// Stereotype, inherited when absent
    pub stereotype: Option<String>,
    /// Library; derived from the class name when absent
    pub library: Option<String>,
    /// Implemented interfaces
    pub interfaces: Vec<String>,
    /// Public method names
    pub public_methods: Vec<String>,
    /// Properties
    #[serde(deserialize_with = "shorthand_map")]
    pub properties: IndexMap<String, PropertyDecl>,
    /// Aggregations
    #[serde(deserialize_with = "shorthand_map")]
    pub aggregations: IndexMap<String, AggregationDecl>,
    /// Associations
    #[serde(deserialize_with = "shorthand_map")]
    pub associations: IndexMap<String, AssociationDecl>,
    /// Events
    #[serde(deserialize_with = "shorthand_map")]
    pub events: IndexMap<String, EventDecl>,
    /// Special settings
    #[serde(deserialize_with = "shorthand_map")]
    pub special_settings: IndexMap<String, SpecialSettingDecl>,
    /// Aggregation receiving untyped children
    pub default_aggregation: Option<String>,
    /// Property receiving untyped values
    pub default_property: Option<String>,
}

impl MetadataInfo {
    /// Parse a metadata block from JSON
    pub fn from_json(value: JsonValue) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| Error::configuration(format!("invalid metadata: {e}")))
    }

    /// Add a property declaration
    pub fn property(mut self, name: &str, decl: PropertyDecl) -> Self {
        self.properties.insert(name.to_string(), decl);
        self
    }

    /// Add an aggregation declaration
    pub fn aggregation(mut self, name: &str, decl: AggregationDecl) -> Self {
        self.aggregations.insert(name.to_string(), decl);
        self
    }

    /// Add an association declaration
    pub fn association(mut self, name: &str, decl: AssociationDecl) -> Self {
        self.associations.insert(name.to_string(), decl);
        self
    }

    /// Add an event declaration
    pub fn event(mut self, name: &str, decl: EventDecl) -> Self {
        self.events.insert(name.to_string(), decl);
        self
    }

    /// Add a special setting declaration
    pub fn special_setting(mut self, name: &str, decl: SpecialSettingDecl) -> Self {
        self.special_settings.insert(name.to_string(), decl);
        self
    }

    /// Mark the class abstract
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }
}

/// Everything needed to define a class: its metadata and hand-written methods
#[derive(Clone, Default)]
pub struct ClassInfo {
    /// Declarative metadata
    pub metadata: MetadataInfo,
    /// Hand-written methods; they win over generated accessors of the same name
    pub methods: IndexMap<String, Method>,
}

impl ClassInfo {
    /// Class info with the given metadata and no methods
    pub fn new(metadata: MetadataInfo) -> Self {
        Self {
            metadata,
            methods: IndexMap::new(),
        }
    }

    /// Add a hand-written method
    pub fn with_method(
        mut self,
        name: &str,
        method: impl Fn(&ManagedObject, &[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.methods.insert(name.to_string(), Arc::new(method));
        self
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("metadata", &self.metadata)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shorthand_and_full_declarations() {
        let info = MetadataInfo::from_json(json!({
            "properties": {
                "text": "string",
                "width": {
                    "type": "sap.ui.core.CSSSize",
                    "defaultValue": "auto",
                    "designtime": "x"
                }
            },
            "aggregations": {
                "items": {
                    "type": "sap.ui.core.Control",
                    "multiple": true,
                    "singularName": "item"
                },
                "header": { "type": "sap.ui.core.Control", "multiple": false }
            },
            "defaultAggregation": "items"
        }))
        .unwrap();

        assert_eq!(info.properties["text"].type_name, "string");
        let width = &info.properties["width"];
        assert_eq!(width.default_value, Some(json!("auto")));
        assert_eq!(width.app_data.get("designtime"), Some(&json!("x")));
        assert!(!info.aggregations["header"].multiple);
        assert_eq!(info.default_aggregation.as_deref(), Some("items"));
    }

    #[test]
    fn test_null_default_means_unset() {
        let info = MetadataInfo::from_json(json!({
            "properties": { "value": { "type": "int", "defaultValue": null } }
        }))
        .unwrap();
        assert_eq!(info.properties["value"].default_value, None);
    }

    #[test]
    fn test_bindable_accepts_legacy_string() {
        let info = MetadataInfo::from_json(json!({
            "properties": { "value": { "type": "string", "bindable": "bindable" } }
        }))
        .unwrap();
        assert!(info.properties["value"].bindable);
    }

    #[test]
    fn test_visibility_parsing() {
        let info = MetadataInfo::from_json(json!({
            "aggregations": {
                "_inner": {
                    "type": "sap.ui.core.Control",
                    "multiple": false,
                    "visibility": "hidden"
                }
            }
        }))
        .unwrap();
        assert_eq!(info.aggregations["_inner"].visibility, Visibility::Hidden);
    }

    #[test]
    fn test_forwarding_locator_check() {
        let by_getter = ForwardingDecl::by_getter("content", "_getPanel");
        assert!(by_getter.check("items").is_ok());

        let neither = ForwardingDecl {
            aggregation: "content".into(),
            ..ForwardingDecl::default()
        };
        assert!(matches!(neither.check("items"), Err(Error::Configuration { .. })));

        let both = ForwardingDecl {
            id_suffix: Some("-panel".into()),
            ..ForwardingDecl::by_getter("content", "_getPanel")
        };
        assert!(both.check("items").is_err());
    }

    #[test]
    fn test_abstract_and_final_flags() {
        let info = MetadataInfo::from_json(json!({ "abstract": true, "final": true })).unwrap();
        assert!(info.is_abstract);
        assert!(info.is_final);
    }
}
