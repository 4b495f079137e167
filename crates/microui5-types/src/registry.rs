//! Type registry
//!
//! Maps type names to [`DataType`] descriptors. Array types (`"<name>[]"`)
//! are created on first lookup from their component type.
//!
//! ## Built-in types
//!
//! | Name                | Kind      | Default |
//! |---------------------|-----------|---------|
//! | `any`               | Any       | `null`  |
//! | `string`            | String    | `""`    |
//! | `boolean`           | Boolean   | `false` |
//! | `int`               | Int       | `0`     |
//! | `float`             | Float     | `0.0`   |
//! | `object`            | Object    | `null`  |
//! | `sap.ui.core.ID`    | Pattern   | `""`    |
//! | `sap.ui.core.CSSSize` | Pattern | `""`    |

use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::data_type::{DataType, DataTypeKind};
use crate::error::TypeError;

const ID_PATTERN: &str = r"^([A-Za-z_][-A-Za-z0-9_.:]*)?$";
const CSS_SIZE_PATTERN: &str = concat!(
    r"^(auto|inherit|initial|[-+]?(0*|(\d+|\d*\.\d+)([eE][-+]?\d+)?",
    r"(px|em|rem|ex|ch|%|vw|vh|vmin|vmax|cm|mm|in|pt|pc)))$|^$"
);

/// Registry of data types, shared between all classes of a runtime
#[derive(Debug)]
pub struct TypeRegistry {
    types: RwLock<FxHashMap<String, Arc<DataType>>>,
}

impl TypeRegistry {
    /// Create a registry holding the built-in types
    pub fn new() -> Self {
        let registry = Self {
            types: RwLock::new(FxHashMap::default()),
        };
        {
            let mut types = registry.types.write();
            for (name, kind) in [
                ("any", DataTypeKind::Any),
                ("string", DataTypeKind::String),
                ("boolean", DataTypeKind::Boolean),
                ("int", DataTypeKind::Int),
                ("float", DataTypeKind::Float),
                ("object", DataTypeKind::Object),
            ] {
                types.insert(name.to_string(), Arc::new(DataType::primitive(name, kind)));
            }
            for (name, pattern) in [
                ("sap.ui.core.ID", ID_PATTERN),
                ("sap.ui.core.CSSSize", CSS_SIZE_PATTERN),
            ] {
                if let Ok(regex) = Regex::new(pattern) {
                    types.insert(
                        name.to_string(),
                        Arc::new(DataType::primitive(name, DataTypeKind::Pattern(regex))),
                    );
                }
            }
        }
        registry
    }

    /// Register a fully built type
    pub fn register(&self, data_type: DataType) -> Result<Arc<DataType>, TypeError> {
        let mut types = self.types.write();
        if types.contains_key(data_type.name()) {
            return Err(TypeError::DuplicateType {
                name: data_type.name().to_string(),
            });
        }
        let data_type = Arc::new(data_type);
        types.insert(data_type.name().to_string(), data_type.clone());
        Ok(data_type)
    }

    /// Register an enumeration type; the first value is the default
    pub fn register_enum<I, S>(&self, name: &str, values: I) -> Result<Arc<DataType>, TypeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(TypeError::InvalidDefinition {
                name: name.to_string(),
                reason: "enumeration without values".to_string(),
            });
        }
        self.register(DataType::primitive(name, DataTypeKind::Enum(values)))
    }

    /// Register a string type restricted by a regular expression
    pub fn register_pattern(&self, name: &str, pattern: &str) -> Result<Arc<DataType>, TypeError> {
        let regex = Regex::new(pattern).map_err(|e| TypeError::InvalidDefinition {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.register(DataType::primitive(name, DataTypeKind::Pattern(regex)))
    }

    /// Register a type derived from a base type with a different default value
    pub fn register_with_default(
        &self,
        name: &str,
        base: &str,
        default_value: Value,
    ) -> Result<Arc<DataType>, TypeError> {
        let base = self.resolve(base).ok_or_else(|| TypeError::UndefinedType {
            name: base.to_string(),
        })?;
        base.validate(&default_value)?;
        self.register(DataType::new(name, base.kind().clone(), default_value))
    }

    /// Look up a type by name, creating array types on demand
    pub fn resolve(&self, name: &str) -> Option<Arc<DataType>> {
        if let Some(found) = self.types.read().get(name) {
            return Some(found.clone());
        }

        let component = name.strip_suffix("[]")?;
        let component = self.resolve(component)?;
        let mut types = self.types.write();
        let array = types
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(DataType::array_of(component)));
        Some(array.clone())
    }

    /// Like [`resolve`](Self::resolve) but fails for unknown names
    pub fn get(&self, name: &str) -> Result<Arc<DataType>, TypeError> {
        self.resolve(name).ok_or_else(|| TypeError::UndefinedType {
            name: name.to_string(),
        })
    }

    /// Check whether a type name can be resolved
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Number of registered types (array types count once materialized)
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// Names of all registered types
    pub fn names(&self) -> Vec<String> {
        self.types.read().keys().cloned().collect()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
