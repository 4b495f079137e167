//! Runtime: the registries an application works with
//!
//! ```ignore
//! let runtime = Runtime::new()?;
//! runtime.define_class("my.Button", "sap.ui.core.Control", info)?;
//! let button = runtime.create("my.Button", settings)?;
//! ```

use std::sync::Arc;

use microui5_types::TypeRegistry;
use serde_json::Value as JsonValue;

use crate::bootstrap::define_builtin_classes;
use crate::config::BaseConfig;
use crate::error::{Error, Result};
use crate::metadata::ManagedObjectMetadata;
use crate::object::{ManagedObject, ObjectRegistry};
use crate::registry::ClassRegistry;
use crate::schema::ClassInfo;
use crate::value::{Settings, Value};

const ID_TYPE: &str = "sap.ui.core.ID";

/// Class, object and type registries sharing one configuration
#[derive(Debug)]
pub struct Runtime {
    config: Arc<BaseConfig>,
    types: Arc<TypeRegistry>,
    classes: Arc<ClassRegistry>,
    objects: ObjectRegistry,
}

impl Runtime {
    /// Runtime with the default configuration and the built-in classes
    pub fn new() -> Result<Self> {
        Self::with_config(BaseConfig::default())
    }

    /// Runtime with the given configuration and the built-in classes
    pub fn with_config(config: BaseConfig) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let types = Arc::new(TypeRegistry::new());
        let classes = Arc::new(ClassRegistry::new(types.clone()));
        define_builtin_classes(&classes)?;
        Ok(Self {
            objects: ObjectRegistry::new(config.clone()),
            config,
            types,
            classes,
        })
    }

    /// Configuration
    pub fn config(&self) -> &Arc<BaseConfig> {
        &self.config
    }

    /// Data types
    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    /// Defined classes
    pub fn classes(&self) -> &Arc<ClassRegistry> {
        &self.classes
    }

    /// Live objects
    pub fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    /// Define a managed class below `parent`
    pub fn define_class(
        &self,
        name: &str,
        parent: &str,
        info: ClassInfo,
    ) -> Result<Arc<ManagedObjectMetadata>> {
        self.classes.define(name, parent, info)
    }

    fn managed_class(&self, class: &str) -> Result<Arc<ManagedObjectMetadata>> {
        match self.classes.get(class) {
            Some(class_ref) => class_ref
                .managed()
                .cloned()
                .ok_or_else(|| Error::abstract_class(class)),
            None => Err(Error::unknown_class(class)),
        }
    }

    /// Create an instance of `class` and apply `settings`
    ///
    /// The `id` setting, when given, becomes the object id; otherwise one is
    /// generated. The object is destroyed again when a setting is rejected.
    pub fn create(&self, class: &str, settings: Settings) -> Result<ManagedObject> {
        let id = match settings.get("id") {
            Some(Value::Data(JsonValue::String(id))) => Some(id.clone()),
            Some(value) if !value.is_nullish() => {
                return Err(Error::invalid_value(
                    format!("{class}.id"),
                    format!("a {} is not an id", value.kind_name()),
                ))
            }
            _ => None,
        };
        self.instantiate(class, id.as_deref(), settings)
    }

    /// Create an instance of `class` under an explicit id
    pub fn create_with_id(
        &self,
        class: &str,
        id: &str,
        settings: Settings,
    ) -> Result<ManagedObject> {
        self.instantiate(class, Some(id), settings)
    }

    fn instantiate(
        &self,
        class: &str,
        id: Option<&str>,
        settings: Settings,
    ) -> Result<ManagedObject> {
        let metadata = self.managed_class(class)?;
        if let Some(id) = id {
            self.types.get(ID_TYPE)?.validate(&JsonValue::from(id))?;
        }
        let object = ManagedObject::create(metadata, id, &self.objects)?;
        if let Err(err) = object.apply_settings(settings) {
            object.destroy();
            return Err(err);
        }
        Ok(object)
    }

    /// Live object registered under `id`
    pub fn get(&self, id: &str) -> Option<ManagedObject> {
        self.objects.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{CONTROL, CUSTOM_DATA};

    #[test]
    fn test_create_custom_data() {
        let runtime = Runtime::new().unwrap();
        let mut settings = Settings::new();
        settings.insert("key".into(), Value::from("color"));
        settings.insert("value".into(), Value::from("red"));
        let data = runtime.create(CUSTOM_DATA, settings).unwrap();

        assert_eq!(data.id(), "__data0");
        assert_eq!(data.get_property("key"), JsonValue::from("color"));
        assert_eq!(data.get_property("writeToDom"), JsonValue::Bool(false));
        assert_eq!(runtime.get("__data0"), Some(data));
    }

    #[test]
    fn test_create_rejects_abstract_and_unknown() {
        let runtime = Runtime::new().unwrap();
        let err = runtime.create(CONTROL, Settings::new()).unwrap_err();
        assert_eq!(err, Error::abstract_class(CONTROL));
        let err = runtime.create("my.Missing", Settings::new()).unwrap_err();
        assert_eq!(err, Error::unknown_class("my.Missing"));
    }

    #[test]
    fn test_create_with_invalid_id() {
        let runtime = Runtime::new().unwrap();
        let err = runtime
            .create_with_id(CUSTOM_DATA, "1 bad id", Settings::new())
            .unwrap_err();
        assert!(matches!(err, Error::Type(_)));
        assert!(runtime.objects().is_empty());
    }

    #[test]
    fn test_failed_settings_release_the_id() {
        let runtime = Runtime::new().unwrap();
        let mut settings = Settings::new();
        settings.insert("id".into(), Value::from("data1"));
        settings.insert("unknown".into(), Value::from(1_i64));
        assert!(matches!(
            runtime.create(CUSTOM_DATA, settings),
            Err(Error::UnknownFeature { .. })
        ));
        assert!(!runtime.objects().contains("data1"));
    }
}
