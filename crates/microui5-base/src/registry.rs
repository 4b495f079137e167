//! Class registry
//!
//! Classes are defined once, by name, below an already defined parent. Plain
//! classes only carry reflection data; managed classes also carry a schema.

use std::sync::Arc;

use indexmap::IndexMap;
use microui5_types::TypeRegistry;
use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{Error, Result};
use crate::metadata::{ManagedObjectMetadata, Metadata};
use crate::schema::{ClassInfo, MetadataInfo};

/// A defined class
#[derive(Debug, Clone)]
pub enum ClassRef {
    /// Class with reflection data only
    Plain(Arc<Metadata>),
    /// Class with a managed schema
    Managed(Arc<ManagedObjectMetadata>),
}

impl ClassRef {
    /// Reflection data of the class
    pub fn metadata(&self) -> &Arc<Metadata> {
        match self {
            ClassRef::Plain(metadata) => metadata,
            ClassRef::Managed(metadata) => metadata.base(),
        }
    }

    /// Managed metadata, if the class has a schema
    pub fn managed(&self) -> Option<&Arc<ManagedObjectMetadata>> {
        match self {
            ClassRef::Plain(_) => None,
            ClassRef::Managed(metadata) => Some(metadata),
        }
    }
}

/// All classes of a runtime, by name
#[derive(Debug)]
pub struct ClassRegistry {
    types: Arc<TypeRegistry>,
    classes: RwLock<IndexMap<String, ClassRef>>,
}

impl ClassRegistry {
    /// Create an empty registry resolving property types through `types`
    pub fn new(types: Arc<TypeRegistry>) -> Self {
        Self {
            types,
            classes: RwLock::new(IndexMap::new()),
        }
    }

    /// Data type registry used by managed classes
    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    fn check_new(&self, name: &str, parent: Option<&ClassRef>) -> Result<()> {
        if name.is_empty() {
            return Err(Error::invalid_argument("defineClass", "class name must not be empty"));
        }
        if self.contains(name) {
            return Err(Error::configuration(format!("Class {name} is already defined")));
        }
        if let Some(parent) = parent {
            if parent.metadata().is_final() {
                return Err(Error::configuration(format!(
                    "Class {name} cannot extend final class {}",
                    parent.metadata().name()
                )));
            }
        }
        Ok(())
    }

    fn require(&self, name: &str) -> Result<ClassRef> {
        self.get(name).ok_or_else(|| Error::unknown_class(name))
    }

    /// Define a class without a managed schema
    pub fn define_plain(
        &self,
        name: &str,
        parent: Option<&str>,
        info: ClassInfo,
    ) -> Result<Arc<Metadata>> {
        let parent = parent.map(|p| self.require(p)).transpose()?;
        self.check_new(name, parent.as_ref())?;

        let metadata = Arc::new(Metadata::new(
            name,
            parent.map(|p| p.metadata().clone()),
            &info.metadata,
            &info.methods,
        ));
        let class = ClassRef::Plain(metadata.clone());
        self.classes.write().insert(name.to_string(), class);
        debug!(class = name, "defined class");
        Ok(metadata)
    }

    /// Define a managed class below `parent`
    ///
    /// The parent is either a plain class, which makes the new class the root
    /// of a managed hierarchy, or another managed class whose schema is
    /// inherited.
    pub fn define(
        &self,
        name: &str,
        parent: &str,
        info: ClassInfo,
    ) -> Result<Arc<ManagedObjectMetadata>> {
        let parent = self.require(parent)?;
        self.check_new(name, Some(&parent))?;

        let (base_parent, managed_parent) = match &parent {
            ClassRef::Plain(metadata) => (metadata.clone(), None),
            ClassRef::Managed(metadata) => (metadata.base().clone(), Some(metadata.clone())),
        };
        let types = self.types.clone();
        let metadata =
            ManagedObjectMetadata::define(name, base_parent, managed_parent, &info, types)?;

        let mut classes = self.classes.write();
        if classes.contains_key(name) {
            return Err(Error::configuration(format!("Class {name} is already defined")));
        }
        classes.insert(name.to_string(), ClassRef::Managed(metadata.clone()));
        Ok(metadata)
    }

    /// Define a managed class from a JSON metadata block
    pub fn define_from_json(
        &self,
        name: &str,
        parent: &str,
        metadata: JsonValue,
    ) -> Result<Arc<ManagedObjectMetadata>> {
        let info = ClassInfo::new(MetadataInfo::from_json(metadata)?);
        self.define(name, parent, info)
    }

    /// Look up a class by name
    pub fn get(&self, name: &str) -> Option<ClassRef> {
        self.classes.read().get(name).cloned()
    }

    /// Look up a managed class by name
    pub fn get_managed(&self, name: &str) -> Option<Arc<ManagedObjectMetadata>> {
        self.get(name).and_then(|c| c.managed().cloned())
    }

    /// Whether a class of that name is defined
    pub fn contains(&self, name: &str) -> bool {
        self.classes.read().contains_key(name)
    }

    /// Names of all classes in definition order
    pub fn names(&self) -> Vec<String> {
        self.classes.read().keys().cloned().collect()
    }

    /// Number of defined classes
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// Whether no class is defined
    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }

    /// Whether `name` is `ancestor` or one of its subclasses
    pub fn is_subclass_of(&self, name: &str, ancestor: &str) -> bool {
        self.hierarchy(name).iter().any(|c| c == ancestor)
    }

    /// Class names from `name` up to the root; empty for unknown classes
    pub fn hierarchy(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|c| c.metadata().ancestry())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PropertyDecl;

    fn registry() -> ClassRegistry {
        let registry = ClassRegistry::new(Arc::new(TypeRegistry::new()));
        registry
            .define_plain("test.Base", None, ClassInfo::default())
            .unwrap();
        registry
    }

    #[test]
    fn test_define_managed_below_plain() {
        let registry = registry();
        let text = MetadataInfo::default().property("text", PropertyDecl::new("string"));
        let info = ClassInfo::new(text);
        let class = registry.define("test.Thing", "test.Base", info).unwrap();

        assert!(class.parent().is_none());
        let parent = class.base().parent().unwrap();
        assert_eq!(parent.name(), "test.Base");
        assert!(registry.get_managed("test.Thing").is_some());
        assert!(registry.get_managed("test.Base").is_none());
        let hierarchy = registry.hierarchy("test.Thing");
        assert_eq!(hierarchy, vec!["test.Thing", "test.Base"]);
        assert!(registry.is_subclass_of("test.Thing", "test.Base"));
        assert!(!registry.is_subclass_of("test.Base", "test.Thing"));
    }

    #[test]
    fn test_unknown_parent() {
        let registry = registry();
        let err = registry
            .define("test.Thing", "test.Missing", ClassInfo::default())
            .unwrap_err();
        assert_eq!(err, Error::unknown_class("test.Missing"));
    }

    #[test]
    fn test_duplicate_and_final() {
        let registry = registry();
        let final_info = ClassInfo::new(MetadataInfo {
            is_final: true,
            ..MetadataInfo::default()
        });
        registry
            .define("test.Final", "test.Base", final_info)
            .unwrap();

        assert!(matches!(
            registry.define("test.Final", "test.Base", ClassInfo::default()),
            Err(Error::Configuration { .. })
        ));
        assert!(matches!(
            registry.define("test.Sub", "test.Final", ClassInfo::default()),
            Err(Error::Configuration { .. })
        ));
        assert_eq!(registry.names(), vec!["test.Base", "test.Final"]);
    }

    #[test]
    fn test_define_from_json() {
        let registry = registry();
        let metadata = serde_json::json!({ "properties": { "count": "int" } });
        let class = registry
            .define_from_json("test.Json", "test.Base", metadata)
            .unwrap();
        assert_eq!(class.get_property("count").unwrap().type_name(), "int");
    }
}
