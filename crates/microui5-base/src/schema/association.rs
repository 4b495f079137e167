//! Association entity

use std::sync::Arc;

use microui5_types::{DataType, TypeRegistry};
use once_cell::sync::OnceCell;

use super::decl::{AppData, AssociationDecl};
use super::{delegate, AccessorNames, Kind, Visibility};
use crate::error::Result;
use crate::metadata::naming::{capitalize, guess_singular_name};
use crate::metadata::AccessorOp;
use crate::object::ManagedObject;
use crate::value::Value;

/// A declared association (reference by id, no ownership)
#[derive(Debug)]
pub struct AssociationInfo {
    class_name: String,
    name: String,
    uid: String,
    type_name: String,
    multiple: bool,
    singular_name: Option<String>,
    visibility: Visibility,
    deprecated: bool,
    app_data: AppData,
    accessors: AccessorNames,
    types: Arc<TypeRegistry>,
    resolved_type: OnceCell<Option<Arc<DataType>>>,
}

impl AssociationInfo {
    pub(crate) fn new(
        class_name: &str,
        name: &str,
        decl: AssociationDecl,
        types: Arc<TypeRegistry>,
    ) -> Self {
        let singular_name = if decl.multiple {
            let guessed = || guess_singular_name(name);
            Some(decl.singular_name.clone().unwrap_or_else(guessed))
        } else {
            None
        };
        let n = capitalize(name);

        let mut accessors = AccessorNames::default();
        accessors.push(AccessorOp::Get, format!("get{n}"));
        match &singular_name {
            Some(singular) => {
                let n1 = capitalize(singular);
                accessors.push(AccessorOp::Add, format!("add{n1}"));
                accessors.push(AccessorOp::Remove, format!("remove{n1}"));
                accessors.push(AccessorOp::RemoveAll, format!("removeAll{n}"));
                if singular != name {
                    accessors.push(AccessorOp::RemoveAllSingular, format!("removeAll{n1}"));
                }
            }
            None => accessors.push(AccessorOp::Set, format!("set{n}")),
        }

        Self {
            class_name: class_name.to_string(),
            name: name.to_string(),
            uid: format!("association:{name}"),
            type_name: decl.type_name,
            multiple: decl.multiple,
            singular_name,
            visibility: decl.visibility,
            deprecated: decl.deprecated,
            app_data: decl.app_data,
            accessors,
            types,
            resolved_type: OnceCell::new(),
        }
    }

    /// Association name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique id, `association:<name>`
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Declaring class
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Single or multiple association kind
    pub fn kind(&self) -> Kind {
        if self.multiple {
            Kind::MultipleAssociation
        } else {
            Kind::SingleAssociation
        }
    }

    /// Declared type of the referenced objects
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// 0..n references
    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    /// Singular name of a multiple association
    pub fn singular_name(&self) -> Option<&str> {
        self.singular_name.as_deref()
    }

    /// Public or hidden
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Deprecation flag
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Unrecognized declaration keys
    pub fn app_data(&self) -> &AppData {
        &self.app_data
    }

    /// Generated accessor names
    pub fn accessors(&self) -> &AccessorNames {
        &self.accessors
    }

    /// Resolved data type, if the type name is a data type
    pub fn get_type(&self) -> Option<Arc<DataType>> {
        self.resolved_type
            .get_or_init(|| self.types.resolve(&self.type_name))
            .clone()
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

    /// Referenced id(s)
    pub fn get(&self, instance: &ManagedObject) -> Result<Value> {
        self.run(AccessorOp::Get, instance, &[], || {
            Ok(instance.get_association(&self.name))
        })
    }

    /// Replace the reference of a single association
    pub fn set(&self, instance: &ManagedObject, target: Value) -> Result<()> {
        let args = [target.clone()];
        self.run(AccessorOp::Set, instance, &args, || {
            instance
                .set_association(&self.name, &target)
                .map(|_| Value::Undefined)
        })?;
        Ok(())
    }

    /// Add a reference; single associations replace theirs
    pub fn add(&self, instance: &ManagedObject, target: Value) -> Result<()> {
        if !self.multiple {
            return self.set(instance, target);
        }
        let args = [target.clone()];
        self.run(AccessorOp::Add, instance, &args, || {
            instance
                .add_association(&self.name, &target)
                .map(|_| Value::Undefined)
        })?;
        Ok(())
    }

    /// Remove a reference given as object, id or index; returns the removed id
    pub fn remove(&self, instance: &ManagedObject, target: Value) -> Result<Option<String>> {
        let args = [target.clone()];
        let removed = self.run(AccessorOp::Remove, instance, &args, || {
            let id = instance.remove_association(&self.name, &target)?;
            Ok(id.map(Value::from).unwrap_or_default())
        })?;
        Ok(removed.as_str().map(str::to_string))
    }

    /// Remove all references; returns the removed ids
    pub fn remove_all(&self, instance: &ManagedObject) -> Result<Vec<String>> {
        let removed = self.run(AccessorOp::RemoveAll, instance, &[], || {
            let ids = instance.remove_all_association(&self.name)?;
            Ok(Value::Data(ids.into_iter().map(serde_json::Value::String).collect()))
        })?;
        let Some(ids) = removed.as_data().and_then(|v| v.as_array()) else {
            return Ok(Vec::new());
        };
        let ids = ids.iter().filter_map(|id| id.as_str());
        Ok(ids.map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(info: &AssociationInfo) -> Vec<&str> {
        info.accessors().iter().map(|(_, name)| name).collect()
    }

    #[test]
    fn test_single_association_names() {
        let label = AssociationInfo::new(
            "test.Input",
            "label",
            AssociationDecl::single("sap.ui.core.Control"),
            Arc::new(TypeRegistry::new()),
        );
        assert_eq!(names(&label), vec!["getLabel", "setLabel"]);
        assert_eq!(label.kind(), Kind::SingleAssociation);
        assert_eq!(label.uid(), "association:label");
    }

    #[test]
    fn test_multiple_association_gets_deprecated_alias() {
        let labels = AssociationInfo::new(
            "test.Input",
            "ariaLabelledBy",
            AssociationDecl::multiple("sap.ui.core.Control"),
            Arc::new(TypeRegistry::new()),
        );
        assert_eq!(labels.singular_name(), Some("ariaLabelledBy"));
        assert_eq!(
            names(&labels),
            vec![
                "getAriaLabelledBy",
                "addAriaLabelledBy",
                "removeAriaLabelledBy",
                "removeAllAriaLabelledBy",
            ]
        );

        let selections = AssociationInfo::new(
            "test.List",
            "selectedItems",
            AssociationDecl::multiple("sap.ui.core.Control"),
            Arc::new(TypeRegistry::new()),
        );
        assert_eq!(
            selections.accessors().get(AccessorOp::RemoveAllSingular),
            Some("removeAllSelectedItem")
        );
    }
}
