//! Aggregation entity

use std::sync::Arc;

use microui5_types::{DataType, TypeRegistry};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde_json::Value as JsonValue;

use super::decl::{AggregationDecl, AppData, ForwardingDecl};
use super::{delegate, AccessorNames, BindingInfo, Kind, Visibility};
use crate::error::Result;
use crate::forwarder::AggregationForwarder;
use crate::metadata::naming::{capitalize, guess_singular_name};
use crate::metadata::AccessorOp;
use crate::object::ManagedObject;
use crate::value::Value;

/// A declared aggregation
#[derive(Debug)]
pub struct AggregationInfo {
    class_name: String,
    name: String,
    uid: String,
    type_name: String,
    alt_types: Vec<String>,
    multiple: bool,
    singular_name: Option<String>,
    bindable: bool,
    visibility: Visibility,
    deprecated: bool,
    selector: Option<String>,
    app_data: AppData,
    accessors: AccessorNames,
    updater: String,
    refresher: String,
    forwarding: RwLock<Option<ForwardingDecl>>,
    forwarder: RwLock<Option<Arc<AggregationForwarder>>>,
    types: Arc<TypeRegistry>,
    resolved_type: OnceCell<Option<Arc<DataType>>>,
}

impl AggregationInfo {
    pub(crate) fn new(
        class_name: &str,
        name: &str,
        decl: AggregationDecl,
        types: Arc<TypeRegistry>,
    ) -> Result<Self> {
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
                accessors.push(AccessorOp::Insert, format!("insert{n1}"));
                accessors.push(AccessorOp::Remove, format!("remove{n1}"));
                accessors.push(AccessorOp::RemoveAll, format!("removeAll{n}"));
                accessors.push(AccessorOp::IndexOf, format!("indexOf{n1}"));
            }
            None => accessors.push(AccessorOp::Set, format!("set{n}")),
        }
        accessors.push(AccessorOp::Destroy, format!("destroy{n}"));
        if decl.bindable {
            accessors.push(AccessorOp::Bind, format!("bind{n}"));
            accessors.push(AccessorOp::Unbind, format!("unbind{n}"));
        }

        let info = Self {
            class_name: class_name.to_string(),
            name: name.to_string(),
            uid: format!("aggregation:{name}"),
            type_name: decl.type_name,
            alt_types: decl.alt_types,
            multiple: decl.multiple,
            singular_name,
            bindable: decl.bindable,
            visibility: decl.visibility,
            deprecated: decl.deprecated,
            selector: decl.selector,
            app_data: decl.app_data,
            accessors,
            updater: format!("update{n}"),
            refresher: format!("refresh{n}"),
            forwarding: RwLock::new(None),
            forwarder: RwLock::new(None),
            types,
            resolved_type: OnceCell::new(),
        };
        if let Some(forwarding) = decl.forwarding {
            info.set_forwarding(forwarding)?;
        }
        Ok(info)
    }

    /// Copy of this aggregation owned by another class, without forwarding
    pub(crate) fn derive_for(&self, class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            name: self.name.clone(),
            uid: self.uid.clone(),
            type_name: self.type_name.clone(),
            alt_types: self.alt_types.clone(),
            multiple: self.multiple,
            singular_name: self.singular_name.clone(),
            bindable: self.bindable,
            visibility: self.visibility,
            deprecated: self.deprecated,
            selector: self.selector.clone(),
            app_data: AppData::new(),
            accessors: self.accessors.clone(),
            updater: self.updater.clone(),
            refresher: self.refresher.clone(),
            forwarding: RwLock::new(None),
            forwarder: RwLock::new(None),
            types: self.types.clone(),
            resolved_type: OnceCell::new(),
        }
    }

    /// Attach forwarding information and the matching forwarder
    pub(crate) fn set_forwarding(&self, forwarding: ForwardingDecl) -> Result<()> {
        forwarding.check(&self.name)?;
        let forwarder = AggregationForwarder::new(self, &forwarding);
        *self.forwarder.write() = Some(Arc::new(forwarder));
        *self.forwarding.write() = Some(forwarding);
        Ok(())
    }

    /// Aggregation name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique id, `aggregation:<name>`
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Declaring class
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Single or multiple aggregation kind
    pub fn kind(&self) -> Kind {
        if self.multiple {
            Kind::MultipleAggregation
        } else {
            Kind::SingleAggregation
        }
    }

    /// Declared child type
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Plain data types also accepted
    pub fn alt_types(&self) -> &[String] {
        &self.alt_types
    }

    /// 0..n children
    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    /// Singular name of a multiple aggregation
    pub fn singular_name(&self) -> Option<&str> {
        self.singular_name.as_deref()
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

    /// Name of the optional instance-specific updater, `update<Name>`
    pub fn updater(&self) -> &str {
        &self.updater
    }

    /// Name of the optional instance-specific refresher, `refresh<Name>`
    pub fn refresher(&self) -> &str {
        &self.refresher
    }

    /// Forwarding declaration, if the aggregation is forwarded
    pub fn forwarding(&self) -> Option<ForwardingDecl> {
        self.forwarding.read().clone()
    }

    /// Forwarder, if the aggregation is forwarded
    pub fn forwarder(&self) -> Option<Arc<AggregationForwarder>> {
        self.forwarder.read().clone()
    }

    /// Resolved data type of the children, if the type name is a data type
    pub fn get_type(&self) -> Option<Arc<DataType>> {
        self.resolved_type
            .get_or_init(|| self.types.resolve(&self.type_name))
            .clone()
    }

    /// Whether a plain value matches one of the alternative types
    pub fn accepts_alt_value(&self, value: &JsonValue) -> bool {
        self.alt_types
            .iter()
            .filter_map(|name| self.types.resolve(name))
            .any(|ty| ty.is_valid_value(value))
    }

    // ========================================================================
    // Operations on instances
    // ========================================================================

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

    /// Current content: a list for multiple aggregations, an object or undefined otherwise
    pub fn get(&self, instance: &ManagedObject) -> Result<Value> {
        self.run(AccessorOp::Get, instance, &[], || {
            instance.get_aggregation(&self.name)
        })
    }

    /// Replace the content of a single aggregation
    pub fn set(&self, instance: &ManagedObject, value: Value) -> Result<()> {
        let args = [value.clone()];
        self.run(AccessorOp::Set, instance, &args, || {
            instance
                .set_aggregation(&self.name, value)
                .map(|_| Value::Undefined)
        })?;
        Ok(())
    }

    /// Append a child; single aggregations replace their content
    pub fn add(&self, instance: &ManagedObject, child: &ManagedObject) -> Result<()> {
        if !self.multiple {
            return self.set(instance, Value::Object(child.clone()));
        }
        let args = [Value::Object(child.clone())];
        self.run(AccessorOp::Add, instance, &args, || {
            instance
                .add_aggregation(&self.name, child)
                .map(|_| Value::Undefined)
        })?;
        Ok(())
    }

    /// Insert a child at `index`
    pub fn insert(
        &self,
        instance: &ManagedObject,
        child: &ManagedObject,
        index: i64,
    ) -> Result<()> {
        if !self.multiple {
            return self.set(instance, Value::Object(child.clone()));
        }
        let args = [Value::Object(child.clone()), Value::from(index)];
        self.run(AccessorOp::Insert, instance, &args, || {
            instance
                .insert_aggregation(&self.name, child, index)
                .map(|_| Value::Undefined)
        })?;
        Ok(())
    }

    /// Remove a child given as object, index or id
    pub fn remove(&self, instance: &ManagedObject, child: &Value) -> Result<Option<ManagedObject>> {
        if !self.multiple {
            let current = self.get(instance)?.into_object();
            let matches = match (&current, child) {
                (Some(current), Value::Object(child)) => current == child,
                (Some(current), Value::Data(JsonValue::String(id))) => current.id() == id,
                (Some(_), Value::Data(JsonValue::Number(n))) => n.as_i64() == Some(0),
                _ => false,
            };
            if !matches {
                return Ok(None);
            }
            self.set(instance, Value::Undefined)?;
            return Ok(current);
        }
        let args = [child.clone()];
        let removed = self.run(AccessorOp::Remove, instance, &args, || {
            instance
                .remove_aggregation(&self.name, child)
                .map(Value::from)
        })?;
        Ok(removed.into_object())
    }

    /// Remove all children without destroying them
    pub fn remove_all(&self, instance: &ManagedObject) -> Result<Vec<ManagedObject>> {
        if !self.multiple {
            let current = self.get(instance)?.into_object();
            if current.is_some() {
                self.set(instance, Value::Undefined)?;
            }
            return Ok(current.into_iter().collect());
        }
        let removed = self.run(AccessorOp::RemoveAll, instance, &[], || {
            instance.remove_all_aggregation(&self.name).map(Value::from)
        })?;
        Ok(removed.into_objects())
    }

    /// Position of a child, `-1` when absent
    pub fn index_of(&self, instance: &ManagedObject, child: &ManagedObject) -> Result<i64> {
        if !self.multiple {
            let current = self.get(instance)?.into_object();
            return Ok(if current.as_ref() == Some(child) { 0 } else { -1 });
        }
        let args = [Value::Object(child.clone())];
        let index = self.run(AccessorOp::IndexOf, instance, &args, || {
            Ok(Value::from(instance.index_of_aggregation(&self.name, child)?))
        })?;
        Ok(index.as_i64().unwrap_or(-1))
    }

    /// Destroy all children
    pub fn destroy(&self, instance: &ManagedObject) -> Result<()> {
        self.run(AccessorOp::Destroy, instance, &[], || {
            instance
                .destroy_aggregation(&self.name)
                .map(|_| Value::Undefined)
        })?;
        Ok(())
    }

    /// Bind the aggregation
    pub fn bind(&self, instance: &ManagedObject, binding: BindingInfo) -> Result<()> {
        let args = [binding.to_value()];
        self.run(AccessorOp::Bind, instance, &args, || {
            instance
                .bind_aggregation(&self.name, binding)
                .map(|_| Value::Undefined)
        })?;
        Ok(())
    }

    /// Remove the binding of the aggregation
    pub fn unbind(&self, instance: &ManagedObject) -> Result<()> {
        self.run(AccessorOp::Unbind, instance, &[], || {
            instance
                .unbind_aggregation(&self.name)
                .map(|_| Value::Undefined)
        })?;
        Ok(())
    }

    /// Run `update<Name>` if the instance has one, else the generic update
    pub fn update(
        &self,
        instance: &ManagedObject,
        change_reason: &str,
        event_info: Option<Value>,
    ) -> Result<()> {
        if instance.has_method(&self.updater) {
            let mut args = vec![Value::from(change_reason)];
            args.extend(event_info);
            instance.invoke(&self.updater, &args)?;
            return Ok(());
        }
        instance.update_aggregation(&self.name, change_reason, event_info)
    }

    /// Run `refresh<Name>` if the instance has one, else [`update`](Self::update)
    pub fn refresh(&self, instance: &ManagedObject, change_reason: &str) -> Result<()> {
        if instance.has_method(&self.refresher) {
            instance.invoke(&self.refresher, &[Value::from(change_reason)])?;
            return Ok(());
        }
        self.update(instance, change_reason, None)
    }
}
