//! Managed object instances
//!
//! A [`ManagedObject`] owns the state its class schema describes: property
//! values, aggregated children, association ids, bindings and its listener
//! registry. The generic primitives here are what generated accessors and
//! schema entities call; forwarded aggregations are redirected to their
//! forwarder before any local storage is touched.
//!
//! Children are owned through the aggregation storage. The parent link of a
//! child is weak, so dropping the last handle to a tree releases it.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value as JsonValue;
use tracing::{debug, trace, warn};

use super::facade::Interface;
use super::storage::AggregationStorage;
use super::ObjectRegistry;
use crate::config::BaseConfig;
use crate::error::{Error, Result};
use crate::eventing::{EventParameters, EventProvider, Listener, ListenerContext};
use crate::metadata::ManagedObjectMetadata;
use crate::schema::{AggregationInfo, AssociationInfo, BindingInfo, Feature};
use crate::value::{Settings, Value};

/// Weak handle to a managed object
#[derive(Clone)]
pub(crate) struct WeakObject(Weak<ObjectInner>);

impl WeakObject {
    pub(crate) fn upgrade(&self) -> Option<ManagedObject> {
        self.0.upgrade().map(|inner| ManagedObject { inner })
    }
}

/// One step of the API parent chain of a forwarded child
#[derive(Clone)]
pub struct ApiParentInfo {
    parent: WeakObject,
    aggregation_name: String,
}

impl ApiParentInfo {
    /// Object the child was added to through the API
    pub fn parent(&self) -> Option<ManagedObject> {
        self.parent.upgrade()
    }

    /// Aggregation the child was added to through the API
    pub fn aggregation_name(&self) -> &str {
        &self.aggregation_name
    }
}

impl fmt::Debug for ApiParentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiParentInfo")
            .field("parent", &self.parent().map(|p| p.id().to_string()))
            .field("aggregation_name", &self.aggregation_name)
            .finish()
    }
}

struct ApiParentInfos {
    entries: Vec<ApiParentInfo>,
    forwarding_counter: u32,
}

#[derive(Default)]
struct ObjectState {
    properties: FxHashMap<String, JsonValue>,
    aggregations: FxHashMap<String, AggregationStorage>,
    alt_values: FxHashMap<String, JsonValue>,
    associations: FxHashMap<String, Vec<String>>,
    forwarded: FxHashMap<String, AggregationStorage>,
    bindings: FxHashMap<String, BindingInfo>,
    special: FxHashMap<String, Value>,
    parent: Option<WeakObject>,
    parent_aggregation: Option<String>,
    api_parent_infos: Option<ApiParentInfos>,
    destroyed: bool,
}

pub(crate) struct ObjectInner {
    id: String,
    metadata: Arc<ManagedObjectMetadata>,
    events: EventProvider,
    objects: ObjectRegistry,
    state: RefCell<ObjectState>,
}

/// Handle to a managed object
///
/// Clones are handles to the same object; equality is identity.
#[derive(Clone)]
pub struct ManagedObject {
    inner: Rc<ObjectInner>,
}

impl ManagedObject {
    /// Create and register an instance of a managed class
    ///
    /// Without an explicit id one is generated from the class' uid token.
    /// Runs the class' `init` hook, if any.
    pub(crate) fn create(
        metadata: Arc<ManagedObjectMetadata>,
        id: Option<&str>,
        objects: &ObjectRegistry,
    ) -> Result<Self> {
        if metadata.is_abstract() {
            return Err(Error::abstract_class(metadata.name()));
        }
        let id = match id {
            Some(id) => id.to_string(),
            None => objects.generate_id(&metadata.uid_token()),
        };

        let object = ManagedObject {
            inner: Rc::new(ObjectInner {
                events: EventProvider::with_id(id.clone()),
                id,
                metadata,
                objects: objects.clone(),
                state: RefCell::new(ObjectState::default()),
            }),
        };
        objects.register(&object)?;

        if let Some(init) = object.metadata().find_member("init") {
            if let Err(err) = init.call(&object, &[]) {
                objects.deregister(&object);
                return Err(err);
            }
        }
        debug!(
            id = object.id(),
            class = object.class_name(),
            "created object"
        );
        Ok(object)
    }

    fn state(&self) -> Ref<'_, ObjectState> {
        self.inner.state.borrow()
    }

    fn state_mut(&self) -> RefMut<'_, ObjectState> {
        self.inner.state.borrow_mut()
    }

    pub(crate) fn downgrade(&self) -> WeakObject {
        WeakObject(Rc::downgrade(&self.inner))
    }

    /// Object id
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Class metadata
    pub fn metadata(&self) -> &Arc<ManagedObjectMetadata> {
        &self.inner.metadata
    }

    /// Name of the object's class
    pub fn class_name(&self) -> &str {
        self.inner.metadata.name()
    }

    /// Registry the object is registered in
    pub fn objects(&self) -> &ObjectRegistry {
        &self.inner.objects
    }

    /// Runtime configuration
    pub fn config(&self) -> &Arc<BaseConfig> {
        self.inner.objects.config()
    }

    /// The object's listener registry
    pub fn events(&self) -> &EventProvider {
        &self.inner.events
    }

    /// Whether [`destroy`](Self::destroy) has run
    pub fn is_destroyed(&self) -> bool {
        self.state().destroyed
    }

    /// Whether the object's class is, extends or implements any of `type_names`
    pub fn is_a(&self, type_names: &[&str]) -> bool {
        self.inner.metadata.is_a(type_names)
    }

    /// Facade exposing only the public methods
    pub fn get_interface(&self) -> Interface {
        Interface::new(self.clone())
    }

    /// Value of a special setting given at construction
    pub fn special_setting(&self, name: &str) -> Option<Value> {
        self.state().special.get(name).cloned()
    }

    // ========================================================================
    // Named invocation
    // ========================================================================

    /// Whether a hand-written method or generated accessor `name` exists
    pub fn has_method(&self, name: &str) -> bool {
        self.inner.metadata.has_member(name)
    }

    /// Call a hand-written method or generated accessor by name
    pub fn invoke(&self, method: &str, args: &[Value]) -> Result<Value> {
        let member = self.inner.metadata.find_member(method).ok_or_else(|| Error::UnknownMethod {
            class: self.class_name().to_string(),
            method: method.to_string(),
        })?;
        member.call(self, args)
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Apply settings keyed by feature name or unique id
    ///
    /// Properties go through their setters, aggregations are set, added or
    /// bound, associations set or added, and listeners attached. The `id`
    /// special setting is ignored; other special settings are kept as given.
    pub fn apply_settings(&self, settings: Settings) -> Result<()> {
        let keys = self.inner.metadata.get_json_keys();
        for (key, value) in settings {
            let feature = keys
                .get(&key)
                .ok_or_else(|| Error::unknown_feature(self.class_name(), "setting", &key))?;
            match feature {
                Feature::SpecialSetting(setting) => {
                    if setting.name() != "id" {
                        self.state_mut()
                            .special
                            .insert(setting.name().to_string(), value);
                    }
                }
                Feature::Property(prop) => match value {
                    Value::Undefined => {}
                    Value::Data(data) => prop.set(self, data)?,
                    other => return Err(self.invalid_value(prop.name(), &other)),
                },
                Feature::Aggregation(agg) => self.apply_aggregation_setting(agg, value)?,
                Feature::Association(assoc) => self.apply_association_setting(assoc, value)?,
                Feature::Event(event) => match value {
                    Value::Listener(listener) => event.attach(self, None, listener, None)?,
                    other => return Err(self.invalid_value(event.name(), &other)),
                },
            }
        }
        Ok(())
    }

    fn apply_aggregation_setting(&self, agg: &AggregationInfo, value: Value) -> Result<()> {
        match value {
            Value::Undefined => Ok(()),
            Value::Objects(children) if agg.is_multiple() => {
                for child in &children {
                    agg.add(self, child)?;
                }
                Ok(())
            }
            Value::Object(child) if agg.is_multiple() => agg.add(self, &child),
            Value::Object(child) => agg.set(self, Value::Object(child)),
            Value::Data(data) if !agg.is_multiple() && agg.accepts_alt_value(&data) => {
                agg.set(self, Value::Data(data))
            }
            Value::Data(data) if agg.is_bindable() => {
                let value = Value::Data(data);
                match BindingInfo::from_value(&value) {
                    Some(binding) => agg.bind(self, binding),
                    None => Err(self.invalid_value(agg.name(), &value)),
                }
            }
            other => Err(self.invalid_value(agg.name(), &other)),
        }
    }

    fn apply_association_setting(&self, assoc: &AssociationInfo, value: Value) -> Result<()> {
        let targets: Vec<Value> = match value {
            Value::Undefined => return Ok(()),
            Value::Objects(objects) => objects.into_iter().map(Value::Object).collect(),
            Value::Data(JsonValue::Array(ids)) => ids.into_iter().map(Value::Data).collect(),
            single => vec![single],
        };
        for target in targets {
            assoc.add(self, target)?;
        }
        Ok(())
    }

    fn invalid_value(&self, feature: &str, value: &Value) -> Error {
        Error::invalid_value(
            format!("{}.{feature}", self.class_name()),
            format!("a {} is not accepted", value.kind_name()),
        )
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Current value of a property; its default when never set
    ///
    /// Unknown names yield `null`.
    pub fn get_property(&self, name: &str) -> JsonValue {
        if let Some(value) = self.state().properties.get(name) {
            return value.clone();
        }
        self.inner
            .metadata
            .get_managed_property(name)
            .map(|prop| prop.get_default_value())
            .unwrap_or(JsonValue::Null)
    }

    /// Set a property after validating the value against its type
    ///
    /// `null` resets the property to its default.
    pub fn set_property(&self, name: &str, value: JsonValue) -> Result<()> {
        let prop = self
            .inner
            .metadata
            .get_managed_property(name)
            .ok_or_else(|| Error::unknown_feature(self.class_name(), "property", name))?;

        if value.is_null() {
            self.state_mut().properties.remove(name);
            return Ok(());
        }
        if let Some(ty) = prop.get_type() {
            ty.validate(&value)?;
        }

        let mut state = self.state_mut();
        if state.properties.get(name) == Some(&value) {
            return Ok(());
        }
        trace!(id = %self.inner.id, property = name, value = %value, "property changed");
        state.properties.insert(name.to_string(), value);
        Ok(())
    }

    /// Record a binding for a property
    pub fn bind_property(&self, name: &str, binding: BindingInfo) -> Result<()> {
        if self.inner.metadata.get_managed_property(name).is_none() {
            return Err(Error::unknown_feature(self.class_name(), "property", name));
        }
        self.state_mut().bindings.insert(name.to_string(), binding);
        Ok(())
    }

    /// Remove the binding of a property
    pub fn unbind_property(&self, name: &str) -> Result<()> {
        if self.inner.metadata.get_managed_property(name).is_none() {
            return Err(Error::unknown_feature(self.class_name(), "property", name));
        }
        self.state_mut().bindings.remove(name);
        Ok(())
    }

    /// Whether a property or aggregation is bound
    pub fn is_bound(&self, name: &str) -> bool {
        self.state().bindings.contains_key(name)
    }

    /// Binding recorded for a property or aggregation
    pub fn binding_info(&self, name: &str) -> Option<BindingInfo> {
        self.state().bindings.get(name).cloned()
    }

    // ========================================================================
    // Aggregations
    // ========================================================================

    fn require_aggregation(&self, name: &str) -> Result<Arc<AggregationInfo>> {
        self.inner
            .metadata
            .get_managed_aggregation(name)
            .ok_or_else(|| Error::unknown_feature(self.class_name(), "aggregation", name))
    }

    /// Storage of an aggregation, created on first use
    pub(crate) fn aggregation_storage(&self, name: &str, multiple: bool) -> AggregationStorage {
        self.state_mut()
            .aggregations
            .entry(name.to_string())
            .or_insert_with(|| AggregationStorage::new(multiple))
            .clone()
    }

    /// Storage of an aggregation, if it has been used
    pub fn storage(&self, name: &str) -> Option<AggregationStorage> {
        self.state().aggregations.get(name).cloned()
    }

    /// Storage a forwarded aggregation is connected to
    pub fn forwarded_storage(&self, name: &str) -> Option<AggregationStorage> {
        self.state().forwarded.get(name).cloned()
    }

    pub(crate) fn has_forwarded_aggregation(&self, name: &str) -> bool {
        self.state().forwarded.contains_key(name)
    }

    pub(crate) fn set_forwarded_aggregation(&self, name: &str, storage: AggregationStorage) {
        self.state_mut().forwarded.insert(name.to_string(), storage);
    }

    pub(crate) fn clear_forwarded_aggregation(&self, name: &str) {
        self.state_mut().forwarded.remove(name);
    }

    fn check_child(&self, info: &AggregationInfo, child: &ManagedObject) -> Result<()> {
        let target = || format!("{}.{}", self.class_name(), info.name());
        if child.is_destroyed() {
            return Err(Error::Destroyed {
                id: child.id().to_string(),
            });
        }
        if info.get_type().is_none() && !child.is_a(&[info.type_name()]) {
            return Err(Error::invalid_value(
                target(),
                format!("\"{}\" is not of type {}", child.id(), info.type_name()),
            ));
        }
        let mut ancestor = Some(self.clone());
        while let Some(current) = ancestor {
            if current == *child {
                return Err(Error::invalid_value(
                    target(),
                    format!("adding \"{}\" would create a cycle", child.id()),
                ));
            }
            ancestor = current.parent();
        }
        Ok(())
    }

    /// Content of an aggregation; undefined for unknown names
    pub fn get_aggregation(&self, name: &str) -> Result<Value> {
        let Some(info) = self.inner.metadata.get_managed_aggregation(name) else {
            return Ok(Value::Undefined);
        };
        if let Some(forwarder) = info.forwarder() {
            return forwarder.get(self);
        }
        let state = self.state();
        if let Some(alt) = state.alt_values.get(name) {
            return Ok(Value::Data(alt.clone()));
        }
        Ok(match state.aggregations.get(name) {
            Some(storage) => storage.to_value(),
            None if info.is_multiple() => Value::Objects(Vec::new()),
            None => Value::Undefined,
        })
    }

    fn clear_single(&self, name: &str, storage: &AggregationStorage) {
        for old in storage.drain() {
            old.set_parent(None, None);
        }
        self.state_mut().alt_values.remove(name);
    }

    /// Replace the content of a single aggregation
    ///
    /// Accepts a child, a plain value matching one of the alternative types,
    /// or undefined/null to clear.
    pub fn set_aggregation(&self, name: &str, value: Value) -> Result<()> {
        let info = self.require_aggregation(name)?;
        if info.is_multiple() {
            return Err(Error::invalid_argument(
                "setAggregation",
                format!("{name} is a multiple aggregation"),
            ));
        }
        if let Some(forwarder) = info.forwarder() {
            return match &value {
                Value::Object(child) => forwarder.set(self, Some(child)),
                v if v.is_nullish() => forwarder.set(self, None),
                other => Err(self.invalid_value(name, other)),
            };
        }

        let storage = self.aggregation_storage(name, false);
        match value {
            Value::Object(child) => {
                if storage.position(&child).is_some() {
                    return Ok(());
                }
                self.check_child(&info, &child)?;
                self.clear_single(name, &storage);
                child.remove_from_parent();
                storage.push(child.clone());
                child.set_parent(Some(self), Some(name));
                Ok(())
            }
            v if v.is_nullish() => {
                self.clear_single(name, &storage);
                Ok(())
            }
            Value::Data(data) if info.accepts_alt_value(&data) => {
                self.clear_single(name, &storage);
                self.state_mut().alt_values.insert(name.to_string(), data);
                Ok(())
            }
            other => Err(self.invalid_value(name, &other)),
        }
    }

    /// Append a child; single aggregations replace their content
    pub fn add_aggregation(&self, name: &str, child: &ManagedObject) -> Result<()> {
        self.insert_child(name, child, None)
    }

    /// Insert a child at `index`, clamped to the bounds of the aggregation
    pub fn insert_aggregation(&self, name: &str, child: &ManagedObject, index: i64) -> Result<()> {
        self.insert_child(name, child, Some(index))
    }

    fn insert_child(&self, name: &str, child: &ManagedObject, index: Option<i64>) -> Result<()> {
        let info = self.require_aggregation(name)?;
        if let Some(forwarder) = info.forwarder() {
            return match index {
                Some(index) => forwarder.insert(self, child, index),
                None => forwarder.add(self, child),
            };
        }
        if !info.is_multiple() {
            return self.set_aggregation(name, Value::Object(child.clone()));
        }

        self.check_child(&info, child)?;
        child.remove_from_parent();
        let storage = self.aggregation_storage(name, true);
        match index {
            Some(index) => storage.insert(index, child.clone()),
            None => storage.push(child.clone()),
        }
        child.set_parent(Some(self), Some(name));
        Ok(())
    }

    /// Remove a child given as object, index or id
    pub fn remove_aggregation(&self, name: &str, child: &Value) -> Result<Option<ManagedObject>> {
        let info = self.require_aggregation(name)?;
        if let Some(forwarder) = info.forwarder() {
            return forwarder.remove(self, child);
        }
        let Some(storage) = self.storage(name) else {
            return Ok(None);
        };
        let index = match child {
            Value::Object(child) => storage.position(child),
            Value::Data(JsonValue::String(id)) => {
                storage.children().iter().position(|c| c.id() == id)
            }
            Value::Data(JsonValue::Number(n)) => n.as_u64().and_then(|i| usize::try_from(i).ok()),
            _ => None,
        };
        let removed = index.and_then(|i| storage.remove_at(i));
        if let Some(removed) = &removed {
            removed.set_parent(None, None);
        }
        Ok(removed)
    }

    /// Remove all children without destroying them
    pub fn remove_all_aggregation(&self, name: &str) -> Result<Vec<ManagedObject>> {
        let info = self.require_aggregation(name)?;
        if let Some(forwarder) = info.forwarder() {
            return forwarder.remove_all(self);
        }
        self.state_mut().alt_values.remove(name);
        let removed = self.storage(name).map(|s| s.drain()).unwrap_or_default();
        for child in &removed {
            child.set_parent(None, None);
        }
        Ok(removed)
    }

    /// Position of a child, `-1` when absent
    pub fn index_of_aggregation(&self, name: &str, child: &ManagedObject) -> Result<i64> {
        let info = self.require_aggregation(name)?;
        if let Some(forwarder) = info.forwarder() {
            return forwarder.index_of(self, child);
        }
        Ok(self
            .storage(name)
            .and_then(|s| s.position(child))
            .and_then(|i| i64::try_from(i).ok())
            .unwrap_or(-1))
    }

    /// Destroy all children of an aggregation
    pub fn destroy_aggregation(&self, name: &str) -> Result<()> {
        let info = self.require_aggregation(name)?;
        if let Some(forwarder) = info.forwarder() {
            return forwarder.destroy(self);
        }
        self.state_mut().alt_values.remove(name);
        let children = self.storage(name).map(|s| s.drain()).unwrap_or_default();
        for child in children {
            child.set_parent(None, None);
            child.destroy();
        }
        Ok(())
    }

    /// Record a binding for an aggregation
    ///
    /// Forwarded aggregations with binding forwarding bind the target
    /// aggregation instead.
    pub fn bind_aggregation(&self, name: &str, binding: BindingInfo) -> Result<()> {
        let info = self.require_aggregation(name)?;
        if let Some(forwarder) = info.forwarder().filter(|f| f.forwards_binding()) {
            if let Some(target) = forwarder.get_target(self)? {
                if let Some(target_info) = forwarder.target_aggregation_info() {
                    return target_info.bind(&target, binding);
                }
            }
        }
        self.state_mut().bindings.insert(name.to_string(), binding);
        Ok(())
    }

    /// Remove the binding of an aggregation
    pub fn unbind_aggregation(&self, name: &str) -> Result<()> {
        let info = self.require_aggregation(name)?;
        if let Some(forwarder) = info.forwarder().filter(|f| f.forwards_binding()) {
            if let Some(target) = forwarder.get_target(self)? {
                if let Some(target_info) = forwarder.target_aggregation_info() {
                    return target_info.unbind(&target);
                }
            }
        }
        self.state_mut().bindings.remove(name);
        Ok(())
    }

    /// Generic update of a bound aggregation
    ///
    /// Without a model there is nothing to rebuild from; the request is
    /// only traced.
    pub fn update_aggregation(
        &self,
        name: &str,
        change_reason: &str,
        event_info: Option<Value>,
    ) -> Result<()> {
        self.require_aggregation(name)?;
        if self.is_bound(name) {
            debug!(
                id = %self.inner.id,
                aggregation = name,
                reason = change_reason,
                info = ?event_info,
                "aggregation update requested"
            );
        }
        Ok(())
    }

    // ========================================================================
    // Parent
    // ========================================================================

    /// Object that aggregates this one
    pub fn parent(&self) -> Option<ManagedObject> {
        self.state().parent.as_ref().and_then(WeakObject::upgrade)
    }

    /// Name of the aggregation of the parent that holds this object
    pub fn parent_aggregation_name(&self) -> Option<String> {
        self.state().parent_aggregation.clone()
    }

    /// Object this one was added to through the API
    ///
    /// For a child added through a forwarded aggregation this is the object
    /// that declares the forwarded aggregation, not the target that stores
    /// the child. Falls back to [`parent`](Self::parent).
    pub fn api_parent(&self) -> Option<ManagedObject> {
        let first = self
            .state()
            .api_parent_infos
            .as_ref()
            .and_then(|infos| infos.entries.first().cloned());
        match first {
            Some(info) => info.parent(),
            None => self.parent(),
        }
    }

    /// Aggregation this object was added to through the API
    pub fn api_parent_aggregation_name(&self) -> Option<String> {
        let first = self
            .state()
            .api_parent_infos
            .as_ref()
            .and_then(|infos| infos.entries.first().map(|i| i.aggregation_name.clone()));
        first.or_else(|| self.parent_aggregation_name())
    }

    /// Recorded API parent steps, outermost first
    pub fn api_parent_infos(&self) -> Vec<ApiParentInfo> {
        self.state()
            .api_parent_infos
            .as_ref()
            .map(|infos| infos.entries.clone())
            .unwrap_or_default()
    }

    /// Start recording an API parent step
    ///
    /// A fresh round of forwarding discards older steps; a nested step of
    /// an ongoing round is appended.
    pub(crate) fn add_api_parent_info_begin(&self, parent: &ManagedObject, aggregation_name: &str) {
        let mut state = self.state_mut();
        let info = ApiParentInfo {
            parent: parent.downgrade(),
            aggregation_name: aggregation_name.to_string(),
        };
        if let Some(infos) = &mut state.api_parent_infos {
            if infos.forwarding_counter > 0 {
                infos.forwarding_counter += 1;
                infos.entries.push(info);
                return;
            }
        }
        state.api_parent_infos = Some(ApiParentInfos {
            entries: vec![info],
            forwarding_counter: 1,
        });
    }

    /// Finish recording an API parent step
    pub(crate) fn add_api_parent_info_end(&self) {
        if let Some(infos) = &mut self.state_mut().api_parent_infos {
            infos.forwarding_counter = infos.forwarding_counter.saturating_sub(1);
        }
    }

    /// Drop the innermost API parent step
    pub(crate) fn pop_api_parent_info(&self) {
        let mut state = self.state_mut();
        if let Some(infos) = &mut state.api_parent_infos {
            infos.entries.pop();
            if infos.entries.is_empty() {
                state.api_parent_infos = None;
            }
        }
    }

    fn set_parent(&self, parent: Option<&ManagedObject>, aggregation: Option<&str>) {
        {
            let mut state = self.state_mut();
            state.parent = parent.map(ManagedObject::downgrade);
            state.parent_aggregation = aggregation.map(str::to_string);
            if state
                .api_parent_infos
                .as_ref()
                .is_some_and(|infos| infos.forwarding_counter == 0)
            {
                state.api_parent_infos = None;
            }
        }
        self.inner
            .events
            .set_eventing_parent(parent.map(ManagedObject::events));
    }

    fn remove_from_parent(&self) {
        let (parent, aggregation) = {
            let state = self.state();
            (
                state.parent.as_ref().and_then(WeakObject::upgrade),
                state.parent_aggregation.clone(),
            )
        };
        if let (Some(parent), Some(aggregation)) = (parent, aggregation) {
            if let Some(storage) = parent.storage(&aggregation) {
                storage.remove(self);
            }
        }
        self.set_parent(None, None);
    }

    // ========================================================================
    // Associations
    // ========================================================================

    fn require_association(&self, name: &str) -> Result<Arc<AssociationInfo>> {
        self.inner
            .metadata
            .get_managed_association(name)
            .ok_or_else(|| Error::unknown_feature(self.class_name(), "association", name))
    }

    fn association_id(&self, name: &str, value: &Value) -> Result<Option<String>> {
        match value {
            Value::Object(object) => Ok(Some(object.id().to_string())),
            Value::Data(JsonValue::String(id)) => Ok(Some(id.clone())),
            v if v.is_nullish() => Ok(None),
            other => Err(self.invalid_value(name, other)),
        }
    }

    /// Referenced id, or the list of ids of a multiple association
    pub fn get_association(&self, name: &str) -> Value {
        let Some(info) = self.inner.metadata.get_managed_association(name) else {
            return Value::Undefined;
        };
        let ids = self
            .state()
            .associations
            .get(name)
            .cloned()
            .unwrap_or_default();
        if info.is_multiple() {
            Value::Data(ids.into_iter().map(JsonValue::String).collect())
        } else {
            ids.into_iter().next().map(Value::from).unwrap_or_default()
        }
    }

    /// Replace the reference of a single association
    pub fn set_association(&self, name: &str, target: &Value) -> Result<()> {
        let info = self.require_association(name)?;
        if info.is_multiple() {
            return Err(Error::invalid_argument(
                "setAssociation",
                format!("{name} is a multiple association"),
            ));
        }
        let id = self.association_id(name, target)?;
        self.state_mut()
            .associations
            .insert(name.to_string(), id.into_iter().collect());
        Ok(())
    }

    /// Add a reference to a multiple association; duplicates are ignored
    pub fn add_association(&self, name: &str, target: &Value) -> Result<()> {
        let info = self.require_association(name)?;
        if !info.is_multiple() {
            return self.set_association(name, target);
        }
        let Some(id) = self.association_id(name, target)? else {
            return Ok(());
        };
        let mut state = self.state_mut();
        let ids = state.associations.entry(name.to_string()).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
        Ok(())
    }

    /// Remove a reference given as object, id or index
    pub fn remove_association(&self, name: &str, target: &Value) -> Result<Option<String>> {
        self.require_association(name)?;
        let mut state = self.state_mut();
        let Some(ids) = state.associations.get_mut(name) else {
            return Ok(None);
        };
        let index = match target {
            Value::Object(object) => ids.iter().position(|id| id == object.id()),
            Value::Data(JsonValue::String(id)) => ids.iter().position(|i| i == id),
            Value::Data(JsonValue::Number(n)) => {
                let index = n.as_u64().and_then(|i| usize::try_from(i).ok());
                index.filter(|i| *i < ids.len())
            }
            _ => None,
        };
        Ok(index.map(|i| ids.remove(i)))
    }

    /// Remove all references; returns the removed ids
    pub fn remove_all_association(&self, name: &str) -> Result<Vec<String>> {
        self.require_association(name)?;
        let removed = self.state_mut().associations.remove(name);
        Ok(removed.unwrap_or_default())
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Register a listener on this object
    pub fn attach_event(
        &self,
        event_type: &str,
        data: Option<Value>,
        listener: Listener,
        context: Option<ListenerContext>,
    ) -> Result<()> {
        self.inner
            .events
            .attach_event(event_type, data, listener, context)
    }

    /// Register a listener that runs at most once
    pub fn attach_event_once(
        &self,
        event_type: &str,
        data: Option<Value>,
        listener: Listener,
        context: Option<ListenerContext>,
    ) -> Result<()> {
        self.inner
            .events
            .attach_event_once(event_type, data, listener, context)
    }

    /// Remove a listener from this object
    pub fn detach_event(
        &self,
        event_type: &str,
        listener: &Listener,
        context: Option<&ListenerContext>,
    ) -> Result<()> {
        self.inner
            .events
            .detach_event(event_type, listener, context)
    }

    /// Fire an event; bubbles along the parent chain when enabled
    pub fn fire_event(
        &self,
        event_type: &str,
        parameters: Option<EventParameters>,
        allow_prevent_default: bool,
        bubble: bool,
    ) -> bool {
        let events = &self.inner.events;
        events.fire_event(event_type, parameters, allow_prevent_default, bubble)
    }

    /// Whether listeners are registered for `event_type`
    pub fn has_listeners(&self, event_type: &str) -> bool {
        self.inner.events.has_listeners(event_type)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Destroy the object and all aggregated children
    ///
    /// Runs the `exit` hook, destroys children depth first, detaches from
    /// the parent, deregisters the id and drops all listeners. Destroying
    /// twice does nothing.
    pub fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        if let Some(exit) = self.inner.metadata.find_member("exit") {
            if let Err(err) = exit.call(self, &[]) {
                warn!(id = %self.inner.id, error = %err, "exit hook failed");
            }
        }

        let storages: Vec<AggregationStorage> = {
            let mut state = self.state_mut();
            state.destroyed = true;
            state.forwarded.clear();
            state.bindings.clear();
            state.api_parent_infos = None;
            state.aggregations.values().cloned().collect()
        };
        for storage in storages {
            for child in storage.drain() {
                child.set_parent(None, None);
                child.destroy();
            }
        }

        self.remove_from_parent();
        self.inner.objects.deregister(self);
        self.inner.events.destroy();
        debug!(id = %self.inner.id, class = self.class_name(), "destroyed object");
    }
}

impl PartialEq for ManagedObject {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ManagedObject {}

impl fmt::Debug for ManagedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ManagedObject({}#{})", self.class_name(), self.id())
    }
}

impl fmt::Display for ManagedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.class_name(), self.id())
    }
}
