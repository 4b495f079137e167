//! Aggregation forwarding
//!
//! A forwarded aggregation keeps no storage of its own. Its children live in
//! an aggregation of a different object (the target), and the source's
//! forwarded-aggregation entry points at the very same collection as the
//! target's aggregation. All mutations are replayed on the target through
//! the target aggregation's schema entity.
//!
//! Forwarded children remember on which object and aggregation they were
//! added through the API (see [`ManagedObject::api_parent`]), even though
//! their real parent is the target.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::error::{Error, Result};
use crate::object::ManagedObject;
use crate::schema::{AggregationInfo, ForwardingDecl, TargetFn};
use crate::value::Value;

/// How the target object of a forwarding is found
#[derive(Clone)]
pub enum TargetLocator {
    /// Call a method of the source instance
    Method(String),
    /// Call a function with the source instance
    Function(TargetFn),
    /// Look up the object registered under `source id + suffix`
    IdSuffix(String),
}

impl TargetLocator {
    fn from_decl(decl: &ForwardingDecl) -> Self {
        if let Some(getter) = &decl.getter_fn {
            TargetLocator::Function(getter.clone())
        } else if let Some(getter) = &decl.getter {
            TargetLocator::Method(getter.clone())
        } else {
            TargetLocator::IdSuffix(decl.id_suffix.clone().unwrap_or_default())
        }
    }

    /// Find the current target; `None` while it does not exist yet
    pub fn resolve(&self, instance: &ManagedObject) -> Result<Option<ManagedObject>> {
        match self {
            TargetLocator::Method(name) => Ok(instance.invoke(name, &[])?.into_object()),
            TargetLocator::Function(getter) => Ok(getter(instance)),
            TargetLocator::IdSuffix(suffix) => {
                let id = format!("{}{suffix}", instance.id());
                Ok(instance.objects().get(&id))
            }
        }
    }
}

impl fmt::Debug for TargetLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetLocator::Method(name) => f.debug_tuple("Method").field(name).finish(),
            TargetLocator::Function(_) => f.write_str("Function(..)"),
            TargetLocator::IdSuffix(suffix) => f.debug_tuple("IdSuffix").field(suffix).finish(),
        }
    }
}

/// Replays operations of a forwarded aggregation on its target
#[derive(Debug)]
pub struct AggregationForwarder {
    source_class: String,
    source_name: String,
    source_multiple: bool,
    target_aggregation: String,
    forward_binding: bool,
    locator: TargetLocator,
    target_info: OnceCell<Arc<AggregationInfo>>,
}

impl AggregationForwarder {
    pub(crate) fn new(source: &AggregationInfo, decl: &ForwardingDecl) -> Self {
        Self {
            source_class: source.class_name().to_string(),
            source_name: source.name().to_string(),
            source_multiple: source.is_multiple(),
            target_aggregation: decl.aggregation.clone(),
            forward_binding: decl.forward_binding,
            locator: TargetLocator::from_decl(decl),
            target_info: OnceCell::new(),
        }
    }

    /// Name of the forwarded (source) aggregation
    pub fn source_aggregation_name(&self) -> &str {
        &self.source_name
    }

    /// Name of the aggregation on the target
    pub fn target_aggregation_name(&self) -> &str {
        &self.target_aggregation
    }

    /// Whether bindings are forwarded too
    pub fn forwards_binding(&self) -> bool {
        self.forward_binding
    }

    /// How the target is located
    pub fn locator(&self) -> &TargetLocator {
        &self.locator
    }

    /// Target aggregation entity, once a target has been seen
    pub fn target_aggregation_info(&self) -> Option<Arc<AggregationInfo>> {
        self.target_info.get().cloned()
    }

    fn resolve_target_info(&self, target: &ManagedObject) -> Result<Arc<AggregationInfo>> {
        self.target_info
            .get_or_try_init(|| self.check_target(target))
            .cloned()
    }

    /// Look up the target aggregation and check that the multiplicities match
    fn check_target(&self, target: &ManagedObject) -> Result<Arc<AggregationInfo>> {
        let (name, id) = (&self.target_aggregation, target.id());
        let metadata = target.metadata();
        let info = metadata.get_managed_aggregation(name).ok_or_else(|| {
            Error::configuration(format!("Target aggregation {name} not found on {id}"))
        })?;

        let source = format!("{}.{}", self.source_class, self.source_name);
        if self.source_multiple && !info.is_multiple() {
            return Err(Error::configuration(format!(
                "Aggregation {source} (multiple: true) cannot be forwarded \
                 to aggregation {name} (multiple: false)"
            )));
        }
        if !self.source_multiple && info.is_multiple() && self.forward_binding {
            return Err(Error::configuration(format!(
                "Aggregation {source} (multiple: false) cannot be forwarded \
                 to aggregation {name} (multiple: true) with 'forwardBinding' set to 'true'"
            )));
        }
        Ok(info)
    }

    /// Locate the target and connect the source's forwarded entry to its storage
    ///
    /// On the first connect the target aggregation must be empty unless
    /// bindings are forwarded.
    pub(crate) fn get_target(&self, instance: &ManagedObject) -> Result<Option<ManagedObject>> {
        let Some(target) = self.locator.resolve(instance)? else {
            return Ok(None);
        };
        let info = self.resolve_target_info(&target)?;

        if !instance.has_forwarded_aggregation(&self.source_name) {
            let storage = target.aggregation_storage(info.name(), info.is_multiple());
            if !storage.is_empty() && !self.forward_binding {
                let (name, id) = (info.name(), target.id());
                return Err(Error::configuration(format!(
                    "There is already content in aggregation {name} of {id} \
                     to which forwarding is being set up now."
                )));
            }
            debug!(
                source = instance.id(),
                target = target.id(),
                aggregation = %self.source_name,
                "connecting forwarded aggregation"
            );
            instance.set_forwarded_aggregation(&self.source_name, storage);
        }

        Ok(Some(target))
    }

    fn require_target(
        &self,
        instance: &ManagedObject,
    ) -> Result<(ManagedObject, Arc<AggregationInfo>)> {
        let target = self.get_target(instance)?.ok_or_else(|| {
            Error::configuration(format!(
                "No forwarding target for aggregation {} of {} (yet)",
                self.source_name,
                instance.id()
            ))
        })?;
        let info = self.resolve_target_info(&target)?;
        Ok((target, info))
    }

    fn with_api_parent<T>(
        &self,
        instance: &ManagedObject,
        child: &ManagedObject,
        op: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        child.add_api_parent_info_begin(instance, &self.source_name);
        let result = op();
        child.add_api_parent_info_end();
        result
    }

    /// Content as seen through the source aggregation
    pub fn get(&self, instance: &ManagedObject) -> Result<Value> {
        let Some(target) = self.get_target(instance)? else {
            return Ok(if self.source_multiple {
                Value::Objects(Vec::new())
            } else {
                Value::Undefined
            });
        };
        let info = self.resolve_target_info(&target)?;
        let result = info.get(&target)?;
        if !self.source_multiple && info.is_multiple() {
            return Ok(result.into_objects().into_iter().next().into());
        }
        Ok(result)
    }

    /// Position of a child in the target aggregation
    pub fn index_of(&self, instance: &ManagedObject, child: &ManagedObject) -> Result<i64> {
        match self.get_target(instance)? {
            Some(target) => self.resolve_target_info(&target)?.index_of(&target, child),
            None => Ok(-1),
        }
    }

    /// Replace the single child of a forwarded single aggregation
    pub fn set(&self, instance: &ManagedObject, child: Option<&ManagedObject>) -> Result<()> {
        let (target, info) = self.require_target(instance)?;

        if info.is_multiple() {
            let previous = info.get(&target)?.into_objects();
            if let Some(first) = previous.first() {
                if Some(first) == child {
                    return Ok(());
                }
                info.remove_all(&target)?;
            }
            match child {
                Some(child) => self.with_api_parent(instance, child, || info.add(&target, child)),
                None => Ok(()),
            }
        } else {
            match child {
                Some(child) => {
                    let value = Value::Object(child.clone());
                    self.with_api_parent(instance, child, || info.set(&target, value))
                }
                None => info.set(&target, Value::Undefined),
            }
        }
    }

    /// Append a child to the target aggregation
    pub fn add(&self, instance: &ManagedObject, child: &ManagedObject) -> Result<()> {
        let (target, info) = self.require_target(instance)?;
        self.with_api_parent(instance, child, || info.add(&target, child))
    }

    /// Insert a child into the target aggregation
    pub fn insert(
        &self,
        instance: &ManagedObject,
        child: &ManagedObject,
        index: i64,
    ) -> Result<()> {
        let (target, info) = self.require_target(instance)?;
        self.with_api_parent(instance, child, || info.insert(&target, child, index))
    }

    /// Remove a child (object, index or id) from the target aggregation
    pub fn remove(&self, instance: &ManagedObject, child: &Value) -> Result<Option<ManagedObject>> {
        let Some(target) = self.get_target(instance)? else {
            return Ok(None);
        };
        let removed = self.resolve_target_info(&target)?.remove(&target, child)?;
        if let Some(removed) = &removed {
            removed.pop_api_parent_info();
        }
        Ok(removed)
    }

    /// Remove all children from the target aggregation and disconnect
    pub fn remove_all(&self, instance: &ManagedObject) -> Result<Vec<ManagedObject>> {
        let target = self.get_target(instance)?;
        instance.clear_forwarded_aggregation(&self.source_name);
        let Some(target) = target else {
            return Ok(Vec::new());
        };
        let removed = self.resolve_target_info(&target)?.remove_all(&target)?;
        for child in &removed {
            child.pop_api_parent_info();
        }
        Ok(removed)
    }

    /// Destroy all children of the target aggregation and disconnect
    pub fn destroy(&self, instance: &ManagedObject) -> Result<()> {
        let target = self.get_target(instance)?;
        instance.clear_forwarded_aggregation(&self.source_name);
        if let Some(target) = target {
            self.resolve_target_info(&target)?.destroy(&target)?;
        }
        Ok(())
    }
}
