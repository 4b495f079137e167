//! Event entity

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use super::decl::{AppData, EventDecl};
use super::{delegate, AccessorNames, Visibility};
use crate::error::Result;
use crate::eventing::{EventParameters, Listener, ListenerContext};
use crate::metadata::naming::capitalize;
use crate::metadata::AccessorOp;
use crate::object::ManagedObject;
use crate::value::Value;

/// A declared event
#[derive(Debug)]
pub struct EventInfo {
    class_name: String,
    name: String,
    uid: String,
    allow_prevent_default: bool,
    enable_event_bubbling: bool,
    parameters: IndexMap<String, JsonValue>,
    visibility: Visibility,
    deprecated: bool,
    app_data: AppData,
    accessors: AccessorNames,
}

impl EventInfo {
    pub(crate) fn new(class_name: &str, name: &str, decl: EventDecl) -> Self {
        let n = capitalize(name);
        let mut accessors = AccessorNames::default();
        accessors.push(AccessorOp::Attach, format!("attach{n}"));
        accessors.push(AccessorOp::Detach, format!("detach{n}"));
        accessors.push(AccessorOp::Fire, format!("fire{n}"));

        Self {
            class_name: class_name.to_string(),
            name: name.to_string(),
            uid: format!("event:{name}"),
            allow_prevent_default: decl.allow_prevent_default,
            enable_event_bubbling: decl.enable_event_bubbling,
            parameters: decl.parameters,
            visibility: decl.visibility,
            deprecated: decl.deprecated,
            app_data: decl.app_data,
            accessors,
        }
    }

    /// Event name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique id, `event:<name>`
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Declaring class
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Whether `fire<Name>` reports prevented defaults
    pub fn allows_prevent_default(&self) -> bool {
        self.allow_prevent_default
    }

    /// Whether `fire<Name>` bubbles to the parent
    pub fn enables_bubbling(&self) -> bool {
        self.enable_event_bubbling
    }

    /// Documented parameters
    pub fn parameters(&self) -> &IndexMap<String, JsonValue> {
        &self.parameters
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

    /// Register a listener on `instance`
    pub fn attach(
        &self,
        instance: &ManagedObject,
        data: Option<Value>,
        listener: Listener,
        context: Option<ListenerContext>,
    ) -> Result<()> {
        let mut args: Vec<Value> = data.clone().into_iter().collect();
        args.push(Value::Listener(listener.clone()));
        args.extend(context.clone().map(Value::Context));
        self.run(AccessorOp::Attach, instance, &args, || {
            instance
                .attach_event(&self.name, data, listener, context)
                .map(|_| Value::Undefined)
        })?;
        Ok(())
    }

    /// Remove a listener from `instance`
    pub fn detach(
        &self,
        instance: &ManagedObject,
        listener: &Listener,
        context: Option<&ListenerContext>,
    ) -> Result<()> {
        let mut args = vec![Value::Listener(listener.clone())];
        args.extend(context.cloned().map(Value::Context));
        self.run(AccessorOp::Detach, instance, &args, || {
            instance
                .detach_event(&self.name, listener, context)
                .map(|_| Value::Undefined)
        })?;
        Ok(())
    }

    /// Fire the event on `instance`
    ///
    /// Returns whether the default action should run.
    pub fn fire(
        &self,
        instance: &ManagedObject,
        parameters: Option<EventParameters>,
    ) -> Result<bool> {
        let args: Vec<Value> = parameters.clone().map(Value::Map).into_iter().collect();
        let result = self.run(AccessorOp::Fire, instance, &args, || {
            let (prevent, bubble) = (self.allow_prevent_default, self.enable_event_bubbling);
            let proceed = instance.fire_event(&self.name, parameters, prevent, bubble);
            Ok(Value::from(proceed))
        })?;
        Ok(result.as_bool().unwrap_or(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessor_names() {
        let decl = EventDecl::default().allow_prevent_default();
        let press = EventInfo::new("test.Button", "press", decl);
        let names: Vec<_> = press.accessors().iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["attachPress", "detachPress", "firePress"]);
        assert_eq!(press.uid(), "event:press");
        assert!(press.allows_prevent_default());
        assert!(!press.enables_bubbling());
    }
}
