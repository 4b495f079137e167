//! Class members: hand-written methods and generated accessors

use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::warn;

use crate::error::{Error, Result};
use crate::eventing::{EventParameters, Listener, ListenerContext};
use crate::object::ManagedObject;
use crate::schema::{BindingInfo, Feature};
use crate::value::Value;

/// A hand-written method: receiver plus dynamic arguments
pub type Method = Arc<dyn Fn(&ManagedObject, &[Value]) -> Result<Value> + Send + Sync>;

/// The operation a generated accessor performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessorOp {
    /// `get<Name>`
    Get,
    /// `set<Name>`
    Set,
    /// `bind<Name>`
    Bind,
    /// `unbind<Name>`
    Unbind,
    /// `add<Singular>`
    Add,
    /// `insert<Singular>`
    Insert,
    /// `remove<Singular>`
    Remove,
    /// `removeAll<Name>`
    RemoveAll,
    /// `indexOf<Singular>`
    IndexOf,
    /// `destroy<Name>`
    Destroy,
    /// `attach<Name>`
    Attach,
    /// `detach<Name>`
    Detach,
    /// `fire<Name>`
    Fire,
    /// Deprecated `removeAll<Singular>` alias of multiple associations
    RemoveAllSingular,
}

impl AccessorOp {
    /// Operations that are wrapped with the deprecation warning
    pub fn is_mutator(self) -> bool {
        matches!(
            self,
            AccessorOp::Set
                | AccessorOp::Add
                | AccessorOp::Insert
                | AccessorOp::Bind
                | AccessorOp::Attach
        )
    }
}

/// A generated accessor bound to one schema entity
#[derive(Debug)]
pub struct Accessor {
    feature: Feature,
    op: AccessorOp,
    name: String,
}

impl Accessor {
    pub(crate) fn new(feature: Feature, op: AccessorOp, name: impl Into<String>) -> Self {
        Self {
            feature,
            op,
            name: name.into(),
        }
    }

    /// Feature the accessor belongs to
    pub fn feature(&self) -> &Feature {
        &self.feature
    }

    /// Operation performed
    pub fn op(&self) -> AccessorOp {
        self.op
    }

    /// Accessor name, e.g. `addItem`
    pub fn name(&self) -> &str {
        &self.name
    }

    fn warn_deprecated(&self, instance: &ManagedObject) {
        if !instance.config().log_deprecation {
            return;
        }
        if self.op == AccessorOp::RemoveAllSingular {
            let class = self.feature.class_name();
            let plural = crate::metadata::naming::capitalize(self.feature.name());
            warn!(
                "Usage of deprecated method {class}.prototype.{}, \
                 use method removeAll{plural} (plural) instead.",
                self.name
            );
        } else if self.feature.is_deprecated() && self.op.is_mutator() {
            warn!(
                "Usage of deprecated feature: {}.{}",
                self.feature.class_name(),
                self.feature.name()
            );
        }
    }

    /// Run the accessor on `instance`
    ///
    /// Mutators return the instance for chaining; `fire<Name>` of events
    /// that allow preventing the default returns the boolean outcome.
    pub fn call(&self, instance: &ManagedObject, args: &[Value]) -> Result<Value> {
        self.warn_deprecated(instance);
        let name = self.feature.name();
        let this = || Ok(Value::Object(instance.clone()));

        match (&self.feature, self.op) {
            (Feature::Property(_), AccessorOp::Get) => Ok(Value::Data(instance.get_property(name))),
            (Feature::Property(_), AccessorOp::Set) => {
                let value = arg(args, 0)
                    .into_data()
                    .ok_or_else(|| self.bad_argument("expected a plain value"))?;
                instance.set_property(name, value)?;
                this()
            }
            (Feature::Property(_), AccessorOp::Bind) => {
                instance.bind_property(name, self.binding_arg(args)?)?;
                this()
            }
            (Feature::Property(_), AccessorOp::Unbind) => {
                instance.unbind_property(name)?;
                this()
            }

            (Feature::Aggregation(_), AccessorOp::Get) => instance.get_aggregation(name),
            (Feature::Aggregation(_), AccessorOp::Set) => {
                instance.set_aggregation(name, arg(args, 0))?;
                this()
            }
            (Feature::Aggregation(_), AccessorOp::Add) => {
                instance.add_aggregation(name, &self.object_arg(args, 0)?)?;
                this()
            }
            (Feature::Aggregation(_), AccessorOp::Insert) => {
                let index = arg(args, 1).as_i64().unwrap_or(0);
                instance.insert_aggregation(name, &self.object_arg(args, 0)?, index)?;
                this()
            }
            (Feature::Aggregation(_), AccessorOp::Remove) => {
                Ok(instance.remove_aggregation(name, &arg(args, 0))?.into())
            }
            (Feature::Aggregation(_), AccessorOp::RemoveAll) => {
                Ok(instance.remove_all_aggregation(name)?.into())
            }
            (Feature::Aggregation(_), AccessorOp::IndexOf) => {
                let child = self.object_arg(args, 0)?;
                Ok(Value::from(instance.index_of_aggregation(name, &child)?))
            }
            (Feature::Aggregation(_), AccessorOp::Destroy) => {
                instance.destroy_aggregation(name)?;
                this()
            }
            (Feature::Aggregation(_), AccessorOp::Bind) => {
                instance.bind_aggregation(name, self.binding_arg(args)?)?;
                this()
            }
            (Feature::Aggregation(_), AccessorOp::Unbind) => {
                instance.unbind_aggregation(name)?;
                this()
            }

            (Feature::Association(_), AccessorOp::Get) => Ok(instance.get_association(name)),
            (Feature::Association(_), AccessorOp::Set) => {
                instance.set_association(name, &arg(args, 0))?;
                this()
            }
            (Feature::Association(_), AccessorOp::Add) => {
                instance.add_association(name, &arg(args, 0))?;
                this()
            }
            (Feature::Association(_), AccessorOp::Remove) => {
                let id = instance.remove_association(name, &arg(args, 0))?;
                Ok(id.map(Value::from).unwrap_or_default())
            }
            (Feature::Association(_), AccessorOp::RemoveAll | AccessorOp::RemoveAllSingular) => {
                let ids = instance.remove_all_association(name)?;
                Ok(Value::Data(ids.into_iter().map(JsonValue::String).collect()))
            }

            (Feature::Event(_), AccessorOp::Attach) => {
                let (data, listener, context) = split_listener_args(args)
                    .ok_or_else(|| self.bad_argument("expected a listener"))?;
                instance.attach_event(name, data, listener, context)?;
                this()
            }
            (Feature::Event(_), AccessorOp::Detach) => {
                let (_, listener, context) = split_listener_args(args)
                    .ok_or_else(|| self.bad_argument("expected a listener"))?;
                instance.detach_event(name, &listener, context.as_ref())?;
                this()
            }
            (Feature::Event(event), AccessorOp::Fire) => {
                let parameters = event_parameters(arg(args, 0))
                    .ok_or_else(|| self.bad_argument("expected event parameters"))?;
                let proceed = instance.fire_event(
                    name,
                    parameters,
                    event.allows_prevent_default(),
                    event.enables_bubbling(),
                );
                if event.allows_prevent_default() {
                    Ok(Value::from(proceed))
                } else {
                    this()
                }
            }

            (feature, op) => Err(Error::invalid_argument(
                self.name.clone(),
                format!("{op:?} is not supported for {feature:?}"),
            )),
        }
    }

    fn bad_argument(&self, reason: &str) -> Error {
        Error::invalid_argument(self.name.clone(), reason)
    }

    fn object_arg(&self, args: &[Value], index: usize) -> Result<ManagedObject> {
        args.get(index)
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| self.bad_argument("expected a managed object"))
    }

    fn binding_arg(&self, args: &[Value]) -> Result<BindingInfo> {
        args.first()
            .and_then(BindingInfo::from_value)
            .ok_or_else(|| self.bad_argument("expected a binding path or binding info"))
    }
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// Split `[data?, listener, context?]`
fn split_listener_args(
    args: &[Value],
) -> Option<(Option<Value>, Listener, Option<ListenerContext>)> {
    let position = args.iter().position(|a| a.as_listener().is_some())?;
    let listener = args[position].as_listener()?.clone();
    let data = position
        .checked_sub(1)
        .map(|i| args[i].clone())
        .filter(|d| !d.is_undefined());
    let context = args.get(position + 1).and_then(Value::as_context).cloned();
    Some((data, listener, context))
}

fn event_parameters(value: Value) -> Option<Option<EventParameters>> {
    match value {
        Value::Undefined | Value::Data(JsonValue::Null) => Some(None),
        Value::Map(map) => Some(Some(map)),
        Value::Data(JsonValue::Object(map)) => {
            let map = map.into_iter().map(|(k, v)| (k, Value::Data(v)));
            Some(Some(map.collect()))
        }
        _ => None,
    }
}

/// A class member reachable by name
#[derive(Clone)]
pub enum Member {
    /// Hand-written method
    Method(Method),
    /// Generated accessor
    Accessor(Arc<Accessor>),
}

impl Member {
    /// Invoke the member on `instance`
    pub fn call(&self, instance: &ManagedObject, args: &[Value]) -> Result<Value> {
        match self {
            Member::Method(method) => method(instance, args),
            Member::Accessor(accessor) => accessor.call(instance, args),
        }
    }

    /// Whether this is a generated accessor
    pub fn is_generated(&self) -> bool {
        matches!(self, Member::Accessor(_))
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Method(_) => f.write_str("Method(..)"),
            Member::Accessor(accessor) => write!(f, "Accessor({})", accessor.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mutators() {
        assert!(AccessorOp::Set.is_mutator());
        assert!(AccessorOp::Attach.is_mutator());
        assert!(!AccessorOp::Get.is_mutator());
        assert!(!AccessorOp::RemoveAll.is_mutator());
        assert!(!AccessorOp::RemoveAllSingular.is_mutator());
    }

    #[test]
    fn test_split_listener_args() {
        let listener = Listener::new(|_, _| {});
        let context = ListenerContext::new(7_u32);

        let (data, found, ctx) = split_listener_args(&[Value::from(listener.clone())]).unwrap();
        assert!(data.is_none() && ctx.is_none());
        assert!(found.ptr_eq(&listener));

        let (data, _, ctx) = split_listener_args(&[
            Value::from("payload"),
            Value::from(listener.clone()),
            Value::from(context.clone()),
        ])
        .unwrap();
        assert_eq!(data, Some(Value::from("payload")));
        assert!(ctx.unwrap().ptr_eq(&context));

        assert!(split_listener_args(&[Value::from("no listener")]).is_none());
    }

    #[test]
    fn test_event_parameters() {
        assert_eq!(event_parameters(Value::Undefined), Some(None));
        let params = event_parameters(Value::from(json!({ "value": 3 })))
            .unwrap()
            .unwrap();
        assert_eq!(params.get("value"), Some(&Value::from(json!(3))));
        assert!(event_parameters(Value::from(1_i64)).is_none());
    }
}
