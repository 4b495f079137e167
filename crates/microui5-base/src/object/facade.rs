//! Public interface facades

use std::fmt;
use std::sync::Arc;

use super::ManagedObject;
use crate::error::{Error, Result};
use crate::value::Value;

/// Restricted view of an object that only allows its public methods
///
/// The method list is taken from the class metadata when the facade is
/// created.
#[derive(Clone)]
pub struct Interface {
    object: ManagedObject,
    methods: Arc<[String]>,
}

impl Interface {
    pub(crate) fn new(object: ManagedObject) -> Self {
        let methods = object.metadata().all_public_methods().into();
        Self { object, methods }
    }

    /// Names of the methods the facade exposes
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// Whether `method` is exposed
    pub fn has_method(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m == method)
    }

    /// Call a public method of the underlying object
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        if !self.has_method(method) {
            return Err(Error::NotPublic {
                class: self.object.class_name().to_string(),
                method: method.to_string(),
            });
        }
        self.object.invoke(method, args)
    }

    /// Whether the underlying object is an instance of any of `type_names`
    pub fn is_a(&self, type_names: &[&str]) -> bool {
        self.object.is_a(type_names)
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("object", &self.object)
            .field("methods", &self.methods)
            .finish()
    }
}
