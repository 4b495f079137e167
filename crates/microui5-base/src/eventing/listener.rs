//! Listener callbacks and contexts

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use super::Event;
use crate::value::Value;

type ListenerFn = dyn Fn(&mut Event, Option<&Value>);

/// An event callback, compared by identity
///
/// Cloning a `Listener` yields a handle to the same callback, so a clone can
/// be used to detach what the original attached.
#[derive(Clone)]
pub struct Listener(Rc<ListenerFn>);

impl Listener {
    /// Wrap a closure receiving the event and the data given at attach time
    pub fn new(callback: impl Fn(&mut Event, Option<&Value>) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    /// Invoke the callback
    pub fn call(&self, event: &mut Event, data: Option<&Value>) {
        (self.0)(event, data)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Listener) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// The object a listener was registered for, compared by identity
#[derive(Clone)]
pub struct ListenerContext(Rc<dyn Any>);

impl ListenerContext {
    /// Wrap an arbitrary value
    pub fn new<T: Any>(value: T) -> Self {
        Self(Rc::new(value))
    }

    /// Borrow the wrapped value if it has type `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &ListenerContext) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl fmt::Debug for ListenerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerContext({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// Compare optional contexts: both absent or the same object
pub(crate) fn same_context(a: Option<&ListenerContext>, b: Option<&ListenerContext>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.ptr_eq(b),
        _ => false,
    }
}
