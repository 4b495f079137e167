//! Event provider: per-instance listener registry

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use tracing::trace;

use super::listener::same_context;
use super::{DispatchResult, Event, EventParameters, Listener, ListenerContext};
use crate::error::{Error, Result};
use crate::value::Value;

/// Meta event fired on a provider whenever one of its listeners changes
pub const EVENT_HANDLER_CHANGE: &str = "EventHandlerChange";

#[derive(Clone)]
struct ListenerEntry {
    id: u64,
    listener: Listener,
    context: Option<ListenerContext>,
    data: Option<Value>,
    once: bool,
}

struct ProviderInner {
    id: Option<String>,
    registry: RefCell<FxHashMap<String, Vec<ListenerEntry>>>,
    parent: RefCell<Weak<ProviderInner>>,
    next_entry: Cell<u64>,
}

/// A cloneable handle to a listener registry
///
/// Clones share the registry. Managed objects own one provider each and link
/// it to their parent's provider for bubbling.
#[derive(Clone)]
pub struct EventProvider {
    inner: Rc<ProviderInner>,
}

impl EventProvider {
    /// Create an anonymous provider
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a provider labelled with the id of its owner
    pub fn with_id(id: impl Into<String>) -> Self {
        Self::build(Some(id.into()))
    }

    fn build(id: Option<String>) -> Self {
        Self {
            inner: Rc::new(ProviderInner {
                id,
                registry: RefCell::new(FxHashMap::default()),
                parent: RefCell::new(Weak::new()),
                next_entry: Cell::new(0),
            }),
        }
    }

    /// Id of the owning object, if any
    pub fn id(&self) -> Option<&str> {
        self.inner.id.as_deref()
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &EventProvider) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a listener for `event_type`
    ///
    /// Registering the same listener and context twice creates two entries.
    pub fn attach_event(
        &self,
        event_type: &str,
        data: Option<Value>,
        listener: Listener,
        context: Option<ListenerContext>,
    ) -> Result<()> {
        self.attach(event_type, data, listener, context, false, "attachEvent")
    }

    /// Register a listener that is removed right before its first invocation
    pub fn attach_event_once(
        &self,
        event_type: &str,
        data: Option<Value>,
        listener: Listener,
        context: Option<ListenerContext>,
    ) -> Result<()> {
        self.attach(event_type, data, listener, context, true, "attachEventOnce")
    }

    fn attach(
        &self,
        event_type: &str,
        data: Option<Value>,
        listener: Listener,
        context: Option<ListenerContext>,
        once: bool,
        operation: &str,
    ) -> Result<()> {
        check_event_type(event_type, operation)?;

        let id = self.inner.next_entry.get();
        self.inner.next_entry.set(id + 1);
        self.inner
            .registry
            .borrow_mut()
            .entry(event_type.to_string())
            .or_default()
            .push(ListenerEntry {
                id,
                listener,
                context,
                data: data.clone(),
                once,
            });

        self.notify_handler_change(event_type, "listenerAttached", data);
        Ok(())
    }

    /// Remove the first entry registered with this listener and context
    ///
    /// Plain registrations are matched before "once" registrations, so a once
    /// listener can be detached before it ever fired. Does nothing when no
    /// entry matches.
    pub fn detach_event(
        &self,
        event_type: &str,
        listener: &Listener,
        context: Option<&ListenerContext>,
    ) -> Result<()> {
        check_event_type(event_type, "detachEvent")?;

        let removed = {
            let mut registry = self.inner.registry.borrow_mut();
            let Some(entries) = registry.get_mut(event_type) else {
                return Ok(());
            };
            let matches = |entry: &ListenerEntry, once: bool| {
                entry.once == once
                    && entry.listener.ptr_eq(listener)
                    && same_context(entry.context.as_ref(), context)
            };
            let position = entries
                .iter()
                .position(|e| matches(e, false))
                .or_else(|| entries.iter().position(|e| matches(e, true)));
            let removed = position.map(|index| entries.remove(index));
            if entries.is_empty() {
                registry.remove(event_type);
            }
            removed
        };

        if let Some(entry) = removed {
            self.notify_handler_change(event_type, "listenerDetached", entry.data);
        }
        Ok(())
    }

    fn remove_entry(&self, event_type: &str, entry_id: u64) -> bool {
        let mut registry = self.inner.registry.borrow_mut();
        let Some(entries) = registry.get_mut(event_type) else {
            return false;
        };
        let Some(index) = entries.iter().position(|e| e.id == entry_id) else {
            return false;
        };
        let entry = entries.remove(index);
        if entries.is_empty() {
            registry.remove(event_type);
        }
        drop(registry);
        self.notify_handler_change(event_type, "listenerDetached", entry.data);
        true
    }

    fn notify_handler_change(&self, event_type: &str, change: &str, data: Option<Value>) {
        if !self.has_listeners(EVENT_HANDLER_CHANGE) {
            return;
        }
        let mut params = EventParameters::new();
        params.insert("EventId".to_string(), Value::from(event_type));
        params.insert("type".to_string(), Value::from(change));
        if let Some(data) = data {
            params.insert("data".to_string(), data);
        }
        self.fire_event(EVENT_HANDLER_CHANGE, Some(params), false, false);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whether at least one listener is registered for `event_type`
    pub fn has_listeners(&self, event_type: &str) -> bool {
        self.inner.registry.borrow().contains_key(event_type)
    }

    /// Whether this exact listener/context pair is registered for `event_type`
    pub fn has_listener(
        &self,
        event_type: &str,
        listener: &Listener,
        context: Option<&ListenerContext>,
    ) -> bool {
        let registry = self.inner.registry.borrow();
        let Some(entries) = registry.get(event_type) else {
            return false;
        };
        entries
            .iter()
            .any(|e| e.listener.ptr_eq(listener) && same_context(e.context.as_ref(), context))
    }

    /// Event types that currently have listeners
    pub fn event_types(&self) -> Vec<String> {
        self.inner.registry.borrow().keys().cloned().collect()
    }

    /// Number of listeners registered for `event_type`
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.inner
            .registry
            .borrow()
            .get(event_type)
            .map_or(0, Vec::len)
    }

    // ========================================================================
    // Bubbling
    // ========================================================================

    /// Provider that receives bubbled events
    pub fn eventing_parent(&self) -> Option<EventProvider> {
        self.inner
            .parent
            .borrow()
            .upgrade()
            .map(|inner| EventProvider { inner })
    }

    /// Link (or unlink) the provider that receives bubbled events
    pub fn set_eventing_parent(&self, parent: Option<&EventProvider>) {
        *self.inner.parent.borrow_mut() =
            parent.map_or_else(Weak::new, |p| Rc::downgrade(&p.inner));
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Fire an event and report whether the default action should run
    ///
    /// Without `allow_prevent_default` the result is always `true`.
    pub fn fire_event(
        &self,
        event_type: &str,
        parameters: Option<EventParameters>,
        allow_prevent_default: bool,
        enable_bubbling: bool,
    ) -> bool {
        let result = self.dispatch(event_type, parameters, enable_bubbling);
        !(allow_prevent_default && result.prevent_default)
    }

    /// Fire an event and return the collected listener flags
    pub fn dispatch(
        &self,
        event_type: &str,
        parameters: Option<EventParameters>,
        enable_bubbling: bool,
    ) -> DispatchResult {
        let parameters = Rc::new(parameters.unwrap_or_default());
        let mut result = DispatchResult::default();
        let mut level = Some(self.clone());
        let mut bubble = enable_bubbling;

        while let Some(provider) = level {
            let snapshot = provider.inner.registry.borrow().get(event_type).cloned();
            if let Some(entries) = snapshot {
                trace!(
                    event = event_type,
                    listeners = entries.len(),
                    level = ?provider.id(),
                    "dispatching event"
                );
                let mut event = Event::new(event_type, self.clone(), parameters.clone());
                for entry in &entries {
                    if entry.once && !provider.remove_entry(event_type, entry.id) {
                        continue;
                    }
                    entry.listener.call(&mut event, entry.data.as_ref());
                }
                let outcome = event.outcome();
                result = result.merge(outcome);
                bubble = bubble && !outcome.stop_propagation;
            }
            if !bubble {
                break;
            }
            level = provider.eventing_parent();
        }

        result
    }

    /// Drop every registered listener
    pub fn destroy(&self) {
        self.inner.registry.borrow_mut().clear();
    }
}

impl Default for EventProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventProvider")
            .field("id", &self.inner.id)
            .field("event_types", &self.event_types())
            .finish()
    }
}

fn check_event_type(event_type: &str, operation: &str) -> Result<()> {
    if event_type.is_empty() {
        return Err(Error::invalid_argument(operation, "event type must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn counter() -> (Rc<Cell<u32>>, Listener) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, Listener::new(move |_, _| c.set(c.get() + 1)))
    }

    #[test]
    fn test_attach_and_fire() {
        let provider = EventProvider::new();
        let (count, listener) = counter();
        provider
            .attach_event("press", None, listener, None)
            .unwrap();
        assert!(provider.has_listeners("press"));
        assert!(provider.fire_event("press", None, false, false));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_empty_type_is_rejected() {
        let provider = EventProvider::new();
        let (_, listener) = counter();
        let err = provider
            .attach_event("", None, listener.clone(), None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(provider.detach_event("", &listener, None).is_err());
    }

    #[test]
    fn test_duplicate_registrations_are_kept() {
        let provider = EventProvider::new();
        let (count, listener) = counter();
        provider
            .attach_event("x", None, listener.clone(), None)
            .unwrap();
        provider
            .attach_event("x", None, listener.clone(), None)
            .unwrap();
        provider.fire_event("x", None, false, false);
        assert_eq!(count.get(), 2);

        provider.detach_event("x", &listener, None).unwrap();
        assert_eq!(provider.listener_count("x"), 1);
    }

    #[test]
    fn test_detach_respects_context() {
        let provider = EventProvider::new();
        let (count, listener) = counter();
        let ctx = ListenerContext::new("owner");
        provider
            .attach_event("x", None, listener.clone(), Some(ctx.clone()))
            .unwrap();

        provider.detach_event("x", &listener, None).unwrap();
        assert!(provider.has_listeners("x"));

        provider.detach_event("x", &listener, Some(&ctx)).unwrap();
        assert!(!provider.has_listeners("x"));
        provider.fire_event("x", None, false, false);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_registry_entry_removed_when_empty() {
        let provider = EventProvider::new();
        let (_, listener) = counter();
        provider
            .attach_event("x", None, listener.clone(), None)
            .unwrap();
        provider.detach_event("x", &listener, None).unwrap();
        assert!(provider.event_types().is_empty());
    }

    #[test]
    fn test_listener_data_is_passed() {
        let provider = EventProvider::new();
        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();
        let listener = Listener::new(move |_, data| *s.borrow_mut() = data.cloned());
        provider
            .attach_event("x", Some(Value::from("payload")), listener, None)
            .unwrap();
        provider.fire_event("x", None, false, false);
        assert_eq!(*seen.borrow(), Some(Value::from("payload")));
    }

    #[test]
    fn test_prevent_default_only_reported_when_allowed() {
        let provider = EventProvider::new();
        provider
            .attach_event("x", None, Listener::new(|e, _| e.prevent_default()), None)
            .unwrap();
        assert!(!provider.fire_event("x", None, true, false));
        assert!(provider.fire_event("x", None, false, false));
    }

    #[test]
    fn test_event_handler_change_notifications() {
        let provider = EventProvider::new();
        let changes = Rc::new(RefCell::new(Vec::new()));
        let c = changes.clone();
        provider
            .attach_event(
                EVENT_HANDLER_CHANGE,
                None,
                Listener::new(move |e, _| {
                    let id = e
                        .parameter("EventId")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    let kind = e
                        .parameter("type")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    c.borrow_mut().push(format!("{id}:{kind}"));
                }),
                None,
            )
            .unwrap();

        let (_, listener) = counter();
        provider
            .attach_event("press", None, listener.clone(), None)
            .unwrap();
        provider.detach_event("press", &listener, None).unwrap();

        let changes = changes.borrow();
        assert_eq!(
            changes[changes.len() - 2..],
            ["press:listenerAttached", "press:listenerDetached"]
        );
    }

    #[test]
    fn test_destroy_clears_registry() {
        let provider = EventProvider::new();
        let (count, listener) = counter();
        provider.attach_event("x", None, listener, None).unwrap();
        provider.destroy();
        assert!(!provider.has_listeners("x"));
        provider.fire_event("x", None, false, false);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_source_is_firing_provider() {
        let parent = EventProvider::with_id("parent");
        let child = EventProvider::with_id("child");
        child.set_eventing_parent(Some(&parent));

        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();
        parent
            .attach_event(
                "x",
                None,
                Listener::new(move |e, _| *s.borrow_mut() = e.source().id().map(str::to_string)),
                None,
            )
            .unwrap();
        child.fire_event("x", None, false, true);
        assert_eq!(seen.borrow().as_deref(), Some("child"));
    }
}
