//! Event Dispatch Integration Tests
//!
//! Dispatch properties of listener registries:
//! - "once" registrations and detaching before the first fire
//! - snapshot semantics when listeners detach other listeners
//! - bubbling, stopPropagation and preventDefault across levels
//! - listener panics reach the caller

use std::cell::{Cell, RefCell};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use microui5_base::{EventParameters, EventProvider, Listener, Value};

fn counting_listener() -> (Rc<Cell<u32>>, Listener) {
    let count = Rc::new(Cell::new(0));
    let c = count.clone();
    (count, Listener::new(move |_, _| c.set(c.get() + 1)))
}

fn parent_and_child() -> (EventProvider, EventProvider) {
    let parent = EventProvider::with_id("parent");
    let child = EventProvider::with_id("child");
    child.set_eventing_parent(Some(&parent));
    (parent, child)
}

// ===== Once Registrations =====

#[test]
fn test_attach_once_fires_exactly_once() {
    let provider = EventProvider::new();
    let (count, listener) = counting_listener();
    provider
        .attach_event_once("x", None, listener, None)
        .unwrap();

    provider.fire_event("x", None, false, false);
    provider.fire_event("x", None, false, false);

    assert_eq!(count.get(), 1);
    assert!(!provider.has_listeners("x"));
}

#[test]
fn test_detach_once_before_fire() {
    let provider = EventProvider::new();
    let (count, listener) = counting_listener();
    provider
        .attach_event_once("x", None, listener.clone(), None)
        .unwrap();
    provider.detach_event("x", &listener, None).unwrap();

    provider.fire_event("x", None, false, false);
    assert_eq!(count.get(), 0);
}

#[test]
fn test_once_listener_removed_by_earlier_listener_is_skipped() {
    let provider = EventProvider::new();
    let (count, once) = counting_listener();

    let p = provider.clone();
    let o = once.clone();
    let detacher = Listener::new(move |_, _| p.detach_event("x", &o, None).unwrap());
    provider.attach_event("x", None, detacher, None).unwrap();
    provider.attach_event_once("x", None, once, None).unwrap();

    provider.fire_event("x", None, false, false);
    assert_eq!(count.get(), 0);
}

// ===== Snapshot Semantics =====

#[test]
fn test_detached_listener_still_runs_in_current_dispatch() {
    let provider = EventProvider::new();
    let (count, later) = counting_listener();

    let p = provider.clone();
    let l = later.clone();
    let detacher = Listener::new(move |_, _| p.detach_event("x", &l, None).unwrap());
    provider.attach_event("x", None, detacher, None).unwrap();
    provider.attach_event("x", None, later, None).unwrap();

    provider.fire_event("x", None, false, false);
    assert_eq!(count.get(), 1, "snapshot taken before dispatch");

    provider.fire_event("x", None, false, false);
    assert_eq!(count.get(), 1, "detached for later fires");
}

#[test]
fn test_listener_attached_during_dispatch_runs_next_time() {
    let provider = EventProvider::new();
    let (count, added) = counting_listener();

    let p = provider.clone();
    let attacher = Listener::new(move |_, _| {
        if p.listener_count("x") == 1 {
            p.attach_event("x", None, added.clone(), None).unwrap();
        }
    });
    provider.attach_event("x", None, attacher, None).unwrap();

    provider.fire_event("x", None, false, false);
    assert_eq!(count.get(), 0);
    provider.fire_event("x", None, false, false);
    assert_eq!(count.get(), 1);
}

// ===== Bubbling =====

#[test]
fn test_bubbling_reaches_parent() {
    let (parent, child) = parent_and_child();
    let sources = Rc::new(RefCell::new(Vec::new()));
    let s = sources.clone();
    let listener = Listener::new(move |event, _| {
        let id = event.source().id().map(str::to_string);
        s.borrow_mut().push(id);
    });
    parent.attach_event("x", None, listener, None).unwrap();

    child.fire_event("x", None, false, true);
    child.fire_event("x", None, false, false);

    assert_eq!(*sources.borrow(), vec![Some("child".to_string())]);
}

#[test]
fn test_stop_propagation_short_circuits_but_finishes_level() {
    let (parent, child) = parent_and_child();
    let (parent_count, parent_listener) = counting_listener();
    let (sibling_count, sibling) = counting_listener();

    let stopper = Listener::new(|event, _| event.stop_propagation());
    child.attach_event("x", None, stopper, None).unwrap();
    child.attach_event("x", None, sibling, None).unwrap();
    parent
        .attach_event("x", None, parent_listener, None)
        .unwrap();

    child.fire_event("x", None, false, true);

    assert_eq!(sibling_count.get(), 1);
    assert_eq!(parent_count.get(), 0);
}

#[test]
fn test_prevent_default_on_parent_level_is_reported() {
    let (parent, child) = parent_and_child();
    let preventer = Listener::new(|event, _| event.prevent_default());
    parent.attach_event("x", None, preventer, None).unwrap();

    assert!(!child.fire_event("x", None, true, true));
    assert!(child.fire_event("x", None, false, true));
    assert!(child.fire_event("x", None, true, false));

    let result = child.dispatch("x", None, true);
    assert!(result.prevent_default);
    assert!(!result.stop_propagation);
}

#[test]
fn test_each_level_gets_fresh_event_with_shared_parameters() {
    let (parent, child) = parent_and_child();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let s = seen.clone();
    let on_child = Listener::new(move |event, _| {
        event.prevent_default();
        s.borrow_mut().push(event.parameter("key").cloned());
    });
    child.attach_event("x", None, on_child, None).unwrap();
    let s = seen.clone();
    let on_parent = Listener::new(move |event, _| {
        assert!(!event.is_default_prevented());
        s.borrow_mut().push(event.parameter("key").cloned());
    });
    parent.attach_event("x", None, on_parent, None).unwrap();

    let mut params = EventParameters::new();
    params.insert("key".into(), Value::from("value"));
    child.fire_event("x", Some(params), true, true);

    let value = Some(Value::from("value"));
    assert_eq!(*seen.borrow(), vec![value.clone(), value]);
}

// ===== Errors =====

#[test]
fn test_listener_panic_propagates() {
    let provider = EventProvider::new();
    let (count, after) = counting_listener();
    let failing = Listener::new(|_, _| panic!("listener failed"));
    provider.attach_event("x", None, failing, None).unwrap();
    provider.attach_event("x", None, after, None).unwrap();

    let result = catch_unwind(AssertUnwindSafe(|| provider.fire_event("x", None, false, false)));
    assert!(result.is_err());
    assert_eq!(count.get(), 0);
}
