//! Event dispatch
//!
//! Per-instance listener registries with attach/detach/fire, "fire once"
//! registrations and optional bubbling to an eventing parent.
//!
//! ## Dispatch protocol
//!
//! 1. The listener list of the current level is copied before any listener
//!    runs; attaching or detaching during dispatch only affects later fires.
//! 2. Every level gets a fresh [`Event`]; listeners may call
//!    [`Event::prevent_default`] and [`Event::stop_propagation`].
//! 3. The flags of each level are folded into a [`DispatchResult`]. Bubbling
//!    continues to the eventing parent unless propagation was stopped.

mod event;
mod listener;
mod provider;

pub use event::{DispatchResult, Event, EventParameters};
pub use listener::{Listener, ListenerContext};
pub use provider::{EventProvider, EVENT_HANDLER_CHANGE};
