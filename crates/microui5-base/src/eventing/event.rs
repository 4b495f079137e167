//! Event objects handed to listeners

use std::rc::Rc;

use indexmap::IndexMap;

use super::EventProvider;
use crate::value::Value;

/// Named event parameters
pub type EventParameters = IndexMap<String, Value>;

/// Flags collected while dispatching one event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchResult {
    /// Some listener asked to suppress the default action
    pub prevent_default: bool,
    /// Some listener asked to stop bubbling
    pub stop_propagation: bool,
}

impl DispatchResult {
    /// Fold the outcome of a further dispatch level into this one
    pub fn merge(self, level: DispatchResult) -> Self {
        Self {
            prevent_default: self.prevent_default || level.prevent_default,
            stop_propagation: self.stop_propagation || level.stop_propagation,
        }
    }
}

/// The event passed to every listener of one dispatch level
#[derive(Debug)]
pub struct Event {
    event_type: String,
    source: EventProvider,
    parameters: Rc<EventParameters>,
    prevent_default: bool,
    stop_propagation: bool,
}

impl Event {
    pub(crate) fn new(
        event_type: &str,
        source: EventProvider,
        parameters: Rc<EventParameters>,
    ) -> Self {
        Self {
            event_type: event_type.to_string(),
            source,
            parameters,
            prevent_default: false,
            stop_propagation: false,
        }
    }

    /// Event type name
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Provider on which the event was fired (not the bubbling level)
    pub fn source(&self) -> &EventProvider {
        &self.source
    }

    /// All parameters
    pub fn parameters(&self) -> &EventParameters {
        &self.parameters
    }

    /// A single parameter
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Ask the firing code to skip its default action
    pub fn prevent_default(&mut self) {
        self.prevent_default = true;
    }

    /// Keep the event from bubbling to further eventing parents
    ///
    /// Remaining listeners of the current level still run.
    pub fn stop_propagation(&mut self) {
        self.stop_propagation = true;
    }

    /// Whether [`prevent_default`](Self::prevent_default) was called
    pub fn is_default_prevented(&self) -> bool {
        self.prevent_default
    }

    /// Whether [`stop_propagation`](Self::stop_propagation) was called
    pub fn is_propagation_stopped(&self) -> bool {
        self.stop_propagation
    }

    pub(crate) fn outcome(&self) -> DispatchResult {
        DispatchResult {
            prevent_default: self.prevent_default,
            stop_propagation: self.stop_propagation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_prevent_default() {
        let first = DispatchResult {
            prevent_default: true,
            stop_propagation: false,
        };
        let merged = first.merge(DispatchResult::default());
        assert!(merged.prevent_default);
        assert!(!merged.stop_propagation);
    }

    #[test]
    fn test_event_flags() {
        let mut params = EventParameters::new();
        params.insert("value".to_string(), Value::from("x"));
        let mut event = Event::new("change", EventProvider::new(), Rc::new(params));
        assert_eq!(event.event_type(), "change");
        assert_eq!(event.parameter("value"), Some(&Value::from("x")));
        assert_eq!(event.outcome(), DispatchResult::default());

        event.stop_propagation();
        assert!(event.is_propagation_stopped());
        assert!(!event.is_default_prevented());
    }
}
