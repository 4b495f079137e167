//! Error types for the managed object system

use microui5_types::TypeError;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by class definition, instance mutation and event registration
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// Malformed call, e.g. attaching a listener for an empty event type
    #[error("Invalid argument for {operation}: {reason}")]
    InvalidArgument {
        /// Operation that was called
        operation: String,
        /// What was wrong with the arguments
        reason: String,
    },

    /// Malformed or conflicting schema or forwarding declaration
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the problem
        message: String,
    },

    /// A second live object was registered under an existing id
    #[error("Error: adding element with duplicate id '{id}'")]
    DuplicateRegistration {
        /// The conflicting id
        id: String,
    },

    /// Write access to a feature that the class schema does not declare
    #[error("{class}: unknown {category} '{name}'")]
    UnknownFeature {
        /// Class that was searched
        class: String,
        /// Feature category (property, aggregation, ...)
        category: String,
        /// Requested feature name
        name: String,
    },

    /// Class name not present in the class registry
    #[error("Unknown class: {name}")]
    UnknownClass {
        /// Requested class name
        name: String,
    },

    /// Neither a hand-written method nor a generated accessor exists
    #[error("{class} has no method '{method}'")]
    UnknownMethod {
        /// Class of the receiver
        class: String,
        /// Requested method name
        method: String,
    },

    /// Method exists but is not exposed through the public interface
    #[error("Method '{method}' is not part of the public interface of {class}")]
    NotPublic {
        /// Class of the receiver
        class: String,
        /// Requested method name
        method: String,
    },

    /// Attempt to instantiate an abstract class
    #[error("Cannot instantiate abstract class {name}")]
    AbstractClass {
        /// Name of the abstract class
        name: String,
    },

    /// Value or child rejected by a feature
    #[error("Invalid value for {target}: {reason}")]
    InvalidValue {
        /// Qualified feature name
        target: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Operation on an object that has already been destroyed
    #[error("Object '{id}' has been destroyed")]
    Destroyed {
        /// Id of the destroyed object
        id: String,
    },

    /// Data type error
    #[error(transparent)]
    Type(#[from] TypeError),
}

impl Error {
    /// Shorthand for [`Error::Configuration`]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::InvalidArgument`]
    pub fn invalid_argument(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`Error::InvalidValue`]
    pub fn invalid_value(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidValue {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`Error::UnknownClass`]
    pub fn unknown_class(name: impl Into<String>) -> Self {
        Error::UnknownClass { name: name.into() }
    }

    /// Shorthand for [`Error::AbstractClass`]
    pub fn abstract_class(name: impl Into<String>) -> Self {
        Error::AbstractClass { name: name.into() }
    }

    /// Shorthand for [`Error::UnknownFeature`]
    pub fn unknown_feature(class: &str, category: &str, name: &str) -> Self {
        Error::UnknownFeature {
            class: class.to_string(),
            category: category.to_string(),
            name: name.to_string(),
        }
    }
}
