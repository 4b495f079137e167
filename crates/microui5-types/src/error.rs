//! Data type errors

use thiserror::Error;

/// Errors raised while defining, resolving or applying data types
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeError {
    /// No type registered under the name
    #[error("Undefined type: {name}")]
    UndefinedType {
        /// Type name that was not found
        name: String,
    },

    /// A type with the same name is already registered
    #[error("Type already defined: {name}")]
    DuplicateType {
        /// Name of the conflicting type
        name: String,
    },

    /// Value is not valid for the type
    #[error("\"{value}\" is of type {actual}, expected {type_name}")]
    InvalidValue {
        /// Name of the expected type
        type_name: String,
        /// Rendered offending value
        value: String,
        /// JSON kind of the offending value
        actual: String,
    },

    /// String could not be parsed into a value of the type
    #[error("Cannot parse \"{input}\" as {type_name}")]
    Parse {
        /// Name of the target type
        type_name: String,
        /// Input text
        input: String,
    },

    /// Malformed type definition
    #[error("Invalid definition of type {name}: {reason}")]
    InvalidDefinition {
        /// Name of the type being defined
        name: String,
        /// Why the definition was rejected
        reason: String,
    },
}
