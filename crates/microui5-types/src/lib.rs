//! microui5 Data Types
//!
//! Runtime type descriptors for managed object properties. Every property
//! declared in a class schema names a type (`"string"`, `"int"`,
//! `"sap.ui.core.ID"`, `"string[]"`, ...); the [`TypeRegistry`] resolves that
//! name to a [`DataType`] which knows its intrinsic default value and how to
//! validate and parse values.

#![warn(missing_docs)]

pub mod data_type;
pub mod error;
pub mod registry;

pub use data_type::{DataType, DataTypeKind};
pub use error::TypeError;
pub use registry::TypeRegistry;
