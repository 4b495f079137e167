//! Class metadata
//!
//! [`Metadata`] is the reflection data every class has: name, parent chain,
//! interfaces, public methods and members. [`ManagedObjectMetadata`] adds the
//! declarative schema of managed classes and generates their accessors.

mod base;
mod managed;
mod members;
pub mod naming;

pub use base::Metadata;
pub use managed::{JsonKeys, ManagedObjectMetadata};
pub use members::{Accessor, AccessorOp, Member, Method};
