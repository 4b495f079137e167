//! Managed object instances and the registry of live objects

mod facade;
mod managed;
mod registry;
mod storage;

pub use facade::Interface;
pub use managed::{ApiParentInfo, ManagedObject};
pub use registry::{is_generated_id, ObjectRegistry};
pub use storage::AggregationStorage;
