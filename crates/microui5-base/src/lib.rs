//! microui5 Managed Object System
//!
//! This crate provides the metadata-driven object model:
//! - **Eventing**: per-instance listener registries with bubbling (`eventing`)
//! - **Metadata**: class reflection, schema flattening and accessors (`metadata`)
//! - **Schema**: properties, aggregations, associations, events, settings (`schema`)
//! - **Forwarding**: aggregations whose children live on another object (`forwarder`)
//! - **Objects**: instance state, lifecycle and the live object registry (`object`)
//!
//! # Example
//!
//! ```rust,ignore
//! use microui5_base::{ClassInfo, MetadataInfo, PropertyDecl, Runtime, Settings, Value};
//!
//! let runtime = Runtime::new()?;
//! let schema = MetadataInfo::default().property("text", PropertyDecl::new("string"));
//! let info = ClassInfo::new(schema);
//! runtime.define_class("my.Label", "sap.ui.core.Control", info)?;
//!
//! let label = runtime.create("my.Label", Settings::new())?;
//! label.invoke("setText", &[Value::from("Hello")])?;
//! assert_eq!(label.invoke("getText", &[])?, Value::from("Hello"));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod eventing;
pub mod forwarder;
pub mod metadata;
pub mod object;
pub mod registry;
pub mod runtime;
pub mod schema;
pub mod value;

pub use config::BaseConfig;
pub use error::{Error, Result};
pub use eventing::{
    DispatchResult, Event, EventParameters, EventProvider, Listener, ListenerContext,
};
pub use forwarder::{AggregationForwarder, TargetLocator};
pub use metadata::{ManagedObjectMetadata, Metadata};
pub use object::{AggregationStorage, ApiParentInfo, Interface, ManagedObject, ObjectRegistry};
pub use registry::{ClassRef, ClassRegistry};
pub use runtime::Runtime;
pub use schema::{
    AggregationDecl, AggregationInfo, AssociationDecl, AssociationInfo, BindingInfo, ClassInfo,
    EventDecl, EventInfo, Feature, ForwardingDecl, Kind, MetadataInfo, PropertyDecl, PropertyInfo,
    SpecialSettingDecl, SpecialSettingInfo, Visibility,
};
pub use value::{Settings, Value};

pub use microui5_types::{DataType, TypeError, TypeRegistry};
