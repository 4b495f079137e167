//! Schema entities
//!
//! One entity per declared feature of a class. Entities are created once at
//! class definition, shared through `Arc`, and know their accessor names and
//! how to read or mutate the feature on a live instance.
//!
//! | Entity                 | UID prefix      | Kind rank |
//! |------------------------|-----------------|-----------|
//! | [`SpecialSettingInfo`] | `special:`      | -1        |
//! | [`PropertyInfo`]       | (none)          | 0         |
//! | [`AggregationInfo`]    | `aggregation:`  | 1 / 2     |
//! | [`AssociationInfo`]    | `association:`  | 3 / 4     |
//! | [`EventInfo`]          | `event:`        | 5         |

mod aggregation;
mod association;
pub mod decl;
mod event;
mod property;
mod special_setting;

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::Result;
use crate::metadata::AccessorOp;
use crate::object::ManagedObject;
use crate::value::Value;

pub use aggregation::AggregationInfo;
pub use association::AssociationInfo;
pub use decl::{
    AggregationDecl, AppData, AssociationDecl, ClassInfo, EventDecl, ForwardingDecl, MetadataInfo,
    PropertyDecl, SpecialSettingDecl, TargetFn,
};
pub use event::EventInfo;
pub use property::{BindingInfo, PropertyInfo};
pub use special_setting::SpecialSettingInfo;

/// Whether a feature gets generated accessors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Part of the generated accessor surface and of serialized settings
    #[default]
    Public,
    /// Reachable only through the generic primitives
    #[serde(alias = "private")]
    Hidden,
}

impl Visibility {
    /// Whether this is [`Visibility::Public`]
    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

/// Feature kind, ordered by rank
///
/// When a name is declared in several categories the lowest rank wins in the
/// combined settings lookup.
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    /// Special setting
    SpecialSetting = -1,
    /// Property
    Property = 0,
    /// 0..1 aggregation
    SingleAggregation = 1,
    /// 0..n aggregation
    MultipleAggregation = 2,
    /// 0..1 association
    SingleAssociation = 3,
    /// 0..n association
    MultipleAssociation = 4,
    /// Event
    Event = 5,
}

impl Kind {
    /// Numeric rank
    pub fn rank(self) -> i8 {
        self as i8
    }
}

/// Any schema entity
#[derive(Clone)]
pub enum Feature {
    /// Special setting
    SpecialSetting(Arc<SpecialSettingInfo>),
    /// Property
    Property(Arc<PropertyInfo>),
    /// Aggregation
    Aggregation(Arc<AggregationInfo>),
    /// Association
    Association(Arc<AssociationInfo>),
    /// Event
    Event(Arc<EventInfo>),
}

impl Feature {
    /// Feature name
    pub fn name(&self) -> &str {
        match self {
            Feature::SpecialSetting(f) => f.name(),
            Feature::Property(f) => f.name(),
            Feature::Aggregation(f) => f.name(),
            Feature::Association(f) => f.name(),
            Feature::Event(f) => f.name(),
        }
    }

    /// Unique id across all categories of a class
    pub fn uid(&self) -> &str {
        match self {
            Feature::SpecialSetting(f) => f.uid(),
            Feature::Property(f) => f.uid(),
            Feature::Aggregation(f) => f.uid(),
            Feature::Association(f) => f.uid(),
            Feature::Event(f) => f.uid(),
        }
    }

    /// Kind and rank
    pub fn kind(&self) -> Kind {
        match self {
            Feature::SpecialSetting(_) => Kind::SpecialSetting,
            Feature::Property(_) => Kind::Property,
            Feature::Aggregation(f) => f.kind(),
            Feature::Association(f) => f.kind(),
            Feature::Event(_) => Kind::Event,
        }
    }

    /// Public or hidden
    pub fn visibility(&self) -> Visibility {
        match self {
            Feature::SpecialSetting(f) => f.visibility(),
            Feature::Property(f) => f.visibility(),
            Feature::Aggregation(f) => f.visibility(),
            Feature::Association(f) => f.visibility(),
            Feature::Event(f) => f.visibility(),
        }
    }

    /// Deprecation flag
    pub fn is_deprecated(&self) -> bool {
        match self {
            Feature::SpecialSetting(f) => f.is_deprecated(),
            Feature::Property(f) => f.is_deprecated(),
            Feature::Aggregation(f) => f.is_deprecated(),
            Feature::Association(f) => f.is_deprecated(),
            Feature::Event(f) => f.is_deprecated(),
        }
    }

    /// Name of the class that declared the feature
    pub fn class_name(&self) -> &str {
        match self {
            Feature::SpecialSetting(f) => f.class_name(),
            Feature::Property(f) => f.class_name(),
            Feature::Aggregation(f) => f.class_name(),
            Feature::Association(f) => f.class_name(),
            Feature::Event(f) => f.class_name(),
        }
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Feature) -> bool {
        match (self, other) {
            (Feature::SpecialSetting(a), Feature::SpecialSetting(b)) => Arc::ptr_eq(a, b),
            (Feature::Property(a), Feature::Property(b)) => Arc::ptr_eq(a, b),
            (Feature::Aggregation(a), Feature::Aggregation(b)) => Arc::ptr_eq(a, b),
            (Feature::Association(a), Feature::Association(b)) => Arc::ptr_eq(a, b),
            (Feature::Event(a), Feature::Event(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Generated accessor names of one feature, in generation order
#[derive(Debug, Clone, Default)]
pub struct AccessorNames(Vec<(AccessorOp, String)>);

impl AccessorNames {
    pub(crate) fn push(&mut self, op: AccessorOp, name: String) {
        self.0.push((op, name));
    }

    /// Name of the accessor for an operation
    pub fn get(&self, op: AccessorOp) -> Option<&str> {
        self.0
            .iter()
            .find(|(o, _)| *o == op)
            .map(|(_, name)| name.as_str())
    }

    /// All accessors
    pub fn iter(&self) -> impl Iterator<Item = (AccessorOp, &str)> {
        self.0.iter().map(|(op, name)| (*op, name.as_str()))
    }

    /// Number of accessors
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no accessors
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Run the named accessor of a public feature, or the generic primitive
///
/// Public features go through the instance's named accessor so overrides
/// are honored; hidden features and features without an installed
/// accessor use `fallback`.
pub(crate) fn delegate(
    visibility: Visibility,
    accessors: &AccessorNames,
    op: AccessorOp,
    instance: &ManagedObject,
    args: &[Value],
    fallback: impl FnOnce() -> Result<Value>,
) -> Result<Value> {
    if visibility.is_public() {
        if let Some(name) = accessors.get(op) {
            if instance.has_method(name) {
                return instance.invoke(name, args);
            }
        }
    }
    fallback()
}

impl fmt::Debug for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (class, name) = (self.class_name(), self.name());
        write!(f, "{:?}({class}.{name})", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_rank_order() {
        let mut kinds = vec![
            Kind::Event,
            Kind::MultipleAssociation,
            Kind::Property,
            Kind::SpecialSetting,
            Kind::SingleAggregation,
        ];
        kinds.sort();
        assert_eq!(
            kinds,
            vec![
                Kind::SpecialSetting,
                Kind::Property,
                Kind::SingleAggregation,
                Kind::MultipleAssociation,
                Kind::Event,
            ]
        );
        assert_eq!(Kind::SpecialSetting.rank(), -1);
        assert_eq!(Kind::Event.rank(), 5);
    }

    #[test]
    fn test_visibility_default_is_public() {
        assert!(Visibility::default().is_public());
        assert!(!Visibility::Hidden.is_public());
    }
}
