//! Special setting entity

use super::decl::{AppData, SpecialSettingDecl};
use super::Visibility;

/// A declared special setting (`id`, `models`, ...)
///
/// Special settings are consumed by object construction and have no
/// generated accessors.
#[derive(Debug)]
pub struct SpecialSettingInfo {
    class_name: String,
    name: String,
    uid: String,
    type_name: String,
    visibility: Visibility,
    deprecated: bool,
    app_data: AppData,
}

impl SpecialSettingInfo {
    pub(crate) fn new(class_name: &str, name: &str, decl: SpecialSettingDecl) -> Self {
        Self {
            class_name: class_name.to_string(),
            name: name.to_string(),
            uid: format!("special:{name}"),
            type_name: decl.type_name,
            visibility: decl.visibility,
            deprecated: decl.deprecated,
            app_data: decl.app_data,
        }
    }

    /// Setting name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique id, `special:<name>`
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Declaring class
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Declared type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Public or hidden
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Deprecation flag
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Unrecognized declaration keys
    pub fn app_data(&self) -> &AppData {
        &self.app_data
    }
}
