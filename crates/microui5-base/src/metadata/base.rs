//! Base class reflection

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use rustc_hash::FxHashSet;

use super::members::{Member, Method};
use super::naming::{default_library_name, is_private_method_name};
use crate::schema::MetadataInfo;

/// Reflection data of one class
///
/// Created once when the class is defined and shared for the lifetime of the
/// runtime. The parent chain is fixed at construction.
pub struct Metadata {
    name: String,
    parent: Option<Arc<Metadata>>,
    library: String,
    is_abstract: bool,
    is_final: bool,
    deprecated: bool,
    stereotype: String,
    interfaces: Vec<String>,
    public_methods: RwLock<Vec<String>>,
    all_public_methods: RwLock<Vec<String>>,
    implemented_types: OnceCell<FxHashSet<String>>,
    members: RwLock<IndexMap<String, Member>>,
}

impl Metadata {
    /// Reflection data for `name` below `parent`
    ///
    /// Hand-written methods become members; those not named like private
    /// helpers or lifecycle hooks are also listed as public methods.
    pub fn new(
        name: &str,
        parent: Option<Arc<Metadata>>,
        info: &MetadataInfo,
        methods: &IndexMap<String, Method>,
    ) -> Self {
        let mut public_methods: Vec<String> = Vec::new();
        let candidates = info
            .public_methods
            .iter()
            .chain(methods.keys().filter(|name| !is_private_method_name(name)));
        for method in candidates {
            if !public_methods.contains(method) {
                public_methods.push(method.clone());
            }
        }

        let mut all_public_methods = parent
            .as_ref()
            .map(|p| p.all_public_methods())
            .unwrap_or_default();
        for method in &public_methods {
            if !all_public_methods.contains(method) {
                all_public_methods.push(method.clone());
            }
        }

        let stereotype = info
            .stereotype
            .clone()
            .or_else(|| parent.as_ref().map(|p| p.stereotype.clone()))
            .unwrap_or_else(|| "object".to_string());
        let library = info
            .library
            .clone()
            .unwrap_or_else(|| default_library_name(name));

        let members = methods
            .iter()
            .map(|(name, method)| (name.clone(), Member::Method(method.clone())))
            .collect();

        Self {
            name: name.to_string(),
            library,
            parent,
            is_abstract: info.is_abstract,
            is_final: info.is_final,
            deprecated: info.deprecated,
            stereotype,
            interfaces: info.interfaces.clone(),
            public_methods: RwLock::new(public_methods),
            all_public_methods: RwLock::new(all_public_methods),
            implemented_types: OnceCell::new(),
            members: RwLock::new(members),
        }
    }

    /// Fully qualified class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent class
    pub fn parent(&self) -> Option<&Arc<Metadata>> {
        self.parent.as_ref()
    }

    /// Library the class belongs to
    pub fn library_name(&self) -> &str {
        &self.library
    }

    /// Whether the class cannot be instantiated
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Whether the class cannot be extended
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Whether the class is deprecated
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Stereotype, inherited from the parent when not declared
    pub fn stereotype(&self) -> &str {
        &self.stereotype
    }

    /// Interfaces declared by this class
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Public methods declared by this class
    pub fn public_methods(&self) -> Vec<String> {
        self.public_methods.read().clone()
    }

    /// Public methods of this class and all ancestors
    pub fn all_public_methods(&self) -> Vec<String> {
        self.all_public_methods.read().clone()
    }

    /// Whether `method` is part of the public interface
    pub fn is_public_method(&self, method: &str) -> bool {
        self.all_public_methods.read().iter().any(|m| m == method)
    }

    /// Append public methods to the own and the flattened list
    pub fn add_public_methods<I, S>(&self, methods: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut own = self.public_methods.write();
        let mut all = self.all_public_methods.write();
        for method in methods {
            let method = method.into();
            if !own.contains(&method) {
                own.push(method.clone());
            }
            if !all.contains(&method) {
                all.push(method);
            }
        }
    }

    /// Whether the interface is declared by this class or an ancestor
    pub fn is_instance_of(&self, interface: &str) -> bool {
        let mut current = Some(self);
        while let Some(metadata) = current {
            if metadata.interfaces.iter().any(|i| i == interface) {
                return true;
            }
            current = metadata.parent.as_deref();
        }
        false
    }

    fn implemented_types(&self) -> &FxHashSet<String> {
        self.implemented_types.get_or_init(|| {
            let mut types = self
                .parent
                .as_ref()
                .map(|p| p.implemented_types().clone())
                .unwrap_or_default();
            types.insert(self.name.clone());
            types.extend(self.interfaces.iter().cloned());
            types
        })
    }

    /// Whether the class is, extends or implements any of `type_names`
    pub fn is_a(&self, type_names: &[&str]) -> bool {
        let types = self.implemented_types();
        type_names.iter().any(|name| types.contains(*name))
    }

    /// Names of the class and all its ancestors, nearest first
    pub fn ancestry(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut current = Some(self);
        while let Some(metadata) = current {
            names.push(metadata.name.clone());
            current = metadata.parent.as_deref();
        }
        names
    }

    // ========================================================================
    // Members
    // ========================================================================

    /// Whether this class or an ancestor has a member called `name`
    pub fn has_member(&self, name: &str) -> bool {
        self.find_member(name).is_some()
    }

    /// Resolve a member by name, nearest class first
    pub fn find_member(&self, name: &str) -> Option<Member> {
        let mut current = Some(self);
        while let Some(metadata) = current {
            if let Some(member) = metadata.members.read().get(name) {
                return Some(member.clone());
            }
            current = metadata.parent.as_deref();
        }
        None
    }

    /// Names of the members defined on this class itself
    pub fn own_member_names(&self) -> Vec<String> {
        self.members.read().keys().cloned().collect()
    }

    pub(crate) fn add_member(&self, name: &str, member: Member) {
        self.members.write().insert(name.to_string(), member);
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metadata")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("abstract", &self.is_abstract)
            .field("final", &self.is_final)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::object::ManagedObject;
    use crate::value::Value;

    fn noop() -> Method {
        Arc::new(|_: &ManagedObject, _: &[Value]| -> Result<Value> { Ok(Value::Undefined) })
    }

    fn define(name: &str, parent: Option<Arc<Metadata>>, info: MetadataInfo) -> Arc<Metadata> {
        Arc::new(Metadata::new(name, parent, &info, &IndexMap::new()))
    }

    #[test]
    fn test_is_instance_of_walks_chain() {
        let base = define(
            "test.Base",
            None,
            MetadataInfo {
                interfaces: vec!["test.IFormContent".into()],
                ..MetadataInfo::default()
            },
        );
        let child = define("test.Child", Some(base.clone()), MetadataInfo::default());
        assert!(child.is_instance_of("test.IFormContent"));
        assert!(!child.is_instance_of("test.IOther"));
        assert!(child.is_a(&["test.Base"]));
        assert!(child.is_a(&["nope", "test.IFormContent"]));
        assert!(!base.is_a(&["test.Child"]));
        assert_eq!(child.ancestry(), vec!["test.Child", "test.Base"]);
    }

    #[test]
    fn test_public_methods() {
        let mut methods: IndexMap<String, Method> = IndexMap::new();
        methods.insert("doIt".into(), noop());
        methods.insert("_helper".into(), noop());
        methods.insert("onBeforeRendering".into(), noop());
        methods.insert("init".into(), noop());

        let base = define(
            "test.Base",
            None,
            MetadataInfo {
                public_methods: vec!["open".into()],
                ..MetadataInfo::default()
            },
        );
        let info = MetadataInfo::default();
        let child = Arc::new(Metadata::new("test.Child", Some(base), &info, &methods));

        assert_eq!(child.public_methods(), vec!["doIt"]);
        assert_eq!(child.all_public_methods(), vec!["open", "doIt"]);
        assert!(child.has_member("_helper"));
        assert!(!child.has_member("open"));

        child.add_public_methods(["close", "close"]);
        assert_eq!(child.all_public_methods(), vec!["open", "doIt", "close"]);
        assert!(child.is_public_method("close"));
    }

    #[test]
    fn test_stereotype_and_library() {
        let base = define(
            "sap.m.Base",
            None,
            MetadataInfo {
                stereotype: Some("control".into()),
                ..MetadataInfo::default()
            },
        );
        let child = define("sap.m.Button", Some(base), MetadataInfo::default());
        assert_eq!(child.stereotype(), "control");
        assert_eq!(child.library_name(), "sap.m");
        let plain = define("Plain", None, MetadataInfo::default());
        assert_eq!(plain.stereotype(), "object");
    }
}
