//! Metadata of managed classes
//!
//! Builds the schema entities of a class from its declaration, flattens
//! them with the parent's schema, and installs generated accessors as class
//! members.
//!
//! ## Flattening
//!
//! Every category keeps two maps. The `own` map holds what the class itself
//! declares; the `all` map is the parent's `all` map with the own
//! declarations layered on top (own wins). Both are computed once at
//! definition time. Later additions through [`ManagedObjectMetadata::add_property`]
//! and [`ManagedObjectMetadata::add_special_setting`] overwrite the own entry
//! but only fill the flattened view when the name is not taken yet.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use indexmap::IndexMap;
use microui5_types::TypeRegistry;
use parking_lot::RwLock;
use serde_json::Value as JsonValue;
use tracing::debug;

use super::base::Metadata;
use super::members::{Accessor, Member};
use super::naming::uid_token;
use crate::error::{Error, Result};
use crate::schema::{
    AggregationInfo, AssociationInfo, ClassInfo, EventInfo, Feature, ForwardingDecl, PropertyDecl,
    PropertyInfo, SpecialSettingDecl, SpecialSettingInfo, Visibility,
};
use crate::value::Settings;

/// Lookup of settings keys, by name and by unique id
pub type JsonKeys = IndexMap<String, Feature>;

/// Common surface of schema entities used for flattening
trait SchemaEntry {
    fn visibility(&self) -> Visibility;
    fn feature(self: &Arc<Self>) -> Feature;
}

macro_rules! schema_entry {
    ($ty:ty, $variant:ident) => {
        impl SchemaEntry for $ty {
            fn visibility(&self) -> Visibility {
                <$ty>::visibility(self)
            }

            fn feature(self: &Arc<Self>) -> Feature {
                Feature::$variant(self.clone())
            }
        }
    };
}

schema_entry!(PropertyInfo, Property);
schema_entry!(AggregationInfo, Aggregation);
schema_entry!(AssociationInfo, Association);
schema_entry!(EventInfo, Event);
schema_entry!(SpecialSettingInfo, SpecialSetting);

struct Category<T> {
    own: IndexMap<String, Arc<T>>,
    all: IndexMap<String, Arc<T>>,
}

impl<T> Default for Category<T> {
    fn default() -> Self {
        Self {
            own: IndexMap::new(),
            all: IndexMap::new(),
        }
    }
}

impl<T: SchemaEntry> Category<T> {
    fn flatten(&mut self, parent: Option<&Category<T>>) {
        let mut all = parent.map(|p| p.all.clone()).unwrap_or_default();
        for (name, entry) in &self.own {
            all.insert(name.clone(), entry.clone());
        }
        self.all = all;
    }

    fn add(&mut self, name: &str, entry: Arc<T>) {
        self.own.insert(name.to_string(), entry.clone());
        self.all.entry(name.to_string()).or_insert(entry);
    }

    fn public(map: &IndexMap<String, Arc<T>>) -> IndexMap<String, Arc<T>> {
        map.iter()
            .filter(|(_, e)| e.visibility().is_public())
            .map(|(n, e)| (n.clone(), e.clone()))
            .collect()
    }

    fn hidden(map: &IndexMap<String, Arc<T>>) -> IndexMap<String, Arc<T>> {
        map.iter()
            .filter(|(_, e)| !e.visibility().is_public())
            .map(|(n, e)| (n.clone(), e.clone()))
            .collect()
    }

    fn features(map: &IndexMap<String, Arc<T>>) -> Vec<Feature> {
        map.values().map(SchemaEntry::feature).collect()
    }

    fn get_public(&self, name: &str) -> Option<Arc<T>> {
        self.all
            .get(name)
            .filter(|e| e.visibility().is_public())
            .cloned()
    }

    fn get_any(&self, name: &str) -> Option<Arc<T>> {
        self.all.get(name).cloned()
    }
}

#[derive(Default)]
struct Schema {
    properties: Category<PropertyInfo>,
    aggregations: Category<AggregationInfo>,
    associations: Category<AssociationInfo>,
    events: Category<EventInfo>,
    special_settings: Category<SpecialSettingInfo>,
    default_aggregation: Option<String>,
    default_property: Option<String>,
}

#[derive(Default)]
struct Caches {
    json_keys: Option<Arc<JsonKeys>>,
    all_settings: Option<Arc<JsonKeys>>,
    property_defaults: Option<Arc<IndexMap<String, JsonValue>>>,
}

/// Metadata of a class built on `sap.ui.base.ManagedObject`
///
/// Dereferences to the base [`Metadata`] for name, parent chain, members
/// and public methods.
pub struct ManagedObjectMetadata {
    base: Arc<Metadata>,
    parent: Option<Arc<ManagedObjectMetadata>>,
    types: Arc<TypeRegistry>,
    schema: RwLock<Schema>,
    caches: RwLock<Caches>,
}

impl ManagedObjectMetadata {
    /// Define a managed class
    ///
    /// `base_parent` is the reflection data of the parent class;
    /// `managed_parent` is set when the parent is itself a managed class.
    pub(crate) fn define(
        name: &str,
        base_parent: Arc<Metadata>,
        managed_parent: Option<Arc<ManagedObjectMetadata>>,
        info: &ClassInfo,
        types: Arc<TypeRegistry>,
    ) -> Result<Arc<Self>> {
        let base = Arc::new(Metadata::new(name, Some(base_parent), &info.metadata, &info.methods));
        let decl = &info.metadata;

        let mut schema = Schema::default();
        for (prop, d) in &decl.properties {
            let entry = PropertyInfo::new(name, prop, d.clone(), types.clone());
            schema.properties.own.insert(prop.clone(), Arc::new(entry));
        }
        for (agg, d) in &decl.aggregations {
            let entry = AggregationInfo::new(name, agg, d.clone(), types.clone())?;
            schema.aggregations.own.insert(agg.clone(), Arc::new(entry));
        }
        for (assoc, d) in &decl.associations {
            let entry = AssociationInfo::new(name, assoc, d.clone(), types.clone());
            schema
                .associations
                .own
                .insert(assoc.clone(), Arc::new(entry));
        }
        for (event, d) in &decl.events {
            let entry = EventInfo::new(name, event, d.clone());
            schema.events.own.insert(event.clone(), Arc::new(entry));
        }
        for (setting, d) in &decl.special_settings {
            let entry = SpecialSettingInfo::new(name, setting, d.clone());
            schema
                .special_settings
                .own
                .insert(setting.clone(), Arc::new(entry));
        }
        schema.default_aggregation = decl.default_aggregation.clone();
        schema.default_property = decl.default_property.clone();

        let metadata = Self {
            base,
            parent: managed_parent,
            types,
            schema: RwLock::new(schema),
            caches: RwLock::new(Caches::default()),
        };
        metadata.after_apply_settings();
        metadata.generate_accessors();

        debug!(
            class = name,
            parent = ?metadata.parent().map(|p| p.name()),
            properties = metadata.schema.read().properties.own.len(),
            aggregations = metadata.schema.read().aggregations.own.len(),
            "defined managed class"
        );
        Ok(Arc::new(metadata))
    }

    /// Compute the flattened views and inherit the defaults
    fn after_apply_settings(&self) {
        let parent = self.parent.as_ref().map(|p| p.schema.read());
        let mut schema = self.schema.write();
        let p = parent.as_deref();

        schema.properties.flatten(p.map(|p| &p.properties));
        schema.aggregations.flatten(p.map(|p| &p.aggregations));
        schema.associations.flatten(p.map(|p| &p.associations));
        schema.events.flatten(p.map(|p| &p.events));
        schema
            .special_settings
            .flatten(p.map(|p| &p.special_settings));

        if let Some(p) = p {
            if schema.default_aggregation.is_none() {
                schema.default_aggregation = p.default_aggregation.clone();
            }
            if schema.default_property.is_none() {
                schema.default_property = p.default_property.clone();
            }
        }
    }

    /// Install accessors for the own public features
    ///
    /// An accessor is only installed when no member of that name exists on
    /// the class or its ancestors, so hand-written methods win. All names
    /// are listed as public methods either way.
    fn generate_accessors(&self) {
        let features: Vec<Feature> = {
            let schema = self.schema.read();
            let mut features = Category::features(&schema.properties.own);
            features.extend(Category::features(&schema.aggregations.own));
            features.extend(Category::features(&schema.associations.own));
            features.extend(Category::features(&schema.events.own));
            features.retain(|f| f.visibility().is_public());
            features
        };

        let mut names = Vec::new();
        for feature in features {
            let accessors = match &feature {
                Feature::Property(f) => f.accessors().clone(),
                Feature::Aggregation(f) => f.accessors().clone(),
                Feature::Association(f) => f.accessors().clone(),
                Feature::Event(f) => f.accessors().clone(),
                Feature::SpecialSetting(_) => continue,
            };
            for (op, name) in accessors.iter() {
                if !self.base.has_member(name) {
                    let accessor = Accessor::new(feature.clone(), op, name);
                    self.base
                        .add_member(name, Member::Accessor(Arc::new(accessor)));
                }
                names.push(name.to_string());
            }
        }
        self.base.add_public_methods(names);
    }

    /// Base reflection data
    pub fn base(&self) -> &Arc<Metadata> {
        &self.base
    }

    /// Managed parent class, if the parent is a managed class
    pub fn parent(&self) -> Option<&Arc<ManagedObjectMetadata>> {
        self.parent.as_ref()
    }

    /// Type registry used to resolve feature types
    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    /// Token of generated ids for instances of this class
    pub fn uid_token(&self) -> String {
        uid_token(self.name())
    }

    /// Whether `id` was generated for an instance of this class
    pub fn is_generated_id(&self, uid_prefix: &str, id: &str) -> bool {
        crate::object::is_generated_id(&format!("{uid_prefix}{}", self.uid_token()), id)
    }

    fn invalidate(&self) {
        *self.caches.write() = Caches::default();
    }

    // ========================================================================
    // Dynamic additions
    // ========================================================================

    /// Add a property after the class has been defined
    ///
    /// The own entry is always replaced; the flattened view keeps an
    /// existing entry of the same name.
    pub fn add_property(&self, name: &str, decl: PropertyDecl) -> Arc<PropertyInfo> {
        let entry = Arc::new(PropertyInfo::new(self.name(), name, decl, self.types.clone()));
        self.schema.write().properties.add(name, entry.clone());
        self.invalidate();
        entry
    }

    /// Add a special setting after the class has been defined
    pub fn add_special_setting(
        &self,
        name: &str,
        decl: SpecialSettingDecl,
    ) -> Arc<SpecialSettingInfo> {
        let entry = Arc::new(SpecialSettingInfo::new(self.name(), name, decl));
        self.schema
            .write()
            .special_settings
            .add(name, entry.clone());
        self.invalidate();
        entry
    }

    /// Forward a public aggregation to an aggregation of another object
    ///
    /// An aggregation declared by this class is updated in place. An
    /// inherited one is copied into this class first, so ancestors keep
    /// their behavior.
    pub fn forward_aggregation(&self, name: &str, forwarding: ForwardingDecl) -> Result<()> {
        let mut schema = self.schema.write();
        let existing = schema.aggregations.get_public(name).ok_or_else(|| {
            Error::configuration(format!(
                "aggregation {name} does not exist in {} or is not public, cannot forward it",
                self.name()
            ))
        })?;

        if existing.class_name() == self.name() {
            existing.set_forwarding(forwarding)?;
        } else {
            let derived = Arc::new(existing.derive_for(self.name()));
            derived.set_forwarding(forwarding)?;
            schema
                .aggregations
                .own
                .insert(name.to_string(), derived.clone());
            schema.aggregations.all.insert(name.to_string(), derived);
        }
        drop(schema);
        self.invalidate();

        debug!(
            class = self.name(),
            aggregation = name,
            "aggregation forwarded"
        );
        Ok(())
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Public property, own or inherited
    pub fn get_property(&self, name: &str) -> Option<Arc<PropertyInfo>> {
        self.schema.read().properties.get_public(name)
    }

    /// Property including hidden ones
    pub fn get_managed_property(&self, name: &str) -> Option<Arc<PropertyInfo>> {
        self.schema.read().properties.get_any(name)
    }

    /// Whether a public property exists
    pub fn has_property(&self, name: &str) -> bool {
        self.get_property(name).is_some()
    }

    /// Public properties declared by this class
    pub fn get_properties(&self) -> IndexMap<String, Arc<PropertyInfo>> {
        Category::public(&self.schema.read().properties.own)
    }

    /// Public properties of this class and its ancestors
    pub fn get_all_properties(&self) -> IndexMap<String, Arc<PropertyInfo>> {
        Category::public(&self.schema.read().properties.all)
    }

    /// Hidden properties of this class and its ancestors
    pub fn get_all_private_properties(&self) -> IndexMap<String, Arc<PropertyInfo>> {
        Category::hidden(&self.schema.read().properties.all)
    }

    /// Name of the default property
    pub fn get_default_property_name(&self) -> Option<String> {
        self.schema.read().default_property.clone()
    }

    /// The default property
    pub fn get_default_property(&self) -> Option<Arc<PropertyInfo>> {
        self.get_default_property_name()
            .and_then(|n| self.get_property(&n))
    }

    /// Property, or an aggregation that accepts plain values
    pub fn get_property_like_setting(&self, name: &str) -> Option<Feature> {
        let schema = self.schema.read();
        if let Some(prop) = schema.properties.all.get(name) {
            return Some(Feature::Property(prop.clone()));
        }
        schema
            .aggregations
            .all
            .get(name)
            .filter(|agg| !agg.alt_types().is_empty())
            .map(|agg| Feature::Aggregation(agg.clone()))
    }

    /// Default values of all properties, public and hidden
    pub fn get_property_defaults(&self) -> Arc<IndexMap<String, JsonValue>> {
        if let Some(defaults) = &self.caches.read().property_defaults {
            return defaults.clone();
        }
        let mut defaults = self
            .parent
            .as_ref()
            .map(|p| (*p.get_property_defaults()).clone())
            .unwrap_or_default();
        for (name, prop) in &self.schema.read().properties.own {
            defaults.insert(name.clone(), prop.get_default_value());
        }
        let defaults = Arc::new(defaults);
        self.caches.write().property_defaults = Some(defaults.clone());
        defaults
    }

    // ========================================================================
    // Aggregations
    // ========================================================================

    /// Public aggregation, own or inherited
    pub fn get_aggregation(&self, name: &str) -> Option<Arc<AggregationInfo>> {
        self.schema.read().aggregations.get_public(name)
    }

    /// Aggregation including hidden ones
    pub fn get_managed_aggregation(&self, name: &str) -> Option<Arc<AggregationInfo>> {
        self.schema.read().aggregations.get_any(name)
    }

    /// Whether a public aggregation exists
    pub fn has_aggregation(&self, name: &str) -> bool {
        self.get_aggregation(name).is_some()
    }

    /// Public aggregations declared by this class
    pub fn get_aggregations(&self) -> IndexMap<String, Arc<AggregationInfo>> {
        Category::public(&self.schema.read().aggregations.own)
    }

    /// Public aggregations of this class and its ancestors
    pub fn get_all_aggregations(&self) -> IndexMap<String, Arc<AggregationInfo>> {
        Category::public(&self.schema.read().aggregations.all)
    }

    /// Hidden aggregations of this class and its ancestors
    pub fn get_all_private_aggregations(&self) -> IndexMap<String, Arc<AggregationInfo>> {
        Category::hidden(&self.schema.read().aggregations.all)
    }

    /// Name of the default aggregation
    pub fn get_default_aggregation_name(&self) -> Option<String> {
        self.schema.read().default_aggregation.clone()
    }

    /// The default aggregation
    pub fn get_default_aggregation(&self) -> Option<Arc<AggregationInfo>> {
        self.get_default_aggregation_name()
            .and_then(|n| self.get_aggregation(&n))
    }

    /// Forwarding declaration of an aggregation, if it is forwarded
    pub fn get_aggregation_forwarding(&self, name: &str) -> Option<ForwardingDecl> {
        self.get_managed_aggregation(name)
            .and_then(|a| a.forwarding())
    }

    // ========================================================================
    // Associations
    // ========================================================================

    /// Public association, own or inherited
    pub fn get_association(&self, name: &str) -> Option<Arc<AssociationInfo>> {
        self.schema.read().associations.get_public(name)
    }

    /// Association including hidden ones
    pub fn get_managed_association(&self, name: &str) -> Option<Arc<AssociationInfo>> {
        self.schema.read().associations.get_any(name)
    }

    /// Whether a public association exists
    pub fn has_association(&self, name: &str) -> bool {
        self.get_association(name).is_some()
    }

    /// Public associations declared by this class
    pub fn get_associations(&self) -> IndexMap<String, Arc<AssociationInfo>> {
        Category::public(&self.schema.read().associations.own)
    }

    /// Public associations of this class and its ancestors
    pub fn get_all_associations(&self) -> IndexMap<String, Arc<AssociationInfo>> {
        Category::public(&self.schema.read().associations.all)
    }

    /// Hidden associations of this class and its ancestors
    pub fn get_all_private_associations(&self) -> IndexMap<String, Arc<AssociationInfo>> {
        Category::hidden(&self.schema.read().associations.all)
    }

    // ========================================================================
    // Events and special settings
    // ========================================================================

    /// Event, own or inherited
    pub fn get_event(&self, name: &str) -> Option<Arc<EventInfo>> {
        self.schema.read().events.get_any(name)
    }

    /// Whether an event exists
    pub fn has_event(&self, name: &str) -> bool {
        self.get_event(name).is_some()
    }

    /// Events declared by this class
    pub fn get_events(&self) -> IndexMap<String, Arc<EventInfo>> {
        self.schema.read().events.own.clone()
    }

    /// Events of this class and its ancestors
    pub fn get_all_events(&self) -> IndexMap<String, Arc<EventInfo>> {
        self.schema.read().events.all.clone()
    }

    /// Special setting, own or inherited
    pub fn get_special_setting(&self, name: &str) -> Option<Arc<SpecialSettingInfo>> {
        self.schema.read().special_settings.get_any(name)
    }

    /// Whether a special setting exists
    pub fn has_special_setting(&self, name: &str) -> bool {
        self.get_special_setting(name).is_some()
    }

    /// Special settings of this class and its ancestors
    pub fn get_all_special_settings(&self) -> IndexMap<String, Arc<SpecialSettingInfo>> {
        self.schema.read().special_settings.all.clone()
    }

    // ========================================================================
    // Settings lookup
    // ========================================================================

    fn collect_settings(&self, with_uids: bool) -> JsonKeys {
        let schema = self.schema.read();
        let mut candidates = Category::features(&schema.special_settings.all);
        let mut public = Category::features(&schema.properties.all);
        public.extend(Category::features(&schema.aggregations.all));
        public.extend(Category::features(&schema.associations.all));
        public.extend(Category::features(&schema.events.all));
        candidates.extend(public.into_iter().filter(|f| f.visibility().is_public()));

        let mut keys = JsonKeys::new();
        for feature in candidates {
            let replace = keys
                .get(feature.name())
                .map_or(true, |current| feature.kind() < current.kind());
            if replace {
                keys.insert(feature.name().to_string(), feature.clone());
            }
            if with_uids {
                keys.insert(feature.uid().to_string(), feature);
            }
        }
        keys
    }

    /// Settings keys by name and unique id
    ///
    /// On a name collision the feature with the lowest kind rank wins.
    pub fn get_json_keys(&self) -> Arc<JsonKeys> {
        if let Some(keys) = &self.caches.read().json_keys {
            return keys.clone();
        }
        let keys = Arc::new(self.collect_settings(true));
        self.caches.write().json_keys = Some(keys.clone());
        keys
    }

    /// Settings keys by name only
    pub fn get_all_settings(&self) -> Arc<JsonKeys> {
        if let Some(keys) = &self.caches.read().all_settings {
            return keys.clone();
        }
        let keys = Arc::new(self.collect_settings(false));
        self.caches.write().all_settings = Some(keys.clone());
        keys
    }

    /// Drop all entries whose key is not a known setting
    pub fn remove_unknown_settings(&self, settings: Settings) -> Settings {
        let keys = self.get_json_keys();
        settings
            .into_iter()
            .filter(|(key, _)| keys.contains_key(key))
            .collect()
    }
}

impl Deref for ManagedObjectMetadata {
    type Target = Metadata;

    fn deref(&self) -> &Metadata {
        &self.base
    }
}

impl fmt::Debug for ManagedObjectMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedObjectMetadata")
            .field("name", &self.name())
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AggregationDecl, AssociationDecl, EventDecl, MetadataInfo};
    use serde_json::json;

    fn root() -> Arc<Metadata> {
        Arc::new(Metadata::new(
            "sap.ui.base.EventProvider",
            None,
            &MetadataInfo::default(),
            &IndexMap::new(),
        ))
    }

    fn define(
        name: &str,
        parent: Option<&Arc<ManagedObjectMetadata>>,
        metadata: MetadataInfo,
    ) -> Arc<ManagedObjectMetadata> {
        let base = parent.map(|p| p.base().clone()).unwrap_or_else(root);
        ManagedObjectMetadata::define(
            name,
            base,
            parent.cloned(),
            &ClassInfo::new(metadata),
            Arc::new(TypeRegistry::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_flattening_across_three_levels() {
        let a = MetadataInfo::default().property("a", PropertyDecl::new("string"));
        let a = define("test.A", None, a);
        let b = define(
            "test.B",
            Some(&a),
            MetadataInfo::default()
                .property("b", PropertyDecl::new("string"))
                .property("shared", PropertyDecl::new("int")),
        );
        let c = define(
            "test.C",
            Some(&b),
            MetadataInfo::default()
                .property("c", PropertyDecl::new("string"))
                .property("shared", PropertyDecl::new("boolean")),
        );

        let all: Vec<_> = c.get_all_properties().keys().cloned().collect();
        assert_eq!(all, vec!["a", "b", "shared", "c"]);
        assert_eq!(c.get_property("shared").unwrap().type_name(), "boolean");
        assert_eq!(b.get_property("shared").unwrap().type_name(), "int");
        assert_eq!(b.get_properties().len(), 2);
    }

    #[test]
    fn test_accessors_installed_unless_hand_written() {
        let info = ClassInfo::new(
            MetadataInfo::default()
                .property("text", PropertyDecl::new("string"))
                .property("secret", PropertyDecl::new("string").hidden()),
        )
        .with_method("getText", |_, _| Ok(crate::value::Value::from("custom")));
        let types = Arc::new(TypeRegistry::new());
        let meta = ManagedObjectMetadata::define("test.Label", root(), None, &info, types);
        let meta = meta.unwrap();

        assert!(matches!(meta.find_member("getText"), Some(Member::Method(_))));
        assert!(matches!(meta.find_member("setText"), Some(Member::Accessor(_))));
        assert!(!meta.has_member("getSecret"));
        assert!(meta.is_public_method("setText"));
        assert!(meta.get_property("secret").is_none());
        assert!(meta.get_managed_property("secret").is_some());
        assert_eq!(meta.get_all_private_properties().len(), 1);
    }

    #[test]
    fn test_default_aggregation_is_inherited() {
        let base = define(
            "test.Container",
            None,
            MetadataInfo {
                default_aggregation: Some("content".into()),
                ..MetadataInfo::default()
            }
            .aggregation("content", AggregationDecl::multiple("sap.ui.core.Control")),
        );
        let child = define("test.Panel", Some(&base), MetadataInfo::default());
        let name = child.get_default_aggregation_name();
        assert_eq!(name.as_deref(), Some("content"));
        let aggregation = child.get_default_aggregation().unwrap();
        assert_eq!(aggregation.class_name(), "test.Container");
    }

    #[test]
    fn test_add_property_keeps_first_writer_in_flattened_view() {
        let width = MetadataInfo::default().property("width", PropertyDecl::new("string"));
        let base = define("test.Base", None, width);
        let child = define("test.Child", Some(&base), MetadataInfo::default());

        child.add_property("width", PropertyDecl::new("int"));
        let inherited = child.get_property("width").unwrap();
        assert_eq!(inherited.class_name(), "test.Base");
        let own = child.get_properties();
        assert_eq!(own["width"].class_name(), "test.Child");

        child.add_property("height", PropertyDecl::new("int").with_default(json!(10)));
        assert!(child.has_property("height"));
        let defaults = child.get_property_defaults();
        assert_eq!(defaults.get("height"), Some(&json!(10)));
        assert!(child.get_json_keys().contains_key("height"));
    }

    #[test]
    fn test_json_keys_prefer_lowest_rank() {
        let base = define(
            "test.Base",
            None,
            MetadataInfo::default().special_setting("models", SpecialSettingDecl::default()),
        );
        let child = define(
            "test.Child",
            Some(&base),
            MetadataInfo::default()
                .aggregation("models", AggregationDecl::multiple("sap.ui.core.Control"))
                .event("press", EventDecl::default()),
        );

        let keys = child.get_json_keys();
        assert!(matches!(keys.get("models"), Some(Feature::SpecialSetting(_))));
        assert!(matches!(
            keys.get("aggregation:models"),
            Some(Feature::Aggregation(_))
        ));
        assert!(matches!(keys.get("special:models"), Some(Feature::SpecialSetting(_))));
        assert!(keys.contains_key("event:press"));

        let all = child.get_all_settings();
        assert!(matches!(all.get("models"), Some(Feature::SpecialSetting(_))));
        assert!(!all.contains_key("event:press"));
    }

    #[test]
    fn test_remove_unknown_settings() {
        let meta = define(
            "test.Input",
            None,
            MetadataInfo::default()
                .property("value", PropertyDecl::new("string"))
                .association("label", AssociationDecl::single("sap.ui.core.Control")),
        );
        let mut settings = Settings::new();
        settings.insert("value".into(), "x".into());
        settings.insert("bogus".into(), "y".into());
        settings.insert("association:label".into(), "lbl".into());

        let cleaned: Vec<_> = meta.remove_unknown_settings(settings).into_keys().collect();
        assert_eq!(cleaned, vec!["value", "association:label"]);
    }

    #[test]
    fn test_property_like_setting() {
        let tip = AggregationDecl::single("sap.ui.core.TooltipBase").with_alt_types(["string"]);
        let meta = define(
            "test.Tip",
            None,
            MetadataInfo::default()
                .property("text", PropertyDecl::new("string"))
                .aggregation("tooltip", tip)
                .aggregation("content", AggregationDecl::single("sap.ui.core.Control")),
        );
        assert!(matches!(
            meta.get_property_like_setting("text"),
            Some(Feature::Property(_))
        ));
        assert!(matches!(
            meta.get_property_like_setting("tooltip"),
            Some(Feature::Aggregation(_))
        ));
        assert!(meta.get_property_like_setting("content").is_none());
    }

    #[test]
    fn test_forward_unknown_aggregation_fails() {
        let meta = define("test.Composite", None, MetadataInfo::default());
        let err = meta
            .forward_aggregation("items", ForwardingDecl::by_getter("content", "getInner"))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_forward_inherited_aggregation_leaves_ancestor_untouched() {
        let items = AggregationDecl::multiple("sap.ui.core.Control");
        let info = MetadataInfo::default().aggregation("items", items);
        let base = define("test.List", None, info);
        let child = define("test.FancyList", Some(&base), MetadataInfo::default());

        child
            .forward_aggregation("items", ForwardingDecl::by_id_suffix("content", "-inner"))
            .unwrap();
        let items = child.get_aggregation("items").unwrap();
        assert!(items.forwarder().is_some());
        assert_eq!(items.class_name(), "test.FancyList");
        assert!(base.get_aggregation("items").unwrap().forwarder().is_none());

        base.forward_aggregation("items", ForwardingDecl::by_getter("content", "getInner"))
            .unwrap();
        assert!(base.get_aggregation("items").unwrap().forwarder().is_some());
    }

    #[test]
    fn test_uid_token() {
        let meta = define("sap.m.ToggleButton", None, MetadataInfo::default());
        assert_eq!(meta.uid_token(), "button");
    }
}
