//! Built-in classes every runtime starts with

use serde_json::json;

use crate::error::Result;
use crate::registry::ClassRegistry;
use crate::schema::{
    AggregationDecl, AssociationDecl, ClassInfo, MetadataInfo, PropertyDecl, SpecialSettingDecl,
};
use crate::value::Value;

/// Root of all classes
pub const BASE_OBJECT: &str = "sap.ui.base.Object";
/// Classes whose instances carry a listener registry
pub const EVENT_PROVIDER: &str = "sap.ui.base.EventProvider";
/// Root of all managed classes
pub const MANAGED_OBJECT: &str = "sap.ui.base.ManagedObject";
/// Base of UI elements
pub const ELEMENT: &str = "sap.ui.core.Element";
/// Key/value data attached to an element
pub const CUSTOM_DATA: &str = "sap.ui.core.CustomData";
/// Layout hints for the container of an element
pub const LAYOUT_DATA: &str = "sap.ui.core.LayoutData";
/// Base of renderable controls
pub const CONTROL: &str = "sap.ui.core.Control";

/// Define the built-in hierarchy in `classes`
pub fn define_builtin_classes(classes: &ClassRegistry) -> Result<()> {
    classes.define_plain(
        BASE_OBJECT,
        None,
        ClassInfo::new(MetadataInfo::default().abstract_class())
            .with_method("isA", |object, args| {
                let names: Vec<&str> = args.iter().filter_map(Value::as_str).collect();
                Ok(Value::from(object.is_a(&names)))
            }),
    )?;

    classes.define_plain(
        EVENT_PROVIDER,
        Some(BASE_OBJECT),
        ClassInfo::new(MetadataInfo::default().abstract_class())
            .with_method("hasListeners", |object, args| {
                let event_type = args.first().and_then(Value::as_str).unwrap_or_default();
                Ok(Value::from(object.has_listeners(event_type)))
            }),
    )?;

    let object = || SpecialSettingDecl::from("object".to_string());
    let managed = MetadataInfo::default()
        .abstract_class()
        .special_setting("id", SpecialSettingDecl::from("sap.ui.core.ID".to_string()))
        .special_setting("models", object())
        .special_setting("bindingContexts", object())
        .special_setting("objectBindings", object())
        .special_setting("metadataContexts", object());
    classes.define(
        MANAGED_OBJECT,
        EVENT_PROVIDER,
        ClassInfo::new(managed)
            .with_method("getId", |object, _| Ok(Value::from(object.id())))
            .with_method("getParent", |object, _| Ok(object.parent().into()))
            .with_method("destroy", |object, _| {
                object.destroy();
                Ok(Value::Undefined)
            }),
    )?;

    let element = MetadataInfo::default()
        .abstract_class()
        .aggregation(
            "customData",
            AggregationDecl::multiple(CUSTOM_DATA).with_singular_name("customData"),
        )
        .aggregation("dependents", AggregationDecl::multiple(ELEMENT))
        .aggregation("layoutData", AggregationDecl::single(LAYOUT_DATA));
    classes.define(ELEMENT, MANAGED_OBJECT, ClassInfo::new(element))?;

    let custom_data = MetadataInfo::default()
        .property("key", PropertyDecl::new("string"))
        .property("value", PropertyDecl::new("any"))
        .property("writeToDom", PropertyDecl::new("boolean"));
    classes.define(CUSTOM_DATA, ELEMENT, ClassInfo::new(custom_data))?;

    classes.define(
        LAYOUT_DATA,
        ELEMENT,
        ClassInfo::new(MetadataInfo::default().abstract_class()),
    )?;

    let control = MetadataInfo::default()
        .abstract_class()
        .property(
            "visible",
            PropertyDecl::new("boolean").with_default(json!(true)),
        )
        .property("busy", PropertyDecl::new("boolean"))
        .property(
            "busyIndicatorDelay",
            PropertyDecl::new("int").with_default(json!(1000)),
        )
        .property("fieldGroupIds", PropertyDecl::new("string[]"))
        .association("ariaLabelledBy", AssociationDecl::multiple(CONTROL));
    classes.define(CONTROL, ELEMENT, ClassInfo::new(control))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use microui5_types::TypeRegistry;

    use super::*;

    #[test]
    fn test_builtin_hierarchy() {
        let classes = ClassRegistry::new(Arc::new(TypeRegistry::new()));
        define_builtin_classes(&classes).unwrap();

        let hierarchy = classes.hierarchy(CONTROL);
        assert_eq!(hierarchy[..3], [CONTROL, ELEMENT, MANAGED_OBJECT]);
        assert_eq!(hierarchy[3..], [EVENT_PROVIDER, BASE_OBJECT]);
        let control = classes.get_managed(CONTROL).unwrap();
        assert!(control.is_abstract());
        let delay = control.get_property("busyIndicatorDelay").unwrap();
        assert_eq!(delay.get_default_value(), json!(1000));
        assert!(control.get_aggregation("customData").is_some());
        assert!(control.get_special_setting("id").is_some());
        assert!(control.all_public_methods().contains(&"getId".to_string()));
        assert!(!classes.get_managed(CUSTOM_DATA).unwrap().is_abstract());
    }

    #[test]
    fn test_custom_data_accessors() {
        let classes = ClassRegistry::new(Arc::new(TypeRegistry::new()));
        define_builtin_classes(&classes).unwrap();
        let element = classes.get_managed(ELEMENT).unwrap();

        assert!(element.has_member("addCustomData"));
        assert!(element.has_member("removeAllCustomData"));
        assert!(element.has_member("addDependent"));
        assert!(element.has_member("setLayoutData"));
    }
}
