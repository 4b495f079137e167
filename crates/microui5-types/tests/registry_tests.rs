//! Type Registry Integration Tests
//!
//! Resolution, defaults, validation and parsing through the public API,
//! including types registered at runtime.

use microui5_types::{DataType, DataTypeKind, TypeError, TypeRegistry};
use serde_json::json;

// ===== Resolution =====

#[test]
fn test_builtin_defaults() {
    let types = TypeRegistry::new();
    let expected = [
        ("any", json!(null)),
        ("string", json!("")),
        ("boolean", json!(false)),
        ("int", json!(0)),
        ("float", json!(0.0)),
        ("object", json!(null)),
        ("sap.ui.core.ID", json!("")),
    ];
    for (name, default) in expected {
        assert_eq!(types.get(name).unwrap().default_value(), &default, "{name}");
    }
}

#[test]
fn test_array_types_are_created_once() {
    let types = TypeRegistry::new();
    let before = types.len();

    let nested = types.resolve("int[][]").unwrap();
    assert_eq!(nested.name(), "int[][]");
    assert_eq!(nested.component_type().unwrap().name(), "int[]");
    assert_eq!(types.len(), before + 2);

    let again = types.resolve("int[][]").unwrap();
    assert!(std::sync::Arc::ptr_eq(&nested, &again));
    assert!(types.resolve("nope[]").is_none());
    assert_eq!(
        types.get("nope").unwrap_err(),
        TypeError::UndefinedType {
            name: "nope".into(),
        }
    );
}

// ===== Validation =====

#[test]
fn test_validation_reports_kind() {
    let types = TypeRegistry::new();
    let int = types.get("int").unwrap();
    assert!(int.is_valid_value(&json!(3)));
    assert!(int.is_valid_value(&json!(3.0)));
    assert_eq!(
        int.validate(&json!("3")).unwrap_err(),
        TypeError::InvalidValue {
            type_name: "int".into(),
            value: "\"3\"".into(),
            actual: "string".into(),
        }
    );

    let sizes = types.get("sap.ui.core.CSSSize[]").unwrap();
    assert!(sizes.is_valid_value(&json!(["10px", "auto", "50%"])));
    assert!(!sizes.is_valid_value(&json!(["10 px"])));
    assert!(sizes.is_valid_value(&json!(null)));
}

#[test]
fn test_id_pattern() {
    let id = TypeRegistry::new().get("sap.ui.core.ID").unwrap();
    for valid in ["", "button1", "__button0", "view--panel.header:0"] {
        assert!(id.is_valid_value(&json!(valid)), "{valid}");
    }
    for invalid in ["1button", "-x", "has space"] {
        assert!(!id.is_valid_value(&json!(invalid)), "{invalid}");
    }
}

// ===== Runtime Registration =====

#[test]
fn test_enum_and_pattern_types() {
    let types = TypeRegistry::new();
    let values = ["Default", "Emphasized", "Reject"];
    let design = types.register_enum("test.ButtonType", values).unwrap();
    assert_eq!(design.default_value(), &json!("Default"));
    let designs = types.get("test.ButtonType[]").unwrap();
    assert!(designs.is_valid_value(&json!(["Reject"])));
    assert!(!design.is_valid_value(&json!("Accept")));

    let pattern = "^#[0-9a-f]{6}$";
    let hex = types.register_pattern("test.Color", pattern).unwrap();
    assert!(hex.is_valid_value(&json!("#00ff00")));
    assert!(matches!(
        types.register_pattern("test.Broken", "("),
        Err(TypeError::InvalidDefinition { .. })
    ));
    assert!(matches!(
        types.register_enum::<_, String>("test.Empty", Vec::new()),
        Err(TypeError::InvalidDefinition { .. })
    ));
}

#[test]
fn test_duplicate_and_derived_types() {
    let types = TypeRegistry::new();
    let int = DataType::primitive("int", DataTypeKind::Int);
    assert_eq!(
        types.register(int).unwrap_err(),
        TypeError::DuplicateType { name: "int".into() }
    );

    let delay = types
        .register_with_default("test.Delay", "int", json!(1000))
        .unwrap();
    assert_eq!(delay.default_value(), &json!(1000));
    assert!(delay.is_valid_value(&json!(5)));

    let invalid_default = types.register_with_default("test.Bad", "int", json!("x"));
    assert!(invalid_default.is_err());
    let missing_base = types.register_with_default("test.Orphan", "missing", json!(1));
    assert!(missing_base.is_err());
}

// ===== Parsing =====

#[test]
fn test_parse_value() {
    let types = TypeRegistry::new();
    let parse = |name: &str, input: &str| types.get(name).unwrap().parse_value(input);

    assert_eq!(parse("int", " 42 ").unwrap(), json!(42));
    assert_eq!(parse("boolean", "").unwrap(), json!(false));
    assert_eq!(parse("float", "2.5").unwrap(), json!(2.5));
    assert_eq!(parse("string[]", "[a, b]").unwrap(), json!(["a", "b"]));
    assert_eq!(parse("int[]", "[]").unwrap(), json!([]));
    assert_eq!(parse("object", r#"{"a":1}"#).unwrap(), json!({ "a": 1 }));

    assert_eq!(
        parse("int", "4.5").unwrap_err(),
        TypeError::Parse {
            type_name: "int".into(),
            input: "4.5".into(),
        }
    );
    assert!(parse("sap.ui.core.CSSSize", "wide").is_err());
}
