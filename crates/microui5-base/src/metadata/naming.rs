//! Naming rules for classes and generated accessors

use once_cell::sync::Lazy;
use regex::Regex;

static PLURAL_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(children|ies|ves|oes|ses|ches|shes|xes|s)$").expect("valid plural pattern")
});

static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z])([A-Z])").expect("valid camel case pattern"));

static UID_UNWANTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^A-Za-z0-9\-_.:])|([0-9]+$)").expect("valid uid token pattern"));

/// Upper-case the first character
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Derive the singular form of a plural feature name
///
/// The suffix is matched case-insensitively and replaced once:
/// `children` → `child`, `ies` → `y`, `ves` → `f`, `oes|ses|ches|shes|xes`
/// lose two characters, a trailing `s` is dropped.
pub fn guess_singular_name(name: &str) -> String {
    let Some(found) = PLURAL_SUFFIX.find(name) else {
        return name.to_string();
    };
    let stem = &name[..found.start()];
    let suffix = found.as_str();
    match suffix.to_ascii_lowercase().as_str() {
        "children" => format!("{stem}{}", &suffix[..suffix.len() - 3]),
        "ies" => format!("{stem}y"),
        "ves" => format!("{stem}f"),
        "oes" | "ses" | "ches" | "shes" | "xes" => {
            format!("{stem}{}", &suffix[..suffix.len() - 2])
        }
        _ => stem.to_string(),
    }
}

/// Library name derived from the leading lower-case namespace segments
///
/// `sap.ui.core.Control` belongs to `sap.ui.core`; a name without a
/// lower-case namespace has no library.
pub fn default_library_name(class_name: &str) -> String {
    let segments: Vec<&str> = class_name.split('.').collect();
    let Some((_, namespace)) = segments.split_last() else {
        return String::new();
    };
    let is_lower = |s: &&str| s.chars().next().is_some_and(|c| c.is_ascii_lowercase());
    namespace
        .iter()
        .skip_while(|s| !is_lower(s))
        .take_while(|s| is_lower(s))
        .copied()
        .collect::<Vec<_>>()
        .join(".")
}

/// Token used for generated ids of a class
///
/// Takes the unqualified class name, keeps the last camel-case word, strips
/// unwanted characters and trailing digits, and lower-cases the rest:
/// `sap.m.ToggleButton` → `button`.
pub fn uid_token(class_name: &str) -> String {
    let simple = class_name.rsplit('.').next().unwrap_or(class_name);
    let spaced = CAMEL_BOUNDARY.replace_all(simple, "$1 $2");
    let last_word = spaced.split(' ').next_back().unwrap_or_default();
    UID_UNWANTED.replace_all(last_word, "").to_lowercase()
}

/// Whether a hand-written method name is hidden from the public method list
pub fn is_private_method_name(name: &str) -> bool {
    name.starts_with('_') || name.starts_with("on") || name == "init" || name == "exit"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("items"), "Items");
        assert_eq!(capitalize("ariaLabelledBy"), "AriaLabelledBy");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_guess_singular_name() {
        assert_eq!(guess_singular_name("items"), "item");
        assert_eq!(guess_singular_name("children"), "child");
        assert_eq!(guess_singular_name("properties"), "property");
        assert_eq!(guess_singular_name("shelves"), "shelf");
        assert_eq!(guess_singular_name("heroes"), "hero");
        assert_eq!(guess_singular_name("classes"), "class");
        assert_eq!(guess_singular_name("matches"), "match");
        assert_eq!(guess_singular_name("dishes"), "dish");
        assert_eq!(guess_singular_name("boxes"), "box");
        assert_eq!(guess_singular_name("content"), "content");
    }

    #[test]
    fn test_guess_singular_name_keeps_case() {
        assert_eq!(guess_singular_name("customItems"), "customItem");
        assert_eq!(guess_singular_name("ITEMS"), "ITEM");
        assert_eq!(guess_singular_name("subChildren"), "subChild");
    }

    #[test]
    fn test_default_library_name() {
        assert_eq!(default_library_name("sap.ui.core.Control"), "sap.ui.core");
        assert_eq!(default_library_name("sap.m.Button"), "sap.m");
        assert_eq!(default_library_name("Button"), "");
        assert_eq!(default_library_name("my.lib.Foo"), "my.lib");
        assert_eq!(default_library_name("Outer.sap.m.Inner.Button"), "sap.m");
        assert_eq!(default_library_name("sap.m.table.Column"), "sap.m.table");
    }

    #[test]
    fn test_uid_token() {
        assert_eq!(uid_token("sap.m.Button"), "button");
        assert_eq!(uid_token("sap.m.ToggleButton"), "button");
        assert_eq!(uid_token("sap.ui.layout.HBox"), "hbox");
        assert_eq!(uid_token("test.Panel2"), "panel");
    }

    #[test]
    fn test_private_method_names() {
        assert!(is_private_method_name("_render"));
        assert!(is_private_method_name("onclick"));
        assert!(is_private_method_name("init"));
        assert!(!is_private_method_name("getText"));
        assert!(!is_private_method_name("initialize"));
    }
}
