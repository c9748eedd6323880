//! Accessor naming conventions
//!
//! Properties are matched through their accessor names: a destination
//! setter `setName` pairs with a source getter `getName` or `isName`.
//! Known suffixes (by default `DTO` and `BO`) are stripped before
//! comparison so `setBookDTO` pairs with `getBook`.

use crate::types::TypeRef;

/// Default suffixes stripped before comparing accessor names
pub const DEFAULT_SUFFIXES: [&str; 2] = ["DTO", "BO"];

const SETTER_PREFIX: &str = "set";
const GETTER_PREFIX: &str = "get";
const BOOLEAN_GETTER_PREFIX: &str = "is";

/// Default suffixes as owned strings
#[must_use]
pub fn default_suffixes() -> Vec<String> {
    DEFAULT_SUFFIXES.iter().map(ToString::to_string).collect()
}

/// Uppercase the first character of a property name
#[must_use]
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Setter name for a property
#[must_use]
pub fn setter_name(property: &str) -> String {
    format!("{SETTER_PREFIX}{}", capitalize(property))
}

/// Getter name for a property; booleans use the `is` prefix
#[must_use]
pub fn getter_name(property: &str, ty: &TypeRef) -> String {
    let prefix = if ty.is_boolean() {
        BOOLEAN_GETTER_PREFIX
    } else {
        GETTER_PREFIX
    };
    format!("{prefix}{}", capitalize(property))
}

/// Conventional getter names for a setter: the `get` form and the `is` form
///
/// Returns `None` when `setter` is not a setter name.
#[must_use]
pub fn getter_candidates(setter: &str) -> Option<(String, String)> {
    let stem = setter.strip_prefix(SETTER_PREFIX)?;
    if stem.is_empty() {
        return None;
    }
    Some((
        format!("{GETTER_PREFIX}{stem}"),
        format!("{BOOLEAN_GETTER_PREFIX}{stem}"),
    ))
}

/// Strip the first matching known suffix from an accessor name
#[must_use]
pub fn strip_known_suffix<'a, S: AsRef<str>>(name: &'a str, suffixes: &[S]) -> &'a str {
    for suffix in suffixes {
        let suffix = suffix.as_ref();
        if suffix.is_empty() {
            continue;
        }
        if let Some(stripped) = name.strip_suffix(suffix) {
            if !stripped.is_empty() {
                return stripped;
            }
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScalarKind;

    #[test]
    fn test_accessor_names() {
        assert_eq!(setter_name("bookDTO"), "setBookDTO");
        assert_eq!(
            getter_name("name", &TypeRef::Scalar(ScalarKind::String)),
            "getName"
        );
        assert_eq!(
            getter_name("active", &TypeRef::Primitive(ScalarKind::Bool)),
            "isActive"
        );
    }

    #[test]
    fn test_getter_candidates() {
        assert_eq!(
            getter_candidates("setPhoneNumber"),
            Some(("getPhoneNumber".to_string(), "isPhoneNumber".to_string()))
        );
        assert_eq!(getter_candidates("set"), None);
        assert_eq!(getter_candidates("getName"), None);
    }

    #[test]
    fn test_strip_first_matching_suffix() {
        let suffixes = default_suffixes();
        assert_eq!(strip_known_suffix("getBookDTO", &suffixes), "getBook");
        assert_eq!(strip_known_suffix("getEntriesBO", &suffixes), "getEntries");
        assert_eq!(strip_known_suffix("getBook", &suffixes), "getBook");
        assert_eq!(strip_known_suffix("DTO", &suffixes), "DTO");
    }

    #[test]
    fn test_custom_suffixes() {
        let suffixes = ["Entity", "View"];
        assert_eq!(strip_known_suffix("getOwnerEntity", &suffixes), "getOwner");
        assert_eq!(strip_known_suffix("getOwnerDTO", &suffixes), "getOwnerDTO");
    }
}
