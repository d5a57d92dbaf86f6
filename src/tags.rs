//! Tag-type registry and the name-comparison policy.
//!
//! The registry is the set of tag types a photo may be tagged with, plus the
//! subset marked *restricted*: a photo holds at most one tag of a restricted
//! type. Types are append-only; nothing removes one once registered.
//!
//! The registry is an ordinary value owned by the
//! [`Catalog`](crate::catalog::Catalog) for the length of a session and
//! written into every snapshot.
//!
//! ## Case policy
//!
//! Every user-entered name (usernames, album names, tag types, tag values)
//! compares case-insensitively through [`names_match`], and the spelling
//! entered first is the one stored. Registering `place` when `Place` exists
//! fails; tagging with type `place` stores `Place`. Image paths are the one
//! exception and always compare exactly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Tag types registered as unrestricted in a fresh catalog.
pub const DEFAULT_UNRESTRICTED: &[&str] = &["Person", "Item"];

/// Tag types registered as restricted in a fresh catalog.
pub const DEFAULT_RESTRICTED: &[&str] = &["Place"];

/// Case-insensitive equality for user-entered names.
pub fn names_match(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Tag type already exists: {0}")]
pub struct TagTypeExists(pub String);

/// Known tag types and the restricted subset.
///
/// Field names match the snapshot keys (`tag_types`, `restricted_tag_types`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagTypeRegistry {
    #[serde(default)]
    tag_types: BTreeSet<String>,
    #[serde(default)]
    restricted_tag_types: BTreeSet<String>,
}

impl TagTypeRegistry {
    /// The stock registry: `Person` and `Item` unrestricted, `Place` restricted.
    pub fn stock() -> Self {
        Self::from_lists(DEFAULT_UNRESTRICTED, DEFAULT_RESTRICTED)
    }

    /// Build a registry from unrestricted and restricted name lists.
    /// Names repeated across or within the lists are registered once; the
    /// first restricted listing wins.
    pub fn from_lists<U, R>(unrestricted: &[U], restricted: &[R]) -> Self
    where
        U: AsRef<str>,
        R: AsRef<str>,
    {
        let mut registry = Self::default();
        for name in restricted {
            let _ = registry.register(name.as_ref(), true);
        }
        for name in unrestricted {
            let _ = registry.register(name.as_ref(), false);
        }
        registry
    }

    /// Add a tag type. Fails if a type with the same name (ignoring case)
    /// is already known.
    pub fn register(&mut self, name: &str, restricted: bool) -> Result<(), TagTypeExists> {
        if let Some(existing) = self.canonical(name) {
            return Err(TagTypeExists(existing.to_string()));
        }
        self.tag_types.insert(name.to_string());
        if restricted {
            self.restricted_tag_types.insert(name.to_string());
        }
        Ok(())
    }

    /// The stored spelling of a known type.
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.tag_types
            .iter()
            .find(|t| names_match(t, name))
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.canonical(name).is_some()
    }

    pub fn is_restricted(&self, name: &str) -> bool {
        self.restricted_tag_types
            .iter()
            .any(|t| names_match(t, name))
    }

    /// All known types in sorted order.
    pub fn known(&self) -> impl Iterator<Item = &str> {
        self.tag_types.iter().map(String::as_str)
    }

    /// Restricted types in sorted order.
    pub fn restricted(&self) -> impl Iterator<Item = &str> {
        self.restricted_tag_types.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tag_types.is_empty()
    }

    /// Re-establish `restricted ⊆ known` after deserializing a hand-edited
    /// snapshot. Returns the restricted names that were missing from known.
    pub(crate) fn repair(&mut self) -> Vec<String> {
        let missing: Vec<String> = self
            .restricted_tag_types
            .iter()
            .filter(|r| !self.tag_types.iter().any(|t| names_match(t, r)))
            .cloned()
            .collect();
        self.tag_types.extend(missing.iter().cloned());
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_ignores_case() {
        assert!(names_match("Place", "place"));
        assert!(names_match("ÉTÉ", "été"));
        assert!(!names_match("Place", "Places"));
    }

    #[test]
    fn stock_registry_has_defaults() {
        let r = TagTypeRegistry::stock();
        assert_eq!(r.known().collect::<Vec<_>>(), vec!["Item", "Person", "Place"]);
        assert_eq!(r.restricted().collect::<Vec<_>>(), vec!["Place"]);
        assert!(r.is_restricted("place"));
        assert!(!r.is_restricted("Person"));
    }

    #[test]
    fn register_new_type() {
        let mut r = TagTypeRegistry::default();
        r.register("Event", false).unwrap();
        assert!(r.contains("event"));
        assert!(!r.is_restricted("Event"));
    }

    #[test]
    fn register_restricted_type() {
        let mut r = TagTypeRegistry::default();
        r.register("Camera", true).unwrap();
        assert!(r.is_restricted("Camera"));
        assert!(r.contains("Camera"));
    }

    #[test]
    fn register_existing_type_fails_regardless_of_case() {
        let mut r = TagTypeRegistry::stock();
        assert_eq!(
            r.register("PLACE", false),
            Err(TagTypeExists("Place".to_string()))
        );
        assert_eq!(r.known().count(), 3);
    }

    #[test]
    fn canonical_returns_stored_spelling() {
        let r = TagTypeRegistry::stock();
        assert_eq!(r.canonical("person"), Some("Person"));
        assert_eq!(r.canonical("Mood"), None);
    }

    #[test]
    fn from_lists_prefers_restricted_on_overlap() {
        let r = TagTypeRegistry::from_lists(&["Place", "Person"], &["place"]);
        assert!(r.is_restricted("Place"));
        assert_eq!(r.known().count(), 2);
    }

    #[test]
    fn repair_adds_orphan_restricted_types() {
        let mut r: TagTypeRegistry = serde_json::from_str(
            r#"{"tag_types":["Person"],"restricted_tag_types":["Place"]}"#,
        )
        .unwrap();
        assert_eq!(r.repair(), vec!["Place".to_string()]);
        assert!(r.contains("Place"));
        assert!(r.repair().is_empty());
    }
}
