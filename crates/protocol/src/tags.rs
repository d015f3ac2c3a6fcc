use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// Separator used by the backend for the `tags` column.
pub const TAG_SEPARATOR: char = ',';

/// Set of tag names attached to a contact.
///
/// The backend ships tags as one comma-joined string (`"work,vip"`); this type
/// is the decoded form. Order is not significant and duplicates collapse, so
/// `"vip,work,vip"` and `"work,vip"` decode to the same set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a comma-joined wire string. Blank segments are dropped.
    pub fn parse(raw: &str) -> Self {
        raw.split(TAG_SEPARATOR)
            .filter_map(normalize_tag_name)
            .collect()
    }

    /// Encode back into the wire representation.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (idx, name) in self.0.iter().enumerate() {
            if idx > 0 {
                out.push(TAG_SEPARATOR);
            }
            out.push_str(name);
        }
        out
    }

    /// Returns false when the name normalizes to nothing.
    pub fn insert(&mut self, name: &str) -> bool {
        match normalize_tag_name(name) {
            Some(name) => self.0.insert(name),
            None => false,
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.0.remove(name.trim())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Set containment: every name in `names` is present in `self`.
    /// Vacuously true for an empty `names`.
    pub fn contains_all<'a, I>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().all(|name| self.0.contains(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for TagSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for TagSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().filter_map(normalize_tag_name).collect())
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for TagSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::parse).unwrap_or_default())
    }
}

/// Trim a user- or wire-supplied tag name. `None` for blank input.
pub fn normalize_tag_name(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

/// Validate a tag name typed by the user before it enters the vocabulary.
///
/// A separator inside the name would split into two tags on the next round
/// trip through the backend, so it is rejected rather than silently mangled.
pub fn validate_tag_name(raw: &str) -> Result<String> {
    let Some(name) = normalize_tag_name(raw) else {
        return Err(ProtocolError::InvalidTagName(raw.to_string()));
    };
    if name.contains(TAG_SEPARATOR) {
        return Err(ProtocolError::InvalidTagName(name));
    }
    Ok(name)
}

/// Collect the tag vocabulary of a contact list in first-seen order.
pub fn extract_tag_vocabulary<'a, I>(tag_sets: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a TagSet>,
{
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for tags in tag_sets {
        for name in tags.iter() {
            if seen.insert(name.to_string()) {
                out.push(name.to_string());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn parse_drops_blank_segments_and_duplicates() {
        let tags = TagSet::parse(" work,,vip , work,");
        assert_eq!(tags.len(), 2);
        assert!(tags.contains("work"));
        assert!(tags.contains("vip"));
        assert_eq!(tags.encode(), "vip,work");
    }

    #[test]
    fn empty_string_is_empty_set() {
        assert!(TagSet::parse("").is_empty());
        assert_eq!(TagSet::new().encode(), "");
    }

    #[test]
    fn contains_all_is_vacuous_for_no_names() {
        let tags = TagSet::new();
        assert!(tags.contains_all(std::iter::empty()));
        assert!(!tags.contains_all(["work"]));
    }

    #[test]
    fn deserializes_null_as_empty() {
        let tags: TagSet = serde_json::from_str("null").unwrap();
        assert!(tags.is_empty());
        let tags: TagSet = serde_json::from_str("\"a,b\"").unwrap();
        assert_eq!(tags.encode(), "a,b");
    }

    #[test]
    fn vocabulary_keeps_first_seen_order() {
        let sets = [
            TagSet::parse("work"),
            TagSet::parse("vip,work"),
            TagSet::parse("family"),
        ];
        assert_eq!(
            extract_tag_vocabulary(sets.iter()),
            vec!["work".to_string(), "vip".to_string(), "family".to_string()]
        );
    }

    #[test]
    fn rejects_blank_and_separator_names() {
        assert!(validate_tag_name("  ").is_err());
        assert!(validate_tag_name("a,b").is_err());
        assert_eq!(validate_tag_name(" friends ").unwrap(), "friends");
    }

    proptest! {
        #[test]
        fn proptest_encode_is_order_insensitive(mut names in proptest::collection::vec("[a-z]{1,8}", 0..8)) {
            let forward = names.join(",");
            names.reverse();
            let backward = names.join(",");
            prop_assert_eq!(TagSet::parse(&forward), TagSet::parse(&backward));
        }
    }
}
