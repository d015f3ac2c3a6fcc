use crate::registry::Registry;
use contact_protocol::{ContactId, ContactRecord};
use std::collections::BTreeSet;

/// The two live predicates, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    checked_tags: BTreeSet<String>,
    search_prefix: String,
}

impl FilterQuery {
    pub fn new<I, S>(checked_tags: I, search_prefix: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            checked_tags: checked_tags.into_iter().map(Into::into).collect(),
            search_prefix: search_prefix.to_lowercase(),
        }
    }

    /// Every checked tag must be on the contact. No checked tags passes all.
    pub fn matches_tags(&self, record: &ContactRecord) -> bool {
        record
            .tags
            .contains_all(self.checked_tags.iter().map(String::as_str))
    }

    /// Case-insensitive literal prefix of the full name. Empty passes all.
    pub fn matches_search(&self, record: &ContactRecord) -> bool {
        self.search_prefix.is_empty()
            || record
                .full_name
                .to_lowercase()
                .starts_with(&self.search_prefix)
    }

    pub fn matches(&self, record: &ContactRecord) -> bool {
        self.matches_tags(record) && self.matches_search(record)
    }

    pub fn is_identity(&self) -> bool {
        self.checked_tags.is_empty() && self.search_prefix.is_empty()
    }
}

/// Ids of contacts passing both the tag and the search predicate.
pub fn visible_contact_ids(
    registry: &Registry,
    checked_tags: &BTreeSet<String>,
    search_prefix: &str,
) -> BTreeSet<ContactId> {
    let query = FilterQuery::new(checked_tags.iter().map(String::as_str), search_prefix);
    filter_ids(registry, &query)
}

pub fn filter_ids(registry: &Registry, query: &FilterQuery) -> BTreeSet<ContactId> {
    registry
        .contacts()
        .filter(|entry| query.matches(&entry.data))
        .map(|entry| entry.data.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contact_protocol::TagSet;

    fn record(name: &str, tags: &str) -> ContactRecord {
        ContactRecord::new(1, name, TagSet::parse(tags))
    }

    #[test]
    fn tag_predicate_is_set_containment() {
        let query = FilterQuery::new(["work", "vip"], "");
        assert!(query.matches(&record("Ann", "vip,work,family")));
        assert!(!query.matches(&record("Bob", "work")));
    }

    #[test]
    fn untagged_contact_fails_any_tag_filter_but_passes_none() {
        let untagged = record("Cara", "");
        assert!(FilterQuery::new(Vec::<String>::new(), "").matches(&untagged));
        assert!(!FilterQuery::new(["work"], "").matches(&untagged));
    }

    #[test]
    fn search_is_case_insensitive_prefix_not_substring() {
        let query = FilterQuery::new(Vec::<String>::new(), "AN");
        assert!(query.matches(&record("ann lee", "")));
        assert!(!query.matches(&record("Joanna", "")));
    }

    #[test]
    fn search_treats_pattern_characters_literally() {
        let query = FilterQuery::new(Vec::<String>::new(), ".*");
        assert!(!query.matches(&record("Ann", "")));
        assert!(query.matches(&record(".*bot", "")));
    }

    #[test]
    fn identity_query() {
        assert!(FilterQuery::default().is_identity());
        assert!(!FilterQuery::new(["x"], "").is_identity());
    }
}
