use crate::error::{EngineError, Result};
use contact_presentation::{ElementHandle, PresentationTree};
use contact_protocol::{ContactId, ContactRecord};
use std::collections::{BTreeMap, BTreeSet};

/// A contact record paired with its rendered element.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactEntry {
    pub data: ContactRecord,
    /// `None` until the binder attaches the rendered element.
    pub handle: Option<ElementHandle>,
}

/// A tag name, every element it renders as, and its filter flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    pub name: String,
    pub handles: Vec<ElementHandle>,
    pub checked: bool,
}

impl TagEntry {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            handles: Vec::new(),
            checked: false,
        }
    }
}

/// The two keyed stores behind the view model.
#[derive(Debug, Default)]
pub struct Registry {
    contacts: BTreeMap<ContactId, ContactEntry>,
    tags: BTreeMap<String, TagEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a contact's data. Returns true when the id was new.
    ///
    /// An existing entry keeps its handle; a new one starts unbound.
    pub fn upsert_contact(&mut self, record: ContactRecord) -> bool {
        match self.contacts.get_mut(&record.id) {
            Some(entry) => {
                entry.data = record;
                false
            }
            None => {
                self.contacts.insert(
                    record.id,
                    ContactEntry {
                        data: record,
                        handle: None,
                    },
                );
                true
            }
        }
    }

    /// Remove a contact and release its element from the tree.
    pub fn delete_contact<T>(&mut self, id: ContactId, tree: &mut T) -> Result<ContactRecord>
    where
        T: PresentationTree + ?Sized,
    {
        let entry = self
            .contacts
            .remove(&id)
            .ok_or(EngineError::ContactNotFound(id))?;

        if let Some(handle) = entry.handle {
            if let Err(err) = tree.remove(handle) {
                log::warn!("Contact {id} element already gone: {err}");
            }
        }
        log::debug!("deleted contact {id}");
        Ok(entry.data)
    }

    /// Idempotent. Returns true when the tag was new.
    pub fn upsert_tag(&mut self, name: &str) -> bool {
        if self.tags.contains_key(name) {
            return false;
        }
        self.tags.insert(name.to_string(), TagEntry::new(name));
        true
    }

    pub fn update_tag_checked(&mut self, name: &str, checked: bool) -> Result<()> {
        let entry = self
            .tags
            .get_mut(name)
            .ok_or_else(|| EngineError::TagNotFound(name.to_string()))?;
        entry.checked = checked;
        Ok(())
    }

    /// True iff there are no contacts.
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn contains_contact(&self, id: ContactId) -> bool {
        self.contacts.contains_key(&id)
    }

    pub fn contact(&self, id: ContactId) -> Option<&ContactEntry> {
        self.contacts.get(&id)
    }

    pub fn require_contact(&self, id: ContactId) -> Result<&ContactEntry> {
        self.contact(id).ok_or(EngineError::ContactNotFound(id))
    }

    pub(crate) fn contact_mut(&mut self, id: ContactId) -> Option<&mut ContactEntry> {
        self.contacts.get_mut(&id)
    }

    pub(crate) fn insert_contact_entry(&mut self, entry: ContactEntry) {
        self.contacts.insert(entry.data.id, entry);
    }

    pub fn contacts(&self) -> impl Iterator<Item = &ContactEntry> {
        self.contacts.values()
    }

    pub fn contact_ids(&self) -> BTreeSet<ContactId> {
        self.contacts.keys().copied().collect()
    }

    pub fn contains_tag(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn tag(&self, name: &str) -> Option<&TagEntry> {
        self.tags.get(name)
    }

    pub(crate) fn tag_mut(&mut self, name: &str) -> Option<&mut TagEntry> {
        self.tags.get_mut(name)
    }

    pub fn tags(&self) -> impl Iterator<Item = &TagEntry> {
        self.tags.values()
    }

    pub fn checked_tags(&self) -> BTreeSet<String> {
        self.tags
            .values()
            .filter(|tag| tag.checked)
            .map(|tag| tag.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contact_presentation::{ElementKey, MemoryTree, Region};
    use contact_protocol::TagSet;
    use pretty_assertions::assert_eq;

    fn record(id: ContactId, name: &str, tags: &str) -> ContactRecord {
        ContactRecord::new(id, name, TagSet::parse(tags))
    }

    #[test]
    fn upsert_replaces_existing_data_in_place() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());
        assert!(registry.upsert_contact(record(1, "Ann", "work")));
        assert!(!registry.upsert_contact(record(1, "Annie", "vip")));

        assert_eq!(registry.len(), 1);
        let entry = registry.contact(1).unwrap();
        assert_eq!(entry.data.full_name, "Annie");
        assert!(entry.handle.is_none());
    }

    #[test]
    fn upsert_keeps_bound_handle() {
        let mut tree = MemoryTree::new();
        let handle = tree.append(Region::Contacts, ElementKey::Contact(1), String::new());
        let mut registry = Registry::new();
        registry.insert_contact_entry(ContactEntry {
            data: record(1, "Ann", ""),
            handle: Some(handle),
        });

        registry.upsert_contact(record(1, "Ann B", ""));
        assert_eq!(registry.contact(1).unwrap().handle, Some(handle));
    }

    #[test]
    fn delete_releases_element_and_slot() {
        let mut tree = MemoryTree::new();
        let handle = tree.append(Region::Contacts, ElementKey::Contact(5), "x".into());
        let mut registry = Registry::new();
        registry.insert_contact_entry(ContactEntry {
            data: record(5, "Eve", ""),
            handle: Some(handle),
        });

        let removed = registry.delete_contact(5, &mut tree).unwrap();
        assert_eq!(removed.id, 5);
        assert!(!registry.contains_contact(5));
        assert!(tree.content(handle).is_none());
    }

    #[test]
    fn delete_unknown_is_not_found() {
        let mut tree = MemoryTree::new();
        let mut registry = Registry::new();
        let err = registry.delete_contact(42, &mut tree).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn tag_upsert_is_idempotent_and_checked_requires_known_tag() {
        let mut registry = Registry::new();
        assert!(registry.upsert_tag("work"));
        registry.update_tag_checked("work", true).unwrap();
        assert!(!registry.upsert_tag("work"));
        assert!(registry.tag("work").unwrap().checked);

        let err = registry.update_tag_checked("vip", true).unwrap_err();
        assert!(matches!(err, EngineError::TagNotFound(name) if name == "vip"));
    }

    #[test]
    fn checked_tags_lists_only_checked() {
        let mut registry = Registry::new();
        for name in ["a", "b", "c"] {
            registry.upsert_tag(name);
        }
        registry.update_tag_checked("a", true).unwrap();
        registry.update_tag_checked("c", true).unwrap();
        registry.update_tag_checked("c", false).unwrap();

        assert_eq!(
            registry.checked_tags().into_iter().collect::<Vec<_>>(),
            vec!["a".to_string()]
        );
    }
}
