use crate::binder;
use crate::error::{EngineError, Result};
use crate::filter::{self, FilterQuery};
use crate::registry::Registry;
use crate::visibility;
use contact_presentation::{
    ElementHandle, ElementKey, PresentationTree, Region, Renderer, Visibility, CONTACT_TEMPLATE,
    TAG_TEMPLATE,
};
use contact_protocol::{ContactId, ContactRecord};
use serde_json::json;
use std::collections::BTreeSet;

/// Tag elements render into both the filter panel and the contact form.
const TAG_REGIONS: [Region; 2] = [Region::TagFilter, Region::TagForm];

/// UI state for the contact list: registries, the search string, and the
/// renderer used to draw entries.
///
/// Every method is synchronous and runs to completion. The presentation tree
/// is borrowed per call; the view model never owns it.
pub struct ViewModel<R> {
    registry: Registry,
    renderer: R,
    search: String,
}

impl<R: Renderer> ViewModel<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            registry: Registry::new(),
            renderer,
            search: String::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Stored lower-cased.
    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_lowercase();
    }

    pub fn contact(&self, id: ContactId) -> Result<&ContactRecord> {
        Ok(&self.registry.require_contact(id)?.data)
    }

    // ==================== CONTACTS ====================

    /// Render `record` and append it to the contact list. Registry untouched.
    pub fn insert_contact_element<T>(
        &self,
        tree: &mut T,
        record: &ContactRecord,
    ) -> Result<ElementHandle>
    where
        T: PresentationTree + ?Sized,
    {
        let markup = self
            .renderer
            .render(CONTACT_TEMPLATE, &record.to_template_data())?;
        Ok(tree.append(Region::Contacts, ElementKey::Contact(record.id), markup))
    }

    /// Initial load: render each record and bind it through lookup. A repeated
    /// id updates the entry already seeded; the later record wins.
    pub fn seed_contacts<T>(&mut self, tree: &mut T, records: Vec<ContactRecord>) -> Result<()>
    where
        T: PresentationTree + ?Sized,
    {
        for record in records {
            if self.registry.contains_contact(record.id) {
                log::warn!(
                    "Duplicate contact id {} in fetched list, keeping the later record",
                    record.id
                );
                self.update_contact(tree, record)?;
                continue;
            }
            self.insert_contact_element(tree, &record)?;
            binder::bind_contact(&mut self.registry, record, &*tree)?;
        }
        log::info!("Seeded {} contacts", self.registry.len());
        Ok(())
    }

    /// A contact the backend just created: render, register and bind it.
    pub fn add_contact<T>(&mut self, tree: &mut T, record: ContactRecord) -> Result<ElementHandle>
    where
        T: PresentationTree + ?Sized,
    {
        if self.registry.contains_contact(record.id) {
            log::warn!("Contact {} already present, updating instead", record.id);
            let id = record.id;
            self.update_contact(tree, record)?;
            return self
                .registry
                .require_contact(id)?
                .handle
                .ok_or(EngineError::Unbound(id));
        }
        let handle = self.insert_contact_element(tree, &record)?;
        Ok(binder::bind_contact_handle(&mut self.registry, record, handle))
    }

    /// Replace an accepted record and re-render its element in place.
    pub fn update_contact<T>(&mut self, tree: &mut T, record: ContactRecord) -> Result<()>
    where
        T: PresentationTree + ?Sized,
    {
        let id = record.id;
        if !self.registry.contains_contact(id) {
            return Err(EngineError::ContactNotFound(id));
        }
        self.registry.upsert_contact(record);
        binder::refresh_contact_content(&self.registry, id, tree, &self.renderer)
    }

    pub fn delete_contact<T>(&mut self, tree: &mut T, id: ContactId) -> Result<ContactRecord>
    where
        T: PresentationTree + ?Sized,
    {
        self.registry.delete_contact(id, tree)
    }

    /// Show the "no contacts" placeholder iff the registry is empty.
    pub fn display_or_hide_no_contacts<T>(&self, tree: &mut T)
    where
        T: PresentationTree + ?Sized,
    {
        let visibility = Visibility::from_shown(self.registry.is_empty());
        tree.set_region_visibility(Region::NoContacts, visibility);
    }

    // ==================== TAGS ====================

    /// Render `name` into every tag region and bind it. Known tags are left
    /// alone. Returns true when the tag was new.
    pub fn insert_tag<T>(&mut self, tree: &mut T, name: &str) -> Result<bool>
    where
        T: PresentationTree + ?Sized,
    {
        if self.registry.contains_tag(name) {
            return Ok(false);
        }
        let markup = self.renderer.render(TAG_TEMPLATE, &json!({ "name": name }))?;
        for region in TAG_REGIONS {
            tree.append(region, ElementKey::Tag(name.to_string()), markup.clone());
        }
        let handles = binder::bind_tag(&mut self.registry, name, &*tree);
        log::debug!("tag '{name}' bound to {handles} elements");
        Ok(true)
    }

    /// Initial load of the tag vocabulary.
    pub fn seed_tags<T, S>(&mut self, tree: &mut T, names: &[S]) -> Result<usize>
    where
        T: PresentationTree + ?Sized,
        S: AsRef<str>,
    {
        let mut added = 0;
        for name in names {
            if self.insert_tag(tree, name.as_ref())? {
                added += 1;
            }
        }
        log::info!("Seeded {added} tags");
        Ok(added)
    }

    /// Add any tag names of `record` not yet in the vocabulary.
    pub fn register_tags_of<T>(&mut self, tree: &mut T, record: &ContactRecord) -> Result<usize>
    where
        T: PresentationTree + ?Sized,
    {
        let names: Vec<String> = record.tags.iter().map(str::to_string).collect();
        self.seed_tags(tree, &names[..])
    }

    pub fn update_tag_checked(&mut self, name: &str, checked: bool) -> Result<()> {
        self.registry.update_tag_checked(name, checked)
    }

    // ==================== FILTERING ====================

    pub fn query(&self) -> FilterQuery {
        FilterQuery::new(self.registry.checked_tags(), &self.search)
    }

    pub fn visible_contact_ids(&self) -> BTreeSet<ContactId> {
        filter::filter_ids(&self.registry, &self.query())
    }

    /// Recompute the visible set from the current filters and apply it.
    pub fn filter_contacts<T>(&self, tree: &mut T) -> Result<BTreeSet<ContactId>>
    where
        T: PresentationTree + ?Sized,
    {
        let visible = self.visible_contact_ids();
        let shown = visibility::apply_visibility(&self.registry, &visible, tree)?;
        log::debug!(
            "filter tags={:?} search={:?}: {shown}/{} shown",
            self.registry.checked_tags(),
            self.search,
            self.registry.len()
        );
        Ok(visible)
    }
}
