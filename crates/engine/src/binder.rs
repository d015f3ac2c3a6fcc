use crate::error::{EngineError, Result};
use crate::registry::{ContactEntry, Registry};
use contact_presentation::{
    ElementHandle, ElementLookup, PresentationTree, Renderer, CONTACT_TEMPLATE,
};
use contact_protocol::{ContactId, ContactRecord};

/// Attach the rendered element for `record` to its registry entry.
///
/// An entry that is already bound only gets its data refreshed; the handle
/// is never looked up again. Otherwise the element keyed by the contact id
/// is resolved through `lookup`. Nothing is mutated when no element exists.
pub fn bind_contact<L>(
    registry: &mut Registry,
    record: ContactRecord,
    lookup: &L,
) -> Result<ElementHandle>
where
    L: ElementLookup + ?Sized,
{
    let id = record.id;
    if let Some(entry) = registry.contact_mut(id) {
        if let Some(handle) = entry.handle {
            entry.data = record;
            return Ok(handle);
        }
    }

    let handle = lookup
        .contact_element(id)
        .ok_or(EngineError::MissingElement(id))?;
    Ok(bind_contact_handle(registry, record, handle))
}

/// Attach a freshly inserted element, skipping the lookup.
pub fn bind_contact_handle(
    registry: &mut Registry,
    record: ContactRecord,
    handle: ElementHandle,
) -> ElementHandle {
    log::debug!("bind contact {} -> {handle:?}", record.id);
    registry.insert_contact_entry(ContactEntry {
        data: record,
        handle: Some(handle),
    });
    handle
}

/// Attach every element rendered for tag `name`. Returns the handle count.
///
/// Already-bound tags are left alone; use [`rescan_tag`] to pick up elements
/// added later.
pub fn bind_tag<L>(registry: &mut Registry, name: &str, lookup: &L) -> usize
where
    L: ElementLookup + ?Sized,
{
    match registry.tag(name) {
        Some(entry) => entry.handles.len(),
        None => rescan_tag(registry, name, lookup),
    }
}

/// Re-resolve all elements of tag `name`, replacing the bound set.
/// The `checked` flag is preserved.
pub fn rescan_tag<L>(registry: &mut Registry, name: &str, lookup: &L) -> usize
where
    L: ElementLookup + ?Sized,
{
    let handles = lookup.tag_elements(name);
    if handles.is_empty() {
        log::debug!("tag '{name}' has no rendered elements");
    }
    registry.upsert_tag(name);
    match registry.tag_mut(name) {
        Some(entry) => {
            entry.handles = handles;
            entry.handles.len()
        }
        None => 0,
    }
}

/// Re-render a contact's element children from its current data, keeping
/// the element (and anything attached to it) in place.
pub fn refresh_contact_content<T, R>(
    registry: &Registry,
    id: ContactId,
    tree: &mut T,
    renderer: &R,
) -> Result<()>
where
    T: PresentationTree + ?Sized,
    R: Renderer + ?Sized,
{
    let entry = registry.require_contact(id)?;
    let handle = entry.handle.ok_or(EngineError::Unbound(id))?;
    let markup = renderer.render(CONTACT_TEMPLATE, &entry.data.to_template_data())?;
    tree.replace_content(handle, markup)?;
    Ok(())
}
