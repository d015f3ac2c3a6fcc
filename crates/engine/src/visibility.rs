use crate::error::Result;
use crate::registry::Registry;
use contact_presentation::{PresentationTree, Visibility};
use contact_protocol::ContactId;
use std::collections::BTreeSet;

/// Show every bound contact whose id is in `visible`, hide the rest.
///
/// Only the per-element visibility flag changes; elements are never removed,
/// reordered or re-rendered. Returns the number of contacts shown.
pub fn apply_visibility<T>(
    registry: &Registry,
    visible: &BTreeSet<ContactId>,
    tree: &mut T,
) -> Result<usize>
where
    T: PresentationTree + ?Sized,
{
    let mut shown = 0;
    for entry in registry.contacts() {
        let Some(handle) = entry.handle else {
            log::debug!("contact {} is not bound, skipping visibility", entry.data.id);
            continue;
        };
        let visibility = Visibility::from_shown(visible.contains(&entry.data.id));
        tree.set_visibility(handle, visibility)?;
        if visibility.is_shown() {
            shown += 1;
        }
    }
    Ok(shown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::bind_contact_handle;
    use contact_presentation::{ElementKey, MemoryTree, Region};
    use contact_protocol::{ContactRecord, TagSet};

    fn seeded() -> (Registry, MemoryTree) {
        let mut tree = MemoryTree::new();
        let mut registry = Registry::new();
        for id in 1..=3 {
            let handle = tree.append(Region::Contacts, ElementKey::Contact(id), format!("#{id}"));
            bind_contact_handle(
                &mut registry,
                ContactRecord::new(id, format!("C{id}"), TagSet::new()),
                handle,
            );
        }
        (registry, tree)
    }

    fn shown_ids(registry: &Registry, tree: &MemoryTree) -> Vec<ContactId> {
        registry
            .contacts()
            .filter(|entry| {
                entry
                    .handle
                    .and_then(|h| tree.visibility(h))
                    .is_some_and(Visibility::is_shown)
            })
            .map(|entry| entry.data.id)
            .collect()
    }

    #[test]
    fn empty_set_hides_all_and_superset_shows_all() {
        let (registry, mut tree) = seeded();
        assert_eq!(apply_visibility(&registry, &BTreeSet::new(), &mut tree).unwrap(), 0);
        assert!(shown_ids(&registry, &tree).is_empty());

        let superset: BTreeSet<ContactId> = (0..10).collect();
        assert_eq!(apply_visibility(&registry, &superset, &mut tree).unwrap(), 3);
        assert_eq!(shown_ids(&registry, &tree), vec![1, 2, 3]);
    }

    #[test]
    fn leaves_content_and_order_alone() {
        let (registry, mut tree) = seeded();
        let before = tree.children(Region::Contacts);
        apply_visibility(&registry, &BTreeSet::from([2]), &mut tree).unwrap();

        assert_eq!(tree.children(Region::Contacts), before);
        assert_eq!(shown_ids(&registry, &tree), vec![2]);
        for (idx, handle) in before.into_iter().enumerate() {
            assert_eq!(tree.content(handle), Some(format!("#{}", idx + 1).as_str()));
        }
    }
}
