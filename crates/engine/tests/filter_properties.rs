use contact_engine::{apply_visibility, binder, visible_contact_ids, Registry};
use contact_presentation::{ElementKey, MemoryTree, PresentationTree, Region, Visibility};
use contact_protocol::{ContactId, ContactRecord, TagSet};
use proptest::prelude::*;
use std::collections::BTreeSet;

const TAGS: [&str; 4] = ["work", "vip", "family", "gym"];

fn contact_strategy() -> impl Strategy<Value = (String, Vec<bool>)> {
    ("[A-Za-z]{1,6}", proptest::collection::vec(any::<bool>(), TAGS.len()))
}

fn build(contacts: &[(String, Vec<bool>)]) -> (Registry, MemoryTree) {
    let mut registry = Registry::new();
    let mut tree = MemoryTree::new();
    for (idx, (name, flags)) in contacts.iter().enumerate() {
        let id = idx as ContactId + 1;
        let tags: TagSet = TAGS
            .iter()
            .zip(flags)
            .filter(|(_, on)| **on)
            .map(|(tag, _)| *tag)
            .collect();
        let handle = tree.append(Region::Contacts, ElementKey::Contact(id), name.clone());
        binder::bind_contact_handle(&mut registry, ContactRecord::new(id, name.clone(), tags), handle);
    }
    (registry, tree)
}

fn checked(flags: &[bool]) -> BTreeSet<String> {
    TAGS.iter()
        .zip(flags)
        .filter(|(_, on)| **on)
        .map(|(tag, _)| tag.to_string())
        .collect()
}

fn visibilities(registry: &Registry, tree: &MemoryTree) -> Vec<Option<Visibility>> {
    registry
        .contacts()
        .map(|entry| entry.handle.and_then(|h| tree.visibility(h)))
        .collect()
}

proptest! {
    #[test]
    fn proptest_checking_a_tag_never_grows_the_visible_set(
        contacts in proptest::collection::vec(contact_strategy(), 0..12),
        flags in proptest::collection::vec(any::<bool>(), TAGS.len()),
        extra in 0..TAGS.len(),
        search in "[a-z]{0,2}",
    ) {
        let (registry, _tree) = build(&contacts);
        let before = checked(&flags);
        let mut after = before.clone();
        after.insert(TAGS[extra].to_string());

        let narrow = visible_contact_ids(&registry, &after, &search);
        let wide = visible_contact_ids(&registry, &before, &search);
        prop_assert!(narrow.is_subset(&wide));
    }

    #[test]
    fn proptest_extending_the_search_never_grows_the_visible_set(
        contacts in proptest::collection::vec(contact_strategy(), 0..12),
        flags in proptest::collection::vec(any::<bool>(), TAGS.len()),
        prefix in "[a-zA-Z]{0,2}",
        suffix in "[a-zA-Z]{1,2}",
    ) {
        let (registry, _tree) = build(&contacts);
        let tags = checked(&flags);
        let longer = format!("{prefix}{suffix}");

        let narrow = visible_contact_ids(&registry, &tags, &longer);
        let wide = visible_contact_ids(&registry, &tags, &prefix);
        prop_assert!(narrow.is_subset(&wide));
    }

    #[test]
    fn proptest_applying_visibility_twice_equals_once(
        contacts in proptest::collection::vec(contact_strategy(), 0..12),
        visible in proptest::collection::btree_set(1u64..14, 0..14),
    ) {
        let (registry, mut tree) = build(&contacts);
        apply_visibility(&registry, &visible, &mut tree).unwrap();
        let once = visibilities(&registry, &tree);
        apply_visibility(&registry, &visible, &mut tree).unwrap();
        prop_assert_eq!(once, visibilities(&registry, &tree));
    }

    #[test]
    fn proptest_result_is_independent_of_insertion_order(
        contacts in proptest::collection::vec(contact_strategy(), 0..12),
        flags in proptest::collection::vec(any::<bool>(), TAGS.len()),
        search in "[a-z]{0,1}",
    ) {
        let (registry, _tree) = build(&contacts);
        let tags = checked(&flags);

        let mut reversed = Registry::new();
        for entry in registry.contacts().collect::<Vec<_>>().into_iter().rev() {
            reversed.upsert_contact(entry.data.clone());
        }
        prop_assert_eq!(
            visible_contact_ids(&registry, &tags, &search),
            visible_contact_ids(&reversed, &tags, &search)
        );
    }
}
