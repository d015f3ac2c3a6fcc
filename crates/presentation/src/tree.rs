use crate::error::{PresentationError, Result};
use contact_protocol::ContactId;
use std::collections::HashMap;

/// Opaque, copyable reference to an element in a presentation tree.
///
/// Handles never own the element. A handle to a removed element stays
/// invalid forever; trees must not reuse its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(usize);

impl ElementHandle {
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Shown,
    Hidden,
}

impl Visibility {
    pub const fn from_shown(shown: bool) -> Self {
        if shown {
            Self::Shown
        } else {
            Self::Hidden
        }
    }

    pub const fn is_shown(self) -> bool {
        matches!(self, Self::Shown)
    }
}

/// Fixed areas of the page elements are rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Contacts,
    TagFilter,
    TagForm,
    NoContacts,
    ContactForm,
}

impl Region {
    const fn initial_visibility(self) -> Visibility {
        match self {
            Self::NoContacts | Self::ContactForm => Visibility::Hidden,
            Self::Contacts | Self::TagFilter | Self::TagForm => Visibility::Shown,
        }
    }
}

/// The attribute an element is looked up by (`data-contact-id` / `data-tag-id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ElementKey {
    Contact(ContactId),
    Tag(String),
}

/// Resolves handles from the live tree.
pub trait ElementLookup {
    fn contact_element(&self, id: ContactId) -> Option<ElementHandle>;

    /// All elements keyed by `name`, in document order.
    fn tag_elements(&self, name: &str) -> Vec<ElementHandle>;
}

/// Mutable presentation tree the engine renders into.
pub trait PresentationTree: ElementLookup {
    fn append(&mut self, region: Region, key: ElementKey, content: String) -> ElementHandle;

    /// Replace the children of `handle`, keeping the element itself.
    fn replace_content(&mut self, handle: ElementHandle, content: String) -> Result<()>;

    fn remove(&mut self, handle: ElementHandle) -> Result<()>;

    fn set_visibility(&mut self, handle: ElementHandle, visibility: Visibility) -> Result<()>;

    fn visibility(&self, handle: ElementHandle) -> Option<Visibility>;

    fn content(&self, handle: ElementHandle) -> Option<&str>;

    fn set_region_visibility(&mut self, region: Region, visibility: Visibility);

    fn region_visibility(&self, region: Region) -> Visibility;

    /// Live elements of `region`, in document order.
    fn children(&self, region: Region) -> Vec<ElementHandle>;
}

#[derive(Debug, Clone)]
struct Node {
    region: Region,
    key: ElementKey,
    content: String,
    visibility: Visibility,
}

/// Arena-backed tree. Removed slots are tombstoned, never reused.
///
/// Live handles are also indexed by key, in document order.
#[derive(Debug, Default)]
pub struct MemoryTree {
    nodes: Vec<Option<Node>>,
    by_key: HashMap<ElementKey, Vec<ElementHandle>>,
    regions: HashMap<Region, Visibility>,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.by_key.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn key(&self, handle: ElementHandle) -> Option<&ElementKey> {
        self.node(handle).map(|node| &node.key)
    }

    pub fn region(&self, handle: ElementHandle) -> Option<Region> {
        self.node(handle).map(|node| node.region)
    }

    fn node(&self, handle: ElementHandle) -> Option<&Node> {
        self.nodes.get(handle.index()).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, handle: ElementHandle) -> Result<&mut Node> {
        self.nodes
            .get_mut(handle.index())
            .and_then(Option::as_mut)
            .ok_or(PresentationError::StaleHandle(handle))
    }

    fn live(&self) -> impl Iterator<Item = (ElementHandle, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, node)| node.as_ref().map(|n| (ElementHandle(idx), n)))
    }
}

impl ElementLookup for MemoryTree {
    fn contact_element(&self, id: ContactId) -> Option<ElementHandle> {
        self.by_key
            .get(&ElementKey::Contact(id))
            .and_then(|handles| handles.first().copied())
    }

    fn tag_elements(&self, name: &str) -> Vec<ElementHandle> {
        self.by_key
            .get(&ElementKey::Tag(name.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

impl PresentationTree for MemoryTree {
    fn append(&mut self, region: Region, key: ElementKey, content: String) -> ElementHandle {
        let handle = ElementHandle(self.nodes.len());
        log::debug!("append {key:?} to {region:?} as {handle:?}");
        self.by_key.entry(key.clone()).or_default().push(handle);
        self.nodes.push(Some(Node {
            region,
            key,
            content,
            visibility: Visibility::Shown,
        }));
        handle
    }

    fn replace_content(&mut self, handle: ElementHandle, content: String) -> Result<()> {
        self.node_mut(handle)?.content = content;
        Ok(())
    }

    fn remove(&mut self, handle: ElementHandle) -> Result<()> {
        let removed = self
            .nodes
            .get_mut(handle.index())
            .and_then(Option::take);
        match removed {
            Some(node) => {
                if let Some(handles) = self.by_key.get_mut(&node.key) {
                    handles.retain(|h| *h != handle);
                    if handles.is_empty() {
                        self.by_key.remove(&node.key);
                    }
                }
                log::debug!("removed {:?} from {:?}", node.key, node.region);
                Ok(())
            }
            None => Err(PresentationError::StaleHandle(handle)),
        }
    }

    fn set_visibility(&mut self, handle: ElementHandle, visibility: Visibility) -> Result<()> {
        self.node_mut(handle)?.visibility = visibility;
        Ok(())
    }

    fn visibility(&self, handle: ElementHandle) -> Option<Visibility> {
        self.node(handle).map(|node| node.visibility)
    }

    fn content(&self, handle: ElementHandle) -> Option<&str> {
        self.node(handle).map(|node| node.content.as_str())
    }

    fn set_region_visibility(&mut self, region: Region, visibility: Visibility) {
        self.regions.insert(region, visibility);
    }

    fn region_visibility(&self, region: Region) -> Visibility {
        self.regions
            .get(&region)
            .copied()
            .unwrap_or_else(|| region.initial_visibility())
    }

    fn children(&self, region: Region) -> Vec<ElementHandle> {
        self.live()
            .filter(|(_, node)| node.region == region)
            .map(|(handle, _)| handle)
            .collect()
    }
}
