//! # Contact Presentation
//!
//! The page side of the contact manager, kept behind traits so the engine
//! never owns or inspects it.
//!
//! ## Architecture
//!
//! ```text
//! TemplateSet (Renderer)
//!     │  render(template_id, data) -> markup
//!     ▼
//! PresentationTree (MemoryTree)
//!     ├─ Regions: contacts, tag filter, tag form, placeholder, form
//!     ├─ Elements keyed by contact id / tag name
//!     └─ ElementHandle: non-owning index, show/hide, replace, remove
//! ```

mod error;
mod templates;
mod tree;

pub use error::{PresentationError, Result};
pub use templates::{
    Renderer, TemplateSet, CONTACT_TAGS_TEMPLATE, CONTACT_TEMPLATE, NO_CONTACTS_TEMPLATE,
    TAG_TEMPLATE,
};
pub use tree::{
    ElementHandle, ElementKey, ElementLookup, MemoryTree, PresentationTree, Region, Visibility,
};
