//! # Contact Engine
//!
//! The view model of the contact manager: keeps contacts and tags in sync
//! with the backend's accepted records and the rendered page, and computes
//! which contacts the current filters let through.
//!
//! ## Architecture
//!
//! ```text
//! Registry (contacts by id, tags by name)
//!     │   entry = data + non-owning ElementHandle(s)
//!     │
//!     ├──> Binder
//!     │      ├─ bind_contact / bind_tag (element lookup)
//!     │      └─ refresh_contact_content (re-render in place)
//!     │
//!     ├──> Filter
//!     │      └─ checked tags (AND)  ∩  name prefix (case-insensitive)
//!     │
//!     └──> Visibility
//!            └─ show/hide per element, never remove or reorder
//! ```
//!
//! Nothing here is async: backend round-trips belong to the caller, which
//! applies a result only after the call succeeded.

pub mod binder;
mod error;
pub mod filter;
mod registry;
mod view_model;
pub mod visibility;

pub use error::{EngineError, Result};
pub use filter::{visible_contact_ids, FilterQuery};
pub use registry::{ContactEntry, Registry, TagEntry};
pub use view_model::ViewModel;
pub use visibility::apply_visibility;
