//! # Contact API
//!
//! Clients for the remote contact store. [`ContactBackend`] is the async seam
//! the orchestration layer talks to; [`HttpBackend`] speaks JSON over HTTP and
//! [`MemoryBackend`] keeps everything in process for tests and offline runs.
//!
//! A non-2xx answer is an [`ApiError::Status`] rendered as `"{status} ({reason})"`.

mod backend;
mod error;
mod http;
mod memory;

pub use backend::{contact_id_from_path, contact_path, ContactBackend, CONTACTS_PATH};
pub use error::{ApiError, Result};
pub use http::HttpBackend;
pub use memory::MemoryBackend;
