//! # Contact Protocol
//!
//! Wire shapes shared by the backend client, the engine and the CLI.
//!
//! The backend speaks `{id, full_name, tags, ...}` where `tags` is one
//! comma-joined string. Records are decoded into [`ContactRecord`] at the
//! boundary (tags become a [`TagSet`]) and re-encoded only for outbound
//! [`ContactPayload`]s.

mod error;
mod record;
mod tags;

pub use error::{ProtocolError, Result};
pub use record::{
    decode_contact, decode_contact_list, ContactId, ContactPayload, ContactRecord, FORM_FIELDS,
};
pub use tags::{
    extract_tag_vocabulary, normalize_tag_name, validate_tag_name, TagSet, TAG_SEPARATOR,
};

pub fn serialize_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}
