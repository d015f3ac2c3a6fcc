use crate::error::Result;
use async_trait::async_trait;
use contact_protocol::{ContactId, ContactPayload, ContactRecord};

/// Default collection path on the backend.
pub const CONTACTS_PATH: &str = "/api/contacts";

/// The remote record store.
///
/// Any `Err` means "nothing was accepted": callers must not touch their
/// local state for it.
#[async_trait]
pub trait ContactBackend: Send + Sync {
    async fn fetch_contacts(&self) -> Result<Vec<ContactRecord>>;

    /// `path` is the collection path the form posts to.
    async fn create_contact(&self, path: &str, payload: &ContactPayload) -> Result<ContactRecord>;

    /// `path` addresses one contact, e.g. `/api/contacts/4`.
    async fn update_contact(&self, path: &str, payload: &ContactPayload) -> Result<ContactRecord>;

    async fn delete_contact(&self, path: &str) -> Result<()>;
}

/// `/api/contacts` + `4` -> `/api/contacts/4`.
pub fn contact_path(collection: &str, id: ContactId) -> String {
    format!("{}/{id}", collection.trim_end_matches('/'))
}

/// Trailing numeric segment of a contact path or URL.
pub fn contact_id_from_path(path: &str) -> Option<ContactId> {
    let trimmed = path.trim_end_matches('/');
    let start = trimmed
        .rfind(|c: char| !c.is_ascii_digit())
        .map_or(0, |idx| idx + 1);
    trimmed[start..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_parses_contact_paths() {
        assert_eq!(contact_path("/api/contacts/", 4), "/api/contacts/4");
        assert_eq!(contact_id_from_path("/api/contacts/4"), Some(4));
        assert_eq!(contact_id_from_path("http://localhost:3000/api/contacts/17"), Some(17));
        assert_eq!(contact_id_from_path("/api/contacts"), None);
        assert_eq!(contact_id_from_path(""), None);
    }
}
