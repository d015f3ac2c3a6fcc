use crate::backend::{contact_id_from_path, ContactBackend};
use crate::error::{ApiError, Result};
use async_trait::async_trait;
use contact_protocol::{ContactId, ContactPayload, ContactRecord};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    contacts: BTreeMap<ContactId, ContactRecord>,
    next_id: ContactId,
    failing: bool,
}

/// In-process backend with sequential ids.
///
/// `set_failing(true)` makes every call answer `500 (Internal Server Error)`
/// without touching the stored records.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of `records` are kept; new ids continue after the largest one.
    pub fn seeded(records: impl IntoIterator<Item = ContactRecord>) -> Self {
        let contacts: BTreeMap<ContactId, ContactRecord> =
            records.into_iter().map(|r| (r.id, r)).collect();
        let next_id = contacts.keys().next_back().copied().unwrap_or(0);
        Self {
            state: Mutex::new(State {
                contacts,
                next_id,
                failing: false,
            }),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    pub fn len(&self) -> usize {
        self.lock().contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: ContactId) -> Option<ContactRecord> {
        self.lock().contacts.get(&id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means a test panicked mid-call; the map is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn guard(&self) -> Result<MutexGuard<'_, State>> {
        let state = self.lock();
        if state.failing {
            log::warn!("500 (Internal Server Error)");
            return Err(ApiError::Status {
                status: 500,
                reason: "Internal Server Error".to_string(),
            });
        }
        Ok(state)
    }
}

fn id_from(path: &str) -> Result<ContactId> {
    contact_id_from_path(path).ok_or_else(|| ApiError::InvalidPath(path.to_string()))
}

fn build_record(id: ContactId, payload: &ContactPayload) -> ContactRecord {
    ContactRecord::new(id, payload.full_name.clone(), payload.tags.clone())
        .with_field("email", Value::String(payload.email.clone()))
        .with_field("phone_number", Value::String(payload.phone_number.clone()))
}

#[async_trait]
impl ContactBackend for MemoryBackend {
    async fn fetch_contacts(&self) -> Result<Vec<ContactRecord>> {
        Ok(self.guard()?.contacts.values().cloned().collect())
    }

    async fn create_contact(&self, _path: &str, payload: &ContactPayload) -> Result<ContactRecord> {
        let mut state = self.guard()?;
        state.next_id += 1;
        let record = build_record(state.next_id, payload);
        state.contacts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_contact(&self, path: &str, payload: &ContactPayload) -> Result<ContactRecord> {
        let id = id_from(path)?;
        let mut state = self.guard()?;
        if !state.contacts.contains_key(&id) {
            return Err(ApiError::NotFound(path.to_string()));
        }
        let record = build_record(id, payload);
        state.contacts.insert(id, record.clone());
        Ok(record)
    }

    async fn delete_contact(&self, path: &str) -> Result<()> {
        let id = id_from(path)?;
        let mut state = self.guard()?;
        state
            .contacts
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound(path.to_string()))
    }
}
