use crate::error::{ProtocolError, Result};
use crate::tags::TagSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Backend-assigned contact identifier.
pub type ContactId = u64;

/// Names of the text inputs carried by the contact form, in display order.
pub const FORM_FIELDS: [&str; 3] = ["full_name", "email", "phone_number"];

/// A contact as accepted from the backend.
///
/// Only `id`, `full_name` and `tags` are interpreted; every other field is
/// kept verbatim in `extra` so templates can display it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct ContactRecord {
    pub id: ContactId,
    pub full_name: String,
    pub tags: TagSet,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContactRecord {
    pub fn new(id: ContactId, full_name: impl Into<String>, tags: TagSet) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            tags,
            extra: Map::new(),
        }
    }

    /// Builder-style setter for a pass-through field.
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// Text value of a field as the form would show it.
    pub fn field_text(&self, key: &str) -> String {
        match key {
            "id" => self.id.to_string(),
            "full_name" => self.full_name.clone(),
            "tags" => self.tags.encode(),
            other => match self.extra.get(other) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(value) => value.to_string(),
            },
        }
    }

    /// JSON view handed to templates: wire shape plus `tag_list`.
    pub fn to_template_data(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert("id".to_string(), Value::from(self.id));
        map.insert("full_name".to_string(), Value::from(self.full_name.clone()));
        map.insert("tags".to_string(), Value::from(self.tags.encode()));
        map.insert(
            "tag_list".to_string(),
            Value::from(self.tags.iter().collect::<Vec<_>>().join(", ")),
        );
        Value::Object(map)
    }
}

impl TryFrom<Value> for ContactRecord {
    type Error = ProtocolError;

    fn try_from(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(ProtocolError::MalformedRecord(
                "expected a JSON object".to_string(),
            ));
        };

        let id = match map.remove("id") {
            Some(Value::Number(n)) => n.as_u64().ok_or_else(|| {
                ProtocolError::MalformedRecord(format!("id must be a non-negative integer, got {n}"))
            })?,
            Some(other) => {
                return Err(ProtocolError::MalformedRecord(format!(
                    "id must be an integer, got {other}"
                )))
            }
            None => return Err(ProtocolError::MalformedRecord("missing id".to_string())),
        };

        let full_name = match map.remove("full_name") {
            Some(Value::String(s)) => s,
            Some(other) => {
                return Err(ProtocolError::MalformedRecord(format!(
                    "full_name must be a string (id={id}), got {other}"
                )))
            }
            None => {
                return Err(ProtocolError::MalformedRecord(format!(
                    "missing full_name (id={id})"
                )))
            }
        };

        let tags = match map.remove("tags") {
            Some(Value::String(raw)) => TagSet::parse(&raw),
            Some(Value::Null) | None => TagSet::new(),
            Some(other) => {
                return Err(ProtocolError::MalformedRecord(format!(
                    "tags must be a comma-joined string (id={id}), got {other}"
                )))
            }
        };

        Ok(Self {
            id,
            full_name,
            tags,
            extra: map,
        })
    }
}

/// Decode a single record, failing fast on missing required fields.
pub fn decode_contact(value: Value) -> Result<ContactRecord> {
    ContactRecord::try_from(value)
}

/// Decode the `GET /api/contacts` body.
///
/// A non-array body is an error. Malformed elements are skipped with a
/// warning so one bad row does not blank the whole list.
pub fn decode_contact_list(value: Value) -> Result<Vec<ContactRecord>> {
    let Value::Array(items) = value else {
        return Err(ProtocolError::MalformedRecord(
            "expected a JSON array of contacts".to_string(),
        ));
    };

    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match ContactRecord::try_from(item) {
            Ok(record) => out.push(record),
            Err(err) => log::warn!("Skipping contact #{idx}: {err}"),
        }
    }
    Ok(out)
}

/// Outbound create/update body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPayload {
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub tags: TagSet,
}

impl ContactPayload {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            ..Default::default()
        }
    }

    /// Seed a payload from an accepted record, e.g. to edit one field.
    pub fn from_record(record: &ContactRecord) -> Self {
        Self {
            full_name: record.full_name.clone(),
            email: record.field_text("email"),
            phone_number: record.field_text("phone_number"),
            tags: record.tags.clone(),
        }
    }
}
