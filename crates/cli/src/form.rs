use contact_api::contact_path;
use contact_protocol::{ContactId, ContactPayload, ContactRecord, TagSet, FORM_FIELDS};
use std::collections::BTreeMap;

/// How a submitted form reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMethod {
    /// Create at the collection path.
    Post,
    /// Replace the contact at `path`.
    Put { path: String },
}

/// State of the add/edit contact form.
#[derive(Debug, Clone)]
pub struct ContactForm {
    collection: String,
    method: FormMethod,
    fields: BTreeMap<String, String>,
    tags: TagSet,
}

impl ContactForm {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            method: FormMethod::Post,
            fields: BTreeMap::new(),
            tags: TagSet::new(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn method(&self) -> &FormMethod {
        &self.method
    }

    /// Path the next submit goes to.
    pub fn action(&self) -> &str {
        match &self.method {
            FormMethod::Post => &self.collection,
            FormMethod::Put { path } => path,
        }
    }

    pub fn configure_post(&mut self) {
        self.method = FormMethod::Post;
    }

    pub fn configure_put(&mut self, id: ContactId) {
        self.method = FormMethod::Put {
            path: contact_path(&self.collection, id),
        };
    }

    /// Copy the text fields and tag checkboxes of `record` into the form.
    pub fn populate(&mut self, record: &ContactRecord) {
        for name in FORM_FIELDS {
            let value = if name == "full_name" {
                record.full_name.clone()
            } else {
                record.field_text(name)
            };
            self.fields.insert(name.to_string(), value);
        }
        self.tags = record.tags.clone();
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", String::as_str)
    }

    pub fn set_tag_checked(&mut self, name: &str, checked: bool) {
        if checked {
            self.tags.insert(name);
        } else {
            self.tags.remove(name);
        }
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Clear inputs. The method is kept, as a browser form reset keeps it.
    pub fn reset(&mut self) {
        self.fields.clear();
        self.tags = TagSet::new();
    }

    pub fn payload(&self) -> ContactPayload {
        ContactPayload {
            email: self.field("email").to_string(),
            phone_number: self.field("phone_number").to_string(),
            tags: self.tags.clone(),
            ..ContactPayload::new(self.field("full_name"))
        }
    }
}
