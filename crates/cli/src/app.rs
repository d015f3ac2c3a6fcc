use crate::form::{ContactForm, FormMethod};
use anyhow::{Context, Result};
use contact_api::{contact_path, ContactBackend};
use contact_engine::ViewModel;
use contact_presentation::{PresentationTree, Region, TemplateSet, Visibility};
use contact_protocol::{
    extract_tag_vocabulary, normalize_tag_name, validate_tag_name, ContactId, ContactPayload,
    ContactRecord,
};
use tokio::sync::mpsc;

pub const EVENT_QUEUE_CAPACITY: usize = 64;

/// One user interaction, processed in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    NewTag(String),
    ShowContactForm,
    CancelForm,
    /// Text typed into one of the form inputs.
    FormInput { field: String, value: String },
    /// A tag checkbox inside the form.
    FormTag { name: String, checked: bool },
    SubmitForm,
    EditContact(ContactId),
    DeleteContact { id: ContactId, confirmed: bool },
    /// A tag checkbox in the filter panel.
    ToggleTag { name: String, checked: bool },
    Search(String),
}

pub fn event_queue() -> (mpsc::Sender<UiEvent>, mpsc::Receiver<UiEvent>) {
    mpsc::channel(EVENT_QUEUE_CAPACITY)
}

/// Wires the backend, the view model and the page together.
///
/// Backend results are applied only after the call returned success; a failed
/// call leaves the registries and the tree as they were.
pub struct ContactApp<B, T> {
    backend: B,
    tree: T,
    view: ViewModel<TemplateSet>,
    form: ContactForm,
    last_saved: Option<ContactId>,
}

impl<B, T> ContactApp<B, T>
where
    B: ContactBackend,
    T: PresentationTree,
{
    pub fn new(backend: B, tree: T, templates: TemplateSet, contacts_path: &str) -> Self {
        Self {
            backend,
            tree,
            view: ViewModel::new(templates),
            form: ContactForm::new(contacts_path),
            last_saved: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn view(&self) -> &ViewModel<TemplateSet> {
        &self.view
    }

    pub fn form(&self) -> &ContactForm {
        &self.form
    }

    /// Id of the contact most recently accepted by a create or update.
    pub fn last_saved(&self) -> Option<ContactId> {
        self.last_saved
    }

    /// Templates, contacts, placeholder, tag vocabulary, in that order.
    pub async fn load(&mut self) -> Result<()> {
        self.view
            .renderer()
            .validate()
            .context("Invalid templates")?;

        let contacts = self
            .backend
            .fetch_contacts()
            .await
            .context("Failed to fetch contacts")?;
        let tags = extract_tag_vocabulary(contacts.iter().map(|c| &c.tags));

        self.view.seed_contacts(&mut self.tree, contacts)?;
        self.view.display_or_hide_no_contacts(&mut self.tree);
        self.view.seed_tags(&mut self.tree, &tags[..])?;
        log::info!(
            "Loaded {} contacts, {} tags",
            self.view.registry().len(),
            tags.len()
        );
        Ok(())
    }

    /// Drain `events` until every sender is dropped. A failed event is
    /// logged and the loop moves on to the next one.
    pub async fn run(&mut self, mut events: mpsc::Receiver<UiEvent>) {
        while let Some(event) = events.recv().await {
            if let Err(err) = self.dispatch(event).await {
                log::error!("{err:#}");
            }
        }
        log::debug!("event queue closed");
    }

    pub async fn dispatch(&mut self, event: UiEvent) -> Result<()> {
        log::debug!("event {event:?}");
        match event {
            UiEvent::NewTag(name) => self.new_tag(&name),
            UiEvent::ShowContactForm => {
                self.form.configure_post();
                self.form.reset();
                self.open_form();
                Ok(())
            }
            UiEvent::CancelForm => {
                self.form.reset();
                self.close_form();
                Ok(())
            }
            UiEvent::FormInput { field, value } => {
                self.form.set_field(&field, value);
                Ok(())
            }
            UiEvent::FormTag { name, checked } => {
                self.form.set_tag_checked(&name, checked);
                Ok(())
            }
            UiEvent::SubmitForm => self.submit_form().await,
            UiEvent::EditContact(id) => self.edit_contact(id),
            UiEvent::DeleteContact { id, confirmed } => self.delete_contact(id, confirmed).await,
            UiEvent::ToggleTag { name, checked } => {
                if !self.view.registry().contains_tag(&name) {
                    anyhow::bail!("Unknown tag '{name}'");
                }
                assume_present(self.view.update_tag_checked(&name, checked))?;
                self.filter()
            }
            UiEvent::Search(text) => {
                self.view.set_search(&text);
                self.filter()
            }
        }
    }

    /// Visible contacts in id order.
    pub fn visible_contacts(&self) -> Vec<&ContactRecord> {
        self.view
            .registry()
            .contacts()
            .filter(|entry| {
                entry.handle.and_then(|h| self.tree.visibility(h)) == Some(Visibility::Shown)
            })
            .map(|entry| &entry.data)
            .collect()
    }

    /// Rendered markup of every visible contact.
    pub fn rendered_visible(&self) -> Vec<&str> {
        self.view
            .registry()
            .contacts()
            .filter_map(|entry| entry.handle)
            .filter(|h| self.tree.visibility(*h) == Some(Visibility::Shown))
            .filter_map(|h| self.tree.content(h))
            .collect()
    }

    fn new_tag(&mut self, raw: &str) -> Result<()> {
        if normalize_tag_name(raw).is_none() {
            log::debug!("blank tag name ignored");
            return Ok(());
        }
        let name = validate_tag_name(raw)?;
        if self.view.insert_tag(&mut self.tree, &name)? {
            log::info!("Added tag '{name}'");
        }
        Ok(())
    }

    /// Ids arrive from the user; the engine is only called for known ones.
    fn require_contact(&self, id: ContactId) -> Result<()> {
        if !self.view.registry().contains_contact(id) {
            anyhow::bail!("Contact not found: {id}");
        }
        Ok(())
    }

    fn open_form(&mut self) {
        self.tree.set_region_visibility(Region::Contacts, Visibility::Hidden);
        self.tree.set_region_visibility(Region::ContactForm, Visibility::Shown);
    }

    fn close_form(&mut self) {
        self.tree.set_region_visibility(Region::ContactForm, Visibility::Hidden);
        self.tree.set_region_visibility(Region::Contacts, Visibility::Shown);
    }

    fn filter(&mut self) -> Result<()> {
        self.view.filter_contacts(&mut self.tree)?;
        Ok(())
    }

    /// On backend failure the form keeps its inputs and stays open.
    async fn submit_form(&mut self) -> Result<()> {
        let payload = self.form.payload();
        match self.form.method().clone() {
            FormMethod::Post => {
                let collection = self.form.collection().to_string();
                self.create_contact(&collection, &payload).await?;
            }
            FormMethod::Put { path } => self.update_contact(&path, &payload).await?,
        }
        self.form.reset();
        self.close_form();
        Ok(())
    }

    async fn create_contact(&mut self, path: &str, payload: &ContactPayload) -> Result<()> {
        let record = self
            .backend
            .create_contact(path, payload)
            .await
            .with_context(|| format!("Failed to create contact '{}'", payload.full_name))?;

        let id = record.id;
        self.view.register_tags_of(&mut self.tree, &record)?;
        self.view.add_contact(&mut self.tree, record)?;
        self.view.display_or_hide_no_contacts(&mut self.tree);
        self.filter()?;
        self.last_saved = Some(id);
        log::info!("Created contact {id}");
        Ok(())
    }

    async fn update_contact(&mut self, path: &str, payload: &ContactPayload) -> Result<()> {
        let record = self
            .backend
            .update_contact(path, payload)
            .await
            .with_context(|| format!("Failed to update contact at {path}"))?;

        let id = record.id;
        if !self.view.registry().contains_contact(id) {
            log::warn!("Contact {id} was deleted before its update arrived; update dropped");
            return Ok(());
        }
        self.view.register_tags_of(&mut self.tree, &record)?;
        assume_present(self.view.update_contact(&mut self.tree, record))?;
        self.filter()?;
        self.last_saved = Some(id);
        log::info!("Updated contact {id}");
        Ok(())
    }

    fn edit_contact(&mut self, id: ContactId) -> Result<()> {
        self.require_contact(id)?;
        let record = assume_present(self.view.contact(id))?.clone();

        self.form.configure_put(id);
        self.form.reset();
        self.form.populate(&record);
        self.open_form();
        Ok(())
    }

    async fn delete_contact(&mut self, id: ContactId, confirmed: bool) -> Result<()> {
        if !confirmed {
            log::debug!("delete of contact {id} not confirmed");
            return Ok(());
        }
        self.require_contact(id)?;

        let path = contact_path(self.form.collection(), id);
        self.backend
            .delete_contact(&path)
            .await
            .with_context(|| format!("Failed to delete contact {id}"))?;

        assume_present(self.view.delete_contact(&mut self.tree, id))?;
        self.view.display_or_hide_no_contacts(&mut self.tree);
        log::info!("Deleted contact {id}");
        Ok(())
    }
}

/// Wraps engine calls made after the dispatcher checked existence. A
/// `NotFound` here means the registries and the page disagree.
fn assume_present<V>(result: contact_engine::Result<V>) -> Result<V> {
    result.map_err(|err| {
        log::error!("{err}");
        debug_assert!(!err.is_not_found(), "registry out of sync: {err}");
        anyhow::Error::from(err)
    })
}
