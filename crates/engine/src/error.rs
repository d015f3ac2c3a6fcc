use contact_presentation::PresentationError;
use contact_protocol::ContactId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Contact not found: {0}")]
    ContactNotFound(ContactId),

    #[error("Tag not found: {0}")]
    TagNotFound(String),

    #[error("No element rendered for contact {0}")]
    MissingElement(ContactId),

    #[error("Contact {0} has no bound element")]
    Unbound(ContactId),

    #[error("Presentation error: {0}")]
    Presentation(#[from] PresentationError),
}

impl EngineError {
    /// The operation referenced an id or tag name absent from a registry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ContactNotFound(_) | Self::TagNotFound(_))
    }
}
