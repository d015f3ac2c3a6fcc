use crate::tree::ElementHandle;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PresentationError>;

#[derive(Error, Debug)]
pub enum PresentationError {
    #[error("Stale element handle: {0:?}")]
    StaleHandle(ElementHandle),

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Template config error: {0}")]
    ConfigError(#[from] toml::de::Error),
}
