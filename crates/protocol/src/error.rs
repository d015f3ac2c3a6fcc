use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed contact record: {0}")]
    MalformedRecord(String),

    #[error("Invalid tag name '{0}'")]
    InvalidTagName(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
