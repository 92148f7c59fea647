//! Error types for ce-contacts

use thiserror::Error;

/// ce-contacts error type
#[derive(Error, Debug)]
pub enum ContactsError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("CardDAV error: {0}")]
    CarddavError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("XML parsing error: {0}")]
    XmlParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ce_core::Error> for ContactsError {
    fn from(e: ce_core::Error) -> Self {
        Self::Configuration(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ContactsError>;
