use crate::domain::EntityKind;
use crate::i18n::Message;
use crate::validation::FieldErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum BackofficeError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(FieldErrors),

    #[error("invalid variant data: {0}")]
    InvalidVariantData(String),

    #[error("{0} not found: {1}")]
    NotFound(EntityKind, String),

    #[error("email already registered: {0}")]
    EmailTaken(String),

    #[error("new customer requires a name and a phone")]
    MissingCustomerFields,

    #[error("storage error: {0}")]
    Persistence(#[from] StoreError),

    #[error("operation did not complete: {0}")]
    Interrupted(#[from] tokio::task::JoinError),
}

impl BackofficeError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound(kind, id.into())
    }

    /// Message shown to the operator. Persistence failures have no detail
    /// of their own and use the operation's generic `fallback`.
    pub fn message(&self, fallback: Message) -> Message {
        match self {
            Self::Validation(_) => Message::ValidationFailed,
            Self::InvalidVariantData(_) => Message::InvalidVariantData,
            Self::NotFound(kind, _) => Message::NotFound(*kind),
            Self::EmailTaken(_) => Message::EmailTaken,
            Self::MissingCustomerFields => Message::CustomerFieldsMissing,
            Self::Persistence(_) | Self::Interrupted(_) => fallback,
        }
    }
}

pub type Result<T> = std::result::Result<T, BackofficeError>;
