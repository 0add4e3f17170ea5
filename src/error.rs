//! Error taxonomy for tree navigation and terminal operations.

use thiserror::Error;

use crate::service::ServiceError;

/// Errors surfaced by the proxy tree.
///
/// Remote failures keep the message the service reported, verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("unknown child '{name}' on {type_id}")]
    UnknownChild { type_id: String, name: String },

    #[error("'{name}' is a {found}, not a {expected}")]
    NodeKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("kind mismatch: {0}")]
    KindMismatch(String),

    #[error("signature mismatch: {0}")]
    SignatureMismatch(String),

    #[error("immutable: {0}")]
    Immutable(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("remote error: {0}")]
    RemoteError(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("service closed: tree is detached")]
    ServiceClosed,

    #[error("schema error: {0}")]
    SchemaError(String),
}

/// Discriminant of [`Error`], for matching without caring about messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnknownChild,
    NodeKind,
    PathNotFound,
    KindMismatch,
    SignatureMismatch,
    Immutable,
    Validation,
    RemoteError,
    Transport,
    Cancelled,
    ServiceClosed,
    SchemaError,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownChild { .. } => ErrorKind::UnknownChild,
            Self::NodeKind { .. } => ErrorKind::NodeKind,
            Self::PathNotFound(_) => ErrorKind::PathNotFound,
            Self::KindMismatch(_) => ErrorKind::KindMismatch,
            Self::SignatureMismatch(_) => ErrorKind::SignatureMismatch,
            Self::Immutable(_) => ErrorKind::Immutable,
            Self::Validation(_) => ErrorKind::Validation,
            Self::RemoteError(_) => ErrorKind::RemoteError,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::ServiceClosed => ErrorKind::ServiceClosed,
            Self::SchemaError(_) => ErrorKind::SchemaError,
        }
    }
}

impl From<ServiceError> for Error {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::PathNotFound(msg) => Self::PathNotFound(msg),
            ServiceError::KindMismatch(msg) => Self::KindMismatch(msg),
            ServiceError::SignatureMismatch(msg) => Self::SignatureMismatch(msg),
            ServiceError::Immutable(msg) => Self::Immutable(msg),
            ServiceError::Validation(msg) => Self::Validation(msg),
            ServiceError::RemoteError(msg) => Self::RemoteError(msg),
            ServiceError::Transport(msg) => Self::Transport(msg),
            ServiceError::Cancelled => Self::Cancelled,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
