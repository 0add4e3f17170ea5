//! The boundary between the proxy tree and the remote solver.
//!
//! Every terminal operation on the tree ends in exactly one call on a
//! [`ServiceHandle`]. The handle owns transport, encoding, timeouts and
//! session lifecycle; the tree only supplies a path and typed payloads.

pub mod memory;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::{Path, Value};

pub use memory::{Call, InMemoryService, Operation};

/// Named command arguments, ordered by name.
pub type ArgMap = BTreeMap<String, Value>;

/// Failures a service handle can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
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
}

/// Capability for issuing typed requests to the remote endpoint.
///
/// Implementations must be safe to share between threads; the tree holds
/// one handle behind an `Arc` and calls it from whichever thread performs a
/// terminal operation. No ordering is promised between concurrent calls.
pub trait ServiceHandle: Send + Sync {
    /// Fetch the value of the parameter at `path`.
    fn get(&self, path: &Path) -> Result<Value, ServiceError>;

    /// Assign `value` to the parameter at `path`.
    fn set(&self, path: &Path, value: Value) -> Result<(), ServiceError>;

    /// Run the command at `path`. `None` means the command returned nothing.
    fn invoke(&self, path: &Path, args: ArgMap) -> Result<Option<Value>, ServiceError>;

    /// Current keys of the named-object container at `path`, in remote order.
    fn child_keys(&self, path: &Path) -> Result<Vec<String>, ServiceError>;

    /// Ask the handle to abandon in-flight work; affected calls fail with
    /// [`ServiceError::Cancelled`].
    fn cancel(&self) {}
}
