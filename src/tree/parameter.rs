use std::sync::Arc;

use super::Session;
use crate::error::{Error, Result};
use crate::model::{Path, Value, ValueKind};
use crate::schema::{ChildDecl, ParameterDecl};

struct ParameterInner {
    session: Arc<Session>,
    decl: ChildDecl,
    path: Path,
}

/// A typed leaf whose value lives on the remote.
#[derive(Clone)]
pub struct Parameter(Arc<ParameterInner>);

impl Parameter {
    pub(crate) fn new(session: Arc<Session>, decl: ChildDecl, path: Path) -> Self {
        Self(Arc::new(ParameterInner { session, decl, path }))
    }

    pub fn path(&self) -> &Path {
        &self.0.path
    }

    pub fn name(&self) -> &str {
        &self.0.decl.name
    }

    /// Full declaration, including advisory metadata.
    pub fn decl(&self) -> &ChildDecl {
        &self.0.decl
    }

    fn parameter_decl(&self) -> &ParameterDecl {
        match self.0.decl.as_parameter() {
            Some(p) => p,
            None => unreachable!("parameter node built from a non-parameter declaration"),
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.parameter_decl().kind
    }

    pub fn same_node(&self, other: &Parameter) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Fetch the current remote value, checked against the declared kind.
    pub fn read(&self) -> Result<Value> {
        let service = self.0.session.service()?;
        let value = service.get(&self.0.path)?;
        value.coerce(self.kind()).map_err(|e| {
            Error::KindMismatch(format!("remote value at {}: {}", self.0.path, e))
        })
    }

    /// Assign a new remote value.
    ///
    /// The value is coerced to the declared kind first; if that fails no
    /// request is sent.
    pub fn write(&self, value: impl Into<Value>) -> Result<()> {
        let service = self.0.session.service()?;
        let value = value
            .into()
            .coerce(self.kind())
            .map_err(|e| Error::KindMismatch(format!("{}: {}", self.0.path, e)))?;
        Ok(service.set(&self.0.path, value)?)
    }
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("kind", &self.kind())
            .field("path", &self.0.path.to_string())
            .finish()
    }
}
