use std::sync::Arc;

use super::{Container, Session, Tree};
use crate::error::Result;
use crate::model::Path;
use crate::schema::SchemaDescriptor;
use crate::service::ServiceHandle;

/// Binds a schema to a service handle.
///
/// ```ignore
/// let tree = TreeBuilder::new(service, schema::builtin())
///     .root_path(schema::builtin::root_path())
///     .build()?;
/// ```
pub struct TreeBuilder {
    service: Arc<dyn ServiceHandle>,
    schema: Arc<SchemaDescriptor>,
    root_path: Path,
}

impl TreeBuilder {
    pub fn new(service: Arc<dyn ServiceHandle>, schema: Arc<SchemaDescriptor>) -> Self {
        Self {
            service,
            schema,
            root_path: Path::root(),
        }
    }

    /// Path of the root container on the remote. Defaults to `/`.
    pub fn root_path(mut self, path: Path) -> Self {
        self.root_path = path;
        self
    }

    /// Validate the schema and create the root container.
    ///
    /// Nothing below the root is constructed until it is first accessed.
    pub fn build(self) -> Result<Tree> {
        self.schema.validate()?;

        let root_type = self.schema.root_type().to_string();
        let session = Arc::new(Session::new(self.service, self.schema));
        let root = Container::new(session.clone(), root_type, self.root_path);
        tracing::debug!(root = %root.path(), type_id = root.type_id(), "tree bound");

        Ok(Tree { session, root })
    }
}
