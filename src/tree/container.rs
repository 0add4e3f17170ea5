use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Command, Node, Parameter, Session};
use crate::error::{Error, Result};
use crate::model::{Path, Segment};
use crate::schema::{NodeDecl, TypeDecl};

struct ContainerInner {
    session: Arc<Session>,
    type_id: String,
    path: Path,
    children: Mutex<HashMap<String, Node>>,
}

/// A namespace node whose children are fixed by its schema type.
///
/// Cloning is cheap and yields a handle to the same node.
#[derive(Clone)]
pub struct Container(Arc<ContainerInner>);

impl Container {
    pub(crate) fn new(session: Arc<Session>, type_id: impl Into<String>, path: Path) -> Self {
        Self(Arc::new(ContainerInner {
            session,
            type_id: type_id.into(),
            path,
            children: Mutex::new(HashMap::new()),
        }))
    }

    pub fn path(&self) -> &Path {
        &self.0.path
    }

    pub fn type_id(&self) -> &str {
        &self.0.type_id
    }

    pub fn same_node(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn decl(&self) -> Result<&TypeDecl> {
        self.0.session.schema().get(&self.0.type_id).ok_or_else(|| {
            Error::SchemaError(format!("container type '{}' is not declared", self.0.type_id))
        })
    }

    /// Declared child names, in schema order.
    pub fn child_names(&self) -> Vec<String> {
        self.decl()
            .map(|t| t.children.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    /// The child declared under `name`, materialized on first access.
    pub fn child(&self, name: &str) -> Result<Node> {
        let mut children = self.0.children.lock();
        if let Some(node) = children.get(name) {
            return Ok(node.clone());
        }

        let decl = self.decl()?.find(name).ok_or_else(|| Error::UnknownChild {
            type_id: self.0.type_id.clone(),
            name: name.to_string(),
        })?;

        let session = self.0.session.clone();
        let path = self.0.path.join(name);
        tracing::trace!(path = %path, kind = decl.node.label(), "materializing child");

        let node = match &decl.node {
            NodeDecl::Container { type_id } => Node::Container(Container::new(session, type_id, path)),
            NodeDecl::NamedObject { element } => Node::NamedObjects(NamedObjectContainer::new(
                session,
                name.to_string(),
                element.clone(),
                path,
            )),
            NodeDecl::Parameter(_) => Node::Parameter(Parameter::new(session, decl.clone(), path)),
            NodeDecl::Command(_) => Node::Command(Command::new(session, decl.clone(), path)),
        };
        children.insert(name.to_string(), node.clone());
        Ok(node)
    }

    pub fn container(&self, name: &str) -> Result<Container> {
        self.child(name)?.into_container()
    }

    pub fn named_objects(&self, name: &str) -> Result<NamedObjectContainer> {
        self.child(name)?.into_named_objects()
    }

    pub fn parameter(&self, name: &str) -> Result<Parameter> {
        self.child(name)?.into_parameter()
    }

    pub fn command(&self, name: &str) -> Result<Command> {
        self.child(name)?.into_command()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("type_id", &self.0.type_id)
            .field("path", &self.0.path.to_string())
            .finish()
    }
}

#[derive(Default)]
struct Materialized {
    by_key: HashMap<String, Container>,
    order: Vec<String>,
}

struct NamedInner {
    session: Arc<Session>,
    name: String,
    element: String,
    path: Path,
    items: Mutex<Materialized>,
}

/// A dynamic, string-keyed collection of containers sharing one element type.
///
/// Keys match exactly: no case folding, no trimming.
#[derive(Clone)]
pub struct NamedObjectContainer(Arc<NamedInner>);

impl NamedObjectContainer {
    pub(crate) fn new(session: Arc<Session>, name: String, element: String, path: Path) -> Self {
        Self(Arc::new(NamedInner {
            session,
            name,
            element,
            path,
            items: Mutex::new(Materialized::default()),
        }))
    }

    pub fn path(&self) -> &Path {
        &self.0.path
    }

    /// Declared name; also the segment name of every instance.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Type id shared by all instances.
    pub fn element_type(&self) -> &str {
        &self.0.element
    }

    pub fn same_node(&self, other: &NamedObjectContainer) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The instance for `key`, materialized on first lookup.
    ///
    /// Keys that are empty or contain `/`, `[` or `]` have no path and fail
    /// with `PathNotFound`.
    ///
    /// No remote round trip happens here; an instance the remote does not
    /// know surfaces `PathNotFound` on its first terminal operation.
    pub fn lookup(&self, key: &str) -> Result<Container> {
        if !Segment::is_valid_key(key) {
            return Err(Error::PathNotFound(format!(
                "invalid instance key '{}' under {}",
                key, self.0.path
            )));
        }

        let mut items = self.0.items.lock();
        if let Some(existing) = items.by_key.get(key) {
            return Ok(existing.clone());
        }

        let path = self.0.path.child(Segment::keyed(self.0.name.clone(), key));
        tracing::trace!(path = %path, "materializing named object");
        let container = Container::new(self.0.session.clone(), self.0.element.clone(), path);
        items.by_key.insert(key.to_string(), container.clone());
        items.order.push(key.to_string());
        Ok(container)
    }

    /// Like [`lookup`](Self::lookup), but first asks the remote whether `key` exists.
    pub fn lookup_checked(&self, key: &str) -> Result<Container> {
        if !self.keys()?.iter().any(|k| k == key) {
            return Err(Error::PathNotFound(format!(
                "no object '{}' in {}",
                key, self.0.path
            )));
        }
        self.lookup(key)
    }

    /// The remote's current keys, in the remote's order.
    pub fn keys(&self) -> Result<Vec<String>> {
        let service = self.0.session.service()?;
        Ok(service.child_keys(&self.0.path)?)
    }

    /// Keys materialized locally so far, in first-lookup order.
    pub fn materialized_keys(&self) -> Vec<String> {
        self.0.items.lock().order.clone()
    }
}

impl std::fmt::Debug for NamedObjectContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedObjectContainer")
            .field("element", &self.0.element)
            .field("path", &self.0.path.to_string())
            .finish()
    }
}
