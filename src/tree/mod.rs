//! Runtime proxy tree.
//!
//! # Core Concepts
//!
//! - [`Tree`]: owns the root [`Container`] and the shared session state. A tree
//!   is *Bound* until [`Tree::detach`] is called; afterwards every terminal
//!   operation fails with [`Error::ServiceClosed`] without touching the service.
//! - [`Container`]: a namespace with fixed, schema-declared children.
//! - [`NamedObjectContainer`]: a string-keyed set of containers sharing one type.
//! - [`Parameter`]: a typed leaf; reads and writes go to the service.
//! - [`Command`]: a typed remote operation with a named-argument signature.
//!
//! Children are materialized on first access and kept for the life of their
//! parent, so repeated access yields the same node (see [`Node::same_node`]).
//! Nodes hold identity only; no parameter value is ever cached.

mod builder;
mod command;
mod container;
mod parameter;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::Path;
use crate::schema::SchemaDescriptor;
use crate::service::ServiceHandle;

pub use builder::TreeBuilder;
pub use command::Command;
pub use container::{Container, NamedObjectContainer};
pub use parameter::Parameter;

/// State shared by every node of one tree.
pub(crate) struct Session {
    service: Arc<dyn ServiceHandle>,
    schema: Arc<SchemaDescriptor>,
    detached: AtomicBool,
}

impl Session {
    pub(crate) fn new(service: Arc<dyn ServiceHandle>, schema: Arc<SchemaDescriptor>) -> Self {
        Self {
            service,
            schema,
            detached: AtomicBool::new(false),
        }
    }

    /// The service handle, unless the tree has been detached.
    pub(crate) fn service(&self) -> Result<&dyn ServiceHandle> {
        if self.detached.load(Ordering::Acquire) {
            return Err(Error::ServiceClosed);
        }
        Ok(self.service.as_ref())
    }

    pub(crate) fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }
}

/// Whether terminal operations may reach the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeState {
    Bound,
    Detached,
}

/// A child slot's node, tagged by kind.
#[derive(Clone)]
pub enum Node {
    Container(Container),
    NamedObjects(NamedObjectContainer),
    Parameter(Parameter),
    Command(Command),
}

impl Node {
    pub fn path(&self) -> &Path {
        match self {
            Self::Container(n) => n.path(),
            Self::NamedObjects(n) => n.path(),
            Self::Parameter(n) => n.path(),
            Self::Command(n) => n.path(),
        }
    }

    /// Name of the node kind, as used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Container(_) => "container",
            Self::NamedObjects(_) => "named-object container",
            Self::Parameter(_) => "parameter",
            Self::Command(_) => "command",
        }
    }

    /// True when both handles refer to the same materialized node.
    pub fn same_node(&self, other: &Node) -> bool {
        match (self, other) {
            (Self::Container(a), Self::Container(b)) => a.same_node(b),
            (Self::NamedObjects(a), Self::NamedObjects(b)) => a.same_node(b),
            (Self::Parameter(a), Self::Parameter(b)) => a.same_node(b),
            (Self::Command(a), Self::Command(b)) => a.same_node(b),
            _ => false,
        }
    }

    pub fn into_container(self) -> Result<Container> {
        match self {
            Self::Container(c) => Ok(c),
            other => Err(other.kind_error("container")),
        }
    }

    pub fn into_named_objects(self) -> Result<NamedObjectContainer> {
        match self {
            Self::NamedObjects(n) => Ok(n),
            other => Err(other.kind_error("named-object container")),
        }
    }

    pub fn into_parameter(self) -> Result<Parameter> {
        match self {
            Self::Parameter(p) => Ok(p),
            other => Err(other.kind_error("parameter")),
        }
    }

    pub fn into_command(self) -> Result<Command> {
        match self {
            Self::Command(c) => Ok(c),
            other => Err(other.kind_error("command")),
        }
    }

    fn kind_error(&self, expected: &'static str) -> Error {
        Error::NodeKind {
            name: self.path().to_string(),
            expected,
            found: self.label(),
        }
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Node::{}({})", self.label(), self.path())
    }
}

/// A proxy tree bound to one service handle.
pub struct Tree {
    session: Arc<Session>,
    root: Container,
}

impl Tree {
    pub fn root(&self) -> &Container {
        &self.root
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        self.session.schema()
    }

    pub fn state(&self) -> TreeState {
        if self.session.detached.load(Ordering::Acquire) {
            TreeState::Detached
        } else {
            TreeState::Bound
        }
    }

    /// Cut the tree off from its service. One-way; repeated calls are no-ops.
    pub fn detach(&self) {
        if !self.session.detached.swap(true, Ordering::AcqRel) {
            tracing::debug!(root = %self.root.path(), "tree detached");
        }
    }

    /// Navigate from the root to the node at `path`.
    ///
    /// `path` must start with the root's path. Keyed segments go through
    /// named-object lookup, so instances are materialized without a remote
    /// existence check.
    pub fn resolve(&self, path: &Path) -> Result<Node> {
        let rest = path.strip_prefix(self.root.path()).ok_or_else(|| {
            Error::PathNotFound(format!("{} is outside the tree rooted at {}", path, self.root.path()))
        })?;

        let mut node = Node::Container(self.root.clone());
        for segment in rest {
            node = match node {
                Node::Container(c) if !segment.is_keyed() => c.child(&segment.name)?,
                Node::NamedObjects(n) if segment.is_keyed() && segment.name == n.name() => {
                    Node::Container(n.lookup(&segment.key)?)
                }
                other => {
                    return Err(Error::PathNotFound(format!(
                        "no segment '{}' below {} {}",
                        segment,
                        other.label(),
                        other.path()
                    )))
                }
            };
        }
        Ok(node)
    }
}
