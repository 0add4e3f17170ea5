//! Typed proxy tree over a remote CFD solver's settings.
//!
//! A [`schema::SchemaDescriptor`] describes every container, named-object
//! collection, parameter and command the remote exposes. [`TreeBuilder`]
//! binds a descriptor to a [`ServiceHandle`] and hands back a [`Tree`] whose
//! nodes are navigated by name or key. Reading, writing, invoking and
//! listing keys each become one call on the service handle.
//!
//! ```ignore
//! use std::sync::Arc;
//! use settings_tree::{schema, InMemoryService, TreeBuilder};
//!
//! let service = Arc::new(InMemoryService::builtin());
//! let tree = TreeBuilder::new(service, schema::builtin())
//!     .root_path(schema::builtin::root_path())
//!     .build()?;
//!
//! let interval = tree
//!     .root()
//!     .container("App")?
//!     .container("GlobalSettings")?
//!     .parameter("PlotInterval")?;
//! interval.write(25)?;
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod schema;
pub mod script;
pub mod service;
pub mod tree;

pub use error::{Error, ErrorKind, Result};
pub use model::{Path, Segment, Value, ValueKind};
pub use schema::SchemaDescriptor;
pub use service::{ArgMap, InMemoryService, ServiceError, ServiceHandle};
pub use tree::{Command, Container, NamedObjectContainer, Node, Parameter, Tree, TreeBuilder, TreeState};
