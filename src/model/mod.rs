//! Identity and value types shared by every layer of the tree.
//!
//! - [`Path`]: ordered `(name, key)` segments addressing a remote node.
//!   Indexed segments carry the key a named-object instance was looked up with.
//! - [`ValueKind`]: the closed set of kinds a parameter or command argument declares.
//! - [`Value`]: a tagged value of one of those kinds, with local coercion rules.

mod path;
mod value;

pub use path::*;
pub use value::*;
