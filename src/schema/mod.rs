//! Static description of the remote settings tree.
//!
//! A [`SchemaDescriptor`] lists every container type the tree can contain.
//! Each [`TypeDecl`] owns an ordered list of [`ChildDecl`]s, and each child
//! is one of four node kinds:
//!
//! - a singleton container of another type,
//! - a named-object container whose keyed instances share one element type,
//! - a typed parameter,
//! - a command with a typed argument signature.
//!
//! The runtime tree is generic; all per-type structure lives here. Descriptors
//! come from the builtin table ([`builtin()`]), from JSON
//! ([`SchemaDescriptor::from_json`]), or are assembled with the fluent
//! constructors on [`TypeDecl`] and [`ChildDecl`].

pub mod builtin;
pub mod render;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Segment, ValueKind};

pub use builtin::builtin;

fn is_false(b: &bool) -> bool {
    !*b
}

fn default_true() -> bool {
    true
}

/// Declaration of a parameter leaf.
///
/// `read_only`, `allowed_values` and `range` describe what the remote
/// enforces. The proxy tree never checks them locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDecl {
    pub kind: ValueKind,
    #[serde(default, skip_serializing_if = "is_false")]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<(f64, f64)>,
}

impl ParameterDecl {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            read_only: false,
            allowed_values: None,
            range: None,
        }
    }
}

/// One declared command argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgDecl {
    pub name: String,
    pub kind: ValueKind,
    #[serde(default = "default_true")]
    pub required: bool,
}

/// Ordered argument list plus optional return kind of a command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub args: Vec<ArgDecl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<ValueKind>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a required argument.
    pub fn arg(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.args.push(ArgDecl {
            name: name.into(),
            kind,
            required: true,
        });
        self
    }

    /// Append an optional argument.
    pub fn optional(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.args.push(ArgDecl {
            name: name.into(),
            kind,
            required: false,
        });
        self
    }

    pub fn returns(mut self, kind: ValueKind) -> Self {
        self.returns = Some(kind);
        self
    }

    pub fn arg_decl(&self, name: &str) -> Option<&ArgDecl> {
        self.args.iter().find(|a| a.name == name)
    }

    pub fn required_args(&self) -> impl Iterator<Item = &ArgDecl> {
        self.args.iter().filter(|a| a.required)
    }
}

/// What kind of node a child slot holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum NodeDecl {
    Container { type_id: String },
    NamedObject { element: String },
    Parameter(ParameterDecl),
    Command(Signature),
}

impl NodeDecl {
    /// Name of the node kind, as used in error messages and renders.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Container { .. } => "container",
            Self::NamedObject { .. } => "named-object container",
            Self::Parameter(_) => "parameter",
            Self::Command(_) => "command",
        }
    }
}

/// A named child slot of a container type.
///
/// `beta` and `advanced` are advisory hints for user interfaces; they do not
/// change how the child is accessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildDecl {
    pub name: String,
    #[serde(flatten)]
    pub node: NodeDecl,
    #[serde(default, skip_serializing_if = "is_false")]
    pub beta: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub advanced: bool,
}

impl ChildDecl {
    fn new(name: impl Into<String>, node: NodeDecl) -> Self {
        Self {
            name: name.into(),
            node,
            beta: false,
            advanced: false,
        }
    }

    pub fn parameter(name: impl Into<String>, kind: ValueKind) -> Self {
        Self::new(name, NodeDecl::Parameter(ParameterDecl::new(kind)))
    }

    pub fn container(name: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self::new(
            name,
            NodeDecl::Container {
                type_id: type_id.into(),
            },
        )
    }

    pub fn named_object(name: impl Into<String>, element: impl Into<String>) -> Self {
        Self::new(
            name,
            NodeDecl::NamedObject {
                element: element.into(),
            },
        )
    }

    pub fn command(name: impl Into<String>, signature: Signature) -> Self {
        Self::new(name, NodeDecl::Command(signature))
    }

    pub fn beta(mut self) -> Self {
        self.beta = true;
        self
    }

    pub fn advanced(mut self) -> Self {
        self.advanced = true;
        self
    }

    /// Mark a parameter read-only on the remote. No effect on other nodes.
    pub fn read_only(mut self) -> Self {
        if let NodeDecl::Parameter(p) = &mut self.node {
            p.read_only = true;
        }
        self
    }

    /// Restrict a string parameter to a fixed set of values on the remote.
    pub fn allowed(mut self, values: &[&str]) -> Self {
        if let NodeDecl::Parameter(p) = &mut self.node {
            p.allowed_values = Some(values.iter().map(|v| v.to_string()).collect());
        }
        self
    }

    /// Bound a numeric parameter (or each element of a numeric list) on the remote.
    pub fn range(mut self, min: f64, max: f64) -> Self {
        if let NodeDecl::Parameter(p) = &mut self.node {
            p.range = Some((min, max));
        }
        self
    }

    pub fn as_parameter(&self) -> Option<&ParameterDecl> {
        match &self.node {
            NodeDecl::Parameter(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_command(&self) -> Option<&Signature> {
        match &self.node {
            NodeDecl::Command(s) => Some(s),
            _ => None,
        }
    }
}

/// A container type: an id plus its ordered child declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub id: String,
    #[serde(default)]
    pub children: Vec<ChildDecl>,
}

impl TypeDecl {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            children: Vec::new(),
        }
    }

    pub fn child(mut self, decl: ChildDecl) -> Self {
        self.children.push(decl);
        self
    }

    pub fn param(self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.child(ChildDecl::parameter(name, kind))
    }

    pub fn container(self, name: impl Into<String>, type_id: impl Into<String>) -> Self {
        self.child(ChildDecl::container(name, type_id))
    }

    pub fn named(self, name: impl Into<String>, element: impl Into<String>) -> Self {
        self.child(ChildDecl::named_object(name, element))
    }

    pub fn command(self, name: impl Into<String>, signature: Signature) -> Self {
        self.child(ChildDecl::command(name, signature))
    }

    pub fn find(&self, name: &str) -> Option<&ChildDecl> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Where a path lands inside the schema.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    /// A singleton container, a named-object instance, or the root.
    Container(&'a TypeDecl),
    /// The named-object container itself; `name` is its declared name.
    NamedObject { name: &'a str, element: &'a TypeDecl },
    Parameter(&'a ChildDecl),
    Command(&'a ChildDecl),
}

#[derive(Deserialize)]
struct SchemaDocument {
    root: String,
    types: Vec<TypeDecl>,
}

/// The closed, immutable description of a settings tree.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaDescriptor {
    root: String,
    types: Vec<TypeDecl>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl PartialEq for SchemaDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.types == other.types
    }
}

impl SchemaDescriptor {
    /// Assemble a descriptor. Consistency is checked by [`validate`](Self::validate).
    pub fn new(root: impl Into<String>, types: Vec<TypeDecl>) -> Self {
        let mut index = HashMap::with_capacity(types.len());
        for (i, t) in types.iter().enumerate() {
            index.entry(t.id.clone()).or_insert(i);
        }
        Self {
            root: root.into(),
            types,
            index,
        }
    }

    /// Parse a JSON document of the form `{"root": "...", "types": [...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: SchemaDocument = serde_json::from_str(json)
            .map_err(|e| Error::SchemaError(format!("invalid schema document: {}", e)))?;
        Ok(Self::new(doc.root, doc.types))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::SchemaError(format!("failed to serialize schema: {}", e)))
    }

    pub fn root_type(&self) -> &str {
        &self.root
    }

    pub fn root_decl(&self) -> Option<&TypeDecl> {
        self.get(&self.root)
    }

    pub fn get(&self, type_id: &str) -> Option<&TypeDecl> {
        self.index.get(type_id).map(|&i| &self.types[i])
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.types.iter()
    }

    fn children_of(&self, type_id: &str) -> &[ChildDecl] {
        self.get(type_id).map(|t| t.children.as_slice()).unwrap_or(&[])
    }

    pub fn parameter_decls<'a>(
        &'a self,
        type_id: &str,
    ) -> impl Iterator<Item = (&'a str, &'a ParameterDecl)> {
        self.children_of(type_id)
            .iter()
            .filter_map(|c| c.as_parameter().map(|p| (c.name.as_str(), p)))
    }

    pub fn container_decls<'a>(&'a self, type_id: &str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.children_of(type_id).iter().filter_map(|c| match &c.node {
            NodeDecl::Container { type_id } => Some((c.name.as_str(), type_id.as_str())),
            _ => None,
        })
    }

    pub fn named_object_decls<'a>(
        &'a self,
        type_id: &str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.children_of(type_id).iter().filter_map(|c| match &c.node {
            NodeDecl::NamedObject { element } => Some((c.name.as_str(), element.as_str())),
            _ => None,
        })
    }

    pub fn command_decls<'a>(
        &'a self,
        type_id: &str,
    ) -> impl Iterator<Item = (&'a str, &'a Signature)> {
        self.children_of(type_id)
            .iter()
            .filter_map(|c| c.as_command().map(|s| (c.name.as_str(), s)))
    }

    /// Check that the descriptor is internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.get(&self.root).is_none() {
            return Err(schema_error(format!("root type '{}' is not declared", self.root)));
        }

        let mut seen_types = HashSet::new();
        for t in &self.types {
            if t.id.is_empty() {
                return Err(schema_error("empty type id".to_string()));
            }
            if !seen_types.insert(t.id.as_str()) {
                return Err(schema_error(format!("duplicate type id '{}'", t.id)));
            }
            self.validate_type(t)?;
        }
        Ok(())
    }

    fn validate_type(&self, t: &TypeDecl) -> Result<()> {
        let mut names = HashSet::new();
        for child in &t.children {
            validate_name(&t.id, &child.name)?;
            if !names.insert(child.name.as_str()) {
                return Err(schema_error(format!(
                    "duplicate child '{}' in type '{}'",
                    child.name, t.id
                )));
            }
            match &child.node {
                NodeDecl::Container { type_id: target } | NodeDecl::NamedObject { element: target } => {
                    if self.get(target).is_none() {
                        return Err(schema_error(format!(
                            "'{}.{}' refers to undeclared type '{}'",
                            t.id, child.name, target
                        )));
                    }
                }
                NodeDecl::Parameter(p) => validate_parameter(&t.id, &child.name, p)?,
                NodeDecl::Command(sig) => {
                    let mut args = HashSet::new();
                    for arg in &sig.args {
                        if arg.name.is_empty() {
                            return Err(schema_error(format!(
                                "command '{}.{}' has an unnamed argument",
                                t.id, child.name
                            )));
                        }
                        if !args.insert(arg.name.as_str()) {
                            return Err(schema_error(format!(
                                "command '{}.{}' declares argument '{}' twice",
                                t.id, child.name, arg.name
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Follow `segments` from the root type.
    ///
    /// A keyed segment is only valid directly below a named-object container
    /// and must repeat that container's name. Instance keys are not checked
    /// against any remote state here.
    pub fn resolve(&self, segments: &[Segment]) -> Option<Resolved<'_>> {
        let mut at = Resolved::Container(self.root_decl()?);
        for segment in segments {
            at = self.step(at, segment)?;
        }
        Some(at)
    }

    /// One step of [`resolve`](Self::resolve).
    pub fn step<'a>(&'a self, at: Resolved<'a>, segment: &Segment) -> Option<Resolved<'a>> {
        match at {
            Resolved::Container(t) => {
                if segment.is_keyed() {
                    return None;
                }
                let child = t.find(&segment.name)?;
                Some(match &child.node {
                    NodeDecl::Container { type_id } => Resolved::Container(self.get(type_id)?),
                    NodeDecl::NamedObject { element } => Resolved::NamedObject {
                        name: child.name.as_str(),
                        element: self.get(element)?,
                    },
                    NodeDecl::Parameter(_) => Resolved::Parameter(child),
                    NodeDecl::Command(_) => Resolved::Command(child),
                })
            }
            Resolved::NamedObject { name, element } => {
                if segment.is_keyed() && segment.name == name {
                    Some(Resolved::Container(element))
                } else {
                    None
                }
            }
            Resolved::Parameter(_) | Resolved::Command(_) => None,
        }
    }
}

fn schema_error(msg: String) -> Error {
    Error::SchemaError(msg)
}

fn validate_name(type_id: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(schema_error(format!("type '{}' has an unnamed child", type_id)));
    }
    if name.contains(['/', '[', ']']) {
        return Err(schema_error(format!(
            "child name '{}' in type '{}' contains a path delimiter",
            name, type_id
        )));
    }
    Ok(())
}

fn validate_parameter(type_id: &str, name: &str, p: &ParameterDecl) -> Result<()> {
    if p.allowed_values.is_some() && !matches!(p.kind, ValueKind::String | ValueKind::StringList) {
        return Err(schema_error(format!(
            "'{}.{}' lists allowed values but has kind {}",
            type_id, name, p.kind
        )));
    }
    if let Some((min, max)) = p.range {
        if !matches!(
            p.kind,
            ValueKind::Int | ValueKind::Float | ValueKind::IntList | ValueKind::FloatList
        ) {
            return Err(schema_error(format!(
                "'{}.{}' has a range but kind {} is not numeric",
                type_id, name, p.kind
            )));
        }
        if !(min <= max) {
            return Err(schema_error(format!(
                "'{}.{}' has an inverted range [{}, {}]",
                type_id, name, min, max
            )));
        }
    }
    Ok(())
}
