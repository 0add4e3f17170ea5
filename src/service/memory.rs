//! A schema-driven stand-in for the remote solver.
//!
//! [`InMemoryService`] keeps parameter values and named-object keys in a
//! map, validates every request against the same [`SchemaDescriptor`] the
//! tree uses, and enforces the declaration metadata the tree ignores
//! (`read_only`, `allowed_values`, `range`). Each request is appended to a
//! call log so callers can assert which operations reached the "wire".

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{ArgMap, ServiceError, ServiceHandle};
use crate::model::{Path, Segment, Value};
use crate::schema::{ParameterDecl, Resolved, SchemaDescriptor, Signature};

/// Request kinds recorded in the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Set,
    Invoke,
    ChildKeys,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Invoke => "invoke",
            Self::ChildKeys => "child_keys",
        })
    }
}

/// One request as it arrived at the service.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub operation: Operation,
    pub path: Path,
}

type Handler = Arc<dyn Fn(&ArgMap) -> Result<Option<Value>, ServiceError> + Send + Sync>;

#[derive(Default)]
struct State {
    values: HashMap<Path, Value>,
    objects: HashMap<Path, Vec<String>>,
    handlers: HashMap<Path, Handler>,
    calls: Vec<Call>,
    failure: Option<ServiceError>,
}

pub struct InMemoryService {
    schema: Arc<SchemaDescriptor>,
    root: Path,
    state: Mutex<State>,
    cancelled: AtomicBool,
}

impl InMemoryService {
    /// A service whose root container of `schema` lives at `root`.
    pub fn new(schema: Arc<SchemaDescriptor>, root: Path) -> Self {
        Self {
            schema,
            root,
            state: Mutex::new(State::default()),
            cancelled: AtomicBool::new(false),
        }
    }

    /// A service for the builtin case tree, rooted at `/Case`.
    pub fn builtin() -> Self {
        Self::new(crate::schema::builtin(), crate::schema::builtin::root_path())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ============================================================
    // Remote-side administration (not recorded as calls)
    // ============================================================

    /// Store a parameter value directly, bypassing `read_only` and the
    /// domain checks. The value must still fit the declared kind.
    pub fn seed(&self, path: &Path, value: impl Into<Value>) -> Result<(), ServiceError> {
        let mut state = self.state.lock();
        let decl = self.parameter_at(&state, path)?;
        let value = coerce(path, decl, value.into())?;
        state.values.insert(path.clone(), value);
        Ok(())
    }

    /// The stored value at `path`, if one was ever set.
    pub fn stored(&self, path: &Path) -> Option<Value> {
        self.state.lock().values.get(path).cloned()
    }

    /// Add an instance to the named-object container at `path`.
    pub fn create_object(&self, path: &Path, key: &str) -> Result<(), ServiceError> {
        let mut state = self.state.lock();
        self.named_object_at(&state, path)?;
        if !Segment::is_valid_key(key) {
            return Err(ServiceError::Validation(format!(
                "invalid object name '{}' in {}",
                key, path
            )));
        }
        let keys = state.objects.entry(path.clone()).or_default();
        if keys.iter().any(|k| k == key) {
            return Err(ServiceError::Validation(format!(
                "object '{}' already exists in {}",
                key, path
            )));
        }
        keys.push(key.to_string());
        Ok(())
    }

    /// Remove an instance and everything stored below it.
    pub fn delete_object(&self, path: &Path, key: &str) -> Result<(), ServiceError> {
        let mut state = self.state.lock();
        let segment_name = match self.named_object_at(&state, path)? {
            Resolved::NamedObject { name, .. } => name.to_string(),
            _ => unreachable!("named_object_at only returns named-object containers"),
        };
        let keys = state.objects.entry(path.clone()).or_default();
        let Some(index) = keys.iter().position(|k| k == key) else {
            return Err(ServiceError::PathNotFound(format!(
                "no object '{}' in {}",
                key, path
            )));
        };
        keys.remove(index);

        let instance = path.child(Segment::keyed(segment_name, key));
        state.values.retain(|p, _| !p.starts_with(&instance));
        state.objects.retain(|p, _| !p.starts_with(&instance));
        state.handlers.retain(|p, _| !p.starts_with(&instance));
        Ok(())
    }

    /// Run `handler` whenever the command at `path` is invoked.
    ///
    /// Without a handler a command answers with the default value of its
    /// return kind.
    pub fn on_command<F>(&self, path: &Path, handler: F)
    where
        F: Fn(&ArgMap) -> Result<Option<Value>, ServiceError> + Send + Sync + 'static,
    {
        self.state.lock().handlers.insert(path.clone(), Arc::new(handler));
    }

    /// Make the next request fail with `error`.
    pub fn inject_failure(&self, error: ServiceError) {
        self.state.lock().failure = Some(error);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    // ============================================================
    // Request plumbing
    // ============================================================

    /// Log the request and apply pending cancellation or injected failure.
    fn begin(&self, state: &mut State, operation: Operation, path: &Path) -> Result<(), ServiceError> {
        tracing::debug!(op = %operation, path = %path, "service call");
        state.calls.push(Call {
            operation,
            path: path.clone(),
        });
        if self.cancelled.swap(false, Ordering::AcqRel) {
            return Err(ServiceError::Cancelled);
        }
        match state.failure.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Walk `path` through the schema, checking instance keys against the
    /// objects that currently exist.
    fn locate(&self, state: &State, path: &Path) -> Result<Resolved<'_>, ServiceError> {
        let not_found = || ServiceError::PathNotFound(path.to_string());
        let rest = path.strip_prefix(&self.root).ok_or_else(not_found)?;
        let mut at = Resolved::Container(self.schema.root_decl().ok_or_else(not_found)?);
        let mut walked = self.root.clone();
        for segment in rest {
            if segment.is_keyed() {
                let exists = state
                    .objects
                    .get(&walked)
                    .is_some_and(|keys| keys.iter().any(|k| *k == segment.key));
                if !exists {
                    return Err(not_found());
                }
            }
            at = self.schema.step(at, segment).ok_or_else(not_found)?;
            walked = walked.child(segment.clone());
        }
        Ok(at)
    }

    fn parameter_at(&self, state: &State, path: &Path) -> Result<&ParameterDecl, ServiceError> {
        match self.locate(state, path)? {
            Resolved::Parameter(child) => child
                .as_parameter()
                .ok_or_else(|| not_a(path, "parameter")),
            _ => Err(not_a(path, "parameter")),
        }
    }

    fn named_object_at(&self, state: &State, path: &Path) -> Result<Resolved<'_>, ServiceError> {
        match self.locate(state, path)? {
            found @ Resolved::NamedObject { .. } => Ok(found),
            _ => Err(not_a(path, "named-object container")),
        }
    }

    fn command_at(&self, state: &State, path: &Path) -> Result<&Signature, ServiceError> {
        match self.locate(state, path)? {
            Resolved::Command(child) => child.as_command().ok_or_else(|| not_a(path, "command")),
            _ => Err(not_a(path, "command")),
        }
    }
}

fn not_a(path: &Path, what: &str) -> ServiceError {
    ServiceError::KindMismatch(format!("{} is not a {}", path, what))
}

fn coerce(path: &Path, decl: &ParameterDecl, value: Value) -> Result<Value, ServiceError> {
    value
        .coerce(decl.kind)
        .map_err(|e| ServiceError::KindMismatch(format!("{}: {}", path, e)))
}

/// Domain checks the remote applies to writes.
fn check_constraints(path: &Path, decl: &ParameterDecl, value: &Value) -> Result<(), ServiceError> {
    if let Some(allowed) = &decl.allowed_values {
        let strings: Vec<&str> = match value {
            Value::String(s) => vec![s.as_str()],
            Value::StringList(items) => items.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        };
        if let Some(bad) = strings.iter().copied().find(|s| !allowed.iter().any(|a| a == s)) {
            return Err(ServiceError::Validation(format!(
                "{}: '{}' is not one of [{}]",
                path,
                bad,
                allowed.join(", ")
            )));
        }
    }

    if let Some((min, max)) = decl.range {
        let numbers: Vec<f64> = match value {
            Value::Int(i) => vec![*i as f64],
            Value::Float(f) => vec![*f],
            Value::IntList(items) => items.iter().map(|i| *i as f64).collect(),
            Value::FloatList(items) => items.clone(),
            _ => Vec::new(),
        };
        if let Some(bad) = numbers.iter().find(|n| **n < min || **n > max) {
            return Err(ServiceError::Validation(format!(
                "{}: {} is outside [{}, {}]",
                path, bad, min, max
            )));
        }
    }
    Ok(())
}

/// Server-side argument checking. Mirrors what the tree does before sending.
fn check_args(path: &Path, sig: &Signature, args: ArgMap) -> Result<ArgMap, ServiceError> {
    for name in args.keys() {
        if sig.arg_decl(name).is_none() {
            return Err(ServiceError::SignatureMismatch(format!(
                "{}: unexpected argument '{}'",
                path, name
            )));
        }
    }
    if let Some(missing) = sig.required_args().find(|a| !args.contains_key(&a.name)) {
        return Err(ServiceError::SignatureMismatch(format!(
            "{}: missing argument '{}'",
            path, missing.name
        )));
    }

    let mut checked = ArgMap::new();
    for (name, value) in args {
        let Some(decl) = sig.arg_decl(&name) else {
            continue;
        };
        let value = value.coerce(decl.kind).map_err(|e| {
            ServiceError::SignatureMismatch(format!("{}: argument '{}': {}", path, name, e))
        })?;
        checked.insert(name, value);
    }
    Ok(checked)
}

impl ServiceHandle for InMemoryService {
    fn get(&self, path: &Path) -> Result<Value, ServiceError> {
        let mut state = self.state.lock();
        self.begin(&mut state, Operation::Get, path)?;
        let decl = self.parameter_at(&state, path)?;
        Ok(state
            .values
            .get(path)
            .cloned()
            .unwrap_or_else(|| decl.kind.default_value()))
    }

    fn set(&self, path: &Path, value: Value) -> Result<(), ServiceError> {
        let mut state = self.state.lock();
        self.begin(&mut state, Operation::Set, path)?;
        let decl = self.parameter_at(&state, path)?;
        let value = coerce(path, decl, value)?;
        if decl.read_only {
            return Err(ServiceError::Immutable(format!("{} is read-only", path)));
        }
        check_constraints(path, decl, &value)?;
        state.values.insert(path.clone(), value);
        Ok(())
    }

    fn invoke(&self, path: &Path, args: ArgMap) -> Result<Option<Value>, ServiceError> {
        let (returns, handler, args) = {
            let mut state = self.state.lock();
            self.begin(&mut state, Operation::Invoke, path)?;
            let sig = self.command_at(&state, path)?;
            let args = check_args(path, sig, args)?;
            (sig.returns, state.handlers.get(path).cloned(), args)
        };

        match handler {
            Some(handler) => (*handler)(&args),
            None => Ok(returns.map(|kind| kind.default_value())),
        }
    }

    fn child_keys(&self, path: &Path) -> Result<Vec<String>, ServiceError> {
        let mut state = self.state.lock();
        self.begin(&mut state, Operation::ChildKeys, path)?;
        self.named_object_at(&state, path)?;
        Ok(state.objects.get(path).cloned().unwrap_or_default())
    }

    fn cancel(&self) {
        tracing::debug!("cancel requested");
        self.cancelled.store(true, Ordering::Release);
    }
}
