use std::sync::Arc;

use super::Session;
use crate::error::{Error, Result};
use crate::model::{Path, Value};
use crate::schema::{ChildDecl, Signature};
use crate::service::ArgMap;

struct CommandInner {
    session: Arc<Session>,
    decl: ChildDecl,
    path: Path,
}

/// A remote operation with a typed, named-argument signature.
#[derive(Clone)]
pub struct Command(Arc<CommandInner>);

impl Command {
    pub(crate) fn new(session: Arc<Session>, decl: ChildDecl, path: Path) -> Self {
        Self(Arc::new(CommandInner { session, decl, path }))
    }

    pub fn path(&self) -> &Path {
        &self.0.path
    }

    pub fn name(&self) -> &str {
        &self.0.decl.name
    }

    pub fn signature(&self) -> &Signature {
        match self.0.decl.as_command() {
            Some(sig) => sig,
            None => unreachable!("command node built from a non-command declaration"),
        }
    }

    pub fn same_node(&self, other: &Command) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Invoke with `(name, value)` pairs.
    ///
    /// ```ignore
    /// air_direction.command("SetAirDirection")?.invoke([
    ///     ("aoa", Value::from(2.5)),
    ///     ("aos", Value::from(0.0)),
    ///     ("mag", Value::from(75.0)),
    ///     ("lift", Value::from("Y")),
    ///     ("drag", Value::from("X")),
    /// ])?;
    /// ```
    pub fn invoke<I, K, V>(&self, args: I) -> Result<Option<Value>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.invoke_map(args.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Invoke with a prepared argument map.
    ///
    /// Arguments are checked against the signature before anything is sent:
    /// unknown names, missing required arguments and values of the wrong
    /// kind all fail with `SignatureMismatch`. The response is checked
    /// against the declared return kind; commands without one yield `None`.
    pub fn invoke_map(&self, args: ArgMap) -> Result<Option<Value>> {
        let service = self.0.session.service()?;
        let args = self.check_args(args)?;
        let response = service.invoke(&self.0.path, args)?;

        match (self.signature().returns, response) {
            (None, _) => Ok(None),
            (Some(kind), Some(value)) => value.coerce(kind).map(Some).map_err(|e| {
                Error::KindMismatch(format!("result of {}: {}", self.0.path, e))
            }),
            (Some(kind), None) => Err(Error::KindMismatch(format!(
                "result of {}: expected {}, found nothing",
                self.0.path, kind
            ))),
        }
    }

    fn check_args(&self, args: ArgMap) -> Result<ArgMap> {
        let sig = self.signature();

        if let Some(unknown) = args.keys().find(|name| sig.arg_decl(name).is_none()) {
            return Err(Error::SignatureMismatch(format!(
                "{} has no argument '{}'",
                self.0.path, unknown
            )));
        }

        let missing: Vec<&str> = sig
            .required_args()
            .filter(|a| !args.contains_key(&a.name))
            .map(|a| a.name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(Error::SignatureMismatch(format!(
                "{} is missing required argument(s): {}",
                self.0.path,
                missing.join(", ")
            )));
        }

        args.into_iter()
            .map(|(name, value)| {
                let kind = sig.arg_decl(&name).map(|a| a.kind);
                match kind {
                    Some(kind) => match value.coerce(kind) {
                        Ok(value) => Ok((name, value)),
                        Err(e) => Err(Error::SignatureMismatch(format!(
                            "argument '{}' of {}: {}",
                            name, self.0.path, e
                        ))),
                    },
                    None => Err(Error::SignatureMismatch(format!(
                        "{} has no argument '{}'",
                        self.0.path, name
                    ))),
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("path", &self.0.path.to_string())
            .finish()
    }
}
