//! Line-oriented scripts driving a tree bound to an [`InMemoryService`].
//!
//! ```text
//! # comments and blank lines are skipped
//! create /Case/App/BC inlet-1
//! set /Case/App/BC[inlet-1]/Type "velocity-inlet"
//! get /Case/App/GlobalSettings/PlotInterval
//! invoke /Case/App/ReferenceValues/AirDirection/SetAirDirection {"aoa": 2, "aos": 0, "mag": 75, "lift": "Y", "drag": "X"}
//! keys /Case/App/BC
//! detach
//! ```
//!
//! `create` and `delete` act on the service directly, the way another
//! client of the same remote would. Everything else goes through the tree.

use std::io::Write;

use thiserror::Error;

use crate::error::Error;
use crate::model::{Path, Value};
use crate::service::{ArgMap, InMemoryService, ServiceError};
use crate::tree::Tree;

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Get(Path),
    Set(Path, Value),
    Invoke(Path, ArgMap),
    Keys(Path),
    Create(Path, String),
    Delete(Path, String),
    Detach,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub number: usize,
    pub step: Step,
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("line {line}: {source}")]
    Tree {
        line: usize,
        #[source]
        source: Error,
    },

    #[error("line {line}: {source}")]
    Service {
        line: usize,
        #[source]
        source: ServiceError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScriptError {
    /// Line number the failure belongs to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { line, .. } | Self::Tree { line, .. } | Self::Service { line, .. } => {
                Some(*line)
            }
            Self::Io(_) => None,
        }
    }
}

/// Parse a whole script. Line numbers start at 1.
pub fn parse(text: &str) -> Result<Vec<Line>, ScriptError> {
    let mut lines = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let number = i + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let step = parse_step(trimmed).map_err(|message| ScriptError::Parse {
            line: number,
            message,
        })?;
        lines.push(Line { number, step });
    }
    Ok(lines)
}

fn parse_step(line: &str) -> Result<Step, String> {
    let (word, rest) = split_word(line);
    match word {
        "detach" if rest.is_empty() => Ok(Step::Detach),
        "detach" => Err("detach takes no arguments".to_string()),
        "get" => Ok(Step::Get(only_path(rest)?)),
        "keys" => Ok(Step::Keys(only_path(rest)?)),
        "set" => {
            let (path, json) = split_word(rest);
            if json.is_empty() {
                return Err("set needs a path and a JSON value".to_string());
            }
            Ok(Step::Set(parse_path(path)?, parse_value(json)?))
        }
        "invoke" => {
            let (path, json) = split_word(rest);
            let args = if json.is_empty() {
                ArgMap::new()
            } else {
                parse_args(json)?
            };
            Ok(Step::Invoke(parse_path(path)?, args))
        }
        "create" | "delete" => {
            let (path, key) = split_word(rest);
            if key.is_empty() {
                return Err(format!("{} needs a path and an object name", word));
            }
            let path = parse_path(path)?;
            let key = key.to_string();
            Ok(if word == "create" {
                Step::Create(path, key)
            } else {
                Step::Delete(path, key)
            })
        }
        other => Err(format!("unknown command '{}'", other)),
    }
}

fn split_word(s: &str) -> (&str, &str) {
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

fn only_path(rest: &str) -> Result<Path, String> {
    let (path, extra) = split_word(rest);
    if !extra.is_empty() {
        return Err(format!("unexpected trailing input '{}'", extra));
    }
    parse_path(path)
}

fn parse_path(s: &str) -> Result<Path, String> {
    if s.is_empty() {
        return Err("missing path".to_string());
    }
    s.parse().map_err(|e| format!("bad path '{}': {}", s, e))
}

fn parse_value(json: &str) -> Result<Value, String> {
    let raw: serde_json::Value =
        serde_json::from_str(json).map_err(|e| format!("bad JSON value: {}", e))?;
    Value::try_from(raw).map_err(|e| format!("unsupported value: {}", e))
}

fn parse_args(json: &str) -> Result<ArgMap, String> {
    let raw: serde_json::Value =
        serde_json::from_str(json).map_err(|e| format!("bad JSON arguments: {}", e))?;
    let serde_json::Value::Object(map) = raw else {
        return Err("command arguments must be a JSON object".to_string());
    };
    map.into_iter()
        .map(|(name, value)| {
            Value::try_from(value)
                .map(|v| (name.clone(), v))
                .map_err(|e| format!("argument '{}': {}", name, e))
        })
        .collect()
}

/// Run `lines` in order, writing one result line per step to `out`.
///
/// Stops at the first failing step. Returns the number of steps run.
pub fn run(
    tree: &Tree,
    service: &InMemoryService,
    lines: &[Line],
    out: &mut dyn Write,
) -> Result<usize, ScriptError> {
    for line in lines {
        tracing::debug!(line = line.number, step = ?line.step, "running script step");
        let result = execute(tree, service, line)?;
        writeln!(out, "{}", result)?;
    }
    Ok(lines.len())
}

fn execute(tree: &Tree, service: &InMemoryService, line: &Line) -> Result<String, ScriptError> {
    let on_tree = |source: Error| ScriptError::Tree {
        line: line.number,
        source,
    };
    let on_service = |source: ServiceError| ScriptError::Service {
        line: line.number,
        source,
    };

    match &line.step {
        Step::Get(path) => {
            let value = tree
                .resolve(path)
                .and_then(|n| n.into_parameter())
                .and_then(|p| p.read())
                .map_err(on_tree)?;
            Ok(value.to_string())
        }
        Step::Set(path, value) => {
            tree.resolve(path)
                .and_then(|n| n.into_parameter())
                .and_then(|p| p.write(value.clone()))
                .map_err(on_tree)?;
            Ok("ok".to_string())
        }
        Step::Invoke(path, args) => {
            let result = tree
                .resolve(path)
                .and_then(|n| n.into_command())
                .and_then(|c| c.invoke_map(args.clone()))
                .map_err(on_tree)?;
            Ok(match result {
                Some(value) => value.to_string(),
                None => "ok".to_string(),
            })
        }
        Step::Keys(path) => {
            let keys = tree
                .resolve(path)
                .and_then(|n| n.into_named_objects())
                .and_then(|n| n.keys())
                .map_err(on_tree)?;
            Ok(Value::StringList(keys).to_string())
        }
        Step::Create(path, key) => {
            service.create_object(path, key).map_err(on_service)?;
            Ok("ok".to_string())
        }
        Step::Delete(path, key) => {
            service.delete_object(path, key).map_err(on_service)?;
            Ok("ok".to_string())
        }
        Step::Detach => {
            tree.detach();
            Ok("detached".to_string())
        }
    }
}
