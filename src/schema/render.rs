//! ASCII tree rendering for schema descriptors.

use super::{NodeDecl, SchemaDescriptor, Signature};

const CONTAINER: char = '○';
const NAMED_OBJECT: char = '◎';
const PARAMETER: char = '•';
const COMMAND: char = '▶';

/// Get the symbol for a node kind.
fn node_symbol(node: &NodeDecl) -> char {
    match node {
        NodeDecl::Container { .. } => CONTAINER,
        NodeDecl::NamedObject { .. } => NAMED_OBJECT,
        NodeDecl::Parameter(_) => PARAMETER,
        NodeDecl::Command(_) => COMMAND,
    }
}

/// Render the subtree rooted at `type_id` as ASCII art.
///
/// Example output:
/// ```text
/// reference_values
/// ├── • Area: float
/// └── ○ AirDirection
///     ├── • LiftAxis: string (read-only)
///     └── ▶ SetAirDirection(aoa: float, lift: string) -> bool
/// ```
///
/// Named-object containers show their element type's children once, under
/// a `Name[*]` placeholder. Types that contain themselves are cut off with
/// `(recursive)`.
pub fn render_schema(schema: &SchemaDescriptor, type_id: &str) -> String {
    let mut output = String::new();
    output.push_str(type_id);
    output.push('\n');
    if schema.get(type_id).is_some() {
        let mut stack = vec![type_id.to_string()];
        render_type(&mut output, schema, type_id, "", &mut stack);
    }
    output
}

/// Recursively render the children of a type.
fn render_type(
    output: &mut String,
    schema: &SchemaDescriptor,
    type_id: &str,
    prefix: &str,
    stack: &mut Vec<String>,
) {
    let Some(decl) = schema.get(type_id) else {
        return;
    };

    for (i, child) in decl.children.iter().enumerate() {
        let is_last = i == decl.children.len() - 1;
        let branch = if is_last { "└── " } else { "├── " };
        output.push_str(prefix);
        output.push_str(branch);
        output.push(node_symbol(&child.node));
        output.push(' ');
        output.push_str(&child.name);
        output.push_str(&describe(&child.node));
        if child.beta {
            output.push_str(" [beta]");
        }
        if child.advanced {
            output.push_str(" [advanced]");
        }

        let continuation = if is_last { "    " } else { "│   " };
        let child_prefix = format!("{}{}", prefix, continuation);

        match &child.node {
            NodeDecl::Container { type_id: target } => {
                descend(output, schema, None, target, &child_prefix, stack);
            }
            NodeDecl::NamedObject { element } => {
                let placeholder = format!("{}[*]", child.name);
                descend(output, schema, Some(placeholder.as_str()), element, &child_prefix, stack);
            }
            _ => output.push('\n'),
        }
    }
}

/// Finish the current line and render `target` below it, guarding recursion.
fn descend(
    output: &mut String,
    schema: &SchemaDescriptor,
    placeholder: Option<&str>,
    target: &str,
    prefix: &str,
    stack: &mut Vec<String>,
) {
    if stack.iter().any(|t| t == target) {
        output.push_str(" (recursive)\n");
        return;
    }
    output.push('\n');
    stack.push(target.to_string());
    match placeholder {
        Some(name) => {
            output.push_str(prefix);
            output.push_str("└── ");
            output.push(CONTAINER);
            output.push(' ');
            output.push_str(name);
            output.push('\n');
            let inner = format!("{}    ", prefix);
            render_type(output, schema, target, &inner, stack);
        }
        None => render_type(output, schema, target, prefix, stack),
    }
    stack.pop();
}

fn describe(node: &NodeDecl) -> String {
    match node {
        NodeDecl::Container { .. } | NodeDecl::NamedObject { .. } => String::new(),
        NodeDecl::Parameter(p) => {
            let mut text = format!(": {}", p.kind);
            if p.read_only {
                text.push_str(" (read-only)");
            }
            text
        }
        NodeDecl::Command(sig) => signature_text(sig),
    }
}

fn signature_text(sig: &Signature) -> String {
    let args: Vec<String> = sig
        .args
        .iter()
        .map(|a| {
            let optional = if a.required { "" } else { "?" };
            format!("{}{}: {}", a.name, optional, a.kind)
        })
        .collect();
    match sig.returns {
        Some(kind) => format!("({}) -> {}", args.join(", "), kind),
        None => format!("({})", args.join(", ")),
    }
}
