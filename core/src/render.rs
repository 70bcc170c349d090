//! Template rendering engine.
//!
//! Binds schema-derived variables and free text into template content.
//! The template language is deliberately small: literal passthrough,
//! `{{ name }}` substitution, and `{% for item in seq %} ... {% endfor %}`
//! loops over a named sequence. Rendering is deterministic, makes no
//! external calls, and fails only on template syntax errors.
//!
//! Bound variables:
//! - `text` — the raw input string
//! - `allowed_node_types` — sorted entity types from the schema
//! - `allowed_relations` — sorted relation types from the schema
//! - `allowed_triplets` — the raw triplet strings in original order

use std::collections::HashMap;

use crate::errors::RenderError;
use crate::types::ExtractionSchema;

/// A value bound into a template: either a plain string or a sequence.
///
/// Substituting a sequence renders it comma-separated; only sequences
/// may be iterated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Seq(Vec<String>),
}

/// Render template content against a schema and an input text.
pub fn render(
    content: &str,
    schema: &ExtractionSchema,
    text: &str,
) -> Result<String, RenderError> {
    let mut vars = HashMap::new();
    vars.insert("text".to_string(), Value::Str(text.to_string()));
    vars.insert(
        "allowed_node_types".to_string(),
        Value::Seq(schema.allowed_node_types()),
    );
    vars.insert(
        "allowed_relations".to_string(),
        Value::Seq(schema.allowed_relation_types()),
    );
    vars.insert(
        "allowed_triplets".to_string(),
        Value::Seq(schema.triplets.clone()),
    );
    render_with(content, &vars)
}

/// Render template content against an arbitrary set of bindings.
pub fn render_with(
    content: &str,
    vars: &HashMap<String, Value>,
) -> Result<String, RenderError> {
    let segments = parse(content)?;
    let mut out = String::with_capacity(content.len());
    emit(&segments, vars, &mut out)?;
    Ok(out)
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Subst(String),
    Loop {
        var: String,
        seq: String,
        body: Vec<Segment>,
    },
}

struct OpenLoop {
    var: String,
    seq: String,
    parent: Vec<Segment>,
}

fn parse(content: &str) -> Result<Vec<Segment>, RenderError> {
    let mut open_loops: Vec<OpenLoop> = Vec::new();
    let mut current: Vec<Segment> = Vec::new();
    let mut input = content;

    while !input.is_empty() {
        let next_subst = input.find("{{");
        let next_block = input.find("{%");
        let (tag_start, is_subst) = match (next_subst, next_block) {
            (None, None) => {
                current.push(Segment::Literal(input.to_string()));
                break;
            }
            (Some(s), None) => (s, true),
            (None, Some(b)) => (b, false),
            (Some(s), Some(b)) => {
                if s < b {
                    (s, true)
                } else {
                    (b, false)
                }
            }
        };

        if tag_start > 0 {
            current.push(Segment::Literal(input[..tag_start].to_string()));
        }

        if is_subst {
            let close = input[tag_start..]
                .find("}}")
                .ok_or_else(|| RenderError::Malformed("unclosed '{{' tag".to_string()))?
                + tag_start;
            let name = input[tag_start + 2..close].trim();
            if !is_identifier(name) {
                return Err(RenderError::Malformed(format!(
                    "invalid variable name: '{}'",
                    name
                )));
            }
            current.push(Segment::Subst(name.to_string()));
            input = &input[close + 2..];
        } else {
            let close = input[tag_start..]
                .find("%}")
                .ok_or_else(|| RenderError::Malformed("unclosed '{%' tag".to_string()))?
                + tag_start;
            let inner = input[tag_start + 2..close].trim();
            if inner == "endfor" {
                let open = open_loops.pop().ok_or_else(|| {
                    RenderError::Malformed("'endfor' without matching 'for'".to_string())
                })?;
                let body = std::mem::replace(&mut current, open.parent);
                current.push(Segment::Loop {
                    var: open.var,
                    seq: open.seq,
                    body,
                });
            } else {
                let (var, seq) = parse_for_header(inner)?;
                open_loops.push(OpenLoop {
                    var,
                    seq,
                    parent: std::mem::take(&mut current),
                });
            }
            input = &input[close + 2..];
        }
    }

    if let Some(open) = open_loops.last() {
        return Err(RenderError::Malformed(format!(
            "'for {} in {}' block is never closed",
            open.var, open.seq
        )));
    }
    Ok(current)
}

fn parse_for_header(inner: &str) -> Result<(String, String), RenderError> {
    let tokens: Vec<&str> = inner.split_whitespace().collect();
    match tokens.as_slice() {
        ["for", var, "in", seq] if is_identifier(var) && is_identifier(seq) => {
            Ok((var.to_string(), seq.to_string()))
        }
        _ => Err(RenderError::Malformed(format!(
            "invalid block tag: '{}'",
            inner
        ))),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn emit(
    segments: &[Segment],
    vars: &HashMap<String, Value>,
    out: &mut String,
) -> Result<(), RenderError> {
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Subst(name) => match vars.get(name) {
                Some(Value::Str(value)) => out.push_str(value),
                Some(Value::Seq(items)) => out.push_str(&items.join(", ")),
                None => return Err(RenderError::UndefinedVariable(name.clone())),
            },
            Segment::Loop { var, seq, body } => {
                let items = match vars.get(seq) {
                    Some(Value::Seq(items)) => items,
                    Some(Value::Str(_)) => {
                        return Err(RenderError::NotIterable(seq.clone()));
                    }
                    None => return Err(RenderError::UndefinedVariable(seq.clone())),
                };
                let mut scoped = vars.clone();
                for item in items {
                    scoped.insert(var.clone(), Value::Str(item.clone()));
                    emit(body, &scoped, out)?;
                }
            }
        }
    }
    Ok(())
}
