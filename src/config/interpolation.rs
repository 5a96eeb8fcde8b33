//! Variable interpolation for step parameters.
//!
//! Parameter strings may reference the step's runtime input, the process
//! environment, or run metadata using `${namespace.path}` syntax.
//!
//! # Syntax
//!
//! - `${input}` - the whole step input
//! - `${input.field.nested}` - a field of the input (array indexes allowed)
//! - `${env.NAME}` - an environment variable
//! - `${metadata.key}` - a run metadata value
//! - `$${escaped}` - produces literal `${escaped}` in output
//!
//! A string that is exactly one reference is replaced by the referenced JSON
//! value, keeping its type; otherwise values are spliced in as text.
//!
//! # Example
//!
//! ```yaml
//! params:
//!   command: "echo Deploying ${input.version}"
//! ```

use crate::error::{Result, StepwiseError};
use crate::steps::Metadata;
use serde_json::Value;
use std::collections::HashSet;

/// Namespaces a reference may start with.
pub const NAMESPACES: &[&str] = &["input", "env", "metadata"];

/// A segment of an interpolated string.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Variable reference: ${name}
    Variable(String),
}

/// Parse a string containing ${var} interpolations.
pub fn parse_interpolation(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut chars = input.chars().peekable();
    let mut current_literal = String::new();

    while let Some(c) = chars.next() {
        if c != '$' {
            current_literal.push(c);
            continue;
        }

        match chars.peek() {
            Some('$') => {
                chars.next();
                if chars.peek() == Some(&'{') {
                    // $${...} -> literal ${...}
                    chars.next();
                    current_literal.push_str("${");
                    for c in chars.by_ref() {
                        current_literal.push(c);
                        if c == '}' {
                            break;
                        }
                    }
                } else {
                    current_literal.push('$');
                }
            }
            Some('{') => {
                chars.next();

                if !current_literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut current_literal)));
                }

                let mut var_name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    var_name.push(c);
                }

                segments.push(Segment::Variable(var_name.trim().to_string()));
            }
            _ => current_literal.push(c),
        }
    }

    if !current_literal.is_empty() {
        segments.push(Segment::Literal(current_literal));
    }

    segments
}

/// Extract all variable names from an interpolated string.
pub fn extract_variables(input: &str) -> HashSet<String> {
    parse_interpolation(input)
        .into_iter()
        .filter_map(|seg| match seg {
            Segment::Variable(name) => Some(name),
            _ => None,
        })
        .collect()
}

/// Check if a string contains any interpolation.
pub fn has_interpolation(input: &str) -> bool {
    parse_interpolation(input)
        .iter()
        .any(|seg| matches!(seg, Segment::Variable(_)))
}

/// Check that a variable name starts with a known namespace.
pub fn is_known_variable(name: &str) -> bool {
    let namespace = name.split('.').next().unwrap_or_default();
    NAMESPACES.contains(&namespace)
}

/// Values references are resolved against.
#[derive(Debug, Clone, Copy)]
pub struct InterpolationContext<'a> {
    /// Runtime input of the step.
    pub input: &'a Value,
    /// Run metadata.
    pub metadata: &'a Metadata,
}

impl<'a> InterpolationContext<'a> {
    pub fn new(input: &'a Value, metadata: &'a Metadata) -> Self {
        Self { input, metadata }
    }

    /// Resolve a variable name to its value.
    pub fn resolve(&self, name: &str) -> Option<Value> {
        let (namespace, path) = match name.split_once('.') {
            Some((namespace, path)) => (namespace, Some(path)),
            None => (name, None),
        };

        match (namespace, path) {
            ("input", None) => Some(self.input.clone()),
            ("input", Some(path)) => lookup_path(self.input, path).cloned(),
            ("env", Some(var)) => std::env::var(var).ok().map(Value::String),
            ("metadata", Some(path)) => {
                let (key, rest) = match path.split_once('.') {
                    Some((key, rest)) => (key, Some(rest)),
                    None => (path, None),
                };
                let value = self.metadata.get(key)?;
                match rest {
                    Some(rest) => lookup_path(value, rest).cloned(),
                    None => Some(value.clone()),
                }
            }
            _ => None,
        }
    }
}

fn lookup_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        Value::Object(map) => map.get(segment),
        _ => None,
    })
}

fn unresolved(name: &str) -> StepwiseError {
    StepwiseError::ConfigValidationError {
        message: format!("Unresolved variable: ${{{}}}", name),
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Resolve all variables in an interpolated string.
///
/// # Errors
///
/// Returns `ConfigValidationError` if any variable cannot be resolved.
pub fn resolve_string(input: &str, context: &InterpolationContext<'_>) -> Result<Value> {
    let segments = parse_interpolation(input);

    if let [Segment::Variable(name)] = segments.as_slice() {
        return context.resolve(name).ok_or_else(|| unresolved(name));
    }

    let mut result = String::new();
    for segment in segments {
        match segment {
            Segment::Literal(text) => result.push_str(&text),
            Segment::Variable(name) => {
                let value = context.resolve(&name).ok_or_else(|| unresolved(&name))?;
                result.push_str(&as_text(&value));
            }
        }
    }

    Ok(Value::String(result))
}

/// Resolve every string inside a JSON parameter tree.
pub fn resolve_value(params: &Value, context: &InterpolationContext<'_>) -> Result<Value> {
    match params {
        Value::String(s) if s.contains('$') => resolve_string(s, context),
        Value::Array(items) => items
            .iter()
            .map(|item| resolve_value(item, context))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| Ok((k.clone(), resolve_value(v, context)?)))
            .collect::<Result<serde_json::Map<_, _>>>()
            .map(Value::Object),
        other => Ok(other.clone()),
    }
}
