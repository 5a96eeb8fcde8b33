//! Input and output shape validation.

use std::fmt;
use std::sync::Arc;

use jsonschema::JSONSchema;
use serde_json::Value;

/// Checks that a value has the expected shape.
///
/// On failure the returned message is used verbatim in the step or
/// workflow error.
pub trait ShapeValidator: Send + Sync + fmt::Debug {
    fn validate(&self, value: &Value) -> Result<(), String>;
}

/// A compiled JSON Schema document.
pub struct JsonSchema {
    source: Value,
    compiled: JSONSchema,
}

impl JsonSchema {
    /// Compile a schema document.
    ///
    /// Returns the compiler's message when the document is not a valid schema.
    pub fn compile(schema: Value) -> Result<Self, String> {
        let compiled = JSONSchema::compile(&schema).map_err(|e| e.to_string())?;
        Ok(Self {
            source: schema,
            compiled,
        })
    }

    /// The schema document this validator was compiled from.
    pub fn source(&self) -> &Value {
        &self.source
    }
}

impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema")
            .field("source", &self.source)
            .finish()
    }
}

impl ShapeValidator for JsonSchema {
    fn validate(&self, value: &Value) -> Result<(), String> {
        if let Err(errors) = self.compiled.validate(value) {
            let messages: Vec<String> = errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{}: {}", path, e)
                    }
                })
                .collect();
            return Err(messages.join("; "));
        }
        Ok(())
    }
}

type ValidateFn = dyn Fn(&Value) -> Result<(), String> + Send + Sync;

/// A validator backed by a closure.
#[derive(Clone)]
pub struct FnValidator {
    name: String,
    check: Arc<ValidateFn>,
}

impl FnValidator {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }
}

impl fmt::Debug for FnValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValidator")
            .field("name", &self.name)
            .finish()
    }
}

impl ShapeValidator for FnValidator {
    fn validate(&self, value: &Value) -> Result<(), String> {
        (self.check)(value)
    }
}
