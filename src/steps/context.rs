//! Execution context handed to every step.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::Span;

/// Caller-supplied keyed data carried through one execution.
pub type Metadata = Map<String, Value>;

/// Typed values attached to a context, keyed by their Rust type.
///
/// This is the extension point for collaborators that need more than JSON
/// (an HTTP client, a working directory, a shared counter in tests).
#[derive(Clone, Default)]
pub struct Attachments {
    inner: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Attachments {
    /// Create an empty set of attachments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a value, replacing any previous value of the same type.
    ///
    /// Returns `true` if a value of that type was already present.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> bool {
        self.inner
            .insert(TypeId::of::<T>(), Arc::new(value))
            .is_some()
    }

    /// Get the attached value of type `T`.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        let value = self.inner.get(&TypeId::of::<T>())?;
        let any: &(dyn Any + Send + Sync) = value.as_ref();
        any.downcast_ref::<T>()
    }

    /// Check whether a value of type `T` is attached.
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.inner.contains_key(&TypeId::of::<T>())
    }

    /// Number of attached values.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for Attachments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachments")
            .field("len", &self.inner.len())
            .finish()
    }
}

/// Logger scope, metadata, and attachments for one execution call.
///
/// The span plays the role of a scoped logger: workflows derive a child span
/// carrying their name and every step event is recorded inside it.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    span: Span,
    metadata: Metadata,
    attachments: Attachments,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext {
    /// Create a context scoped to the current span with no metadata.
    pub fn new() -> Self {
        Self::with_metadata(Metadata::new())
    }

    /// Create a context carrying the given metadata.
    pub fn with_metadata(metadata: Metadata) -> Self {
        Self {
            span: Span::current(),
            metadata,
            attachments: Attachments::new(),
        }
    }

    /// Attach a typed value (builder style).
    pub fn attach<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.attachments.insert(value);
        self
    }

    /// Derive a context whose span is a child scoped to `workflow`.
    pub fn child(&self, workflow: &str) -> Self {
        let span = tracing::info_span!(parent: &self.span, "workflow", workflow = %workflow);
        Self {
            span,
            metadata: self.metadata.clone(),
            attachments: self.attachments.clone(),
        }
    }

    /// The span events for this execution are recorded in.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// All metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Mutable access to metadata.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Look up a metadata value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Set a metadata value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    /// Typed attachments.
    pub fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    /// Mutable access to typed attachments.
    pub fn attachments_mut(&mut self) -> &mut Attachments {
        &mut self.attachments
    }
}
