//! Model Loader Dispatch - Type-Keyed Resolution
//!
//! Loaders are looked up by exact type identifier; the matched loader runs
//! with the candidate's load context bound for the duration of the call.
//! Failures are classified by data: an illegal-definition condition found
//! anywhere in the cause chain is unwrapped and propagated verbatim, every
//! other failure wraps as a generic resolution failure.

use crate::model::{CandidateDefinition, ExtensionModel};
use crate::scan::ScanEnvironment;
use std::collections::HashMap;
use std::error::Error;
use thiserror::Error;

pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Validation-level error: the definition's declared shape violates domain
/// rules. This is the primary user-facing error category and is never
/// reclassified or logged as an internal failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("illegal extension definition: {message}")]
pub struct IllegalModelDefinition {
    pub message: String,
}

impl IllegalModelDefinition {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Everything a loader needs beyond the raw definition. Read-only, passed
/// by reference, never mutated by loaders.
#[derive(Debug)]
pub struct ResolutionContext<'a> {
    pub type_identifier: &'a str,
    pub version: &'a str,
    pub definition: &'a CandidateDefinition,
    pub environment: &'a ScanEnvironment,
}

/// Resolves a candidate definition into the canonical extension model.
pub trait ModelLoader {
    /// The declared type identifier this loader handles (exact match).
    fn type_identifier(&self) -> &str;

    fn load(&self, context: &ResolutionContext<'_>) -> Result<ExtensionModel, BoxError>;
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no model loader registered for type identifier '{0}'")]
    NoLoader(String),

    #[error(transparent)]
    IllegalDefinition(#[from] IllegalModelDefinition),

    #[error("failed to resolve model for '{type_identifier}': {source}")]
    LoaderFailure {
        type_identifier: String,
        #[source]
        source: BoxError,
    },
}

/// Locates the loader matching a definition's declared type identifier and
/// invokes it within a scoped load context.
pub struct LoaderDispatch {
    loaders: HashMap<String, Box<dyn ModelLoader>>,
}

impl LoaderDispatch {
    pub fn new() -> Self {
        Self { loaders: HashMap::new() }
    }

    pub fn register(&mut self, loader: Box<dyn ModelLoader>) {
        self.loaders.insert(loader.type_identifier().to_string(), loader);
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Exact match only; no fallback, no partial match. The load context is
    /// bound for the duration of the call and restored on every exit path.
    pub fn resolve_model(
        &self,
        context: &ResolutionContext<'_>,
    ) -> Result<ExtensionModel, ResolveError> {
        let loader = self
            .loaders
            .get(context.type_identifier)
            .ok_or_else(|| ResolveError::NoLoader(context.type_identifier.to_string()))?;

        let _guard = context.environment.bind_context(context.type_identifier);

        match loader.load(context) {
            Ok(model) => Ok(model),
            Err(err) => match extract_illegal_definition(&*err) {
                Some(illegal) => Err(ResolveError::IllegalDefinition(illegal.clone())),
                None => Err(ResolveError::LoaderFailure {
                    type_identifier: context.type_identifier.to_string(),
                    source: err,
                }),
            },
        }
    }
}

impl Default for LoaderDispatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk the cause chain looking for an illegal-definition condition.
fn extract_illegal_definition<'a>(
    err: &'a (dyn Error + 'static),
) -> Option<&'a IllegalModelDefinition> {
    let mut current: Option<&(dyn Error + 'static)> = Some(err);
    while let Some(cause) = current {
        if let Some(illegal) = cause.downcast_ref::<IllegalModelDefinition>() {
            return Some(illegal);
        }
        current = cause.source();
    }
    None
}
