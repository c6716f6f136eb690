//! Generator Registry - Pluggable Resource Generation
//!
//! Generators are discovered once through two channels (general resource
//! factories first, declarative-syntax factories second), concatenated
//! without deduplication, and reused across passes. Each generator consumes
//! the resolved model read-only and emits zero or more resources.

use crate::hashing::sha256_hex;
use crate::loader::BoxError;
use crate::model::ExtensionModel;
use base64::Engine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Schema,
    Descriptor,
    Manifest,
}

/// One generated build artifact, payload encoded for transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedResource {
    pub kind: ResourceKind,
    pub path: String,
    pub data_base64: String,
    pub hash: String,
}

impl GeneratedResource {
    pub fn new(kind: ResourceKind, path: impl Into<String>, payload: &[u8]) -> Self {
        Self {
            kind,
            path: path.into(),
            data_base64: base64::engine::general_purpose::STANDARD.encode(payload),
            hash: sha256_hex(payload),
        }
    }
}

/// A registered generation capability.
///
/// `Ok(None)` means the generator does not apply to this model; it
/// contributes no resources and raises no error. Generators are stateless
/// with respect to any single model and may be reused across passes.
pub trait ResourceGenerator {
    fn name(&self) -> &'static str;

    fn generate(&self, model: &ExtensionModel) -> Result<Option<Vec<GeneratedResource>>, BoxError>;
}

/// Generator registry - discovers once, caches for its lifetime.
pub struct GeneratorRegistry {
    generators: Vec<Box<dyn ResourceGenerator>>,
}

impl GeneratorRegistry {
    /// Concatenates the two discovery channels, general entries first.
    ///
    /// A generator appearing in both channels runs twice; the registry does
    /// not merge or deduplicate.
    pub fn discover(
        general: Vec<Box<dyn ResourceGenerator>>,
        syntax: Vec<Box<dyn ResourceGenerator>>,
    ) -> Self {
        let mut generators = general;
        generators.extend(syntax);
        Self { generators }
    }

    /// Enumeration order is the registration order.
    pub fn generators(&self) -> &[Box<dyn ResourceGenerator>] {
        &self.generators
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}
