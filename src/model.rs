//! Extension Model - Canonical Resolved Description
//!
//! The model is produced once per pass by a model loader and is immutable
//! afterwards; the pipeline only ever hands out shared references to it.

use serde::{Deserialize, Serialize};

/// One unit in the compilation set marked as declaring an extension.
///
/// Produced by the definition scanner, read-only, never persisted.
/// A candidate whose backing type could not be located carries no
/// `type_identifier`; the pipeline skips it with a notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateDefinition {
    pub qualified_name: String,
    #[serde(default)]
    pub type_identifier: Option<String>,
}

impl CandidateDefinition {
    pub fn new(qualified_name: impl Into<String>, type_identifier: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            type_identifier: Some(type_identifier.into()),
        }
    }

    /// A candidate whose backing type cannot be located (skip condition).
    pub fn unresolvable(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            type_identifier: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Community,
    Select,
    Premium,
    Certified,
}

impl Default for Category {
    fn default() -> Self {
        Self::Community
    }
}

/// The canonical, fully-resolved description of an extension.
///
/// Created by a model loader during resolution, owned by the pipeline for
/// the duration of the pass, consumed read-only by every generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionModel {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub vendor: Option<String>,
    /// Minimum runtime version this extension requires, if it declares one.
    #[serde(default)]
    pub min_runtime_version: Option<String>,
    #[serde(default)]
    pub configurations: Vec<ConfigurationModel>,
    #[serde(default)]
    pub operations: Vec<OperationModel>,
    #[serde(default)]
    pub parameters: Vec<ParameterModel>,
}

impl ExtensionModel {
    /// A model with no configurations and no operations declares nothing
    /// a syntax-level generator could emit.
    pub fn is_empty_surface(&self) -> bool {
        self.configurations.is_empty() && self.operations.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationModel {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParameterModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationModel {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ParameterModel>,
    #[serde(default)]
    pub output_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterModel {
    pub name: String,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub parameter_type: Option<String>,
}

fn default_true() -> bool {
    true
}
