//! Generation Pipeline - Single Entry Point
//!
//! One pass per compilation unit: scan for the definition, resolve the
//! version, resolve the model, run every registered generator against it.
//! At most one definition is allowed per unit; zero is a successful no-op.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::diagnostics::{render_chain, Diagnostics};
use crate::generator::{GeneratedResource, GeneratorRegistry};
use crate::hashing::{compute_manifest_hash, compute_pass_hash};
use crate::loader::{IllegalModelDefinition, LoaderDispatch, ResolutionContext, ResolveError};
use crate::model::ExtensionModel;
use crate::scan::{DefinitionScanner, ScanEnvironment};
use crate::RUNTIME_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static SCAN_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_scan_call_count() -> u32 {
    SCAN_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_scan_call_count() {
    SCAN_CALL_COUNT.store(0, Ordering::SeqCst);
}

/// The build-configuration option carrying the extension version.
pub const EXTENSION_VERSION_OPTION: &str = "extension.version";

/// Named options supplied by the build tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }
}

/// Pass failures, branched on by kind rather than by downcasting.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    IllegalDefinition(#[from] IllegalModelDefinition),

    #[error("model resolution failed for '{type_identifier}': {message}")]
    Resolution {
        type_identifier: String,
        message: String,
    },

    #[error("generator '{generator}' failed: {message}")]
    Generator { generator: String, message: String },
}

/// The aggregated result of one successful pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassOutput {
    pub pass_id: String,
    pub created_at: DateTime<Utc>,
    pub runtime_version: String,
    /// `None` for a no-op pass (no definition in the compilation unit).
    pub extension: Option<String>,
    pub version: Option<String>,
    pub pass_hash: Option<String>,
    pub resources: Vec<GeneratedResource>,
    pub manifest_hash: String,
}

impl PassOutput {
    fn empty() -> Result<Self, PassError> {
        Self::build(None, None, None, vec![])
    }

    fn build(
        extension: Option<String>,
        version: Option<String>,
        pass_hash: Option<String>,
        resources: Vec<GeneratedResource>,
    ) -> Result<Self, PassError> {
        let mut output = Self {
            pass_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            runtime_version: RUNTIME_VERSION.to_string(),
            extension,
            version,
            pass_hash,
            resources,
            manifest_hash: String::new(), // computed after
        };
        output.manifest_hash = compute_manifest_hash(&output)
            .map_err(|e| PassError::Configuration(format!("cannot hash pass output: {e}")))?;
        Ok(output)
    }

    pub fn is_noop(&self) -> bool {
        self.extension.is_none()
    }
}

/// The generation pipeline - single entry point for a resolve-and-generate
/// pass. Loaders and generators are injected once and reused across passes.
pub struct GenerationPipeline {
    loaders: LoaderDispatch,
    registry: GeneratorRegistry,
    config: BuildConfig,
}

impl GenerationPipeline {
    pub fn new(loaders: LoaderDispatch, registry: GeneratorRegistry, config: BuildConfig) -> Self {
        Self {
            loaders,
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    /// Run one full pass over the compilation unit.
    ///
    /// Illegal-definition failures propagate verbatim and are never written
    /// to the diagnostic channel; every other failure is reported there with
    /// its full cause trace before propagating.
    pub fn run(
        &self,
        scanner: &dyn DefinitionScanner,
        environment: &ScanEnvironment,
        diagnostics: &mut Diagnostics,
    ) -> Result<PassOutput, PassError> {
        diagnostics.note("starting resource generation pass");

        #[cfg(feature = "test-hooks")]
        SCAN_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        let candidates = scanner.find_candidates();

        if candidates.len() > 1 {
            let offending: Vec<&str> = candidates
                .iter()
                .map(|c| c.qualified_name.as_str())
                .collect();
            return Err(PassError::Configuration(format!(
                "only one extension definition is allowed per compilation unit; \
                 offending definitions are [{}]",
                offending.join(", ")
            )));
        }

        let definition = match candidates.into_iter().next() {
            Some(definition) => definition,
            None => {
                diagnostics.note("no extension definition in compilation unit, nothing to do");
                return PassOutput::empty();
            }
        };

        let type_identifier = match &definition.type_identifier {
            Some(identifier) => identifier.clone(),
            None => {
                diagnostics.note(format!(
                    "backing type for extension '{}' could not be found, skipping",
                    definition.qualified_name
                ));
                return PassOutput::empty();
            }
        };

        let version = self
            .config
            .option(EXTENSION_VERSION_OPTION)
            .ok_or_else(|| {
                PassError::Configuration(format!(
                    "cannot resolve version for extension '{}': option '{}' is missing",
                    definition.qualified_name, EXTENSION_VERSION_OPTION
                ))
            })?
            .to_string();

        let context = ResolutionContext {
            type_identifier: &type_identifier,
            version: &version,
            definition: &definition,
            environment,
        };

        let model = match self.loaders.resolve_model(&context) {
            Ok(model) => model,
            Err(ResolveError::NoLoader(identifier)) => {
                return Err(PassError::Configuration(format!(
                    "no model loader registered for type identifier '{identifier}'"
                )));
            }
            Err(ResolveError::IllegalDefinition(illegal)) => {
                // user-facing validation error, propagated verbatim
                return Err(illegal.into());
            }
            Err(err @ ResolveError::LoaderFailure { .. }) => {
                diagnostics.error(render_chain(&err));
                let message = match &err {
                    ResolveError::LoaderFailure { source, .. } => source.to_string(),
                    _ => err.to_string(),
                };
                return Err(PassError::Resolution {
                    type_identifier,
                    message,
                });
            }
        };

        let resources = self.generate(&model, diagnostics)?;

        let pass_hash = compute_pass_hash(&type_identifier, &version, &model, RUNTIME_VERSION)
            .map_err(|e| PassError::Configuration(format!("cannot hash pass inputs: {e}")))?;

        PassOutput::build(
            Some(model.name.clone()),
            Some(version),
            Some(pass_hash),
            resources,
        )
    }

    /// Generators run sequentially in registry order. A non-applicable
    /// generator contributes nothing; a failing generator aborts the pass.
    fn generate(
        &self,
        model: &ExtensionModel,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<GeneratedResource>, PassError> {
        let mut resources = Vec::new();
        for generator in self.registry.generators() {
            match generator.generate(model) {
                Ok(Some(generated)) => resources.extend(generated),
                Ok(None) => {}
                Err(err) => {
                    diagnostics.error(format!(
                        "generator '{}' failed: {}",
                        generator.name(),
                        render_chain(&*err)
                    ));
                    return Err(PassError::Generator {
                        generator: generator.name().to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }
        Ok(resources)
    }
}
