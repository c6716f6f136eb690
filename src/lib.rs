//! ExtForge Core - Extension Resources Compiler
//!
//! # Pass Contract (Non-Negotiable)
//! 1. One Definition Per Unit
//! 2. Zero Definitions Is A No-Op
//! 3. Version Comes From Build Configuration
//! 4. Illegal Definitions Propagate Verbatim
//! 5. Generators Run In Registry Order
//! 6. The Model Is Immutable For The Pass

pub mod model;
pub mod scan;
pub mod loader;
pub mod generator;
pub mod builtin;
pub mod diagnostics;
pub mod attributes;
pub mod hashing;
pub mod pipeline;

pub use model::{CandidateDefinition, Category, ExtensionModel};
pub use scan::{DefinitionScanner, ScanEnvironment};
pub use loader::{IllegalModelDefinition, LoaderDispatch, ModelLoader, ResolutionContext, ResolveError};
pub use generator::{GeneratedResource, GeneratorRegistry, ResourceGenerator, ResourceKind};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use attributes::{AttributeSetError, AttributeSetValidator};
pub use hashing::{canonical_json, compute_manifest_hash, compute_pass_hash};
pub use pipeline::{BuildConfig, GenerationPipeline, PassError, PassOutput, EXTENSION_VERSION_OPTION};

pub const RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");
