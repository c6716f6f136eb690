//! Pass Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees of the
//! resolve-and-generate pass.

use extforge_core::{
    builtin::default_registry,
    loader::BoxError,
    pipeline::EXTENSION_VERSION_OPTION,
    BuildConfig, CandidateDefinition, DefinitionScanner, Diagnostics, ExtensionModel,
    GeneratedResource, GenerationPipeline, GeneratorRegistry, IllegalModelDefinition,
    LoaderDispatch, ModelLoader, PassError, ResolutionContext, ResourceGenerator, ResourceKind,
    ScanEnvironment,
};
use serde_json::json;
use std::error::Error;
use std::fmt;

const TYPE_ID: &str = "com.acme.HttpExtension";

struct FixedScanner(Vec<CandidateDefinition>);

impl DefinitionScanner for FixedScanner {
    fn find_candidates(&self) -> Vec<CandidateDefinition> {
        self.0.clone()
    }
}

struct StubLoader {
    result: fn() -> Result<ExtensionModel, BoxError>,
}

impl ModelLoader for StubLoader {
    fn type_identifier(&self) -> &str {
        TYPE_ID
    }

    fn load(&self, _context: &ResolutionContext<'_>) -> Result<ExtensionModel, BoxError> {
        (self.result)()
    }
}

#[derive(Debug)]
struct RuntimeWrapper(IllegalModelDefinition);

impl fmt::Display for RuntimeWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "runtime failure while loading model")
    }
}

impl Error for RuntimeWrapper {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

struct FailingGenerator;

impl ResourceGenerator for FailingGenerator {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn generate(&self, _model: &ExtensionModel) -> Result<Option<Vec<GeneratedResource>>, BoxError> {
        Err("disk full".into())
    }
}

fn http_model() -> Result<ExtensionModel, BoxError> {
    Ok(serde_json::from_value(json!({
        "name": "http",
        "version": "1.0.0",
        "configurations": [{"name": "listener-config"}],
        "operations": [{"name": "request"}]
    }))
    .unwrap())
}

fn bare_model() -> Result<ExtensionModel, BoxError> {
    Ok(serde_json::from_value(json!({"name": "bare", "version": "1.0.0"})).unwrap())
}

fn dispatch_with(result: fn() -> Result<ExtensionModel, BoxError>) -> LoaderDispatch {
    let mut dispatch = LoaderDispatch::new();
    dispatch.register(Box::new(StubLoader { result }));
    dispatch
}

fn versioned_config() -> BuildConfig {
    BuildConfig::new().with_option(EXTENSION_VERSION_OPTION, "4.1.0")
}

fn one_candidate() -> FixedScanner {
    FixedScanner(vec![CandidateDefinition::new(TYPE_ID, TYPE_ID)])
}

fn run(
    pipeline: &GenerationPipeline,
    scanner: &dyn DefinitionScanner,
) -> (Result<extforge_core::PassOutput, PassError>, Diagnostics) {
    let environment = ScanEnvironment::new("test-unit");
    let mut diagnostics = Diagnostics::new();
    let result = pipeline.run(scanner, &environment, &mut diagnostics);
    (result, diagnostics)
}

#[test]
fn invariant_zero_definitions_is_a_noop() {
    let pipeline = GenerationPipeline::new(
        dispatch_with(http_model),
        default_registry(),
        versioned_config(),
    );

    let (result, diagnostics) = run(&pipeline, &FixedScanner(vec![]));

    let output = result.unwrap();
    assert!(output.is_noop());
    assert!(output.resources.is_empty());
    assert!(!diagnostics.has_errors());
}

#[test]
fn invariant_single_definition_generates_in_registry_order() {
    let pipeline = GenerationPipeline::new(
        dispatch_with(http_model),
        default_registry(),
        versioned_config(),
    );

    let (result, diagnostics) = run(&pipeline, &one_candidate());

    let output = result.unwrap();
    assert!(!diagnostics.has_errors());
    assert_eq!(output.extension.as_deref(), Some("http"));
    assert_eq!(output.version.as_deref(), Some("4.1.0"));

    // general channel (descriptor, manifest) before syntax channel (schema)
    let kinds: Vec<_> = output.resources.iter().map(|r| r.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![ResourceKind::Descriptor, ResourceKind::Manifest, ResourceKind::Schema]
    );
    assert!(output.pass_hash.is_some());
    assert!(!output.manifest_hash.is_empty());
}

#[test]
fn invariant_not_applicable_generator_contributes_nothing() {
    // a bare model gives the schema generator nothing to emit
    let pipeline = GenerationPipeline::new(
        dispatch_with(bare_model),
        default_registry(),
        versioned_config(),
    );

    let (result, diagnostics) = run(&pipeline, &one_candidate());

    let output = result.unwrap();
    assert!(!diagnostics.has_errors());
    let kinds: Vec<_> = output.resources.iter().map(|r| r.kind.clone()).collect();
    assert_eq!(kinds, vec![ResourceKind::Descriptor, ResourceKind::Manifest]);
}

#[test]
fn invariant_multiple_definitions_list_every_offender() {
    let pipeline = GenerationPipeline::new(
        dispatch_with(http_model),
        default_registry(),
        versioned_config(),
    );
    let scanner = FixedScanner(vec![
        CandidateDefinition::new("com.acme.First", "com.acme.First"),
        CandidateDefinition::new("com.acme.Second", "com.acme.Second"),
    ]);

    let (result, _) = run(&pipeline, &scanner);

    let err = result.unwrap_err();
    match err {
        PassError::Configuration(message) => {
            assert!(message.contains("com.acme.First"));
            assert!(message.contains("com.acme.Second"));
        }
        other => panic!("expected configuration error, got {other}"),
    }
}

#[test]
fn invariant_missing_version_option_is_fatal() {
    let pipeline = GenerationPipeline::new(
        dispatch_with(http_model),
        default_registry(),
        BuildConfig::new(),
    );

    let (result, _) = run(&pipeline, &one_candidate());

    let err = result.unwrap_err();
    match err {
        PassError::Configuration(message) => {
            assert!(message.contains(EXTENSION_VERSION_OPTION));
            assert!(message.contains(TYPE_ID));
        }
        other => panic!("expected configuration error, got {other}"),
    }
}

#[test]
fn invariant_missing_backing_type_skips_with_notice() {
    let pipeline = GenerationPipeline::new(
        dispatch_with(http_model),
        default_registry(),
        versioned_config(),
    );
    let scanner = FixedScanner(vec![CandidateDefinition::unresolvable("com.acme.Ghost")]);

    let (result, diagnostics) = run(&pipeline, &scanner);

    let output = result.unwrap();
    assert!(output.is_noop());
    assert!(!diagnostics.has_errors());
    assert!(diagnostics
        .entries()
        .iter()
        .any(|d| d.message.contains("skipping")));
}

#[test]
fn invariant_no_matching_loader_is_a_configuration_error() {
    let pipeline = GenerationPipeline::new(
        LoaderDispatch::new(),
        default_registry(),
        versioned_config(),
    );

    let (result, _) = run(&pipeline, &one_candidate());

    let err = result.unwrap_err();
    match err {
        PassError::Configuration(message) => assert!(message.contains(TYPE_ID)),
        other => panic!("expected configuration error, got {other}"),
    }
}

#[test]
fn invariant_illegal_definition_propagates_verbatim_and_unlogged() {
    let pipeline = GenerationPipeline::new(
        dispatch_with(|| {
            Err(Box::new(RuntimeWrapper(IllegalModelDefinition::new(
                "configuration 'listener-config' declares duplicate parameters",
            ))) as BoxError)
        }),
        default_registry(),
        versioned_config(),
    );

    let (result, diagnostics) = run(&pipeline, &one_candidate());

    let err = result.unwrap_err();
    match err {
        PassError::IllegalDefinition(illegal) => {
            assert_eq!(
                illegal.message,
                "configuration 'listener-config' declares duplicate parameters"
            );
        }
        other => panic!("expected illegal definition, got {other}"),
    }
    // never reported as an internal failure
    assert!(!diagnostics.has_errors());
}

#[test]
fn invariant_generic_resolution_failure_is_reported_then_raised() {
    let pipeline = GenerationPipeline::new(
        dispatch_with(|| Err("connection reset".into())),
        default_registry(),
        versioned_config(),
    );

    let (result, diagnostics) = run(&pipeline, &one_candidate());

    let err = result.unwrap_err();
    match err {
        PassError::Resolution { type_identifier, message } => {
            assert_eq!(type_identifier, TYPE_ID);
            assert_eq!(message, "connection reset");
        }
        other => panic!("expected resolution failure, got {other}"),
    }
    assert!(diagnostics.has_errors());
    assert!(diagnostics
        .entries()
        .iter()
        .any(|d| d.message.contains("connection reset")));
}

#[test]
fn invariant_generator_failure_aborts_the_pass() {
    let registry = GeneratorRegistry::discover(
        vec![
            Box::new(extforge_core::builtin::DescriptorGenerator),
            Box::new(FailingGenerator),
        ],
        vec![Box::new(extforge_core::builtin::SchemaGenerator)],
    );
    let pipeline =
        GenerationPipeline::new(dispatch_with(http_model), registry, versioned_config());

    let (result, diagnostics) = run(&pipeline, &one_candidate());

    let err = result.unwrap_err();
    match err {
        PassError::Generator { generator, message } => {
            assert_eq!(generator, "broken");
            assert_eq!(message, "disk full");
        }
        other => panic!("expected generator failure, got {other}"),
    }
    assert!(diagnostics.has_errors());
}

#[test]
fn invariant_full_pass_with_json_loader() {
    use std::io::Write;

    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("http-model.json");
    let mut file = std::fs::File::create(&model_path).unwrap();
    file.write_all(
        br#"{"name": "http", "version": "0.0.0", "operations": [{"name": "request"}]}"#,
    )
    .unwrap();

    let mut loaders = LoaderDispatch::new();
    loaders.register(Box::new(extforge_core::builtin::JsonModelLoader::new(
        TYPE_ID, model_path,
    )));
    let pipeline = GenerationPipeline::new(loaders, default_registry(), versioned_config());

    let (result, diagnostics) = run(&pipeline, &one_candidate());

    let output = result.unwrap();
    assert!(!diagnostics.has_errors());
    assert_eq!(output.extension.as_deref(), Some("http"));
    // the externally supplied version wins over the document's
    assert_eq!(output.version.as_deref(), Some("4.1.0"));
    assert_eq!(output.resources.len(), 3);
    for resource in &output.resources {
        assert!(!resource.path.is_empty());
        assert!(!resource.hash.is_empty());
    }
}

#[cfg(feature = "test-hooks")]
#[test]
fn invariant_scanner_called_once_per_pass() {
    extforge_core::pipeline::reset_scan_call_count();

    let pipeline = GenerationPipeline::new(
        dispatch_with(http_model),
        default_registry(),
        versioned_config(),
    );
    let (result, _) = run(&pipeline, &one_candidate());
    assert!(result.is_ok());

    assert_eq!(extforge_core::pipeline::get_scan_call_count(), 1);
}
