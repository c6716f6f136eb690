//! ExtForge CLI - Bridge interface for build tools
//!
//! Commands: generators, resolve, generate
//! Outputs JSON to stdout, diagnostics to stderr
//! Returns non-zero on pass failure

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use extforge_core::{
    builtin::{default_registry, JsonModelLoader},
    pipeline::{BuildConfig, GenerationPipeline, PassError},
    CandidateDefinition, DefinitionScanner, Diagnostics, GeneratorRegistry, LoaderDispatch,
    ScanEnvironment, Severity,
};

#[derive(Parser)]
#[command(name = "extforge-cli")]
#[command(about = "ExtForge CLI - Extension Resources Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered resource generators
    Generators,

    /// Resolve the extension model for a compilation unit (no generation)
    Resolve {
        /// Path to the compilation unit manifest (JSON)
        #[arg(short, long)]
        manifest: PathBuf,
    },

    /// Run a full resolve-and-generate pass
    Generate {
        /// Path to the compilation unit manifest (JSON)
        #[arg(short, long)]
        manifest: PathBuf,
    },
}

/// One compilation unit as described by the build tool.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnitManifest {
    #[serde(default)]
    unit_name: Option<String>,
    #[serde(default)]
    candidates: Vec<CandidateEntry>,
    #[serde(default)]
    options: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidateEntry {
    qualified_name: String,
    #[serde(default)]
    type_identifier: Option<String>,
    /// Location of the serialized model document, relative to the manifest.
    #[serde(default)]
    model_path: Option<PathBuf>,
}

struct ManifestScanner {
    candidates: Vec<CandidateDefinition>,
}

impl DefinitionScanner for ManifestScanner {
    fn find_candidates(&self) -> Vec<CandidateDefinition> {
        self.candidates.clone()
    }
}

fn load_manifest(path: &Path) -> Result<UnitManifest, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("cannot read manifest {}: {e}", path.display()))?;
    serde_json::from_str(&content).map_err(|e| format!("invalid manifest {}: {e}", path.display()))
}

fn build_pipeline(
    manifest: &UnitManifest,
    manifest_path: &Path,
    registry: GeneratorRegistry,
) -> GenerationPipeline {
    let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    let mut loaders = LoaderDispatch::new();
    for candidate in &manifest.candidates {
        if let (Some(identifier), Some(model_path)) =
            (&candidate.type_identifier, &candidate.model_path)
        {
            loaders.register(Box::new(JsonModelLoader::new(
                identifier.clone(),
                base.join(model_path),
            )));
        }
    }

    let config = BuildConfig {
        options: manifest.options.clone(),
    };

    GenerationPipeline::new(loaders, registry, config)
}

fn scanner_for(manifest: &UnitManifest) -> ManifestScanner {
    ManifestScanner {
        candidates: manifest
            .candidates
            .iter()
            .map(|entry| CandidateDefinition {
                qualified_name: entry.qualified_name.clone(),
                type_identifier: entry.type_identifier.clone(),
            })
            .collect(),
    }
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    for entry in diagnostics.entries() {
        match entry.severity {
            Severity::Note => eprintln!("note: {}", entry.message),
            Severity::Error => eprintln!("error: {}", entry.message),
        }
    }
}

fn failure_exit(err: &PassError) -> ExitCode {
    // validation and configuration failures are the caller's to fix
    match err {
        PassError::IllegalDefinition(_) | PassError::Configuration(_) => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

fn run_pass(manifest_path: &Path, registry: GeneratorRegistry) -> ExitCode {
    let unit = match load_manifest(manifest_path) {
        Ok(unit) => unit,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let pipeline = build_pipeline(&unit, manifest_path, registry);
    let scanner = scanner_for(&unit);
    let environment =
        ScanEnvironment::new(unit.unit_name.clone().unwrap_or_else(|| "unit".to_string()));
    let mut diagnostics = Diagnostics::new();

    let result = pipeline.run(&scanner, &environment, &mut diagnostics);
    print_diagnostics(&diagnostics);

    match result {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(rendered) => {
                println!("{rendered}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: cannot serialize pass output: {e}");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            println!(
                "{}",
                serde_json::json!({ "success": false, "error": err.to_string() })
            );
            failure_exit(&err)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generators => {
            let registry = default_registry();
            let names: Vec<_> = registry.generators().iter().map(|g| g.name()).collect();
            println!("{}", serde_json::json!({ "generators": names }));
            ExitCode::SUCCESS
        }

        // resolution only: same pass with no generators registered
        Commands::Resolve { manifest } => {
            run_pass(&manifest, GeneratorRegistry::discover(vec![], vec![]))
        }

        Commands::Generate { manifest } => run_pass(&manifest, default_registry()),
    }
}
