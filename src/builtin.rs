//! Built-in Loader and Generators
//!
//! The stock implementations shipped with the engine: a loader that
//! resolves a definition from a serialized model document, and the three
//! generators behind the standard packaged artifacts (registration
//! descriptor, canonical model manifest, declarative schema).

use crate::generator::{GeneratedResource, ResourceGenerator, ResourceKind};
use crate::hashing::canonical_json;
use crate::loader::{BoxError, IllegalModelDefinition, ModelLoader, ResolutionContext};
use crate::model::ExtensionModel;
use crate::RUNTIME_VERSION;
use std::fs;
use std::path::PathBuf;

/// Resolves an extension model from a JSON document on disk.
///
/// Registered per type identifier; the document location is fixed at
/// construction. Malformed or incomplete documents are illegal-definition
/// failures, not infrastructure failures.
pub struct JsonModelLoader {
    type_identifier: String,
    model_path: PathBuf,
}

impl JsonModelLoader {
    pub fn new(type_identifier: impl Into<String>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            type_identifier: type_identifier.into(),
            model_path: model_path.into(),
        }
    }
}

impl ModelLoader for JsonModelLoader {
    fn type_identifier(&self) -> &str {
        &self.type_identifier
    }

    fn load(&self, context: &ResolutionContext<'_>) -> Result<ExtensionModel, BoxError> {
        let document = fs::read_to_string(&self.model_path)?;

        let mut model: ExtensionModel = serde_json::from_str(&document).map_err(|e| {
            IllegalModelDefinition::new(format!(
                "extension model document for '{}' is malformed: {e}",
                context.definition.qualified_name
            ))
        })?;

        if model.name.trim().is_empty() {
            return Err(IllegalModelDefinition::new(format!(
                "extension '{}' declares no name",
                context.definition.qualified_name
            ))
            .into());
        }

        if let Some(required) = &model.min_runtime_version {
            check_runtime_compatibility(&model.name, required)?;
        }

        // the externally supplied version is authoritative
        model.version = context.version.to_string();
        Ok(model)
    }
}

fn check_runtime_compatibility(extension: &str, required: &str) -> Result<(), BoxError> {
    let required_version = semver::Version::parse(required).map_err(|_| {
        IllegalModelDefinition::new(format!(
            "extension '{extension}' declares an invalid minimum runtime version '{required}'"
        ))
    })?;
    let runtime_version = semver::Version::parse(RUNTIME_VERSION)
        .map_err(|e| format!("invalid runtime version: {e}"))?;

    if runtime_version < required_version {
        return Err(IllegalModelDefinition::new(format!(
            "extension '{extension}' requires runtime >= {required}, current is {RUNTIME_VERSION}"
        ))
        .into());
    }
    Ok(())
}

/// Emits the registration descriptor every packaged extension carries.
pub struct DescriptorGenerator;

impl ResourceGenerator for DescriptorGenerator {
    fn name(&self) -> &'static str {
        "descriptor"
    }

    fn generate(&self, model: &ExtensionModel) -> Result<Option<Vec<GeneratedResource>>, BoxError> {
        let category = format!("{:?}", model.category).to_lowercase();
        let mut descriptor = format!(
            "name={}\nversion={}\ncategory={}\n",
            model.name, model.version, category
        );
        if let Some(vendor) = &model.vendor {
            descriptor.push_str(&format!("vendor={vendor}\n"));
        }

        Ok(Some(vec![GeneratedResource::new(
            ResourceKind::Descriptor,
            "META-INF/extension.properties",
            descriptor.as_bytes(),
        )]))
    }
}

/// Emits the canonical model serialization consumed by the runtime loader.
pub struct ModelManifestGenerator;

impl ResourceGenerator for ModelManifestGenerator {
    fn name(&self) -> &'static str {
        "model-manifest"
    }

    fn generate(&self, model: &ExtensionModel) -> Result<Option<Vec<GeneratedResource>>, BoxError> {
        let manifest = canonical_json(model)?;
        Ok(Some(vec![GeneratedResource::new(
            ResourceKind::Manifest,
            format!("META-INF/{}-model.json", model.name),
            manifest.as_bytes(),
        )]))
    }
}

/// Emits the declarative schema for the extension's configuration syntax.
///
/// Not applicable to models that declare neither configurations nor
/// operations.
pub struct SchemaGenerator;

impl ResourceGenerator for SchemaGenerator {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn generate(&self, model: &ExtensionModel) -> Result<Option<Vec<GeneratedResource>>, BoxError> {
        if model.is_empty_surface() {
            return Ok(None);
        }

        let mut schema = String::new();
        schema.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        schema.push('\n');
        schema.push_str(&format!("<schema extension=\"{}\" version=\"{}\">\n", model.name, model.version));
        for configuration in &model.configurations {
            schema.push_str(&format!("  <configuration name=\"{}\"", configuration.name));
            render_parameters(&mut schema, "configuration", &configuration.parameters);
        }
        for operation in &model.operations {
            schema.push_str(&format!("  <operation name=\"{}\"", operation.name));
            render_parameters(&mut schema, "operation", &operation.parameters);
        }
        schema.push_str("</schema>\n");

        Ok(Some(vec![GeneratedResource::new(
            ResourceKind::Schema,
            format!("META-INF/{}.xsd", model.name),
            schema.as_bytes(),
        )]))
    }
}

fn render_parameters(schema: &mut String, tag: &str, parameters: &[crate::model::ParameterModel]) {
    if parameters.is_empty() {
        schema.push_str("/>\n");
        return;
    }
    schema.push_str(">\n");
    for parameter in parameters {
        schema.push_str(&format!(
            "    <parameter name=\"{}\" required=\"{}\"/>\n",
            parameter.name, parameter.required
        ));
    }
    schema.push_str(&format!("  </{tag}>\n"));
}

/// The stock registry: general channel (descriptor, manifest) first,
/// syntax channel (schema) second.
pub fn default_registry() -> crate::generator::GeneratorRegistry {
    crate::generator::GeneratorRegistry::discover(
        vec![Box::new(DescriptorGenerator), Box::new(ModelManifestGenerator)],
        vec![Box::new(SchemaGenerator)],
    )
}
