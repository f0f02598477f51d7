//! Code generation configuration.
//!
//! Mirrors the JSON shape of `quill-codegen-config.json`; unknown keys are
//! rejected so typos surface at load time instead of silently changing
//! output.

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CodegenConfig {
    pub schema_namespace: String,
    pub input: InputConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub options: CodegenOptions,
    #[serde(default)]
    pub experimental_features: ExperimentalFeatures,
    #[serde(default)]
    pub schema_download: Option<SchemaDownloadConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputConfig {
    pub schema_path: PathBuf,
    #[serde(default)]
    pub operation_search_paths: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    pub schema_types: SchemaTypesOutput,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaTypesOutput {
    pub path: PathBuf,
    pub module_type: ModuleType,
}

/// How the generated module is packaged, which drives access levels.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModuleType {
    SwiftPackage {},
    Other {},
    EmbeddedInTarget {
        name: String,
        #[serde(default)]
        access_modifier: AccessModifier,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessModifier {
    Public,
    #[default]
    Internal,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CodegenOptions {
    #[serde(default)]
    pub deprecated_enum_cases: Inclusion,
    #[serde(default)]
    pub warnings_on_deprecated_usage: Inclusion,
    #[serde(default)]
    pub schema_documentation: Inclusion,
    #[serde(default)]
    pub conversion_strategies: ConversionStrategies,
    #[serde(default)]
    pub selection_set_initializers: Vec<SelectionSetInitializer>,
    #[serde(default)]
    pub operation_document_format: OperationDocumentFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Inclusion {
    #[default]
    Include,
    Exclude,
}

impl Inclusion {
    pub fn is_included(&self) -> bool {
        *self == Self::Include
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConversionStrategies {
    #[serde(default)]
    pub enum_cases: EnumCaseStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnumCaseStrategy {
    #[default]
    CamelCase,
    None,
}

/// Which generated selection sets gain memberwise initializers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionSetInitializer {
    All,
    Operations,
    NamedFragments,
    Fragment(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationDocumentFormat {
    #[default]
    Definition,
    OperationId,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentalFeatures {
    #[serde(default = "FieldMergingRule::default_rules")]
    pub field_merging: Vec<FieldMergingRule>,
}

impl Default for ExperimentalFeatures {
    fn default() -> Self {
        Self {
            field_merging: FieldMergingRule::default_rules(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldMergingRule {
    All,
    None,
    Ancestors,
    NamedFragments,
    Siblings,
}

impl FieldMergingRule {
    fn default_rules() -> Vec<FieldMergingRule> {
        vec![FieldMergingRule::All]
    }
}

impl ExperimentalFeatures {
    /// Full field merging is only on when the rule set is exactly `[all]`;
    /// any partial combination disables it.
    pub fn merges_all_fields(&self) -> bool {
        self.field_merging == [FieldMergingRule::All]
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDownloadConfig {
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

impl CodegenConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The access keyword for generated type declarations, or `None` to
    /// omit it.
    pub fn type_access(&self) -> Option<&'static str> {
        match &self.output.schema_types.module_type {
            ModuleType::SwiftPackage {} | ModuleType::Other {} => Some("public"),
            ModuleType::EmbeddedInTarget { .. } => None,
        }
    }

    /// The access keyword for generated static members, which embedded
    /// targets can expose even when the type itself is internal.
    pub fn static_member_access(&self) -> Option<&'static str> {
        match &self.output.schema_types.module_type {
            ModuleType::SwiftPackage {} | ModuleType::Other {} => Some("public"),
            ModuleType::EmbeddedInTarget {
                access_modifier: AccessModifier::Public,
                ..
            } => Some("public"),
            ModuleType::EmbeddedInTarget {
                access_modifier: AccessModifier::Internal,
                ..
            } => None,
        }
    }
}
