//! Code generation for Quill schemas.
//!
//! Renders Swift source text for GraphQL enums, fragments and selection sets
//! from compiler IR plus a [`CodegenConfig`]. Rendering is purely functional
//! over its inputs; the CLI owns file discovery and writing.

mod casing;
mod config;
mod enums;
mod fragments;
mod ir;
mod keywords;

pub use casing::{first_uppercased, to_lower_camel_case};
pub use config::{
    AccessModifier, CodegenConfig, CodegenOptions, ConversionStrategies, EnumCaseStrategy,
    ExperimentalFeatures, FieldMergingRule, Inclusion, InputConfig, ModuleType,
    OperationDocumentFormat, OutputConfig, SchemaDownloadConfig, SchemaTypesOutput,
    SelectionSetInitializer,
};
pub use enums::render_enum;
pub use fragments::{render_fragment, RenderedFile};
pub use ir::{EnumIr, EnumValueIr, FragmentIr, ParentTypeIr, ParentTypeKind, SelectionIr};
pub use keywords::{escape_identifier, is_reserved_type_name, is_reserved_word};
