//! GraphQL enum rendering.

use crate::casing::{first_uppercased, to_lower_camel_case};
use crate::config::{CodegenConfig, EnumCaseStrategy};
use crate::ir::{EnumIr, EnumValueIr};
use crate::keywords::{escape_identifier, is_reserved_type_name};

/// Renders one GraphQL enum as Swift source text.
///
/// The output always ends with a newline after the closing brace.
pub fn render_enum(ir: &EnumIr, config: &CodegenConfig) -> String {
    let mut out = String::new();

    let name = match &ir.custom_name {
        Some(custom) => {
            out.push_str(&format!(
                "// Renamed from GraphQL schema value: '{}'\n",
                ir.name
            ));
            custom.clone()
        }
        None => {
            let name = first_uppercased(&ir.name);
            if is_reserved_type_name(&name) {
                format!("{name}_Enum")
            } else {
                name
            }
        }
    };

    if config.options.schema_documentation.is_included() {
        if let Some(documentation) = &ir.documentation {
            push_doc_comment(&mut out, documentation, "");
        }
    }

    let access = match config.type_access() {
        Some(access) => format!("{access} "),
        None => String::new(),
    };
    out.push_str(&format!("{access}enum {name}: String, EnumType {{\n"));

    for value in &ir.values {
        if value.deprecation_reason.is_some()
            && !config.options.deprecated_enum_cases.is_included()
        {
            continue;
        }
        render_case(&mut out, value, config);
    }

    out.push_str("}\n");
    out
}

fn render_case(out: &mut String, value: &EnumValueIr, config: &CodegenConfig) {
    let mut has_documentation = false;
    if config.options.schema_documentation.is_included() {
        if let Some(documentation) = &value.documentation {
            push_doc_comment(out, documentation, "  ");
            has_documentation = true;
        }
    }
    if let Some(reason) = &value.deprecation_reason {
        if has_documentation {
            out.push_str("  ///\n");
        }
        out.push_str(&format!("  /// **Deprecated**: {reason}\n"));
    }

    let case_name = match &value.custom_name {
        Some(custom) => {
            out.push_str(&format!(
                "  // Renamed from GraphQL schema value: '{}'\n",
                value.name
            ));
            custom.clone()
        }
        None => {
            let converted = match config.options.conversion_strategies.enum_cases {
                EnumCaseStrategy::CamelCase => to_lower_camel_case(&value.name),
                EnumCaseStrategy::None => value.name.clone(),
            };
            escape_identifier(&converted)
        }
    };
    out.push_str(&format!("  case {case_name} = \"{}\"\n", value.name));
}

fn push_doc_comment(out: &mut String, documentation: &str, indent: &str) {
    for line in documentation.lines() {
        if line.is_empty() {
            out.push_str(&format!("{indent}///\n"));
        } else {
            out.push_str(&format!("{indent}/// {line}\n"));
        }
    }
}
