//! Fragment and selection set rendering.

use crate::casing::first_uppercased;
use crate::config::{
    CodegenConfig, OperationDocumentFormat, SelectionSetInitializer,
};
use crate::ir::{FragmentIr, ParentTypeKind, SelectionIr};
use crate::keywords::{escape_identifier, is_reserved_type_name};
use serde_json::Value;

/// A rendered source file plus the modules its `@import(module:)`
/// directives asked the file writer to import.
#[derive(Debug, Clone)]
pub struct RenderedFile {
    pub content: String,
    pub imported_modules: Vec<String>,
}

/// Renders a named fragment as a Swift selection set struct.
pub fn render_fragment(ir: &FragmentIr, config: &CodegenConfig) -> RenderedFile {
    let name = fragment_struct_name(&ir.name);
    let namespace = schema_namespace(&config.schema_namespace);
    let kind = if ir.is_local_cache_mutation {
        "MutableSelectionSet"
    } else {
        "SelectionSet"
    };

    let type_access = prefix(config.type_access());
    let member_access = type_access.clone();
    let static_access = prefix(config.static_member_access());

    let mut out = String::new();
    out.push_str(&format!(
        "{type_access}struct {name}: {namespace}.{kind}, Fragment {{\n"
    ));

    if config.options.operation_document_format != OperationDocumentFormat::OperationId {
        out.push_str(&format!(
            "  {static_access}static var fragmentDefinition: StaticString {{\n    #\"{}\"#\n  }}\n\n",
            reprint_definition(&ir.source)
        ));
    }

    let data_binding = if ir.is_local_cache_mutation { "var" } else { "let" };
    out.push_str(&format!("  {member_access}{data_binding} __data: DataDict\n"));
    out.push_str(&format!(
        "  {member_access}init(_dataDict: DataDict) {{ __data = _dataDict }}\n\n"
    ));

    out.push_str(&format!(
        "  {static_access}static var __parentType: any ParentType {{ {namespace}.{}.{} }}\n",
        parent_type_namespace(ir.type_condition.kind),
        ir.type_condition.name
    ));

    if !omits_selections(ir) {
        out.push_str(&format!(
            "  {static_access}static var __selections: [Selection] {{ [\n"
        ));
        for selection in &ir.selections {
            out.push_str(&format!("    {},\n", render_selection(selection)));
        }
        out.push_str("  ] }\n");
    }

    render_accessors(&mut out, ir, &member_access);

    if should_render_initializer(ir, config) {
        render_initializer(&mut out, ir, config, &member_access, &namespace);
    }

    out.push_str("}\n");
    RenderedFile {
        content: out,
        imported_modules: ir.imported_modules.clone(),
    }
}

fn prefix(access: Option<&'static str>) -> String {
    match access {
        Some(access) => format!("{access} "),
        None => String::new(),
    }
}

/// First-uppercases the fragment name, suffixing `_Fragment` on reserved
/// type name clashes. Underscores are preserved.
fn fragment_struct_name(name: &str) -> String {
    let name = first_uppercased(name);
    if is_reserved_type_name(&name) {
        format!("{name}_Fragment")
    } else {
        name
    }
}

/// The schema namespace is emitted verbatim, except an entirely lowercase
/// namespace gets its first letter uppercased.
fn schema_namespace(namespace: &str) -> String {
    if namespace.chars().all(|c| !c.is_uppercase()) {
        first_uppercased(namespace)
    } else {
        namespace.to_string()
    }
}

fn parent_type_namespace(kind: ParentTypeKind) -> &'static str {
    match kind {
        ParentTypeKind::Object => "Objects",
        ParentTypeKind::Interface => "Interfaces",
        ParentTypeKind::Union => "Unions",
    }
}

// The typename of an object parent is implicit; a lone __typename selection
// renders no selection list at all.
fn omits_selections(ir: &FragmentIr) -> bool {
    ir.type_condition.kind == ParentTypeKind::Object
        && ir.selections.len() == 1
        && matches!(&ir.selections[0], SelectionIr::Field { name, .. } if name == "__typename")
}

fn render_selection(selection: &SelectionIr) -> String {
    match selection {
        SelectionIr::Field {
            name,
            alias,
            swift_type,
            arguments,
        } => {
            let mut parts = vec![format!("\"{name}\"")];
            if let Some(alias) = alias {
                parts.push(format!("alias: \"{alias}\""));
            }
            parts.push(format!("{swift_type}.self"));
            if !arguments.is_empty() {
                let rendered: Vec<String> = arguments
                    .iter()
                    .map(|(name, value)| format!("\"{name}\": {}", render_argument(value)))
                    .collect();
                parts.push(format!("arguments: [{}]", rendered.join(", ")));
            }
            format!(".field({})", parts.join(", "))
        }
        SelectionIr::FragmentSpread { name } => {
            format!(".fragment({}.self)", fragment_struct_name(name))
        }
        SelectionIr::InlineFragment { type_condition } => {
            format!(".inlineFragment(As{type_condition}.self)")
        }
    }
}

fn render_argument(value: &Value) -> String {
    match value {
        Value::String(text) => match text.strip_prefix('$') {
            Some(variable) => format!(".variable(\"{variable}\")"),
            None => format!("\"{text}\""),
        },
        Value::Null => ".null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(render_argument).collect();
            format!("[{}]", rendered.join(", "))
        }
        Value::Object(map) => {
            let rendered: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("\"{key}\": {}", render_argument(value)))
                .collect();
            format!("[{}]", rendered.join(", "))
        }
    }
}

fn render_accessors(out: &mut String, ir: &FragmentIr, member_access: &str) {
    let fields: Vec<_> = accessor_fields(ir).collect();
    if fields.is_empty() {
        return;
    }
    out.push('\n');
    for (name, alias, swift_type) in fields {
        let response_key = alias.unwrap_or(name);
        let accessor = escape_identifier(response_key);
        if ir.is_local_cache_mutation {
            out.push_str(&format!(
                "  {member_access}var {accessor}: {swift_type} {{\n    get {{ __data[\"{response_key}\"] }}\n    set {{ __data[\"{response_key}\"] = newValue }}\n  }}\n"
            ));
        } else {
            out.push_str(&format!(
                "  {member_access}var {accessor}: {swift_type} {{ __data[\"{response_key}\"] }}\n"
            ));
        }
    }
}

fn accessor_fields(ir: &FragmentIr) -> impl Iterator<Item = (&str, Option<&str>, &str)> {
    ir.selections.iter().filter_map(|selection| match selection {
        SelectionIr::Field {
            name,
            alias,
            swift_type,
            ..
        } if name != "__typename" => {
            Some((name.as_str(), alias.as_deref(), swift_type.as_str()))
        }
        _ => None,
    })
}

fn should_render_initializer(ir: &FragmentIr, config: &CodegenConfig) -> bool {
    if ir.is_local_cache_mutation {
        return true;
    }
    config
        .options
        .selection_set_initializers
        .iter()
        .any(|initializer| match initializer {
            // `.all` only applies under full field merging; partial merging
            // produces shapes a memberwise initializer cannot fill.
            SelectionSetInitializer::All => config.experimental_features.merges_all_fields(),
            SelectionSetInitializer::NamedFragments => true,
            SelectionSetInitializer::Fragment(name) => *name == ir.name,
            SelectionSetInitializer::Operations => false,
        })
}

fn render_initializer(
    out: &mut String,
    ir: &FragmentIr,
    _config: &CodegenConfig,
    member_access: &str,
    namespace: &str,
) {
    let fields: Vec<_> = accessor_fields(ir).collect();

    out.push('\n');
    out.push_str(&format!("  {member_access}init(\n"));
    for (index, (name, alias, swift_type)) in fields.iter().copied().enumerate() {
        let label = escape_identifier(alias.unwrap_or(name));
        let comma = if index + 1 == fields.len() { "" } else { "," };
        out.push_str(&format!("    {label}: {swift_type}{comma}\n"));
    }
    out.push_str("  ) {\n");
    out.push_str("    self.init(_dataDict: DataDict(\n      data: [\n");
    out.push_str(&format!(
        "        \"__typename\": {namespace}.{}.{}.typename,\n",
        parent_type_namespace(ir.type_condition.kind),
        ir.type_condition.name
    ));
    for (name, alias, _) in fields.iter().copied() {
        let response_key = alias.unwrap_or(name);
        out.push_str(&format!(
            "        \"{response_key}\": {},\n",
            escape_identifier(response_key)
        ));
    }
    out.push_str("      ],\n");
    out.push_str("      fulfilledFragments: [ObjectIdentifier(Self.self)]\n");
    out.push_str("    ))\n  }\n");
}

/// Reprints a fragment source for `fragmentDefinition`: injects
/// `__typename` as the first selection of every composite selection set and
/// strips the local-cache-mutation directive.
fn reprint_definition(source: &str) -> String {
    let stripped = source
        .replace(" @quill_localCacheMutation", "")
        .replace("@quill_localCacheMutation", "");
    inject_typename(&stripped)
}

fn inject_typename(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut paren_depth = 0usize;

    for (index, &c) in chars.iter().enumerate() {
        out.push(c);
        match c {
            '(' => paren_depth += 1,
            ')' => paren_depth = paren_depth.saturating_sub(1),
            // A brace outside arguments opens a selection set.
            '{' if paren_depth == 0 => {
                let rest: String = chars[index + 1..].iter().collect();
                if !rest.trim_start().starts_with("__typename") {
                    out.push_str(" __typename");
                }
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ParentTypeIr;

    fn config() -> CodegenConfig {
        CodegenConfig::from_json(
            r#"{
                "schemaNamespace": "starWars",
                "input": {"schemaPath": "./schema.graphqls"},
                "output": {"schemaTypes": {"path": "./Generated", "moduleType": {"swiftPackage": {}}}}
            }"#,
        )
        .unwrap()
    }

    fn hero_details() -> FragmentIr {
        FragmentIr::new(
            "HeroDetails",
            ParentTypeIr::object("Hero"),
            "fragment HeroDetails on Hero { name }",
            vec![
                SelectionIr::field("__typename", "String"),
                SelectionIr::field("name", "String"),
            ],
        )
    }

    #[test]
    fn test_basic_fragment_rendering() {
        let rendered = render_fragment(&hero_details(), &config());
        let content = &rendered.content;

        assert!(content.starts_with(
            "public struct HeroDetails: starWars.SelectionSet, Fragment {\n"
        ));
        assert!(content.contains(
            "  public static var fragmentDefinition: StaticString {\n    #\"fragment HeroDetails on Hero { __typename name }\"#\n  }\n"
        ));
        assert!(content.contains("  public let __data: DataDict\n"));
        assert!(content.contains("  public init(_dataDict: DataDict) { __data = _dataDict }\n"));
        assert!(content.contains(
            "  public static var __parentType: any ParentType { starWars.Objects.Hero }\n"
        ));
        assert!(content.contains("    .field(\"__typename\", String.self),\n"));
        assert!(content.contains("    .field(\"name\", String.self),\n"));
        assert!(content.contains("  public var name: String { __data[\"name\"] }\n"));
        assert!(content.ends_with("}\n"));
    }

    #[test]
    fn test_reserved_fragment_name_gains_fragment_suffix() {
        let mut ir = hero_details();
        ir.name = "type".to_string();
        let rendered = render_fragment(&ir, &config());
        assert!(rendered.content.contains("struct Type_Fragment:"));
    }

    #[test]
    fn test_local_cache_mutation_renders_mutable_selection_set() {
        let mut ir = hero_details();
        ir.is_local_cache_mutation = true;
        ir.source =
            "fragment HeroDetails on Hero @quill_localCacheMutation { name }".to_string();
        let rendered = render_fragment(&ir, &config());
        let content = &rendered.content;

        assert!(content.contains("starWars.MutableSelectionSet, Fragment"));
        assert!(content.contains("  public var __data: DataDict\n"));
        assert!(content.contains("set { __data[\"name\"] = newValue }"));
        // The directive never appears in the reprinted definition.
        assert!(content.contains("#\"fragment HeroDetails on Hero { __typename name }\"#"));
        // Local cache mutations always get an initializer.
        assert!(content.contains("  public init(\n    name: String\n  ) {"));
    }

    #[test]
    fn test_typename_injected_into_nested_selection_sets() {
        let source =
            "fragment HeroWithFriends on Hero { name friends(first: 5) { name } }";
        let reprinted = reprint_definition(source);
        assert_eq!(
            reprinted,
            "fragment HeroWithFriends on Hero { __typename name friends(first: 5) { __typename name } }"
        );
    }

    #[test]
    fn test_typename_not_duplicated_when_already_first() {
        let source = "fragment HeroDetails on Hero { __typename name }";
        assert_eq!(reprint_definition(source), source);
    }

    #[test]
    fn test_parent_type_resolution_per_kind() {
        let config = config();
        let mut ir = hero_details();

        ir.type_condition = ParentTypeIr::interface("Character");
        let rendered = render_fragment(&ir, &config);
        assert!(rendered.content.contains("starWars.Interfaces.Character"));

        ir.type_condition = ParentTypeIr::union("SearchResult");
        let rendered = render_fragment(&ir, &config);
        assert!(rendered.content.contains("starWars.Unions.SearchResult"));
    }

    #[test]
    fn test_lowercase_namespace_is_first_uppercased() {
        let mut config = config();
        config.schema_namespace = "starwars".to_string();
        let rendered = render_fragment(&hero_details(), &config);
        assert!(rendered.content.contains("Starwars.SelectionSet"));
    }

    #[test]
    fn test_typename_only_object_fragment_omits_selections() {
        let ir = FragmentIr::new(
            "HeroTypename",
            ParentTypeIr::object("Hero"),
            "fragment HeroTypename on Hero { __typename }",
            vec![SelectionIr::field("__typename", "String")],
        );
        let rendered = render_fragment(&ir, &config());
        assert!(!rendered.content.contains("__selections"));
    }

    #[test]
    fn test_typename_only_interface_fragment_keeps_selections() {
        let ir = FragmentIr::new(
            "CharacterTypename",
            ParentTypeIr::interface("Character"),
            "fragment CharacterTypename on Character { __typename }",
            vec![SelectionIr::field("__typename", "String")],
        );
        let rendered = render_fragment(&ir, &config());
        assert!(rendered.content.contains("__selections"));
    }

    #[test]
    fn test_operation_id_format_omits_fragment_definition() {
        let mut config = config();
        config.options.operation_document_format = OperationDocumentFormat::OperationId;
        let rendered = render_fragment(&hero_details(), &config);
        assert!(!rendered.content.contains("fragmentDefinition"));
    }

    #[test]
    fn test_initializer_emitted_for_named_fragments_config() {
        let mut config = config();
        config.options.selection_set_initializers = vec![SelectionSetInitializer::NamedFragments];
        let rendered = render_fragment(&hero_details(), &config);
        assert!(rendered.content.contains("  public init(\n    name: String\n  ) {"));
        assert!(rendered
            .content
            .contains("\"__typename\": starWars.Objects.Hero.typename,"));
        assert!(rendered.content.contains("fulfilledFragments: [ObjectIdentifier(Self.self)]"));
    }

    #[test]
    fn test_all_initializers_suppressed_without_full_field_merging() {
        let mut config = config();
        config.options.selection_set_initializers = vec![SelectionSetInitializer::All];
        config.experimental_features.field_merging =
            vec![crate::config::FieldMergingRule::Ancestors];
        let rendered = render_fragment(&hero_details(), &config);
        assert!(!rendered.content.contains("public init(\n    name"));
    }

    #[test]
    fn test_fragment_named_initializer_matches_by_name() {
        let mut config = config();
        config.options.selection_set_initializers =
            vec![SelectionSetInitializer::Fragment("HeroDetails".to_string())];
        let rendered = render_fragment(&hero_details(), &config);
        assert!(rendered.content.contains("public init(\n    name: String\n  ) {"));

        config.options.selection_set_initializers =
            vec![SelectionSetInitializer::Fragment("Other".to_string())];
        let rendered = render_fragment(&hero_details(), &config);
        assert!(!rendered.content.contains("public init(\n    name"));
    }

    #[test]
    fn test_imported_modules_flow_to_the_file_writer() {
        let mut ir = hero_details();
        ir.imported_modules = vec!["HeroKit".to_string(), "SharedModels".to_string()];
        let rendered = render_fragment(&ir, &config());
        assert_eq!(rendered.imported_modules, vec!["HeroKit", "SharedModels"]);
    }

    #[test]
    fn test_embedded_internal_target_omits_access_but_reserved_static_rules_hold() {
        let config = CodegenConfig::from_json(
            r#"{
                "schemaNamespace": "api",
                "input": {"schemaPath": "./schema.graphqls"},
                "output": {"schemaTypes": {"path": "./Generated", "moduleType": {
                    "embeddedInTarget": {"name": "MyApp", "accessModifier": "public"}
                }}}
            }"#,
        )
        .unwrap();
        let rendered = render_fragment(&hero_details(), &config);
        let content = &rendered.content;

        assert!(content.starts_with("struct HeroDetails:"));
        assert!(content.contains("  public static var __parentType"));
        assert!(content.contains("  let __data: DataDict\n"));
    }

    #[test]
    fn test_field_arguments_render_variables_and_literals() {
        let mut ir = hero_details();
        let mut arguments = indexmap::IndexMap::new();
        arguments.insert("episode".to_string(), serde_json::json!("$ep"));
        arguments.insert("first".to_string(), serde_json::json!(5));
        ir.selections.push(SelectionIr::Field {
            name: "friends".to_string(),
            alias: None,
            swift_type: "[Friend]".to_string(),
            arguments,
        });
        let rendered = render_fragment(&ir, &config());
        assert!(rendered.content.contains(
            ".field(\"friends\", [Friend].self, arguments: [\"episode\": .variable(\"ep\"), \"first\": 5])"
        ));
    }
}
