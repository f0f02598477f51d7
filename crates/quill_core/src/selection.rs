//! Runtime selection set shape.
//!
//! This is the executable view of a compiled operation: enough structure to
//! resolve fields against the normalized store and to normalize a server
//! payload into records. Generated operation types build their root selection
//! set once through the builder methods here.

use indexmap::IndexMap;
use serde_json::Value;

/// One selection inside a selection set.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Field(Field),
    /// An inline type case (`... on Droid { ... }`); applies when the
    /// object's `__typename` matches the condition.
    InlineFragment {
        type_condition: Option<String>,
        selections: Vec<Selection>,
    },
    /// A named fragment spread, inlined at compile time. The name survives
    /// so executed data can report which fragments were fulfilled.
    FragmentSpread {
        name: String,
        selections: Vec<Selection>,
    },
}

/// A field selection with optional alias, arguments and sub-selections.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub alias: Option<String>,
    pub arguments: IndexMap<String, Value>,
    /// Empty for scalar leaves.
    pub selections: Vec<Selection>,
}

impl Field {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            arguments: IndexMap::new(),
            selections: Vec::new(),
        }
    }

    pub fn composite(name: impl Into<String>, selections: Vec<Selection>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            arguments: IndexMap::new(),
            selections,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    /// The key under which this field's value appears in response data.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// The key under which this field is stored in a normalized record.
    ///
    /// Arguments are canonicalized into the key (`hero({"episode":"JEDI"})`)
    /// so the same field with different arguments occupies distinct slots.
    pub fn storage_key(&self) -> String {
        if self.arguments.is_empty() {
            return self.name.clone();
        }
        let mut sorted: Vec<(&String, &Value)> = self.arguments.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let mut canonical = serde_json::Map::new();
        for (name, value) in sorted {
            canonical.insert(name.clone(), value.clone());
        }
        format!("{}({})", self.name, Value::Object(canonical))
    }
}

/// An ordered list of selections rooted at one composite type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionSet {
    pub selections: Vec<Selection>,
}

impl SelectionSet {
    pub fn new(selections: Vec<Selection>) -> Self {
        Self { selections }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.selections.push(Selection::Field(field));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Iterates every field selection, flattening fragment spreads and
    /// inline fragments whose type condition matches `type_name` (or which
    /// carry no condition).
    pub fn fields_for_type<'a>(&'a self, type_name: Option<&'a str>) -> Vec<&'a Field> {
        let mut fields = Vec::new();
        collect_fields(&self.selections, type_name, &mut fields);
        fields
    }

    /// Names of fragments whose selections are fully contained here, given
    /// the concrete type name of the object being read.
    pub fn fulfilled_fragment_names(&self, type_name: Option<&str>) -> Vec<String> {
        let mut names = Vec::new();
        collect_fragment_names(&self.selections, type_name, &mut names);
        names
    }
}

fn collect_fields<'a>(
    selections: &'a [Selection],
    type_name: Option<&'a str>,
    out: &mut Vec<&'a Field>,
) {
    for selection in selections {
        match selection {
            Selection::Field(field) => out.push(field),
            Selection::FragmentSpread { selections, .. } => {
                collect_fields(selections, type_name, out)
            }
            Selection::InlineFragment {
                type_condition,
                selections,
            } => {
                let applies = match (type_condition.as_deref(), type_name) {
                    (None, _) => true,
                    (Some(condition), Some(name)) => condition == name,
                    (Some(_), None) => false,
                };
                if applies {
                    collect_fields(selections, type_name, out);
                }
            }
        }
    }
}

fn collect_fragment_names(
    selections: &[Selection],
    type_name: Option<&str>,
    out: &mut Vec<String>,
) {
    for selection in selections {
        match selection {
            Selection::FragmentSpread { name, selections } => {
                out.push(name.clone());
                collect_fragment_names(selections, type_name, out);
            }
            Selection::InlineFragment {
                type_condition,
                selections,
            } => {
                let applies = match (type_condition.as_deref(), type_name) {
                    (None, _) => true,
                    (Some(condition), Some(name)) => condition == name,
                    (Some(_), None) => false,
                };
                if applies {
                    collect_fragment_names(selections, type_name, out);
                }
            }
            Selection::Field(_) => {}
        }
    }
}
