//! Compiler IR consumed by the renderers.
//!
//! The schema compiler hands the generator pre-resolved shapes; the
//! renderers never look at raw GraphQL source except to reprint fragment
//! definitions.

use indexmap::IndexMap;
use serde_json::Value;

/// A GraphQL enum ready for rendering.
#[derive(Debug, Clone)]
pub struct EnumIr {
    pub name: String,
    /// A schema-customized name that renders verbatim instead of `name`.
    pub custom_name: Option<String>,
    pub documentation: Option<String>,
    pub values: Vec<EnumValueIr>,
}

impl EnumIr {
    pub fn new(name: impl Into<String>, values: Vec<EnumValueIr>) -> Self {
        Self {
            name: name.into(),
            custom_name: None,
            documentation: None,
            values,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnumValueIr {
    pub name: String,
    pub custom_name: Option<String>,
    pub documentation: Option<String>,
    pub deprecation_reason: Option<String>,
}

impl EnumValueIr {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            custom_name: None,
            documentation: None,
            deprecation_reason: None,
        }
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    pub fn documented(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = Some(documentation.into());
        self
    }
}

/// The kind of composite type a fragment condition names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentTypeKind {
    Object,
    Interface,
    Union,
}

#[derive(Debug, Clone)]
pub struct ParentTypeIr {
    pub kind: ParentTypeKind,
    pub name: String,
}

impl ParentTypeIr {
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            kind: ParentTypeKind::Object,
            name: name.into(),
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            kind: ParentTypeKind::Interface,
            name: name.into(),
        }
    }

    pub fn union(name: impl Into<String>) -> Self {
        Self {
            kind: ParentTypeKind::Union,
            name: name.into(),
        }
    }
}

/// One rendered selection inside a generated selection set.
#[derive(Debug, Clone)]
pub enum SelectionIr {
    Field {
        name: String,
        alias: Option<String>,
        /// The already-resolved Swift type of the field, e.g. `String?` or
        /// `[Hero]`.
        swift_type: String,
        arguments: IndexMap<String, Value>,
    },
    FragmentSpread {
        name: String,
    },
    InlineFragment {
        type_condition: String,
    },
}

impl SelectionIr {
    pub fn field(name: impl Into<String>, swift_type: impl Into<String>) -> Self {
        Self::Field {
            name: name.into(),
            alias: None,
            swift_type: swift_type.into(),
            arguments: IndexMap::new(),
        }
    }
}

/// A named fragment ready for rendering.
#[derive(Debug, Clone)]
pub struct FragmentIr {
    pub name: String,
    pub type_condition: ParentTypeIr,
    /// The fragment as written in the operation document; reprinted into
    /// `fragmentDefinition` with `__typename` injected.
    pub source: String,
    pub selections: Vec<SelectionIr>,
    pub is_local_cache_mutation: bool,
    /// Modules named by `@import(module:)` directives, handed to the file
    /// writer for the generated file's import list.
    pub imported_modules: Vec<String>,
}

impl FragmentIr {
    pub fn new(
        name: impl Into<String>,
        type_condition: ParentTypeIr,
        source: impl Into<String>,
        selections: Vec<SelectionIr>,
    ) -> Self {
        Self {
            name: name.into(),
            type_condition,
            source: source.into(),
            selections,
            is_local_cache_mutation: false,
            imported_modules: Vec::new(),
        }
    }
}
