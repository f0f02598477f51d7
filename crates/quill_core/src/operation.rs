//! The contract implemented by generated operation types.

use crate::selection::SelectionSet;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// The kind of GraphQL operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    /// Subscriptions are delivered over multipart HTTP responses and
    /// advertise that in the Accept header.
    pub fn accepts_multipart(&self) -> bool {
        matches!(self, Self::Subscription)
    }
}

/// A GraphQL operation: document, variables and compiled root selection set.
///
/// Generated code implements this per operation; a value of the implementing
/// type carries that execution's variables.
///
/// # Example
///
/// ```ignore
/// #[derive(Clone, Serialize)]
/// struct HeroNameVariables { episode: String }
///
/// #[derive(Clone)]
/// struct HeroNameQuery { variables: HeroNameVariables }
///
/// impl Operation for HeroNameQuery {
///     type Variables = HeroNameVariables;
///     type Data = HeroNameData;
///
///     const KIND: OperationKind = OperationKind::Query;
///     const NAME: &'static str = "HeroName";
///     const DOCUMENT: &'static str =
///         "query HeroName($episode: Episode) { hero(episode: $episode) { name } }";
///
///     fn variables(&self) -> Option<&Self::Variables> { Some(&self.variables) }
///     fn root_selection_set() -> SelectionSet { /* compiled selections */ }
/// }
/// ```
pub trait Operation: Clone + Send + Sync + 'static {
    /// The input variables type.
    type Variables: Serialize + Send + Sync;

    /// The response data type.
    type Data: DeserializeOwned + Clone + std::fmt::Debug + Send + 'static;

    /// The kind of operation.
    const KIND: OperationKind;

    /// The operation name (for multi-operation documents).
    const NAME: &'static str;

    /// The operation source document.
    const DOCUMENT: &'static str;

    fn variables(&self) -> Option<&Self::Variables> {
        None
    }

    /// The compiled selection set rooted at this operation.
    fn root_selection_set() -> SelectionSet;
}
