//! Shared data model for the Quill GraphQL client.
//!
//! This crate holds the vocabulary types that the store, the request chain
//! and generated code all agree on:
//! - cache keys and normalized records
//! - the type-erased [`DataDict`] backing generated selection set accessors
//! - the runtime [`SelectionSet`] shape used for cache reads and writes
//! - the [`Operation`] contract implemented by generated operation types
//! - GraphQL results and errors as they cross the wire

mod data_dict;
mod key;
mod operation;
mod record;
mod result;
mod selection;

pub use data_dict::DataDict;
pub use key::CacheKey;
pub use operation::{Operation, OperationKind};
pub use record::{Record, RecordSet, RecordValue, ReferenceMarker};
pub use result::{GraphQLError, GraphQLResult, ResponseEnvelope, ResultSource};
pub use selection::{Field, Selection, SelectionSet};
