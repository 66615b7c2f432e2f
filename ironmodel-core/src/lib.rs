//! # IronModel Core
//!
//! In-memory model of typed schemas.
//!
//! This crate provides:
//! - [`Value`], the typed values fields hold
//! - [`Field`] and [`FieldType`] with per-type attributes and validation
//! - [`Vocabulary`] and token escaping for choice fields
//! - [`Schema`], [`Fieldset`] and [`Invariant`], with C3 base resolution
//! - [`Model`], a named collection of schemas
//! - [`Resolver`] for dotted-name lookup
//! - [`sync_schema`] and merged tagged-value helpers

pub mod error;
pub mod field;
pub mod model;
pub mod resolver;
pub mod schema;
pub mod sync;
pub mod value;
pub mod vocabulary;

pub use error::{Error, Result, ValidationError};
pub use field::{
    Attribute, AttributeKind, AttributeSpec, DefaultFactory, Field, FieldBuilder, FieldType,
    sorted_fields,
};
pub use model::Model;
pub use resolver::{Resolved, Resolver, SymbolTable};
pub use schema::{DEFAULT_ORDER, Fieldset, Invariant, PRIMARY_MARKER, ROOT_SCHEMA, Schema};
pub use sync::{merged_tagged_value_dict, merged_tagged_value_list, sync_schema};
pub use value::{Message, Value};
pub use vocabulary::{Term, Vocabulary, VocabularySource, escape_token, unescape_token};
