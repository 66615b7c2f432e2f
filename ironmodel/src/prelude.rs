//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! ```ignore
//! use ironmodel::prelude::*;
//! ```

// Model types
pub use ironmodel_core::error::{Error as CoreError, Result as CoreResult};
pub use ironmodel_core::{
    DEFAULT_ORDER, Field, FieldType, Fieldset, Invariant, Message, Model, Resolved, Resolver,
    Schema, SymbolTable, Term, Value, Vocabulary, VocabularySource, sync_schema,
};

// XML types
pub use ironmodel_schema::{
    DEFAULT_POLICY, FieldCodec, FieldMetadataHandler, ModelContext, ModelContextBuilder,
    ParseError, SchemaMetadataHandler, SchemaPolicy, SerializeOptions, StandardCodec,
    TypeRegistry, parse_model, serialize_model,
};

// Loader types
pub use crate::error::LoadError;
pub use crate::loader::{FILENAME_KEY, ModelLoader};
