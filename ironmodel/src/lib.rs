//! # IronModel
//!
//! Typed schema models with a round-tripping XML representation.
//!
//! A model document describes one or more schemas: typed fields with
//! titles, defaults and constraints, grouped into fieldsets, extending base
//! schemas and checked by invariants. IronModel reads such documents into
//! an in-memory [`Model`](core::Model) and writes models back out in the
//! same canonical form.
//!
//! ## Features
//!
//! - **Round-trip codec** - Parsing then serializing a canonical document
//!   gives the same bytes
//! - **Extensible field types** - Register a codec under a new type
//!   identifier
//! - **Inheritance aware** - Overriding a base field keeps its position
//! - **Pluggable metadata** - Schema and field handlers add their own markup
//! - **Located errors** - Parse errors carry the file and line
//!
//! ## Quick Start
//!
//! ```ignore
//! use ironmodel::prelude::*;
//!
//! let loader = ModelLoader::new(ModelContext::default());
//! let model = loader.load_file("models/event.xml", DEFAULT_POLICY, false)?;
//! let xml = loader.serialize_model(&model)?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`] - Values, fields, schemas, vocabularies and schema merging
//! - [`schema`] - XML parser, serializer, codecs and type registry
//! - [`loader`] - Cached loading from files and strings

pub mod error;
pub mod loader;
pub mod prelude;

/// In-memory model types.
pub mod core {
    pub use ironmodel_core::*;
}

/// XML parsing and serialization.
pub mod schema {
    pub use ironmodel_schema::*;
}

pub use error::{LoadError, Result};
pub use loader::{FILENAME_KEY, ModelLoader};
