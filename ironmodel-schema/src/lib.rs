//! # IronModel Schema
//!
//! XML reader and writer for IronModel schemas.
//!
//! This crate provides:
//! - A namespace-aware element tree over `quick-xml`
//! - Text converters and the value codec for defaults, bounds and titles
//! - Field codecs and the [`TypeRegistry`] that dispatches on field type
//! - Schema and field metadata handlers
//! - Schema policies
//! - [`parse_model`] and [`serialize_model`], configured by a
//!   [`ModelContext`]

pub mod codec;
pub mod context;
pub mod converters;
pub mod error;
pub mod handlers;
pub mod metadata;
pub mod parser;
pub mod policy;
pub mod registry;
pub mod serializer;
pub mod values;
pub mod xml;

pub use codec::{FieldCodec, ParseContext};
pub use context::{ModelContext, ModelContextBuilder};
pub use error::ParseError;
pub use handlers::{AttributeFilter, StandardCodec};
pub use metadata::{
    FieldMetadataHandler, MARSHAL_NAMESPACE, MARSHAL_PREFIX, PrimaryFieldHandler,
    SchemaMetadataHandler,
};
pub use parser::{parse_file, parse_model, parse_model_with};
pub use policy::{DEFAULT_POLICY, DefaultSchemaPolicy, GENERATED_MODULE, SchemaPolicy};
pub use registry::TypeRegistry;
pub use serializer::{SerializeOptions, serialize_model, serialize_schema};
pub use values::{element_to_value, value_to_element};
pub use xml::{Element, I18N_NAMESPACE, XML_NAMESPACE};
