//! Schema policies.
//!
//! A policy decides the module, extra bases and final name of every schema
//! built by the parser.

use crate::xml::Element;
use ironmodel_core::Schema;
use std::sync::Arc;

/// Name of the default policy.
pub const DEFAULT_POLICY: &str = "";

/// Module of schemas built by the default policy.
pub const GENERATED_MODULE: &str = "ironmodel.generated";

/// Shapes schemas built from a document.
pub trait SchemaPolicy: Send + Sync {
    /// Module of the schema named `schema_name`.
    fn module(&self, schema_name: &str, document: &Element) -> String;

    /// Bases added after the bases named in `based-on`.
    fn bases(&self, schema_name: &str, document: &Element) -> Vec<Arc<Schema>>;

    /// Final name of the schema.
    fn name(&self, schema_name: &str, document: &Element) -> String;
}

/// Keeps names, adds no bases and places schemas in [`GENERATED_MODULE`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSchemaPolicy;

impl SchemaPolicy for DefaultSchemaPolicy {
    fn module(&self, _schema_name: &str, _document: &Element) -> String {
        GENERATED_MODULE.to_string()
    }

    fn bases(&self, _schema_name: &str, _document: &Element) -> Vec<Arc<Schema>> {
        Vec::new()
    }

    fn name(&self, schema_name: &str, _document: &Element) -> String {
        schema_name.to_string()
    }
}
