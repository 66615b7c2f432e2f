//! Metadata handler interfaces.
//!
//! Handlers attach out-of-band annotations to schemas and fields. They are
//! called once per schema (or once per field read from an element) after
//! the schema is built, and again when the schema is written. Handlers
//! usually keep their markup in their own namespace; the serializer
//! declares `prefix` for `namespace` on the document root.

use crate::error::ParseError;
use crate::xml::{Element, ns};
use ironmodel_core::{Field, PRIMARY_MARKER, Schema};

/// Reads and writes schema-level metadata.
pub trait SchemaMetadataHandler: Send + Sync {
    /// Namespace of the handler's markup.
    fn namespace(&self) -> Option<&str> {
        None
    }

    /// Preferred prefix for [`SchemaMetadataHandler::namespace`].
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// Extracts metadata from a `<schema>` element.
    ///
    /// # Errors
    /// Returns an error if the markup is invalid.
    fn read(&self, element: &Element, schema: &mut Schema) -> Result<(), ParseError>;

    /// Adds metadata to a `<schema>` element.
    ///
    /// # Errors
    /// Returns an error if the metadata cannot be expressed.
    fn write(&self, element: &mut Element, schema: &Schema) -> Result<(), ParseError>;
}

/// Reads and writes field-level metadata.
pub trait FieldMetadataHandler: Send + Sync {
    /// Namespace of the handler's markup.
    fn namespace(&self) -> Option<&str> {
        None
    }

    /// Preferred prefix for [`FieldMetadataHandler::namespace`].
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// Extracts metadata from the `<field>` element of `field`.
    ///
    /// # Arguments
    /// * `element` - The field element
    /// * `schema` - Schema owning the field
    /// * `field` - Name of the field
    ///
    /// # Errors
    /// Returns an error if the markup is invalid.
    fn read(&self, element: &Element, schema: &mut Schema, field: &str) -> Result<(), ParseError>;

    /// Adds metadata to the `<field>` element of `field`.
    ///
    /// # Errors
    /// Returns an error if the metadata cannot be expressed.
    fn write(&self, element: &mut Element, schema: &Schema, field: &Field)
    -> Result<(), ParseError>;
}

/// Namespace of marshalling hints.
pub const MARSHAL_NAMESPACE: &str = "http://namespaces.plone.org/supermodel/marshal";

/// Conventional prefix of [`MARSHAL_NAMESPACE`].
pub const MARSHAL_PREFIX: &str = "marshal";

/// Maps `marshal:primary="true"` on field elements to the primary marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimaryFieldHandler;

impl FieldMetadataHandler for PrimaryFieldHandler {
    fn namespace(&self) -> Option<&str> {
        Some(MARSHAL_NAMESPACE)
    }

    fn prefix(&self) -> Option<&str> {
        Some(MARSHAL_PREFIX)
    }

    fn read(&self, element: &Element, schema: &mut Schema, field: &str) -> Result<(), ParseError> {
        let attribute = ns("primary", MARSHAL_NAMESPACE);
        match element.get(&attribute) {
            Some("true") => schema.mark_primary([field])?,
            Some("false") | None => {}
            Some(other) => return Err(ParseError::invalid_attr("field", "marshal:primary", other)),
        }
        Ok(())
    }

    fn write(
        &self,
        element: &mut Element,
        _schema: &Schema,
        field: &Field,
    ) -> Result<(), ParseError> {
        if field.provides(PRIMARY_MARKER) {
            element.set(ns("primary", MARSHAL_NAMESPACE), "true");
        }
        Ok(())
    }
}
