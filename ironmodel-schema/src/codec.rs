//! Field codec trait and per-parse state.

use crate::error::ParseError;
use crate::registry::TypeRegistry;
use crate::xml::Element;
use ironmodel_core::{Field, Resolved, Resolver};

/// Reads and writes the XML form of one field type.
///
/// Codecs are registered in a [`TypeRegistry`] under the identifier used in
/// the `type` attribute of `<field>` elements.
pub trait FieldCodec: Send + Sync {
    /// Reads a `<field>` element into a field.
    ///
    /// # Arguments
    /// * `element` - The field element (or a nested attribute element such
    ///   as `<value_type>`)
    /// * `ctx` - Parse state: registry, resolver, i18n domain, line stack
    ///
    /// # Errors
    /// Returns an error if the element does not describe a valid field.
    fn read(&self, element: &Element, ctx: &mut ParseContext<'_>) -> Result<Field, ParseError>;

    /// Writes a field into an element named `element_name`.
    ///
    /// # Arguments
    /// * `field` - Field to write
    /// * `name` - Value of the `name` attribute, omitted for nested fields
    /// * `element_name` - Tag of the produced element
    /// * `registry` - Registry used for nested fields
    ///
    /// # Errors
    /// Returns `ParseError::NotSupported` for fields that have no XML form.
    fn write(
        &self,
        field: &Field,
        name: Option<&str>,
        element_name: &str,
        registry: &TypeRegistry,
    ) -> Result<Element, ParseError>;
}

/// State threaded through one parse.
///
/// Tracks the lines of the elements being read so that errors can be
/// reported against the innermost one. Entries are only popped on success,
/// so after a failure [`ParseContext::line`] still points at the offending
/// element.
pub struct ParseContext<'a> {
    registry: &'a TypeRegistry,
    resolver: &'a dyn Resolver,
    i18n_domain: Option<String>,
    lines: Vec<Option<usize>>,
}

impl<'a> ParseContext<'a> {
    /// Creates a parse context.
    #[must_use]
    pub fn new(registry: &'a TypeRegistry, resolver: &'a dyn Resolver) -> Self {
        Self {
            registry,
            resolver,
            i18n_domain: None,
            lines: Vec::new(),
        }
    }

    /// The type registry.
    #[must_use]
    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    /// The dotted-name resolver.
    #[must_use]
    pub fn resolver(&self) -> &'a dyn Resolver {
        self.resolver
    }

    /// Document-level i18n domain, if declared.
    #[must_use]
    pub fn i18n_domain(&self) -> Option<&str> {
        self.i18n_domain.as_deref()
    }

    /// Sets the document-level i18n domain.
    pub fn set_i18n_domain(&mut self, domain: Option<String>) {
        self.i18n_domain = domain;
    }

    /// Marks `element` as being read.
    pub fn enter(&mut self, element: &Element) {
        self.lines.push(element.line);
    }

    /// Marks the innermost element as done.
    pub fn leave(&mut self) {
        self.lines.pop();
    }

    /// Line of the innermost element that has a known line.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        self.lines.iter().rev().find_map(|line| *line)
    }

    /// Resolves a dotted name.
    ///
    /// # Errors
    /// Returns `ParseError::Unresolved` if the name is unknown.
    pub fn resolve(&self, identifier: &str) -> Result<Resolved, ParseError> {
        self.resolver
            .resolve(identifier)
            .ok_or_else(|| ParseError::Unresolved {
                identifier: identifier.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironmodel_core::SymbolTable;

    #[test]
    fn test_line_tracks_innermost_element() {
        let registry = TypeRegistry::new();
        let resolver = SymbolTable::new();
        let mut ctx = ParseContext::new(&registry, &resolver);
        assert_eq!(ctx.line(), None);

        let mut outer = Element::new("schema");
        outer.line = Some(3);
        let inner = Element::new("element");
        ctx.enter(&outer);
        ctx.enter(&inner);
        assert_eq!(ctx.line(), Some(3));
        ctx.leave();

        let mut field = Element::new("field");
        field.line = Some(7);
        ctx.enter(&field);
        assert_eq!(ctx.line(), Some(7));
        ctx.leave();
        assert_eq!(ctx.line(), Some(3));
    }

    #[test]
    fn test_resolve_unknown_name() {
        let registry = TypeRegistry::new();
        let resolver = SymbolTable::new();
        let ctx = ParseContext::new(&registry, &resolver);
        assert!(matches!(
            ctx.resolve("nowhere.thing"),
            Err(ParseError::Unresolved { .. })
        ));
        assert!(ctx.resolve(ironmodel_core::ROOT_SCHEMA).is_ok());
    }
}
