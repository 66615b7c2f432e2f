//! Model document serializer.
//!
//! The inverse of [`crate::parser`]: fields outside fieldsets come first in
//! creation order, then each fieldset with its fields in declared order.
//! Translation domains are hoisted to the root so only deviating elements
//! carry their own `i18n:domain`.

use crate::context::ModelContext;
use crate::error::ParseError;
use crate::xml::{Element, I18N_NAMESPACE, I18N_PREFIX, XML_NAMESPACE, ns, write_document};
use ironmodel_core::{DEFAULT_ORDER, Field, Fieldset, Model, Schema};
use std::collections::{BTreeMap, HashSet};

/// Output options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Indent nested elements by two spaces.
    pub pretty: bool,
}

impl SerializeOptions {
    /// Single-line output.
    #[must_use]
    pub const fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Serializes every schema of a model.
///
/// # Arguments
/// * `model` - Schemata keyed by name; the empty name is written without a
///   `name` attribute
/// * `ctx` - Registry and metadata handlers
/// * `options` - Output options
///
/// # Errors
/// Returns `ParseError::UnknownFieldType` for fields without a registered
/// codec and `ParseError::NotSupported` for values with no XML form.
pub fn serialize_model(
    model: &Model,
    ctx: &ModelContext,
    options: &SerializeOptions,
) -> Result<String, ParseError> {
    let root = model_element(model.iter(), ctx)?;
    tracing::debug!(schemata = model.len(), "model serialized");
    write_document(&root, options.pretty)
}

/// Serializes a single schema as a one-schema model.
///
/// # Errors
/// See [`serialize_model`].
pub fn serialize_schema(
    schema: &Schema,
    name: &str,
    ctx: &ModelContext,
    options: &SerializeOptions,
) -> Result<String, ParseError> {
    let root = model_element([(name, schema)], ctx)?;
    write_document(&root, options.pretty)
}

fn model_element<'a>(
    schemata: impl IntoIterator<Item = (&'a str, &'a Schema)>,
    ctx: &ModelContext,
) -> Result<Element, ParseError> {
    let mut root = Element::new("model");

    let mut prefixes = BTreeMap::new();
    let handler_namespaces = ctx
        .schema_handlers()
        .iter()
        .map(|h| (h.prefix(), h.namespace()))
        .chain(ctx.field_handlers().iter().map(|h| (h.prefix(), h.namespace())));
    for (prefix, namespace) in handler_namespaces {
        if let (Some(prefix), Some(namespace)) = (prefix, namespace) {
            if prefix != I18N_PREFIX {
                prefixes.insert(prefix.to_string(), namespace.to_string());
            }
        }
    }
    root.declare_namespace(Some(I18N_PREFIX), I18N_NAMESPACE);
    for (prefix, namespace) in &prefixes {
        root.declare_namespace(Some(prefix), namespace.clone());
    }
    root.declare_namespace(None, XML_NAMESPACE);

    for (name, schema) in schemata {
        root.push(schema_element(name, schema, ctx)?);
    }
    hoist_i18n_domain(&mut root);
    Ok(root)
}

fn schema_element(name: &str, schema: &Schema, ctx: &ModelContext) -> Result<Element, ParseError> {
    let mut element = Element::new("schema");
    if !name.is_empty() {
        element.set("name", name);
    }

    let bases: Vec<String> = schema
        .bases()
        .iter()
        .filter(|base| !base.is_root())
        .map(|base| base.identifier())
        .collect();
    if !bases.is_empty() {
        element.set("based-on", bases.join(" "));
    }

    for invariant in schema.invariants() {
        element.push(Element::new("invariant").with_text(invariant.identifier.clone()));
    }

    let grouped: HashSet<&str> = schema
        .fieldsets()
        .iter()
        .flat_map(|fieldset| fieldset.fields.iter().map(String::as_str))
        .collect();
    for field in schema.fields_in_order() {
        if !grouped.contains(field.name()) {
            element.push(field_element(field, schema, ctx)?);
        }
    }

    for fieldset in schema.fieldsets() {
        element.push(fieldset_element(fieldset, schema, ctx)?);
    }

    for handler in ctx.schema_handlers() {
        handler.write(&mut element, schema)?;
    }
    tracing::trace!(schema = name, fields = schema.fields().len(), "schema written");
    Ok(element)
}

fn fieldset_element(
    fieldset: &Fieldset,
    schema: &Schema,
    ctx: &ModelContext,
) -> Result<Element, ParseError> {
    let mut element = Element::new("fieldset");
    element.set("name", fieldset.name.as_str());
    if let Some(label) = fieldset.label.as_deref().filter(|l| !l.is_empty()) {
        element.set("label", label);
    }
    if let Some(description) = fieldset.description.as_deref().filter(|d| !d.is_empty()) {
        element.set("description", description);
    }
    if fieldset.order != DEFAULT_ORDER {
        element.set("order", fieldset.order.to_string());
    }
    for name in &fieldset.fields {
        let field = schema.require(name)?;
        element.push(field_element(field, schema, ctx)?);
    }
    Ok(element)
}

fn field_element(field: &Field, schema: &Schema, ctx: &ModelContext) -> Result<Element, ParseError> {
    let type_name = field.type_identifier();
    let codec = ctx
        .registry()
        .get(type_name)
        .ok_or_else(|| ParseError::UnknownFieldType {
            type_name: type_name.to_string(),
            field: field.name().to_string(),
        })?;
    let mut element = codec.write(field, Some(field.name()), "field", ctx.registry())?;
    for handler in ctx.field_handlers() {
        handler.write(&mut element, schema, field)?;
    }
    Ok(element)
}

/// Records the first translation domain on the root and drops matching
/// `i18n:domain` attributes below it.
fn hoist_i18n_domain(root: &mut Element) {
    let translate = ns("translate", I18N_NAMESPACE);
    let domain_attribute = ns("domain", I18N_NAMESPACE);
    let mut root_domain = root.get(&domain_attribute).map(str::to_string);

    for schema in &mut root.children {
        schema.walk_mut(&mut |node: &mut Element| {
            if node.get(&translate).is_none() {
                return;
            }
            let domain = node
                .get(&domain_attribute)
                .map(str::to_string)
                .or_else(|| root_domain.clone());
            if root_domain.is_none() {
                root_domain.clone_from(&domain);
            }
            if domain == root_domain {
                node.remove(&domain_attribute);
            }
        });
    }

    if let Some(domain) = root_domain.filter(|d| !d.is_empty()) {
        root.set(domain_attribute, domain);
    }
}
