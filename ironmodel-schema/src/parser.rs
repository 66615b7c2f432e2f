//! Model document parser.
//!
//! Builds a [`Model`] from a `<model>` document: one schema per `<schema>`
//! element, fields dispatched to the codec registered for their `type`,
//! fieldsets merged by name, invariants and bases resolved through the
//! context's resolver. Errors are annotated with the file name and the line
//! of the innermost element being read.

use crate::codec::ParseContext;
use crate::context::ModelContext;
use crate::error::ParseError;
use crate::policy::{DEFAULT_POLICY, SchemaPolicy};
use crate::xml::{Element, I18N_NAMESPACE, ns, parse_document};
use ironmodel_core::{DEFAULT_ORDER, Field, Fieldset, Invariant, Model, Resolved, Schema};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Parses a model document with the default policy.
///
/// # Arguments
/// * `xml` - Document text
/// * `ctx` - Registry, resolver, handlers and policies
///
/// # Errors
/// Returns `ParseError::Located` wrapping the first failure.
pub fn parse_model(xml: &str, ctx: &ModelContext) -> Result<Model, ParseError> {
    parse_model_with(xml, None, DEFAULT_POLICY, ctx)
}

/// Parses a model document.
///
/// # Arguments
/// * `xml` - Document text
/// * `file_name` - Source file, reported in errors
/// * `policy` - Name of the schema policy to apply
/// * `ctx` - Registry, resolver, handlers and policies
///
/// # Returns
/// The schemata keyed by the `name` attribute of their `<schema>` element.
///
/// # Errors
/// Returns `ParseError::Located` wrapping the first failure;
/// [`ParseError::root`] gives the original error.
pub fn parse_model_with(
    xml: &str,
    file_name: Option<&str>,
    policy: &str,
    ctx: &ModelContext,
) -> Result<Model, ParseError> {
    let mut state = ParseContext::new(ctx.registry(), ctx.resolver());
    let result = read_model(xml, policy, ctx, &mut state);
    result.map_err(|err| err.located(file_name, state.line(), xml))
}

/// Reads and parses a model file.
///
/// # Errors
/// Returns `ParseError::Io` if the file cannot be read, otherwise see
/// [`parse_model_with`].
pub fn parse_file(
    path: impl AsRef<Path>,
    policy: &str,
    ctx: &ModelContext,
) -> Result<Model, ParseError> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path)?;
    let file_name = path.display().to_string();
    parse_model_with(&xml, Some(&file_name), policy, ctx)
}

fn read_model(
    xml: &str,
    policy: &str,
    ctx: &ModelContext,
    state: &mut ParseContext<'_>,
) -> Result<Model, ParseError> {
    let policy = ctx.policy(policy)?;
    let root = parse_document(xml)?;
    state.enter(&root);
    if !root.is_model_element() || root.local_name() != "model" {
        return Err(ParseError::InvalidStructure {
            message: format!("expected a <model> root element, found <{}>", root.local_name()),
        });
    }
    state.set_i18n_domain(
        root.get(&ns("domain", I18N_NAMESPACE))
            .map(str::to_string),
    );

    let mut model = Model::new();
    for child in &root.children {
        if !child.is_model_element() || child.local_name() != "schema" {
            tracing::warn!("Ignoring <{}> outside of a schema", child.local_name());
            continue;
        }
        state.enter(child);
        let (name, schema) = read_schema(child, &root, policy, ctx, state)?;
        model.insert(name, schema);
        state.leave();
    }
    state.leave();

    tracing::debug!(schemata = model.len(), "model parsed");
    Ok(model)
}

/// Fields, fieldsets and invariants of one `<schema>` element.
#[derive(Default)]
struct SchemaParts<'x> {
    fields: BTreeMap<String, Field>,
    elements: HashMap<String, &'x Element>,
    fieldsets: Vec<Fieldset>,
    invariants: Vec<Invariant>,
}

fn read_schema(
    element: &Element,
    document: &Element,
    policy: &dyn SchemaPolicy,
    ctx: &ModelContext,
    state: &mut ParseContext<'_>,
) -> Result<(String, Schema), ParseError> {
    let schema_name = element.get("name").unwrap_or_default().to_string();

    let mut bases: Vec<Arc<Schema>> = Vec::new();
    let mut base_orders: HashMap<String, u64> = HashMap::new();
    for identifier in element.get("based-on").unwrap_or_default().split_whitespace() {
        let base = match state.resolve(identifier)? {
            Resolved::Schema(base) => base,
            other => {
                return Err(ParseError::MissingCapability {
                    identifier: identifier.to_string(),
                    expected: "schema",
                    actual: other.kind(),
                });
            }
        };
        for (name, field) in base.all_fields() {
            base_orders.insert(name.to_string(), field.order);
        }
        bases.push(base);
    }

    let mut parts = SchemaParts::default();
    for child in &element.children {
        if !child.is_model_element() {
            continue;
        }
        state.enter(child);
        match child.local_name() {
            "field" => {
                read_field(child, &base_orders, &mut parts, state)?;
            }
            "fieldset" => read_fieldset(child, &schema_name, &base_orders, &mut parts, state)?,
            "invariant" => {
                let identifier = child.text.as_deref().unwrap_or_default().trim();
                match state.resolve(identifier)? {
                    Resolved::Invariant(invariant) => parts.invariants.push(invariant),
                    other => {
                        return Err(ParseError::MissingCapability {
                            identifier: identifier.to_string(),
                            expected: "invariant",
                            actual: other.kind(),
                        });
                    }
                }
            }
            other => tracing::warn!("Ignoring <{}> in schema '{}'", other, schema_name),
        }
        state.leave();
    }

    let mut schema = Schema::new(
        policy.name(&schema_name, document),
        policy.module(&schema_name, document),
    );
    bases.extend(policy.bases(&schema_name, document));
    bases.push(Schema::root());
    schema.set_bases(bases);
    for field in parts.fields.into_values() {
        schema.insert_field(field);
    }
    schema.set_fieldsets(parts.fieldsets);
    schema.set_invariants(parts.invariants);

    if !ctx.field_handlers().is_empty() {
        let names: Vec<String> = schema
            .fields_in_order()
            .into_iter()
            .map(|field| field.name().to_string())
            .collect();
        for name in &names {
            let Some(field_element) = parts.elements.get(name) else {
                continue;
            };
            state.enter(field_element);
            for handler in ctx.field_handlers() {
                handler.read(field_element, &mut schema, name)?;
            }
            state.leave();
        }
    }
    for handler in ctx.schema_handlers() {
        handler.read(element, &mut schema)?;
    }

    tracing::debug!(
        schema = %schema_name,
        fields = schema.fields().len(),
        fieldsets = schema.fieldsets().len(),
        "schema parsed"
    );
    Ok((schema_name, schema))
}

fn read_field<'x>(
    element: &'x Element,
    base_orders: &HashMap<String, u64>,
    parts: &mut SchemaParts<'x>,
    state: &mut ParseContext<'_>,
) -> Result<String, ParseError> {
    let name = element
        .get("name")
        .ok_or_else(|| ParseError::missing_attr("field", "name"))?;
    let type_name = element
        .get("type")
        .ok_or_else(|| ParseError::missing_attr("field", "type"))?;
    let codec = state
        .registry()
        .get(type_name)
        .ok_or_else(|| ParseError::UnknownFieldType {
            type_name: type_name.to_string(),
            field: name.to_string(),
        })?;

    let mut field = codec.read(element, state)?;
    if let Some(order) = base_orders.get(name) {
        field.order = *order;
    }
    parts.fields.insert(name.to_string(), field);
    parts.elements.insert(name.to_string(), element);
    Ok(name.to_string())
}

fn read_fieldset<'x>(
    element: &'x Element,
    schema_name: &str,
    base_orders: &HashMap<String, u64>,
    parts: &mut SchemaParts<'x>,
    state: &mut ParseContext<'_>,
) -> Result<(), ParseError> {
    let name = element
        .get("name")
        .ok_or_else(|| ParseError::UnnamedFieldset {
            schema: schema_name.to_string(),
        })?;

    let index = match parts.fieldsets.iter().position(|f| f.name == name) {
        Some(index) => index,
        None => {
            let mut fieldset = Fieldset::new(name);
            if let Some(label) = element.get("label") {
                fieldset = fieldset.with_label(label);
            }
            if let Some(description) = element.get("description") {
                fieldset = fieldset.with_description(description);
            }
            let order = match element.get("order") {
                Some(text) => text
                    .trim()
                    .parse()
                    .map_err(|_| ParseError::invalid_attr("fieldset", "order", text))?,
                None => DEFAULT_ORDER,
            };
            parts.fieldsets.push(fieldset.with_order(order));
            parts.fieldsets.len() - 1
        }
    };

    for child in element.model_children("field") {
        state.enter(child);
        let field_name = read_field(child, base_orders, parts, state)?;
        let fields = &mut parts.fieldsets[index].fields;
        if !fields.contains(&field_name) {
            fields.push(field_name);
        }
        state.leave();
    }
    Ok(())
}
