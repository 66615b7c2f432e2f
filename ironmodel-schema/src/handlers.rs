//! Field codecs for the standard field types.
//!
//! [`StandardCodec`] reads and writes a field generically from the
//! attribute set its type declares ([`FieldType::attributes`]). Mapping,
//! object and choice fields add a few attributes and filters on top.
//!
//! # Reading
//!
//! Child elements are matched to attributes by local name. Scalar
//! attributes are converted right away, nested fields (`key_type`,
//! `value_type`) go through the codec of their own `type`. Attributes
//! valued in the field's own type wait until everything else is set and
//! are applied in the order `min`, `max`, `default` (each validated
//! against the field as configured so far), then `missing_value`
//! (not validated).
//!
//! # Writing
//!
//! Attributes are written in alphabetical order. An attribute equal to its
//! declared default is skipped. `default` and `missing_value` are written
//! even when they equal the field's missing value.

use crate::codec::{FieldCodec, ParseContext};
use crate::error::ParseError;
use crate::registry::TypeRegistry;
use crate::values::{ITEM_ELEMENT, KEY_ATTRIBUTE, element_to_value, value_to_element};
use crate::xml::Element;
use ironmodel_core::vocabulary::token_for;
use ironmodel_core::{
    Attribute, AttributeKind, AttributeSpec, Field, FieldBuilder, FieldType, Resolved, Term, Value,
    Vocabulary, VocabularySource, unescape_token,
};
use std::collections::BTreeMap;

/// Deferred attributes, in the order they are applied.
const DEFERRED: [&str; 4] = ["min", "max", "default", "missing_value"];

/// Attributes written even when equal to the field's missing value.
const FORCED: [&str; 2] = ["default", "missing_value"];

/// When an attribute is left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeFilter {
    /// Ignored when reading.
    SkipRead,
    /// Never written.
    SkipWrite,
    /// Neither read nor written.
    SkipAlways,
}

impl AttributeFilter {
    /// Returns true if the attribute is ignored when reading.
    #[must_use]
    pub const fn skips_read(self) -> bool {
        matches!(self, Self::SkipRead | Self::SkipAlways)
    }

    /// Returns true if the attribute is never written.
    #[must_use]
    pub const fn skips_write(self) -> bool {
        matches!(self, Self::SkipWrite | Self::SkipAlways)
    }
}

/// Attribute-driven codec for one field type.
#[derive(Debug, Clone)]
pub struct StandardCodec {
    field_type: FieldType,
    identifier: String,
    attributes: Vec<AttributeSpec>,
    filters: BTreeMap<&'static str, AttributeFilter>,
}

impl StandardCodec {
    /// Codec for the given standard type, specialized where needed.
    #[must_use]
    pub fn for_type(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Dict => Self::mapping(),
            FieldType::Object => Self::object(),
            FieldType::Choice => Self::choice(),
            other => Self::plain(other),
        }
    }

    /// Codec using only the declared attributes of `field_type`.
    #[must_use]
    pub fn plain(field_type: FieldType) -> Self {
        let mut codec = Self {
            field_type,
            identifier: field_type.identifier().to_string(),
            attributes: field_type.attributes(),
            filters: BTreeMap::new(),
        };
        codec.attributes.sort_by_key(|spec| spec.name);
        codec
            .with_filter("order", AttributeFilter::SkipAlways)
            .with_filter("unique", AttributeFilter::SkipAlways)
            .with_filter("defaultFactory", AttributeFilter::SkipWrite)
    }

    /// Codec for mappings: adds `key_type` and `value_type`.
    #[must_use]
    pub fn mapping() -> Self {
        Self::plain(FieldType::Dict)
            .with_attribute(AttributeSpec::new("key_type", AttributeKind::NestedField))
            .with_attribute(AttributeSpec::new("value_type", AttributeKind::NestedField))
    }

    /// Codec for object fields: adds `schema` and never writes values.
    #[must_use]
    pub fn object() -> Self {
        Self::plain(FieldType::Object)
            .with_attribute(AttributeSpec::new("schema", AttributeKind::SchemaRef))
            .with_filter("default", AttributeFilter::SkipWrite)
            .with_filter("missing_value", AttributeFilter::SkipWrite)
    }

    /// Codec for choice fields.
    ///
    /// Vocabularies are written by the codec itself rather than as plain
    /// attributes; `vocabularyName` is an alias of `vocabulary` and is
    /// never read or written.
    #[must_use]
    pub fn choice() -> Self {
        Self::plain(FieldType::Choice)
            .with_filter("vocabulary", AttributeFilter::SkipWrite)
            .with_filter("values", AttributeFilter::SkipWrite)
            .with_filter("source", AttributeFilter::SkipWrite)
            .with_filter("vocabularyName", AttributeFilter::SkipAlways)
    }

    /// Uses a custom type identifier.
    ///
    /// Fields read by the codec carry the identifier, so they are written
    /// back through the same registry entry.
    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, spec: AttributeSpec) -> Self {
        self.attributes.retain(|existing| existing.name != spec.name);
        self.attributes.push(spec);
        self.attributes.sort_by_key(|spec| spec.name);
        self
    }

    /// Sets the filter of an attribute.
    #[must_use]
    pub fn with_filter(mut self, name: &'static str, filter: AttributeFilter) -> Self {
        self.filters.insert(name, filter);
        self
    }

    /// Field type produced by this codec.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Type identifier of this codec.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Attributes handled by this codec, sorted by name.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    /// Filter of an attribute, if any.
    #[must_use]
    pub fn filter(&self, name: &str) -> Option<AttributeFilter> {
        self.filters.get(name).copied()
    }

    fn spec(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|spec| spec.name == name)
    }

    fn read_attribute(
        &self,
        spec: &AttributeSpec,
        element: &Element,
        builder: &mut FieldBuilder,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ParseError> {
        match spec.kind {
            AttributeKind::NestedField => {
                let type_name = element
                    .get("type")
                    .ok_or_else(|| ParseError::missing_attr(spec.name, "type"))?;
                let codec = ctx.registry().get(type_name).ok_or_else(|| {
                    ParseError::UnsupportedNestedType {
                        type_name: type_name.to_string(),
                        attribute: spec.name.to_string(),
                    }
                })?;
                let nested = codec.read(element, ctx)?;
                builder.set_nested(spec.name, Some(nested))?;
            }
            AttributeKind::SchemaRef => {
                let identifier = dotted_text(element);
                match ctx.resolve(identifier)? {
                    Resolved::Schema(_) => {
                        builder.set(spec.name, Some(Value::Dotted(identifier.to_string())))?;
                    }
                    other => return Err(missing_capability(identifier, "schema", &other)),
                }
            }
            AttributeKind::DefaultFactory => {
                let identifier = dotted_text(element);
                match ctx.resolve(identifier)? {
                    Resolved::DefaultFactory(factory) => builder.set_default_factory(factory),
                    other => return Err(missing_capability(identifier, "default factory", &other)),
                }
            }
            AttributeKind::Values => {
                let vocabulary = read_values(element, ctx)?;
                builder.set_vocabulary(VocabularySource::Inline(vocabulary))?;
            }
            AttributeKind::Source => {
                let identifier = dotted_text(element);
                let source = match ctx.resolve(identifier)? {
                    Resolved::Vocabulary(vocabulary) => VocabularySource::Inline(vocabulary),
                    Resolved::Source => VocabularySource::Source(identifier.to_string()),
                    other => {
                        return Err(missing_capability(identifier, "vocabulary source", &other));
                    }
                };
                builder.set_vocabulary(source)?;
            }
            kind => {
                let descriptor = descriptor_for(kind);
                let value = element_to_value(&descriptor, element, ctx, true)?;
                builder.set(spec.name, value)?;
            }
        }
        Ok(())
    }

    fn write_attribute(
        &self,
        spec: &AttributeSpec,
        field: &Field,
        registry: &TypeRegistry,
    ) -> Result<Option<Element>, ParseError> {
        match field.attribute(spec.name) {
            Some(Attribute::Field(Some(nested))) => {
                let type_name = nested.type_identifier();
                let codec =
                    registry
                        .get(type_name)
                        .ok_or_else(|| ParseError::UnsupportedNestedType {
                            type_name: type_name.to_string(),
                            attribute: spec.name.to_string(),
                        })?;
                codec.write(nested, None, spec.name, registry).map(Some)
            }
            Some(Attribute::Value(value)) if value != spec.default => {
                let force = FORCED.contains(&spec.name);
                let element = match spec.kind {
                    AttributeKind::OwnType | AttributeKind::OwnTypeUnvalidated => {
                        value_to_element(field, value.as_ref(), spec.name, force)?
                    }
                    kind => value_to_element(&descriptor_for(kind), value.as_ref(), spec.name, force)?,
                };
                Ok(Some(element))
            }
            _ => Ok(None),
        }
    }
}

impl FieldCodec for StandardCodec {
    fn read(&self, element: &Element, ctx: &mut ParseContext<'_>) -> Result<Field, ParseError> {
        let mut builder = FieldBuilder::new(self.field_type);
        if self.identifier != self.field_type.identifier() {
            builder.set_type_name(self.identifier.as_str());
        }
        builder.set_name(element.get("name").unwrap_or_default());

        let mut deferred: Vec<&Element> = Vec::new();
        for child in &element.children {
            if !child.is_model_element() {
                continue;
            }
            let name = child.local_name();
            if self.filter(name).is_some_and(AttributeFilter::skips_read) {
                continue;
            }
            let Some(spec) = self.spec(name) else {
                tracing::warn!(
                    "Ignoring unknown attribute element <{}> of {}",
                    name,
                    self.identifier
                );
                continue;
            };
            if matches!(
                spec.kind,
                AttributeKind::OwnType | AttributeKind::OwnTypeUnvalidated
            ) {
                deferred.push(child);
                continue;
            }
            ctx.enter(child);
            self.read_attribute(spec, child, &mut builder, ctx)?;
            ctx.leave();
        }

        for name in DEFERRED {
            let Some(child) = deferred.iter().find(|child| child.local_name() == name) else {
                continue;
            };
            let validate = self
                .spec(name)
                .is_some_and(|spec| spec.kind == AttributeKind::OwnType);
            ctx.enter(child);
            let value = element_to_value(builder.field(), child, ctx, validate)?;
            builder.set(name, value)?;
            ctx.leave();
        }

        let field = builder.finish()?;
        tracing::trace!(field = field.name(), type_name = %self.identifier, "field read");
        Ok(field)
    }

    fn write(
        &self,
        field: &Field,
        name: Option<&str>,
        element_name: &str,
        registry: &TypeRegistry,
    ) -> Result<Element, ParseError> {
        let mut element = Element::new(element_name);
        if let Some(name) = name {
            element.set("name", name);
        }
        element.set("type", field.type_identifier());

        for spec in &self.attributes {
            if self.filter(spec.name).is_some_and(AttributeFilter::skips_write) {
                continue;
            }
            if let Some(child) = self.write_attribute(spec, field, registry)? {
                element.push(child);
            }
        }
        if self.field_type == FieldType::Choice {
            element.push(write_vocabulary(field)?);
        }
        tracing::trace!(field = field.name(), type_name = %self.identifier, "field written");
        Ok(element)
    }
}

/// Field used to convert attributes that are not of the field's own type.
fn descriptor_for(kind: AttributeKind) -> Field {
    let field_type = match kind {
        AttributeKind::Text => FieldType::Text,
        AttributeKind::Bool => FieldType::Bool,
        AttributeKind::Int => FieldType::Int,
        AttributeKind::SchemaRef => FieldType::InterfaceField,
        AttributeKind::DefaultFactory | AttributeKind::Source => FieldType::DottedName,
        _ => FieldType::TextLine,
    };
    Field::descriptor(field_type)
}

fn dotted_text(element: &Element) -> &str {
    element.text.as_deref().unwrap_or_default().trim()
}

fn missing_capability(identifier: &str, expected: &'static str, actual: &Resolved) -> ParseError {
    ParseError::MissingCapability {
        identifier: identifier.to_string(),
        expected,
        actual: actual.kind(),
    }
}

/// Reads inline choice values.
///
/// When any item carries a `key`, every item is a `token -> title` entry;
/// otherwise items are plain values.
fn read_values(element: &Element, ctx: &mut ParseContext<'_>) -> Result<Vocabulary, ParseError> {
    let items: Vec<&Element> = element.model_children(ITEM_ELEMENT).collect();
    let keyed = items.iter().any(|item| item.get(KEY_ATTRIBUTE).is_some());
    let title_field = Field::descriptor(FieldType::Text);
    let mut terms = Vec::with_capacity(items.len());
    for item in items {
        ctx.enter(item);
        let term = if keyed {
            let key = item
                .get(KEY_ATTRIBUTE)
                .ok_or_else(|| ParseError::missing_attr(ITEM_ELEMENT, KEY_ATTRIBUTE))?;
            let value = unescape_token(key).unwrap_or_else(|| key.to_string());
            let title = element_to_value(&title_field, item, ctx, false)?;
            let term = Term::new(Value::text(value.as_str()));
            match title {
                Some(Value::Text(text)) if text == value => term,
                Some(title) => term.with_title(title),
                None => term,
            }
        } else {
            Term::new(Value::text(item.text.as_deref().unwrap_or_default()))
        };
        ctx.leave();
        terms.push(term);
    }
    Ok(Vocabulary::new(terms)?)
}

fn write_vocabulary(field: &Field) -> Result<Element, ParseError> {
    match &field.vocabulary {
        Some(VocabularySource::Named(name)) => value_to_element(
            &Field::descriptor(FieldType::TextLine),
            Some(&Value::text(name.as_str())),
            "vocabulary",
            true,
        ),
        Some(VocabularySource::Inline(vocabulary)) => write_values(field, vocabulary),
        Some(VocabularySource::Source(identifier)) => Err(ParseError::not_supported(format!(
            "choice field '{}' takes its terms from source '{identifier}', which cannot be exported",
            field.name()
        ))),
        None => Err(ParseError::not_supported(format!(
            "choice field '{}' has no vocabulary to export",
            field.name()
        ))),
    }
}

/// Writes an inline vocabulary as flat values, or as a keyed mapping when a
/// token differs from its value text or a term has its own title.
fn write_values(field: &Field, vocabulary: &Vocabulary) -> Result<Element, ParseError> {
    let mut texts = Vec::with_capacity(vocabulary.len());
    let mut keyed = false;
    for term in vocabulary {
        let text = match &term.value {
            Value::Text(text) => text.clone(),
            Value::Int(number) => number.to_string(),
            other => {
                return Err(ParseError::not_supported(format!(
                    "choice field '{}' has a {} term; only text and integer terms can be exported",
                    field.name(),
                    other.kind_name()
                )));
            }
        };
        if term.token != token_for(&term.value) {
            return Err(ParseError::not_supported(format!(
                "choice field '{}' has term token '{}' that does not derive from its value",
                field.name(),
                term.token
            )));
        }
        let titled = match &term.title {
            None => false,
            Some(Value::Text(title)) => *title != text,
            Some(_) => true,
        };
        keyed |= titled || term.token != text;
        texts.push(text);
    }

    let title_field = Field::descriptor(FieldType::Text);
    let mut element = Element::new("values");
    for (term, text) in vocabulary.iter().zip(texts) {
        let item = if keyed {
            let title = term.title.clone().unwrap_or_else(|| Value::text(text));
            let mut item = value_to_element(&title_field, Some(&title), ITEM_ELEMENT, true)?;
            item.set(KEY_ATTRIBUTE, term.token.as_str());
            item
        } else {
            Element::new(ITEM_ELEMENT).with_text(text)
        };
        element.push(item);
    }
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{parse_document, write_document};
    use ironmodel_core::{DefaultFactory, Message, Schema, SymbolTable};
    use std::sync::Arc;

    fn read_with(xml: &str, resolver: &SymbolTable) -> Result<Field, ParseError> {
        let registry = TypeRegistry::standard();
        let mut ctx = ParseContext::new(&registry, resolver);
        let element = parse_document(xml)?;
        let type_name = element.get("type").unwrap_or_default().to_string();
        let codec = registry.get(&type_name).expect("type should be registered");
        codec.read(&element, &mut ctx)
    }

    fn read(xml: &str) -> Field {
        read_with(xml, &SymbolTable::new()).expect("field should parse")
    }

    fn write(field: &Field) -> String {
        let registry = TypeRegistry::standard();
        let codec = registry.get(field.type_identifier()).expect("registered");
        let element = codec
            .write(field, Some(field.name()), "field", &registry)
            .expect("field should write");
        write_document(&element, true).expect("document should write")
    }

    #[test]
    fn test_filters() {
        assert!(AttributeFilter::SkipRead.skips_read());
        assert!(!AttributeFilter::SkipRead.skips_write());
        assert!(AttributeFilter::SkipWrite.skips_write());
        assert!(AttributeFilter::SkipAlways.skips_read());
        assert!(AttributeFilter::SkipAlways.skips_write());
    }

    #[test]
    fn test_read_text_line() {
        let field = read(
            r#"<field name="title" type="zope.schema.TextLine">
                 <title>Title</title>
                 <required>False</required>
                 <max_length>20</max_length>
                 <default>Hello</default>
               </field>"#,
        );
        assert_eq!(field.name(), "title");
        assert_eq!(field.field_type(), FieldType::TextLine);
        assert_eq!(field.title, Value::from("Title"));
        assert!(!field.required);
        assert_eq!(field.max_length, Some(20));
        assert_eq!(field.default, Some(Value::from("Hello")));
    }

    #[test]
    fn test_deferred_default_sees_bounds() {
        let xml = r#"<field name="age" type="zope.schema.Int">
                       <default>50</default>
                       <max>10</max>
                     </field>"#;
        let err = read_with(xml, &SymbolTable::new()).unwrap_err();
        assert!(matches!(err, ParseError::Validation { .. }));

        let field = read(
            r#"<field name="age" type="zope.schema.Int">
                 <default>5</default>
                 <min>1</min>
                 <max>10</max>
                 <missing_value>-1</missing_value>
               </field>"#,
        );
        assert_eq!(field.default, Some(Value::Int(5)));
        assert_eq!(field.min, Some(Value::Int(1)));
        assert_eq!(field.missing_value, Some(Value::Int(-1)));
    }

    #[test]
    fn test_order_and_unknown_elements_are_ignored() {
        let field = read(
            r#"<field name="n" type="zope.schema.Int">
                 <order>3</order>
                 <bogus>x</bogus>
               </field>"#,
        );
        assert_eq!(field.name(), "n");
        let codec = StandardCodec::for_type(FieldType::Int);
        assert_eq!(codec.filter("order"), Some(AttributeFilter::SkipAlways));
    }

    #[test]
    fn test_nested_value_type() {
        let field = read(
            r#"<field name="tags" type="zope.schema.List">
                 <value_type type="zope.schema.TextLine">
                   <max_length>5</max_length>
                 </value_type>
                 <default>
                   <element>a</element>
                 </default>
               </field>"#,
        );
        let value_type = field.value_type.as_deref().expect("value_type");
        assert_eq!(value_type.field_type(), FieldType::TextLine);
        assert_eq!(value_type.max_length, Some(5));
        assert_eq!(field.default, Some(Value::List(vec![Value::from("a")])));
    }

    #[test]
    fn test_nested_unknown_type() {
        let err = read_with(
            r#"<field name="x" type="zope.schema.List"><value_type type="nope.Type"/></field>"#,
            &SymbolTable::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedNestedType { .. }));
    }

    #[test]
    fn test_dict_round_trip() {
        let field = Field::new(FieldType::Dict)
            .with_name("scores")
            .with_key_type(Field::new(FieldType::TextLine))
            .with_value_type(Field::new(FieldType::Int))
            .with_default(Value::Dict(BTreeMap::from([(Value::from("a"), Value::Int(1))])));
        let xml = write(&field);
        let expected = concat!(
            "<field name=\"scores\" type=\"zope.schema.Dict\">\n",
            "  <default>\n",
            "    <element key=\"a\">1</element>\n",
            "  </default>\n",
            "  <key_type type=\"zope.schema.TextLine\"/>\n",
            "  <value_type type=\"zope.schema.Int\"/>\n",
            "</field>"
        );
        assert_eq!(xml, expected);
        let again = read(&xml);
        assert_eq!(again.default, field.default);
        assert_eq!(
            again.key_type.as_deref().map(Field::field_type),
            Some(FieldType::TextLine)
        );
    }

    #[test]
    fn test_write_skips_defaults_alphabetically() {
        let mut field = Field::new(FieldType::Int)
            .with_name("count")
            .with_title("Count")
            .with_required(false);
        field.min = Some(Value::Int(0));
        field.description = Value::from("How many");
        let xml = write(&field);
        let expected = concat!(
            "<field name=\"count\" type=\"zope.schema.Int\">\n",
            "  <description>How many</description>\n",
            "  <min>0</min>\n",
            "  <required>False</required>\n",
            "  <title>Count</title>\n",
            "</field>"
        );
        assert_eq!(xml, expected);
    }

    #[test]
    fn test_forced_missing_value() {
        let mut field = Field::new(FieldType::Int).with_name("n");
        field.missing_value = Some(Value::Int(0));
        field.default = Some(Value::Int(0));
        let xml = write(&field);
        assert!(xml.contains("<default>0</default>"));
        assert!(xml.contains("<missing_value>0</missing_value>"));
    }

    #[test]
    fn test_object_field() {
        let mut resolver = SymbolTable::new();
        resolver.register_schema(Arc::new(Schema::new("IAddress", "tests")));
        let field = read_with(
            r#"<field name="address" type="zope.schema.Object">
                 <schema>tests.IAddress</schema>
               </field>"#,
            &resolver,
        )
        .unwrap();
        assert_eq!(field.schema.as_deref(), Some("tests.IAddress"));

        let mut with_default = field.clone();
        with_default.default = Some(Value::Dotted("tests.something".to_string()));
        let xml = write(&with_default);
        assert!(xml.contains("<schema>tests.IAddress</schema>"));
        assert!(!xml.contains("<default>"));
    }

    #[test]
    fn test_object_schema_must_be_schema() {
        let mut resolver = SymbolTable::new();
        resolver.register("tests.thing", Resolved::Object);
        let err = read_with(
            r#"<field name="a" type="zope.schema.Object"><schema>tests.thing</schema></field>"#,
            &resolver,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::MissingCapability { .. }));
    }

    #[test]
    fn test_default_factory_is_resolved() {
        let mut resolver = SymbolTable::new();
        resolver.register_default_factory(DefaultFactory::new("tests.seven", || Value::Int(7)));
        resolver.register("tests.other", Resolved::Object);
        let field = read_with(
            r#"<field name="n" type="zope.schema.Int"><defaultFactory>tests.seven</defaultFactory></field>"#,
            &resolver,
        )
        .unwrap();
        assert_eq!(field.default_value(), Some(Value::Int(7)));
        assert!(!write(&field).contains("defaultFactory"));

        let err = read_with(
            r#"<field name="n" type="zope.schema.Int"><defaultFactory>tests.other</defaultFactory></field>"#,
            &resolver,
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::MissingCapability { .. }));
    }

    #[test]
    fn test_choice_flat_values() {
        let vocabulary = Vocabulary::from_values(["a", "b", "c"]).unwrap();
        let field = Field::new(FieldType::Choice)
            .with_name("letter")
            .with_vocabulary(VocabularySource::Inline(vocabulary.clone()));
        let xml = write(&field);
        let expected = concat!(
            "<field name=\"letter\" type=\"zope.schema.Choice\">\n",
            "  <values>\n",
            "    <element>a</element>\n",
            "    <element>b</element>\n",
            "    <element>c</element>\n",
            "  </values>\n",
            "</field>"
        );
        assert_eq!(xml, expected);
        assert_eq!(read(&xml).vocabulary, Some(VocabularySource::Inline(vocabulary)));
    }

    #[test]
    fn test_choice_titles_use_keys() {
        let vocabulary = Vocabulary::from_items([("a", "A"), ("b", "B"), ("c", "c")]).unwrap();
        let field = Field::new(FieldType::Choice)
            .with_name("letter")
            .with_vocabulary(VocabularySource::Inline(vocabulary));
        let xml = write(&field);
        assert!(xml.contains(concat!(
            "    <element key=\"a\">A</element>\n",
            "    <element key=\"b\">B</element>\n",
            "    <element key=\"c\">c</element>\n"
        )));

        let again = read(&xml);
        let terms = again.vocabulary.as_ref().and_then(VocabularySource::inline).unwrap();
        assert_eq!(terms.len(), 3);
        assert_eq!(terms.terms()[0].title, Some(Value::from("A")));
        assert_eq!(terms.terms()[2].title, None);
        assert_eq!(terms.terms()[2].value, Value::from("c"));
    }

    #[test]
    fn test_choice_non_ascii_values_use_keys() {
        let vocabulary = Vocabulary::from_values(["caf\u{e9}", "tea"]).unwrap();
        let field = Field::new(FieldType::Choice)
            .with_name("drink")
            .with_vocabulary(VocabularySource::Inline(vocabulary.clone()));
        let xml = write(&field);
        assert!(xml.contains("<element key=\"caf\\xe9\">caf\u{e9}</element>"));
        assert_eq!(read(&xml).vocabulary, Some(VocabularySource::Inline(vocabulary)));
    }

    #[test]
    fn test_choice_named_vocabulary() {
        let field = Field::new(FieldType::Choice)
            .with_name("color")
            .with_vocabulary(VocabularySource::Named("example.colors".to_string()));
        let xml = write(&field);
        assert!(xml.contains("<vocabulary>example.colors</vocabulary>"));
        assert_eq!(read(&xml).vocabulary, field.vocabulary);
    }

    #[test]
    fn test_choice_unsupported_vocabularies() {
        let source = Field::new(FieldType::Choice)
            .with_name("s")
            .with_vocabulary(VocabularySource::Source("example.source".to_string()));
        let registry = TypeRegistry::standard();
        let codec = registry.get("zope.schema.Choice").unwrap();
        assert!(matches!(
            codec.write(&source, Some("s"), "field", &registry),
            Err(ParseError::NotSupported { .. })
        ));

        let odd_token = Vocabulary::new(vec![Term::new(Value::from("a")).with_token("x")]).unwrap();
        let field = Field::new(FieldType::Choice)
            .with_name("t")
            .with_vocabulary(VocabularySource::Inline(odd_token));
        assert!(matches!(
            codec.write(&field, Some("t"), "field", &registry),
            Err(ParseError::NotSupported { .. })
        ));
    }

    #[test]
    fn test_choice_source_is_resolved() {
        let mut resolver = SymbolTable::new();
        resolver.register("tests.source", Resolved::Source);
        resolver.register(
            "tests.fixed",
            Resolved::Vocabulary(Vocabulary::from_values(["x"]).unwrap()),
        );
        let field = read_with(
            r#"<field name="s" type="zope.schema.Choice"><source>tests.source</source></field>"#,
            &resolver,
        )
        .unwrap();
        assert_eq!(
            field.vocabulary,
            Some(VocabularySource::Source("tests.source".to_string()))
        );
        let field = read_with(
            r#"<field name="s" type="zope.schema.Choice"><source>tests.fixed</source></field>"#,
            &resolver,
        )
        .unwrap();
        assert!(field.vocabulary.as_ref().and_then(VocabularySource::inline).is_some());
    }

    #[test]
    fn test_choice_conflicting_vocabularies() {
        let err = read_with(
            r#"<field name="c" type="zope.schema.Choice">
                 <vocabulary>example.colors</vocabulary>
                 <values><element>a</element></values>
               </field>"#,
            &SymbolTable::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Model(_)));
    }

    #[test]
    fn test_choice_without_vocabulary() {
        let err = read_with(
            r#"<field name="c" type="zope.schema.Choice"/>"#,
            &SymbolTable::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Model(_)));
    }

    #[test]
    fn test_message_title_round_trip() {
        let title = Message::new("label_title", Some("demo".to_string())).with_default("Title");
        let field = Field::new(FieldType::TextLine)
            .with_name("t")
            .with_title(Value::Message(title));
        let registry = TypeRegistry::standard();
        let codec = registry.get("zope.schema.TextLine").unwrap();
        let element = codec.write(&field, Some("t"), "field", &registry).unwrap();
        let title = element.children_tagged("title").next().expect("title element");
        assert_eq!(title.text.as_deref(), Some("Title"));
        assert_eq!(
            title.get(&crate::xml::ns("translate", crate::xml::I18N_NAMESPACE)),
            Some("label_title")
        );
    }

    #[test]
    fn test_custom_identifier_round_trip() {
        let mut registry = TypeRegistry::standard();
        registry.register(
            "example.Rating",
            StandardCodec::for_type(FieldType::Int).with_identifier("example.Rating"),
        );
        let resolver = SymbolTable::new();
        let mut ctx = ParseContext::new(&registry, &resolver);
        let element =
            parse_document(r#"<field name="r" type="example.Rating"><max>5</max></field>"#).unwrap();
        let codec = registry.get("example.Rating").unwrap();
        let field = codec.read(&element, &mut ctx).unwrap();
        assert_eq!(field.type_identifier(), "example.Rating");
        let written = codec.write(&field, Some("r"), "field", &registry).unwrap();
        assert_eq!(written.get("type"), Some("example.Rating"));
    }
}
