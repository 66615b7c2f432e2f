//! Value codec.
//!
//! Field values embedded in a document (defaults, bounds, titles) are
//! encoded as element text for scalars, as `<element>` children for
//! sequences and sets, and as `<element key="...">` children for mappings.
//! Nesting follows the field's `value_type`/`key_type` recursively.

use crate::codec::ParseContext;
use crate::converters::{from_text, to_text};
use crate::error::ParseError;
use crate::xml::{Element, I18N_NAMESPACE, ns};
use ironmodel_core::{Field, FieldType, Message, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

/// Tag of sequence items and mapping entries.
pub const ITEM_ELEMENT: &str = "element";

/// Attribute carrying mapping keys.
pub const KEY_ATTRIBUTE: &str = "key";

static TEXT_LINE: LazyLock<Field> = LazyLock::new(|| Field::descriptor(FieldType::TextLine));

/// Item field of a collection or mapping, text lines when undeclared.
pub(crate) fn item_field(field: Option<&Field>) -> &Field {
    field.unwrap_or(&TEXT_LINE)
}

/// Reads the value held by `element` for `field`.
///
/// Returns `None` when the element carries no value and the field has no
/// missing value. Text values pick up an i18n message when the document
/// declares a translation domain and the element is marked for
/// translation.
///
/// # Errors
/// Returns an error for unconvertible text, unresolved references, mapping
/// entries without a key and, with `validate`, values the field rejects.
pub fn element_to_value(
    field: &Field,
    element: &Element,
    ctx: &ParseContext<'_>,
    validate: bool,
) -> Result<Option<Value>, ParseError> {
    let field_type = field.field_type();
    if field_type != FieldType::Dict && !field_type.is_collection() {
        return read_scalar(field, element, ctx, validate);
    }
    let value = if field_type == FieldType::Dict {
        read_mapping(field, element, ctx, validate)?
    } else {
        read_collection(field, element, ctx, validate)?
    };
    if validate {
        field
            .validate(&value)
            .map_err(|source| ParseError::Validation {
                field: field.name().to_string(),
                source,
            })?;
    }
    Ok(Some(value))
}

fn read_mapping(
    field: &Field,
    element: &Element,
    ctx: &ParseContext<'_>,
    validate: bool,
) -> Result<Value, ParseError> {
    let key_type = item_field(field.key_type.as_deref());
    let value_type = item_field(field.value_type.as_deref());
    let mut items = BTreeMap::new();
    for child in element.model_children(ITEM_ELEMENT) {
        let key_text = child
            .get(KEY_ATTRIBUTE)
            .ok_or_else(|| ParseError::missing_attr(ITEM_ELEMENT, KEY_ATTRIBUTE))?;
        let key = from_text(key_type, key_text, ctx.resolver(), validate)?;
        let value = required_item(value_type, child, ctx, validate)?;
        items.insert(key, value);
    }
    Ok(Value::Dict(items))
}

fn read_collection(
    field: &Field,
    element: &Element,
    ctx: &ParseContext<'_>,
    validate: bool,
) -> Result<Value, ParseError> {
    let value_type = item_field(field.value_type.as_deref());
    let items = element
        .model_children(ITEM_ELEMENT)
        .map(|child| required_item(value_type, child, ctx, validate))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(match field.field_type() {
        FieldType::Tuple => Value::Tuple(items),
        FieldType::Set | FieldType::FrozenSet => Value::Set(items.into_iter().collect::<BTreeSet<_>>()),
        _ => Value::List(items),
    })
}

fn required_item(
    field: &Field,
    element: &Element,
    ctx: &ParseContext<'_>,
    validate: bool,
) -> Result<Value, ParseError> {
    element_to_value(field, element, ctx, validate)?.ok_or_else(|| {
        ParseError::invalid_value(field.type_identifier(), "", "item element holds no value")
    })
}

fn read_scalar(
    field: &Field,
    element: &Element,
    ctx: &ParseContext<'_>,
    validate: bool,
) -> Result<Option<Value>, ParseError> {
    let text = match element.text.as_deref() {
        Some(text) if !text.is_empty() || field.field_type().is_textual() => text,
        _ => return Ok(field.missing_value.clone()),
    };
    let value = from_text(field, text, ctx.resolver(), validate)?;
    Ok(Some(translatable(value, element, ctx)))
}

/// Turns text into an i18n message when the element asks for translation.
fn translatable(value: Value, element: &Element, ctx: &ParseContext<'_>) -> Value {
    let (Value::Text(text), Some(default_domain)) = (&value, ctx.i18n_domain()) else {
        return value;
    };
    let Some(msgid) = element.get(&ns("translate", I18N_NAMESPACE)) else {
        return value;
    };
    let domain = element
        .get(&ns("domain", I18N_NAMESPACE))
        .unwrap_or(default_domain)
        .to_string();
    let message = if msgid.is_empty() {
        Message::new(text.clone(), Some(domain))
    } else {
        Message::new(msgid, Some(domain)).with_default(text.clone())
    };
    Value::Message(message)
}

/// Writes `value` for `field` into an element named `name`.
///
/// Nothing is written inside the element when the value is absent, or
/// equals the field's missing value and `force` is not set.
///
/// # Errors
/// Returns `ParseError::NotSupported` for values without a text form.
pub fn value_to_element(
    field: &Field,
    value: Option<&Value>,
    name: &str,
    force: bool,
) -> Result<Element, ParseError> {
    let mut element = Element::new(name);
    let Some(value) = value else {
        return Ok(element);
    };
    if !force && field.missing_value.as_ref() == Some(value) {
        return Ok(element);
    }
    match value {
        Value::Dict(items) => {
            let key_type = item_field(field.key_type.as_deref());
            let value_type = item_field(field.value_type.as_deref());
            for (key, item) in items {
                let mut child = value_to_element(value_type, Some(item), ITEM_ELEMENT, force)?;
                child.set(KEY_ATTRIBUTE, to_text(key_type, key)?);
                element.push(child);
            }
        }
        Value::List(items) | Value::Tuple(items) => {
            let value_type = item_field(field.value_type.as_deref());
            for item in items {
                element.push(value_to_element(value_type, Some(item), ITEM_ELEMENT, force)?);
            }
        }
        Value::Set(items) => {
            let value_type = item_field(field.value_type.as_deref());
            for item in items {
                element.push(value_to_element(value_type, Some(item), ITEM_ELEMENT, force)?);
            }
        }
        Value::Message(message) => {
            if let Some(domain) = &message.domain {
                element.set(ns("domain", I18N_NAMESPACE), domain.clone());
            }
            match message.default.as_deref().filter(|d| !d.is_empty()) {
                Some(default) => {
                    element.set(ns("translate", I18N_NAMESPACE), message.id.clone());
                    element.text = Some(default.to_string());
                }
                None => {
                    element.set(ns("translate", I18N_NAMESPACE), "");
                    element.text = Some(message.id.clone());
                }
            }
        }
        scalar => element.text = Some(to_text(field, scalar)?),
    }
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistry;
    use crate::xml::{parse_document, write_document};
    use ironmodel_core::SymbolTable;

    fn encode(field: &Field, value: &Value) -> String {
        let element = value_to_element(field, Some(value), "value", false).unwrap();
        write_document(&element, false).unwrap()
    }

    fn decode(field: &Field, xml: &str) -> Option<Value> {
        let registry = TypeRegistry::new();
        let resolver = SymbolTable::new();
        let ctx = ParseContext::new(&registry, &resolver);
        let element = parse_document(xml).unwrap();
        element_to_value(field, &element, &ctx, true).unwrap()
    }

    fn int_list() -> Field {
        Field::descriptor(FieldType::List).with_value_type(Field::descriptor(FieldType::Int))
    }

    #[test]
    fn test_int_list() {
        let field = int_list();
        let empty = Value::List(vec![]);
        assert_eq!(encode(&field, &empty), "<value/>");
        assert_eq!(decode(&field, "<value/>"), Some(empty));

        let items = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let xml = encode(&field, &items);
        assert_eq!(xml, "<value><element>1</element><element>2</element></value>");
        assert_eq!(decode(&field, &xml), Some(items));
    }

    #[test]
    fn test_nested_lists() {
        let field = Field::descriptor(FieldType::List).with_value_type(int_list());
        let value = Value::List(vec![
            Value::List(vec![Value::Int(1)]),
            Value::List(vec![]),
            Value::List(vec![Value::Int(2), Value::Int(3)]),
        ]);
        let xml = encode(&field, &value);
        assert_eq!(
            xml,
            concat!(
                "<value><element><element>1</element></element><element/>",
                "<element><element>2</element><element>3</element></element></value>"
            )
        );
        assert_eq!(decode(&field, &xml), Some(value));
    }

    #[test]
    fn test_dict_sorted_keys() {
        let field = Field::descriptor(FieldType::Dict)
            .with_key_type(Field::descriptor(FieldType::Int))
            .with_value_type(Field::descriptor(FieldType::TextLine));
        let value = Value::Dict(BTreeMap::from([
            (Value::Int(2), Value::from("two")),
            (Value::Int(1), Value::from("one")),
        ]));
        let xml = encode(&field, &value);
        assert_eq!(
            xml,
            "<value><element key=\"1\">one</element><element key=\"2\">two</element></value>"
        );
        assert_eq!(decode(&field, &xml), Some(value));
    }

    #[test]
    fn test_dict_of_lists() {
        let field = Field::descriptor(FieldType::Dict)
            .with_key_type(Field::descriptor(FieldType::TextLine))
            .with_value_type(int_list());
        let value = Value::Dict(BTreeMap::from([(
            Value::from("a"),
            Value::List(vec![Value::Int(1), Value::Int(2)]),
        )]));
        let xml = encode(&field, &value);
        assert_eq!(
            xml,
            "<value><element key=\"a\"><element>1</element><element>2</element></element></value>"
        );
        assert_eq!(decode(&field, &xml), Some(value));
    }

    #[test]
    fn test_set_is_written_sorted() {
        let field =
            Field::descriptor(FieldType::Set).with_value_type(Field::descriptor(FieldType::TextLine));
        let value = Value::Set(BTreeSet::from([Value::from("b"), Value::from("a")]));
        let xml = encode(&field, &value);
        assert_eq!(xml, "<value><element>a</element><element>b</element></value>");
        assert_eq!(decode(&field, &xml), Some(value));
    }

    #[test]
    fn test_missing_key_fails() {
        let field = Field::descriptor(FieldType::Dict);
        let registry = TypeRegistry::new();
        let resolver = SymbolTable::new();
        let ctx = ParseContext::new(&registry, &resolver);
        let element = parse_document("<value><element>x</element></value>").unwrap();
        assert!(matches!(
            element_to_value(&field, &element, &ctx, true),
            Err(ParseError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_missing_text_gives_missing_value() {
        let mut field = Field::descriptor(FieldType::Int);
        assert_eq!(decode(&field, "<value/>"), None);
        field.missing_value = Some(Value::Int(-1));
        assert_eq!(decode(&field, "<value/>"), Some(Value::Int(-1)));
        assert_eq!(decode(&field, "<value></value>"), Some(Value::Int(-1)));
    }

    #[test]
    fn test_empty_text_line() {
        let field = Field::descriptor(FieldType::TextLine);
        let xml = encode(&field, &Value::from(""));
        assert_eq!(xml, "<value></value>");
        assert_eq!(decode(&field, &xml), Some(Value::from("")));
    }

    #[test]
    fn test_missing_value_is_suppressed() {
        let mut field = Field::descriptor(FieldType::Int);
        field.missing_value = Some(Value::Int(0));
        assert_eq!(encode(&field, &Value::Int(0)), "<value/>");
        let forced = value_to_element(&field, Some(&Value::Int(0)), "value", true).unwrap();
        assert_eq!(forced.text.as_deref(), Some("0"));
    }

    #[test]
    fn test_message_written_with_i18n_attributes() {
        let field = Field::descriptor(FieldType::TextLine);
        let message = Message::new("title_id", Some("demo".to_string())).with_default("Title");
        let element = value_to_element(&field, Some(&Value::Message(message)), "title", false).unwrap();
        assert_eq!(element.text.as_deref(), Some("Title"));
        assert_eq!(element.get(&ns("translate", I18N_NAMESPACE)), Some("title_id"));
        assert_eq!(element.get(&ns("domain", I18N_NAMESPACE)), Some("demo"));

        let plain = Message::new("Title", Some("demo".to_string()));
        let element = value_to_element(&field, Some(&Value::Message(plain)), "title", false).unwrap();
        assert_eq!(element.text.as_deref(), Some("Title"));
        assert_eq!(element.get(&ns("translate", I18N_NAMESPACE)), Some(""));
    }

    #[test]
    fn test_message_read_needs_domain() {
        let field = Field::descriptor(FieldType::TextLine);
        let registry = TypeRegistry::new();
        let resolver = SymbolTable::new();
        let xml = r#"<title xmlns:i18n="http://xml.zope.org/namespaces/i18n" i18n:translate="title_id">Title</title>"#;
        let element = parse_document(xml).unwrap();

        let mut ctx = ParseContext::new(&registry, &resolver);
        assert_eq!(
            element_to_value(&field, &element, &ctx, true).unwrap(),
            Some(Value::from("Title"))
        );

        ctx.set_i18n_domain(Some("demo".to_string()));
        let expected = Message::new("title_id", Some("demo".to_string())).with_default("Title");
        assert_eq!(
            element_to_value(&field, &element, &ctx, true).unwrap(),
            Some(Value::Message(expected))
        );
    }

    #[test]
    fn test_validation_of_items() {
        let registry = TypeRegistry::new();
        let resolver = SymbolTable::new();
        let ctx = ParseContext::new(&registry, &resolver);
        let element = parse_document("<value><element>x</element></value>").unwrap();
        assert!(element_to_value(&int_list(), &element, &ctx, true).is_err());
    }
}
