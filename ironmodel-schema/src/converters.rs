//! Text conversion for scalar field values.

use crate::error::ParseError;
use chrono::{NaiveDate, NaiveDateTime};
use ironmodel_core::value::{DATE_FORMAT, DATETIME_FORMAT};
use ironmodel_core::{Field, FieldType, Resolved, Resolver, Value, VocabularySource};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Converts element text into a value of the field's type.
///
/// References (interface and object fields) are resolved through
/// `resolver`. With `validate`, the result is checked against the field.
///
/// # Errors
/// Returns `ParseError::InvalidValue` for unparsable text,
/// `ParseError::Unresolved`/`MissingCapability` for bad references and
/// `ParseError::Validation` when validation fails.
pub fn from_text(
    field: &Field,
    text: &str,
    resolver: &dyn Resolver,
    validate: bool,
) -> Result<Value, ParseError> {
    let value = convert(field, text, resolver)?;
    if validate {
        field
            .validate(&value)
            .map_err(|source| ParseError::Validation {
                field: field.name().to_string(),
                source,
            })?;
    }
    Ok(value)
}

fn convert(field: &Field, text: &str, resolver: &dyn Resolver) -> Result<Value, ParseError> {
    use FieldType as T;
    let invalid = |reason: &dyn ToString| {
        ParseError::invalid_value(field.type_identifier(), text, reason.to_string())
    };
    let value = match field.field_type() {
        t if t.is_textual() => Value::text(text),
        T::Bytes | T::BytesLine => Value::Bytes(text.as_bytes().to_vec()),
        T::Bool => Value::Bool(matches!(text, "True" | "true" | "on")),
        T::Int => Value::Int(text.trim().parse().map_err(|e| invalid(&e))?),
        T::Float => Value::Float(text.trim().parse().map_err(|e| invalid(&e))?),
        T::Decimal => Value::Decimal(Decimal::from_str(text.trim()).map_err(|e| invalid(&e))?),
        T::Date => Value::Date(
            NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|e| invalid(&e))?,
        ),
        T::Datetime => Value::Datetime(
            NaiveDateTime::parse_from_str(text.trim(), &format!("{DATETIME_FORMAT}%.f"))
                .map_err(|e| invalid(&e))?,
        ),
        T::InterfaceField => {
            let identifier = text.trim();
            match resolver.resolve(identifier) {
                Some(Resolved::Schema(_)) => Value::Dotted(identifier.to_string()),
                Some(other) => {
                    return Err(ParseError::MissingCapability {
                        identifier: identifier.to_string(),
                        expected: "schema",
                        actual: other.kind(),
                    });
                }
                None => {
                    return Err(ParseError::Unresolved {
                        identifier: identifier.to_string(),
                    });
                }
            }
        }
        T::Object => {
            let identifier = text.trim();
            if resolver.resolve(identifier).is_none() {
                return Err(ParseError::Unresolved {
                    identifier: identifier.to_string(),
                });
            }
            Value::Dotted(identifier.to_string())
        }
        T::Choice => choice_value(field, text).map_err(|e| invalid(&e))?,
        _ => return Err(invalid(&"no text form for container values")),
    };
    Ok(value)
}

/// Converts choice text, casting to the type of the inline terms.
fn choice_value(field: &Field, text: &str) -> Result<Value, std::num::ParseIntError> {
    let integral = matches!(
        &field.vocabulary,
        Some(VocabularySource::Inline(vocabulary))
            if matches!(vocabulary.terms().first(), Some(term) if matches!(term.value, Value::Int(_)))
    );
    if integral {
        Ok(Value::Int(text.trim().parse()?))
    } else {
        Ok(Value::text(text))
    }
}

/// Converts a scalar value into element text.
///
/// # Errors
/// Returns `ParseError::NotSupported` for object references, container
/// values and bytes that are not valid UTF-8.
pub fn to_text(field: &Field, value: &Value) -> Result<String, ParseError> {
    if field.field_type() == FieldType::Object {
        return Err(ParseError::not_supported(format!(
            "values of object field '{}' cannot be written as text",
            field.name()
        )));
    }
    if let Value::Bytes(bytes) = value {
        return String::from_utf8(bytes.clone()).map_err(|e| {
            ParseError::not_supported(format!(
                "bytes of '{}' are not valid UTF-8: {}",
                field.name(),
                e.utf8_error()
            ))
        });
    }
    value.to_text().ok_or_else(|| {
        ParseError::not_supported(format!(
            "{} value cannot be written as text for {}",
            value.kind_name(),
            field.type_identifier()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironmodel_core::{Schema, SymbolTable, Vocabulary};
    use std::sync::Arc;

    fn convert_text(field_type: FieldType, text: &str) -> Result<Value, ParseError> {
        from_text(&Field::descriptor(field_type), text, &SymbolTable::new(), true)
    }

    #[test]
    fn test_scalars() {
        assert_eq!(convert_text(FieldType::Int, " 42 ").unwrap(), Value::Int(42));
        assert_eq!(convert_text(FieldType::Float, "1.5").unwrap(), Value::Float(1.5));
        assert_eq!(
            convert_text(FieldType::Decimal, "1.10").unwrap(),
            Value::Decimal(Decimal::new(110, 2))
        );
        assert_eq!(convert_text(FieldType::TextLine, "abc").unwrap(), Value::from("abc"));
        assert_eq!(
            convert_text(FieldType::Bytes, "abc").unwrap(),
            Value::Bytes(b"abc".to_vec())
        );
        assert!(matches!(
            convert_text(FieldType::Int, "x"),
            Err(ParseError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_bool_text() {
        for text in ["True", "true", "on"] {
            assert_eq!(convert_text(FieldType::Bool, text).unwrap(), Value::Bool(true));
        }
        for text in ["False", "no", "1"] {
            assert_eq!(convert_text(FieldType::Bool, text).unwrap(), Value::Bool(false));
        }
    }

    #[test]
    fn test_dates() {
        let date = NaiveDate::from_ymd_opt(2023, 5, 17).unwrap();
        assert_eq!(convert_text(FieldType::Date, "2023-05-17").unwrap(), Value::Date(date));
        let datetime = date.and_hms_opt(8, 30, 0).unwrap();
        assert_eq!(
            convert_text(FieldType::Datetime, "2023-05-17 08:30:00").unwrap(),
            Value::Datetime(datetime)
        );
        assert!(convert_text(FieldType::Date, "17/05/2023").is_err());
        assert!(convert_text(FieldType::Datetime, "2023-05-17 08:30").is_err());
    }

    #[test]
    fn test_datetime_keeps_microseconds() {
        let field = Field::descriptor(FieldType::Datetime);
        let precise = NaiveDate::from_ymd_opt(2023, 5, 17)
            .unwrap()
            .and_hms_micro_opt(8, 30, 0, 123_456)
            .unwrap();
        let value = Value::Datetime(precise);

        let text = to_text(&field, &value).unwrap();
        assert_eq!(text, "2023-05-17 08:30:00.123456");
        assert_eq!(convert_text(FieldType::Datetime, &text).unwrap(), value);
    }

    #[test]
    fn test_bytes_must_be_utf8() {
        let field = Field::descriptor(FieldType::Bytes);
        assert_eq!(
            to_text(&field, &Value::Bytes("héllo".as_bytes().to_vec())).unwrap(),
            "héllo"
        );
        assert!(matches!(
            to_text(&field, &Value::Bytes(vec![0x66, 0xff, 0x6f])),
            Err(ParseError::NotSupported { .. })
        ));
    }

    #[test]
    fn test_validation_applies() {
        let mut field = Field::descriptor(FieldType::Int);
        field.max = Some(Value::Int(3));
        let resolver = SymbolTable::new();
        assert!(matches!(
            from_text(&field, "4", &resolver, true),
            Err(ParseError::Validation { .. })
        ));
        assert_eq!(from_text(&field, "4", &resolver, false).unwrap(), Value::Int(4));
    }

    #[test]
    fn test_interface_references() {
        let mut resolver = SymbolTable::new();
        resolver.register_schema(Arc::new(Schema::new("IBase", "tests")));
        resolver.register("tests.thing", Resolved::Object);
        let field = Field::descriptor(FieldType::InterfaceField);

        assert_eq!(
            from_text(&field, "tests.IBase", &resolver, true).unwrap(),
            Value::Dotted("tests.IBase".to_string())
        );
        assert!(matches!(
            from_text(&field, "tests.thing", &resolver, true),
            Err(ParseError::MissingCapability { .. })
        ));
        assert!(matches!(
            from_text(&field, "tests.nothing", &resolver, true),
            Err(ParseError::Unresolved { .. })
        ));
    }

    #[test]
    fn test_choice_casts_to_term_type() {
        let ints = Field::descriptor(FieldType::Choice).with_vocabulary(VocabularySource::Inline(
            Vocabulary::from_values([1i64, 2]).unwrap(),
        ));
        assert_eq!(from_text(&ints, "2", &SymbolTable::new(), true).unwrap(), Value::Int(2));

        let named = Field::descriptor(FieldType::Choice)
            .with_vocabulary(VocabularySource::Named("colors".to_string()));
        assert_eq!(
            from_text(&named, "red", &SymbolTable::new(), true).unwrap(),
            Value::from("red")
        );
    }

    #[test]
    fn test_to_text() {
        let field = Field::descriptor(FieldType::Int);
        assert_eq!(to_text(&field, &Value::Int(5)).unwrap(), "5");
        assert!(matches!(
            to_text(&field, &Value::List(vec![])),
            Err(ParseError::NotSupported { .. })
        ));
        let object = Field::descriptor(FieldType::Object);
        assert!(to_text(&object, &Value::Dotted("x".to_string())).is_err());
    }
}
