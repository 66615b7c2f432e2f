//! Field definitions.
//!
//! A [`Field`] describes one named, typed slot of a schema. The field type
//! decides which attributes exist (see [`FieldType::attributes`]) and how
//! values are validated. Construction goes through [`FieldBuilder`], which
//! accepts attributes without validation; the finished [`Field`] validates
//! attribute writes that carry values of its own type.

use crate::error::{Error, Result, ValidationError};
use crate::value::Value;
use crate::vocabulary::VocabularySource;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static CREATION_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_order() -> u64 {
    CREATION_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// The standard field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    /// Raw bytes.
    Bytes,
    /// ASCII text.
    Ascii,
    /// Single line of bytes.
    BytesLine,
    /// Single line of ASCII text.
    AsciiLine,
    /// Multi-line text.
    Text,
    /// Single line of text.
    TextLine,
    /// Boolean.
    Bool,
    /// Integer.
    Int,
    /// Float.
    Float,
    /// Exact decimal.
    Decimal,
    /// Immutable sequence.
    Tuple,
    /// Mutable sequence.
    List,
    /// Set of distinct items.
    Set,
    /// Immutable set of distinct items.
    FrozenSet,
    /// Single line of secret text.
    Password,
    /// Mapping.
    Dict,
    /// Date and time.
    Datetime,
    /// Date.
    Date,
    /// Source code text.
    SourceText,
    /// URI.
    Uri,
    /// URI or dotted name.
    Id,
    /// Dotted name.
    DottedName,
    /// Reference to a schema.
    InterfaceField,
    /// Object providing a schema.
    Object,
    /// Value taken from a vocabulary.
    Choice,
}

impl FieldType {
    /// All standard field types.
    pub const ALL: [FieldType; 25] = [
        Self::Bytes,
        Self::Ascii,
        Self::BytesLine,
        Self::AsciiLine,
        Self::Text,
        Self::TextLine,
        Self::Bool,
        Self::Int,
        Self::Float,
        Self::Decimal,
        Self::Tuple,
        Self::List,
        Self::Set,
        Self::FrozenSet,
        Self::Password,
        Self::Dict,
        Self::Datetime,
        Self::Date,
        Self::SourceText,
        Self::Uri,
        Self::Id,
        Self::DottedName,
        Self::InterfaceField,
        Self::Object,
        Self::Choice,
    ];

    /// Returns the wire identifier used in the `type` attribute.
    #[must_use]
    pub const fn identifier(self) -> &'static str {
        match self {
            Self::Bytes => "zope.schema.Bytes",
            Self::Ascii => "zope.schema.ASCII",
            Self::BytesLine => "zope.schema.BytesLine",
            Self::AsciiLine => "zope.schema.ASCIILine",
            Self::Text => "zope.schema.Text",
            Self::TextLine => "zope.schema.TextLine",
            Self::Bool => "zope.schema.Bool",
            Self::Int => "zope.schema.Int",
            Self::Float => "zope.schema.Float",
            Self::Decimal => "zope.schema.Decimal",
            Self::Tuple => "zope.schema.Tuple",
            Self::List => "zope.schema.List",
            Self::Set => "zope.schema.Set",
            Self::FrozenSet => "zope.schema.FrozenSet",
            Self::Password => "zope.schema.Password",
            Self::Dict => "zope.schema.Dict",
            Self::Datetime => "zope.schema.Datetime",
            Self::Date => "zope.schema.Date",
            Self::SourceText => "zope.schema.SourceText",
            Self::Uri => "zope.schema.URI",
            Self::Id => "zope.schema.Id",
            Self::DottedName => "zope.schema.DottedName",
            Self::InterfaceField => "zope.schema.InterfaceField",
            Self::Object => "zope.schema.Object",
            Self::Choice => "zope.schema.Choice",
        }
    }

    /// Looks a field type up by wire identifier.
    #[must_use]
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.identifier() == identifier)
    }

    /// Sequence and set types.
    #[must_use]
    pub const fn is_collection(self) -> bool {
        matches!(self, Self::Tuple | Self::List | Self::Set | Self::FrozenSet)
    }

    /// Types with `min`/`max` bounds.
    #[must_use]
    pub const fn is_orderable(self) -> bool {
        matches!(
            self,
            Self::Int | Self::Float | Self::Decimal | Self::Date | Self::Datetime
        )
    }

    /// Types with `min_length`/`max_length` bounds.
    #[must_use]
    pub const fn is_sized(self) -> bool {
        matches!(
            self,
            Self::Bytes
                | Self::Ascii
                | Self::BytesLine
                | Self::AsciiLine
                | Self::Text
                | Self::TextLine
                | Self::Password
                | Self::SourceText
                | Self::Uri
                | Self::Id
                | Self::DottedName
                | Self::Tuple
                | Self::List
                | Self::Set
                | Self::FrozenSet
                | Self::Dict
        )
    }

    /// Types holding text values.
    #[must_use]
    pub const fn is_textual(self) -> bool {
        matches!(
            self,
            Self::Ascii
                | Self::AsciiLine
                | Self::Text
                | Self::TextLine
                | Self::Password
                | Self::SourceText
                | Self::Uri
                | Self::Id
                | Self::DottedName
        )
    }

    /// Types rejecting line breaks.
    #[must_use]
    pub const fn is_line(self) -> bool {
        matches!(
            self,
            Self::BytesLine
                | Self::AsciiLine
                | Self::TextLine
                | Self::Password
                | Self::Uri
                | Self::Id
                | Self::DottedName
        )
    }

    /// Returns the declared attributes of this type.
    ///
    /// Nested-field attributes of mappings (`key_type`, `value_type`) and the
    /// `schema` reference of object fields are not declared here; codecs add
    /// them on top.
    #[must_use]
    pub fn attributes(self) -> Vec<AttributeSpec> {
        use AttributeKind as K;
        let mut specs = vec![
            AttributeSpec::new("title", K::TextLine).with_default(Value::text("")),
            AttributeSpec::new("description", K::Text).with_default(Value::text("")),
            AttributeSpec::new("required", K::Bool).with_default(Value::Bool(true)),
            AttributeSpec::new("readonly", K::Bool).with_default(Value::Bool(false)),
            AttributeSpec::new("default", K::OwnType),
            AttributeSpec::new("missing_value", K::OwnTypeUnvalidated),
            AttributeSpec::new("order", K::Int),
            AttributeSpec::new("defaultFactory", K::DefaultFactory),
        ];
        if self.is_sized() {
            specs.push(AttributeSpec::new("min_length", K::Int).with_default(Value::Int(0)));
            specs.push(AttributeSpec::new("max_length", K::Int));
        }
        if self.is_orderable() {
            specs.push(AttributeSpec::new("min", K::OwnType));
            specs.push(AttributeSpec::new("max", K::OwnType));
        }
        if self.is_collection() {
            specs.push(AttributeSpec::new("value_type", K::NestedField));
            specs.push(AttributeSpec::new("unique", K::Bool).with_default(Value::Bool(false)));
        }
        match self {
            Self::DottedName => {
                specs.push(AttributeSpec::new("min_dots", K::Int).with_default(Value::Int(0)));
                specs.push(AttributeSpec::new("max_dots", K::Int));
            }
            Self::Object => {
                specs.push(
                    AttributeSpec::new("validate_invariants", K::Bool)
                        .with_default(Value::Bool(true)),
                );
            }
            Self::Choice => {
                specs.push(AttributeSpec::new("vocabulary", K::TextLine));
                specs.push(AttributeSpec::new("vocabularyName", K::TextLine));
                specs.push(AttributeSpec::new("values", K::Values));
                specs.push(AttributeSpec::new("source", K::Source));
            }
            _ => {}
        }
        specs
    }

    fn value_kind(self) -> &'static str {
        match self {
            Self::Bytes | Self::BytesLine => "bytes",
            Self::Ascii | Self::AsciiLine => "ASCII text",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Tuple => "tuple",
            Self::List => "list",
            Self::Set | Self::FrozenSet => "set",
            Self::Dict => "dict",
            Self::Datetime => "datetime",
            Self::Date => "date",
            Self::InterfaceField | Self::Object => "dotted name",
            Self::Choice => "scalar",
            _ => "text",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// How an attribute value is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Single line of translatable text.
    TextLine,
    /// Translatable text.
    Text,
    /// Boolean.
    Bool,
    /// Integer.
    Int,
    /// Value of the field's own type, validated against the field.
    OwnType,
    /// Value of the field's own type, never validated.
    OwnTypeUnvalidated,
    /// Another field, such as a collection's `value_type`.
    NestedField,
    /// Dotted name of a schema.
    SchemaRef,
    /// Dotted name of a default factory.
    DefaultFactory,
    /// Inline choice values.
    Values,
    /// Dotted name of a vocabulary source.
    Source,
}

/// One declared attribute of a field type.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpec {
    /// Attribute (and child element) name.
    pub name: &'static str,
    /// Encoding.
    pub kind: AttributeKind,
    /// Value an unset attribute holds.
    pub default: Option<Value>,
}

impl AttributeSpec {
    /// Creates an attribute whose default is `None`.
    #[must_use]
    pub const fn new(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            name,
            kind,
            default: None,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// A callable producing a field's default value.
#[derive(Clone)]
pub struct DefaultFactory {
    /// Dotted name the factory is registered under.
    pub identifier: String,
    /// Whether the factory expects the context object.
    pub context_aware: bool,
    call: Arc<dyn Fn() -> Value + Send + Sync>,
}

impl DefaultFactory {
    /// Wraps a closure.
    pub fn new(
        identifier: impl Into<String>,
        call: impl Fn() -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            context_aware: false,
            call: Arc::new(call),
        }
    }

    /// Marks the factory as context aware.
    #[must_use]
    pub fn context_aware(mut self) -> Self {
        self.context_aware = true;
        self
    }

    /// Produces a value.
    #[must_use]
    pub fn call(&self) -> Value {
        (self.call)()
    }
}

impl fmt::Debug for DefaultFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultFactory")
            .field("identifier", &self.identifier)
            .field("context_aware", &self.context_aware)
            .finish_non_exhaustive()
    }
}

impl PartialEq for DefaultFactory {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier && self.context_aware == other.context_aware
    }
}

/// Current value of a field attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute<'a> {
    /// Scalar or container value; `None` when unset.
    Value(Option<Value>),
    /// Nested field; `None` when unset.
    Field(Option<&'a Field>),
}

/// A named, typed slot in a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    field_type: FieldType,
    type_name: Option<String>,
    /// Title shown to users.
    pub title: Value,
    /// Longer help text.
    pub description: Value,
    /// Whether a value must be provided.
    pub required: bool,
    /// Whether the value may be changed after creation.
    pub readonly: bool,
    /// Default value.
    pub default: Option<Value>,
    /// Value meaning "no value".
    pub missing_value: Option<Value>,
    /// Callable computing the default.
    pub default_factory: Option<DefaultFactory>,
    /// Creation order, used to sort fields.
    pub order: u64,
    /// Identifier of the schema owning this field.
    pub interface: Option<String>,
    /// Marker interfaces provided by this field.
    pub markers: BTreeSet<String>,
    /// Lower bound of orderable types.
    pub min: Option<Value>,
    /// Upper bound of orderable types.
    pub max: Option<Value>,
    /// Minimum length of sized types.
    pub min_length: i64,
    /// Maximum length of sized types.
    pub max_length: Option<i64>,
    /// Minimum number of dots of dotted names.
    pub min_dots: i64,
    /// Maximum number of dots of dotted names.
    pub max_dots: Option<i64>,
    /// Whether collection items must be distinct.
    pub unique: bool,
    /// Key field of mappings.
    pub key_type: Option<Box<Field>>,
    /// Item field of collections and mappings.
    pub value_type: Option<Box<Field>>,
    /// Schema an object field must provide.
    pub schema: Option<String>,
    /// Whether object invariants are checked.
    pub validate_invariants: bool,
    /// Terms of a choice field.
    pub vocabulary: Option<VocabularySource>,
}

impl Field {
    /// Creates an unnamed field and assigns it the next creation order.
    #[must_use]
    pub fn new(field_type: FieldType) -> Self {
        let mut field = Self::descriptor(field_type);
        field.order = next_order();
        field
    }

    /// Creates a field without consuming a creation order.
    ///
    /// Used for short-lived fields that only drive value conversion.
    #[must_use]
    pub fn descriptor(field_type: FieldType) -> Self {
        Self {
            name: String::new(),
            field_type,
            type_name: None,
            title: Value::text(""),
            description: Value::text(""),
            required: true,
            readonly: false,
            default: None,
            missing_value: None,
            default_factory: None,
            order: 0,
            interface: None,
            markers: BTreeSet::new(),
            min: None,
            max: None,
            min_length: 0,
            max_length: None,
            min_dots: 0,
            max_dots: None,
            unique: false,
            key_type: None,
            value_type: None,
            schema: None,
            validate_invariants: true,
            vocabulary: None,
        }
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<Value>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<Value>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the required flag.
    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the default value without validation.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets the item field.
    #[must_use]
    pub fn with_value_type(mut self, value_type: Field) -> Self {
        self.value_type = Some(Box::new(value_type));
        self
    }

    /// Sets the key field.
    #[must_use]
    pub fn with_key_type(mut self, key_type: Field) -> Self {
        self.key_type = Some(Box::new(key_type));
        self
    }

    /// Sets the vocabulary.
    #[must_use]
    pub fn with_vocabulary(mut self, vocabulary: VocabularySource) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    /// Sets a custom type identifier for fields produced by extension codecs.
    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the field.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Field type.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Identifier written to the `type` attribute.
    #[must_use]
    pub fn type_identifier(&self) -> &str {
        self.type_name
            .as_deref()
            .unwrap_or_else(|| self.field_type.identifier())
    }

    /// Returns true if the field provides the given marker.
    #[must_use]
    pub fn provides(&self, marker: &str) -> bool {
        self.markers.contains(marker)
    }

    /// Reads an attribute by name.
    ///
    /// Returns `None` for names that are not field attributes at all.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<Attribute<'_>> {
        let value = match name {
            "title" => Some(self.title.clone()),
            "description" => Some(self.description.clone()),
            "required" => Some(Value::Bool(self.required)),
            "readonly" => Some(Value::Bool(self.readonly)),
            "default" => self.default.clone(),
            "missing_value" => self.missing_value.clone(),
            "order" => Some(Value::Int(i64::try_from(self.order).unwrap_or(i64::MAX))),
            "defaultFactory" => self
                .default_factory
                .as_ref()
                .map(|f| Value::Dotted(f.identifier.clone())),
            "min" => self.min.clone(),
            "max" => self.max.clone(),
            "min_length" => Some(Value::Int(self.min_length)),
            "max_length" => self.max_length.map(Value::Int),
            "min_dots" => Some(Value::Int(self.min_dots)),
            "max_dots" => self.max_dots.map(Value::Int),
            "unique" => Some(Value::Bool(self.unique)),
            "validate_invariants" => Some(Value::Bool(self.validate_invariants)),
            "schema" => self.schema.clone().map(Value::Dotted),
            "key_type" => return Some(Attribute::Field(self.key_type.as_deref())),
            "value_type" => return Some(Attribute::Field(self.value_type.as_deref())),
            "vocabulary" | "vocabularyName" => match &self.vocabulary {
                Some(VocabularySource::Named(name)) => Some(Value::text(name.clone())),
                _ => None,
            },
            "values" => match &self.vocabulary {
                Some(VocabularySource::Inline(vocabulary)) => Some(Value::List(
                    vocabulary.iter().map(|t| t.value.clone()).collect(),
                )),
                _ => None,
            },
            "source" => match &self.vocabulary {
                Some(VocabularySource::Source(identifier)) => {
                    Some(Value::Dotted(identifier.clone()))
                }
                _ => None,
            },
            _ => return None,
        };
        Some(Attribute::Value(value))
    }

    /// Writes a value attribute, validating values of the field's own type.
    ///
    /// # Errors
    /// Returns an error for unknown attributes, values of the wrong kind, or
    /// a default that fails validation.
    pub fn set_attribute(&mut self, name: &str, value: Option<Value>) -> Result<()> {
        match (name, &value) {
            ("default", Some(default)) => self.check(default)?,
            ("min" | "max", Some(bound)) => {
                self.validate_type(bound).map_err(|source| Error::Invalid {
                    field: self.name.clone(),
                    source,
                })?;
            }
            _ => {}
        }
        self.assign(name, value)
    }

    /// Writes a nested-field attribute.
    ///
    /// # Errors
    /// Returns [`Error::UnknownAttribute`] for names other than `key_type`
    /// and `value_type`.
    pub fn set_nested(&mut self, name: &str, field: Option<Field>) -> Result<()> {
        let slot = match name {
            "key_type" => &mut self.key_type,
            "value_type" => &mut self.value_type,
            _ => return Err(self.unknown_attribute(name)),
        };
        *slot = field.map(Box::new);
        Ok(())
    }

    fn unknown_attribute(&self, name: &str) -> Error {
        Error::UnknownAttribute {
            field_type: self.type_identifier().to_string(),
            attribute: name.to_string(),
        }
    }

    fn assign(&mut self, name: &str, value: Option<Value>) -> Result<()> {
        match name {
            "title" => self.title = expect_text(name, value)?,
            "description" => self.description = expect_text(name, value)?,
            "required" => self.required = expect_bool(name, value, true)?,
            "readonly" => self.readonly = expect_bool(name, value, false)?,
            "unique" => self.unique = expect_bool(name, value, false)?,
            "validate_invariants" => self.validate_invariants = expect_bool(name, value, true)?,
            "default" => self.default = value,
            "missing_value" => self.missing_value = value,
            "min" => self.min = value,
            "max" => self.max = value,
            "order" => {
                let order = expect_int(name, value)?.unwrap_or(0);
                self.order = u64::try_from(order).unwrap_or(0);
            }
            "min_length" => self.min_length = expect_int(name, value)?.unwrap_or(0),
            "max_length" => self.max_length = expect_int(name, value)?,
            "min_dots" => self.min_dots = expect_int(name, value)?.unwrap_or(0),
            "max_dots" => self.max_dots = expect_int(name, value)?,
            "schema" => self.schema = expect_name(name, value)?,
            "vocabulary" | "vocabularyName" => {
                if let Some(vocabulary) = expect_name(name, value)? {
                    self.set_vocabulary(VocabularySource::Named(vocabulary))?;
                }
            }
            _ => return Err(self.unknown_attribute(name)),
        }
        Ok(())
    }

    /// Installs a vocabulary, refusing to replace a different one.
    ///
    /// # Errors
    /// Returns [`Error::ConflictingVocabulary`] if another vocabulary is set.
    pub fn set_vocabulary(&mut self, vocabulary: VocabularySource) -> Result<()> {
        match &self.vocabulary {
            Some(existing) if *existing != vocabulary => Err(Error::ConflictingVocabulary {
                field: self.name.clone(),
            }),
            _ => {
                self.vocabulary = Some(vocabulary);
                Ok(())
            }
        }
    }

    fn check(&self, value: &Value) -> Result<()> {
        self.validate(value).map_err(|source| Error::Invalid {
            field: self.name.clone(),
            source,
        })
    }

    /// Returns the static default, or calls the default factory.
    #[must_use]
    pub fn default_value(&self) -> Option<Value> {
        self.default
            .clone()
            .or_else(|| self.default_factory.as_ref().map(DefaultFactory::call))
    }

    /// Validates a possibly absent value.
    ///
    /// Absent values and the missing value are accepted unless the field is
    /// required.
    ///
    /// # Errors
    /// Returns [`ValidationError::RequiredMissing`] or the first constraint
    /// a present value violates.
    pub fn validate_optional(&self, value: Option<&Value>) -> std::result::Result<(), ValidationError> {
        match value {
            Some(value) if Some(value) != self.missing_value.as_ref() => self.validate(value),
            _ if self.required => Err(ValidationError::RequiredMissing),
            _ => Ok(()),
        }
    }

    /// Validates a value against this field.
    ///
    /// # Errors
    /// Returns the first constraint the value violates.
    pub fn validate(&self, value: &Value) -> std::result::Result<(), ValidationError> {
        self.validate_type(value)?;
        self.validate_bounds(value)?;
        self.validate_length(value)?;
        self.validate_text(value)?;
        self.validate_items(value)
    }

    /// Checks only that the value kind matches the field type.
    ///
    /// # Errors
    /// Returns [`ValidationError::WrongType`] on mismatch.
    pub fn validate_type(&self, value: &Value) -> std::result::Result<(), ValidationError> {
        use FieldType as T;
        let accepted = match self.field_type {
            T::Bytes | T::BytesLine => matches!(value, Value::Bytes(_)),
            T::Ascii | T::AsciiLine => matches!(value, Value::Text(_)),
            T::Text | T::TextLine | T::Password | T::SourceText => {
                matches!(value, Value::Text(_) | Value::Message(_))
            }
            T::Uri | T::Id | T::DottedName => matches!(value, Value::Text(_)),
            T::Bool => matches!(value, Value::Bool(_)),
            T::Int => matches!(value, Value::Int(_)),
            T::Float => matches!(value, Value::Float(_)),
            T::Decimal => matches!(value, Value::Decimal(_)),
            T::Tuple => matches!(value, Value::Tuple(_)),
            T::List => matches!(value, Value::List(_)),
            T::Set | T::FrozenSet => matches!(value, Value::Set(_)),
            T::Dict => matches!(value, Value::Dict(_)),
            T::Datetime => matches!(value, Value::Datetime(_)),
            T::Date => matches!(value, Value::Date(_)),
            T::InterfaceField | T::Object => matches!(value, Value::Dotted(_)),
            T::Choice => !value.is_container(),
        };
        if accepted {
            Ok(())
        } else {
            Err(ValidationError::WrongType {
                expected: self.field_type.value_kind(),
                actual: value.kind_name(),
            })
        }
    }

    fn validate_bounds(&self, value: &Value) -> std::result::Result<(), ValidationError> {
        use std::cmp::Ordering::{Greater, Less};
        let text = || value.to_text().unwrap_or_default();
        if let Some(min) = self.min.as_ref().filter(|min| value.compare(min) == Some(Less)) {
            return Err(ValidationError::TooSmall {
                value: text(),
                min: min.to_text().unwrap_or_default(),
            });
        }
        if let Some(max) = self.max.as_ref().filter(|max| value.compare(max) == Some(Greater)) {
            return Err(ValidationError::TooBig {
                value: text(),
                max: max.to_text().unwrap_or_default(),
            });
        }
        Ok(())
    }

    fn validate_length(&self, value: &Value) -> std::result::Result<(), ValidationError> {
        if !self.field_type.is_sized() {
            return Ok(());
        }
        let Some(length) = value.len() else {
            return Ok(());
        };
        let as_i64 = i64::try_from(length).unwrap_or(i64::MAX);
        if as_i64 < self.min_length {
            return Err(ValidationError::TooShort {
                length,
                min_length: self.min_length,
            });
        }
        match self.max_length {
            Some(max_length) if as_i64 > max_length => {
                Err(ValidationError::TooLong { length, max_length })
            }
            _ => Ok(()),
        }
    }

    fn validate_text(&self, value: &Value) -> std::result::Result<(), ValidationError> {
        use FieldType as T;
        if self.field_type.is_line() {
            let broken = match value {
                Value::Bytes(bytes) => bytes.contains(&b'\n'),
                other => other
                    .display_text()
                    .is_some_and(|t| t.contains(['\n', '\r'])),
            };
            if broken {
                return Err(ValidationError::NotALine);
            }
        }
        let Some(text) = value.as_str() else {
            return Ok(());
        };
        match self.field_type {
            T::Ascii | T::AsciiLine if !text.is_ascii() => {
                Err(ValidationError::NotAscii(text.to_string()))
            }
            T::Uri if !is_uri(text) => Err(ValidationError::InvalidUri(text.to_string())),
            T::Id if !is_uri(text) && !is_dotted_name(text) => {
                Err(ValidationError::InvalidId(text.to_string()))
            }
            T::DottedName => {
                let dots = i64::try_from(text.matches('.').count()).unwrap_or(i64::MAX);
                let too_many = self.max_dots.is_some_and(|max| dots > max);
                if !is_dotted_name(text) || dots < self.min_dots || too_many {
                    Err(ValidationError::InvalidDottedName(text.to_string()))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    fn validate_items(&self, value: &Value) -> std::result::Result<(), ValidationError> {
        match value {
            Value::List(items) | Value::Tuple(items) => {
                if let Some(value_type) = &self.value_type {
                    items.iter().try_for_each(|item| value_type.validate(item))?;
                }
                if self.unique {
                    for (index, item) in items.iter().enumerate() {
                        if items[..index].contains(item) {
                            return Err(ValidationError::NotUnique(
                                item.to_text().unwrap_or_default(),
                            ));
                        }
                    }
                }
                Ok(())
            }
            Value::Set(items) => match &self.value_type {
                Some(value_type) => items.iter().try_for_each(|item| value_type.validate(item)),
                None => Ok(()),
            },
            Value::Dict(items) => {
                for (key, item) in items {
                    if let Some(key_type) = &self.key_type {
                        key_type.validate(key)?;
                    }
                    if let Some(value_type) = &self.value_type {
                        value_type.validate(item)?;
                    }
                }
                Ok(())
            }
            scalar if self.field_type == FieldType::Choice => match &self.vocabulary {
                Some(VocabularySource::Inline(vocabulary)) if !vocabulary.contains(scalar) => Err(
                    ValidationError::NotInVocabulary(scalar.to_text().unwrap_or_default()),
                ),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

fn expect_text(name: &str, value: Option<Value>) -> Result<Value> {
    match value {
        None => Ok(Value::text("")),
        Some(value @ (Value::Text(_) | Value::Message(_))) => Ok(value),
        Some(other) => Err(Error::AttributeType {
            attribute: name.to_string(),
            expected: "text",
            actual: other.kind_name(),
        }),
    }
}

fn expect_bool(name: &str, value: Option<Value>, default: bool) -> Result<bool> {
    match value {
        None => Ok(default),
        Some(Value::Bool(flag)) => Ok(flag),
        Some(other) => Err(Error::AttributeType {
            attribute: name.to_string(),
            expected: "bool",
            actual: other.kind_name(),
        }),
    }
}

fn expect_int(name: &str, value: Option<Value>) -> Result<Option<i64>> {
    match value {
        None => Ok(None),
        Some(Value::Int(number)) => Ok(Some(number)),
        Some(other) => Err(Error::AttributeType {
            attribute: name.to_string(),
            expected: "int",
            actual: other.kind_name(),
        }),
    }
}

fn expect_name(name: &str, value: Option<Value>) -> Result<Option<String>> {
    match value {
        None => Ok(None),
        Some(Value::Text(text) | Value::Dotted(text)) => Ok(Some(text)),
        Some(other) => Err(Error::AttributeType {
            attribute: name.to_string(),
            expected: "name",
            actual: other.kind_name(),
        }),
    }
}

fn is_uri(text: &str) -> bool {
    let Some((scheme, rest)) = text.split_once(':') else {
        return false;
    };
    !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
        && !rest.chars().any(char::is_whitespace)
}

fn is_dotted_name(text: &str) -> bool {
    !text.is_empty()
        && text.split('.').all(|segment| {
            let mut chars = segment.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// Collects attributes for a field under construction.
///
/// Attribute writes are not validated until the field is finished, so the
/// order in which attributes arrive does not matter.
#[derive(Debug, Clone)]
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    /// Starts a field of the given type.
    #[must_use]
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field: Field::new(field_type),
        }
    }

    /// Returns the field as configured so far.
    #[must_use]
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Sets the name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.field.name = name.into();
    }

    /// Sets a custom type identifier.
    pub fn set_type_name(&mut self, type_name: impl Into<String>) {
        self.field.type_name = Some(type_name.into());
    }

    /// Sets a value attribute without validation.
    ///
    /// # Errors
    /// Returns an error for unknown attributes or values of the wrong kind.
    pub fn set(&mut self, name: &str, value: Option<Value>) -> Result<()> {
        self.field.assign(name, value)
    }

    /// Sets a nested-field attribute.
    ///
    /// # Errors
    /// Returns [`Error::UnknownAttribute`] for names other than `key_type`
    /// and `value_type`.
    pub fn set_nested(&mut self, name: &str, field: Option<Field>) -> Result<()> {
        self.field.set_nested(name, field)
    }

    /// Sets the vocabulary.
    ///
    /// # Errors
    /// Returns [`Error::ConflictingVocabulary`] if another one is set.
    pub fn set_vocabulary(&mut self, vocabulary: VocabularySource) -> Result<()> {
        self.field.set_vocabulary(vocabulary)
    }

    /// Sets the default factory.
    pub fn set_default_factory(&mut self, factory: DefaultFactory) {
        self.field.default_factory = Some(factory);
    }

    /// Finishes construction.
    ///
    /// # Errors
    /// Returns [`Error::MissingVocabulary`] for a choice without terms.
    pub fn finish(self) -> Result<Field> {
        let field = self.field;
        if field.field_type == FieldType::Choice && field.vocabulary.is_none() {
            return Err(Error::MissingVocabulary { field: field.name });
        }
        Ok(field)
    }
}

/// Sorts `(name, field)` pairs by creation order.
#[must_use]
pub fn sorted_fields<'a>(fields: &'a BTreeMap<String, Field>) -> Vec<(&'a str, &'a Field)> {
    let mut sorted: Vec<_> = fields.iter().map(|(n, f)| (n.as_str(), f)).collect();
    sorted.sort_by_key(|(_, f)| f.order);
    sorted
}
