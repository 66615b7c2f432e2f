//! Typed values.
//!
//! A [`Value`] is anything a field can hold: defaults, bounds, missing
//! values, vocabulary terms and tagged values all use it. Values are totally
//! ordered so they can live in sets and serve as dictionary keys.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Date format used for text conversion.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Datetime format used for text conversion (without fractional seconds).
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A translatable message.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Message {
    /// Message identifier.
    pub id: String,
    /// Untranslated default text.
    pub default: Option<String>,
    /// Translation domain.
    pub domain: Option<String>,
}

impl Message {
    /// Creates a message whose identifier doubles as its text.
    #[must_use]
    pub fn new(id: impl Into<String>, domain: Option<String>) -> Self {
        Self {
            id: id.into(),
            default: None,
            domain,
        }
    }

    /// Sets the default text.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Returns the text shown when no translation is available.
    #[must_use]
    pub fn text(&self) -> &str {
        self.default.as_deref().unwrap_or(&self.id)
    }
}

/// A field value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Exact decimal number.
    Decimal(Decimal),
    /// Unicode text.
    Text(String),
    /// Translatable message.
    Message(Message),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time without zone.
    Datetime(NaiveDateTime),
    /// Reference to a named object (schema, vocabulary source, ...).
    Dotted(String),
    /// Ordered, mutable sequence.
    List(Vec<Value>),
    /// Ordered, immutable sequence.
    Tuple(Vec<Value>),
    /// Unordered collection of distinct items.
    Set(BTreeSet<Value>),
    /// Mapping.
    Dict(BTreeMap<Value, Value>),
}

impl Value {
    /// Shorthand for a text value.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Returns the name of the value kind, used in error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
            Self::Message(_) => "message",
            Self::Bytes(_) => "bytes",
            Self::Date(_) => "date",
            Self::Datetime(_) => "datetime",
            Self::Dotted(_) => "dotted name",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Set(_) => "set",
            Self::Dict(_) => "dict",
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Int(_) => 1,
            Self::Float(_) => 2,
            Self::Decimal(_) => 3,
            Self::Text(_) => 4,
            Self::Message(_) => 5,
            Self::Bytes(_) => 6,
            Self::Date(_) => 7,
            Self::Datetime(_) => 8,
            Self::Dotted(_) => 9,
            Self::List(_) => 10,
            Self::Tuple(_) => 11,
            Self::Set(_) => 12,
            Self::Dict(_) => 13,
        }
    }

    /// Returns the text of a text value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the displayed text of a text or message value.
    #[must_use]
    pub fn display_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Message(message) => Some(message.text()),
            _ => None,
        }
    }

    /// Returns the integer of an int value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the boolean of a bool value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns true for lists, tuples, sets and dicts.
    #[must_use]
    pub const fn is_container(&self) -> bool {
        matches!(
            self,
            Self::List(_) | Self::Tuple(_) | Self::Set(_) | Self::Dict(_)
        )
    }

    /// Returns the length used by `min_length`/`max_length` checks.
    ///
    /// Text is measured in characters, bytes in bytes and containers in
    /// items. Other values have no length.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Text(text) => Some(text.chars().count()),
            Self::Message(message) => Some(message.text().chars().count()),
            Self::Bytes(bytes) => Some(bytes.len()),
            Self::List(items) | Self::Tuple(items) => Some(items.len()),
            Self::Set(items) => Some(items.len()),
            Self::Dict(items) => Some(items.len()),
            _ => None,
        }
    }

    /// Returns true when [`len`](Self::len) is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Compares two values the way bounds are compared.
    ///
    /// Ints and floats compare numerically; otherwise both sides must be of
    /// the same kind.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            _ if self.rank() == other.rank() => Some(self.cmp(other)),
            _ => None,
        }
    }

    /// Converts a scalar to its canonical text form.
    ///
    /// Containers have no text form and return `None`.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        let text = match self {
            Self::Bool(true) => "True".to_string(),
            Self::Bool(false) => "False".to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => float_text(*value),
            Self::Decimal(value) => value.to_string(),
            Self::Text(text) | Self::Dotted(text) => text.clone(),
            Self::Message(message) => message.id.clone(),
            Self::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Self::Date(date) => date.format(DATE_FORMAT).to_string(),
            Self::Datetime(datetime) => {
                let mut text = datetime.format(DATETIME_FORMAT).to_string();
                let micros = datetime.nanosecond() / 1_000;
                if micros > 0 {
                    text.push_str(&format!(".{micros:06}"));
                }
                text
            }
            Self::List(_) | Self::Tuple(_) | Self::Set(_) | Self::Dict(_) => return None,
        };
        Some(text)
    }
}

fn float_text(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Decimal(a), Self::Decimal(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) | (Self::Dotted(a), Self::Dotted(b)) => a.cmp(b),
            (Self::Message(a), Self::Message(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Datetime(a), Self::Datetime(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => a.cmp(b),
            (Self::Set(a), Self::Set(b)) => a.cmp(b),
            (Self::Dict(a), Self::Dict(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Message> for Value {
    fn from(value: Message) -> Self {
        Self::Message(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::Datetime(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}
