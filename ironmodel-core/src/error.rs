//! Error types for IronModel core operations.

use thiserror::Error;

/// Core error type for model manipulation.
#[derive(Debug, Error)]
pub enum Error {
    /// A field type does not carry the requested attribute.
    #[error("field type {field_type} has no attribute '{attribute}'")]
    UnknownAttribute {
        /// Wire identifier of the field type.
        field_type: String,
        /// Attribute name.
        attribute: String,
    },

    /// An attribute was given a value of the wrong kind.
    #[error("attribute '{attribute}' expects {expected}, got {actual}")]
    AttributeType {
        /// Attribute name.
        attribute: String,
        /// Expected value kind.
        expected: &'static str,
        /// Actual value kind.
        actual: &'static str,
    },

    /// Field lookup failed.
    #[error("field '{field}' not found in schema '{schema}'")]
    FieldNotFound {
        /// Schema identifier.
        schema: String,
        /// Field name.
        field: String,
    },

    /// Two vocabulary terms share a value or a token.
    #[error("duplicate term {kind} '{value}' in vocabulary")]
    DuplicateTerm {
        /// Either "value" or "token".
        kind: &'static str,
        /// The duplicated value or token.
        value: String,
    },

    /// A choice field was finished without any vocabulary.
    #[error("choice field '{field}' needs values, a named vocabulary or a source")]
    MissingVocabulary {
        /// Field name.
        field: String,
    },

    /// A choice field was given two vocabularies.
    #[error("choice field '{field}' cannot combine several vocabulary sources")]
    ConflictingVocabulary {
        /// Field name.
        field: String,
    },

    /// A tagged value does not have the shape a merge expects.
    #[error("tagged value '{key}' on schema '{schema}' is not a {expected}")]
    TaggedValueShape {
        /// Tagged value key.
        key: String,
        /// Schema identifier.
        schema: String,
        /// Expected shape.
        expected: &'static str,
    },

    /// A value failed field validation.
    #[error("invalid value for field '{field}': {source}")]
    Invalid {
        /// Field name.
        field: String,
        /// Underlying validation failure.
        #[source]
        source: ValidationError,
    },
}

/// Reasons a value is rejected by a field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Value has the wrong kind for the field.
    #[error("expected {expected}, got {actual}")]
    WrongType {
        /// Expected value kind.
        expected: &'static str,
        /// Actual value kind.
        actual: &'static str,
    },

    /// A required field has no value.
    #[error("required value is missing")]
    RequiredMissing,

    /// Value is below the field minimum.
    #[error("value {value} is smaller than the minimum {min}")]
    TooSmall {
        /// Offending value.
        value: String,
        /// Minimum bound.
        min: String,
    },

    /// Value is above the field maximum.
    #[error("value {value} is bigger than the maximum {max}")]
    TooBig {
        /// Offending value.
        value: String,
        /// Maximum bound.
        max: String,
    },

    /// Value is shorter than `min_length`.
    #[error("length {length} is shorter than the minimum length {min_length}")]
    TooShort {
        /// Actual length.
        length: usize,
        /// Minimum length.
        min_length: i64,
    },

    /// Value is longer than `max_length`.
    #[error("length {length} is longer than the maximum length {max_length}")]
    TooLong {
        /// Actual length.
        length: usize,
        /// Maximum length.
        max_length: i64,
    },

    /// A single-line field received a line break.
    #[error("value contains a line break")]
    NotALine,

    /// An ASCII field received non-ASCII text.
    #[error("value '{0}' is not ASCII")]
    NotAscii(String),

    /// Malformed URI.
    #[error("'{0}' is not a valid URI")]
    InvalidUri(String),

    /// Malformed dotted name, or dot count out of bounds.
    #[error("'{0}' is not a valid dotted name")]
    InvalidDottedName(String),

    /// Neither a URI nor a dotted name.
    #[error("'{0}' is not a valid id")]
    InvalidId(String),

    /// Choice value outside the vocabulary.
    #[error("value '{0}' is not in the vocabulary")]
    NotInVocabulary(String),

    /// A collection repeated an item while `unique` is set.
    #[error("collection contains duplicate item '{0}'")]
    NotUnique(String),
}

/// Result type alias for IronModel core operations.
pub type Result<T> = std::result::Result<T, Error>;
