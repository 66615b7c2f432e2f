//! Error types for model parsing and serialization.

use ironmodel_core::ValidationError;
use thiserror::Error;

/// Error type for reading and writing model documents.
#[derive(Debug, Error)]
pub enum ParseError {
    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed XML at a known line.
    #[error("XML syntax error at line {line}: {message}")]
    Syntax {
        /// Line of the offending markup.
        line: usize,
        /// Reader message.
        message: String,
    },

    /// Malformed character or entity reference.
    #[error("XML escape error: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Missing required attribute.
    #[error("missing required attribute '{attribute}' on element '{element}'")]
    MissingAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
    },

    /// Invalid attribute value.
    #[error("invalid value '{value}' for attribute '{attribute}' on element '{element}'")]
    InvalidAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Invalid value.
        value: String,
    },

    /// No codec is registered for a field type.
    #[error("unknown field type '{type_name}' for field '{field}'")]
    UnknownFieldType {
        /// Type identifier.
        type_name: String,
        /// Field name.
        field: String,
    },

    /// No codec is registered for a nested field type.
    #[error("unsupported type '{type_name}' for nested attribute '{attribute}'")]
    UnsupportedNestedType {
        /// Type identifier.
        type_name: String,
        /// Attribute holding the nested field.
        attribute: String,
    },

    /// A fieldset element has no name.
    #[error("fieldset in schema '{schema}' has no name")]
    UnnamedFieldset {
        /// Name of the enclosing schema.
        schema: String,
    },

    /// No schema policy is registered under a name.
    #[error("unknown schema policy '{name}'")]
    UnknownPolicy {
        /// Policy name.
        name: String,
    },

    /// A dotted name did not resolve.
    #[error("cannot resolve '{identifier}'")]
    Unresolved {
        /// Dotted name.
        identifier: String,
    },

    /// A dotted name resolved to the wrong kind of object.
    #[error("'{identifier}' is a {actual}, expected a {expected}")]
    MissingCapability {
        /// Dotted name.
        identifier: String,
        /// Required capability.
        expected: &'static str,
        /// What the name resolved to.
        actual: &'static str,
    },

    /// Text could not be converted into a field value.
    #[error("cannot convert '{text}' for {field_type}: {reason}")]
    InvalidValue {
        /// Type identifier of the target field.
        field_type: String,
        /// Offending text.
        text: String,
        /// Why conversion failed.
        reason: String,
    },

    /// A converted value failed field validation.
    #[error("invalid value for '{field}': {source}")]
    Validation {
        /// Field or attribute name.
        field: String,
        /// Validation failure.
        #[source]
        source: ValidationError,
    },

    /// The model cannot be expressed in XML.
    #[error("not supported: {message}")]
    NotSupported {
        /// Explanation.
        message: String,
    },

    /// Invalid document structure.
    #[error("invalid model structure: {message}")]
    InvalidStructure {
        /// Error message.
        message: String,
    },

    /// Model-level error.
    #[error(transparent)]
    Model(#[from] ironmodel_core::Error),

    /// An error raised while parsing, with its location.
    #[error("{message}")]
    Located {
        /// Rendered message including location and source line.
        message: String,
        /// File name, when parsing from a file.
        file: Option<String>,
        /// Line of the innermost element being read.
        line: Option<usize>,
        /// The original error.
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Creates a missing attribute error.
    pub fn missing_attr(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid attribute error.
    pub fn invalid_attr(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates a not-supported error.
    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::NotSupported {
            message: message.into(),
        }
    }

    /// Creates a conversion error.
    pub fn invalid_value(
        field_type: impl Into<String>,
        text: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::InvalidValue {
            field_type: field_type.into(),
            text: text.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns the original error behind any location wrapper.
    #[must_use]
    pub fn root(&self) -> &ParseError {
        match self {
            Self::Located { source, .. } => source.root(),
            other => other,
        }
    }

    /// Line recorded by the error itself, if any.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Syntax { line, .. } => Some(*line),
            Self::Located { line, .. } => *line,
            _ => None,
        }
    }

    /// Wraps an error with the file, line and literal source line.
    ///
    /// The error's own line takes precedence over `line`.
    #[must_use]
    pub fn located(self, file: Option<&str>, line: Option<usize>, source: &str) -> Self {
        if matches!(self, Self::Located { .. }) {
            return self;
        }
        let line = self.line().or(line);
        let mut message = self.to_string();
        if file.is_some() || line.is_some() {
            let shown = line.map_or_else(|| "unknown".to_string(), |l| l.to_string());
            message.push_str(&format!(
                "\n  File \"{}\", line {shown}",
                file.unwrap_or("<unknown>")
            ));
        }
        if let Some(text) = line
            .and_then(|l| l.checked_sub(1))
            .and_then(|index| source.lines().nth(index))
        {
            message.push_str("\n    ");
            message.push_str(text.trim());
        }
        Self::Located {
            message,
            file: file.map(str::to_string),
            line,
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_located_keeps_original_error() {
        let source = "<model>\n  <schema>\n    <field type=\"x\"/>\n  </schema>\n</model>";
        let error = ParseError::missing_attr("field", "name").located(Some("a.xml"), Some(3), source);

        assert_eq!(error.line(), Some(3));
        assert!(matches!(error.root(), ParseError::MissingAttribute { .. }));
        assert!(error.source().is_some());
        let message = error.to_string();
        assert!(message.contains("File \"a.xml\", line 3"));
        assert!(message.ends_with("<field type=\"x\"/>"));
    }

    #[test]
    fn test_located_prefers_syntax_line() {
        let error = ParseError::Syntax {
            line: 2,
            message: "unexpected end".to_string(),
        }
        .located(None, Some(1), "a\nb");
        assert_eq!(error.line(), Some(2));
        assert!(error.to_string().ends_with("\n    b"));
    }

    #[test]
    fn test_located_without_location() {
        let error = ParseError::not_supported("x").located(None, None, "");
        assert_eq!(error.to_string(), "not supported: x");
    }
}
