//! Vocabularies for choice fields.

use crate::error::{Error, Result};
use crate::value::Value;
use std::fmt::Write;

/// One admissible choice value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    /// The stored value.
    pub value: Value,
    /// ASCII token identifying the term.
    pub token: String,
    /// Human readable title.
    pub title: Option<Value>,
}

impl Term {
    /// Creates an untitled term whose token derives from the value.
    #[must_use]
    pub fn new(value: Value) -> Self {
        let token = token_for(&value);
        Self {
            value,
            token,
            title: None,
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<Value>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Overrides the token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }
}

/// An ordered set of terms with unique values and tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<Term>,
}

impl Vocabulary {
    /// Builds a vocabulary from terms.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateTerm`] when two terms share a value or token.
    pub fn new(terms: Vec<Term>) -> Result<Self> {
        for (index, term) in terms.iter().enumerate() {
            let earlier = &terms[..index];
            if earlier.iter().any(|t| t.value == term.value) {
                return Err(Error::DuplicateTerm {
                    kind: "value",
                    value: term.value.to_text().unwrap_or_default(),
                });
            }
            if earlier.iter().any(|t| t.token == term.token) {
                return Err(Error::DuplicateTerm {
                    kind: "token",
                    value: term.token.clone(),
                });
            }
        }
        Ok(Self { terms })
    }

    /// Builds an untitled vocabulary from plain values.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateTerm`] on repeated values.
    pub fn from_values<I, V>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(values.into_iter().map(|v| Term::new(v.into())).collect())
    }

    /// Builds a vocabulary of `(value, title)` pairs.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateTerm`] on repeated values.
    pub fn from_items<I, V, T>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = (V, T)>,
        V: Into<Value>,
        T: Into<Value>,
    {
        Self::new(
            items
                .into_iter()
                .map(|(value, title)| Term::new(value.into()).with_title(title))
                .collect(),
        )
    }

    /// Returns the terms in order.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Iterates over the terms.
    pub fn iter(&self) -> std::slice::Iter<'_, Term> {
        self.terms.iter()
    }

    /// Finds the term holding `value`.
    #[must_use]
    pub fn by_value(&self, value: &Value) -> Option<&Term> {
        self.terms.iter().find(|t| &t.value == value)
    }

    /// Finds the term with `token`.
    #[must_use]
    pub fn by_token(&self, token: &str) -> Option<&Term> {
        self.terms.iter().find(|t| t.token == token)
    }

    /// Returns true if `value` is a term value.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.by_value(value).is_some()
    }

    /// Number of terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns true when there are no terms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl<'a> IntoIterator for &'a Vocabulary {
    type Item = &'a Term;
    type IntoIter = std::slice::Iter<'a, Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.iter()
    }
}

/// Where a choice field takes its terms from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VocabularySource {
    /// Looked up by name at use time.
    Named(String),
    /// Carried inline.
    Inline(Vocabulary),
    /// A programmatic source identified by dotted name.
    Source(String),
}

impl VocabularySource {
    /// Returns the inline vocabulary, if any.
    #[must_use]
    pub fn inline(&self) -> Option<&Vocabulary> {
        match self {
            Self::Inline(vocabulary) => Some(vocabulary),
            _ => None,
        }
    }
}

/// Derives the default token of a value.
#[must_use]
pub fn token_for(value: &Value) -> String {
    match value {
        Value::Text(text) => escape_token(text),
        other => escape_token(&other.to_text().unwrap_or_default()),
    }
}

/// Escapes text into an ASCII token.
///
/// Printable ASCII passes through, backslash is doubled, tab/newline/return
/// use their short escapes and everything else becomes `\xhh`, `\uhhhh` or
/// `\Uhhhhhhhh`.
#[must_use]
pub fn escape_token(text: &str) -> String {
    let mut token = String::with_capacity(text.len());
    for c in text.chars() {
        let code = u32::from(c);
        match c {
            '\\' => token.push_str("\\\\"),
            '\t' => token.push_str("\\t"),
            '\n' => token.push_str("\\n"),
            '\r' => token.push_str("\\r"),
            ' '..='~' => token.push(c),
            _ if code < 0x100 => {
                let _ = write!(token, "\\x{code:02x}");
            }
            _ if code < 0x1_0000 => {
                let _ = write!(token, "\\u{code:04x}");
            }
            _ => {
                let _ = write!(token, "\\U{code:08x}");
            }
        }
    }
    token
}

/// Reverses [`escape_token`].
///
/// Returns `None` for malformed escapes.
#[must_use]
pub fn unescape_token(token: &str) -> Option<String> {
    let mut text = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        let width = match chars.next()? {
            '\\' => {
                text.push('\\');
                continue;
            }
            't' => {
                text.push('\t');
                continue;
            }
            'n' => {
                text.push('\n');
                continue;
            }
            'r' => {
                text.push('\r');
                continue;
            }
            'x' => 2,
            'u' => 4,
            'U' => 8,
            _ => return None,
        };
        let digits: String = chars.by_ref().take(width).collect();
        if digits.len() != width {
            return None;
        }
        let code = u32::from_str_radix(&digits, 16).ok()?;
        text.push(char::from_u32(code)?);
    }
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_token() {
        assert_eq!(escape_token("plain text"), "plain text");
        assert_eq!(escape_token("caf\u{e9}"), "caf\\xe9");
        assert_eq!(escape_token("\u{2603}"), "\\u2603");
        assert_eq!(escape_token("\u{1f600}"), "\\U0001f600");
        assert_eq!(escape_token("a\\b\n"), "a\\\\b\\n");
    }

    #[test]
    fn test_unescape_token_reverses_escape() {
        for text in ["caf\u{e9}", "\u{2603} snow", "tab\there", "back\\slash"] {
            assert_eq!(unescape_token(&escape_token(text)).as_deref(), Some(text));
        }
        assert_eq!(unescape_token("bad\\q"), None);
        assert_eq!(unescape_token("short\\x4"), None);
    }

    #[test]
    fn test_vocabulary_rejects_duplicates() {
        let err = Vocabulary::from_values(["a", "b", "a"]).unwrap_err();
        assert!(matches!(err, Error::DuplicateTerm { kind: "value", .. }));

        let terms = vec![
            Term::new(Value::from("a")),
            Term::new(Value::from("b")).with_token("a"),
        ];
        let err = Vocabulary::new(terms).unwrap_err();
        assert!(matches!(err, Error::DuplicateTerm { kind: "token", .. }));
    }

    #[test]
    fn test_vocabulary_lookup() {
        let vocabulary = Vocabulary::from_items([(1, "One"), (2, "Two")].map(|(v, t)| {
            (Value::Int(v), Value::from(t))
        }))
        .unwrap();
        assert_eq!(vocabulary.len(), 2);
        assert_eq!(vocabulary.by_token("2").map(|t| &t.value), Some(&Value::Int(2)));
        assert!(vocabulary.contains(&Value::Int(1)));
        assert!(!vocabulary.contains(&Value::from("1")));
    }
}
