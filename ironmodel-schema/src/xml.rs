//! Minimal namespace-aware element tree.
//!
//! Documents are read into [`Element`] trees with `quick-xml`. Tags and
//! attribute names of namespaced nodes use Clark notation, `{uri}local`.
//! Each element keeps the line it starts on and its own namespace
//! declarations, which the writer turns back into prefixes.

use crate::error::ParseError;
use quick_xml::escape::{partial_escape, unescape};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{LocalName, NamespaceResolver, PrefixDeclaration, ResolveResult};
use quick_xml::{NsReader, Writer};

/// Namespace of model documents.
pub const XML_NAMESPACE: &str = "http://namespaces.plone.org/supermodel/schema";

/// Namespace of i18n attributes.
pub const I18N_NAMESPACE: &str = "http://xml.zope.org/namespaces/i18n";

/// Conventional prefix of the i18n namespace.
pub const I18N_PREFIX: &str = "i18n";

const XML_RESERVED_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Builds a Clark-notation name.
#[must_use]
pub fn ns(name: &str, namespace: &str) -> String {
    format!("{{{namespace}}}{name}")
}

/// Returns the local part of a Clark-notation name.
#[must_use]
pub fn local_name(name: &str) -> &str {
    match name.strip_prefix('{').and_then(|rest| rest.split_once('}')) {
        Some((_, local)) => local,
        None => name,
    }
}

/// Returns the namespace of a Clark-notation name.
#[must_use]
pub fn namespace_of(name: &str) -> Option<&str> {
    name.strip_prefix('{')
        .and_then(|rest| rest.split_once('}'))
        .map(|(namespace, _)| namespace)
}

/// An XML element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Tag in Clark notation.
    pub tag: String,
    /// Attributes in document order; names in Clark notation.
    pub attributes: Vec<(String, String)>,
    /// Child elements.
    pub children: Vec<Element>,
    /// Text before the first child. Text after a child is not kept.
    pub text: Option<String>,
    /// Line the start tag is on.
    pub line: Option<usize>,
    /// Namespace declarations made on this element: `(prefix, uri)`.
    pub namespaces: Vec<(Option<String>, String)>,
}

impl Element {
    /// Creates an empty element.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Sets the text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets an attribute.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Local part of the tag.
    #[must_use]
    pub fn local_name(&self) -> &str {
        local_name(&self.tag)
    }

    /// Attribute value by Clark-notation name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute, keeping its position when it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Removes an attribute.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    /// Appends a child.
    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Declares a namespace on this element.
    pub fn declare_namespace(&mut self, prefix: Option<&str>, uri: impl Into<String>) {
        let prefix = prefix.map(str::to_string);
        let uri = uri.into();
        match self.namespaces.iter_mut().find(|(p, _)| *p == prefix) {
            Some(entry) => entry.1 = uri,
            None => self.namespaces.push((prefix, uri)),
        }
    }

    /// Returns true for elements in the model namespace or in no namespace.
    #[must_use]
    pub fn is_model_element(&self) -> bool {
        namespace_of(&self.tag).is_none_or(|namespace| namespace == XML_NAMESPACE)
    }

    /// Model-namespace children with the given local name.
    pub fn model_children<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children
            .iter()
            .filter(move |child| child.is_model_element() && child.local_name() == local)
    }

    /// Children with the given tag.
    pub fn children_tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.tag == tag)
    }

    /// Visits this element and all descendants in document order.
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Element)) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }
}

struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(index, _)| index + 1));
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(index) => index + 1,
            Err(index) => index,
        }
    }
}

/// Parses a document into its root element.
///
/// Only text before an element's first child is kept. Text that follows a
/// child element is not part of any model value and is dropped with a
/// warning when it is not blank.
///
/// # Arguments
/// * `xml` - Document text
///
/// # Returns
/// The root element.
///
/// # Errors
/// Returns `ParseError::Syntax` for malformed markup or attributes,
/// `ParseError::InvalidStructure` for undeclared prefixes and escape or
/// UTF-8 errors for bad content.
pub fn parse_document(xml: &str) -> Result<Element, ParseError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(false);
    let lines = LineIndex::new(xml);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                let offset = usize::try_from(reader.buffer_position()).unwrap_or(xml.len());
                return Err(ParseError::Syntax {
                    line: lines.line_of(offset.min(xml.len())),
                    message: e.to_string(),
                });
            }
        };
        let end = usize::try_from(reader.buffer_position()).unwrap_or(xml.len());
        match event {
            Event::Start(ref e) => {
                let line = start_line(xml, end, &lines);
                stack.push(open_element(reader.resolver(), e, line)?);
            }
            Event::Empty(ref e) => {
                let line = start_line(xml, end, &lines);
                let element = open_element(reader.resolver(), e, line)?;
                close_element(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                if let Some(mut element) = stack.pop() {
                    if element.children.is_empty() && element.text.is_none() {
                        element.text = Some(String::new());
                    }
                    close_element(element, &mut stack, &mut root)?;
                }
            }
            Event::Text(ref t) => {
                let raw = std::str::from_utf8(t.as_ref())?;
                append_text(&mut stack, &unescape(raw)?);
            }
            Event::CData(ref t) => {
                append_text(&mut stack, std::str::from_utf8(t.as_ref())?);
            }
            Event::GeneralRef(ref r) => {
                let name = std::str::from_utf8(r.as_ref())?;
                let reference = format!("&{name};");
                append_text(&mut stack, &unescape(&reference)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or_else(|| ParseError::InvalidStructure {
        message: "document has no root element".to_string(),
    })
}

fn start_line(xml: &str, end: usize, lines: &LineIndex) -> usize {
    let end = end.min(xml.len());
    let start = xml.as_bytes()[..end]
        .iter()
        .rposition(|b| *b == b'<')
        .unwrap_or(0);
    lines.line_of(start)
}

fn open_element(
    resolver: &NamespaceResolver,
    e: &BytesStart<'_>,
    line: usize,
) -> Result<Element, ParseError> {
    let mut namespaces = Vec::new();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ParseError::Syntax {
            line,
            message: err.to_string(),
        })?;
        let value = unescape(std::str::from_utf8(&attr.value)?)?.into_owned();
        match attr.key.as_namespace_binding() {
            Some(PrefixDeclaration::Default) => namespaces.push((None, value)),
            Some(PrefixDeclaration::Named(prefix)) => {
                namespaces.push((Some(std::str::from_utf8(prefix)?.to_string()), value));
            }
            None => {
                let (namespace, local) = resolver.resolve_attribute(attr.key);
                attributes.push((clark_name(namespace, local)?, value));
            }
        }
    }

    let (namespace, local) = resolver.resolve_element(e.name());
    Ok(Element {
        tag: clark_name(namespace, local)?,
        attributes,
        children: Vec::new(),
        text: None,
        line: Some(line),
        namespaces,
    })
}

fn clark_name(namespace: ResolveResult<'_>, local: LocalName<'_>) -> Result<String, ParseError> {
    let local = std::str::from_utf8(local.into_inner())?;
    match namespace {
        ResolveResult::Bound(uri) => {
            let uri = unescape(std::str::from_utf8(uri.into_inner())?)?;
            Ok(ns(local, &uri))
        }
        ResolveResult::Unbound => Ok(local.to_string()),
        ResolveResult::Unknown(prefix) => Err(ParseError::InvalidStructure {
            message: format!(
                "namespace prefix '{}' is not declared",
                String::from_utf8_lossy(&prefix)
            ),
        }),
    }
}

fn close_element(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(ParseError::InvalidStructure {
                message: "document has more than one root element".to_string(),
            });
        }
    }
    Ok(())
}

fn append_text(stack: &mut [Element], text: &str) {
    let Some(element) = stack.last_mut() else {
        return;
    };
    if element.children.is_empty() {
        element.text.get_or_insert_with(String::new).push_str(text);
    } else if !text.trim().is_empty() {
        tracing::warn!(
            "Ignoring text {:?} after a child of <{}>",
            text.trim(),
            element.local_name()
        );
    }
}

type Scope = Vec<(Option<String>, String)>;

/// Serializes an element tree.
///
/// With `pretty`, elements with children are indented by two spaces per
/// level; text content is never altered.
///
/// # Errors
/// Returns an error if a namespaced name has no declared prefix in scope.
pub fn write_document(root: &Element, pretty: bool) -> Result<String, ParseError> {
    let mut writer = Writer::new(Vec::new());
    let mut scopes = Vec::new();
    write_element(&mut writer, root, &mut scopes, 0, pretty)?;
    let bytes = writer.into_inner();
    Ok(String::from_utf8(bytes).map_err(|e| e.utf8_error())?)
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    element: &Element,
    scopes: &mut Vec<Scope>,
    level: usize,
    pretty: bool,
) -> Result<(), ParseError> {
    scopes.push(element.namespaces.clone());
    let name = prefixed(&element.tag, scopes, true)?;
    let mut start = BytesStart::new(name.as_str());
    for (prefix, uri) in &element.namespaces {
        let key = match prefix {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        let value = escape_attribute(uri);
        start.push_attribute(Attribute::from((key.as_bytes(), value.as_bytes())));
    }
    for (key, value) in &element.attributes {
        let key = prefixed(key, scopes, false)?;
        let value = escape_attribute(value);
        start.push_attribute(Attribute::from((key.as_bytes(), value.as_bytes())));
    }

    if element.children.is_empty() && element.text.is_none() {
        writer.write_event(Event::Empty(start))?;
        scopes.pop();
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    let blank = element.text.as_deref().is_none_or(|t| t.trim().is_empty());
    let indent_children = pretty && !element.children.is_empty() && blank;
    if indent_children {
        write_indent(writer, level + 1)?;
    } else if let Some(text) = &element.text {
        writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
    }
    let count = element.children.len();
    for (index, child) in element.children.iter().enumerate() {
        write_element(writer, child, scopes, level + 1, pretty)?;
        if indent_children {
            let next_level = if index + 1 == count { level } else { level + 1 };
            write_indent(writer, next_level)?;
        }
    }
    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
    scopes.pop();
    Ok(())
}

fn write_indent(writer: &mut Writer<Vec<u8>>, level: usize) -> Result<(), ParseError> {
    let indent = format!("\n{}", "  ".repeat(level));
    writer.write_event(Event::Text(BytesText::from_escaped(indent)))?;
    Ok(())
}

fn escape_attribute(value: &str) -> String {
    partial_escape(value)
        .replace('"', "&quot;")
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
        .replace('\t', "&#9;")
}

fn prefixed(name: &str, scopes: &[Scope], is_element: bool) -> Result<String, ParseError> {
    let Some(namespace) = namespace_of(name) else {
        return Ok(name.to_string());
    };
    let local = local_name(name);
    if namespace == XML_RESERVED_NAMESPACE {
        return Ok(format!("xml:{local}"));
    }
    let default = scopes
        .iter()
        .rev()
        .flat_map(|scope| scope.iter().rev())
        .find(|(prefix, _)| prefix.is_none())
        .map(|(_, uri)| uri.as_str());
    if is_element && default == Some(namespace) {
        return Ok(local.to_string());
    }
    let prefix = scopes
        .iter()
        .rev()
        .flat_map(|scope| scope.iter().rev())
        .find_map(|(prefix, uri)| match prefix {
            Some(prefix) if uri == namespace => Some(prefix.as_str()),
            _ => None,
        });
    match prefix {
        Some(prefix) => Ok(format!("{prefix}:{local}")),
        None => Err(ParseError::InvalidStructure {
            message: format!("no prefix declared for namespace '{namespace}'"),
        }),
    }
}
