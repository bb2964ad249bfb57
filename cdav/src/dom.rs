// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Namespace-resolved element trees for response bodies.

use quick_xml::NsReader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;

use crate::error::DavError;
use crate::names::QualifiedName;

/// A parsed XML element with its namespace resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Resolved element name. Unbound elements have an empty namespace.
    pub name: QualifiedName,
    /// Unescaped attributes, excluding namespace declarations.
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<Element>,
    text: String,
}

impl Element {
    /// Concatenated direct text content, trimmed.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Concatenated direct text content exactly as received.
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.text
    }

    /// First child with the given name.
    #[must_use]
    pub fn child(&self, name: &QualifiedName) -> Option<&Self> {
        self.children.iter().find(|c| &c.name == name)
    }

    /// All children with the given name.
    pub fn children_named<'a>(
        &'a self,
        name: &'a QualifiedName,
    ) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |c| &c.name == name)
    }

    /// Value of the attribute with the given (unprefixed) key.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Parses a document and returns its root element.
///
/// # Errors
///
/// Returns an error if the XML is malformed or has no root element.
pub fn parse_document(xml: &str) -> Result<Element, DavError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().check_end_names = true;

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_resolved_event()? {
            (ns, Event::Start(e)) => stack.push(open_element(&ns, &e)?),
            (ns, Event::Empty(e)) => {
                let element = open_element(&ns, &e)?;
                close_element(&mut stack, &mut root, element);
            }
            (_, Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| DavError::Xml("Unbalanced end tag".to_string()))?;
                close_element(&mut stack, &mut root, element);
            }
            (_, Event::Text(text)) => {
                if let Some(current) = stack.last_mut() {
                    let text = text.decode().map_err(|e| DavError::Xml(e.to_string()))?;
                    current.text.push_str(&text);
                }
            }
            (_, Event::CData(data)) => {
                if let Some(current) = stack.last_mut() {
                    let data = std::str::from_utf8(&data)
                        .map_err(|e| DavError::Xml(format!("UTF-8 error: {e}")))?;
                    current.text.push_str(data);
                }
            }
            (_, Event::GeneralRef(reference)) => {
                if let Some(current) = stack.last_mut() {
                    let name = std::str::from_utf8(&reference)
                        .map_err(|e| DavError::Xml(format!("UTF-8 error: {e}")))?;
                    current.text.push_str(&resolve_reference(name)?);
                }
            }
            (_, Event::Eof) => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(DavError::Xml("Unexpected EOF".to_string()));
    }
    root.ok_or_else(|| DavError::Xml("Document has no root element".to_string()))
}

fn open_element(ns: &ResolveResult<'_>, e: &BytesStart<'_>) -> Result<Element, DavError> {
    let namespace = match ns {
        ResolveResult::Bound(namespace) => std::str::from_utf8(namespace.as_ref())
            .map_err(|e| DavError::Xml(format!("UTF-8 error: {e}")))?
            .to_string(),
        ResolveResult::Unbound => String::new(),
        ResolveResult::Unknown(prefix) => {
            return Err(DavError::Xml(format!(
                "Undeclared namespace prefix: {}",
                String::from_utf8_lossy(prefix)
            )));
        }
    };
    let local_name = std::str::from_utf8(e.local_name().into_inner())
        .map_err(|e| DavError::Xml(format!("UTF-8 error: {e}")))?
        .to_string();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| DavError::Xml(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| DavError::Xml(format!("UTF-8 error: {e}")))?;
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|e| DavError::Xml(e.to_string()))?;
        attributes.push((key.to_string(), value.into_owned()));
    }

    Ok(Element {
        name: QualifiedName::new(namespace, local_name),
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

fn close_element(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

/// Resolves a character or predefined entity reference such as `#13` or `amp`.
fn resolve_reference(name: &str) -> Result<String, DavError> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => number.parse(),
        }
        .map_err(|e| DavError::Xml(format!("Invalid character reference &{name};: {e}")))?;
        return char::from_u32(code)
            .map(String::from)
            .ok_or_else(|| DavError::Xml(format!("Invalid character reference &{name};")));
    }
    resolve_predefined_entity(name)
        .map(str::to_string)
        .ok_or_else(|| DavError::Xml(format!("Unknown entity &{name};")))
}
