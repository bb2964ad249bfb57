// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Generic XML element trees for request bodies and their serialization.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::DavError;
use crate::names::{HREF, QualifiedName, ns};

/// Scalar content of an [`XmlNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlValue {
    /// Escaped and rendered as the element's text.
    Text(String),
    /// Rendered as a nested `<DAV:href>` element.
    Href(String),
}

/// An element of a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    /// Element name.
    pub name: QualifiedName,
    /// Non-namespace attributes, in order.
    pub attributes: Vec<(String, String)>,
    /// Child elements, in order.
    pub children: Vec<XmlNode>,
    /// Scalar content. When present it is the element's sole content.
    pub value: Option<XmlValue>,
}

impl XmlNode {
    /// Creates an empty element.
    #[must_use]
    pub const fn new(name: QualifiedName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
            value: None,
        }
    }

    /// Creates an element with text content.
    #[must_use]
    pub fn text(name: QualifiedName, text: impl Into<String>) -> Self {
        Self {
            value: Some(XmlValue::Text(text.into())),
            ..Self::new(name)
        }
    }

    /// Creates an element referencing another resource through `<DAV:href>`.
    #[must_use]
    pub fn href(name: QualifiedName, href: impl Into<String>) -> Self {
        Self {
            value: Some(XmlValue::Href(href.into())),
            ..Self::new(name)
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Appends a child element.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Appends several child elements.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    /// Serializes this element as a complete XML document.
    ///
    /// # Errors
    ///
    /// Returns an error if XML writing fails.
    pub fn to_xml(&self) -> Result<String, DavError> {
        serialize(self)
    }
}

/// A root element with a chain of single nested elements.
///
/// Each level exposes its children list so callers can splice in dynamic
/// content, e.g. `Skeleton::new(PROPFIND, &[PROP])` and then push the
/// requested properties into level 1. The nested element of each level is
/// placed before anything pushed by the caller.
#[derive(Debug, Clone)]
pub struct Skeleton {
    root: XmlNode,
    nested: Vec<XmlNode>,
}

impl Skeleton {
    /// Builds `root` → `nested[0]` → `nested[1]` → …
    #[must_use]
    pub fn new(root: QualifiedName, nested: &[QualifiedName]) -> Self {
        Self {
            root: XmlNode::new(root),
            nested: nested.iter().cloned().map(XmlNode::new).collect(),
        }
    }

    /// Children list of the element at `level` (0 is the root).
    pub fn children_mut(&mut self, level: usize) -> Option<&mut Vec<XmlNode>> {
        match level {
            0 => Some(&mut self.root.children),
            _ => self
                .nested
                .get_mut(level - 1)
                .map(|node| &mut node.children),
        }
    }

    /// Children list of the innermost element.
    pub fn innermost_mut(&mut self) -> &mut Vec<XmlNode> {
        &mut self.nested.last_mut().unwrap_or(&mut self.root).children
    }

    /// Assembles the chain into a single tree.
    #[must_use]
    pub fn into_root(self) -> XmlNode {
        let Self { mut root, mut nested } = self;
        let mut inner: Option<XmlNode> = None;
        while let Some(mut node) = nested.pop() {
            if let Some(child) = inner.take() {
                node.children.insert(0, child);
            }
            inner = Some(node);
        }
        if let Some(child) = inner {
            root.children.insert(0, child);
        }
        root
    }

    /// Assembles and serializes the skeleton.
    ///
    /// # Errors
    ///
    /// Returns an error if XML writing fails.
    pub fn to_xml(self) -> Result<String, DavError> {
        serialize(&self.into_root())
    }
}

/// Serializes an element tree to wire-format XML.
///
/// Prefixes are allocated per call in first-use (document) order and all
/// declarations are emitted on the root element.
///
/// # Errors
///
/// Returns an error if XML writing fails.
pub fn serialize(root: &XmlNode) -> Result<String, DavError> {
    let mut prefixes = PrefixAllocator::default();
    prefixes.collect(root);

    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_node(&mut writer, root, &prefixes, true)?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| DavError::Xml(format!("UTF-8 error: {e}")))
}

fn write_node<W: std::io::Write>(
    writer: &mut Writer<W>,
    node: &XmlNode,
    prefixes: &PrefixAllocator,
    is_root: bool,
) -> Result<(), DavError> {
    let tag = prefixes.tag(&node.name);
    let mut start = BytesStart::new(tag.clone());
    if is_root {
        for (namespace, prefix) in &prefixes.allocated {
            let key = format!("xmlns:{prefix}");
            start.push_attribute((key.as_str(), namespace.as_str()));
        }
    }
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    match &node.value {
        None if node.children.is_empty() => {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }
        None => {
            writer.write_event(Event::Start(start))?;
            for child in &node.children {
                write_node(writer, child, prefixes, false)?;
            }
        }
        Some(XmlValue::Text(text)) => {
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        Some(XmlValue::Href(href)) => {
            writer.write_event(Event::Start(start))?;
            let href_tag = prefixes.tag(&HREF);
            writer.write_event(Event::Start(BytesStart::new(href_tag.clone())))?;
            writer.write_event(Event::Text(BytesText::new(href)))?;
            writer.write_event(Event::End(BytesEnd::new(href_tag)))?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Namespace prefixes for a single serialization.
#[derive(Debug, Default)]
struct PrefixAllocator {
    /// `(namespace, prefix)` in first-use order.
    allocated: Vec<(String, String)>,
    unknown: usize,
}

impl PrefixAllocator {
    fn collect(&mut self, node: &XmlNode) {
        self.allocate(node.name.namespace());
        if matches!(node.value, Some(XmlValue::Href(_))) {
            self.allocate(HREF.namespace());
        }
        if node.value.is_none() {
            for child in &node.children {
                self.collect(child);
            }
        }
    }

    /// Names without a namespace are written unprefixed. No default namespace
    /// is ever declared, so a bare name stays unbound.
    fn allocate(&mut self, namespace: &str) {
        if namespace.is_empty() || self.prefix(namespace).is_some() {
            return;
        }
        let prefix = match namespace {
            ns::DAV => "d".to_string(),
            ns::CALDAV => "cal".to_string(),
            ns::CARDDAV => "card".to_string(),
            ns::CALENDARSERVER => "cs".to_string(),
            ns::APPLE => "aapl".to_string(),
            ns::OWNCLOUD => "oc".to_string(),
            ns::NEXTCLOUD => "nc".to_string(),
            _ => {
                let prefix = format!("x{}", self.unknown);
                self.unknown += 1;
                prefix
            }
        };
        self.allocated.push((namespace.to_string(), prefix));
    }

    fn prefix(&self, namespace: &str) -> Option<&str> {
        self.allocated
            .iter()
            .find(|(ns, _)| ns == namespace)
            .map(|(_, prefix)| prefix.as_str())
    }

    fn tag(&self, name: &QualifiedName) -> String {
        match self.prefix(name.namespace()) {
            Some(prefix) => format!("{prefix}:{}", name.local_name()),
            None => name.local_name().to_string(),
        }
    }
}
