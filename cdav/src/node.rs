// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! State shared by every node of the DAV tree.

use reqwest::header::HeaderMap;

use crate::encode::{PropertyEncoder, encode_with};
use crate::error::DavError;
use crate::names::{DISPLAYNAME, GETETAG, QualifiedName};
use crate::property::{PropertyDescriptor, PropertyMap, PropertyValue};
use crate::request;
use crate::transport::Transport;
use crate::types::{ETag, Href};

/// Properties, location and local changes of one DAV resource.
///
/// Which properties are reachable by member name is decided by the node
/// kind's descriptor table.
#[derive(Debug, Clone, PartialEq)]
pub struct DavNode {
    parent: Option<Href>,
    url: Href,
    props: PropertyMap,
    dirty: Vec<QualifiedName>,
    descriptors: &'static [PropertyDescriptor],
}

impl DavNode {
    /// Creates a clean node.
    #[must_use]
    pub fn new(
        parent: Option<Href>,
        url: Href,
        props: PropertyMap,
        descriptors: &'static [PropertyDescriptor],
    ) -> Self {
        Self {
            parent,
            url,
            props,
            dirty: Vec::new(),
            descriptors,
        }
    }

    /// URL of the enclosing collection, for upward lookups.
    #[must_use]
    pub const fn parent(&self) -> Option<&Href> {
        self.parent.as_ref()
    }

    /// Path of this node. Collections always end in `/`.
    #[must_use]
    pub const fn url(&self) -> &Href {
        &self.url
    }

    pub(crate) fn relocate(&mut self, parent: Option<Href>, url: Href) {
        self.parent = parent;
        self.url = url;
    }

    /// Current properties.
    #[must_use]
    pub const fn props(&self) -> &PropertyMap {
        &self.props
    }

    /// Replaces every property, e.g. after a refresh.
    ///
    /// Pending local changes are kept in the dirty set but their values are
    /// those of the new map.
    pub fn replace_props(&mut self, props: PropertyMap) {
        self.props = props;
    }

    /// Stores a server-provided value without marking it dirty.
    pub(crate) fn store(&mut self, name: QualifiedName, value: PropertyValue) {
        self.props.insert(name, value);
    }

    /// Raw property lookup by qualified name.
    #[must_use]
    pub fn property(&self, name: &QualifiedName) -> Option<&PropertyValue> {
        self.props.get(name)
    }

    /// Text of a property, ignoring empty values.
    #[must_use]
    pub fn text(&self, name: &QualifiedName) -> Option<&str> {
        self.property(name)
            .and_then(PropertyValue::as_text)
            .filter(|s| !s.is_empty())
    }

    /// Properties reachable by member name.
    #[must_use]
    pub const fn descriptors(&self) -> &'static [PropertyDescriptor] {
        self.descriptors
    }

    fn descriptor(&self, member: &str) -> Result<&'static PropertyDescriptor, DavError> {
        self.descriptors
            .iter()
            .find(|d| d.member == member)
            .ok_or_else(|| DavError::UnknownProperty(member.to_string()))
    }

    /// Reads a property by member name.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::UnknownProperty`] if the kind does not expose `member`.
    pub fn get(&self, member: &str) -> Result<Option<&PropertyValue>, DavError> {
        let descriptor = self.descriptor(member)?;
        Ok(self.props.get(&descriptor.name))
    }

    /// Writes a property by member name and marks it dirty.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::UnknownProperty`] if the kind does not expose
    /// `member` and [`DavError::ReadOnlyProperty`] if it is not writable.
    pub fn set(&mut self, member: &str, value: impl Into<PropertyValue>) -> Result<(), DavError> {
        let descriptor = self.descriptor(member)?;
        if !descriptor.mutable {
            return Err(DavError::ReadOnlyProperty(member.to_string()));
        }

        self.props.insert(descriptor.name.clone(), value.into());
        if !self.dirty.contains(&descriptor.name) {
            self.dirty.push(descriptor.name.clone());
        }
        Ok(())
    }

    /// Locally changed properties, in first-change order.
    #[must_use]
    pub fn dirty(&self) -> &[QualifiedName] {
        &self.dirty
    }

    /// Whether any property changed since the last successful update.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Current values of the dirty properties.
    #[must_use]
    pub fn dirty_values(&self) -> Vec<(QualifiedName, PropertyValue)> {
        self.dirty
            .iter()
            .map(|name| {
                let value = self.props.get(name).cloned().unwrap_or(PropertyValue::Empty);
                (name.clone(), value)
            })
            .collect()
    }

    /// Sends the dirty properties as one PROPPATCH.
    ///
    /// Does nothing when clean. On success the dirty set is cleared without
    /// inspecting per-property results.
    pub(crate) async fn update(
        &mut self,
        transport: &Transport,
        encoders: &[&dyn PropertyEncoder],
    ) -> Result<(), DavError> {
        if !self.is_dirty() {
            return Ok(());
        }

        let nodes = encode_with(encoders, &self.dirty_values());
        tracing::debug!(url = %self.url, dirty = self.dirty.len(), encoded = nodes.len(), "updating properties");
        let body = request::proppatch(nodes)?;
        transport
            .proppatch(self.url.as_str(), HeaderMap::new(), body)
            .await?;
        self.dirty.clear();
        Ok(())
    }

    /// `displayname`.
    #[must_use]
    pub fn displayname(&self) -> Option<&str> {
        self.text(&DISPLAYNAME)
    }

    /// `getetag`.
    #[must_use]
    pub fn etag(&self) -> Option<ETag> {
        self.text(&GETETAG).map(ETag::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::{CALENDAR_COLOR, GETCTAG};

    static DESCRIPTORS: &[PropertyDescriptor] = &[
        PropertyDescriptor::mutable("displayname", DISPLAYNAME),
        PropertyDescriptor::mutable("color", CALENDAR_COLOR),
        PropertyDescriptor::read_only("ctag", GETCTAG),
    ];

    fn node() -> DavNode {
        let mut props = PropertyMap::new();
        props.insert(GETCTAG, "1".into());
        DavNode::new(None, Href::from("/cal/work/"), props, DESCRIPTORS)
    }

    #[test]
    fn node_set_marks_dirty_once() {
        let mut node = node();
        node.set("color", "#ff0000").unwrap();
        node.set("color", "#00ff00").unwrap();
        node.set("displayname", "Work").unwrap();

        assert_eq!(node.dirty(), &[CALENDAR_COLOR, DISPLAYNAME]);
        assert_eq!(node.get("color").unwrap(), Some(&PropertyValue::from("#00ff00")));
        assert_eq!(node.displayname(), Some("Work"));
    }

    #[test]
    fn node_rejects_read_only_and_unknown_members() {
        let mut node = node();
        assert!(matches!(
            node.set("ctag", "2"),
            Err(DavError::ReadOnlyProperty(member)) if member == "ctag"
        ));
        assert!(matches!(
            node.set("nickname", "x"),
            Err(DavError::UnknownProperty(_))
        ));
        assert!(matches!(node.get("nickname"), Err(DavError::UnknownProperty(_))));
        assert!(!node.is_dirty());
        assert_eq!(node.get("ctag").unwrap(), Some(&PropertyValue::from("1")));
    }
}
