// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Property-set encoders: turn locally changed properties into XML to send.

use std::fmt;

use crate::names::{
    ADDRESSBOOK_DESCRIPTION, CALENDAR_AVAILABILITY, CALENDAR_COLOR, CALENDAR_DESCRIPTION,
    CALENDAR_ENABLED, CALENDAR_ORDER, CALENDAR_TIMEZONE, COMP, DISPLAYNAME, ENABLED, OPAQUE,
    QualifiedName, SCHEDULE_CALENDAR_TRANSP, SCHEDULE_DEFAULT_CALENDAR_URL,
    SUPPORTED_CALENDAR_COMPONENT_SET, TRANSPARENT,
};
use crate::property::PropertyValue;
use crate::xml::XmlNode;

/// Serializes the properties it knows about.
///
/// Every encoder sees every changed property and contributes elements only
/// for the names it handles; the rest are ignored.
pub trait PropertyEncoder: fmt::Debug + Send + Sync {
    /// Encodes one property, or returns `None` if `name` is not handled here.
    fn encode(&self, name: &QualifiedName, value: &PropertyValue) -> Option<XmlNode>;

    /// Encodes every handled property of `props`, preserving order.
    fn encode_all(&self, props: &[(QualifiedName, PropertyValue)]) -> Vec<XmlNode> {
        props
            .iter()
            .filter_map(|(name, value)| self.encode(name, value))
            .collect()
    }
}

/// Runs `props` through every encoder and concatenates the results.
#[must_use]
pub fn encode_with(
    encoders: &[&dyn PropertyEncoder],
    props: &[(QualifiedName, PropertyValue)],
) -> Vec<XmlNode> {
    encoders
        .iter()
        .flat_map(|encoder| encoder.encode_all(props))
        .collect()
}

/// DAV core: `displayname`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DavPropSet;

impl PropertyEncoder for DavPropSet {
    fn encode(&self, name: &QualifiedName, value: &PropertyValue) -> Option<XmlNode> {
        (name == &DISPLAYNAME).then(|| scalar(name, value))
    }
}

/// Calendar collection properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarPropSet;

impl PropertyEncoder for CalendarPropSet {
    fn encode(&self, name: &QualifiedName, value: &PropertyValue) -> Option<XmlNode> {
        if name == &SCHEDULE_CALENDAR_TRANSP {
            let marker = match value.as_text() {
                Some("transparent") => TRANSPARENT,
                _ => OPAQUE,
            };
            return Some(XmlNode::new(name.clone()).with_child(XmlNode::new(marker)));
        }

        if name == &SUPPORTED_CALENDAR_COMPONENT_SET {
            let comps = value
                .as_list()
                .unwrap_or_default()
                .iter()
                .map(|comp| XmlNode::new(COMP).with_attribute("name", comp.as_str()));
            return Some(XmlNode::new(name.clone()).with_children(comps));
        }

        [
            CALENDAR_COLOR,
            CALENDAR_ORDER,
            CALENDAR_ENABLED,
            CALENDAR_DESCRIPTION,
            CALENDAR_TIMEZONE,
        ]
        .contains(name)
        .then(|| scalar(name, value))
    }
}

/// Address book properties.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressBookPropSet;

impl PropertyEncoder for AddressBookPropSet {
    fn encode(&self, name: &QualifiedName, value: &PropertyValue) -> Option<XmlNode> {
        [ADDRESSBOOK_DESCRIPTION, ENABLED]
            .contains(name)
            .then(|| scalar(name, value))
    }
}

/// Scheduling properties of principals and schedule inboxes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulingPropSet;

impl PropertyEncoder for SchedulingPropSet {
    fn encode(&self, name: &QualifiedName, value: &PropertyValue) -> Option<XmlNode> {
        if name == &SCHEDULE_DEFAULT_CALENDAR_URL {
            let href = value.as_text().unwrap_or_default();
            return Some(XmlNode::href(name.clone(), href));
        }

        (name == &CALENDAR_AVAILABILITY).then(|| scalar(name, value))
    }
}

/// Renders a value as the content of `name`.
fn scalar(name: &QualifiedName, value: &PropertyValue) -> XmlNode {
    match value {
        PropertyValue::Text(text) => XmlNode::text(name.clone(), text.as_str()),
        PropertyValue::Href(href) => XmlNode::href(name.clone(), href.as_str()),
        PropertyValue::Integer(i) => XmlNode::text(name.clone(), i.to_string()),
        PropertyValue::Bool(b) => XmlNode::text(name.clone(), if *b { "1" } else { "0" }),
        PropertyValue::List(items) => XmlNode::text(name.clone(), items.join(",")),
        PropertyValue::Empty | PropertyValue::Map(_) | PropertyValue::Records(_) => {
            XmlNode::new(name.clone())
        }
    }
}
