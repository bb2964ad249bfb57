// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Property values and the descriptor tables node kinds expose them through.

use std::collections::{BTreeMap, HashMap};

use crate::names::QualifiedName;

/// Properties of one resource, keyed by qualified name.
pub type PropertyMap = HashMap<QualifiedName, PropertyValue>;

/// A decoded property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// The element was present but carried no content.
    Empty,
    /// Plain text.
    Text(String),
    /// Integer value, e.g. `getcontentlength` or `calendar-order`.
    Integer(i64),
    /// Boolean flag, e.g. ownCloud `calendar-enabled`.
    Bool(bool),
    /// Reference to another resource, serialized as a nested `<DAV:href>`.
    Href(String),
    /// Sequence of strings: resource types in `{ns}local` form, href sets,
    /// privileges or component names.
    List(Vec<String>),
    /// Nested structured value.
    Map(BTreeMap<String, PropertyValue>),
    /// Sequence of structured values, e.g. the sharees of a collection.
    Records(Vec<BTreeMap<String, PropertyValue>>),
}

impl PropertyValue {
    /// Text content of `Text` and `Href` values.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Href(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// String list. A single `Href` is viewed as a list of one.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            Self::Href(href) => Some(std::slice::from_ref(href)),
            _ => None,
        }
    }

    /// Whether the value carries no information.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) | Self::Href(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(map) => map.is_empty(),
            Self::Records(records) => records.is_empty(),
            Self::Integer(_) | Self::Bool(_) => false,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// A property exposed by a node kind under a member name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Member name callers use, e.g. `"displayname"` or `"color"`.
    pub member: &'static str,
    /// Wire name of the property.
    pub name: QualifiedName,
    /// Whether local writes are allowed.
    pub mutable: bool,
}

impl PropertyDescriptor {
    /// A writable property.
    #[must_use]
    pub const fn mutable(member: &'static str, name: QualifiedName) -> Self {
        Self {
            member,
            name,
            mutable: true,
        }
    }

    /// A read-only property.
    #[must_use]
    pub const fn read_only(member: &'static str, name: QualifiedName) -> Self {
        Self {
            member,
            name,
            mutable: false,
        }
    }
}
