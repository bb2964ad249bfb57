// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Property decoders: turn a `<prop>` child element into a [`PropertyValue`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::dom::Element;
use crate::names::{
    ACCESS, ADDRESS_DATA, ADDRESSBOOK_DESCRIPTION, ADDRESSBOOK_HOME_SET, CALENDAR_AVAILABILITY,
    CALENDAR_COLOR, CALENDAR_DATA, CALENDAR_DESCRIPTION, CALENDAR_ENABLED, CALENDAR_HOME_SET,
    CALENDAR_ORDER, CALENDAR_TIMEZONE, CALENDAR_USER_ADDRESS_SET, CALENDAR_USER_TYPE,
    COMMON_NAME, COMP, CURRENT_USER_PRINCIPAL, CURRENT_USER_PRIVILEGE_SET, DISPLAYNAME,
    EMAIL_ADDRESS, EMAIL_ADDRESS_SET, ENABLED, GETCONTENTLENGTH, GETCONTENTTYPE, GETCTAG,
    GETETAG, GETLASTMODIFIED, HREF, INVITE, OWNER, PRINCIPAL_COLLECTION_SET, PRINCIPAL_URL,
    PRIVILEGE, PUBLISH_URL, QUOTA_AVAILABLE_BYTES, QUOTA_USED_BYTES, QualifiedName, READ_ONLY,
    RESOURCETYPE, SCHEDULE_CALENDAR_TRANSP, SCHEDULE_DEFAULT_CALENDAR_URL, SCHEDULE_INBOX_URL,
    SCHEDULE_OUTBOX_URL, SOURCE, SUPPORTED_CALENDAR_COMPONENT_SET, SYNC_TOKEN, USER,
};
use crate::property::PropertyValue;

/// Decodes one property element. `None` means the element is dropped.
pub type DecodeFn = fn(&Element) -> Option<PropertyValue>;

/// Registry of property decoders keyed by qualified name.
///
/// Properties without a registered decoder are skipped by the multi-status
/// reducer, so new server-side properties never break parsing.
#[derive(Clone)]
pub struct Decoders {
    decoders: HashMap<QualifiedName, DecodeFn>,
}

impl Decoders {
    /// A registry with no decoders.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Registers `decoder` for `name`, replacing any previous one.
    pub fn register(&mut self, name: QualifiedName, decoder: DecodeFn) -> &mut Self {
        self.decoders.insert(name, decoder);
        self
    }

    /// Whether a decoder accepts `name`.
    #[must_use]
    pub fn accepts(&self, name: &QualifiedName) -> bool {
        self.decoders.contains_key(name)
    }

    /// Decodes `element` with the decoder registered for its name.
    #[must_use]
    pub fn decode(&self, element: &Element) -> Option<PropertyValue> {
        self.decoders
            .get(&element.name)
            .and_then(|decode| decode(element))
    }
}

impl Default for Decoders {
    /// DAV, `CalDAV`, `CardDAV`, `CalendarServer`, Apple and ownCloud properties.
    fn default() -> Self {
        let mut decoders = Self::empty();
        decoders
            .register(DISPLAYNAME, text)
            .register(GETCONTENTTYPE, text)
            .register(GETETAG, text)
            .register(GETLASTMODIFIED, http_date)
            .register(GETCONTENTLENGTH, integer)
            .register(RESOURCETYPE, resource_type)
            .register(OWNER, href)
            .register(SYNC_TOKEN, text)
            .register(CURRENT_USER_PRINCIPAL, href)
            .register(CURRENT_USER_PRIVILEGE_SET, privilege_set)
            .register(PRINCIPAL_URL, href)
            .register(PRINCIPAL_COLLECTION_SET, href_list)
            .register(QUOTA_AVAILABLE_BYTES, integer)
            .register(QUOTA_USED_BYTES, integer)
            // CalDAV
            .register(CALENDAR_HOME_SET, href_list)
            .register(CALENDAR_DATA, raw_text)
            .register(CALENDAR_DESCRIPTION, text)
            .register(CALENDAR_TIMEZONE, raw_text)
            .register(SUPPORTED_CALENDAR_COMPONENT_SET, component_set)
            .register(SCHEDULE_CALENDAR_TRANSP, transparency)
            .register(SCHEDULE_INBOX_URL, href)
            .register(SCHEDULE_OUTBOX_URL, href)
            .register(SCHEDULE_DEFAULT_CALENDAR_URL, href)
            .register(CALENDAR_USER_ADDRESS_SET, href_list)
            .register(CALENDAR_USER_TYPE, text)
            .register(CALENDAR_AVAILABILITY, raw_text)
            // CardDAV
            .register(ADDRESSBOOK_HOME_SET, href_list)
            .register(ADDRESS_DATA, raw_text)
            .register(ADDRESSBOOK_DESCRIPTION, text)
            // CalendarServer
            .register(GETCTAG, text)
            .register(SOURCE, href)
            .register(PUBLISH_URL, href)
            .register(EMAIL_ADDRESS_SET, email_address_set)
            // Apple
            .register(CALENDAR_COLOR, text)
            .register(CALENDAR_ORDER, integer)
            // ownCloud
            .register(CALENDAR_ENABLED, boolean)
            .register(ENABLED, boolean)
            .register(READ_ONLY, boolean)
            .register(INVITE, invite);
        decoders
    }
}

impl fmt::Debug for Decoders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.decoders.keys().map(ToString::to_string).collect();
        names.sort();
        f.debug_struct("Decoders").field("names", &names).finish()
    }
}

/// Trimmed text; empty elements decode to [`PropertyValue::Empty`].
#[must_use]
pub fn text(element: &Element) -> Option<PropertyValue> {
    let text = element.text();
    Some(if text.is_empty() {
        PropertyValue::Empty
    } else {
        PropertyValue::Text(text.to_string())
    })
}

/// Untrimmed text, for payloads such as `calendar-data` whose line endings matter.
#[must_use]
pub fn raw_text(element: &Element) -> Option<PropertyValue> {
    Some(if element.text().is_empty() {
        PropertyValue::Empty
    } else {
        PropertyValue::Text(element.raw_text().to_string())
    })
}

/// Integer text; non-numeric content is kept as text.
#[must_use]
pub fn integer(element: &Element) -> Option<PropertyValue> {
    match element.text().parse::<i64>() {
        Ok(i) => Some(PropertyValue::Integer(i)),
        Err(_) => text(element),
    }
}

/// `1`/`true` flags.
#[must_use]
pub fn boolean(element: &Element) -> Option<PropertyValue> {
    let value = element.text();
    Some(PropertyValue::Bool(
        value == "1" || value.eq_ignore_ascii_case("true"),
    ))
}

/// RFC 2822 HTTP date, normalized to an RFC 3339 timestamp.
#[must_use]
pub fn http_date(element: &Element) -> Option<PropertyValue> {
    match jiff::fmt::rfc2822::parse(element.text()) {
        Ok(zoned) => Some(PropertyValue::Text(zoned.timestamp().to_string())),
        Err(err) => {
            tracing::debug!(value = element.text(), %err, "keeping unparsable HTTP date as text");
            text(element)
        }
    }
}

/// Child element names in `{ns}local` form, in document order.
#[must_use]
pub fn resource_type(element: &Element) -> Option<PropertyValue> {
    Some(PropertyValue::List(
        element.children.iter().map(|c| c.name.to_string()).collect(),
    ))
}

/// The first nested `<DAV:href>`; other content (e.g. `<unauthenticated/>`) is empty.
#[must_use]
pub fn href(element: &Element) -> Option<PropertyValue> {
    Some(match element.child(&HREF) {
        Some(href) => PropertyValue::Href(href.text().to_string()),
        None => PropertyValue::Empty,
    })
}

/// Every nested `<DAV:href>`.
#[must_use]
pub fn href_list(element: &Element) -> Option<PropertyValue> {
    Some(PropertyValue::List(
        element
            .children_named(&HREF)
            .map(|href| href.text().to_string())
            .collect(),
    ))
}

fn privilege_set(element: &Element) -> Option<PropertyValue> {
    Some(PropertyValue::List(
        element
            .children_named(&PRIVILEGE)
            .flat_map(|privilege| privilege.children.iter())
            .map(|p| p.name.to_string())
            .collect(),
    ))
}

fn component_set(element: &Element) -> Option<PropertyValue> {
    Some(PropertyValue::List(
        element
            .children_named(&COMP)
            .filter_map(|comp| comp.attribute("name"))
            .map(str::to_string)
            .collect(),
    ))
}

fn transparency(element: &Element) -> Option<PropertyValue> {
    element
        .children
        .first()
        .map(|c| PropertyValue::Text(c.name.local_name().to_string()))
}

fn email_address_set(element: &Element) -> Option<PropertyValue> {
    Some(PropertyValue::List(
        element
            .children_named(&EMAIL_ADDRESS)
            .map(|e| e.text().to_string())
            .collect(),
    ))
}

/// ownCloud `invite`: one record per sharee with `href`, `common-name` and `access`.
fn invite(element: &Element) -> Option<PropertyValue> {
    let records = element
        .children_named(&USER)
        .map(|user| {
            let mut record = BTreeMap::new();
            if let Some(href) = user.child(&HREF) {
                record.insert("href".to_string(), PropertyValue::Text(href.text().to_string()));
            }
            if let Some(name) = user.child(&COMMON_NAME) {
                record.insert(
                    "common-name".to_string(),
                    PropertyValue::Text(name.text().to_string()),
                );
            }
            if let Some(access) = user.child(&ACCESS).and_then(|a| a.children.first()) {
                record.insert(
                    "access".to_string(),
                    PropertyValue::Text(access.name.local_name().to_string()),
                );
            }
            record
        })
        .collect();
    Some(PropertyValue::Records(records))
}
