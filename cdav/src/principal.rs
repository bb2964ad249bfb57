// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Principals: the users and groups owning calendars and address books.

use reqwest::header::HeaderMap;

use crate::encode::{DavPropSet, PropertyEncoder, SchedulingPropSet};
use crate::error::DavError;
use crate::names::{
    ADDRESSBOOK_HOME_SET, CALENDAR_AVAILABILITY, CALENDAR_HOME_SET, CALENDAR_USER_ADDRESS_SET, CALENDAR_USER_TYPE,
    DISPLAYNAME, EMAIL_ADDRESS_SET, PRINCIPAL_URL, QualifiedName, SCHEDULE_DEFAULT_CALENDAR_URL,
    SCHEDULE_INBOX_URL, SCHEDULE_OUTBOX_URL,
};
use crate::node::DavNode;
use crate::property::{PropertyDescriptor, PropertyValue};
use crate::transport::Transport;
use crate::types::{Depth, Href};

static PRINCIPAL: &[PropertyDescriptor] = &[
    PropertyDescriptor::mutable("displayname", DISPLAYNAME),
    PropertyDescriptor::read_only("calendar-user-type", CALENDAR_USER_TYPE),
    PropertyDescriptor::read_only("calendar-user-address-set", CALENDAR_USER_ADDRESS_SET),
    PropertyDescriptor::read_only("principal-url", PRINCIPAL_URL),
    PropertyDescriptor::read_only("calendar-home-set", CALENDAR_HOME_SET),
    PropertyDescriptor::read_only("addressbook-home-set", ADDRESSBOOK_HOME_SET),
    PropertyDescriptor::read_only("schedule-inbox", SCHEDULE_INBOX_URL),
    PropertyDescriptor::read_only("schedule-outbox", SCHEDULE_OUTBOX_URL),
    PropertyDescriptor::mutable("schedule-default-calendar", SCHEDULE_DEFAULT_CALENDAR_URL),
    PropertyDescriptor::mutable("availability", CALENDAR_AVAILABILITY),
    PropertyDescriptor::read_only("email-address-set", EMAIL_ADDRESS_SET),
];

const ENCODERS: &[&dyn PropertyEncoder] = &[&DavPropSet, &SchedulingPropSet];

/// A DAV principal.
#[derive(Debug, Clone)]
pub struct Principal {
    transport: Transport,
    node: DavNode,
}

impl Principal {
    /// Fetches the principal at `url`.
    ///
    /// # Errors
    ///
    /// Propagates transport errors; returns [`DavError::NotFound`] if the
    /// server has no entry for `url`.
    pub async fn fetch(transport: Transport, url: &str) -> Result<Self, DavError> {
        let url = Href::new(transport.pathname(url)?);
        tracing::debug!(url = %url, "fetching principal");

        let props = PRINCIPAL.iter().map(|d| d.name.clone()).collect::<Vec<QualifiedName>>();
        let props = transport
            .propfind(url.as_str(), &props, Depth::Zero, HeaderMap::new())
            .await?
            .body
            .into_properties()?;
        Ok(Self {
            node: DavNode::new(None, url, props, PRINCIPAL),
            transport,
        })
    }

    /// Discovers and fetches the authenticated user's principal from `url`.
    ///
    /// Returns `None` if the server does not advertise one.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn current(transport: Transport, url: &str) -> Result<Option<Self>, DavError> {
        match transport.current_user_principal(url).await? {
            Some(href) => Ok(Some(Self::fetch(transport, &href).await?)),
            None => Ok(None),
        }
    }

    /// Path of the principal.
    #[must_use]
    pub const fn url(&self) -> &Href {
        self.node.url()
    }

    /// Shared node state.
    #[must_use]
    pub const fn node(&self) -> &DavNode {
        &self.node
    }

    /// `displayname`.
    #[must_use]
    pub fn displayname(&self) -> Option<&str> {
        self.node.displayname()
    }

    /// Sets the display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor table rejects the write.
    pub fn set_displayname(&mut self, displayname: &str) -> Result<(), DavError> {
        self.node.set("displayname", displayname)
    }

    /// `calendar-user-type`, e.g. `INDIVIDUAL` or `ROOM`.
    #[must_use]
    pub fn calendar_user_type(&self) -> Option<&str> {
        self.node.text(&CALENDAR_USER_TYPE)
    }

    /// `calendar-user-address-set`, e.g. `mailto:` URIs.
    #[must_use]
    pub fn calendar_user_address_set(&self) -> &[String] {
        self.list(&CALENDAR_USER_ADDRESS_SET)
    }

    /// `principal-URL`.
    #[must_use]
    pub fn principal_url(&self) -> Option<&str> {
        self.node.text(&PRINCIPAL_URL)
    }

    /// `calendar-home-set`.
    #[must_use]
    pub fn calendar_home_set(&self) -> &[String] {
        self.list(&CALENDAR_HOME_SET)
    }

    /// `addressbook-home-set`.
    #[must_use]
    pub fn addressbook_home_set(&self) -> &[String] {
        self.list(&ADDRESSBOOK_HOME_SET)
    }

    /// `schedule-inbox-URL`.
    #[must_use]
    pub fn schedule_inbox(&self) -> Option<&str> {
        self.node.text(&SCHEDULE_INBOX_URL)
    }

    /// `schedule-outbox-URL`.
    #[must_use]
    pub fn schedule_outbox(&self) -> Option<&str> {
        self.node.text(&SCHEDULE_OUTBOX_URL)
    }

    /// Sets the calendar new invitations land in.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor table rejects the write.
    pub fn set_schedule_default_calendar(&mut self, href: &str) -> Result<(), DavError> {
        self.node.set(
            "schedule-default-calendar",
            PropertyValue::Href(href.to_string()),
        )
    }

    /// Primary email address: the first `email-address-set` entry, else the
    /// first `mailto:` calendar user address.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.list(&EMAIL_ADDRESS_SET)
            .first()
            .map(String::as_str)
            .or_else(|| {
                self.calendar_user_address_set().iter().find_map(|address| {
                    address
                        .get(..7)
                        .filter(|scheme| scheme.eq_ignore_ascii_case("mailto:"))
                        .and_then(|_| address.get(7..))
                })
            })
    }

    /// `calendar-availability` as a VAVAILABILITY text.
    #[must_use]
    pub fn availability(&self) -> Option<&str> {
        self.node.text(&CALENDAR_AVAILABILITY)
    }

    /// Sets the free/busy availability.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor table rejects the write.
    pub fn set_availability(&mut self, availability: &str) -> Result<(), DavError> {
        self.node.set("availability", availability)
    }

    fn list(&self, name: &QualifiedName) -> &[String] {
        self.node
            .property(name)
            .and_then(PropertyValue::as_list)
            .unwrap_or_default()
    }

    /// Sends changed properties as one PROPPATCH; does nothing when clean.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn update(&mut self) -> Result<(), DavError> {
        self.node.update(&self.transport, ENCODERS).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DavConfig;
    use crate::property::PropertyMap;

    fn principal(props: PropertyMap) -> Principal {
        let transport = Transport::new(DavConfig::new("https://dav.example.com/")).unwrap();
        Principal {
            transport,
            node: DavNode::new(None, Href::from("/principals/alice/"), props, PRINCIPAL),
        }
    }

    #[test]
    fn principal_email_prefers_email_address_set() {
        let mut props = PropertyMap::new();
        props.insert(
            EMAIL_ADDRESS_SET,
            PropertyValue::List(vec!["alice@example.com".to_string()]),
        );
        props.insert(
            CALENDAR_USER_ADDRESS_SET,
            PropertyValue::List(vec!["mailto:other@example.com".to_string()]),
        );
        assert_eq!(principal(props).email(), Some("alice@example.com"));
    }

    #[test]
    fn principal_email_falls_back_to_mailto_address() {
        let mut props = PropertyMap::new();
        props.insert(
            CALENDAR_USER_ADDRESS_SET,
            PropertyValue::List(vec![
                "/principals/alice/".to_string(),
                "MAILTO:alice@example.com".to_string(),
            ]),
        );
        let principal = principal(props);
        assert_eq!(principal.email(), Some("alice@example.com"));
        assert_eq!(principal.calendar_user_address_set().len(), 2);
        assert!(principal.calendar_home_set().is_empty());
    }

    #[test]
    fn principal_only_scheduling_properties_are_writable() {
        let mut principal = principal(PropertyMap::new());
        principal
            .set_schedule_default_calendar("/calendars/alice/personal/")
            .unwrap();
        principal.set_displayname("Alice").unwrap();
        assert!(matches!(
            principal.node.set("calendar-home-set", "/x/"),
            Err(DavError::ReadOnlyProperty(_))
        ));
        assert_eq!(
            principal.node().dirty(),
            &[SCHEDULE_DEFAULT_CALENDAR_URL, DISPLAYNAME]
        );
    }
}
