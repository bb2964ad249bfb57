// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! XML namespaces and the qualified names used on the wire.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// XML namespaces used by WebDAV, `CalDAV`, `CardDAV` and common server extensions.
pub mod ns {
    /// `WebDAV` namespace (RFC 4918).
    pub const DAV: &str = "DAV:";

    /// `CalDAV` namespace (RFC 4791).
    pub const CALDAV: &str = "urn:ietf:params:xml:ns:caldav";

    /// `CardDAV` namespace (RFC 6352).
    pub const CARDDAV: &str = "urn:ietf:params:xml:ns:carddav";

    /// `CalendarServer` extensions (ctag, publishing, subscriptions).
    pub const CALENDARSERVER: &str = "http://calendarserver.org/ns/";

    /// Apple iCal extensions (calendar color and order).
    pub const APPLE: &str = "http://apple.com/ns/ical/";

    /// ownCloud extensions (sharing, enabled flags).
    pub const OWNCLOUD: &str = "http://owncloud.org/ns";

    /// Nextcloud extensions.
    pub const NEXTCLOUD: &str = "http://nextcloud.com/ns";
}

/// A namespace-qualified XML name.
///
/// The canonical string form is `{namespace}localName`. Two names are equal
/// iff both components match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    namespace: Cow<'static, str>,
    local_name: Cow<'static, str>,
}

impl QualifiedName {
    /// Creates a name from static strings, usable in `const` items.
    #[must_use]
    pub const fn from_static(namespace: &'static str, local_name: &'static str) -> Self {
        Self {
            namespace: Cow::Borrowed(namespace),
            local_name: Cow::Borrowed(local_name),
        }
    }

    /// Creates a new qualified name.
    #[must_use]
    pub fn new(
        namespace: impl Into<Cow<'static, str>>,
        local_name: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }

    /// Returns the namespace URI.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the local name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local_name)
    }
}

impl FromStr for QualifiedName {
    type Err = String;

    /// Parses the `{namespace}localName` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('{')
            .ok_or_else(|| format!("missing namespace in qualified name: {s}"))?;
        let (namespace, local_name) = rest
            .split_once('}')
            .ok_or_else(|| format!("unterminated namespace in qualified name: {s}"))?;
        if local_name.is_empty() {
            return Err(format!("empty local name in qualified name: {s}"));
        }
        Ok(Self::new(namespace.to_string(), local_name.to_string()))
    }
}

macro_rules! names {
    ($($(#[$meta:meta])* $ident:ident = ($ns:expr, $local:literal);)*) => {
        $(
            $(#[$meta])*
            #[doc = concat!("The `", $local, "` element.")]
            pub const $ident: QualifiedName = QualifiedName::from_static($ns, $local);
        )*
    };
}

names! {
    // Multi-status and request structure.
    MULTISTATUS = (ns::DAV, "multistatus");
    RESPONSE = (ns::DAV, "response");
    HREF = (ns::DAV, "href");
    PROPSTAT = (ns::DAV, "propstat");
    PROP = (ns::DAV, "prop");
    STATUS = (ns::DAV, "status");
    PROPFIND = (ns::DAV, "propfind");
    PROPERTYUPDATE = (ns::DAV, "propertyupdate");
    SET = (ns::DAV, "set");
    REMOVE = (ns::DAV, "remove");
    MKCOL = (ns::DAV, "mkcol");

    // Resource types.
    COLLECTION = (ns::DAV, "collection");
    PRINCIPAL = (ns::DAV, "principal");
    CALENDAR = (ns::CALDAV, "calendar");
    SCHEDULE_INBOX = (ns::CALDAV, "schedule-inbox");
    SCHEDULE_OUTBOX = (ns::CALDAV, "schedule-outbox");
    SUBSCRIBED = (ns::CALENDARSERVER, "subscribed");
    ADDRESSBOOK = (ns::CARDDAV, "addressbook");

    // DAV core properties.
    DISPLAYNAME = (ns::DAV, "displayname");
    RESOURCETYPE = (ns::DAV, "resourcetype");
    GETCONTENTTYPE = (ns::DAV, "getcontenttype");
    GETCONTENTLENGTH = (ns::DAV, "getcontentlength");
    GETETAG = (ns::DAV, "getetag");
    GETLASTMODIFIED = (ns::DAV, "getlastmodified");
    OWNER = (ns::DAV, "owner");
    SYNC_TOKEN = (ns::DAV, "sync-token");
    CURRENT_USER_PRINCIPAL = (ns::DAV, "current-user-principal");
    CURRENT_USER_PRIVILEGE_SET = (ns::DAV, "current-user-privilege-set");
    PRIVILEGE = (ns::DAV, "privilege");
    PRINCIPAL_URL = (ns::DAV, "principal-URL");
    PRINCIPAL_COLLECTION_SET = (ns::DAV, "principal-collection-set");
    QUOTA_AVAILABLE_BYTES = (ns::DAV, "quota-available-bytes");
    QUOTA_USED_BYTES = (ns::DAV, "quota-used-bytes");

    // CalDAV.
    CALENDAR_HOME_SET = (ns::CALDAV, "calendar-home-set");
    CALENDAR_DATA = (ns::CALDAV, "calendar-data");
    CALENDAR_DESCRIPTION = (ns::CALDAV, "calendar-description");
    CALENDAR_TIMEZONE = (ns::CALDAV, "calendar-timezone");
    SUPPORTED_CALENDAR_COMPONENT_SET = (ns::CALDAV, "supported-calendar-component-set");
    SCHEDULE_CALENDAR_TRANSP = (ns::CALDAV, "schedule-calendar-transp");
    SCHEDULE_INBOX_URL = (ns::CALDAV, "schedule-inbox-URL");
    SCHEDULE_OUTBOX_URL = (ns::CALDAV, "schedule-outbox-URL");
    SCHEDULE_DEFAULT_CALENDAR_URL = (ns::CALDAV, "schedule-default-calendar-URL");
    CALENDAR_USER_ADDRESS_SET = (ns::CALDAV, "calendar-user-address-set");
    CALENDAR_USER_TYPE = (ns::CALDAV, "calendar-user-type");
    CALENDAR_AVAILABILITY = (ns::CALDAV, "calendar-availability");
    CALENDAR_QUERY = (ns::CALDAV, "calendar-query");
    CALENDAR_MULTIGET = (ns::CALDAV, "calendar-multiget");
    FILTER = (ns::CALDAV, "filter");
    COMP_FILTER = (ns::CALDAV, "comp-filter");
    TIME_RANGE = (ns::CALDAV, "time-range");
    COMP = (ns::CALDAV, "comp");
    OPAQUE = (ns::CALDAV, "opaque");
    TRANSPARENT = (ns::CALDAV, "transparent");

    // CardDAV.
    ADDRESSBOOK_HOME_SET = (ns::CARDDAV, "addressbook-home-set");
    ADDRESS_DATA = (ns::CARDDAV, "address-data");
    ADDRESSBOOK_DESCRIPTION = (ns::CARDDAV, "addressbook-description");
    ADDRESSBOOK_MULTIGET = (ns::CARDDAV, "addressbook-multiget");

    // CalendarServer.
    GETCTAG = (ns::CALENDARSERVER, "getctag");
    SOURCE = (ns::CALENDARSERVER, "source");
    PUBLISH_URL = (ns::CALENDARSERVER, "publish-url");
    PUBLISH_CALENDAR = (ns::CALENDARSERVER, "publish-calendar");
    UNPUBLISH_CALENDAR = (ns::CALENDARSERVER, "unpublish-calendar");
    EMAIL_ADDRESS_SET = (ns::CALENDARSERVER, "email-address-set");
    EMAIL_ADDRESS = (ns::CALENDARSERVER, "email-address");

    // Apple iCal.
    CALENDAR_COLOR = (ns::APPLE, "calendar-color");
    CALENDAR_ORDER = (ns::APPLE, "calendar-order");

    // ownCloud.
    CALENDAR_ENABLED = (ns::OWNCLOUD, "calendar-enabled");
    ENABLED = (ns::OWNCLOUD, "enabled");
    READ_ONLY = (ns::OWNCLOUD, "read-only");
    INVITE = (ns::OWNCLOUD, "invite");
    USER = (ns::OWNCLOUD, "user");
    ACCESS = (ns::OWNCLOUD, "access");
    COMMON_NAME = (ns::OWNCLOUD, "common-name");
    SHARE = (ns::OWNCLOUD, "share");
    SHARE_SET = (ns::OWNCLOUD, "set");
    SHARE_REMOVE = (ns::OWNCLOUD, "remove");
    SUMMARY = (ns::OWNCLOUD, "summary");
    READ_WRITE = (ns::OWNCLOUD, "read-write");
    READ = (ns::OWNCLOUD, "read");
}
