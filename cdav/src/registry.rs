// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Node kinds and the per-collection factory registry used during resolution.

use std::collections::BTreeMap;

use crate::encode::{AddressBookPropSet, CalendarPropSet, DavPropSet, PropertyEncoder, SchedulingPropSet};
use crate::names::{
    ADDRESS_DATA, ADDRESSBOOK, ADDRESSBOOK_DESCRIPTION, CALENDAR, CALENDAR_AVAILABILITY,
    CALENDAR_COLOR, CALENDAR_DATA, CALENDAR_DESCRIPTION, CALENDAR_ENABLED, CALENDAR_ORDER,
    CALENDAR_TIMEZONE, CURRENT_USER_PRIVILEGE_SET, DISPLAYNAME, ENABLED, GETCONTENTLENGTH,
    GETCONTENTTYPE, GETCTAG, GETETAG, GETLASTMODIFIED, INVITE, OWNER, PUBLISH_URL,
    QUOTA_AVAILABLE_BYTES, QUOTA_USED_BYTES, QualifiedName, READ_ONLY, RESOURCETYPE,
    SCHEDULE_CALENDAR_TRANSP, SCHEDULE_DEFAULT_CALENDAR_URL, SCHEDULE_INBOX, SCHEDULE_OUTBOX,
    SOURCE, SUBSCRIBED, SUPPORTED_CALENDAR_COMPONENT_SET, SYNC_TOKEN,
};
use crate::property::PropertyDescriptor;

macro_rules! collection_descriptors {
    ($($extra:expr),* $(,)?) => {
        &[
            PropertyDescriptor::mutable("displayname", DISPLAYNAME),
            PropertyDescriptor::read_only("owner", OWNER),
            PropertyDescriptor::read_only("resourcetype", RESOURCETYPE),
            PropertyDescriptor::read_only("sync-token", SYNC_TOKEN),
            PropertyDescriptor::read_only("privileges", CURRENT_USER_PRIVILEGE_SET),
            $($extra,)*
        ]
    };
}

macro_rules! object_descriptors {
    ($($extra:expr),* $(,)?) => {
        &[
            PropertyDescriptor::read_only("contenttype", GETCONTENTTYPE),
            PropertyDescriptor::read_only("etag", GETETAG),
            PropertyDescriptor::read_only("lastmodified", GETLASTMODIFIED),
            PropertyDescriptor::read_only("contentlength", GETCONTENTLENGTH),
            PropertyDescriptor::read_only("resourcetype", RESOURCETYPE),
            PropertyDescriptor::read_only("displayname", DISPLAYNAME),
            PropertyDescriptor::read_only("owner", OWNER),
            $($extra,)*
        ]
    };
}

static COLLECTION: &[PropertyDescriptor] = collection_descriptors![];

static HOME: &[PropertyDescriptor] = collection_descriptors![
    PropertyDescriptor::read_only("quota-available", QUOTA_AVAILABLE_BYTES),
    PropertyDescriptor::read_only("quota-used", QUOTA_USED_BYTES),
];

static CALENDAR_PROPS: &[PropertyDescriptor] = collection_descriptors![
    PropertyDescriptor::mutable("color", CALENDAR_COLOR),
    PropertyDescriptor::mutable("order", CALENDAR_ORDER),
    PropertyDescriptor::mutable("enabled", CALENDAR_ENABLED),
    PropertyDescriptor::mutable("description", CALENDAR_DESCRIPTION),
    PropertyDescriptor::mutable("timezone", CALENDAR_TIMEZONE),
    PropertyDescriptor::mutable("transparency", SCHEDULE_CALENDAR_TRANSP),
    PropertyDescriptor::read_only("components", SUPPORTED_CALENDAR_COMPONENT_SET),
    PropertyDescriptor::read_only("ctag", GETCTAG),
    PropertyDescriptor::read_only("publish-url", PUBLISH_URL),
    PropertyDescriptor::read_only("invites", INVITE),
];

static SCHEDULE_INBOX_PROPS: &[PropertyDescriptor] = collection_descriptors![
    PropertyDescriptor::mutable("availability", CALENDAR_AVAILABILITY),
    PropertyDescriptor::mutable("default-calendar", SCHEDULE_DEFAULT_CALENDAR_URL),
    PropertyDescriptor::read_only("ctag", GETCTAG),
];

static SUBSCRIPTION_PROPS: &[PropertyDescriptor] = collection_descriptors![
    PropertyDescriptor::mutable("color", CALENDAR_COLOR),
    PropertyDescriptor::mutable("order", CALENDAR_ORDER),
    PropertyDescriptor::read_only("source", SOURCE),
];

static ADDRESSBOOK_PROPS: &[PropertyDescriptor] = collection_descriptors![
    PropertyDescriptor::mutable("description", ADDRESSBOOK_DESCRIPTION),
    PropertyDescriptor::mutable("enabled", ENABLED),
    PropertyDescriptor::read_only("read-only", READ_ONLY),
    PropertyDescriptor::read_only("ctag", GETCTAG),
    PropertyDescriptor::read_only("invites", INVITE),
];

static OBJECT: &[PropertyDescriptor] = object_descriptors![];

static CALENDAR_OBJECT: &[PropertyDescriptor] =
    object_descriptors![PropertyDescriptor::read_only("data", CALENDAR_DATA)];

static VCARD: &[PropertyDescriptor] =
    object_descriptors![PropertyDescriptor::read_only("data", ADDRESS_DATA)];

const DAV_ENCODERS: &[&dyn PropertyEncoder] = &[&DavPropSet];
const CALENDAR_ENCODERS: &[&dyn PropertyEncoder] = &[&DavPropSet, &CalendarPropSet];
const SCHEDULING_ENCODERS: &[&dyn PropertyEncoder] = &[&DavPropSet, &SchedulingPropSet];
const ADDRESSBOOK_ENCODERS: &[&dyn PropertyEncoder] = &[&DavPropSet, &AddressBookPropSet];

/// Kinds of collection the resource model knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum CollectionKind {
    /// Any collection without a more specific kind.
    #[default]
    Generic,
    /// `calendar-home-set` target holding a user's calendars.
    CalendarHome,
    /// `CalDAV` calendar.
    Calendar,
    /// Scheduling inbox (RFC 6638).
    ScheduleInbox,
    /// Scheduling outbox (RFC 6638).
    ScheduleOutbox,
    /// `CalendarServer` calendar subscription.
    Subscription,
    /// `addressbook-home-set` target holding a user's address books.
    AddressBookHome,
    /// `CardDAV` address book.
    AddressBook,
}

impl CollectionKind {
    /// Properties exposed by member name.
    #[must_use]
    pub fn descriptors(self) -> &'static [PropertyDescriptor] {
        match self {
            Self::Generic | Self::ScheduleOutbox => COLLECTION,
            Self::CalendarHome | Self::AddressBookHome => HOME,
            Self::Calendar => CALENDAR_PROPS,
            Self::ScheduleInbox => SCHEDULE_INBOX_PROPS,
            Self::Subscription => SUBSCRIPTION_PROPS,
            Self::AddressBook => ADDRESSBOOK_PROPS,
        }
    }

    /// Properties to request when fetching a collection of this kind.
    #[must_use]
    pub fn propfind_props(self) -> Vec<QualifiedName> {
        self.descriptors().iter().map(|d| d.name.clone()).collect()
    }

    /// Encoders run on dirty properties before PROPPATCH.
    #[must_use]
    pub fn encoders(self) -> &'static [&'static dyn PropertyEncoder] {
        match self {
            Self::Calendar | Self::Subscription => CALENDAR_ENCODERS,
            Self::ScheduleInbox => SCHEDULING_ENCODERS,
            Self::AddressBook => ADDRESSBOOK_ENCODERS,
            Self::Generic | Self::CalendarHome | Self::ScheduleOutbox | Self::AddressBookHome => {
                DAV_ENCODERS
            }
        }
    }

    /// Resource type advertised next to `<DAV:collection/>`, used by MKCOL.
    #[must_use]
    pub const fn resource_type(self) -> Option<QualifiedName> {
        match self {
            Self::Calendar => Some(CALENDAR),
            Self::ScheduleInbox => Some(SCHEDULE_INBOX),
            Self::ScheduleOutbox => Some(SCHEDULE_OUTBOX),
            Self::Subscription => Some(SUBSCRIBED),
            Self::AddressBook => Some(ADDRESSBOOK),
            Self::Generic | Self::CalendarHome | Self::AddressBookHome => None,
        }
    }

    /// Child kinds a collection of this kind resolves out of the box.
    #[must_use]
    pub fn default_registry(self) -> Registry {
        let mut registry = Registry::new();
        match self {
            Self::CalendarHome => {
                registry
                    .register_collection(CALENDAR, Self::Calendar)
                    .register_collection(SCHEDULE_INBOX, Self::ScheduleInbox)
                    .register_collection(SCHEDULE_OUTBOX, Self::ScheduleOutbox)
                    .register_collection(SUBSCRIBED, Self::Subscription);
            }
            Self::Calendar => {
                registry.register_object("text/calendar", ObjectKind::CalendarObject);
            }
            Self::AddressBookHome => {
                registry.register_collection(ADDRESSBOOK, Self::AddressBook);
            }
            Self::AddressBook => {
                registry
                    .register_object("text/vcard", ObjectKind::VCard)
                    .register_object("text/x-vcard", ObjectKind::VCard);
            }
            Self::Generic | Self::ScheduleInbox | Self::ScheduleOutbox | Self::Subscription => {}
        }
        registry
    }
}

/// Kinds of non-collection resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ObjectKind {
    /// Any resource without a more specific kind.
    #[default]
    Generic,
    /// iCalendar object inside a calendar.
    CalendarObject,
    /// vCard inside an address book.
    VCard,
}

impl ObjectKind {
    /// Properties exposed by member name.
    #[must_use]
    pub fn descriptors(self) -> &'static [PropertyDescriptor] {
        match self {
            Self::Generic => OBJECT,
            Self::CalendarObject => CALENDAR_OBJECT,
            Self::VCard => VCARD,
        }
    }

    /// Properties to request when fetching an object of this kind.
    #[must_use]
    pub fn propfind_props(self) -> Vec<QualifiedName> {
        self.descriptors().iter().map(|d| d.name.clone()).collect()
    }

    /// Property carrying the object's body in PROPFIND and REPORT responses.
    #[must_use]
    pub const fn data_property(self) -> Option<QualifiedName> {
        match self {
            Self::Generic => None,
            Self::CalendarObject => Some(CALENDAR_DATA),
            Self::VCard => Some(ADDRESS_DATA),
        }
    }

    /// `Content-Type` sent when uploading the body.
    #[must_use]
    pub const fn content_type(self) -> Option<&'static str> {
        match self {
            Self::Generic => None,
            Self::CalendarObject => Some("text/calendar; charset=utf-8"),
            Self::VCard => Some("text/vcard; charset=utf-8"),
        }
    }

    /// File extension of generated names.
    #[must_use]
    pub const fn extension(self) -> Option<&'static str> {
        match self {
            Self::Generic => None,
            Self::CalendarObject => Some("ics"),
            Self::VCard => Some("vcf"),
        }
    }
}

/// Child factories of one collection.
///
/// Collection kinds are keyed by resource-type name, object kinds by
/// lowercase MIME type. Registering a key again replaces the earlier kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    collections: BTreeMap<QualifiedName, CollectionKind>,
    objects: BTreeMap<String, ObjectKind>,
}

impl Registry {
    /// Creates an empty registry; everything resolves to the generic kinds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a resource type to a collection kind.
    pub fn register_collection(
        &mut self,
        resource_type: QualifiedName,
        kind: CollectionKind,
    ) -> &mut Self {
        self.collections.insert(resource_type, kind);
        self
    }

    /// Maps a MIME type to an object kind.
    pub fn register_object(&mut self, mime_type: &str, kind: ObjectKind) -> &mut Self {
        self.objects.insert(mime_type.to_ascii_lowercase(), kind);
        self
    }

    /// Kind for a resource type, falling back to [`CollectionKind::Generic`].
    #[must_use]
    pub fn collection_kind(&self, resource_type: &QualifiedName) -> CollectionKind {
        self.collections
            .get(resource_type)
            .copied()
            .unwrap_or_default()
    }

    /// Kind for a MIME type, falling back to [`ObjectKind::Generic`].
    #[must_use]
    pub fn object_kind(&self, mime_type: &str) -> ObjectKind {
        self.objects
            .get(&mime_type.to_ascii_lowercase())
            .copied()
            .unwrap_or_default()
    }

    /// Union of the base lists and the lists of every registered kind,
    /// without duplicates.
    #[must_use]
    pub fn propfind_props(&self) -> Vec<QualifiedName> {
        let mut props = base_props();
        let registered = self
            .collections
            .values()
            .flat_map(|kind| kind.descriptors())
            .chain(self.objects.values().flat_map(|kind| kind.descriptors()));
        for descriptor in registered {
            if !props.contains(&descriptor.name) {
                props.push(descriptor.name.clone());
            }
        }
        props
    }
}

/// Base collection and object lists, without duplicates.
#[must_use]
pub fn base_props() -> Vec<QualifiedName> {
    let mut props = CollectionKind::Generic.propfind_props();
    for name in ObjectKind::Generic.propfind_props() {
        if !props.contains(&name) {
            props.push(name);
        }
    }
    props
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_last_registration_wins() {
        let mut registry = Registry::new();
        registry
            .register_collection(CALENDAR, CollectionKind::Subscription)
            .register_collection(CALENDAR, CollectionKind::Calendar)
            .register_object("Text/Calendar", ObjectKind::VCard)
            .register_object("text/calendar", ObjectKind::CalendarObject);

        assert_eq!(registry.collection_kind(&CALENDAR), CollectionKind::Calendar);
        assert_eq!(registry.object_kind("TEXT/CALENDAR"), ObjectKind::CalendarObject);
        assert_eq!(registry.collection_kind(&ADDRESSBOOK), CollectionKind::Generic);
        assert_eq!(registry.object_kind("text/plain"), ObjectKind::Generic);
    }

    #[test]
    fn registry_propfind_props_is_deduplicated_union() {
        let base = Registry::new().propfind_props();
        assert!(base.contains(&RESOURCETYPE));
        assert!(base.contains(&GETCONTENTTYPE));
        assert_eq!(base.iter().filter(|n| **n == DISPLAYNAME).count(), 1);

        let home = CollectionKind::CalendarHome.default_registry().propfind_props();
        assert!(home.contains(&CALENDAR_COLOR));
        assert!(home.contains(&SOURCE));
        assert!(!home.contains(&CALENDAR_DATA));

        let calendar = CollectionKind::Calendar.default_registry().propfind_props();
        assert!(calendar.contains(&CALENDAR_DATA));
        assert_eq!(calendar.iter().filter(|n| **n == GETETAG).count(), 1);
    }

    #[test]
    fn default_registries() {
        let book = CollectionKind::AddressBook.default_registry();
        assert_eq!(book.object_kind("text/x-vcard"), ObjectKind::VCard);
        assert_eq!(
            CollectionKind::AddressBookHome
                .default_registry()
                .collection_kind(&ADDRESSBOOK),
            CollectionKind::AddressBook
        );
        assert_eq!(CollectionKind::Generic.default_registry(), Registry::new());
    }
}
