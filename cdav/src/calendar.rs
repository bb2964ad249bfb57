// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! `CalDAV` views over collections and objects (RFC 4791).

use std::ops::{Deref, DerefMut};

use jiff::Timestamp;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use uuid::Uuid;

use crate::collection::{Collection, Resource};
use crate::error::DavError;
use crate::names::{
    CALENDAR_COLOR, CALENDAR_DESCRIPTION, CALENDAR_ENABLED, CALENDAR_MULTIGET, CALENDAR_ORDER,
    CALENDAR_TIMEZONE, DISPLAYNAME, GETCTAG, SCHEDULE_CALENDAR_TRANSP,
    SUPPORTED_CALENDAR_COMPONENT_SET,
};
use crate::object::DavObject;
use crate::property::PropertyValue;
use crate::registry::{CollectionKind, ObjectKind};
use crate::request::{self, CalendarQueryRequest, TimeRange};
use crate::sharing::{Publishable, Shareable};
use crate::types::Href;

/// A calendar home: the collection holding a user's calendars.
#[derive(Debug, Clone)]
pub struct CalendarHome(Collection);

impl CalendarHome {
    /// Views `collection` as a calendar home.
    #[must_use]
    pub fn from_collection(collection: Collection) -> Option<Self> {
        (collection.kind() == CollectionKind::CalendarHome).then_some(Self(collection))
    }

    /// Returns the underlying collection.
    #[must_use]
    pub fn into_inner(self) -> Collection {
        self.0
    }

    /// Every calendar in this home.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn find_all_calendars(&mut self) -> Result<Vec<Calendar>, DavError> {
        let children = self.0.find_all().await?;
        Ok(children
            .into_iter()
            .filter_map(Resource::into_collection)
            .filter_map(Calendar::from_collection)
            .collect())
    }

    /// Creates a calendar named `name`, also used as its display name.
    ///
    /// # Errors
    ///
    /// Propagates transport errors; returns [`DavError::NotFound`] if the
    /// created collection is not reported as a calendar.
    pub async fn create_calendar(
        &mut self,
        name: &str,
        color: Option<&str>,
        components: &[&str],
        order: Option<i64>,
        timezone: Option<&str>,
    ) -> Result<Calendar, DavError> {
        let mut props = vec![(DISPLAYNAME, PropertyValue::from(name))];
        if let Some(color) = color {
            props.push((CALENDAR_COLOR, color.into()));
        }
        if let Some(order) = order {
            props.push((CALENDAR_ORDER, order.into()));
        }
        if let Some(timezone) = timezone {
            props.push((CALENDAR_TIMEZONE, timezone.into()));
        }
        if !components.is_empty() {
            let components = components.iter().map(ToString::to_string).collect::<Vec<_>>();
            props.push((SUPPORTED_CALENDAR_COMPONENT_SET, components.into()));
        }

        let resource = self
            .0
            .create_collection_of(CollectionKind::Calendar, name, &props)
            .await?;
        let url = resource.url().clone();
        resource
            .into_collection()
            .and_then(Calendar::from_collection)
            .ok_or(DavError::NotFound(url))
    }
}

impl Deref for CalendarHome {
    type Target = Collection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for CalendarHome {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// A `CalDAV` calendar collection.
#[derive(Debug, Clone)]
pub struct Calendar(Collection);

impl Calendar {
    /// Views `collection` as a calendar.
    #[must_use]
    pub fn from_collection(collection: Collection) -> Option<Self> {
        (collection.kind() == CollectionKind::Calendar).then_some(Self(collection))
    }

    /// Returns the underlying collection.
    #[must_use]
    pub fn into_inner(self) -> Collection {
        self.0
    }

    /// Apple `calendar-color`, e.g. `#ff0000`.
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        self.0.node().text(&CALENDAR_COLOR)
    }

    /// Sets the color.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor table rejects the write.
    pub fn set_color(&mut self, color: &str) -> Result<(), DavError> {
        self.0.set("color", color)
    }

    /// Sets the display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor table rejects the write.
    pub fn set_displayname(&mut self, displayname: &str) -> Result<(), DavError> {
        self.0.set("displayname", displayname)
    }

    /// ownCloud `calendar-enabled`.
    #[must_use]
    pub fn enabled(&self) -> Option<bool> {
        self.0
            .node()
            .property(&CALENDAR_ENABLED)
            .and_then(PropertyValue::as_bool)
    }

    /// Enables or disables the calendar.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor table rejects the write.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), DavError> {
        self.0.set("enabled", enabled)
    }

    /// Apple `calendar-order`.
    #[must_use]
    pub fn order(&self) -> Option<i64> {
        self.0
            .node()
            .property(&CALENDAR_ORDER)
            .and_then(PropertyValue::as_integer)
    }

    /// Sets the sort order.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor table rejects the write.
    pub fn set_order(&mut self, order: i64) -> Result<(), DavError> {
        self.0.set("order", order)
    }

    /// `calendar-timezone` as a VTIMEZONE text.
    #[must_use]
    pub fn timezone(&self) -> Option<&str> {
        self.0.node().text(&CALENDAR_TIMEZONE)
    }

    /// Sets the default timezone.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor table rejects the write.
    pub fn set_timezone(&mut self, timezone: &str) -> Result<(), DavError> {
        self.0.set("timezone", timezone)
    }

    /// `calendar-description`.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.0.node().text(&CALENDAR_DESCRIPTION)
    }

    /// Sets the description.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor table rejects the write.
    pub fn set_description(&mut self, description: &str) -> Result<(), DavError> {
        self.0.set("description", description)
    }

    /// Supported component names, e.g. `VEVENT`, `VTODO`.
    #[must_use]
    pub fn components(&self) -> &[String] {
        self.0
            .node()
            .property(&SUPPORTED_CALENDAR_COMPONENT_SET)
            .and_then(PropertyValue::as_list)
            .unwrap_or_default()
    }

    /// `opaque` or `transparent`.
    #[must_use]
    pub fn transparency(&self) -> Option<&str> {
        self.0.node().text(&SCHEDULE_CALENDAR_TRANSP)
    }

    /// Marks the calendar as affecting free/busy time or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor table rejects the write.
    pub fn set_transparent(&mut self, transparent: bool) -> Result<(), DavError> {
        let value = if transparent { "transparent" } else { "opaque" };
        self.0.set("transparency", value)
    }

    /// `CalendarServer` `getctag`.
    #[must_use]
    pub fn ctag(&self) -> Option<&str> {
        self.0.node().text(&GETCTAG)
    }

    /// Every calendar object with its data.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn find_calendar_objects(&mut self) -> Result<Vec<CalendarObject>, DavError> {
        let children = self.0.find_all().await?;
        Ok(calendar_objects(children))
    }

    /// Calendar objects containing a `component`, e.g. `VEVENT`.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn find_by_type(&mut self, component: &str) -> Result<Vec<CalendarObject>, DavError> {
        let body = CalendarQueryRequest::new(&ObjectKind::CalendarObject.propfind_props())
            .component(component)
            .build()?;
        self.report(body).await
    }

    /// Calendar objects containing a `component` overlapping `[start, end)`.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn find_by_type_in_time_range(
        &mut self,
        component: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<CalendarObject>, DavError> {
        let body = CalendarQueryRequest::new(&ObjectKind::CalendarObject.propfind_props())
            .component(component)
            .time_range(TimeRange::new(start, Some(end)))
            .build()?;
        self.report(body).await
    }

    /// Fetches the given objects in one request.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn calendar_multiget(
        &mut self,
        hrefs: &[Href],
    ) -> Result<Vec<CalendarObject>, DavError> {
        if hrefs.is_empty() {
            return Ok(Vec::new());
        }
        let body = request::multiget(
            CALENDAR_MULTIGET,
            &ObjectKind::CalendarObject.propfind_props(),
            hrefs,
        )?;
        self.report(body).await
    }

    /// Uploads `data` as a new object named `<uuid>.ics`.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn create_calendar_object(&mut self, data: String) -> Result<CalendarObject, DavError> {
        let name = format!("{}.ics", Uuid::new_v4());
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/calendar; charset=utf-8"),
        );

        let resource = self.0.create_object(&name, headers, data).await?;
        let url = resource.url().clone();
        resource
            .into_object()
            .and_then(CalendarObject::from_object)
            .ok_or(DavError::NotFound(url))
    }

    async fn report(&mut self, body: String) -> Result<Vec<CalendarObject>, DavError> {
        let children = self.0.report_children(body).await?;
        Ok(calendar_objects(children))
    }
}

fn calendar_objects(resources: Vec<Resource>) -> Vec<CalendarObject> {
    resources
        .into_iter()
        .filter_map(Resource::into_object)
        .filter_map(CalendarObject::from_object)
        .collect()
}

impl Deref for Calendar {
    type Target = Collection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Calendar {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl AsRef<Collection> for Calendar {
    fn as_ref(&self) -> &Collection {
        &self.0
    }
}

impl Shareable for Calendar {}

impl Publishable for Calendar {}

/// An iCalendar resource inside a calendar.
#[derive(Debug, Clone)]
pub struct CalendarObject(DavObject);

impl CalendarObject {
    /// Views `object` as a calendar object.
    #[must_use]
    pub fn from_object(object: DavObject) -> Option<Self> {
        (object.kind() == ObjectKind::CalendarObject).then_some(Self(object))
    }

    /// Returns the underlying object.
    #[must_use]
    pub fn into_inner(self) -> DavObject {
        self.0
    }
}

impl Deref for CalendarObject {
    type Target = DavObject;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for CalendarObject {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
