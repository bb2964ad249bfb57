// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Request body builders for DAV, `CalDAV` and `CardDAV` operations.

use jiff::Timestamp;

use crate::error::DavError;
use crate::names::{
    CALENDAR_QUERY, COLLECTION, COMP_FILTER, FILTER, HREF, MKCOL, PROP, PROPERTYUPDATE, PROPFIND,
    PUBLISH_CALENDAR, QualifiedName, READ_WRITE, RESOURCETYPE, SET, SHARE, SHARE_REMOVE, SHARE_SET,
    SUMMARY, TIME_RANGE, UNPUBLISH_CALENDAR,
};
use crate::types::Href;
use crate::xml::{Skeleton, XmlNode};

/// Builds a PROPFIND body requesting `props`.
///
/// # Errors
///
/// Returns an error if XML building fails.
pub fn propfind(props: &[QualifiedName]) -> Result<String, DavError> {
    let mut skeleton = Skeleton::new(PROPFIND, &[PROP]);
    skeleton
        .innermost_mut()
        .extend(props.iter().cloned().map(XmlNode::new));
    skeleton.to_xml()
}

/// Builds a PROPPATCH body setting the encoded `props`.
///
/// # Errors
///
/// Returns an error if XML building fails.
pub fn proppatch(props: Vec<XmlNode>) -> Result<String, DavError> {
    let mut skeleton = Skeleton::new(PROPERTYUPDATE, &[SET, PROP]);
    skeleton.innermost_mut().extend(props);
    skeleton.to_xml()
}

/// Builds an extended MKCOL body (RFC 5689).
///
/// The `<DAV:resourcetype>` always lists `<DAV:collection/>` first, followed
/// by `resource_types`, then the encoded `props`.
///
/// # Errors
///
/// Returns an error if XML building fails.
pub fn mkcol(resource_types: &[QualifiedName], props: Vec<XmlNode>) -> Result<String, DavError> {
    let resourcetype = XmlNode::new(RESOURCETYPE)
        .with_child(XmlNode::new(COLLECTION))
        .with_children(resource_types.iter().cloned().map(XmlNode::new));

    let mut skeleton = Skeleton::new(MKCOL, &[SET, PROP]);
    let prop = skeleton.innermost_mut();
    prop.push(resourcetype);
    prop.extend(props);
    skeleton.to_xml()
}

/// Builds a multiget REPORT body (`calendar-multiget` or `addressbook-multiget`).
///
/// # Errors
///
/// Returns an error if XML building fails.
pub fn multiget(
    report: QualifiedName,
    props: &[QualifiedName],
    hrefs: &[Href],
) -> Result<String, DavError> {
    let mut skeleton = Skeleton::new(report, &[PROP]);
    skeleton
        .innermost_mut()
        .extend(props.iter().cloned().map(XmlNode::new));
    if let Some(root) = skeleton.children_mut(0) {
        root.extend(hrefs.iter().map(|href| XmlNode::text(HREF, href.as_str())));
    }
    skeleton.to_xml()
}

/// Calendar query request builder.
#[derive(Debug, Clone)]
pub struct CalendarQueryRequest {
    props: Vec<QualifiedName>,
    component: Option<String>,
    time_range: Option<TimeRange>,
}

/// Time range filter for calendar queries, in `CalDAV` UTC form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    /// Start date/time, e.g. `20260101T000000Z`.
    pub start: String,
    /// End date/time.
    pub end: Option<String>,
}

impl TimeRange {
    /// Formats timestamps as `CalDAV` UTC date-times.
    #[must_use]
    pub fn new(start: Timestamp, end: Option<Timestamp>) -> Self {
        Self {
            start: format_utc(start),
            end: end.map(format_utc),
        }
    }
}

fn format_utc(ts: Timestamp) -> String {
    ts.strftime("%Y%m%dT%H%M%SZ").to_string()
}

impl CalendarQueryRequest {
    /// Creates a query returning `props` for every object of the calendar.
    #[must_use]
    pub fn new(props: &[QualifiedName]) -> Self {
        Self {
            props: props.to_vec(),
            component: None,
            time_range: None,
        }
    }

    /// Sets the component filter (VEVENT, VTODO, etc.).
    #[must_use]
    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Sets the time range filter. Only applies together with a component.
    #[must_use]
    pub fn time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = Some(time_range);
        self
    }

    /// Builds the XML body for the calendar query request.
    ///
    /// # Errors
    ///
    /// Returns an error if XML building fails.
    pub fn build(&self) -> Result<String, DavError> {
        let mut vcalendar = XmlNode::new(COMP_FILTER).with_attribute("name", "VCALENDAR");
        if let Some(component) = &self.component {
            let mut comp_filter = XmlNode::new(COMP_FILTER).with_attribute("name", component);
            if let Some(tr) = &self.time_range {
                let mut time_range =
                    XmlNode::new(TIME_RANGE).with_attribute("start", tr.start.as_str());
                if let Some(end) = &tr.end {
                    time_range = time_range.with_attribute("end", end.as_str());
                }
                comp_filter = comp_filter.with_child(time_range);
            }
            vcalendar = vcalendar.with_child(comp_filter);
        }

        let mut skeleton = Skeleton::new(CALENDAR_QUERY, &[PROP]);
        skeleton
            .innermost_mut()
            .extend(self.props.iter().cloned().map(XmlNode::new));
        if let Some(root) = skeleton.children_mut(0) {
            root.push(XmlNode::new(FILTER).with_child(vcalendar));
        }
        skeleton.to_xml()
    }
}

/// Builds an ownCloud share body granting `principal` access.
///
/// # Errors
///
/// Returns an error if XML building fails.
pub fn share(principal: &str, writable: bool, summary: Option<&str>) -> Result<String, DavError> {
    let mut skeleton = Skeleton::new(SHARE, &[SHARE_SET]);
    let set = skeleton.innermost_mut();
    set.push(XmlNode::text(HREF, principal));
    if let Some(summary) = summary {
        set.push(XmlNode::text(SUMMARY, summary));
    }
    if writable {
        set.push(XmlNode::new(READ_WRITE));
    }
    skeleton.to_xml()
}

/// Builds an ownCloud share body revoking `principal`'s access.
///
/// # Errors
///
/// Returns an error if XML building fails.
pub fn unshare(principal: &str) -> Result<String, DavError> {
    let mut skeleton = Skeleton::new(SHARE, &[SHARE_REMOVE]);
    skeleton.innermost_mut().push(XmlNode::text(HREF, principal));
    skeleton.to_xml()
}

/// Builds a `CalendarServer` publish (or unpublish) body.
///
/// # Errors
///
/// Returns an error if XML building fails.
pub fn publish(publish: bool) -> Result<String, DavError> {
    let root = if publish {
        PUBLISH_CALENDAR
    } else {
        UNPUBLISH_CALENDAR
    };
    XmlNode::new(root).to_xml()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::{CALENDAR_COLOR, CALENDAR_DATA, DISPLAYNAME, GETETAG};

    #[test]
    fn proppatch_nests_set_and_prop() {
        let body = proppatch(vec![XmlNode::text(CALENDAR_COLOR, "#ff0000")]).unwrap();
        assert!(body.contains("<d:propertyupdate"));
        assert!(body.contains("<d:set><d:prop><aapl:calendar-color>#ff0000</aapl:calendar-color></d:prop></d:set>"));
    }

    #[test]
    fn mkcol_lists_collection_resource_type_first() {
        let body = mkcol(
            &[crate::names::CALENDAR],
            vec![XmlNode::text(DISPLAYNAME, "Work")],
        )
        .unwrap();
        assert!(body.contains(
            "<d:resourcetype><d:collection/><cal:calendar/></d:resourcetype><d:displayname>Work</d:displayname>"
        ));
    }

    #[test]
    fn calendar_query_with_time_range() {
        let start = "2026-01-01T00:00:00Z".parse::<Timestamp>().unwrap();
        let end = "2026-02-01T00:00:00Z".parse::<Timestamp>().unwrap();
        let body = CalendarQueryRequest::new(&[GETETAG, CALENDAR_DATA])
            .component("VEVENT")
            .time_range(TimeRange::new(start, Some(end)))
            .build()
            .unwrap();

        assert!(body.contains("<cal:calendar-query"));
        assert!(body.contains(r#"<cal:comp-filter name="VCALENDAR"><cal:comp-filter name="VEVENT">"#));
        assert!(body.contains(r#"<cal:time-range start="20260101T000000Z" end="20260201T000000Z"/>"#));
    }

    #[test]
    fn multiget_appends_hrefs_after_prop() {
        let body = multiget(
            crate::names::CALENDAR_MULTIGET,
            &[GETETAG],
            &[Href::from("/cal/a.ics"), Href::from("/cal/b.ics")],
        )
        .unwrap();
        assert!(body.contains(
            "<d:prop><d:getetag/></d:prop><d:href>/cal/a.ics</d:href><d:href>/cal/b.ics</d:href>"
        ));
    }

    #[test]
    fn share_bodies() {
        let body = share("principal:principals/users/bob", true, Some("Team")).unwrap();
        assert!(body.contains("<oc:share"));
        assert!(body.contains(
            "<oc:set><d:href>principal:principals/users/bob</d:href><oc:summary>Team</oc:summary><oc:read-write/></oc:set>"
        ));

        let body = unshare("principal:principals/users/bob").unwrap();
        assert!(body.contains("<oc:remove><d:href>principal:principals/users/bob</d:href></oc:remove>"));

        let body = publish(false).unwrap();
        assert!(body.contains("<cs:unpublish-calendar"));
    }
}
