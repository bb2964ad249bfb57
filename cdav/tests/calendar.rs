// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Calendar object, sharing and principal integration tests with wiremock.

use cdav::{
    Calendar, Collection, CollectionKind, DavConfig, ETag, ObjectKind, Principal, Publishable,
    Resource, Shareable, Transport,
};
use reqwest::header::HeaderMap;
use wiremock::matchers::{body_string_contains, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EVENT: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:1\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";

const EVENT_PROPS: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:response>
    <D:href>/dav/calendars/alice/personal/event.ics</D:href>
    <D:propstat>
      <D:prop>
        <D:getetag>"1"</D:getetag>
        <D:getcontenttype>text/calendar; charset=utf-8</D:getcontenttype>
        <D:resourcetype/>
        <C:calendar-data>BEGIN:VCALENDAR
END:VCALENDAR
</C:calendar-data>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#;

fn event_props(href: &str) -> String {
    EVENT_PROPS.replace("/dav/calendars/alice/personal/event.ics", href)
}

fn transport(server: &MockServer) -> Transport {
    Transport::new(DavConfig::new(format!("{}/dav/", server.uri())))
        .expect("Failed to create transport")
}

fn calendar(server: &MockServer) -> Calendar {
    let collection = Collection::new(
        transport(server),
        "calendars/alice/personal/",
        CollectionKind::Calendar,
    )
    .unwrap();
    Calendar::from_collection(collection).expect("not a calendar")
}

#[tokio::test]
async fn calendar_create_object_refuses_to_overwrite() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/dav/calendars/alice/personal/[0-9a-f-]+\.ics$"))
        .and(header("If-None-Match", "*"))
        .and(header("Content-Type", "text/calendar; charset=utf-8"))
        .and(body_string_contains("UID:1"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PROPFIND"))
        .and(path_regex(r"^/dav/calendars/alice/personal/[0-9a-f-]+\.ics$"))
        .and(header("Depth", "0"))
        .respond_with(ResponseTemplate::new(207).set_body_raw(EVENT_PROPS, "application/xml"))
        .mount(&mock_server)
        .await;

    let mut calendar = calendar(&mock_server);
    let object = calendar
        .create_calendar_object(EVENT.to_string())
        .await
        .unwrap();

    assert_eq!(object.kind(), ObjectKind::CalendarObject);
    assert!(object.url().as_str().ends_with(".ics"));
    assert_eq!(object.etag(), Some(ETag::from("\"1\"")));
    assert!(object.data().is_some_and(|data| data.starts_with("BEGIN:VCALENDAR")));
}

#[tokio::test]
async fn calendar_object_update_sends_if_match_and_keeps_new_etag() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PROPFIND"))
        .and(path("/dav/calendars/alice/personal/event.ics"))
        .respond_with(ResponseTemplate::new(207).set_body_raw(EVENT_PROPS, "application/xml"))
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/dav/calendars/alice/personal/event.ics"))
        .and(header("If-Match", "\"1\""))
        .and(header("Content-Type", "text/calendar; charset=utf-8"))
        .and(body_string_contains("UID:1"))
        .respond_with(ResponseTemplate::new(204).insert_header("ETag", "\"2\""))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut calendar = calendar(&mock_server);
    let Resource::Object(mut object) = calendar.find("event.ics").await.unwrap() else {
        panic!("expected an object");
    };
    assert_eq!(object.etag(), Some(ETag::from("\"1\"")));

    // Unchanged objects are not uploaded.
    object.update().await.unwrap();

    object.set_data(EVENT);
    assert!(object.is_dirty());
    object.update().await.unwrap();

    assert!(!object.is_dirty());
    assert_eq!(object.etag(), Some(ETag::from("\"2\"")));
    assert_eq!(object.data(), Some(EVENT));
}

#[tokio::test]
async fn calendar_object_update_conflict_is_client_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PROPFIND"))
        .and(path("/dav/calendars/alice/personal/event.ics"))
        .respond_with(ResponseTemplate::new(207).set_body_raw(EVENT_PROPS, "application/xml"))
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/dav/calendars/alice/personal/event.ics"))
        .respond_with(ResponseTemplate::new(412))
        .mount(&mock_server)
        .await;

    let mut calendar = calendar(&mock_server);
    let mut object = calendar
        .find("event.ics")
        .await
        .unwrap()
        .into_object()
        .unwrap();

    object.set_data(EVENT);
    let err = object.update().await.unwrap_err();
    assert_eq!(err.status(), Some(412));
    assert!(object.is_dirty());
}

#[tokio::test]
async fn calendar_share_posts_share_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dav/calendars/alice/personal/"))
        .and(body_string_contains("<oc:share"))
        .and(body_string_contains(
            "<d:href>principal:principals/users/bob</d:href>",
        ))
        .and(body_string_contains("<oc:read-write/>"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/dav/calendars/alice/personal/"))
        .and(body_string_contains("<oc:remove>"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let calendar = calendar(&mock_server);
    calendar
        .share("principal:principals/users/bob", true, None)
        .await
        .unwrap();
    calendar
        .unshare("principal:principals/users/bob")
        .await
        .unwrap();
}

#[tokio::test]
async fn principal_current_follows_current_user_principal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PROPFIND"))
        .and(path("/dav/"))
        .and(body_string_contains("current-user-principal"))
        .respond_with(ResponseTemplate::new(207).set_body_raw(
            r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/dav/</D:href>
    <D:propstat>
      <D:prop>
        <D:current-user-principal><D:href>/dav/principals/alice/</D:href></D:current-user-principal>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#,
            "application/xml",
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("PROPFIND"))
        .and(path("/dav/principals/alice/"))
        .respond_with(ResponseTemplate::new(207).set_body_raw(
            r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
  <D:response>
    <D:href>/dav/principals/alice/</D:href>
    <D:propstat>
      <D:prop>
        <D:displayname>Alice</D:displayname>
        <C:calendar-home-set><D:href>/dav/calendars/alice/</D:href></C:calendar-home-set>
        <C:calendar-user-address-set>
          <D:href>mailto:alice@example.com</D:href>
          <D:href>/dav/principals/alice/</D:href>
        </C:calendar-user-address-set>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#,
            "application/xml",
        ))
        .mount(&mock_server)
        .await;

    let principal = Principal::current(transport(&mock_server), "")
        .await
        .unwrap()
        .expect("server advertises a principal");

    assert_eq!(principal.url().as_str(), "/dav/principals/alice/");
    assert_eq!(principal.displayname(), Some("Alice"));
    assert_eq!(principal.calendar_home_set(), ["/dav/calendars/alice/"]);
    assert_eq!(principal.email(), Some("alice@example.com"));
}

#[tokio::test]
async fn calendar_shallow_listing_marks_objects_partial_until_fetched() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PROPFIND"))
        .and(path("/dav/calendars/alice/personal/"))
        .and(header("Depth", "1"))
        .respond_with(ResponseTemplate::new(207).set_body_raw(
            r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/dav/calendars/alice/personal/event.ics</D:href>
    <D:propstat>
      <D:prop>
        <D:getetag>"1"</D:getetag>
        <D:getcontenttype>text/calendar; charset=utf-8</D:getcontenttype>
        <D:resourcetype/>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#,
            "application/xml",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PROPFIND"))
        .and(path("/dav/calendars/alice/personal/event.ics"))
        .and(header("Depth", "0"))
        .and(body_string_contains("calendar-data"))
        .respond_with(ResponseTemplate::new(207).set_body_raw(EVENT_PROPS, "application/xml"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut calendar = calendar(&mock_server);
    let children = calendar.find_all_shallow().await.unwrap();
    assert_eq!(children.len(), 1);

    let mut object = children.into_iter().next().unwrap().into_object().unwrap();
    assert_eq!(object.kind(), ObjectKind::CalendarObject);
    assert!(object.is_partial());
    assert_eq!(object.data(), None);

    object.fetch_complete_data(false).await.unwrap();
    assert!(!object.is_partial());
    assert!(object.data().is_some_and(|data| data.starts_with("BEGIN:VCALENDAR")));

    // Already complete: no second request.
    object.fetch_complete_data(false).await.unwrap();
}

#[tokio::test]
async fn generic_object_complete_data_is_fetched_with_get() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PROPFIND"))
        .and(path("/dav/calendars/alice/personal/notes.txt"))
        .and(header("Depth", "0"))
        .respond_with(ResponseTemplate::new(207).set_body_raw(
            r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/dav/calendars/alice/personal/notes.txt</D:href>
    <D:propstat>
      <D:prop>
        <D:getetag>"7"</D:getetag>
        <D:getcontenttype>text/plain</D:getcontenttype>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#,
            "application/xml",
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dav/calendars/alice/personal/notes.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "\"8\"")
                .set_body_string("remember the milk"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut calendar = calendar(&mock_server);
    let mut object = calendar
        .find("notes.txt")
        .await
        .unwrap()
        .into_object()
        .unwrap();
    assert_eq!(object.kind(), ObjectKind::Generic);
    assert_eq!(object.data(), None);

    object.fetch_complete_data(true).await.unwrap();
    assert_eq!(object.data(), Some("remember the milk"));
    assert_eq!(object.etag(), Some(ETag::from("\"8\"")));
    assert!(!object.is_dirty());
}

#[tokio::test]
async fn calendar_object_copy_and_move_target_destination_collection() {
    let mock_server = MockServer::start().await;
    let destination = format!("{}/dav/calendars/alice/archive/event.ics", mock_server.uri());

    Mock::given(method("PROPFIND"))
        .and(path("/dav/calendars/alice/personal/event.ics"))
        .respond_with(ResponseTemplate::new(207).set_body_raw(EVENT_PROPS, "application/xml"))
        .mount(&mock_server)
        .await;

    Mock::given(method("COPY"))
        .and(path("/dav/calendars/alice/personal/event.ics"))
        .and(header("Destination", destination.as_str()))
        .and(header("Overwrite", "F"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PROPFIND"))
        .and(path("/dav/calendars/alice/archive/event.ics"))
        .and(header("Depth", "0"))
        .respond_with(ResponseTemplate::new(207).set_body_raw(
            event_props("/dav/calendars/alice/archive/event.ics"),
            "application/xml",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("MOVE"))
        .and(path("/dav/calendars/alice/personal/event.ics"))
        .and(header("Destination", destination.as_str()))
        .and(header("Overwrite", "T"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let archive = Collection::new(
        transport(&mock_server),
        "calendars/alice/archive/",
        CollectionKind::Calendar,
    )
    .unwrap();

    let mut calendar = calendar(&mock_server);
    let mut object = calendar
        .find("event.ics")
        .await
        .unwrap()
        .into_object()
        .unwrap();

    let copy = object
        .copy(&archive, false, HeaderMap::new())
        .await
        .unwrap();
    assert_eq!(copy.url().as_str(), "/dav/calendars/alice/archive/event.ics");
    assert_eq!(copy.parent(), Some(archive.url()));
    assert_eq!(copy.kind(), ObjectKind::CalendarObject);
    assert!(!copy.is_partial());
    assert_eq!(copy.etag(), Some(ETag::from("\"1\"")));

    object
        .move_to(&archive, true, HeaderMap::new())
        .await
        .unwrap();
    assert_eq!(object.url().as_str(), "/dav/calendars/alice/archive/event.ics");
    assert_eq!(object.parent(), Some(archive.url()));
}

#[tokio::test]
async fn calendar_publish_posts_calendarserver_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dav/calendars/alice/personal/"))
        .and(body_string_contains("<cs:publish-calendar"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/dav/calendars/alice/personal/"))
        .and(body_string_contains("<cs:unpublish-calendar"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let calendar = calendar(&mock_server);
    assert_eq!(calendar.publish_url(), None);
    calendar.publish().await.unwrap();
    calendar.unpublish().await.unwrap();
}

#[tokio::test]
async fn calendar_time_range_query_reports_matching_objects() {
    let mock_server = MockServer::start().await;

    Mock::given(method("REPORT"))
        .and(path("/dav/calendars/alice/personal/"))
        .and(header("Depth", "1"))
        .and(body_string_contains("<cal:calendar-query"))
        .and(body_string_contains(r#"<cal:comp-filter name="VEVENT">"#))
        .and(body_string_contains(
            r#"<cal:time-range start="20260101T000000Z" end="20260201T000000Z"/>"#,
        ))
        .respond_with(ResponseTemplate::new(207).set_body_raw(EVENT_PROPS, "application/xml"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let start = "2026-01-01T00:00:00Z".parse::<jiff::Timestamp>().unwrap();
    let end = "2026-02-01T00:00:00Z".parse::<jiff::Timestamp>().unwrap();

    let mut calendar = calendar(&mock_server);
    let objects = calendar
        .find_by_type_in_time_range("VEVENT", start, end)
        .await
        .unwrap();

    assert_eq!(objects.len(), 1);
    assert_eq!(
        objects[0].url().as_str(),
        "/dav/calendars/alice/personal/event.ics"
    );
    assert_eq!(objects[0].etag(), Some(ETag::from("\"1\"")));
}
