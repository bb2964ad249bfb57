// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Transport integration tests with wiremock.

use cdav::names::{CALENDAR_COLOR, DISPLAYNAME, GETETAG};
use cdav::{DavConfig, DavError, Depth, PropertyValue, ResponseBody, Transport, headers};
use reqwest::header::HeaderMap;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(server: &MockServer) -> Transport {
    Transport::new(DavConfig::new(format!("{}/dav/", server.uri())))
        .expect("Failed to create transport")
}

#[tokio::test]
async fn transport_classifies_error_statuses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dav/missing.ics"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such resource"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dav/busy.ics"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let transport = transport(&mock_server);

    let err = transport
        .get("missing.ics", HeaderMap::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DavError::Client { status: 404, ref body } if body == "no such resource"
    ));

    let err = transport
        .get("busy.ics", HeaderMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DavError::Server { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn transport_cancelled_request_is_aborted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("late"))
        .mount(&mock_server)
        .await;

    let token = CancellationToken::new();
    let transport = transport(&mock_server).with_cancellation(token.clone());
    token.cancel();

    let err = transport
        .get("event.ics", HeaderMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DavError::Aborted));
}

#[tokio::test]
async fn transport_sends_default_headers_unless_overridden() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dav/default"))
        .and(header("Depth", "0"))
        .and(header("Content-Type", "application/xml; charset=utf-8"))
        .respond_with(ResponseTemplate::new(200).set_body_string("defaults"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dav/override"))
        .and(header("Depth", "1"))
        .and(header("Content-Type", "text/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_string("overridden"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = transport(&mock_server);

    let response = transport.get("default", HeaderMap::new()).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body.into_text().unwrap(), "defaults");

    let custom = headers([("Depth", "1"), ("Content-Type", "text/plain")]).unwrap();
    let response = transport.get("override", custom).await.unwrap();
    assert_eq!(response.body.into_text().unwrap(), "overridden");
}

#[tokio::test]
async fn transport_copy_and_move_headers() {
    let mock_server = MockServer::start().await;
    let destination = format!("{}/dav/archive/event.ics", mock_server.uri());

    Mock::given(method("COPY"))
        .and(path("/dav/work/event.ics"))
        .and(header("Destination", destination.as_str()))
        .and(header("Depth", "0"))
        .and(header("Overwrite", "F"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("MOVE"))
        .and(path("/dav/work/event.ics"))
        .and(header("Destination", destination.as_str()))
        .and(header("Depth", "infinity"))
        .and(header("Overwrite", "T"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = transport(&mock_server);

    let response = transport
        .copy(
            "work/event.ics",
            "/dav/archive/event.ics",
            Depth::Zero,
            false,
            HeaderMap::new(),
        )
        .await
        .unwrap();
    assert_eq!(response.status, 201);

    let response = transport
        .move_to(
            "work/event.ics",
            "archive/event.ics",
            true,
            HeaderMap::new(),
        )
        .await
        .unwrap();
    assert_eq!(response.status, 204);
}

#[tokio::test]
async fn transport_propfind_depth_zero_picks_requested_entry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PROPFIND"))
        .and(path("/dav/calendars/alice/"))
        .and(header("Depth", "0"))
        .respond_with(ResponseTemplate::new(207).set_body_raw(
            r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/dav/calendars/</D:href>
    <D:propstat>
      <D:prop><D:displayname>Calendars</D:displayname></D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
  <D:response>
    <D:href>/dav/calendars/alice</D:href>
    <D:propstat>
      <D:prop><D:displayname>Alice</D:displayname></D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#,
            "application/xml",
        ))
        .mount(&mock_server)
        .await;

    let transport = transport(&mock_server);
    let props = transport
        .propfind("calendars/alice/", &[DISPLAYNAME], Depth::Zero, HeaderMap::new())
        .await
        .unwrap()
        .body
        .into_properties()
        .unwrap();

    assert_eq!(props.get(&DISPLAYNAME), Some(&PropertyValue::from("Alice")));
}

#[tokio::test]
async fn transport_propfind_depth_zero_without_entry_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PROPFIND"))
        .and(path("/dav/calendars/bob/"))
        .respond_with(ResponseTemplate::new(207).set_body_raw(
            r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/dav/calendars/alice/</D:href>
    <D:propstat>
      <D:prop><D:displayname>Alice</D:displayname></D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
  <D:response>
    <D:href>/dav/calendars/carol/</D:href>
    <D:propstat>
      <D:prop><D:displayname>Carol</D:displayname></D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#,
            "application/xml",
        ))
        .mount(&mock_server)
        .await;

    let transport = transport(&mock_server);
    let err = transport
        .propfind("calendars/bob/", &[DISPLAYNAME], Depth::Zero, HeaderMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DavError::NotFound(ref href) if href.as_str() == "/dav/calendars/bob/"));
}

#[tokio::test]
async fn transport_multistatus_drops_failed_propstat() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PROPFIND"))
        .and(path("/dav/calendars/alice/"))
        .and(header("Depth", "1"))
        .respond_with(ResponseTemplate::new(207).set_body_raw(
            r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:" xmlns:A="http://apple.com/ns/ical/">
  <D:response>
    <D:href>/dav/calendars/alice/work/</D:href>
    <D:propstat>
      <D:prop>
        <D:displayname>Work</D:displayname>
        <D:getetag>"42"</D:getetag>
      </D:prop>
      <D:status>HTTP/1.1 200 OK</D:status>
    </D:propstat>
    <D:propstat>
      <D:prop><A:calendar-color/></D:prop>
      <D:status>HTTP/1.1 404 Not Found</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#,
            "application/xml",
        ))
        .mount(&mock_server)
        .await;

    let transport = transport(&mock_server);
    let response = transport
        .propfind(
            "calendars/alice/",
            &[DISPLAYNAME, GETETAG, CALENDAR_COLOR],
            Depth::One,
            HeaderMap::new(),
        )
        .await
        .unwrap();

    let ResponseBody::MultiStatus(multistatus) = response.body else {
        panic!("expected a multistatus body");
    };
    let props = multistatus.get("/dav/calendars/alice/work/").unwrap();
    assert_eq!(props.len(), 2);
    assert_eq!(props.get(&GETETAG), Some(&PropertyValue::from("\"42\"")));
    assert!(!props.contains_key(&CALENDAR_COLOR));
}

#[tokio::test]
async fn transport_reads_dav_compliance_classes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("OPTIONS"))
        .and(path("/dav/"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("DAV", "1, 2, access-control, calendar-access"),
        )
        .mount(&mock_server)
        .await;

    let transport = transport(&mock_server);
    let classes = transport.dav_compliance("").await.unwrap();
    assert_eq!(classes, ["1", "2", "access-control", "calendar-access"]);
}

#[tokio::test]
async fn transport_unlock_wraps_lock_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("UNLOCK"))
        .and(path("/dav/work/event.ics"))
        .and(header("Lock-Token", "<urn:uuid:1234>"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = transport(&mock_server);
    transport
        .unlock("work/event.ics", "urn:uuid:1234", HeaderMap::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn transport_unreachable_server_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = Transport::new(DavConfig::new(format!("http://{addr}/dav/"))).unwrap();
    let err = transport
        .get("event.ics", HeaderMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DavError::Network(_)));
    assert!(err.is_retryable());
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn transport_status_outside_known_classes_is_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dav/event.ics"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&mock_server)
        .await;

    let transport = transport(&mock_server);
    let err = transport
        .get("event.ics", HeaderMap::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DavError::Http { status: 304, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn transport_multistatus_keeps_path_with_only_failed_propstat() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PROPFIND"))
        .and(path("/dav/calendars/alice/"))
        .and(header("Depth", "1"))
        .respond_with(ResponseTemplate::new(207).set_body_raw(
            r#"<?xml version="1.0" encoding="utf-8" ?>
<D:multistatus xmlns:D="DAV:">
  <D:response>
    <D:href>/dav/calendars/alice/locked/</D:href>
    <D:propstat>
      <D:prop><D:displayname/></D:prop>
      <D:status>HTTP/1.1 403 Forbidden</D:status>
    </D:propstat>
  </D:response>
</D:multistatus>"#,
            "application/xml",
        ))
        .mount(&mock_server)
        .await;

    let transport = transport(&mock_server);
    let multistatus = transport
        .propfind("calendars/alice/", &[DISPLAYNAME], Depth::One, HeaderMap::new())
        .await
        .unwrap()
        .body
        .into_multistatus()
        .unwrap();

    assert_eq!(multistatus.len(), 1);
    assert!(multistatus.get("/dav/calendars/alice/locked/").unwrap().is_empty());
}
