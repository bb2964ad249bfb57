// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! DAV transport: one method per HTTP verb, multi-status reduction and URL
//! helpers.

use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use tokio_util::sync::CancellationToken;

use crate::config::DavConfig;
use crate::decode::Decoders;
use crate::error::DavError;
use crate::http::{HttpClient, HttpResponse};
use crate::names::{CURRENT_USER_PRINCIPAL, QualifiedName};
use crate::property::PropertyMap;
use crate::request;
use crate::response::{MultiStatus, parse_multistatus};
use crate::types::{Depth, ETag, Href};

const MULTI_STATUS: u16 = 207;
const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Body of a successful DAV response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Raw body of a non-207 response.
    Text(String),
    /// Reduced multi-status body.
    MultiStatus(MultiStatus),
    /// Properties of a single resource, from a Depth-0 PROPFIND.
    Properties(PropertyMap),
}

impl ResponseBody {
    /// Raw text body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not text.
    pub fn into_text(self) -> Result<String, DavError> {
        match self {
            Self::Text(text) => Ok(text),
            _ => Err(DavError::Xml("Expected a plain response body".to_string())),
        }
    }

    /// Reduced multi-status body.
    ///
    /// # Errors
    ///
    /// Returns an error if the server did not answer with 207.
    pub fn into_multistatus(self) -> Result<MultiStatus, DavError> {
        match self {
            Self::MultiStatus(multistatus) => Ok(multistatus),
            _ => Err(DavError::Xml("Expected a multistatus response".to_string())),
        }
    }

    /// Properties of a single resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a single property map.
    pub fn into_properties(self) -> Result<PropertyMap, DavError> {
        match self {
            Self::Properties(props) => Ok(props),
            _ => Err(DavError::Xml("Expected a multistatus response".to_string())),
        }
    }
}

/// A successful DAV response.
#[derive(Debug, Clone)]
pub struct DavResponse {
    /// Status code, always 2xx.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Parsed body.
    pub body: ResponseBody,
}

impl DavResponse {
    /// `ETag` response header, if any.
    #[must_use]
    pub fn etag(&self) -> Option<ETag> {
        self.headers
            .get("ETag")
            .and_then(|v| v.to_str().ok())
            .map(|s| ETag::new(s.to_string()))
    }

    /// Values of a comma-separated header, trimmed.
    #[must_use]
    pub fn header_list(&self, name: &str) -> Vec<String> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}

#[derive(Debug)]
struct Inner {
    http: HttpClient,
    base_url: Url,
    decoders: Decoders,
}

/// Executes DAV requests against a base URL.
///
/// Cheap to clone; clones share the HTTP client and decoder table. Every
/// request sends `Depth: 0` and an XML content type unless the caller's
/// headers override them.
#[derive(Debug, Clone)]
pub struct Transport {
    inner: Arc<Inner>,
    cancel: Option<CancellationToken>,
}

impl Transport {
    /// Creates a transport with the default property decoders.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or HTTP client creation fails.
    pub fn new(config: DavConfig) -> Result<Self, DavError> {
        Self::with_decoders(config, Decoders::default())
    }

    /// Creates a transport with a custom decoder table.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or HTTP client creation fails.
    pub fn with_decoders(config: DavConfig, decoders: Decoders) -> Result<Self, DavError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| DavError::Config(format!("Invalid base URL {}: {e}", config.base_url)))?;
        let http = HttpClient::new(config)?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                decoders,
            }),
            cancel: None,
        })
    }

    /// Returns a transport whose requests abort once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel: Some(token),
        }
    }

    /// Base URL relative hrefs are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Property decoders used for multi-status bodies.
    #[must_use]
    pub fn decoders(&self) -> &Decoders {
        &self.inner.decoders
    }

    /// Resolves `url` against the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` cannot be resolved.
    pub fn absolute_url(&self, url: &str) -> Result<Url, DavError> {
        self.inner
            .base_url
            .join(url)
            .map_err(|e| DavError::InvalidUrl(format!("{url}: {e}")))
    }

    /// Path component of `url` resolved against the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` cannot be resolved.
    pub fn pathname(&self, url: &str) -> Result<String, DavError> {
        Ok(self.absolute_url(url)?.path().to_string())
    }

    /// Last non-empty path segment of `url`.
    #[must_use]
    pub fn filename(url: &str) -> &str {
        url.trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    /// Sends a request with any method.
    ///
    /// A 207 body is reduced into [`ResponseBody::MultiStatus`]; every other
    /// 2xx body is returned as text.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::Aborted`] if cancelled, [`DavError::Network`] if no
    /// response was received, a status-class error for non-2xx statuses and
    /// [`DavError::Xml`] if a multi-status body is malformed.
    #[tracing::instrument(skip_all, fields(%method, url))]
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<String>,
    ) -> Result<DavResponse, DavError> {
        let url = self.absolute_url(url)?;
        tracing::Span::current().record("url", url.as_str());

        let mut merged = HeaderMap::new();
        merged.insert("Depth", HeaderValue::from_static(Depth::Zero.as_str()));
        merged.insert(CONTENT_TYPE, HeaderValue::from_static(XML_CONTENT_TYPE));
        for (name, value) in &headers {
            merged.insert(name.clone(), value.clone());
        }

        let mut req = self
            .inner
            .http
            .build_request(method, url.as_str())
            .headers(merged);
        if let Some(body) = body {
            req = req.body(body);
        }

        let HttpResponse {
            status,
            headers,
            body,
        } = self.inner.http.execute(req, self.cancel.as_ref()).await?;
        tracing::debug!(status, "request completed");

        let body = if status == MULTI_STATUS {
            ResponseBody::MultiStatus(parse_multistatus(&body, &self.inner.decoders)?)
        } else {
            ResponseBody::Text(body)
        };
        Ok(DavResponse {
            status,
            headers,
            body,
        })
    }

    /// GET `url`.
    ///
    /// # Errors
    ///
    /// See [`Transport::request`].
    pub async fn get(&self, url: &str, headers: HeaderMap) -> Result<DavResponse, DavError> {
        self.request(Method::GET, url, headers, None).await
    }

    /// PUT `body` to `url`.
    ///
    /// # Errors
    ///
    /// See [`Transport::request`].
    pub async fn put(
        &self,
        url: &str,
        headers: HeaderMap,
        body: String,
    ) -> Result<DavResponse, DavError> {
        self.request(Method::PUT, url, headers, Some(body)).await
    }

    /// POST `body` to `url`.
    ///
    /// # Errors
    ///
    /// See [`Transport::request`].
    pub async fn post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: String,
    ) -> Result<DavResponse, DavError> {
        self.request(Method::POST, url, headers, Some(body)).await
    }

    /// PATCH `url` with `body`.
    ///
    /// # Errors
    ///
    /// See [`Transport::request`].
    pub async fn patch(
        &self,
        url: &str,
        headers: HeaderMap,
        body: String,
    ) -> Result<DavResponse, DavError> {
        self.request(Method::PATCH, url, headers, Some(body)).await
    }

    /// DELETE `url`.
    ///
    /// # Errors
    ///
    /// See [`Transport::request`].
    pub async fn delete(&self, url: &str, headers: HeaderMap) -> Result<DavResponse, DavError> {
        self.request(Method::DELETE, url, headers, None).await
    }

    /// OPTIONS `url`.
    ///
    /// # Errors
    ///
    /// See [`Transport::request`].
    pub async fn options(&self, url: &str) -> Result<DavResponse, DavError> {
        self.request(Method::OPTIONS, url, HeaderMap::new(), None)
            .await
    }

    /// DAV compliance classes advertised for `url`, e.g. `1`, `3`,
    /// `calendar-access`.
    ///
    /// # Errors
    ///
    /// See [`Transport::request`].
    pub async fn dav_compliance(&self, url: &str) -> Result<Vec<String>, DavError> {
        Ok(self.options(url).await?.header_list("DAV"))
    }

    /// COPY `url` to `destination`.
    ///
    /// # Errors
    ///
    /// See [`Transport::request`].
    pub async fn copy(
        &self,
        url: &str,
        destination: &str,
        depth: Depth,
        overwrite: bool,
        headers: HeaderMap,
    ) -> Result<DavResponse, DavError> {
        let headers = self.transfer_headers(destination, depth, overwrite, headers)?;
        self.request(dav_method(b"COPY")?, url, headers, None).await
    }

    /// MOVE `url` to `destination`. Always `Depth: infinity`.
    ///
    /// # Errors
    ///
    /// See [`Transport::request`].
    pub async fn move_to(
        &self,
        url: &str,
        destination: &str,
        overwrite: bool,
        headers: HeaderMap,
    ) -> Result<DavResponse, DavError> {
        let headers = self.transfer_headers(destination, Depth::Infinity, overwrite, headers)?;
        self.request(dav_method(b"MOVE")?, url, headers, None).await
    }

    /// LOCK `url`.
    ///
    /// # Errors
    ///
    /// See [`Transport::request`].
    pub async fn lock(
        &self,
        url: &str,
        headers: HeaderMap,
        body: Option<String>,
    ) -> Result<DavResponse, DavError> {
        self.request(dav_method(b"LOCK")?, url, headers, body).await
    }

    /// UNLOCK `url`, releasing `lock_token`.
    ///
    /// # Errors
    ///
    /// See [`Transport::request`].
    pub async fn unlock(
        &self,
        url: &str,
        lock_token: &str,
        mut headers: HeaderMap,
    ) -> Result<DavResponse, DavError> {
        headers.insert("Lock-Token", header_value(&format!("<{lock_token}>"))?);
        self.request(dav_method(b"UNLOCK")?, url, headers, None)
            .await
    }

    /// PROPFIND `props` of `url`.
    ///
    /// With [`Depth::Zero`] the multi-status body is narrowed to the entry
    /// for `url` and returned as [`ResponseBody::Properties`].
    ///
    /// # Errors
    ///
    /// Returns [`DavError::NotFound`] if a Depth-0 response has no entry for
    /// `url`; see [`Transport::request`] otherwise.
    pub async fn propfind(
        &self,
        url: &str,
        props: &[QualifiedName],
        depth: Depth,
        mut headers: HeaderMap,
    ) -> Result<DavResponse, DavError> {
        headers.insert("Depth", HeaderValue::from_static(depth.as_str()));
        let body = request::propfind(props)?;
        let mut response = self
            .request(dav_method(b"PROPFIND")?, url, headers, Some(body))
            .await?;

        if depth == Depth::Zero {
            let multistatus = response.body.into_multistatus()?;
            response.body = ResponseBody::Properties(self.single_entry(url, multistatus)?);
        }
        Ok(response)
    }

    /// PROPPATCH `url` with a prepared `propertyupdate` body.
    ///
    /// # Errors
    ///
    /// See [`Transport::request`].
    pub async fn proppatch(
        &self,
        url: &str,
        headers: HeaderMap,
        body: String,
    ) -> Result<DavResponse, DavError> {
        self.request(dav_method(b"PROPPATCH")?, url, headers, Some(body))
            .await
    }

    /// MKCOL `url`, optionally with an extended MKCOL body.
    ///
    /// # Errors
    ///
    /// See [`Transport::request`].
    pub async fn mkcol(
        &self,
        url: &str,
        headers: HeaderMap,
        body: Option<String>,
    ) -> Result<DavResponse, DavError> {
        self.request(dav_method(b"MKCOL")?, url, headers, body).await
    }

    /// REPORT on `url`.
    ///
    /// # Errors
    ///
    /// See [`Transport::request`].
    pub async fn report(
        &self,
        url: &str,
        headers: HeaderMap,
        body: String,
    ) -> Result<DavResponse, DavError> {
        self.request(dav_method(b"REPORT")?, url, headers, Some(body))
            .await
    }

    /// Principal of the authenticated user, as advertised on `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the PROPFIND fails.
    pub async fn current_user_principal(&self, url: &str) -> Result<Option<Href>, DavError> {
        let props = self
            .propfind(url, &[CURRENT_USER_PRINCIPAL], Depth::Zero, HeaderMap::new())
            .await?
            .body
            .into_properties()?;
        Ok(props
            .get(&CURRENT_USER_PRINCIPAL)
            .and_then(|value| value.as_text())
            .map(Href::from))
    }

    /// Picks the entry for `url` out of a Depth-0 multi-status.
    fn single_entry(&self, url: &str, mut multistatus: MultiStatus) -> Result<PropertyMap, DavError> {
        let path = Href::from(self.pathname(url)?);
        if multistatus.len() == 1 {
            return multistatus
                .into_values()
                .next()
                .ok_or(DavError::NotFound(path));
        }

        let key = multistatus
            .keys()
            .find(|href| {
                self.pathname(href)
                    .is_ok_and(|candidate| path.same_resource(&candidate))
            })
            .cloned();
        key.and_then(|key| multistatus.remove(&key))
            .ok_or(DavError::NotFound(path))
    }

    fn transfer_headers(
        &self,
        destination: &str,
        depth: Depth,
        overwrite: bool,
        mut headers: HeaderMap,
    ) -> Result<HeaderMap, DavError> {
        let destination = self.absolute_url(destination)?;
        headers.insert("Destination", header_value(destination.as_str())?);
        headers.insert("Depth", HeaderValue::from_static(depth.as_str()));
        headers.insert(
            "Overwrite",
            HeaderValue::from_static(if overwrite { "T" } else { "F" }),
        );
        Ok(headers)
    }
}

fn dav_method(name: &[u8]) -> Result<Method, DavError> {
    Method::from_bytes(name).map_err(|e| DavError::Config(format!("Invalid method: {e}")))
}

/// Builds a header value from arbitrary text.
///
/// # Errors
///
/// Returns an error if `value` contains characters not allowed in headers.
pub fn header_value(value: &str) -> Result<HeaderValue, DavError> {
    HeaderValue::from_str(value).map_err(|e| DavError::InvalidHeader(format!("{value}: {e}")))
}

/// Builds a header map from name/value pairs.
///
/// # Errors
///
/// Returns an error if a name or value is not a valid header.
pub fn headers<'a>(
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<HeaderMap, DavError> {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| DavError::InvalidHeader(format!("{name}: {e}")))?;
        map.insert(name, header_value(value)?);
    }
    Ok(map)
}
