// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP client wrapper with authentication, status classification and cancellation.

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder};
use tokio_util::sync::CancellationToken;

use crate::config::{AuthMethod, DavConfig};
use crate::error::DavError;

/// A completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body as text.
    pub body: String,
}

/// HTTP client for DAV operations.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    config: DavConfig,
}

impl HttpClient {
    /// Creates a new HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client creation fails.
    pub fn new(config: DavConfig) -> Result<Self, DavError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| DavError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Builds a request with authentication headers.
    pub fn build_request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut req = self.client.request(method, url);

        match &self.config.auth {
            AuthMethod::Basic { username, password } => {
                req = req.basic_auth(username, Some(password));
            }
            AuthMethod::Bearer { token } => {
                req = req.bearer_auth(token);
            }
            AuthMethod::None => {}
        }

        req
    }

    /// Sends a request and classifies the outcome.
    ///
    /// A cancelled `cancel` token wins over a concurrently completing
    /// response.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::Aborted`] if cancelled, [`DavError::Network`] if no
    /// response was received, and a status-class error for non-2xx statuses.
    pub async fn execute(
        &self,
        req: RequestBuilder,
        cancel: Option<&CancellationToken>,
    ) -> Result<HttpResponse, DavError> {
        let exchange = async {
            let resp = req.send().await?;
            let status = resp.status().as_u16();
            let headers = resp.headers().clone();
            let body = resp.text().await?;
            Ok::<_, DavError>(HttpResponse {
                status,
                headers,
                body,
            })
        };

        let response = match cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => {
                    tracing::debug!("request cancelled");
                    return Err(DavError::Aborted);
                }
                response = exchange => response?,
            },
            None => exchange.await?,
        };

        if (200..300).contains(&response.status) {
            Ok(response)
        } else {
            tracing::debug!(status = response.status, "request failed");
            Err(DavError::from_status(response.status, response.body))
        }
    }
}
