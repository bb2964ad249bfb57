// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::types::Href;

/// DAV client errors.
///
/// The transport is the only place that classifies failures; every other
/// layer propagates them unchanged.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum DavError {
    /// The request was cancelled by the caller.
    #[error("Request aborted")]
    Aborted,

    /// No response reached the client (DNS, connection or TLS failure).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a 4xx status.
    #[error("Client error {status}: {body}")]
    Client {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        body: String,
    },

    /// The server answered with a 5xx status.
    #[error("Server error {status}: {body}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        body: String,
    },

    /// Any other non-2xx status.
    #[error("Unexpected HTTP status {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        body: String,
    },

    /// XML parsing/writing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// A URL could not be parsed or resolved against the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A header value could not be encoded.
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    /// The requested path is absent from a multi-status response.
    #[error("Resource not found: {0}")]
    NotFound(Href),

    /// Attempted to write a read-only property.
    #[error("Property `{0}` is read-only")]
    ReadOnlyProperty(String),

    /// The node kind does not expose a property with this member name.
    #[error("Unknown property `{0}`")]
    UnknownProperty(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DavError {
    /// Returns the HTTP status for errors that carry one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Client { status, .. } | Self::Server { status, .. } | Self::Http { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Whether a caller may reasonably retry the operation.
    ///
    /// Only network failures and 5xx responses qualify; nothing is retried
    /// internally.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }

    /// Classifies a non-2xx status.
    pub(crate) fn from_status(status: u16, body: String) -> Self {
        match status {
            400..=499 => Self::Client { status, body },
            500..=599 => Self::Server { status, body },
            _ => Self::Http { status, body },
        }
    }
}

impl From<reqwest::Error> for DavError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

impl From<quick_xml::Error> for DavError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

impl From<std::io::Error> for DavError {
    fn from(e: std::io::Error) -> Self {
        Self::Xml(format!("IO error: {e}"))
    }
}
