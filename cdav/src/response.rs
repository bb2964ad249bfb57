// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Multi-status (207) response reduction.

use std::collections::HashMap;

use crate::decode::Decoders;
use crate::dom::{Element, parse_document};
use crate::error::DavError;
use crate::names::{HREF, MULTISTATUS, PROP, PROPSTAT, RESPONSE, STATUS};
use crate::property::PropertyMap;

/// Properties of every resource in a multi-status body, keyed by href.
///
/// Only properties from 2xx `<propstat>` blocks are present. A resource with
/// no successful property still maps to an empty [`PropertyMap`].
pub type MultiStatus = HashMap<String, PropertyMap>;

/// Parses and reduces a multi-status body.
///
/// # Errors
///
/// Returns an error if the XML is malformed or the root is not `<DAV:multistatus>`.
pub fn parse_multistatus(xml: &str, decoders: &Decoders) -> Result<MultiStatus, DavError> {
    let document = parse_document(xml)?;
    reduce(&document, decoders)
}

/// Reduces a parsed multi-status document.
///
/// Each `<propstat>` is kept or dropped as a whole depending on its embedded
/// status line. Properties without a registered decoder are skipped. When a
/// path repeats, later values win per property.
///
/// # Errors
///
/// Returns an error if the root is not `<DAV:multistatus>`.
pub fn reduce(document: &Element, decoders: &Decoders) -> Result<MultiStatus, DavError> {
    if document.name != MULTISTATUS {
        return Err(DavError::Xml(format!(
            "Expected {MULTISTATUS}, found {}",
            document.name
        )));
    }

    let mut result = MultiStatus::new();
    for response in document.children_named(&RESPONSE) {
        let Some(href) = response.child(&HREF) else {
            tracing::warn!("skipping multistatus response without href");
            continue;
        };

        let props = result.entry(href.text().to_string()).or_default();
        for propstat in response.children_named(&PROPSTAT) {
            let status = propstat
                .child(&STATUS)
                .and_then(|status| status_code(status.text()));
            if !matches!(status, Some(200..=299)) {
                tracing::debug!(href = href.text(), ?status, "dropping failed propstat");
                continue;
            }

            for property in propstat
                .children_named(&PROP)
                .flat_map(|prop| prop.children.iter())
            {
                if let Some(value) = decoders.decode(property) {
                    props.insert(property.name.clone(), value);
                }
            }
        }
    }

    Ok(result)
}

/// Numeric code of a status line such as `HTTP/1.1 404 Not Found`.
#[must_use]
pub fn status_code(line: &str) -> Option<u16> {
    line.split_whitespace().nth(1)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_reads_second_token() {
        assert_eq!(status_code("HTTP/1.1 200 OK"), Some(200));
        assert_eq!(status_code("  HTTP/1.1   404 Not Found "), Some(404));
        assert_eq!(status_code("HTTP/2 207"), Some(207));
        assert_eq!(status_code("HTTP/1.1"), None);
        assert_eq!(status_code("HTTP/1.1 OK"), None);
    }

    #[test]
    fn reduce_rejects_other_roots() {
        let err = parse_multistatus(r#"<d:prop xmlns:d="DAV:"/>"#, &Decoders::default());
        assert!(matches!(err, Err(DavError::Xml(_))));
    }
}
