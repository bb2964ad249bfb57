// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Optional collection capabilities: sharing with other principals and
//! publishing a read-only URL.

use std::future::Future;

use reqwest::header::HeaderMap;

use crate::collection::Collection;
use crate::error::DavError;
use crate::names::{INVITE, PUBLISH_URL};
use crate::property::PropertyValue;
use crate::request;

/// A principal a collection is shared with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sharee {
    /// Principal href, e.g. `principal:principals/users/bob`.
    pub href: String,
    /// Display name of the principal.
    pub common_name: Option<String>,
    /// Whether the sharee may write.
    pub writable: bool,
}

/// Collections that can be shared through ownCloud-style `oc:share` requests.
pub trait Shareable: AsRef<Collection> + Sync {
    /// Grants `principal` read or read-write access.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    fn share(
        &self,
        principal: &str,
        writable: bool,
        summary: Option<&str>,
    ) -> impl Future<Output = Result<(), DavError>> + Send {
        async move {
            let collection: &Collection = self.as_ref();
            tracing::debug!(url = %collection.url(), principal, writable, "sharing collection");
            let body = request::share(principal, writable, summary)?;
            collection
                .transport()
                .post(collection.url().as_str(), HeaderMap::new(), body)
                .await?;
            Ok(())
        }
    }

    /// Revokes `principal`'s access.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    fn unshare(&self, principal: &str) -> impl Future<Output = Result<(), DavError>> + Send {
        async move {
            let collection: &Collection = self.as_ref();
            tracing::debug!(url = %collection.url(), principal, "unsharing collection");
            let body = request::unshare(principal)?;
            collection
                .transport()
                .post(collection.url().as_str(), HeaderMap::new(), body)
                .await?;
            Ok(())
        }
    }

    /// Current sharees, from the last fetched `invite` property.
    fn shares(&self) -> Vec<Sharee> {
        let collection: &Collection = self.as_ref();
        let Some(PropertyValue::Records(records)) = collection.node().property(&INVITE) else {
            return Vec::new();
        };

        records
            .iter()
            .filter_map(|record| {
                let href = record.get("href")?.as_text()?.to_string();
                let common_name = record
                    .get("common-name")
                    .and_then(PropertyValue::as_text)
                    .map(str::to_string);
                let writable = record
                    .get("access")
                    .and_then(PropertyValue::as_text)
                    .is_some_and(|access| access == "read-write");
                Some(Sharee {
                    href,
                    common_name,
                    writable,
                })
            })
            .collect()
    }
}

/// Collections that can be published through `CalendarServer` requests.
pub trait Publishable: AsRef<Collection> + Sync {
    /// Publishes the collection.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    fn publish(&self) -> impl Future<Output = Result<(), DavError>> + Send {
        async move { post_publish(self.as_ref(), true).await }
    }

    /// Withdraws a publication.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    fn unpublish(&self) -> impl Future<Output = Result<(), DavError>> + Send {
        async move { post_publish(self.as_ref(), false).await }
    }

    /// Public URL, from the last fetched `publish-url` property.
    fn publish_url(&self) -> Option<&str> {
        let collection: &Collection = self.as_ref();
        collection.node().text(&PUBLISH_URL)
    }
}

async fn post_publish(collection: &Collection, publish: bool) -> Result<(), DavError> {
    tracing::debug!(url = %collection.url(), publish, "changing publication");
    let body = request::publish(publish)?;
    collection
        .transport()
        .post(collection.url().as_str(), HeaderMap::new(), body)
        .await?;
    Ok(())
}
