// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Non-collection resources.

use reqwest::header::{CONTENT_TYPE, HeaderMap};

use crate::collection::Collection;
use crate::error::DavError;
use crate::names::{GETCONTENTTYPE, GETETAG};
use crate::node::DavNode;
use crate::property::{PropertyMap, PropertyValue};
use crate::registry::ObjectKind;
use crate::transport::{Transport, header_value};
use crate::types::{Depth, ETag, Href};

/// A leaf resource such as a calendar object or a vCard.
#[derive(Debug, Clone)]
pub struct DavObject {
    transport: Transport,
    node: DavNode,
    kind: ObjectKind,
    data: Option<String>,
    is_partial: bool,
    data_dirty: bool,
}

impl DavObject {
    pub(crate) fn from_parts(
        transport: Transport,
        parent: Option<Href>,
        url: Href,
        props: PropertyMap,
        kind: ObjectKind,
        is_partial: bool,
    ) -> Self {
        let data = data_from(kind, &props);
        Self {
            transport,
            node: DavNode::new(parent, url, props, kind.descriptors()),
            kind,
            data,
            is_partial,
            data_dirty: false,
        }
    }

    /// Path of the object.
    #[must_use]
    pub const fn url(&self) -> &Href {
        self.node.url()
    }

    /// Path of the enclosing collection.
    #[must_use]
    pub const fn parent(&self) -> Option<&Href> {
        self.node.parent()
    }

    /// Kind of this object.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Shared node state.
    #[must_use]
    pub const fn node(&self) -> &DavNode {
        &self.node
    }

    /// Whether only the base properties were fetched, so the body is unknown.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.is_partial
    }

    /// Body of the object, if known.
    #[must_use]
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// `getetag`.
    #[must_use]
    pub fn etag(&self) -> Option<ETag> {
        self.node.etag()
    }

    /// `getcontenttype`.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.node.text(&GETCONTENTTYPE)
    }

    /// Reads a property by member name.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::UnknownProperty`] if this kind does not expose `member`.
    pub fn get(&self, member: &str) -> Result<Option<&PropertyValue>, DavError> {
        self.node.get(member)
    }

    /// Replaces the body; sent by the next [`DavObject::update`].
    pub fn set_data(&mut self, data: impl Into<String>) {
        self.data = Some(data.into());
        self.data_dirty = true;
    }

    /// Whether the body changed since the last upload.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.data_dirty
    }

    /// Loads the body and full property set unless already complete.
    ///
    /// Generic objects are fetched with GET, typed objects with a Depth-0
    /// PROPFIND that includes the data property.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn fetch_complete_data(&mut self, force: bool) -> Result<(), DavError> {
        if !self.is_partial && !force {
            return Ok(());
        }

        tracing::debug!(url = %self.url(), force, "fetching complete object");
        if self.kind.data_property().is_some() {
            self.refetch().await?;
        } else {
            let response = self
                .transport
                .get(self.url().as_str(), HeaderMap::new())
                .await?;
            if let Some(etag) = response.etag() {
                self.set_etag(etag);
            }
            self.data = Some(response.body.into_text()?);
        }
        self.is_partial = false;
        self.data_dirty = false;
        Ok(())
    }

    /// Uploads a changed body; does nothing when unchanged.
    ///
    /// The PUT carries `If-Match` when an `ETag` is known. The new `ETag` is
    /// taken from the response, or refetched when the server omits it.
    ///
    /// # Errors
    ///
    /// Propagates transport errors, e.g. 412 on an `ETag` mismatch.
    pub async fn update(&mut self) -> Result<(), DavError> {
        if !self.data_dirty {
            return Ok(());
        }
        let data = self.data.clone().unwrap_or_default();

        let mut headers = HeaderMap::new();
        let content_type = self
            .kind
            .content_type()
            .or_else(|| self.content_type())
            .unwrap_or("application/octet-stream");
        headers.insert(CONTENT_TYPE, header_value(content_type)?);
        if let Some(etag) = self.etag() {
            headers.insert("If-Match", header_value(etag.as_str())?);
        }

        tracing::debug!(url = %self.url(), "uploading object");
        let response = self
            .transport
            .put(self.url().as_str(), headers, data)
            .await?;
        self.data_dirty = false;

        match response.etag() {
            Some(etag) => self.set_etag(etag),
            None => self.refetch().await?,
        }
        Ok(())
    }

    /// Copies the object into `destination`, keeping its file name.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn copy(
        &self,
        destination: &Collection,
        overwrite: bool,
        headers: HeaderMap,
    ) -> Result<Self, DavError> {
        let target = destination.url().join(Transport::filename(self.url()));
        tracing::debug!(from = %self.url(), to = %target, "copying object");
        self.transport
            .copy(self.url().as_str(), target.as_str(), Depth::Zero, overwrite, headers)
            .await?;

        let mut copy = Self::from_parts(
            self.transport.clone(),
            Some(destination.url().clone()),
            target,
            PropertyMap::new(),
            self.kind,
            true,
        );
        copy.refetch().await?;
        Ok(copy)
    }

    /// Moves the object into `destination`, keeping its file name.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn move_to(
        &mut self,
        destination: &Collection,
        overwrite: bool,
        headers: HeaderMap,
    ) -> Result<(), DavError> {
        let target = destination.url().join(Transport::filename(self.url()));
        tracing::debug!(from = %self.url(), to = %target, "moving object");
        self.transport
            .move_to(self.url().as_str(), target.as_str(), overwrite, headers)
            .await?;
        self.node
            .relocate(Some(destination.url().clone()), target);
        Ok(())
    }

    /// Deletes the object, guarded by `If-Match` when an `ETag` is known.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn delete(&self, mut headers: HeaderMap) -> Result<(), DavError> {
        if let Some(etag) = self.etag()
            && !headers.contains_key("If-Match")
        {
            headers.insert("If-Match", header_value(etag.as_str())?);
        }
        tracing::debug!(url = %self.url(), "deleting object");
        self.transport.delete(self.url().as_str(), headers).await?;
        Ok(())
    }

    async fn refetch(&mut self) -> Result<(), DavError> {
        let props = self
            .transport
            .propfind(
                self.url().as_str(),
                &self.kind.propfind_props(),
                Depth::Zero,
                HeaderMap::new(),
            )
            .await?
            .body
            .into_properties()?;
        if let Some(data) = data_from(self.kind, &props) {
            self.data = Some(data);
        }
        self.node.replace_props(props);
        self.is_partial = false;
        Ok(())
    }

    fn set_etag(&mut self, etag: ETag) {
        self.node
            .store(GETETAG, PropertyValue::Text(etag.as_str().to_string()));
    }
}

fn data_from(kind: ObjectKind, props: &PropertyMap) -> Option<String> {
    kind.data_property()
        .and_then(|name| props.get(&name))
        .and_then(PropertyValue::as_text)
        .map(str::to_string)
}
