// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Collections and resolution of their children.

use std::collections::BTreeSet;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::error::DavError;
use crate::names::{
    COLLECTION, CURRENT_USER_PRIVILEGE_SET, GETCONTENTTYPE, QualifiedName, RESOURCETYPE, SYNC_TOKEN,
};
use crate::node::DavNode;
use crate::object::DavObject;
use crate::property::{PropertyMap, PropertyValue};
use crate::registry::{CollectionKind, Registry, base_props};
use crate::request;
use crate::response::MultiStatus;
use crate::transport::Transport;
use crate::types::{Depth, Href};
use crate::xml::XmlNode;

const PRIVILEGE_ALL: &str = "{DAV:}all";
const PRIVILEGE_READ: &str = "{DAV:}read";
const PRIVILEGE_WRITE: &str = "{DAV:}write";

/// A resolved child of a collection.
#[derive(Debug, Clone)]
pub enum Resource {
    /// A collection.
    Collection(Collection),
    /// A non-collection resource.
    Object(DavObject),
}

impl Resource {
    /// Path of the resource.
    #[must_use]
    pub const fn url(&self) -> &Href {
        self.node().url()
    }

    /// Shared node state.
    #[must_use]
    pub const fn node(&self) -> &DavNode {
        match self {
            Self::Collection(collection) => collection.node(),
            Self::Object(object) => object.node(),
        }
    }

    /// The collection, if this is one.
    #[must_use]
    pub fn into_collection(self) -> Option<Collection> {
        match self {
            Self::Collection(collection) => Some(collection),
            Self::Object(_) => None,
        }
    }

    /// The object, if this is one.
    #[must_use]
    pub fn into_object(self) -> Option<DavObject> {
        match self {
            Self::Object(object) => Some(object),
            Self::Collection(_) => None,
        }
    }
}

/// A DAV collection.
///
/// A collection resolves its children through its own [`Registry`], so the
/// kinds it produces depend on what it has been taught, not on any global
/// table.
#[derive(Debug, Clone)]
pub struct Collection {
    transport: Transport,
    node: DavNode,
    kind: CollectionKind,
    registry: Registry,
    children_names: BTreeSet<String>,
}

impl Collection {
    /// Creates a root collection at `url`, relative to the transport's base URL.
    ///
    /// No request is made; call [`Collection::refresh`] to load properties.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` cannot be resolved.
    pub fn new(transport: Transport, url: &str, kind: CollectionKind) -> Result<Self, DavError> {
        let url = Href::collection(transport.pathname(url)?);
        Ok(Self::from_parts(
            transport,
            None,
            url,
            PropertyMap::new(),
            kind,
        ))
    }

    pub(crate) fn from_parts(
        transport: Transport,
        parent: Option<Href>,
        url: Href,
        props: PropertyMap,
        kind: CollectionKind,
    ) -> Self {
        Self {
            transport,
            node: DavNode::new(parent, url, props, kind.descriptors()),
            kind,
            registry: kind.default_registry(),
            children_names: BTreeSet::new(),
        }
    }

    /// Path of the collection, always ending in `/`.
    #[must_use]
    pub const fn url(&self) -> &Href {
        self.node.url()
    }

    /// Path of the enclosing collection.
    #[must_use]
    pub const fn parent(&self) -> Option<&Href> {
        self.node.parent()
    }

    /// Kind of this collection.
    #[must_use]
    pub const fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Shared node state.
    #[must_use]
    pub const fn node(&self) -> &DavNode {
        &self.node
    }

    /// Mutable node state.
    pub fn node_mut(&mut self) -> &mut DavNode {
        &mut self.node
    }

    /// Transport this collection talks through.
    #[must_use]
    pub const fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Child factories.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Child factories, for teaching this collection new kinds.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Child paths seen by earlier resolutions.
    #[must_use]
    pub const fn children_names(&self) -> &BTreeSet<String> {
        &self.children_names
    }

    /// `displayname`.
    #[must_use]
    pub fn displayname(&self) -> Option<&str> {
        self.node.displayname()
    }

    /// `sync-token`.
    #[must_use]
    pub fn sync_token(&self) -> Option<&str> {
        self.node.text(&SYNC_TOKEN)
    }

    /// Resource types in `{ns}local` form.
    #[must_use]
    pub fn resource_types(&self) -> &[String] {
        self.node
            .property(&RESOURCETYPE)
            .and_then(PropertyValue::as_list)
            .unwrap_or_default()
    }

    /// Reads a property by member name.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::UnknownProperty`] if this kind does not expose `member`.
    pub fn get(&self, member: &str) -> Result<Option<&PropertyValue>, DavError> {
        self.node.get(member)
    }

    /// Writes a property by member name; see [`DavNode::set`].
    ///
    /// # Errors
    ///
    /// Returns an error if `member` is unknown or read-only.
    pub fn set(&mut self, member: &str, value: impl Into<PropertyValue>) -> Result<(), DavError> {
        self.node.set(member, value)
    }

    /// Whether the current user may read this collection.
    #[must_use]
    pub fn is_readable(&self) -> bool {
        self.has_privilege(PRIVILEGE_READ)
    }

    /// Whether the current user may write to this collection.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.has_privilege(PRIVILEGE_WRITE)
    }

    fn has_privilege(&self, privilege: &str) -> bool {
        self.node
            .property(&CURRENT_USER_PRIVILEGE_SET)
            .and_then(PropertyValue::as_list)
            .is_some_and(|set| set.iter().any(|p| p == privilege || p == PRIVILEGE_ALL))
    }

    /// Whether `other` is a collection of the same kind.
    #[must_use]
    pub fn is_same_kind_as(&self, other: &Self) -> bool {
        self.kind == other.kind
    }

    /// Turns a multi-status result into typed children.
    ///
    /// The collection's own entry is skipped. Every other path becomes an
    /// object when it has no resource type but a content type, and a
    /// collection otherwise. Makes no requests.
    ///
    /// # Errors
    ///
    /// Returns an error if a path cannot be resolved against the base URL.
    pub fn resolve(
        &mut self,
        multistatus: &MultiStatus,
        is_partial: bool,
    ) -> Result<Vec<Resource>, DavError> {
        let mut entries: Vec<_> = multistatus.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut resources = Vec::with_capacity(entries.len());
        for (href, props) in entries {
            let path = self.transport.pathname(href)?;
            if self.node.url().same_resource(&path) {
                continue;
            }

            let resource_types = props
                .get(&RESOURCETYPE)
                .and_then(PropertyValue::as_list)
                .unwrap_or_default();
            let content_type = props.get(&GETCONTENTTYPE).and_then(PropertyValue::as_text);

            let resource = match content_type {
                Some(content_type) if resource_types.is_empty() => {
                    let mime = content_type
                        .split(';')
                        .next()
                        .unwrap_or_default()
                        .trim();
                    let kind = self.registry.object_kind(mime);
                    Resource::Object(DavObject::from_parts(
                        self.transport.clone(),
                        Some(self.url().clone()),
                        Href::new(path.clone()),
                        props.clone(),
                        kind,
                        is_partial,
                    ))
                }
                _ => {
                    let collection = COLLECTION.to_string();
                    let kind = resource_types
                        .iter()
                        .find(|t| **t != collection)
                        .and_then(|t| t.parse::<QualifiedName>().ok())
                        .map(|t| self.registry.collection_kind(&t))
                        .unwrap_or_default();
                    Resource::Collection(Self::from_parts(
                        self.transport.clone(),
                        Some(self.url().clone()),
                        Href::collection(path.clone()),
                        props.clone(),
                        kind,
                    ))
                }
            };

            tracing::trace!(url = %resource.url(), "resolved child");
            self.children_names.insert(path);
            resources.push(resource);
        }
        Ok(resources)
    }

    /// Every child with the full property list of every registered kind.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn find_all(&mut self) -> Result<Vec<Resource>, DavError> {
        let props = self.registry.propfind_props();
        self.find_children(&props, false).await
    }

    /// Every child with only the base properties; objects are partial.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn find_all_shallow(&mut self) -> Result<Vec<Resource>, DavError> {
        self.find_children(&base_props(), true).await
    }

    /// Children of [`Collection::find_all`] matching `predicate`.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn find_all_by_filter<F>(&mut self, predicate: F) -> Result<Vec<Resource>, DavError>
    where
        F: Fn(&Resource) -> bool,
    {
        let children = self.find_all().await?;
        Ok(children.into_iter().filter(predicate).collect())
    }

    async fn find_children(
        &mut self,
        props: &[QualifiedName],
        is_partial: bool,
    ) -> Result<Vec<Resource>, DavError> {
        tracing::debug!(url = %self.url(), is_partial, "listing collection");
        let multistatus = self
            .transport
            .propfind(self.url().as_str(), props, Depth::One, HeaderMap::new())
            .await?
            .body
            .into_multistatus()?;
        self.resolve(&multistatus, is_partial)
    }

    /// Sends a Depth-1 REPORT to this collection and resolves the entries.
    pub(crate) async fn report_children(&mut self, body: String) -> Result<Vec<Resource>, DavError> {
        let mut headers = HeaderMap::new();
        headers.insert("Depth", HeaderValue::from_static(Depth::One.as_str()));
        let multistatus = self
            .transport
            .report(self.url().as_str(), headers, body)
            .await?
            .body
            .into_multistatus()?;
        self.resolve(&multistatus, false)
    }

    /// A single child, by name relative to this collection.
    ///
    /// # Errors
    ///
    /// Returns [`DavError::NotFound`] if the server has no entry for the child.
    pub async fn find(&mut self, name: &str) -> Result<Resource, DavError> {
        let url = self.url().join(name);
        let props = self
            .transport
            .propfind(
                url.as_str(),
                &self.registry.propfind_props(),
                Depth::Zero,
                HeaderMap::new(),
            )
            .await?
            .body
            .into_properties()?;

        let multistatus = MultiStatus::from([(url.to_string(), props)]);
        self.resolve(&multistatus, false)?
            .pop()
            .ok_or(DavError::NotFound(url))
    }

    /// Reloads this collection's own properties.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn refresh(&mut self) -> Result<(), DavError> {
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
        self.node.replace_props(props);
        Ok(())
    }

    /// Creates a child collection with an extended MKCOL.
    ///
    /// `name` is made unique against the children seen so far by appending
    /// `-1`, `-2`, …
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn create_collection(
        &mut self,
        name: &str,
        resource_types: &[QualifiedName],
        props: Vec<XmlNode>,
    ) -> Result<Resource, DavError> {
        let name = self.unique_name(name.trim_matches('/'), true);
        let url = Href::collection(self.url().join(&name).to_string());
        tracing::debug!(url = %url, "creating collection");

        let body = request::mkcol(resource_types, props)?;
        self.transport
            .mkcol(url.as_str(), HeaderMap::new(), Some(body))
            .await?;
        self.find(&format!("{name}/")).await
    }

    /// Creates a child collection of `kind`, encoding `props` with its encoders.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn create_collection_of(
        &mut self,
        kind: CollectionKind,
        name: &str,
        props: &[(QualifiedName, PropertyValue)],
    ) -> Result<Resource, DavError> {
        let nodes = crate::encode::encode_with(kind.encoders(), props);
        let resource_types: Vec<_> = kind.resource_type().into_iter().collect();
        self.create_collection(name, &resource_types, nodes).await
    }

    /// Uploads a new object; fails if `name` already exists on the server.
    ///
    /// # Errors
    ///
    /// Propagates transport errors, e.g. 412 when the object exists.
    pub async fn create_object(
        &mut self,
        name: &str,
        mut headers: HeaderMap,
        data: String,
    ) -> Result<Resource, DavError> {
        let url = self.url().join(name);
        tracing::debug!(url = %url, "creating object");

        headers.insert("If-None-Match", HeaderValue::from_static("*"));
        self.transport.put(url.as_str(), headers, data).await?;
        self.find(name).await
    }

    /// Sends changed properties as one PROPPATCH; does nothing when clean.
    ///
    /// # Errors
    ///
    /// Propagates transport errors; the dirty set is kept on failure.
    pub async fn update(&mut self) -> Result<(), DavError> {
        self.node
            .update(&self.transport, self.kind.encoders())
            .await
    }

    /// Deletes the collection on the server.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn delete(&self, headers: HeaderMap) -> Result<(), DavError> {
        tracing::debug!(url = %self.url(), "deleting collection");
        self.transport.delete(self.url().as_str(), headers).await?;
        Ok(())
    }

    fn unique_name(&self, name: &str, is_collection: bool) -> String {
        let (stem, extension) = match name.rsplit_once('.') {
            Some((stem, extension)) if !is_collection && !stem.is_empty() => {
                (stem, Some(extension))
            }
            _ => (name, None),
        };

        let mut candidate = name.to_string();
        let mut counter = 0;
        while self.has_child(&candidate) {
            counter += 1;
            candidate = match extension {
                Some(extension) => format!("{stem}-{counter}.{extension}"),
                None => format!("{stem}-{counter}"),
            };
        }
        candidate
    }

    fn has_child(&self, name: &str) -> bool {
        let url = self.url().join(name);
        self.children_names
            .iter()
            .any(|child| url.same_resource(child))
    }
}
