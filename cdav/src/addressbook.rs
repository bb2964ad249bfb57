// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! `CardDAV` views over collections and objects (RFC 6352).

use std::ops::{Deref, DerefMut};

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use uuid::Uuid;

use crate::collection::{Collection, Resource};
use crate::error::DavError;
use crate::names::{ADDRESSBOOK_DESCRIPTION, ADDRESSBOOK_MULTIGET, DISPLAYNAME, ENABLED, READ_ONLY};
use crate::object::DavObject;
use crate::property::PropertyValue;
use crate::registry::{CollectionKind, ObjectKind};
use crate::request;
use crate::sharing::{Publishable, Shareable};
use crate::types::Href;

/// An address-book home: the collection holding a user's address books.
#[derive(Debug, Clone)]
pub struct AddressBookHome(Collection);

impl AddressBookHome {
    /// Views `collection` as an address-book home.
    #[must_use]
    pub fn from_collection(collection: Collection) -> Option<Self> {
        (collection.kind() == CollectionKind::AddressBookHome).then_some(Self(collection))
    }

    /// Returns the underlying collection.
    #[must_use]
    pub fn into_inner(self) -> Collection {
        self.0
    }

    /// Every address book in this home.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn find_all_address_books(&mut self) -> Result<Vec<AddressBook>, DavError> {
        let children = self.0.find_all().await?;
        Ok(children
            .into_iter()
            .filter_map(Resource::into_collection)
            .filter_map(AddressBook::from_collection)
            .collect())
    }

    /// Creates an address book named `name`, also used as its display name.
    ///
    /// # Errors
    ///
    /// Propagates transport errors; returns [`DavError::NotFound`] if the
    /// created collection is not reported as an address book.
    pub async fn create_address_book(&mut self, name: &str) -> Result<AddressBook, DavError> {
        let props = [(DISPLAYNAME, PropertyValue::from(name))];
        let resource = self
            .0
            .create_collection_of(CollectionKind::AddressBook, name, &props)
            .await?;
        let url = resource.url().clone();
        resource
            .into_collection()
            .and_then(AddressBook::from_collection)
            .ok_or(DavError::NotFound(url))
    }
}

impl Deref for AddressBookHome {
    type Target = Collection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for AddressBookHome {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// A `CardDAV` address book.
#[derive(Debug, Clone)]
pub struct AddressBook(Collection);

impl AddressBook {
    /// Views `collection` as an address book.
    #[must_use]
    pub fn from_collection(collection: Collection) -> Option<Self> {
        (collection.kind() == CollectionKind::AddressBook).then_some(Self(collection))
    }

    /// Returns the underlying collection.
    #[must_use]
    pub fn into_inner(self) -> Collection {
        self.0
    }

    /// `addressbook-description`.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.0.node().text(&ADDRESSBOOK_DESCRIPTION)
    }

    /// Sets the description.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor table rejects the write.
    pub fn set_description(&mut self, description: &str) -> Result<(), DavError> {
        self.0.set("description", description)
    }

    /// ownCloud `enabled`.
    #[must_use]
    pub fn enabled(&self) -> Option<bool> {
        self.0
            .node()
            .property(&ENABLED)
            .and_then(PropertyValue::as_bool)
    }

    /// Enables or disables the address book.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor table rejects the write.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), DavError> {
        self.0.set("enabled", enabled)
    }

    /// ownCloud `read-only`, set on address books shared without write access.
    #[must_use]
    pub fn read_only(&self) -> bool {
        self.0
            .node()
            .property(&READ_ONLY)
            .and_then(PropertyValue::as_bool)
            .unwrap_or(false)
    }

    /// Every vCard with its data.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn find_all_vcards(&mut self) -> Result<Vec<VCard>, DavError> {
        let children = self.0.find_all().await?;
        Ok(vcards(children))
    }

    /// Fetches the given vCards in one request.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn addressbook_multiget(&mut self, hrefs: &[Href]) -> Result<Vec<VCard>, DavError> {
        if hrefs.is_empty() {
            return Ok(Vec::new());
        }

        let body = request::multiget(
            ADDRESSBOOK_MULTIGET,
            &ObjectKind::VCard.propfind_props(),
            hrefs,
        )?;
        Ok(vcards(self.0.report_children(body).await?))
    }

    /// Uploads `data` as a new vCard named `<uuid>.vcf`.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub async fn create_vcard(&mut self, data: String) -> Result<VCard, DavError> {
        let name = format!("{}.vcf", Uuid::new_v4());
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/vcard; charset=utf-8"));

        let resource = self.0.create_object(&name, headers, data).await?;
        let url = resource.url().clone();
        resource
            .into_object()
            .and_then(VCard::from_object)
            .ok_or(DavError::NotFound(url))
    }
}

fn vcards(resources: Vec<Resource>) -> Vec<VCard> {
    resources
        .into_iter()
        .filter_map(Resource::into_object)
        .filter_map(VCard::from_object)
        .collect()
}

impl Deref for AddressBook {
    type Target = Collection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for AddressBook {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl AsRef<Collection> for AddressBook {
    fn as_ref(&self) -> &Collection {
        &self.0
    }
}

impl Shareable for AddressBook {}

impl Publishable for AddressBook {}

/// A vCard inside an address book.
#[derive(Debug, Clone)]
pub struct VCard(DavObject);

impl VCard {
    /// Views `object` as a vCard.
    #[must_use]
    pub fn from_object(object: DavObject) -> Option<Self> {
        (object.kind() == ObjectKind::VCard).then_some(Self(object))
    }

    /// Returns the underlying object.
    #[must_use]
    pub fn into_inner(self) -> DavObject {
        self.0
    }
}

impl Deref for VCard {
    type Target = DavObject;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for VCard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
