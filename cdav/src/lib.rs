// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Typed client-side resource model for `WebDAV`, `CalDAV` (RFC 4791) and
//! `CardDAV` (RFC 6352) servers.
//!
//! A [`Transport`] issues DAV requests and reduces 207 Multi-Status replies to
//! per-href property maps. A [`Collection`] resolves those maps into typed
//! children through its [`Registry`], tracks local property changes and sends
//! them back as a single PROPPATCH.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
// Allow certain clippy lints that are too restrictive for this crate
#![allow(
    clippy::option_option,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::match_bool
)]

mod addressbook;
mod calendar;
mod collection;
mod config;
pub mod decode;
pub mod dom;
pub mod encode;
mod error;
mod http;
pub mod names;
mod node;
mod object;
mod principal;
mod property;
mod registry;
pub mod request;
pub mod response;
mod sharing;
mod transport;
mod types;
pub mod xml;

pub use crate::addressbook::{AddressBook, AddressBookHome, VCard};
pub use crate::calendar::{Calendar, CalendarHome, CalendarObject};
pub use crate::collection::{Collection, Resource};
pub use crate::config::{AuthMethod, DavConfig};
pub use crate::decode::Decoders;
pub use crate::error::DavError;
pub use crate::names::QualifiedName;
pub use crate::node::DavNode;
pub use crate::object::DavObject;
pub use crate::principal::Principal;
pub use crate::property::{PropertyDescriptor, PropertyMap, PropertyValue};
pub use crate::registry::{CollectionKind, ObjectKind, Registry, base_props};
pub use crate::request::{CalendarQueryRequest, TimeRange};
pub use crate::response::MultiStatus;
pub use crate::sharing::{Publishable, Shareable, Sharee};
pub use crate::transport::{DavResponse, ResponseBody, Transport, header_value, headers};
pub use crate::types::{Depth, ETag, Href};
pub use crate::xml::{Skeleton, XmlNode};
