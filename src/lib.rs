//! Composes MIME mails and hands them to a transport.
//!
//! This crate provides the `Email` builder which assembles a mail from
//! a plain text body, a html body, inline embedded resources (referred
//! to by content id from the html body) and attachments. The resulting
//! `Mail` uses `multipart/mixed`, `multipart/alternative` and
//! `multipart/related` bodies the way most mail clients expect them.
//!
//! Resources are looked up through `ResourceResolver` implementations,
//! which can be combined into a chain. The `html` module contains the
//! rewriter which finds `img`/`script` references in a html body, embeds
//! the referenced resources and replaces the references with `cid:` urls.
//!
//! Sending is delegated to a `Transport` implementation.
#![recursion_limit = "128"]

#[macro_use]
extern crate log;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate lazy_static;
extern crate base64;
extern crate chrono;
extern crate encoding_rs;
extern crate mime_guess;
extern crate percent_encoding;
extern crate quoted_printable;
extern crate rand;
extern crate regex;
extern crate soft_ascii_string;
extern crate total_order_multi_map;
extern crate url;
extern crate vec1;

#[cfg(feature = "serde")]
extern crate serde;
#[cfg(all(test, feature = "serde"))]
extern crate serde_json;

#[macro_use]
mod macros;
pub mod address;
pub mod charset;
pub mod compose;
pub mod content_id;
pub mod context;
mod email;
pub mod embeddings;
mod encode;
pub mod error;
pub mod headers;
pub mod html;
mod iri;
mod mail;
pub mod mime;
pub mod resolver;
mod resource;
pub mod transport;
pub mod utils;

pub mod default_impl;

pub use self::content_id::{ContentId, MessageId};
pub use self::email::*;
pub use self::iri::IRI;
pub use self::mail::*;
pub use self::mime::MultipartKind;
pub use self::resource::*;

pub use context::Context;

#[cfg(all(feature = "serde", not(feature = "serde-impl")))]
compile_error!(concat!(
    "\n---------------------------------------\n",
    " for serde use feature `serde-impl`,\n",
    " `serde` can not be used as feature in\n",
    " this crate due to limitations with Cargo\n",
    "-----------------------------------------\n"
));
