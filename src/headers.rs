//! Header names and an insertion ordered header map.
use std::collections::HashSet;
use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, PoisonError};

use soft_ascii_string::SoftAsciiStr;
use total_order_multi_map::{self, EntryValues, TotalOrderMultiMap};

use crate::error::ValidationError;

pub const FROM: &str = "From";
pub const TO: &str = "To";
pub const CC: &str = "Cc";
pub const REPLY_TO: &str = "Reply-To";
pub const SUBJECT: &str = "Subject";
pub const DATE: &str = "Date";
pub const MESSAGE_ID: &str = "Message-ID";
pub const MIME_VERSION: &str = "MIME-Version";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_DISPOSITION: &str = "Content-Disposition";
pub const CONTENT_ID: &str = "Content-ID";
pub const CONTENT_DESCRIPTION: &str = "Content-Description";
pub const CONTENT_TRANSFER_ENCODING: &str = "Content-Transfer-Encoding";

/// Headers which are derived from the mail body and can not be set by hand.
const GENERATED_HEADERS: &[&str] = &[
    MIME_VERSION,
    CONTENT_TYPE,
    CONTENT_TRANSFER_ENCODING,
];

lazy_static! {
    /// Names of custom headers, each distinct name is only allocated once.
    static ref CUSTOM_NAMES: Mutex<HashSet<&'static str>> = Mutex::new(HashSet::new());
}

fn intern(name: &str) -> &'static str {
    let mut names = CUSTOM_NAMES.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(interned) = names.get(name) {
        return *interned;
    }
    let interned: &'static str = Box::leak(name.to_owned().into_boxed_str());
    names.insert(interned);
    interned
}

/// A validated header name.
///
/// Header field names only have to consist of at last one printable
/// us-ascii char excluding `:`. Comparison (and hashing) is case insensitive,
/// the letter case given on creation is kept for encoding.
#[derive(Debug, Copy, Clone)]
pub struct HeaderName {
    name: &'static SoftAsciiStr,
}

impl HeaderName {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        HeaderName::validate_name(name)?;
        Ok(HeaderName::from_static(intern(name)))
    }

    /// Creates a header name from one of the name constants in this module.
    pub(crate) fn from_static(name: &'static str) -> Self {
        HeaderName {
            name: SoftAsciiStr::from_unchecked(name),
        }
    }

    fn validate_name(name: &str) -> Result<(), ValidationError> {
        if name.is_empty() {
            return Err(ValidationError::EmptyHeaderName);
        }
        let valid = name.bytes().all(|bch| bch >= b'!' && bch <= b'~' && bch != b':');
        if !valid {
            return Err(ValidationError::InvalidHeaderName {
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        self.name.as_str()
    }

    pub fn as_ascii_str(&self) -> &'static SoftAsciiStr {
        self.name
    }

    /// True if the header is derived from the body and must not be set by hand.
    pub fn is_generated(&self) -> bool {
        GENERATED_HEADERS.iter().any(|name| *self == *name)
    }
}

impl PartialEq for HeaderName {
    fn eq(&self, other: &HeaderName) -> bool {
        self.as_str().eq_ignore_ascii_case(other.as_str())
    }
}

impl Eq for HeaderName {}

impl Hash for HeaderName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for bch in self.as_str().bytes() {
            state.write_u8(bch.to_ascii_lowercase());
        }
    }
}

impl<'a> PartialEq<&'a str> for HeaderName {
    fn eq(&self, other: &&'a str) -> bool {
        self.as_str().eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, fter: &mut fmt::Formatter) -> fmt::Result {
        fter.write_str(self.as_str())
    }
}

/// Anything which can be used to look up headers in a `HeaderMap`.
pub trait HasHeaderName {
    fn get_name(&self) -> HeaderName;
}

impl HasHeaderName for HeaderName {
    fn get_name(&self) -> HeaderName {
        *self
    }
}

/// Lookup by one of the name constants (or any other static name).
///
/// The name is not validated, an invalid name just matches no header.
impl HasHeaderName for &'static str {
    fn get_name(&self) -> HeaderName {
        HeaderName::from_static(self)
    }
}

/// Validates a header value, it can't be empty and can't contain line breaks.
///
/// Folding long lines is done when encoding the mail.
pub fn validate_header_value(name: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyHeaderValue {
            name: name.to_owned(),
        });
    }
    if value.contains(|ch: char| ch == '\r' || ch == '\n') {
        return Err(ValidationError::LineBreakInHeader {
            name: name.to_owned(),
        });
    }
    Ok(())
}

/// A header map keeping the order in which headers were inserted.
///
/// Names are compared case insensitive.
#[derive(Clone)]
pub struct HeaderMap {
    inner_map: TotalOrderMultiMap<HeaderName, String>,
}

pub type Iter<'a> = total_order_multi_map::Iter<'a, HeaderName, String>;

/// Iterator over all values for a given header name.
pub type Values<'a> = EntryValues<'a, str>;

impl Debug for HeaderMap {
    fn fmt(&self, fter: &mut fmt::Formatter) -> fmt::Result {
        write!(fter, "HeaderMap {{ ")?;
        for (key, value) in self.iter() {
            write!(fter, "{}: {:?},", key.as_str(), value)?;
        }
        write!(fter, " }}")
    }
}

impl Default for HeaderMap {
    fn default() -> Self {
        HeaderMap::new()
    }
}

impl HeaderMap {
    pub fn new() -> Self {
        HeaderMap {
            inner_map: TotalOrderMultiMap::new(),
        }
    }

    /// Sets the header, replacing all headers with the same name.
    pub fn insert(&mut self, name: HeaderName, value: impl Into<String>) {
        self.inner_map.set(name, value.into());
    }

    /// Adds the header without removing existing headers with the same name.
    pub fn append(&mut self, name: HeaderName, value: impl Into<String>) {
        self.inner_map.add(name, value.into());
    }

    /// Returns the first value for the given header name.
    pub fn get<H: HasHeaderName>(&self, name: H) -> Option<&str> {
        self.get_all(name).next()
    }

    /// Returns all values for the given header name in insertion order.
    pub fn get_all<H: HasHeaderName>(&self, name: H) -> Values {
        self.inner_map.get(name.get_name())
    }

    pub fn contains<H: HasHeaderName>(&self, name: H) -> bool {
        self.inner_map.contains_key(name.get_name())
    }

    /// Removes all headers with the given name, returns true if any was removed.
    pub fn remove<H: HasHeaderName>(&mut self, name: H) -> bool {
        self.inner_map.remove_all(name.get_name())
    }

    pub fn len(&self) -> usize {
        self.inner_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over all `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> Iter {
        self.inner_map.iter()
    }
}

impl<'a> IntoIterator for &'a HeaderMap {
    type Item = <Iter<'a> as Iterator>::Item;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
