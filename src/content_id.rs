//! Content-ID and Message-ID values.
//!
//! A content id is used to refer to a body of a mail from another
//! body, e.g. a html body refers to an embedded image with a
//! `cid:<content-id>` url while the image body has a
//! `Content-ID: <content-id>` header.
use std::fmt::{self, Display};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::{self, Rng};
use soft_ascii_string::{SoftAsciiStr, SoftAsciiString};

/// Length of randomly generated content ids.
pub const RANDOM_CONTENT_ID_LEN: usize = 10;

/// Characters which are percent encoded when turning a user given id into a content id.
///
/// Everything except `A-Za-z0-9` and `-_.*+$!'(),@` is escaped (RFC 2392 url safe).
const CID_ESCAPE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'*')
    .remove(b'+')
    .remove(b'$')
    .remove(b'!')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b',')
    .remove(b'@');

/// A content id, as used in the `Content-ID` header and `cid:` urls.
///
/// The contained string is guaranteed to be ascii and to only contain the
/// url safe characters of RFC 2392 (and `%` escapes), so it can be used
/// both in a header and in a url without further escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentId(SoftAsciiString);

impl ContentId {
    /// Creates a content id from a (user given) id, percent encoding unsafe characters.
    ///
    /// Returns `None` if the id is empty.
    pub fn new(id: &str) -> Option<Self> {
        if id.is_empty() {
            return None;
        }
        let encoded = utf8_percent_encode(id, CID_ESCAPE_SET).to_string();
        Some(ContentId(SoftAsciiString::from_unchecked(encoded)))
    }

    /// Creates a random content id of `RANDOM_CONTENT_ID_LEN` lower case letters.
    ///
    /// Uniqueness is not checked against other ids in the same mail.
    pub fn random() -> Self {
        Self::random_with_len(RANDOM_CONTENT_ID_LEN)
    }

    /// Creates a random content id of `len` lower case letters.
    pub fn random_with_len(len: usize) -> Self {
        let mut rng = rand::thread_rng();
        let mut out = String::with_capacity(len);
        for _ in 0..len {
            let idx = rng.gen_range(0..26u8);
            out.push((b'a' + idx) as char);
        }
        ContentId(SoftAsciiString::from_unchecked(out))
    }

    /// Parses the value of a `cid:` url (the `cid:` prefix is optional).
    ///
    /// The value is kept in it's encoded form, i.e. `cid:a%20b` becomes the
    /// content id `a%20b`.
    pub fn from_cid_url(url: &str) -> Option<Self> {
        let value = strip_cid_scheme(url).unwrap_or(url);
        if value.is_empty() || !value.bytes().all(is_encoded_cid_byte) {
            return None;
        }
        Some(ContentId(SoftAsciiString::from_unchecked(value)))
    }

    /// The encoded id.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_ascii_str(&self) -> &SoftAsciiStr {
        &self.0
    }

    /// The percent decoded id, i.e. the id the user originally passed in.
    pub fn decoded(&self) -> String {
        percent_decode_str(self.as_str())
            .decode_utf8_lossy()
            .into_owned()
    }

    /// The value used in the `Content-ID` header, i.e. `<id>`.
    pub fn header_value(&self) -> String {
        format!("<{}>", self.0)
    }

    /// The url used to refer to the content, i.e. `cid:id`.
    pub fn cid_url(&self) -> String {
        format!("cid:{}", self.0)
    }
}

impl Display for ContentId {
    fn fmt(&self, fter: &mut fmt::Formatter) -> fmt::Result {
        fter.write_str(self.as_str())
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Returns the part after a case insensitive `cid:` prefix.
pub fn strip_cid_scheme(reference: &str) -> Option<&str> {
    if reference.len() >= 4 && reference.as_bytes()[..4].eq_ignore_ascii_case(b"cid:") {
        Some(&reference[4..])
    } else {
        None
    }
}

/// True if the reference is a `cid:` url.
pub fn is_cid_reference(reference: &str) -> bool {
    strip_cid_scheme(reference).is_some()
}

fn is_encoded_cid_byte(bch: u8) -> bool {
    bch == b'%' || bch.is_ascii_alphanumeric() || b"-_.*+$!'(),@".contains(&bch)
}

/// A message id, the part between `<` and `>` in the `Message-ID` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(SoftAsciiString);

impl MessageId {
    /// Creates a new message id without validating it.
    pub fn from_unchecked(id: impl Into<String>) -> Self {
        MessageId(SoftAsciiString::from_unchecked(id.into()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The value used in the `Message-ID` header, i.e. `<id>`.
    pub fn header_value(&self) -> String {
        format!("<{}>", self.0)
    }
}

impl Display for MessageId {
    fn fmt(&self, fter: &mut fmt::Formatter) -> fmt::Result {
        fter.write_str(self.as_str())
    }
}
