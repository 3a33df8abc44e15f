//! Charsets used for text bodies and encoded header words.
use std::borrow::Cow;
use std::fmt;

use encoding_rs::{Encoding, UTF_8};

use crate::error::{EncodingError, ValidationError};

/// A charset known to `encoding_rs` together with the label it was created from.
///
/// The label is kept as given (lower cased) as some mail clients expect
/// e.g. `iso-8859-1` and not `windows-1252` which is what `encoding_rs`
/// maps it to. For encodings which `encoding_rs` can only decode (like
/// `utf-16`) the label of the output encoding is used instead.
#[derive(Clone, PartialEq, Eq)]
pub struct Charset {
    label: String,
    encoding: &'static Encoding,
}

impl Charset {
    /// Looks up the charset for the given label.
    pub fn new(label: &str) -> Result<Self, ValidationError> {
        let label = label.trim();
        let encoding = Encoding::for_label_no_replacement(label.as_bytes()).ok_or_else(|| {
            ValidationError::UnknownCharset {
                charset: label.to_owned(),
            }
        })?;

        let output = encoding.output_encoding();
        let label = if output == encoding {
            label.to_ascii_lowercase()
        } else {
            output.name().to_ascii_lowercase()
        };

        Ok(Charset {
            label,
            encoding: output,
        })
    }

    pub fn utf8() -> Self {
        Charset {
            label: "utf-8".to_owned(),
            encoding: UTF_8,
        }
    }

    /// The label used in `charset=` parameters and encoded words.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_utf8(&self) -> bool {
        self.encoding == UTF_8
    }

    /// Encodes the text, failing if it contains unmappable characters.
    pub fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>, EncodingError> {
        let (bytes, _, had_errors) = self.encoding.encode(text);
        if had_errors {
            return Err(EncodingError::Unencodable {
                charset: self.label.clone(),
            });
        }
        Ok(bytes)
    }
}

impl Default for Charset {
    fn default() -> Self {
        Charset::utf8()
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, fter: &mut fmt::Formatter) -> fmt::Result {
        write!(fter, "Charset({:?})", self.label)
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, fter: &mut fmt::Formatter) -> fmt::Result {
        fter.write_str(&self.label)
    }
}
