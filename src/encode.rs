//! Turns an `EncodableMail` into the bytes of a MIME mail.
use std::borrow::Cow;

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{
    address::Mailbox,
    charset::Charset,
    error::{EncodingError, MailError},
    headers::{self, HeaderName},
    mail::{EncodableMail, Mail, MailBody},
    mime::{create_structured_random_boundary, is_text},
    resource::Data,
    utils::{is_short_line_ascii, normalize_line_breaks},
};

/// Max line length (excluding CRLF) of bodies send as `7bit`.
const MAX_7BIT_LINE_LEN: usize = 998;

const BASE64_LINE_LEN: usize = 76;

/// Max length of a single encoded word (RFC 2047).
const ENCODED_WORD_MAX_LEN: usize = 75;

const CRLF: &[u8] = b"\r\n";

/// The transfer encoding used for a single body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferEncoding {
    SevenBit,
    QuotedPrintable,
    Base64,
}

impl TransferEncoding {
    /// Picks the transfer encoding for given data.
    ///
    /// Text which is ascii and has no lines longer then 998 chars is send as
    /// `7bit`, other text is `quoted-printable` and everything else `base64`.
    pub fn for_data(data: &Data) -> Self {
        if !is_text(data.media_type()) {
            TransferEncoding::Base64
        } else if is_short_line_ascii(data.buffer(), MAX_7BIT_LINE_LEN) {
            TransferEncoding::SevenBit
        } else {
            TransferEncoding::QuotedPrintable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            TransferEncoding::SevenBit => "7bit",
            TransferEncoding::QuotedPrintable => "quoted-printable",
            TransferEncoding::Base64 => "base64",
        }
    }

    /// Transfer encodes the buffer, all line breaks in the output are CRLF.
    pub fn encode(&self, buffer: &[u8]) -> Vec<u8> {
        match *self {
            TransferEncoding::SevenBit => normalize_line_breaks(buffer),
            TransferEncoding::QuotedPrintable => {
                quoted_printable::encode(normalize_line_breaks(buffer))
            }
            TransferEncoding::Base64 => {
                let encoded = STANDARD.encode(buffer);
                let mut out = Vec::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_LEN * 2);
                for (idx, line) in encoded.as_bytes().chunks(BASE64_LINE_LEN).enumerate() {
                    if idx > 0 {
                        out.extend_from_slice(CRLF);
                    }
                    out.extend_from_slice(line);
                }
                out
            }
        }
    }
}

impl EncodableMail {
    /// Encodes the mail, returning the bytes which can be send to a mail server.
    ///
    /// A new boundary is generated for each multipart body on every call.
    pub fn encode_into_bytes(&self) -> Result<Vec<u8>, MailError> {
        let mut encoder = Encoder {
            out: Vec::new(),
            boundary_count: 0,
        };
        encoder.encode_mail(self.mail(), true)?;
        Ok(encoder.out)
    }
}

struct Encoder {
    out: Vec<u8>,
    boundary_count: usize,
}

impl Encoder {
    fn encode_mail(&mut self, mail: &Mail, top: bool) -> Result<(), MailError> {
        if top {
            self.write_header(headers::MIME_VERSION, "1.0");
        }

        for (name, value) in mail.headers().iter() {
            let name_as_str = name.as_str();
            let ignored_header =
                !top && !(name_as_str.starts_with("Content-") || name_as_str.starts_with("X-"));
            if ignored_header {
                warn!("non `Content-` header in MIME body: {:?}: {:?}", name, value);
            }
            self.encode_header(name, value)?;
        }

        match mail.body() {
            MailBody::SingleBody { body } => {
                let data = body.data().ok_or_else(|| EncodingError::NotLoaded {
                    resource: body.describe(),
                })?;
                let encoding = TransferEncoding::for_data(data);
                self.write_header(headers::CONTENT_TYPE, data.media_type().as_ref());
                self.write_header(headers::CONTENT_TRANSFER_ENCODING, encoding.as_str());
                self.out.extend_from_slice(CRLF);
                let encoded = encoding.encode(data.buffer());
                self.out.extend_from_slice(&encoded);
            }
            MailBody::MultipleBodies { kind, bodies } => {
                if bodies.is_empty() {
                    return Err(EncodingError::EmptyMultipart.into());
                }
                let boundary = create_structured_random_boundary(self.boundary_count);
                self.boundary_count += 1;

                self.write_header(headers::CONTENT_TYPE, &kind.content_type_with_boundary(&boundary));
                self.out.extend_from_slice(CRLF);

                for (idx, body) in bodies.iter().enumerate() {
                    if idx > 0 {
                        self.out.extend_from_slice(CRLF);
                    }
                    self.write_delimiter(&boundary, false);
                    self.encode_mail(body, false)?;
                }
                self.out.extend_from_slice(CRLF);
                self.write_delimiter(&boundary, true);
            }
        }
        Ok(())
    }

    fn encode_header(&mut self, name: HeaderName, value: &str) -> Result<(), EncodingError> {
        let value = encode_unstructured(value, &Charset::utf8())?;
        self.write_header(name.as_str(), &value);
        Ok(())
    }

    fn write_header(&mut self, name: &str, value: &str) {
        self.out.extend_from_slice(name.as_bytes());
        self.out.extend_from_slice(b": ");
        self.out.extend_from_slice(value.as_bytes());
        self.out.extend_from_slice(CRLF);
    }

    fn write_delimiter(&mut self, boundary: &str, close: bool) {
        self.out.extend_from_slice(b"--");
        self.out.extend_from_slice(boundary.as_bytes());
        if close {
            self.out.extend_from_slice(b"--");
        }
        self.out.extend_from_slice(CRLF);
    }
}

/// Encodes a header value as RFC 2047 encoded words if it isn't ascii.
///
/// Encoded words are `base64` encoded, long values are split into multiple
/// words on char boundaries, separated by a folding line break.
pub(crate) fn encode_unstructured<'a>(
    text: &'a str,
    charset: &Charset,
) -> Result<Cow<'a, str>, EncodingError> {
    if text.is_ascii() {
        return Ok(Cow::Borrowed(text));
    }

    // "=?" charset "?B?" payload "?="
    let max_payload_len = ENCODED_WORD_MAX_LEN.saturating_sub(charset.label().len() + 7);
    let max_input_len = (max_payload_len / 4 * 3).max(4);

    let mut words = Vec::new();
    let mut chunk = Vec::new();
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        let encoded = charset.encode(ch.encode_utf8(&mut buf))?;
        if !chunk.is_empty() && chunk.len() + encoded.len() > max_input_len {
            words.push(encoded_word(&chunk, charset));
            chunk.clear();
        }
        chunk.extend_from_slice(&encoded);
    }
    if !chunk.is_empty() {
        words.push(encoded_word(&chunk, charset));
    }
    Ok(Cow::Owned(words.join("\r\n ")))
}

fn encoded_word(bytes: &[u8], charset: &Charset) -> String {
    format!("=?{}?B?{}?=", charset.label(), STANDARD.encode(bytes))
}

/// Creates the header representation of a mailbox.
///
/// Non ascii display names are encoded as encoded words using given charset,
/// ascii display names are quoted if needed.
pub(crate) fn encode_mailbox(mailbox: &Mailbox, charset: &Charset) -> Result<String, EncodingError> {
    let name = match mailbox.display_name() {
        Some(name) => name,
        None => return Ok(mailbox.email().to_string()),
    };
    let name = if name.is_ascii() {
        quote_if_needed(name)
    } else {
        encode_unstructured(name, charset)?
    };
    Ok(format!("{} <{}>", name, mailbox.email()))
}

/// Creates the value of an address header like `To`.
pub(crate) fn encode_mailbox_list(
    mailboxes: &[Mailbox],
    charset: &Charset,
) -> Result<String, EncodingError> {
    let encoded = mailboxes
        .iter()
        .map(|mailbox| encode_mailbox(mailbox, charset))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(encoded.join(", "))
}

fn quote_if_needed(name: &str) -> Cow<str> {
    let is_phrase = name
        .bytes()
        .all(|bch| bch == b' ' || (bch.is_ascii_graphic() && !b"()<>[]:;@\\,.\"".contains(&bch)));
    if is_phrase {
        return Cow::Borrowed(name);
    }
    let mut out = String::with_capacity(name.len() + 2);
    out.push('"');
    for ch in name.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    Cow::Owned(out)
}
