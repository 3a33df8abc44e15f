//! Media types and multipart boundaries.
use std::fmt::{self, Display};
use std::path::Path;

use mime::Mime;
use rand::{self, Rng};

// The maximal boundary with which " boundary=\"...\"" fits into the 78 chars line length limit
const MULTIPART_BOUNDARY_MAX_LENGTH: usize = 66;

// Does not include ' ' so that the last char needs no special handling.
static BOUNDARY_CHARS: &[u8] = b"'()+,-./0123456789:=?ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Prevents collisions with base64/quoted-printable encoded bodies.
static ANTI_COLLISION_CHARS: &str = "=_^";

lazy_static! {
    // UNWRAP_SAFE: constant valid media types
    static ref MULTIPART_MIXED: Mime = "multipart/mixed".parse().unwrap();
    static ref MULTIPART_ALTERNATIVE: Mime = "multipart/alternative".parse().unwrap();
    static ref MULTIPART_RELATED: Mime = "multipart/related".parse().unwrap();
}

/// The multipart sub-types this crate produces.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MultipartKind {
    /// `multipart/mixed`, the body followed by attachments
    Mixed,
    /// `multipart/alternative`, the same content in different formats
    Alternative,
    /// `multipart/related`, a html body and the resources it refers to
    Related,
}

impl MultipartKind {
    pub fn subtype(&self) -> &'static str {
        match *self {
            MultipartKind::Mixed => "mixed",
            MultipartKind::Alternative => "alternative",
            MultipartKind::Related => "related",
        }
    }

    /// Returns the media type without any parameters.
    pub fn media_type(&self) -> Mime {
        match *self {
            MultipartKind::Mixed => MULTIPART_MIXED.clone(),
            MultipartKind::Alternative => MULTIPART_ALTERNATIVE.clone(),
            MultipartKind::Related => MULTIPART_RELATED.clone(),
        }
    }

    /// Returns the `Content-Type` header value for a body using given boundary.
    pub fn content_type_with_boundary(&self, boundary: &str) -> String {
        format!("multipart/{}; boundary=\"{}\"", self.subtype(), boundary)
    }
}

impl Display for MultipartKind {
    fn fmt(&self, fter: &mut fmt::Formatter) -> fmt::Result {
        write!(fter, "multipart/{}", self.subtype())
    }
}

/// True if the media type is a `multipart/*` type.
pub fn is_multipart(media_type: &Mime) -> bool {
    media_type.type_() == mime::MULTIPART
}

/// True if the media type is a `text/*` type.
pub fn is_text(media_type: &Mime) -> bool {
    media_type.type_() == mime::TEXT
}

/// Guesses the media type based on the file extension of the path.
///
/// Falls back to `application/octet-stream`.
pub fn guess_media_type(path: impl AsRef<Path>) -> Mime {
    mime_guess::from_path(path.as_ref()).first_or_octet_stream()
}

/// Creates a `text/<subtype>; charset=<charset>` media type.
pub fn text_media_type(subtype: &str, charset: &str) -> Mime {
    format!("text/{}; charset={}", subtype, charset)
        .parse()
        .unwrap_or(mime::TEXT_PLAIN_UTF_8)
}

/// Generate a boundary from a counter, "=_^" and a random sequence of boundary chars.
///
/// _Be aware that the boundary has to be quoted when used in a header._
///
/// The boundary will start with `=_^`, which is neither valid for base64 nor
/// quoted-printable encoding, followed by a hex repr. of the given count,
/// a `.` and a random sequence of boundary chars.
///
/// The boundary is 66 chars long, so that if the boundary parameter is
/// placed on it's own line it won't be longer then 78 chars.
///
/// The random characters are picked based on the grammar defined in rfc2046:
///
/// ```BNF
/// boundary := 0*69<bchars> bcharsnospace
/// bchars := bcharsnospace / " "
/// bcharsnospace := DIGIT / ALPHA / "'" / "(" / ")" /
///                  "+" / "_" / "," / "-" / "." /
///                  "/" / ":" / "=" / "?"
/// ```
pub fn create_structured_random_boundary(count: usize) -> String {
    let mut out = format!(
        "{anti_collision}{count:x}.",
        anti_collision = ANTI_COLLISION_CHARS,
        count = count
    );

    let rem = MULTIPART_BOUNDARY_MAX_LENGTH.saturating_sub(out.len());
    out.reserve(rem);

    let mut rng = rand::thread_rng();
    for _ in 0..rem {
        let idx = rng.gen_range(0..BOUNDARY_CHARS.len());
        out.push(BOUNDARY_CHARS[idx] as char);
    }

    out
}
