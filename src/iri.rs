use std::path::Path;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, Fail, PartialEq, Eq)]
#[fail(display = "invalid syntax for iri/uri scheme")]
pub struct InvalidIRIScheme;

/// A minimal IRI (International Resource Identifier) implementation which just
/// parses the scheme but no scheme specific part.
///
/// It is used to identify where a resource came from (e.g. `file:/img/logo.png`
/// or `https://example.com/logo.png`) and to decide if a reference found in a
/// html body is absolute or has to be resolved against some base.
///
/// **This implementation does not perform any form of normalization, it's
/// basically just a String split into two parts.**
///
/// # Example
///
/// ```
/// # use mail_compose::IRI;
/// let uri = IRI::new("file:/random/logo.png").unwrap();
/// assert_eq!(uri.scheme(), "file");
/// assert_eq!(uri.tail(), "/random/logo.png");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct IRI {
    iri: String,
    scheme_end_idx: usize,
}

impl IRI {
    /// Create a new IRI from a scheme part and a tail part.
    ///
    /// This will convert the scheme part into lower case before
    /// using it.
    pub fn from_parts(scheme: &str, tail: &str) -> Result<Self, InvalidIRIScheme> {
        Self::validate_scheme(scheme)?;
        let scheme_len = scheme.len();
        let mut buffer = String::with_capacity(scheme_len + 1 + tail.len());
        for ch in scheme.chars() {
            buffer.push(ch.to_ascii_lowercase());
        }
        buffer.push(':');
        buffer.push_str(tail);
        Ok(IRI {
            iri: buffer,
            scheme_end_idx: scheme_len,
        })
    }

    /// Crates a `file:` IRI for given path.
    ///
    /// Non utf-8 parts of the path are replaced lossy.
    pub fn for_path(path: impl AsRef<Path>) -> Self {
        let tail = path.as_ref().to_string_lossy();
        //UNWRAP_SAFE: "file" is a valid scheme
        IRI::from_parts("file", &tail).unwrap()
    }

    /// crates a new a IRI
    ///
    /// 1. this determines the first occurrence of `:` to split the input into scheme and tail
    /// 2. it validates that the scheme name is [RFC 3986](https://tools.ietf.org/html/rfc3986)
    ///    compatible, i.e. is ascii, starting with a letter followed by alpha numeric characters
    ///    (or `"+"`,`"-"`,`"."`).
    /// 3. converts the scheme part to lower case
    pub fn new<I>(iri: I) -> Result<Self, InvalidIRIScheme>
    where
        I: Into<String>,
    {
        let mut buffer = iri.into();
        let split_pos = buffer
            .bytes()
            .position(|b| b == b':')
            .ok_or(InvalidIRIScheme)?;
        {
            let scheme = &mut buffer[..split_pos];
            Self::validate_scheme(scheme)?;
            scheme.make_ascii_lowercase();
        }

        Ok(IRI {
            iri: buffer,
            scheme_end_idx: split_pos,
        })
    }

    fn validate_scheme(scheme: &str) -> Result<(), InvalidIRIScheme> {
        let mut iter = scheme.bytes();
        let valid = iter
            .next()
            .map(|bch| bch.is_ascii_alphabetic())
            .unwrap_or(false)
            && iter.all(|bch| {
                bch.is_ascii_alphanumeric() || bch == b'+' || bch == b'-' || bch == b'.'
            });

        if !valid {
            return Err(InvalidIRIScheme);
        }
        Ok(())
    }

    /// Creates a new IRI with the same schema but a different tail.
    pub fn with_tail(&self, new_tail: &str) -> Self {
        //UNWRAP_SAFE: the scheme was already validated
        IRI::from_parts(self.scheme(), new_tail).unwrap()
    }

    /// The scheme part of the uri excluding the `:` seperator.
    ///
    /// The scheme is guaranteed to be lower case.
    pub fn scheme(&self) -> &str {
        &self.iri[..self.scheme_end_idx]
    }

    /// The scheme specific part of the uri.
    pub fn tail(&self) -> &str {
        &self.iri[self.scheme_end_idx + 1..]
    }

    /// True if this is a `http:` or `https:` IRI.
    pub fn is_http(&self) -> bool {
        let scheme = self.scheme();
        scheme == "http" || scheme == "https"
    }

    /// returns the underlying string representation
    pub fn as_str(&self) -> &str {
        &self.iri
    }
}

impl FromStr for IRI {
    type Err = InvalidIRIScheme;

    fn from_str(inp: &str) -> Result<Self, Self::Err> {
        IRI::new(inp)
    }
}

impl Into<String> for IRI {
    fn into(self) -> String {
        self.iri
    }
}
