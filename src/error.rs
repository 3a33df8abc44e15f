//! Module containing all custom errors produced by this crate.
use std::fmt::{self, Display};

use failure::{Backtrace, Context, Error as FError, Fail};

/// General error used by the `Email` builder and the functions it is composed of.
///
/// The variants allow a caller to differ between "the input was bad"
/// (`Validation`, `ResourceLoading`, `Rebinding`), "the builder was used
/// incorrectly" (`State`) and failures of collaborators (`Transport`).
#[derive(Debug, Fail)]
pub enum MailError {
    #[fail(display = "{}", _0)]
    Validation(#[cause] ValidationError),

    #[fail(display = "{}", _0)]
    ResourceLoading(#[cause] ResourceLoadingError),

    #[fail(display = "{}", _0)]
    Rebinding(#[cause] RebindingError),

    #[fail(display = "{}", _0)]
    State(#[cause] StateError),

    #[fail(display = "{}", _0)]
    Transport(#[cause] TransportError),

    #[fail(display = "{}", _0)]
    Encoding(#[cause] EncodingError),
}

impl From<ValidationError> for MailError {
    fn from(err: ValidationError) -> Self {
        MailError::Validation(err)
    }
}

impl From<ResourceLoadingError> for MailError {
    fn from(err: ResourceLoadingError) -> Self {
        MailError::ResourceLoading(err)
    }
}

impl From<RebindingError> for MailError {
    fn from(err: RebindingError) -> Self {
        MailError::Rebinding(err)
    }
}

impl From<StateError> for MailError {
    fn from(err: StateError) -> Self {
        MailError::State(err)
    }
}

impl From<TransportError> for MailError {
    fn from(err: TransportError) -> Self {
        MailError::Transport(err)
    }
}

impl From<EncodingError> for MailError {
    fn from(err: EncodingError) -> Self {
        MailError::Encoding(err)
    }
}

/// Errors caused by invalid input, raised before any I/O happens.
#[derive(Clone, Debug, Fail, PartialEq, Eq)]
pub enum ValidationError {
    #[fail(display = "name can not be empty")]
    EmptyName,

    #[fail(display = "content id can not be empty")]
    EmptyContentId,

    #[fail(display = "header name can not be empty")]
    EmptyHeaderName,

    #[fail(display = "invalid header name: {:?}", name)]
    InvalidHeaderName { name: String },

    #[fail(display = "value of header {} can not be empty", name)]
    EmptyHeaderValue { name: String },

    #[fail(display = "value of header {} contains a line break", name)]
    LineBreakInHeader { name: String },

    #[fail(display = "header {} is derived from the mail body and can not be set", name)]
    GeneratedHeader { name: String },

    #[fail(display = "invalid mail address: {:?}", address)]
    InvalidAddress { address: String },

    #[fail(display = "invalid domain: {:?}", domain)]
    InvalidDomain { domain: String },

    #[fail(display = "invalid message id part: {:?}", part)]
    InvalidIdPart { part: String },

    #[fail(display = "unknown charset: {:?}", charset)]
    UnknownCharset { charset: String },

    #[fail(display = "invalid message supplied: the {} body can not be empty", kind)]
    EmptyBody { kind: &'static str },

    #[fail(display = "From address required")]
    NoFrom,

    #[fail(display = "at least one receiver address required")]
    NoRecipients,
}

/// The kind of failure which happened while resolving/loading a resource.
#[derive(Copy, Clone, Debug, Fail, PartialEq, Eq, Hash)]
pub enum ResourceLoadingErrorKind {
    #[fail(display = "resource not found")]
    NotFound,

    #[fail(display = "loading resource failed")]
    LoadingFailed,

    #[fail(display = "invalid resource reference")]
    InvalidReference,

    #[fail(display = "resource scheme not supported")]
    Unsupported,
}

/// Resolving or loading a resource failed.
///
/// Besides the kind of error this contains the reference (path, url,
/// or whatever was given to the resolver) which could not be loaded.
#[derive(Debug)]
pub struct ResourceLoadingError {
    inner: Context<ResourceLoadingErrorKind>,
    reference: Option<String>,
}

impl ResourceLoadingError {
    /// Return the error kind.
    pub fn kind(&self) -> ResourceLoadingErrorKind {
        *self.inner.get_context()
    }

    /// Return the reference which failed to load, if known.
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_ref().map(|s| &**s)
    }

    /// Sets the reference.
    pub fn set_reference<I>(&mut self, reference: I)
    where
        I: Into<String>,
    {
        self.reference = Some(reference.into());
    }

    /// Returns a version of self which has the given reference.
    pub fn with_reference<I>(mut self, reference: I) -> Self
    where
        I: Into<String>,
    {
        self.set_reference(reference);
        self
    }

    /// Adds a reference to self if there isn't one and returns self.
    pub fn with_reference_or_else<F>(mut self, func: F) -> Self
    where
        F: FnOnce() -> Option<String>,
    {
        if self.reference.is_none() {
            self.reference = func();
        }
        self
    }
}

impl From<ResourceLoadingErrorKind> for ResourceLoadingError {
    fn from(kind: ResourceLoadingErrorKind) -> Self {
        ResourceLoadingError::from(Context::new(kind))
    }
}

impl From<Context<ResourceLoadingErrorKind>> for ResourceLoadingError {
    fn from(inner: Context<ResourceLoadingErrorKind>) -> Self {
        ResourceLoadingError {
            inner,
            reference: None,
        }
    }
}

impl Fail for ResourceLoadingError {
    fn cause(&self) -> Option<&dyn Fail> {
        self.inner.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.inner.backtrace()
    }
}

impl Display for ResourceLoadingError {
    fn fmt(&self, fter: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&self.inner, fter)?;
        if let Some(reference) = self.reference() {
            write!(fter, ": {}", reference)?;
        }
        Ok(())
    }
}

/// A name used for an embedding is already bound to a different resource.
///
/// Names can not be rebound for the lifetime of a mail, independent of
/// any leniency settings.
#[derive(Clone, Debug, Fail, PartialEq, Eq)]
#[fail(
    display = "embedded name {:?} is already bound to {}; existing names cannot be rebound",
    name, bound_to
)]
pub struct RebindingError {
    pub name: String,
    pub bound_to: String,
}

/// The builder was used in a way it can not be used (a programming error).
#[derive(Copy, Clone, Debug, Fail, PartialEq, Eq, Hash)]
pub enum StateError {
    #[fail(display = "the mail was already built, it can not be built or modified again")]
    AlreadyBuilt,

    #[fail(display = "the mail was not built yet")]
    NotBuilt,
}

/// Handing the mail to the transport failed.
///
/// Contains the host and port the transport talks to so that the
/// failure can be diagnosed without access to the transport.
#[derive(Debug)]
pub struct TransportError {
    host: String,
    port: u16,
    cause: FError,
}

impl TransportError {
    pub fn new(host: impl Into<String>, port: u16, cause: impl Into<FError>) -> Self {
        TransportError {
            host: host.into(),
            port,
            cause: cause.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Fail for TransportError {
    fn cause(&self) -> Option<&dyn Fail> {
        Some(self.cause.as_fail())
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        Some(self.cause.backtrace())
    }
}

impl Display for TransportError {
    fn fmt(&self, fter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fter,
            "sending the mail to the following server failed: {}:{}",
            self.host, self.port
        )
    }
}

/// Turning a mail into bytes failed.
#[derive(Clone, Debug, Fail, PartialEq, Eq)]
pub enum EncodingError {
    #[fail(display = "text can not be represented in charset {}", charset)]
    Unencodable { charset: String },

    #[fail(display = "multipart body without any sub-bodies")]
    EmptyMultipart,

    #[fail(display = "resource {} was not loaded before encoding", resource)]
    NotLoaded { resource: String },
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resource_loading_error_names_reference() {
        let err = ResourceLoadingError::from(ResourceLoadingErrorKind::NotFound)
            .with_reference("images/logo.gif");
        assert_eq!(err.kind(), ResourceLoadingErrorKind::NotFound);
        assert_eq!(err.to_string(), "resource not found: images/logo.gif");
    }

    #[test]
    fn with_reference_or_else_does_not_override() {
        let err = ResourceLoadingError::from(ResourceLoadingErrorKind::LoadingFailed)
            .with_reference("a.gif")
            .with_reference_or_else(|| Some("b.gif".to_owned()));
        assert_eq!(err.reference(), Some("a.gif"));
    }

    #[test]
    fn transport_error_names_host_and_port() {
        let err = TransportError::new("smtp.example.com", 587, format_err!("connection reset"));
        let msg = err.to_string();
        assert!(msg.contains("smtp.example.com:587"));
        assert!(Fail::cause(&err).is_some());
    }

    #[test]
    fn validation_bail_converts_into_mail_error() {
        fn check() -> Result<(), MailError> {
            validation_bail!(EmptyName);
        }
        match check() {
            Err(MailError::Validation(ValidationError::EmptyName)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
