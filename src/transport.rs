//! The interface used to hand a built mail to some kind of mail server.
use std::fmt::{self, Display};

use crate::mail::EncodableMail;

/// The host and port a transport delivers mails to.
///
/// Used when reporting transport failures.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Endpoint {
            host: host.into(),
            port,
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, fter: &mut fmt::Formatter) -> fmt::Result {
        write!(fter, "{}:{}", self.host, self.port)
    }
}

/// Something which can deliver mails, e.g. a smtp connection.
///
/// Implementations get the built mail including the envelope and can use
/// `EncodableMail::encode_into_bytes` to get the bytes to send.
/// Errors are wrapped into a `TransportError` naming the endpoint by the
/// `Email` builder.
pub trait Transport {
    /// The host and port of the server mails are delivered to.
    fn endpoint(&self) -> Endpoint;

    /// Delivers the mail.
    fn send(&mut self, mail: &EncodableMail) -> Result<(), failure::Error>;
}

impl<'a, T> Transport for &'a mut T
where
    T: Transport + ?Sized,
{
    fn endpoint(&self) -> Endpoint {
        (**self).endpoint()
    }

    fn send(&mut self, mail: &EncodableMail) -> Result<(), failure::Error> {
        (**self).send(mail)
    }
}

impl<T> Transport for Box<T>
where
    T: Transport + ?Sized,
{
    fn endpoint(&self) -> Endpoint {
        (**self).endpoint()
    }

    fn send(&mut self, mail: &EncodableMail) -> Result<(), failure::Error> {
        (**self).send(mail)
    }
}
