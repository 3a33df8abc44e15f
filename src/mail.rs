//! Module containing the `Mail` type, the envelope and the built `EncodableMail`.
use vec1::Vec1;

use crate::{
    address::Email,
    content_id::{ContentId, MessageId},
    context::Context,
    error::{EncodingError, MailError, ResourceLoadingError, ValidationError},
    headers::{self, HeaderMap, HeaderName},
    mime::MultipartKind,
    resource::{Data, Resource},
    utils::now_rfc2822,
};

/// A type representing a Mail.
///
/// This type is used to represent a mail including headers and body.
/// It is also used for the bodies of multipart mime mail bodies as
/// they can be seen as "sub-mails" or "hierarchical nested mails", at
/// last wrt. everything relevant on this type.
///
/// Normally a mail is created through the `Email` builder, but it can also
/// be composed by hand using `new_singlepart_mail`, `new_multipart_mail`
/// and the `wrap_with_*` methods.
///
/// # Example
///
/// ```
/// use mail_compose::{Mail, Resource, MultipartKind};
///
/// let text = Mail::plain_text("Hy there!");
/// let html = Mail::new_singlepart_mail(Resource::plain_text("<b>Hy there!</b>"));
/// let mail = Mail::new_multipart_mail(MultipartKind::Alternative, vec![text, html]);
///
/// assert_eq!(mail.multipart_kind(), Some(MultipartKind::Alternative));
/// ```
#[derive(Clone, Debug)]
pub struct Mail {
    headers: HeaderMap,
    body: MailBody,
}

/// A type which either represents a single body, or multiple bodies.
///
/// Note that you could have a mime multipart body just containing a
/// single body _and_ it being semantically important to be this way,
/// so we have to differ between both kinds (instead of just having
/// a `Vec` of mails)
#[derive(Clone, Debug)]
pub enum MailBody {
    SingleBody { body: Resource },
    MultipleBodies { kind: MultipartKind, bodies: Vec<Mail> },
}

impl MailBody {
    pub fn is_multipart(&self) -> bool {
        match *self {
            MailBody::SingleBody { .. } => false,
            MailBody::MultipleBodies { .. } => true,
        }
    }
}

impl Mail {
    /// Create a new `text/plain; charset=utf-8` mail.
    pub fn plain_text(text: impl Into<String>) -> Self {
        Mail::new_singlepart_mail(Resource::plain_text(text))
    }

    /// Create a new multipart mail with given multipart kind and given bodies.
    ///
    /// The boundary is generated when the mail is encoded.
    pub fn new_multipart_mail(kind: MultipartKind, bodies: Vec<Mail>) -> Self {
        Mail {
            headers: HeaderMap::new(),
            body: MailBody::MultipleBodies { kind, bodies },
        }
    }

    /// Create a new non-multipart mail for given `Resource` as body.
    pub fn new_singlepart_mail(body: Resource) -> Self {
        Mail {
            headers: HeaderMap::new(),
            body: MailBody::SingleBody { body },
        }
    }

    /// Returns true if the body of the mail is a multipart body.
    pub fn has_multipart_body(&self) -> bool {
        self.body.is_multipart()
    }

    /// Returns the multipart kind if this is a multipart mail.
    pub fn multipart_kind(&self) -> Option<MultipartKind> {
        match self.body {
            MailBody::MultipleBodies { kind, .. } => Some(kind),
            MailBody::SingleBody { .. } => None,
        }
    }

    /// Returns the sub-bodies, which is empty for non multipart mails.
    pub fn sub_bodies(&self) -> &[Mail] {
        match self.body {
            MailBody::MultipleBodies { ref bodies, .. } => &bodies[..],
            MailBody::SingleBody { .. } => &[],
        }
    }

    /// Returns the resource of a non multipart mail.
    pub fn resource(&self) -> Option<&Resource> {
        match self.body {
            MailBody::SingleBody { ref body } => Some(body),
            MailBody::MultipleBodies { .. } => None,
        }
    }

    /// Returns a reference to the currently set headers.
    ///
    /// Note that `Content-Transfer-Encoding`, `MIME-Version` and `Content-Type`
    /// are derived from the body and _should not_ be set.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Return a mutable reference to the currently set headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub(crate) fn set_header(&mut self, name: &'static str, value: impl Into<String>) {
        self.headers.insert(HeaderName::from_static(name), value);
    }

    /// Returns a reference to the body/bodies.
    pub fn body(&self) -> &MailBody {
        &self.body
    }

    /// Return a mutable reference to the body/bodies.
    pub fn body_mut(&mut self) -> &mut MailBody {
        &mut self.body
    }

    /// Returns the content id of this (sub-)mail.
    pub fn content_id(&self) -> Option<ContentId> {
        let value = self.headers.get(headers::CONTENT_ID)?.trim();
        let value = value.trim_start_matches('<').trim_end_matches('>');
        ContentId::from_cid_url(value)
    }

    /// Finds the (sub-)mail with the given content id.
    ///
    /// The content id can be given with or without `cid:` prefix, in it's
    /// header form `<id>`, or not url encoded.
    pub fn find_by_content_id(&self, cid: &str) -> Option<&Mail> {
        let cid = cid.trim().trim_start_matches('<').trim_end_matches('>');
        let as_given =
            ContentId::from_cid_url(cid).and_then(|cid| self.find_by_content_id_inner(&cid));
        as_given.or_else(|| {
            let raw = crate::content_id::strip_cid_scheme(cid).unwrap_or(cid);
            let encoded = ContentId::new(raw)?;
            self.find_by_content_id_inner(&encoded)
        })
    }

    fn find_by_content_id_inner(&self, cid: &ContentId) -> Option<&Mail> {
        if self.content_id().as_ref() == Some(cid) {
            return Some(self);
        }
        self.sub_bodies()
            .iter()
            .filter_map(|body| body.find_by_content_id_inner(cid))
            .next()
    }

    /// Calls the visitor for every non multipart (sub-)mail, in order.
    pub fn visit_leaves<'a>(&'a self, visitor: &mut impl FnMut(&'a Mail)) {
        match self.body {
            MailBody::SingleBody { .. } => visitor(self),
            MailBody::MultipleBodies { ref bodies, .. } => {
                for body in bodies.iter() {
                    body.visit_leaves(visitor);
                }
            }
        }
    }

    /// Replaces all `Resource::Source` instances with the loaded `Data`.
    pub fn load_resources(&mut self, ctx: &impl Context) -> Result<(), ResourceLoadingError> {
        match self.body {
            MailBody::SingleBody { ref mut body } => {
                if let Resource::Source(..) = *body {
                    let data = body.load(ctx)?;
                    debug!("loaded resource {}", body.describe());
                    *body = Resource::Data(data);
                }
            }
            MailBody::MultipleBodies { ref mut bodies, .. } => {
                for body in bodies.iter_mut() {
                    body.load_resources(ctx)?;
                }
            }
        }
        Ok(())
    }

    /// Validate the mail.
    ///
    /// This checks that no header which is derived from the body
    /// (`Content-Type`, `Content-Transfer-Encoding`, `MIME-Version`) was set
    /// and that multipart bodies are not empty, recursively for all bodies.
    ///
    /// **This does not check for the headers required on the top level.**
    pub fn generally_validate_mail(&self) -> Result<(), MailError> {
        for (name, _) in self.headers.iter() {
            if name.is_generated() {
                return Err(ValidationError::GeneratedHeader {
                    name: name.as_str().to_owned(),
                }
                .into());
            }
        }
        if let MailBody::MultipleBodies { ref bodies, .. } = self.body {
            if bodies.is_empty() {
                return Err(EncodingError::EmptyMultipart.into());
            }
            for body in bodies.iter() {
                body.generally_validate_mail()?;
            }
        }
        Ok(())
    }

    /// Turns the mail into an `EncodableMail`.
    ///
    /// This will
    ///
    /// 1. load all `Resource::Source` resources
    /// 2. validate the mail (see `generally_validate_mail`)
    /// 3. check that there is a `From` header
    /// 4. set the `Date` header if it isn't set
    /// 5. set a `Message-ID` header if it isn't set
    pub fn into_encodable_mail(
        mut self,
        envelope: Envelope,
        ctx: &impl Context,
    ) -> Result<EncodableMail, MailError> {
        self.load_resources(ctx)?;
        self.generally_validate_mail()?;

        if !self.headers.contains(headers::FROM) {
            return Err(ValidationError::NoFrom.into());
        }
        if !self.headers.contains(headers::DATE) {
            self.set_header(headers::DATE, now_rfc2822());
        }
        let message_id = match self.headers.get(headers::MESSAGE_ID) {
            Some(value) => MessageId::from_unchecked(
                value.trim().trim_start_matches('<').trim_end_matches('>'),
            ),
            None => {
                let message_id = ctx.generate_message_id();
                self.set_header(headers::MESSAGE_ID, message_id.header_value());
                message_id
            }
        };

        Ok(EncodableMail {
            mail: self,
            envelope,
            message_id,
        })
    }
}

/// The envelope used when handing a mail to a transport.
///
/// The sender is the address bounces are send to, the recipients include
/// all `To`, `Cc` and `Bcc` addresses.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    sender: Email,
    recipients: Vec1<Email>,
}

impl Envelope {
    pub fn new(sender: Email, recipients: Vec<Email>) -> Result<Self, ValidationError> {
        let recipients =
            Vec1::try_from_vec(recipients).map_err(|_| ValidationError::NoRecipients)?;
        Ok(Envelope { sender, recipients })
    }

    pub fn sender(&self) -> &Email {
        &self.sender
    }

    pub fn recipients(&self) -> &Vec1<Email> {
        &self.recipients
    }
}

/// A mail which was built and can be encoded and send.
///
/// All resources are loaded and it's no longer possible
/// to modify the mail.
#[derive(Clone, Debug)]
pub struct EncodableMail {
    mail: Mail,
    envelope: Envelope,
    message_id: MessageId,
}

impl EncodableMail {
    pub fn mail(&self) -> &Mail {
        &self.mail
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    /// Returns the loaded data of the (sub-)mail with the given content id.
    pub fn find_by_content_id(&self, cid: &str) -> Option<&Data> {
        self.mail
            .find_by_content_id(cid)
            .and_then(|mail| mail.resource())
            .and_then(|resource| resource.data())
    }

    pub fn into_mail(self) -> Mail {
        self.mail
    }
}
