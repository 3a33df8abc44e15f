use std::path::Path;

use chrono::{DateTime, FixedOffset};

use crate::{
    address::{Email as Address, Mailbox},
    charset::Charset,
    compose::MailParts,
    content_id::{ContentId, MessageId},
    context::Context,
    embeddings::Embeddings,
    encode::{encode_mailbox, encode_mailbox_list, encode_unstructured},
    error::{MailError, StateError, TransportError, ValidationError},
    headers::{self, validate_header_value, HeaderName},
    html::{HtmlReferenceRewriter, ReferenceFinder},
    mail::{EncodableMail, Envelope},
    resolver::load_file,
    resource::{Data, Resource},
    transport::Transport,
};

pub use crate::compose::{Attachment, Disposition};

/// Builder for a mail with text/html bodies, inline embeddings and attachments.
///
/// All setters validate their input and fail with a `MailError::State`
/// once the mail was built.
///
/// # Example
///
/// ```
/// use mail_compose::{Email, default_impl::{simple_context, MemoryTransport}};
/// use mail_compose::resolver::{CompositeResolver, EmbeddedResolver};
///
/// let resolver = CompositeResolver::new()
///     .with(EmbeddedResolver::new("/").with_resource("/images/logo.gif", vec![0u8; 16]));
/// let ctx = simple_context::new("example.com", "q9ax7", resolver).unwrap();
///
/// let mut email = Email::new(ctx);
/// email
///     .set_from("Max <max@example.com>").unwrap()
///     .add_to("info@example.com").unwrap()
///     .set_subject("Hy").unwrap()
///     .set_html_msg(r#"<html><body><img src="images/logo.gif"></body></html>"#).unwrap()
///     .set_text_msg("Hy there").unwrap()
///     .enable_image_embedding(false).unwrap();
///
/// let mut transport = MemoryTransport::new();
/// email.send(&mut transport).unwrap();
/// assert_eq!(transport.sent_mails().len(), 1);
/// ```
#[derive(Debug)]
pub struct Email<C: Context> {
    ctx: C,
    charset: Charset,
    from: Option<Mailbox>,
    to: Vec<Mailbox>,
    cc: Vec<Mailbox>,
    bcc: Vec<Mailbox>,
    reply_to: Vec<Mailbox>,
    bounce_address: Option<Address>,
    subject: Option<String>,
    sent_date: Option<DateTime<FixedOffset>>,
    headers: Vec<(HeaderName, String)>,
    text: Option<String>,
    html: Option<String>,
    embeddings: Embeddings,
    attachments: Vec<Attachment>,
    rewriter: Option<HtmlReferenceRewriter>,
    built: Option<EncodableMail>,
}

impl<C> Email<C>
where
    C: Context,
{
    pub fn new(ctx: C) -> Self {
        Email {
            ctx,
            charset: Charset::utf8(),
            from: None,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: Vec::new(),
            bounce_address: None,
            subject: None,
            sent_date: None,
            headers: Vec::new(),
            text: None,
            html: None,
            embeddings: Embeddings::new(),
            attachments: Vec::new(),
            rewriter: None,
            built: None,
        }
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    fn ensure_not_built(&self) -> Result<(), StateError> {
        if self.built.is_some() {
            Err(StateError::AlreadyBuilt)
        } else {
            Ok(())
        }
    }

    /// Sets the charset used for the text bodies and encoded headers.
    ///
    /// Defaults to utf-8.
    pub fn set_charset(&mut self, label: &str) -> Result<&mut Self, MailError> {
        self.ensure_not_built()?;
        self.charset = Charset::new(label)?;
        Ok(self)
    }

    /// Sets the `From` address, e.g. `"Max <max@example.com>"`.
    pub fn set_from(&mut self, mailbox: &str) -> Result<&mut Self, MailError> {
        self.ensure_not_built()?;
        self.from = Some(Mailbox::parse(mailbox)?);
        Ok(self)
    }

    pub fn add_to(&mut self, mailbox: &str) -> Result<&mut Self, MailError> {
        self.ensure_not_built()?;
        self.to.push(Mailbox::parse(mailbox)?);
        Ok(self)
    }

    pub fn add_cc(&mut self, mailbox: &str) -> Result<&mut Self, MailError> {
        self.ensure_not_built()?;
        self.cc.push(Mailbox::parse(mailbox)?);
        Ok(self)
    }

    /// Adds a blind carbon copy recipient, it only appears in the envelope.
    pub fn add_bcc(&mut self, mailbox: &str) -> Result<&mut Self, MailError> {
        self.ensure_not_built()?;
        self.bcc.push(Mailbox::parse(mailbox)?);
        Ok(self)
    }

    pub fn add_reply_to(&mut self, mailbox: &str) -> Result<&mut Self, MailError> {
        self.ensure_not_built()?;
        self.reply_to.push(Mailbox::parse(mailbox)?);
        Ok(self)
    }

    /// Sets the envelope sender, bounces are send to it.
    ///
    /// Defaults to the `From` address.
    pub fn set_bounce_address(&mut self, email: &str) -> Result<&mut Self, MailError> {
        self.ensure_not_built()?;
        self.bounce_address = Some(Address::new(email)?);
        Ok(self)
    }

    /// Sets the subject, line breaks are replaced with spaces.
    pub fn set_subject(&mut self, subject: &str) -> Result<&mut Self, MailError> {
        self.ensure_not_built()?;
        let subject = subject
            .replace("\r\n", " ")
            .replace(|ch: char| ch == '\r' || ch == '\n', " ");
        self.subject = Some(subject);
        Ok(self)
    }

    /// Sets the date used for the `Date` header, defaults to the time of building.
    pub fn set_sent_date(&mut self, date: DateTime<FixedOffset>) -> Result<&mut Self, MailError> {
        self.ensure_not_built()?;
        self.sent_date = Some(date);
        Ok(self)
    }

    /// Adds a custom header.
    ///
    /// Headers derived from the body (like `Content-Type`) can not be set.
    pub fn add_header(&mut self, name: &str, value: &str) -> Result<&mut Self, MailError> {
        self.ensure_not_built()?;
        let name = HeaderName::new(name)?;
        if name.is_generated() {
            validation_bail!(GeneratedHeader {
                name: name.as_str().to_owned()
            });
        }
        validate_header_value(name.as_str(), value)?;
        self.headers.push((name, value.to_owned()));
        Ok(self)
    }

    /// Sets the plain text body.
    pub fn set_text_msg(&mut self, text: &str) -> Result<&mut Self, MailError> {
        self.ensure_not_built()?;
        if text.is_empty() {
            validation_bail!(EmptyBody { kind: "text" });
        }
        self.text = Some(text.to_owned());
        Ok(self)
    }

    /// Sets the html body.
    pub fn set_html_msg(&mut self, html: &str) -> Result<&mut Self, MailError> {
        self.ensure_not_built()?;
        if html.is_empty() {
            validation_bail!(EmptyBody { kind: "html" });
        }
        self.html = Some(html.to_owned());
        Ok(self)
    }

    /// Sets the (plain text) message.
    pub fn set_msg(&mut self, msg: &str) -> Result<&mut Self, MailError> {
        if msg.is_empty() {
            validation_bail!(EmptyBody { kind: "message" });
        }
        self.set_text_msg(msg)
    }

    /// Embeds a resource, returning the content id to use in the html body.
    ///
    /// See `Embeddings::embed`.
    pub fn embed(
        &mut self,
        resource: impl Into<Resource>,
        name: &str,
    ) -> Result<ContentId, MailError> {
        self.ensure_not_built()?;
        self.embeddings.embed(resource, name, &self.ctx)
    }

    /// Embeds a resource with a given content id.
    pub fn embed_with_cid(
        &mut self,
        resource: impl Into<Resource>,
        name: &str,
        cid: &str,
    ) -> Result<ContentId, MailError> {
        self.ensure_not_built()?;
        self.embeddings.embed_with_cid(resource, name, cid)
    }

    /// Embeds a file using it's file name as name.
    pub fn embed_file(&mut self, path: impl AsRef<Path>) -> Result<ContentId, MailError> {
        self.ensure_not_built()?;
        self.embeddings.embed_file(path, &self.ctx)
    }

    /// Embeds the resource at an absolute url.
    pub fn embed_url(&mut self, url: &str, name: &str) -> Result<ContentId, MailError> {
        self.ensure_not_built()?;
        self.embeddings.embed_url(url, name, &self.ctx)
    }

    pub fn attach(&mut self, attachment: Attachment) -> Result<&mut Self, MailError> {
        self.ensure_not_built()?;
        self.attachments.push(attachment);
        Ok(self)
    }

    /// Attaches a file, the file is read immediately.
    pub fn attach_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, MailError> {
        self.ensure_not_built()?;
        let data = load_file(path.as_ref())?;
        self.attachments.push(Attachment::new(data));
        Ok(self)
    }

    /// Embeds the resources referred to by `img`/`script` tags of the html body when building.
    ///
    /// The references are resolved with the resolver of the context. If
    /// `lenient` is true references which can not be resolved are kept.
    pub fn enable_image_embedding(&mut self, lenient: bool) -> Result<&mut Self, MailError> {
        self.ensure_not_built()?;
        self.rewriter = Some(HtmlReferenceRewriter::new(lenient));
        Ok(self)
    }

    /// Uses given finder for image embedding, enabling it (strict) if needed.
    pub fn set_reference_finder(
        &mut self,
        finder: impl ReferenceFinder + 'static,
    ) -> Result<&mut Self, MailError> {
        self.ensure_not_built()?;
        let lenient = self.rewriter.as_ref().map(|rw| rw.lenient()).unwrap_or(false);
        self.rewriter = Some(HtmlReferenceRewriter::with_finder(finder, lenient));
        Ok(self)
    }

    pub fn embeddings(&self) -> &Embeddings {
        &self.embeddings
    }

    /// The built mail, if `build` was called successfully.
    pub fn built(&self) -> Option<&EncodableMail> {
        self.built.as_ref()
    }

    /// Builds the mail.
    ///
    /// If the mail was already built this fails with `StateError::AlreadyBuilt`.
    /// A failed build does not change the builder, so it can be retried.
    ///
    /// # Error
    ///
    /// - if there is no `From` address or no recipient
    /// - if embedding referenced images fails (see `enable_image_embedding`)
    /// - if a text body can not be represented in the charset
    /// - if a resource can not be loaded
    pub fn build(&mut self) -> Result<&EncodableMail, MailError> {
        self.ensure_not_built()?;

        let from = self.from.as_ref().ok_or(ValidationError::NoFrom)?;
        let recipients = self
            .to
            .iter()
            .chain(self.cc.iter())
            .chain(self.bcc.iter())
            .map(|mailbox| mailbox.email().clone())
            .collect::<Vec<_>>();
        let sender = self
            .bounce_address
            .clone()
            .unwrap_or_else(|| from.email().clone());
        let envelope = Envelope::new(sender, recipients)?;

        let mut embeddings = self.embeddings.clone();
        let html = match (self.html.as_ref(), self.rewriter.as_ref()) {
            (Some(html), Some(rewriter)) => {
                let rewritten =
                    rewriter.rewrite(html, self.ctx.resolver(), &mut embeddings, &self.ctx)?;
                debug!("embedded {} html references", rewritten.references.len());
                Some(rewritten.html)
            }
            (html, _) => html.cloned(),
        };

        let text = self.text_resource(self.text.as_ref(), "plain")?;
        let html = self.text_resource(html.as_ref(), "html")?;

        let mut attachments = self.attachments.clone();
        for attachment in attachments.iter_mut() {
            if let Resource::Source(..) = *attachment.resource() {
                let data = attachment.resource().load(&self.ctx)?;
                *attachment.resource_mut() = Resource::Data(data);
            }
        }

        let parts = MailParts {
            text,
            html,
            inline_embeddings: embeddings.iter().cloned().collect(),
            attachments,
        };
        let mut mail = parts.compose();

        let charset = &self.charset;
        mail.set_header(headers::FROM, encode_mailbox(from, charset)?);
        if !self.to.is_empty() {
            mail.set_header(headers::TO, encode_mailbox_list(&self.to, charset)?);
        }
        if !self.cc.is_empty() {
            mail.set_header(headers::CC, encode_mailbox_list(&self.cc, charset)?);
        }
        if !self.reply_to.is_empty() {
            mail.set_header(headers::REPLY_TO, encode_mailbox_list(&self.reply_to, charset)?);
        }
        if let Some(subject) = self.subject.as_ref() {
            mail.set_header(headers::SUBJECT, encode_unstructured(subject, charset)?);
        }
        if let Some(date) = self.sent_date.as_ref() {
            mail.set_header(headers::DATE, date.to_rfc2822());
        }
        for (name, value) in self.headers.iter() {
            mail.headers_mut().insert(*name, value.as_str());
        }

        let encodable = mail.into_encodable_mail(envelope, &self.ctx)?;
        debug!("built mail {}", encodable.message_id());
        self.embeddings = embeddings;
        Ok(self.built.get_or_insert(encodable))
    }

    fn text_resource(
        &self,
        text: Option<&String>,
        subtype: &str,
    ) -> Result<Option<Resource>, MailError> {
        match text {
            Some(text) => Ok(Some(Data::text(text, subtype, &self.charset)?.into())),
            None => Ok(None),
        }
    }

    /// Builds the mail and sends it with the transport.
    pub fn send(&mut self, transport: &mut impl Transport) -> Result<MessageId, MailError> {
        self.build()?;
        self.send_built(transport)
    }

    /// Sends the already built mail.
    ///
    /// Transport failures are wrapped in a `TransportError` naming the
    /// host and port of the transport.
    pub fn send_built(&self, transport: &mut impl Transport) -> Result<MessageId, MailError> {
        let mail = self.built.as_ref().ok_or(StateError::NotBuilt)?;
        transport.send(mail).map_err(|err| {
            let endpoint = transport.endpoint();
            TransportError::new(endpoint.host, endpoint.port, err)
        })?;
        debug!("sent mail {} to {}", mail.message_id(), transport.endpoint());
        Ok(mail.message_id().clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        default_impl::{test_context, MemoryTransport, TestContext},
        mime::MultipartKind,
        resolver::EmbeddedResolver,
        transport::Endpoint,
    };

    fn email() -> Email<TestContext<EmbeddedResolver>> {
        let resolver =
            EmbeddedResolver::new("/").with_resource("/images/logo.gif", vec![1u8, 2, 3]);
        Email::new(test_context(resolver))
    }

    fn minimal() -> Email<TestContext<EmbeddedResolver>> {
        let mut email = email();
        email
            .set_from("Max <max@example.com>")
            .unwrap()
            .add_to("to@example.com")
            .unwrap();
        email
    }

    fn encoded(email: &mut Email<TestContext<EmbeddedResolver>>) -> String {
        let bytes = email.build().unwrap().encode_into_bytes().unwrap();
        String::from_utf8(bytes).unwrap()
    }

    mod setters {
        use super::*;

        #[test]
        fn invalid_addresses_are_rejected() {
            let mut email = email();
            assert_err!(email.set_from("no-at-sign"));
            assert_err!(email.add_to("a@"));
            assert_err!(email.add_cc(""));
            assert_err!(email.set_bounce_address("Max <max@example.com>"));
        }

        #[test]
        fn empty_bodies_are_rejected() {
            let mut email = email();
            match email.set_html_msg("") {
                Err(MailError::Validation(ValidationError::EmptyBody { kind })) => {
                    assert_eq!(kind, "html")
                }
                other => panic!("unexpected: {:?}", other),
            }
            assert_err!(email.set_text_msg(""));
            assert_err!(email.set_msg(""));
        }

        #[test]
        fn headers_are_validated() {
            let mut email = email();
            assert_err!(email.add_header("", "x"));
            assert_err!(email.add_header("X-Foo", ""));
            assert_err!(email.add_header("X-Foo", "a\r\nb"));
            assert_err!(email.add_header("content-type", "text/html"));
            assert_ok!(email.add_header("X-Mailer", "mail-compose"));
        }

        #[test]
        fn unknown_charsets_are_rejected() {
            let mut email = email();
            assert_err!(email.set_charset("no-such-charset"));
            assert_ok!(email.set_charset("ISO-8859-1"));
        }
    }

    mod build {
        use super::*;

        #[test]
        fn requires_from_and_recipient() {
            let mut email = email();
            email.add_to("to@example.com").unwrap();
            match email.build() {
                Err(MailError::Validation(ValidationError::NoFrom)) => {}
                other => panic!("unexpected: {:?}", other),
            }

            let mut email = self::email();
            email.set_from("max@example.com").unwrap();
            match email.build() {
                Err(MailError::Validation(ValidationError::NoRecipients)) => {}
                other => panic!("unexpected: {:?}", other),
            }
        }

        #[test]
        fn building_twice_is_a_state_error() {
            let mut email = minimal();
            assert_ok!(email.build());
            match email.build() {
                Err(MailError::State(StateError::AlreadyBuilt)) => {}
                other => panic!("unexpected: {:?}", other),
            }
            match email.set_subject("late") {
                Err(MailError::State(StateError::AlreadyBuilt)) => {}
                other => panic!("unexpected: {:?}", other),
            }
        }

        #[test]
        fn failed_builds_can_be_retried() {
            let mut email = email();
            email.set_from("max@example.com").unwrap();
            assert_err!(email.build());
            email.add_to("to@example.com").unwrap();
            assert_ok!(email.build());
        }

        #[test]
        fn text_only_is_wrapped_in_mixed() {
            let mut email = minimal();
            email.set_text_msg("Hy").unwrap();
            let mail = email.build().unwrap().mail();
            assert_eq!(mail.multipart_kind(), Some(MultipartKind::Mixed));
            assert_eq!(mail.sub_bodies().len(), 1);
        }

        #[test]
        fn text_and_html_is_alternative() {
            let mut email = minimal();
            email.set_text_msg("Hy").unwrap().set_html_msg("<b>Hy</b>").unwrap();
            let mail = email.build().unwrap().mail();
            assert_eq!(mail.multipart_kind(), Some(MultipartKind::Alternative));
        }

        #[test]
        fn html_images_are_embedded() {
            let mut email = minimal();
            email
                .set_html_msg(r#"<img src="images/logo.gif">"#)
                .unwrap()
                .enable_image_embedding(false)
                .unwrap();
            let mail = email.build().unwrap().mail();
            assert_eq!(mail.multipart_kind(), Some(MultipartKind::Mixed));
            let related = &mail.sub_bodies()[0];
            assert_eq!(related.multipart_kind(), Some(MultipartKind::Related));
            assert_eq!(related.sub_bodies().len(), 2);
            assert_eq!(email.embeddings().len(), 1);
        }

        #[test]
        fn missing_images_fail_in_strict_mode() {
            let mut email = minimal();
            email
                .set_html_msg(r#"<img src="images/missing.gif">"#)
                .unwrap()
                .enable_image_embedding(false)
                .unwrap();
            match email.build() {
                Err(MailError::ResourceLoading(err)) => {
                    assert!(err.to_string().contains("missing.gif"))
                }
                other => panic!("unexpected: {:?}", other),
            }
            assert!(email.embeddings().is_empty());
        }

        #[test]
        fn bcc_only_goes_into_the_envelope() {
            let mut email = minimal();
            email.add_bcc("hidden@example.com").unwrap();
            email.add_cc("Cc Person <cc@example.com>").unwrap();
            let out = encoded(&mut email);
            assert_not!(out.contains("hidden@example.com"));
            assert!(out.contains("Cc: Cc Person <cc@example.com>\r\n"));

            let envelope = email.built().unwrap().envelope();
            let recipients = envelope
                .recipients()
                .iter()
                .map(|email| email.to_string())
                .collect::<Vec<_>>();
            assert_eq!(
                recipients,
                vec!["to@example.com", "cc@example.com", "hidden@example.com"]
            );
            assert_eq!(envelope.sender().to_string(), "max@example.com");
        }

        #[test]
        fn bounce_address_is_envelope_sender() {
            let mut email = minimal();
            email.set_bounce_address("bounce@example.com").unwrap();
            let envelope = email.build().unwrap().envelope();
            assert_eq!(envelope.sender().to_string(), "bounce@example.com");
        }

        #[test]
        fn headers_are_set() {
            let mut email = minimal();
            let date = DateTime::parse_from_rfc2822("Tue, 15 Jul 2003 10:52:37 +0200").unwrap();
            email
                .set_subject("Grüße\nan alle")
                .unwrap()
                .set_sent_date(date)
                .unwrap()
                .add_header("X-Mailer", "mail-compose")
                .unwrap()
                .add_reply_to("reply@example.com")
                .unwrap();
            let out = encoded(&mut email);
            assert!(out.contains("From: Max <max@example.com>\r\n"));
            assert!(out.contains("To: to@example.com\r\n"));
            assert!(out.contains("Reply-To: reply@example.com\r\n"));
            assert!(out.contains("Subject: =?utf-8?B?"));
            assert!(out.contains("Date: Tue, 15 Jul 2003 10:52:37 +0200\r\n"));
            assert!(out.contains("X-Mailer: mail-compose\r\n"));
        }

        #[test]
        fn text_uses_the_charset() {
            let mut email = minimal();
            email.set_charset("iso-8859-1").unwrap().set_text_msg("Grüße").unwrap();
            let mail = email.build().unwrap().mail();
            let data = mail.sub_bodies()[0].resource().unwrap().data().unwrap();
            assert_eq!(&data.buffer()[..], b"Gr\xfc\xdfe");
            assert_eq!(data.media_type().get_param("charset").unwrap(), "iso-8859-1");
        }
    }

    mod send {
        use super::*;

        #[test]
        fn sends_the_built_mail() {
            let mut email = minimal();
            email.set_text_msg("Hy").unwrap();
            let transport = MemoryTransport::new();
            let mut handle = transport.clone();
            let message_id = assert_ok!(email.send(&mut handle));
            let sent = transport.sent_mails();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].message_id, message_id.as_str());
            assert_eq!(sent[0].recipients.len(), 1);
        }

        #[test]
        fn transport_errors_name_the_endpoint() {
            let mut email = minimal();
            let mut transport = MemoryTransport::new()
                .with_endpoint(Endpoint::new("smtp.example.com", 2525))
                .failing("connection refused");
            match email.send(&mut transport) {
                Err(MailError::Transport(err)) => {
                    assert_eq!(err.host(), "smtp.example.com");
                    assert_eq!(err.port(), 2525);
                    assert!(err.to_string().contains("smtp.example.com:2525"));
                }
                other => panic!("unexpected: {:?}", other),
            }
            // the mail stays built
            assert!(email.built().is_some());
        }

        #[test]
        fn send_built_requires_build() {
            let email = minimal();
            let mut transport = MemoryTransport::new();
            match email.send_built(&mut transport) {
                Err(MailError::State(StateError::NotBuilt)) => {}
                other => panic!("unexpected: {:?}", other),
            }
        }
    }
}
