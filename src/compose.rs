//! This module contains types used to compose the body structure of a mail.
//!
//! The `MailParts` type contains the text and html bodies, the inline
//! embeddings and the attachments. `MailParts::compose` turns them into
//! a `Mail` nesting `multipart/mixed`, `multipart/related` and
//! `multipart/alternative` bodies as needed.
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::{
    embeddings::InlineEmbed,
    headers,
    mail::Mail,
    mime::MultipartKind,
    resource::Resource,
};

/// Characters which are escaped in RFC 2231 extended parameter values.
const ATTR_CHAR_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// How a body part should be presented by the mail client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Shown as part of the mail, e.g. images referenced by the html body.
    Inline,
    /// Offered as download.
    Attachment,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }
}

impl Default for Disposition {
    fn default() -> Self {
        Disposition::Attachment
    }
}

/// Creates the value of a `Content-Disposition` header.
///
/// Non ascii file names are encoded as RFC 2231 `filename*` parameter.
pub fn disposition_header_value(disposition: Disposition, file_name: Option<&str>) -> String {
    let mut value = disposition.as_str().to_owned();
    if let Some(name) = file_name.filter(|name| !name.is_empty()) {
        let quotable = name
            .bytes()
            .all(|bch| bch.is_ascii() && !bch.is_ascii_control() && bch != b'"' && bch != b'\\');
        if quotable {
            value.push_str("; filename=\"");
            value.push_str(name);
            value.push('"');
        } else {
            value.push_str("; filename*=utf-8''");
            value.extend(utf8_percent_encode(name, ATTR_CHAR_ESCAPES));
        }
    }
    value
}

/// A resource attached to a mail.
#[derive(Debug, Clone)]
pub struct Attachment {
    resource: Resource,
    disposition: Disposition,
    name: Option<String>,
    description: Option<String>,
}

impl Attachment {
    /// Creates a new attachment with `Disposition::Attachment`.
    pub fn new(resource: impl Into<Resource>) -> Self {
        Attachment {
            resource: resource.into(),
            disposition: Disposition::Attachment,
            name: None,
            description: None,
        }
    }

    /// Sets the file name offered to the recipient.
    ///
    /// If no name is set the file name of the resource is used.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the text used for the `Content-Description` header.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_disposition(mut self, disposition: Disposition) -> Self {
        self.disposition = disposition;
        self
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    pub fn name(&self) -> Option<&str> {
        self.name
            .as_ref()
            .map(|s| &**s)
            .or_else(|| self.resource.file_name())
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_ref().map(|s| &**s)
    }

    pub(crate) fn resource_mut(&mut self) -> &mut Resource {
        &mut self.resource
    }

    /// Creates the body used for this attachment.
    pub fn create_mail(&self) -> Mail {
        let mut mail = Mail::new_singlepart_mail(self.resource.clone());
        mail.set_header(
            headers::CONTENT_DISPOSITION,
            disposition_header_value(self.disposition, self.name()),
        );
        if let Some(description) = self.description() {
            mail.set_header(headers::CONTENT_DESCRIPTION, description);
        }
        mail
    }
}

/// Parts used to create a mail body.
#[derive(Debug, Clone, Default)]
pub struct MailParts {
    /// The plain text body.
    pub text: Option<Resource>,

    /// The html body, referring to inline embeddings by content id.
    pub html: Option<Resource>,

    /// Resources embedded into the html body.
    pub inline_embeddings: Vec<InlineEmbed>,

    /// Attachments, e.g. a pdf document.
    pub attachments: Vec<Attachment>,
}

impl MailParts {
    /// Creates the body structure out of the parts.
    ///
    /// If neither a text nor a html body is given an empty `text/plain`
    /// body is used. The structure is:
    ///
    /// - with html and inline embeddings:
    ///   `mixed[related[body, embeddings...], attachments...]`
    ///   where `body` is `alternative[text, html]` if there is a text body
    ///   or just the html body otherwise
    /// - with text and html but no inline embeddings:
    ///   `alternative[text, html]`, wrapped as `mixed[alternative, attachments...]`
    ///   if there are attachments
    /// - otherwise: `mixed[body, attachments...]`, inline embeddings are
    ///   dropped as there is no html body referring to them
    pub fn compose(self) -> Mail {
        let MailParts {
            text,
            html,
            inline_embeddings,
            attachments,
        } = self;

        let text = match (text, &html) {
            (None, None) => Some(Resource::plain_text("")),
            (text, _) => text,
        };

        let attachments = attachments
            .iter()
            .map(Attachment::create_mail)
            .collect::<Vec<_>>();

        match (text, html) {
            (text, Some(html)) if !inline_embeddings.is_empty() => {
                debug!(
                    "composing html mail with {} inline embeddings",
                    inline_embeddings.len()
                );
                let html = Mail::new_singlepart_mail(html);
                let body = match text {
                    Some(text) => Mail::new_singlepart_mail(text)
                        .wrap_with_alternatives(vec![html]),
                    None => html,
                };
                let embeddings = inline_embeddings
                    .iter()
                    .map(InlineEmbed::create_mail)
                    .collect();
                body.wrap_with_related(embeddings)
                    .wrap_with_mixed(attachments)
            }
            (Some(text), Some(html)) => {
                let alternative = Mail::new_singlepart_mail(text)
                    .wrap_with_alternatives(vec![Mail::new_singlepart_mail(html)]);
                if attachments.is_empty() {
                    alternative
                } else {
                    alternative.wrap_with_mixed(attachments)
                }
            }
            (text, html) => {
                if !inline_embeddings.is_empty() {
                    warn!(
                        "dropping {} inline embeddings, there is no html body using them",
                        inline_embeddings.len()
                    );
                }
                //UNWRAP_SAFE: at least one of both is set, see above
                let body = html.or(text).unwrap();
                Mail::new_singlepart_mail(body).wrap_with_mixed(attachments)
            }
        }
    }
}

impl Mail {
    /// Create a `multipart/mixed` mail with self as first body followed by others.
    pub fn wrap_with_mixed(self, others: Vec<Mail>) -> Mail {
        self.wrap_with(MultipartKind::Mixed, others)
    }

    /// Create a `multipart/alternative` mail with self as first (least preferred) body.
    pub fn wrap_with_alternatives(self, alternatives: Vec<Mail>) -> Mail {
        self.wrap_with(MultipartKind::Alternative, alternatives)
    }

    /// Create a `multipart/related` mail with self as main body followed by the related bodies.
    pub fn wrap_with_related(self, related: Vec<Mail>) -> Mail {
        self.wrap_with(MultipartKind::Related, related)
    }

    fn wrap_with(self, kind: MultipartKind, others: Vec<Mail>) -> Mail {
        let mut bodies = Vec::with_capacity(others.len() + 1);
        bodies.push(self);
        bodies.extend(others);
        Mail::new_multipart_mail(kind, bodies)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{embeddings::Embeddings, resource::Data, IRI};

    /// A short description of the body structure, e.g. `mixed[text,pdf]`.
    fn shape(mail: &Mail) -> String {
        match mail.multipart_kind() {
            Some(kind) => {
                let inner = mail
                    .sub_bodies()
                    .iter()
                    .map(shape)
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{}[{}]", kind.subtype(), inner)
            }
            None => {
                //UNWRAP_SAFE: single bodies always have a resource
                let data = mail.resource().unwrap().data().unwrap();
                String::from_utf8(data.buffer().to_vec()).unwrap()
            }
        }
    }

    fn part(name: &str) -> Resource {
        Resource::plain_text(name)
    }

    fn embeds(names: &[&str]) -> Vec<InlineEmbed> {
        let mut embeddings = Embeddings::new();
        for name in names {
            let origin = IRI::new(format!("file:/{}", name)).unwrap();
            let data = Data::plain_text(*name).with_origin(origin);
            embeddings.embed_with_cid(data, name, name).unwrap();
        }
        embeddings.iter().cloned().collect()
    }

    fn attachments(names: &[&str]) -> Vec<Attachment> {
        names.iter().map(|name| Attachment::new(part(name))).collect()
    }

    fn composed(text: bool, html: bool, inline: &[&str], atts: &[&str]) -> String {
        let parts = MailParts {
            text: if text { Some(part("text")) } else { None },
            html: if html { Some(part("html")) } else { None },
            inline_embeddings: embeds(inline),
            attachments: attachments(atts),
        };
        shape(&parts.compose())
    }

    mod compose {
        use super::*;

        #[test]
        fn no_bodies_at_all() {
            assert_eq!(composed(false, false, &[], &[]), "mixed[]");
        }

        #[test]
        fn text_only() {
            assert_eq!(composed(true, false, &[], &[]), "mixed[text]");
            assert_eq!(composed(true, false, &[], &["a"]), "mixed[text,a]");
        }

        #[test]
        fn html_only() {
            assert_eq!(composed(false, true, &[], &["a", "b"]), "mixed[html,a,b]");
        }

        #[test]
        fn text_and_html() {
            assert_eq!(composed(true, true, &[], &[]), "alternative[text,html]");
            assert_eq!(
                composed(true, true, &[], &["a"]),
                "mixed[alternative[text,html],a]"
            );
        }

        #[test]
        fn html_with_inline_embeddings() {
            assert_eq!(
                composed(false, true, &["i1", "i2"], &[]),
                "mixed[related[html,i1,i2]]"
            );
            assert_eq!(
                composed(false, true, &["i1"], &["a"]),
                "mixed[related[html,i1],a]"
            );
        }

        #[test]
        fn text_html_and_inline_embeddings() {
            assert_eq!(
                composed(true, true, &["i1"], &["a"]),
                "mixed[related[alternative[text,html],i1],a]"
            );
        }

        #[test]
        fn inline_embeddings_without_html_are_dropped() {
            assert_eq!(composed(true, false, &["i1"], &["a"]), "mixed[text,a]");
        }
    }

    #[test]
    fn missing_bodies_default_to_empty_text() {
        let mail = MailParts::default().compose();
        let body = &mail.sub_bodies()[0];
        let data = body.resource().unwrap().data().unwrap();
        assert!(data.buffer().is_empty());
        assert_eq!(data.media_type(), &mime::TEXT_PLAIN_UTF_8);
    }

    mod disposition_header_value {
        use super::super::*;

        #[test]
        fn without_name() {
            assert_eq!(
                disposition_header_value(Disposition::Attachment, None),
                "attachment"
            );
            assert_eq!(disposition_header_value(Disposition::Inline, Some("")), "inline");
        }

        #[test]
        fn ascii_name_is_quoted() {
            assert_eq!(
                disposition_header_value(Disposition::Inline, Some("logo one.gif")),
                "inline; filename=\"logo one.gif\""
            );
        }

        #[test]
        fn non_ascii_name_is_extended_parameter() {
            assert_eq!(
                disposition_header_value(Disposition::Attachment, Some("bücher.pdf")),
                "attachment; filename*=utf-8''b%C3%BCcher.pdf"
            );
        }
    }

    #[test]
    fn attachment_mail_headers() {
        let attachment = Attachment::new(Resource::plain_text("x"))
            .with_name("notes.txt")
            .with_description("some notes");
        let mail = attachment.create_mail();
        assert_eq!(
            mail.headers().get(headers::CONTENT_DISPOSITION),
            Some("attachment; filename=\"notes.txt\"")
        );
        assert_eq!(
            mail.headers().get(headers::CONTENT_DESCRIPTION),
            Some("some notes")
        );
    }

    #[test]
    fn attachment_name_falls_back_to_file_name() {
        let data = Data::plain_text("x").with_file_name("report.txt");
        let attachment = Attachment::new(data);
        assert_eq!(attachment.name(), Some("report.txt"));
        let attachment = Attachment::new(Resource::plain_text("x"));
        assert_eq!(attachment.name(), None);
    }
}
