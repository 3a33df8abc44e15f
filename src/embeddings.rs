//! The registry of resources embedded inline into a mail.
//!
//! Each embedding is bound to a name and has a content id, which is
//! used to refer to it from a html body (`<img src="cid:...">`).
//! A name can only be bound once, embedding the same resource under
//! the same name again returns the already used content id but trying
//! to bind a different resource to it fails.
use std::path::Path;
use std::slice;

use crate::{
    compose::{disposition_header_value, Disposition},
    content_id::ContentId,
    context::Context,
    error::{
        MailError, RebindingError, ResourceLoadingError, ResourceLoadingErrorKind,
        ValidationError,
    },
    headers,
    mail::Mail,
    resolver::{load_file, ResourceResolver, UrlResolver},
    resource::Resource,
};

/// A resource embedded into a mail under a name with a content id.
#[derive(Debug, Clone)]
pub struct InlineEmbed {
    name: String,
    content_id: ContentId,
    resource: Resource,
}

impl InlineEmbed {
    /// The name the resource was embedded with.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_id(&self) -> &ContentId {
        &self.content_id
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Creates the body used for this embedding.
    ///
    /// It has a `Content-Disposition: inline` header with the name as file
    /// name and a `Content-ID` header.
    pub fn create_mail(&self) -> Mail {
        let mut mail = Mail::new_singlepart_mail(self.resource.clone());
        mail.set_header(
            headers::CONTENT_DISPOSITION,
            disposition_header_value(Disposition::Inline, Some(&self.name)),
        );
        mail.set_header(headers::CONTENT_ID, self.content_id.header_value());
        mail
    }
}

/// Insertion ordered map from names to inline embeddings.
#[derive(Debug, Clone, Default)]
pub struct Embeddings {
    embeds: Vec<InlineEmbed>,
}

impl Embeddings {
    pub fn new() -> Self {
        Default::default()
    }

    /// Embeds the resource under the given name, returning it's content id.
    ///
    /// If the name is already bound to the same resource the existing
    /// content id is returned. If it's bound to a different resource this
    /// fails with a `RebindingError` and nothing is changed.
    ///
    /// New content ids are generated by the context.
    pub fn embed(
        &mut self,
        resource: impl Into<Resource>,
        name: &str,
        ctx: &impl Context,
    ) -> Result<ContentId, MailError> {
        let resource = resource.into();
        if let Some(cid) = self.check_existing(&resource, name)? {
            return Ok(cid);
        }
        let content_id = ctx.generate_content_id();
        Ok(self.insert(resource, name, content_id))
    }

    /// Embeds the resource under the given name using the given content id.
    ///
    /// The content id is url encoded before it's used, the encoded content id
    /// is returned. Checks for already bound names are done like for `embed`.
    pub fn embed_with_cid(
        &mut self,
        resource: impl Into<Resource>,
        name: &str,
        cid: &str,
    ) -> Result<ContentId, MailError> {
        let resource = resource.into();
        if let Some(cid) = self.check_existing(&resource, name)? {
            return Ok(cid);
        }
        let content_id = ContentId::new(cid).ok_or(ValidationError::EmptyContentId)?;
        Ok(self.insert(resource, name, content_id))
    }

    /// Embeds a file using it's file name as name.
    ///
    /// The file is read immediately, so it has to exist and be readable.
    /// Two paths are the same resource if they have the same canonical path.
    pub fn embed_file(
        &mut self,
        path: impl AsRef<Path>,
        ctx: &impl Context,
    ) -> Result<ContentId, MailError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.is_empty() {
            validation_bail!(EmptyName);
        }
        let data = load_file(path)?;
        self.embed(data, &name, ctx)
    }

    /// Embeds the resource the (absolute) url points to.
    ///
    /// The resource is fetched immediately. Two urls are the same resource
    /// if they are the same url.
    pub fn embed_url(
        &mut self,
        url: &str,
        name: &str,
        ctx: &impl Context,
    ) -> Result<ContentId, MailError> {
        if name.is_empty() {
            validation_bail!(EmptyName);
        }
        let data = UrlResolver::new(None)
            .resolve(url, false)?
            .ok_or_else(|| {
                ResourceLoadingError::from(ResourceLoadingErrorKind::Unsupported)
                    .with_reference(url)
            })?;
        self.embed(data, name, ctx)
    }

    fn check_existing(
        &self,
        resource: &Resource,
        name: &str,
    ) -> Result<Option<ContentId>, MailError> {
        if name.is_empty() {
            validation_bail!(EmptyName);
        }
        match self.get(name) {
            Some(existing) => {
                if existing.resource.same_resource(resource) {
                    debug!("{:?} is already embedded as {}", name, existing.content_id);
                    Ok(Some(existing.content_id.clone()))
                } else {
                    Err(RebindingError {
                        name: name.to_owned(),
                        bound_to: existing.resource.describe(),
                    }
                    .into())
                }
            }
            None => Ok(None),
        }
    }

    fn insert(&mut self, resource: Resource, name: &str, content_id: ContentId) -> ContentId {
        debug!("embedding {} as {:?} with content id {}", resource.describe(), name, content_id);
        self.embeds.push(InlineEmbed {
            name: name.to_owned(),
            content_id: content_id.clone(),
            resource,
        });
        content_id
    }

    /// Returns the embedding bound to the name.
    pub fn get(&self, name: &str) -> Option<&InlineEmbed> {
        self.embeds.iter().find(|embed| embed.name == name)
    }

    /// Returns the embedding with the given (encoded) content id.
    pub fn by_content_id(&self, cid: &str) -> Option<&InlineEmbed> {
        self.embeds
            .iter()
            .find(|embed| embed.content_id.as_str() == cid)
    }

    /// Iterates over all embeddings in the order they were embedded.
    pub fn iter(&self) -> slice::Iter<InlineEmbed> {
        self.embeds.iter()
    }

    pub fn len(&self) -> usize {
        self.embeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeds.is_empty()
    }
}

impl<'a> IntoIterator for &'a Embeddings {
    type Item = &'a InlineEmbed;
    type IntoIter = slice::Iter<'a, InlineEmbed>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use serde::ser::{Serialize, SerializeMap, Serializer};

    use super::Embeddings;

    /// Serializes as map from names to content ids.
    impl Serialize for Embeddings {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for embed in self.iter() {
                map.serialize_entry(embed.name(), embed.content_id().as_str())?;
            }
            map.end()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        default_impl::{test_context, TestContext},
        resolver::EmbeddedResolver,
        resource::Data,
        IRI,
    };

    fn ctx() -> TestContext<EmbeddedResolver> {
        test_context(EmbeddedResolver::new("/"))
    }

    fn data(origin: &str) -> Data {
        Data::plain_text(origin).with_origin(IRI::new(origin).unwrap())
    }

    mod embed {
        use super::*;

        #[test]
        fn same_resource_twice_returns_same_cid() {
            let ctx = ctx();
            let mut embeddings = Embeddings::new();
            let first = assert_ok!(embeddings.embed(data("file:/a.gif"), "x", &ctx));
            let second = assert_ok!(embeddings.embed(data("file:/a.gif"), "x", &ctx));
            assert_eq!(first, second);
            assert_eq!(embeddings.len(), 1);
        }

        #[test]
        fn rebinding_a_name_fails() {
            let ctx = ctx();
            let mut embeddings = Embeddings::new();
            let cid = assert_ok!(embeddings.embed(data("file:/a.gif"), "x", &ctx));
            let err = assert_err!(embeddings.embed(data("file:/b.gif"), "x", &ctx));
            match err {
                MailError::Rebinding(err) => {
                    assert_eq!(err.name, "x");
                    assert_eq!(err.bound_to, "file:/a.gif");
                }
                other => panic!("unexpected error: {:?}", other),
            }
            assert_eq!(embeddings.len(), 1);
            assert_eq!(embeddings.get("x").unwrap().content_id(), &cid);
            assert!(embeddings
                .get("x")
                .unwrap()
                .resource()
                .same_resource(&data("file:/a.gif").into()));
        }

        #[test]
        fn empty_name_fails_before_loading() {
            let ctx = ctx();
            let mut embeddings = Embeddings::new();
            match embeddings.embed(data("file:/a.gif"), "", &ctx) {
                Err(MailError::Validation(ValidationError::EmptyName)) => {}
                other => panic!("unexpected: {:?}", other),
            }
            match embeddings.embed_file("/", &ctx) {
                Err(MailError::Validation(ValidationError::EmptyName)) => {}
                other => panic!("unexpected: {:?}", other),
            }
            assert!(embeddings.is_empty());
        }

        #[test]
        fn generated_cids_are_random_letters() {
            let ctx = ctx();
            let mut embeddings = Embeddings::new();
            let cid = assert_ok!(embeddings.embed(data("file:/a.gif"), "x", &ctx));
            assert_eq!(cid.as_str().len(), 10);
            assert!(cid.as_str().bytes().all(|b| b.is_ascii_lowercase()));
        }

        #[test]
        fn keeps_insertion_order() {
            let ctx = ctx();
            let mut embeddings = Embeddings::new();
            for name in &["c", "a", "b"] {
                assert_ok!(embeddings.embed(data(&format!("file:/{}", name)), name, &ctx));
            }
            let names = embeddings.iter().map(InlineEmbed::name).collect::<Vec<_>>();
            assert_eq!(names, vec!["c", "a", "b"]);
        }
    }

    mod embed_with_cid {
        use super::*;

        #[test]
        fn cid_is_url_encoded() {
            let mut embeddings = Embeddings::new();
            let cid = assert_ok!(embeddings.embed_with_cid(data("file:/a.gif"), "x", "my logo"));
            assert_eq!(cid.as_str(), "my%20logo");
            assert_eq!(embeddings.by_content_id("my%20logo").unwrap().name(), "x");
        }

        #[test]
        fn empty_cid_fails() {
            let mut embeddings = Embeddings::new();
            match embeddings.embed_with_cid(data("file:/a.gif"), "x", "") {
                Err(MailError::Validation(ValidationError::EmptyContentId)) => {}
                other => panic!("unexpected: {:?}", other),
            }
        }

        #[test]
        fn rebinding_still_fails() {
            let mut embeddings = Embeddings::new();
            assert_ok!(embeddings.embed_with_cid(data("file:/a.gif"), "x", "a"));
            assert_err!(embeddings.embed_with_cid(data("file:/b.gif"), "x", "b"));
            let again = assert_ok!(embeddings.embed_with_cid(data("file:/a.gif"), "x", "b"));
            assert_eq!(again.as_str(), "a");
        }
    }

    mod embed_file {
        use super::*;

        #[test]
        fn same_file_through_different_paths() {
            let ctx = ctx();
            let mut embeddings = Embeddings::new();
            let first = assert_ok!(embeddings.embed_file("./Cargo.toml", &ctx));
            let second = assert_ok!(embeddings.embed_file("./src/../Cargo.toml", &ctx));
            assert_eq!(first, second);
            assert_eq!(embeddings.get("Cargo.toml").unwrap().content_id(), &first);
        }

        #[test]
        fn missing_file_fails() {
            let ctx = ctx();
            let mut embeddings = Embeddings::new();
            match embeddings.embed_file("./no/such/logo.gif", &ctx) {
                Err(MailError::ResourceLoading(err)) => {
                    assert_eq!(err.reference(), Some("./no/such/logo.gif"))
                }
                other => panic!("unexpected: {:?}", other),
            }
        }
    }

    #[test]
    fn inline_embed_mail_has_disposition_and_cid() {
        let mut embeddings = Embeddings::new();
        assert_ok!(embeddings.embed_with_cid(data("file:/a.gif"), "logo.gif", "abc"));
        let mail = embeddings.get("logo.gif").unwrap().create_mail();
        assert_eq!(
            mail.headers().get(headers::CONTENT_DISPOSITION),
            Some("inline; filename=\"logo.gif\"")
        );
        assert_eq!(mail.headers().get(headers::CONTENT_ID), Some("<abc>"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_name_to_cid_map() {
        let mut embeddings = Embeddings::new();
        assert_ok!(embeddings.embed_with_cid(data("file:/a.gif"), "logo", "abc"));
        let json = serde_json::to_string(&embeddings).unwrap();
        assert_eq!(json, r#"{"logo":"abc"}"#);
    }
}
