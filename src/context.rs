//! Provides the context needed for building mails.
use std::fmt::Debug;
use std::sync::Arc;

use crate::{
    content_id::{ContentId, MessageId},
    error::{ResourceLoadingError, ResourceLoadingErrorKind},
    resolver::ResourceResolver,
    resource::{Data, Source},
};

/// This library needs a context for building mails.
///
/// The context is _not_ meant to be a think you create once
/// per mail but something you create once on startup and then
/// re-use wherever it is needed in your application.
///
/// A context impl. provides following functionality to this library:
///
/// 1. A resolver used to load `Source` resources and to embed resources
///    referred to from html bodies.
/// 2. Generate an unique message id. This should be
///    an world unique id to comply with the standard(s).
/// 3. Generate content ids for embedded resources.
///
/// The `CompositeContext` provides a impl. for this trait which
/// delegates the different tasks to the components it's composed of.
///
/// # Clone / Send / Sync / 'static ?
///
/// `Context` are meant to be easily shareable, cloning them should be
/// cheap, as such if a implementor contains state it might make sense for an
/// implementor to have a outer+inner type where the inner type is wrapped
/// into a `Arc` e.g. `struct SomeCtx { inner: Arc<InnerSomeCtx> }`.
pub trait Context: Debug + Clone + Send + Sync + 'static {
    /// The resolver (chain) used to resolve references.
    fn resolver(&self) -> &dyn ResourceResolver;

    /// Loads the data for a `Source`.
    ///
    /// This is called for every `Resource::Source` when a mail is built.
    /// The default impl. strictly resolves the reference with `resolver()`
    /// and then applies the file name and media type overrides of the source.
    fn load_resource(&self, source: &Source) -> Result<Data, ResourceLoadingError> {
        default_impl_for_load_resource(self, source)
    }

    /// generate a unique message id
    ///
    /// As message id's are used to reference messages they should be
    /// world unique this can be guaranteed through two aspects:
    ///
    /// 1. using a domain you own/control on the right hand side
    ///    of the `@` will make sure no id's from other persons/companies/...
    ///    will collide with your ids
    ///
    /// 2. using some internal mechanism for the left hand side, like including
    ///    the time and an internal counter, not that you have to make sure this
    ///    stays unique even if you run multiple instances or restart the current
    ///    running instance.
    fn generate_message_id(&self) -> MessageId;

    /// generate a content id for an embedded resource
    ///
    /// Content ids only have to be unique within the mail they are used in.
    /// Uniqueness is not checked against already used ids.
    fn generate_content_id(&self) -> ContentId;
}

/// Provides the default impl for the `load_resource` method of `Context`.
pub fn default_impl_for_load_resource(
    ctx: &impl Context,
    source: &Source,
) -> Result<Data, ResourceLoadingError> {
    let data = ctx
        .resolver()
        .resolve(&source.reference, false)
        .map_err(|err| err.with_reference_or_else(|| Some(source.reference.clone())))?
        .ok_or_else(|| {
            ResourceLoadingError::from(ResourceLoadingErrorKind::NotFound)
                .with_reference(source.reference.as_str())
        })?;

    let data = match source.use_media_type {
        Some(ref media_type) => data.with_media_type(media_type.clone()),
        None => data,
    };
    let data = match source.use_file_name {
        Some(ref name) => data.with_file_name(name.as_str()),
        None => data,
    };
    Ok(data)
}

/// Trait needed to be implemented for providing the id generation parts to a `CompositeContext`.
///
/// It is possible/valid to use the same implementation (internal function etc.) for
/// both message and content ids, but normally content ids are short random strings
/// while message ids need to be world unique.
pub trait MailIdGenComponent: Debug + Send + Sync + 'static {
    /// Calls to `Context::generate_message_id` will be forwarded to this method.
    fn generate_message_id(&self) -> MessageId;

    /// Calls to `Context::generate_content_id` will be forwarded to this method.
    fn generate_content_id(&self) -> ContentId;
}

/// The `CompositeContext` is the simplest way to get an `Context` implementation.
///
/// This type consists of 2 components it forward all method calls from `Context` to,
/// a resolver and a id generator.
///
/// The composite context will store the components inside of an `Arc` so that
/// it can be easily shared through an application, it also means non of the
/// components have to implement `Clone`.
#[derive(Debug)]
pub struct CompositeContext<R, M>
where
    R: ResourceResolver + 'static,
    M: MailIdGenComponent,
{
    inner: Arc<(R, M)>,
}

impl<R, M> Clone for CompositeContext<R, M>
where
    R: ResourceResolver + 'static,
    M: MailIdGenComponent,
{
    fn clone(&self) -> Self {
        CompositeContext {
            inner: self.inner.clone(),
        }
    }
}

impl<R, M> CompositeContext<R, M>
where
    R: ResourceResolver + 'static,
    M: MailIdGenComponent,
{
    /// Create a new context from the given components.
    pub fn new(resolver: R, id_gen: M) -> Self {
        CompositeContext {
            inner: Arc::new((resolver, id_gen)),
        }
    }

    /// Returns a reference to the resolver component.
    pub fn resolver_component(&self) -> &R {
        &self.inner.0
    }

    /// Returns a reference to the id generation component.
    pub fn id_gen(&self) -> &M {
        &self.inner.1
    }
}

impl<R, M> Context for CompositeContext<R, M>
where
    R: ResourceResolver + 'static,
    M: MailIdGenComponent,
{
    fn resolver(&self) -> &dyn ResourceResolver {
        self.resolver_component()
    }

    fn generate_message_id(&self) -> MessageId {
        self.id_gen().generate_message_id()
    }

    fn generate_content_id(&self) -> ContentId {
        self.id_gen().generate_content_id()
    }
}
