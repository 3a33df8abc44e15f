use crate::{context::Context, error::ResourceLoadingError};

mod data;
mod source;

pub use self::data::*;
pub use self::source::*;

/// A enum specifying a "resource" for a mail.
///
/// A resource represents any kind of actual data.
/// It can be anything from a html body of a mail over a embedded
/// image to a attached spread sheet.
///
/// A resource can be specified in 2 ways:
/// 1. As a source specifying what to get and how to handle it.
/// 2. Data (and Metadata) representing a resource.
///
/// Normally generated content (like the text bodies) will be provided as
/// `Data`, attachments are often provided as `Source`. When the mail is
/// built all `Source` resources are loaded using the resolver of the
/// context, so the built mail only contains `Data`.
#[derive(Debug, Clone)]
pub enum Resource {
    /// Provide a source which specify what data to use.
    ///
    /// This also allows specifying a media type and a file name
    /// overriding whatever the resolver would infer.
    Source(Source),

    /// Provide the data used for the mail bodies content.
    ///
    /// This for example could be a png image.
    Data(Data),
}

impl Resource {
    /// Creates a new text `Resource` with `text/plain; charset=utf-8` media type.
    pub fn plain_text(content: impl Into<String>) -> Resource {
        Resource::Data(Data::plain_text(content))
    }

    /// Creates a `Resource::Source` for given reference.
    pub fn source(reference: impl Into<String>) -> Resource {
        Resource::Source(Source::new(reference))
    }

    /// Returns the data if the resource is already loaded.
    pub fn data(&self) -> Option<&Data> {
        match *self {
            Resource::Source(..) => None,
            Resource::Data(ref data) => Some(data),
        }
    }

    /// Returns the file name, if already known.
    pub fn file_name(&self) -> Option<&str> {
        match *self {
            Resource::Source(ref source) => source.use_file_name.as_ref().map(|s| &**s),
            Resource::Data(ref data) => data.file_name(),
        }
    }

    /// True if both resources refer to the same underlying resource.
    ///
    /// - two sources are the same if they have the same reference
    /// - two data instances are the same if they have the same origin
    ///   or share the same buffer
    /// - a source and a data instance are the same if the origin of the
    ///   data is the reference of the source
    pub fn same_resource(&self, other: &Resource) -> bool {
        match (self, other) {
            (Resource::Source(left), Resource::Source(right)) => left.reference == right.reference,
            (Resource::Data(left), Resource::Data(right)) => left.same_data(right),
            (Resource::Source(source), Resource::Data(data))
            | (Resource::Data(data), Resource::Source(source)) => data
                .origin()
                .map(|origin| origin.as_str() == source.reference)
                .unwrap_or(false),
        }
    }

    /// A short human readable description used in error messages.
    pub fn describe(&self) -> String {
        match *self {
            Resource::Source(ref source) => source.reference.clone(),
            Resource::Data(ref data) => data.describe(),
        }
    }

    /// Loads the data of this resource.
    ///
    /// For `Resource::Data` this is a cheap clone.
    pub fn load(&self, ctx: &impl Context) -> Result<Data, ResourceLoadingError> {
        match *self {
            Resource::Source(ref source) => ctx.load_resource(source),
            Resource::Data(ref data) => Ok(data.clone()),
        }
    }
}

impl From<Data> for Resource {
    fn from(data: Data) -> Self {
        Resource::Data(data)
    }
}

impl From<Source> for Resource {
    fn from(source: Source) -> Self {
        Resource::Source(source)
    }
}
