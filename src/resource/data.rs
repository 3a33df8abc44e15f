use std::sync::Arc;

use mime::Mime;

use crate::{
    charset::Charset,
    error::EncodingError,
    iri::IRI,
    mime::text_media_type,
};

/// POD type containing the media type, an optional file name and the origin of some data.
///
/// The media type will be used for the content type header which is used
/// to determine how a mail client will handle the data. It is also used
/// to get a hint on how to best transfer encode it.
///
/// The origin is the (resolved) IRI the data was loaded from. It's used
/// to decide if two `Data` instances represent the same resource, e.g.
/// when embedding a resource under a name which is already in use.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// The media type of the data.
    pub media_type: Mime,

    /// The file name used in the `Content-Disposition` header.
    pub file_name: Option<String>,

    /// The IRI the data was loaded from, if any.
    pub origin: Option<IRI>,
}

impl Metadata {
    pub fn new(media_type: Mime) -> Self {
        Metadata {
            media_type,
            file_name: None,
            origin: None,
        }
    }
}

/// A type containing some data and metadata for it.
///
/// This often, but not always, corresponds to data which could potentially
/// have been a file in a file system. For example a image or a text
/// document.
///
/// # Clone
///
/// `Data` is made to be cheap to clone and share.
/// For this it uses `Arc` internally.
#[derive(Debug, Clone)]
pub struct Data {
    buffer: Arc<[u8]>,
    meta: Arc<Metadata>,
}

impl Data {
    /// Create a new data instance.
    pub fn new(buffer: impl Into<Arc<[u8]>>, meta: impl Into<Arc<Metadata>>) -> Self {
        Data {
            buffer: buffer.into(),
            meta: meta.into(),
        }
    }

    /// Creates a new instance with the given media type and no other metadata.
    pub fn from_bytes(buffer: impl Into<Arc<[u8]>>, media_type: Mime) -> Self {
        Data::new(buffer, Metadata::new(media_type))
    }

    /// Creates a `text/plain; charset=utf-8` data instance.
    pub fn plain_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Data::from_bytes(text.into_bytes(), mime::TEXT_PLAIN_UTF_8)
    }

    /// Creates a `text/<subtype>` data instance encoded with the given charset.
    pub fn text(text: &str, subtype: &str, charset: &Charset) -> Result<Self, EncodingError> {
        let bytes = charset.encode(text)?;
        let media_type = text_media_type(subtype, charset.label());
        Ok(Data::from_bytes(bytes.into_owned(), media_type))
    }

    /// Access the raw data buffer of this instance.
    pub fn buffer(&self) -> &Arc<[u8]> {
        &self.buffer
    }

    /// Access the metadata.
    pub fn metadata(&self) -> &Arc<Metadata> {
        &self.meta
    }

    /// Access the content type.
    pub fn media_type(&self) -> &Mime {
        &self.meta.media_type
    }

    pub fn file_name(&self) -> Option<&str> {
        self.meta.file_name.as_ref().map(|s| &**s)
    }

    pub fn origin(&self) -> Option<&IRI> {
        self.meta.origin.as_ref()
    }

    /// Returns a version of self with a different file name.
    ///
    /// The buffer is still shared between both instances.
    pub fn with_file_name(&self, file_name: impl Into<String>) -> Self {
        let mut meta = Metadata::clone(&self.meta);
        meta.file_name = Some(file_name.into());
        Data::new(self.buffer.clone(), meta)
    }

    /// Returns a version of self with a different media type.
    pub fn with_media_type(&self, media_type: Mime) -> Self {
        let mut meta = Metadata::clone(&self.meta);
        meta.media_type = media_type;
        Data::new(self.buffer.clone(), meta)
    }

    /// Returns a version of self with the given origin.
    pub fn with_origin(&self, origin: IRI) -> Self {
        let mut meta = Metadata::clone(&self.meta);
        meta.origin = Some(origin);
        Data::new(self.buffer.clone(), meta)
    }

    /// True if both instances represent the same underlying resource.
    ///
    /// Two instances are the same if they have the same origin, or if they
    /// share the same buffer.
    pub fn same_data(&self, other: &Data) -> bool {
        match (self.origin(), other.origin()) {
            (Some(left), Some(right)) => left == right,
            _ => Arc::ptr_eq(&self.buffer, &other.buffer),
        }
    }

    /// A short human readable description of where the data is from.
    pub fn describe(&self) -> String {
        if let Some(origin) = self.origin() {
            origin.as_str().to_owned()
        } else if let Some(name) = self.file_name() {
            name.to_owned()
        } else {
            format!("<{} bytes of {}>", self.buffer.len(), self.media_type())
        }
    }
}
