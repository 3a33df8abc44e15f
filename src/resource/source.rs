use mime::Mime;

/// POD containing the reference which should be used to load a resource as well as
/// an optional file name and media type to use instead of the ones found when loading.
///
/// The interpretation of the reference is left to the resolver of the
/// context. Paths (relative or absolute), `file:` and `http(s):` urls are
/// all valid references, but a resolver can reject any of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    /// The reference from which the resource is loaded.
    pub reference: String,

    /// Media type overriding the one inferred by the resolver.
    pub use_media_type: Option<Mime>,

    /// Allows providing a explicit name overriding any inferred name.
    ///
    /// If a resource if loaded from a file it potentially has an inferred
    /// name e.g. for loading a file `secret_thing.png` it would be just
    /// that file name, but you potentially want to provide a name which
    /// differs from the name the file has in the file system.
    pub use_file_name: Option<String>,
}

impl Source {
    pub fn new(reference: impl Into<String>) -> Self {
        Source {
            reference: reference.into(),
            use_media_type: None,
            use_file_name: None,
        }
    }

    pub fn with_media_type(mut self, media_type: Mime) -> Self {
        self.use_media_type = Some(media_type);
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.use_file_name = Some(file_name.into());
        self
    }
}
