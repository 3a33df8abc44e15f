use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use failure::Fail;

use super::{is_http_reference, ResourceResolver};
use crate::{
    content_id::is_cid_reference,
    error::{ResourceLoadingError, ResourceLoadingErrorKind},
    iri::IRI,
    mime::guess_media_type,
    resource::{Data, Metadata},
};

const EMBEDDED_SCHEME: &str = "embedded";

/// Resolves references against an in-memory bundle of resources.
///
/// Resources are stored under absolute paths (e.g. `/images/logo.gif`).
/// A reference is looked up as `root + reference` with any `//` collapsed
/// into `/`, so with the root `/` both `images/logo.gif` and
/// `/images/logo.gif` refer to the same resource.
///
/// `cid:` and `http(s):` references are not handled by this resolver.
///
/// # Example
///
/// ```
/// # use mail_compose::resolver::{EmbeddedResolver, ResourceResolver};
/// let resolver = EmbeddedResolver::new("/")
///     .with_resource("/images/logo.gif", b"GIF89a".to_vec());
///
/// let data = resolver.resolve("images/logo.gif", false).unwrap().unwrap();
/// assert_eq!(data.media_type().essence_str(), "image/gif");
/// assert_eq!(data.file_name(), Some("logo.gif"));
/// ```
#[derive(Debug, Clone)]
pub struct EmbeddedResolver {
    root: String,
    resources: HashMap<String, Data>,
}

impl EmbeddedResolver {
    pub fn new(root: impl Into<String>) -> Self {
        EmbeddedResolver {
            root: root.into(),
            resources: HashMap::new(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Adds a resource under the given absolute path.
    ///
    /// The media type is guessed from the path, the file name is the last
    /// path segment. Adding a resource under an existing path replaces it.
    pub fn add_resource(&mut self, path: &str, buffer: impl Into<Arc<[u8]>>) {
        let path = normalize_path(path);
        let file_name = path
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .map(ToOwned::to_owned);

        let meta = Metadata {
            media_type: guess_media_type(&path),
            file_name,
            // UNWRAP_SAFE: constant valid scheme
            origin: Some(IRI::from_parts(EMBEDDED_SCHEME, &path).unwrap()),
        };
        self.resources.insert(path, Data::new(buffer, meta));
    }

    pub fn with_resource(mut self, path: &str, buffer: impl Into<Arc<[u8]>>) -> Self {
        self.add_resource(path, buffer);
        self
    }

    /// Adds all files in the directory (recursively) to the bundle.
    ///
    /// A file `<dir>/images/logo.gif` is added as `/images/logo.gif`.
    pub fn add_dir(&mut self, dir: impl AsRef<Path>) -> Result<(), ResourceLoadingError> {
        let dir = dir.as_ref();
        self.add_dir_with_prefix(dir, "")
            .map_err(|err| err.with_reference_or_else(|| Some(dir.display().to_string())))
    }

    fn add_dir_with_prefix(&mut self, dir: &Path, prefix: &str) -> Result<(), ResourceLoadingError> {
        let entries = fs::read_dir(dir).map_err(load_failed)?;
        for entry in entries {
            let entry = entry.map_err(load_failed)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = format!("{}/{}", prefix, name);
            let file_type = entry.file_type().map_err(load_failed)?;
            if file_type.is_dir() {
                self.add_dir_with_prefix(&entry.path(), &path)?;
            } else {
                let buffer = fs::read(entry.path()).map_err(load_failed)?;
                self.add_resource(&path, buffer);
            }
        }
        Ok(())
    }

    /// Returns the key a reference is looked up with.
    pub fn key_for(&self, reference: &str) -> String {
        collapse_double_slashes(&format!("{}{}", self.root, reference))
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

fn load_failed(err: std::io::Error) -> ResourceLoadingError {
    ResourceLoadingError::from(err.context(ResourceLoadingErrorKind::LoadingFailed))
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        collapse_double_slashes(path)
    } else {
        collapse_double_slashes(&format!("/{}", path))
    }
}

fn collapse_double_slashes(path: &str) -> String {
    path.replace("//", "/")
}

impl ResourceResolver for EmbeddedResolver {
    fn resolve(&self, reference: &str, lenient: bool) -> Result<Option<Data>, ResourceLoadingError> {
        if is_cid_reference(reference) || is_http_reference(reference) {
            return Ok(None);
        }

        let key = self.key_for(reference);
        if let Some(data) = self.resources.get(&key) {
            trace!("resolved {:?} as embedded resource {}", reference, key);
            return Ok(Some(data.clone()));
        }

        if lenient {
            Ok(None)
        } else {
            Err(ResourceLoadingError::from(ResourceLoadingErrorKind::NotFound).with_reference(key))
        }
    }
}
