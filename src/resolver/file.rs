use std::env;
use std::io;
use std::path::{Path, PathBuf};

use failure::Fail;
use url::Url;

use super::{apply_leniency, is_file_reference, load_file, ResourceResolver};
use crate::{
    content_id::is_cid_reference,
    error::{ResourceLoadingError, ResourceLoadingErrorKind},
    resource::Data,
};

/// Resolves references to files in the file system.
///
/// Relative paths are resolved against the base directory, absolute paths
/// and `file:` urls are used as they are. `cid:` references are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct FileResolver {
    base_dir: PathBuf,
}

impl FileResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        FileResolver {
            base_dir: base_dir.into(),
        }
    }

    /// Creates a resolver using the current working directory as base.
    pub fn with_cwd_base() -> Result<Self, io::Error> {
        Ok(FileResolver::new(env::current_dir()?))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns the path a reference refers to.
    pub fn path_for(&self, reference: &str) -> Result<PathBuf, ResourceLoadingError> {
        if is_file_reference(reference) {
            let url = Url::parse(reference).map_err(|err| {
                ResourceLoadingError::from(err.context(ResourceLoadingErrorKind::InvalidReference))
                    .with_reference(reference)
            })?;
            return url.to_file_path().map_err(|()| {
                ResourceLoadingError::from(ResourceLoadingErrorKind::InvalidReference)
                    .with_reference(reference)
            });
        }

        let path = Path::new(reference);
        if path.is_absolute() {
            Ok(path.to_owned())
        } else {
            Ok(self.base_dir.join(path))
        }
    }
}

impl Default for FileResolver {
    fn default() -> Self {
        FileResolver::new(".")
    }
}

impl ResourceResolver for FileResolver {
    fn resolve(&self, reference: &str, lenient: bool) -> Result<Option<Data>, ResourceLoadingError> {
        if is_cid_reference(reference) {
            return Ok(None);
        }
        let result = self.path_for(reference).and_then(|path| {
            trace!("resolving {:?} as file {}", reference, path.display());
            load_file(&path)
        });
        apply_leniency(result, lenient)
    }
}
