//! Resolvers turn a reference (path, url, ...) into `Data`.
//!
//! Resolvers are used when embedding resources referred to from a html
//! body and when loading `Resource::Source` instances. A resolver can
//! be asked in a lenient or strict way. When lenient a reference which
//! can not be resolved is returned as `Ok(None)`, when strict it is an
//! error naming the reference.
//!
//! Multiple resolvers can be chained with a `CompositeResolver`, the
//! first resolver returning some data wins.
use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use failure::Fail;

use crate::{
    error::{ResourceLoadingError, ResourceLoadingErrorKind},
    iri::IRI,
    mime::guess_media_type,
    resource::{Data, Metadata},
};

mod composite;
mod embedded;
mod file;
mod url;

pub use self::composite::*;
pub use self::embedded::*;
pub use self::file::*;
pub use self::url::*;

/// Resolves a reference to the data it refers to.
pub trait ResourceResolver: Debug + Send + Sync {
    /// Resolves the reference.
    ///
    /// If the resolver doesn't handle the kind of reference at all
    /// (e.g. a `cid:` reference) it returns `Ok(None)` independent of
    /// `lenient`. If it handles it but can't load it it returns `Ok(None)`
    /// if `lenient` is true and an error otherwise.
    fn resolve(&self, reference: &str, lenient: bool) -> Result<Option<Data>, ResourceLoadingError>;
}

impl<R> ResourceResolver for Box<R>
where
    R: ResourceResolver + ?Sized,
{
    fn resolve(&self, reference: &str, lenient: bool) -> Result<Option<Data>, ResourceLoadingError> {
        (**self).resolve(reference, lenient)
    }
}

impl<R> ResourceResolver for Arc<R>
where
    R: ResourceResolver + ?Sized,
{
    fn resolve(&self, reference: &str, lenient: bool) -> Result<Option<Data>, ResourceLoadingError> {
        (**self).resolve(reference, lenient)
    }
}

/// True for references starting with `http:` or `https:` (case insensitive).
pub fn is_http_reference(reference: &str) -> bool {
    starts_with_ignore_case(reference, "http:") || starts_with_ignore_case(reference, "https:")
}

/// True for references starting with `file:` (case insensitive).
pub fn is_file_reference(reference: &str) -> bool {
    starts_with_ignore_case(reference, "file:")
}

fn starts_with_ignore_case(reference: &str, prefix: &str) -> bool {
    reference.len() >= prefix.len()
        && reference.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Turns the outcome of loading a resource into the outcome of resolving it.
///
/// In lenient mode any error is logged and turned into `Ok(None)`.
pub(crate) fn apply_leniency(
    result: Result<Data, ResourceLoadingError>,
    lenient: bool,
) -> Result<Option<Data>, ResourceLoadingError> {
    match result {
        Ok(data) => Ok(Some(data)),
        Err(err) => {
            if lenient {
                debug!("ignoring resource which failed to load: {}", err);
                Ok(None)
            } else {
                Err(err)
            }
        }
    }
}

/// Reads a file from the file system.
///
/// The media type is guessed from the file extension, the file name is the
/// last path component and the origin is a `file:` IRI of the canonical path.
pub fn load_file(path: &Path) -> Result<Data, ResourceLoadingError> {
    let with_path = || Some(path.display().to_string());

    let buffer = fs::read(path)
        .map_err(|err| {
            let kind = if err.kind() == io::ErrorKind::NotFound {
                ResourceLoadingErrorKind::NotFound
            } else {
                ResourceLoadingErrorKind::LoadingFailed
            };
            ResourceLoadingError::from(err.context(kind))
        })
        .map_err(|err| err.with_reference_or_else(with_path))?;

    let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_owned());
    let meta = Metadata {
        media_type: guess_media_type(path),
        file_name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
        origin: Some(IRI::for_path(canonical)),
    };

    Ok(Data::new(buffer, meta))
}
