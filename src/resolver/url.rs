use std::fmt::Debug;

use failure::Fail;
use mime::Mime;
use percent_encoding::percent_decode_str;
use url::Url;

use super::{apply_leniency, is_file_reference, is_http_reference, load_file, ResourceResolver};
use crate::{
    content_id::is_cid_reference,
    error::{ResourceLoadingError, ResourceLoadingErrorKind},
    iri::IRI,
    mime::guess_media_type,
    resource::{Data, Metadata},
};

/// Fetches the data an url points to.
pub trait UrlFetcher: Debug + Send + Sync {
    fn fetch(&self, url: &Url) -> Result<Data, ResourceLoadingError>;
}

/// The default `UrlFetcher`.
///
/// `file:` urls are read from the file system. `http:` and `https:` urls
/// are fetched with a blocking `reqwest` client if the `http` feature is
/// enabled, without it they are not supported.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUrlFetcher;

impl UrlFetcher for DefaultUrlFetcher {
    fn fetch(&self, url: &Url) -> Result<Data, ResourceLoadingError> {
        match url.scheme() {
            "file" => {
                let path = url.to_file_path().map_err(|()| {
                    ResourceLoadingError::from(ResourceLoadingErrorKind::InvalidReference)
                        .with_reference(url.as_str())
                })?;
                load_file(&path)
            }
            "http" | "https" => fetch_http(url),
            _ => Err(ResourceLoadingError::from(ResourceLoadingErrorKind::Unsupported)
                .with_reference(url.as_str())),
        }
    }
}

#[cfg(feature = "http")]
fn fetch_http(url: &Url) -> Result<Data, ResourceLoadingError> {
    let failed = |err: reqwest::Error| {
        ResourceLoadingError::from(err.context(ResourceLoadingErrorKind::LoadingFailed))
            .with_reference(url.as_str())
    };

    let response = reqwest::blocking::get(url.clone()).map_err(failed)?;
    let status = response.status();
    if !status.is_success() {
        let kind = if status == reqwest::StatusCode::NOT_FOUND {
            ResourceLoadingErrorKind::NotFound
        } else {
            ResourceLoadingErrorKind::LoadingFailed
        };
        return Err(ResourceLoadingError::from(kind).with_reference(url.as_str()));
    }

    let media_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Mime>().ok());

    let buffer = response.bytes().map_err(failed)?;
    Ok(data_for_url(url, buffer.to_vec(), media_type))
}

#[cfg(not(feature = "http"))]
fn fetch_http(url: &Url) -> Result<Data, ResourceLoadingError> {
    Err(ResourceLoadingError::from(ResourceLoadingErrorKind::Unsupported)
        .with_reference(url.as_str()))
}

/// Creates `Data` for something fetched from given url.
///
/// The file name is the url decoded last path segment, the media type is
/// guessed from it if none is given.
pub fn data_for_url(url: &Url, buffer: Vec<u8>, media_type: Option<Mime>) -> Data {
    let file_name = url
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|name| !name.is_empty())
        .map(|name| percent_decode_str(name).decode_utf8_lossy().into_owned());

    let media_type = media_type.unwrap_or_else(|| guess_media_type(url.path()));

    let meta = Metadata {
        media_type,
        file_name,
        origin: IRI::new(url.as_str()).ok(),
    };
    Data::new(buffer, meta)
}

/// Resolves references as urls.
///
/// `file:`, `http:` and `https:` references are used as they are, other
/// references are joined with the base url (after replacing `&amp;` with `&`).
/// Without a base url any reference has to be an absolute url.
/// `cid:` references are ignored.
#[derive(Debug)]
pub struct UrlResolver<F: UrlFetcher = DefaultUrlFetcher> {
    base_url: Option<Url>,
    fetcher: F,
}

impl UrlResolver<DefaultUrlFetcher> {
    pub fn new(base_url: Option<Url>) -> Self {
        UrlResolver::with_fetcher(base_url, DefaultUrlFetcher)
    }

    /// Creates a resolver from a base url string.
    pub fn from_base(base_url: &str) -> Result<Self, ResourceLoadingError> {
        let url = parse_url(base_url)?;
        Ok(UrlResolver::new(Some(url)))
    }
}

impl<F> UrlResolver<F>
where
    F: UrlFetcher,
{
    pub fn with_fetcher(base_url: Option<Url>, fetcher: F) -> Self {
        UrlResolver { base_url, fetcher }
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Returns the url a reference refers to.
    pub fn url_for(&self, reference: &str) -> Result<Url, ResourceLoadingError> {
        let base = match self.base_url {
            Some(ref base) => base,
            None => return parse_url(reference),
        };

        if reference.is_empty() {
            return Err(ResourceLoadingError::from(ResourceLoadingErrorKind::InvalidReference)
                .with_reference(reference));
        }

        if is_file_reference(reference) || is_http_reference(reference) {
            return parse_url(reference);
        }

        let unescaped = reference.replace("&amp;", "&");
        base.join(&unescaped).map_err(|err| {
            ResourceLoadingError::from(err.context(ResourceLoadingErrorKind::InvalidReference))
                .with_reference(reference)
        })
    }
}

fn parse_url(reference: &str) -> Result<Url, ResourceLoadingError> {
    Url::parse(reference).map_err(|err| {
        ResourceLoadingError::from(err.context(ResourceLoadingErrorKind::InvalidReference))
            .with_reference(reference)
    })
}

impl<F> ResourceResolver for UrlResolver<F>
where
    F: UrlFetcher,
{
    fn resolve(&self, reference: &str, lenient: bool) -> Result<Option<Data>, ResourceLoadingError> {
        if is_cid_reference(reference) {
            return Ok(None);
        }
        let result = self.url_for(reference).and_then(|url| {
            trace!("resolving {:?} as url {}", reference, url);
            self.fetcher.fetch(&url)
        });
        apply_leniency(result, lenient)
    }
}
