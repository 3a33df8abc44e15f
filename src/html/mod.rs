//! Embedding of resources referenced from a html body.
//!
//! The `HtmlReferenceRewriter` finds the `src` attributes of `img` and
//! `script` tags, resolves the referenced resources, embeds them and
//! replaces the reference with a `cid:` url pointing to the embedding.
//!
//! Finding the references is done by a `ReferenceFinder`, there are two
//! implementations producing the same matches: `RegexFinder` uses one
//! regex per tag/attribute pair and `MatcherFinder` uses a cascade of
//! simple matchers which never backtracks more then one attribute list.
use std::collections::HashMap;
use std::fmt::Debug;

use crate::{
    content_id::{is_cid_reference, ContentId},
    context::Context,
    embeddings::Embeddings,
    error::{MailError, ResourceLoadingError, ResourceLoadingErrorKind},
    resolver::ResourceResolver,
    resource::Data,
};

pub mod matcher;
pub mod pattern;

pub use self::matcher::MatcherFinder;
pub use self::pattern::RegexFinder;

/// The tag/attribute pairs containing references which are embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceShape {
    /// `<img ... src="...">`
    ImgSrc,
    /// `<script ... src="...">`
    ScriptSrc,
}

impl ReferenceShape {
    /// All shapes in the order they are processed.
    pub const ALL: &'static [ReferenceShape] = &[ReferenceShape::ImgSrc, ReferenceShape::ScriptSrc];

    pub fn tag(&self) -> &'static str {
        match *self {
            ReferenceShape::ImgSrc => "img",
            ReferenceShape::ScriptSrc => "script",
        }
    }

    pub fn attribute(&self) -> &'static str {
        "src"
    }
}

/// A reference found in a html document.
///
/// `start..end` is the span from the `<` of the tag to the closing quote
/// of the attribute value, `value_start..value_end` the span of the value
/// (without quotes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceMatch {
    pub start: usize,
    pub end: usize,
    pub value_start: usize,
    pub value_end: usize,
}

impl ReferenceMatch {
    /// The attribute value.
    pub fn value<'a>(&self, html: &'a str) -> &'a str {
        &html[self.value_start..self.value_end]
    }

    /// All of the matched text.
    pub fn matched_text<'a>(&self, html: &'a str) -> &'a str {
        &html[self.start..self.end]
    }
}

/// Finds the references of one shape in a html document.
pub trait ReferenceFinder: Debug + Send + Sync {
    /// Returns all non overlapping matches from left to right.
    fn find_all(&self, html: &str, shape: ReferenceShape) -> Vec<ReferenceMatch>;
}

impl<F> ReferenceFinder for Box<F>
where
    F: ReferenceFinder + ?Sized,
{
    fn find_all(&self, html: &str, shape: ReferenceShape) -> Vec<ReferenceMatch> {
        (**self).find_all(html, shape)
    }
}

/// A reference which was replaced by a `cid:` url.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReference {
    /// The text of the match before the replacement, e.g. `<img src="logo.gif"`.
    pub original: String,
    pub content_id: ContentId,
}

/// The output of `HtmlReferenceRewriter::rewrite`.
#[derive(Debug, Clone)]
pub struct Rewritten {
    pub html: String,
    pub references: Vec<ResolvedReference>,
}

/// Rewrites references in a html document to embedded resources.
#[derive(Debug)]
pub struct HtmlReferenceRewriter {
    finder: Box<dyn ReferenceFinder>,
    lenient: bool,
}

impl HtmlReferenceRewriter {
    /// Creates a rewriter using the `RegexFinder`.
    ///
    /// If `lenient` is true references which can not be resolved are left
    /// as they are, else rewriting fails.
    pub fn new(lenient: bool) -> Self {
        HtmlReferenceRewriter::with_finder(RegexFinder, lenient)
    }

    pub fn with_finder(finder: impl ReferenceFinder + 'static, lenient: bool) -> Self {
        HtmlReferenceRewriter {
            finder: Box::new(finder),
            lenient,
        }
    }

    pub fn lenient(&self) -> bool {
        self.lenient
    }

    pub fn finder(&self) -> &dyn ReferenceFinder {
        &*self.finder
    }

    /// Embeds all resources referenced by the html and rewrites the references.
    ///
    /// `img src` references are processed first, then `script src`. Loaded
    /// data is cached per reference and content ids are cached per name (file
    /// name of the loaded data) for the whole call. All text except the
    /// replaced attribute values stays as it is.
    ///
    /// # Error
    ///
    /// - in strict mode if a reference can not be resolved
    /// - in any mode if the name of a resolved resource is already bound to
    ///   a different resource in `embeddings`
    pub fn rewrite(
        &self,
        html: &str,
        resolver: &dyn ResourceResolver,
        embeddings: &mut Embeddings,
        ctx: &impl Context,
    ) -> Result<Rewritten, MailError> {
        let mut state = RewriteState {
            resolver,
            embeddings,
            data_cache: HashMap::new(),
            cid_cache: HashMap::new(),
            references: Vec::new(),
        };

        let mut html = html.to_owned();
        for shape in ReferenceShape::ALL {
            html = self.rewrite_shape(&html, *shape, &mut state, ctx)?;
        }

        Ok(Rewritten {
            html,
            references: state.references,
        })
    }

    fn rewrite_shape(
        &self,
        html: &str,
        shape: ReferenceShape,
        state: &mut RewriteState,
        ctx: &impl Context,
    ) -> Result<String, MailError> {
        let matches = self.finder.find_all(html, shape);
        trace!("found {} {} {} references", matches.len(), shape.tag(), shape.attribute());

        let mut out = String::with_capacity(html.len());
        let mut last_end = 0;
        for found in matches {
            let reference = found.value(html);
            if is_cid_reference(reference) {
                continue;
            }
            let content_id = match self.embed_reference(reference, state, ctx)? {
                Some(content_id) => content_id,
                None => continue,
            };
            out.push_str(&html[last_end..found.value_start]);
            out.push_str(&content_id.cid_url());
            last_end = found.value_end;

            state.references.push(ResolvedReference {
                original: found.matched_text(html).to_owned(),
                content_id,
            });
        }
        out.push_str(&html[last_end..]);
        Ok(out)
    }

    fn embed_reference(
        &self,
        reference: &str,
        state: &mut RewriteState,
        ctx: &impl Context,
    ) -> Result<Option<ContentId>, MailError> {
        let data = match state.data_cache.get(reference) {
            Some(data) => data.clone(),
            None => {
                let data = self.resolve(reference, state.resolver)?;
                state.data_cache.insert(reference.to_owned(), data.clone());
                data
            }
        };
        let data = match data {
            Some(data) => data,
            None => {
                warn!("could not resolve {:?}, it is not embedded", reference);
                return Ok(None);
            }
        };

        let name = data.file_name().unwrap_or(reference).to_owned();
        if let Some(content_id) = state.cid_cache.get(&name) {
            return Ok(Some(content_id.clone()));
        }
        let content_id = state.embeddings.embed(data, &name, ctx)?;
        state.cid_cache.insert(name, content_id.clone());
        Ok(Some(content_id))
    }

    fn resolve(
        &self,
        reference: &str,
        resolver: &dyn ResourceResolver,
    ) -> Result<Option<Data>, ResourceLoadingError> {
        let reference_owned = || Some(reference.to_owned());
        let data = resolver
            .resolve(reference, self.lenient)
            .map_err(|err| err.with_reference_or_else(reference_owned))?;
        if data.is_none() && !self.lenient {
            return Err(ResourceLoadingError::from(ResourceLoadingErrorKind::NotFound)
                .with_reference(reference));
        }
        Ok(data)
    }
}

impl Default for HtmlReferenceRewriter {
    fn default() -> Self {
        HtmlReferenceRewriter::new(false)
    }
}

struct RewriteState<'a> {
    resolver: &'a dyn ResourceResolver,
    embeddings: &'a mut Embeddings,
    data_cache: HashMap<String, Option<Data>>,
    cid_cache: HashMap<String, ContentId>,
    references: Vec<ResolvedReference>,
}
