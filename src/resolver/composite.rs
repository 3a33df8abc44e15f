use super::ResourceResolver;
use crate::{
    error::{ResourceLoadingError, ResourceLoadingErrorKind},
    resource::Data,
};

/// A chain of resolvers, the first resolver returning some data wins.
///
/// Each resolver in the chain is asked leniently. If no resolver returns
/// any data this returns `Ok(None)` if lenient and a not found error
/// naming the reference otherwise.
#[derive(Debug, Default)]
pub struct CompositeResolver {
    resolvers: Vec<Box<dyn ResourceResolver>>,
}

impl CompositeResolver {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, resolver: impl ResourceResolver + 'static) {
        self.resolvers.push(Box::new(resolver));
    }

    pub fn with(mut self, resolver: impl ResourceResolver + 'static) -> Self {
        self.push(resolver);
        self
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl ResourceResolver for CompositeResolver {
    fn resolve(&self, reference: &str, lenient: bool) -> Result<Option<Data>, ResourceLoadingError> {
        for resolver in self.resolvers.iter() {
            if let Some(data) = resolver.resolve(reference, true)? {
                return Ok(Some(data));
            }
        }

        if lenient {
            Ok(None)
        } else {
            Err(ResourceLoadingError::from(ResourceLoadingErrorKind::NotFound)
                .with_reference(reference))
        }
    }
}
