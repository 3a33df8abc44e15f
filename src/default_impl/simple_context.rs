//! This module provides a type alias and constructor function for an simple context impl.
//!
//! It uses a `CompositeResolver` and `HashedIdGen` with a `CompositeContext`.
//!
//! # Example
//!
//! ```
//! use mail_compose::default_impl::simple_context;
//! use mail_compose::resolver::{CompositeResolver, EmbeddedResolver, FileResolver};
//!
//! let resolver = CompositeResolver::new()
//!     .with(EmbeddedResolver::new("/"))
//!     .with(FileResolver::new("."));
//!
//! // This normally should be world unique for any usage with the same domain.
//! // This is necessary to generate `Message-Id`s correctly.
//! let ctx = simple_context::new("example.com", "xm3r2u", resolver).unwrap();
//! ```
use crate::{
    context::CompositeContext, default_impl::HashedIdGen, error::ValidationError,
    resolver::CompositeResolver,
};

/// Type Alias for a the type returned by `simple_context::new`.
pub type Context = CompositeContext<CompositeResolver, HashedIdGen>;

/// create a new CompositeContext<CompositeResolver, HashedIdGen>
///
/// Both the `domain` and `unique_part` are passed to the `HashedIdGen::new`
/// constructor.
///
/// Note that the combination of `unique_part` and `domain` should be world
/// unique. This means if you run multiple instances of software using a context
/// or you create multiple contexts they should _not_ use the same `unique_part`
/// under any circumstances (expect if they use different domains, but then you
/// also should only use domain you actually own).
pub fn new(
    domain: &str,
    unique_part: &str,
    resolver: CompositeResolver,
) -> Result<Context, ValidationError> {
    let id_gen = HashedIdGen::new(domain, unique_part)?;
    Ok(CompositeContext::new(resolver, id_gen))
}
