//! This module provides an number of default implementations for some of the interfaces.
//!
//! For example it provides a default implementation for the context needed
//! to build a mail and a transport which just keeps the sent mails in memory.
mod id_gen;
pub use self::id_gen::*;

mod memory_transport;
pub use self::memory_transport::*;

pub mod simple_context;

#[cfg(test)]
use crate::{context::CompositeContext, resolver::ResourceResolver};

#[cfg(test)]
pub type TestContext<R> = CompositeContext<R, HashedIdGen>;

//same crate so we can do this ;=)
#[cfg(test)]
pub fn test_context<R>(resolver: R) -> TestContext<R>
where
    R: ResourceResolver + 'static,
{
    let id_gen = HashedIdGen::new("fooblabar.test", "CM0U3c412").unwrap();
    CompositeContext::new(resolver, id_gen)
}
