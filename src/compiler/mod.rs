//! Dynamic page compiler and process-wide template cache.
//!
//! Template source (directive plus nested control tags) parses into a
//! [`ControlTemplate`] tree, lowers into an immutable [`CompiledPage`]
//! artifact, and caches under a normalized path key. Concurrent first
//! requests for one path share a single compilation; a fired change
//! token evicts the entry so the next request recompiles.

mod page_compiler;
mod template;
mod template_cache;

pub use page_compiler::*;
pub use template::*;
pub use template_cache::*;

#[cfg(test)]
mod template_test;
