//! File retrieval abstraction consumed by the dynamic compiler.
//!
//! The compiler depends only on the [`FileProvider`] contract, never on a
//! concrete filesystem:
//! - [`MemoryFileProvider`] backs unit tests and embedded template sets
//! - [`PhysicalFileProvider`] serves templates from disk with
//!   fingerprint-polling change detection

mod change_token;
mod file_provider;
mod memory;
mod physical;

pub use change_token::*;
pub use file_provider::*;
pub use memory::*;
pub use physical::*;

#[cfg(test)]
mod physical_test;
