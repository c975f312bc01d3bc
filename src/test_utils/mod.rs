//! Shared helpers for unit tests: logger setup, page/tree builders, and
//! a small in-memory template corpus.

mod common;

pub use common::*;
