//! Server-side page lifecycle engine for legacy templated pages.
//!
//! Compiles page templates into cached immutable artifacts, instantiates
//! a stateful control tree per request, replays the lifecycle phases
//! (state restore, postback, events, render, state save), and runs a
//! declarative validation layer with optional client-side echo.

mod compiler;
mod config;
mod errors;
mod fs;
mod host;
mod queue;
mod tree;
mod validation;

pub use compiler::*;
pub use config::*;
pub use errors::*;
pub use fs::*;
pub use host::*;
pub use queue::*;
pub use tree::*;
pub use validation::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
