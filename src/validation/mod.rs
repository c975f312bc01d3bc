//! Validation engine layered over the control tree.
//!
//! Validators are controls registered into a page-scoped ordered
//! collection. `Page::validate(group)` resolves each matching validator's
//! target by name within its naming container, evaluates the rule as a
//! pure function of the resolved value, and aggregates page validity.
//! Uplevel validators additionally emit a declarative attribute set for a
//! client-side mirror of the same evaluation; the server stays
//! authoritative.

mod client_echo;
mod engine;
mod source;
mod validator;

pub use client_echo::*;
pub use source::*;
pub use validator::*;

#[cfg(test)]
mod client_echo_test;
