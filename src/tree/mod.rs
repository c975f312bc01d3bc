//! Control tree & state engine.
//!
//! Builds/restores a tree of stateful controls from persisted state,
//! tracks per-node dirty state, and drives the lifecycle phases:
//! `Init -> LoadState -> LoadPostbackData -> RaiseChangedEvents ->
//! RaisePostbackEvent -> PreRender -> Render -> SaveState -> Unload`.
//!
//! Nodes live in an arena owned by the [`Page`]; parent/child/naming
//! links are indices, so the tree has no owning cycles.

mod control;
mod html_writer;
mod lifecycle;
mod page;
mod postback;
mod state_bag;
mod view_state;

pub use control::*;
pub use html_writer::*;
pub use lifecycle::*;
pub use page::*;
pub use postback::*;
pub use state_bag::*;
pub use view_state::*;

#[cfg(test)]
mod page_test;
#[cfg(test)]
mod postback_test;
#[cfg(test)]
mod state_bag_test;
#[cfg(test)]
mod view_state_test;
