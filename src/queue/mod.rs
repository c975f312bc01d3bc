//! Deferred work queue decoupling request threads from compilation latency.
//!
//! - [`WorkQueue`]: unbounded multi-producer queue of deferred async
//!   operations; `enqueue` never blocks.
//! - [`QueueWorker`]: single background consumer loop; per-item failures
//!   are logged and the loop continues.

mod work_queue;
mod worker;

pub use work_queue::*;
pub use worker::*;
