//! Hosting facade tying the cache, compiler, queue, and lifecycle
//! together behind the surface a request pipeline adapter consumes.

mod page_host;

pub use page_host::*;

#[cfg(test)]
mod page_host_test;
