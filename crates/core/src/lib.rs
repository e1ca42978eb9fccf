//! codeheap-core
//!
//! Core library for checking where a JIT runtime places compiled code in its code
//! cache.
//!
//! The runtime is queried through diagnostic commands; their text reports are parsed
//! into segment declarations and compiled-method entries, each entry is classified
//! into the segment containing its address, and placement expectations are evaluated
//! into findings.
//!
//! All substantive logic lives here so it is fully testable and reusable from
//! multiple frontends.

pub mod config;
pub mod model;
pub mod services;

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
