//! Scenario configuration.
//!
//! - `LaunchOptions`: ordered option tokens handed verbatim to a process launcher
//! - `Scenario` / `Expectation`: what to launch and which checks to apply
//! - `ProbeSettings`: tool paths and parser defaults, read from `codeheap.json`

pub mod options;
pub mod scenarios;
pub mod settings;

pub use options::*;
pub use scenarios::*;
pub use settings::*;
