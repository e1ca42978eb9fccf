//! Reconstruction and checking pipeline.
//!
//! `transports` fetch raw report text, `parser` turns it into typed records,
//! `registry` classifies method addresses into segments, `invariants` checks the
//! resulting placement and `scenario` ties the stages together.

pub mod invariants;
pub mod parser;
pub mod registry;
pub mod scenario;
pub mod transports;
