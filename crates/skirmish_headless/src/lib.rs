//! # Skirmish Headless
//!
//! Headless battle runner: drives [`skirmish_core`] battles without any
//! rendering for CI verification, balance batches and determinism
//! checks. A scripted commander stands in for the planning UI.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commander;
pub mod render;
pub mod runner;
pub mod scenario;
