//! Test support utilities for the findmines engine
//!
//! Shared by the integration test binaries: one-time logging setup and
//! helpers for unique player identifiers.

pub mod logging;
pub mod unique_helpers;
