//! Black box tests for `ukv`.
//!
//! These tests only use the public API - no internal crate access. This
//! simulates what an end user would experience.
