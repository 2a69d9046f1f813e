//! Utility functions.

pub mod hex;
