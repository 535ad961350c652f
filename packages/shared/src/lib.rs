//! Shared utilities for Symposium binaries and libraries.

pub mod logger;
pub mod time;
