//! Utility modules for common functionality.
//!
//! Logging setup, scope guards, and executable lookup shared by the library
//! and the binary.

pub mod fs;
pub mod guard;
pub mod logger;
