//! Configuration module for parsing and evaluation settings
//!
//! Everything here derives `Deserialize` so callers can load it from their
//! own configuration files.

mod flags;
mod options;

pub use flags::*;
pub use options::*;
