//! Dependency set parsing and evaluation module
//!
//! This module handles parsing dependency strings like
//! "ssl? ( dev-libs/openssl ) || ( a b )", reducing them against a set of
//! enabled flags, indexing their conditionals and rendering them back out.

mod ast;
pub mod cache;
mod evaluator;
mod index;
mod parser;
mod predicate;
mod serializer;

#[cfg(test)]
mod property_tests;

pub use ast::*;
pub use cache::*;
pub use predicate::*;
