//! depset-core - dependency set expressions for source-based package managers
//!
//! Parses the boolean dependency syntax used by DEPEND, SRC_URI, LICENSE and
//! friends into an immutable tree, reduces it against enabled flags and
//! renders it back to text.
//!
//! ```
//! use depset_core::DepSet;
//! use std::collections::HashSet;
//!
//! let depset = DepSet::parse_plain("ssl? ( dev-libs/openssl ) sys-libs/zlib").unwrap();
//! let enabled: HashSet<&str> = ["ssl"].into_iter().collect();
//! assert_eq!(depset.reduce(&enabled).to_string(), "dev-libs/openssl sys-libs/zlib");
//! assert!(depset.known_flags().contains("ssl"));
//! ```

pub mod config;
pub mod depset;
pub mod error;

pub use crate::config::{DepSetKind, FlagSettings, ParseOptions};
pub use crate::depset::{
    Conditional, ConditionalIndex, DepSet, DepSetCache, FlagPredicate, FlagSet, Group, GroupKind,
    Node,
};
pub use crate::error::{DepSetError, GrammarError, LeafError, ParseError, Result};
