//! Flag settings supplied by the profile/configuration stack

use crate::depset::{DepSet, FlagSet};
use crate::error::Result;
use serde::Deserialize;
use std::collections::BTreeSet;

/// Enabled flags plus an optional restriction for forced/masked collapsing
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FlagSettings {
    pub enabled: BTreeSet<String>,
    /// When set, only conditionals on these flags are evaluated
    pub restrict_to: Option<BTreeSet<String>>,
}

impl FlagSettings {
    pub fn new<I, S>(enabled: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enabled: enabled.into_iter().map(Into::into).collect(),
            restrict_to: None,
        }
    }

    /// Lock evaluation to `flags`; conditionals on any other flag pass
    pub fn restricted_to<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.restrict_to = Some(flags.into_iter().map(Into::into).collect());
        self
    }

    /// Load settings from a JSON document
    ///
    /// Expected format: `{"enabled": [...], "restrict_to": [...]}`, both keys
    /// optional.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reduce `depset` under these settings
    pub fn evaluate<T: Clone>(&self, depset: &DepSet<T>) -> DepSet<T> {
        let restrict = self.restrict_to.as_ref().map(|r| r as &dyn FlagSet);
        depset.evaluate(&self.enabled, restrict)
    }
}
