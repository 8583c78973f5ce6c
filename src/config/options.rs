//! Grammar options per metadata key

use serde::Deserialize;

/// Metadata keys that carry dependency set syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepSetKind {
    Depend,
    Rdepend,
    Pdepend,
    Bdepend,
    Idepend,
    SrcUri,
    License,
    RequiredUse,
    Restrict,
    Properties,
}

impl DepSetKind {
    pub const ALL: [DepSetKind; 10] = [
        DepSetKind::Depend,
        DepSetKind::Rdepend,
        DepSetKind::Pdepend,
        DepSetKind::Bdepend,
        DepSetKind::Idepend,
        DepSetKind::SrcUri,
        DepSetKind::License,
        DepSetKind::RequiredUse,
        DepSetKind::Restrict,
        DepSetKind::Properties,
    ];

    /// The metadata key as written in ebuilds
    pub fn key(self) -> &'static str {
        match self {
            DepSetKind::Depend => "DEPEND",
            DepSetKind::Rdepend => "RDEPEND",
            DepSetKind::Pdepend => "PDEPEND",
            DepSetKind::Bdepend => "BDEPEND",
            DepSetKind::Idepend => "IDEPEND",
            DepSetKind::SrcUri => "SRC_URI",
            DepSetKind::License => "LICENSE",
            DepSetKind::RequiredUse => "REQUIRED_USE",
            DepSetKind::Restrict => "RESTRICT",
            DepSetKind::Properties => "PROPERTIES",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Whether `|| ( ... )` groups are meaningful for this key
    pub fn allows_any_of(self) -> bool {
        !matches!(
            self,
            DepSetKind::SrcUri | DepSetKind::Restrict | DepSetKind::Properties
        )
    }
}

/// Which operators the parser accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Accept `|| ( ... )`
    pub allow_any_of: bool,
    /// Accept `flag? ( ... )`
    pub allow_conditionals: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            allow_any_of: true,
            allow_conditionals: true,
        }
    }
}

impl ParseOptions {
    pub fn for_kind(kind: DepSetKind) -> Self {
        Self {
            allow_any_of: kind.allows_any_of(),
            allow_conditionals: true,
        }
    }
}
