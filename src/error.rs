//! Error types for the depset engine

use thiserror::Error;

/// Error raised by a caller-supplied leaf factory
pub type LeafError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Grammar violations detected while parsing a dependency string
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrammarError {
    #[error("unbalanced grouping")]
    Unbalanced,

    #[error("empty group")]
    EmptyGroup,

    #[error("malformed token")]
    MalformedToken,

    #[error("expected '(' after operator")]
    MissingOpenParen,

    #[error("operator not allowed here")]
    OperatorNotAllowed,

    #[error("empty flag predicate")]
    EmptyPredicate,
}

/// The single error kind produced by the parser
///
/// Parsing is all-or-nothing; whatever went wrong, the full input string is
/// carried along so callers can report which metadata value was bad.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("{dep_str:?} is unparseable: {kind}{}", flagged(.token))]
    Grammar {
        dep_str: String,
        token: Option<String>,
        kind: GrammarError,
    },

    #[error("{dep_str:?} is unparseable: flagged token {token:?} was rejected")]
    Leaf {
        dep_str: String,
        token: String,
        #[source]
        source: LeafError,
    },
}

fn flagged(token: &Option<String>) -> String {
    match token {
        Some(token) => format!(", flagged token {:?}", token),
        None => String::new(),
    }
}

impl ParseError {
    pub(crate) fn grammar(dep_str: &str, token: Option<&str>, kind: GrammarError) -> Self {
        ParseError::Grammar {
            dep_str: dep_str.to_string(),
            token: token.map(str::to_string),
            kind,
        }
    }

    pub(crate) fn leaf(dep_str: &str, token: &str, source: LeafError) -> Self {
        ParseError::Leaf {
            dep_str: dep_str.to_string(),
            token: token.to_string(),
            source,
        }
    }

    /// The full dependency string that failed to parse
    pub fn dep_str(&self) -> &str {
        match self {
            ParseError::Grammar { dep_str, .. } | ParseError::Leaf { dep_str, .. } => dep_str,
        }
    }

    /// The offending token, if one could be identified
    pub fn token(&self) -> Option<&str> {
        match self {
            ParseError::Grammar { token, .. } => token.as_deref(),
            ParseError::Leaf { token, .. } => Some(token),
        }
    }

    /// The grammar violation, or `None` when the leaf factory failed
    pub fn grammar_error(&self) -> Option<GrammarError> {
        match self {
            ParseError::Grammar { kind, .. } => Some(*kind),
            ParseError::Leaf { .. } => None,
        }
    }

    pub fn is_leaf_error(&self) -> bool {
        matches!(self, ParseError::Leaf { .. })
    }
}

/// Main error type for the depset engine
#[derive(Error, Debug)]
pub enum DepSetError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Invalid flag settings: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias for the depset engine
pub type Result<T> = std::result::Result<T, DepSetError>;
