//! Flag predicates and the flag-set seam used to evaluate them

use crate::error::GrammarError;
use ahash::AHashSet;
use std::borrow::Borrow;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

/// A collection of enabled flag names, queried only by membership
pub trait FlagSet {
    fn contains_flag(&self, flag: &str) -> bool;
}

impl<S, H> FlagSet for HashSet<S, H>
where
    S: Borrow<str> + Hash + Eq,
    H: BuildHasher,
{
    #[inline]
    fn contains_flag(&self, flag: &str) -> bool {
        self.contains(flag)
    }
}

impl<S> FlagSet for AHashSet<S>
where
    S: Borrow<str> + Hash + Eq,
{
    #[inline]
    fn contains_flag(&self, flag: &str) -> bool {
        self.contains(flag)
    }
}

impl<S> FlagSet for BTreeSet<S>
where
    S: Borrow<str> + Ord,
{
    #[inline]
    fn contains_flag(&self, flag: &str) -> bool {
        self.contains(flag)
    }
}

impl<S: AsRef<str>> FlagSet for [S] {
    fn contains_flag(&self, flag: &str) -> bool {
        self.iter().any(|f| f.as_ref() == flag)
    }
}

impl<S: AsRef<str>, const N: usize> FlagSet for [S; N] {
    fn contains_flag(&self, flag: &str) -> bool {
        self.as_slice().contains_flag(flag)
    }
}

impl<S: AsRef<str>> FlagSet for Vec<S> {
    fn contains_flag(&self, flag: &str) -> bool {
        self.as_slice().contains_flag(flag)
    }
}

impl<T: FlagSet + ?Sized> FlagSet for &T {
    #[inline]
    fn contains_flag(&self, flag: &str) -> bool {
        (**self).contains_flag(flag)
    }
}

/// Boolean test over a set of enabled flags
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlagPredicate {
    /// `flag` (must be enabled) or `!flag` (must be disabled)
    ///
    /// Names are shared, so copying a predicate into the conditional
    /// index never copies the flag text.
    Flag { name: Arc<str>, negate: bool },
    /// Conjunction of predicates
    All(Vec<FlagPredicate>),
}

impl FlagPredicate {
    /// Predicate requiring `name` to be enabled
    pub fn enabled(name: impl Into<Arc<str>>) -> Self {
        FlagPredicate::Flag {
            name: name.into(),
            negate: false,
        }
    }

    /// Predicate requiring `name` to be disabled
    pub fn disabled(name: impl Into<Arc<str>>) -> Self {
        FlagPredicate::Flag {
            name: name.into(),
            negate: true,
        }
    }

    /// Build a single-flag predicate from `name` or `!name`
    ///
    /// Stricter than the marker grammar, which only asks for a trailing `?`:
    /// an empty name (`?`, `!?`) or a doubled `!` is `MalformedToken`.
    pub fn from_token(token: &str) -> Result<Self, GrammarError> {
        let (name, negate) = match token.strip_prefix('!') {
            Some(rest) => (rest, true),
            None => (token, false),
        };
        if name.is_empty() || name.starts_with('!') {
            return Err(GrammarError::MalformedToken);
        }
        Ok(FlagPredicate::Flag {
            name: Arc::from(name),
            negate,
        })
    }

    /// Build the conjunction of several flag tokens
    ///
    /// A single token yields a plain [`FlagPredicate::Flag`].
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self, GrammarError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let preds = tokens
            .into_iter()
            .map(|t| Self::from_token(t.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if preds.is_empty() {
            return Err(GrammarError::EmptyPredicate);
        }
        Ok(Self::conjunction(preds))
    }

    /// Logical AND of `preds`; a single predicate is returned as-is
    pub fn conjunction(mut preds: Vec<FlagPredicate>) -> Self {
        if preds.len() == 1 {
            preds.remove(0)
        } else {
            FlagPredicate::All(preds)
        }
    }

    /// Names of every flag this predicate inspects
    pub fn vals(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_vals(&mut out);
        out
    }

    pub(crate) fn collect_vals<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            FlagPredicate::Flag { name, .. } => {
                out.insert(name.as_ref());
            }
            FlagPredicate::All(preds) => {
                for pred in preds {
                    pred.collect_vals(out);
                }
            }
        }
    }

    /// Whether the membership test is inverted (single-flag predicates only)
    pub fn negate(&self) -> bool {
        matches!(self, FlagPredicate::Flag { negate: true, .. })
    }

    /// The flag name and polarity when this predicate tests exactly one flag
    pub fn single_flag(&self) -> Option<(&str, bool)> {
        match self {
            FlagPredicate::Flag { name, negate } => Some((name.as_ref(), *negate)),
            FlagPredicate::All(preds) if preds.len() == 1 => preds[0].single_flag(),
            FlagPredicate::All(_) => None,
        }
    }

    /// Evaluate against a set of enabled flags
    pub fn matches<F: FlagSet + ?Sized>(&self, enabled: &F) -> bool {
        match self {
            FlagPredicate::Flag { name, negate } => enabled.contains_flag(name) != *negate,
            FlagPredicate::All(preds) => preds.iter().all(|p| p.matches(enabled)),
        }
    }
}

impl fmt::Display for FlagPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagPredicate::Flag { name, negate } => {
                if *negate {
                    f.write_str("!")?;
                }
                f.write_str(name)
            }
            FlagPredicate::All(preds) => {
                for (i, pred) in preds.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", pred)?;
                }
                Ok(())
            }
        }
    }
}
