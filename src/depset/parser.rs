//! Dependency string parser
//!
//! Tokens are whitespace separated and consumed left to right against a
//! stack of open frames, so nesting depth is bounded only by memory.

use crate::config::ParseOptions;
use crate::depset::ast::{Conditional, DepSet, Group, GroupKind, Node};
use crate::depset::predicate::FlagPredicate;
use crate::error::{GrammarError, LeafError, ParseError};
use std::convert::Infallible;
use tracing::{debug, trace};

/// How an open frame is closed
#[derive(Debug)]
enum Marker {
    /// `( ... )`
    Plain,
    /// `|| ( ... )`
    AnyOf,
    /// `flag? ( ... )` / `!flag? ( ... )`
    Conditional(FlagPredicate),
}

struct Frame<'s, T> {
    marker: Marker,
    opened_by: &'s str,
    children: Vec<Node<T>>,
}

impl<T> DepSet<T> {
    /// Parse a dependency string, building leaves with `leaf_factory`
    pub fn parse<F, E>(dep_str: &str, leaf_factory: F) -> Result<Self, ParseError>
    where
        F: FnMut(&str) -> Result<T, E>,
        E: Into<LeafError>,
    {
        Self::parse_with(dep_str, &ParseOptions::default(), leaf_factory)
    }

    /// Parse with explicit grammar options
    pub fn parse_with<F, E>(
        dep_str: &str,
        options: &ParseOptions,
        leaf_factory: F,
    ) -> Result<Self, ParseError>
    where
        F: FnMut(&str) -> Result<T, E>,
        E: Into<LeafError>,
    {
        parse_depset(dep_str, options, leaf_factory).inspect_err(|err| {
            debug!(error = %err, "failed to parse dependency string");
        })
    }
}

impl DepSet<String> {
    /// Parse keeping every leaf token as a plain string
    pub fn parse_plain(dep_str: &str) -> Result<Self, ParseError> {
        Self::parse(dep_str, |token| Ok::<_, Infallible>(token.to_string()))
    }
}

fn parse_depset<T, F, E>(
    dep_str: &str,
    options: &ParseOptions,
    mut leaf_factory: F,
) -> Result<DepSet<T>, ParseError>
where
    F: FnMut(&str) -> Result<T, E>,
    E: Into<LeafError>,
{
    let mut root: Vec<Node<T>> = Vec::new();
    let mut open: Vec<Frame<'_, T>> = Vec::new();
    let mut has_conditionals = false;
    let mut words = dep_str.split_whitespace();

    while let Some(token) = words.next() {
        if token == "(" {
            open.push(Frame {
                marker: Marker::Plain,
                opened_by: token,
                children: Vec::new(),
            });
        } else if token == "||" || token.ends_with('?') {
            let marker = operator_marker(dep_str, token, options)?;
            // an operator must be followed directly by its group
            match words.next() {
                Some("(") => open.push(Frame {
                    marker,
                    opened_by: token,
                    children: Vec::new(),
                }),
                next => {
                    return Err(ParseError::grammar(
                        dep_str,
                        next,
                        GrammarError::MissingOpenParen,
                    ))
                }
            }
        } else if token == ")" {
            let Some(frame) = open.pop() else {
                return Err(ParseError::grammar(dep_str, Some(token), GrammarError::Unbalanced));
            };
            if frame.children.is_empty() {
                return Err(ParseError::grammar(
                    dep_str,
                    Some(frame.opened_by),
                    GrammarError::EmptyGroup,
                ));
            }
            trace!(
                depth = open.len(),
                marker = frame.opened_by,
                children = frame.children.len(),
                "closing frame"
            );
            let node = match frame.marker {
                Marker::Conditional(predicate) => {
                    has_conditionals = true;
                    Node::Conditional(Conditional::new_unchecked(predicate, frame.children))
                }
                Marker::AnyOf => Node::Group(Group::new_unchecked(GroupKind::Or, frame.children)),
                Marker::Plain => Node::Group(Group::new_unchecked(GroupKind::And, frame.children)),
            };
            current(&mut root, &mut open).push(node);
        } else if token.contains(['(', ')', '|']) {
            return Err(ParseError::grammar(
                dep_str,
                Some(token),
                GrammarError::MalformedToken,
            ));
        } else {
            let leaf = leaf_factory(token)
                .map_err(|err| ParseError::leaf(dep_str, token, err.into()))?;
            current(&mut root, &mut open).push(Node::Leaf(leaf));
        }
    }

    if let Some(frame) = open.last() {
        return Err(ParseError::grammar(
            dep_str,
            Some(frame.opened_by),
            GrammarError::Unbalanced,
        ));
    }

    Ok(DepSet::from_parts(root, has_conditionals))
}

fn operator_marker(
    dep_str: &str,
    token: &str,
    options: &ParseOptions,
) -> Result<Marker, ParseError> {
    if token == "||" {
        if !options.allow_any_of {
            return Err(ParseError::grammar(
                dep_str,
                Some(token),
                GrammarError::OperatorNotAllowed,
            ));
        }
        return Ok(Marker::AnyOf);
    }

    if !options.allow_conditionals {
        return Err(ParseError::grammar(
            dep_str,
            Some(token),
            GrammarError::OperatorNotAllowed,
        ));
    }
    let flag = &token[..token.len() - 1];
    let predicate = FlagPredicate::from_token(flag)
        .map_err(|kind| ParseError::grammar(dep_str, Some(token), kind))?;
    Ok(Marker::Conditional(predicate))
}

fn current<'a, T>(
    root: &'a mut Vec<Node<T>>,
    open: &'a mut [Frame<'_, T>],
) -> &'a mut Vec<Node<T>> {
    match open.last_mut() {
        Some(frame) => &mut frame.children,
        None => root,
    }
}
