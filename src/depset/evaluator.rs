//! Flag-driven reduction of dependency sets

use crate::depset::ast::{DepSet, Group, GroupKind, Node};
use crate::depset::predicate::{FlagPredicate, FlagSet};
use std::slice;
use tracing::debug;

/// In-progress group during reduction
struct Frame<'a, T> {
    kind: GroupKind,
    pending: slice::Iter<'a, Node<T>>,
    result: Vec<Node<T>>,
}

impl<'a, T> Frame<'a, T> {
    fn new(kind: GroupKind, nodes: &'a [Node<T>]) -> Self {
        Self {
            kind,
            pending: nodes.iter(),
            result: Vec::new(),
        }
    }
}

impl<T: Clone> DepSet<T> {
    /// Reduce against `enabled` with no restriction
    pub fn reduce<F: FlagSet + ?Sized>(&self, enabled: &F) -> DepSet<T> {
        self.evaluate(enabled, None)
    }

    /// Resolve every conditional, returning a conditional-free dependency set
    ///
    /// With `restrict_to`, only conditionals on flags in that set are
    /// evaluated: a conditional on any other flag keeps its payload whatever
    /// its polarity. Redundant nesting is collapsed along the way: single
    /// child groups are replaced by their child and AND groups inside AND
    /// groups are spliced into their parent.
    pub fn evaluate<F: FlagSet + ?Sized>(
        &self,
        enabled: &F,
        restrict_to: Option<&dyn FlagSet>,
    ) -> DepSet<T> {
        if !self.has_conditionals() {
            debug!("no conditionals, evaluation is a no-op");
            return self.clone();
        }

        let mut root = Vec::new();
        let mut stack = vec![Frame::new(GroupKind::And, self.nodes())];

        while let Some(frame) = stack.last_mut() {
            match frame.pending.next() {
                Some(Node::Leaf(term)) => frame.result.push(Node::Leaf(term.clone())),
                Some(Node::Group(group)) => {
                    stack.push(Frame::new(group.kind(), group.children()));
                }
                Some(Node::Conditional(cond)) => {
                    if payload_enabled(cond.predicate(), enabled, restrict_to) {
                        stack.push(Frame::new(GroupKind::And, cond.payload()));
                    }
                }
                None => {
                    let Some(done) = stack.pop() else { break };
                    match stack.last_mut() {
                        Some(parent) => fold(parent, done),
                        None => root = done.result,
                    }
                }
            }
        }

        debug!(nodes = root.len(), "evaluated dependency set");
        DepSet::from_parts(root, false)
    }
}

fn payload_enabled<F: FlagSet + ?Sized>(
    predicate: &FlagPredicate,
    enabled: &F,
    restrict_to: Option<&dyn FlagSet>,
) -> bool {
    match restrict_to {
        Some(restrict) => restricted_match(predicate, enabled, restrict),
        None => predicate.matches(enabled),
    }
}

/// Flags outside `restrict` never gate anything
fn restricted_match<F: FlagSet + ?Sized>(
    predicate: &FlagPredicate,
    enabled: &F,
    restrict: &dyn FlagSet,
) -> bool {
    match predicate {
        FlagPredicate::Flag { name, negate } => {
            !restrict.contains_flag(name) || enabled.contains_flag(name) != *negate
        }
        FlagPredicate::All(preds) => preds
            .iter()
            .all(|pred| restricted_match(pred, enabled, restrict)),
    }
}

/// Append a finished frame to its parent, collapsing redundant nesting
fn fold<T>(parent: &mut Frame<'_, T>, done: Frame<'_, T>) {
    let Frame {
        kind, mut result, ..
    } = done;

    if result.len() > 1 {
        if kind == GroupKind::And && parent.kind == GroupKind::And {
            parent.result.append(&mut result);
        } else {
            parent.result.push(Node::Group(Group::new_unchecked(kind, result)));
        }
        return;
    }

    // dead frames contribute nothing
    let Some(only) = result.pop() else { return };
    match only {
        Node::Group(group) if group.kind() == GroupKind::And && parent.kind == GroupKind::And => {
            parent.result.extend(group.into_children());
        }
        node => parent.result.push(node),
    }
}
