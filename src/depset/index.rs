//! Conditional ancestry index and known-flag collection

use crate::depset::ast::{ConditionalIndex, DepSet, Node};
use crate::depset::predicate::FlagPredicate;
use ahash::AHashSet;
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::hash::Hash;
use std::slice;

impl<T: Clone + Eq + Hash> DepSet<T> {
    /// Map each conditionally required leaf to the predicates guarding it
    ///
    /// Every occurrence contributes one entry: the predicate of its sole
    /// conditional ancestor, or the conjunction of all of them. Leaves that
    /// also occur unconditionally anywhere in the tree are left out, since
    /// they are required whatever the flags say.
    pub fn conditional_index(&self) -> &ConditionalIndex<T> {
        self.node_conds.get_or_init(|| {
            if self.has_conditionals() {
                build_index(self.nodes())
            } else {
                ConditionalIndex::default()
            }
        })
    }
}

impl<T> DepSet<T> {
    /// Every flag name any conditional in the tree branches on
    pub fn known_flags(&self) -> &BTreeSet<String> {
        self.known_flags.get_or_init(|| {
            if !self.has_conditionals() {
                return BTreeSet::new();
            }
            let mut names = BTreeSet::new();
            let mut stack = vec![self.nodes().iter()];
            while let Some(iter) = stack.last_mut() {
                match iter.next() {
                    Some(Node::Leaf(_)) => {}
                    Some(Node::Group(group)) => stack.push(group.children().iter()),
                    Some(Node::Conditional(cond)) => {
                        cond.predicate().collect_vals(&mut names);
                        stack.push(cond.payload().iter());
                    }
                    None => {
                        stack.pop();
                    }
                }
            }
            names.into_iter().map(str::to_string).collect()
        })
    }
}

fn build_index<T: Clone + Eq + Hash>(nodes: &[Node<T>]) -> ConditionalIndex<T> {
    let mut index = ConditionalIndex::default();
    let mut always_required: AHashSet<&T> = AHashSet::new();

    // open conditional ancestors; each frame remembers whether it pushed one
    let mut guards: SmallVec<[&FlagPredicate; 8]> = SmallVec::new();
    let mut stack: Vec<(slice::Iter<'_, Node<T>>, bool)> = vec![(nodes.iter(), false)];

    while let Some((iter, _)) = stack.last_mut() {
        match iter.next() {
            Some(Node::Leaf(term)) => {
                if guards.is_empty() {
                    always_required.insert(term);
                } else {
                    let combined =
                        FlagPredicate::conjunction(guards.iter().map(|p| (*p).clone()).collect());
                    index
                        .entry(term.clone())
                        .or_insert_with(Vec::new)
                        .push(combined);
                }
            }
            Some(Node::Group(group)) => stack.push((group.children().iter(), false)),
            Some(Node::Conditional(cond)) => {
                guards.push(cond.predicate());
                stack.push((cond.payload().iter(), true));
            }
            None => {
                if let Some((_, true)) = stack.pop() {
                    guards.pop();
                }
            }
        }
    }

    index.retain(|term, _| !always_required.contains(term));
    index
}
