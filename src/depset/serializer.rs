//! Canonical textual rendering

use crate::depset::ast::{DepSet, GroupKind, Node};
use crate::depset::predicate::FlagPredicate;
use std::fmt;
use std::slice;

impl<T> DepSet<T> {
    /// Render back to dependency string syntax, turning leaves into text
    /// with `leaf_to_text`
    ///
    /// AND groups render as plain adjacency; they are parenthesized only when
    /// they sit directly inside a `||` group, where dropping the parens
    /// would change the meaning.
    pub fn stringify<F>(&self, leaf_to_text: F) -> String
    where
        F: Fn(&T) -> String,
    {
        let mut out = String::new();
        let mut stack = vec![Frame {
            pending: self.nodes().iter(),
            closes: false,
            any_of: false,
        }];

        while let Some(frame) = stack.last_mut() {
            let inside_any_of = frame.any_of;
            match frame.pending.next() {
                Some(Node::Leaf(term)) => {
                    separate(&mut out);
                    out.push_str(&leaf_to_text(term));
                }
                Some(Node::Group(group)) => {
                    let any_of = group.kind() == GroupKind::Or;
                    let closes = any_of || inside_any_of;
                    if closes {
                        separate(&mut out);
                        out.push_str(if any_of { "|| (" } else { "(" });
                    }
                    stack.push(Frame {
                        pending: group.children().iter(),
                        closes,
                        any_of,
                    });
                }
                Some(Node::Conditional(cond)) => {
                    let FlagPredicate::Flag { name, negate } = cond.predicate() else {
                        unreachable!("conditional nodes only carry single-flag predicates");
                    };
                    separate(&mut out);
                    if *negate {
                        out.push('!');
                    }
                    out.push_str(name);
                    out.push_str("? (");
                    stack.push(Frame {
                        pending: cond.payload().iter(),
                        closes: true,
                        any_of: false,
                    });
                }
                None => {
                    if let Some(Frame { closes: true, .. }) = stack.pop() {
                        out.push_str(" )");
                    }
                }
            }
        }
        out
    }
}

struct Frame<'a, T> {
    pending: slice::Iter<'a, Node<T>>,
    /// owes a closing paren
    closes: bool,
    any_of: bool,
}

#[inline]
fn separate(out: &mut String) {
    if !out.is_empty() {
        out.push(' ');
    }
}

impl<T: fmt::Display> fmt::Display for DepSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify(|term| term.to_string()))
    }
}
