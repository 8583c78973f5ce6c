//! Tree model for dependency set expressions

use crate::depset::predicate::FlagPredicate;
use ahash::AHashMap;
use once_cell::sync::OnceCell;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::slice;
use std::sync::Arc;

/// Per-leaf list of the flag predicates guarding each conditional occurrence
pub type ConditionalIndex<T> = AHashMap<T, Vec<FlagPredicate>>;

/// Grouping operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    /// Implicit adjacency or `( ... )`
    And,
    /// `|| ( ... )`
    Or,
}

/// A node of a dependency set tree
#[derive(Debug)]
pub enum Node<T> {
    /// Opaque caller-defined term (atom, URI, license name, ...)
    Leaf(T),
    Group(Group<T>),
    Conditional(Conditional<T>),
}

/// AND/OR grouping with a non-empty ordered list of children
#[derive(Debug)]
pub struct Group<T> {
    kind: GroupKind,
    children: Vec<Node<T>>,
}

/// Flag-gated payload, written `flag? ( ... )` or `!flag? ( ... )`
#[derive(Debug)]
pub struct Conditional<T> {
    predicate: FlagPredicate,
    payload: Vec<Node<T>>,
}

impl<T> Group<T> {
    pub(crate) fn new_unchecked(kind: GroupKind, children: Vec<Node<T>>) -> Self {
        debug_assert!(!children.is_empty());
        Self { kind, children }
    }

    #[inline]
    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    #[inline]
    pub fn children(&self) -> &[Node<T>] {
        &self.children
    }

    pub fn into_children(mut self) -> Vec<Node<T>> {
        std::mem::take(&mut self.children)
    }
}

impl<T> Conditional<T> {
    pub(crate) fn new_unchecked(predicate: FlagPredicate, payload: Vec<Node<T>>) -> Self {
        debug_assert!(!payload.is_empty());
        debug_assert!(predicate.single_flag().is_some());
        Self { predicate, payload }
    }

    #[inline]
    pub fn predicate(&self) -> &FlagPredicate {
        &self.predicate
    }

    #[inline]
    pub fn payload(&self) -> &[Node<T>] {
        &self.payload
    }

    pub fn into_payload(mut self) -> Vec<Node<T>> {
        std::mem::take(&mut self.payload)
    }
}

// Deep generated trees would overflow the stack with the default recursive
// drop glue, so subtrees are released through an explicit work list.
impl<T> Drop for Group<T> {
    fn drop(&mut self) {
        release(std::mem::take(&mut self.children));
    }
}

impl<T> Drop for Conditional<T> {
    fn drop(&mut self) {
        release(std::mem::take(&mut self.payload));
    }
}

fn release<T>(mut pending: Vec<Node<T>>) {
    while let Some(node) = pending.pop() {
        match node {
            Node::Leaf(_) => {}
            Node::Group(mut group) => pending.append(&mut group.children),
            Node::Conditional(mut cond) => pending.append(&mut cond.payload),
        }
    }
}

// Clone, equality and hashing walk the tree with explicit stacks for the
// same reason.
impl<T: Clone> Clone for Group<T> {
    fn clone(&self) -> Self {
        Self::new_unchecked(self.kind, clone_nodes(&self.children))
    }
}

impl<T: Clone> Clone for Conditional<T> {
    fn clone(&self) -> Self {
        Self::new_unchecked(self.predicate.clone(), clone_nodes(&self.payload))
    }
}

impl<T: Clone> Clone for Node<T> {
    fn clone(&self) -> Self {
        match self {
            Node::Leaf(term) => Node::Leaf(term.clone()),
            Node::Group(group) => Node::Group(group.clone()),
            Node::Conditional(cond) => Node::Conditional(cond.clone()),
        }
    }
}

/// Shape of the node being rebuilt by a [`CloneFrame`]
enum Shape<'a> {
    Root,
    Group(GroupKind),
    Conditional(&'a FlagPredicate),
}

struct CloneFrame<'a, T> {
    shape: Shape<'a>,
    pending: slice::Iter<'a, Node<T>>,
    built: Vec<Node<T>>,
}

impl<'a, T> CloneFrame<'a, T> {
    fn new(shape: Shape<'a>, nodes: &'a [Node<T>]) -> Self {
        Self {
            shape,
            pending: nodes.iter(),
            built: Vec::with_capacity(nodes.len()),
        }
    }
}

fn clone_nodes<T: Clone>(nodes: &[Node<T>]) -> Vec<Node<T>> {
    let mut stack = vec![CloneFrame::new(Shape::Root, nodes)];
    while let Some(frame) = stack.last_mut() {
        match frame.pending.next() {
            Some(Node::Leaf(term)) => frame.built.push(Node::Leaf(term.clone())),
            Some(Node::Group(group)) => {
                stack.push(CloneFrame::new(Shape::Group(group.kind), &group.children));
            }
            Some(Node::Conditional(cond)) => {
                stack.push(CloneFrame::new(
                    Shape::Conditional(&cond.predicate),
                    &cond.payload,
                ));
            }
            None => {
                let Some(done) = stack.pop() else { break };
                let node = match done.shape {
                    Shape::Root => return done.built,
                    Shape::Group(kind) => Node::Group(Group::new_unchecked(kind, done.built)),
                    Shape::Conditional(predicate) => Node::Conditional(Conditional::new_unchecked(
                        predicate.clone(),
                        done.built,
                    )),
                };
                if let Some(parent) = stack.last_mut() {
                    parent.built.push(node);
                }
            }
        }
    }
    Vec::new()
}

/// Structural equality of two node lists, walked in lockstep
fn nodes_eq<T: PartialEq>(lhs: &[Node<T>], rhs: &[Node<T>]) -> bool {
    if lhs.len() != rhs.len() {
        return false;
    }
    let mut stack = vec![(lhs.iter(), rhs.iter())];
    while let Some((left, right)) = stack.last_mut() {
        let (a, b) = match (left.next(), right.next()) {
            (Some(a), Some(b)) => (a, b),
            (None, None) => {
                stack.pop();
                continue;
            }
            _ => return false,
        };
        let (a_children, b_children) = match (a, b) {
            (Node::Leaf(x), Node::Leaf(y)) => {
                if x != y {
                    return false;
                }
                continue;
            }
            (Node::Group(x), Node::Group(y)) if x.kind == y.kind => (&x.children, &y.children),
            (Node::Conditional(x), Node::Conditional(y)) if x.predicate == y.predicate => {
                (&x.payload, &y.payload)
            }
            _ => return false,
        };
        if a_children.len() != b_children.len() {
            return false;
        }
        stack.push((a_children.iter(), b_children.iter()));
    }
    true
}

impl<T: PartialEq> PartialEq for Node<T> {
    fn eq(&self, other: &Self) -> bool {
        nodes_eq(slice::from_ref(self), slice::from_ref(other))
    }
}

impl<T: Eq> Eq for Node<T> {}

impl<T: PartialEq> PartialEq for Group<T> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && nodes_eq(&self.children, &other.children)
    }
}

impl<T: Eq> Eq for Group<T> {}

impl<T: PartialEq> PartialEq for Conditional<T> {
    fn eq(&self, other: &Self) -> bool {
        self.predicate == other.predicate && nodes_eq(&self.payload, &other.payload)
    }
}

impl<T: Eq> Eq for Conditional<T> {}

/// Pre-order hash; child counts keep distinct shapes from colliding
fn hash_nodes<T: Hash, H: Hasher>(nodes: &[Node<T>], state: &mut H) {
    nodes.len().hash(state);
    let mut stack = vec![nodes.iter()];
    while let Some(iter) = stack.last_mut() {
        let Some(node) = iter.next() else {
            stack.pop();
            continue;
        };
        match node {
            Node::Leaf(term) => {
                state.write_u8(0);
                term.hash(state);
            }
            Node::Group(group) => {
                state.write_u8(1);
                group.kind.hash(state);
                group.children.len().hash(state);
                stack.push(group.children.iter());
            }
            Node::Conditional(cond) => {
                state.write_u8(2);
                cond.predicate.hash(state);
                cond.payload.len().hash(state);
                stack.push(cond.payload.iter());
            }
        }
    }
}

impl<T: Hash> Hash for Node<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_nodes(slice::from_ref(self), state);
    }
}

impl<T: Hash> Hash for Group<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        hash_nodes(&self.children, state);
    }
}

impl<T: Hash> Hash for Conditional<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.predicate.hash(state);
        hash_nodes(&self.payload, state);
    }
}

impl<T> Node<T> {
    #[inline]
    pub fn leaf(term: T) -> Self {
        Node::Leaf(term)
    }

    /// Build a group; `None` if `children` is empty
    pub fn group(kind: GroupKind, children: Vec<Node<T>>) -> Option<Self> {
        if children.is_empty() {
            return None;
        }
        Some(Node::Group(Group::new_unchecked(kind, children)))
    }

    pub fn all_of(children: Vec<Node<T>>) -> Option<Self> {
        Self::group(GroupKind::And, children)
    }

    pub fn any_of(children: Vec<Node<T>>) -> Option<Self> {
        Self::group(GroupKind::Or, children)
    }

    /// Build a conditional group
    ///
    /// Returns `None` if `payload` is empty or `predicate` tests more than
    /// one flag; trees only ever carry `flag?` and `!flag?` predicates.
    pub fn conditional(predicate: FlagPredicate, payload: Vec<Node<T>>) -> Option<Self> {
        if payload.is_empty() || !matches!(predicate, FlagPredicate::Flag { .. }) {
            return None;
        }
        Some(Node::Conditional(Conditional::new_unchecked(predicate, payload)))
    }

    pub fn as_leaf(&self) -> Option<&T> {
        match self {
            Node::Leaf(term) => Some(term),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Child nodes; empty for a leaf
    pub fn children(&self) -> &[Node<T>] {
        match self {
            Node::Leaf(_) => &[],
            Node::Group(group) => group.children(),
            Node::Conditional(cond) => cond.payload(),
        }
    }

    /// Every leaf under this node, depth-first
    pub fn leaves(&self) -> Leaves<'_, T> {
        Leaves::new(slice::from_ref(self))
    }
}

/// Depth-first iterator over the leaves of a tree
pub struct Leaves<'a, T> {
    stack: Vec<slice::Iter<'a, Node<T>>>,
}

impl<'a, T> Leaves<'a, T> {
    fn new(nodes: &'a [Node<T>]) -> Self {
        Self {
            stack: vec![nodes.iter()],
        }
    }
}

impl<'a, T> Iterator for Leaves<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        while let Some(iter) = self.stack.last_mut() {
            match iter.next() {
                Some(Node::Leaf(term)) => return Some(term),
                Some(node) => self.stack.push(node.children().iter()),
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

/// A parsed dependency set: the root AND group of a tree
///
/// Immutable once built. The conditional index and known flags are computed
/// on first use and memoized.
#[derive(Debug, Clone)]
pub struct DepSet<T> {
    nodes: Arc<[Node<T>]>,
    has_conditionals: bool,
    pub(crate) node_conds: OnceCell<ConditionalIndex<T>>,
    pub(crate) known_flags: OnceCell<BTreeSet<String>>,
}

impl<T> DepSet<T> {
    pub(crate) fn from_parts(nodes: Vec<Node<T>>, has_conditionals: bool) -> Self {
        Self {
            nodes: nodes.into(),
            has_conditionals,
            node_conds: OnceCell::new(),
            known_flags: OnceCell::new(),
        }
    }

    /// The empty dependency set ("no dependencies")
    pub fn empty() -> Self {
        Self::from_parts(Vec::new(), false)
    }

    /// Wrap already-built nodes as a root AND group
    pub fn from_nodes(nodes: Vec<Node<T>>) -> Self {
        let has_conditionals = contains_conditional(&nodes);
        Self::from_parts(nodes, has_conditionals)
    }

    /// Top-level nodes of the root AND group
    #[inline]
    pub fn nodes(&self) -> &[Node<T>] {
        &self.nodes
    }

    pub fn iter(&self) -> slice::Iter<'_, Node<T>> {
        self.nodes.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Node<T>> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True if any conditional group appears anywhere in the tree
    #[inline]
    pub fn has_conditionals(&self) -> bool {
        self.has_conditionals
    }

    /// Every leaf in the tree, depth-first, conditional or not
    pub fn leaves(&self) -> Leaves<'_, T> {
        Leaves::new(&self.nodes)
    }
}

fn contains_conditional<T>(nodes: &[Node<T>]) -> bool {
    let mut stack = vec![nodes.iter()];
    while let Some(iter) = stack.last_mut() {
        match iter.next() {
            Some(Node::Conditional(_)) => return true,
            Some(node) => stack.push(node.children().iter()),
            None => {
                stack.pop();
            }
        }
    }
    false
}

impl<T> Default for DepSet<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: PartialEq> PartialEq for DepSet<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.nodes, &other.nodes)
            || (self.has_conditionals == other.has_conditionals
                && nodes_eq(&self.nodes, &other.nodes))
    }
}

impl<T: Eq> Eq for DepSet<T> {}

impl<'a, T> IntoIterator for &'a DepSet<T> {
    type Item = &'a Node<T>;
    type IntoIter = slice::Iter<'a, Node<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
