//! Property tests for the depset module

use proptest::prelude::*;
use std::collections::BTreeSet;

use crate::depset::ast::{DepSet, GroupKind, Node};
use crate::depset::predicate::FlagPredicate;

const LEAVES: [&str; 5] = ["a", "b", "c", "d", "e"];
const FLAGS: [&str; 3] = ["x", "y", "z"];

// ═══════════════════════════════════════════════════════════════════════════
// Strategy generators for property tests
// ═══════════════════════════════════════════════════════════════════════════

/// Generate a single-flag predicate, either polarity
fn predicate_strategy() -> impl Strategy<Value = FlagPredicate> {
    (prop::sample::select(FLAGS.to_vec()), any::<bool>()).prop_map(|(flag, negate)| {
        if negate {
            FlagPredicate::disabled(flag)
        } else {
            FlagPredicate::enabled(flag)
        }
    })
}

/// Generate arbitrary trees from leaves, groups and conditionals
fn node_strategy() -> impl Strategy<Value = Node<String>> {
    let leaf = prop::sample::select(LEAVES.to_vec()).prop_map(|s| Node::leaf(s.to_string()));
    leaf.prop_recursive(6, 64, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4)
                .prop_map(|children| Node::all_of(children).unwrap()),
            prop::collection::vec(inner.clone(), 1..4)
                .prop_map(|children| Node::any_of(children).unwrap()),
            (predicate_strategy(), prop::collection::vec(inner, 1..4))
                .prop_map(|(pred, payload)| Node::conditional(pred, payload).unwrap()),
        ]
    })
}

fn depset_strategy() -> impl Strategy<Value = DepSet<String>> {
    prop::collection::vec(node_strategy(), 0..5).prop_map(DepSet::from_nodes)
}

fn flags_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(FLAGS.to_vec(), 0..=FLAGS.len())
}

// ═══════════════════════════════════════════════════════════════════════════
// Reference semantics
// ═══════════════════════════════════════════════════════════════════════════

/// Truth value of a tree given which leaves are satisfied
///
/// Disabled conditionals vanish, and so does any group left with nothing
/// in it; an empty top level is vacuously true.
fn truth(nodes: &[Node<String>], satisfied: &BTreeSet<&str>, flags: &[&str]) -> bool {
    all_present(nodes, satisfied, flags).unwrap_or(true)
}

fn all_present(nodes: &[Node<String>], satisfied: &BTreeSet<&str>, flags: &[&str]) -> Option<bool> {
    let present: Vec<bool> = nodes
        .iter()
        .filter_map(|node| node_truth(node, satisfied, flags))
        .collect();
    if present.is_empty() {
        None
    } else {
        Some(present.into_iter().all(|v| v))
    }
}

fn node_truth(node: &Node<String>, satisfied: &BTreeSet<&str>, flags: &[&str]) -> Option<bool> {
    match node {
        Node::Leaf(term) => Some(satisfied.contains(term.as_str())),
        Node::Group(group) => match group.kind() {
            GroupKind::And => all_present(group.children(), satisfied, flags),
            GroupKind::Or => {
                let present: Vec<bool> = group
                    .children()
                    .iter()
                    .filter_map(|child| node_truth(child, satisfied, flags))
                    .collect();
                if present.is_empty() {
                    None
                } else {
                    Some(present.into_iter().any(|v| v))
                }
            }
        },
        Node::Conditional(cond) if cond.predicate().matches(flags) => {
            all_present(cond.payload(), satisfied, flags)
        }
        Node::Conditional(_) => None,
    }
}

fn equivalent_under(lhs: &DepSet<String>, rhs: &DepSet<String>, flags: &[&str]) -> bool {
    (0..1u32 << LEAVES.len()).all(|mask| {
        let satisfied: BTreeSet<&str> = LEAVES
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, leaf)| *leaf)
            .collect();
        truth(lhs.nodes(), &satisfied, flags) == truth(rhs.nodes(), &satisfied, flags)
    })
}

fn all_flag_assignments() -> Vec<Vec<&'static str>> {
    (0..1u32 << FLAGS.len())
        .map(|mask| {
            FLAGS
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, flag)| *flag)
                .collect()
        })
        .collect()
}

/// Leaves with no conditional ancestor
fn unconditional_leaves(nodes: &[Node<String>], out: &mut BTreeSet<String>) {
    for node in nodes {
        match node {
            Node::Leaf(term) => {
                out.insert(term.clone());
            }
            Node::Group(group) => unconditional_leaves(group.children(), out),
            Node::Conditional(_) => {}
        }
    }
}

fn referenced_flags(nodes: &[Node<String>], out: &mut BTreeSet<String>) {
    for node in nodes {
        if let Node::Conditional(cond) = node {
            out.extend(cond.predicate().vals().into_iter().map(str::to_string));
        }
        referenced_flags(node.children(), out);
    }
}

fn contains_conditional(nodes: &[Node<String>]) -> bool {
    nodes
        .iter()
        .any(|node| matches!(node, Node::Conditional(_)) || contains_conditional(node.children()))
}

// ═══════════════════════════════════════════════════════════════════════════
// Property Tests
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// Property 1: Serialized output parses back to an equivalent dependency set
    #[test]
    fn prop_roundtrip_preserves_meaning(depset in depset_strategy()) {
        let rendered = depset.to_string();
        let reparsed = DepSet::parse_plain(&rendered);
        prop_assert!(reparsed.is_ok(), "Failed to reparse: {}", rendered);
        let reparsed = reparsed.unwrap();

        prop_assert_eq!(reparsed.has_conditionals(), depset.has_conditionals());
        for flags in all_flag_assignments() {
            prop_assert!(
                equivalent_under(&depset, &reparsed, &flags),
                "Rendered {:?} differs under {:?}", rendered, flags
            );
        }
    }

    /// Property 2: Rendering is stable once parsed
    #[test]
    fn prop_render_is_canonical(depset in depset_strategy()) {
        let rendered = depset.to_string();
        let reparsed = DepSet::parse_plain(&rendered).unwrap();
        prop_assert_eq!(reparsed.to_string(), rendered);
    }

    /// Property 3: Reduction preserves meaning under the flags it was given
    #[test]
    fn prop_reduce_preserves_meaning(depset in depset_strategy(), flags in flags_strategy()) {
        let reduced = depset.reduce(&flags);
        prop_assert!(equivalent_under(&depset, &reduced, &flags));
    }

    /// Property 4: Reduction is idempotent and conditional-free
    #[test]
    fn prop_reduce_idempotent(depset in depset_strategy(), flags in flags_strategy()) {
        let once = depset.reduce(&flags);
        prop_assert!(!once.has_conditionals());
        prop_assert!(!contains_conditional(once.nodes()));
        prop_assert_eq!(once.reduce(&flags), once.clone());
    }

    /// Property 5: Restricted reduction is idempotent and conditional-free
    #[test]
    fn prop_restricted_reduce_idempotent(
        depset in depset_strategy(),
        flags in flags_strategy(),
        restrict in flags_strategy()
    ) {
        let once = depset.evaluate(&flags, Some(&restrict));
        prop_assert!(!contains_conditional(once.nodes()));
        prop_assert_eq!(once.evaluate(&flags, Some(&restrict)), once.clone());
    }

    /// Property 6: Restricting to every flag is the same as no restriction
    #[test]
    fn prop_full_restriction_matches_plain(depset in depset_strategy(), flags in flags_strategy()) {
        let everything = FLAGS.to_vec();
        prop_assert_eq!(depset.evaluate(&flags, Some(&everything)), depset.reduce(&flags));
    }

    /// Property 7: Unconditional leaves dominate the index and always survive
    #[test]
    fn prop_unconditional_leaves_dominate(depset in depset_strategy()) {
        let mut always = BTreeSet::new();
        unconditional_leaves(depset.nodes(), &mut always);

        let index = depset.conditional_index();
        for leaf in &always {
            prop_assert!(!index.contains_key(leaf), "{} should not be indexed", leaf);
        }
        for flags in all_flag_assignments() {
            let reduced = depset.reduce(&flags);
            let present: BTreeSet<&String> = reduced.leaves().collect();
            for leaf in &always {
                prop_assert!(present.contains(leaf), "{} missing under {:?}", leaf, flags);
            }
        }
    }

    /// Property 8: Every indexed leaf is conditional and its guards are real
    #[test]
    fn prop_index_entries_are_guarded(depset in depset_strategy()) {
        let known = depset.known_flags();
        for (leaf, guards) in depset.conditional_index().iter() {
            prop_assert!(!guards.is_empty());
            prop_assert!(depset.leaves().any(|l| l == leaf));
            for guard in guards {
                for flag in guard.vals() {
                    prop_assert!(known.contains(flag));
                }
            }
        }
    }

    /// Property 9: Known flags are exactly the flags referenced anywhere
    #[test]
    fn prop_known_flags_complete(depset in depset_strategy()) {
        let mut expected = BTreeSet::new();
        referenced_flags(depset.nodes(), &mut expected);
        prop_assert_eq!(depset.known_flags(), &expected);
    }
}

#[test]
fn test_worked_scenarios() {
    let none: [&str; 0] = [];

    let depset = DepSet::parse_plain("a b").unwrap();
    assert_eq!(depset.to_string(), "a b");

    let depset = DepSet::parse_plain("|| ( a b )").unwrap();
    assert_eq!(depset.to_string(), "|| ( a b )");

    let depset = DepSet::parse_plain("foo? ( a )").unwrap();
    assert_eq!(depset.reduce(&["foo"]).to_string(), "a");
    assert!(depset.reduce(&none).is_empty());

    let depset = DepSet::parse_plain("!foo? ( a )").unwrap();
    assert!(depset.reduce(&["foo"]).is_empty());
    assert_eq!(depset.reduce(&none).to_string(), "a");

    let depset = DepSet::parse_plain("a ( b c ) x? ( d )").unwrap();
    let reduced = depset.reduce(&none);
    assert_eq!(reduced.len(), 3);
    assert!(reduced.iter().all(Node::is_leaf));

    assert!(DepSet::parse_plain("foo? ( )").is_err());
    assert!(DepSet::parse_plain("( a").is_err());

    let depset = DepSet::parse_plain("foo? ( a ) a").unwrap();
    assert!(!depset.conditional_index().contains_key("a"));
    assert_eq!(depset.reduce(&none).to_string(), "a");
    assert_eq!(depset.reduce(&["foo"]).to_string(), "a a");

    let depset = DepSet::parse_plain("foo? ( a ) !bar? ( b )").unwrap();
    let known: Vec<&str> = depset.known_flags().iter().map(String::as_str).collect();
    assert_eq!(known, vec!["bar", "foo"]);
}
