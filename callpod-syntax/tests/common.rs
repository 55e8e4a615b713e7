#![allow(dead_code)]
//! Shared helpers for `callpod-syntax` integration tests.

use callpod_syntax::*;

pub fn parse_ok(input: &str) -> Node {
    compile(input, None).unwrap()
}

pub fn parse_err(input: &str) -> SearchParseError {
    compile(input, None).unwrap_err()
}

pub fn texts(words: &[Word]) -> Vec<&str> {
    words.iter().map(|w| w.text.as_str()).collect()
}

pub fn as_condition(node: &Node) -> &Condition {
    match node {
        Node::Condition(condition) => condition,
        other => panic!("expected Condition, got: {other:?}"),
    }
}

pub fn as_and(node: &Node) -> &Vec<Node> {
    match node {
        Node::Group(group) if group.operation == Operation::And => &group.children,
        other => panic!("expected And, got: {other:?}"),
    }
}

pub fn as_or(node: &Node) -> &Vec<Node> {
    match node {
        Node::Group(group) if group.operation == Operation::Or => &group.children,
        other => panic!("expected Or, got: {other:?}"),
    }
}

pub fn as_not(node: &Node) -> &Node {
    match node {
        Node::Group(group) if group.operation == Operation::Not => {
            assert_eq!(group.children.len(), 1, "not must wrap one child");
            &group.children[0]
        }
        other => panic!("expected Not, got: {other:?}"),
    }
}

pub fn condition_is(node: &Node, field: &str, comparator: &str, values: &[&str]) {
    let condition = as_condition(node);
    assert_eq!(condition.field.text, field);
    assert_eq!(condition.comparator.as_deref(), Some(comparator));
    assert_eq!(texts(&condition.values), values);
}

/// Reprints `node` and parses the text again.
pub fn reparse(node: &Node) -> Node {
    compile(&print(node).text, None).unwrap()
}

/// Checks disjunctive shape: an optional top `or`, then optional `and`s, then
/// conditions or `not` groups; no single-child `and`/`or`.
pub fn assert_dnf(node: &Node) {
    fn conjunct(node: &Node) {
        match node {
            Node::Condition(_) => {}
            Node::Group(group) => match group.operation {
                Operation::Not => assert_eq!(group.children.len(), 1),
                Operation::And => panic!("and nested in and: {node:?}"),
                Operation::Or => {
                    assert!(group.children.len() > 1, "single-child or: {node:?}")
                }
            },
        }
    }
    fn disjunct(node: &Node) {
        match node {
            Node::Group(group) if group.operation == Operation::And => {
                assert!(group.children.len() > 1, "single-child and: {node:?}");
                group.children.iter().for_each(conjunct);
            }
            Node::Group(group) if group.operation == Operation::Or => {
                panic!("or nested in or: {node:?}")
            }
            other => conjunct(other),
        }
    }
    match node {
        Node::Group(group) if group.operation == Operation::Or => {
            assert!(group.children.len() > 1, "single-child or: {node:?}");
            group.children.iter().for_each(disjunct);
        }
        other => disjunct(other),
    }
}
