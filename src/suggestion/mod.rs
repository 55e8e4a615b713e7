//! Locates the word under the cursor and asks the matching source for
//! completions.
pub mod date;
pub mod source;

use source::{FieldRegistry, SuggestionsReady};

use anyhow::{Context, Result};
use callpod_syntax::{print, Condition, Node, Printed, Word};
use tracing::debug;

/// Part of a condition that is being typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Field,
    Value(usize),
}

/// The word being typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Child indexes from the root to the condition.
    pub path: Vec<usize>,
    pub slot: Slot,
    /// Field of the condition, whichever slot is targeted.
    pub field: String,
    /// Text before the cursor.
    pub typed: String,
}

/// First condition, depth first and left to right, with a word holding the
/// cursor past its first char.
pub fn find_target(tree: &Node) -> Option<Target> {
    let mut stack = vec![(Vec::new(), tree)];
    while let Some((path, node)) = stack.pop() {
        match node {
            Node::Condition(condition) => {
                if let Some((slot, word)) = typed_word(condition) {
                    return Some(Target {
                        path,
                        slot,
                        field: condition.field.text.clone(),
                        typed: word.typed_prefix().to_string(),
                    });
                }
            }
            Node::Group(group) => {
                for (index, child) in group.children.iter().enumerate().rev() {
                    let mut child_path = path.clone();
                    child_path.push(index);
                    stack.push((child_path, child));
                }
            }
        }
    }
    None
}

fn typed_word(condition: &Condition) -> Option<(Slot, &Word)> {
    let typing = |word: &Word| matches!(word.being_typed, Some(offset) if offset > 0);
    if typing(&condition.field) {
        return Some((Slot::Field, &condition.field));
    }
    condition
        .values
        .iter()
        .enumerate()
        .find(|(_, value)| typing(value))
        .map(|(index, value)| (Slot::Value(index), value))
}

/// Issues at most one suggestion request for `tree` and returns its target.
///
/// A field completes from the registry's field names right away. A value is
/// handed to its field's source, which may answer later. Nothing is requested
/// when no word is being typed or the field has no source.
pub fn request_suggestions(
    registry: &FieldRegistry,
    tree: &Node,
    ready: SuggestionsReady,
) -> Option<Target> {
    let target = find_target(tree)?;
    match target.slot {
        Slot::Field => {
            debug!(typed = %target.typed, "suggesting fields");
            ready(registry.matching_fields(&target.typed));
        }
        Slot::Value(_) => {
            let Some(source) = registry.source(&target.field) else {
                debug!(field = %target.field, "no suggestion source");
                return None;
            };
            debug!(field = %target.field, typed = %target.typed, "suggesting values");
            source.advise(&target.typed, ready);
        }
    }
    Some(target)
}

/// Replaces the targeted word with `suggestion`, puts the cursor after it and
/// reprints the query.
pub fn apply_suggestion(tree: &Node, target: &Target, suggestion: &str) -> Result<Printed> {
    let mut tree = tree.clone();
    let word = locate(&mut tree, target).context("suggestion target is not in the tree")?;
    word.text = suggestion.to_string();
    word.being_typed = Some(word.char_len());
    Ok(print(&tree))
}

fn locate<'a>(tree: &'a mut Node, target: &Target) -> Option<&'a mut Word> {
    let mut node = tree;
    for &index in &target.path {
        node = match node {
            Node::Group(group) => group.children.get_mut(index)?,
            Node::Condition(_) => return None,
        };
    }
    let Node::Condition(condition) = node else {
        return None;
    };
    clear_cursors(condition);
    match target.slot {
        Slot::Field => Some(&mut condition.field),
        Slot::Value(index) => condition.values.get_mut(index),
    }
}

fn clear_cursors(condition: &mut Condition) {
    condition.field.being_typed = None;
    for value in &mut condition.values {
        value.being_typed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CatalogLists, ServiceCatalog};
    use callpod_syntax::compile;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn tree(input: &str, cursor: usize) -> Node {
        match compile(input, Some(cursor)) {
            Ok(tree) => tree,
            Err(err) => err.partial.unwrap(),
        }
    }

    fn end(input: &str) -> usize {
        input.chars().count()
    }

    #[test]
    fn finds_field_being_typed() {
        let input = "pod_name = a and serv";
        let target = find_target(&tree(input, end(input))).unwrap();
        assert_eq!(target.path, [1]);
        assert_eq!(target.slot, Slot::Field);
        assert_eq!(target.typed, "serv");
    }

    #[test]
    fn finds_value_being_typed() {
        let input = "pod_name = a or namespace in (ns1, pr";
        let target = find_target(&tree(input, end(input))).unwrap();
        assert_eq!(target.path, [1]);
        assert_eq!(target.slot, Slot::Value(1));
        assert_eq!(target.field, "namespace");
        assert_eq!(target.typed, "pr");
    }

    #[test]
    fn typed_prefix_stops_at_cursor() {
        let target = find_target(&tree("pod_name = cpq and a = 1", 13)).unwrap();
        assert_eq!(target.path, [0]);
        assert_eq!(target.typed, "cp");
    }

    #[test]
    fn nothing_typed_nothing_found() {
        assert_eq!(find_target(&tree("pod_name = cpq ", 15)), None);
        assert_eq!(find_target(&compile("pod_name = cpq", None).unwrap()), None);
    }

    #[test]
    fn field_suggestions_are_synchronous() {
        let registry = FieldRegistry::standard(Arc::new(ServiceCatalog::default()));
        let received = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&received);
        let target = request_suggestions(
            &registry,
            &tree("names", 5),
            Box::new(move |candidates| *sink.lock() = Some(candidates)),
        );
        assert_eq!(target.unwrap().slot, Slot::Field);
        assert_eq!(received.lock().clone().unwrap(), ["namespace"]);
    }

    #[test]
    fn unknown_field_requests_nothing() {
        let registry = FieldRegistry::standard(Arc::new(ServiceCatalog::default()));
        let called = Arc::new(Mutex::new(false));
        let sink = Arc::clone(&called);
        let input = "color = re";
        let target = request_suggestions(
            &registry,
            &tree(input, end(input)),
            Box::new(move |_| *sink.lock() = true),
        );
        assert_eq!(target, None);
        assert!(!*called.lock());
    }

    #[test]
    fn apply_replaces_value_and_moves_cursor() {
        let input = "pod_name = a and namespace = pr";
        let tree = tree(input, end(input));
        let target = find_target(&tree).unwrap();
        let printed = apply_suggestion(&tree, &target, "prod").unwrap();
        assert_eq!(printed.text, r#"pod_name = "a" and namespace = "prod""#);
        assert_eq!(printed.cursor, Some(printed.text.chars().count() - 1));
    }

    #[test]
    fn apply_replaces_field() {
        let input = "serv";
        let tree = tree(input, end(input));
        let target = find_target(&tree).unwrap();
        let printed = apply_suggestion(&tree, &target, "service_name").unwrap();
        assert_eq!(printed.text, "service_name");
        assert_eq!(printed.cursor, Some(12));
    }

    #[test]
    fn apply_rejects_stale_target() {
        let tree = compile("pod_name = a", None).unwrap();
        let target = Target {
            path: vec![3],
            slot: Slot::Value(0),
            field: "pod_name".into(),
            typed: "a".into(),
        };
        assert!(apply_suggestion(&tree, &target, "x").is_err());
    }

    #[test]
    fn catalog_values_arrive_through_continuation() {
        let catalog = Arc::new(ServiceCatalog::new(CatalogLists {
            namespaces: vec!["prod".into(), "preprod".into(), "dev".into()],
            ..CatalogLists::default()
        }));
        let registry = FieldRegistry::standard(catalog);
        let (sender, receiver) = crossbeam::channel::bounded(1);
        let input = "namespace = pr";
        request_suggestions(
            &registry,
            &tree(input, end(input)),
            Box::new(move |candidates| {
                let _ = sender.send(candidates);
            }),
        )
        .unwrap();
        let candidates = receiver
            .recv_timeout(std::time::Duration::from_secs(5))
            .unwrap();
        assert_eq!(candidates, ["prod", "preprod"]);
    }
}
