use crate::tokenizer::{SPECIAL_WORDS, contains_special_word};
use crate::{Condition, LogicalGroup, Node, Operation, Word};

/// Query text rebuilt from a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Printed {
    pub text: String,
    /// Char offset into `text` of the first word carrying a cursor marker.
    pub cursor: Option<usize>,
}

/// Serializes a tree back into query text that [`parse`](crate::parse) reads
/// into the same shape. Values are always double-quoted.
///
/// ```
/// use callpod_syntax::{parse, print, tokenize};
///
/// let tree = parse(&tokenize("namespace in (ns1, ns2)", None)).unwrap();
/// assert_eq!(print(&tree).text, r#"namespace in ("ns1","ns2")"#);
/// ```
pub fn print(node: &Node) -> Printed {
    let mut printer = Printer::default();
    printer.node(node);
    Printed {
        text: printer.text,
        cursor: printer.cursor,
    }
}

#[derive(Default)]
struct Printer {
    text: String,
    len: usize,
    cursor: Option<usize>,
}

impl Printer {
    fn node(&mut self, node: &Node) {
        match node {
            Node::Condition(condition) => self.condition(condition),
            Node::Group(group) => self.group(group),
        }
    }

    fn group(&mut self, group: &LogicalGroup) {
        if group.operation == Operation::Not {
            self.not(group);
            return;
        }
        for (index, child) in group.children.iter().enumerate() {
            if index > 0 {
                self.push(" ");
                self.push(group.operation.as_str());
                self.push(" ");
            }
            match child {
                Node::Group(inner) if inner.operation != Operation::Not => self.bracketed(child),
                _ => self.node(child),
            }
        }
    }

    fn not(&mut self, group: &LogicalGroup) {
        self.push("not ");
        for child in &group.children {
            match child {
                Node::Condition(condition) => self.condition(condition),
                Node::Group(_) => self.bracketed(child),
            }
        }
    }

    fn bracketed(&mut self, node: &Node) {
        self.push("(");
        self.node(node);
        self.push(")");
    }

    fn condition(&mut self, condition: &Condition) {
        if needs_quotes(&condition.field.text) {
            self.quoted(&condition.field);
        } else {
            self.raw(&condition.field);
        }
        let Some(comparator) = &condition.comparator else {
            return;
        };
        self.push(" ");
        if comparator_is_raw(comparator) {
            self.push(comparator);
        } else {
            self.quoted(&Word::quoted(comparator.as_str()));
        }
        if condition.values.is_empty() {
            return;
        }
        self.push(" ");

        let list = condition.values.len() > 1;
        if list {
            self.push("(");
        }
        for (index, value) in condition.values.iter().enumerate() {
            if index > 0 {
                self.push(",");
            }
            self.quoted(value);
        }
        if list {
            self.push(")");
        }
    }

    fn raw(&mut self, word: &Word) {
        if let Some(offset) = word.being_typed {
            self.mark(self.len + offset);
        }
        self.push(&word.text);
    }

    fn quoted(&mut self, word: &Word) {
        self.push("\"");
        for (index, ch) in word.text.chars().enumerate() {
            if word.being_typed == Some(index) {
                self.mark(self.len);
            }
            if ch == '"' || ch == '\\' {
                self.push("\\");
            }
            self.push_char(ch);
        }
        if let Some(offset) = word.being_typed {
            if offset >= word.char_len() {
                self.mark(self.len);
            }
        }
        self.push("\"");
    }

    fn mark(&mut self, cursor: usize) {
        if self.cursor.is_none() {
            self.cursor = Some(cursor);
        }
    }

    fn push(&mut self, text: &str) {
        self.text.push_str(text);
        self.len += text.chars().count();
    }

    fn push_char(&mut self, ch: char) {
        self.text.push(ch);
        self.len += 1;
    }
}

/// Comparators the parser merges back from plain words print as typed.
fn comparator_is_raw(comparator: &str) -> bool {
    SPECIAL_WORDS.contains(&comparator)
        || matches!(
            comparator,
            "is not" | "is in" | "is like" | "not in" | "not like" | "is not in" | "is not like"
        )
        || !needs_quotes(comparator)
}

/// A field printed raw must come back from the tokenizer as one plain word.
fn needs_quotes(text: &str) -> bool {
    text.is_empty()
        || matches!(text, "and" | "or" | "not")
        || text
            .chars()
            .any(|ch| ch.is_whitespace() || matches!(ch, '"' | '\\' | ',' | '(' | ')'))
        || contains_special_word(text)
}
