use serde::{Deserialize, Serialize};
use std::fmt;

/// A lexical token produced by [`tokenize`](crate::tokenize).
///
/// Serialized with the field names the call-search backend expects, so a
/// parsed tree can be handed upstream as the `searchConditions` parameter
/// without any remapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    #[serde(rename = "word")]
    pub text: String,
    /// Offset of the text cursor inside `text`, counted in chars. `None` is
    /// written as `-1` on the wire.
    #[serde(rename = "beingTyped", with = "cursor_sentinel", default)]
    pub being_typed: Option<usize>,
    /// The word was wrapped in double quotes, so separators and keywords inside
    /// it are plain text.
    #[serde(rename = "escapedByQuote", default)]
    pub quoted: bool,
}

impl Word {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            being_typed: None,
            quoted: false,
        }
    }

    pub fn quoted(text: impl Into<String>) -> Self {
        Self {
            quoted: true,
            ..Self::new(text)
        }
    }

    pub fn with_cursor(mut self, offset: usize) -> Self {
        self.being_typed = Some(offset);
        self
    }

    /// Length in chars, the unit every cursor offset is expressed in.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Text typed before the cursor, or the whole text when the cursor is not
    /// inside this word.
    pub fn typed_prefix(&self) -> &str {
        match self.being_typed {
            Some(offset) => match self.text.char_indices().nth(offset) {
                Some((at, _)) => &self.text[..at],
                None => &self.text,
            },
            None => &self.text,
        }
    }

    /// Unquoted word whose text equals `token`. Quoted words never act as
    /// punctuation or keywords.
    pub fn is_token(&self, token: &str) -> bool {
        !self.quoted && self.text == token
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

mod cursor_sentinel {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<usize>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(offset) => serializer.serialize_u64(*offset as u64),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<usize>, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(usize::try_from(raw).ok())
    }
}

/// `field comparator value(s)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "lValue")]
    pub field: Word,
    /// Always present once a condition is fully parsed. Partial results built
    /// while the user is still typing the field leave it empty.
    pub comparator: Option<String>,
    #[serde(rename = "rValues", default)]
    pub values: Vec<Word>,
}

impl Condition {
    pub fn new(field: Word, comparator: impl Into<String>, values: Vec<Word>) -> Self {
        Self {
            field,
            comparator: Some(comparator.into()),
            values,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    And,
    Or,
    Not,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::And => "and",
            Operation::Or => "or",
            Operation::Not => "not",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean combinator over child nodes. A `Not` group holds exactly one child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalGroup {
    pub operation: Operation,
    #[serde(rename = "conditions")]
    pub children: Vec<Node>,
}

/// A node of the condition tree.
///
/// The wire format is untagged: conditions carry `lValue`/`comparator`, groups
/// carry `operation`/`conditions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Condition(Condition),
    Group(LogicalGroup),
}

impl Node {
    pub fn group(operation: Operation, children: Vec<Node>) -> Self {
        Node::Group(LogicalGroup {
            operation,
            children,
        })
    }

    pub fn and(children: Vec<Node>) -> Self {
        Self::group(Operation::And, children)
    }

    pub fn or(children: Vec<Node>) -> Self {
        Self::group(Operation::Or, children)
    }

    pub fn not(child: Node) -> Self {
        Self::group(Operation::Not, vec![child])
    }

    pub fn as_condition(&self) -> Option<&Condition> {
        match self {
            Node::Condition(condition) => Some(condition),
            Node::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&LogicalGroup> {
        match self {
            Node::Group(group) => Some(group),
            Node::Condition(_) => None,
        }
    }

    /// Compares tree shape, comparators and word texts, ignoring quoting and
    /// cursor markers. Reprinting always quotes values and drops the cursor
    /// unless it was set, so this is the equality a reprint preserves.
    pub fn same_shape(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Condition(a), Node::Condition(b)) => {
                a.field.text == b.field.text
                    && a.comparator == b.comparator
                    && a.values.len() == b.values.len()
                    && a.values
                        .iter()
                        .zip(&b.values)
                        .all(|(x, y)| x.text == y.text)
            }
            (Node::Group(a), Node::Group(b)) => {
                a.operation == b.operation
                    && a.children.len() == b.children.len()
                    && a.children
                        .iter()
                        .zip(&b.children)
                        .all(|(x, y)| x.same_shape(y))
            }
            _ => false,
        }
    }
}

impl From<Condition> for Node {
    fn from(condition: Condition) -> Self {
        Node::Condition(condition)
    }
}
