//! # Call/Pod Search Condition Syntax
//!
//! `callpod-syntax` turns the filter typed above the call and pod tables into a
//! condition tree, and turns a (possibly edited) tree back into text. It runs on
//! every keystroke, so the parser never gives up silently: a failed parse still
//! reports the part of the query it understood.
//!
//! ## Example
//! ```
//! use callpod_syntax::{compile, Node};
//!
//! let tree = compile("pod_name=cpq and service_name=cpq", None).unwrap();
//! if let Node::Group(group) = &tree {
//!     assert_eq!(group.operation.as_str(), "and");
//!     assert_eq!(group.children.len(), 2);
//! }
//!
//! // `()` is rejected, but the conditions before it survive
//! let err = compile("pod_name=cpq and service_name=cpq or ()", None).unwrap_err();
//! assert_eq!(err.message, "empty brackets are not acceptable");
//! assert!(matches!(err.partial, Some(Node::Group(_))));
//! ```

mod parser;
mod printer;
mod tokenizer;
mod tree;

pub use parser::{MAX_BRACKET_DEPTH, parse};
pub use printer::{Printed, print};
pub use tokenizer::tokenize;
pub use tree::{Condition, LogicalGroup, Node, Operation, Word};

use std::fmt;

/// Tokenizes and parses `input` in one go.
pub fn compile(input: &str, cursor: Option<usize>) -> Result<Node, SearchParseError> {
    parse(&tokenize(input, cursor))
}

/// Describes why parsing failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParseError {
    /// Human readable reason, shown verbatim under the filter box.
    pub message: String,
    /// Tree assembled from everything recognized before the failure, if
    /// anything was.
    pub partial: Option<Node>,
}

impl SearchParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            partial: None,
        }
    }

    pub fn with_partial(message: impl Into<String>, partial: Option<Node>) -> Self {
        Self {
            message: message.into(),
            partial,
        }
    }
}

impl fmt::Display for SearchParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SearchParseError {}
