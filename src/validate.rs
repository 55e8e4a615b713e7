use crate::suggestion::source::FieldRegistry;

use callpod_syntax::{Condition, Node};

use std::fmt;

/// A tree the parser accepted but the query service would not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    UnknownField(String),
    UnknownComparator(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnknownField(field) => write!(f, "Unknown search condition: {field}"),
            ValidationError::UnknownComparator(comparator) => {
                write!(f, "Unknown compare condition: {comparator}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

pub struct Validator<'a> {
    registry: &'a FieldRegistry,
    comparators: &'a [String],
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a FieldRegistry, comparators: &'a [String]) -> Self {
        Self {
            registry,
            comparators,
        }
    }

    /// Fails on the first unknown field or comparator, left to right.
    /// Conditions of a partial tree without a comparator only have their
    /// field checked.
    pub fn validate(&self, node: &Node) -> Result<(), ValidationError> {
        match node {
            Node::Condition(condition) => self.validate_condition(condition),
            Node::Group(group) => group
                .children
                .iter()
                .try_for_each(|child| self.validate(child)),
        }
    }

    fn validate_condition(&self, condition: &Condition) -> Result<(), ValidationError> {
        if !self.registry.contains(&condition.field.text) {
            return Err(ValidationError::UnknownField(condition.field.text.clone()));
        }
        match &condition.comparator {
            Some(comparator) if !self.comparators.iter().any(|known| known == comparator) => {
                Err(ValidationError::UnknownComparator(comparator.clone()))
            }
            _ => Ok(()),
        }
    }
}
