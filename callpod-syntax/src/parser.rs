use crate::{Condition, Node, Operation, SearchParseError, Word};
use std::fmt;
use tracing::trace;

/// Deepest bracket nesting accepted. Every level is a recursive call.
pub const MAX_BRACKET_DEPTH: usize = 128;

/// Parses tokenized input into a condition tree.
///
/// On failure the error carries the best tree that could be assembled from the
/// words consumed so far (see [`SearchParseError::partial`]), so suggestions
/// keep working while the query is still incomplete.
pub fn parse(words: &[Word]) -> Result<Node, SearchParseError> {
    if words.is_empty() {
        return Err(SearchParseError::new("empty search condition"));
    }
    Caret::new(words).parse_group(false)
}

/// `and`, `or`, optionally followed by `not`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LogicalOperator {
    operation: Operation,
    negated: bool,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "{} not", self.operation)
        } else {
            write!(f, "{}", self.operation)
        }
    }
}

/// Parsing session over one word sequence. Every recursive step shares the
/// same index, so a nested group resumes exactly where its caller stopped.
struct Caret<'a> {
    words: &'a [Word],
    index: usize,
    depth: usize,
}

impl<'a> Caret<'a> {
    fn new(words: &'a [Word]) -> Self {
        Self {
            words,
            index: 0,
            depth: 0,
        }
    }

    fn parse_group(&mut self, inside_bracket: bool) -> Result<Node, SearchParseError> {
        let mut operands = Vec::new();
        let mut operators = Vec::new();

        while !self.eof() {
            let negated = operands.is_empty() && self.next_is("not") && self.remaining() > 1;
            if negated {
                self.index += 1;
            }

            let operand = if self.next_is("(") {
                self.index += 1;
                self.nested_group()
            } else if self.next_is(")") {
                let message = if operands.is_empty() && inside_bracket {
                    "empty brackets are not acceptable"
                } else {
                    "unexpected closing bracket"
                };
                Err(SearchParseError::new(message))
            } else {
                self.parse_condition().map(Node::Condition)
            };

            let operand = match operand {
                Ok(node) => node,
                Err(mut err) => {
                    if let Some(partial) = err.partial.take() {
                        operands.push(negate_if(negated, partial));
                    }
                    err.partial = recover(operands, operators);
                    trace!(reason = %err.message, recovered = err.partial.is_some(), "operand failed");
                    return Err(err);
                }
            };
            operands.push(negate_if(negated, operand));

            if self.next_is(")") {
                self.index += 1;
                if !inside_bracket {
                    return Err(SearchParseError::with_partial(
                        "unexpected closing bracket",
                        recover(operands, operators),
                    ));
                }
                return assemble(operands, operators);
            }

            if !self.eof() {
                match self.parse_logical_operator() {
                    Ok(operator) => operators.push(operator),
                    Err(mut err) => {
                        err.partial = recover(operands, operators);
                        return Err(err);
                    }
                }
            }
        }

        if inside_bracket {
            return Err(SearchParseError::with_partial(
                "Reached the end of line and not matched the opening bracket",
                recover(operands, operators),
            ));
        }
        assemble(operands, operators)
    }

    fn nested_group(&mut self) -> Result<Node, SearchParseError> {
        if self.depth >= MAX_BRACKET_DEPTH {
            return Err(SearchParseError::new(format!(
                "brackets are nested deeper than {MAX_BRACKET_DEPTH} levels"
            )));
        }
        self.depth += 1;
        let group = self.parse_group(true);
        self.depth -= 1;
        group
    }

    fn parse_logical_operator(&mut self) -> Result<LogicalOperator, SearchParseError> {
        let Some(word) = self.advance() else {
            return Err(SearchParseError::new("Expecting logical and or logical or"));
        };
        let operation = if word.is_token("and") {
            Operation::And
        } else if word.is_token("or") {
            Operation::Or
        } else {
            return Err(SearchParseError::new(format!(
                "Expecting logical and or logical or instead of {word}"
            )));
        };

        let mut operator = LogicalOperator {
            operation,
            negated: false,
        };
        if !self.eof() && self.next_is("not") {
            self.index += 1;
            operator.negated = true;
        }
        if self.eof() {
            return Err(SearchParseError::new(format!(
                "Expecting second part of logical operator after {operator}"
            )));
        }
        Ok(operator)
    }

    fn parse_condition(&mut self) -> Result<Condition, SearchParseError> {
        let Some(field) = self.advance() else {
            return Err(SearchParseError::new("expecting a search condition"));
        };
        let mut condition = Condition {
            field: field.clone(),
            comparator: None,
            values: Vec::new(),
        };

        let Some(next) = self.peek() else {
            return Err(partial(
                format!("expecting an operand after {field}"),
                &condition,
            ));
        };
        if next.is_token("(") || next.is_token(")") {
            return Err(partial(format!("\"{next}\" can not be an operand"), &condition));
        }
        self.index += 1;
        condition.comparator = Some(next.text.clone());

        if self.eof() {
            return Err(partial(
                format!(
                    "expecting second part of an operand or a condition after {field} {next}"
                ),
                &condition,
            ));
        }
        if !next.quoted {
            if let Some(comparator) = condition.comparator.as_mut() {
                self.merge_comparator(comparator);
            }
        }

        self.parse_values(&mut condition)?;
        Ok(condition)
    }

    /// `is in`, `is not like`, `not in`... Looks at the next unconsumed word
    /// only, and only consumes what it merges.
    fn merge_comparator(&mut self, comparator: &mut String) {
        if comparator == "is" && self.next_is("not") {
            comparator.push_str(" not");
            self.index += 1;
        }
        if matches!(comparator.as_str(), "is" | "not" | "is not") {
            for suffix in ["in", "like"] {
                if self.next_is(suffix) {
                    comparator.push(' ');
                    comparator.push_str(suffix);
                    self.index += 1;
                    break;
                }
            }
        }
    }

    fn parse_values(&mut self, condition: &mut Condition) -> Result<(), SearchParseError> {
        let mut depth = 0usize;
        loop {
            let Some(word) = self.advance() else {
                let message = if depth > 0 {
                    format!("missing closing bracket after {}", describe(condition))
                } else {
                    format!("expecting right value after {}", describe(condition))
                };
                return Err(partial(message, condition));
            };

            let inside_list = if word.is_token("(") {
                depth += 1;
                true
            } else if word.is_token(")") {
                if depth == 0 {
                    return Err(partial(
                        format!("unexpected closing bracket after {}", describe(condition)),
                        condition,
                    ));
                }
                depth -= 1;
                depth > 0
            } else if word.is_token(",") {
                // An unescaped comma can only separate values.
                true
            } else {
                let mut value = word.clone();
                let call = self.next_is("(");
                let closed = !call || self.concatenate_call(&mut value);
                let text = value.text.clone();
                condition.values.push(value);
                if !closed {
                    return Err(partial(format!("missing closing bracket in {text}"), condition));
                }
                depth > 0
            };

            if inside_list {
                continue;
            }
            if self.next_is(",") {
                self.index += 1;
                continue;
            }
            break;
        }

        if condition.values.is_empty() {
            return Err(partial(
                format!("expecting right value after {}", describe(condition)),
                condition,
            ));
        }
        Ok(())
    }

    /// Glues `now ( -5 d )` into the single value `now(-5d)`. Returns `false`
    /// when the words ran out before the brackets balanced.
    fn concatenate_call(&mut self, value: &mut Word) -> bool {
        let mut depth = 0usize;
        while let Some(next) = self.advance() {
            if next.is_token("(") {
                depth += 1;
            } else if next.is_token(")") {
                depth = depth.saturating_sub(1);
            }
            if let Some(offset) = next.being_typed {
                value.being_typed = Some(value.char_len() + offset);
            }
            value.text.push_str(&next.text);
            if depth == 0 {
                return true;
            }
        }
        false
    }

    fn peek(&self) -> Option<&'a Word> {
        self.words.get(self.index)
    }

    fn advance(&mut self) -> Option<&'a Word> {
        let word = self.words.get(self.index)?;
        self.index += 1;
        Some(word)
    }

    fn next_is(&self, token: &str) -> bool {
        matches!(self.peek(), Some(word) if word.is_token(token))
    }

    fn remaining(&self) -> usize {
        self.words.len().saturating_sub(self.index)
    }

    fn eof(&self) -> bool {
        self.index >= self.words.len()
    }
}

fn partial(message: String, condition: &Condition) -> SearchParseError {
    SearchParseError::with_partial(message, Some(Node::Condition(condition.clone())))
}

fn describe(condition: &Condition) -> String {
    let mut text = condition.field.text.clone();
    if let Some(comparator) = &condition.comparator {
        text.push(' ');
        text.push_str(comparator);
    }
    if !condition.values.is_empty() {
        text.push(' ');
        let values: Vec<&str> = condition.values.iter().map(|w| w.text.as_str()).collect();
        text.push_str(&values.join(","));
    }
    text
}

fn negate_if(negated: bool, node: Node) -> Node {
    if negated { Node::not(node) } else { node }
}

/// Best-effort tree from what was recognized before a failure. A trailing
/// operator with no operand after it is dropped.
fn recover(operands: Vec<Node>, mut operators: Vec<LogicalOperator>) -> Option<Node> {
    if operands.is_empty() {
        return None;
    }
    operators.truncate(operands.len() - 1);
    assemble(operands, operators).ok()
}

/// Builds an OR of AND groups from `n` operands joined by `n - 1` operators.
///
/// `and` binds tighter than `or` by construction: `and` appends to the current
/// AND group, `or` opens a new one. A `not` suffix negates the operand that
/// follows the operator.
fn assemble(operands: Vec<Node>, operators: Vec<LogicalOperator>) -> Result<Node, SearchParseError> {
    if operands.len() != operators.len() + 1 {
        let first = operands.first().cloned();
        let message = if operands.is_empty() {
            "empty brackets are not acceptable".to_string()
        } else {
            format!(
                "Number of search conditions {} does not match number of logical operators {}",
                operands.len(),
                operators.len()
            )
        };
        return Err(SearchParseError::with_partial(message, first));
    }

    let mut operands = operands.into_iter();
    let Some(first) = operands.next() else {
        return Err(SearchParseError::new("empty brackets are not acceptable"));
    };
    let mut disjuncts = vec![vec![first]];
    for (operand, operator) in operands.zip(operators) {
        let operand = negate_if(operator.negated, operand);
        match (operator.operation, disjuncts.last_mut()) {
            (Operation::And, Some(conjuncts)) => conjuncts.push(operand),
            _ => disjuncts.push(vec![operand]),
        }
    }
    Ok(simplify(disjuncts))
}

/// Collapses single-child groups and flattens `and` inside `and` and `or`
/// inside the top `or`, so the result is always in disjunctive shape.
fn simplify(disjuncts: Vec<Vec<Node>>) -> Node {
    let mut flattened = Vec::with_capacity(disjuncts.len());
    for conjuncts in disjuncts {
        let mut parts = Vec::with_capacity(conjuncts.len());
        for node in conjuncts {
            match node {
                Node::Group(group) if group.operation == Operation::And => {
                    parts.extend(group.children)
                }
                other => parts.push(other),
            }
        }

        let conjunction = if parts.len() == 1 {
            parts.remove(0)
        } else {
            Node::and(parts)
        };
        match conjunction {
            Node::Group(group) if group.operation == Operation::Or => {
                flattened.extend(group.children)
            }
            other => flattened.push(other),
        }
    }

    if flattened.len() == 1 {
        flattened.remove(0)
    } else {
        Node::or(flattened)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize;

    fn words(input: &str) -> Vec<Word> {
        tokenize(input, None)
    }

    fn cond(field: &str, comparator: &str, values: &[&str]) -> Node {
        Node::Condition(Condition::new(
            Word::new(field),
            comparator,
            values.iter().map(|v| Word::new(*v)).collect(),
        ))
    }

    fn and_op() -> LogicalOperator {
        LogicalOperator {
            operation: Operation::And,
            negated: false,
        }
    }

    fn or_op() -> LogicalOperator {
        LogicalOperator {
            operation: Operation::Or,
            negated: false,
        }
    }

    #[test]
    fn assemble_builds_or_of_ands() {
        let a = cond("a", "=", &["1"]);
        let b = cond("b", "=", &["2"]);
        let c = cond("c", "=", &["3"]);
        let tree = assemble(vec![a.clone(), b.clone(), c.clone()], vec![and_op(), or_op()]).unwrap();
        assert_eq!(tree, Node::or(vec![Node::and(vec![a, b]), c]));
    }

    #[test]
    fn assemble_negates_after_both_operators() {
        let a = cond("a", "=", &["1"]);
        let b = cond("b", "=", &["2"]);
        let and_not = LogicalOperator {
            operation: Operation::And,
            negated: true,
        };
        let tree = assemble(vec![a.clone(), b.clone()], vec![and_not]).unwrap();
        assert_eq!(tree, Node::and(vec![a.clone(), Node::not(b.clone())]));

        let or_not = LogicalOperator {
            operation: Operation::Or,
            negated: true,
        };
        let tree = assemble(vec![a.clone(), b.clone()], vec![or_not]).unwrap();
        assert_eq!(tree, Node::or(vec![a, Node::not(b)]));
    }

    #[test]
    fn assemble_rejects_operator_count_mismatch() {
        let a = cond("a", "=", &["1"]);
        let err = assemble(vec![a.clone()], vec![and_op()]).unwrap_err();
        assert_eq!(
            err.message,
            "Number of search conditions 1 does not match number of logical operators 1"
        );
        assert_eq!(err.partial, Some(a));

        let err = assemble(Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(err.message, "empty brackets are not acceptable");
    }

    #[test]
    fn comparator_merge_reads_next_word() {
        let tree = parse(&words("namespace is in (a, b)")).unwrap();
        let condition = tree.as_condition().unwrap();
        assert_eq!(condition.comparator.as_deref(), Some("is in"));
        assert_eq!(condition.values.len(), 2);

        let tree = parse(&words("namespace not like ns%")).unwrap();
        assert_eq!(tree, cond("namespace", "not like", &["ns%"]));

        let tree = parse(&words("namespace is not in x")).unwrap();
        assert_eq!(tree, cond("namespace", "is not in", &["x"]));

        // `in` is the value here, nothing to merge with.
        let tree = parse(&words("namespace = in")).unwrap();
        assert_eq!(tree, cond("namespace", "=", &["in"]));

        // a quoted comparator is taken as typed
        let tree = parse(&words(r#"namespace "not" in"#)).unwrap();
        assert_eq!(tree, cond("namespace", "not", &["in"]));
    }

    #[test]
    fn composite_value_keeps_cursor() {
        let tokens = tokenize("date > now(-5 d)", Some(13));
        let tree = parse(&tokens).unwrap();
        let condition = tree.as_condition().unwrap();
        assert_eq!(condition.values[0].text, "now(-5d)");
        // cursor after `-5` lands after `now(-5`
        assert_eq!(condition.values[0].being_typed, Some(6));
    }

    #[test]
    fn nested_call_brackets_balance() {
        let tree = parse(&words("date > max(now(-1 d), x)")).unwrap();
        assert_eq!(tree, cond("date", ">", &["max(now(-1d),x)"]));
    }

    #[test]
    fn quoted_punctuation_is_a_value() {
        let tree = parse(&words(r#"pod_name = "(""#)).unwrap();
        let condition = tree.as_condition().unwrap();
        assert_eq!(condition.values[0].text, "(");
        assert!(condition.values[0].quoted);
    }

    #[test]
    fn empty_value_list_is_rejected() {
        let err = parse(&words("namespace in ()")).unwrap_err();
        assert_eq!(err.message, "expecting right value after namespace in");
        let partial = err.partial.unwrap();
        assert_eq!(partial.as_condition().unwrap().field.text, "namespace");
    }

    #[test]
    fn logical_operator_errors_keep_assembly() {
        let err = parse(&words("pod_name = a xor b = c")).unwrap_err();
        assert_eq!(err.message, "Expecting logical and or logical or instead of xor");
        assert_eq!(err.partial, Some(cond("pod_name", "=", &["a"])));

        let err = parse(&words("pod_name = a and not")).unwrap_err();
        assert_eq!(
            err.message,
            "Expecting second part of logical operator after and not"
        );
        assert_eq!(err.partial, Some(cond("pod_name", "=", &["a"])));
    }

    #[test]
    fn stray_closing_bracket_at_top_level() {
        let err = parse(&words("pod_name = a )")).unwrap_err();
        assert_eq!(err.message, "unexpected closing bracket");
        assert_eq!(err.partial, Some(cond("pod_name", "=", &["a"])));
    }

    #[test]
    fn leading_not_negates_first_operand() {
        let tree = parse(&words("not pod_name = a and namespace = b")).unwrap();
        assert_eq!(
            tree,
            Node::and(vec![
                Node::not(cond("pod_name", "=", &["a"])),
                cond("namespace", "=", &["b"]),
            ])
        );
    }
}
