use crate::config::FilterConfig;
use crate::suggestion::source::{FieldRegistry, SuggestionsReady};
use crate::suggestion::{request_suggestions, Target};
use crate::validate::{ValidationError, Validator};

use anyhow::{bail, Context, Result};
use callpod_syntax::{compile, Node, SearchParseError};
use tracing::{debug, info};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Outcome of compiling the filter text. Never fails: a broken query still
/// yields the tree recognized so far.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub tree: Option<Node>,
    pub syntax_error: Option<SearchParseError>,
    /// Only checked when a tree exists, partial or not.
    pub validation_error: Option<ValidationError>,
}

impl Compiled {
    pub fn is_valid(&self) -> bool {
        self.tree.is_some() && self.syntax_error.is_none() && self.validation_error.is_none()
    }

    /// Message for the filter box, syntax errors first.
    pub fn diagnostic(&self) -> Option<String> {
        match (&self.syntax_error, &self.validation_error) {
            (Some(error), _) => Some(error.to_string()),
            (None, Some(error)) => Some(error.to_string()),
            (None, None) => None,
        }
    }
}

/// Identifies one keystroke pass. Stale once a newer pass has started.
#[derive(Debug, Clone)]
pub struct SuggestionToken {
    version: u64,
    active: Arc<AtomicU64>,
}

impl SuggestionToken {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_stale(&self) -> bool {
        self.active.load(Ordering::SeqCst) != self.version
    }
}

/// Result of a keystroke pass.
#[derive(Debug)]
pub struct Pass {
    pub compiled: Compiled,
    /// Word suggestions were requested for, if any.
    pub target: Option<Target>,
    pub token: SuggestionToken,
}

/// The filter box of one table.
pub struct FilterSession {
    config: FilterConfig,
    registry: FieldRegistry,
    version: Arc<AtomicU64>,
}

impl FilterSession {
    pub fn new(config: FilterConfig, registry: FieldRegistry) -> Self {
        Self {
            config,
            registry,
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn compile(&self, input: &str, cursor: Option<usize>) -> Compiled {
        let (input, cursor) = if input.is_empty() && self.config.loaded_from_dump {
            debug!(fallback = %self.config.fallback_query, "empty filter on dump data");
            (self.config.fallback_query.as_str(), None)
        } else {
            (input, cursor)
        };

        let (tree, syntax_error) = match compile(input, cursor) {
            Ok(tree) => (Some(tree), None),
            Err(mut error) => (error.partial.take(), Some(error)),
        };
        let validation_error = tree.as_ref().and_then(|tree| {
            Validator::new(&self.registry, &self.config.comparators)
                .validate(tree)
                .err()
        });
        Compiled {
            tree,
            syntax_error,
            validation_error,
        }
    }

    /// Compiles `input` and requests suggestions for the word at `cursor`.
    ///
    /// Suggestions that arrive after a newer pass started are dropped, so
    /// `ready` only ever sees answers for the latest keystroke.
    pub fn on_input(&self, input: &str, cursor: Option<usize>, ready: SuggestionsReady) -> Pass {
        let token = self.issue_token();
        let compiled = self.compile(input, cursor);
        if let Some(error) = &compiled.syntax_error {
            debug!(reason = %error.message, recovered = compiled.tree.is_some(), "incomplete filter");
        }

        let target = compiled.tree.as_ref().and_then(|tree| {
            let pass = token.clone();
            request_suggestions(
                &self.registry,
                tree,
                Box::new(move |candidates| {
                    if pass.is_stale() {
                        debug!(version = pass.version(), "dropping stale suggestions");
                        return;
                    }
                    ready(candidates);
                }),
            )
        });
        Pass {
            compiled,
            target,
            token,
        }
    }

    /// Compiles `input` for execution and returns the tree as the JSON the
    /// query service takes.
    pub fn submit(&self, input: &str) -> Result<String> {
        let compiled = self.compile(input, None);
        if let Some(error) = compiled.syntax_error {
            bail!("invalid filter: {error}");
        }
        if let Some(error) = compiled.validation_error {
            bail!("invalid filter: {error}");
        }
        let tree = compiled.tree.context("filter produced no conditions")?;
        let json = serde_json::to_string(&tree).context("serialize search conditions")?;
        info!(%input, "filter submitted");
        Ok(json)
    }

    fn issue_token(&self) -> SuggestionToken {
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        SuggestionToken {
            version,
            active: Arc::clone(&self.version),
        }
    }
}
