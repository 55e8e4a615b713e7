//! Filter box of the call and pod tables: suggestion sources, the keystroke
//! session and submission on top of [`callpod_syntax`].
pub mod config;
mod consts;
mod runtime;
pub mod session;
pub mod suggestion;
pub mod validate;

pub use callpod_syntax::{self as syntax, Node, Printed, SearchParseError, Word};
pub use config::{CatalogKind, CatalogLists, FilterConfig, ServiceCatalog};
pub use consts::{FALLBACK_QUERY, KNOWN_COMPARATORS};
pub use session::{Compiled, FilterSession, Pass, SuggestionToken};
pub use suggestion::date::DateSource;
pub use suggestion::source::{
    CatalogSource, Deferred, FieldRegistry, SuggestionSource, SuggestionsReady,
};
pub use suggestion::{apply_suggestion, find_target, request_suggestions, Slot, Target};
pub use validate::{ValidationError, Validator};
