//! Error types for the search engine.

use thiserror::Error;

/// Boxed error raised by a caller-supplied filter.
pub type FilterError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by [`SearchEngine`](crate::SearchEngine) and
/// [`EngineHandle`](crate::EngineHandle).
///
/// All regular inputs (empty queries, empty candidate lists, navigation with
/// nothing to navigate) are valid and never produce an error. What remains is
/// misuse of the engine lifecycle and failures raised by custom filters.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An operation was invoked after `dispose()`.
    #[error("cannot {operation}: search engine has been disposed")]
    Disposed { operation: &'static str },

    /// The filter failed. Query-derived state was left untouched.
    #[error("filter `{filter}` failed for query {query:?}")]
    Filter {
        filter: String,
        query: String,
        #[source]
        source: FilterError,
    },

    /// The driver task is no longer running.
    #[error("search engine task has stopped")]
    Closed,
}

/// Returned when a key name is not one the engine understands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown key {0:?}; expected ArrowUp, ArrowDown, Enter, Escape or Tab")]
pub struct ParseKeyError(pub String);
