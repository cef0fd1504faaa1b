//! A search engine for autocomplete widgets.
//!
//! [`SearchEngine`] turns raw keystrokes into a debounced query, ranks a
//! caller-supplied candidate list against it with a pluggable [`Filter`], and
//! tracks the keyboard-driven highlight and the confirmed selection. It is
//! synchronous and never reads the clock; [`driver::spawn`] runs it on a
//! tokio task for front-ends that want events instead.

pub mod candidate;
pub mod debounce;
pub mod driver;
pub mod engine;
pub mod error;
pub mod filter;
pub mod highlight;
pub mod navigation;
pub mod settings;

pub use candidate::Candidate;
pub use debounce::Debouncer;
pub use driver::{EngineEvent, EngineHandle, spawn};
pub use engine::{KeyOutcome, ResultSet, SearchEngine, Snapshot, Status, Subscription};
pub use error::{EngineError, FilterError, ParseKeyError};
pub use filter::{AlphabeticalFilter, Filter, FilterStrategy, InstantFilter, MatchTier, RelevanceFilter};
pub use navigation::{Key, Navigation, Popup};
pub use settings::{EngineConfig, Settings};
