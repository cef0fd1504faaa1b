//! The search engine: debounced query, ranked results, highlight and
//! selection, owned by one value and mutated only through its methods.
//!
//! Data flows one way:
//!
//! ```text
//! set_query ─▶ Debouncer ─▶ (advance/flush) ─▶ Filter ─▶ ResultSet ─▶ Popup cursor ─▶ Selection
//! ```
//!
//! The engine never reads the clock itself. Callers pass the current
//! [`Instant`] to [`SearchEngine::set_query`] and [`SearchEngine::advance`],
//! and use [`SearchEngine::deadline`] to know when to call back. This keeps
//! every transition deterministic; [`crate::driver`] wires it to tokio's timer.

use std::{fmt, time::Instant};

use tracing::{Level, debug, instrument, trace};

use crate::{
    candidate::Candidate,
    debounce::Debouncer,
    error::EngineError,
    filter::Filter,
    navigation::{Key, Navigation, Popup},
    settings::EngineConfig,
};

/// The ranked output of one filter run.
///
/// Each recomputation that changes the query or the contents gets a new
/// generation; the generation is the result set's identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    generation: u64,
    query: String,
    candidates: Vec<Candidate>,
}

impl ResultSet {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The debounced query these results were computed for.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }
}

/// Handle returned when registering a listener, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type ResultListener = Box<dyn FnMut(&ResultSet) + Send>;
type SelectionListener = Box<dyn FnMut(Option<&Candidate>) + Send>;
type QueryListener = Box<dyn FnMut(&str) + Send>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    results: Vec<(Subscription, ResultListener)>,
    selection: Vec<(Subscription, SelectionListener)>,
    query: Vec<(Subscription, QueryListener)>,
}

impl Listeners {
    fn next_subscription(&mut self) -> Subscription {
        self.next_id += 1;
        Subscription(self.next_id)
    }

    fn remove(&mut self, subscription: Subscription) -> bool {
        let before = self.len();
        self.results.retain(|(id, _)| *id != subscription);
        self.selection.retain(|(id, _)| *id != subscription);
        self.query.retain(|(id, _)| *id != subscription);
        self.len() != before
    }

    fn len(&self) -> usize {
        self.results.len() + self.selection.len() + self.query.len()
    }

    fn clear(&mut self) {
        self.results.clear();
        self.selection.clear();
        self.query.clear();
    }
}

/// What a key press did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Opened,
    Highlighted(usize),
    Selected(Candidate),
    Closed,
}

/// Coarse state for a front-end to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The query is too short to search.
    Idle,
    /// Waiting for the quiet interval to elapse.
    Debouncing,
    /// The debounced query matched nothing.
    NoResults,
    /// The debounced query matched this many candidates.
    Results(usize),
}

/// Owned copy of the engine's observable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub query: String,
    pub debounced_query: String,
    pub results: ResultSet,
    pub popup: Popup,
    pub selection: Option<Candidate>,
    pub status: Status,
}

/// A debounced, ranked, keyboard-navigable search over a fixed candidate list.
pub struct SearchEngine {
    config: EngineConfig,
    filter: Box<dyn Filter>,
    candidates: Vec<Candidate>,
    query: String,
    debouncer: Debouncer<String>,
    debounced_query: String,
    results: ResultSet,
    popup: Popup,
    selection: Option<Candidate>,
    listeners: Listeners,
    disposed: bool,
}

impl SearchEngine {
    /// Create an engine with the default configuration.
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self::with_config(candidates, EngineConfig::default())
    }

    pub fn with_config(candidates: Vec<Candidate>, config: EngineConfig) -> Self {
        Self {
            filter: config.filter.build(),
            debouncer: Debouncer::new(config.debounce()),
            config,
            candidates,
            query: String::new(),
            debounced_query: String::new(),
            results: ResultSet::default(),
            popup: Popup::Closed,
            selection: None,
            listeners: Listeners::default(),
            disposed: false,
        }
    }

    // ===== Accessors =====

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn filter_name(&self) -> &str {
        self.filter.name()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// The raw input, updated on every keystroke.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The last query that survived the quiet interval.
    pub fn debounced_query(&self) -> &str {
        &self.debounced_query
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    pub fn popup(&self) -> Popup {
        self.popup
    }

    pub fn is_open(&self) -> bool {
        self.popup.is_open()
    }

    /// Highlighted index, `None` when nothing is highlighted.
    pub fn cursor(&self) -> Option<usize> {
        self.popup.cursor()
    }

    /// The cursor as a signed index where `-1` means no highlight.
    pub fn cursor_index(&self) -> isize {
        self.cursor().map_or(-1, |i| i as isize)
    }

    pub fn highlighted(&self) -> Option<&Candidate> {
        self.cursor().and_then(|i| self.results.get(i))
    }

    pub fn selection(&self) -> Option<&Candidate> {
        self.selection.as_ref()
    }

    /// True while a query is waiting for the quiet interval.
    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// When [`advance`](Self::advance) should next be called.
    pub fn deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn status(&self) -> Status {
        if self.is_pending() {
            Status::Debouncing
        } else if self.debounced_query.chars().count() < self.config.min_query_length
            || self.debounced_query.trim().is_empty()
        {
            Status::Idle
        } else if self.results.is_empty() {
            Status::NoResults
        } else {
            Status::Results(self.results.len())
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            query: self.query.clone(),
            debounced_query: self.debounced_query.clone(),
            results: self.results.clone(),
            popup: self.popup,
            selection: self.selection.clone(),
            status: self.status(),
        }
    }

    // ===== Configuration =====

    /// Replace the configuration. The built-in filter named by `config`
    /// replaces any custom filter, and the current results are recomputed.
    ///
    /// With a zero debounce interval a pending query is searched right away.
    pub fn configure(&mut self, config: EngineConfig) -> Result<(), EngineError> {
        self.ensure_live("configure")?;
        let filter = config.filter.build();
        self.install(config, filter)
    }

    /// Install a custom filter, keeping the rest of the configuration.
    pub fn set_filter(&mut self, filter: impl Filter + 'static) -> Result<(), EngineError> {
        self.set_boxed_filter(Box::new(filter))
    }

    pub fn set_boxed_filter(&mut self, filter: Box<dyn Filter>) -> Result<(), EngineError> {
        self.ensure_live("set filter")?;
        self.install(self.config.clone(), filter)
    }

    /// Replace the candidate list and recompute the results.
    pub fn set_candidates(&mut self, candidates: Vec<Candidate>) -> Result<(), EngineError> {
        self.ensure_live("set candidates")?;
        let results = compute(
            self.filter.as_ref(),
            &candidates,
            &self.debounced_query,
            &self.config,
        )?;

        debug!(count = candidates.len(), "candidate list replaced");
        self.candidates = candidates;
        self.publish(self.debounced_query.clone(), results);
        Ok(())
    }

    fn install(
        &mut self,
        config: EngineConfig,
        filter: Box<dyn Filter>,
    ) -> Result<(), EngineError> {
        let flush_pending = config.debounce_ms == 0 && self.debouncer.is_pending();
        let query = if flush_pending {
            self.query.clone()
        } else {
            self.debounced_query.clone()
        };
        let results = compute(filter.as_ref(), &self.candidates, &query, &config)?;

        debug!(?config, filter = filter.name(), "engine configured");
        self.debouncer.set_interval(config.debounce());
        if flush_pending {
            self.debouncer.cancel();
        }
        self.config = config;
        self.filter = filter;
        self.debounced_query = query.clone();
        self.publish(query, results);
        Ok(())
    }

    // ===== Input =====

    /// Feed the raw input observed at `now`.
    ///
    /// Opens the popup with nothing highlighted, clears the selection and
    /// restarts the debounce wait. Setting the same text again only clears
    /// the highlight, and does nothing at all while closed.
    pub fn set_query(&mut self, text: impl Into<String>, now: Instant) -> Result<(), EngineError> {
        self.ensure_live("set query")?;
        let text = text.into();

        if text == self.query {
            if self.popup.is_open() {
                self.popup = Popup::Open { highlighted: None };
            }
            return Ok(());
        }

        // With no quiet interval the query is searched right away; run the
        // filter before touching any state so a failure changes nothing.
        let immediate = if self.debouncer.interval().is_zero() {
            Some(compute(
                self.filter.as_ref(),
                &self.candidates,
                &text,
                &self.config,
            )?)
        } else {
            None
        };

        trace!(query = %text, "query edited");
        self.query = text.clone();
        self.popup = Popup::Open { highlighted: None };
        self.notify_query();
        if self.selection.take().is_some() {
            self.notify_selection();
        }

        match immediate {
            Some(results) => {
                self.debouncer.cancel();
                self.debounced_query = text.clone();
                self.publish(text, results);
            }
            None => {
                // a zero interval has already been handled above
                let _ = self.debouncer.push(text, now);
            }
        }
        Ok(())
    }

    /// Deliver a timer tick. Searches the pending query if its quiet interval
    /// has elapsed by `now`; returns whether a new result set was published.
    ///
    /// If the filter fails the previous results stay in place and the pending
    /// query waits another quiet interval before it is retried.
    pub fn advance(&mut self, now: Instant) -> Result<bool, EngineError> {
        self.ensure_live("advance")?;
        if !self.debouncer.is_due(now) {
            return Ok(false);
        }
        self.emit_pending().inspect_err(|_| {
            self.debouncer.defer(now);
        })
    }

    /// Search the pending query immediately, ignoring the quiet interval.
    /// The query stays pending if the filter fails.
    pub fn flush(&mut self) -> Result<bool, EngineError> {
        self.ensure_live("flush")?;
        self.emit_pending()
    }

    fn emit_pending(&mut self) -> Result<bool, EngineError> {
        let Some(query) = self.debouncer.pending().cloned() else {
            return Ok(false);
        };
        let results = compute(self.filter.as_ref(), &self.candidates, &query, &self.config)?;

        self.debouncer.cancel();
        debug!(query = %query, count = results.len(), "debounced query emitted");
        self.debounced_query = query.clone();
        Ok(self.publish(query, results))
    }

    // ===== Navigation =====

    /// Drive the popup with a key press.
    pub fn handle_key(&mut self, key: Key) -> Result<KeyOutcome, EngineError> {
        self.ensure_live("handle key")?;

        let outcome = match self.popup.on_key(key, self.results.len()) {
            Navigation::Ignore => KeyOutcome::Ignored,
            Navigation::Open => {
                self.popup = Popup::Open { highlighted: None };
                KeyOutcome::Opened
            }
            Navigation::Highlight(index) => {
                self.popup = Popup::Open {
                    highlighted: Some(index),
                };
                KeyOutcome::Highlighted(index)
            }
            Navigation::Confirm(index) => match self.select(index)? {
                Some(candidate) => KeyOutcome::Selected(candidate),
                None => KeyOutcome::Ignored,
            },
            Navigation::Close => {
                self.popup = Popup::Closed;
                KeyOutcome::Closed
            }
        };

        trace!(%key, ?outcome, popup = ?self.popup, "key handled");
        Ok(outcome)
    }

    /// Select the visible result at `index`, as a click would. Does nothing
    /// when the popup is closed or the index is out of range.
    pub fn confirm(&mut self, index: usize) -> Result<Option<Candidate>, EngineError> {
        self.ensure_live("confirm")?;
        if !self.popup.is_open() {
            return Ok(None);
        }
        self.select(index)
    }

    /// The input gained focus: show the popup.
    pub fn focus(&mut self) -> Result<(), EngineError> {
        self.ensure_live("focus")?;
        if !self.popup.is_open() {
            self.popup = Popup::Open { highlighted: None };
        }
        Ok(())
    }

    /// Focus moved elsewhere: hide the popup, keep the selection.
    pub fn dismiss(&mut self) -> Result<(), EngineError> {
        self.ensure_live("dismiss")?;
        self.popup = Popup::Closed;
        Ok(())
    }

    /// Make `results[index]` the selection, rewrite the query to its label
    /// and close the popup.
    #[instrument(skip(self), level = Level::DEBUG, name = "select_candidate")]
    fn select(&mut self, index: usize) -> Result<Option<Candidate>, EngineError> {
        let Some(candidate) = self.results.get(index).cloned() else {
            return Ok(None);
        };

        let label = candidate.label.clone();
        let results = compute(self.filter.as_ref(), &self.candidates, &label, &self.config)?;

        debug!(id = %candidate.id, label = %candidate.label, "candidate selected");
        self.debouncer.cancel();
        self.popup = Popup::Closed;
        self.selection = Some(candidate.clone());
        self.query = label.clone();
        self.debounced_query = label.clone();
        self.notify_query();
        self.notify_selection();
        self.publish(label, results);

        Ok(Some(candidate))
    }

    // ===== Listeners =====

    /// Call `listener` with every newly published result set.
    pub fn on_result_set_change(
        &mut self,
        listener: impl FnMut(&ResultSet) + Send + 'static,
    ) -> Result<Subscription, EngineError> {
        self.ensure_live("subscribe")?;
        let id = self.listeners.next_subscription();
        self.listeners.results.push((id, Box::new(listener)));
        Ok(id)
    }

    /// Call `listener` whenever a candidate is selected (`Some`) or the
    /// selection is cleared by an edit (`None`).
    pub fn on_selection_change(
        &mut self,
        listener: impl FnMut(Option<&Candidate>) + Send + 'static,
    ) -> Result<Subscription, EngineError> {
        self.ensure_live("subscribe")?;
        let id = self.listeners.next_subscription();
        self.listeners.selection.push((id, Box::new(listener)));
        Ok(id)
    }

    /// Call `listener` whenever the raw query changes, including when a
    /// selection rewrites it.
    pub fn on_query_change(
        &mut self,
        listener: impl FnMut(&str) + Send + 'static,
    ) -> Result<Subscription, EngineError> {
        self.ensure_live("subscribe")?;
        let id = self.listeners.next_subscription();
        self.listeners.query.push((id, Box::new(listener)));
        Ok(id)
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.listeners.remove(subscription)
    }

    // ===== Lifecycle =====

    /// Cancel the pending debounce and detach every listener.
    ///
    /// Any later mutating call fails with [`EngineError::Disposed`]. Disposing
    /// twice is harmless.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        let cancelled = self.debouncer.cancel();
        self.listeners.clear();
        self.popup = Popup::Closed;
        self.disposed = true;
        debug!(cancelled, "search engine disposed");
    }

    fn ensure_live(&self, operation: &'static str) -> Result<(), EngineError> {
        if self.disposed {
            Err(EngineError::Disposed { operation })
        } else {
            Ok(())
        }
    }

    /// Install new results if they differ from the current ones. A new result
    /// set clears the highlight. Returns whether anything was published.
    fn publish(&mut self, query: String, candidates: Vec<Candidate>) -> bool {
        if query == self.results.query && candidates == self.results.candidates {
            return false;
        }

        self.results = ResultSet {
            generation: self.results.generation + 1,
            query,
            candidates,
        };
        if self.popup.is_open() {
            self.popup = Popup::Open { highlighted: None };
        }

        trace!(
            generation = self.results.generation,
            count = self.results.len(),
            "result set published"
        );
        for (_, listener) in &mut self.listeners.results {
            listener(&self.results);
        }
        true
    }

    fn notify_selection(&mut self) {
        for (_, listener) in &mut self.listeners.selection {
            listener(self.selection.as_ref());
        }
    }

    fn notify_query(&mut self) {
        for (_, listener) in &mut self.listeners.query {
            listener(&self.query);
        }
    }
}

impl fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchEngine")
            .field("config", &self.config)
            .field("filter", &self.filter.name())
            .field("query", &self.query)
            .field("debounced_query", &self.debounced_query)
            .field("results", &self.results.len())
            .field("popup", &self.popup)
            .field("selection", &self.selection.as_ref().map(|c| &c.id))
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

/// Run `filter` for `query`, applying the minimum query length first.
#[instrument(skip_all, level = Level::TRACE, name = "compute_results", fields(query = %query))]
fn compute(
    filter: &dyn Filter,
    candidates: &[Candidate],
    query: &str,
    config: &EngineConfig,
) -> Result<Vec<Candidate>, EngineError> {
    if query.chars().count() < config.min_query_length {
        return Ok(Vec::new());
    }

    filter
        .filter(candidates, query, config.max_results)
        .map_err(|source| EngineError::Filter {
            filter: filter.name().to_string(),
            query: query.to_string(),
            source,
        })
}
