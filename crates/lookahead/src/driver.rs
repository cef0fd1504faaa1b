//! Running a [`SearchEngine`] on its own tokio task.
//!
//! The engine itself is synchronous and clock-agnostic. The driver gives it a
//! home: a task that owns the engine, applies requests from any number of
//! [`EngineHandle`]s one at a time, and sleeps until the debounce deadline in
//! between. Engine listeners are bridged onto a broadcast channel, so the UI
//! layer subscribes with [`EngineHandle::subscribe`] rather than registering
//! callbacks.
//!
//! ```no_run
//! use lookahead::{Candidate, Key, SearchEngine, driver};
//!
//! # async fn example() -> Result<(), lookahead::EngineError> {
//! let handle = driver::spawn(SearchEngine::new(vec![Candidate::new("1", "Rust")]))?;
//! let mut events = handle.subscribe();
//!
//! handle.set_query("ru").await?;
//! while let Ok(event) = events.recv().await {
//!     if let driver::EngineEvent::ResultsChanged(results) = event {
//!         println!("{} results", results.len());
//!         break;
//!     }
//! }
//! handle.handle_key(Key::ArrowDown).await?;
//! handle.dispose().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::{
    sync::{broadcast, mpsc, oneshot},
    time::Instant,
};
use tracing::{debug, warn};

use crate::{
    candidate::Candidate,
    engine::{KeyOutcome, ResultSet, SearchEngine, Snapshot},
    error::EngineError,
    filter::Filter,
    navigation::Key,
    settings::EngineConfig,
};

const REQUEST_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 64;

/// Notifications published by a running engine.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    QueryChanged(String),
    ResultsChanged(ResultSet),
    SelectionChanged(Option<Candidate>),
    /// The engine started or stopped waiting for the quiet interval.
    PendingChanged(bool),
    /// A timer-driven search failed. The previous results remain and the
    /// query is retried after another quiet interval.
    FilterFailed(String),
}

enum Request {
    SetQuery(String),
    Key(Key),
    Confirm(usize),
    Focus,
    Dismiss,
    Flush,
    Configure(EngineConfig),
    SetFilter(Box<dyn Filter>),
    SetCandidates(Vec<Candidate>),
    Snapshot,
    Dispose,
}

enum Reply {
    Done,
    Key(KeyOutcome),
    Confirmed(Option<Candidate>),
    Flushed(bool),
    Snapshot(Box<Snapshot>),
}

impl Reply {
    fn into_key(self) -> Result<KeyOutcome, EngineError> {
        match self {
            Reply::Key(outcome) => Ok(outcome),
            _ => Err(EngineError::Closed),
        }
    }

    fn into_confirmed(self) -> Result<Option<Candidate>, EngineError> {
        match self {
            Reply::Confirmed(candidate) => Ok(candidate),
            _ => Err(EngineError::Closed),
        }
    }

    fn into_flushed(self) -> Result<bool, EngineError> {
        match self {
            Reply::Flushed(published) => Ok(published),
            _ => Err(EngineError::Closed),
        }
    }

    fn into_snapshot(self) -> Result<Snapshot, EngineError> {
        match self {
            Reply::Snapshot(snapshot) => Ok(*snapshot),
            _ => Err(EngineError::Closed),
        }
    }
}

struct Envelope {
    request: Request,
    reply: oneshot::Sender<Result<Reply, EngineError>>,
}

/// A cheaply cloneable handle to an engine running on a tokio task.
#[derive(Clone)]
pub struct EngineHandle {
    requests: mpsc::Sender<Envelope>,
    events: broadcast::Sender<EngineEvent>,
    disposed: Arc<AtomicBool>,
}

/// Move `engine` onto a new task and return a handle to it.
///
/// The task runs until [`EngineHandle::dispose`] is called or every handle is
/// dropped; either way the engine is disposed and any pending debounce is
/// cancelled. Must be called from within a tokio runtime.
pub fn spawn(mut engine: SearchEngine) -> Result<EngineHandle, EngineError> {
    let (events, _) = broadcast::channel(EVENT_BUFFER);

    let tx = events.clone();
    engine.on_query_change(move |query| {
        let _ = tx.send(EngineEvent::QueryChanged(query.to_string()));
    })?;
    let tx = events.clone();
    engine.on_result_set_change(move |results| {
        let _ = tx.send(EngineEvent::ResultsChanged(results.clone()));
    })?;
    let tx = events.clone();
    engine.on_selection_change(move |selection| {
        let _ = tx.send(EngineEvent::SelectionChanged(selection.cloned()));
    })?;

    let (requests, rx) = mpsc::channel(REQUEST_BUFFER);
    tokio::spawn(run(engine, rx, events.clone()));

    Ok(EngineHandle {
        requests,
        events,
        disposed: Arc::new(AtomicBool::new(false)),
    })
}

async fn run(
    mut engine: SearchEngine,
    mut requests: mpsc::Receiver<Envelope>,
    events: broadcast::Sender<EngineEvent>,
) {
    debug!("search engine task started");

    loop {
        let deadline = engine.deadline();
        let wake_at = deadline.map_or_else(Instant::now, Instant::from_std);
        let was_pending = engine.is_pending();

        tokio::select! {
            biased;

            envelope = requests.recv() => {
                let Some(Envelope { request, reply }) = envelope else {
                    debug!("all engine handles dropped");
                    break;
                };
                let dispose = matches!(request, Request::Dispose);
                let result = apply(&mut engine, request);
                let _ = reply.send(result);
                if dispose {
                    break;
                }
            }

            _ = tokio::time::sleep_until(wake_at), if deadline.is_some() => {
                if let Err(e) = engine.advance(Instant::now().into_std()) {
                    warn!(error = %e, "debounced search failed");
                    let _ = events.send(EngineEvent::FilterFailed(e.to_string()));
                }
            }
        }

        let pending = engine.is_pending();
        if pending != was_pending {
            let _ = events.send(EngineEvent::PendingChanged(pending));
        }
    }

    engine.dispose();
    debug!("search engine task stopped");
}

fn apply(engine: &mut SearchEngine, request: Request) -> Result<Reply, EngineError> {
    let now = Instant::now().into_std();
    match request {
        Request::SetQuery(text) => engine.set_query(text, now).map(|_| Reply::Done),
        Request::Key(key) => engine.handle_key(key).map(Reply::Key),
        Request::Confirm(index) => engine.confirm(index).map(Reply::Confirmed),
        Request::Focus => engine.focus().map(|_| Reply::Done),
        Request::Dismiss => engine.dismiss().map(|_| Reply::Done),
        Request::Flush => engine.flush().map(Reply::Flushed),
        Request::Configure(config) => engine.configure(config).map(|_| Reply::Done),
        Request::SetFilter(filter) => engine.set_boxed_filter(filter).map(|_| Reply::Done),
        Request::SetCandidates(candidates) => {
            engine.set_candidates(candidates).map(|_| Reply::Done)
        }
        Request::Snapshot => Ok(Reply::Snapshot(Box::new(engine.snapshot()))),
        Request::Dispose => {
            engine.dispose();
            Ok(Reply::Done)
        }
    }
}

impl EngineHandle {
    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub async fn set_query(&self, text: impl Into<String>) -> Result<(), EngineError> {
        self.call("set query", Request::SetQuery(text.into()))
            .await
            .map(|_| ())
    }

    pub async fn handle_key(&self, key: Key) -> Result<KeyOutcome, EngineError> {
        self.call("handle key", Request::Key(key)).await?.into_key()
    }

    pub async fn confirm(&self, index: usize) -> Result<Option<Candidate>, EngineError> {
        self.call("confirm", Request::Confirm(index))
            .await?
            .into_confirmed()
    }

    pub async fn focus(&self) -> Result<(), EngineError> {
        self.call("focus", Request::Focus).await.map(|_| ())
    }

    pub async fn dismiss(&self) -> Result<(), EngineError> {
        self.call("dismiss", Request::Dismiss).await.map(|_| ())
    }

    pub async fn flush(&self) -> Result<bool, EngineError> {
        self.call("flush", Request::Flush).await?.into_flushed()
    }

    pub async fn configure(&self, config: EngineConfig) -> Result<(), EngineError> {
        self.call("configure", Request::Configure(config))
            .await
            .map(|_| ())
    }

    pub async fn set_filter(&self, filter: impl Filter + 'static) -> Result<(), EngineError> {
        self.call("set filter", Request::SetFilter(Box::new(filter)))
            .await
            .map(|_| ())
    }

    pub async fn set_candidates(&self, candidates: Vec<Candidate>) -> Result<(), EngineError> {
        self.call("set candidates", Request::SetCandidates(candidates))
            .await
            .map(|_| ())
    }

    pub async fn snapshot(&self) -> Result<Snapshot, EngineError> {
        self.call("snapshot", Request::Snapshot).await?.into_snapshot()
    }

    /// Stop the engine task, cancelling any pending debounce. Calls made
    /// afterwards through any clone of this handle fail with
    /// [`EngineError::Disposed`].
    pub async fn dispose(&self) -> Result<(), EngineError> {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        match self.send(Request::Dispose).await {
            Ok(_) | Err(EngineError::Closed) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn call(&self, operation: &'static str, request: Request) -> Result<Reply, EngineError> {
        if self.is_disposed() {
            return Err(EngineError::Disposed { operation });
        }
        self.send(request).await
    }

    async fn send(&self, request: Request) -> Result<Reply, EngineError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(Envelope { request, reply })
            .await
            .map_err(|_| EngineError::Closed)?;
        response.await.map_err(|_| EngineError::Closed)?
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
