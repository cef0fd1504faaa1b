use std::io;

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use eyre::{Result, eyre};
use futures::{Stream, StreamExt};
use lookahead::EngineEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{trace, warn};

/// Events that drive the TUI.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Keyboard input (press events only)
    Key(KeyEvent),

    /// The engine published something; re-read its state
    Engine(EngineEvent),

    /// Engine events were missed; re-read its state
    Refresh,

    /// Terminal resize (width, height)
    Resize(u16, u16),

    /// Ctrl+C, stdin closed or the engine stopped
    Shutdown,
}

/// Waits for the next terminal or engine event.
///
/// Keyboard input is polled before engine events so typing stays responsive
/// while results stream in. The debounce timer lives on the engine's own task;
/// its expiry shows up here as [`EngineEvent::ResultsChanged`].
pub struct EventLoop<S = EventStream> {
    reader: S,
    engine: broadcast::Receiver<EngineEvent>,
    shutdown: bool,
}

impl EventLoop {
    /// Read input from the terminal.
    pub fn new(engine: broadcast::Receiver<EngineEvent>) -> Self {
        Self::with_reader(EventStream::new(), engine)
    }
}

impl<S> EventLoop<S>
where
    S: Stream<Item = io::Result<Event>> + Unpin,
{
    pub fn with_reader(reader: S, engine: broadcast::Receiver<EngineEvent>) -> Self {
        Self {
            reader,
            engine,
            shutdown: false,
        }
    }

    pub async fn run(&mut self) -> Result<AppEvent> {
        loop {
            if self.shutdown {
                return Ok(AppEvent::Shutdown);
            }

            let event = tokio::select! {
                biased;

                maybe_event = self.reader.next() => match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        Some(AppEvent::Key(key))
                    }
                    Some(Ok(Event::Resize(w, h))) => Some(AppEvent::Resize(w, h)),
                    Some(Err(e)) => return Err(eyre!("terminal event error: {}", e)),
                    None => {
                        // stdin closed
                        self.shutdown = true;
                        None
                    }
                    // mouse, focus, paste and key releases
                    _ => None,
                },

                engine_event = self.engine.recv() => match engine_event {
                    Ok(event) => {
                        trace!(?event, "engine event");
                        Some(AppEvent::Engine(event))
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "fell behind on engine events");
                        Some(AppEvent::Refresh)
                    }
                    Err(RecvError::Closed) => {
                        self.shutdown = true;
                        None
                    }
                },

                _ = tokio::signal::ctrl_c() => {
                    self.shutdown = true;
                    None
                }
            };

            if let Some(app_event) = event {
                return Ok(app_event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};
    use futures::stream;

    use super::*;

    fn no_input() -> stream::Pending<io::Result<Event>> {
        stream::pending()
    }

    #[tokio::test]
    async fn forwards_engine_events() {
        let (tx, rx) = broadcast::channel(4);
        let mut event_loop = EventLoop::with_reader(no_input(), rx);
        tx.send(EngineEvent::PendingChanged(true)).unwrap();

        let event = event_loop.run().await.unwrap();
        assert!(matches!(
            event,
            AppEvent::Engine(EngineEvent::PendingChanged(true))
        ));
    }

    #[tokio::test]
    async fn skips_key_releases() {
        let (_tx, rx) = broadcast::channel(4);
        let release =
            KeyEvent::new_with_kind(KeyCode::Char('a'), KeyModifiers::NONE, KeyEventKind::Release);
        let press = KeyEvent::new(KeyCode::Char('b'), KeyModifiers::NONE);
        let input = stream::iter([Ok::<_, io::Error>(Event::Key(release)), Ok(Event::Key(press))])
            .chain(stream::pending());
        let mut event_loop = EventLoop::with_reader(input, rx);

        let event = event_loop.run().await.unwrap();
        assert!(matches!(event, AppEvent::Key(key) if key.code == KeyCode::Char('b')));
    }

    #[tokio::test]
    async fn closed_input_shuts_down_for_good() {
        let (tx, rx) = broadcast::channel(4);
        let mut event_loop = EventLoop::with_reader(stream::empty(), rx);

        assert!(matches!(event_loop.run().await.unwrap(), AppEvent::Shutdown));
        // later engine events are not delivered once shut down
        tx.send(EngineEvent::PendingChanged(false)).unwrap();
        assert!(matches!(event_loop.run().await.unwrap(), AppEvent::Shutdown));
    }

    #[tokio::test]
    async fn stopped_engine_shuts_down() {
        let (tx, rx) = broadcast::channel(4);
        let mut event_loop = EventLoop::with_reader(no_input(), rx);
        drop(tx);

        assert!(matches!(event_loop.run().await.unwrap(), AppEvent::Shutdown));
    }
}
