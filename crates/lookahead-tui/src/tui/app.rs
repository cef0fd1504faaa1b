use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use eyre::Result;
use lookahead::{Candidate, EngineHandle, Key, KeyOutcome, Snapshot};
use tracing::debug;

/// What a terminal key press means for the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Forward to the engine's navigation.
    Navigate(Key),
    Insert(char),
    Backspace,
    Exit,
    None,
}

impl Action {
    /// Translate a key press. Escape navigates while the popup is open and
    /// quits once it is closed.
    pub fn from_key(key: KeyEvent, popup_open: bool) -> Self {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c' | 'd') if ctrl => Action::Exit,
            KeyCode::Char(_) if ctrl => Action::None,
            KeyCode::Char(c) => Action::Insert(c),
            KeyCode::Backspace => Action::Backspace,
            KeyCode::Up => Action::Navigate(Key::ArrowUp),
            KeyCode::Down => Action::Navigate(Key::ArrowDown),
            KeyCode::Enter => Action::Navigate(Key::Enter),
            KeyCode::Tab => Action::Navigate(Key::Tab),
            KeyCode::Esc if popup_open => Action::Navigate(Key::Escape),
            KeyCode::Esc => Action::Exit,
            _ => Action::None,
        }
    }
}

/// TUI state: the text being edited plus the latest view of the engine.
pub struct App {
    handle: EngineHandle,
    pub input: String,
    pub snapshot: Snapshot,
    pub should_exit: bool,
}

impl App {
    pub async fn new(handle: EngineHandle) -> Result<Self> {
        let snapshot = handle.snapshot().await?;
        Ok(Self {
            handle,
            input: snapshot.query.clone(),
            snapshot,
            should_exit: false,
        })
    }

    pub fn selection(&self) -> Option<&Candidate> {
        self.snapshot.selection.as_ref()
    }

    /// Handle a key event. Returns true if render is needed.
    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match Action::from_key(key, self.snapshot.popup.is_open()) {
            Action::Exit => {
                self.should_exit = true;
                Ok(true)
            }
            Action::Insert(c) => {
                self.input.push(c);
                self.edit().await
            }
            Action::Backspace => {
                if self.input.pop().is_none() {
                    return Ok(false);
                }
                self.edit().await
            }
            Action::Navigate(key) => {
                let outcome = self.handle.handle_key(key).await?;
                if let KeyOutcome::Selected(candidate) = &outcome {
                    debug!(label = %candidate.label, "selected from the list");
                    self.input = candidate.label.clone();
                }
                self.refresh().await?;
                Ok(outcome != KeyOutcome::Ignored)
            }
            Action::None => Ok(false),
        }
    }

    /// Pull a fresh snapshot after the engine reported a change.
    pub async fn refresh(&mut self) -> Result<()> {
        self.snapshot = self.handle.snapshot().await?;
        Ok(())
    }

    async fn edit(&mut self) -> Result<bool> {
        self.handle.set_query(self.input.clone()).await?;
        self.refresh().await?;
        Ok(true)
    }
}
