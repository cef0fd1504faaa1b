//! Keyboard navigation over the suggestion list.
//!
//! The popup is either closed or open, and when open it may highlight one
//! entry. [`Popup::on_key`] is a pure transition function: given the current
//! state, a key and the number of visible results it decides what should
//! happen, and the engine carries it out. Every input is valid. Navigating an
//! empty list and confirming with nothing highlighted do nothing, and indices
//! always wrap around.

use std::{fmt, str::FromStr};

use crate::error::ParseKeyError;

/// Keys the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
    Tab,
}

impl Key {
    pub fn as_str(&self) -> &'static str {
        match self {
            Key::ArrowUp => "ArrowUp",
            Key::ArrowDown => "ArrowDown",
            Key::Enter => "Enter",
            Key::Escape => "Escape",
            Key::Tab => "Tab",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Key {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ArrowUp" => Ok(Key::ArrowUp),
            "ArrowDown" => Ok(Key::ArrowDown),
            "Enter" => Ok(Key::Enter),
            "Escape" => Ok(Key::Escape),
            "Tab" => Ok(Key::Tab),
            other => Err(ParseKeyError(other.to_string())),
        }
    }
}

/// Visibility and highlight of the suggestion list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Popup {
    #[default]
    Closed,
    /// `highlighted` is `None` when no entry is highlighted yet.
    Open { highlighted: Option<usize> },
}

/// What a key press asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Nothing changes.
    Ignore,
    /// Open the popup with nothing highlighted.
    Open,
    /// Highlight the entry at this index.
    Highlight(usize),
    /// Select the entry at this index and close.
    Confirm(usize),
    /// Close, clearing the highlight.
    Close,
}

impl Popup {
    pub fn is_open(&self) -> bool {
        matches!(self, Popup::Open { .. })
    }

    /// Index of the highlighted entry, if any.
    pub fn cursor(&self) -> Option<usize> {
        match self {
            Popup::Open { highlighted } => *highlighted,
            Popup::Closed => None,
        }
    }

    /// Decide the transition for `key` over a list of `len` results.
    pub fn on_key(&self, key: Key, len: usize) -> Navigation {
        let highlighted = match self {
            Popup::Closed => {
                return match key {
                    Key::ArrowDown | Key::Enter => Navigation::Open,
                    Key::ArrowUp | Key::Escape | Key::Tab => Navigation::Ignore,
                };
            }
            Popup::Open { highlighted } => *highlighted,
        };

        match key {
            Key::ArrowDown | Key::ArrowUp if len == 0 => Navigation::Ignore,
            Key::ArrowDown => Navigation::Highlight(match highlighted {
                Some(i) => (i % len + 1) % len,
                None => 0,
            }),
            Key::ArrowUp => Navigation::Highlight(match highlighted {
                Some(i) => (i % len + len - 1) % len,
                None => len - 1,
            }),
            Key::Enter => match highlighted {
                Some(i) if i < len => Navigation::Confirm(i),
                _ => Navigation::Ignore,
            },
            Key::Escape | Key::Tab => Navigation::Close,
        }
    }
}
