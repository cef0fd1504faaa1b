use std::io::{IsTerminal, Stdout, stdout};

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use eyre::{Context, Result, bail};
use ratatui::{Terminal, TerminalOptions, Viewport, backend::CrosstermBackend};

/// Restore the terminal before the default hook prints the panic, so the
/// message is readable and the shell is usable afterwards.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        original_hook(panic_info);
    }));
}

/// Lines outside the result list: borders, input line, status and selection.
const CHROME_HEIGHT: u16 = 6;

/// Owns raw mode and the inline viewport for as long as it lives.
///
/// Call [`install_panic_hook`] first so a panic also leaves the terminal in a
/// usable state.
pub struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    keep_output: bool,
}

impl TerminalGuard {
    /// Enter raw mode with an inline viewport tall enough for `max_results`
    /// rows. Fails when stdout is not a terminal.
    pub fn new(max_results: usize, keep_output: bool) -> Result<Self> {
        if !stdout().is_terminal() {
            bail!(
                "lookahead search requires a terminal (TTY) but stdout is not a terminal. \
                 Use `lookahead query` when piping output."
            );
        }

        let (_, term_height) = crossterm::terminal::size().unwrap_or((80, 24));
        let height = viewport_height(max_results, term_height);

        enable_raw_mode().context("failed to enable raw mode")?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::with_options(
            backend,
            TerminalOptions {
                viewport: Viewport::Inline(height),
            },
        )
        .context("failed to create terminal with inline viewport")?;

        Ok(Self {
            terminal,
            keep_output,
        })
    }

    pub fn terminal(&mut self) -> &mut Terminal<CrosstermBackend<Stdout>> {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if !self.keep_output {
            let _ = self.terminal.clear();
        }
        let _ = disable_raw_mode();
    }
}

/// Rows needed for `max_results` suggestions, capped to the terminal.
fn viewport_height(max_results: usize, term_height: u16) -> u16 {
    let wanted = u16::try_from(max_results)
        .unwrap_or(u16::MAX)
        .saturating_add(CHROME_HEIGHT);
    wanted.min(term_height.saturating_sub(1)).max(CHROME_HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn panic_hook_can_be_reinstalled() {
        install_panic_hook();
        install_panic_hook();
    }

    #[test]
    fn viewport_fits_results_and_terminal() {
        assert_eq!(viewport_height(10, 40), 16);
        assert_eq!(viewport_height(50, 24), 23);
        assert_eq!(viewport_height(0, 3), CHROME_HEIGHT);
    }
}
