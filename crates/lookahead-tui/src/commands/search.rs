use std::io::Write;

use eyre::Result;
use lookahead::{EngineEvent, SearchEngine, Settings};
use tracing::{debug, info};

use crate::catalog;
use crate::tui::{App, AppEvent, EventLoop, TerminalGuard, install_panic_hook, render};

pub async fn run(settings: &Settings, initial_query: Option<String>, keep_output: bool) -> Result<()> {
    install_panic_hook();

    let candidates = catalog::load(settings.catalog.as_deref())?;
    info!(
        candidates = candidates.len(),
        filter = %settings.search.filter,
        "starting interactive search"
    );

    let handle = lookahead::spawn(SearchEngine::with_config(candidates, settings.search.clone()))?;
    let event_loop = EventLoop::new(handle.subscribe());

    if let Some(query) = initial_query {
        handle.set_query(query).await?;
    }
    handle.focus().await?;

    let result = {
        let mut guard = TerminalGuard::new(settings.search.max_results, keep_output)?;
        run_tui(&mut guard, App::new(handle.clone()).await?, event_loop).await
    };
    handle.dispose().await?;

    if let Some(label) = result? {
        writeln!(std::io::stdout(), "{label}")?;
    }
    Ok(())
}

/// Run until the user quits; returns the label of the final selection.
async fn run_tui(
    guard: &mut TerminalGuard,
    mut app: App,
    mut event_loop: EventLoop,
) -> Result<Option<String>> {
    loop {
        if let Err(e) = guard.terminal().draw(|frame| render(frame, &app)) {
            let message = e.to_string();
            // cursor position reads can fail while the terminal is resizing
            if message.contains("cursor position") {
                debug!(error = %message, "skipping frame");
                continue;
            }
            return Err(e.into());
        }

        match event_loop.run().await? {
            AppEvent::Key(key) => {
                app.handle_key(key).await?;
            }
            AppEvent::Engine(EngineEvent::FilterFailed(message)) => {
                debug!(%message, "search failed, keeping previous results");
                app.refresh().await?;
            }
            AppEvent::Engine(_) | AppEvent::Refresh => app.refresh().await?,
            AppEvent::Resize(_, _) => {}
            AppEvent::Shutdown => break,
        }

        if app.should_exit {
            break;
        }
    }

    Ok(app.selection().map(|candidate| candidate.label.clone()))
}
