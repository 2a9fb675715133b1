//! Terminal user interface built on ratatui
//!
//! The screen is the transaction list with a dialog layer on top of it. All
//! dialogs go through one dialog provider owned by [`App`].

mod app;
mod components;
mod events;
mod keys;
mod styles;
mod utils;

use app::App;
use events::EventHandler;

use crate::config::Config;
use crate::finance::TransactionBook;
use anyhow::Result;
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use tracing::info;

pub type Backend = CrosstermBackend<io::Stdout>;
pub type Frame<'a> = ratatui::Frame<'a>;

/// Initialize the terminal for TUI mode
pub fn init_terminal(mouse: bool) -> Result<Terminal<Backend>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    if mouse {
        execute!(stdout, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
pub fn restore_terminal(terminal: &mut Terminal<Backend>, mouse: bool) -> Result<()> {
    disable_raw_mode()?;
    if mouse {
        execute!(terminal.backend_mut(), DisableMouseCapture)?;
    }
    execute!(terminal.backend_mut(), DisableBracketedPaste, LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Main TUI entry point
pub async fn run(config: Config) -> Result<()> {
    let mouse = config.mouse_enabled;
    let mut event_handler = EventHandler::new(config.tick_rate());
    let mut app = App::new(config, TransactionBook::with_samples(), event_handler.sender())?;

    let mut terminal = init_terminal(mouse)?;
    info!("Starting interactive mode");

    let result = run_app(&mut terminal, &mut app, &mut event_handler).await;

    restore_terminal(&mut terminal, mouse)?;
    result
}

/// Main application loop
async fn run_app(
    terminal: &mut Terminal<Backend>,
    app: &mut App,
    event_handler: &mut EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| app.render(frame))?;

        let event = event_handler.next().await?;
        if app.handle_event(event).await? {
            break;
        }
    }
    Ok(())
}
