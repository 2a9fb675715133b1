use crossterm::event::{Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};
use std::time::Duration;
use tokio::sync::mpsc;
use anyhow::Result;

/// Custom event posted by the delete confirmation alert
pub const TRANSACTION_DELETE: &str = "transaction_delete";

/// Custom event posted when the transaction form is submitted
pub const TRANSACTION_SAVED: &str = "transaction_saved";

/// Application events
#[derive(Debug, Clone)]
pub enum Event {
    /// Keyboard input event
    Key(KeyEvent),

    /// Mouse input event
    Mouse(MouseEvent),

    /// Terminal resize event
    Resize(u16, u16),

    /// Periodic tick event
    Tick,

    /// Text pasted into the terminal in one piece
    Paste(String),

    /// Custom application events
    Custom(String, serde_json::Value),
}

/// Event handler for terminal input and internal events
pub struct EventHandler {
    /// Event receiver channel
    receiver: mpsc::UnboundedReceiver<Event>,

    /// Event sender channel
    sender: mpsc::UnboundedSender<Event>,

    /// Tick interval for periodic events
    tick_interval: Duration,
}

impl EventHandler {
    /// Create a new event handler ticking every `tick_interval`
    pub fn new(tick_interval: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        Self {
            receiver,
            sender,
            tick_interval,
        }
    }

    /// Get the next event
    pub async fn next(&mut self) -> Result<Event> {
        // Internal events first so callbacks are handled before more input
        if let Ok(event) = self.receiver.try_recv() {
            return Ok(event);
        }

        let tick = self.tick_interval;
        let polled = tokio::task::spawn_blocking(move || -> std::io::Result<Option<CrosstermEvent>> {
            if crossterm::event::poll(tick)? {
                crossterm::event::read().map(Some)
            } else {
                Ok(None)
            }
        })
        .await??;

        Ok(polled
            .and_then(|event| self.convert_crossterm_event(event))
            .unwrap_or(Event::Tick))
    }

    /// Convert crossterm events to application events
    fn convert_crossterm_event(&self, event: CrosstermEvent) -> Option<Event> {
        match event {
            CrosstermEvent::Key(key_event) if key_event.kind == KeyEventKind::Release => None,
            CrosstermEvent::Key(key_event) => Some(Event::Key(key_event)),
            CrosstermEvent::Mouse(mouse_event) => Some(Event::Mouse(mouse_event)),
            CrosstermEvent::Resize(width, height) => Some(Event::Resize(width, height)),
            CrosstermEvent::FocusGained | CrosstermEvent::FocusLost => None,
            CrosstermEvent::Paste(text) => Some(Event::Paste(text)),
        }
    }

    /// Get a clone of the sender
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_internal_events_come_first() {
        let mut handler = EventHandler::new(Duration::from_millis(10));
        handler
            .sender()
            .send(Event::Custom(TRANSACTION_SAVED.to_string(), serde_json::Value::Null))
            .unwrap();

        match handler.next().await.unwrap() {
            Event::Custom(name, _) => assert_eq!(name, TRANSACTION_SAVED),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_release_events_are_dropped() {
        use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

        let handler = EventHandler::new(Duration::from_millis(10));
        let release = KeyEvent {
            code: KeyCode::Char('n'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };

        assert!(handler.convert_crossterm_event(CrosstermEvent::Key(release)).is_none());
        assert!(handler
            .convert_crossterm_event(CrosstermEvent::Resize(80, 24))
            .is_some());
        assert!(matches!(
            handler.convert_crossterm_event(CrosstermEvent::Paste("12.50".to_string())),
            Some(Event::Paste(text)) if text == "12.50"
        ));
    }
}
