pub mod dialog_view;
pub mod form_view;
pub mod transactions;

pub use dialog_view::{BodyRenderer, DialogView};
pub use form_view::TransactionFormView;
pub use transactions::TransactionsPage;

use crate::dialogs::{DialogContext, DialogHandle, DialogProvider};
use crate::tui::{styles::Theme, Frame};
use anyhow::Result;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::layout::Rect;
use async_trait::async_trait;

/// Payload carried by the application's dialogs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogBody {
    /// Plain text shown in the dialog body
    Message(String),
    /// The transaction form currently held by the app
    TransactionForm,
}

pub type AppDialogs = DialogHandle<DialogBody>;
pub type AppDialogContext = DialogContext<DialogBody>;
pub type AppDialogProvider = DialogProvider<DialogBody>;

/// Base trait for all UI components
#[async_trait]
pub trait Component: Send + Sync {
    /// Handle keyboard input
    async fn handle_key_event(&mut self, event: KeyEvent) -> Result<()> {
        let _ = event;
        Ok(())
    }

    /// Handle mouse input
    async fn handle_mouse_event(&mut self, event: MouseEvent) -> Result<()> {
        let _ = event;
        Ok(())
    }

    /// Handle periodic updates
    async fn tick(&mut self) -> Result<()> {
        Ok(())
    }

    /// Render the component
    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Rows the component would like when laid out inside a dialog
    fn preferred_height(&self) -> u16 {
        1
    }
}
