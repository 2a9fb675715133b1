use super::{AppDialogContext, Component, DialogBody};
use crate::dialogs::{AlertDialog, ContentDialog, DialogId};
use crate::finance::{FormField, TransactionForm};
use crate::tui::events::{Event, TRANSACTION_SAVED};
use crate::tui::{keys::KeyMap, styles::Theme, Frame};
use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

const LABEL_WIDTH: usize = 18;

/// Form shown inside the add/edit transaction dialog.
///
/// The view drives the dialog controller itself: submitting closes every
/// dialog, and cancelling a form with changes stacks a confirmation alert
/// on top of it.
pub struct TransactionFormView {
    form: TransactionForm,
    dialogs: AppDialogContext,
    events: mpsc::UnboundedSender<Event>,
    keys: KeyMap,
}

impl TransactionFormView {
    pub fn new(
        form: TransactionForm,
        dialogs: AppDialogContext,
        events: mpsc::UnboundedSender<Event>,
        keys: KeyMap,
    ) -> Self {
        Self {
            form,
            dialogs,
            events,
            keys,
        }
    }

    #[cfg(test)]
    pub fn form(&self) -> &TransactionForm {
        &self.form
    }

    /// Pasted text lands in the focused field
    pub fn paste(&mut self, text: &str) {
        if self.form.focus().is_text() {
            self.form.insert_str(text);
        } else {
            debug!(field = self.form.focus().label(), "paste ignored on a choice field");
        }
    }

    /// Push the content dialog hosting this form
    pub fn open(&self) -> Result<DialogId> {
        let dialog = ContentDialog::new(DialogBody::TransactionForm)
            .with_title(self.form.title())
            .with_description(self.form.description_text());
        Ok(self.dialogs.dialogs()?.open_dialog(dialog)?)
    }

    /// Validate; on success publish the transaction and close all dialogs
    pub fn submit(&mut self) -> Result<bool> {
        let Some(transaction) = self.form.submit() else {
            debug!(errors = self.form.errors().len(), "transaction form rejected");
            return Ok(false);
        };

        let dialogs = self.dialogs.dialogs()?;
        let payload = serde_json::to_value(&transaction)?;
        self.events
            .send(Event::Custom(TRANSACTION_SAVED.to_string(), payload))?;
        info!(
            id = %transaction.id,
            edited = self.form.editing().is_some(),
            "transaction submitted"
        );
        dialogs.hide_all_dialog()?;
        Ok(true)
    }

    /// Close the form, asking first when it holds unsaved changes
    pub fn cancel(&self) -> Result<()> {
        let dialogs = self.dialogs.dialogs()?;
        if self.form.is_dirty() {
            dialogs.open_dialog(
                AlertDialog::new()
                    .with_title("Discard Changes")
                    .with_description(
                        "You have unsaved changes. Are you sure you want to discard them?",
                    )
                    .with_confirm_label("Discard")
                    .with_cancel_label("Continue Editing"),
            )?;
        } else {
            dialogs.close_dialog()?;
        }
        Ok(())
    }

    fn field_line(&self, field: FormField, theme: &Theme) -> Line<'static> {
        let focused = self.form.focus() == field;
        let value = self.form.value(field);

        let shown = if field.is_text() {
            if focused {
                format!("{}_", value)
            } else {
                value
            }
        } else if value.is_empty() {
            "◀ Select a category ▶".to_string()
        } else {
            format!("◀ {} ▶", value)
        };

        let value_style = if focused {
            theme.selection_style()
        } else if self.form.value(field).is_empty() {
            theme.placeholder_style()
        } else {
            theme.text_style()
        };

        Line::from(vec![
            Span::styled(
                format!("{:<width$}", field.label(), width = LABEL_WIDTH),
                theme.dim_style(),
            ),
            Span::styled(shown, value_style),
        ])
    }
}

#[async_trait]
impl Component for TransactionFormView {
    async fn handle_key_event(&mut self, event: KeyEvent) -> Result<()> {
        if self.keys.submit_form.matches(&event) {
            self.submit()?;
            return Ok(());
        }
        if self.keys.cancel_form.matches(&event) {
            return self.cancel();
        }

        let choice = !self.form.focus().is_text();
        match event.code {
            KeyCode::Tab => self.form.focus_next(),
            KeyCode::BackTab => self.form.focus_prev(),
            KeyCode::Down if !choice => self.form.focus_next(),
            KeyCode::Up if !choice => self.form.focus_prev(),
            KeyCode::Right | KeyCode::Down if choice => self.form.cycle_choice(true),
            KeyCode::Left | KeyCode::Up if choice => self.form.cycle_choice(false),
            KeyCode::Char(' ') if choice => self.form.cycle_choice(true),
            KeyCode::Char(c)
                if !event
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.form.insert_char(c)
            }
            KeyCode::Backspace => self.form.backspace(),
            _ => {}
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let mut lines = Vec::new();
        for field in FormField::ALL {
            lines.push(self.field_line(field, theme));
            if let Some(error) = self.form.error_for(field) {
                lines.push(Line::from(Span::styled(
                    format!("{:<width$}{}", "", error, width = LABEL_WIDTH),
                    theme.error_style(),
                )));
            }
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "Tab: Next field • ←/→: Change • {}: Save • {}: Cancel",
                self.keys.submit_form.label(),
                self.keys.cancel_form.label()
            ),
            theme.dim_style(),
        )));

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn preferred_height(&self) -> u16 {
        let errors = FormField::ALL
            .iter()
            .filter(|field| self.form.error_for(**field).is_some())
            .count();
        FormField::ALL.len() as u16 + errors as u16 + 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::{sample_transaction, Transaction, TransactionKind};
    use crate::tui::components::AppDialogProvider;
    use chrono::NaiveDate;
    use ratatui::{backend::TestBackend, Terminal};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn setup(
        form: TransactionForm,
    ) -> (AppDialogProvider, TransactionFormView, mpsc::UnboundedReceiver<Event>) {
        let provider = AppDialogProvider::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let view = TransactionFormView::new(form, provider.context(), tx, KeyMap::default());
        view.open().unwrap();
        (provider, view, rx)
    }

    async fn type_text(view: &mut TransactionFormView, text: &str) {
        for c in text.chars() {
            view.handle_key_event(key(KeyCode::Char(c))).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_cancel_dirty_form_asks_then_discards() {
        let (provider, mut view, _rx) = setup(TransactionForm::new(today()));

        view.handle_key_event(key(KeyCode::Tab)).await.unwrap();
        type_text(&mut view, "12").await;
        view.handle_key_event(ctrl('x')).await.unwrap();

        let snapshot = provider.snapshot();
        assert_eq!(snapshot.depth, 2);
        let alert = snapshot.alert.as_ref().unwrap();
        assert_eq!(alert.dialog.title.as_deref(), Some("Discard Changes"));
        assert_eq!(snapshot.confirm_label(), Some("Discard"));
        assert_eq!(snapshot.cancel_label(), Some("Continue Editing"));
        assert!(!snapshot.content.as_ref().unwrap().on_top);

        provider.handle().confirm_alert().unwrap();
        assert!(provider.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_clean_form_closes_it() {
        let (provider, mut view, _rx) = setup(TransactionForm::new(today()));

        view.handle_key_event(ctrl('x')).await.unwrap();

        assert!(provider.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_submit_keeps_dialog_open() {
        let (provider, mut view, mut rx) = setup(TransactionForm::new(today()));

        view.handle_key_event(ctrl('s')).await.unwrap();

        assert_eq!(provider.snapshot().depth, 1);
        assert_eq!(view.form().focus(), FormField::Amount);
        assert!(view.preferred_height() > 7);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_valid_submit_posts_transaction_and_hides_all() {
        let existing = sample_transaction(TransactionKind::Expense, 1_250, 2);
        let (provider, mut view, mut rx) = setup(TransactionForm::edit(&existing));

        view.handle_key_event(key(KeyCode::Tab)).await.unwrap();
        view.handle_key_event(key(KeyCode::Backspace)).await.unwrap();
        type_text(&mut view, "9").await;
        view.handle_key_event(ctrl('s')).await.unwrap();

        assert!(provider.snapshot().is_empty());
        match rx.try_recv().unwrap() {
            Event::Custom(name, payload) => {
                assert_eq!(name, TRANSACTION_SAVED);
                let saved: Transaction = serde_json::from_value(payload).unwrap();
                assert_eq!(saved.id, existing.id);
                assert_eq!(saved.amount_cents, 1_259);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_choice_fields_cycle_with_arrows() {
        let (_provider, mut view, _rx) = setup(TransactionForm::new(today()));

        view.handle_key_event(key(KeyCode::Right)).await.unwrap();
        assert_eq!(view.form().value(FormField::Kind), "Income");

        view.handle_key_event(key(KeyCode::Tab)).await.unwrap();
        view.handle_key_event(key(KeyCode::Tab)).await.unwrap();
        view.handle_key_event(key(KeyCode::Right)).await.unwrap();
        assert_eq!(view.form().value(FormField::Category), "Salary");
    }

    #[tokio::test]
    async fn test_paste_fills_focused_text_field() {
        let (_provider, mut view, _rx) = setup(TransactionForm::new(today()));

        view.paste("25");
        assert_eq!(view.form().value(FormField::Kind), "Expense");
        assert!(!view.form().is_dirty());

        view.handle_key_event(key(KeyCode::Tab)).await.unwrap();
        view.paste("42.10");
        assert_eq!(view.form().value(FormField::Amount), "42.10");
    }

    #[tokio::test]
    async fn test_form_without_provider_reports_usage_error() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut view = TransactionFormView::new(
            TransactionForm::new(today()),
            AppDialogContext::empty(),
            tx,
            KeyMap::default(),
        );

        assert!(view.open().is_err());
        assert!(view.handle_key_event(ctrl('x')).await.is_err());
    }

    #[test]
    fn test_render_shows_labels() {
        let (_provider, mut view, _rx) = setup(TransactionForm::new(today()));
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        let theme = Theme::default();

        terminal
            .draw(|frame| {
                let area = frame.size();
                view.render(frame, area, &theme);
            })
            .unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(text.contains("Transaction Type"));
        assert!(text.contains("Select a category"));
        assert!(text.contains("2024-03-15"));
    }
}
