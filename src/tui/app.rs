use crate::config::Config;
use crate::dialogs::{AlertDialog, ContentDialog};
use crate::finance::{category_name, format_cents, Transaction, TransactionBook, TransactionForm};
use crate::tui::components::{
    dialog_view::PlainBodies, AppDialogProvider, BodyRenderer, Component, DialogBody, DialogView,
    TransactionFormView, TransactionsPage,
};
use crate::tui::events::{Event, TRANSACTION_DELETE, TRANSACTION_SAVED};
use crate::tui::{keys::KeyMap, styles::Theme, utils::layout, Frame};
use anyhow::{anyhow, Result};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Main application state and controller
pub struct App {
    /// Whether the application should quit
    pub should_quit: bool,

    /// Current application dimensions
    pub size: Rect,

    /// Key mappings for the application
    pub key_map: KeyMap,

    /// Current theme for styling
    pub theme: Theme,

    /// Status message to display
    pub status_message: Option<String>,

    /// Show the help overlay
    pub show_help: bool,

    config: Config,
    dialogs: AppDialogProvider,
    dialog_view: DialogView,
    transactions: TransactionsPage,

    /// Form behind the transaction dialog, while that dialog is on the stack
    form: Option<TransactionFormView>,

    /// Event sender for internal communication
    event_sender: mpsc::UnboundedSender<Event>,
}

/// Draws dialog bodies, handing the form body to the live form view
struct AppBodies<'a> {
    form: Option<&'a mut TransactionFormView>,
    plain: PlainBodies,
}

impl BodyRenderer for AppBodies<'_> {
    fn body_height(&self, body: &DialogBody, width: u16) -> u16 {
        match body {
            DialogBody::TransactionForm => self
                .form
                .as_ref()
                .map_or(0, |form| form.preferred_height()),
            DialogBody::Message(_) => self.plain.body_height(body, width),
        }
    }

    fn render_body(&mut self, frame: &mut Frame, area: Rect, body: &DialogBody, theme: &Theme) {
        match body {
            DialogBody::TransactionForm => {
                if let Some(form) = self.form.as_mut() {
                    form.render(frame, area, theme);
                }
            }
            DialogBody::Message(_) => self.plain.render_body(frame, area, body, theme),
        }
    }
}

impl App {
    /// Create a new application instance
    pub fn new(
        config: Config,
        book: TransactionBook,
        event_sender: mpsc::UnboundedSender<Event>,
    ) -> Result<Self> {
        let theme = Theme::by_name(&config.theme)
            .ok_or_else(|| anyhow!("Unknown theme '{}'", config.theme))?;
        let dialogs = AppDialogProvider::with_labels(config.dialog_labels());
        let dialog_view = DialogView::new(&dialogs);
        let transactions = TransactionsPage::new(book, config.page_size, config.currency.clone());

        Ok(Self {
            should_quit: false,
            size: Rect::default(),
            key_map: KeyMap::default(),
            theme,
            status_message: None,
            show_help: false,
            config,
            dialogs,
            dialog_view,
            transactions,
            form: None,
            event_sender,
        })
    }

    /// Handle incoming events
    pub async fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Key(key_event) => {
                if self.key_map.should_quit(&key_event) {
                    self.should_quit = true;
                    return Ok(true);
                }

                if self.key_map.should_show_help(&key_event) {
                    self.show_help = !self.show_help;
                    return Ok(false);
                }

                self.handle_key(key_event).await?;
            }

            Event::Mouse(mouse_event) => {
                if self.config.mouse_enabled {
                    if self.dialog_view.is_active() {
                        self.dialog_view.handle_mouse(mouse_event)?;
                    } else {
                        self.transactions.handle_mouse_event(mouse_event).await?;
                    }
                }
            }

            Event::Resize(width, height) => {
                self.size = Rect::new(0, 0, width, height);
            }

            Event::Tick => {
                self.transactions.tick().await?;
            }

            Event::Paste(text) => self.handle_paste(&text),

            Event::Custom(name, payload) => self.handle_custom(&name, payload)?,
        }

        self.after_dialog_change();
        Ok(self.should_quit)
    }

    async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.dialog_view.alert_visible() {
            self.dialog_view.handle_alert_key(key)?;
            return Ok(());
        }

        if let Some(body) = self.dialog_view.top_content().cloned() {
            match (body, key.code) {
                (_, KeyCode::Esc) | (DialogBody::Message(_), KeyCode::Enter) => {
                    self.dialog_view.dismiss_top()?
                }
                (DialogBody::TransactionForm, _) => {
                    if let Some(form) = self.form.as_mut() {
                        form.handle_key_event(key).await?;
                    }
                }
                (DialogBody::Message(_), _) => {}
            }
            return Ok(());
        }

        if self.key_map.new_transaction.matches(&key) {
            self.open_form(None)?;
        } else if self.key_map.edit_transaction.matches(&key) {
            match self.transactions.selected().cloned() {
                Some(transaction) => self.open_form(Some(&transaction))?,
                None => self.notify_nothing_selected()?,
            }
        } else if self.key_map.delete_transaction.matches(&key) {
            match self.transactions.selected().cloned() {
                Some(transaction) => self.confirm_delete(&transaction)?,
                None => self.notify_nothing_selected()?,
            }
        } else if self.key_map.cycle_filter.matches(&key) {
            self.transactions.cycle_filter();
            self.status_message = Some(format!("Filter: {}", self.transactions.filter()));
        } else {
            self.transactions.handle_key_event(key).await?;
        }
        Ok(())
    }

    /// Pasted text only goes to the form, and only while it is the top dialog
    fn handle_paste(&mut self, text: &str) {
        let form_on_top = self.dialog_view.top_content() == Some(&DialogBody::TransactionForm);
        match self.form.as_mut() {
            Some(form) if form_on_top => form.paste(text),
            _ => debug!(chars = text.chars().count(), "paste ignored"),
        }
    }

    fn handle_custom(&mut self, name: &str, payload: serde_json::Value) -> Result<()> {
        match name {
            TRANSACTION_SAVED => {
                let transaction: Transaction = serde_json::from_value(payload)?;
                let created = self.transactions.save(transaction);
                let verb = if created { "added" } else { "updated" };
                info!(verb, "transaction saved");
                self.status_message = Some(format!("Transaction {}", verb));
            }
            TRANSACTION_DELETE => {
                let id = payload
                    .get("id")
                    .and_then(|id| id.as_str())
                    .ok_or_else(|| anyhow!("delete event without an id"))?;
                let id = Uuid::parse_str(id)?;
                match self.transactions.delete(id) {
                    Some(_) => {
                        info!(%id, "transaction deleted");
                        self.status_message = Some("Transaction deleted".to_string());
                    }
                    None => warn!(%id, "delete requested for unknown transaction"),
                }
            }
            other => debug!(event = other, "ignoring custom event"),
        }
        Ok(())
    }

    fn open_form(&mut self, transaction: Option<&Transaction>) -> Result<()> {
        let form = match transaction {
            Some(transaction) => TransactionForm::edit(transaction),
            None => TransactionForm::new(chrono::Local::now().date_naive()),
        };
        let view = TransactionFormView::new(
            form,
            self.dialogs.context(),
            self.event_sender.clone(),
            self.key_map.clone(),
        );
        view.open()?;
        self.form = Some(view);
        Ok(())
    }

    fn confirm_delete(&self, transaction: &Transaction) -> Result<()> {
        let sender = self.event_sender.clone();
        let id = transaction.id;
        let summary = format!(
            "{} {} {} ({}) on {}",
            transaction.kind,
            format_cents(transaction.amount_cents),
            self.config.currency,
            category_name(&transaction.category_id).unwrap_or("Unknown"),
            transaction.date
        );

        let alert = AlertDialog::new()
            .with_title("Delete Transaction")
            .with_description("This transaction will be deleted. This cannot be undone.")
            .with_content(DialogBody::Message(summary))
            .with_confirm_label("Delete")
            .on_confirm(move |dialogs| {
                let payload = json!({ "id": id.to_string() });
                if let Err(err) = sender.send(Event::Custom(TRANSACTION_DELETE.to_string(), payload)) {
                    warn!("Failed to post delete event: {}", err);
                }
                dialogs.hide_all_dialog()
            });

        self.dialogs.handle().open_dialog(alert)?;
        Ok(())
    }

    fn notify_nothing_selected(&self) -> Result<()> {
        let notice = ContentDialog::new(DialogBody::Message(
            "Select a transaction first, or press n to add one.".to_string(),
        ))
        .with_title("Nothing Selected");
        self.dialogs.handle().open_dialog(notice)?;
        Ok(())
    }

    /// Refresh the dialog layer and drop the form once its dialog is gone
    fn after_dialog_change(&mut self) {
        self.dialog_view.sync();

        let form_on_stack = self
            .dialog_view
            .snapshot()
            .content
            .as_ref()
            .is_some_and(|content| content.dialog.content == DialogBody::TransactionForm);
        if self.form.is_some() && !form_on_stack {
            debug!("transaction form closed");
            self.form = None;
        }
    }

    /// Render the application UI
    pub fn render(&mut self, frame: &mut Frame) {
        self.size = frame.size();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // Main content
                Constraint::Length(1), // Status bar
            ])
            .split(self.size);

        self.transactions.render(frame, chunks[0], &self.theme);
        self.render_status_bar(frame, chunks[1]);

        let mut bodies = AppBodies {
            form: self.form.as_mut(),
            plain: PlainBodies,
        };
        self.dialog_view.render(frame, chunks[0], &self.theme, &mut bodies);

        if self.show_help {
            self.render_help_overlay(frame);
        }
    }

    /// Render the status bar
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let status_text = if let Some(ref message) = self.status_message {
            message.clone()
        } else {
            format!(
                "{}: Add | {}: Edit | {}: Delete | {}: Filter | {}: Help | {}: Quit",
                self.key_map.new_transaction.label(),
                self.key_map.edit_transaction.label(),
                self.key_map.delete_transaction.label(),
                self.key_map.cycle_filter.label(),
                self.key_map.help.label(),
                self.key_map.quit.label()
            )
        };

        let status_paragraph = Paragraph::new(status_text).style(self.theme.status_bar_style());
        frame.render_widget(status_paragraph, area);
    }

    /// Render help overlay
    fn render_help_overlay(&self, frame: &mut Frame) {
        let help_area = layout::centered_rect_percent(60, 50, frame.size());

        let help_block = Block::default()
            .borders(Borders::ALL)
            .title("Help")
            .style(self.theme.help_style());

        let help_paragraph = Paragraph::new(self.key_map.help_text())
            .block(help_block)
            .style(self.theme.text_style());

        frame.render_widget(Clear, help_area);
        frame.render_widget(help_paragraph, help_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::{sample_transaction, FormField, TransactionKind};
    use crossterm::event::KeyModifiers;
    use ratatui::{backend::TestBackend, Terminal};

    fn app() -> (App, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(Config::default(), TransactionBook::new(), tx).unwrap();
        (app, rx)
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    async fn press_all(app: &mut App, events: Vec<Event>) {
        for event in events {
            app.handle_event(event).await.unwrap();
        }
    }

    fn saved_event(transaction: &Transaction) -> Event {
        Event::Custom(
            TRANSACTION_SAVED.to_string(),
            serde_json::to_value(transaction).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_discard_changes_flow() {
        let (mut app, _rx) = app();

        press_all(
            &mut app,
            vec![key(KeyCode::Char('n')), key(KeyCode::Tab), key(KeyCode::Char('5')), ctrl('x')],
        )
        .await;
        assert!(app.dialog_view.alert_visible());
        assert!(app.form.is_some());

        // Continue Editing is focused first
        app.handle_event(key(KeyCode::Enter)).await.unwrap();
        assert!(!app.dialog_view.alert_visible());
        assert!(app.dialog_view.top_content().is_some());

        press_all(&mut app, vec![ctrl('x'), key(KeyCode::Right), key(KeyCode::Enter)]).await;
        assert!(!app.dialog_view.is_active());
        assert!(app.form.is_none());
    }

    #[tokio::test]
    async fn test_escape_closes_clean_form() {
        let (mut app, _rx) = app();

        app.handle_event(key(KeyCode::Char('n'))).await.unwrap();
        assert_eq!(app.dialog_view.top_content(), Some(&DialogBody::TransactionForm));

        app.handle_event(key(KeyCode::Esc)).await.unwrap();
        assert!(!app.dialog_view.is_active());
        assert!(app.form.is_none());
    }

    #[tokio::test]
    async fn test_submitted_form_is_saved() {
        let (mut app, mut rx) = app();

        press_all(
            &mut app,
            vec![
                key(KeyCode::Char('n')),
                key(KeyCode::Tab),
                key(KeyCode::Char('4')),
                key(KeyCode::Char('2')),
                key(KeyCode::Tab),
                key(KeyCode::Right),
                ctrl('s'),
            ],
        )
        .await;
        assert!(!app.dialog_view.is_active());

        let saved = rx.try_recv().unwrap();
        app.handle_event(saved).await.unwrap();

        assert_eq!(app.transactions.book().len(), 1);
        assert_eq!(app.status_message.as_deref(), Some("Transaction added"));
        assert_eq!(app.transactions.selected().map(|t| t.amount_cents), Some(4_200));
    }

    #[tokio::test]
    async fn test_delete_confirmation_posts_event() {
        let (mut app, mut rx) = app();
        let transaction = sample_transaction(TransactionKind::Expense, 1_000, 3);
        app.handle_event(saved_event(&transaction)).await.unwrap();

        app.handle_event(key(KeyCode::Char('d'))).await.unwrap();
        let snapshot = app.dialog_view.snapshot().clone();
        assert_eq!(snapshot.confirm_label(), Some("Delete"));
        assert_eq!(snapshot.cancel_label(), Some("Cancel"));
        let body = snapshot.alert.as_ref().and_then(|alert| alert.dialog.content.clone());
        assert_eq!(
            body,
            Some(DialogBody::Message("Expense 10.00 USD (Food) on 2024-03-03".to_string()))
        );

        app.handle_event(key(KeyCode::Char('y'))).await.unwrap();
        assert!(!app.dialog_view.is_active());

        let delete = rx.try_recv().unwrap();
        app.handle_event(delete).await.unwrap();
        assert!(app.transactions.book().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_delete_keeps_transaction() {
        let (mut app, mut rx) = app();
        let transaction = sample_transaction(TransactionKind::Income, 1_000, 3);
        app.handle_event(saved_event(&transaction)).await.unwrap();

        press_all(&mut app, vec![key(KeyCode::Char('d')), key(KeyCode::Esc)]).await;

        assert!(!app.dialog_view.is_active());
        assert!(rx.try_recv().is_err());
        assert_eq!(app.transactions.book().len(), 1);
    }

    #[tokio::test]
    async fn test_paste_reaches_focused_form_field() {
        let (mut app, mut rx) = app();

        app.handle_event(Event::Paste("99".to_string())).await.unwrap();
        assert!(!app.dialog_view.is_active());

        press_all(&mut app, vec![key(KeyCode::Char('n')), key(KeyCode::Tab)]).await;
        app.handle_event(Event::Paste("12.34".to_string())).await.unwrap();
        press_all(&mut app, vec![key(KeyCode::Tab), key(KeyCode::Right), ctrl('s')]).await;

        let saved = rx.try_recv().unwrap();
        app.handle_event(saved).await.unwrap();
        assert_eq!(app.transactions.selected().map(|t| t.amount_cents), Some(1_234));
    }

    #[tokio::test]
    async fn test_paste_ignored_under_alert() {
        let (mut app, _rx) = app();
        press_all(
            &mut app,
            vec![key(KeyCode::Char('n')), key(KeyCode::Tab), key(KeyCode::Char('5')), ctrl('x')],
        )
        .await;
        assert!(app.dialog_view.alert_visible());

        app.handle_event(Event::Paste("00".to_string())).await.unwrap();
        assert_eq!(app.form.as_ref().unwrap().form().value(FormField::Amount), "5");
    }

    #[tokio::test]
    async fn test_edit_without_selection_shows_notice() {
        let (mut app, _rx) = app();

        app.handle_event(key(KeyCode::Char('e'))).await.unwrap();
        assert!(matches!(
            app.dialog_view.top_content(),
            Some(DialogBody::Message(_))
        ));
        assert!(app.form.is_none());

        app.handle_event(key(KeyCode::Enter)).await.unwrap();
        assert!(!app.dialog_view.is_active());
    }

    #[tokio::test]
    async fn test_render_with_form_and_alert() {
        let (mut app, _rx) = app();
        press_all(
            &mut app,
            vec![key(KeyCode::Char('n')), key(KeyCode::Tab), key(KeyCode::Char('1')), ctrl('x')],
        )
        .await;

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(text.contains("Discard Changes"));
        assert!(text.contains("Add Transaction"));
        assert!(text.contains("Balance"));
    }

    #[test]
    fn test_unknown_theme_is_rejected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let config = Config {
            theme: "neon".to_string(),
            ..Config::default()
        };

        assert!(App::new(config, TransactionBook::new(), tx).is_err());
    }
}
