use super::Component;
use crate::finance::{
    category_name, format_cents, Transaction, TransactionBook, TransactionFilter,
    TransactionTotals,
};
use crate::tui::{styles::Theme, Frame};
use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use tracing::debug;
use uuid::Uuid;

/// Rows from the end of the loaded list at which the next page is fetched
const PREFETCH_MARGIN: usize = 3;

/// Scrollable transaction list with paged loading
pub struct TransactionsPage {
    book: TransactionBook,
    filter: TransactionFilter,
    rows: Vec<Transaction>,
    next_offset: Option<usize>,
    state: ListState,
    page_size: usize,
    currency: String,
}

impl TransactionsPage {
    pub fn new(book: TransactionBook, page_size: usize, currency: impl Into<String>) -> Self {
        let mut page = Self {
            book,
            filter: TransactionFilter::default(),
            rows: Vec::new(),
            next_offset: None,
            state: ListState::default(),
            page_size: page_size.max(1),
            currency: currency.into(),
        };
        page.reload();
        page
    }

    #[cfg(test)]
    pub fn book(&self) -> &TransactionBook {
        &self.book
    }

    pub fn filter(&self) -> TransactionFilter {
        self.filter
    }

    /// Rows loaded so far
    #[cfg(test)]
    pub fn loaded(&self) -> &[Transaction] {
        &self.rows
    }

    pub fn has_more(&self) -> bool {
        self.next_offset.is_some()
    }

    pub fn selected(&self) -> Option<&Transaction> {
        self.state.selected().and_then(|index| self.rows.get(index))
    }

    /// Reload from the start, keeping at least as many rows as were loaded
    pub fn reload(&mut self) {
        let limit = self.rows.len().max(self.page_size);
        let page = self.book.page(self.filter, 0, limit);
        self.rows = page.items;
        self.next_offset = page.next_offset;
        self.clamp_selection();
    }

    /// Append the next page; returns false when nothing was left
    pub fn load_more(&mut self) -> bool {
        let Some(offset) = self.next_offset else {
            return false;
        };

        let page = self.book.page(self.filter, offset, self.page_size);
        debug!(offset, loaded = page.items.len(), "loaded transaction page");
        self.rows.extend(page.items);
        self.next_offset = page.next_offset;
        true
    }

    /// Insert or replace a transaction; returns true when it was new
    pub fn save(&mut self, transaction: Transaction) -> bool {
        let id = transaction.id;
        let created = if self.book.update(transaction.clone()) {
            false
        } else {
            self.book.add(transaction);
            true
        };

        self.reload();
        if let Some(index) = self.rows.iter().position(|t| t.id == id) {
            self.state.select(Some(index));
        }
        created
    }

    pub fn delete(&mut self, id: Uuid) -> Option<Transaction> {
        let removed = self.book.remove(id)?;
        // Deleted rows shrink the loaded window by one
        self.rows.retain(|t| t.id != id);
        self.reload();
        Some(removed)
    }

    pub fn cycle_filter(&mut self) {
        self.filter = self.filter.next();
        self.rows.clear();
        self.state.select(None);
        self.reload();
    }

    pub fn select_next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let next = match self.state.selected() {
            Some(index) => (index + 1).min(self.rows.len() - 1),
            None => 0,
        };
        self.state.select(Some(next));
        self.prefetch();
    }

    pub fn select_prev(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let prev = self.state.selected().map_or(0, |index| index.saturating_sub(1));
        self.state.select(Some(prev));
    }

    fn select_last(&mut self) {
        while self.load_more() {}
        if !self.rows.is_empty() {
            self.state.select(Some(self.rows.len() - 1));
        }
    }

    fn page_down(&mut self) {
        for _ in 0..self.page_size {
            self.select_next();
        }
    }

    fn page_up(&mut self) {
        for _ in 0..self.page_size {
            self.select_prev();
        }
    }

    fn prefetch(&mut self) {
        let Some(index) = self.state.selected() else {
            return;
        };
        if index + PREFETCH_MARGIN >= self.rows.len() {
            self.load_more();
        }
    }

    fn clamp_selection(&mut self) {
        let selected = match (self.state.selected(), self.rows.len()) {
            (_, 0) => None,
            (None, _) => Some(0),
            (Some(index), len) => Some(index.min(len - 1)),
        };
        self.state.select(selected);
    }

    fn summary(&self, totals: TransactionTotals, theme: &Theme) -> Line<'static> {
        let amount = |cents: i64| format!("{} {}", format_cents(cents), self.currency);

        Line::from(vec![
            Span::styled(" Total Income: ", theme.dim_style()),
            Span::styled(amount(totals.income_cents), theme.amount_style(totals.income_cents)),
            Span::styled("  Total Expenses: ", theme.dim_style()),
            Span::styled(amount(totals.expense_cents), theme.amount_style(-totals.expense_cents)),
            Span::styled("  Balance: ", theme.dim_style()),
            Span::styled(amount(totals.balance_cents), theme.amount_style(totals.balance_cents)),
        ])
    }

    fn row(&self, transaction: &Transaction, theme: &Theme) -> ListItem<'static> {
        let category = category_name(&transaction.category_id).unwrap_or("Unknown");
        let description = if transaction.description.is_empty() {
            "-".to_string()
        } else {
            transaction.description.clone()
        };

        ListItem::new(Line::from(vec![
            Span::styled(format!("{}  ", transaction.date), theme.dim_style()),
            Span::styled(format!("{:<8}", transaction.kind), theme.text_style()),
            Span::styled(format!("{:<16}", category), theme.text_style()),
            Span::styled(format!("{:<24}", description), theme.text_style()),
            Span::styled(
                format!("{:>12} {}", format_cents(transaction.signed_cents()), self.currency),
                theme.amount_style(transaction.signed_cents()),
            ),
        ]))
    }
}

#[async_trait]
impl Component for TransactionsPage {
    async fn handle_key_event(&mut self, event: KeyEvent) -> Result<()> {
        match event.code {
            KeyCode::Down | KeyCode::Char('j') => self.select_next(),
            KeyCode::Up | KeyCode::Char('k') => self.select_prev(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => {
                if !self.rows.is_empty() {
                    self.state.select(Some(0));
                }
            }
            KeyCode::End => self.select_last(),
            _ => {}
        }
        Ok(())
    }

    async fn handle_mouse_event(&mut self, event: MouseEvent) -> Result<()> {
        match event.kind {
            MouseEventKind::ScrollDown => self.select_next(),
            MouseEventKind::ScrollUp => self.select_prev(),
            _ => {}
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        let summary = Paragraph::new(self.summary(self.book.totals(), theme)).style(theme.base_style());
        frame.render_widget(summary, chunks[0]);

        let mut title = format!(
            " Transactions ({}) | {} total | Filtered: {} {} ",
            self.filter,
            self.book.len(),
            format_cents(self.book.balance_cents(self.filter)),
            self.currency
        );
        if self.has_more() {
            title.push_str(&format!("| {} loaded ", self.rows.len()));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_style())
            .title(title)
            .style(theme.base_style());

        if self.rows.is_empty() {
            let hint = if self.book.is_empty() {
                "No transactions yet. Press n to add one.".to_string()
            } else {
                format!("No {} transactions. Press f to change the filter.", self.filter)
            };
            let empty = Paragraph::new(hint)
                .style(theme.placeholder_style())
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, chunks[1]);
            return;
        }

        let items: Vec<ListItem> = self.rows.iter().map(|t| self.row(t, theme)).collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(theme.selection_style())
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, chunks[1], &mut self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::{sample_transaction, TransactionKind};
    use crossterm::event::KeyModifiers;
    use ratatui::{backend::TestBackend, Terminal};

    fn book_with(days: u32) -> TransactionBook {
        let mut book = TransactionBook::new();
        for day in 1..=days {
            let kind = if day % 2 == 0 {
                TransactionKind::Income
            } else {
                TransactionKind::Expense
            };
            book.add(sample_transaction(kind, 1_000, day));
        }
        book
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_first_page_and_load_more() {
        let mut page = TransactionsPage::new(book_with(12), 5, "USD");

        assert_eq!(page.loaded().len(), 5);
        assert!(page.has_more());
        assert_eq!(page.selected().map(|t| t.date.to_string()).as_deref(), Some("2024-03-12"));

        assert!(page.load_more());
        assert!(page.load_more());
        assert_eq!(page.loaded().len(), 12);
        assert!(!page.has_more());
        assert!(!page.load_more());
    }

    #[tokio::test]
    async fn test_scrolling_near_the_end_fetches_next_page() {
        let mut page = TransactionsPage::new(book_with(12), 5, "USD");

        page.handle_key_event(key(KeyCode::Down)).await.unwrap();
        assert_eq!(page.loaded().len(), 5);
        page.handle_key_event(key(KeyCode::Down)).await.unwrap();
        assert_eq!(page.loaded().len(), 10);

        page.handle_key_event(key(KeyCode::End)).await.unwrap();
        assert_eq!(page.loaded().len(), 12);
        assert_eq!(page.selected().map(|t| t.date.to_string()).as_deref(), Some("2024-03-01"));
    }

    #[test]
    fn test_filter_cycles_and_resets_rows() {
        let mut page = TransactionsPage::new(book_with(6), 10, "USD");

        page.cycle_filter();
        assert_eq!(page.filter(), TransactionFilter::Only(TransactionKind::Income));
        assert!(page.loaded().iter().all(|t| t.kind == TransactionKind::Income));
        assert_eq!(page.loaded().len(), 3);

        page.cycle_filter();
        page.cycle_filter();
        assert_eq!(page.filter(), TransactionFilter::All);
        assert_eq!(page.loaded().len(), 6);
    }

    #[test]
    fn test_save_adds_then_updates() {
        let mut page = TransactionsPage::new(TransactionBook::new(), 10, "USD");
        assert!(page.selected().is_none());

        let mut transaction = sample_transaction(TransactionKind::Expense, 500, 4);
        assert!(page.save(transaction.clone()));
        assert_eq!(page.selected().map(|t| t.id), Some(transaction.id));

        transaction.amount_cents = 750;
        assert!(!page.save(transaction.clone()));
        assert_eq!(page.book().len(), 1);
        assert_eq!(page.book().balance_cents(TransactionFilter::All), -750);
    }

    fn draw(page: &mut TransactionsPage) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 12)).unwrap();
        let theme = Theme::default();
        terminal
            .draw(|frame| {
                let area = frame.size();
                page.render(frame, area, &theme);
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_header_shows_income_expense_and_balance() {
        let mut page = TransactionsPage::new(TransactionBook::with_samples(), 10, "USD");

        let text = draw(&mut page);
        assert!(text.contains("Total Income: 1500.00 USD"));
        assert!(text.contains("Total Expenses: 165.50 USD"));
        assert!(text.contains("Balance: 1334.50 USD"));
        assert!(text.contains("Grocery shopping"));

        // totals ignore the list filter
        page.cycle_filter();
        let text = draw(&mut page);
        assert!(text.contains("Total Expenses: 165.50 USD"));
        assert!(!text.contains("Grocery shopping"));
    }

    #[test]
    fn test_empty_hint_depends_on_filter() {
        let mut page = TransactionsPage::new(TransactionBook::new(), 10, "USD");
        assert!(draw(&mut page).contains("No transactions yet"));

        page.save(sample_transaction(TransactionKind::Expense, 100, 1));
        page.cycle_filter();
        assert!(draw(&mut page).contains("No Income transactions"));
    }

    #[test]
    fn test_delete_keeps_selection_in_range() {
        let mut page = TransactionsPage::new(book_with(3), 10, "USD");
        page.select_next();
        page.select_next();
        let last = page.selected().map(|t| t.id).unwrap();

        assert!(page.delete(last).is_some());
        assert_eq!(page.loaded().len(), 2);
        assert!(page.selected().is_some());
        assert!(page.delete(last).is_none());
    }
}
