//! Transactions held by the client for the lifetime of the process
//!
//! Storage is the remote data service's job; this book only keeps what the
//! current session created or edited, and serves it to the list in pages.

pub mod form;

pub use form::{FormField, TransactionForm};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn toggle(self) -> Self {
        match self {
            Self::Income => Self::Expense,
            Self::Expense => Self::Income,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => f.write_str("Income"),
            Self::Expense => f.write_str("Expense"),
        }
    }
}

/// A spending or earning category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: TransactionKind,
}

/// Built-in categories offered by the form
pub static DEFAULT_CATEGORIES: [Category; 7] = [
    Category { id: "1", name: "Food", kind: TransactionKind::Expense },
    Category { id: "2", name: "Transportation", kind: TransactionKind::Expense },
    Category { id: "3", name: "Housing", kind: TransactionKind::Expense },
    Category { id: "4", name: "Entertainment", kind: TransactionKind::Expense },
    Category { id: "5", name: "Utilities", kind: TransactionKind::Expense },
    Category { id: "6", name: "Salary", kind: TransactionKind::Income },
    Category { id: "7", name: "Investments", kind: TransactionKind::Income },
];

/// Categories that apply to `kind`, in display order
pub fn categories_for(kind: TransactionKind) -> Vec<&'static Category> {
    DEFAULT_CATEGORIES
        .iter()
        .filter(|category| category.kind == kind)
        .collect()
}

pub fn category_name(id: &str) -> Option<&'static str> {
    DEFAULT_CATEGORIES
        .iter()
        .find(|category| category.id == id)
        .map(|category| category.name)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    /// Always positive; `kind` carries the sign
    pub amount_cents: i64,
    pub category_id: String,
    pub description: String,
    pub date: NaiveDate,
}

impl Transaction {
    /// Amount with the sign implied by `kind`
    pub fn signed_cents(&self) -> i64 {
        match self.kind {
            TransactionKind::Income => self.amount_cents,
            TransactionKind::Expense => -self.amount_cents,
        }
    }
}

/// Render cents as `1234.50`
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Which transactions the list shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionFilter {
    #[default]
    All,
    Only(TransactionKind),
}

impl TransactionFilter {
    /// All -> Income -> Expense -> All
    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Only(TransactionKind::Income),
            Self::Only(TransactionKind::Income) => Self::Only(TransactionKind::Expense),
            Self::Only(TransactionKind::Expense) => Self::All,
        }
    }

    pub fn matches(self, transaction: &Transaction) -> bool {
        match self {
            Self::All => true,
            Self::Only(kind) => transaction.kind == kind,
        }
    }
}

impl fmt::Display for TransactionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Only(kind) => fmt::Display::fmt(kind, f),
        }
    }
}

/// Summary figures shown above the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionTotals {
    pub income_cents: i64,
    /// Positive sum of all expenses
    pub expense_cents: i64,
    pub balance_cents: i64,
}

/// One page of the filtered list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    /// Offset to request next, `None` once the list is exhausted
    pub next_offset: Option<usize>,
}

const SAMPLE_ROWS: [(TransactionKind, i64, &str, &str, u32); 3] = [
    (TransactionKind::Income, 150_000, "6", "Monthly salary", 15),
    (TransactionKind::Expense, 12_050, "1", "Grocery shopping", 16),
    (TransactionKind::Expense, 4_500, "2", "Gas", 17),
];

/// In-memory transaction store, newest date first
#[derive(Debug, Default)]
pub struct TransactionBook {
    transactions: Vec<Transaction>,
}

impl TransactionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Book preloaded with a few example rows, so a fresh session has
    /// something to browse
    pub fn with_samples() -> Self {
        let mut book = Self::new();
        for (kind, amount_cents, category_id, description, day) in SAMPLE_ROWS {
            let Some(date) = NaiveDate::from_ymd_opt(2023, 3, day) else {
                continue;
            };
            book.add(Transaction {
                id: Uuid::new_v4(),
                kind,
                amount_cents,
                category_id: category_id.to_string(),
                description: description.to_string(),
                date,
            });
        }
        book
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn add(&mut self, transaction: Transaction) -> Uuid {
        let id = transaction.id;
        self.transactions.push(transaction);
        self.sort();
        id
    }

    /// Replace the transaction with the same id; returns false if unknown
    pub fn update(&mut self, transaction: Transaction) -> bool {
        match self.transactions.iter_mut().find(|t| t.id == transaction.id) {
            Some(slot) => {
                *slot = transaction;
                self.sort();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Transaction> {
        let index = self.transactions.iter().position(|t| t.id == id)?;
        Some(self.transactions.remove(index))
    }

    pub fn filtered(&self, filter: TransactionFilter) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(move |t| filter.matches(t))
    }

    /// Net balance of everything matching `filter`
    pub fn balance_cents(&self, filter: TransactionFilter) -> i64 {
        self.filtered(filter).map(Transaction::signed_cents).sum()
    }

    /// Income, expenses and balance over the whole book
    pub fn totals(&self) -> TransactionTotals {
        let income_cents = self.balance_cents(TransactionFilter::Only(TransactionKind::Income));
        let expense_cents = -self.balance_cents(TransactionFilter::Only(TransactionKind::Expense));

        TransactionTotals {
            income_cents,
            expense_cents,
            balance_cents: income_cents - expense_cents,
        }
    }

    pub fn page(&self, filter: TransactionFilter, offset: usize, limit: usize) -> TransactionPage {
        let mut matching = self.filtered(filter).skip(offset);
        let items: Vec<Transaction> = matching.by_ref().take(limit).cloned().collect();
        let next_offset = matching.next().map(|_| offset + items.len());

        TransactionPage { items, next_offset }
    }

    fn sort(&mut self) {
        self.transactions.sort_by(|a, b| b.date.cmp(&a.date));
    }
}

#[cfg(test)]
pub(crate) fn sample_transaction(kind: TransactionKind, cents: i64, day: u32) -> Transaction {
    Transaction {
        id: Uuid::new_v4(),
        kind,
        amount_cents: cents,
        category_id: categories_for(kind)[0].id.to_string(),
        description: format!("sample {}", day),
        date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_split_by_kind() {
        let income: Vec<_> = categories_for(TransactionKind::Income)
            .iter()
            .map(|c| c.name)
            .collect();

        assert_eq!(income, vec!["Salary", "Investments"]);
        assert_eq!(categories_for(TransactionKind::Expense).len(), 5);
        assert_eq!(category_name("3"), Some("Housing"));
        assert_eq!(category_name("99"), None);
    }

    #[test]
    fn test_book_orders_newest_first_and_filters() {
        let mut book = TransactionBook::new();
        book.add(sample_transaction(TransactionKind::Expense, 1_250, 2));
        book.add(sample_transaction(TransactionKind::Income, 300_000, 10));
        book.add(sample_transaction(TransactionKind::Expense, 4_000, 5));

        let days: Vec<u32> = book
            .filtered(TransactionFilter::All)
            .map(|t| chrono::Datelike::day(&t.date))
            .collect();
        assert_eq!(days, vec![10, 5, 2]);

        let expense = TransactionFilter::Only(TransactionKind::Expense);
        assert_eq!(book.filtered(expense).count(), 2);
        assert_eq!(book.balance_cents(TransactionFilter::All), 300_000 - 5_250);
    }

    #[test]
    fn test_update_and_remove() {
        let mut book = TransactionBook::new();
        let mut transaction = sample_transaction(TransactionKind::Expense, 999, 1);
        let id = book.add(transaction.clone());

        transaction.amount_cents = 1_999;
        assert!(book.update(transaction));
        assert_eq!(book.balance_cents(TransactionFilter::All), -1_999);

        assert!(book.remove(id).is_some());
        assert!(book.remove(id).is_none());
        assert!(!book.update(sample_transaction(TransactionKind::Income, 1, 1)));
        assert!(book.is_empty());
    }

    #[test]
    fn test_samples_and_totals() {
        let book = TransactionBook::with_samples();
        assert_eq!(book.len(), 3);

        let newest = book.filtered(TransactionFilter::All).next().unwrap();
        assert_eq!(newest.description, "Gas");
        assert_eq!(category_name(&newest.category_id), Some("Transportation"));

        assert_eq!(
            book.totals(),
            TransactionTotals {
                income_cents: 150_000,
                expense_cents: 16_550,
                balance_cents: 133_450,
            }
        );
        assert_eq!(TransactionBook::new().totals(), TransactionTotals::default());
    }

    #[test]
    fn test_paging_reports_next_offset() {
        let mut book = TransactionBook::new();
        for day in 1..=5 {
            book.add(sample_transaction(TransactionKind::Expense, 100, day));
        }

        let first = book.page(TransactionFilter::All, 0, 2);
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.next_offset, Some(2));

        let last = book.page(TransactionFilter::All, 4, 2);
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.next_offset, None);

        let exact = book.page(TransactionFilter::All, 3, 2);
        assert_eq!(exact.next_offset, None);
    }

    #[test]
    fn test_filter_cycle_and_formatting() {
        let filter = TransactionFilter::All.next();
        assert_eq!(filter.to_string(), "Income");
        assert_eq!(filter.next().next(), TransactionFilter::All);

        assert_eq!(format_cents(123_450), "1234.50");
        assert_eq!(format_cents(-5), "-0.05");
    }
}
