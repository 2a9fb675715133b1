//! Transaction form state
//!
//! The form is the payload of the "Add Transaction" / "Edit Transaction"
//! content dialogs. It owns its own validation; the dialog controller only
//! sees it as an opaque body.

use super::{categories_for, Category, Transaction, TransactionKind};
use chrono::NaiveDate;
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Form fields in focus order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Kind,
    Amount,
    Category,
    Description,
    Date,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::Kind,
        FormField::Amount,
        FormField::Category,
        FormField::Description,
        FormField::Date,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Kind => "Transaction Type",
            Self::Amount => "Amount",
            Self::Category => "Category",
            Self::Description => "Description",
            Self::Date => "Date",
        }
    }

    /// Whether the field takes typed text (as opposed to a choice)
    pub fn is_text(self) -> bool {
        matches!(self, Self::Amount | Self::Description | Self::Date)
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|field| *field == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Validation failures shown under the offending field
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Amount must be a number with at most two decimals")]
    InvalidAmount,

    #[error("Amount must be positive")]
    AmountNotPositive,

    #[error("Please select a category")]
    MissingCategory,

    #[error("Please enter a date as YYYY-MM-DD")]
    InvalidDate,
}

impl FormError {
    pub fn field(&self) -> FormField {
        match self {
            Self::InvalidAmount | Self::AmountNotPositive => FormField::Amount,
            Self::MissingCategory => FormField::Category,
            Self::InvalidDate => FormField::Date,
        }
    }
}

/// Parse `12`, `12.5` or `12.50` into cents
pub fn parse_amount(input: &str) -> Result<i64, FormError> {
    let input = input.trim();
    let (whole, fraction) = input.split_once('.').unwrap_or((input, ""));

    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if whole.is_empty() && fraction.is_empty() {
        return Err(FormError::InvalidAmount);
    }
    if !digits_only(whole) || !digits_only(fraction) || fraction.len() > 2 {
        return Err(FormError::InvalidAmount);
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| FormError::InvalidAmount)?
    };
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().map_err(|_| FormError::InvalidAmount)? * 10,
        _ => fraction.parse().map_err(|_| FormError::InvalidAmount)?,
    };

    let cents = whole
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(fraction))
        .ok_or(FormError::InvalidAmount)?;
    if cents <= 0 {
        return Err(FormError::AmountNotPositive);
    }
    Ok(cents)
}

/// State of a transaction form
#[derive(Debug, Clone)]
pub struct TransactionForm {
    editing: Option<Uuid>,
    kind: TransactionKind,
    amount: String,
    category: Option<&'static Category>,
    description: String,
    date: String,
    focus: FormField,
    dirty: bool,
    errors: Vec<FormError>,
}

impl TransactionForm {
    /// Empty expense form dated `today`
    pub fn new(today: NaiveDate) -> Self {
        Self {
            editing: None,
            kind: TransactionKind::Expense,
            amount: String::new(),
            category: None,
            description: String::new(),
            date: today.format(DATE_FORMAT).to_string(),
            focus: FormField::Kind,
            dirty: false,
            errors: Vec::new(),
        }
    }

    /// Form prefilled from an existing transaction
    pub fn edit(transaction: &Transaction) -> Self {
        let category = categories_for(transaction.kind)
            .into_iter()
            .find(|category| category.id == transaction.category_id);

        Self {
            editing: Some(transaction.id),
            kind: transaction.kind,
            amount: super::format_cents(transaction.amount_cents),
            category,
            description: transaction.description.clone(),
            date: transaction.date.format(DATE_FORMAT).to_string(),
            focus: FormField::Kind,
            dirty: false,
            errors: Vec::new(),
        }
    }

    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Transaction"
        } else {
            "Add Transaction"
        }
    }

    pub fn description_text(&self) -> &'static str {
        if self.editing.is_some() {
            "Update the details of this transaction"
        } else {
            "Add a new transaction to your account"
        }
    }

    pub fn editing(&self) -> Option<Uuid> {
        self.editing
    }

    pub fn focus(&self) -> FormField {
        self.focus
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn errors(&self) -> &[FormError] {
        &self.errors
    }

    pub fn error_for(&self, field: FormField) -> Option<&FormError> {
        self.errors.iter().find(|error| error.field() == field)
    }

    /// Display value of a field
    pub fn value(&self, field: FormField) -> String {
        match field {
            FormField::Kind => self.kind.to_string(),
            FormField::Amount => self.amount.clone(),
            FormField::Category => self
                .category
                .map(|category| category.name.to_string())
                .unwrap_or_default(),
            FormField::Description => self.description.clone(),
            FormField::Date => self.date.clone(),
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Type a character into the focused text field
    pub fn insert_char(&mut self, c: char) {
        let target = match self.focus {
            FormField::Amount if c.is_ascii_digit() || c == '.' => &mut self.amount,
            FormField::Description => &mut self.description,
            FormField::Date if c.is_ascii_digit() || c == '-' => &mut self.date,
            _ => return,
        };
        target.push(c);
        self.touch();
    }

    /// Pasted text goes through the same per-field filter as typing
    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| !c.is_control()) {
            self.insert_char(c);
        }
    }

    pub fn backspace(&mut self) {
        let target = match self.focus {
            FormField::Amount => &mut self.amount,
            FormField::Description => &mut self.description,
            FormField::Date => &mut self.date,
            FormField::Kind | FormField::Category => return,
        };
        if target.pop().is_some() {
            self.touch();
        }
    }

    /// Step the focused choice field forwards or backwards.
    ///
    /// Switching the kind clears the category, since each kind has its own
    /// category list.
    pub fn cycle_choice(&mut self, forward: bool) {
        match self.focus {
            FormField::Kind => {
                self.kind = self.kind.toggle();
                self.category = None;
            }
            FormField::Category => {
                let options = categories_for(self.kind);
                if options.is_empty() {
                    return;
                }
                let current = self
                    .category
                    .and_then(|selected| options.iter().position(|c| c.id == selected.id));
                let next = match (current, forward) {
                    (None, true) => 0,
                    (None, false) => options.len() - 1,
                    (Some(i), true) => (i + 1) % options.len(),
                    (Some(i), false) => (i + options.len() - 1) % options.len(),
                };
                self.category = Some(options[next]);
            }
            _ => return,
        }
        self.touch();
    }

    /// Check every field, collecting all failures
    pub fn validate(&self) -> Result<Transaction, Vec<FormError>> {
        let mut errors = Vec::new();

        let amount = parse_amount(&self.amount).map_err(|e| errors.push(e)).ok();
        let category = self.category.or_else(|| {
            errors.push(FormError::MissingCategory);
            None
        });
        let date = NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT)
            .map_err(|_| errors.push(FormError::InvalidDate))
            .ok();

        match (amount, category, date) {
            (Some(amount_cents), Some(category), Some(date)) => Ok(Transaction {
                id: self.editing.unwrap_or_else(Uuid::new_v4),
                kind: self.kind,
                amount_cents,
                category_id: category.id.to_string(),
                description: self.description.trim().to_string(),
                date,
            }),
            _ => Err(errors),
        }
    }

    /// Validate and remember the errors for display
    pub fn submit(&mut self) -> Option<Transaction> {
        match self.validate() {
            Ok(transaction) => {
                self.errors.clear();
                Some(transaction)
            }
            Err(errors) => {
                if let Some(first) = errors.first() {
                    self.focus = first.field();
                }
                self.errors = errors;
                None
            }
        }
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.errors.clear();
    }
}
