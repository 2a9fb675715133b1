//! The dialog stack and its visibility rules
//!
//! Insertion order is z-order: the last pushed entry is the top-most one.
//! The stack only grows at the top, shrinks from the top, or is cleared.
//!
//! Resolution:
//! - the visible alert is the top entry, and only if that entry is an alert;
//! - the visible content dialog is the most recently pushed content entry,
//!   whatever sits above it.

use super::snapshot::VisibleDialog;
use super::types::{AlertDialog, ContentDialog, DialogId, DialogRequest};
use std::sync::Arc;

enum StackEntry<C> {
    Content {
        id: DialogId,
        dialog: Arc<ContentDialog<C>>,
    },
    Alert {
        id: DialogId,
        dialog: Arc<AlertDialog<C>>,
    },
}

impl<C> StackEntry<C> {
    fn id(&self) -> DialogId {
        match self {
            Self::Content { id, .. } | Self::Alert { id, .. } => *id,
        }
    }
}

/// Ordered stack of pending dialog requests
pub struct DialogStack<C> {
    entries: Vec<StackEntry<C>>,
    next_id: u64,
}

impl<C> DialogStack<C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Push a request on top; always accepted
    pub fn push(&mut self, request: DialogRequest<C>) -> DialogId {
        let id = DialogId(self.next_id);
        self.next_id += 1;

        let entry = match request {
            DialogRequest::Content(dialog) => StackEntry::Content {
                id,
                dialog: Arc::new(dialog),
            },
            DialogRequest::Alert(dialog) => StackEntry::Alert {
                id,
                dialog: Arc::new(dialog),
            },
        };
        self.entries.push(entry);
        id
    }

    /// Remove the top entry; `None` on an empty stack
    pub fn pop(&mut self) -> Option<DialogId> {
        self.entries.pop().map(|entry| entry.id())
    }

    /// Remove everything, returning how many entries were dropped
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn visible_alert(&self) -> Option<VisibleDialog<AlertDialog<C>>> {
        match self.entries.last()? {
            StackEntry::Alert { id, dialog } => Some(VisibleDialog {
                id: *id,
                dialog: Arc::clone(dialog),
                on_top: true,
            }),
            StackEntry::Content { .. } => None,
        }
    }

    pub fn visible_content(&self) -> Option<VisibleDialog<ContentDialog<C>>> {
        let top = self.entries.last().map(StackEntry::id);

        self.entries.iter().rev().find_map(|entry| match entry {
            StackEntry::Content { id, dialog } => Some(VisibleDialog {
                id: *id,
                dialog: Arc::clone(dialog),
                on_top: Some(*id) == top,
            }),
            StackEntry::Alert { .. } => None,
        })
    }
}

impl<C> Default for DialogStack<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(body: &'static str) -> DialogRequest<&'static str> {
        ContentDialog::new(body).with_title(body).into()
    }

    fn alert(title: &'static str) -> DialogRequest<&'static str> {
        AlertDialog::new().with_title(title).into()
    }

    fn visible_content_body(stack: &DialogStack<&'static str>) -> Option<&'static str> {
        stack.visible_content().map(|visible| visible.dialog.content)
    }

    fn visible_alert_title(stack: &DialogStack<&'static str>) -> Option<String> {
        stack
            .visible_alert()
            .and_then(|visible| visible.dialog.title.clone())
    }

    #[test]
    fn test_latest_content_wins_over_alerts_above_it() {
        let mut stack = DialogStack::new();
        stack.push(content("first"));
        stack.push(alert("a1"));
        stack.push(content("second"));
        stack.push(alert("a2"));
        stack.push(alert("a3"));

        assert_eq!(visible_content_body(&stack), Some("second"));
        assert_eq!(visible_alert_title(&stack).as_deref(), Some("a3"));
        assert!(!stack.visible_content().unwrap().on_top);
    }

    #[test]
    fn test_alert_hidden_until_uncovered() {
        let mut stack = DialogStack::new();
        stack.push(alert("confirm"));
        assert_eq!(visible_alert_title(&stack).as_deref(), Some("confirm"));

        stack.push(content("form"));
        stack.push(content("nested"));
        assert!(stack.visible_alert().is_none());

        stack.pop();
        assert!(stack.visible_alert().is_none());

        stack.pop();
        assert_eq!(visible_alert_title(&stack).as_deref(), Some("confirm"));
        assert!(stack.visible_content().is_none());
    }

    #[test]
    fn test_pop_reveals_previous_content() {
        let mut stack = DialogStack::new();
        stack.push(content("x"));
        stack.push(content("y"));
        assert_eq!(visible_content_body(&stack), Some("y"));

        stack.pop();
        assert_eq!(visible_content_body(&stack), Some("x"));
        assert!(stack.visible_content().unwrap().on_top);
    }

    #[test]
    fn test_pop_and_clear_on_empty_are_noops() {
        let mut stack: DialogStack<()> = DialogStack::new();

        assert_eq!(stack.pop(), None);
        assert_eq!(stack.clear(), 0);
        assert_eq!(stack.clear(), 0);
        assert_eq!(stack.len(), 0);
        assert!(stack.visible_alert().is_none());
    }

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let mut stack = DialogStack::new();
        let first = stack.push(content("a"));
        let second = stack.push(alert("b"));
        stack.pop();
        let third = stack.push(alert("c"));

        assert!(first < second && second < third);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.visible_alert().map(|visible| visible.id), Some(third));
        assert_eq!(stack.visible_content().map(|visible| visible.id), Some(first));
    }
}
