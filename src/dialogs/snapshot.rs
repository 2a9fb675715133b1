//! Immutable views of the dialog stack published to the rendering layer

use super::stack::DialogStack;
use super::types::{AlertDialog, ContentDialog, DialogId, DialogLabels};
use std::fmt;
use std::sync::Arc;

/// A dialog selected for display by the resolution algorithm
pub struct VisibleDialog<T> {
    pub id: DialogId,
    pub dialog: Arc<T>,
    /// Whether this dialog is the absolute top of the stack
    pub on_top: bool,
}

impl<T> Clone for VisibleDialog<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            dialog: Arc::clone(&self.dialog),
            on_top: self.on_top,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for VisibleDialog<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibleDialog")
            .field("id", &self.id)
            .field("dialog", &self.dialog)
            .field("on_top", &self.on_top)
            .finish()
    }
}

/// What the rendering layer should show right now
pub struct DialogSnapshot<C> {
    /// Bumped on every stack change
    pub version: u64,
    pub depth: usize,
    pub content: Option<VisibleDialog<ContentDialog<C>>>,
    pub alert: Option<VisibleDialog<AlertDialog<C>>>,
    /// The visible content asked for outside-click/Esc dismissal to be suppressed
    pub loading: bool,
    pub labels: DialogLabels,
}

impl<C> DialogSnapshot<C> {
    pub fn empty(labels: DialogLabels) -> Self {
        Self {
            version: 0,
            depth: 0,
            content: None,
            alert: None,
            loading: false,
            labels,
        }
    }

    /// `loading` names the content entry holding the loading hint, if any
    pub(crate) fn resolve(
        stack: &DialogStack<C>,
        loading: Option<DialogId>,
        version: u64,
        labels: &DialogLabels,
    ) -> Self {
        let content = stack.visible_content();
        let loading = loading.is_some() && content.as_ref().map(|content| content.id) == loading;

        Self {
            version,
            depth: stack.len(),
            content,
            alert: stack.visible_alert(),
            loading,
            labels: labels.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    /// Content may be dismissed only while it sits on top and is not busy
    pub fn content_dismissible(&self) -> bool {
        !self.loading && self.content.as_ref().is_some_and(|content| content.on_top)
    }

    pub fn confirm_label(&self) -> Option<&str> {
        self.alert
            .as_ref()
            .map(|alert| alert.dialog.confirm_label_or(&self.labels.confirm))
    }

    pub fn cancel_label(&self) -> Option<&str> {
        self.alert
            .as_ref()
            .map(|alert| alert.dialog.cancel_label_or(&self.labels.cancel))
    }
}

impl<C> Clone for DialogSnapshot<C> {
    fn clone(&self) -> Self {
        Self {
            version: self.version,
            depth: self.depth,
            content: self.content.clone(),
            alert: self.alert.clone(),
            loading: self.loading,
            labels: self.labels.clone(),
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for DialogSnapshot<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogSnapshot")
            .field("version", &self.version)
            .field("depth", &self.depth)
            .field("content", &self.content)
            .field("alert", &self.alert)
            .field("loading", &self.loading)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogs::types::AlertDialog;

    #[test]
    fn test_labels_resolve_against_provider_defaults() {
        let mut stack = DialogStack::new();
        stack.push(AlertDialog::new().with_confirm_label("Discard").into());

        let labels = DialogLabels::new("Proceed", "Back");
        let snapshot: DialogSnapshot<()> = DialogSnapshot::resolve(&stack, None, 1, &labels);

        assert_eq!(snapshot.confirm_label(), Some("Discard"));
        assert_eq!(snapshot.cancel_label(), Some("Back"));
    }

    #[test]
    fn test_loading_blocks_dismissal() {
        let mut stack = DialogStack::new();
        let form = stack.push(ContentDialog::new("form").into());

        let idle = DialogSnapshot::resolve(&stack, None, 1, &DialogLabels::default());
        let busy = DialogSnapshot::resolve(&stack, Some(form), 2, &DialogLabels::default());

        assert!(idle.content_dismissible());
        assert!(!busy.content_dismissible());

        // the hint belongs to the form, not to content stacked above it
        stack.push(ContentDialog::new("nested").into());
        let nested = DialogSnapshot::resolve(&stack, Some(form), 3, &DialogLabels::default());
        assert!(!nested.loading);
        assert!(nested.content_dismissible());
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot: DialogSnapshot<()> = DialogSnapshot::empty(DialogLabels::default());

        assert!(snapshot.is_empty());
        assert!(!snapshot.content_dismissible());
        assert_eq!(snapshot.confirm_label(), None);
    }
}
