//! Core dialog types
//!
//! This module defines the requests that components push onto the dialog
//! stack, the identifiers the controller hands back, and the usage errors
//! raised when the controller is reached without a live provider.

use super::provider::DialogHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Label shown on an alert's confirm button when the request sets none
pub const DEFAULT_CONFIRM_LABEL: &str = "Continue";

/// Label shown on an alert's cancel button when the request sets none
pub const DEFAULT_CANCEL_LABEL: &str = "Cancel";

/// Identifier assigned to every request pushed onto a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DialogId(pub u64);

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dialog#{}", self.0)
    }
}

/// The two kinds of dialog the controller knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogKind {
    /// Modal carrying caller-supplied content, e.g. a form
    Content,
    /// Confirm/cancel decision with optional callbacks
    Alert,
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content => f.write_str("content"),
            Self::Alert => f.write_str("alert"),
        }
    }
}

/// Callback attached to an alert button.
///
/// The handle of the controller that owns the alert is passed in, so a
/// callback decides itself whether to pop or clear the stack.
pub type DialogCallback<C> = Arc<dyn Fn(&DialogHandle<C>) -> DialogResult<()> + Send + Sync>;

/// A dialog whose body is an opaque payload owned by the caller
#[derive(Debug, Clone)]
pub struct ContentDialog<C> {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: C,
}

impl<C> ContentDialog<C> {
    pub fn new(content: C) -> Self {
        Self {
            title: None,
            description: None,
            content,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A confirm/cancel dialog
pub struct AlertDialog<C> {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Optional body rendered under the description
    pub content: Option<C>,
    pub confirm_label: Option<String>,
    pub cancel_label: Option<String>,
    /// Runs instead of the default "hide all" when confirm is pressed
    pub on_confirm: Option<DialogCallback<C>>,
    /// Runs instead of the default "close" on cancel or dismissal
    pub on_cancel: Option<DialogCallback<C>>,
}

impl<C> AlertDialog<C> {
    pub fn new() -> Self {
        Self {
            title: None,
            description: None,
            content: None,
            confirm_label: None,
            cancel_label: None,
            on_confirm: None,
            on_cancel: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_content(mut self, content: C) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = Some(label.into());
        self
    }

    pub fn with_cancel_label(mut self, label: impl Into<String>) -> Self {
        self.cancel_label = Some(label.into());
        self
    }

    pub fn on_confirm<F>(mut self, callback: F) -> Self
    where
        F: Fn(&DialogHandle<C>) -> DialogResult<()> + Send + Sync + 'static,
    {
        self.on_confirm = Some(Arc::new(callback));
        self
    }

    pub fn on_cancel<F>(mut self, callback: F) -> Self
    where
        F: Fn(&DialogHandle<C>) -> DialogResult<()> + Send + Sync + 'static,
    {
        self.on_cancel = Some(Arc::new(callback));
        self
    }

    /// Confirm label, falling back to `fallback` when the request sets none
    pub fn confirm_label_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.confirm_label.as_deref().unwrap_or(fallback)
    }

    /// Cancel label, falling back to `fallback` when the request sets none
    pub fn cancel_label_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.cancel_label.as_deref().unwrap_or(fallback)
    }
}

impl<C> Default for AlertDialog<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: fmt::Debug> fmt::Debug for AlertDialog<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertDialog")
            .field("title", &self.title)
            .field("description", &self.description)
            .field("content", &self.content)
            .field("confirm_label", &self.confirm_label)
            .field("cancel_label", &self.cancel_label)
            .field("on_confirm", &self.on_confirm.is_some())
            .field("on_cancel", &self.on_cancel.is_some())
            .finish()
    }
}

/// A request pushed with `open_dialog`
#[derive(Debug)]
pub enum DialogRequest<C> {
    Content(ContentDialog<C>),
    Alert(AlertDialog<C>),
}

impl<C> DialogRequest<C> {
    pub fn kind(&self) -> DialogKind {
        match self {
            Self::Content(_) => DialogKind::Content,
            Self::Alert(_) => DialogKind::Alert,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Content(dialog) => dialog.title.as_deref(),
            Self::Alert(dialog) => dialog.title.as_deref(),
        }
    }
}

impl<C> From<ContentDialog<C>> for DialogRequest<C> {
    fn from(dialog: ContentDialog<C>) -> Self {
        Self::Content(dialog)
    }
}

impl<C> From<AlertDialog<C>> for DialogRequest<C> {
    fn from(dialog: AlertDialog<C>) -> Self {
        Self::Alert(dialog)
    }
}

/// Button labels used when an alert does not carry its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogLabels {
    pub confirm: String,
    pub cancel: String,
}

impl DialogLabels {
    pub fn new(confirm: impl Into<String>, cancel: impl Into<String>) -> Self {
        Self {
            confirm: confirm.into(),
            cancel: cancel.into(),
        }
    }
}

impl Default for DialogLabels {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIRM_LABEL, DEFAULT_CANCEL_LABEL)
    }
}

/// Result type for dialog operations
pub type DialogResult<T> = std::result::Result<T, DialogError>;

/// Wiring mistakes made by callers of the controller.
///
/// The controller itself performs no I/O, so these are the only errors it
/// ever returns.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DialogError {
    #[error("dialog controller requested outside of a DialogProvider; build the DialogContext from a provider")]
    NoProvider,

    #[error("dialog controller used after its DialogProvider was dropped")]
    ProviderDropped,
}
