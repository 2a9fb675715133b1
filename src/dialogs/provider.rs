//! Dialog provider, handles and context
//!
//! The provider owns the dialog stack for the lifetime of the application.
//! Components never reach it through a global: they receive a
//! [`DialogContext`] and ask it for a [`DialogHandle`]. Handles hold a weak
//! reference, so using one after the provider is gone is reported as
//! [`DialogError::ProviderDropped`] instead of silently doing nothing.
//!
//! Every stack change publishes a fresh [`DialogSnapshot`] on a watch
//! channel. Alert callbacks run after the state lock is released, so they
//! may call back into the controller.

use super::snapshot::DialogSnapshot;
use super::stack::DialogStack;
use super::types::{
    AlertDialog, DialogCallback, DialogError, DialogId, DialogLabels, DialogRequest, DialogResult,
};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::watch;
use tracing::{debug, warn};

struct ControllerState<C> {
    stack: DialogStack<C>,
    /// Content entry that asked for dismissal to be suppressed
    loading: Option<DialogId>,
    version: u64,
}

struct Shared<C> {
    state: Mutex<ControllerState<C>>,
    snapshots: watch::Sender<DialogSnapshot<C>>,
    labels: DialogLabels,
}

impl<C> Shared<C> {
    fn lock(&self) -> MutexGuard<'_, ControllerState<C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish the state the caller just changed; call with the lock held
    fn publish(&self, state: &mut ControllerState<C>) {
        state.version += 1;
        let snapshot = DialogSnapshot::resolve(&state.stack, state.loading, state.version, &self.labels);
        self.snapshots.send_replace(snapshot);
    }
}

/// Owner of the dialog stack
pub struct DialogProvider<C> {
    shared: Arc<Shared<C>>,
}

impl<C> DialogProvider<C> {
    /// Create a provider with an empty stack and the stock button labels
    pub fn new() -> Self {
        Self::with_labels(DialogLabels::default())
    }

    /// Create a provider whose alerts fall back to `labels`
    pub fn with_labels(labels: DialogLabels) -> Self {
        let (snapshots, _) = watch::channel(DialogSnapshot::empty(labels.clone()));

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ControllerState {
                    stack: DialogStack::new(),
                    loading: None,
                    version: 0,
                }),
                snapshots,
                labels,
            }),
        }
    }

    pub fn handle(&self) -> DialogHandle<C> {
        DialogHandle {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Context to hand to components that need to open dialogs
    pub fn context(&self) -> DialogContext<C> {
        DialogContext::new(self.handle())
    }

    pub fn snapshot(&self) -> DialogSnapshot<C> {
        self.shared.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DialogSnapshot<C>> {
        self.shared.snapshots.subscribe()
    }
}

impl<C> Default for DialogProvider<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for DialogProvider<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("DialogProvider")
            .field("depth", &state.stack.len())
            .field("version", &state.version)
            .field("loading", &state.loading)
            .finish()
    }
}

/// Cheap, cloneable access to a provider's stack
pub struct DialogHandle<C> {
    shared: Weak<Shared<C>>,
}

impl<C> Clone for DialogHandle<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<C> fmt::Debug for DialogHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogHandle")
            .field("attached", &(self.shared.strong_count() > 0))
            .finish()
    }
}

impl<C> DialogHandle<C> {
    fn shared(&self) -> DialogResult<Arc<Shared<C>>> {
        self.shared.upgrade().ok_or_else(|| {
            warn!("dialog handle used after its provider was dropped");
            DialogError::ProviderDropped
        })
    }

    /// Push a request on top of the stack
    pub fn open_dialog(&self, request: impl Into<DialogRequest<C>>) -> DialogResult<DialogId> {
        let request = request.into();
        let shared = self.shared()?;
        let mut state = shared.lock();

        let kind = request.kind();
        let title = request.title().unwrap_or_default().to_string();
        let id = state.stack.push(request);
        debug!(%id, %kind, title = %title, depth = state.stack.len(), "dialog opened");
        shared.publish(&mut state);
        Ok(id)
    }

    /// Pop the top entry; a no-op on an empty stack
    pub fn close_dialog(&self) -> DialogResult<()> {
        let shared = self.shared()?;
        let mut state = shared.lock();

        match state.stack.pop() {
            Some(id) => {
                if state.loading == Some(id) {
                    state.loading = None;
                }
                debug!(%id, depth = state.stack.len(), "dialog closed");
                shared.publish(&mut state);
            }
            None => debug!("close requested on an empty dialog stack"),
        }
        Ok(())
    }

    /// Drop every entry; a no-op on an empty stack
    pub fn hide_all_dialog(&self) -> DialogResult<()> {
        let shared = self.shared()?;
        let mut state = shared.lock();

        let removed = state.stack.clear();
        if removed > 0 {
            state.loading = None;
            debug!(removed, "all dialogs hidden");
            shared.publish(&mut state);
        }
        Ok(())
    }

    /// Ask the rendering layer to refuse outside-click/Esc dismissal of the
    /// visible content dialog.
    ///
    /// The hint sticks to that content entry: dialogs opened or closed above
    /// it leave it alone, and it goes away when the entry itself is popped,
    /// the stack is cleared, or `set_loading(false)` is called. Does nothing
    /// when no content dialog is visible.
    pub fn set_loading(&self, loading: bool) -> DialogResult<()> {
        let shared = self.shared()?;
        let mut state = shared.lock();

        let Some(content) = state.stack.visible_content() else {
            debug!(loading, "loading hint ignored, no content dialog is open");
            return Ok(());
        };
        let target = loading.then_some(content.id);
        if state.loading != target {
            state.loading = target;
            debug!(id = %content.id, loading, "dialog loading hint changed");
            shared.publish(&mut state);
        }
        Ok(())
    }

    /// Dismiss the visible content dialog (Esc, click outside).
    ///
    /// Only the absolute top of the stack may be dismissed; returns whether
    /// the dialog was closed.
    pub fn dismiss_content(&self) -> DialogResult<bool> {
        let shared = self.shared()?;
        let mut state = shared.lock();

        let Some(content) = state.stack.visible_content() else {
            return Ok(false);
        };
        if !content.on_top {
            debug!(id = %content.id, "content dismissal refused, another dialog is on top");
            return Ok(false);
        }
        if state.loading == Some(content.id) {
            debug!(id = %content.id, "content dismissal refused while loading");
            return Ok(false);
        }

        state.stack.pop();
        debug!(id = %content.id, depth = state.stack.len(), "content dialog dismissed");
        shared.publish(&mut state);
        Ok(true)
    }

    /// Dismiss the visible alert (Esc, click outside); same as cancel
    pub fn dismiss_alert(&self) -> DialogResult<()> {
        self.run_cancel("dismiss")
    }

    /// Cancel button of the visible alert: `on_cancel`, else close
    pub fn cancel_alert(&self) -> DialogResult<()> {
        self.run_cancel("cancel")
    }

    /// Confirm button of the visible alert: `on_confirm`, else hide all
    pub fn confirm_alert(&self) -> DialogResult<()> {
        let Some((id, callback)) = self.alert_callback(|alert| alert.on_confirm.clone())? else {
            return Ok(());
        };

        match callback {
            Some(on_confirm) => {
                debug!(%id, "running alert confirm callback");
                on_confirm(self)
            }
            None => self.hide_all_dialog(),
        }
    }

    fn run_cancel(&self, source: &str) -> DialogResult<()> {
        let Some((id, callback)) = self.alert_callback(|alert| alert.on_cancel.clone())? else {
            return Ok(());
        };

        match callback {
            Some(on_cancel) => {
                debug!(%id, source, "running alert cancel callback");
                on_cancel(self)
            }
            None => self.close_dialog(),
        }
    }

    /// Look up a callback of the visible alert, releasing the lock before
    /// returning so the callback can re-enter the controller
    fn alert_callback<F>(&self, select: F) -> DialogResult<Option<(DialogId, Option<DialogCallback<C>>)>>
    where
        F: FnOnce(&AlertDialog<C>) -> Option<DialogCallback<C>>,
    {
        let shared = self.shared()?;
        let state = shared.lock();

        match state.stack.visible_alert() {
            Some(alert) => Ok(Some((alert.id, select(&alert.dialog)))),
            None => {
                debug!("alert action with no visible alert");
                Ok(None)
            }
        }
    }

}

/// What components receive instead of reaching for a global controller
pub struct DialogContext<C> {
    dialogs: Option<DialogHandle<C>>,
}

impl<C> DialogContext<C> {
    pub fn new(handle: DialogHandle<C>) -> Self {
        Self {
            dialogs: Some(handle),
        }
    }

    /// A context with no provider installed
    #[cfg(test)]
    pub fn empty() -> Self {
        Self { dialogs: None }
    }

    /// The dialog controller, or a usage error if none was installed
    pub fn dialogs(&self) -> DialogResult<&DialogHandle<C>> {
        self.dialogs.as_ref().ok_or_else(|| {
            warn!("dialog controller requested from a context without a provider");
            DialogError::NoProvider
        })
    }
}

impl<C> Clone for DialogContext<C> {
    fn clone(&self) -> Self {
        Self {
            dialogs: self.dialogs.clone(),
        }
    }
}

impl<C> fmt::Debug for DialogContext<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogContext")
            .field("dialogs", &self.dialogs)
            .finish()
    }
}
