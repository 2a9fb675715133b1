//! Stacked dialog controller
//!
//! Components push content dialogs (forms, messages) and alert dialogs
//! (confirm/cancel) onto a single stack owned by a [`DialogProvider`]. The
//! controller resolves which dialogs are visible after every change and
//! routes alert button presses and dismissals back to the callbacks given
//! when the alert was opened.
//!
//! The controller does not render anything; the terminal layer subscribes to
//! [`DialogSnapshot`]s and draws them.

pub mod provider;
pub mod snapshot;
pub mod stack;
pub mod types;

pub use provider::{DialogContext, DialogHandle, DialogProvider};
pub use snapshot::{DialogSnapshot, VisibleDialog};
pub use types::*;
