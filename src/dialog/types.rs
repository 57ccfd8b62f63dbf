//! Core dialog types
//!
//! Identifiers, lifecycle states, events and errors shared by the dialog, the
//! registry and dialog actions.

use super::layout::Size;
use super::toolkit::{DialogHandle, ToolkitError};
use crate::backend::TransportError;
use crate::content::{ContentType, Element};
use crate::frame::{FillAction, FrameError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for dialog instances
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DialogId(pub String);

impl DialogId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Random id for dialogs configured without one
    pub fn generate() -> Self {
        Self(format!("dialog-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DialogId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DialogId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for DialogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dialog lifecycle; every instance moves forward only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DialogState {
    #[default]
    Unopened,
    /// Toolkit asked to open, waiting for its callback
    Opening,
    Open,
    Closing,
    /// Spent; cannot be opened again
    Closed,
}

impl DialogState {
    pub fn is_open(&self) -> bool {
        *self == DialogState::Open
    }

    pub fn is_closing_or_closed(&self) -> bool {
        matches!(self, DialogState::Closing | DialogState::Closed)
    }
}

/// Events emitted by a dialog
#[derive(Debug, Clone, PartialEq)]
pub enum DialogEvent {
    Open,
    Close,
    BeforeDestroy,
    Resize(Size),
    FrameUpdate {
        content: Element,
        content_type: ContentType,
        action: FillAction,
    },
    FrameCleanup,
    FrameActivated,
    FrameFail {
        url: String,
        error: TransportError,
    },
    /// A button with an `Emit` action was clicked
    Button(String),
}

impl DialogEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DialogEvent::Open => "open",
            DialogEvent::Close => "close",
            DialogEvent::BeforeDestroy => "before-destroy",
            DialogEvent::Resize(_) => "resize",
            DialogEvent::FrameUpdate { .. } => "frame-update",
            DialogEvent::FrameCleanup => "frame-cleanup",
            DialogEvent::FrameActivated => "frame-activated",
            DialogEvent::FrameFail { .. } => "frame-fail",
            DialogEvent::Button(_) => "button",
        }
    }
}

/// Where a propagated event is re-emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    /// The page, while the dialog has no window
    Document,
    /// The dialog's own window
    Dialog(DialogHandle),
}

/// A dialog event re-emitted under a `dialog-` prefixed name
#[derive(Debug, Clone, PartialEq)]
pub struct PropagatedEvent {
    pub name: String,
    pub dialog_id: DialogId,
    pub target: EventTarget,
    pub event: DialogEvent,
}

impl PropagatedEvent {
    pub fn new(dialog_id: DialogId, target: EventTarget, event: DialogEvent) -> Self {
        Self {
            name: format!("dialog-{}", event.name()),
            dialog_id,
            target,
            event,
        }
    }
}

/// Dialog usage errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DialogError {
    #[error("Dialog is already opened")]
    AlreadyOpened,

    #[error("Dialog is not opened")]
    NotOpened,

    #[error("Dialog is closed and cannot be reused")]
    Spent,

    #[error("Dialog not found: {0}")]
    NotFound(DialogId),

    #[error("Dialog already registered: {0}")]
    AlreadyExists(DialogId),

    #[error("Invalid dialog configuration: {0}")]
    InvalidConfig(String),

    #[error("Dialog action already started")]
    ActionStarted,

    #[error("Frame content holds no form")]
    NoForm,

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Toolkit(#[from] ToolkitError),
}

pub type DialogResult<T> = Result<T, DialogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let first = DialogId::generate();
        let second = DialogId::generate();
        assert_ne!(first, second);
        assert!(first.as_str().starts_with("dialog-"));
    }

    #[test]
    fn test_propagated_name() {
        let event = PropagatedEvent::new(DialogId::new("a"), EventTarget::Document, DialogEvent::BeforeDestroy);
        assert_eq!(event.name, "dialog-before-destroy");
    }
}
