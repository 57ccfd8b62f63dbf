//! Seam to the modal windowing toolkit
//!
//! The dialog hands a [`ToolkitRequest`] to a [`ModalToolkit`] which renders
//! the window and reports back through a [`ToolkitSender`]. Callbacks never
//! re-enter the dialog directly; they are drained by the dialog's event loop.

use super::buttons::Button;
use super::layout::{Point, Position, ResizePlan, Size, SizeLimits};
use super::types::DialogId;
use crate::content::Element;
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc;

/// Toolkit-side identity of an open window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialogHandle(pub u64);

impl fmt::Display for DialogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollPosition {
    pub top: i64,
    pub left: i64,
}

/// Rendered size of the frame content and of the window chrome around it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Measurement {
    pub content: Size,
    pub chrome: Size,
}

/// Everything the toolkit needs to render a dialog window
#[derive(Debug, Clone, PartialEq)]
pub struct ToolkitRequest {
    pub dialog_id: DialogId,
    pub title: String,
    pub modal: bool,
    pub resizable: bool,
    pub draggable: bool,
    pub size: Size,
    pub limits: SizeLimits,
    pub position: Point,
    pub requested_position: Position,
    pub buttons: Vec<Button>,
    pub close_on_escape: bool,
    pub content: Element,
}

/// Callbacks from the toolkit
#[derive(Debug, Clone, PartialEq)]
pub enum ToolkitEvent {
    Opened(DialogHandle),
    Resized(Size),
    ResizeStop(Size),
    DragStop(Point),
    ButtonClicked(String),
    /// Escape pressed or the title bar close icon used
    CloseRequested,
}

pub type ToolkitSender = mpsc::UnboundedSender<ToolkitEvent>;
pub type ToolkitReceiver = mpsc::UnboundedReceiver<ToolkitEvent>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolkitError {
    #[error("Unknown window: {0}")]
    UnknownWindow(DialogHandle),

    #[error("Toolkit failure: {0}")]
    Failed(String),
}

pub type ToolkitResult<T> = Result<T, ToolkitError>;

/// Modal windowing toolkit
pub trait ModalToolkit: Send + Sync {
    /// Create the window. `Opened` is reported through `events` once it is up;
    /// destroying the returned handle before that cancels the pending open.
    fn open(&self, request: ToolkitRequest, events: ToolkitSender) -> ToolkitResult<DialogHandle>;

    fn set_title(&self, handle: DialogHandle, title: &str) -> ToolkitResult<()>;

    fn set_buttons(&self, handle: DialogHandle, buttons: &[Button]) -> ToolkitResult<()>;

    fn set_content(&self, handle: DialogHandle, content: &Element) -> ToolkitResult<()>;

    fn resize(&self, handle: DialogHandle, plan: &ResizePlan) -> ToolkitResult<()>;

    fn reposition(&self, handle: DialogHandle, position: Point) -> ToolkitResult<()>;

    fn measure(&self, handle: DialogHandle) -> ToolkitResult<Measurement>;

    fn destroy(&self, handle: DialogHandle) -> ToolkitResult<()>;

    /// Page scroll, used to restore it after closing
    fn scroll_position(&self) -> ScrollPosition;

    fn restore_scroll(&self, position: ScrollPosition);

    /// Lock page scroll and dim the background behind a dialog
    fn lock_background(&self, locked: bool);
}
