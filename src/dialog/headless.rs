//! In-process toolkit that keeps window state in memory
//!
//! Used by the command line and by tests. Windows are plain records, and the
//! callbacks a real toolkit would fire on user input are triggered through
//! [`HeadlessToolkit::click`], [`HeadlessToolkit::request_close`] and friends.

use super::buttons::Button;
use super::layout::{Point, ResizePlan, Size};
use super::toolkit::{
    DialogHandle, Measurement, ModalToolkit, ScrollPosition, ToolkitError, ToolkitEvent, ToolkitRequest,
    ToolkitResult, ToolkitSender,
};
use super::types::DialogId;
use crate::content::Element;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// State of one headless window
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessWindow {
    pub dialog_id: DialogId,
    pub title: String,
    pub modal: bool,
    pub buttons: Vec<Button>,
    pub size: Size,
    pub position: Point,
    pub content: Element,
    pub close_on_escape: bool,
    pub last_plan: Option<ResizePlan>,
}

#[derive(Default)]
struct HeadlessState {
    windows: HashMap<DialogHandle, HeadlessWindow>,
    senders: HashMap<DialogHandle, ToolkitSender>,
    held: Vec<DialogHandle>,
    hold_open: bool,
    next_handle: u64,
    scroll: ScrollPosition,
    background_locked: bool,
    measurement: Measurement,
    destroyed: Vec<DialogHandle>,
}

#[derive(Default)]
pub struct HeadlessToolkit {
    state: Mutex<HeadlessState>,
}

impl HeadlessToolkit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toolkit that delays every `Opened` callback until [`Self::release_open`]
    pub fn holding_open() -> Self {
        let toolkit = Self::default();
        toolkit.lock().hold_open = true;
        toolkit
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fire the held `Opened` callbacks
    pub fn release_open(&self) {
        let mut state = self.lock();
        state.hold_open = false;
        let held = std::mem::take(&mut state.held);
        for handle in held {
            if let Some(sender) = state.senders.get(&handle) {
                let _ = sender.send(ToolkitEvent::Opened(handle));
            }
        }
    }

    pub fn window(&self, handle: DialogHandle) -> Option<HeadlessWindow> {
        self.lock().windows.get(&handle).cloned()
    }

    /// The open window of a dialog, if any
    pub fn window_of(&self, dialog_id: &DialogId) -> Option<(DialogHandle, HeadlessWindow)> {
        self.lock()
            .windows
            .iter()
            .find(|(_, window)| &window.dialog_id == dialog_id)
            .map(|(handle, window)| (*handle, window.clone()))
    }

    pub fn open_windows(&self) -> usize {
        self.lock().windows.len()
    }

    pub fn destroyed(&self) -> Vec<DialogHandle> {
        self.lock().destroyed.clone()
    }

    pub fn is_background_locked(&self) -> bool {
        self.lock().background_locked
    }

    /// Size reported by the next [`ModalToolkit::measure`] calls
    pub fn set_measurement(&self, measurement: Measurement) {
        self.lock().measurement = measurement;
    }

    /// Simulate the user scrolling the page
    pub fn scroll_to(&self, position: ScrollPosition) {
        self.lock().scroll = position;
    }

    pub fn click(&self, handle: DialogHandle, button: &str) -> ToolkitResult<()> {
        self.send(handle, ToolkitEvent::ButtonClicked(button.to_string()))
    }

    /// Escape key or title bar close icon
    pub fn request_close(&self, handle: DialogHandle) -> ToolkitResult<()> {
        let close_on_escape = self
            .window(handle)
            .map(|window| window.close_on_escape)
            .ok_or(ToolkitError::UnknownWindow(handle))?;

        if close_on_escape {
            self.send(handle, ToolkitEvent::CloseRequested)
        } else {
            Ok(())
        }
    }

    /// Simulate an interactive resize
    pub fn resize_to(&self, handle: DialogHandle, size: Size) -> ToolkitResult<()> {
        self.with_window(handle, |window| window.size = size)?;
        self.send(handle, ToolkitEvent::Resized(size))?;
        self.send(handle, ToolkitEvent::ResizeStop(size))
    }

    /// Simulate dragging the window
    pub fn drag_to(&self, handle: DialogHandle, position: Point) -> ToolkitResult<()> {
        self.with_window(handle, |window| window.position = position)?;
        self.send(handle, ToolkitEvent::DragStop(position))
    }

    fn send(&self, handle: DialogHandle, event: ToolkitEvent) -> ToolkitResult<()> {
        let state = self.lock();
        let sender = state
            .senders
            .get(&handle)
            .ok_or(ToolkitError::UnknownWindow(handle))?;
        sender
            .send(event)
            .map_err(|_| ToolkitError::Failed(format!("{handle} no longer listens")))
    }

    fn with_window<F>(&self, handle: DialogHandle, update: F) -> ToolkitResult<()>
    where
        F: FnOnce(&mut HeadlessWindow),
    {
        let mut state = self.lock();
        let window = state
            .windows
            .get_mut(&handle)
            .ok_or(ToolkitError::UnknownWindow(handle))?;
        update(window);
        Ok(())
    }
}

impl ModalToolkit for HeadlessToolkit {
    fn open(&self, request: ToolkitRequest, events: ToolkitSender) -> ToolkitResult<DialogHandle> {
        let mut state = self.lock();
        let handle = DialogHandle(state.next_handle);
        state.next_handle += 1;

        debug!(%handle, dialog = %request.dialog_id, "headless window created");

        state.windows.insert(
            handle,
            HeadlessWindow {
                dialog_id: request.dialog_id,
                title: request.title,
                modal: request.modal,
                buttons: request.buttons,
                size: request.size,
                position: request.position,
                content: request.content,
                close_on_escape: request.close_on_escape,
                last_plan: None,
            },
        );

        if state.hold_open {
            state.held.push(handle);
        } else {
            let _ = events.send(ToolkitEvent::Opened(handle));
        }
        state.senders.insert(handle, events);

        Ok(handle)
    }

    fn set_title(&self, handle: DialogHandle, title: &str) -> ToolkitResult<()> {
        self.with_window(handle, |window| window.title = title.to_string())
    }

    fn set_buttons(&self, handle: DialogHandle, buttons: &[Button]) -> ToolkitResult<()> {
        self.with_window(handle, |window| window.buttons = buttons.to_vec())
    }

    fn set_content(&self, handle: DialogHandle, content: &Element) -> ToolkitResult<()> {
        self.with_window(handle, |window| window.content = content.clone())
    }

    fn resize(&self, handle: DialogHandle, plan: &ResizePlan) -> ToolkitResult<()> {
        self.with_window(handle, |window| {
            window.size = plan.size;
            window.last_plan = Some(*plan);
        })
    }

    fn reposition(&self, handle: DialogHandle, position: Point) -> ToolkitResult<()> {
        self.with_window(handle, |window| window.position = position)
    }

    fn measure(&self, handle: DialogHandle) -> ToolkitResult<Measurement> {
        let state = self.lock();
        if !state.windows.contains_key(&handle) {
            return Err(ToolkitError::UnknownWindow(handle));
        }
        Ok(state.measurement)
    }

    fn destroy(&self, handle: DialogHandle) -> ToolkitResult<()> {
        let mut state = self.lock();
        state
            .windows
            .remove(&handle)
            .ok_or(ToolkitError::UnknownWindow(handle))?;
        state.senders.remove(&handle);
        state.held.retain(|held| *held != handle);
        state.destroyed.push(handle);
        Ok(())
    }

    fn scroll_position(&self) -> ScrollPosition {
        self.lock().scroll
    }

    fn restore_scroll(&self, position: ScrollPosition) {
        self.lock().scroll = position;
    }

    fn lock_background(&self, locked: bool) {
        self.lock().background_locked = locked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::layout::{Position, SizeLimits};
    use tokio::sync::mpsc;

    fn request(id: &str) -> ToolkitRequest {
        ToolkitRequest {
            dialog_id: DialogId::new(id),
            title: "Title".to_string(),
            modal: true,
            resizable: true,
            draggable: true,
            size: Size::new(640, 350),
            limits: SizeLimits::unbounded(Size::new(200, 150)),
            position: Point::default(),
            requested_position: Position::Center,
            buttons: Vec::new(),
            close_on_escape: false,
            content: Element::empty(),
        }
    }

    #[test]
    fn test_open_reports_handle() {
        let toolkit = HeadlessToolkit::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let opened = toolkit.open(request("a"), tx).unwrap();

        let (handle, window) = toolkit.window_of(&DialogId::new("a")).unwrap();
        assert_eq!(handle, opened);
        assert_eq!(rx.try_recv().unwrap(), ToolkitEvent::Opened(handle));
        assert_eq!(window.title, "Title");
    }

    #[test]
    fn test_holding_open_until_released() {
        let toolkit = HeadlessToolkit::holding_open();
        let (tx, mut rx) = mpsc::unbounded_channel();

        toolkit.open(request("a"), tx).unwrap();
        assert!(rx.try_recv().is_err());

        toolkit.release_open();
        assert!(matches!(rx.try_recv(), Ok(ToolkitEvent::Opened(_))));
    }

    #[test]
    fn test_destroy_cancels_held_open() {
        let toolkit = HeadlessToolkit::holding_open();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = toolkit.open(request("a"), tx).unwrap();
        toolkit.destroy(handle).unwrap();
        toolkit.release_open();

        assert!(rx.try_recv().is_err());
        assert_eq!(toolkit.open_windows(), 0);
    }

    #[test]
    fn test_escape_ignored_unless_enabled() {
        let toolkit = HeadlessToolkit::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        toolkit.open(request("a"), tx).unwrap();
        let (handle, _) = toolkit.window_of(&DialogId::new("a")).unwrap();
        rx.try_recv().unwrap();

        toolkit.request_close(handle).unwrap();
        assert!(rx.try_recv().is_err());

        toolkit.destroy(handle).unwrap();
        assert_eq!(
            toolkit.request_close(handle),
            Err(ToolkitError::UnknownWindow(handle))
        );
        assert_eq!(toolkit.destroyed(), vec![handle]);
    }
}
