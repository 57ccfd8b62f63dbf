//! One-shot "show a dialog and wait for it" action

use super::{Dialog, DialogError, DialogEvent, DialogResult, DialogServices};
use crate::config::{DialogOptions, DialogPatch};
use crate::events::Listener;
use tokio::sync::oneshot;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    Ready,
    Running,
    /// The dialog closed; the action cannot run again
    Done,
}

/// Closes the dialog of a running action from elsewhere
#[derive(Debug)]
pub struct CancelHandle {
    tx: oneshot::Sender<()>,
}

impl CancelHandle {
    /// Returns false when the action already finished
    pub fn cancel(self) -> bool {
        self.tx.send(()).is_ok()
    }
}

/// Builds a dialog, opens it and completes when it closes.
///
/// Closing is the only completion signal: `on_done` listeners run exactly
/// once, whether the dialog was closed by the user or through a
/// [`CancelHandle`].
pub struct DialogAction {
    options: DialogOptions,
    services: DialogServices,
    listeners: Vec<Listener<DialogEvent>>,
    done_listeners: Vec<Box<dyn FnOnce() + Send>>,
    status: ActionStatus,
    dialog: Option<Dialog>,
    cancel_tx: Option<oneshot::Sender<()>>,
    cancel_rx: Option<oneshot::Receiver<()>>,
}

impl DialogAction {
    pub fn new(options: DialogOptions, services: DialogServices) -> Self {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        Self {
            options,
            services,
            listeners: Vec::new(),
            done_listeners: Vec::new(),
            status: ActionStatus::Ready,
            dialog: None,
            cancel_tx: Some(cancel_tx),
            cancel_rx: Some(cancel_rx),
        }
    }

    /// Listener attached to the dialog once it is built
    pub fn on<F>(&mut self, listener: F)
    where
        F: FnMut(&DialogEvent) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn on_done<F>(&mut self, listener: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.done_listeners.push(Box::new(listener));
    }

    pub fn status(&self) -> ActionStatus {
        self.status
    }

    /// The dialog, once the action has finished
    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    /// Handle to cancel the action; only one can be taken
    pub fn canceller(&mut self) -> Option<CancelHandle> {
        self.cancel_tx.take().map(|tx| CancelHandle { tx })
    }

    /// Open the dialog and wait until it closes
    pub async fn run(&mut self, patch: Option<DialogPatch>) -> DialogResult<()> {
        if self.status != ActionStatus::Ready {
            return Err(DialogError::ActionStarted);
        }

        let mut dialog = Dialog::new(self.options.clone(), self.services.clone())?;

        for listener in self.listeners.drain(..) {
            dialog.on(listener);
        }

        let mut done = Some(std::mem::take(&mut self.done_listeners));
        dialog.on(move |event| {
            if *event == DialogEvent::Close {
                for listener in done.take().into_iter().flatten() {
                    listener();
                }
            }
        });

        dialog.open(patch)?;
        self.status = ActionStatus::Running;
        debug!(dialog = %dialog.id(), "dialog action running");

        let cancel_rx = self.cancel_rx.take();
        let cancelled = async move {
            let requested = match cancel_rx {
                Some(rx) => rx.await.is_ok(),
                None => false,
            };
            // No canceller left: only the dialog can finish the action
            if !requested {
                std::future::pending::<()>().await;
            }
        };

        let result = tokio::select! {
            result = dialog.run_until_closed() => result,
            _ = cancelled => dialog.close(),
        };

        self.dialog = Some(dialog);
        self.status = ActionStatus::Done;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::{DialogId, DialogState, HeadlessToolkit};
    use crate::testing::MockBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn action(id: &str) -> (DialogAction, Arc<HeadlessToolkit>) {
        let toolkit = Arc::new(HeadlessToolkit::new());
        let services = DialogServices::new(Arc::new(MockBackend::new()), toolkit.clone());
        (DialogAction::new(DialogOptions::new().with_id(id), services), toolkit)
    }

    async fn click_when_open(toolkit: Arc<HeadlessToolkit>, id: &str, button: &str) {
        let id = DialogId::new(id);
        loop {
            if let Some((handle, _)) = toolkit.window_of(&id) {
                toolkit.click(handle, button).unwrap();
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_completes_when_dialog_closes() {
        let (mut action, toolkit) = action("action");
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&names);
        action.on(move |event| sink.lock().unwrap().push(event.name()));

        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        action.on_done(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let (result, _) = tokio::join!(action.run(None), click_when_open(toolkit.clone(), "action", "close"));

        result.unwrap();
        assert_eq!(action.status(), ActionStatus::Done);
        assert_eq!(action.dialog().unwrap().state(), DialogState::Closed);
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert_eq!(names.lock().unwrap().first(), Some(&"open"));
        assert_eq!(names.lock().unwrap().last(), Some(&"close"));
        assert_eq!(toolkit.open_windows(), 0);
    }

    #[tokio::test]
    async fn test_cancel_closes_dialog() {
        let (mut action, toolkit) = action("cancelled");
        let cancel = action.canceller().unwrap();
        assert!(action.canceller().is_none());

        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        action.on_done(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let canceller = async move {
            tokio::task::yield_now().await;
            assert!(cancel.cancel());
        };
        let (result, _) = tokio::join!(action.run(None), canceller);

        result.unwrap();
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert_eq!(toolkit.open_windows(), 0);
    }

    #[tokio::test]
    async fn test_cancel_while_opening_leaves_no_window() {
        let toolkit = Arc::new(HeadlessToolkit::holding_open());
        let services = DialogServices::new(Arc::new(MockBackend::new()), toolkit.clone());
        let mut action = DialogAction::new(DialogOptions::new().with_id("slow-open"), services);
        let cancel = action.canceller().unwrap();

        let canceller = async move {
            tokio::task::yield_now().await;
            assert!(cancel.cancel());
        };
        let (result, _) = tokio::join!(action.run(None), canceller);
        result.unwrap();
        assert_eq!(toolkit.open_windows(), 0);

        toolkit.release_open();
        tokio::task::yield_now().await;

        assert_eq!(action.status(), ActionStatus::Done);
        assert_eq!(action.dialog().unwrap().state(), DialogState::Closed);
        assert_eq!(toolkit.open_windows(), 0);
    }

    #[tokio::test]
    async fn test_runs_only_once() {
        let (mut action, toolkit) = action("once");
        let (result, _) = tokio::join!(action.run(None), click_when_open(toolkit, "once", "close"));
        result.unwrap();

        assert_eq!(action.run(None).await, Err(DialogError::ActionStarted));
    }
}
