//! Modal dialogs hosting a content frame
//!
//! A [`Dialog`] walks `Unopened -> Opening -> Open -> Closing -> Closed` and is
//! spent once closed. It owns a [`Frame`], renders through a [`ModalToolkit`]
//! and keeps its queries in flight itself, so network results, toolkit
//! callbacks and `close()` are interleaved on the task driving the dialog
//! through [`Dialog::run_until_closed`] or [`Dialog::run_until_idle`].

pub mod action;
pub mod activation;
pub mod buttons;
pub mod headless;
pub mod layout;
pub mod manager;
pub mod toolkit;
pub mod types;

pub use action::{ActionStatus, CancelHandle, DialogAction};
pub use buttons::{derive_buttons, Button, ButtonAction};
pub use headless::HeadlessToolkit;
pub use layout::{Point, Position, Size, SizeLimits, Viewport};
pub use manager::DialogRegistry;
pub use toolkit::{DialogHandle, ModalToolkit, ToolkitError, ToolkitEvent, ToolkitRequest};
pub use types::{DialogError, DialogEvent, DialogId, DialogResult, DialogState, EventTarget, PropagatedEvent};

use crate::backend::{Backend, Form, QueryData, RequestOptions, StatusCatalog};
use crate::config::{DialogOptions, DialogPatch, ScrollMode};
use crate::content::html::decode_entities;
use crate::content::{Element, RawContent};
use crate::events::{Emitter, ListenerId};
use crate::frame::{
    Delegate, FillAction, Frame, FrameEvent, FrameOptions, InertRegistry, PendingQuery, QueryCompletion,
    QueryOutcome, WidgetRegistry,
};
use activation::{transition, ActivationEffect, ActivationInput, ActivationState};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use layout::{place, plan_fit, plan_resize};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use toolkit::{ScrollPosition, ToolkitReceiver, ToolkitSender};
use tracing::{debug, warn};

/// Collaborators shared by the dialogs of one page
#[derive(Clone)]
pub struct DialogServices {
    pub backend: Arc<dyn Backend>,
    pub registry: Arc<dyn WidgetRegistry>,
    pub toolkit: Arc<dyn ModalToolkit>,
    /// Page-level bus receiving propagated events
    pub bus: Option<broadcast::Sender<PropagatedEvent>>,
    pub status_catalog: StatusCatalog,
}

impl DialogServices {
    pub fn new(backend: Arc<dyn Backend>, toolkit: Arc<dyn ModalToolkit>) -> Self {
        Self {
            backend,
            registry: Arc::new(InertRegistry),
            toolkit,
            bus: None,
            status_catalog: StatusCatalog::default(),
        }
    }

    pub fn with_registry(mut self, registry: Arc<dyn WidgetRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_bus(mut self, bus: broadcast::Sender<PropagatedEvent>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn with_status_catalog(mut self, status_catalog: StatusCatalog) -> Self {
        self.status_catalog = status_catalog;
        self
    }
}

/// Result of in-flight work driven by the dialog
enum Work {
    Completed(QueryCompletion),
    /// The overlay delay elapsed before the query finished
    LoadingDue(PendingQuery),
}

pub struct Dialog {
    id: DialogId,
    options: DialogOptions,
    services: DialogServices,
    frame: Frame,
    frame_rx: mpsc::UnboundedReceiver<FrameEvent>,
    toolkit_tx: ToolkitSender,
    toolkit_rx: ToolkitReceiver,
    handle: Option<DialogHandle>,
    /// Window requested from the toolkit whose open callback has not run yet
    pending_open: Option<DialogHandle>,
    state: DialogState,
    activation: ActivationState,
    scrollback: Option<ScrollPosition>,
    background_locked: bool,
    source_requested: bool,
    content_received: bool,
    title: String,
    buttons: Vec<Button>,
    size: Size,
    position: Point,
    limits: SizeLimits,
    events: Emitter<DialogEvent>,
    inflight: FuturesUnordered<BoxFuture<'static, Work>>,
}

impl Dialog {
    pub fn new(options: DialogOptions, services: DialogServices) -> DialogResult<Self> {
        options.validate()?;

        let id = options
            .id
            .clone()
            .map(DialogId::from)
            .unwrap_or_else(DialogId::generate);

        let mut frame = Frame::with_options(
            Arc::clone(&services.backend),
            Arc::clone(&services.registry),
            dialog_frame_options(&options, &services),
        );
        frame.bind(Delegate::new(format!("{id}-frame")))?;

        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        frame.on(move |event| {
            let _ = frame_tx.send(event.clone());
        });

        let (toolkit_tx, toolkit_rx) = mpsc::unbounded_channel();
        let limits = options.size_limits();
        let size = limits.clamp(Size::new(options.width, options.height));
        let title = options.title.as_deref().map(decode_entities).unwrap_or_default();
        let buttons = derive_buttons(&options.buttons, &[], &options.close_label);

        debug!(dialog = %id, "dialog created");

        Ok(Self {
            id,
            options,
            services,
            frame,
            frame_rx,
            toolkit_tx,
            toolkit_rx,
            handle: None,
            pending_open: None,
            state: DialogState::Unopened,
            activation: ActivationState::Idle,
            scrollback: None,
            background_locked: false,
            source_requested: false,
            content_received: false,
            title,
            buttons,
            size,
            position: Point::default(),
            limits,
            events: Emitter::new(),
            inflight: FuturesUnordered::new(),
        })
    }

    pub fn id(&self) -> &DialogId {
        &self.id
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn handle(&self) -> Option<DialogHandle> {
        self.handle
    }

    pub fn options(&self) -> &DialogOptions {
        &self.options
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_content_activated(&self) -> bool {
        self.activation == ActivationState::Activated
    }

    /// Number of queries still in flight
    pub fn pending_queries(&self) -> usize {
        self.inflight.len()
    }

    pub fn on<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&DialogEvent) + Send + 'static,
    {
        self.events.on(listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    /// Ask the toolkit to open the window, with `patch` merged over the options
    pub fn open(&mut self, patch: Option<DialogPatch>) -> DialogResult<()> {
        match self.state {
            DialogState::Unopened => {}
            DialogState::Opening | DialogState::Open => return Err(DialogError::AlreadyOpened),
            DialogState::Closing | DialogState::Closed => return Err(DialogError::Spent),
        }

        if let Some(patch) = patch {
            let mut merged = self.options.clone();
            merged.merge(patch);
            merged.validate()?;
            *self.frame.options_mut() = dialog_frame_options(&merged, &self.services);
            if let Some(title) = &merged.title {
                self.title = decode_entities(title);
            }
            self.options = merged;
        }

        self.limits = self.options.size_limits();
        self.size = self
            .limits
            .clamp(Size::new(self.options.width, self.options.height));
        self.position = place(self.size, &self.options.position, self.options.within.as_ref());

        let content = self.frame_content();
        self.refresh_chrome(&content)?;

        let request = ToolkitRequest {
            dialog_id: self.id.clone(),
            title: self.title.clone(),
            modal: self.options.modal,
            resizable: self.options.resizable,
            draggable: self.options.draggable,
            size: self.size,
            limits: self.limits,
            position: self.position,
            requested_position: self.options.position,
            buttons: self.buttons.clone(),
            close_on_escape: self.options.close_on_escape,
            content,
        };

        let pending = self.services.toolkit.open(request, self.toolkit_tx.clone())?;
        self.pending_open = Some(pending);
        self.state = DialogState::Opening;
        debug!(dialog = %self.id, "dialog opening");

        Ok(())
    }

    /// Tear the dialog down. Closing twice is a no-op; the instance is spent.
    pub fn close(&mut self) -> DialogResult<()> {
        match self.state {
            DialogState::Unopened => return Err(DialogError::NotOpened),
            DialogState::Closing | DialogState::Closed => return Ok(()),
            DialogState::Opening | DialogState::Open => {}
        }

        debug!(dialog = %self.id, "dialog closing");
        self.state = DialogState::Closing;
        self.activation = transition(self.activation, ActivationInput::Closing).0;
        self.inflight = FuturesUnordered::new();

        self.frame.clear()?;
        self.pump_frame_events()?;
        self.emit(DialogEvent::BeforeDestroy);

        if let Some(handle) = self.handle.take().or_else(|| self.pending_open.take()) {
            if let Err(e) = self.services.toolkit.destroy(handle) {
                warn!(dialog = %self.id, "Failed to destroy window: {}", e);
            }
        }

        if self.background_locked {
            self.services.toolkit.lock_background(false);
            self.background_locked = false;
        }

        if let Some(position) = self.scrollback.take() {
            self.services.toolkit.restore_scroll(position);
        }

        self.state = DialogState::Closed;
        self.emit(DialogEvent::Close);

        Ok(())
    }

    /// Fetch `url` into the frame and wait for it
    pub async fn fetch(&mut self, url: &str) -> DialogResult<QueryOutcome> {
        self.fetch_with(url, Vec::new(), RequestOptions::default()).await
    }

    pub async fn fetch_with(
        &mut self,
        url: &str,
        data: QueryData,
        options: RequestOptions,
    ) -> DialogResult<QueryOutcome> {
        self.ensure_not_closed()?;
        let outcome = self.frame.fetch(url, data, options).await?;
        self.pump_frame_events()?;
        Ok(outcome)
    }

    /// Queue a fetch driven by the event loop
    pub fn start_fetch(&mut self, url: &str, data: QueryData, options: RequestOptions) -> DialogResult<()> {
        self.ensure_not_closed()?;
        let pending = self.frame.start_fetch(url, data, options)?;
        self.enqueue(pending);
        Ok(())
    }

    pub async fn submit(
        &mut self,
        url: Option<&str>,
        form: Form,
        options: RequestOptions,
    ) -> DialogResult<QueryOutcome> {
        self.ensure_not_closed()?;
        let outcome = self.frame.submit(url, form, options).await?;
        self.pump_frame_events()?;
        Ok(outcome)
    }

    /// Submit the first form of the frame content to its own action
    pub async fn submit_form(&mut self) -> DialogResult<QueryOutcome> {
        let form = self.frame_content().form().ok_or(DialogError::NoForm)?;
        self.submit(None, form, RequestOptions::default()).await
    }

    pub fn fill(&mut self, data: impl Into<RawContent>) -> DialogResult<bool> {
        self.ensure_not_closed()?;
        let filled = self.frame.fill(data, FillAction::Fill)?;
        self.pump_frame_events()?;
        Ok(filled)
    }

    pub fn clear(&mut self) -> DialogResult<bool> {
        self.fill("")
    }

    /// Set the title; HTML entities are decoded
    pub fn set_title(&mut self, title: &str) -> DialogResult<()> {
        self.title = decode_entities(title);
        if let Some(handle) = self.handle {
            self.services.toolkit.set_title(handle, &self.title)?;
        }
        Ok(())
    }

    /// Resize to `requested`, clamped to the size limits
    pub fn resize(&mut self, requested: Size) -> DialogResult<Size> {
        let handle = self.handle.ok_or(DialogError::NotOpened)?;
        let frame_height = self.services.toolkit.measure(handle)?.content.height;
        let plan = plan_resize(requested, &self.limits, self.options.shrink, frame_height);

        self.services.toolkit.resize(handle, &plan)?;
        self.size = plan.size;
        self.emit(DialogEvent::Resize(self.size));

        Ok(self.size)
    }

    /// Resize to the rendered content, then place the window again
    pub fn fit_to_frame_size(&mut self) -> DialogResult<Size> {
        let handle = self.handle.ok_or(DialogError::NotOpened)?;
        let measurement = self.services.toolkit.measure(handle)?;
        let plan = plan_fit(measurement.content, measurement.chrome, &self.limits, self.options.shrink);

        self.services.toolkit.resize(handle, &plan)?;
        self.size = plan.size;
        self.position = place(self.size, &self.options.position, self.options.within.as_ref());
        self.services.toolkit.reposition(handle, self.position)?;
        self.emit(DialogEvent::Resize(self.size));

        Ok(self.size)
    }

    /// Apply a toolkit callback
    pub fn handle_toolkit_event(&mut self, event: ToolkitEvent) -> DialogResult<()> {
        match event {
            ToolkitEvent::Opened(handle) => self.on_opened(handle),
            ToolkitEvent::Resized(size) => {
                if self.state.is_open() {
                    self.size = self.limits.clamp(size);
                    self.emit(DialogEvent::Resize(self.size));
                }
                Ok(())
            }
            ToolkitEvent::ResizeStop(size) => {
                if self.state.is_open() {
                    self.resize(size)?;
                }
                Ok(())
            }
            ToolkitEvent::DragStop(position) => {
                self.position = position;
                Ok(())
            }
            ToolkitEvent::ButtonClicked(name) => self.on_button(&name),
            ToolkitEvent::CloseRequested => {
                if self.options.close_on_escape {
                    self.close()?;
                }
                Ok(())
            }
        }
    }

    /// Apply every toolkit callback already queued
    pub fn process_toolkit_events(&mut self) -> DialogResult<()> {
        while let Ok(event) = self.toolkit_rx.try_recv() {
            self.handle_toolkit_event(event)?;
        }
        Ok(())
    }

    /// Drive callbacks and queries until the dialog is closed
    pub async fn run_until_closed(&mut self) -> DialogResult<()> {
        if self.state == DialogState::Unopened {
            return Err(DialogError::NotOpened);
        }

        while self.state != DialogState::Closed {
            tokio::select! {
                Some(event) = self.toolkit_rx.recv() => self.handle_toolkit_event(event)?,
                Some(work) = self.inflight.next(), if !self.inflight.is_empty() => self.process_work(work)?,
                else => break,
            }
        }

        Ok(())
    }

    /// Drive queued callbacks and in-flight queries until nothing is left
    pub async fn run_until_idle(&mut self) -> DialogResult<()> {
        loop {
            self.process_toolkit_events()?;

            match self.inflight.next().await {
                Some(work) => self.process_work(work)?,
                None => break,
            }
        }

        Ok(())
    }

    fn ensure_not_closed(&self) -> DialogResult<()> {
        if self.state.is_closing_or_closed() {
            Err(DialogError::Spent)
        } else {
            Ok(())
        }
    }

    fn frame_content(&self) -> Element {
        self.frame
            .delegate()
            .map(|delegate| delegate.content().clone())
            .unwrap_or_default()
    }

    fn enqueue(&mut self, pending: PendingQuery) {
        let delay = self.options.overlay_delay();

        if delay.is_zero() {
            self.frame.show_loading();
            self.inflight.push(pending.map(Work::Completed).boxed());
            return;
        }

        self.inflight.push(
            async move {
                let mut pending = pending;
                tokio::select! {
                    completion = &mut pending => Work::Completed(completion),
                    _ = tokio::time::sleep(delay) => Work::LoadingDue(pending),
                }
            }
            .boxed(),
        );
    }

    fn process_work(&mut self, work: Work) -> DialogResult<()> {
        if self.state.is_closing_or_closed() {
            return Ok(());
        }

        match work {
            Work::Completed(completion) => {
                self.frame.complete(completion)?;
                self.pump_frame_events()
            }
            Work::LoadingDue(pending) => {
                self.frame.show_loading();
                self.inflight.push(pending.map(Work::Completed).boxed());
                Ok(())
            }
        }
    }

    fn pump_frame_events(&mut self) -> DialogResult<()> {
        while let Ok(event) = self.frame_rx.try_recv() {
            self.handle_frame_event(event)?;
        }
        Ok(())
    }

    fn handle_frame_event(&mut self, event: FrameEvent) -> DialogResult<()> {
        match event {
            FrameEvent::Cleanup { .. } => {
                self.emit(DialogEvent::FrameCleanup);
                Ok(())
            }
            FrameEvent::Update {
                content,
                content_type,
                action,
            } => self.on_frame_update(content, content_type, action),
            FrameEvent::FetchFail { url, error } | FrameEvent::SubmitFail { url, error } => {
                if self.options.fit_frame && self.state.is_open() {
                    self.fit_to_frame_size()?;
                }
                self.emit(DialogEvent::FrameFail { url, error });
                Ok(())
            }
            FrameEvent::FetchDone { url, .. } | FrameEvent::SubmitDone { url, .. } => {
                debug!(dialog = %self.id, %url, "frame query done");
                Ok(())
            }
        }
    }

    fn on_frame_update(
        &mut self,
        content: Element,
        content_type: crate::content::ContentType,
        action: FillAction,
    ) -> DialogResult<()> {
        self.content_received = true;
        let open = self.state.is_open();

        if let (true, Some(handle)) = (open, self.handle) {
            self.services.toolkit.set_content(handle, &content)?;
        }

        self.emit(DialogEvent::FrameUpdate {
            content,
            content_type,
            action,
        });

        self.apply_activation(ActivationInput::ContentUpdated { open })
    }

    fn on_opened(&mut self, handle: DialogHandle) -> DialogResult<()> {
        if self.state != DialogState::Opening {
            debug!(dialog = %self.id, %handle, "stale open callback");
            // Closing already destroyed the pending window
            if self.state.is_closing_or_closed() {
                if let Err(e) = self.services.toolkit.destroy(handle) {
                    debug!(dialog = %self.id, "late window already gone: {}", e);
                }
            }
            return Ok(());
        }

        self.pending_open = None;
        self.handle = Some(handle);
        self.state = DialogState::Open;

        if self.options.scroll == ScrollMode::Background {
            self.services.toolkit.lock_background(true);
            self.background_locked = true;
        }

        if self.options.scrollback_on_close {
            self.scrollback = Some(self.services.toolkit.scroll_position());
        }

        self.emit(DialogEvent::Open);
        self.load_source()?;
        self.apply_activation(ActivationInput::Opened)
    }

    /// Load the configured url or html unless content already arrived
    fn load_source(&mut self) -> DialogResult<()> {
        if self.source_requested || self.content_received {
            return Ok(());
        }
        self.source_requested = true;

        if let Some(url) = self.options.url.clone() {
            let data = self.options.query_data();
            self.start_fetch(&url, data, RequestOptions::default())?;
        } else if let Some(html) = self.options.html.clone() {
            self.fill(html)?;
        }

        Ok(())
    }

    fn apply_activation(&mut self, input: ActivationInput) -> DialogResult<()> {
        let (next, effect) = transition(self.activation, input);
        self.activation = next;

        match effect {
            ActivationEffect::Activate => self.on_content_ready(),
            ActivationEffect::None => Ok(()),
        }
    }

    fn on_content_ready(&mut self) -> DialogResult<()> {
        let content = self.frame_content();
        self.refresh_chrome(&content)?;
        self.frame.activate_content();
        self.emit(DialogEvent::FrameActivated);

        if self.options.fit_frame {
            self.fit_to_frame_size()?;
        }

        Ok(())
    }

    /// Title and buttons from the content, pushed to the window when open
    fn refresh_chrome(&mut self, content: &Element) -> DialogResult<()> {
        if self.options.use_frame_title_bar {
            if let Some(title) = content.title_bar() {
                self.title = title;
            }
        }

        let links = if self.options.use_frame_actions {
            content.action_links()
        } else {
            Vec::new()
        };
        self.buttons = derive_buttons(&self.options.buttons, &links, &self.options.close_label);

        if let Some(handle) = self.handle {
            self.services.toolkit.set_title(handle, &self.title)?;
            self.services.toolkit.set_buttons(handle, &self.buttons)?;
        }

        Ok(())
    }

    fn on_button(&mut self, name: &str) -> DialogResult<()> {
        let Some(button) = self.buttons.iter().find(|b| b.name == name).cloned() else {
            warn!(dialog = %self.id, button = name, "click on unknown button");
            return Ok(());
        };

        match button.action {
            ButtonAction::Close => self.close(),
            ButtonAction::Fetch { url } => self.start_fetch(&url, Vec::new(), RequestOptions::default()),
            ButtonAction::Emit => {
                self.emit(DialogEvent::Button(button.name));
                Ok(())
            }
        }
    }

    fn emit(&mut self, event: DialogEvent) {
        debug!(dialog = %self.id, event = event.name(), "dialog event");
        self.events.emit(&event);

        if !self.options.propagate_event {
            return;
        }

        if let Some(bus) = &self.services.bus {
            let target = match self.handle {
                Some(handle) => EventTarget::Dialog(handle),
                None => EventTarget::Document,
            };
            let _ = bus.send(PropagatedEvent::new(self.id.clone(), target, event));
        }
    }
}

/// Content of a dialog frame is activated from the open callback only
fn dialog_frame_options(options: &DialogOptions, services: &DialogServices) -> FrameOptions {
    options
        .frame_options()
        .with_auto_activate(false)
        .with_status_catalog(services.status_catalog)
}

impl std::fmt::Debug for Dialog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialog")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("handle", &self.handle)
            .field("activation", &self.activation)
            .field("title", &self.title)
            .field("inflight", &self.inflight.len())
            .finish()
    }
}
