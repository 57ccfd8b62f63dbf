//! Asynchronous content frames
//!
//! A [`Frame`] owns a [`Delegate`] and an [`Overlay`], loads content through a
//! [`Backend`] and swaps it into the delegate. Transport failures never
//! surface as errors: they become `fetch-fail` / `submit-fail` events and are
//! rendered either in the overlay or in the delegate itself.
//!
//! Queries are split in two halves so that an owner can keep several of them
//! in flight without holding a borrow of the frame: [`Frame::start_fetch`]
//! returns a `'static` [`PendingQuery`] and [`Frame::complete`] applies its
//! result. [`Frame::fetch`] and [`Frame::submit`] do both with the overlay
//! debounce in between.

pub mod delegate;
pub mod overlay;
pub mod registry;

pub use delegate::Delegate;
pub use overlay::{Overlay, OverlayState};
pub use registry::{InertRegistry, WidgetRegistry};

use crate::backend::{error_fragment, Backend, Form, QueryData, RequestOptions, StatusCatalog, TransportError};
use crate::content::{classify, Classification, Content, ContentType, Element, RawContent};
use crate::events::{Emitter, ListenerId};
use futures::future::{self, BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Frame usage errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Frame is already bound to {0}")]
    AlreadyBound(String),

    #[error("Frame is not bound")]
    NotBound,
}

pub type FrameResult<T> = Result<T, FrameError>;

/// Why the delegate content is being replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillAction {
    Fill,
    Fetch,
    Submit,
}

impl FillAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillAction::Fill => "fill",
            FillAction::Fetch => "fetch",
            FillAction::Submit => "submit",
        }
    }
}

/// Events emitted by a frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    /// Old content is about to be removed
    Cleanup { action: FillAction },
    /// New content is in place
    Update {
        content: Element,
        content_type: ContentType,
        action: FillAction,
    },
    FetchDone { url: String, classification: Classification },
    FetchFail { url: String, error: TransportError },
    SubmitDone { url: String, classification: Classification },
    SubmitFail { url: String, error: TransportError },
}

impl FrameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FrameEvent::Cleanup { .. } => "cleanup",
            FrameEvent::Update { .. } => "update",
            FrameEvent::FetchDone { .. } => "fetch-done",
            FrameEvent::FetchFail { .. } => "fetch-fail",
            FrameEvent::SubmitDone { .. } => "submit-done",
            FrameEvent::SubmitFail { .. } => "submit-fail",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameOptions {
    /// Activate sub-widgets as soon as content is filled
    pub auto_activate: bool,
    /// Render transport failures in the delegate instead of the overlay
    pub fill_on_error: bool,
    /// Delay before the loading overlay appears
    pub overlay_delay: Duration,
    /// Messages of the synthesized error fragment
    pub status_catalog: StatusCatalog,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            auto_activate: true,
            fill_on_error: false,
            overlay_delay: Duration::from_millis(100),
            status_catalog: StatusCatalog::default(),
        }
    }
}

impl FrameOptions {
    pub fn with_auto_activate(mut self, auto_activate: bool) -> Self {
        self.auto_activate = auto_activate;
        self
    }

    pub fn with_fill_on_error(mut self, fill_on_error: bool) -> Self {
        self.fill_on_error = fill_on_error;
        self
    }

    pub fn with_overlay_delay(mut self, overlay_delay: Duration) -> Self {
        self.overlay_delay = overlay_delay;
        self
    }

    pub fn with_status_catalog(mut self, status_catalog: StatusCatalog) -> Self {
        self.status_catalog = status_catalog;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Fetch,
    Submit,
}

/// Result of a network round-trip, not yet applied to the frame
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCompletion {
    pub kind: QueryKind,
    pub url: String,
    pub result: Result<crate::backend::Response, TransportError>,
}

/// A query in flight; owns everything it needs
pub type PendingQuery = BoxFuture<'static, QueryCompletion>;

/// What a completed query did to the frame
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Done(Classification),
    Failed(TransportError),
}

impl QueryOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, QueryOutcome::Done(_))
    }
}

pub struct Frame {
    delegate: Option<Delegate>,
    overlay: Overlay,
    backend: Arc<dyn Backend>,
    registry: Arc<dyn WidgetRegistry>,
    options: FrameOptions,
    content_ready: bool,
    last_fetch_url: Option<String>,
    events: Emitter<FrameEvent>,
}

impl Frame {
    pub fn new(backend: Arc<dyn Backend>, registry: Arc<dyn WidgetRegistry>) -> Self {
        Self::with_options(backend, registry, FrameOptions::default())
    }

    pub fn with_options(
        backend: Arc<dyn Backend>,
        registry: Arc<dyn WidgetRegistry>,
        options: FrameOptions,
    ) -> Self {
        Self {
            delegate: None,
            overlay: Overlay::new(),
            backend,
            registry,
            options,
            content_ready: false,
            last_fetch_url: None,
            events: Emitter::new(),
        }
    }

    pub fn options(&self) -> &FrameOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut FrameOptions {
        &mut self.options
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    /// Swap the network client; queries already in flight keep the old one
    pub fn set_backend(&mut self, backend: Arc<dyn Backend>) {
        self.backend = backend;
    }

    pub fn on<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&FrameEvent) + Send + 'static,
    {
        self.events.on(listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    pub fn bind(&mut self, delegate: Delegate) -> FrameResult<()> {
        if let Some(bound) = &self.delegate {
            return Err(FrameError::AlreadyBound(bound.id().to_string()));
        }

        debug!(delegate = delegate.id(), "frame bound");
        self.overlay.bind(delegate.id());
        self.delegate = Some(delegate);
        Ok(())
    }

    /// Release the delegate, deactivating its content first
    pub fn unbind(&mut self) -> FrameResult<Delegate> {
        if self.delegate.is_none() {
            return Err(FrameError::NotBound);
        }

        self.deactivate_content();
        self.overlay.unbind();
        self.delegate.take().ok_or(FrameError::NotBound)
    }

    pub fn is_bound(&self) -> bool {
        self.delegate.is_some()
    }

    pub fn delegate(&self) -> Option<&Delegate> {
        self.delegate.as_ref()
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn show_loading(&mut self) {
        self.overlay.show_loading();
    }

    pub fn is_content_ready(&self) -> bool {
        self.content_ready
    }

    pub fn last_fetch_url(&self) -> Option<&str> {
        self.last_fetch_url.as_deref()
    }

    /// Replace the delegate content.
    ///
    /// Anything that does not classify as HTML or an element is ignored and
    /// `Ok(false)` is returned without touching the delegate or emitting.
    pub fn fill(&mut self, data: impl Into<RawContent>, action: FillAction) -> FrameResult<bool> {
        if self.delegate.is_none() {
            return Err(FrameError::NotBound);
        }

        let classified = classify(data, Some("text/html"));
        if !classified.is_html_or_element() {
            debug!(content_type = %classified.content_type(), "fill ignored");
            return Ok(false);
        }

        let content_type = classified.content_type();
        let Content::Element(element) = classified.into_content() else {
            return Ok(false);
        };

        self.overlay.hide();
        self.events.emit(&FrameEvent::Cleanup { action });
        self.deactivate_content();

        if let Some(delegate) = self.delegate.as_mut() {
            delegate.empty();
            delegate.append(&element);
        }

        if self.options.auto_activate {
            self.activate_content();
        }

        self.events.emit(&FrameEvent::Update {
            content: element,
            content_type,
            action,
        });

        Ok(true)
    }

    pub fn clear(&mut self) -> FrameResult<bool> {
        self.fill("", FillAction::Fill)
    }

    pub fn activate_content(&mut self) {
        if self.content_ready {
            return;
        }
        if let Some(delegate) = &self.delegate {
            self.registry.activate(delegate);
            self.content_ready = true;
        }
    }

    pub fn deactivate_content(&mut self) {
        if !self.content_ready {
            return;
        }
        if let Some(delegate) = &self.delegate {
            self.registry.deactivate(delegate);
        }
        self.content_ready = false;
    }

    /// Start a GET; apply the result with [`Frame::complete`]
    pub fn start_fetch(
        &self,
        url: &str,
        data: QueryData,
        options: RequestOptions,
    ) -> FrameResult<PendingQuery> {
        if self.delegate.is_none() {
            return Err(FrameError::NotBound);
        }

        let backend = Arc::clone(&self.backend);
        let url = url.to_string();
        debug!(%url, "fetch started");

        Ok(async move {
            let result = backend.get(&url, &data, &options).await;
            QueryCompletion {
                kind: QueryKind::Fetch,
                url,
                result,
            }
        }
        .boxed())
    }

    /// Start a form submission.
    ///
    /// The target is the first non-empty of `options.action`, `url` and the
    /// form's own action. Without one the query resolves at once to a 404.
    pub fn start_submit(
        &self,
        url: Option<&str>,
        form: Form,
        options: RequestOptions,
    ) -> FrameResult<PendingQuery> {
        if self.delegate.is_none() {
            return Err(FrameError::NotBound);
        }

        let target = [options.action.as_deref(), url, form.action.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|target| !target.is_empty())
            .map(str::to_string);

        let Some(target) = target else {
            warn!("form submitted without a target");
            return Ok(future::ready(QueryCompletion {
                kind: QueryKind::Submit,
                url: String::new(),
                result: Err(TransportError::new(404, self.options.status_catalog.message(404))),
            })
            .boxed());
        };

        let backend = Arc::clone(&self.backend);
        debug!(url = %target, "submit started");

        Ok(async move {
            let result = backend.submit(&target, &form, &options).await;
            QueryCompletion {
                kind: QueryKind::Submit,
                url: target,
                result,
            }
        }
        .boxed())
    }

    /// Apply a finished query: fill on success, render the failure otherwise
    pub fn complete(&mut self, completion: QueryCompletion) -> FrameResult<QueryOutcome> {
        if self.delegate.is_none() {
            return Err(FrameError::NotBound);
        }

        let QueryCompletion { kind, url, result } = completion;
        let action = match kind {
            QueryKind::Fetch => FillAction::Fetch,
            QueryKind::Submit => FillAction::Submit,
        };

        match result {
            Ok(response) => {
                self.overlay.hide();

                let hint = match kind {
                    QueryKind::Fetch => Some("text/html".to_string()),
                    QueryKind::Submit => response.content_type.clone(),
                };
                let classification = classify(response.body, hint.as_deref());

                if kind == QueryKind::Fetch {
                    self.last_fetch_url = Some(url.clone());
                }

                self.fill(classification.clone(), action)?;

                let event = match kind {
                    QueryKind::Fetch => FrameEvent::FetchDone {
                        url,
                        classification: classification.clone(),
                    },
                    QueryKind::Submit => FrameEvent::SubmitDone {
                        url,
                        classification: classification.clone(),
                    },
                };
                self.events.emit(&event);

                Ok(QueryOutcome::Done(classification))
            }
            Err(error) => {
                warn!(%url, status = error.status, message = %error.message, "{} failed", action.as_str());

                if error.is_cancelled() {
                    self.overlay.hide();
                } else {
                    let content = error_content(&error, &url, &self.options.status_catalog);
                    if self.options.fill_on_error {
                        self.fill(content, action)?;
                    } else {
                        self.overlay.show_error(error.status, content);
                    }
                }

                let event = match kind {
                    QueryKind::Fetch => FrameEvent::FetchFail {
                        url,
                        error: error.clone(),
                    },
                    QueryKind::Submit => FrameEvent::SubmitFail {
                        url,
                        error: error.clone(),
                    },
                };
                self.events.emit(&event);

                Ok(QueryOutcome::Failed(error))
            }
        }
    }

    pub async fn fetch(
        &mut self,
        url: &str,
        data: QueryData,
        options: RequestOptions,
    ) -> FrameResult<QueryOutcome> {
        let pending = self.start_fetch(url, data, options)?;
        let delay = self.options.overlay_delay;
        let completion = wait_with_overlay(&mut self.overlay, delay, pending).await;
        self.complete(completion)
    }

    pub async fn submit(
        &mut self,
        url: Option<&str>,
        form: Form,
        options: RequestOptions,
    ) -> FrameResult<QueryOutcome> {
        let pending = self.start_submit(url, form, options)?;
        let delay = self.options.overlay_delay;
        let completion = wait_with_overlay(&mut self.overlay, delay, pending).await;
        self.complete(completion)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("delegate", &self.delegate)
            .field("overlay", &self.overlay)
            .field("options", &self.options)
            .field("content_ready", &self.content_ready)
            .field("last_fetch_url", &self.last_fetch_url)
            .finish()
    }
}

/// Error body when the server sent usable HTML, a synthesized fragment otherwise
fn error_content(error: &TransportError, url: &str, catalog: &StatusCatalog) -> Element {
    error
        .body
        .as_deref()
        .map(|body| classify(body, Some("text/html")))
        .filter(|classified| classified.is_html() && !classified.is_empty())
        .and_then(|classified| match classified.into_content() {
            Content::Element(element) => Some(element),
            _ => None,
        })
        .unwrap_or_else(|| error_fragment(error.status, url, catalog))
}

/// Await `pending`, showing the loading overlay once `delay` has elapsed
pub(crate) async fn wait_with_overlay(
    overlay: &mut Overlay,
    delay: Duration,
    mut pending: PendingQuery,
) -> QueryCompletion {
    if delay.is_zero() {
        overlay.show_loading();
        return pending.await;
    }

    tokio::select! {
        completion = &mut pending => return completion,
        _ = tokio::time::sleep(delay) => overlay.show_loading(),
    }

    pending.await
}
