//! Scripted collaborators for unit tests

use crate::backend::{Backend, Form, FormMethod, QueryData, RequestOptions, Response, TransportError};
use crate::frame::{Delegate, WidgetRegistry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Backend answering from a route table; unknown urls get a 404
#[derive(Default)]
pub(crate) struct MockBackend {
    routes: HashMap<String, Result<Response, TransportError>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, result: Result<Response, TransportError>) -> Self {
        self.routes.insert(url.to_string(), result);
        self
    }

    pub fn html(self, url: &str, body: &str) -> Self {
        self.route(url, Ok(Response::html(body)))
    }

    pub fn fail(self, url: &str, status: u16, body: Option<&str>) -> Self {
        let mut error = TransportError::new(status, crate::backend::status_message(status));
        if let Some(body) = body {
            error = error.with_body(body);
        }
        self.route(url, Err(error))
    }

    /// Every answer waits this long first
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// `"METHOD url"` for every request, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(&self, method: &str, url: &str) -> Result<Response, TransportError> {
        self.calls.lock().unwrap().push(format!("{method} {url}"));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.routes
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(TransportError::new(404, "Not Found")))
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn get(&self, url: &str, _data: &QueryData, _options: &RequestOptions) -> Result<Response, TransportError> {
        self.answer("GET", url).await
    }

    async fn submit(&self, url: &str, form: &Form, _options: &RequestOptions) -> Result<Response, TransportError> {
        let method = match form.method {
            FormMethod::Get => "GET",
            FormMethod::Post => "POST",
        };
        self.answer(method, url).await
    }
}

/// Registry counting activations
#[derive(Debug, Default)]
pub(crate) struct RecordingRegistry {
    activations: AtomicUsize,
    deactivations: AtomicUsize,
}

impl RecordingRegistry {
    pub fn activations(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }

    pub fn deactivations(&self) -> usize {
        self.deactivations.load(Ordering::SeqCst)
    }
}

impl WidgetRegistry for RecordingRegistry {
    fn activate(&self, _root: &Delegate) {
        self.activations.fetch_add(1, Ordering::SeqCst);
    }

    fn deactivate(&self, _root: &Delegate) {
        self.deactivations.fetch_add(1, Ordering::SeqCst);
    }
}
