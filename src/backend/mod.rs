//! Network client seam used by frames
//!
//! A [`Backend`] performs GET requests and form submissions. Failures are
//! values: a [`TransportError`] carries the status, reason and optional body
//! so the frame can render them instead of propagating them.

pub mod http;
pub mod status;

pub use http::HttpBackend;
pub use status::{error_fragment, status_message, StatusCatalog};

use crate::content::RawContent;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Query string or form data, in insertion order
pub type QueryData = Vec<(String, String)>;

/// Body of a successful response
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Text(String),
    Json(Value),
}

impl From<ResponseBody> for RawContent {
    fn from(body: ResponseBody) -> Self {
        match body {
            ResponseBody::Text(text) => RawContent::Text(text),
            ResponseBody::Json(value) => RawContent::from(value),
        }
    }
}

/// A successful response
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: ResponseBody,
}

impl Response {
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: Some("text/html".to_string()),
            body: ResponseBody::Text(body.into()),
        }
    }

    pub fn text(body: impl Into<String>, content_type: Option<&str>) -> Self {
        Self {
            status: 200,
            content_type: content_type.map(str::to_string),
            body: ResponseBody::Text(body.into()),
        }
    }

    pub fn json(value: Value) -> Self {
        Self {
            status: 200,
            content_type: Some("application/json".to_string()),
            body: ResponseBody::Json(value),
        }
    }
}

/// How a request ended without success
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Fail,
    Cancel,
}

/// A failed request, including the error body when the server sent one
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{status} {message}")]
pub struct TransportError {
    pub kind: FailureKind,
    pub status: u16,
    pub message: String,
    pub body: Option<String>,
}

impl TransportError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Fail,
            status,
            message: message.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn cancelled() -> Self {
        Self {
            kind: FailureKind::Cancel,
            status: 0,
            message: "cancelled".to_string(),
            body: None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == FailureKind::Cancel
    }
}

/// Per-request options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Submission target overriding the url and the form action
    pub action: Option<String>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormMethod {
    #[default]
    Get,
    Post,
}

/// A form to submit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Form {
    pub action: Option<String>,
    pub method: FormMethod,
    pub fields: QueryData,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_method(mut self, method: FormMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Network client used by frames
#[async_trait]
pub trait Backend: Send + Sync {
    /// GET `url` with `data` as query parameters
    async fn get(
        &self,
        url: &str,
        data: &QueryData,
        options: &RequestOptions,
    ) -> Result<Response, TransportError>;

    /// Submit `form` to `url`, which the caller has already resolved
    async fn submit(
        &self,
        url: &str,
        form: &Form,
        options: &RequestOptions,
    ) -> Result<Response, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transport_error_display() {
        let error = TransportError::new(404, "Not Found").with_body("<p>missing</p>");
        assert_eq!(error.to_string(), "404 Not Found");
        assert_eq!(error.body.as_deref(), Some("<p>missing</p>"));
        assert!(!error.is_cancelled());
        assert!(TransportError::cancelled().is_cancelled());
    }

    #[test]
    fn test_form_builder() {
        let form = Form::new()
            .with_action("/save")
            .with_method(FormMethod::Post)
            .with_field("name", "value");

        assert_eq!(form.field("name"), Some("value"));
        assert_eq!(form.field("other"), None);
        assert_eq!(form.method, FormMethod::Post);
    }

    #[test]
    fn test_json_body_to_raw_content() {
        assert_eq!(
            RawContent::from(ResponseBody::Json(json!({"a": 1}))),
            RawContent::Json(json!({"a": 1}))
        );
        assert_eq!(
            RawContent::from(ResponseBody::Json(Value::Null)),
            RawContent::Null
        );
    }
}
