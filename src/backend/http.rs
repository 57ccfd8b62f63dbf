//! `reqwest` implementation of the network client

use super::{Backend, Form, FormMethod, QueryData, RequestOptions, Response, ResponseBody, TransportError};
use crate::config::Settings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use std::time::Duration;
use tracing::debug;

/// HTTP backend resolving relative URLs against an optional base
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Option<Url>,
}

impl HttpBackend {
    pub fn new(client: Client, base_url: Option<Url>) -> Self {
        Self { client, base_url }
    }

    /// Build the client from application settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = settings
            .base_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .context("Invalid base URL")?;

        Ok(Self::new(client, base_url))
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Absolute URL for `url`
    pub fn resolve(&self, url: &str) -> Result<Url, TransportError> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(_) => {
                let base = self
                    .base_url
                    .as_ref()
                    .ok_or_else(|| TransportError::new(0, format!("Relative URL without base: {url}")))?;
                base.join(url)
                    .map_err(|e| TransportError::new(0, format!("Invalid URL {url}: {e}")))
            }
        }
    }

    async fn send(&self, request: RequestBuilder, options: &RequestOptions) -> Result<Response, TransportError> {
        let mut request = request;
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        debug!(status = status.as_u16(), content_type = ?content_type, "response received");

        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Request failed");
            let mut error = TransportError::new(status.as_u16(), reason);
            if let Ok(body) = response.text().await {
                if !body.is_empty() {
                    error = error.with_body(body);
                }
            }
            return Err(error);
        }

        let body = response.text().await?;

        Ok(Response {
            status: status.as_u16(),
            content_type,
            body: ResponseBody::Text(body),
        })
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        let status = error.status().map(|s| s.as_u16()).unwrap_or(0);
        let message = if error.is_timeout() {
            "Request timed out".to_string()
        } else {
            error.to_string()
        };
        TransportError::new(status, message)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get(&self, url: &str, data: &QueryData, options: &RequestOptions) -> Result<Response, TransportError> {
        let url = self.resolve(url)?;
        debug!(%url, "GET");
        self.send(self.client.get(url).query(data), options).await
    }

    async fn submit(&self, url: &str, form: &Form, options: &RequestOptions) -> Result<Response, TransportError> {
        let url = self.resolve(url)?;
        debug!(%url, method = ?form.method, "submit");
        let request = match form.method {
            FormMethod::Get => self.client.get(url).query(&form.fields),
            FormMethod::Post => self.client.post(url).form(&form.fields),
        };
        self.send(request, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: Option<&str>) -> HttpBackend {
        HttpBackend::new(Client::new(), base.map(|b| Url::parse(b).unwrap()))
    }

    #[test]
    fn test_resolve_absolute() {
        let url = backend(None).resolve("https://example.com/a?b=1").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a?b=1");
    }

    #[test]
    fn test_resolve_relative_against_base() {
        let backend = backend(Some("https://example.com/app/"));
        assert_eq!(
            backend.resolve("dialog/edit").unwrap().as_str(),
            "https://example.com/app/dialog/edit"
        );
        assert_eq!(
            backend.resolve("/root").unwrap().as_str(),
            "https://example.com/root"
        );
    }

    #[test]
    fn test_resolve_relative_without_base() {
        let error = backend(None).resolve("/dialog").unwrap_err();
        assert_eq!(error.status, 0);
        assert!(error.message.contains("/dialog"));
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            base_url: Some("http://localhost:8000/".to_string()),
            ..Settings::default()
        };
        let backend = HttpBackend::from_settings(&settings).unwrap();
        assert_eq!(backend.base_url().map(Url::as_str), Some("http://localhost:8000/"));

        let settings = Settings {
            base_url: Some("not a url".to_string()),
            ..Settings::default()
        };
        assert!(HttpBackend::from_settings(&settings).is_err());
    }

    #[tokio::test]
    async fn test_unresolvable_url_fails_without_network() {
        let error = backend(None)
            .get("relative", &Vec::new(), &RequestOptions::default())
            .await
            .unwrap_err();
        assert_eq!(error.status, 0);
    }
}
