//! `fetch` command: load a URL into a headless frame

use anyhow::{anyhow, Result};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::backend::{HttpBackend, QueryData, RequestOptions};
use crate::config::Settings;
use crate::frame::{Delegate, Frame, FrameOptions, InertRegistry, OverlayState, QueryOutcome};

#[derive(Debug, Args)]
pub struct FetchCommand {
    /// URL to fetch, joined onto the configured base URL when relative
    pub url: String,

    /// Query parameter as name=value; repeatable
    #[arg(short = 'q', long = "query", value_parser = parse_query_pair)]
    pub query: Vec<(String, String)>,

    /// Request timeout, e.g. 5s or 1500ms
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Render failures inside the frame instead of its overlay
    #[arg(long)]
    pub fill_on_error: bool,

    /// Print the text of the content instead of its markup
    #[arg(long)]
    pub text: bool,
}

pub(crate) fn parse_query_pair(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got {value:?}"))
}

impl FetchCommand {
    pub async fn execute(&self, settings: &Settings) -> Result<()> {
        let mut frame = self.frame(settings)?;
        let outcome = self.run(&mut frame).await?;

        match outcome {
            QueryOutcome::Done(classification) => {
                info!(url = %self.url, content_type = %classification.content_type(), "fetch done");
                if let Some(delegate) = frame.delegate() {
                    println!("{}", self.render(delegate.content().html(), || delegate.content().text()));
                }
                Ok(())
            }
            QueryOutcome::Failed(error) => {
                warn!(url = %self.url, %error, "fetch failed");
                let shown = match frame.overlay().state() {
                    OverlayState::Error { content, .. } => Some(content.clone()),
                    _ => frame.delegate().map(|delegate| delegate.content().clone()),
                };
                if let Some(content) = shown {
                    println!("{}", self.render(content.html(), || content.text()));
                }
                Err(anyhow!("Fetch of {} failed: {}", self.url, error))
            }
        }
    }

    fn frame(&self, settings: &Settings) -> Result<Frame> {
        let backend = Arc::new(HttpBackend::from_settings(settings)?);
        let options = FrameOptions::default()
            .with_fill_on_error(settings.fill_on_error || self.fill_on_error)
            .with_overlay_delay(Duration::from_millis(settings.overlay_delay_ms));

        let mut frame = Frame::with_options(backend, Arc::new(InertRegistry), options);
        frame.on(|event| debug!(event = event.name(), "frame event"));
        frame.bind(Delegate::new("fetch"))?;
        Ok(frame)
    }

    async fn run(&self, frame: &mut Frame) -> Result<QueryOutcome> {
        let mut request = RequestOptions::default();
        if let Some(timeout) = self.timeout {
            request = request.with_timeout(timeout);
        }

        let query: QueryData = self.query.clone();
        Ok(frame.fetch(&self.url, query, request).await?)
    }

    fn render(&self, markup: &str, text: impl FnOnce() -> String) -> String {
        if self.text {
            text()
        } else {
            markup.to_string()
        }
    }
}
