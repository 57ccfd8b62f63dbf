//! `dialog` command: open a dialog on the headless toolkit and describe it

use anyhow::{anyhow, Result};
use clap::Args;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::fetch::parse_query_pair;
use crate::backend::{Backend, HttpBackend};
use crate::config::{DialogPatch, ScrollMode, Settings};
use crate::dialog::{Button, Dialog, DialogServices, HeadlessToolkit, Point, Size};

#[derive(Debug, Args)]
pub struct DialogCommand {
    /// URL loaded into the dialog frame
    #[arg(conflicts_with = "html")]
    pub url: Option<String>,

    /// Inline markup loaded instead of a URL
    #[arg(long)]
    pub html: Option<String>,

    /// Query parameter sent with the URL as name=value; repeatable
    #[arg(short = 'q', long = "query", value_parser = parse_query_pair)]
    pub query: Vec<(String, String)>,

    /// Dialog title; the content title bar wins when present
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    /// Scroll mode: frame or background
    #[arg(long)]
    pub scroll: Option<ScrollMode>,

    /// Button to click once the content is loaded
    #[arg(long)]
    pub click: Option<String>,

    /// Pretty print the output
    #[arg(short, long)]
    pub pretty: bool,
}

/// What the dialog showed before it was closed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogSummary {
    pub id: String,
    pub title: String,
    pub size: Size,
    pub position: Point,
    pub buttons: Vec<Button>,
    pub content: String,
}

impl DialogSummary {
    fn of(dialog: &Dialog) -> Self {
        Self {
            id: dialog.id().to_string(),
            title: dialog.title().to_string(),
            size: dialog.size(),
            position: dialog.position(),
            buttons: dialog.buttons().to_vec(),
            content: dialog
                .frame()
                .delegate()
                .map(|delegate| delegate.content().html().to_string())
                .unwrap_or_default(),
        }
    }
}

impl DialogCommand {
    pub async fn execute(&self, settings: &Settings) -> Result<()> {
        let backend = Arc::new(HttpBackend::from_settings(settings)?);
        let summary = self.run(settings, backend).await?;

        let output = if self.pretty {
            serde_json::to_string_pretty(&summary)?
        } else {
            serde_json::to_string(&summary)?
        };
        println!("{output}");
        Ok(())
    }

    fn patch(&self) -> DialogPatch {
        let mut patch = DialogPatch::new();
        patch.url = self.url.clone();
        patch.html = self.html.clone();
        patch.title = self.title.clone();
        patch.width = self.width;
        patch.height = self.height;
        patch.scroll = self.scroll;
        if !self.query.is_empty() {
            patch.data = Some(self.query.iter().cloned().collect());
        }
        patch
    }

    async fn run(&self, settings: &Settings, backend: Arc<dyn Backend>) -> Result<DialogSummary> {
        if self.url.is_none() && self.html.is_none() {
            return Err(anyhow!("Either a URL or --html is required"));
        }

        let toolkit = Arc::new(HeadlessToolkit::new());
        let services = DialogServices::new(backend, toolkit.clone());

        let mut dialog = Dialog::new(settings.dialog_options(), services)?;
        dialog.on(|event| debug!(event = event.name(), "dialog event"));

        dialog.open(Some(self.patch()))?;
        dialog.run_until_idle().await?;
        info!(dialog = %dialog.id(), title = dialog.title(), "dialog loaded");

        let summary = DialogSummary::of(&dialog);

        if let Some(button) = &self.click {
            let handle = dialog.handle().ok_or_else(|| anyhow!("Dialog has no window"))?;
            toolkit.click(handle, button)?;
            dialog.run_until_idle().await?;
        }

        if !dialog.state().is_closing_or_closed() {
            dialog.close()?;
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;

    fn command(html: Option<&str>, url: Option<&str>) -> DialogCommand {
        DialogCommand {
            url: url.map(str::to_string),
            html: html.map(str::to_string),
            query: Vec::new(),
            title: Some("Fallback".to_string()),
            width: Some(500),
            height: None,
            scroll: None,
            click: None,
            pretty: false,
        }
    }

    #[tokio::test]
    async fn test_inline_html_summary() {
        let cmd = command(
            Some(r#"<div class="ui-creme-dialog-titlebar">Edit</div><a class="ui-creme-dialog-action" href="/save">Save</a>"#),
            None,
        );

        let summary = cmd.run(&Settings::default(), Arc::new(MockBackend::new())).await.unwrap();

        assert_eq!(summary.title, "Edit");
        assert!(summary.buttons.iter().any(|button| button.label == "Save"));
        assert!(summary.content.contains("Save"));
    }

    #[tokio::test]
    async fn test_url_is_fetched_through_backend() {
        let backend = Arc::new(MockBackend::new().html("/edit/1", "<p>form</p>"));
        let cmd = command(None, Some("/edit/1"));

        let summary = cmd.run(&Settings::default(), backend.clone()).await.unwrap();

        assert_eq!(summary.title, "Fallback");
        assert_eq!(summary.content, "<p>form</p>");
        assert_eq!(backend.calls(), vec!["GET /edit/1".to_string()]);
    }

    #[tokio::test]
    async fn test_source_required() {
        let cmd = command(None, None);
        assert!(cmd.run(&Settings::default(), Arc::new(MockBackend::new())).await.is_err());
    }
}
