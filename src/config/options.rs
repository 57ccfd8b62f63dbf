//! Dialog configuration
//!
//! [`DialogOptions`] is fixed at construction; a [`DialogPatch`] passed to
//! `open()` is merged over it. JSON names follow the camelCase surface used by
//! pages embedding dialogs.

use crate::dialog::buttons::Button;
use crate::dialog::layout::{Position, Size, SizeLimits, Viewport};
use crate::dialog::{DialogError, DialogResult};
use crate::frame::FrameOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

macro_rules! merge_values {
    ($target:expr, $patch:ident, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = $patch.$field {
                $target.$field = value;
            }
        )*
    };
}

macro_rules! merge_optionals {
    ($target:expr, $patch:ident, [$($field:ident),* $(,)?]) => {
        $(
            if $patch.$field.is_some() {
                $target.$field = $patch.$field;
            }
        )*
    };
}

/// What scrolls while a dialog is open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScrollMode {
    /// The frame scrolls inside the dialog
    #[default]
    Frame,
    /// The page scroll is locked and the background dimmed
    Background,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid scroll mode: {0} (expected \"frame\" or \"background\")")]
pub struct InvalidScrollMode(pub String);

impl FromStr for ScrollMode {
    type Err = InvalidScrollMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "frame" => Ok(ScrollMode::Frame),
            "background" => Ok(ScrollMode::Background),
            other => Err(InvalidScrollMode(other.to_string())),
        }
    }
}

impl From<InvalidScrollMode> for DialogError {
    fn from(error: InvalidScrollMode) -> Self {
        DialogError::InvalidConfig(error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DialogOptions {
    /// Stable id; generated when absent
    pub id: Option<String>,
    /// Content source loaded when the dialog opens
    pub url: Option<String>,
    /// Query data sent with `url`
    pub data: BTreeMap<String, String>,
    /// Inline content source, exclusive with `url`
    pub html: Option<String>,
    pub title: Option<String>,
    pub modal: bool,
    pub resizable: bool,
    pub draggable: bool,
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// Viewport the dialog must fit in
    pub within: Option<Viewport>,
    pub position: Position,
    pub scroll: ScrollMode,
    /// Resize to the content after every update
    pub fit_frame: bool,
    pub shrink: bool,
    /// Re-emit events as `dialog-*` on the page
    pub propagate_event: bool,
    pub use_frame_title_bar: bool,
    pub use_frame_actions: bool,
    pub fill_frame_on_error: bool,
    pub close_on_escape: bool,
    pub scrollback_on_close: bool,
    /// Activate filled content right away. Ignored by dialogs, which
    /// activate their frame once the window is open.
    pub auto_activate: bool,
    #[serde(rename = "overlayDelay")]
    pub overlay_delay_ms: u64,
    pub buttons: Vec<Button>,
    pub close_label: String,
}

impl Default for DialogOptions {
    fn default() -> Self {
        Self {
            id: None,
            url: None,
            data: BTreeMap::new(),
            html: None,
            title: None,
            modal: true,
            resizable: true,
            draggable: true,
            width: 640,
            height: 350,
            min_width: 200,
            min_height: 150,
            max_width: None,
            max_height: None,
            within: None,
            position: Position::Center,
            scroll: ScrollMode::Frame,
            fit_frame: true,
            shrink: false,
            propagate_event: false,
            use_frame_title_bar: true,
            use_frame_actions: true,
            fill_frame_on_error: false,
            close_on_escape: true,
            scrollback_on_close: false,
            auto_activate: false,
            overlay_delay_ms: 100,
            buttons: Vec::new(),
            close_label: "Close".to_string(),
        }
    }
}

impl DialogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_data(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_min_size(mut self, width: u32, height: u32) -> Self {
        self.min_width = width;
        self.min_height = height;
        self
    }

    pub fn with_max_size(mut self, width: u32, height: u32) -> Self {
        self.max_width = Some(width);
        self.max_height = Some(height);
        self
    }

    pub fn with_within(mut self, viewport: Viewport) -> Self {
        self.within = Some(viewport);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_scroll(mut self, scroll: ScrollMode) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn with_button(mut self, button: Button) -> Self {
        self.buttons.push(button);
        self
    }

    pub fn fit_frame(mut self, fit_frame: bool) -> Self {
        self.fit_frame = fit_frame;
        self
    }

    pub fn shrink(mut self, shrink: bool) -> Self {
        self.shrink = shrink;
        self
    }

    pub fn propagate_event(mut self, propagate_event: bool) -> Self {
        self.propagate_event = propagate_event;
        self
    }

    pub fn use_frame_title_bar(mut self, enabled: bool) -> Self {
        self.use_frame_title_bar = enabled;
        self
    }

    pub fn use_frame_actions(mut self, enabled: bool) -> Self {
        self.use_frame_actions = enabled;
        self
    }

    pub fn fill_frame_on_error(mut self, enabled: bool) -> Self {
        self.fill_frame_on_error = enabled;
        self
    }

    pub fn close_on_escape(mut self, enabled: bool) -> Self {
        self.close_on_escape = enabled;
        self
    }

    pub fn scrollback_on_close(mut self, enabled: bool) -> Self {
        self.scrollback_on_close = enabled;
        self
    }

    pub fn auto_activate(mut self, enabled: bool) -> Self {
        self.auto_activate = enabled;
        self
    }

    pub fn with_overlay_delay(mut self, delay: Duration) -> Self {
        self.overlay_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn overlay_delay(&self) -> Duration {
        Duration::from_millis(self.overlay_delay_ms)
    }

    /// Size limits from the min/max options, capped by `within`
    pub fn size_limits(&self) -> SizeLimits {
        let min = Size::new(self.min_width, self.min_height);
        let max = Size::new(
            self.max_width.unwrap_or(u32::MAX),
            self.max_height.unwrap_or(u32::MAX),
        );
        SizeLimits::new(min, max).within(self.within.as_ref())
    }

    pub fn frame_options(&self) -> FrameOptions {
        FrameOptions::default()
            .with_auto_activate(self.auto_activate)
            .with_fill_on_error(self.fill_frame_on_error)
            .with_overlay_delay(self.overlay_delay())
    }

    /// Query data as ordered pairs
    pub fn query_data(&self) -> Vec<(String, String)> {
        self.data
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Apply call-time overrides
    pub fn merge(&mut self, patch: DialogPatch) {
        merge_values!(self, patch, [
            modal, resizable, draggable, width, height, min_width, min_height, position,
            scroll, fit_frame, shrink, propagate_event, use_frame_title_bar, use_frame_actions,
            fill_frame_on_error, close_on_escape, scrollback_on_close, auto_activate,
            overlay_delay_ms, buttons, close_label, data,
        ]);
        merge_optionals!(self, patch, [url, html, title, max_width, max_height, within]);
    }

    pub fn validate(&self) -> DialogResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(DialogError::InvalidConfig(
                "width and height must be greater than 0".to_string(),
            ));
        }

        if let Some(max_width) = self.max_width {
            if max_width < self.min_width {
                return Err(DialogError::InvalidConfig(format!(
                    "maxWidth {max_width} is below minWidth {}",
                    self.min_width
                )));
            }
        }

        if let Some(max_height) = self.max_height {
            if max_height < self.min_height {
                return Err(DialogError::InvalidConfig(format!(
                    "maxHeight {max_height} is below minHeight {}",
                    self.min_height
                )));
            }
        }

        if self.url.is_some() && self.html.is_some() {
            return Err(DialogError::InvalidConfig(
                "url and html are exclusive content sources".to_string(),
            ));
        }

        if let Some(id) = &self.id {
            if id.trim().is_empty() {
                return Err(DialogError::InvalidConfig("id must not be blank".to_string()));
            }
        }

        Ok(())
    }
}

/// Overrides passed to `open()`; unset fields keep the constructed value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct DialogPatch {
    pub url: Option<String>,
    pub data: Option<BTreeMap<String, String>>,
    pub html: Option<String>,
    pub title: Option<String>,
    pub modal: Option<bool>,
    pub resizable: Option<bool>,
    pub draggable: Option<bool>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub within: Option<Viewport>,
    pub position: Option<Position>,
    pub scroll: Option<ScrollMode>,
    pub fit_frame: Option<bool>,
    pub shrink: Option<bool>,
    pub propagate_event: Option<bool>,
    pub use_frame_title_bar: Option<bool>,
    pub use_frame_actions: Option<bool>,
    pub fill_frame_on_error: Option<bool>,
    pub close_on_escape: Option<bool>,
    pub scrollback_on_close: Option<bool>,
    pub auto_activate: Option<bool>,
    #[serde(rename = "overlayDelay")]
    pub overlay_delay_ms: Option<u64>,
    pub buttons: Option<Vec<Button>>,
    pub close_label: Option<String>,
}

impl DialogPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_scroll(mut self, scroll: ScrollMode) -> Self {
        self.scroll = Some(scroll);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = DialogOptions::default();
        assert_eq!(options.width, 640);
        assert_eq!(options.scroll, ScrollMode::Frame);
        assert!(options.fit_frame);
        assert!(!options.auto_activate);
        assert_eq!(options.overlay_delay(), Duration::from_millis(100));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_json_surface() {
        let options: DialogOptions = serde_json::from_value(json!({
            "url": "/edit",
            "fitFrame": false,
            "scroll": "background",
            "overlayDelay": 0,
            "within": {"width": 800, "height": 600, "topOffset": 40},
            "buttons": [{"name": "help", "label": "Help", "action": {"type": "emit"}}]
        }))
        .unwrap();

        assert_eq!(options.url.as_deref(), Some("/edit"));
        assert!(!options.fit_frame);
        assert_eq!(options.scroll, ScrollMode::Background);
        assert_eq!(options.overlay_delay_ms, 0);
        assert_eq!(options.within.unwrap().top_offset, 40);
        assert_eq!(options.buttons[0].name, "help");
        assert_eq!(options.width, 640);
    }

    #[test]
    fn test_invalid_scroll() {
        assert_eq!("background".parse::<ScrollMode>(), Ok(ScrollMode::Background));
        let error = "window".parse::<ScrollMode>().unwrap_err();
        assert!(matches!(DialogError::from(error), DialogError::InvalidConfig(_)));
        assert!(serde_json::from_value::<DialogOptions>(json!({"scroll": "window"})).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(DialogOptions::new().with_size(0, 100).validate().is_err());
        assert!(DialogOptions::new()
            .with_min_size(300, 300)
            .with_max_size(200, 400)
            .validate()
            .is_err());
        assert!(DialogOptions::new()
            .with_url("/a")
            .with_html("<p>a</p>")
            .validate()
            .is_err());
        assert!(DialogOptions::new().with_id(" ").validate().is_err());
    }

    #[test]
    fn test_merge_patch() {
        let mut options = DialogOptions::new().with_title("Built").with_url("/a");
        options.merge(DialogPatch::new().with_size(800, 600).with_scroll(ScrollMode::Background));

        assert_eq!(options.width, 800);
        assert_eq!(options.height, 600);
        assert_eq!(options.scroll, ScrollMode::Background);
        assert_eq!(options.title.as_deref(), Some("Built"));
        assert_eq!(options.url.as_deref(), Some("/a"));

        options.merge(DialogPatch::new().with_url("/b"));
        assert_eq!(options.url.as_deref(), Some("/b"));
    }

    #[test]
    fn test_size_limits_from_within() {
        let options = DialogOptions::new()
            .with_max_size(2000, 2000)
            .with_within(Viewport::new(0, 0, 1024, 768));
        let limits = options.size_limits();
        assert_eq!(limits.min(), Size::new(200, 150));
        assert_eq!(limits.max(), Size::new(1024, 768));
    }
}
