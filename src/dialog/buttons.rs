//! Dialog buttons derived from configuration and from frame content

use crate::content::ActionLink;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Name of the button every dialog starts with
pub const CLOSE_BUTTON: &str = "close";

/// What a button does when clicked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ButtonAction {
    /// Close the dialog
    Close,
    /// Load `url` into the dialog's frame
    Fetch { url: String },
    /// Emit a `button` event carrying the button name
    Emit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Button {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub order: i32,
    pub action: ButtonAction,
}

impl Button {
    pub fn new(name: impl Into<String>, label: impl Into<String>, action: ButtonAction) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            order: 0,
            action,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn close(label: impl Into<String>) -> Self {
        Self::new(CLOSE_BUTTON, label, ButtonAction::Close)
    }
}

impl From<&ActionLink> for Button {
    fn from(link: &ActionLink) -> Self {
        Button::new(
            link.name.clone(),
            link.label.clone(),
            ButtonAction::Fetch {
                url: link.href.clone(),
            },
        )
        .with_order(link.order)
    }
}

/// The close button, then `statics`, then one button per discovered link.
///
/// A later button replaces an earlier one with the same name in place. The
/// result is stably sorted by `order`.
pub fn derive_buttons(statics: &[Button], links: &[ActionLink], close_label: &str) -> Vec<Button> {
    let mut buttons: Vec<Button> = Vec::with_capacity(statics.len() + links.len() + 1);

    let candidates = std::iter::once(Button::close(close_label))
        .chain(statics.iter().cloned())
        .chain(links.iter().map(Button::from));

    for button in candidates {
        match buttons.iter_mut().find(|existing| existing.name == button.name) {
            Some(existing) => *existing = button,
            None => buttons.push(button),
        }
    }

    buttons.sort_by_key(|button| button.order);
    buttons
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(name: &str, href: &str, order: i32) -> ActionLink {
        ActionLink {
            name: name.to_string(),
            label: name.to_uppercase(),
            href: href.to_string(),
            order,
        }
    }

    fn names(buttons: &[Button]) -> Vec<&str> {
        buttons.iter().map(|b| b.name.as_str()).collect()
    }

    #[test]
    fn test_default_close_button() {
        let buttons = derive_buttons(&[], &[], "Close");
        assert_eq!(buttons, vec![Button::close("Close")]);
    }

    #[test]
    fn test_statics_and_links_in_order() {
        let statics = vec![Button::new("help", "Help", ButtonAction::Emit).with_order(5)];
        let links = vec![link("save", "/save", 0), link("delete", "/delete", -1)];

        let buttons = derive_buttons(&statics, &links, "Close");

        assert_eq!(names(&buttons), vec!["delete", "close", "save", "help"]);
        assert_eq!(
            buttons[2].action,
            ButtonAction::Fetch {
                url: "/save".to_string()
            }
        );
    }

    #[test]
    fn test_later_button_replaces_same_name() {
        let statics = vec![Button::new("close", "Cancel", ButtonAction::Close).with_order(9)];
        let links = vec![link("close", "/really-close", 0)];

        let buttons = derive_buttons(&statics, &links, "Close");

        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].label, "CLOSE");
        assert_eq!(buttons[0].order, 0);
    }
}
