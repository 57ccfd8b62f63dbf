//! Loading and error overlay drawn above a frame's delegate

use crate::content::Element;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OverlayState {
    #[default]
    Hidden,
    Loading,
    Error { status: u16, content: Element },
}

/// Overlay bound to a delegate by id
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    target: Option<String>,
    state: OverlayState,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, target: impl Into<String>) {
        self.target = Some(target.into());
        self.state = OverlayState::Hidden;
    }

    pub fn unbind(&mut self) {
        self.target = None;
        self.state = OverlayState::Hidden;
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn show_loading(&mut self) {
        if self.target.is_some() {
            self.state = OverlayState::Loading;
        }
    }

    pub fn show_error(&mut self, status: u16, content: Element) {
        if self.target.is_some() {
            self.state = OverlayState::Error { status, content };
        }
    }

    pub fn hide(&mut self) {
        self.state = OverlayState::Hidden;
    }

    pub fn is_visible(&self) -> bool {
        self.state != OverlayState::Hidden
    }

    pub fn is_loading(&self) -> bool {
        self.state == OverlayState::Loading
    }

    /// Status of the displayed error, if any
    pub fn error_status(&self) -> Option<u16> {
        match &self.state {
            OverlayState::Error { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_overlay_stays_hidden() {
        let mut overlay = Overlay::new();
        overlay.show_loading();
        assert!(!overlay.is_visible());

        overlay.bind("frame");
        overlay.show_loading();
        assert!(overlay.is_loading());

        overlay.show_error(503, Element::empty());
        assert_eq!(overlay.error_status(), Some(503));

        overlay.unbind();
        assert!(!overlay.is_visible());
        assert_eq!(overlay.target(), None);
    }
}
