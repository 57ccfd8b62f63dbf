//! The element a frame renders into

use crate::content::Element;

/// Host element of a frame's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delegate {
    id: String,
    content: Element,
}

impl Delegate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: Element::empty(),
        }
    }

    pub fn with_content(mut self, content: Element) -> Self {
        self.content = content;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &Element {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Remove all children
    pub fn empty(&mut self) {
        self.content = Element::empty();
    }

    pub fn append(&mut self, element: &Element) {
        self.content.append(element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_then_append() {
        let first = Element::parse("<p>one</p>").unwrap();
        let second = Element::parse("<p>two</p>").unwrap();

        let mut delegate = Delegate::new("frame").with_content(first);
        assert!(!delegate.is_empty());

        delegate.empty();
        assert!(delegate.is_empty());

        delegate.append(&second);
        assert_eq!(delegate.content(), &second);
        assert_eq!(delegate.id(), "frame");
    }
}
