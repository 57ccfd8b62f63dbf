//! Seam for the widgets living inside frame content

use super::Delegate;

/// Activates and deactivates the sub-widgets of a delegate's content.
///
/// Called around every content swap: `deactivate` before the old content is
/// removed, `activate` once the new content is in place.
pub trait WidgetRegistry: Send + Sync {
    fn activate(&self, root: &Delegate);
    fn deactivate(&self, root: &Delegate);
}

/// Registry for content without widgets
#[derive(Debug, Clone, Copy, Default)]
pub struct InertRegistry;

impl WidgetRegistry for InertRegistry {
    fn activate(&self, root: &Delegate) {
        tracing::trace!(root = root.id(), "activate");
    }

    fn deactivate(&self, root: &Delegate) {
        tracing::trace!(root = root.id(), "deactivate");
    }
}
