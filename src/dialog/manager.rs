//! Dialog registry owning the dialogs of a page
//!
//! Dialogs are kept in a stack (last = topmost) with an id -> index map, so
//! callers address them by [`DialogId`] instead of holding references.

use super::{Dialog, DialogError, DialogResult, DialogServices, DialogState, ToolkitEvent};
use super::types::DialogId;
use crate::config::{DialogOptions, DialogPatch};
use std::collections::HashMap;
use tracing::debug;

pub struct DialogRegistry {
    /// Stack of dialogs (last = topmost)
    dialogs: Vec<Dialog>,

    /// Map of dialog IDs to their position in the stack
    id_map: HashMap<DialogId, usize>,

    /// Services handed to dialogs built by [`DialogRegistry::create`]
    services: DialogServices,
}

impl DialogRegistry {
    pub fn new(services: DialogServices) -> Self {
        Self {
            dialogs: Vec::new(),
            id_map: HashMap::new(),
            services,
        }
    }

    pub fn services(&self) -> &DialogServices {
        &self.services
    }

    /// Build a dialog from `options` and register it
    pub fn create(&mut self, options: DialogOptions) -> DialogResult<DialogId> {
        let dialog = Dialog::new(options, self.services.clone())?;
        self.register(dialog)
    }

    /// Take ownership of a dialog; ids must be unique
    pub fn register(&mut self, dialog: Dialog) -> DialogResult<DialogId> {
        let dialog_id = dialog.id().clone();

        if self.id_map.contains_key(&dialog_id) {
            return Err(DialogError::AlreadyExists(dialog_id));
        }

        debug!(dialog = %dialog_id, "dialog registered");
        self.id_map.insert(dialog_id.clone(), self.dialogs.len());
        self.dialogs.push(dialog);

        Ok(dialog_id)
    }

    pub fn get(&self, dialog_id: &DialogId) -> Option<&Dialog> {
        self.id_map.get(dialog_id).and_then(|&idx| self.dialogs.get(idx))
    }

    pub fn get_mut(&mut self, dialog_id: &DialogId) -> Option<&mut Dialog> {
        match self.id_map.get(dialog_id) {
            Some(&idx) => self.dialogs.get_mut(idx),
            None => None,
        }
    }

    fn require(&mut self, dialog_id: &DialogId) -> DialogResult<&mut Dialog> {
        self.get_mut(dialog_id)
            .ok_or_else(|| DialogError::NotFound(dialog_id.clone()))
    }

    pub fn open(&mut self, dialog_id: &DialogId, patch: Option<DialogPatch>) -> DialogResult<()> {
        self.require(dialog_id)?.open(patch)
    }

    pub fn close(&mut self, dialog_id: &DialogId) -> DialogResult<()> {
        self.require(dialog_id)?.close()
    }

    /// Close the topmost dialog that is still open
    pub fn close_topmost(&mut self) -> DialogResult<Option<DialogId>> {
        let topmost = self
            .dialogs
            .iter_mut()
            .rev()
            .find(|dialog| !dialog.state().is_closing_or_closed() && dialog.handle().is_some());

        match topmost {
            Some(dialog) => {
                dialog.close()?;
                Ok(Some(dialog.id().clone()))
            }
            None => Ok(None),
        }
    }

    /// Close every opened dialog, topmost first
    pub fn close_all(&mut self) -> DialogResult<()> {
        for dialog in self.dialogs.iter_mut().rev() {
            if dialog.state() != DialogState::Unopened {
                dialog.close()?;
            }
        }
        Ok(())
    }

    /// Route a toolkit callback to its dialog
    pub fn dispatch(&mut self, dialog_id: &DialogId, event: ToolkitEvent) -> DialogResult<()> {
        self.require(dialog_id)?.handle_toolkit_event(event)
    }

    /// Drive every dialog until none has pending work
    pub async fn run_until_idle(&mut self) -> DialogResult<()> {
        for dialog in self.dialogs.iter_mut() {
            if dialog.state() != DialogState::Unopened {
                dialog.run_until_idle().await?;
            }
        }
        Ok(())
    }

    /// Unregister a dialog and hand it back
    pub fn remove(&mut self, dialog_id: &DialogId) -> Option<Dialog> {
        let index = self.id_map.remove(dialog_id)?;
        let dialog = self.dialogs.remove(index);
        self.update_id_map_after_removal(index);
        Some(dialog)
    }

    /// Drop closed dialogs, returning their ids
    pub fn reap_closed(&mut self) -> Vec<DialogId> {
        let closed: Vec<DialogId> = self
            .dialogs
            .iter()
            .filter(|dialog| dialog.state() == DialogState::Closed)
            .map(|dialog| dialog.id().clone())
            .collect();

        for dialog_id in &closed {
            self.remove(dialog_id);
        }

        closed
    }

    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }

    pub fn dialog_ids(&self) -> Vec<DialogId> {
        self.dialogs.iter().map(|dialog| dialog.id().clone()).collect()
    }

    pub fn topmost_id(&self) -> Option<DialogId> {
        self.dialogs.last().map(|dialog| dialog.id().clone())
    }

    /// Update ID map after removing a dialog at the given index
    fn update_id_map_after_removal(&mut self, removed_index: usize) {
        for (_, index) in self.id_map.iter_mut() {
            if *index > removed_index {
                *index -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::HeadlessToolkit;
    use crate::testing::MockBackend;
    use std::sync::Arc;

    fn registry() -> (DialogRegistry, Arc<HeadlessToolkit>) {
        let toolkit = Arc::new(HeadlessToolkit::new());
        let services = DialogServices::new(Arc::new(MockBackend::new()), toolkit.clone());
        (DialogRegistry::new(services), toolkit)
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let (mut registry, _) = registry();
        registry.create(DialogOptions::new().with_id("edit")).unwrap();

        assert_eq!(
            registry.create(DialogOptions::new().with_id("edit")),
            Err(DialogError::AlreadyExists(DialogId::new("edit")))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_dialog() {
        let (mut registry, _) = registry();
        let missing = DialogId::new("missing");
        assert_eq!(registry.close(&missing), Err(DialogError::NotFound(missing.clone())));
        assert!(registry.get(&missing).is_none());
    }

    #[tokio::test]
    async fn test_close_topmost_and_reap() {
        let (mut registry, toolkit) = registry();
        let first = registry.create(DialogOptions::new().with_id("first")).unwrap();
        let second = registry.create(DialogOptions::new().with_id("second")).unwrap();

        registry.open(&first, None).unwrap();
        registry.open(&second, None).unwrap();
        registry.run_until_idle().await.unwrap();
        assert_eq!(toolkit.open_windows(), 2);
        assert_eq!(registry.topmost_id(), Some(second.clone()));

        assert_eq!(registry.close_topmost().unwrap(), Some(second.clone()));
        assert_eq!(registry.reap_closed(), vec![second]);
        assert_eq!(registry.dialog_ids(), vec![first.clone()]);
        assert_eq!(registry.get(&first).unwrap().state(), DialogState::Open);

        registry.close_all().unwrap();
        assert_eq!(toolkit.open_windows(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_routes_toolkit_events() {
        let (mut registry, _) = registry();
        let id = registry.create(DialogOptions::new()).unwrap();
        registry.open(&id, None).unwrap();
        registry.run_until_idle().await.unwrap();

        registry.dispatch(&id, ToolkitEvent::CloseRequested).unwrap();
        assert_eq!(registry.get(&id).unwrap().state(), DialogState::Closed);
    }

    #[test]
    fn test_remove_keeps_indices_consistent() {
        let (mut registry, _) = registry();
        let a = registry.create(DialogOptions::new().with_id("a")).unwrap();
        let b = registry.create(DialogOptions::new().with_id("b")).unwrap();
        let c = registry.create(DialogOptions::new().with_id("c")).unwrap();

        assert!(registry.remove(&a).is_some());
        assert_eq!(registry.get(&c).unwrap().id(), &c);
        assert_eq!(registry.get(&b).unwrap().id(), &b);
        assert!(registry.remove(&a).is_none());
    }
}
