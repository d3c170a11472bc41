//! Panel instance registry.
//!
//! An explicit map from panel identity to its controller, owned by
//! whatever constructs the panels. Instances are registered when a
//! panel root enters the document and torn down when it leaves; no
//! state hangs off the DOM itself.

use std::collections::HashMap;
use std::rc::Rc;

use panelkit_animation::EffectSink;
use panelkit_common::Result;
use panelkit_dom::PanelNode;
use tracing::debug;

use crate::controller::PanelController;
use crate::PanelId;

/// Registry of live panel instances.
#[derive(Debug, Default)]
pub struct PanelRegistry {
    panels: HashMap<PanelId, PanelController>,
}

impl PanelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build, seed, and register a controller for a panel root.
    /// Initialization failures propagate; nothing is registered then.
    pub fn create(&mut self, root: &Rc<PanelNode>, sink: Rc<dyn EffectSink>) -> Result<PanelId> {
        let controller = PanelController::new(root, sink)?;
        let id = controller.context().id;
        self.panels.insert(id, controller);
        debug!(panel = ?id, live = self.panels.len(), "Panel registered");
        Ok(id)
    }

    /// Look up an instance.
    pub fn get(&self, id: PanelId) -> Option<&PanelController> {
        self.panels.get(&id)
    }

    /// Look up an instance mutably.
    pub fn get_mut(&mut self, id: PanelId) -> Option<&mut PanelController> {
        self.panels.get_mut(&id)
    }

    /// Tear down and drop an instance when its panel leaves the
    /// document. Returns false for an unknown id.
    pub fn remove(&mut self, id: PanelId) -> bool {
        match self.panels.remove(&id) {
            Some(mut controller) => {
                controller.shutdown();
                debug!(panel = ?id, live = self.panels.len(), "Panel removed");
                true
            }
            None => false,
        }
    }

    /// Host "before update" tick, fanned out to every instance.
    pub fn before_update_all(&mut self) {
        for controller in self.panels.values_mut() {
            controller.before_update();
        }
    }

    /// Host "after update" tick, fanned out to every instance.
    pub fn after_update_all(&mut self) {
        for controller in self.panels.values_mut() {
            controller.after_update();
        }
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}
