//! Per-node extension attachment and frame ordering.

use crate::{Extension, ExtensionContext};
use smallvec::SmallVec;
use tactum_animation::TickBudget;
use tactum_input::TouchManager;
use tactum_scene::{NodeId, Scene};

struct HostEntry {
    node: NodeId,
    extensions: SmallVec<[Box<dyn Extension>; 2]>,
}

/// Owns every attached extension, keyed by node, updated in attach order.
///
/// A node's extensions belong to the node conceptually; the host carries them
/// so the scene arena stays plain data. When a node disappears from the
/// scene its extensions are torn down on the next update.
#[derive(Default)]
pub struct ExtensionHost {
    entries: Vec<HostEntry>,
}

impl ExtensionHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches and sets up an extension on `node`.
    pub fn attach(
        &mut self,
        scene: &mut Scene,
        touch: &mut TouchManager,
        budget: &mut TickBudget,
        node: NodeId,
        mut extension: Box<dyn Extension>,
    ) {
        let mut ctx = ExtensionContext {
            scene,
            touch,
            node,
            budget,
        };
        extension.setup(&mut ctx);
        match self.entries.iter_mut().find(|e| e.node == node) {
            Some(entry) => entry.extensions.push(extension),
            None => {
                let mut extensions = SmallVec::new();
                extensions.push(extension);
                self.entries.push(HostEntry { node, extensions });
            }
        }
    }

    /// Tears down and drops every extension attached to `node`.
    pub fn detach_node(
        &mut self,
        scene: &mut Scene,
        touch: &mut TouchManager,
        budget: &mut TickBudget,
        node: NodeId,
    ) {
        let Some(index) = self.entries.iter().position(|e| e.node == node) else {
            return;
        };
        let mut entry = self.entries.remove(index);
        for extension in entry.extensions.iter_mut() {
            let mut ctx = ExtensionContext {
                scene,
                touch,
                node,
                budget,
            };
            extension.teardown(&mut ctx);
        }
    }

    /// Runs every extension's update in attach order, pruning extensions
    /// whose node no longer exists.
    pub fn update(
        &mut self,
        scene: &mut Scene,
        touch: &mut TouchManager,
        budget: &mut TickBudget,
        dt_ms: f64,
    ) {
        let mut index = 0;
        while index < self.entries.len() {
            let node = self.entries[index].node;
            if !scene.contains(node) {
                log::debug!("node {node:?} gone; tearing down its extensions");
                let mut entry = self.entries.remove(index);
                for extension in entry.extensions.iter_mut() {
                    let mut ctx = ExtensionContext {
                        scene,
                        touch,
                        node,
                        budget,
                    };
                    extension.teardown(&mut ctx);
                }
                touch.remove_node_listeners(node);
                continue;
            }
            // Take the list out so extensions can borrow the host's other
            // collaborators mutably while running.
            let mut extensions = std::mem::take(&mut self.entries[index].extensions);
            for extension in extensions.iter_mut() {
                let mut ctx = ExtensionContext {
                    scene,
                    touch,
                    node,
                    budget,
                };
                extension.update(&mut ctx, dt_ms);
            }
            self.entries[index].extensions = extensions;
            index += 1;
        }
    }

    pub fn extension_count(&self) -> usize {
        self.entries.iter().map(|e| e.extensions.len()).sum()
    }

    /// Debug description of every attached extension, for overlays.
    pub fn debug_states(&self) -> Vec<(NodeId, String)> {
        self.entries
            .iter()
            .flat_map(|e| {
                e.extensions
                    .iter()
                    .map(move |ext| (e.node, ext.debug_state()))
            })
            .collect()
    }
}
