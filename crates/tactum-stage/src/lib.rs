//! Orchestration shell tying the scene, the touch manager, and the gesture
//! extensions into one frame loop.
//!
//! A [`Stage`] owns the whole session-engine state and fixes the per-frame
//! ordering: reset the transform budget, flush and dispatch touch input,
//! then run extension updates in attach order. Rendering is the embedder's
//! business; the stage hands out debug snapshots instead.

mod frame_timer;

pub use frame_timer::FrameTimer;

use tactum_animation::TickBudget;
use tactum_events::{ListenerOwner, TouchId, TouchListener, TouchType};
use tactum_gestures::{Extension, ExtensionHost};
use tactum_geometry::{Point, Size};
use tactum_input::{DispatchMode, SessionSnapshot, TouchManager, TouchManagerConfig, TouchSampleSender};
use tactum_scene::{NodeId, Scene};

pub struct Stage {
    scene: Scene,
    touch: TouchManager,
    extensions: ExtensionHost,
    budget: TickBudget,
    root: NodeId,
}

impl Stage {
    /// A stage with an interactive-root-less scene of the given extent and
    /// default touch configuration.
    pub fn new(root_size: Size) -> Self {
        Self::with_config(root_size, TouchManagerConfig::default())
    }

    pub fn with_config(root_size: Size, config: TouchManagerConfig) -> Self {
        let mut scene = Scene::new();
        let root = scene.add_node(None);
        scene.set_size(root, root_size);
        let mut touch = TouchManager::new(config);
        touch.set_root(Some(root));
        Self {
            scene,
            touch,
            extensions: ExtensionHost::new(),
            budget: TickBudget::default(),
            root,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn touch(&self) -> &TouchManager {
        &self.touch
    }

    // ------------------------------------------------------------------
    // Input ingestion
    // ------------------------------------------------------------------

    pub fn touch_down(&mut self, id: TouchId, position: Point) {
        self.touch.touch_down(&self.scene, id, position);
    }

    pub fn touch_move(&mut self, id: TouchId, position: Point, velocity: Option<Point>) {
        self.touch.touch_move(&self.scene, id, position, velocity);
    }

    pub fn touch_up(&mut self, id: TouchId, position: Point) {
        self.touch.touch_up(&self.scene, id, position);
    }

    pub fn set_dispatch_mode(&mut self, mode: DispatchMode) {
        self.touch.set_dispatch_mode(mode);
    }

    /// `Send` handle for transport bridges feeding samples from another
    /// thread; drained at the start of the next `update`.
    pub fn sample_sender(&self) -> TouchSampleSender {
        self.touch.sample_sender()
    }

    // ------------------------------------------------------------------
    // Listeners and extensions
    // ------------------------------------------------------------------

    pub fn add_listener(
        &mut self,
        node: Option<NodeId>,
        kind: Option<TouchType>,
        owner: ListenerOwner,
        listener: TouchListener,
    ) {
        self.touch.add_listener(node, kind, owner, listener);
    }

    pub fn remove_listeners(&mut self, owner: ListenerOwner) {
        self.touch.remove_listeners(owner);
    }

    pub fn attach(&mut self, node: NodeId, extension: Box<dyn Extension>) {
        if !self.scene.contains(node) {
            log::warn!("attach: node {node:?} is not in the scene; ignoring");
            return;
        }
        self.extensions.attach(
            &mut self.scene,
            &mut self.touch,
            &mut self.budget,
            node,
            extension,
        );
    }

    pub fn detach_node(&mut self, node: NodeId) {
        self.extensions.detach_node(
            &mut self.scene,
            &mut self.touch,
            &mut self.budget,
            node,
        );
        self.touch.remove_node_listeners(node);
    }

    pub fn extension_count(&self) -> usize {
        self.extensions.extension_count()
    }

    // ------------------------------------------------------------------
    // Frame loop
    // ------------------------------------------------------------------

    /// One frame: budget reset, input flush and dispatch, velocity decay and
    /// idle reaping, then extension updates in attach order.
    pub fn update(&mut self, dt_ms: f64) {
        self.budget.reset();
        self.touch.update(&self.scene, dt_ms);
        self.extensions
            .update(&mut self.scene, &mut self.touch, &mut self.budget, dt_ms);
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn session_snapshots(&self) -> Vec<SessionSnapshot> {
        self.touch.session_snapshots()
    }

    pub fn debug_states(&self) -> Vec<(NodeId, String)> {
        self.extensions.debug_states()
    }
}

#[cfg(test)]
#[path = "tests/stage_tests.rs"]
mod tests;
