//! Single-touch drag behavior.

use crate::{Extension, ExtensionContext};
use std::cell::RefCell;
use std::rc::Rc;
use tactum_animation::{Space, TransformAnimator};
use tactum_events::{ListenerOwner, TouchId, TouchType};
use tactum_geometry::Point;

#[derive(Clone, Copy, Debug)]
pub struct DraggableConfig {
    /// Suppress horizontal movement.
    pub lock_horizontal: bool,
    /// Suppress vertical movement.
    pub lock_vertical: bool,
    /// A second concurrent touch on the node aborts the drag.
    pub abort_on_second_touch: bool,
}

impl Default for DraggableConfig {
    fn default() -> Self {
        Self {
            lock_horizontal: false,
            lock_vertical: false,
            abort_on_second_touch: true,
        }
    }
}

/// Intent recorded by listeners, consumed by `update`.
#[derive(Default)]
struct Intent {
    bound: Option<TouchId>,
    second_touch: bool,
    released: bool,
}

/// Drags the node by the bound touch's offset from its DOWN position,
/// applied through the animator's global-position channel so the drag stays
/// correct while ancestors move underneath it.
pub struct Draggable {
    config: DraggableConfig,
    owner: ListenerOwner,
    intent: Rc<RefCell<Intent>>,
    animator: TransformAnimator,
    dragging: bool,
    origin_global: Point,
    on_start: Vec<Rc<dyn Fn()>>,
    on_end: Vec<Rc<dyn Fn()>>,
}

impl Draggable {
    pub fn new(config: DraggableConfig) -> Self {
        Self {
            config,
            owner: ListenerOwner::unique(),
            intent: Rc::new(RefCell::new(Intent::default())),
            animator: TransformAnimator::default(),
            dragging: false,
            origin_global: Point::ZERO,
            on_start: Vec::new(),
            on_end: Vec::new(),
        }
    }

    pub fn with_on_start(mut self, f: impl Fn() + 'static) -> Self {
        self.on_start.push(Rc::new(f));
        self
    }

    pub fn with_on_end(mut self, f: impl Fn() + 'static) -> Self {
        self.on_end.push(Rc::new(f));
        self
    }

    pub fn animator_mut(&mut self) -> &mut TransformAnimator {
        &mut self.animator
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn end_drag(&mut self) {
        self.dragging = false;
        self.intent.borrow_mut().bound = None;
        self.animator.clear_position_target();
        for f in &self.on_end {
            f();
        }
    }
}

impl Extension for Draggable {
    fn setup(&mut self, ctx: &mut ExtensionContext<'_>) {
        let intent = Rc::clone(&self.intent);
        ctx.touch.add_listener(
            Some(ctx.node),
            Some(TouchType::Down),
            self.owner,
            Rc::new(move |event| {
                let mut intent = intent.borrow_mut();
                if intent.bound.is_none() {
                    intent.bound = Some(event.touch_id);
                    intent.released = false;
                } else if intent.bound != Some(event.touch_id) {
                    intent.second_touch = true;
                }
            }),
        );
        let intent = Rc::clone(&self.intent);
        ctx.touch.add_listener(
            Some(ctx.node),
            Some(TouchType::Up),
            self.owner,
            Rc::new(move |event| {
                let mut intent = intent.borrow_mut();
                if intent.bound == Some(event.touch_id) {
                    intent.released = true;
                }
            }),
        );
    }

    fn teardown(&mut self, ctx: &mut ExtensionContext<'_>) {
        ctx.touch.remove_listeners(self.owner);
        if self.dragging {
            self.end_drag();
        }
    }

    fn update(&mut self, ctx: &mut ExtensionContext<'_>, dt_ms: f64) {
        let (bound, second_touch, released) = {
            let mut intent = self.intent.borrow_mut();
            let snapshot = (intent.bound, intent.second_touch, intent.released);
            intent.second_touch = false;
            snapshot
        };

        if let Some(id) = bound {
            let session_state = ctx
                .touch
                .session(id)
                .map(|s| (s.offset(), s.finished));

            if !self.dragging {
                match session_state {
                    Some((_, false)) => {
                        self.origin_global = ctx.scene.global_position(ctx.node);
                        self.dragging = true;
                        for f in &self.on_start {
                            f();
                        }
                    }
                    // Bound but already gone (raced an UP or a reap).
                    _ => {
                        self.intent.borrow_mut().bound = None;
                        self.intent.borrow_mut().released = false;
                    }
                }
            }

            if self.dragging {
                let aborted = second_touch && self.config.abort_on_second_touch;
                let gone = released || session_state.is_none();
                let finished = matches!(session_state, Some((_, true)));
                if aborted || gone || finished {
                    self.end_drag();
                } else if let Some((mut offset, _)) = session_state {
                    if self.config.lock_horizontal {
                        offset.x = 0.0;
                    }
                    if self.config.lock_vertical {
                        offset.y = 0.0;
                    }
                    self.animator
                        .set_position_target(self.origin_global + offset, Space::Global);
                }
            }
        }

        self.animator.update(ctx.scene, ctx.node, dt_ms, ctx.budget);
    }

    fn debug_state(&self) -> String {
        format!(
            "Draggable {{ dragging: {}, bound: {:?} }}",
            self.dragging,
            self.intent.borrow().bound
        )
    }
}
