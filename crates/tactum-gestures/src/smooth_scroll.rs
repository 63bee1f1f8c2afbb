//! Drag plus velocity damping, without limits or snapping.

use crate::{Extension, ExtensionContext};
use std::cell::RefCell;
use std::rc::Rc;
use tactum_animation::{Space, TransformAnimator};
use tactum_events::{ListenerOwner, TouchId, TouchType};
use tactum_geometry::Point;

#[derive(Default)]
struct Intent {
    bound: Option<TouchId>,
    /// Smoothed velocity captured by the UP listener.
    release_velocity: Option<Point>,
}

/// Minimal scrolling: follow the touch while it lasts, then coast on the
/// release velocity until the animator settles.
pub struct SmoothScroll {
    owner: ListenerOwner,
    intent: Rc<RefCell<Intent>>,
    animator: TransformAnimator,
    /// Seconds of release velocity converted into coast distance.
    pub throw_factor: f32,
    dragging: bool,
    origin_local: Point,
}

impl Default for SmoothScroll {
    fn default() -> Self {
        Self::new()
    }
}

impl SmoothScroll {
    pub fn new() -> Self {
        Self {
            owner: ListenerOwner::unique(),
            intent: Rc::new(RefCell::new(Intent::default())),
            animator: TransformAnimator::default(),
            throw_factor: 0.15,
            dragging: false,
            origin_local: Point::ZERO,
        }
    }

    pub fn is_scrolling(&self) -> bool {
        self.dragging || self.animator.is_animating()
    }
}

impl Extension for SmoothScroll {
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
                    intent.release_velocity = None;
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
                    intent.release_velocity = Some(event.smoothed_velocity);
                }
            }),
        );
    }

    fn teardown(&mut self, ctx: &mut ExtensionContext<'_>) {
        ctx.touch.remove_listeners(self.owner);
        self.animator.clear_all();
        self.dragging = false;
    }

    fn update(&mut self, ctx: &mut ExtensionContext<'_>, dt_ms: f64) {
        let (bound, release_velocity) = {
            let intent = self.intent.borrow();
            (intent.bound, intent.release_velocity)
        };

        if let Some(id) = bound {
            if let Some(velocity) = release_velocity {
                let mut intent = self.intent.borrow_mut();
                intent.bound = None;
                intent.release_velocity = None;
                drop(intent);
                self.dragging = false;
                let target = ctx.scene.position(ctx.node) + velocity * self.throw_factor;
                self.animator.set_position_target(target, Space::Local);
            } else {
                match ctx.touch.session(id) {
                    Some(session) if !session.finished => {
                        let offset = session.offset();
                        if !self.dragging {
                            self.animator.clear_all();
                            self.origin_local = ctx.scene.position(ctx.node) - offset;
                            self.dragging = true;
                        }
                        ctx.scene.set_position(ctx.node, self.origin_local + offset);
                    }
                    _ => {
                        // Reaped without an UP reaching us; stop dead.
                        self.intent.borrow_mut().bound = None;
                        self.dragging = false;
                    }
                }
            }
        }

        self.animator.update(ctx.scene, ctx.node, dt_ms, ctx.budget);
    }

    fn debug_state(&self) -> String {
        format!(
            "SmoothScroll {{ dragging: {}, coasting: {} }}",
            self.dragging,
            self.animator.is_animating()
        )
    }
}
