//! Two-touch pinch scaling.

use crate::{Extension, ExtensionContext};
use std::cell::RefCell;
use std::rc::Rc;
use tactum_animation::{Space, TransformAnimator};
use tactum_events::{ListenerOwner, TouchId, TouchType};
use tactum_geometry::{Point, Size};

/// Which transform channel the pinch factor drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinchMode {
    /// Multiply the node's scale.
    Scale,
    /// Multiply the node's size, leaving scale alone.
    Size,
}

#[derive(Default)]
struct Slots {
    bound: [Option<TouchId>; 2],
}

impl Slots {
    fn claim(&mut self, id: TouchId) {
        if self.bound.contains(&Some(id)) {
            return;
        }
        if let Some(slot) = self.bound.iter_mut().find(|s| s.is_none()) {
            *slot = Some(id);
        }
        // Two already bound; extra touches are ignored.
    }

    fn release(&mut self, id: TouchId) {
        for slot in self.bound.iter_mut() {
            if *slot == Some(id) {
                *slot = None;
            }
        }
    }

    fn pair(&self) -> Option<(TouchId, TouchId)> {
        match self.bound {
            [Some(a), Some(b)] => Some((a, b)),
            _ => None,
        }
    }
}

struct PinchOrigin {
    global_position: Point,
    scale: Point,
    size: Size,
    start_a: Point,
    start_b: Point,
    start_centroid: Point,
}

/// Scales the node by the ratio of the touch-pair separation to its
/// separation when the pinch began, keeping the pair's centroid visually
/// anchored. Bounds are not enforced here; pair with [`crate::Constrain`]
/// when the result must stay inside limits.
pub struct PinchZoom {
    mode: PinchMode,
    owner: ListenerOwner,
    slots: Rc<RefCell<Slots>>,
    animator: TransformAnimator,
    origin: Option<PinchOrigin>,
}

impl PinchZoom {
    pub fn new(mode: PinchMode) -> Self {
        Self {
            mode,
            owner: ListenerOwner::unique(),
            slots: Rc::new(RefCell::new(Slots::default())),
            animator: TransformAnimator::default(),
            origin: None,
        }
    }

    pub fn animator_mut(&mut self) -> &mut TransformAnimator {
        &mut self.animator
    }

    pub fn is_pinching(&self) -> bool {
        self.origin.is_some()
    }

    fn axis_factor(start: f32, current: f32) -> f32 {
        // A degenerate start separation on an axis contributes no scaling.
        if start.abs() < f32::EPSILON {
            1.0
        } else {
            (current / start).abs()
        }
    }
}

impl Extension for PinchZoom {
    fn setup(&mut self, ctx: &mut ExtensionContext<'_>) {
        let slots = Rc::clone(&self.slots);
        ctx.touch.add_listener(
            Some(ctx.node),
            Some(TouchType::Down),
            self.owner,
            Rc::new(move |event| slots.borrow_mut().claim(event.touch_id)),
        );
        let slots = Rc::clone(&self.slots);
        ctx.touch.add_listener(
            Some(ctx.node),
            Some(TouchType::Up),
            self.owner,
            Rc::new(move |event| slots.borrow_mut().release(event.touch_id)),
        );
    }

    fn teardown(&mut self, ctx: &mut ExtensionContext<'_>) {
        ctx.touch.remove_listeners(self.owner);
        self.origin = None;
    }

    fn update(&mut self, ctx: &mut ExtensionContext<'_>, dt_ms: f64) {
        let pair = self.slots.borrow().pair();
        let positions = pair.and_then(|(a, b)| {
            let pa = ctx.touch.session(a).filter(|s| !s.finished)?.position;
            let pb = ctx.touch.session(b).filter(|s| !s.finished)?.position;
            Some((pa, pb))
        });

        match positions {
            Some((pa, pb)) => {
                let origin = self.origin.get_or_insert_with(|| PinchOrigin {
                    global_position: ctx.scene.global_position(ctx.node),
                    scale: ctx.scene.scale(ctx.node),
                    size: ctx.scene.size(ctx.node),
                    start_a: pa,
                    start_b: pb,
                    // The pinch measures from where both touches were when
                    // the pair completed, not from their DOWN positions.
                    start_centroid: (pa + pb) * 0.5,
                });

                let start_delta = origin.start_b - origin.start_a;
                let delta = pb - pa;
                let fx = Self::axis_factor(start_delta.x, delta.x);
                let fy = Self::axis_factor(start_delta.y, delta.y);

                match self.mode {
                    PinchMode::Scale => self
                        .animator
                        .set_scale_target(Point::new(origin.scale.x * fx, origin.scale.y * fy)),
                    PinchMode::Size => self.animator.set_size_target(Size::new(
                        origin.size.width * fx,
                        origin.size.height * fy,
                    )),
                }

                // Anchor the centroid: the point of the node under the start
                // centroid must land under the current centroid after scaling.
                let centroid = (pa + pb) * 0.5;
                let arm = origin.start_centroid - origin.global_position;
                let position = centroid - Point::new(arm.x * fx, arm.y * fy);
                self.animator.set_position_target(position, Space::Global);
            }
            // Fewer than two alive touches ends the pinch; in-flight targets
            // settle on their own and the next pair re-anchors.
            None => self.origin = None,
        }

        self.animator.update(ctx.scene, ctx.node, dt_ms, ctx.budget);
    }

    fn debug_state(&self) -> String {
        format!(
            "PinchZoom {{ mode: {:?}, pinching: {}, slots: {:?} }}",
            self.mode,
            self.origin.is_some(),
            self.slots.borrow().bound
        )
    }
}
