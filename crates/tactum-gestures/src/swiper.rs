//! Drag with inertia, offset limits, rubber-band slack, and grid snapping.

use crate::{Extension, ExtensionContext};
use std::cell::RefCell;
use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;
use tactum_animation::{AxisClamp, Space, TransformAnimator};
use tactum_events::{ListenerOwner, TouchId, TouchType};
use tactum_geometry::Point;
use tactum_scene::{NodeId, Scene};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwipePhase {
    Resting,
    Dragging,
    /// Coasting on release velocity, no grid yet.
    Damping,
    /// Animating toward a grid point or back inside the limits.
    Snapping,
}

#[derive(Clone, Copy, Debug)]
pub struct SwiperConfig {
    /// Grid spacing per axis; 0 disables the grid on that axis.
    pub snap_interval: Point,
    /// Local-position limits. Unset sides are unbounded.
    pub limit_x: AxisClamp,
    pub limit_y: AxisClamp,
    /// Snap to the grid on release instead of free coasting.
    pub snap: bool,
    /// Seconds of smoothed velocity added to the release position when
    /// picking the throw target.
    pub throw_factor: f32,
    /// Residual animator movement below which damping hands over to snapping.
    pub snap_velocity_mag: f32,
    /// Touches shorter than this release straight to rest (or snap).
    pub min_damping_duration_ms: f64,
    /// Width of the sine-eased overshoot zone past each limit; 0 clamps hard.
    pub slack: Point,
}

impl Default for SwiperConfig {
    fn default() -> Self {
        Self {
            snap_interval: Point::ZERO,
            limit_x: AxisClamp::default(),
            limit_y: AxisClamp::default(),
            snap: false,
            throw_factor: 0.15,
            snap_velocity_mag: 0.5,
            min_damping_duration_ms: 120.0,
            slack: Point::new(60.0, 60.0),
        }
    }
}

#[derive(Clone, Copy)]
struct Release {
    smoothed_velocity: Point,
    duration_ms: f64,
}

#[derive(Default)]
struct Intent {
    bound: Option<TouchId>,
    down_ts_ms: f64,
    release: Option<Release>,
}

#[derive(Default)]
struct ControllerState {
    pending_steps: i32,
}

/// Shared handle for driving a [`Swiper`] programmatically.
#[derive(Clone, Default)]
pub struct SwiperController {
    state: Rc<RefCell<ControllerState>>,
}

impl SwiperController {
    /// Moves exactly `n` grid intervals (negative for the other direction),
    /// composing with any snap already in flight.
    pub fn step(&self, n: i32) {
        self.state.borrow_mut().pending_steps += n;
    }
}

/// Pager/scroller behavior over the node's local position.
pub struct Swiper {
    config: SwiperConfig,
    owner: ListenerOwner,
    intent: Rc<RefCell<Intent>>,
    controller: SwiperController,
    animator: TransformAnimator,
    phase: SwipePhase,
    origin_local: Point,
    /// Per-axis sign of the throw, for directional grid rounding.
    approach: Point,
}

impl Swiper {
    pub fn new(config: SwiperConfig) -> Self {
        Self {
            config,
            owner: ListenerOwner::unique(),
            intent: Rc::new(RefCell::new(Intent::default())),
            controller: SwiperController::default(),
            animator: TransformAnimator::default(),
            phase: SwipePhase::Resting,
            origin_local: Point::ZERO,
            approach: Point::ZERO,
        }
    }

    pub fn controller(&self) -> SwiperController {
        self.controller.clone()
    }

    pub fn phase(&self) -> SwipePhase {
        self.phase
    }

    pub fn animator_mut(&mut self) -> &mut TransformAnimator {
        &mut self.animator
    }

    /// Eases `value` into the slack zone past `[limit]`; inside the limits it
    /// passes through unchanged. The ease has unit slope at the limit and
    /// flattens out at `slack` beyond it.
    fn slack_ease(limit: AxisClamp, slack: f32, value: f32) -> f32 {
        let over = |excess: f32| {
            if slack <= 0.0 {
                0.0
            } else {
                let t = (excess / (slack * FRAC_PI_2)).clamp(0.0, 1.0);
                slack * (t * FRAC_PI_2).sin()
            }
        };
        if let Some(max) = limit.max {
            if value > max {
                return max + over(value - max);
            }
        }
        if let Some(min) = limit.min {
            if value < min {
                return min - over(min - value);
            }
        }
        value
    }

    /// Rounds `value` to the grid, over-rounding in the approach direction
    /// only when the remainder passes half the interval.
    fn snap_round(interval: f32, approach: f32, value: f32) -> f32 {
        if interval <= 0.0 {
            return value;
        }
        let r = value.rem_euclid(interval);
        let base = value - r;
        let half = interval / 2.0;
        let up = if approach < 0.0 { r >= half } else { r > half };
        if up {
            base + interval
        } else {
            base
        }
    }

    fn outside_limits(&self, p: Point) -> bool {
        self.config.limit_x.apply(p.x) != p.x || self.config.limit_y.apply(p.y) != p.y
    }

    fn snap_target(&self, from: Point) -> Point {
        let clamped = Point::new(
            self.config.limit_x.apply(from.x),
            self.config.limit_y.apply(from.y),
        );
        Point::new(
            Self::snap_round(self.config.snap_interval.x, self.approach.x, clamped.x),
            Self::snap_round(self.config.snap_interval.y, self.approach.y, clamped.y),
        )
    }

    fn begin_snap(&mut self, from: Point) {
        let target = self.snap_target(from);
        self.animator.set_position_target(target, Space::Local);
        self.phase = SwipePhase::Snapping;
    }

    fn offset_in_parent(scene: &Scene, node: NodeId, offset: Point) -> Point {
        match scene.parent(node) {
            Some(parent) => scene.vector_to_local(parent, offset),
            None => offset,
        }
    }
}

impl Extension for Swiper {
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
                    intent.down_ts_ms = event.timestamp_ms;
                    intent.release = None;
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
                    // The manager destroys the session before update runs,
                    // so everything the release needs is captured here.
                    intent.release = Some(Release {
                        smoothed_velocity: event.smoothed_velocity,
                        duration_ms: event.timestamp_ms - intent.down_ts_ms,
                    });
                }
            }),
        );
    }

    fn teardown(&mut self, ctx: &mut ExtensionContext<'_>) {
        ctx.touch.remove_listeners(self.owner);
        self.animator.clear_all();
        self.phase = SwipePhase::Resting;
    }

    fn update(&mut self, ctx: &mut ExtensionContext<'_>, dt_ms: f64) {
        let (bound, release) = {
            let intent = self.intent.borrow();
            (intent.bound, intent.release)
        };

        if let Some(id) = bound {
            if let Some(release) = release {
                self.intent.borrow_mut().bound = None;
                self.intent.borrow_mut().release = None;
                self.finish_drag(ctx, release);
            } else {
                match ctx.touch.session(id) {
                    Some(session) if !session.finished => {
                        let offset = session.offset();
                        if self.phase != SwipePhase::Dragging {
                            self.animator.clear_all();
                            // offset() is measured from DOWN, so the origin
                            // is wherever the node sat at that moment.
                            self.origin_local = ctx.scene.position(ctx.node)
                                - Self::offset_in_parent(ctx.scene, ctx.node, offset);
                            self.phase = SwipePhase::Dragging;
                        }
                        let desired =
                            self.origin_local + Self::offset_in_parent(ctx.scene, ctx.node, offset);
                        let eased = Point::new(
                            Self::slack_ease(self.config.limit_x, self.config.slack.x, desired.x),
                            Self::slack_ease(self.config.limit_y, self.config.slack.y, desired.y),
                        );
                        ctx.scene.set_position(ctx.node, eased);
                    }
                    // Session vanished without an UP listener firing, e.g.
                    // reaped; treat as a dead-stop release.
                    _ => {
                        self.intent.borrow_mut().bound = None;
                        self.finish_drag(
                            ctx,
                            Release {
                                smoothed_velocity: Point::ZERO,
                                duration_ms: 0.0,
                            },
                        );
                    }
                }
            }
        }

        // Steps queued during a drag stay pending until the touch lifts.
        let steps = if self.phase == SwipePhase::Dragging {
            0
        } else {
            std::mem::take(&mut self.controller.state.borrow_mut().pending_steps)
        };
        if steps != 0 {
            let delta = self.config.snap_interval * steps as f32;
            self.approach = Point::new(delta.x.signum(), delta.y.signum());
            if self.phase == SwipePhase::Snapping && self.animator.is_animating() {
                self.animator.offset_position_target(delta);
            } else {
                let from = self.snap_target(ctx.scene.position(ctx.node)) + delta;
                let clamped = Point::new(
                    self.config.limit_x.apply(from.x),
                    self.config.limit_y.apply(from.y),
                );
                self.animator.set_position_target(clamped, Space::Local);
                self.phase = SwipePhase::Snapping;
            }
        }

        self.animator.update(ctx.scene, ctx.node, dt_ms, ctx.budget);

        match self.phase {
            SwipePhase::Damping => {
                let residual = self.animator.residual_position_delta();
                if self.config.snap && residual < self.config.snap_velocity_mag {
                    self.animator.clear_position_target();
                    self.begin_snap(ctx.scene.position(ctx.node));
                } else if !self.animator.is_animating() {
                    self.phase = SwipePhase::Resting;
                }
            }
            SwipePhase::Snapping => {
                if !self.animator.is_animating() {
                    let p = ctx.scene.position(ctx.node);
                    if self.outside_limits(p) {
                        // Corrective re-snap back inside the limits.
                        self.begin_snap(p);
                    } else {
                        self.phase = SwipePhase::Resting;
                    }
                }
            }
            _ => {}
        }
    }

    fn debug_state(&self) -> String {
        format!(
            "Swiper {{ phase: {:?}, origin: ({:.1}, {:.1}) }}",
            self.phase, self.origin_local.x, self.origin_local.y
        )
    }
}

impl Swiper {
    fn finish_drag(&mut self, ctx: &mut ExtensionContext<'_>, release: Release) {
        let position = ctx.scene.position(ctx.node);
        let throw = release.smoothed_velocity * self.config.throw_factor;
        self.approach = Point::new(throw.x.signum(), throw.y.signum());

        if self.outside_limits(position) || self.config.snap {
            self.begin_snap(position + throw);
        } else if release.duration_ms >= self.config.min_damping_duration_ms {
            let target = Point::new(
                self.config.limit_x.apply(position.x + throw.x),
                self.config.limit_y.apply(position.y + throw.y),
            );
            self.animator.set_position_target(target, Space::Local);
            self.phase = SwipePhase::Damping;
        } else {
            self.phase = SwipePhase::Resting;
        }
    }
}
