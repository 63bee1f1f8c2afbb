//! Reactive position constraint.

use crate::{Extension, ExtensionContext};
use tactum_animation::AxisClamp;
use tactum_geometry::Point;

#[derive(Clone, Copy, Debug, Default)]
struct AxisRule {
    /// Pin the axis to the value it had when the lock was enabled.
    locked: Option<f32>,
    clamp: AxisClamp,
}

impl AxisRule {
    fn apply(&self, value: f32) -> f32 {
        match self.locked {
            Some(pinned) => pinned,
            None => self.clamp.apply(value),
        }
    }
}

/// Keeps the node's position inside per-axis rules, re-applied whenever the
/// position changes (by other extensions, animators, or direct writes).
///
/// Runs after earlier-attached extensions in the same frame, so it acts as
/// the final word on where the node may sit.
#[derive(Default)]
pub struct Constrain {
    x: AxisRule,
    y: AxisRule,
    pending_lock_x: bool,
    pending_lock_y: bool,
    seen_revision: u64,
}

impl Constrain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the axis to its position at the next update.
    pub fn lock_x(&mut self) {
        self.pending_lock_x = true;
    }

    pub fn lock_y(&mut self) {
        self.pending_lock_y = true;
    }

    pub fn unlock_x(&mut self) {
        self.pending_lock_x = false;
        self.x.locked = None;
    }

    pub fn unlock_y(&mut self) {
        self.pending_lock_y = false;
        self.y.locked = None;
    }

    pub fn clamp_x(&mut self, min: Option<f32>, max: Option<f32>) {
        self.x.clamp = AxisClamp { min, max };
    }

    pub fn clamp_y(&mut self, min: Option<f32>, max: Option<f32>) {
        self.y.clamp = AxisClamp { min, max };
    }

    pub fn with_clamp_x(mut self, min: Option<f32>, max: Option<f32>) -> Self {
        self.clamp_x(min, max);
        self
    }

    pub fn with_clamp_y(mut self, min: Option<f32>, max: Option<f32>) -> Self {
        self.clamp_y(min, max);
        self
    }
}

impl Extension for Constrain {
    fn setup(&mut self, ctx: &mut ExtensionContext<'_>) {
        self.seen_revision = ctx.scene.position_revision(ctx.node);
    }

    fn teardown(&mut self, _ctx: &mut ExtensionContext<'_>) {}

    fn update(&mut self, ctx: &mut ExtensionContext<'_>, _dt_ms: f64) {
        let position = ctx.scene.position(ctx.node);
        if self.pending_lock_x {
            self.pending_lock_x = false;
            self.x.locked = Some(position.x);
        }
        if self.pending_lock_y {
            self.pending_lock_y = false;
            self.y.locked = Some(position.y);
        }

        let revision = ctx.scene.position_revision(ctx.node);
        if revision == self.seen_revision {
            return;
        }
        self.seen_revision = revision;

        let constrained = Point::new(self.x.apply(position.x), self.y.apply(position.y));
        if constrained != position {
            ctx.scene.set_position(ctx.node, constrained);
            // Our own write bumps the revision; swallow it so the node is
            // left alone until someone else moves it again.
            self.seen_revision = ctx.scene.position_revision(ctx.node);
        }
    }

    fn debug_state(&self) -> String {
        format!(
            "Constrain {{ lock: ({:?}, {:?}), clamp_x: [{:?}, {:?}], clamp_y: [{:?}, {:?}] }}",
            self.x.locked,
            self.y.locked,
            self.x.clamp.min,
            self.x.clamp.max,
            self.y.clamp.min,
            self.y.clamp.max
        )
    }
}
