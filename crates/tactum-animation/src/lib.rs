//! Smoothed transform animation.
//!
//! A [`TransformAnimator`] drives one node toward per-channel targets
//! (position, rotation, scale, size) by exponential approach: each update
//! applies `(target − current) / smooth_factor`, snapping and clearing the
//! channel once the step falls under the done threshold. A channel that has
//! not settled within `max_transformation_time_ms` is abandoned silently,
//! the backstop for targets that clamping makes unreachable.
//!
//! A `smooth_factor ≤ 1` applies targets immediately. Those unsmoothed
//! applications draw from a per-frame [`TickBudget`] shared by all animators,
//! which breaks feedback loops between cooperating behaviors that would
//! otherwise re-trigger each other within a single tick.

use tactum_geometry::{Point, Size};
use tactum_scene::{NodeId, Scene};

/// Per-frame allowance of unsmoothed transform applications.
#[derive(Debug)]
pub struct TickBudget {
    remaining: u32,
    limit: u32,
}

impl Default for TickBudget {
    fn default() -> Self {
        Self::new(9)
    }
}

impl TickBudget {
    pub fn new(limit: u32) -> Self {
        Self {
            remaining: limit,
            limit,
        }
    }

    /// Called by the frame host once per tick.
    pub fn reset(&mut self) {
        self.remaining = self.limit;
    }

    /// Takes one unit; returns false (and logs) when the budget is spent.
    pub fn try_consume(&mut self) -> bool {
        if self.remaining == 0 {
            log::warn!("transform tick budget exhausted; skipping unsmoothed application");
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Coordinate space of a position target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Space {
    /// Parent space — the space `Node::position` lives in.
    Local,
    /// Root space; re-resolved against the current parent transform on every
    /// application, so the target stays put while ancestors move.
    Global,
}

/// Optional per-axis bounds.
#[derive(Clone, Copy, Debug, Default)]
pub struct AxisClamp {
    pub min: Option<f32>,
    pub max: Option<f32>,
}

impl AxisClamp {
    pub fn apply(&self, value: f32) -> f32 {
        let mut v = value;
        if let Some(min) = self.min {
            v = v.max(min);
        }
        if let Some(max) = self.max {
            v = v.min(max);
        }
        v
    }
}

/// Settle thresholds and timing for a [`TransformAnimator`].
#[derive(Clone, Copy, Debug)]
pub struct TransformAnimatorConfig {
    /// Divisor of the remaining distance applied per tick; ≤ 1 means apply
    /// targets immediately (unsmoothed).
    pub smooth_factor: f32,
    /// A channel still unsettled after this long is abandoned.
    pub max_transformation_time_ms: f64,
    pub done_position_delta_mag: f32,
    pub done_rotation_delta: f32,
    pub done_scale_delta_mag: f32,
    pub done_size_delta_mag: f32,
}

impl Default for TransformAnimatorConfig {
    fn default() -> Self {
        Self {
            smooth_factor: 10.0,
            max_transformation_time_ms: 5000.0,
            done_position_delta_mag: 0.01,
            done_rotation_delta: 1e-4,
            done_scale_delta_mag: 1e-4,
            done_size_delta_mag: 0.01,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct PositionTarget {
    value: Point,
    space: Space,
    elapsed_ms: f64,
}

#[derive(Clone, Copy, Debug)]
struct ScalarTarget {
    value: f32,
    elapsed_ms: f64,
}

#[derive(Clone, Copy, Debug)]
struct PointTarget {
    value: Point,
    elapsed_ms: f64,
}

#[derive(Clone, Copy, Debug)]
struct SizeTarget {
    value: Size,
    elapsed_ms: f64,
}

/// Exponential-decay approach toward per-channel transform targets.
#[derive(Debug)]
pub struct TransformAnimator {
    config: TransformAnimatorConfig,
    position: Option<PositionTarget>,
    rotation: Option<ScalarTarget>,
    scale: Option<PointTarget>,
    size: Option<SizeTarget>,
    pub position_clamp_x: AxisClamp,
    pub position_clamp_y: AxisClamp,
    pub scale_clamp_x: AxisClamp,
    pub scale_clamp_y: AxisClamp,
    /// Clamp position so the node's far edge never under-fills an oversized
    /// parent (the scroll-content rule).
    pub fill_parent: bool,
    /// Magnitude of the last applied position step; the damping behaviors
    /// treat this as residual animation velocity.
    last_position_delta_mag: f32,
}

impl Default for TransformAnimator {
    fn default() -> Self {
        Self::new(TransformAnimatorConfig::default())
    }
}

impl TransformAnimator {
    pub fn new(config: TransformAnimatorConfig) -> Self {
        Self {
            config,
            position: None,
            rotation: None,
            scale: None,
            size: None,
            position_clamp_x: AxisClamp::default(),
            position_clamp_y: AxisClamp::default(),
            scale_clamp_x: AxisClamp::default(),
            scale_clamp_y: AxisClamp::default(),
            fill_parent: false,
            last_position_delta_mag: 0.0,
        }
    }

    pub fn config(&self) -> &TransformAnimatorConfig {
        &self.config
    }

    pub fn set_smooth_factor(&mut self, smooth_factor: f32) {
        self.config.smooth_factor = smooth_factor;
    }

    // ------------------------------------------------------------------
    // Targets
    // ------------------------------------------------------------------

    pub fn set_position_target(&mut self, value: Point, space: Space) {
        self.position = Some(PositionTarget {
            value,
            space,
            elapsed_ms: 0.0,
        });
    }

    pub fn position_target(&self) -> Option<(Point, Space)> {
        self.position.map(|t| (t.value, t.space))
    }

    /// Shifts an in-flight position target without resetting its timer; used
    /// for composing a step onto an active snap.
    pub fn offset_position_target(&mut self, delta: Point) {
        if let Some(target) = &mut self.position {
            target.value += delta;
        }
    }

    pub fn clear_position_target(&mut self) {
        self.position = None;
        self.last_position_delta_mag = 0.0;
    }

    pub fn set_rotation_target(&mut self, radians: f32) {
        self.rotation = Some(ScalarTarget {
            value: radians,
            elapsed_ms: 0.0,
        });
    }

    pub fn clear_rotation_target(&mut self) {
        self.rotation = None;
    }

    pub fn set_scale_target(&mut self, scale: Point) {
        self.scale = Some(PointTarget {
            value: scale,
            elapsed_ms: 0.0,
        });
    }

    pub fn clear_scale_target(&mut self) {
        self.scale = None;
    }

    pub fn set_size_target(&mut self, size: Size) {
        self.size = Some(SizeTarget {
            value: size,
            elapsed_ms: 0.0,
        });
    }

    pub fn clear_size_target(&mut self) {
        self.size = None;
    }

    pub fn clear_all(&mut self) {
        self.position = None;
        self.rotation = None;
        self.scale = None;
        self.size = None;
        self.last_position_delta_mag = 0.0;
    }

    pub fn is_animating(&self) -> bool {
        self.position.is_some()
            || self.rotation.is_some()
            || self.scale.is_some()
            || self.size.is_some()
    }

    /// Residual per-tick position movement from the latest update.
    pub fn residual_position_delta(&self) -> f32 {
        self.last_position_delta_mag
    }

    // ------------------------------------------------------------------
    // Integration
    // ------------------------------------------------------------------

    /// Advances every active channel by one tick.
    pub fn update(&mut self, scene: &mut Scene, node: NodeId, dt_ms: f64, budget: &mut TickBudget) {
        if !scene.contains(node) {
            self.clear_all();
            return;
        }
        self.update_position(scene, node, dt_ms, budget);
        self.update_rotation(scene, node, dt_ms, budget);
        self.update_scale(scene, node, dt_ms, budget);
        self.update_size(scene, node, dt_ms, budget);
    }

    fn update_position(
        &mut self,
        scene: &mut Scene,
        node: NodeId,
        dt_ms: f64,
        budget: &mut TickBudget,
    ) {
        let Some(mut target) = self.position else {
            self.last_position_delta_mag = 0.0;
            return;
        };
        target.elapsed_ms += dt_ms;
        if target.elapsed_ms > self.config.max_transformation_time_ms {
            log::debug!("position target on {node:?} expired; abandoning");
            self.position = None;
            self.last_position_delta_mag = 0.0;
            return;
        }

        // The goal stays unclamped; clamps bound what gets written. A goal
        // the clamps make unreachable keeps its channel active until expiry.
        let goal = match target.space {
            Space::Local => target.value,
            Space::Global => match scene.parent(node) {
                Some(parent) => scene.to_local(parent, target.value),
                None => target.value,
            },
        };

        let current = scene.position(node);
        if self.config.smooth_factor <= 1.0 {
            if budget.try_consume() {
                let next = self.clamp_position(scene, node, goal);
                scene.set_position(node, next);
            }
            self.position = None;
            self.last_position_delta_mag = 0.0;
            return;
        }

        let delta = (goal - current) * (1.0 / self.config.smooth_factor);
        if delta.length() < self.config.done_position_delta_mag {
            let next = self.clamp_position(scene, node, goal);
            scene.set_position(node, next);
            self.position = None;
            self.last_position_delta_mag = 0.0;
        } else {
            let next = self.clamp_position(scene, node, current + delta);
            scene.set_position(node, next);
            self.position = Some(target);
            self.last_position_delta_mag = delta.length();
        }
    }

    fn clamp_position(&self, scene: &Scene, node: NodeId, value: Point) -> Point {
        let mut clamped = Point::new(
            self.position_clamp_x.apply(value.x),
            self.position_clamp_y.apply(value.y),
        );
        if self.fill_parent {
            if let Some(parent) = scene.parent(node) {
                let parent_size = scene.size(parent);
                let size = scene.size(node);
                let scale = scene.scale(node);
                let span_x = size.width * scale.x;
                let span_y = size.height * scale.y;
                if span_x >= parent_size.width {
                    clamped.x = clamped.x.clamp(parent_size.width - span_x, 0.0);
                }
                if span_y >= parent_size.height {
                    clamped.y = clamped.y.clamp(parent_size.height - span_y, 0.0);
                }
            }
        }
        clamped
    }

    fn update_rotation(
        &mut self,
        scene: &mut Scene,
        node: NodeId,
        dt_ms: f64,
        budget: &mut TickBudget,
    ) {
        let Some(mut target) = self.rotation else {
            return;
        };
        target.elapsed_ms += dt_ms;
        if target.elapsed_ms > self.config.max_transformation_time_ms {
            log::debug!("rotation target on {node:?} expired; abandoning");
            self.rotation = None;
            return;
        }

        let current = scene.rotation(node);
        if self.config.smooth_factor <= 1.0 {
            if budget.try_consume() {
                scene.set_rotation(node, target.value);
            }
            self.rotation = None;
            return;
        }

        let delta = (target.value - current) / self.config.smooth_factor;
        if delta.abs() < self.config.done_rotation_delta {
            scene.set_rotation(node, target.value);
            self.rotation = None;
        } else {
            scene.set_rotation(node, current + delta);
            self.rotation = Some(target);
        }
    }

    fn update_scale(
        &mut self,
        scene: &mut Scene,
        node: NodeId,
        dt_ms: f64,
        budget: &mut TickBudget,
    ) {
        let Some(mut target) = self.scale else {
            return;
        };
        target.elapsed_ms += dt_ms;
        if target.elapsed_ms > self.config.max_transformation_time_ms {
            log::debug!("scale target on {node:?} expired; abandoning");
            self.scale = None;
            return;
        }

        let goal = target.value;
        let clamp = |p: Point| {
            Point::new(self.scale_clamp_x.apply(p.x), self.scale_clamp_y.apply(p.y))
        };
        let current = scene.scale(node);
        if self.config.smooth_factor <= 1.0 {
            if budget.try_consume() {
                scene.set_scale(node, clamp(goal));
            }
            self.scale = None;
            return;
        }

        let delta = (goal - current) * (1.0 / self.config.smooth_factor);
        if delta.length() < self.config.done_scale_delta_mag {
            scene.set_scale(node, clamp(goal));
            self.scale = None;
        } else {
            scene.set_scale(node, clamp(current + delta));
            self.scale = Some(target);
        }
    }

    fn update_size(
        &mut self,
        scene: &mut Scene,
        node: NodeId,
        dt_ms: f64,
        budget: &mut TickBudget,
    ) {
        let Some(mut target) = self.size else {
            return;
        };
        target.elapsed_ms += dt_ms;
        if target.elapsed_ms > self.config.max_transformation_time_ms {
            log::debug!("size target on {node:?} expired; abandoning");
            self.size = None;
            return;
        }

        let current = scene.size(node);
        if self.config.smooth_factor <= 1.0 {
            if budget.try_consume() {
                scene.set_size(node, target.value);
            }
            self.size = None;
            return;
        }

        let dw = (target.value.width - current.width) / self.config.smooth_factor;
        let dh = (target.value.height - current.height) / self.config.smooth_factor;
        if (dw * dw + dh * dh).sqrt() < self.config.done_size_delta_mag {
            scene.set_size(node, target.value);
            self.size = None;
        } else {
            scene.set_size(node, Size::new(current.width + dw, current.height + dh));
            self.size = Some(target);
        }
    }
}

#[cfg(test)]
#[path = "tests/animator_tests.rs"]
mod tests;
