//! Gesture behaviors built on the touch manager and transform animator.
//!
//! Each behavior is an [`Extension`]: a closed-set capability attached to one
//! node, composing a [`TransformAnimator`] by value. Touch listeners (owner-
//! tagged, registered in `setup`) only record intent into the behavior's
//! shared state; all scene mutation happens inside `update`, which owns the
//! scene borrow. That split is what makes the single-threaded model work:
//! dispatch never mutates transforms, update never runs during dispatch.

mod constrain;
mod double_click;
mod draggable;
mod host;
mod pinch_zoom;
mod smooth_scroll;
mod swiper;

pub use constrain::Constrain;
pub use double_click::DoubleClickDetector;
pub use draggable::{Draggable, DraggableConfig};
pub use host::ExtensionHost;
pub use pinch_zoom::{PinchMode, PinchZoom};
pub use smooth_scroll::SmoothScroll;
pub use swiper::{SwipePhase, Swiper, SwiperConfig, SwiperController};

use tactum_animation::TickBudget;
use tactum_input::TouchManager;
use tactum_scene::{NodeId, Scene};

/// Everything an extension may touch during setup, teardown, and update.
pub struct ExtensionContext<'a> {
    pub scene: &'a mut Scene,
    pub touch: &'a mut TouchManager,
    /// The node this extension is attached to.
    pub node: NodeId,
    pub budget: &'a mut TickBudget,
}

/// One gesture behavior attached to a node.
///
/// `setup` registers listeners (tagged with the behavior's owner id),
/// `teardown` must remove them, `update` runs once per frame in attach
/// order. `debug_state` feeds debug overlays; rendering itself is out of
/// scope, so it reports text.
pub trait Extension {
    fn setup(&mut self, ctx: &mut ExtensionContext<'_>);
    fn teardown(&mut self, ctx: &mut ExtensionContext<'_>);
    fn update(&mut self, ctx: &mut ExtensionContext<'_>, dt_ms: f64);
    fn debug_state(&self) -> String {
        String::new()
    }
}

#[cfg(test)]
#[path = "tests/gesture_tests.rs"]
mod tests;
