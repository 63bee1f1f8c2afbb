//! Click-pair assembly.
//!
//! The touch manager never emits DOUBLE_CLICK itself; this behavior derives
//! it from two CLICKs on one node and feeds the synthesized event back
//! through the manager so it reaches the node's and the manager's channels
//! like any other event.

use crate::{Extension, ExtensionContext};
use std::cell::RefCell;
use std::rc::Rc;
use tactum_events::{ListenerOwner, TouchEvent, TouchType};
use tactum_geometry::Point;

#[derive(Default)]
struct Inner {
    last_click: Option<(f64, Point)>,
    pending: Vec<TouchEvent>,
}

pub struct DoubleClickDetector {
    pub interval_ms: f64,
    pub max_distance: f32,
    owner: ListenerOwner,
    inner: Rc<RefCell<Inner>>,
}

impl Default for DoubleClickDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl DoubleClickDetector {
    pub fn new() -> Self {
        Self {
            interval_ms: 320.0,
            max_distance: 20.0,
            owner: ListenerOwner::unique(),
            inner: Rc::new(RefCell::new(Inner::default())),
        }
    }
}

impl Extension for DoubleClickDetector {
    fn setup(&mut self, ctx: &mut ExtensionContext<'_>) {
        let inner = Rc::clone(&self.inner);
        let interval_ms = self.interval_ms;
        let max_distance = self.max_distance;
        ctx.touch.add_listener(
            Some(ctx.node),
            Some(TouchType::Click),
            self.owner,
            Rc::new(move |event| {
                let mut inner = inner.borrow_mut();
                let paired = inner.last_click.is_some_and(|(ts, pos)| {
                    event.timestamp_ms - ts <= interval_ms
                        && event.position.distance_to(pos) <= max_distance
                });
                if paired {
                    // Consume the pair; a third click starts a fresh one.
                    inner.last_click = None;
                    let mut double = event.clone();
                    double.kind = TouchType::DoubleClick;
                    inner.pending.push(double);
                } else {
                    inner.last_click = Some((event.timestamp_ms, event.position));
                }
            }),
        );
    }

    fn teardown(&mut self, ctx: &mut ExtensionContext<'_>) {
        ctx.touch.remove_listeners(self.owner);
    }

    fn update(&mut self, ctx: &mut ExtensionContext<'_>, _dt_ms: f64) {
        // Listeners cannot re-enter the manager, so synthesized events are
        // queued during dispatch and pushed out here.
        let pending = std::mem::take(&mut self.inner.borrow_mut().pending);
        for event in pending {
            ctx.touch.dispatch_synthetic(Some(ctx.node), event);
        }
    }

    fn debug_state(&self) -> String {
        format!(
            "DoubleClickDetector {{ armed: {} }}",
            self.inner.borrow().last_click.is_some()
        )
    }
}
