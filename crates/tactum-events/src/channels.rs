//! Owner-tagged listener registries with snapshot dispatch.

use crate::{TouchEvent, TouchType};
use smallvec::SmallVec;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Callback invoked with a reference to the event copy for this dispatch.
pub type TouchListener = Rc<dyn Fn(&TouchEvent)>;

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Opaque tag identifying who registered a listener, for bulk removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerOwner(u64);

impl ListenerOwner {
    /// Allocates a process-unique owner tag.
    pub fn unique() -> Self {
        Self(NEXT_OWNER.fetch_add(1, Ordering::Relaxed))
    }
}

struct Entry {
    owner: ListenerOwner,
    listener: TouchListener,
}

/// Per-type listener lists plus one aggregate list that sees every event.
#[derive(Default)]
pub struct EventChannels {
    typed: [Vec<Entry>; TouchType::ALL.len()],
    aggregate: Vec<Entry>,
}

impl EventChannels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for one event type, or for the aggregate channel
    /// when `kind` is `None`.
    pub fn add(&mut self, kind: Option<TouchType>, owner: ListenerOwner, listener: TouchListener) {
        let entry = Entry { owner, listener };
        match kind {
            Some(kind) => self.typed[kind.index()].push(entry),
            None => self.aggregate.push(entry),
        }
    }

    /// Removes every listener registered under `owner`.
    pub fn remove_owner(&mut self, owner: ListenerOwner) {
        for list in &mut self.typed {
            list.retain(|e| e.owner != owner);
        }
        self.aggregate.retain(|e| e.owner != owner);
    }

    pub fn is_empty(&self) -> bool {
        self.aggregate.is_empty() && self.typed.iter().all(Vec::is_empty)
    }

    /// Dispatches `event` to the typed listeners for its kind, then to the
    /// aggregate listeners. The listener list is snapshotted up front, so
    /// handlers may add or remove listeners (including themselves) freely.
    /// A panicking listener is logged and does not block the rest.
    pub fn dispatch(&self, event: &TouchEvent) {
        let snapshot: SmallVec<[TouchListener; 8]> = self.typed[event.kind.index()]
            .iter()
            .chain(self.aggregate.iter())
            .map(|e| Rc::clone(&e.listener))
            .collect();
        for listener in snapshot {
            let outcome = catch_unwind(AssertUnwindSafe(|| listener(event)));
            if outcome.is_err() {
                log::error!(
                    "touch listener panicked during {:?} dispatch (touch {:?}); continuing",
                    event.kind,
                    event.touch_id
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TouchId;
    use std::cell::RefCell;
    use tactum_geometry::Point;

    fn event(kind: TouchType) -> TouchEvent {
        TouchEvent {
            touch_id: TouchId(1),
            kind,
            position: Point::ZERO,
            start_position: Point::ZERO,
            velocity: Point::ZERO,
            smoothed_velocity: Point::ZERO,
            timestamp_ms: 0.0,
            target: None,
            recent: None,
        }
    }

    #[test]
    fn typed_then_aggregate_order() {
        let mut channels = EventChannels::new();
        let owner = ListenerOwner::unique();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = Rc::clone(&order);
        channels.add(None, owner, Rc::new(move |_| o.borrow_mut().push("agg")));
        let o = Rc::clone(&order);
        channels.add(
            Some(TouchType::Down),
            owner,
            Rc::new(move |_| o.borrow_mut().push("typed")),
        );

        channels.dispatch(&event(TouchType::Down));
        assert_eq!(*order.borrow(), vec!["typed", "agg"]);

        channels.dispatch(&event(TouchType::Move));
        assert_eq!(*order.borrow(), vec!["typed", "agg", "agg"]);
    }

    #[test]
    fn remove_owner_drops_all_of_that_owner() {
        let mut channels = EventChannels::new();
        let a = ListenerOwner::unique();
        let b = ListenerOwner::unique();
        let count = Rc::new(RefCell::new(0));

        for _ in 0..3 {
            let c = Rc::clone(&count);
            channels.add(Some(TouchType::Up), a, Rc::new(move |_| *c.borrow_mut() += 1));
        }
        let c = Rc::clone(&count);
        channels.add(Some(TouchType::Up), b, Rc::new(move |_| *c.borrow_mut() += 10));

        channels.remove_owner(a);
        channels.dispatch(&event(TouchType::Up));
        assert_eq!(*count.borrow(), 10);
    }

    #[test]
    fn panicking_listener_does_not_block_others() {
        let mut channels = EventChannels::new();
        let owner = ListenerOwner::unique();
        let reached = Rc::new(RefCell::new(false));

        channels.add(
            Some(TouchType::Click),
            owner,
            Rc::new(|_| panic!("listener failure")),
        );
        let r = Rc::clone(&reached);
        channels.add(
            Some(TouchType::Click),
            owner,
            Rc::new(move |_| *r.borrow_mut() = true),
        );

        channels.dispatch(&event(TouchType::Click));
        assert!(*reached.borrow());
    }

    #[test]
    fn detach_during_dispatch_is_safe() {
        // A listener that removes its own owner mid-dispatch: the snapshot
        // still runs to completion, the next dispatch sees nothing.
        let channels = Rc::new(RefCell::new(EventChannels::new()));
        let owner = ListenerOwner::unique();
        let calls = Rc::new(RefCell::new(0));

        let ch = Rc::clone(&channels);
        let c = Rc::clone(&calls);
        channels.borrow_mut().add(
            Some(TouchType::Up),
            owner,
            Rc::new(move |_| {
                *c.borrow_mut() += 1;
                ch.borrow_mut().remove_owner(owner);
            }),
        );

        let ev = event(TouchType::Up);
        let snapshot_dispatch = |ch: &Rc<RefCell<EventChannels>>| {
            // Mirror how the manager dispatches: borrow, clone snapshot, drop
            // the borrow before invoking listeners.
            let listeners: Vec<TouchListener> = {
                let guard = ch.borrow();
                guard.typed[TouchType::Up.index()]
                    .iter()
                    .map(|e| Rc::clone(&e.listener))
                    .collect()
            };
            for l in listeners {
                l(&ev);
            }
        };
        snapshot_dispatch(&channels);
        snapshot_dispatch(&channels);
        assert_eq!(*calls.borrow(), 1);
    }
}
