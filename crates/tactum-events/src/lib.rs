//! Touch event values and listener channels.
//!
//! Channels are owner-tagged: every registration carries a [`ListenerOwner`]
//! so a gesture behavior can drop all of its listeners in one call when it
//! tears down. Dispatch snapshots the listener list first, which makes
//! attach/detach from inside a running handler safe: the change simply
//! applies from the next dispatch on.

mod channels;

pub use channels::{EventChannels, ListenerOwner, TouchListener};

use tactum_geometry::Point;
use tactum_scene::NodeId;

/// Phase of a raw input sample, before the manager derives anything from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
}

/// Kind of a dispatched touch event, raw phases plus synthesized kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TouchType {
    Down,
    Move,
    Up,
    Enter,
    Exit,
    Click,
    DoubleClick,
}

impl TouchType {
    pub const ALL: [TouchType; 7] = [
        TouchType::Down,
        TouchType::Move,
        TouchType::Up,
        TouchType::Enter,
        TouchType::Exit,
        TouchType::Click,
        TouchType::DoubleClick,
    ];

    fn index(self) -> usize {
        match self {
            TouchType::Down => 0,
            TouchType::Move => 1,
            TouchType::Up => 2,
            TouchType::Enter => 3,
            TouchType::Exit => 4,
            TouchType::Click => 5,
            TouchType::DoubleClick => 6,
        }
    }
}

/// Identifier of one touch, unique while that touch is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TouchId(pub u32);

/// One dispatched touch event. A fresh copy is made for every dispatch, so
/// no listener ever observes state from another listener's invocation.
#[derive(Clone, Debug)]
pub struct TouchEvent {
    pub touch_id: TouchId,
    pub kind: TouchType,
    /// Current root-space position.
    pub position: Point,
    /// Root-space position of the originating DOWN.
    pub start_position: Point,
    /// Instantaneous velocity, px per second.
    pub velocity: Point,
    /// Exponentially smoothed velocity, px per second.
    pub smoothed_velocity: Point,
    /// Manager-clock timestamp in milliseconds.
    pub timestamp_ms: f64,
    /// Node selected by hit testing at DOWN.
    pub target: Option<NodeId>,
    /// Node most recently resolved by hit testing (enter/exit tracking).
    pub recent: Option<NodeId>,
}

impl TouchEvent {
    /// Root-space displacement since the originating DOWN.
    pub fn offset(&self) -> Point {
        self.position - self.start_position
    }
}
