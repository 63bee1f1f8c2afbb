//! Per-touch session state and the raw-sample types feeding it.

use tactum_events::{TouchId, TouchPhase};
use tactum_geometry::Point;
use tactum_scene::NodeId;

/// Live state of one in-progress touch between DOWN and its resolution.
///
/// Sessions hold node *identity*, never node data; ids are re-validated
/// against the scene wherever they are used, so a destroyed node is never
/// kept alive (or dangled) by a session.
#[derive(Clone, Debug)]
pub struct TouchSession {
    pub id: TouchId,
    pub position: Point,
    pub start_position: Point,
    /// Instantaneous velocity, px/sec.
    pub velocity: Point,
    /// Exponentially smoothed velocity, px/sec; decays every manager tick.
    pub smoothed_velocity: Point,
    pub start_time_ms: f64,
    pub last_change_ms: f64,
    /// Hit-test result at DOWN.
    pub target: Option<NodeId>,
    /// Most recent hit-test result, for enter/exit tracking.
    pub recent: Option<NodeId>,
    /// Set when the terminal UP has been processed.
    pub finished: bool,
}

impl TouchSession {
    pub(crate) fn new(id: TouchId, position: Point, now_ms: f64) -> Self {
        Self {
            id,
            position,
            start_position: position,
            velocity: Point::ZERO,
            smoothed_velocity: Point::ZERO,
            start_time_ms: now_ms,
            last_change_ms: now_ms,
            target: None,
            recent: None,
            finished: false,
        }
    }

    /// Displacement from the originating DOWN, in root space.
    pub fn offset(&self) -> Point {
        self.position - self.start_position
    }

    pub fn duration_ms(&self, now_ms: f64) -> f64 {
        now_ms - self.start_time_ms
    }
}

/// Read-only view of a live session for debug visualization.
#[derive(Clone, Copy, Debug)]
pub struct SessionSnapshot {
    pub id: TouchId,
    pub position: Point,
    pub start_position: Point,
    pub smoothed_velocity: Point,
}

/// One raw input sample as delivered by a transport bridge.
#[derive(Clone, Copy, Debug)]
pub struct RawSample {
    pub id: TouchId,
    pub phase: TouchPhase,
    pub position: Point,
    /// Transport-supplied velocity; computed from deltas when absent.
    pub velocity: Option<Point>,
    /// Manager-clock stamp; `None` means "stamp when processed".
    pub timestamp_ms: Option<f64>,
}

impl RawSample {
    pub fn new(id: TouchId, phase: TouchPhase, position: Point) -> Self {
        Self {
            id,
            phase,
            position,
            velocity: None,
            timestamp_ms: None,
        }
    }
}

/// Clonable, `Send` handle for feeding samples from a source thread (e.g. a
/// network listener). Samples are consumed only during the update thread's
/// flush.
#[derive(Clone)]
pub struct TouchSampleSender {
    tx: std::sync::mpsc::Sender<RawSample>,
}

impl TouchSampleSender {
    pub(crate) fn new(tx: std::sync::mpsc::Sender<RawSample>) -> Self {
        Self { tx }
    }

    /// Queues a sample; returns false when the manager has been dropped.
    pub fn send(&self, sample: RawSample) -> bool {
        self.tx.send(sample).is_ok()
    }
}
