//! Wall-clock frame timing for hosts without their own frame source.

use std::collections::VecDeque;
use web_time::Instant;

/// Number of frames to average for FPS calculation
const FRAME_HISTORY_SIZE: usize = 60;

/// Measures the delta between successive frames and keeps a short history
/// for FPS readouts. Instance-based so embedders can run several stages
/// without sharing a process-wide tracker.
pub struct FrameTimer {
    last_tick: Option<Instant>,
    frame_times: VecDeque<Instant>,
    frame_count: u64,
    /// Deltas above this are clamped; a suspended tab or breakpoint must not
    /// become one giant animation step.
    pub max_step_ms: f64,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last_tick: None,
            frame_times: VecDeque::with_capacity(FRAME_HISTORY_SIZE + 1),
            frame_count: 0,
            max_step_ms: 250.0,
        }
    }

    /// Records a frame boundary and returns the milliseconds since the
    /// previous one (0 on the first call).
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let dt_ms = match self.last_tick {
            Some(last) => (now.duration_since(last).as_secs_f64() * 1000.0).min(self.max_step_ms),
            None => 0.0,
        };
        self.last_tick = Some(now);

        self.frame_times.push_back(now);
        self.frame_count += 1;
        while self.frame_times.len() > FRAME_HISTORY_SIZE {
            self.frame_times.pop_front();
        }

        dt_ms
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Average FPS over the recent frame history; 0 until two frames exist.
    pub fn fps(&self) -> f32 {
        match (self.frame_times.front(), self.frame_times.back()) {
            (Some(first), Some(last)) if self.frame_times.len() >= 2 => {
                let duration = last.duration_since(*first).as_secs_f32();
                if duration > 0.0 {
                    (self.frame_times.len() - 1) as f32 / duration
                } else {
                    0.0
                }
            }
            _ => 0.0,
        }
    }

    pub fn fps_display(&self) -> String {
        format!("{:.0} FPS", self.fps())
    }
}
