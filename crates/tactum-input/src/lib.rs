//! Touch ingestion, session tracking, and event dispatch.
//!
//! The manager consumes raw (id, position) samples from transport bridges,
//! maintains one [`TouchSession`] per active touch, hit-tests against the
//! scene, and dispatches [`TouchEvent`]s (raw kinds plus synthesized
//! ENTER/EXIT/CLICK) to per-node and manager-level listener channels.
//!
//! Nothing in the per-sample path fails outward: malformed input is logged
//! and recovered locally, because dropping a frame of interaction is worse
//! than a logged anomaly.

mod session;

pub use session::{RawSample, SessionSnapshot, TouchSampleSender, TouchSession};

use ahash::AHashMap;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::mpsc;
use tactum_events::{
    EventChannels, ListenerOwner, TouchEvent, TouchId, TouchListener, TouchPhase, TouchType,
};
use tactum_geometry::Point;
use tactum_scene::{hit_test, NodeId, Scene};

/// Whether samples are processed on submit or queued until the next update.
///
/// Batched mode guarantees consumers observe one consistent touch state per
/// frame; queued samples flush in submission order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchMode {
    Immediate,
    Batched,
}

/// Tunables for session handling and click synthesis.
#[derive(Clone, Copy, Debug)]
pub struct TouchManagerConfig {
    /// Maximum DOWN→UP duration for a CLICK, in milliseconds.
    pub click_max_interval_ms: f64,
    /// Maximum DOWN→UP travel for a CLICK, in pixels.
    pub click_max_distance: f32,
    /// Sessions idle longer than this are reaped with a synthetic UP, a
    /// backstop against transports that drop UP samples.
    pub idle_timeout_ms: f64,
    /// Per-sample lerp factor pulling smoothed velocity toward instantaneous.
    pub velocity_smoothing: f32,
    /// Per-update-tick multiplier on smoothed velocity; keeps decaying while
    /// the touch rests.
    pub velocity_decay: f32,
}

impl Default for TouchManagerConfig {
    fn default() -> Self {
        Self {
            click_max_interval_ms: 200.0,
            click_max_distance: 15.0,
            idle_timeout_ms: 10_000.0,
            velocity_smoothing: 0.25,
            velocity_decay: 0.6,
        }
    }
}

/// Orchestrates touch sample processing. See the crate docs for the model.
pub struct TouchManager {
    config: TouchManagerConfig,
    mode: DispatchMode,
    /// Deterministic manager clock, advanced only by `update(dt)`.
    clock_ms: f64,
    /// Hit-test root; no root means hit tests resolve nothing.
    root: Option<NodeId>,
    sessions: AHashMap<TouchId, TouchSession>,
    manager_channels: EventChannels,
    node_channels: AHashMap<NodeId, EventChannels>,
    /// Channels each owner registered into, for O(owner) bulk removal.
    owner_index: AHashMap<ListenerOwner, SmallVec<[Option<NodeId>; 2]>>,
    batch: VecDeque<RawSample>,
    port_tx: mpsc::Sender<RawSample>,
    port_rx: mpsc::Receiver<RawSample>,
}

impl Default for TouchManager {
    fn default() -> Self {
        Self::new(TouchManagerConfig::default())
    }
}

impl TouchManager {
    pub fn new(config: TouchManagerConfig) -> Self {
        let (port_tx, port_rx) = mpsc::channel();
        Self {
            config,
            mode: DispatchMode::Immediate,
            clock_ms: 0.0,
            root: None,
            sessions: AHashMap::new(),
            manager_channels: EventChannels::new(),
            node_channels: AHashMap::new(),
            owner_index: AHashMap::new(),
            batch: VecDeque::new(),
            port_tx,
            port_rx,
        }
    }

    pub fn config(&self) -> &TouchManagerConfig {
        &self.config
    }

    pub fn set_dispatch_mode(&mut self, mode: DispatchMode) {
        self.mode = mode;
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        self.mode
    }

    /// Sets the subtree hit tests resolve against.
    pub fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    /// Current manager-clock time in milliseconds.
    pub fn now_ms(&self) -> f64 {
        self.clock_ms
    }

    /// Clonable, `Send` handle for source-thread ingestion; drained at the
    /// start of every update, before the batched queue.
    pub fn sample_sender(&self) -> TouchSampleSender {
        TouchSampleSender::new(self.port_tx.clone())
    }

    // ------------------------------------------------------------------
    // Listener registration
    // ------------------------------------------------------------------

    /// Registers a listener on a node channel (`Some`) or the manager channel
    /// (`None`), for one event type or the aggregate (`kind: None`).
    pub fn add_listener(
        &mut self,
        node: Option<NodeId>,
        kind: Option<TouchType>,
        owner: ListenerOwner,
        listener: TouchListener,
    ) {
        let channels = match node {
            Some(id) => self.node_channels.entry(id).or_default(),
            None => &mut self.manager_channels,
        };
        channels.add(kind, owner, listener);
        let index = self.owner_index.entry(owner).or_default();
        if !index.contains(&node) {
            index.push(node);
        }
    }

    /// Removes every listener registered under `owner`, across all channels
    /// it touched.
    pub fn remove_listeners(&mut self, owner: ListenerOwner) {
        let Some(touched) = self.owner_index.remove(&owner) else {
            return;
        };
        for node in touched {
            match node {
                Some(id) => {
                    if let Some(channels) = self.node_channels.get_mut(&id) {
                        channels.remove_owner(owner);
                        if channels.is_empty() {
                            self.node_channels.remove(&id);
                        }
                    }
                }
                None => self.manager_channels.remove_owner(owner),
            }
        }
    }

    /// Drops a dead node's channels wholesale.
    pub fn remove_node_listeners(&mut self, node: NodeId) {
        self.node_channels.remove(&node);
    }

    // ------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------

    pub fn touch_down(&mut self, scene: &Scene, id: TouchId, position: Point) {
        self.submit(scene, RawSample::new(id, TouchPhase::Down, position));
    }

    pub fn touch_move(
        &mut self,
        scene: &Scene,
        id: TouchId,
        position: Point,
        velocity: Option<Point>,
    ) {
        let mut sample = RawSample::new(id, TouchPhase::Move, position);
        sample.velocity = velocity;
        self.submit(scene, sample);
    }

    pub fn touch_up(&mut self, scene: &Scene, id: TouchId, position: Point) {
        self.submit(scene, RawSample::new(id, TouchPhase::Up, position));
    }

    fn submit(&mut self, scene: &Scene, mut sample: RawSample) {
        // Stamp at submission so batched samples keep their true timing.
        sample.timestamp_ms.get_or_insert(self.clock_ms);
        match self.mode {
            DispatchMode::Immediate => self.process_sample(scene, sample),
            DispatchMode::Batched => self.batch.push_back(sample),
        }
    }

    /// Routes an externally synthesized event (e.g. DOUBLE_CLICK from a
    /// consumer) through the normal node-then-manager dispatch path.
    pub fn dispatch_synthetic(&self, node: Option<NodeId>, event: TouchEvent) {
        self.deliver(&[node], &event);
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    pub fn session(&self, id: TouchId) -> Option<&TouchSession> {
        self.sessions.get(&id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Snapshot of active sessions for debug visualization.
    pub fn session_snapshots(&self) -> Vec<SessionSnapshot> {
        let mut snapshots: Vec<SessionSnapshot> = self
            .sessions
            .values()
            .map(|s| SessionSnapshot {
                id: s.id,
                position: s.position,
                start_position: s.start_position,
                smoothed_velocity: s.smoothed_velocity,
            })
            .collect();
        snapshots.sort_by_key(|s| s.id);
        snapshots
    }

    // ------------------------------------------------------------------
    // Per-frame update
    // ------------------------------------------------------------------

    /// Advances the clock, flushes queued samples (source-thread port first,
    /// then the batched queue, both in submission order), decays smoothed
    /// velocities, and reaps idle sessions.
    pub fn update(&mut self, scene: &Scene, dt_ms: f64) {
        self.clock_ms += dt_ms;

        while let Ok(mut sample) = self.port_rx.try_recv() {
            sample.timestamp_ms.get_or_insert(self.clock_ms);
            self.process_sample(scene, sample);
        }
        while let Some(sample) = self.batch.pop_front() {
            self.process_sample(scene, sample);
        }

        let decay = self.config.velocity_decay;
        for session in self.sessions.values_mut() {
            session.smoothed_velocity *= decay;
        }

        self.reap_idle(scene);
    }

    fn reap_idle(&mut self, scene: &Scene) {
        let now = self.clock_ms;
        let timeout = self.config.idle_timeout_ms;
        let stale: SmallVec<[(TouchId, Point); 4]> = self
            .sessions
            .values()
            .filter(|s| now - s.last_change_ms > timeout)
            .map(|s| (s.id, s.position))
            .collect();
        for (id, position) in stale {
            log::warn!("reaping idle touch session {id:?}; synthesizing UP");
            self.process_up(scene, id, position, now);
        }
    }

    // ------------------------------------------------------------------
    // Sample processing
    // ------------------------------------------------------------------

    fn process_sample(&mut self, scene: &Scene, sample: RawSample) {
        let now = sample.timestamp_ms.unwrap_or(self.clock_ms);
        match sample.phase {
            TouchPhase::Down => self.process_down(scene, sample.id, sample.position, now),
            TouchPhase::Move => {
                self.process_move(scene, sample.id, sample.position, sample.velocity, now);
            }
            TouchPhase::Up => self.process_up(scene, sample.id, sample.position, now),
        }
    }

    fn process_down(&mut self, scene: &Scene, id: TouchId, position: Point, now: f64) {
        if let Some(existing) = self.sessions.get_mut(&id) {
            log::warn!("duplicate DOWN for live touch {id:?}; refreshing position");
            existing.position = position;
            existing.last_change_ms = now;
            return;
        }

        let mut session = TouchSession::new(id, position, now);
        let target = self.hit(scene, position);
        session.target = target;
        session.recent = target;
        let event = Self::event_from(&session, TouchType::Down);
        self.sessions.insert(id, session);
        self.deliver(&[target], &event);
    }

    fn process_move(
        &mut self,
        scene: &Scene,
        id: TouchId,
        position: Point,
        velocity: Option<Point>,
        now: f64,
    ) {
        self.ensure_session(scene, id, position, now);
        let resolved = self.hit(scene, position);

        let (exit_event, enter_event, move_event, old_recent) = {
            let alpha = self.config.velocity_smoothing;
            let Some(session) = self.sessions.get_mut(&id) else {
                return;
            };
            Self::advance(session, position, velocity, now, alpha);

            let old_recent = session.recent;
            let crossed = resolved != old_recent;
            let exit_event = if crossed && old_recent.is_some() {
                let mut event = Self::event_from(session, TouchType::Exit);
                event.target = resolved;
                event.recent = old_recent;
                Some(event)
            } else {
                None
            };
            if crossed {
                session.recent = resolved;
            }
            let enter_event = if crossed && resolved.is_some() {
                let mut event = Self::event_from(session, TouchType::Enter);
                event.target = resolved;
                Some(event)
            } else {
                None
            };
            let move_event = Self::event_from(session, TouchType::Move);
            (exit_event, enter_event, move_event, old_recent)
        };

        if let Some(event) = exit_event {
            self.deliver(&[old_recent], &event);
        }
        if let Some(event) = enter_event {
            self.deliver(&[resolved], &event);
        }
        let recipients = Self::move_recipients(&move_event);
        self.deliver(&recipients, &move_event);
    }

    fn process_up(&mut self, scene: &Scene, id: TouchId, position: Point, now: f64) {
        self.ensure_session(scene, id, position, now);
        let resolved = self.hit(scene, position);

        let (exit_event, enter_event, click_event, up_event, old_recent) = {
            let config = self.config;
            let Some(session) = self.sessions.get_mut(&id) else {
                return;
            };
            Self::advance(session, position, None, now, config.velocity_smoothing);

            let old_recent = session.recent;
            let crossed = resolved != old_recent;
            let exit_event = if crossed && old_recent.is_some() {
                let mut event = Self::event_from(session, TouchType::Exit);
                event.target = resolved;
                event.recent = old_recent;
                Some(event)
            } else {
                None
            };
            if crossed {
                session.recent = resolved;
            }
            let enter_event = if crossed && resolved.is_some() {
                let mut event = Self::event_from(session, TouchType::Enter);
                event.target = resolved;
                Some(event)
            } else {
                None
            };

            let is_click = session.duration_ms(now) <= config.click_max_interval_ms
                && session.position.distance_to(session.start_position)
                    <= config.click_max_distance;
            let click_event = is_click.then(|| Self::event_from(session, TouchType::Click));

            session.finished = true;
            let up_event = Self::event_from(session, TouchType::Up);
            (exit_event, enter_event, click_event, up_event, old_recent)
        };

        if let Some(event) = exit_event {
            self.deliver(&[old_recent], &event);
        }
        if let Some(event) = enter_event {
            self.deliver(&[resolved], &event);
        }
        if let Some(event) = click_event {
            self.deliver(&[event.target], &event);
        }
        let recipients = Self::move_recipients(&up_event);
        self.deliver(&recipients, &up_event);

        self.sessions.remove(&id);
    }

    /// Best-effort session synthesis for MOVE/UP with an unknown id.
    fn ensure_session(&mut self, scene: &Scene, id: TouchId, position: Point, now: f64) {
        if self.sessions.contains_key(&id) {
            return;
        }
        log::warn!("{id:?} has no session; synthesizing one");
        let mut session = TouchSession::new(id, position, now);
        let target = self.hit(scene, position);
        session.target = target;
        session.recent = target;
        self.sessions.insert(id, session);
    }

    fn advance(
        session: &mut TouchSession,
        position: Point,
        velocity: Option<Point>,
        now: f64,
        alpha: f32,
    ) {
        let dt_s = (now - session.last_change_ms) / 1000.0;
        session.velocity = match velocity {
            Some(v) => v,
            // With no time elapsed (several samples in one batch window) the
            // previous instantaneous velocity stands.
            None if dt_s > 0.0 => (position - session.position) * (1.0 / dt_s as f32),
            None => session.velocity,
        };
        session.smoothed_velocity = session.smoothed_velocity.lerp(session.velocity, alpha);
        session.position = position;
        session.last_change_ms = now;
    }

    fn hit(&self, scene: &Scene, position: Point) -> Option<NodeId> {
        let root = self.root.filter(|r| scene.contains(*r))?;
        hit_test(scene, root, position).first().copied()
    }

    fn event_from(session: &TouchSession, kind: TouchType) -> TouchEvent {
        TouchEvent {
            touch_id: session.id,
            kind,
            position: session.position,
            start_position: session.start_position,
            velocity: session.velocity,
            smoothed_velocity: session.smoothed_velocity,
            timestamp_ms: session.last_change_ms,
            target: session.target,
            recent: session.recent,
        }
    }

    /// MOVE and UP reach the DOWN target and, when different, the most
    /// recently entered node.
    fn move_recipients(event: &TouchEvent) -> SmallVec<[Option<NodeId>; 2]> {
        let mut recipients: SmallVec<[Option<NodeId>; 2]> = SmallVec::new();
        recipients.push(event.target);
        if event.recent != event.target {
            recipients.push(event.recent);
        }
        recipients
    }

    /// Dispatches to each (live) recipient node's channels, then once to the
    /// manager channels, cloning the event for every dispatch.
    fn deliver(&self, recipients: &[Option<NodeId>], event: &TouchEvent) {
        for node in recipients.iter().copied().flatten() {
            if let Some(channels) = self.node_channels.get(&node) {
                let copy = event.clone();
                channels.dispatch(&copy);
            }
        }
        let copy = event.clone();
        self.manager_channels.dispatch(&copy);
    }
}

#[cfg(test)]
#[path = "tests/touch_manager_tests.rs"]
mod tests;
