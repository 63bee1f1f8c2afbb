use super::*;
use std::cell::RefCell;
use std::rc::Rc;
use tactum_gestures::{Draggable, DraggableConfig, SwipePhase, Swiper, SwiperConfig};
use tactum_input::{RawSample, TouchManager};
use tactum_events::TouchPhase;

fn stage() -> Stage {
    Stage::new(Size::new(1000.0, 1000.0))
}

fn rect(stage: &mut Stage, pos: Point, size: Size) -> NodeId {
    let root = stage.root();
    let scene = stage.scene_mut();
    let id = scene.add_node(Some(root));
    scene.set_position(id, pos);
    scene.set_size(id, size);
    scene.set_interactive(id, true);
    id
}

fn unsmoothed_draggable() -> Box<Draggable> {
    let mut drag = Draggable::new(DraggableConfig::default());
    drag.animator_mut().set_smooth_factor(1.0);
    Box::new(drag)
}

#[test]
fn batched_input_reaches_extensions_within_one_update() {
    let mut st = stage();
    let node = rect(&mut st, Point::new(100.0, 100.0), Size::new(50.0, 50.0));
    st.attach(node, unsmoothed_draggable());
    st.set_dispatch_mode(DispatchMode::Batched);

    st.touch_down(TouchId(1), Point::new(110.0, 110.0));
    st.touch_move(TouchId(1), Point::new(140.0, 120.0), None);
    // Nothing dispatched or moved until the frame runs.
    assert_eq!(st.scene().position(node), Point::new(100.0, 100.0));
    assert_eq!(st.touch().session_count(), 0);

    // One update flushes the batch before extensions run, so the drag binds
    // and applies in the same frame.
    st.update(16.0);
    assert_eq!(st.scene().position(node), Point::new(130.0, 110.0));

    st.touch_up(TouchId(1), Point::new(140.0, 120.0));
    st.update(16.0);
    assert_eq!(st.scene().position(node), Point::new(130.0, 110.0));
    assert_eq!(st.touch().session_count(), 0);
}

#[test]
fn sample_port_feeds_sessions_from_another_thread() {
    let mut st = stage();
    rect(&mut st, Point::ZERO, Size::new(100.0, 100.0));
    let sender = st.sample_sender();

    let worker = std::thread::spawn(move || {
        assert!(sender.send(RawSample::new(
            TouchId(4),
            TouchPhase::Down,
            Point::new(10.0, 10.0),
        )));
        assert!(sender.send(RawSample::new(
            TouchId(4),
            TouchPhase::Move,
            Point::new(20.0, 10.0),
        )));
    });
    worker.join().expect("sample thread");

    assert_eq!(st.touch().session_count(), 0);
    st.update(16.0);

    let snapshots = st.session_snapshots();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].id, TouchId(4));
    assert_eq!(snapshots[0].position, Point::new(20.0, 10.0));
}

#[test]
fn swiper_pages_deterministically_through_the_stage() {
    let mut st = stage();
    let node = rect(&mut st, Point::ZERO, Size::new(100.0, 100.0));
    let mut swiper = Swiper::new(SwiperConfig {
        snap_interval: Point::new(100.0, 0.0),
        snap: true,
        throw_factor: 0.0,
        ..SwiperConfig::default()
    });
    swiper.animator_mut().set_smooth_factor(1.0);
    let controller = swiper.controller();
    st.attach(node, Box::new(swiper));

    st.touch_down(TouchId(1), Point::new(10.0, 10.0));
    st.update(16.0);
    st.touch_move(TouchId(1), Point::new(63.0, 10.0), None);
    st.update(16.0);
    st.touch_up(TouchId(1), Point::new(63.0, 10.0));
    st.update(16.0);
    assert_eq!(st.scene().position(node).x, 100.0);

    // Programmatic paging goes through the same snap machinery.
    controller.step(-1);
    st.update(16.0);
    assert_eq!(st.scene().position(node).x, 0.0);
}

#[test]
fn detach_node_stops_gesture_and_listener_delivery() {
    let mut st = stage();
    let node = rect(&mut st, Point::new(100.0, 100.0), Size::new(50.0, 50.0));
    st.attach(node, unsmoothed_draggable());
    assert_eq!(st.extension_count(), 1);

    st.detach_node(node);
    assert_eq!(st.extension_count(), 0);

    let before = st.scene().position(node);
    st.touch_down(TouchId(1), Point::new(110.0, 110.0));
    st.touch_move(TouchId(1), Point::new(160.0, 160.0), None);
    st.update(16.0);
    assert_eq!(st.scene().position(node), before);
}

#[test]
fn manager_aggregate_listeners_observe_stage_input() {
    let mut st = stage();
    rect(&mut st, Point::ZERO, Size::new(100.0, 100.0));

    let kinds = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&kinds);
    st.add_listener(
        None,
        None,
        ListenerOwner::unique(),
        Rc::new(move |event| sink.borrow_mut().push(event.kind)),
    );

    st.touch_down(TouchId(1), Point::new(10.0, 10.0));
    st.touch_up(TouchId(1), Point::new(10.0, 10.0));
    st.update(16.0);

    assert_eq!(
        *kinds.borrow(),
        vec![TouchType::Down, TouchType::Click, TouchType::Up]
    );
}

#[test]
fn debug_states_report_attached_extensions() {
    let mut st = stage();
    let node = rect(&mut st, Point::ZERO, Size::new(100.0, 100.0));
    st.attach(node, unsmoothed_draggable());

    let states = st.debug_states();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].0, node);
    assert!(states[0].1.contains("Draggable"));
}

#[test]
fn frame_timer_reports_monotonic_frames() {
    let mut timer = FrameTimer::new();
    assert_eq!(timer.tick(), 0.0);
    assert_eq!(timer.frame_count(), 1);

    let dt = timer.tick();
    assert!(dt >= 0.0);
    assert!(dt <= timer.max_step_ms);
    assert_eq!(timer.frame_count(), 2);
}

// The stage-owned manager and a standalone one share configuration defaults.
#[test]
fn stage_uses_default_touch_configuration() {
    let st = stage();
    let standalone = TouchManager::default();
    assert_eq!(
        st.touch().config().click_max_interval_ms,
        standalone.config().click_max_interval_ms
    );
    assert_eq!(
        st.touch().config().idle_timeout_ms,
        standalone.config().idle_timeout_ms
    );
}
