use super::*;
use crate::hit_test;
use tactum_geometry::{Point, Size};

fn touch_rect(scene: &mut Scene, parent: Option<NodeId>, pos: Point, size: Size) -> NodeId {
    let id = scene.add_node(parent);
    scene.set_position(id, pos);
    scene.set_size(id, size);
    scene.set_interactive(id, true);
    id
}

#[test]
fn global_position_composes_through_parents() {
    let mut scene = Scene::new();
    let root = scene.add_node(None);
    scene.set_position(root, Point::new(100.0, 50.0));
    let child = scene.add_node(Some(root));
    scene.set_position(child, Point::new(10.0, 20.0));

    assert_eq!(scene.global_position(child), Point::new(110.0, 70.0));
}

#[test]
fn to_local_under_rotation_and_scale() {
    let mut scene = Scene::new();
    let root = scene.add_node(None);
    scene.set_position(root, Point::new(50.0, 0.0));
    scene.set_rotation(root, std::f32::consts::FRAC_PI_2);
    scene.set_scale(root, Point::new(2.0, 2.0));
    let child = scene.add_node(Some(root));
    scene.set_position(child, Point::new(5.0, 0.0));

    // Child origin: rotate (5,0)*2 by 90° → (0,10), plus root offset.
    let global = scene.global_position(child);
    assert!((global.x - 50.0).abs() < 1e-4);
    assert!((global.y - 10.0).abs() < 1e-4);

    let back = scene.to_local(child, global);
    assert!(back.length() < 1e-4);
}

#[test]
fn vector_conversion_ignores_translation() {
    let mut scene = Scene::new();
    let root = scene.add_node(None);
    scene.set_position(root, Point::new(500.0, 500.0));
    scene.set_scale(root, Point::new(2.0, 1.0));

    let v = scene.vector_to_global(root, Point::new(1.0, 1.0));
    assert_eq!(v, Point::new(2.0, 1.0));
    let back = scene.vector_to_local(root, v);
    assert!((back.x - 1.0).abs() < 1e-5);
    assert!((back.y - 1.0).abs() < 1e-5);
}

#[test]
fn reparent_rejects_cycles() {
    let mut scene = Scene::new();
    let a = scene.add_node(None);
    let b = scene.add_node(Some(a));
    let c = scene.add_node(Some(b));

    assert!(!scene.reparent(a, Some(c)));
    assert!(scene.reparent(c, Some(a)));
    assert_eq!(scene.parent(c), Some(a));
}

#[test]
fn remove_node_drops_subtree() {
    let mut scene = Scene::new();
    let a = scene.add_node(None);
    let b = scene.add_node(Some(a));
    let c = scene.add_node(Some(b));

    scene.remove_node(b);
    assert!(scene.contains(a));
    assert!(!scene.contains(b));
    assert!(!scene.contains(c));
    assert!(scene.children(a).is_empty());
}

#[test]
fn clip_ancestor_tracks_reparent_and_flag_changes() {
    let mut scene = Scene::new();
    let root = scene.add_node(None);
    let clipper = scene.add_node(Some(root));
    scene.set_clipping(clipper, true);
    let inner = scene.add_node(Some(clipper));
    let leaf = scene.add_node(Some(inner));

    assert_eq!(scene.clip_ancestor(leaf), Some(clipper));
    // Nearest strict ancestor: the clipper itself is not its own clipper.
    assert_eq!(scene.clip_ancestor(clipper), None);

    scene.set_clipping(clipper, false);
    assert_eq!(scene.clip_ancestor(leaf), None);

    scene.set_clipping(root, true);
    assert_eq!(scene.clip_ancestor(leaf), Some(root));

    scene.reparent(leaf, Some(root));
    assert_eq!(scene.clip_ancestor(leaf), Some(root));
    scene.reparent(leaf, None);
    assert_eq!(scene.clip_ancestor(leaf), None);
}

#[test]
fn hit_test_prefers_higher_plane() {
    let mut scene = Scene::new();
    let root = scene.add_node(None);
    scene.set_size(root, Size::new(200.0, 200.0));
    let low = touch_rect(&mut scene, Some(root), Point::new(0.0, 0.0), Size::new(100.0, 100.0));
    let high = touch_rect(&mut scene, Some(root), Point::new(0.0, 0.0), Size::new(100.0, 100.0));
    scene.set_plane(low, 1.0);
    scene.set_plane(high, 2.0);

    let hits = hit_test(&scene, root, Point::new(50.0, 50.0));
    assert_eq!(hits, vec![high, low]);
}

#[test]
fn hit_test_coplanar_child_beats_parent() {
    let mut scene = Scene::new();
    let parent = touch_rect(&mut scene, None, Point::ZERO, Size::new(100.0, 100.0));
    let child = touch_rect(&mut scene, Some(parent), Point::ZERO, Size::new(100.0, 100.0));

    let hits = hit_test(&scene, parent, Point::new(10.0, 10.0));
    assert_eq!(hits, vec![child, parent]);
}

#[test]
fn hit_test_empty_when_nothing_matches() {
    let mut scene = Scene::new();
    let root = touch_rect(&mut scene, None, Point::ZERO, Size::new(10.0, 10.0));
    assert!(hit_test(&scene, root, Point::new(50.0, 50.0)).is_empty());
}

#[test]
fn hit_test_skips_non_interactive_but_visits_children() {
    let mut scene = Scene::new();
    let parent = scene.add_node(None);
    scene.set_size(parent, Size::new(100.0, 100.0));
    let child = touch_rect(&mut scene, Some(parent), Point::ZERO, Size::new(100.0, 100.0));

    let hits = hit_test(&scene, parent, Point::new(5.0, 5.0));
    assert_eq!(hits, vec![child]);
}

#[test]
fn clipped_descendant_outside_clipper_misses() {
    let mut scene = Scene::new();
    let root = scene.add_node(None);
    scene.set_size(root, Size::new(500.0, 500.0));
    let clipper = scene.add_node(Some(root));
    scene.set_size(clipper, Size::new(50.0, 50.0));
    scene.set_clipping(clipper, true);
    // Child bounds extend past the clipper.
    let child = touch_rect(&mut scene, Some(clipper), Point::ZERO, Size::new(200.0, 200.0));

    // Inside the child's bounds but outside the clipping ancestor: no hit.
    assert!(hit_test(&scene, root, Point::new(100.0, 100.0)).is_empty());
    // Inside both: hit.
    assert_eq!(hit_test(&scene, root, Point::new(25.0, 25.0)), vec![child]);
}

#[test]
fn position_revision_bumps_on_change_only() {
    let mut scene = Scene::new();
    let node = scene.add_node(None);
    let r0 = scene.position_revision(node);
    scene.set_position(node, Point::new(1.0, 0.0));
    let r1 = scene.position_revision(node);
    scene.set_position(node, Point::new(1.0, 0.0));
    let r2 = scene.position_revision(node);
    assert!(r1 > r0);
    assert_eq!(r1, r2);
}
