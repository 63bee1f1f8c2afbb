//! Plane-ordered hit testing over the node tree.

use crate::{NodeId, Scene};
use smallvec::SmallVec;
use tactum_geometry::Point;

/// Collects every node under `root` that accepts the root-space `point`,
/// ordered front-most first.
///
/// A node qualifies iff it is interactive, contains the point in its local
/// bounds, and its nearest clipping ancestor (when it has one) also contains
/// the point. Children are collected before their parent, then the list is
/// stably sorted by descending plane, so among coplanar nodes, descendants
/// stay ahead of ancestors. The first entry is the hit target. Never fails;
/// an unknown root yields an empty list.
pub fn hit_test(scene: &Scene, root: NodeId, point: Point) -> Vec<NodeId> {
    let mut candidates: SmallVec<[NodeId; 8]> = SmallVec::new();
    collect(scene, root, point, &mut candidates);
    let mut result: Vec<NodeId> = candidates.into_vec();
    result.sort_by(|a, b| {
        scene
            .plane(*b)
            .partial_cmp(&scene.plane(*a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    result
}

fn collect(scene: &Scene, id: NodeId, point: Point, out: &mut SmallVec<[NodeId; 8]>) {
    if !scene.contains(id) {
        return;
    }
    for &child in scene.children(id) {
        collect(scene, child, point, out);
    }
    if !scene.interactive(id) || !scene.contains_global_point(id, point) {
        return;
    }
    if let Some(clipper) = scene.clip_ancestor(id) {
        if !scene.contains_global_point(clipper, point) {
            return;
        }
    }
    out.push(id);
}
