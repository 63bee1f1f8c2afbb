//! Arena-indexed 2D transform hierarchy.
//!
//! The scene stores nodes in a slotmap so parent/child references are stable
//! indices rather than owning pointers; a destroyed node's id simply stops
//! resolving, which is what lets touch sessions hold node references without
//! keeping nodes alive. Geometry is always resolved fresh from the current
//! tree — callers cache node identity, never coordinates.

mod hit_test;
mod transform;

pub use hit_test::hit_test;
pub use transform::Affine;

use tactum_geometry::{Point, Size};

slotmap::new_key_type! {
    /// Stable, generation-checked identifier for a scene node.
    pub struct NodeId;
}

/// One node of the hierarchy. Fields are accessed through [`Scene`] so the
/// clip-ancestor cache and position revision stay consistent.
#[derive(Debug)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    position: Point,
    size: Size,
    rotation: f32,
    scale: Point,
    plane: f32,
    interactive: bool,
    clipping: bool,
    /// Nearest strict ancestor with clipping enabled, cached.
    clip_ancestor: Option<NodeId>,
    /// Bumped on every position write; consumers poll this to react to moves.
    position_revision: u64,
}

impl Node {
    fn new(parent: Option<NodeId>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            position: Point::ZERO,
            size: Size::ZERO,
            rotation: 0.0,
            scale: Point::ONE,
            plane: 0.0,
            interactive: false,
            clipping: false,
            clip_ancestor: None,
            position_revision: 0,
        }
    }
}

/// The transform hierarchy: an arena of nodes plus the operations the
/// interaction engine needs from it (coordinate conversion, containment,
/// clip-ancestor resolution).
#[derive(Default)]
pub struct Scene {
    nodes: slotmap::SlotMap<NodeId, Node>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a node under `parent` (or as a root when `None`).
    pub fn add_node(&mut self, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.insert(Node::new(parent));
        if let Some(parent_id) = parent {
            if let Some(parent_node) = self.nodes.get_mut(parent_id) {
                parent_node.children.push(id);
            } else {
                log::warn!("add_node: parent {parent_id:?} does not exist, creating root");
                self.nodes[id].parent = None;
            }
        }
        self.refresh_clip_ancestors(id);
        id
    }

    /// Removes a node and its whole subtree. Unknown ids are ignored.
    pub fn remove_node(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if let Some(parent_id) = node.parent {
            if let Some(parent) = self.nodes.get_mut(parent_id) {
                parent.children.retain(|&c| c != id);
            }
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
            }
        }
    }

    /// Moves `id` under `new_parent`, rejecting cycles.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> bool {
        if !self.nodes.contains_key(id) {
            return false;
        }
        if let Some(parent_id) = new_parent {
            if !self.nodes.contains_key(parent_id) || self.is_ancestor(id, parent_id) {
                return false;
            }
        }
        if let Some(old_parent) = self.nodes[id].parent {
            if let Some(parent) = self.nodes.get_mut(old_parent) {
                parent.children.retain(|&c| c != id);
            }
        }
        self.nodes[id].parent = new_parent;
        if let Some(parent_id) = new_parent {
            self.nodes[parent_id].children.push(id);
        }
        self.refresh_clip_ancestors(id);
        true
    }

    /// Whether `ancestor` is `id` itself or a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.nodes.get(node_id).and_then(|n| n.parent);
        }
        false
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    // ------------------------------------------------------------------
    // Transform fields
    // ------------------------------------------------------------------

    pub fn position(&self, id: NodeId) -> Point {
        self.nodes.get(id).map(|n| n.position).unwrap_or(Point::ZERO)
    }

    pub fn set_position(&mut self, id: NodeId, position: Point) {
        if let Some(node) = self.nodes.get_mut(id) {
            if node.position != position {
                node.position = position;
                node.position_revision += 1;
            }
        }
    }

    /// Monotonic counter bumped on every effective position write.
    pub fn position_revision(&self, id: NodeId) -> u64 {
        self.nodes.get(id).map(|n| n.position_revision).unwrap_or(0)
    }

    pub fn size(&self, id: NodeId) -> Size {
        self.nodes.get(id).map(|n| n.size).unwrap_or(Size::ZERO)
    }

    pub fn set_size(&mut self, id: NodeId, size: Size) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.size = size;
        }
    }

    pub fn rotation(&self, id: NodeId) -> f32 {
        self.nodes.get(id).map(|n| n.rotation).unwrap_or(0.0)
    }

    pub fn set_rotation(&mut self, id: NodeId, radians: f32) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.rotation = radians;
        }
    }

    pub fn scale(&self, id: NodeId) -> Point {
        self.nodes.get(id).map(|n| n.scale).unwrap_or(Point::ONE)
    }

    pub fn set_scale(&mut self, id: NodeId, scale: Point) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.scale = scale;
        }
    }

    pub fn plane(&self, id: NodeId) -> f32 {
        self.nodes.get(id).map(|n| n.plane).unwrap_or(0.0)
    }

    pub fn set_plane(&mut self, id: NodeId, plane: f32) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.plane = plane;
        }
    }

    pub fn interactive(&self, id: NodeId) -> bool {
        self.nodes.get(id).map(|n| n.interactive).unwrap_or(false)
    }

    pub fn set_interactive(&mut self, id: NodeId, interactive: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.interactive = interactive;
        }
    }

    pub fn clipping(&self, id: NodeId) -> bool {
        self.nodes.get(id).map(|n| n.clipping).unwrap_or(false)
    }

    pub fn set_clipping(&mut self, id: NodeId, clipping: bool) {
        let changed = match self.nodes.get_mut(id) {
            Some(node) if node.clipping != clipping => {
                node.clipping = clipping;
                true
            }
            _ => false,
        };
        if changed {
            // The node's own clip ancestor is unaffected (nearest *strict*
            // ancestor), but every descendant's may change.
            for child in self.children(id).to_vec() {
                self.refresh_clip_ancestors(child);
            }
        }
    }

    /// Nearest strict ancestor with clipping enabled, from the cache.
    pub fn clip_ancestor(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.clip_ancestor)
    }

    fn refresh_clip_ancestors(&mut self, subtree: NodeId) {
        let mut stack = vec![subtree];
        while let Some(id) = stack.pop() {
            let resolved = self.resolve_clip_ancestor(id);
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            node.clip_ancestor = resolved;
            stack.extend(node.children.iter().copied());
        }
    }

    fn resolve_clip_ancestor(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.nodes.get(id).and_then(|n| n.parent);
        while let Some(node_id) = current {
            let node = self.nodes.get(node_id)?;
            if node.clipping {
                return Some(node_id);
            }
            current = node.parent;
        }
        None
    }

    // ------------------------------------------------------------------
    // Coordinate conversion
    // ------------------------------------------------------------------

    /// Local transform of one node (parent space ← local space).
    pub fn local_transform(&self, id: NodeId) -> Affine {
        match self.nodes.get(id) {
            Some(node) => Affine::from_parts(node.position, node.rotation, node.scale),
            None => Affine::IDENTITY,
        }
    }

    /// Global transform: root space ← this node's local space.
    pub fn global_transform(&self, id: NodeId) -> Affine {
        let mut transform = self.local_transform(id);
        let mut current = self.parent(id);
        while let Some(node_id) = current {
            transform = self.local_transform(node_id).then(&transform);
            current = self.parent(node_id);
        }
        transform
    }

    /// The node's origin in root space.
    pub fn global_position(&self, id: NodeId) -> Point {
        self.global_transform(id).apply(Point::ZERO)
    }

    pub fn to_global(&self, id: NodeId, local: Point) -> Point {
        self.global_transform(id).apply(local)
    }

    /// Converts a root-space point into `id`'s local space. Degenerate
    /// transforms (zero scale somewhere on the ancestor chain) log and
    /// return the point unchanged.
    pub fn to_local(&self, id: NodeId, global: Point) -> Point {
        match self.global_transform(id).try_invert() {
            Some(inverse) => inverse.apply(global),
            None => {
                log::warn!("to_local: degenerate transform on {id:?}");
                global
            }
        }
    }

    /// Converts a direction vector into root space (no translation).
    pub fn vector_to_global(&self, id: NodeId, local: Point) -> Point {
        self.global_transform(id).apply_vector(local)
    }

    pub fn vector_to_local(&self, id: NodeId, global: Point) -> Point {
        match self.global_transform(id).try_invert() {
            Some(inverse) => inverse.apply_vector(global),
            None => global,
        }
    }

    /// Whether the root-space point falls inside the node's local bounds.
    /// False for unknown ids and degenerate transforms.
    pub fn contains_global_point(&self, id: NodeId, global: Point) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        let Some(inverse) = self.global_transform(id).try_invert() else {
            return false;
        };
        let local = inverse.apply(global);
        local.x >= 0.0
            && local.y >= 0.0
            && local.x <= node.size.width
            && local.y <= node.size.height
    }
}

#[cfg(test)]
#[path = "tests/scene_tests.rs"]
mod tests;
