// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core scene implementation: structure, attach/detach, render passes, queries.

use alloc::{vec, vec::Vec};
use kurbo::{Affine, Point, Rect, Size, Vec2};
use smallvec::SmallVec;

use crate::damage::Damage;
use crate::list::{ListHandle, OrderedList};
use crate::types::{NodeFlags, NodeId, Transform};

/// Per-node layout hook invoked by [`Scene::render`].
///
/// Implementations recompute the size of `id` from its (already rendered)
/// children and write each child's translation. They may call back into
/// [`Scene::render`] for an ancestor when the node's size changed, which is
/// how a single leaf edit cascades up to the root.
pub trait Layout<T> {
    /// Recompute the size of `id` and place its children.
    fn update_layout(&mut self, scene: &mut Scene<T>, id: NodeId);
}

/// A [`Layout`] that leaves every node's size and child placement untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedLayout;

impl<T> Layout<T> for FixedLayout {
    fn update_layout(&mut self, _scene: &mut Scene<T>, _id: NodeId) {}
}

/// Retained scene graph.
///
/// Nodes live in a generational arena and carry a payload of type `T`. Every
/// node owns an ordered list of children and keeps a non-owning back
/// reference to its parent, together with the handle of its own entry in
/// that parent's list. That handle is what makes [`Scene::detach_child`] and
/// [`Scene::insert_child_before`] O(1).
///
/// ## Example
///
/// ```rust
/// use kurbo::{Size, Vec2};
/// use understory_scene::{FixedLayout, Scene};
///
/// let mut scene = Scene::new();
/// let root = scene.insert(None, "root");
/// let a = scene.insert(Some(root), "a");
/// let c = scene.insert(Some(root), "c");
/// let b = scene.insert(None, "b");
/// scene.insert_child_before(root, b, c);
///
/// let order: Vec<_> = scene.children(root).map(|id| *scene.payload(id).unwrap()).collect();
/// assert_eq!(order, ["a", "b", "c"]);
///
/// scene.set_translation(root, Vec2::new(10.0, 0.0));
/// scene.set_translation(b, Vec2::new(5.0, 5.0));
/// scene.set_size(b, Size::new(4.0, 4.0));
/// scene.render(root, &mut FixedLayout);
/// assert_eq!(scene.offset_to(b, None), Vec2::new(15.0, 5.0));
/// # let _ = a;
/// ```
pub struct Scene<T> {
    /// slots
    nodes: Vec<Option<Node<T>>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    damage: Damage,
}

impl<T> core::fmt::Debug for Scene<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("Scene")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .field("damage", &self.damage)
            .finish_non_exhaustive()
    }
}

impl<T> Default for Scene<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Results of a hit test.
#[derive(Clone, Debug)]
pub struct Hit {
    /// The matched node.
    pub node: NodeId,
    /// Path from the query root to node (inclusive).
    pub path: Vec<NodeId>,
}

/// Filters applied during hit testing.
#[derive(Clone, Copy, Debug)]
pub struct QueryFilter {
    /// Bitfield of required node flags. Only nodes containing all these flags will be included.
    pub required_flags: NodeFlags,
}

impl Default for QueryFilter {
    fn default() -> Self {
        Self {
            required_flags: NodeFlags::empty(),
        }
    }
}

impl QueryFilter {
    /// Create a new empty filter (includes all nodes).
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter to only visible nodes.
    pub fn visible(mut self) -> Self {
        self.required_flags |= NodeFlags::VISIBLE;
        self
    }

    /// Filter to only pickable nodes.
    pub fn pickable(mut self) -> Self {
        self.required_flags |= NodeFlags::PICKABLE;
        self
    }

    /// Check if a node's flags satisfy this filter.
    pub fn matches(&self, node_flags: NodeFlags) -> bool {
        node_flags.contains(self.required_flags)
    }
}

/// What the last render pass handed to the drawing layer.
#[derive(Clone, Copy, Debug)]
struct Rendered {
    local: Affine,
    world: Affine,
    world_bounds: Rect,
}

impl Default for Rendered {
    fn default() -> Self {
        Self {
            local: Affine::IDENTITY,
            world: Affine::IDENTITY,
            world_bounds: Rect::ZERO,
        }
    }
}

#[derive(Clone, Debug)]
struct Node<T> {
    generation: u32,
    parent: Option<NodeId>,
    /// Entry of this node in `parent`'s child list.
    handle: Option<ListHandle>,
    children: OrderedList<NodeId>,
    transform: Transform,
    size: Size,
    flags: NodeFlags,
    rendered: Rendered,
    payload: T,
}

impl<T> Node<T> {
    fn new(generation: u32, payload: T) -> Self {
        Self {
            generation,
            parent: None,
            handle: None,
            children: OrderedList::new(),
            transform: Transform::IDENTITY,
            size: Size::ZERO,
            flags: NodeFlags::default(),
            rendered: Rendered::default(),
            payload,
        }
    }
}

type ChildSnapshot = SmallVec<[NodeId; 8]>;

impl<T> Scene<T> {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            damage: Damage::default(),
        }
    }

    /// Insert a new node carrying `payload`, appended to `parent`'s children
    /// (or detached if `None`).
    pub fn insert(&mut self, parent: Option<NodeId>, payload: T) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, payload));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, payload)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        if let Some(p) = parent {
            self.attach_child(p, id);
        }
        id
    }

    /// Remove a node and its whole subtree, detaching it from its parent first.
    ///
    /// Every id in the subtree becomes stale.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.detach_child(parent, id);
        }
        let mut stack = vec![id];
        let mut removed = 0_usize;
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes[id.idx()].take() {
                stack.extend(node.children.iter().copied());
                self.free_list.push(id.idx());
                removed += 1;
            }
        }
        tracing::trace!(root = ?id, removed, "removed subtree");
    }

    /// Append `child` to `parent`'s child list.
    ///
    /// # Panics
    ///
    /// Panics if `child` already has a parent, if either id is stale, or if
    /// `child` is `parent` or one of its ancestors. Each of these means a
    /// detach was missed and two trees would share a node.
    pub fn attach_child(&mut self, parent: NodeId, child: NodeId) {
        self.assert_attachable(parent, child);
        let handle = self.node_mut(parent).children.push_back(child);
        let c = self.node_mut(child);
        c.parent = Some(parent);
        c.handle = Some(handle);
    }

    /// Insert `new_child` into `parent`'s child list immediately before
    /// `existing`, leaving the order of all other children untouched.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`Scene::attach_child`], and if
    /// `existing` is not currently a child of `parent`.
    pub fn insert_child_before(&mut self, parent: NodeId, new_child: NodeId, existing: NodeId) {
        self.assert_attachable(parent, new_child);
        let anchor = self.node(existing);
        assert!(
            anchor.parent == Some(parent),
            "insert_child_before: {existing:?} is not a child of {parent:?}"
        );
        let Some(anchor) = anchor.handle else {
            unreachable!("attached node without a list handle");
        };
        let Ok(handle) = self
            .node_mut(parent)
            .children
            .insert_before(new_child, anchor)
        else {
            unreachable!("child handle is stale while the child is attached");
        };
        let c = self.node_mut(new_child);
        c.parent = Some(parent);
        c.handle = Some(handle);
    }

    /// Remove `child` from `parent`'s child list and return it, detached.
    ///
    /// # Panics
    ///
    /// Panics if `child` is not currently a child of `parent`.
    pub fn detach_child(&mut self, parent: NodeId, child: NodeId) -> NodeId {
        let c = self.node(child);
        assert!(
            c.parent == Some(parent),
            "detach_child: {child:?} is not a child of {parent:?}"
        );
        let Some(handle) = c.handle else {
            unreachable!("attached node without a list handle");
        };
        let removed = self.node_mut(parent).children.remove(handle);
        debug_assert_eq!(removed, Some(child), "child list out of sync with parent link");
        let c = self.node_mut(child);
        c.parent = None;
        c.handle = None;
        child
    }

    /// Detach `id` from whatever parent it has. Returns the former parent.
    pub fn detach(&mut self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent_of(id)?;
        self.detach_child(parent, id);
        Some(parent)
    }

    /// Put `new_child` at `old_child`'s position in `parent` and detach
    /// `old_child`. Returns `old_child`.
    pub fn replace_child(&mut self, parent: NodeId, old_child: NodeId, new_child: NodeId) -> NodeId {
        self.insert_child_before(parent, new_child, old_child);
        self.detach_child(parent, old_child)
    }

    /// Render the subtree rooted at `id`.
    ///
    /// Pass 1 renders every child first, so their sizes are current, then
    /// runs `layout` for `id` itself. Pass 2 walks the subtree again and
    /// composes each node's transform onto its parent's, recording the
    /// result for the drawing layer and accumulating [`Damage`].
    ///
    /// Damage is kept until [`Scene::take_damage`] drains it.
    pub fn render<L: Layout<T> + ?Sized>(&mut self, id: NodeId, layout: &mut L) {
        if !self.is_alive(id) {
            return;
        }
        for child in self.child_snapshot(id) {
            self.render(child, layout);
        }
        layout.update_layout(self, id);
        if !self.is_alive(id) {
            return;
        }
        let parent_world = self
            .parent_of(id)
            .map_or(Affine::IDENTITY, |p| self.node(p).rendered.world);
        self.apply_transforms(id, parent_world);
    }

    /// Drain the damage accumulated since the last call.
    pub fn take_damage(&mut self) -> Damage {
        core::mem::take(&mut self.damage)
    }

    /// Hit test a point given in the coordinate space of `root`'s parent.
    ///
    /// Children are tested before their parent and later siblings before
    /// earlier ones, so the deepest, topmost node wins. A node is hit when
    /// the point, mapped into its local space, lies inside `(0, 0)..size`.
    /// Invisible nodes hide their whole subtree.
    pub fn hit_test_point(&self, root: NodeId, point: Point, filter: QueryFilter) -> Option<Hit> {
        fn walk<T>(
            scene: &Scene<T>,
            id: NodeId,
            parent_world: Affine,
            point: Point,
            filter: QueryFilter,
            path: &mut Vec<NodeId>,
        ) -> Option<NodeId> {
            let node = scene.node(id);
            if !node.flags.contains(NodeFlags::VISIBLE) {
                return None;
            }
            let world = parent_world * node.transform.to_affine();
            path.push(id);
            let children: ChildSnapshot = node.children.iter().copied().collect();
            for &child in children.iter().rev() {
                if let Some(hit) = walk(scene, child, world, point, filter, path) {
                    return Some(hit);
                }
            }
            let local = world.inverse() * point;
            if filter.matches(node.flags) && node.size.to_rect().contains(local) {
                return Some(id);
            }
            path.pop();
            None
        }

        if !self.is_alive(root) {
            return None;
        }
        let mut path = Vec::new();
        let node = walk(self, root, Affine::IDENTITY, point, filter, &mut path)?;
        Some(Hit { node, path })
    }
}

impl<T> Scene<T> {
    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .map(|n| n.generation == id.1)
            .unwrap_or(false)
    }

    /// Returns the parent of a node if live, or `None` for detached nodes or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Iterate the children of a node in order (empty for stale ids).
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node_opt(id)
            .into_iter()
            .flat_map(|n| n.children.iter().copied())
    }

    /// Number of children of a node.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.node_opt(id).map_or(0, |n| n.children.len())
    }

    /// Position of `id` within its parent's child list. O(siblings).
    pub fn child_position(&self, id: NodeId) -> Option<usize> {
        let node = self.node_opt(id)?;
        let parent = self.node_opt(node.parent?)?;
        parent.children.position(node.handle?)
    }

    /// Payload of a live node.
    pub fn payload(&self, id: NodeId) -> Option<&T> {
        self.node_opt(id).map(|n| &n.payload)
    }

    /// Mutable payload of a live node.
    pub fn payload_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.node_opt_mut(id).map(|n| &mut n.payload)
    }

    /// Local transform of a live node.
    pub fn transform(&self, id: NodeId) -> Option<Transform> {
        self.node_opt(id).map(|n| n.transform)
    }

    /// Update the local transform. Takes effect on the next render.
    pub fn set_transform(&mut self, id: NodeId, transform: Transform) {
        if let Some(n) = self.node_opt_mut(id) {
            n.transform = transform;
        }
    }

    /// Local translation of a live node.
    pub fn translation(&self, id: NodeId) -> Option<Vec2> {
        self.node_opt(id).map(|n| n.transform.translation)
    }

    /// Update only the translation part of the local transform.
    pub fn set_translation(&mut self, id: NodeId, translation: Vec2) {
        if let Some(n) = self.node_opt_mut(id) {
            n.transform.translation = translation;
        }
    }

    /// Size of a live node (its local bounds are `(0, 0)..size`).
    pub fn size(&self, id: NodeId) -> Option<Size> {
        self.node_opt(id).map(|n| n.size)
    }

    /// Update the size of a node. Returns `true` if it changed.
    pub fn set_size(&mut self, id: NodeId, size: Size) -> bool {
        let Some(n) = self.node_opt_mut(id) else {
            return false;
        };
        if n.size == size {
            return false;
        }
        n.size = size;
        if !self.damage.resized.contains(&id) {
            self.damage.resized.push(id);
        }
        true
    }

    /// Flags of a live node.
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.node_opt(id).map(|n| n.flags)
    }

    /// Update node flags.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        if let Some(n) = self.node_opt_mut(id) {
            n.flags = flags;
        }
    }

    /// Returns `true` if `id` is `root` or lies somewhere below it.
    pub fn is_in_subtree(&self, id: NodeId, root: NodeId) -> bool {
        let mut current = Some(id).filter(|&id| self.is_alive(id));
        while let Some(node) = current {
            if node == root {
                return true;
            }
            current = self.parent_of(node);
        }
        false
    }

    /// Sum of translations from `id` (inclusive) up to `ancestor` (exclusive).
    ///
    /// With `None`, or if `ancestor` is not on the parent chain, the walk
    /// runs up to and including the root.
    pub fn offset_to(&self, id: NodeId, ancestor: Option<NodeId>) -> Vec2 {
        let mut offset = Vec2::ZERO;
        let mut current = Some(id).filter(|&id| self.is_alive(id));
        while let Some(node) = current {
            if Some(node) == ancestor {
                break;
            }
            let n = self.node(node);
            offset += n.transform.translation;
            current = n.parent;
        }
        offset
    }

    /// Compose local transforms from the root down to `id`, using current
    /// (not yet rendered) transforms.
    pub fn world_transform(&self, id: NodeId) -> Option<Affine> {
        let mut node = self.node_opt(id)?;
        let mut tf = node.transform.to_affine();
        while let Some(parent) = node.parent {
            node = self.node(parent);
            tf = node.transform.to_affine() * tf;
        }
        Some(tf)
    }

    /// Local transform handed to the drawing layer by the last render.
    pub fn rendered_transform(&self, id: NodeId) -> Option<Affine> {
        self.node_opt(id).map(|n| n.rendered.local)
    }

    /// World-space AABB as of the last render.
    pub fn world_bounds(&self, id: NodeId) -> Option<Rect> {
        self.node_opt(id).map(|n| n.rendered.world_bounds)
    }

    /// Iterate `root` and its descendants in depth-first pre-order.
    pub fn subtree(&self, root: NodeId) -> Subtree<'_, T> {
        let stack = if self.is_alive(root) {
            vec![root]
        } else {
            Vec::new()
        };
        Subtree { scene: self, stack }
    }

    /// Iterate every live node, attached or not, in slot order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().enumerate().filter_map(|(idx, n)| {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            let idx = idx as u32;
            n.as_ref().map(|n| NodeId::new(idx, n.generation))
        })
    }

    // --- internals ---

    /// Access a node; panics if `id` is stale.
    fn node(&self, id: NodeId) -> &Node<T> {
        self.node_opt(id).expect("dangling NodeId")
    }

    /// Access a node mutably; panics if `id` is stale.
    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.node_opt_mut(id).expect("dangling NodeId")
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node<T>> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node<T>> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn assert_attachable(&self, parent: NodeId, child: NodeId) {
        assert!(self.is_alive(parent), "dangling parent {parent:?}");
        let c = self.node(child);
        assert!(
            c.parent.is_none(),
            "{child:?} is already attached to {:?}; detach it first",
            c.parent
        );
        assert!(
            !self.is_in_subtree(parent, child),
            "attaching {child:?} under {parent:?} would create a cycle"
        );
    }

    fn child_snapshot(&self, id: NodeId) -> ChildSnapshot {
        self.node(id).children.iter().copied().collect()
    }

    fn apply_transforms(&mut self, root: NodeId, root_parent_world: Affine) {
        // Placement propagates toward the leaves, so this walk is top-down.
        let mut stack = vec![(root, root_parent_world)];
        while let Some((id, parent_world)) = stack.pop() {
            let node = self.node_mut(id);
            let local = node.transform.to_affine();
            let world = parent_world * local;
            let world_bounds = transform_rect_bbox(world, node.size.to_rect());
            let old_bounds = node.rendered.world_bounds;
            node.rendered = Rendered {
                local,
                world,
                world_bounds,
            };
            for &child in node.children.iter() {
                stack.push((child, world));
            }

            if old_bounds != world_bounds {
                if old_bounds.width() > 0.0 && old_bounds.height() > 0.0 {
                    self.damage.dirty_rects.push(old_bounds);
                }
                if world_bounds.width() > 0.0 && world_bounds.height() > 0.0 {
                    self.damage.dirty_rects.push(world_bounds);
                }
            }
        }
    }
}

/// Depth-first pre-order iterator returned by [`Scene::subtree`].
#[derive(Debug)]
pub struct Subtree<'a, T> {
    scene: &'a Scene<T>,
    stack: Vec<NodeId>,
}

impl<T> Iterator for Subtree<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let before = self.stack.len();
        self.stack.extend(self.scene.children(id));
        // Keep pre-order: first child on top.
        self.stack[before..].reverse();
        Some(id)
    }
}

/// Transform an axis-aligned `Rect` by an `Affine` and return a conservative
/// axis-aligned bounding box.
fn transform_rect_bbox(affine: Affine, rect: Rect) -> Rect {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    let min_x = (a * rect.x0).min(a * rect.x1) + (c * rect.y0).min(c * rect.y1);
    let max_x = (a * rect.x0).max(a * rect.x1) + (c * rect.y0).max(c * rect.y1);
    let min_y = (b * rect.x0).min(b * rect.x1) + (d * rect.y0).min(d * rect.y1);
    let max_y = (b * rect.x0).max(b * rect.x1) + (d * rect.y0).max(d * rect.y1);
    Rect::new(min_x + e, min_y + f, max_x + e, max_y + f)
}
