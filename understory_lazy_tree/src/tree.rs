// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual node model: construction, expansion, collapse, and invalidation.

use alloc::vec;
use alloc::vec::Vec;
use core::mem;
use kurbo::Point;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::backing::BackingNode;
use crate::config::TreeConfig;
use crate::error::TreeError;
use crate::refresh::RefreshQueue;
use crate::surface::Surface;
use crate::types::{ConnectorRole, NodeId, NodeState};

/// Connector elements owned by a node, created on first use and keyed by role.
#[derive(Clone, Debug)]
pub(crate) struct Connectors<E> {
    slots: SmallVec<[(ConnectorRole, E); 3]>,
}

impl<E: Copy> Connectors<E> {
    fn new() -> Self {
        Self {
            slots: SmallVec::new(),
        }
    }

    pub(crate) fn get(&self, role: ConnectorRole) -> Option<E> {
        self.slots
            .iter()
            .find_map(|&(r, e)| (r == role).then_some(e))
    }

    pub(crate) fn get_or_insert_with(
        &mut self,
        role: ConnectorRole,
        create: impl FnOnce() -> E,
    ) -> E {
        if let Some(e) = self.get(role) {
            return e;
        }
        let e = create();
        self.slots.push((role, e));
        e
    }

    pub(crate) fn take(&mut self, role: ConnectorRole) -> Option<E> {
        let pos = self.slots.iter().position(|&(r, _)| r == role)?;
        Some(self.slots.swap_remove(pos).1)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node<B, E, C> {
    generation: u32,
    pub(crate) backing: B,
    /// Identity of the parent; only followed to bubble invalidation.
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Children reported by the backing node when this node was built.
    pub(crate) snapshot: Vec<B>,
    pub(crate) expanded: bool,
    /// Cached subtree width; `None` means dirty.
    pub(crate) required_width: Option<f64>,
    pub(crate) representation: Option<E>,
    pub(crate) connectors: Connectors<E>,
    /// Container and origin of the last draw.
    pub(crate) placement: Option<(C, Point)>,
}

impl<B, E: Copy, C> Node<B, E, C> {
    fn new(generation: u32, backing: B, snapshot: Vec<B>, representation: E) -> Self {
        Self {
            generation,
            backing,
            parent: None,
            children: Vec::new(),
            expanded: snapshot.is_empty(),
            snapshot,
            required_width: None,
            representation: Some(representation),
            connectors: Connectors::new(),
            placement: None,
        }
    }

    pub(crate) fn state(&self) -> NodeState {
        if self.snapshot.is_empty() {
            NodeState::Leaf
        } else if self.expanded {
            NodeState::Expanded
        } else {
            NodeState::Collapsed
        }
    }
}

pub(crate) type NodeOf<B, S> = Node<B, <S as Surface>::Element, <S as Surface>::Container>;

/// An expandable tree of visual nodes over a lazily queried node source.
///
/// The tree owns its render surface and one visual node per materialized
/// position. Ownership flows strictly from parent to child: collapsing a
/// node destroys every descendant along with their elements, and the
/// descendants' [`NodeId`]s go stale.
///
/// Structural changes go through [`LazyTree::expand`] and
/// [`LazyTree::collapse`]; [`LazyTree::invalidate`] then walks to the root
/// and performs one full layout and redraw pass there.
///
/// ## Example
///
/// ```rust
/// use understory_lazy_tree::{LazyTree, MemoryNode, NodeState, Scene, TreeConfig};
///
/// let root = MemoryNode::with_children("root", [MemoryNode::new("a"), MemoryNode::new("b")]);
/// let mut scene = Scene::new();
/// let container = scene.create_container();
///
/// let mut tree = LazyTree::build(scene, container, root, TreeConfig::default());
/// assert_eq!(tree.state(tree.root()), Some(NodeState::Collapsed));
///
/// tree.expand(tree.root(), false).unwrap();
/// tree.invalidate(tree.root()).unwrap();
/// assert_eq!(tree.children_of(tree.root()).len(), 2);
///
/// // 2 × 120 plus one 20 wide margin.
/// assert_eq!(tree.required_width(tree.root()), Some(260.0));
/// ```
pub struct LazyTree<B, S>
where
    B: BackingNode,
    S: Surface<Content = B::Content>,
{
    /// slots
    nodes: Vec<Option<NodeOf<B, S>>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    root: NodeId,
    pub(crate) config: TreeConfig,
    pub(crate) surface: S,
    pub(crate) refresh: RefreshQueue,
    pub(crate) redraw_epoch: u64,
}

impl<B, S> core::fmt::Debug for LazyTree<B, S>
where
    B: BackingNode,
    S: Surface<Content = B::Content>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LazyTree")
            .field("root", &self.root)
            .field("nodes_alive", &self.len())
            .field("free_list", &self.free_list.len())
            .field("redraw_epoch", &self.redraw_epoch)
            .field("pending_refreshes", &self.refresh.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<B, S> LazyTree<B, S>
where
    B: BackingNode,
    S: Surface<Content = B::Content>,
{
    /// Build a tree over `root` and draw it into `container` at the origin.
    ///
    /// The root is constructed like any other node: its children are
    /// snapshotted and, if the backing node remembers being expanded, the
    /// previously open paths are materialized again.
    pub fn build(surface: S, container: S::Container, root: B, config: TreeConfig) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            // Generation 0 is never issued, so this placeholder is never alive.
            root: NodeId::new(0, 0),
            config,
            surface,
            refresh: RefreshQueue::new(),
            redraw_epoch: 0,
        };
        tree.root = tree.construct(root, None);
        tree.redraw_epoch += 1;
        tree.draw_node(tree.root, container, Point::ORIGIN);
        tree
    }

    /// The root node. It lives as long as the tree.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Configuration the tree was built with.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// The render surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access to the render surface, e.g. to feed it pointer input.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Number of redraw passes run so far, including the initial draw.
    pub fn redraw_epoch(&self) -> u64 {
        self.redraw_epoch
    }

    /// Number of materialized visual nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Always `false`: the root exists for the tree's whole lifetime.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expand `id`, materializing one visual child per snapshot entry.
    ///
    /// With `recursive`, every descendant is expanded too, depth first and
    /// without bound; do not use it on huge or unbounded sources.
    ///
    /// Expanding a node that is already expanded (or a leaf) is a no-op and
    /// returns `Ok(false)`. The node and its ancestors are marked dirty, but
    /// nothing is redrawn until [`LazyTree::invalidate`] is called.
    pub fn expand(&mut self, id: NodeId, recursive: bool) -> Result<bool, TreeError> {
        let state = self.state(id).ok_or(TreeError::StaleNode(id))?;
        if state.is_expanded() {
            debug!(?id, ?state, "expand ignored, node already expanded");
            return Ok(false);
        }
        self.expand_node(id);
        if recursive {
            let mut stack: Vec<NodeId> = self.node(id).children.iter().rev().copied().collect();
            while let Some(next) = stack.pop() {
                if self.node(next).state() == NodeState::Collapsed {
                    self.expand_node(next);
                }
                stack.extend(self.node(next).children.iter().rev().copied());
            }
        }
        debug!(?id, recursive, materialized = self.len(), "expanded node");
        self.mark_dirty_to_root(id);
        Ok(true)
    }

    /// Collapse `id`, destroying all of its descendants and its child connectors.
    ///
    /// With `remove_self`, the node's own representation and parent link are
    /// destroyed as well; the node stays in the tree and gets a fresh
    /// representation on its next draw. Afterwards the node is expanded only
    /// if it is a leaf.
    pub fn collapse(&mut self, id: NodeId, remove_self: bool) -> Result<(), TreeError> {
        if !self.is_alive(id) {
            return Err(TreeError::StaleNode(id));
        }
        self.collapse_node(id, remove_self);
        let node = self.node(id);
        if !node.snapshot.is_empty() {
            node.backing.remember_expansion(false);
        }
        debug!(?id, remove_self, materialized = self.len(), "collapsed node");
        self.mark_dirty_to_root(id);
        Ok(())
    }

    /// Mark `id` and all of its ancestors dirty, then redraw from the root.
    ///
    /// Calls are not coalesced: every call runs one full redraw pass.
    pub fn invalidate(&mut self, id: NodeId) -> Result<(), TreeError> {
        if !self.is_alive(id) {
            return Err(TreeError::StaleNode(id));
        }
        let (top, hops) = self.mark_dirty_to_root(id);
        trace!(?id, hops, "invalidated");
        self.redraw_from(top)
    }

    /// Re-query the children of `id` and rebuild its subtree.
    ///
    /// Snapshots are otherwise never refreshed, so this is the only way to
    /// observe structural changes in the backing source. Expansion state
    /// remembered on the backing nodes is restored for the new children, and
    /// the representation is recreated so its child count is current. Ends
    /// with an [`invalidate`](Self::invalidate).
    pub fn rebuild(&mut self, id: NodeId) -> Result<(), TreeError> {
        let state = self.state(id).ok_or(TreeError::StaleNode(id))?;
        self.collapse_node(id, false);
        let snapshot = self.node(id).backing.children();
        debug!(?id, children = snapshot.len(), "rebuilding subtree");
        let node = self.node_mut(id);
        node.expanded = snapshot.is_empty();
        node.snapshot = snapshot;
        self.swap_representation(id);
        let reopen = state == NodeState::Expanded
            || self.node(id).backing.remembered_expansion() == Some(true);
        if reopen && self.node(id).state() == NodeState::Collapsed {
            self.expand_node(id);
        }
        self.invalidate(id)
    }

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is live if its slot exists and its generation matches the
    /// generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .map(|n| n.generation == id.generation())
            .unwrap_or(false)
    }

    /// Expansion state of a live node.
    pub fn state(&self, id: NodeId) -> Option<NodeState> {
        self.node_opt(id).map(Node::state)
    }

    /// Returns `true` if the node is a leaf or shows its children.
    pub fn is_expanded(&self, id: NodeId) -> Option<bool> {
        self.node_opt(id).map(|n| n.expanded)
    }

    /// Returns the parent of a node if live, or `None` for the root or stale ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Get the materialized children of a node, or an empty slice if the node is stale.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.node_opt(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Backing children captured when the node was built (or last rebuilt).
    pub fn snapshot_of(&self, id: NodeId) -> &[B] {
        self.node_opt(id).map(|n| n.snapshot.as_slice()).unwrap_or(&[])
    }

    /// The backing node a visual node wraps.
    pub fn backing(&self, id: NodeId) -> Option<&B> {
        self.node_opt(id).map(|n| &n.backing)
    }

    /// Current representation element of a node.
    pub fn representation(&self, id: NodeId) -> Option<S::Element> {
        self.node_opt(id).and_then(|n| n.representation)
    }

    /// Connector element of the given role, if it has been created.
    pub fn connector(&self, id: NodeId, role: ConnectorRole) -> Option<S::Element> {
        self.node_opt(id).and_then(|n| n.connectors.get(role))
    }

    /// Container and origin the node was last drawn at.
    pub fn placement(&self, id: NodeId) -> Option<(S::Container, Point)> {
        self.node_opt(id).and_then(|n| n.placement)
    }

    /// Iterate materialized nodes in pre-order, starting at the root.
    pub fn visible_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        core::iter::successors(Some(self.root), move |&id| self.next_depth_first(id))
    }

    /// Get the next node in depth-first traversal order.
    ///
    /// Returns `None` if no next node exists or if the current node is stale.
    pub fn next_depth_first(&self, current: NodeId) -> Option<NodeId> {
        let node = self.node_opt(current)?;
        if let Some(&first_child) = node.children.first() {
            return Some(first_child);
        }
        let mut node = current;
        while let Some(parent) = self.parent_of(node) {
            if let Some(next_sibling) = self.next_sibling(parent, node) {
                return Some(next_sibling);
            }
            node = parent;
        }
        None
    }

    // --- internals ---

    fn next_sibling(&self, parent: NodeId, node: NodeId) -> Option<NodeId> {
        let siblings = &self.node(parent).children;
        let pos = siblings.iter().position(|&id| id == node)?;
        siblings.get(pos + 1).copied()
    }

    /// Build a visual node for `backing`, link it under `parent`, and restore
    /// a remembered expansion.
    fn construct(&mut self, backing: B, parent: Option<NodeId>) -> NodeId {
        let (id, restore) = self.materialize(backing, parent);
        if restore {
            self.expand_node(id);
        }
        id
    }

    /// Allocate the node and its representation. Returns whether the backing
    /// node remembers being expanded.
    fn materialize(&mut self, backing: B, parent: Option<NodeId>) -> (NodeId, bool) {
        let snapshot = backing.children();
        let content = backing.create_representation();
        let element = self.surface.create_representation(content, snapshot.len());
        let restore = !snapshot.is_empty() && backing.remembered_expansion() == Some(true);
        let id = self.alloc(|generation| Node::new(generation, backing, snapshot, element));
        self.surface.listen(element, id);
        if let Some(p) = parent {
            self.node_mut(p).children.push(id);
            self.node_mut(id).parent = Some(p);
        }
        (id, restore)
    }

    /// Materialize one child per snapshot entry, then do the same for every
    /// new child that remembers being expanded.
    pub(crate) fn expand_node(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let snapshot = self.node(current).snapshot.clone();
            for backing in snapshot {
                let (child, restore) = self.materialize(backing, Some(current));
                if restore {
                    trace!(id = ?child, "restoring remembered expansion");
                    pending.push(child);
                }
            }
            let node = self.node_mut(current);
            node.expanded = true;
            node.required_width = None;
            node.backing.remember_expansion(true);
        }
    }

    /// Destroy child connectors and the owned subtree of `id`.
    fn collapse_node(&mut self, id: NodeId, remove_self: bool) {
        let mut doomed = self.strip(id, remove_self);
        while let Some(child) = doomed.pop() {
            doomed.extend(self.strip(child, true));
            self.release(child);
        }
    }

    /// Destroy the child connectors of `id` (and with `remove_self`, its own
    /// elements) and detach its children, which are returned.
    fn strip(&mut self, id: NodeId, remove_self: bool) -> Vec<NodeId> {
        let node = self.node_mut(id);
        let mut elements: SmallVec<[S::Element; 4]> = ConnectorRole::CHILD_ROLES
            .iter()
            .filter_map(|&role| node.connectors.take(role))
            .collect();
        if remove_self {
            elements.extend(node.representation.take());
            elements.extend(node.connectors.take(ConnectorRole::ParentLink));
        }
        let children = mem::take(&mut node.children);
        node.required_width = None;
        node.expanded = node.snapshot.is_empty();
        for element in elements {
            self.surface.destroy(element);
        }
        children
    }

    /// Connector of `role` owned by `id`, created on first use.
    pub(crate) fn ensure_connector(&mut self, id: NodeId, role: ConnectorRole) -> S::Element {
        let Self { nodes, surface, .. } = self;
        let node = nodes[id.idx()].as_mut().expect("dangling NodeId");
        node.connectors
            .get_or_insert_with(role, || surface.create_connector(role))
    }

    /// Mark `id` and its ancestors dirty. Returns the root reached and the number of hops.
    pub(crate) fn mark_dirty_to_root(&mut self, id: NodeId) -> (NodeId, usize) {
        let mut current = id;
        let mut hops = 0;
        loop {
            let node = self.node_mut(current);
            node.required_width = None;
            match node.parent {
                Some(parent) => {
                    current = parent;
                    hops += 1;
                }
                None => return (current, hops),
            }
        }
    }

    fn alloc(&mut self, make: impl FnOnce(u32) -> NodeOf<B, S>) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(make(generation));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(make(generation)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        NodeId::new(idx, generation)
    }

    fn release(&mut self, id: NodeId) {
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    pub(crate) fn node_opt(&self, id: NodeId) -> Option<&NodeOf<B, S>> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.generation()).then_some(n)
    }

    /// Access a live node; panics if `id` is stale.
    pub(crate) fn node(&self, id: NodeId) -> &NodeOf<B, S> {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    /// Access a live node mutably; panics if `id` is stale.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeOf<B, S> {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryNode;
    use crate::scene::{ContainerId, Scene};

    type TestTree = LazyTree<MemoryNode<&'static str>, Scene<&'static str>>;

    fn build(root: MemoryNode<&'static str>) -> (TestTree, ContainerId) {
        let mut scene = Scene::new();
        let container = scene.create_container();
        let tree = LazyTree::build(scene, container, root, TreeConfig::default());
        (tree, container)
    }

    fn leaf(label: &'static str) -> MemoryNode<&'static str> {
        MemoryNode::new(label)
    }

    #[test]
    fn construction_snapshots_children_once() {
        let a = leaf("a");
        let root = MemoryNode::with_children("root", [a.clone(), leaf("b")]);
        let (mut tree, _) = build(root.clone());
        assert_eq!(root.child_queries(), 1);
        assert_eq!(tree.state(tree.root()), Some(NodeState::Collapsed));
        assert_eq!(tree.snapshot_of(tree.root()).len(), 2);

        // Later additions are invisible until a rebuild.
        root.push_child(leaf("c"));
        tree.expand(tree.root(), false).unwrap();
        assert_eq!(tree.children_of(tree.root()).len(), 2);
        assert_eq!(root.child_queries(), 1);
        // Each child was queried exactly once on construction.
        assert_eq!(a.child_queries(), 1);
    }

    #[test]
    fn leaf_is_always_expanded() {
        let (mut tree, _) = build(leaf("solo"));
        let root = tree.root();
        assert_eq!(tree.state(root), Some(NodeState::Leaf));
        assert_eq!(tree.is_expanded(root), Some(true));
        assert_eq!(tree.expand(root, false), Ok(false));
        tree.collapse(root, false).unwrap();
        assert_eq!(tree.is_expanded(root), Some(true));
    }

    #[test]
    fn expand_twice_is_a_noop() {
        let root = MemoryNode::with_children("root", [leaf("a"), leaf("b")]);
        let (mut tree, _) = build(root);
        let r = tree.root();
        assert_eq!(tree.expand(r, false), Ok(true));
        let first: Vec<NodeId> = tree.children_of(r).to_vec();
        assert_eq!(tree.expand(r, false), Ok(false));
        assert_eq!(tree.children_of(r), first.as_slice());
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn collapse_then_expand_rebuilds_fresh_children() {
        let a = leaf("a");
        let b = leaf("b");
        let root = MemoryNode::with_children("root", [a.clone(), b.clone()]);
        let (mut tree, _) = build(root);
        let r = tree.root();
        tree.expand(r, false).unwrap();
        tree.invalidate(r).unwrap();
        let old_children = tree.children_of(r).to_vec();
        let old_elements: Vec<_> = old_children
            .iter()
            .map(|&c| tree.representation(c).unwrap())
            .collect();

        tree.collapse(r, false).unwrap();
        assert!(old_children.iter().all(|&c| !tree.is_alive(c)));
        assert_eq!(tree.state(r), Some(NodeState::Collapsed));

        tree.expand(r, false).unwrap();
        tree.invalidate(r).unwrap();
        let new_children = tree.children_of(r).to_vec();
        assert_eq!(new_children.len(), 2);
        assert!(new_children.iter().all(|c| !old_children.contains(c)));
        assert!(tree.backing(new_children[0]).unwrap().ptr_eq(&a));
        assert!(tree.backing(new_children[1]).unwrap().ptr_eq(&b));
        for &c in &new_children {
            let element = tree.representation(c).unwrap();
            assert!(!old_elements.contains(&element), "expected a fresh element");
            assert!(tree.connector(c, ConnectorRole::ParentLink).is_some());
        }
        for element in old_elements {
            assert!(tree.surface().get(element).is_none());
        }
    }

    #[test]
    fn recursive_expand_materializes_everything() {
        let root = MemoryNode::with_children(
            "root",
            [
                MemoryNode::with_children("a", [leaf("a1"), leaf("a2")]),
                MemoryNode::with_children("b", [MemoryNode::with_children("b1", [leaf("b11")])]),
            ],
        );
        let (mut tree, _) = build(root);
        tree.expand(tree.root(), true).unwrap();
        assert_eq!(tree.len(), 7);
        assert!(
            tree.visible_nodes()
                .all(|id| tree.state(id).unwrap().is_expanded())
        );
    }

    #[test]
    fn remembered_expansion_survives_a_full_rebuild() {
        let a = MemoryNode::with_children("a", [leaf("a1")]);
        let root = MemoryNode::with_children("root", [a.clone(), leaf("b")]);
        let (mut tree, _) = build(root.clone());
        tree.expand(tree.root(), false).unwrap();
        let a_id = tree.children_of(tree.root())[0];
        tree.expand(a_id, false).unwrap();
        assert_eq!(root.remembered_expansion(), Some(true));
        assert_eq!(a.remembered_expansion(), Some(true));

        let (rebuilt, _) = build(root);
        assert_eq!(rebuilt.len(), 4);
        let a_again = rebuilt.children_of(rebuilt.root())[0];
        assert_eq!(rebuilt.state(a_again), Some(NodeState::Expanded));
    }

    #[test]
    fn collapse_records_expansion_only_on_the_collapsed_node() {
        let a = MemoryNode::with_children("a", [leaf("a1")]);
        let root = MemoryNode::with_children("root", [a.clone()]);
        let (mut tree, _) = build(root.clone());
        tree.expand(tree.root(), true).unwrap();
        tree.collapse(tree.root(), false).unwrap();
        assert_eq!(root.remembered_expansion(), Some(false));
        assert_eq!(a.remembered_expansion(), Some(true));

        // Re-expanding brings back the remembered inner expansion.
        tree.expand(tree.root(), false).unwrap();
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn collapse_keeping_self_retains_representation() {
        let root = MemoryNode::with_children("root", [leaf("a"), leaf("b")]);
        let (mut tree, container) = build(root);
        let r = tree.root();
        tree.expand(r, false).unwrap();
        tree.invalidate(r).unwrap();
        let children = tree.children_of(r).to_vec();
        let links: Vec<_> = children
            .iter()
            .map(|&c| tree.connector(c, ConnectorRole::ParentLink).unwrap())
            .collect();
        let stem = tree.connector(r, ConnectorRole::ChildStem).unwrap();

        tree.collapse(r, false).unwrap();
        tree.invalidate(r).unwrap();
        let element = tree.representation(r).unwrap();
        assert!(tree.surface().is_attached(element, container));
        assert!(tree.connector(r, ConnectorRole::ChildStem).is_none());
        assert!(tree.connector(r, ConnectorRole::ChildSpan).is_none());
        assert!(tree.surface().get(stem).is_none());
        assert!(links.iter().all(|&l| tree.surface().get(l).is_none()));
        assert_eq!(tree.state(r), Some(NodeState::Collapsed));
        assert_eq!(tree.surface().attached_count(container), 1);
    }

    #[test]
    fn collapse_removing_self_redraws_with_new_representation() {
        let root = MemoryNode::with_children("root", [leaf("a")]);
        let (mut tree, container) = build(root);
        let r = tree.root();
        let old = tree.representation(r).unwrap();
        tree.collapse(r, true).unwrap();
        assert!(tree.representation(r).is_none());
        assert!(tree.surface().get(old).is_none());

        tree.invalidate(r).unwrap();
        let new = tree.representation(r).unwrap();
        assert_ne!(new, old);
        assert!(tree.surface().is_attached(new, container));
    }

    #[test]
    fn stale_ids_are_rejected() {
        let root = MemoryNode::with_children("root", [leaf("a")]);
        let (mut tree, _) = build(root);
        let r = tree.root();
        tree.expand(r, false).unwrap();
        let child = tree.children_of(r)[0];
        tree.collapse(r, false).unwrap();
        assert_eq!(tree.expand(child, false), Err(TreeError::StaleNode(child)));
        assert_eq!(tree.collapse(child, false), Err(TreeError::StaleNode(child)));
        assert_eq!(tree.invalidate(child), Err(TreeError::StaleNode(child)));
        assert_eq!(tree.state(child), None);
        assert!(tree.children_of(child).is_empty());

        // The freed slot is reused under a new generation.
        tree.expand(r, false).unwrap();
        let again = tree.children_of(r)[0];
        assert_eq!(again.idx(), child.idx());
        assert_ne!(again, child);
        assert!(!tree.is_alive(child));
    }

    #[test]
    fn invalidate_anywhere_redraws_once_at_root() {
        let root = MemoryNode::with_children(
            "root",
            [MemoryNode::with_children("a", [MemoryNode::with_children("a1", [leaf("a11")])])],
        );
        let (mut tree, _) = build(root);
        assert_eq!(tree.redraw_epoch(), 1);
        tree.expand(tree.root(), true).unwrap();
        let deepest = tree.visible_nodes().last().unwrap();
        assert_eq!(tree.backing(deepest).unwrap().label(), "a11");

        tree.invalidate(deepest).unwrap();
        assert_eq!(tree.redraw_epoch(), 2);
        tree.invalidate(deepest).unwrap();
        assert_eq!(tree.redraw_epoch(), 3);
        // Every ancestor was drawn by that pass.
        let mut current = Some(deepest);
        while let Some(id) = current {
            assert!(tree.placement(id).is_some());
            current = tree.parent_of(id);
        }
    }

    #[test]
    fn rebuild_observes_new_backing_children() {
        let root = MemoryNode::with_children("root", [leaf("a")]);
        let (mut tree, _) = build(root.clone());
        let r = tree.root();
        tree.expand(r, false).unwrap();
        let b = MemoryNode::with_children("b", [leaf("b1")]);
        b.remember_expansion(true);
        root.push_child(b);
        assert_eq!(tree.children_of(r).len(), 1);

        tree.rebuild(r).unwrap();
        assert_eq!(root.child_queries(), 2);
        assert_eq!(tree.children_of(r).len(), 2);
        assert_eq!(tree.state(r), Some(NodeState::Expanded));
        let element = tree.representation(r).unwrap();
        assert_eq!(tree.surface().child_count(element), Some(2));

        // The new child comes back open because its backing node remembers it.
        let b_id = tree.children_of(r)[1];
        assert_eq!(tree.state(b_id), Some(NodeState::Expanded));
        assert_eq!(tree.children_of(b_id).len(), 1);
        assert_eq!(tree.len(), 4);
        assert!(tree.placement(tree.children_of(b_id)[0]).is_some());
    }

    #[test]
    fn deep_chains_are_handled_without_recursion() {
        const DEPTH: usize = 100_000;
        let root = MemoryNode::new(0_usize);
        let mut tail = root.clone();
        for depth in 1..DEPTH {
            let next = MemoryNode::new(depth);
            tail.push_child(next.clone());
            tail = next;
        }
        let mut scene = Scene::new();
        let container = scene.create_container();
        let mut tree = LazyTree::build(scene, container, root.clone(), TreeConfig::default());
        let r = tree.root();

        tree.expand(r, true).unwrap();
        assert_eq!(tree.len(), DEPTH);
        tree.invalidate(r).unwrap();
        assert_eq!(tree.required_width(r), Some(120.0));
        // A representation per node, plus stem and span per parent and a link per child.
        assert_eq!(
            tree.surface().attached_count(container),
            DEPTH + 3 * (DEPTH - 1)
        );

        tree.collapse(r, false).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.surface().live_count(), 1);

        // Every inner node still remembers being open, so one expand restores the chain.
        tree.expand(r, false).unwrap();
        assert_eq!(tree.len(), DEPTH);
        tree.invalidate(r).unwrap();
        let (_, origin) = tree.placement(tail_id(&tree)).unwrap();
        assert_eq!(origin.y, (DEPTH - 1) as f64 * TreeConfig::default().row_advance());
    }

    fn tail_id(tree: &LazyTree<MemoryNode<usize>, Scene<usize>>) -> NodeId {
        let mut current = tree.root();
        while let Some(&child) = tree.children_of(current).first() {
            current = child;
        }
        current
    }

    #[test]
    fn rebuild_turns_a_leaf_into_a_collapsed_node() {
        let root = leaf("root");
        let (mut tree, _) = build(root.clone());
        let r = tree.root();
        assert_eq!(tree.state(r), Some(NodeState::Leaf));
        root.push_child(leaf("late"));
        tree.rebuild(r).unwrap();
        assert_eq!(tree.state(r), Some(NodeState::Collapsed));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn visible_nodes_is_preorder() {
        let root = MemoryNode::with_children(
            "root",
            [
                MemoryNode::with_children("a", [leaf("a1"), leaf("a2")]),
                leaf("b"),
            ],
        );
        let (mut tree, _) = build(root);
        tree.expand(tree.root(), true).unwrap();
        let labels: Vec<&str> = tree
            .visible_nodes()
            .map(|id| tree.backing(id).unwrap().label())
            .collect();
        assert_eq!(labels, vec!["root", "a", "a1", "a2", "b"]);
    }

    #[test]
    fn connectors_are_keyed_by_role() {
        let mut connectors = Connectors::new();
        let mut created = 0;
        let stem = connectors.get_or_insert_with(ConnectorRole::ChildStem, || {
            created += 1;
            7_u32
        });
        let again = connectors.get_or_insert_with(ConnectorRole::ChildStem, || {
            created += 1;
            8_u32
        });
        assert_eq!((stem, again, created), (7, 7, 1));
        assert_eq!(connectors.get(ConnectorRole::ChildSpan), None);
        assert_eq!(connectors.take(ConnectorRole::ChildStem), Some(7));
        assert_eq!(connectors.get(ConnectorRole::ChildStem), None);
    }
}
