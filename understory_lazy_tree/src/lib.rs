// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_lazy_tree --heading-base-level=0

//! Understory Lazy Tree: an incrementally laid out, lazily expanded tree visualization.
//!
//! Understory Lazy Tree draws a hierarchy supplied by an external node source as boxes joined by
//! connector lines, and only ever materializes what the user has opened.
//!
//! - Children of a node are queried once, when the node is constructed, and kept as a snapshot.
//! - Expanding a node turns that snapshot into child nodes; collapsing destroys them.
//! - Subtree widths are folded bottom-up and memoized, and invalidated along the path to the root.
//! - Representations can be refreshed incrementally, one queued node per turn of the host's loop.
//!
//! ## Where this fits
//!
//! The crate sits between a data model and a retained render surface. It does not own either:
//! - The data model implements [`BackingNode`]: children, content, and an optional place to
//!   remember whether the node was expanded.
//! - The render surface implements [`Surface`]: create, attach, style, position, and destroy
//!   elements, and route pointer events to the node that owns an element.
//!
//! [`MemoryNode`] and [`Scene`] are in-memory implementations of both, usable for tests,
//! headless tooling, and as templates for real bindings.
//!
//! ## Layout
//!
//! Every node is `min_node_width` wide and `node_height` tall. A node's required width is the
//! larger of `min_node_width` and the sum of its children's required widths plus `margin_x`
//! between each pair. Children are placed left to right one row (`node_height + margin_y`) below
//! their parent, each offset by the required widths of the siblings before it.
//! See [`fold_required_width`] and [`TreeConfig`].
//!
//! ## API overview
//!
//! - [`LazyTree`]: owns the visual nodes and the surface.
//! - [`NodeId`]: generational handle of a visual node; stale after its node is destroyed.
//! - [`NodeState`] / [`StateClass`]: leaf, collapsed, or expanded, and the class applied to match.
//! - [`ConnectorRole`]: parent link, child stem, or child span.
//! - [`TreeError`]: returned by mutations given a stale or undrawn node.
//!
//! Key operations:
//! - [`LazyTree::build`] constructs the root and draws it at the origin.
//! - [`LazyTree::expand`] / [`LazyTree::collapse`] change structure;
//!   [`LazyTree::invalidate`] re-lays out and redraws from the root.
//! - [`LazyTree::rebuild`] re-queries a node's children from its backing node.
//! - [`LazyTree::handle_pointer`] applies click-to-expand and modified-click-to-collapse.
//! - [`LazyTree::refresh_representation`] with [`LazyTree::poll_refresh`] /
//!   [`LazyTree::run_refreshes`] recreates content without a layout pass.
//! - [`LazyTree::visible_nodes`] walks the materialized nodes in pre-order.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::Point;
//! use understory_lazy_tree::{
//!     LazyTree, MemoryNode, Modifiers, PointerButton, PointerResponse, Scene, TreeConfig,
//! };
//!
//! let root = MemoryNode::with_children(
//!     "root",
//!     [MemoryNode::with_children("a", [MemoryNode::new("a1")]), MemoryNode::new("b")],
//! );
//! let mut scene = Scene::new();
//! let container = scene.create_container();
//! let mut tree = LazyTree::build(scene, container, root, TreeConfig::default());
//!
//! // Press and release on the root: the scene recognizes a click on its element.
//! let at = Point::new(10.0, 10.0);
//! let _ = tree.surface_mut().pointer_down(at, PointerButton::Primary, Modifiers::empty());
//! let click = tree
//!     .surface_mut()
//!     .pointer_up(at, PointerButton::Primary, Modifiers::CONTROL)
//!     .unwrap();
//! assert_eq!(tree.handle_pointer(click.target, click.event), Ok(PointerResponse::Handled));
//!
//! // The modified click expanded everything below the root.
//! let labels: Vec<_> = tree
//!     .visible_nodes()
//!     .map(|id| tree.backing(id).unwrap().label())
//!     .collect();
//! assert_eq!(labels, ["root", "a", "a1", "b"]);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod backing;
mod config;
mod error;
mod input;
mod layout;
mod memory;
mod refresh;
mod render;
mod scene;
mod surface;
mod tree;
mod types;

pub use backing::BackingNode;
pub use config::TreeConfig;
pub use error::TreeError;
pub use layout::fold_required_width;
pub use memory::MemoryNode;
pub use scene::{ContainerId, ElementId, ElementKind, ElementRecord, RoutedEvent, Scene};
pub use surface::{
    Modifiers, PointerButton, PointerEvent, PointerKind, PointerResponse, Surface,
};
pub use tree::LazyTree;
pub use types::{ConnectorRole, NodeId, NodeState, StateClass};
