// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Positioning of representations and connectors on the render surface.
//!
//! A node's representation sits at its origin, `min_node_width` wide and
//! `node_height` tall. Children are laid out left to right one row below,
//! each offset by the widths of its preceding siblings plus `margin_x`.
//! Connectors are zero-thickness rects: a stem down from the node's center,
//! a span across the children's centers, and a link up from each child.

use alloc::vec;
use alloc::vec::Vec;
use kurbo::{Point, Rect};
use tracing::trace;

use crate::backing::BackingNode;
use crate::error::TreeError;
use crate::surface::Surface;
use crate::tree::LazyTree;
use crate::types::{ConnectorRole, NodeId, StateClass};

impl<B, S> LazyTree<B, S>
where
    B: BackingNode,
    S: Surface<Content = B::Content>,
{
    /// Draw the subtree rooted at `id` into `container` with its top-left at `origin`.
    ///
    /// Elements that are already attached to `container` are only restyled, so
    /// drawing an unchanged node twice does not duplicate anything. The
    /// container and origin are remembered for [`LazyTree::redraw`].
    pub fn draw(
        &mut self,
        id: NodeId,
        container: S::Container,
        origin: Point,
    ) -> Result<(), TreeError> {
        if !self.is_alive(id) {
            return Err(TreeError::StaleNode(id));
        }
        self.draw_node(id, container, origin);
        Ok(())
    }

    /// Replay the last [`draw`](Self::draw) of `id` with the same container and origin.
    ///
    /// [`LazyTree::invalidate`] calls this on the root once per invalidation.
    pub fn redraw(&mut self, id: NodeId) -> Result<(), TreeError> {
        if !self.is_alive(id) {
            return Err(TreeError::StaleNode(id));
        }
        self.redraw_from(id)
    }

    pub(crate) fn redraw_from(&mut self, id: NodeId) -> Result<(), TreeError> {
        let (container, origin) = self.node(id).placement.ok_or(TreeError::NotDrawn(id))?;
        self.redraw_epoch += 1;
        trace!(?id, epoch = self.redraw_epoch, "redraw");
        self.draw_node(id, container, origin);
        Ok(())
    }

    pub(crate) fn draw_node(&mut self, id: NodeId, container: S::Container, origin: Point) {
        let config = self.config;
        let mut stack = vec![(id, origin)];
        while let Some((current, origin)) = stack.pop() {
            let total_width = self.measure(current);
            let state = self.node(current).state();
            let element = self.ensure_representation(current);
            self.node_mut(current).placement = Some((container, origin));

            let bounds =
                Rect::from_origin_size(origin, (config.min_node_width, config.node_height));
            self.place(element, bounds, container);
            self.surface.set_class(element, StateClass::from(state));

            let children = self.node(current).children.clone();
            let Some(&last) = children.last() else {
                continue;
            };
            let center_x = origin.x + config.min_node_width / 2.0;
            let stem_top = origin.y + config.node_height;
            let span_y = stem_top + config.margin_y / 2.0;
            let span_width = total_width - self.measure(last);

            let stem = self.ensure_connector(current, ConnectorRole::ChildStem);
            self.place(
                stem,
                Rect::new(center_x, stem_top, center_x, span_y),
                container,
            );
            let span = self.ensure_connector(current, ConnectorRole::ChildSpan);
            self.place(
                span,
                Rect::new(center_x, span_y, center_x + span_width, span_y),
                container,
            );

            let child_y = origin.y + config.row_advance();
            let mut x = origin.x;
            let mut placed = Vec::with_capacity(children.len());
            for child in children {
                let link_x = x + config.min_node_width / 2.0;
                let link = self.ensure_connector(child, ConnectorRole::ParentLink);
                self.place(link, Rect::new(link_x, span_y, link_x, child_y), container);
                placed.push((child, Point::new(x, child_y)));
                x += self.measure(child) + config.margin_x;
            }
            // Reversed so siblings are drawn left to right.
            stack.extend(placed.into_iter().rev());
        }
    }

    /// Position `element` and attach it to `container` unless it already is.
    fn place(&mut self, element: S::Element, bounds: Rect, container: S::Container) {
        self.surface.set_bounds(element, bounds);
        if !self.surface.is_attached(element, container) {
            self.surface.attach(element, container);
        }
    }

    pub(crate) fn ensure_representation(&mut self, id: NodeId) -> S::Element {
        if let Some(element) = self.node(id).representation {
            return element;
        }
        let node = self.node(id);
        let content = node.backing.create_representation();
        let child_count = node.snapshot.len();
        let element = self.surface.create_representation(content, child_count);
        self.surface.listen(element, id);
        self.node_mut(id).representation = Some(element);
        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use crate::memory::MemoryNode;
    use crate::scene::{ContainerId, Scene};

    const MIN: f64 = 120.0;
    const HEIGHT: f64 = 40.0;
    const MARGIN_X: f64 = 20.0;
    const MARGIN_Y: f64 = 40.0;

    type TestTree = LazyTree<MemoryNode<&'static str>, Scene<&'static str>>;

    fn build(root: MemoryNode<&'static str>) -> (TestTree, ContainerId) {
        let mut scene = Scene::new();
        let container = scene.create_container();
        let tree = LazyTree::build(scene, container, root, TreeConfig::default());
        (tree, container)
    }

    fn bounds(tree: &TestTree, element: <Scene<&'static str> as Surface>::Element) -> Rect {
        tree.surface().bounds(element).unwrap()
    }

    #[test]
    fn initial_build_draws_root_at_origin() {
        let (tree, container) = build(MemoryNode::with_children("root", [MemoryNode::new("a")]));
        let r = tree.root();
        let element = tree.representation(r).unwrap();
        assert!(tree.surface().is_attached(element, container));
        assert_eq!(bounds(&tree, element), Rect::new(0.0, 0.0, MIN, HEIGHT));
        assert_eq!(tree.surface().class(element), Some(StateClass::Collapsed));
        assert_eq!(tree.placement(r), Some((container, Point::ORIGIN)));
        assert_eq!(tree.surface().child_count(element), Some(1));
        assert!(tree.connector(r, ConnectorRole::ChildStem).is_none());
    }

    #[test]
    fn children_are_offset_by_preceding_widths() {
        let root = MemoryNode::with_children(
            "root",
            [
                MemoryNode::with_children("a", [MemoryNode::new("a1"), MemoryNode::new("a2")]),
                MemoryNode::new("b"),
                MemoryNode::new("c"),
            ],
        );
        let (mut tree, _) = build(root);
        let r = tree.root();
        tree.expand(r, true).unwrap();
        tree.invalidate(r).unwrap();

        let children = tree.children_of(r).to_vec();
        let a_width = 2.0 * MIN + MARGIN_X;
        let expected_x = [0.0, a_width + MARGIN_X, a_width + MARGIN_X + MIN + MARGIN_X];
        let row = HEIGHT + MARGIN_Y;
        for (&child, x) in children.iter().zip(expected_x) {
            let (_, origin) = tree.placement(child).unwrap();
            assert_eq!(origin, Point::new(x, row));
            let link = tree.connector(child, ConnectorRole::ParentLink).unwrap();
            let center = x + MIN / 2.0;
            assert_eq!(
                bounds(&tree, link),
                Rect::new(center, row - MARGIN_Y / 2.0, center, row)
            );
        }

        // Grandchildren start one row further down, under their own parent.
        let a1 = tree.children_of(children[0])[0];
        let a2 = tree.children_of(children[0])[1];
        assert_eq!(tree.placement(a1).unwrap().1, Point::new(0.0, 2.0 * row));
        assert_eq!(
            tree.placement(a2).unwrap().1,
            Point::new(MIN + MARGIN_X, 2.0 * row)
        );
        let element = tree.representation(r).unwrap();
        assert_eq!(tree.surface().class(element), Some(StateClass::Expanded));
    }

    #[test]
    fn span_covers_first_to_last_child_center() {
        let root = MemoryNode::with_children(
            "root",
            [
                MemoryNode::with_children("a", [MemoryNode::new("a1")]),
                MemoryNode::new("b"),
            ],
        );
        let (mut tree, _) = build(root);
        let r = tree.root();
        tree.expand(r, false).unwrap();
        let a = tree.children_of(r)[0];
        let b = tree.children_of(r)[1];
        tree.expand(a, false).unwrap();
        tree.invalidate(a).unwrap();

        let total = tree.required_width(r).unwrap();
        let last = tree.required_width(b).unwrap();
        assert_eq!(total, 2.0 * MIN + MARGIN_X);
        let span = bounds(&tree, tree.connector(r, ConnectorRole::ChildSpan).unwrap());
        assert_eq!(span.width(), total - last);
        assert_eq!(span.x0, MIN / 2.0);
        assert_eq!(span.y0, HEIGHT + MARGIN_Y / 2.0);
        let stem = bounds(&tree, tree.connector(r, ConnectorRole::ChildStem).unwrap());
        assert_eq!(stem, Rect::new(MIN / 2.0, HEIGHT, MIN / 2.0, HEIGHT + MARGIN_Y / 2.0));

        // The single grandchild has a zero-length span under `a`.
        let a_span = bounds(&tree, tree.connector(a, ConnectorRole::ChildSpan).unwrap());
        assert_eq!(a_span.width(), 0.0);
    }

    #[test]
    fn drawing_twice_does_not_duplicate_elements() {
        let root = MemoryNode::with_children("root", [MemoryNode::new("a"), MemoryNode::new("b")]);
        let (mut tree, container) = build(root);
        let r = tree.root();
        tree.expand(r, false).unwrap();
        tree.draw(r, container, Point::new(10.0, 10.0)).unwrap();
        let attached = tree.surface().attached_count(container);
        let live = tree.surface().live_count();
        let elements: Vec<_> = tree.surface().attached(container).map(|(e, _)| e).collect();

        tree.draw(r, container, Point::new(10.0, 10.0)).unwrap();
        assert_eq!(tree.surface().attached_count(container), attached);
        assert_eq!(tree.surface().live_count(), live);
        let again: Vec<_> = tree.surface().attached(container).map(|(e, _)| e).collect();
        assert_eq!(elements, again);
        // root + 2 children + stem + span + 2 links
        assert_eq!(attached, 7);
    }

    #[test]
    fn redraw_replays_the_last_draw() {
        let root = MemoryNode::with_children("root", [MemoryNode::new("a")]);
        let (mut tree, _) = build(root);
        let other = tree.surface_mut().create_container();
        let r = tree.root();
        tree.draw(r, other, Point::new(5.0, 7.0)).unwrap();
        let epoch = tree.redraw_epoch();
        tree.redraw(r).unwrap();
        assert_eq!(tree.redraw_epoch(), epoch + 1);
        assert_eq!(tree.placement(r), Some((other, Point::new(5.0, 7.0))));
        let element = tree.representation(r).unwrap();
        assert!(tree.surface().is_attached(element, other));
        assert_eq!(bounds(&tree, element).origin(), Point::new(5.0, 7.0));
    }

    #[test]
    fn redraw_requires_a_previous_draw() {
        let root = MemoryNode::with_children("root", [MemoryNode::new("a")]);
        let (mut tree, _) = build(root);
        let r = tree.root();
        tree.expand(r, false).unwrap();
        let child = tree.children_of(r)[0];
        assert_eq!(tree.redraw(child), Err(TreeError::NotDrawn(child)));
        tree.invalidate(child).unwrap();
        assert_eq!(tree.redraw(child), Ok(()));
    }
}
