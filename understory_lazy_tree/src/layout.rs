// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bottom-up required width computation, memoized per node.

use alloc::vec;

use crate::backing::BackingNode;
use crate::config::TreeConfig;
use crate::surface::Surface;
use crate::tree::LazyTree;
use crate::types::NodeId;

/// Fold child widths into the width their parent needs.
///
/// The children sit side by side with `margin_x` between neighbors, and no
/// subtree is ever narrower than `min_node_width`.
///
/// ```rust
/// use understory_lazy_tree::{TreeConfig, fold_required_width};
///
/// let config = TreeConfig::default();
/// assert_eq!(fold_required_width([], &config), 120.0);
/// assert_eq!(fold_required_width([120.0, 120.0], &config), 260.0);
/// ```
pub fn fold_required_width(
    child_widths: impl IntoIterator<Item = f64>,
    config: &TreeConfig,
) -> f64 {
    let (count, sum) = child_widths
        .into_iter()
        .fold((0_u32, 0.0), |(count, sum), w| (count + 1, sum + w));
    let margins = if count > 0 {
        config.margin_x * f64::from(count - 1)
    } else {
        0.0
    };
    (sum + margins).max(config.min_node_width)
}

impl<B, S> LazyTree<B, S>
where
    B: BackingNode,
    S: Surface<Content = B::Content>,
{
    /// Width the subtree rooted at `id` needs to render without overlap.
    ///
    /// The value is cached and stays valid until the node or one of its
    /// descendants is invalidated. Returns `None` for stale ids.
    pub fn required_width(&mut self, id: NodeId) -> Option<f64> {
        if !self.is_alive(id) {
            return None;
        }
        Some(self.measure(id))
    }

    /// Cached width of a node without recomputing; `None` if dirty or stale.
    pub fn cached_width(&self, id: NodeId) -> Option<f64> {
        self.node_opt(id).and_then(|n| n.required_width)
    }

    /// Fill in the cached width of `id` and every dirty node below it.
    pub(crate) fn measure(&mut self, id: NodeId) -> f64 {
        // Post-order: a node is folded once all of its children carry a width.
        let mut stack = vec![(id, false)];
        while let Some((current, children_done)) = stack.pop() {
            let node = self.node(current);
            if node.required_width.is_some() {
                continue;
            }
            if children_done {
                let widths = node
                    .children
                    .iter()
                    .map(|&child| self.node(child).required_width.unwrap_or_default());
                let width = fold_required_width(widths, &self.config);
                self.node_mut(current).required_width = Some(width);
            } else {
                stack.push((current, true));
                stack.extend(node.children.iter().map(|&child| (child, false)));
            }
        }
        self.node(id).required_width.unwrap_or_default()
    }
}
