// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layout constants and interaction settings injected at build time.

use crate::surface::Modifiers;

/// Configuration for a [`LazyTree`](crate::LazyTree).
///
/// Every tree carries its own copy, so independently scaled trees can share
/// a render surface. All lengths are in surface units (typically logical pixels).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TreeConfig {
    /// Minimum width of any subtree; also the width of a node representation.
    pub min_node_width: f64,
    /// Height of a node representation.
    pub node_height: f64,
    /// Horizontal gap between adjacent sibling subtrees.
    pub margin_x: f64,
    /// Vertical gap between a node row and its children row.
    pub margin_y: f64,
    /// Keys that turn a click into a recursive expand or a collapse.
    pub action_modifiers: Modifiers,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            min_node_width: 120.0,
            node_height: 40.0,
            margin_x: 20.0,
            margin_y: 40.0,
            action_modifiers: Modifiers::CONTROL | Modifiers::META,
        }
    }
}

impl TreeConfig {
    /// Set the minimum node width.
    #[must_use]
    pub fn with_min_node_width(mut self, width: f64) -> Self {
        self.min_node_width = width;
        self
    }

    /// Set the node height.
    #[must_use]
    pub fn with_node_height(mut self, height: f64) -> Self {
        self.node_height = height;
        self
    }

    /// Set horizontal and vertical margins.
    #[must_use]
    pub fn with_margins(mut self, margin_x: f64, margin_y: f64) -> Self {
        self.margin_x = margin_x;
        self.margin_y = margin_y;
        self
    }

    /// Set the modifier keys that count as the action modifier.
    #[must_use]
    pub fn with_action_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.action_modifiers = modifiers;
        self
    }

    /// Vertical distance from a node's origin to its children's origins.
    #[must_use]
    pub fn row_advance(&self) -> f64 {
        self.node_height + self.margin_y
    }
}
