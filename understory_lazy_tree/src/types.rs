// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the lazy tree: node identifiers, expansion states, and connector roles.

/// Identifier for a materialized visual node (generational).
///
/// A `NodeId` goes stale as soon as the node is destroyed, which happens when
/// its parent collapses or its subtree is rebuilt. Reused slots get a new
/// generation, so a stale id never aliases a newer node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

/// Expansion state of a visual node.
///
/// `Leaf` nodes have no children in their snapshot and are permanently
/// considered expanded. The other two states alternate through
/// [`LazyTree::expand`](crate::LazyTree::expand) and
/// [`LazyTree::collapse`](crate::LazyTree::collapse).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum NodeState {
    /// Snapshot is empty; nothing to expand.
    Leaf,
    /// Snapshot is non-empty and no children are materialized.
    Collapsed,
    /// Snapshot is non-empty and one visual child exists per snapshot entry.
    Expanded,
}

impl NodeState {
    /// Returns `true` for states that count as expanded (`Leaf` and `Expanded`).
    #[must_use]
    pub const fn is_expanded(self) -> bool {
        matches!(self, Self::Leaf | Self::Expanded)
    }
}

/// Role of a connector segment owned by a node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ConnectorRole {
    /// Vertical segment from the node up to its parent's horizontal span.
    ParentLink,
    /// Vertical segment from the node down to the horizontal span over its children.
    ChildStem,
    /// Horizontal segment from the center of the first child to the center of the last.
    ChildSpan,
}

impl ConnectorRole {
    /// Roles that only exist while the node has materialized children.
    pub const CHILD_ROLES: [Self; 2] = [Self::ChildStem, Self::ChildSpan];
}

/// Visual state class applied to a node's representation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StateClass {
    /// The node is a leaf or shows its children.
    Expanded,
    /// The node hides its children.
    Collapsed,
}

impl StateClass {
    /// Class name as a render surface would spell it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expanded => "expanded",
            Self::Collapsed => "collapsed",
        }
    }
}

impl From<NodeState> for StateClass {
    fn from(state: NodeState) -> Self {
        if state.is_expanded() {
            Self::Expanded
        } else {
            Self::Collapsed
        }
    }
}
