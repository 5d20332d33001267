// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The capability a node source must provide.

use alloc::vec::Vec;

/// An external node the tree visualizes without owning.
///
/// Backing nodes are cheap handles (typically `Rc`s or ids into a store), so the
/// tree clones them freely into snapshots. The tree never mutates a backing
/// node except through [`BackingNode::remember_expansion`].
pub trait BackingNode: Clone {
    /// Content handed to the render surface when a representation is created.
    type Content;

    /// Children of this node.
    ///
    /// Called exactly once per visual node construction (and once per explicit
    /// rebuild). The result is snapshotted; later changes are not observed.
    fn children(&self) -> Vec<Self>;

    /// Produce the visible content for this node.
    ///
    /// Called when the node first gets a representation and on every refresh.
    fn create_representation(&self) -> Self::Content;

    /// Expansion state remembered from an earlier visualization pass, if any.
    fn remembered_expansion(&self) -> Option<bool> {
        None
    }

    /// Record the expansion state so a later rebuild can restore it.
    ///
    /// The slot is written through a shared reference; implementations use a
    /// `Cell` or similar single-threaded interior mutability.
    fn remember_expansion(&self, _expanded: bool) {}
}
