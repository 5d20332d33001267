// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors returned by mutating tree operations.

use crate::types::NodeId;

/// Errors from [`LazyTree`](crate::LazyTree) operations.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TreeError {
    /// The id does not name a materialized node of this tree.
    #[error("node {0:?} is not materialized in this tree")]
    StaleNode(NodeId),
    /// A redraw was requested before the node was ever drawn.
    #[error("node {0:?} has not been drawn yet")]
    NotDrawn(NodeId),
}
