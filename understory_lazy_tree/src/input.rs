// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer interaction: click to expand, modified click to collapse.

use tracing::debug;

use crate::backing::BackingNode;
use crate::error::TreeError;
use crate::surface::{PointerButton, PointerEvent, PointerKind, PointerResponse, Surface};
use crate::tree::LazyTree;
use crate::types::{NodeId, NodeState};

impl<B, S> LazyTree<B, S>
where
    B: BackingNode,
    S: Surface<Content = B::Content>,
{
    /// Apply a pointer event routed to `id`.
    ///
    /// - A primary click on a collapsed node expands it, recursively if the
    ///   action modifier is held, and invalidates the tree.
    /// - A primary click with the action modifier on an expanded (non-leaf) node
    ///   collapses its children, keeping the node itself, and invalidates.
    /// - A press with the action modifier asks the host to suppress its
    ///   default behavior, so modified clicks do not select text.
    ///
    /// The action modifier is [`TreeConfig::action_modifiers`](crate::TreeConfig::action_modifiers).
    pub fn handle_pointer(
        &mut self,
        id: NodeId,
        event: PointerEvent,
    ) -> Result<PointerResponse, TreeError> {
        let state = self.state(id).ok_or(TreeError::StaleNode(id))?;
        let modified = event.modifiers.intersects(self.config.action_modifiers);
        let primary = event.button == PointerButton::Primary;
        match (event.kind, state) {
            (PointerKind::Press, _) if modified => Ok(PointerResponse::PreventDefault),
            (PointerKind::Click, NodeState::Collapsed) if primary => {
                debug!(?id, recursive = modified, "click expands");
                self.expand(id, modified)?;
                self.invalidate(id)?;
                Ok(PointerResponse::Handled)
            }
            (PointerKind::Click, NodeState::Expanded) if primary && modified => {
                debug!(?id, "modified click collapses");
                self.collapse(id, false)?;
                self.invalidate(id)?;
                Ok(PointerResponse::Handled)
            }
            _ => Ok(PointerResponse::Ignored),
        }
    }
}
