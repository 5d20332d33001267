// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred representation refresh.
//!
//! Refreshing a node recreates its representation right away and queues one
//! task per child. The host drains the queue a task at a time from its event
//! loop with [`LazyTree::poll_refresh`] (or in bounded batches with
//! [`LazyTree::run_refreshes`]), so a wide or deep tree never blocks a turn.
//!
//! Queued tasks cannot be withdrawn. A task whose node was destroyed in the
//! meantime is dropped when it comes up; a live node is refreshed against
//! whatever children it has at that point.

use alloc::collections::VecDeque;
use tracing::{debug, trace};

use crate::backing::BackingNode;
use crate::error::TreeError;
use crate::surface::Surface;
use crate::tree::LazyTree;
use crate::types::NodeId;

/// FIFO of nodes waiting for their representation to be recreated.
#[derive(Clone, Debug, Default)]
pub(crate) struct RefreshQueue {
    tasks: VecDeque<NodeId>,
}

impl RefreshQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    fn extend(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.tasks.extend(ids);
    }

    fn pop(&mut self) -> Option<NodeId> {
        self.tasks.pop_front()
    }
}

impl<B, S> LazyTree<B, S>
where
    B: BackingNode,
    S: Surface<Content = B::Content>,
{
    /// Recreate every representation from the backing nodes' current content.
    ///
    /// Use this when content changed but structure did not. The root is
    /// swapped immediately; descendants follow as queued tasks.
    pub fn refresh_representation(&mut self) {
        let root = self.root();
        debug!(?root, "refreshing representations");
        self.refresh_one(root);
    }

    /// Recreate the representation of `id` now and queue its children.
    pub fn refresh_node(&mut self, id: NodeId) -> Result<(), TreeError> {
        if !self.is_alive(id) {
            return Err(TreeError::StaleNode(id));
        }
        self.refresh_one(id);
        Ok(())
    }

    /// Number of queued refresh tasks, including ones that will turn out stale.
    pub fn pending_refreshes(&self) -> usize {
        self.refresh.len()
    }

    /// Run the next queued refresh task.
    ///
    /// Returns the refreshed node, or `None` once the queue holds no live nodes.
    pub fn poll_refresh(&mut self) -> Option<NodeId> {
        while let Some(id) = self.refresh.pop() {
            if self.is_alive(id) {
                trace!(?id, pending = self.refresh.len(), "refresh task");
                self.refresh_one(id);
                return Some(id);
            }
            trace!(?id, "dropping refresh task for destroyed node");
        }
        None
    }

    /// Run up to `budget` refresh tasks and return how many ran.
    pub fn run_refreshes(&mut self, budget: usize) -> usize {
        let mut ran = 0;
        while ran < budget && self.poll_refresh().is_some() {
            ran += 1;
        }
        ran
    }

    fn refresh_one(&mut self, id: NodeId) {
        self.swap_representation(id);
        let children = self.node(id).children.clone();
        self.refresh.extend(children);
    }

    /// Replace the representation of `id` with a freshly created one that
    /// keeps the old bounds, class, and attachment.
    ///
    /// Nodes without a representation are left alone; the next draw creates one.
    pub(crate) fn swap_representation(&mut self, id: NodeId) {
        let node = self.node(id);
        let Some(old) = node.representation else {
            return;
        };
        let container = node
            .placement
            .map(|(container, _)| container)
            .filter(|&container| self.surface.is_attached(old, container));
        let bounds = self.surface.bounds(old);
        let class = self.surface.class(old);
        self.surface.destroy(old);
        self.node_mut(id).representation = None;

        let new = self.ensure_representation(id);
        if let Some(bounds) = bounds {
            self.surface.set_bounds(new, bounds);
        }
        if let Some(class) = class {
            self.surface.set_class(new, class);
        }
        if let Some(container) = container {
            self.surface.attach(new, container);
        }
    }
}
