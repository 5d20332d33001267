// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An in-memory backing node.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::mem;

use crate::backing::BackingNode;

/// Shared, mutable in-memory node usable as a [`BackingNode`].
///
/// Clones share the same node, so a test or host can keep a handle, mutate
/// labels or children, and observe what the tree queried.
pub struct MemoryNode<T> {
    inner: Rc<Inner<T>>,
}

struct Inner<T> {
    label: RefCell<T>,
    children: RefCell<Vec<MemoryNode<T>>>,
    expansion: Cell<Option<bool>>,
    child_queries: Cell<usize>,
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        // Unlink uniquely owned descendants one at a time so a deep chain
        // is freed without recursing per level.
        let mut orphans = mem::take(self.children.get_mut());
        while let Some(mut child) = orphans.pop() {
            if let Some(inner) = Rc::get_mut(&mut child.inner) {
                orphans.append(inner.children.get_mut());
            }
        }
    }
}

impl<T> Clone for MemoryNode<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for MemoryNode<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryNode")
            .field("label", &self.inner.label.borrow())
            .field("children", &self.inner.children.borrow().len())
            .field("expansion", &self.inner.expansion.get())
            .finish_non_exhaustive()
    }
}

impl<T> MemoryNode<T> {
    /// A node without children.
    pub fn new(label: T) -> Self {
        Self::with_children(label, [])
    }

    /// A node with the given children.
    pub fn with_children(label: T, children: impl IntoIterator<Item = Self>) -> Self {
        Self {
            inner: Rc::new(Inner {
                label: RefCell::new(label),
                children: RefCell::new(children.into_iter().collect()),
                expansion: Cell::new(None),
                child_queries: Cell::new(0),
            }),
        }
    }

    /// Append a child. Trees that already snapshotted this node only see it after a rebuild.
    pub fn push_child(&self, child: Self) {
        self.inner.children.borrow_mut().push(child);
    }

    /// Replace the label that future representations are created from.
    pub fn set_label(&self, label: T) {
        *self.inner.label.borrow_mut() = label;
    }

    /// How many times a tree asked for this node's children.
    pub fn child_queries(&self) -> usize {
        self.inner.child_queries.get()
    }

    /// Returns `true` if both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> MemoryNode<T> {
    /// Current label.
    pub fn label(&self) -> T {
        self.inner.label.borrow().clone()
    }
}

impl<T: Clone> BackingNode for MemoryNode<T> {
    type Content = T;

    fn children(&self) -> Vec<Self> {
        self.inner
            .child_queries
            .set(self.inner.child_queries.get() + 1);
        self.inner.children.borrow().clone()
    }

    fn create_representation(&self) -> T {
        self.label()
    }

    fn remembered_expansion(&self) -> Option<bool> {
        self.inner.expansion.get()
    }

    fn remember_expansion(&self, expanded: bool) {
        self.inner.expansion.set(Some(expanded));
    }
}
