// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render surface capability and the pointer events it delivers.

use core::fmt::Debug;
use kurbo::Rect;

use crate::types::{ConnectorRole, NodeId, StateClass};

/// A retained element store the tree draws into.
///
/// Elements are created detached, styled with a [`StateClass`] and absolute
/// bounds, and attached to a container. The tree never reads content back;
/// it only reads class and bounds so a refreshed representation can take over
/// the styling of the one it replaces.
///
/// Pointer input flows the other way: an element registered with
/// [`Surface::listen`] routes its press and click events to the given node,
/// and the host hands them to [`LazyTree::handle_pointer`](crate::LazyTree::handle_pointer).
pub trait Surface {
    /// Content produced by the backing nodes.
    type Content;
    /// Handle to an element.
    type Element: Copy + Eq + Debug;
    /// Handle to a container elements attach to.
    type Container: Copy + Eq + Debug;

    /// Create a detached representation element for `content`, decorated with
    /// an indicator of how many children the node has.
    fn create_representation(
        &mut self,
        content: Self::Content,
        child_count: usize,
    ) -> Self::Element;

    /// Create a detached connector element.
    fn create_connector(&mut self, role: ConnectorRole) -> Self::Element;

    /// Route pointer events on `element` to `target`.
    fn listen(&mut self, element: Self::Element, target: NodeId);

    /// Attach `element` to `container`, moving it if it is attached elsewhere.
    fn attach(&mut self, element: Self::Element, container: Self::Container);

    /// Returns `true` if `element` is currently attached to `container`.
    fn is_attached(&self, element: Self::Element, container: Self::Container) -> bool;

    /// Detach and free `element`, dropping any listener registered on it.
    fn destroy(&mut self, element: Self::Element);

    /// Replace the state class of `element`.
    fn set_class(&mut self, element: Self::Element, class: StateClass);

    /// Current state class of `element`, if any was set.
    fn class(&self, element: Self::Element) -> Option<StateClass>;

    /// Set the absolute position and size of `element`.
    fn set_bounds(&mut self, element: Self::Element, bounds: Rect);

    /// Current absolute bounds of `element`, if it is live.
    fn bounds(&self, element: Self::Element) -> Option<Rect>;
}

bitflags::bitflags! {
    /// Modifier keys held during a pointer event.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Modifiers: u8 {
        /// Shift key.
        const SHIFT   = 0b0000_0001;
        /// Control key.
        const CONTROL = 0b0000_0010;
        /// Alt / Option key.
        const ALT     = 0b0000_0100;
        /// Meta / Command / Super key.
        const META    = 0b0000_1000;
    }
}

/// Pointer event phase as delivered by the surface.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PointerKind {
    /// Button went down over the element.
    Press,
    /// Button went down and up over the same element.
    Click,
}

/// Pointer button.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum PointerButton {
    /// Main button (usually left).
    #[default]
    Primary,
    /// Secondary button (usually right).
    Secondary,
    /// Auxiliary button (usually the wheel).
    Auxiliary,
}

/// A pointer event routed to a node.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct PointerEvent {
    /// Press or click.
    pub kind: PointerKind,
    /// Button involved.
    pub button: PointerButton,
    /// Modifier keys held.
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// Primary-button click.
    #[must_use]
    pub const fn click(modifiers: Modifiers) -> Self {
        Self {
            kind: PointerKind::Click,
            button: PointerButton::Primary,
            modifiers,
        }
    }

    /// Primary-button press.
    #[must_use]
    pub const fn press(modifiers: Modifiers) -> Self {
        Self {
            kind: PointerKind::Press,
            button: PointerButton::Primary,
            modifiers,
        }
    }
}

/// What the host should do after the tree handled a pointer event.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PointerResponse {
    /// The tree did not act on the event.
    Ignored,
    /// The tree changed structure and redrew.
    Handled,
    /// The host should suppress its default behavior (text selection).
    PreventDefault,
}
