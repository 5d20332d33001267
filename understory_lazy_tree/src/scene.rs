// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A retained, in-memory render surface.
//!
//! [`Scene`] stores elements in generational slots, keeps per-element class
//! and bounds, and turns raw pointer down/up input into routed
//! [`PointerEvent`]s by hit testing the listening elements. It is enough to
//! drive a [`LazyTree`](crate::LazyTree) headlessly, and a template for
//! binding one to a real toolkit.

use alloc::vec::Vec;
use hashbrown::HashMap;
use kurbo::{Point, Rect};

use crate::surface::{Modifiers, PointerButton, PointerEvent, PointerKind, Surface};
use crate::types::{ConnectorRole, NodeId, StateClass};

/// Identifier for an element in a [`Scene`] (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ElementId(u32, u32);

impl ElementId {
    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Identifier for a container in a [`Scene`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ContainerId(u32);

/// What an element shows.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementKind<T> {
    /// A node representation with its child-count indicator.
    Representation {
        /// Content produced by the backing node.
        content: T,
        /// Number of snapshot children of the node.
        child_count: usize,
    },
    /// A connector segment.
    Connector(ConnectorRole),
}

/// Retained state of one element.
#[derive(Clone, Debug)]
pub struct ElementRecord<T> {
    /// Content or connector role.
    pub kind: ElementKind<T>,
    /// State class, if one was set.
    pub class: Option<StateClass>,
    /// Absolute bounds.
    pub bounds: Rect,
    /// Container the element is attached to.
    pub container: Option<ContainerId>,
    generation: u32,
    /// Attachment sequence number; later attachments paint on top.
    stacking: u64,
}

/// A pointer event resolved to the node that listens on the hit element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RoutedEvent {
    /// Node to hand the event to.
    pub target: NodeId,
    /// The event.
    pub event: PointerEvent,
}

/// In-memory [`Surface`] implementation.
pub struct Scene<T> {
    /// slots
    elements: Vec<Option<ElementRecord<T>>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    containers: u32,
    listeners: HashMap<ElementId, NodeId>,
    stacking: u64,
    /// Element and button of the press awaiting its release.
    pressed: Option<(ElementId, PointerButton)>,
}

impl<T> core::fmt::Debug for Scene<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scene")
            .field("elements_alive", &self.live_count())
            .field("containers", &self.containers)
            .field("listeners", &self.listeners.len())
            .field("pressed", &self.pressed)
            .finish_non_exhaustive()
    }
}

impl<T> Default for Scene<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scene<T> {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            containers: 0,
            listeners: HashMap::new(),
            stacking: 0,
            pressed: None,
        }
    }

    /// Create a new container.
    pub fn create_container(&mut self) -> ContainerId {
        self.containers += 1;
        ContainerId(self.containers)
    }

    /// Look up a live element.
    pub fn get(&self, element: ElementId) -> Option<&ElementRecord<T>> {
        let record = self.elements.get(element.idx())?.as_ref()?;
        (record.generation == element.1).then_some(record)
    }

    /// Content of a representation element.
    pub fn content(&self, element: ElementId) -> Option<&T> {
        match &self.get(element)?.kind {
            ElementKind::Representation { content, .. } => Some(content),
            ElementKind::Connector(_) => None,
        }
    }

    /// Child-count indicator of a representation element.
    pub fn child_count(&self, element: ElementId) -> Option<usize> {
        match self.get(element)?.kind {
            ElementKind::Representation { child_count, .. } => Some(child_count),
            ElementKind::Connector(_) => None,
        }
    }

    /// Node that pointer events on `element` are routed to.
    pub fn listener(&self, element: ElementId) -> Option<NodeId> {
        self.listeners.get(&element).copied()
    }

    /// Number of live elements, attached or not.
    pub fn live_count(&self) -> usize {
        self.elements.iter().filter(|e| e.is_some()).count()
    }

    /// Elements attached to `container`, in slot order.
    pub fn attached(
        &self,
        container: ContainerId,
    ) -> impl Iterator<Item = (ElementId, &ElementRecord<T>)> + '_ {
        self.elements.iter().enumerate().filter_map(move |(i, slot)| {
            let record = slot.as_ref()?;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ElementId uses 32-bit indices by design."
            )]
            let id = ElementId(i as u32, record.generation);
            (record.container == Some(container)).then_some((id, record))
        })
    }

    /// Number of elements attached to `container`.
    pub fn attached_count(&self, container: ContainerId) -> usize {
        self.attached(container).count()
    }

    /// Topmost attached element with a listener whose bounds contain `point`.
    pub fn hit_test(&self, point: Point) -> Option<ElementId> {
        self.listeners
            .keys()
            .filter_map(|&element| Some((element, self.get(element)?)))
            .filter(|(_, record)| record.container.is_some() && record.bounds.contains(point))
            .max_by_key(|(_, record)| record.stacking)
            .map(|(element, _)| element)
    }

    /// Pointer went down at `point`.
    ///
    /// Returns a [`PointerKind::Press`] routed to the listener of the hit
    /// element, and remembers the element so a matching release can click it.
    pub fn pointer_down(
        &mut self,
        point: Point,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> Option<RoutedEvent> {
        let element = self.hit_test(point);
        self.pressed = element.map(|e| (e, button));
        let element = element?;
        Some(RoutedEvent {
            target: self.listener(element)?,
            event: PointerEvent {
                kind: PointerKind::Press,
                button,
                modifiers,
            },
        })
    }

    /// Pointer went up at `point`.
    ///
    /// Returns a [`PointerKind::Click`] only if the release hits the element
    /// that received the press, with the same button.
    pub fn pointer_up(
        &mut self,
        point: Point,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> Option<RoutedEvent> {
        let (pressed, pressed_button) = self.pressed.take()?;
        if pressed_button != button || self.hit_test(point) != Some(pressed) {
            return None;
        }
        Some(RoutedEvent {
            target: self.listener(pressed)?,
            event: PointerEvent {
                kind: PointerKind::Click,
                button,
                modifiers,
            },
        })
    }

    fn insert(&mut self, kind: ElementKind<T>) -> ElementId {
        let make = |generation| ElementRecord {
            kind,
            class: None,
            bounds: Rect::ZERO,
            container: None,
            generation,
            stacking: 0,
        };
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.elements[idx] = Some(make(generation));
            (idx, generation)
        } else {
            let generation = 1_u32;
            self.elements.push(Some(make(generation)));
            self.generations.push(generation);
            (self.elements.len() - 1, generation)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "ElementId uses 32-bit indices by design."
        )]
        let idx = idx as u32;
        ElementId(idx, generation)
    }

    fn record_mut(&mut self, element: ElementId) -> Option<&mut ElementRecord<T>> {
        let record = self.elements.get_mut(element.idx())?.as_mut()?;
        (record.generation == element.1).then_some(record)
    }
}

impl<T> Surface for Scene<T> {
    type Content = T;
    type Element = ElementId;
    type Container = ContainerId;

    fn create_representation(&mut self, content: T, child_count: usize) -> ElementId {
        self.insert(ElementKind::Representation {
            content,
            child_count,
        })
    }

    fn create_connector(&mut self, role: ConnectorRole) -> ElementId {
        self.insert(ElementKind::Connector(role))
    }

    fn listen(&mut self, element: ElementId, target: NodeId) {
        if self.get(element).is_some() {
            self.listeners.insert(element, target);
        }
    }

    fn attach(&mut self, element: ElementId, container: ContainerId) {
        self.stacking += 1;
        let stacking = self.stacking;
        if let Some(record) = self.record_mut(element) {
            record.container = Some(container);
            record.stacking = stacking;
        }
    }

    fn is_attached(&self, element: ElementId, container: ContainerId) -> bool {
        self.get(element)
            .is_some_and(|record| record.container == Some(container))
    }

    fn destroy(&mut self, element: ElementId) {
        if self.get(element).is_none() {
            return;
        }
        self.listeners.remove(&element);
        if self.pressed.is_some_and(|(pressed, _)| pressed == element) {
            self.pressed = None;
        }
        self.elements[element.idx()] = None;
        self.free_list.push(element.idx());
    }

    fn set_class(&mut self, element: ElementId, class: StateClass) {
        if let Some(record) = self.record_mut(element) {
            record.class = Some(class);
        }
    }

    fn class(&self, element: ElementId) -> Option<StateClass> {
        self.get(element)?.class
    }

    fn set_bounds(&mut self, element: ElementId, bounds: Rect) {
        if let Some(record) = self.record_mut(element) {
            record.bounds = bounds;
        }
    }

    fn bounds(&self, element: ElementId) -> Option<Rect> {
        self.get(element).map(|record| record.bounds)
    }
}
