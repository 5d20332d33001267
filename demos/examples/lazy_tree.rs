// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazy tree driven headlessly through the in-memory scene.
//!
//! This example shows how to:
//! - build a `LazyTree` over `MemoryNode`s and draw it into a `Scene`,
//! - turn pointer down/up pairs into clicks that expand and collapse nodes,
//! - drain the incremental refresh queue after content changes.
//!
//! Run:
//! - `RUST_LOG=understory_lazy_tree=debug cargo run -p understory_demos --example lazy_tree`

use kurbo::{Point, Vec2};
use tracing::info;
use tracing_subscriber::EnvFilter;
use understory_lazy_tree::{
    ContainerId, ElementKind, LazyTree, MemoryNode, Modifiers, PointerButton, Scene, StateClass,
    TreeConfig,
};

type DemoTree = LazyTree<MemoryNode<String>, Scene<String>>;

/// A synthetic hierarchy: `fanout` children per node down to `depth` levels.
fn synthesize(label: String, depth: usize, fanout: usize) -> MemoryNode<String> {
    let node = MemoryNode::new(label.clone());
    if let Some(below) = depth.checked_sub(1) {
        for i in 0..fanout {
            node.push_child(synthesize(format!("{label}.{i}"), below, fanout));
        }
    }
    node
}

/// Press and release at `at`, forwarding whatever the scene routes to the tree.
fn click(tree: &mut DemoTree, at: Point, modifiers: Modifiers) {
    if let Some(press) = tree
        .surface_mut()
        .pointer_down(at, PointerButton::Primary, modifiers)
    {
        let response = tree.handle_pointer(press.target, press.event);
        info!(?at, ?response, "press");
    }
    if let Some(click) = tree
        .surface_mut()
        .pointer_up(at, PointerButton::Primary, modifiers)
    {
        let response = tree.handle_pointer(click.target, click.event);
        info!(?at, ?response, "click");
    }
}

fn dump(tree: &DemoTree, container: ContainerId) {
    println!(
        "-- {} nodes, {} elements attached, redraw epoch {}",
        tree.len(),
        tree.surface().attached_count(container),
        tree.redraw_epoch()
    );
    for (_, record) in tree.surface().attached(container) {
        let b = record.bounds;
        match &record.kind {
            ElementKind::Representation {
                content,
                child_count,
            } => println!(
                "  node {content:<10} ({child_count} children) {:<9} at ({}, {})",
                record.class.map_or("-", StateClass::as_str),
                b.x0,
                b.y0
            ),
            ElementKind::Connector(role) => println!(
                "  {role:?} ({}, {}) -> ({}, {})",
                b.x0, b.y0, b.x1, b.y1
            ),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let root = synthesize("n".to_string(), 3, 3);
    let mut scene = Scene::new();
    let container = scene.create_container();
    let config = TreeConfig::default().with_margins(16.0, 32.0);
    let mut tree = LazyTree::build(scene, container, root.clone(), config);
    dump(&tree, container);

    // A plain click opens the root one level.
    click(&mut tree, Point::new(10.0, 10.0), Modifiers::empty());
    dump(&tree, container);

    // A modified click on the second child opens its whole subtree.
    let second = tree.children_of(tree.root())[1];
    let (_, origin) = tree.placement(second).expect("child was drawn");
    click(&mut tree, origin + Vec2::new(10.0, 10.0), Modifiers::CONTROL);
    let width = tree.required_width(tree.root());
    info!(?width, "after recursive expand");
    dump(&tree, container);

    // Content changes are applied one queued node at a time.
    root.set_label("root".to_string());
    tree.refresh_representation();
    let mut turns = 0;
    while tree.poll_refresh().is_some() {
        turns += 1;
    }
    info!(turns, "refresh drained");

    // A modified click on an expanded node collapses it again.
    let (_, origin) = tree.placement(second).expect("child was drawn");
    click(&mut tree, origin + Vec2::new(10.0, 10.0), Modifiers::META);
    dump(&tree, container);
}
