// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Scene: a retained scene graph with ordered children and two-pass rendering.
//!
//! - Nodes live in a generational arena; each carries a caller-defined payload,
//!   a local [`Transform`] (translation ∘ rotation ∘ scale), a size, and [`NodeFlags`].
//! - Children are kept in an [`OrderedList`], so a child can be swapped for
//!   another *in place* without disturbing its siblings.
//! - [`Scene::render`] runs a bottom-up size pass (children, then the node's
//!   own [`Layout`]) followed by a top-down placement pass, and records
//!   [`Damage`] for the drawing layer.
//!
//! The scene owns geometry and structure only. Pixels are drawn by an external
//! layer that reads [`Scene::rendered_transform`], [`Scene::size`], and the
//! drained [`Damage`].
//!
//! ## API overview
//!
//! - [`Scene::insert`] / [`Scene::remove`]: create nodes and destroy subtrees.
//! - [`Scene::attach_child`], [`Scene::insert_child_before`],
//!   [`Scene::detach_child`], [`Scene::replace_child`]: structural edits.
//!   Attaching a node that already has a parent panics.
//! - [`Scene::offset_to`]: flattened position along the parent chain.
//! - [`Scene::hit_test_point`]: deepest, topmost node under a point.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod damage;
mod list;
mod scene;
mod types;

pub use damage::Damage;
pub use list::{Iter, ListHandle, OrderedList};
pub use scene::{FixedLayout, Hit, Layout, QueryFilter, Scene, Subtree};
pub use types::{NodeFlags, NodeId, Rotation, Transform};
