// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage summary accumulated by [`crate::Scene::render`].

use alloc::vec::Vec;
use kurbo::Rect;

use crate::NodeId;

/// Changes the drawing layer has to pick up since the last
/// [`crate::Scene::take_damage`].
#[derive(Clone, Debug, Default)]
pub struct Damage {
    /// World-space rectangles that should be repainted (old and new bounds of moved nodes).
    pub dirty_rects: Vec<Rect>,
    /// Nodes whose size changed, each once, in the order of their first change.
    pub resized: Vec<NodeId>,
}

impl Damage {
    /// Returns the union of all damage rects.
    pub fn union_rect(&self) -> Option<Rect> {
        let mut it = self.dirty_rects.iter().copied();
        let first = it.next()?;
        Some(it.fold(first, |acc, r| acc.union(r)))
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.dirty_rects.is_empty() && self.resized.is_empty()
    }
}
