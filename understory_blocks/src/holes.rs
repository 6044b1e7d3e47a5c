// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The set of live holes, used for drop-target search.

use alloc::vec::Vec;
use hashbrown::HashSet;
use understory_scene::NodeId;

/// Every live hole in an editor.
///
/// Mutated only when a slot is vacated (a hole is created) or filled (a hole
/// is destroyed). At any moment without a drag in progress its contents are
/// exactly the holes of all empty slots of all live blocks; see
/// [`Editor::check_invariants`](crate::Editor::check_invariants).
#[derive(Clone, Debug, Default)]
pub struct HoleRegistry {
    holes: HashSet<NodeId>,
}

impl HoleRegistry {
    /// Number of registered holes.
    pub fn len(&self) -> usize {
        self.holes.len()
    }

    /// Returns `true` if no hole is registered.
    pub fn is_empty(&self) -> bool {
        self.holes.is_empty()
    }

    /// Returns `true` if `hole` is registered.
    pub fn contains(&self, hole: NodeId) -> bool {
        self.holes.contains(&hole)
    }

    /// Registered holes in id order.
    pub fn sorted(&self) -> Vec<NodeId> {
        let mut holes: Vec<NodeId> = self.holes.iter().copied().collect();
        holes.sort_unstable();
        holes
    }

    pub(crate) fn register(&mut self, hole: NodeId) {
        let fresh = self.holes.insert(hole);
        debug_assert!(fresh, "{hole:?} registered twice");
    }

    pub(crate) fn unregister(&mut self, hole: NodeId) -> bool {
        self.holes.remove(&hole)
    }
}
