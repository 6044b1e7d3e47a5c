// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene graph: node identifiers, flags, and local transforms.

use kurbo::{Affine, Point, Vec2};

/// Identifier for a node in a [`Scene`](crate::Scene) (generational).
///
/// The first field is the arena slot, the second the generation of that slot
/// when the node was inserted. Once a node is removed, every copy of its id
/// becomes stale and is rejected by the accessors.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Node flags controlling visibility, picking, and highlight state.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is visible (participates in rendering and hit testing).
        const VISIBLE     = 0b0000_0001;
        /// Node is pickable (can be the target of a hit test).
        const PICKABLE    = 0b0000_0010;
        /// Node is drawn highlighted, e.g. a drop target under a dragged node.
        const HIGHLIGHTED = 0b0000_0100;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::PICKABLE
    }
}

/// Rotation by `angle` radians about `pivot`, expressed in the node's own space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    /// Angle in radians.
    pub angle: f64,
    /// Point the rotation is performed about.
    pub pivot: Point,
}

impl Rotation {
    /// No rotation.
    pub const NONE: Self = Self {
        angle: 0.0,
        pivot: Point::ORIGIN,
    };
}

impl Default for Rotation {
    fn default() -> Self {
        Self::NONE
    }
}

/// Local transform of a node relative to its parent.
///
/// The transform composes as translation ∘ rotation ∘ scale, so scale is
/// applied first and translation last.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Offset from the parent's origin.
    pub translation: Vec2,
    /// Rotation about a pivot.
    pub rotation: Rotation,
    /// Per-axis scale factors.
    pub scale: Vec2,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec2::ZERO,
        rotation: Rotation::NONE,
        scale: Vec2::new(1.0, 1.0),
    };

    /// A pure translation.
    pub const fn from_translation(translation: Vec2) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Compose this transform into a single [`Affine`].
    pub fn to_affine(&self) -> Affine {
        Affine::translate(self.translation)
            * Affine::rotate_about(self.rotation.angle, self.rotation.pivot)
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
