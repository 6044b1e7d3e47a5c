// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Payloads carried by scene nodes in the editor.

use alloc::string::String;
use smallvec::SmallVec;
use understory_grammar::{LiteralKind, NonterminalId, ProductionId};
use understory_scene::NodeId;

/// What a scene node represents.
#[derive(Clone, Debug)]
pub enum Element {
    /// One of the editor's fixed containers.
    Layer(Layer),
    /// An instance of a grammar production.
    Block(Block),
    /// Placeholder for an empty argument slot.
    Hole(Hole),
    /// Token text inside a block.
    Text(Text),
    /// Inline literal input inside a block.
    Input(Input),
}

/// The fixed containers every editor has.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Layer {
    /// Root of the editing surface; parent of the other two layers.
    Canvas,
    /// Holds top-level scripts.
    Scripts,
    /// Holds the block being dragged, above all scripts.
    Drag,
}

/// Argument vector of a block; `None` marks an empty slot.
pub type Args = SmallVec<[Option<NodeId>; 4]>;

/// An editable node instantiating one production.
#[derive(Clone, Debug)]
pub struct Block {
    pub(crate) nonterminal: NonterminalId,
    pub(crate) production: ProductionId,
    pub(crate) args: Args,
    pub(crate) row_breaks: usize,
}

impl Block {
    /// Category of this block.
    pub fn nonterminal(&self) -> NonterminalId {
        self.nonterminal
    }

    /// Production this block instantiates.
    pub fn production(&self) -> ProductionId {
        self.production
    }

    /// Arguments in slot order.
    pub fn args(&self) -> &[Option<NodeId>] {
        &self.args
    }

    /// Rows this block spans beyond the first, including rows of nested blocks.
    ///
    /// Valid as of the last layout.
    pub fn row_breaks(&self) -> usize {
        self.row_breaks
    }
}

/// Placeholder filling an empty slot of `owner`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Hole {
    pub(crate) owner: NodeId,
    pub(crate) slot: usize,
}

impl Hole {
    /// Block whose slot this hole fills.
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Argument index of the slot.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// Token text.
#[derive(Clone, Debug)]
pub struct Text {
    pub(crate) text: String,
}

impl Text {
    /// The token text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Inline literal input; opaque and fixed-size as far as layout is concerned.
#[derive(Clone, Debug)]
pub struct Input {
    pub(crate) kind: LiteralKind,
    pub(crate) value: String,
}

impl Input {
    /// Kind of literal accepted.
    pub fn kind(&self) -> LiteralKind {
        self.kind
    }

    /// Current content.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Element {
    /// The block payload, if this is a block.
    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Self::Block(b) => Some(b),
            _ => None,
        }
    }

    /// The hole payload, if this is a hole.
    pub fn as_hole(&self) -> Option<&Hole> {
        match self {
            Self::Hole(h) => Some(h),
            _ => None,
        }
    }

    pub(crate) fn as_block_mut(&mut self) -> Option<&mut Block> {
        match self {
            Self::Block(b) => Some(b),
            _ => None,
        }
    }
}
