// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by editor operations.

use alloc::string::String;
use understory_grammar::{LiteralKind, NonterminalId, ProductionId};
use understory_scene::NodeId;

/// Why an editor operation was rejected.
///
/// Every operation checks its preconditions before mutating anything, so a
/// returned error means the document is unchanged.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// The id does not refer to a live node.
    #[error("{0:?} is not a live node")]
    Stale(NodeId),
    /// The node is not a block.
    #[error("{0:?} is not a block")]
    NotABlock(NodeId),
    /// The node is not an inline input.
    #[error("{0:?} is not an inline input")]
    NotAnInput(NodeId),
    /// The block is not part of the document.
    #[error("{0:?} is not part of the document")]
    NotAttached(NodeId),
    /// The block already has a parent.
    #[error("{0:?} already has a parent")]
    AlreadyAttached(NodeId),
    /// The block is not a top-level script.
    #[error("{0:?} is not a top-level script")]
    NotAScript(NodeId),
    /// The production is not in the grammar.
    #[error("unknown production {0:?}")]
    UnknownProduction(ProductionId),
    /// The slot index exceeds the production's slot count.
    #[error("slot {slot} is out of range for {block:?}")]
    SlotOutOfRange {
        /// The block.
        block: NodeId,
        /// Requested slot.
        slot: usize,
    },
    /// The slot already holds a block.
    #[error("slot {slot} of {block:?} is already filled")]
    SlotFilled {
        /// The block.
        block: NodeId,
        /// Requested slot.
        slot: usize,
    },
    /// The slot holds no block.
    #[error("slot {slot} of {block:?} is empty")]
    SlotEmpty {
        /// The block.
        block: NodeId,
        /// Requested slot.
        slot: usize,
    },
    /// Wrong number of arguments for a production.
    #[error("production takes {expected} arguments, got {actual}")]
    ArgumentCount {
        /// Slots in the production.
        expected: usize,
        /// Arguments supplied.
        actual: usize,
    },
    /// The block's nonterminal does not match the slot.
    #[error("a {found:?} block does not fit a {expected:?} slot")]
    Incompatible {
        /// Nonterminal the slot accepts.
        expected: NonterminalId,
        /// Nonterminal of the offered block.
        found: NonterminalId,
    },
    /// The block contains the slot's owner.
    #[error("placing {block:?} inside {owner:?} would create a cycle")]
    Cycle {
        /// Block being placed.
        block: NodeId,
        /// Owner of the target slot.
        owner: NodeId,
    },
    /// The value is not valid for the input.
    #[error("invalid {kind:?} literal `{value}`")]
    InvalidLiteral {
        /// Kind of the input.
        kind: LiteralKind,
        /// Rejected value.
        value: String,
    },
    /// A second pick-up was attempted while a drag is active.
    #[error("a drag is already in progress")]
    DragInProgress,
    /// A drag event arrived with no drag active.
    #[error("no drag is in progress")]
    NoActiveDrag,
    /// The tree and the hole registry disagree.
    #[error(transparent)]
    Desync(#[from] Desync),
}

/// An invariant violation between blocks, their children, and the hole registry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Desync {
    /// An empty slot's hole is not registered.
    #[error("hole {hole:?} for slot {slot} of {owner:?} is missing from the registry")]
    Unregistered {
        /// The hole.
        hole: NodeId,
        /// Its owner.
        owner: NodeId,
        /// Its slot.
        slot: usize,
    },
    /// The registry holds something that is not the hole of an empty slot.
    #[error("registry holds {0:?}, which is not an empty slot's hole")]
    Stray(NodeId),
    /// The child at a symbol's position is not what the symbol requires.
    #[error("child {position} of {block:?} does not match its symbol")]
    ChildOrder {
        /// The block.
        block: NodeId,
        /// Position among child-producing symbols.
        position: usize,
    },
    /// A block has the wrong number of children for its production.
    #[error("{block:?} has {actual} children, its production needs {expected}")]
    ChildCount {
        /// The block.
        block: NodeId,
        /// Child-producing symbols.
        expected: usize,
        /// Actual children.
        actual: usize,
    },
    /// A block's argument list and its slot children disagree.
    #[error("slot {slot} of {block:?} is out of sync with its children")]
    Slot {
        /// The block.
        block: NodeId,
        /// The slot.
        slot: usize,
    },
}
