// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Blocks: the core of a block-based structure editor.
//!
//! Programs are trees of *blocks*. Each block instantiates one production of
//! an [`understory_grammar::Grammar`]; its empty argument slots are filled
//! by *holes*, and the user builds programs by dragging blocks into holes.
//!
//! - An [`Editor`] owns a [`Scene`](understory_scene::Scene) of [`Element`]s
//!   and lays blocks out row by row from their production's symbols.
//!   Size changes cascade from a nested block up to its top-level script.
//! - The [`HoleRegistry`] tracks every live hole. Outside a drag it holds
//!   exactly the holes of all empty slots; [`Editor::check_invariants`]
//!   verifies this along with each block's child order.
//! - Drag and drop ([`Editor::pointer_down`], [`Editor::pointer_move`],
//!   [`Editor::pointer_up`], [`Editor::pointer_cancel`]) moves blocks
//!   between scripts and slots. See the [`drag`] module.
//! - [`Editor::export`] produces the bare [`ExprTree`] of a block, with
//!   `None` for each empty slot.
//!
//! Geometry is [`kurbo`]; coordinates passed to pointer methods are in
//! canvas space.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod config;
pub mod drag;
mod editor;
mod element;
mod error;
mod export;
mod holes;
mod layout;

pub use config::{EditorConfig, FixedAdvance, Metrics, TextMeasure};
pub use drag::{DragSession, DragState, DropOutcome, HoleTarget, Origin};
pub use editor::Editor;
pub use element::{Args, Block, Element, Hole, Input, Layer, Text};
pub use error::{Desync, EditError};
pub use export::{Document, ExprTree, Script};
pub use holes::HoleRegistry;
