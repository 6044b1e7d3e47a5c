// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Grammar: immutable grammar tables for block editors.
//!
//! A [`Grammar`] maps each [`Nonterminal`] to its ordered [`Production`]s, and
//! each production to an ordered sequence of [`Symbol`]s: fixed tokens,
//! argument slots typed by a nonterminal, inline literal inputs, row breaks,
//! and indents. Slot order within a production defines argument order.
//!
//! Grammars are built up front, either programmatically with
//! [`Grammar::builder`] or from a [`GrammarSpec`] via [`Grammar::load`], and
//! are read-only afterwards.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod error;
mod grammar;
mod spec;

pub use error::GrammarError;
pub use grammar::{
    Grammar, GrammarBuilder, LiteralKind, Nonterminal, NonterminalId, Production,
    ProductionBuilder, ProductionId, Symbol,
};
pub use spec::{GrammarIssue, GrammarSpec, NonterminalSpec, ProductionSpec, SymbolSpec};
