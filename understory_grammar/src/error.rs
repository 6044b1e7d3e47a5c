// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;

/// Reasons a declarative grammar description cannot be loaded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    /// Two nonterminals share an id.
    #[error("nonterminal `{0}` is declared twice")]
    DuplicateNonterminal(String),
    /// Two productions of one nonterminal share an id.
    #[error("production `{production}` of `{nonterminal}` is declared twice")]
    DuplicateProduction {
        /// Owning nonterminal.
        nonterminal: String,
        /// Repeated production id.
        production: String,
    },
    /// A slot names a nonterminal that is not declared.
    #[error("slot in `{nonterminal}.{production}` refers to undeclared nonterminal `{target}`")]
    UnknownNonterminal {
        /// Owning nonterminal.
        nonterminal: String,
        /// Production containing the slot.
        production: String,
        /// The undeclared name.
        target: String,
    },
    /// A symbol lacks a field its type requires.
    #[error("symbol {position} of `{nonterminal}.{production}` is missing `{field}`")]
    MissingField {
        /// Owning nonterminal.
        nonterminal: String,
        /// Production containing the symbol.
        production: String,
        /// Index of the symbol in the description.
        position: usize,
        /// The missing field.
        field: &'static str,
    },
}
