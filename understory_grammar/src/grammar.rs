// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grammar table types and the programmatic builder.

use alloc::{string::String, vec::Vec};
use serde::{Deserialize, Serialize};

/// Identifier of a [`Nonterminal`] within one [`Grammar`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NonterminalId(pub(crate) u32);

/// Identifier of a [`Production`] within one [`Grammar`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductionId(pub(crate) u32);

impl NonterminalId {
    const fn idx(self) -> usize {
        self.0 as usize
    }
}

impl ProductionId {
    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Kind of an inline literal input.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralKind {
    /// A single character.
    Char,
    /// A number.
    Number,
    /// Free text.
    String,
}

/// One element of a production's symbol sequence.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Symbol {
    /// Fixed text drawn inside the block.
    Token(String),
    /// An argument slot accepting a block of the given nonterminal.
    Slot(NonterminalId),
    /// An inline literal input.
    InlineLiteral(LiteralKind),
    /// Ends the current row.
    RowBreak,
    /// Advances the current row by one tab stop.
    Indent,
}

impl Symbol {
    /// Returns `true` if this symbol materializes a child node in a block.
    ///
    /// Row breaks and indents only move the layout cursor.
    pub fn produces_child(&self) -> bool {
        !matches!(self, Self::RowBreak | Self::Indent)
    }
}

/// A syntactic category; each block belongs to exactly one.
#[derive(Clone, Debug)]
pub struct Nonterminal {
    id: NonterminalId,
    name: String,
    productions: Vec<ProductionId>,
}

impl Nonterminal {
    /// Identifier of this nonterminal.
    pub fn id(&self) -> NonterminalId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Productions in declaration order.
    pub fn productions(&self) -> &[ProductionId] {
        &self.productions
    }
}

/// One alternative of a nonterminal: the shape of a block.
#[derive(Clone, Debug)]
pub struct Production {
    id: ProductionId,
    nonterminal: NonterminalId,
    name: String,
    symbols: Vec<Symbol>,
}

impl Production {
    /// Identifier of this production.
    pub fn id(&self) -> ProductionId {
        self.id
    }

    /// The nonterminal this production belongs to.
    pub fn nonterminal(&self) -> NonterminalId {
        self.nonterminal
    }

    /// Name of the production, unique within its nonterminal.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The symbol sequence.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Nonterminals accepted by each slot, in argument order.
    pub fn slots(&self) -> impl Iterator<Item = NonterminalId> + '_ {
        self.symbols.iter().filter_map(|s| match s {
            Symbol::Slot(nt) => Some(*nt),
            _ => None,
        })
    }

    /// Nonterminal accepted by argument `index`.
    pub fn slot(&self, index: usize) -> Option<NonterminalId> {
        self.slots().nth(index)
    }

    /// Number of argument slots.
    pub fn slot_count(&self) -> usize {
        self.slots().count()
    }

    /// Number of child nodes a block of this production owns.
    pub fn child_count(&self) -> usize {
        self.symbols.iter().filter(|s| s.produces_child()).count()
    }
}

/// An immutable table of nonterminals and their productions.
///
/// Build one with [`Grammar::builder`] or load a declarative description with
/// [`Grammar::load`](crate::Grammar::load). Once built, a grammar never changes.
#[derive(Clone, Debug, Default)]
pub struct Grammar {
    nonterminals: Vec<Nonterminal>,
    productions: Vec<Production>,
}

impl Grammar {
    /// Start building a grammar.
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::default()
    }

    /// Look up a nonterminal.
    pub fn nonterminal(&self, id: NonterminalId) -> Option<&Nonterminal> {
        self.nonterminals.get(id.idx())
    }

    /// Look up a production.
    pub fn production(&self, id: ProductionId) -> Option<&Production> {
        self.productions.get(id.idx())
    }

    /// Nonterminals in declaration order.
    pub fn nonterminals(&self) -> impl Iterator<Item = &Nonterminal> + '_ {
        self.nonterminals.iter()
    }

    /// Find a nonterminal by name.
    pub fn nonterminal_by_name(&self, name: &str) -> Option<NonterminalId> {
        self.nonterminals
            .iter()
            .find(|nt| nt.name == name)
            .map(|nt| nt.id)
    }

    /// Find a production of `nonterminal` by name.
    pub fn production_by_name(&self, nonterminal: NonterminalId, name: &str) -> Option<ProductionId> {
        self.nonterminal(nonterminal)?
            .productions
            .iter()
            .copied()
            .find(|&p| self.productions[p.idx()].name == name)
    }
}

/// Incrementally declares nonterminals and productions.
///
/// ```rust
/// use understory_grammar::{Grammar, LiteralKind, Symbol};
///
/// let mut b = Grammar::builder();
/// let expr = b.declare("expr");
/// let num = b.production(expr, "num").literal(LiteralKind::Number).finish();
/// let add = b
///     .production(expr, "add")
///     .slot(expr)
///     .token("+")
///     .slot(expr)
///     .finish();
/// let grammar = b.build();
///
/// assert_eq!(grammar.production(add).unwrap().slot_count(), 2);
/// assert_eq!(grammar.production(num).unwrap().symbols()[0], Symbol::InlineLiteral(LiteralKind::Number));
/// ```
#[derive(Clone, Debug, Default)]
pub struct GrammarBuilder {
    nonterminals: Vec<Nonterminal>,
    productions: Vec<Production>,
}

impl GrammarBuilder {
    /// Declare a nonterminal. Slots may refer to it before it has productions.
    pub fn declare(&mut self, name: impl Into<String>) -> NonterminalId {
        let id = NonterminalId(Self::next_index(self.nonterminals.len()));
        self.nonterminals.push(Nonterminal {
            id,
            name: name.into(),
            productions: Vec::new(),
        });
        id
    }

    /// Start a production of `nonterminal`.
    ///
    /// # Panics
    ///
    /// Panics if `nonterminal` was not declared on this builder.
    pub fn production(
        &mut self,
        nonterminal: NonterminalId,
        name: impl Into<String>,
    ) -> ProductionBuilder<'_> {
        assert!(
            nonterminal.idx() < self.nonterminals.len(),
            "{nonterminal:?} was not declared on this builder"
        );
        ProductionBuilder {
            grammar: self,
            nonterminal,
            name: name.into(),
            symbols: Vec::new(),
        }
    }

    /// Finish the grammar.
    pub fn build(self) -> Grammar {
        Grammar {
            nonterminals: self.nonterminals,
            productions: self.productions,
        }
    }

    pub(crate) fn push_production(
        &mut self,
        nonterminal: NonterminalId,
        name: String,
        symbols: Vec<Symbol>,
    ) -> ProductionId {
        let id = ProductionId(Self::next_index(self.productions.len()));
        self.productions.push(Production {
            id,
            nonterminal,
            name,
            symbols,
        });
        self.nonterminals[nonterminal.idx()].productions.push(id);
        id
    }

    pub(crate) fn has_production(&self, nonterminal: NonterminalId, name: &str) -> bool {
        self.nonterminals[nonterminal.idx()]
            .productions
            .iter()
            .any(|p| self.productions[p.idx()].name == name)
    }

    fn next_index(len: usize) -> u32 {
        u32::try_from(len).expect("grammar tables are limited to u32::MAX entries")
    }
}

/// Appends symbols to one production; see [`GrammarBuilder::production`].
#[derive(Debug)]
#[must_use = "call `finish` to add the production to the grammar"]
pub struct ProductionBuilder<'a> {
    grammar: &'a mut GrammarBuilder,
    nonterminal: NonterminalId,
    name: String,
    symbols: Vec<Symbol>,
}

impl ProductionBuilder<'_> {
    /// Append fixed text.
    pub fn token(mut self, text: impl Into<String>) -> Self {
        self.symbols.push(Symbol::Token(text.into()));
        self
    }

    /// Append an argument slot accepting `nonterminal`.
    pub fn slot(mut self, nonterminal: NonterminalId) -> Self {
        self.symbols.push(Symbol::Slot(nonterminal));
        self
    }

    /// Append an inline literal input.
    pub fn literal(mut self, kind: LiteralKind) -> Self {
        self.symbols.push(Symbol::InlineLiteral(kind));
        self
    }

    /// End the current row.
    pub fn row_break(mut self) -> Self {
        self.symbols.push(Symbol::RowBreak);
        self
    }

    /// Indent by one tab stop.
    pub fn indent(mut self) -> Self {
        self.symbols.push(Symbol::Indent);
        self
    }

    /// Add the production to the grammar.
    pub fn finish(self) -> ProductionId {
        self.grammar
            .push_production(self.nonterminal, self.name, self.symbols)
    }
}
