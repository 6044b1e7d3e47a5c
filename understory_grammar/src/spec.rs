// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative grammar descriptions.
//!
//! A [`GrammarSpec`] mirrors the table format used by grammar authors:
//!
//! ```json
//! { "nonterminals": [
//!     { "id": "expr", "productions": [
//!         { "id": "if", "symbols": [
//!             { "type": "token", "text": "if" },
//!             { "type": "nonterminal", "nonterminal": "expr" },
//!             { "type": "newline" },
//!             { "type": "tab" },
//!             { "type": "number" } ] } ] } ] }
//! ```
//!
//! Symbol types are `token`, `nonterminal`, `char`, `number`, `string`,
//! `newline`, and `tab`. Any other type is reported as a [`GrammarIssue`] and
//! skipped, so the resulting block is visibly incomplete instead of failing.

use alloc::{string::String, vec::Vec};
use core::fmt;
use serde::{Deserialize, Serialize};

use crate::error::GrammarError;
use crate::grammar::{Grammar, GrammarBuilder, LiteralKind, NonterminalId, Symbol};

/// Declarative description of a whole grammar.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarSpec {
    /// Nonterminals in declaration order.
    pub nonterminals: Vec<NonterminalSpec>,
}

/// Declarative description of one nonterminal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonterminalSpec {
    /// Identifier used by slots.
    pub id: String,
    /// Display name; defaults to `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Productions in declaration order.
    #[serde(default)]
    pub productions: Vec<ProductionSpec>,
}

/// Declarative description of one production.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionSpec {
    /// Identifier, unique within the nonterminal.
    pub id: String,
    /// Symbol sequence.
    #[serde(default)]
    pub symbols: Vec<SymbolSpec>,
}

/// Declarative description of one symbol.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSpec {
    /// Symbol type tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Token text, for `token`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Referenced nonterminal id, for `nonterminal`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonterminal: Option<String>,
}

/// A symbol that was skipped while loading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrammarIssue {
    /// Owning nonterminal id.
    pub nonterminal: String,
    /// Production id.
    pub production: String,
    /// Index of the symbol in the description.
    pub position: usize,
    /// The unrecognized type tag.
    pub kind: String,
}

impl fmt::Display for GrammarIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported symbol type `{}` at {}.{}[{}]",
            self.kind, self.nonterminal, self.production, self.position
        )
    }
}

impl Grammar {
    /// Build a grammar from a declarative description.
    ///
    /// Structural problems (duplicate ids, undeclared nonterminals, missing
    /// fields) are errors. Unsupported symbol types are skipped and returned
    /// as issues alongside the grammar.
    pub fn load(spec: &GrammarSpec) -> Result<(Self, Vec<GrammarIssue>), GrammarError> {
        let mut builder = GrammarBuilder::default();
        let mut ids: Vec<(&str, NonterminalId)> = Vec::with_capacity(spec.nonterminals.len());
        for nt in &spec.nonterminals {
            if ids.iter().any(|(id, _)| *id == nt.id) {
                return Err(GrammarError::DuplicateNonterminal(nt.id.clone()));
            }
            let name = nt.name.clone().unwrap_or_else(|| nt.id.clone());
            ids.push((nt.id.as_str(), builder.declare(name)));
        }
        let lookup = |name: &str| ids.iter().find(|(id, _)| *id == name).map(|(_, nt)| *nt);

        let mut issues = Vec::new();
        for (nt_spec, &(_, nt)) in spec.nonterminals.iter().zip(ids.iter()) {
            for prod in &nt_spec.productions {
                if builder.has_production(nt, &prod.id) {
                    return Err(GrammarError::DuplicateProduction {
                        nonterminal: nt_spec.id.clone(),
                        production: prod.id.clone(),
                    });
                }
                let mut symbols = Vec::with_capacity(prod.symbols.len());
                for (position, sym) in prod.symbols.iter().enumerate() {
                    let missing = |field| GrammarError::MissingField {
                        nonterminal: nt_spec.id.clone(),
                        production: prod.id.clone(),
                        position,
                        field,
                    };
                    let symbol = match sym.kind.as_str() {
                        "token" => Symbol::Token(sym.text.clone().ok_or_else(|| missing("text"))?),
                        "nonterminal" => {
                            let target = sym
                                .nonterminal
                                .as_deref()
                                .ok_or_else(|| missing("nonterminal"))?;
                            let Some(target_id) = lookup(target) else {
                                return Err(GrammarError::UnknownNonterminal {
                                    nonterminal: nt_spec.id.clone(),
                                    production: prod.id.clone(),
                                    target: target.into(),
                                });
                            };
                            Symbol::Slot(target_id)
                        }
                        "char" => Symbol::InlineLiteral(LiteralKind::Char),
                        "number" => Symbol::InlineLiteral(LiteralKind::Number),
                        "string" => Symbol::InlineLiteral(LiteralKind::String),
                        "newline" => Symbol::RowBreak,
                        "tab" => Symbol::Indent,
                        other => {
                            let issue = GrammarIssue {
                                nonterminal: nt_spec.id.clone(),
                                production: prod.id.clone(),
                                position,
                                kind: other.into(),
                            };
                            tracing::warn!(%issue, "skipping grammar symbol");
                            issues.push(issue);
                            continue;
                        }
                    };
                    symbols.push(symbol);
                }
                builder.push_production(nt, prod.id.clone(), symbols);
            }
        }
        Ok((builder.build(), issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    const LET_GRAMMAR: &str = r#"{
        "nonterminals": [
            { "id": "expr", "name": "Expression", "productions": [
                { "id": "let", "symbols": [
                    { "type": "token", "text": "let" },
                    { "type": "nonterminal", "nonterminal": "pattern" },
                    { "type": "token", "text": "=" },
                    { "type": "nonterminal", "nonterminal": "expr" },
                    { "type": "token", "text": "in" },
                    { "type": "newline" },
                    { "type": "nonterminal", "nonterminal": "expr" }
                ] },
                { "id": "num", "symbols": [ { "type": "number" } ] }
            ] },
            { "id": "pattern", "productions": [
                { "id": "var", "symbols": [ { "type": "string" } ] },
                { "id": "wild", "symbols": [ { "type": "token", "text": "_" } ] }
            ] }
        ]
    }"#;

    #[test]
    fn loads_table_format() {
        let spec: GrammarSpec = serde_json::from_str(LET_GRAMMAR).unwrap();
        let (grammar, issues) = Grammar::load(&spec).unwrap();
        assert!(issues.is_empty());

        let expr = grammar.nonterminal_by_name("Expression").unwrap();
        let pattern = grammar.nonterminal_by_name("pattern").unwrap();
        let let_ = grammar.production_by_name(expr, "let").unwrap();
        let p = grammar.production(let_).unwrap();
        assert_eq!(p.slots().collect::<Vec<_>>(), vec![pattern, expr, expr]);
        assert_eq!(p.symbols()[5], Symbol::RowBreak);
        assert_eq!(grammar.nonterminal(pattern).unwrap().productions().len(), 2);
    }

    #[test]
    fn unsupported_symbols_are_reported_and_skipped() {
        let spec = GrammarSpec {
            nonterminals: vec![NonterminalSpec {
                id: "expr".into(),
                name: None,
                productions: vec![ProductionSpec {
                    id: "odd".into(),
                    symbols: vec![
                        SymbolSpec {
                            kind: "token".into(),
                            text: Some("odd".into()),
                            nonterminal: None,
                        },
                        SymbolSpec {
                            kind: "color".into(),
                            ..SymbolSpec::default()
                        },
                        SymbolSpec {
                            kind: "char".into(),
                            ..SymbolSpec::default()
                        },
                    ],
                }],
            }],
        };
        let (grammar, issues) = Grammar::load(&spec).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, "color");
        assert_eq!(issues[0].position, 1);
        let expr = grammar.nonterminal_by_name("expr").unwrap();
        let odd = grammar.production_by_name(expr, "odd").unwrap();
        assert_eq!(
            grammar.production(odd).unwrap().symbols(),
            &[
                Symbol::Token("odd".into()),
                Symbol::InlineLiteral(LiteralKind::Char)
            ]
        );
    }

    #[test]
    fn structural_errors() {
        let dup: GrammarSpec =
            serde_json::from_str(r#"{"nonterminals":[{"id":"a"},{"id":"a"}]}"#).unwrap();
        assert_eq!(
            Grammar::load(&dup).unwrap_err(),
            GrammarError::DuplicateNonterminal("a".into())
        );

        let unknown: GrammarSpec = serde_json::from_str(
            r#"{"nonterminals":[{"id":"a","productions":[{"id":"p","symbols":[
                {"type":"nonterminal","nonterminal":"b"}]}]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            Grammar::load(&unknown),
            Err(GrammarError::UnknownNonterminal { ref target, .. }) if target == "b"
        ));

        let missing: GrammarSpec = serde_json::from_str(
            r#"{"nonterminals":[{"id":"a","productions":[{"id":"p","symbols":[{"type":"token"}]}]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            Grammar::load(&missing),
            Err(GrammarError::MissingField { field: "text", .. })
        ));

        let dup_prod: GrammarSpec = serde_json::from_str(
            r#"{"nonterminals":[{"id":"a","productions":[{"id":"p"},{"id":"p"}]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            Grammar::load(&dup_prod),
            Err(GrammarError::DuplicateProduction { .. })
        ));
    }
}
