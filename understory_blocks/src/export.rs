// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bare export of block trees, and the matching import.
//!
//! Each block exports as its production, its arguments in slot order (with
//! `None` for an empty slot, and only for an empty slot), and the contents
//! of its inline inputs in symbol order.

use alloc::{string::String, vec::Vec};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use understory_grammar::{LiteralKind, NonterminalId, ProductionId, Symbol};
use understory_scene::NodeId;

use crate::editor::{Editor, accepts_literal};
use crate::element::Element;
use crate::error::EditError;

/// Exported form of one block and everything nested in it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExprTree {
    /// Production the block instantiates.
    pub production: ProductionId,
    /// Arguments in slot order; `None` is an empty slot.
    pub args: Vec<Option<ExprTree>>,
    /// Inline input contents in symbol order. Missing trailing entries import as empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub literals: Vec<String>,
}

/// A top-level script and where it sits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Horizontal position on the script layer.
    pub x: f64,
    /// Vertical position on the script layer.
    pub y: f64,
    /// The script's block tree.
    pub tree: ExprTree,
}

/// Every top-level script of an editor, in drawing order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The scripts.
    pub scripts: Vec<Script>,
}

impl Editor {
    /// Export the block tree rooted at `block`.
    pub fn export(&self, block: NodeId) -> Result<ExprTree, EditError> {
        let b = self.expect_block(block)?;
        let args = b
            .args
            .iter()
            .map(|arg| arg.map(|a| self.export(a)).transpose())
            .collect::<Result<_, _>>()?;
        let literals = self
            .scene
            .children(block)
            .filter_map(|c| match self.scene.payload(c) {
                Some(Element::Input(i)) => Some(i.value.clone()),
                _ => None,
            })
            .collect();
        Ok(ExprTree {
            production: b.production,
            args,
            literals,
        })
    }

    /// Export every top-level script with its position.
    pub fn export_scripts(&self) -> Result<Document, EditError> {
        let scripts = self
            .scripts()
            .map(|id| {
                let position = self.scene.translation(id).unwrap_or_default();
                Ok(Script {
                    x: position.x,
                    y: position.y,
                    tree: self.export(id)?,
                })
            })
            .collect::<Result<_, EditError>>()?;
        Ok(Document { scripts })
    }

    /// Build a detached block tree from an export.
    ///
    /// The whole tree is validated against the grammar before any block is
    /// created.
    pub fn import(&mut self, tree: &ExprTree) -> Result<NodeId, EditError> {
        self.validate_tree(tree, None)?;
        self.build_tree(tree)
    }

    /// Add every script of `document` to the editor. Returns the new scripts.
    ///
    /// Nothing is added unless every script is valid and no drag is active.
    pub fn import_document(&mut self, document: &Document) -> Result<Vec<NodeId>, EditError> {
        self.ensure_idle()?;
        for script in &document.scripts {
            self.validate_tree(&script.tree, None)?;
        }
        let mut roots = Vec::with_capacity(document.scripts.len());
        for script in &document.scripts {
            let root = self.build_tree(&script.tree)?;
            self.add_script(root, Point::new(script.x, script.y))?;
            roots.push(root);
        }
        Ok(roots)
    }

    fn validate_tree(&self, tree: &ExprTree, expected: Option<NonterminalId>) -> Result<(), EditError> {
        let production = self
            .grammar
            .production(tree.production)
            .ok_or(EditError::UnknownProduction(tree.production))?;
        if let Some(expected) = expected
            && production.nonterminal() != expected
        {
            return Err(EditError::Incompatible {
                expected,
                found: production.nonterminal(),
            });
        }
        if tree.args.len() != production.slot_count() {
            return Err(EditError::ArgumentCount {
                expected: production.slot_count(),
                actual: tree.args.len(),
            });
        }
        let kinds: Vec<LiteralKind> = production
            .symbols()
            .iter()
            .filter_map(|s| match s {
                Symbol::InlineLiteral(kind) => Some(*kind),
                _ => None,
            })
            .collect();
        if tree.literals.len() > kinds.len() {
            return Err(EditError::ArgumentCount {
                expected: kinds.len(),
                actual: tree.literals.len(),
            });
        }
        for (&kind, value) in kinds.iter().zip(&tree.literals) {
            if !accepts_literal(kind, value) {
                return Err(EditError::InvalidLiteral {
                    kind,
                    value: value.clone(),
                });
            }
        }
        for (arg, slot) in tree.args.iter().zip(production.slots()) {
            if let Some(arg) = arg {
                self.validate_tree(arg, Some(slot))?;
            }
        }
        Ok(())
    }

    fn build_tree(&mut self, tree: &ExprTree) -> Result<NodeId, EditError> {
        let args = tree
            .args
            .iter()
            .map(|arg| arg.as_ref().map(|a| self.build_tree(a)).transpose())
            .collect::<Result<Vec<_>, _>>()?;
        let block = self.new_block_with_args(tree.production, &args)?;
        let inputs: Vec<NodeId> = self
            .scene
            .children(block)
            .filter(|&c| matches!(self.scene.payload(c), Some(Element::Input(_))))
            .collect();
        for (input, value) in inputs.into_iter().zip(&tree.literals) {
            self.set_literal(input, value)?;
        }
        Ok(block)
    }
}
