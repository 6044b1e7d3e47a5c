// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grammar-driven block layout.

use kurbo::{Size, Vec2};
use smallvec::SmallVec;
use understory_grammar::{Grammar, Symbol};
use understory_scene::{Layout, NodeId, Scene};

use crate::config::Metrics;
use crate::element::Element;

/// Lays out blocks row by row from their production's symbol sequence.
///
/// Every other element keeps the size it was given at creation.
#[derive(Debug)]
pub(crate) struct BlockLayout<'a> {
    grammar: &'a Grammar,
    metrics: &'a Metrics,
}

impl<'a> BlockLayout<'a> {
    pub(crate) fn new(grammar: &'a Grammar, metrics: &'a Metrics) -> Self {
        Self { grammar, metrics }
    }
}

impl Layout<Element> for BlockLayout<'_> {
    fn update_layout(&mut self, scene: &mut Scene<Element>, id: NodeId) {
        let Some(Element::Block(block)) = scene.payload(id) else {
            return;
        };
        let grammar = self.grammar;
        let Some(production) = grammar.production(block.production) else {
            tracing::warn!(block = ?id, production = ?block.production, "block of unknown production");
            return;
        };
        let args = block.args.clone();
        let old_size = scene.size(id).unwrap_or_default();
        let old_rows = block.row_breaks;

        let m = self.metrics;
        let children: SmallVec<[NodeId; 8]> = scene.children(id).collect();
        // Row breaks and indents consume no child, so children are walked
        // with their own cursor rather than by symbol index.
        let mut cursor = children.iter().copied();
        let mut row_width = 0.0_f64;
        let mut max_row_width = 0.0_f64;
        let mut rows = 0_usize;
        let mut slot = 0_usize;

        for symbol in production.symbols() {
            match symbol {
                Symbol::RowBreak => {
                    max_row_width = max_row_width.max(row_width);
                    row_width = 0.0;
                    rows += 1;
                    continue;
                }
                Symbol::Indent => {
                    row_width += m.tab_width;
                    continue;
                }
                Symbol::Token(_) | Symbol::Slot(_) | Symbol::InlineLiteral(_) => {}
            }
            let Some(child) = cursor.next() else {
                tracing::warn!(block = ?id, "block has fewer children than its production");
                break;
            };
            #[allow(
                clippy::cast_precision_loss,
                reason = "row counts are tiny."
            )]
            let row_offset = rows as f64 * m.row_height;
            scene.set_translation(child, Vec2::new(row_width, row_offset));
            let width = scene.size(child).unwrap_or_default().width;
            match symbol {
                Symbol::Token(_) | Symbol::InlineLiteral(_) => row_width += width + m.spacing,
                Symbol::Slot(_) => {
                    row_width += width;
                    // Rows spanned by a nested block push everything after it down.
                    if let Some(Some(arg)) = args.get(slot)
                        && let Some(Element::Block(nested)) = scene.payload(*arg)
                    {
                        rows += nested.row_breaks;
                    }
                    slot += 1;
                }
                Symbol::RowBreak | Symbol::Indent => {}
            }
        }

        let width = max_row_width.max(row_width);
        #[allow(clippy::cast_precision_loss, reason = "row counts are tiny.")]
        let height = (rows + 1) as f64 * m.row_height;
        let size = Size::new(width, height);
        scene.set_size(id, size);
        if let Some(Element::Block(block)) = scene.payload_mut(id) {
            block.row_breaks = rows;
        }

        if size != old_size || rows != old_rows {
            // Size changes climb one level per layout; the parent's render
            // recurses back through this node and stops once sizes settle.
            if let Some(parent) = scene.parent_of(id)
                && matches!(scene.payload(parent), Some(Element::Block(_)))
            {
                tracing::trace!(block = ?id, ?parent, "size changed, relaying out parent");
                scene.render(parent, self);
            }
        }
    }
}
