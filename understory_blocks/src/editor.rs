// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The editing surface: scripts, blocks, holes, and the invariants tying them together.

use alloc::{boxed::Box, string::String, sync::Arc, vec::Vec};
use kurbo::{Point, Size};
use understory_grammar::{Grammar, LiteralKind, NonterminalId, ProductionId, Symbol};
use understory_scene::{NodeFlags, NodeId, Scene};

use crate::config::{EditorConfig, FixedAdvance, TextMeasure};
use crate::drag::DragSession;
use crate::element::{Block, Element, Hole, Input, Layer, Text};
use crate::error::{Desync, EditError};
use crate::holes::HoleRegistry;
use crate::layout::BlockLayout;

/// A single editing surface over one grammar.
///
/// The editor owns a [`Scene`] whose root is a canvas with two layers: the
/// script layer holding top-level blocks, and the drag layer above it holding
/// the block currently being dragged (see [`Editor::pick_up`]). Every block
/// is owned by exactly one container at a time: a slot of another block,
/// the script layer, or the drag layer.
///
/// ```rust
/// use kurbo::Point;
/// use understory_blocks::{Editor, EditorConfig};
/// use understory_grammar::Grammar;
///
/// let mut g = Grammar::builder();
/// let expr = g.declare("expr");
/// let one = g.production(expr, "one").token("1").finish();
/// let add = g.production(expr, "add").slot(expr).token("+").slot(expr).finish();
/// let mut editor = Editor::new(g.build(), EditorConfig::default());
///
/// let sum = editor.new_block(add).unwrap();
/// let lhs = editor.new_block(one).unwrap();
/// editor.fill_slot(sum, 0, lhs).unwrap();
/// editor.add_script(sum, Point::new(300.0, 40.0)).unwrap();
///
/// assert_eq!(editor.block(sum).unwrap().args(), &[Some(lhs), None]);
/// assert_eq!(editor.holes().len(), 1);
/// editor.check_invariants().unwrap();
/// ```
pub struct Editor {
    pub(crate) grammar: Arc<Grammar>,
    pub(crate) config: EditorConfig,
    measure: Box<dyn TextMeasure>,
    pub(crate) scene: Scene<Element>,
    pub(crate) canvas: NodeId,
    pub(crate) script_layer: NodeId,
    pub(crate) drag_layer: NodeId,
    pub(crate) holes: HoleRegistry,
    pub(crate) drag: Option<DragSession>,
}

impl core::fmt::Debug for Editor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Editor")
            .field("config", &self.config)
            .field("scene", &self.scene)
            .field("scripts", &self.scene.child_count(self.script_layer))
            .field("holes", &self.holes.len())
            .field("drag", &self.drag)
            .finish_non_exhaustive()
    }
}

impl Editor {
    /// Create an empty editor measuring text with [`FixedAdvance`].
    pub fn new(grammar: impl Into<Arc<Grammar>>, config: EditorConfig) -> Self {
        Self::with_measure(grammar, config, FixedAdvance::default())
    }

    /// Create an empty editor with a custom text measurer.
    pub fn with_measure(
        grammar: impl Into<Arc<Grammar>>,
        config: EditorConfig,
        measure: impl TextMeasure + 'static,
    ) -> Self {
        let mut scene = Scene::new();
        let canvas = scene.insert(None, Element::Layer(Layer::Canvas));
        // The drag layer is attached last so it draws above every script.
        let script_layer = scene.insert(Some(canvas), Element::Layer(Layer::Scripts));
        let drag_layer = scene.insert(Some(canvas), Element::Layer(Layer::Drag));
        for layer in [canvas, script_layer, drag_layer] {
            scene.set_flags(layer, NodeFlags::VISIBLE);
        }
        Self {
            grammar: grammar.into(),
            config,
            measure: Box::new(measure),
            scene,
            canvas,
            script_layer,
            drag_layer,
            holes: HoleRegistry::default(),
            drag: None,
        }
    }

    /// The grammar blocks are instantiated from.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// The configuration this editor was created with.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Read-only access to the scene, for drawing and hit testing.
    pub fn scene(&self) -> &Scene<Element> {
        &self.scene
    }

    /// Drain the damage recorded by renders since the last call.
    pub fn take_damage(&mut self) -> understory_scene::Damage {
        self.scene.take_damage()
    }

    /// Root of the editing surface.
    pub fn canvas(&self) -> NodeId {
        self.canvas
    }

    /// Container of top-level scripts.
    pub fn script_layer(&self) -> NodeId {
        self.script_layer
    }

    /// Container of the block being dragged.
    pub fn drag_layer(&self) -> NodeId {
        self.drag_layer
    }

    /// The live-hole registry.
    pub fn holes(&self) -> &HoleRegistry {
        &self.holes
    }

    /// Top-level scripts, in drawing order.
    pub fn scripts(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.scene.children(self.script_layer)
    }

    /// The block payload of `id`.
    pub fn block(&self, id: NodeId) -> Option<&Block> {
        self.scene.payload(id).and_then(Element::as_block)
    }

    /// The hole payload of `id`.
    pub fn hole(&self, id: NodeId) -> Option<&Hole> {
        self.scene.payload(id).and_then(Element::as_hole)
    }

    /// The hole currently standing in for slot `slot` of `block`.
    pub fn hole_at(&self, block: NodeId, slot: usize) -> Option<NodeId> {
        self.scene.children(block).find(|&c| {
            self.hole(c)
                .is_some_and(|h| h.owner == block && h.slot == slot)
        })
    }

    /// Position of `id` on the canvas: the sum of translations up to the canvas.
    pub fn canvas_position(&self, id: NodeId) -> Option<Point> {
        if !self.scene.is_in_subtree(id, self.canvas) {
            return None;
        }
        Some(self.scene.offset_to(id, Some(self.canvas)).to_point())
    }

    /// Instantiate a detached block of `production` with every slot empty.
    pub fn new_block(&mut self, production: ProductionId) -> Result<NodeId, EditError> {
        let slots = self
            .grammar
            .production(production)
            .ok_or(EditError::UnknownProduction(production))?
            .slot_count();
        self.new_block_with_args(production, &alloc::vec![None; slots])
    }

    /// Instantiate a detached block of `production` with the given arguments.
    ///
    /// Every supplied argument must be a detached block whose nonterminal
    /// matches its slot.
    pub fn new_block_with_args(
        &mut self,
        production: ProductionId,
        args: &[Option<NodeId>],
    ) -> Result<NodeId, EditError> {
        let grammar = Arc::clone(&self.grammar);
        let prod = grammar
            .production(production)
            .ok_or(EditError::UnknownProduction(production))?;
        if args.len() != prod.slot_count() {
            return Err(EditError::ArgumentCount {
                expected: prod.slot_count(),
                actual: args.len(),
            });
        }
        for (i, (arg, expected)) in args.iter().zip(prod.slots()).enumerate() {
            let Some(arg) = *arg else { continue };
            self.check_placeable(arg, expected)?;
            if args[..i].contains(&Some(arg)) {
                return Err(EditError::AlreadyAttached(arg));
            }
        }

        let block = self.scene.insert(
            None,
            Element::Block(Block {
                nonterminal: prod.nonterminal(),
                production,
                args: args.iter().copied().collect(),
                row_breaks: 0,
            }),
        );
        let row_height = self.config.metrics.row_height;
        let mut slot = 0;
        for symbol in prod.symbols() {
            match symbol {
                Symbol::Token(text) => {
                    let width = self.measure.text_width(text);
                    let child = self.scene.insert(
                        Some(block),
                        Element::Text(Text { text: text.clone() }),
                    );
                    self.scene.set_size(child, Size::new(width, row_height));
                    self.scene.set_flags(child, NodeFlags::VISIBLE);
                }
                Symbol::Slot(_) => {
                    let child = match args[slot] {
                        Some(arg) => arg,
                        None => self.spawn_hole(block, slot),
                    };
                    self.scene.attach_child(block, child);
                    slot += 1;
                }
                Symbol::InlineLiteral(kind) => {
                    let child = self.scene.insert(
                        Some(block),
                        Element::Input(Input {
                            kind: *kind,
                            value: String::new(),
                        }),
                    );
                    let width = self.config.metrics.literal_width(*kind);
                    self.scene.set_size(child, Size::new(width, row_height));
                }
                Symbol::RowBreak | Symbol::Indent => {}
            }
        }
        self.render(block);
        Ok(block)
    }

    /// Add a detached block as a top-level script at `position` (script-layer space).
    pub fn add_script(&mut self, block: NodeId, position: Point) -> Result<(), EditError> {
        self.ensure_idle()?;
        self.expect_block(block)?;
        if self.scene.parent_of(block).is_some() {
            return Err(EditError::AlreadyAttached(block));
        }
        self.scene.set_translation(block, position.to_vec2());
        self.scene.attach_child(self.script_layer, block);
        self.render(block);
        Ok(())
    }

    /// Detach a top-level script and return it.
    pub fn remove_script(&mut self, block: NodeId) -> Result<NodeId, EditError> {
        self.ensure_idle()?;
        self.expect_block(block)?;
        if self.scene.parent_of(block) != Some(self.script_layer) {
            return Err(EditError::NotAScript(block));
        }
        Ok(self.scene.detach_child(self.script_layer, block))
    }

    /// Destroy a detached block and everything nested in it.
    pub fn delete_block(&mut self, block: NodeId) -> Result<(), EditError> {
        self.ensure_idle()?;
        self.expect_block(block)?;
        if self.scene.parent_of(block).is_some() {
            return Err(EditError::AlreadyAttached(block));
        }
        self.destroy(block);
        Ok(())
    }

    // Script, slot, and deletion edits change which holes are in the document,
    // which belongs to the drag session while one is active.

    /// Put a detached block into the empty slot `slot` of `owner`.
    pub fn fill_slot(&mut self, owner: NodeId, slot: usize, block: NodeId) -> Result<(), EditError> {
        self.ensure_idle()?;
        let expected = self.slot_nonterminal(owner, slot)?;
        if self.expect_block(owner)?.args[slot].is_some() {
            return Err(EditError::SlotFilled { block: owner, slot });
        }
        self.check_placeable(block, expected)?;
        if self.scene.is_in_subtree(owner, block) {
            return Err(EditError::Cycle { block, owner });
        }
        let hole = self
            .hole_at(owner, slot)
            .ok_or(Desync::Slot { block: owner, slot })?;
        self.place_in_hole(owner, slot, hole, block);
        self.render(owner);
        Ok(())
    }

    /// Take the block out of slot `slot` of `owner`, leaving a hole, and return it detached.
    pub fn clear_slot(&mut self, owner: NodeId, slot: usize) -> Result<NodeId, EditError> {
        self.ensure_idle()?;
        self.slot_nonterminal(owner, slot)?;
        let Some(block) = self.expect_block(owner)?.args[slot] else {
            return Err(EditError::SlotEmpty { block: owner, slot });
        };
        self.vacate_slot(owner, slot, block);
        self.render(owner);
        Ok(block)
    }

    /// Current content of an inline input.
    pub fn literal(&self, input: NodeId) -> Option<&str> {
        match self.scene.payload(input) {
            Some(Element::Input(i)) => Some(&i.value),
            _ => None,
        }
    }

    /// Replace the content of an inline input.
    ///
    /// `char` inputs hold at most one character and `number` inputs must
    /// parse as a number (or be empty).
    pub fn set_literal(&mut self, input: NodeId, value: &str) -> Result<(), EditError> {
        let Some(Element::Input(i)) = self.scene.payload_mut(input) else {
            return Err(EditError::NotAnInput(input));
        };
        if !accepts_literal(i.kind, value) {
            return Err(EditError::InvalidLiteral {
                kind: i.kind,
                value: value.into(),
            });
        }
        i.value = value.into();
        Ok(())
    }

    /// Re-render the subtree rooted at `id`, relaying out blocks as needed.
    ///
    /// Damage accumulates across renders until the host drains it with
    /// [`Editor::take_damage`].
    pub fn render(&mut self, id: NodeId) {
        let mut layout = BlockLayout::new(&self.grammar, &self.config.metrics);
        self.scene.render(id, &mut layout);
    }

    /// Verify that the hole registry and every block's children agree with
    /// the blocks' argument lists.
    ///
    /// Checks, for every live block, that its children follow its
    /// production's child-producing symbols in order, that each slot holds
    /// exactly its argument block or a hole recording that slot, and that the
    /// registry contains exactly the holes of empty slots.
    pub fn check_invariants(&self) -> Result<(), Desync> {
        for id in self.scene.ids() {
            if self.block(id).is_some() {
                self.check_block(id)?;
            }
        }
        for hole in self.holes.sorted() {
            let Some(h) = self.hole(hole) else {
                return Err(Desync::Stray(hole));
            };
            let empty = self
                .block(h.owner)
                .is_some_and(|b| b.args.get(h.slot) == Some(&None));
            if !empty || self.scene.parent_of(hole) != Some(h.owner) {
                return Err(Desync::Stray(hole));
            }
        }
        Ok(())
    }

    // --- internals ---

    /// Checks the children of one block against its production.
    fn check_block(&self, id: NodeId) -> Result<(), Desync> {
        let Some(block) = self.block(id) else {
            return Ok(());
        };
        let Some(prod) = self.grammar.production(block.production) else {
            return Ok(());
        };
        let expected = prod.child_count();
        let actual = self.scene.child_count(id);
        if expected != actual || block.args.len() != prod.slot_count() {
            return Err(Desync::ChildCount {
                block: id,
                expected,
                actual,
            });
        }
        let mut slot = 0;
        let symbols = prod.symbols().iter().filter(|s| s.produces_child());
        for (position, (symbol, child)) in symbols.zip(self.scene.children(id)).enumerate() {
            let ok = match (symbol, self.scene.payload(child)) {
                (Symbol::Token(text), Some(Element::Text(t))) => t.text == *text,
                (Symbol::InlineLiteral(kind), Some(Element::Input(i))) => i.kind == *kind,
                (Symbol::Slot(_), Some(Element::Block(_))) => {
                    let ok = block.args[slot] == Some(child);
                    slot += 1;
                    ok
                }
                (Symbol::Slot(_), Some(Element::Hole(h))) => {
                    if block.args[slot].is_some() || h.owner != id || h.slot != slot {
                        return Err(Desync::Slot { block: id, slot });
                    }
                    if !self.holes.contains(child) {
                        return Err(Desync::Unregistered {
                            hole: child,
                            owner: id,
                            slot,
                        });
                    }
                    slot += 1;
                    true
                }
                _ => false,
            };
            if !ok {
                return Err(Desync::ChildOrder {
                    block: id,
                    position,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn ensure_idle(&self) -> Result<(), EditError> {
        match self.drag {
            Some(_) => Err(EditError::DragInProgress),
            None => Ok(()),
        }
    }

    pub(crate) fn expect_block(&self, id: NodeId) -> Result<&Block, EditError> {
        match self.scene.payload(id) {
            Some(Element::Block(b)) => Ok(b),
            Some(_) => Err(EditError::NotABlock(id)),
            None => Err(EditError::Stale(id)),
        }
    }

    /// Nonterminal accepted by `slot` of `owner`.
    pub(crate) fn slot_nonterminal(&self, owner: NodeId, slot: usize) -> Result<NonterminalId, EditError> {
        let block = self.expect_block(owner)?;
        self.grammar
            .production(block.production)
            .and_then(|p| p.slot(slot))
            .ok_or(EditError::SlotOutOfRange { block: owner, slot })
    }

    /// `block` must be a detached block of nonterminal `expected`.
    fn check_placeable(&self, block: NodeId, expected: NonterminalId) -> Result<(), EditError> {
        let found = self.expect_block(block)?.nonterminal;
        if self.scene.parent_of(block).is_some() {
            return Err(EditError::AlreadyAttached(block));
        }
        if found != expected {
            return Err(EditError::Incompatible { expected, found });
        }
        Ok(())
    }

    /// Create and register a detached hole for `slot` of `owner`.
    fn spawn_hole(&mut self, owner: NodeId, slot: usize) -> NodeId {
        let hole = self.scene.insert(None, Element::Hole(Hole { owner, slot }));
        let m = &self.config.metrics;
        self.scene
            .set_size(hole, Size::new(m.hole_width, m.row_height));
        self.scene.set_flags(hole, NodeFlags::VISIBLE);
        self.holes.register(hole);
        hole
    }

    /// Swap `hole` (standing in for `slot` of `owner`) for the detached `block`.
    ///
    /// Preconditions are checked by callers.
    pub(crate) fn place_in_hole(&mut self, owner: NodeId, slot: usize, hole: NodeId, block: NodeId) {
        self.scene.replace_child(owner, hole, block);
        self.scene.remove(hole);
        self.holes.unregister(hole);
        if let Some(b) = self.scene.payload_mut(owner).and_then(Element::as_block_mut) {
            b.args[slot] = Some(block);
        }
    }

    /// Swap the block in `slot` of `owner` for a fresh hole at the same
    /// position. Returns the hole; `block` is left detached.
    pub(crate) fn vacate_slot(&mut self, owner: NodeId, slot: usize, block: NodeId) -> NodeId {
        let hole = self.spawn_hole(owner, slot);
        self.scene.replace_child(owner, block, hole);
        if let Some(b) = self.scene.payload_mut(owner).and_then(Element::as_block_mut) {
            b.args[slot] = None;
        }
        hole
    }

    /// Remove a detached subtree and unregister its holes.
    pub(crate) fn destroy(&mut self, root: NodeId) {
        let holes: Vec<NodeId> = self
            .scene
            .subtree(root)
            .filter(|&id| self.hole(id).is_some())
            .collect();
        for hole in holes {
            self.holes.unregister(hole);
        }
        self.scene.remove(root);
    }
}

/// Whether an input of `kind` may hold `value`.
pub(crate) fn accepts_literal(kind: LiteralKind, value: &str) -> bool {
    match kind {
        LiteralKind::Char => value.chars().count() <= 1,
        LiteralKind::Number => value.is_empty() || value.parse::<f64>().is_ok(),
        LiteralKind::String => true,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloc::vec;
    use kurbo::Vec2;

    /// A small expression grammar shared by the editor tests.
    pub(crate) struct Lang {
        pub(crate) expr: NonterminalId,
        pub(crate) pattern: NonterminalId,
        pub(crate) if_: ProductionId,
        pub(crate) true_: ProductionId,
        pub(crate) apply: ProductionId,
        pub(crate) pair: ProductionId,
        pub(crate) tall: ProductionId,
        pub(crate) num: ProductionId,
        pub(crate) var: ProductionId,
        pub(crate) let_: ProductionId,
    }

    pub(crate) fn lang() -> (Grammar, Lang) {
        let mut g = Grammar::builder();
        let expr = g.declare("expr");
        let pattern = g.declare("pattern");
        let if_ = g
            .production(expr, "if")
            .token("if")
            .slot(expr)
            .token("then")
            .slot(expr)
            .token("else")
            .slot(expr)
            .finish();
        let true_ = g.production(expr, "true").token("true").finish();
        let apply = g.production(expr, "apply").slot(expr).slot(expr).finish();
        let pair = g
            .production(expr, "pair")
            .slot(expr)
            .row_break()
            .indent()
            .slot(expr)
            .finish();
        let tall = g
            .production(expr, "tall")
            .token("a")
            .row_break()
            .token("b")
            .row_break()
            .token("c")
            .finish();
        let num = g
            .production(expr, "num")
            .literal(LiteralKind::Number)
            .finish();
        let let_ = g
            .production(expr, "let")
            .token("let")
            .slot(pattern)
            .token("=")
            .slot(expr)
            .finish();
        let var = g
            .production(pattern, "var")
            .literal(LiteralKind::String)
            .finish();
        (
            g.build(),
            Lang {
                expr,
                pattern,
                if_,
                true_,
                apply,
                pair,
                tall,
                num,
                var,
                let_,
            },
        )
    }

    pub(crate) fn editor() -> (Editor, Lang) {
        let (grammar, lang) = lang();
        let config = EditorConfig {
            discard_region: Some(kurbo::Rect::new(0.0, 0.0, 200.0, 2000.0)),
            ..EditorConfig::default()
        };
        (Editor::new(grammar, config), lang)
    }

    #[test]
    fn new_block_creates_one_child_per_drawable_symbol() {
        let (mut editor, lang) = editor();
        let if_ = editor.new_block(lang.if_).unwrap();
        assert_eq!(editor.scene().child_count(if_), 6);
        assert_eq!(editor.block(if_).unwrap().args(), &[None, None, None]);
        assert_eq!(editor.holes().len(), 3);
        for slot in 0..3 {
            let hole = editor.hole_at(if_, slot).unwrap();
            assert!(editor.holes().contains(hole));
            assert_eq!(editor.scene().child_position(hole), Some(1 + 2 * slot));
        }
        editor.check_invariants().unwrap();
    }

    #[test]
    fn fill_and_clear_swap_holes_in_place() {
        let (mut editor, lang) = editor();
        let if_ = editor.new_block(lang.if_).unwrap();
        let t = editor.new_block(lang.true_).unwrap();
        let hole = editor.hole_at(if_, 1).unwrap();
        let pos = editor.scene().child_position(hole);

        editor.fill_slot(if_, 1, t).unwrap();
        assert!(!editor.scene().is_alive(hole));
        assert!(!editor.holes().contains(hole));
        assert_eq!(editor.scene().child_position(t), pos);
        assert_eq!(editor.block(if_).unwrap().args()[1], Some(t));
        editor.check_invariants().unwrap();

        assert_eq!(editor.clear_slot(if_, 1).unwrap(), t);
        assert_eq!(editor.scene().parent_of(t), None);
        let fresh = editor.hole_at(if_, 1).unwrap();
        assert_ne!(fresh, hole);
        assert_eq!(editor.scene().child_position(fresh), pos);
        editor.check_invariants().unwrap();
    }

    #[test]
    fn slot_edits_are_checked_before_mutation() {
        let (mut editor, lang) = editor();
        let let_ = editor.new_block(lang.let_).unwrap();
        let t = editor.new_block(lang.true_).unwrap();
        let other = editor.new_block(lang.true_).unwrap();

        assert_eq!(
            editor.fill_slot(let_, 0, t),
            Err(EditError::Incompatible {
                expected: lang.pattern,
                found: lang.expr
            })
        );
        assert_eq!(
            editor.fill_slot(let_, 2, t),
            Err(EditError::SlotOutOfRange {
                block: let_,
                slot: 2
            })
        );
        assert_eq!(
            editor.clear_slot(let_, 1),
            Err(EditError::SlotEmpty {
                block: let_,
                slot: 1
            })
        );
        editor.fill_slot(let_, 1, t).unwrap();
        assert_eq!(
            editor.fill_slot(let_, 1, other),
            Err(EditError::SlotFilled {
                block: let_,
                slot: 1
            })
        );
        let hole = editor.hole_at(let_, 0).unwrap();
        assert_eq!(editor.fill_slot(let_, 0, hole), Err(EditError::NotABlock(hole)));

        // A block cannot go inside its own descendant.
        let apply = editor.new_block(lang.apply).unwrap();
        let inner = editor.new_block(lang.apply).unwrap();
        editor.fill_slot(apply, 0, inner).unwrap();
        assert_eq!(
            editor.fill_slot(inner, 0, apply),
            Err(EditError::Cycle {
                block: apply,
                owner: inner
            })
        );
        editor.check_invariants().unwrap();
    }

    #[test]
    fn new_block_with_args_validates_arguments() {
        let (mut editor, lang) = editor();
        let t = editor.new_block(lang.true_).unwrap();
        assert_eq!(
            editor.new_block_with_args(lang.apply, &[Some(t)]),
            Err(EditError::ArgumentCount {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            editor.new_block_with_args(lang.apply, &[Some(t), Some(t)]),
            Err(EditError::AlreadyAttached(t))
        );
        let apply = editor
            .new_block_with_args(lang.apply, &[None, Some(t)])
            .unwrap();
        assert_eq!(editor.scene().parent_of(t), Some(apply));
        assert_eq!(editor.holes().len(), 1);
        editor.check_invariants().unwrap();
    }

    #[test]
    fn scripts_are_added_and_removed() {
        let (mut editor, lang) = editor();
        let t = editor.new_block(lang.true_).unwrap();
        editor.add_script(t, Point::new(250.0, 30.0)).unwrap();
        assert_eq!(editor.scripts().collect::<Vec<_>>(), vec![t]);
        assert_eq!(editor.canvas_position(t), Some(Point::new(250.0, 30.0)));
        assert_eq!(
            editor.add_script(t, Point::ORIGIN),
            Err(EditError::AlreadyAttached(t))
        );

        let apply = editor.new_block(lang.apply).unwrap();
        editor.remove_script(t).unwrap();
        editor.fill_slot(apply, 0, t).unwrap();
        assert_eq!(editor.remove_script(t), Err(EditError::NotAScript(t)));
        assert_eq!(editor.scripts().count(), 0);
    }

    #[test]
    fn delete_block_unregisters_nested_holes() {
        let (mut editor, lang) = editor();
        let apply = editor.new_block(lang.apply).unwrap();
        let inner = editor.new_block(lang.if_).unwrap();
        editor.fill_slot(apply, 1, inner).unwrap();
        assert_eq!(editor.holes().len(), 4);
        editor.delete_block(apply).unwrap();
        assert!(editor.holes().is_empty());
        assert!(!editor.scene().is_alive(inner));
        editor.check_invariants().unwrap();
    }

    #[test]
    fn literals_are_validated_by_kind() {
        let (mut editor, lang) = editor();
        let num = editor.new_block(lang.num).unwrap();
        let input = editor.scene().children(num).next().unwrap();
        editor.set_literal(input, "4.5").unwrap();
        assert_eq!(editor.literal(input), Some("4.5"));
        assert!(matches!(
            editor.set_literal(input, "four"),
            Err(EditError::InvalidLiteral { .. })
        ));
        assert_eq!(editor.literal(input), Some("4.5"));
        assert_eq!(editor.set_literal(num, "1"), Err(EditError::NotAnInput(num)));
    }

    #[test]
    fn layout_places_children_along_rows() {
        let (mut editor, lang) = editor();
        let m = editor.config().metrics;
        let let_ = editor.new_block(lang.let_).unwrap();
        let children: Vec<NodeId> = editor.scene().children(let_).collect();
        // "let" is three characters at 7px each.
        let let_w = 21.0;
        assert_eq!(editor.scene().translation(children[0]), Some(Vec2::ZERO));
        assert_eq!(
            editor.scene().translation(children[1]),
            Some(Vec2::new(let_w + m.spacing, 0.0))
        );
        let expected_width = (let_w + m.spacing) + m.hole_width + (7.0 + m.spacing) + m.hole_width;
        assert_eq!(
            editor.scene().size(let_),
            Some(Size::new(expected_width, m.row_height))
        );

        let var = editor.new_block(lang.var).unwrap();
        editor.fill_slot(let_, 0, var).unwrap();
        let grown = (let_w + m.spacing) + (m.input_width + m.spacing) + (7.0 + m.spacing) + m.hole_width;
        assert_eq!(editor.scene().size(let_).unwrap().width, grown);
    }

    #[test]
    fn layout_is_idempotent() {
        let (mut editor, lang) = editor();
        let pair = editor.new_block(lang.pair).unwrap();
        let tall = editor.new_block(lang.tall).unwrap();
        editor.fill_slot(pair, 0, tall).unwrap();
        editor.add_script(pair, Point::new(300.0, 300.0)).unwrap();

        let snapshot = |editor: &Editor| -> Vec<(NodeId, Option<Size>, Option<Vec2>)> {
            editor
                .scene()
                .subtree(editor.canvas())
                .map(|id| (id, editor.scene().size(id), editor.scene().translation(id)))
                .collect()
        };
        editor.render(editor.canvas());
        let first = snapshot(&editor);
        editor.render(editor.canvas());
        assert_eq!(first, snapshot(&editor));
        let _ = editor.take_damage();
        editor.render(editor.canvas());
        assert!(editor.take_damage().is_empty(), "no change, no damage");
    }

    #[test]
    fn row_breaks_propagate_through_nesting() {
        let (mut editor, lang) = editor();
        let m = editor.config().metrics;
        let pair = editor.new_block(lang.pair).unwrap();
        let tall = editor.new_block(lang.tall).unwrap();
        assert_eq!(editor.block(tall).unwrap().row_breaks(), 2);

        editor.fill_slot(pair, 1, tall).unwrap();
        let rows = editor.block(pair).unwrap().row_breaks();
        assert!(rows >= 1 + 2, "rows propagate upward, got {rows}");
        assert_eq!(editor.scene().size(pair).unwrap().height, 4.0 * m.row_height);
        // The second slot starts on the second row, after one indent.
        assert_eq!(
            editor.scene().translation(tall),
            Some(Vec2::new(m.tab_width, m.row_height))
        );

        // Growth cascades through more than one level.
        let outer = editor.new_block(lang.apply).unwrap();
        editor.add_script(outer, Point::new(400.0, 0.0)).unwrap();
        editor.fill_slot(outer, 0, pair).unwrap();
        assert_eq!(editor.block(outer).unwrap().row_breaks(), 3);
        let t = editor.clear_slot(pair, 1).unwrap();
        assert_eq!(editor.block(pair).unwrap().row_breaks(), 1);
        assert_eq!(editor.block(outer).unwrap().row_breaks(), 1);
        assert_eq!(editor.scene().size(outer).unwrap().height, 2.0 * m.row_height);
        editor.delete_block(t).unwrap();
        editor.check_invariants().unwrap();
    }

    #[test]
    fn invariant_checker_catches_registry_drift() {
        let (mut editor, lang) = editor();
        let if_ = editor.new_block(lang.if_).unwrap();
        editor.add_script(if_, Point::new(300.0, 0.0)).unwrap();
        let hole = editor.hole_at(if_, 2).unwrap();

        editor.holes.unregister(hole);
        assert_eq!(
            editor.check_invariants(),
            Err(Desync::Unregistered {
                hole,
                owner: if_,
                slot: 2
            })
        );
        editor.holes.register(hole);
        editor.check_invariants().unwrap();

        let stray = editor.scene.insert(None, Element::Layer(Layer::Canvas));
        editor.holes.register(stray);
        assert_eq!(editor.check_invariants(), Err(Desync::Stray(stray)));
    }

    #[test]
    fn invariant_checker_catches_child_order_drift() {
        let (mut editor, lang) = editor();
        let if_ = editor.new_block(lang.if_).unwrap();
        let first = editor.scene().children(if_).next().unwrap();
        editor.scene.detach_child(if_, first);
        editor.scene.attach_child(if_, first);
        assert!(matches!(
            editor.check_invariants(),
            Err(Desync::ChildOrder { block, position: 0 }) if block == if_
        ));
    }
}
