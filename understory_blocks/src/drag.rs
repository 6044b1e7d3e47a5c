// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag and drop of blocks between scripts and slots.
//!
//! A drag moves one block, together with everything nested in it, through
//! three phases:
//!
//! 1. **Pick-up** ([`Editor::pick_up`], or [`Editor::pointer_down`] on a
//!    block): the block leaves its container. A block taken out of a slot
//!    leaves a fresh hole at the exact child position it occupied. The block
//!    is reparented onto the drag layer with its translation rewritten to the
//!    canvas position it had, so it does not jump on screen. Every
//!    registered hole's canvas position is snapshotted once here.
//! 2. **Tracking** ([`Editor::pointer_move`]): the block follows the pointer,
//!    keeping the grab offset. The nearest eligible hole closer than
//!    [`Metrics::snap_threshold`](crate::Metrics::snap_threshold) becomes the
//!    candidate and is flagged [`NodeFlags::HIGHLIGHTED`].
//! 3. **Release** ([`Editor::release`] / [`Editor::pointer_up`]): the block
//!    replaces the candidate hole, is discarded if it lies in the configured
//!    discard region, or otherwise becomes a new top-level script.
//!
//! A hole is *eligible* when it is part of the document, is not inside the
//! dragged block, and its slot accepts the dragged block's nonterminal.
//!
//! [`Editor::abort_drag`] ends a drag without losing the block: it drops into
//! the candidate if there is one and otherwise puts the block back where it
//! came from.
//!
//! ## Usage
//!
//! ```rust
//! use kurbo::Point;
//! use understory_blocks::{DropOutcome, Editor, EditorConfig};
//! use understory_grammar::Grammar;
//!
//! let mut g = Grammar::builder();
//! let expr = g.declare("expr");
//! let neg = g.production(expr, "neg").token("-").slot(expr).finish();
//! let zero = g.production(expr, "zero").token("0").finish();
//! let mut editor = Editor::new(g.build(), EditorConfig::default());
//!
//! let target = editor.new_block(neg).unwrap();
//! editor.add_script(target, Point::new(100.0, 100.0)).unwrap();
//! let block = editor.new_block(zero).unwrap();
//! editor.add_script(block, Point::new(300.0, 300.0)).unwrap();
//!
//! // Grab the block near its corner and drop it next to the hole.
//! let hole = editor.hole_at(target, 0).unwrap();
//! let hole_pos = editor.canvas_position(hole).unwrap();
//! editor.pointer_down(Point::new(302.0, 302.0)).unwrap();
//! let outcome = editor.pointer_up(hole_pos + kurbo::Vec2::new(5.0, 5.0)).unwrap();
//!
//! assert_eq!(outcome, DropOutcome::Filled { owner: target, slot: 0 });
//! assert_eq!(editor.block(target).unwrap().args(), &[Some(block)]);
//! ```

use alloc::vec::Vec;
use kurbo::{Point, Vec2};
use understory_scene::{NodeFlags, NodeId, QueryFilter};

use crate::editor::Editor;
use crate::element::{Element, Hole};
use crate::error::{Desync, EditError};

/// Whether a drag is active.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DragState {
    /// No drag session.
    Idle,
    /// A block is being dragged.
    Dragging,
}

/// Where a dragged block was picked up from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Origin {
    /// A top-level script at `position` (script-layer space).
    Script {
        /// Translation the script had.
        position: Vec2,
        /// The script drawn right after it, if any.
        next: Option<NodeId>,
    },
    /// Slot `slot` of `owner`, now held by `hole`.
    Slot {
        /// The block whose slot was vacated.
        owner: NodeId,
        /// Index of the vacated slot.
        slot: usize,
        /// Hole created in its place.
        hole: NodeId,
    },
}

/// A hole as seen at pick-up time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HoleTarget {
    /// The hole.
    pub hole: NodeId,
    /// Its canvas position when the drag started.
    pub position: Point,
    /// Whether the dragged block may be dropped into it.
    pub eligible: bool,
}

/// State of one pick-up-to-release interaction.
#[derive(Clone, Debug)]
pub struct DragSession {
    dragged: NodeId,
    pointer_anchor: Point,
    start: Point,
    candidate: Option<NodeId>,
    origin: Origin,
    targets: Vec<HoleTarget>,
}

impl DragSession {
    /// The block being dragged.
    pub fn dragged(&self) -> NodeId {
        self.dragged
    }

    /// Pointer position at pick-up.
    pub fn pointer_anchor(&self) -> Point {
        self.pointer_anchor
    }

    /// Canvas position of the block at pick-up.
    pub fn start(&self) -> Point {
        self.start
    }

    /// Hole the block would drop into if released now.
    pub fn candidate(&self) -> Option<NodeId> {
        self.candidate
    }

    /// Where the block came from.
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Hole snapshot taken at pick-up, in hole id order.
    pub fn targets(&self) -> &[HoleTarget] {
        &self.targets
    }
}

/// How a drag ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    /// The block now fills `slot` of `owner`.
    Filled {
        /// Block that received the dragged block.
        owner: NodeId,
        /// Slot index filled.
        slot: usize,
    },
    /// The block became a top-level script at its drop position.
    Script,
    /// The block was released over the discard region and destroyed.
    Discarded,
    /// The drag was aborted and the block went back to where it came from.
    Returned,
}

impl Editor {
    /// Whether a drag is in progress.
    pub fn drag_state(&self) -> DragState {
        match self.drag {
            Some(_) => DragState::Dragging,
            None => DragState::Idle,
        }
    }

    /// The active drag session, if any.
    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Route a pointer press at `point` (canvas space).
    ///
    /// Presses on an inline input are left to the input. Otherwise the
    /// innermost block under the pointer is picked up; text and holes are not
    /// pickable themselves, so a press on them lands on their block. Returns
    /// the picked-up block, or `None` if nothing was picked up.
    pub fn pointer_down(&mut self, point: Point) -> Result<Option<NodeId>, EditError> {
        if self.drag.is_some() {
            return Err(EditError::DragInProgress);
        }
        let filter = QueryFilter::new().visible().pickable();
        let Some(hit) = self.scene.hit_test_point(self.canvas, point, filter) else {
            return Ok(None);
        };
        match self.scene.payload(hit.node) {
            Some(Element::Block(_)) => self.pick_up(hit.node, point).map(Some),
            Some(Element::Input(_)) => {
                tracing::trace!(input = ?hit.node, "press swallowed by inline input");
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Start dragging `block`, grabbed at `pointer` (canvas space).
    ///
    /// The block must be a top-level script or sit in a slot of a block that
    /// is part of the document. Returns `block`.
    pub fn pick_up(&mut self, block: NodeId, pointer: Point) -> Result<NodeId, EditError> {
        if self.drag.is_some() {
            return Err(EditError::DragInProgress);
        }
        self.expect_block(block)?;
        let Some(parent) = self
            .scene
            .parent_of(block)
            .filter(|_| self.scene.is_in_subtree(block, self.script_layer))
        else {
            return Err(EditError::NotAttached(block));
        };

        let start = self.canvas_offset(block).to_point();
        let origin = if parent == self.script_layer {
            let position = self.scene.translation(block).unwrap_or_default();
            let next = self
                .scene
                .children(parent)
                .skip_while(|&c| c != block)
                .nth(1);
            self.scene.detach_child(parent, block);
            Origin::Script { position, next }
        } else {
            let slot = self
                .expect_block(parent)?
                .args
                .iter()
                .position(|&a| a == Some(block))
                .ok_or(Desync::ChildOrder {
                    block: parent,
                    position: self.scene.child_position(block).unwrap_or_default(),
                })?;
            let hole = self.vacate_slot(parent, slot, block);
            self.render(parent);
            Origin::Slot {
                owner: parent,
                slot,
                hole,
            }
        };

        let drag_offset = self.canvas_offset(self.drag_layer);
        self.scene.set_translation(block, start.to_vec2() - drag_offset);
        self.scene.attach_child(self.drag_layer, block);
        self.render(block);

        let targets = self.snapshot_holes(block);
        tracing::debug!(
            ?block,
            ?origin,
            holes = targets.len(),
            eligible = targets.iter().filter(|t| t.eligible).count(),
            "picked up block"
        );
        self.drag = Some(DragSession {
            dragged: block,
            pointer_anchor: pointer,
            start,
            candidate: None,
            origin,
            targets,
        });
        Ok(block)
    }

    /// Move the dragged block with the pointer and update the candidate hole.
    pub fn pointer_move(&mut self, point: Point) -> Result<Option<NodeId>, EditError> {
        let Some(session) = self.drag.as_ref() else {
            return Err(EditError::NoActiveDrag);
        };
        let dragged = session.dragged;
        let position = session.start + (point - session.pointer_anchor);
        let threshold = self.config.metrics.snap_threshold;
        let nearest = session
            .targets
            .iter()
            .filter(|t| t.eligible)
            .map(|t| (t.hole, t.position.distance(position)))
            .filter(|&(_, d)| d < threshold)
            .fold(None, |best: Option<(NodeId, f64)>, (hole, d)| match best {
                Some((_, best_d)) if best_d <= d => best,
                _ => Some((hole, d)),
            })
            .map(|(hole, _)| hole);
        let previous = session.candidate;

        let drag_offset = self.canvas_offset(self.drag_layer);
        self.scene
            .set_translation(dragged, position.to_vec2() - drag_offset);
        if nearest != previous {
            tracing::trace!(?dragged, ?previous, candidate = ?nearest, "candidate changed");
            if let Some(prev) = previous {
                self.set_highlight(prev, false);
            }
            if let Some(next) = nearest {
                self.set_highlight(next, true);
            }
            if let Some(session) = self.drag.as_mut() {
                session.candidate = nearest;
            }
        }
        self.render(dragged);
        Ok(nearest)
    }

    /// Move to `point`, then release.
    pub fn pointer_up(&mut self, point: Point) -> Result<DropOutcome, EditError> {
        self.pointer_move(point)?;
        self.release()
    }

    /// Abort on pointer cancellation.
    pub fn pointer_cancel(&mut self) -> Result<DropOutcome, EditError> {
        self.abort_drag()
    }

    /// Drop the dragged block where it is.
    ///
    /// Fills the candidate hole if there is one; otherwise discards the
    /// block if its position is inside the discard region, and makes it a
    /// top-level script if not.
    pub fn release(&mut self) -> Result<DropOutcome, EditError> {
        let session = self.end_session()?;
        let dragged = session.dragged;
        if let Some(outcome) = self.drop_into_candidate(&session) {
            return Ok(outcome);
        }
        let position = self.canvas_offset(dragged).to_point();
        if self
            .config
            .discard_region
            .is_some_and(|region| region.contains(position))
        {
            tracing::debug!(block = ?dragged, ?position, "discarded block");
            self.destroy(dragged);
            return Ok(DropOutcome::Discarded);
        }
        self.drop_as_script(dragged, position);
        tracing::debug!(block = ?dragged, ?position, "dropped block as script");
        Ok(DropOutcome::Script)
    }

    /// End the drag without losing the block.
    ///
    /// With a candidate this behaves like [`Editor::release`]. Otherwise the
    /// block goes back into the hole it vacated, or back to its place among
    /// the scripts.
    pub fn abort_drag(&mut self) -> Result<DropOutcome, EditError> {
        let session = self.end_session()?;
        let dragged = session.dragged;
        if let Some(outcome) = self.drop_into_candidate(&session) {
            return Ok(outcome);
        }
        match session.origin {
            Origin::Slot { owner, slot, hole } if self.is_open(owner, slot, hole) => {
                self.scene.detach_child(self.drag_layer, dragged);
                self.place_in_hole(owner, slot, hole, dragged);
                self.render(owner);
            }
            Origin::Slot { .. } => {
                tracing::warn!(block = ?dragged, "origin slot is gone, returning block as a script");
                self.drop_as_script(dragged, session.start);
            }
            Origin::Script { position, next } => {
                self.scene.detach_child(self.drag_layer, dragged);
                self.scene.set_translation(dragged, position);
                match next.filter(|&n| self.scene.parent_of(n) == Some(self.script_layer)) {
                    Some(next) => self
                        .scene
                        .insert_child_before(self.script_layer, dragged, next),
                    None => self.scene.attach_child(self.script_layer, dragged),
                }
                self.render(dragged);
            }
        }
        tracing::debug!(block = ?dragged, origin = ?session.origin, "drag aborted");
        Ok(DropOutcome::Returned)
    }

    // --- internals ---

    fn end_session(&mut self) -> Result<DragSession, EditError> {
        let session = self.drag.take().ok_or(EditError::NoActiveDrag)?;
        for target in &session.targets {
            if self.scene.is_alive(target.hole) {
                self.set_highlight(target.hole, false);
            }
        }
        Ok(session)
    }

    /// Fill the session's candidate, if it is still a valid target.
    fn drop_into_candidate(&mut self, session: &DragSession) -> Option<DropOutcome> {
        let hole = session.candidate?;
        let dragged = session.dragged;
        let target = self.validate_target(hole, dragged);
        debug_assert!(
            target.is_some(),
            "hole registry out of sync with the tree at drop time: {hole:?}"
        );
        let Some((owner, slot)) = target else {
            tracing::warn!(?hole, block = ?dragged, "drop target out of sync, ignoring it");
            return None;
        };
        self.scene.detach_child(self.drag_layer, dragged);
        self.place_in_hole(owner, slot, hole, dragged);
        self.render(owner);
        tracing::debug!(block = ?dragged, ?owner, slot, "dropped block into hole");
        Some(DropOutcome::Filled { owner, slot })
    }

    /// The owner and slot of `hole` if `dragged` can go there right now.
    fn validate_target(&self, hole: NodeId, dragged: NodeId) -> Option<(NodeId, usize)> {
        let &Hole { owner, slot } = self.hole(hole)?;
        if !self.is_open(owner, slot, hole)
            || !self.scene.is_in_subtree(owner, self.script_layer)
            || self.scene.is_in_subtree(owner, dragged)
        {
            return None;
        }
        let expected = self.slot_nonterminal(owner, slot).ok()?;
        let found = self.block(dragged)?.nonterminal;
        (expected == found).then_some((owner, slot))
    }

    /// `hole` is registered and currently stands in for the empty `slot` of `owner`.
    fn is_open(&self, owner: NodeId, slot: usize, hole: NodeId) -> bool {
        self.holes.contains(hole)
            && self.scene.parent_of(hole) == Some(owner)
            && self
                .hole(hole)
                .is_some_and(|h| h.owner == owner && h.slot == slot)
            && self
                .block(owner)
                .is_some_and(|b| b.args.get(slot) == Some(&None))
    }

    fn drop_as_script(&mut self, dragged: NodeId, position: Point) {
        if self.scene.parent_of(dragged).is_some() {
            self.scene.detach_child(self.drag_layer, dragged);
        }
        let script_offset = self.canvas_offset(self.script_layer);
        self.scene
            .set_translation(dragged, position.to_vec2() - script_offset);
        self.scene.attach_child(self.script_layer, dragged);
        self.render(dragged);
    }

    fn snapshot_holes(&self, dragged: NodeId) -> Vec<HoleTarget> {
        let nonterminal = self.block(dragged).map(|b| b.nonterminal);
        self.holes
            .sorted()
            .into_iter()
            .map(|hole| {
                let eligible = self.scene.is_in_subtree(hole, self.script_layer)
                    && !self.scene.is_in_subtree(hole, dragged)
                    && self.hole(hole).is_some_and(|h| {
                        self.slot_nonterminal(h.owner, h.slot).ok() == nonterminal
                    });
                HoleTarget {
                    hole,
                    position: self.canvas_offset(hole).to_point(),
                    eligible,
                }
            })
            .collect()
    }

    fn canvas_offset(&self, id: NodeId) -> Vec2 {
        self.scene.offset_to(id, Some(self.canvas))
    }

    fn set_highlight(&mut self, hole: NodeId, on: bool) {
        if let Some(mut flags) = self.scene.flags(hole) {
            flags.set(NodeFlags::HIGHLIGHTED, on);
            self.scene.set_flags(hole, flags);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::tests::{Lang, editor};
    use alloc::vec;

    /// An `if` script at (300, 100) with its `then` slot filled.
    fn if_script(editor: &mut Editor, lang: &Lang) -> (NodeId, NodeId) {
        let if_ = editor.new_block(lang.if_).unwrap();
        let cons = editor.new_block(lang.true_).unwrap();
        editor.fill_slot(if_, 1, cons).unwrap();
        editor.add_script(if_, Point::new(300.0, 100.0)).unwrap();
        (if_, cons)
    }

    fn hole_pos(editor: &Editor, owner: NodeId, slot: usize) -> Point {
        let hole = editor.hole_at(owner, slot).unwrap();
        editor.canvas_position(hole).unwrap()
    }

    #[test]
    fn drop_near_hole_fills_it() {
        let (mut editor, lang) = editor();
        let (if_, _) = if_script(&mut editor, &lang);
        let alt_hole = editor.hole_at(if_, 2).unwrap();
        let target = hole_pos(&editor, if_, 2);

        let block = editor.new_block(lang.true_).unwrap();
        editor.add_script(block, Point::new(500.0, 400.0)).unwrap();
        editor.pick_up(block, Point::new(505.0, 405.0)).unwrap();
        assert_eq!(editor.drag_state(), DragState::Dragging);

        let near = target + Vec2::new(5.0 + 12.0, 5.0 + 9.0);
        assert_eq!(editor.pointer_move(near).unwrap(), Some(alt_hole));
        assert!(
            editor
                .scene()
                .flags(alt_hole)
                .unwrap()
                .contains(NodeFlags::HIGHLIGHTED)
        );

        let outcome = editor.release().unwrap();
        assert_eq!(outcome, DropOutcome::Filled { owner: if_, slot: 2 });
        assert_eq!(editor.block(if_).unwrap().args()[2], Some(block));
        assert!(!editor.holes().contains(alt_hole));
        assert!(!editor.scene().is_alive(alt_hole));
        assert_eq!(editor.drag_state(), DragState::Idle);
        assert_eq!(editor.scripts().collect::<Vec<_>>(), vec![if_]);
        editor.check_invariants().unwrap();
    }

    #[test]
    fn drop_far_from_holes_makes_a_script() {
        let (mut editor, lang) = editor();
        let (if_, cons) = if_script(&mut editor, &lang);
        let position = editor.scene().child_position(cons);
        let grab = editor.canvas_position(cons).unwrap();

        editor.pick_up(cons, grab).unwrap();
        let vacated = editor.hole_at(if_, 1).unwrap();
        assert_eq!(editor.scene().child_position(vacated), position);
        assert!(editor.holes().contains(vacated));

        let drop = Point::new(700.0, 500.0);
        assert_eq!(editor.pointer_up(drop).unwrap(), DropOutcome::Script);
        assert_eq!(editor.canvas_position(cons), Some(drop));
        assert_eq!(editor.scene().parent_of(cons), Some(editor.script_layer()));
        assert_eq!(editor.block(if_).unwrap().args(), &[None, None, None]);
        assert_eq!(editor.scene().child_position(vacated), position);
        editor.check_invariants().unwrap();
    }

    #[test]
    fn pick_up_keeps_the_block_in_place() {
        let (mut editor, lang) = editor();
        let (_, cons) = if_script(&mut editor, &lang);
        let before = editor.canvas_position(cons).unwrap();
        editor.pick_up(cons, before).unwrap();
        assert_eq!(editor.scene().parent_of(cons), Some(editor.drag_layer()));
        assert_eq!(editor.canvas_position(cons), Some(before));
        assert_eq!(editor.drag_session().unwrap().start(), before);
        editor.abort_drag().unwrap();
    }

    #[test]
    fn detach_and_reattach_restores_the_tree() {
        let (mut editor, lang) = editor();
        let (if_, cons) = if_script(&mut editor, &lang);
        let args = editor.block(if_).unwrap().args().to_vec();
        let order: Vec<NodeId> = editor.scene().children(if_).collect();
        let grab = editor.canvas_position(cons).unwrap();

        editor.pick_up(cons, grab).unwrap();
        let vacated = editor.hole_at(if_, 1).unwrap();
        assert_eq!(editor.pointer_move(grab).unwrap(), Some(vacated));
        assert_eq!(
            editor.release().unwrap(),
            DropOutcome::Filled { owner: if_, slot: 1 }
        );

        assert_eq!(editor.block(if_).unwrap().args(), &args[..]);
        assert_eq!(editor.scene().children(if_).collect::<Vec<_>>(), order);
        assert!(!editor.scene().is_alive(vacated));
        editor.check_invariants().unwrap();
    }

    #[test]
    fn own_descendant_holes_are_never_candidates() {
        let (mut editor, lang) = editor();
        let (if_, _) = if_script(&mut editor, &lang);
        let own = editor.hole_at(if_, 0).unwrap();
        let grab = Point::new(301.0, 101.0);
        editor.pick_up(if_, grab).unwrap();

        let session = editor.drag_session().unwrap();
        assert!(session.targets().iter().all(|t| !t.eligible));
        // Drag so the block sits exactly where its own hole was.
        let own_pos = editor.canvas_position(own).unwrap();
        assert_eq!(editor.pointer_move(own_pos).unwrap(), None);
        assert_eq!(editor.pointer_move(grab).unwrap(), None);
        assert_eq!(editor.release().unwrap(), DropOutcome::Script);
        editor.check_invariants().unwrap();
    }

    #[test]
    fn incompatible_holes_are_never_candidates() {
        let (mut editor, lang) = editor();
        let let_ = editor.new_block(lang.let_).unwrap();
        editor.add_script(let_, Point::new(300.0, 100.0)).unwrap();
        let pattern_hole = editor.hole_at(let_, 0).unwrap();
        let expr_hole = editor.hole_at(let_, 1).unwrap();

        let block = editor.new_block(lang.true_).unwrap();
        editor.add_script(block, Point::new(600.0, 600.0)).unwrap();
        editor.pick_up(block, Point::new(600.0, 600.0)).unwrap();
        let eligible: Vec<NodeId> = editor
            .drag_session()
            .unwrap()
            .targets()
            .iter()
            .filter(|t| t.eligible)
            .map(|t| t.hole)
            .collect();
        assert_eq!(eligible, vec![expr_hole]);
        let on_pattern = editor.canvas_position(pattern_hole).unwrap();
        assert_eq!(editor.pointer_move(on_pattern).unwrap(), None);
        editor.abort_drag().unwrap();
    }

    #[test]
    fn candidate_must_be_within_snap_threshold() {
        let (mut editor, lang) = editor();
        let (if_, _) = if_script(&mut editor, &lang);
        let hole = editor.hole_at(if_, 2).unwrap();
        let target = editor.canvas_position(hole).unwrap();
        let block = editor.new_block(lang.true_).unwrap();
        editor.add_script(block, Point::new(600.0, 600.0)).unwrap();
        editor.pick_up(block, Point::new(600.0, 600.0)).unwrap();

        let threshold = editor.config().metrics.snap_threshold;
        assert_eq!(
            editor.pointer_move(target + Vec2::new(threshold, 0.0)).unwrap(),
            None
        );
        assert_eq!(
            editor
                .pointer_move(target + Vec2::new(threshold - 0.5, 0.0))
                .unwrap(),
            Some(hole)
        );
        // Moving away clears the highlight.
        assert_eq!(editor.pointer_move(Point::new(900.0, 900.0)).unwrap(), None);
        assert!(
            !editor
                .scene()
                .flags(hole)
                .unwrap()
                .contains(NodeFlags::HIGHLIGHTED)
        );
        editor.abort_drag().unwrap();
    }

    #[test]
    fn release_over_discard_region_destroys_subtree() {
        let (mut editor, lang) = editor();
        let (if_, cons) = if_script(&mut editor, &lang);
        let grab = Point::new(301.0, 101.0);
        editor.pick_up(if_, grab).unwrap();
        assert_eq!(
            editor.pointer_up(Point::new(51.0, 51.0)).unwrap(),
            DropOutcome::Discarded
        );
        assert!(!editor.scene().is_alive(if_));
        assert!(!editor.scene().is_alive(cons));
        assert!(editor.holes().is_empty(), "discarded holes are unregistered");
        assert_eq!(editor.scripts().count(), 0);
        editor.check_invariants().unwrap();
    }

    #[test]
    fn abort_returns_block_to_its_slot() {
        let (mut editor, lang) = editor();
        let (if_, cons) = if_script(&mut editor, &lang);
        let position = editor.scene().child_position(cons);
        editor.pick_up(cons, Point::new(0.0, 0.0)).unwrap();
        editor.pointer_move(Point::new(800.0, 800.0)).unwrap();
        assert_eq!(editor.pointer_cancel().unwrap(), DropOutcome::Returned);
        assert_eq!(editor.block(if_).unwrap().args()[1], Some(cons));
        assert_eq!(editor.scene().child_position(cons), position);
        editor.check_invariants().unwrap();
    }

    #[test]
    fn abort_returns_script_to_its_position() {
        let (mut editor, lang) = editor();
        let (if_, _) = if_script(&mut editor, &lang);
        editor.pick_up(if_, Point::new(310.0, 110.0)).unwrap();
        editor.pointer_move(Point::new(50.0, 50.0)).unwrap();
        assert_eq!(editor.abort_drag().unwrap(), DropOutcome::Returned);
        assert_eq!(editor.canvas_position(if_), Some(Point::new(300.0, 100.0)));
        assert_eq!(editor.scripts().collect::<Vec<_>>(), vec![if_]);
    }

    #[test]
    fn abort_with_candidate_drops_into_it() {
        let (mut editor, lang) = editor();
        let (if_, _) = if_script(&mut editor, &lang);
        let target = hole_pos(&editor, if_, 0);
        let block = editor.new_block(lang.true_).unwrap();
        editor.add_script(block, Point::new(600.0, 600.0)).unwrap();
        editor.pick_up(block, Point::new(600.0, 600.0)).unwrap();
        editor.pointer_move(target).unwrap();
        assert_eq!(
            editor.abort_drag().unwrap(),
            DropOutcome::Filled { owner: if_, slot: 0 }
        );
    }

    #[test]
    fn second_pick_up_is_rejected() {
        let (mut editor, lang) = editor();
        let (if_, cons) = if_script(&mut editor, &lang);
        editor.pick_up(cons, Point::ORIGIN).unwrap();
        assert_eq!(
            editor.pick_up(if_, Point::ORIGIN),
            Err(EditError::DragInProgress)
        );
        assert_eq!(
            editor.pointer_down(Point::new(301.0, 101.0)),
            Err(EditError::DragInProgress)
        );
        assert_eq!(editor.clear_slot(if_, 0), Err(EditError::DragInProgress));
        assert_eq!(editor.drag_session().unwrap().dragged(), cons);
        editor.abort_drag().unwrap();
        assert_eq!(editor.release(), Err(EditError::NoActiveDrag));
        assert_eq!(editor.pointer_move(Point::ORIGIN), Err(EditError::NoActiveDrag));
    }

    #[test]
    fn only_document_blocks_can_be_picked_up() {
        let (mut editor, lang) = editor();
        let loose = editor.new_block(lang.true_).unwrap();
        assert_eq!(
            editor.pick_up(loose, Point::ORIGIN),
            Err(EditError::NotAttached(loose))
        );
        let hole_owner = editor.new_block(lang.apply).unwrap();
        let hole = editor.hole_at(hole_owner, 0).unwrap();
        assert_eq!(
            editor.pick_up(hole, Point::ORIGIN),
            Err(EditError::NotABlock(hole))
        );
    }

    #[test]
    fn pointer_down_routes_to_enclosing_block() {
        let (mut editor, lang) = editor();
        let (if_, cons) = if_script(&mut editor, &lang);
        // The "if" token is at the block's origin; tokens are not pickable.
        assert_eq!(
            editor.pointer_down(Point::new(302.0, 102.0)).unwrap(),
            Some(if_)
        );
        editor.abort_drag().unwrap();

        // A press on the nested block picks up the nested block.
        let inner = editor.canvas_position(cons).unwrap() + Vec2::new(2.0, 2.0);
        assert_eq!(editor.pointer_down(inner).unwrap(), Some(cons));
        editor.abort_drag().unwrap();

        // Empty canvas.
        assert_eq!(editor.pointer_down(Point::new(1500.0, 1500.0)).unwrap(), None);
    }

    #[test]
    fn script_edits_wait_for_the_drop() {
        let (mut editor, lang) = editor();
        let (if_, _) = if_script(&mut editor, &lang);
        let target = hole_pos(&editor, if_, 2);
        let block = editor.new_block(lang.true_).unwrap();
        editor.add_script(block, Point::new(600.0, 600.0)).unwrap();
        let loose = editor.new_block(lang.true_).unwrap();
        let doc = editor.export_scripts().unwrap();

        editor.pick_up(block, Point::new(600.0, 600.0)).unwrap();
        editor.pointer_move(target).unwrap();
        assert_eq!(editor.remove_script(if_), Err(EditError::DragInProgress));
        assert_eq!(
            editor.add_script(loose, Point::new(400.0, 400.0)),
            Err(EditError::DragInProgress)
        );
        let live = editor.scene().ids().count();
        assert_eq!(editor.import_document(&doc), Err(EditError::DragInProgress));
        assert_eq!(editor.scene().ids().count(), live);

        assert_eq!(
            editor.release().unwrap(),
            DropOutcome::Filled { owner: if_, slot: 2 }
        );
        assert_eq!(editor.scripts().collect::<Vec<_>>(), vec![if_]);
        assert!(editor.canvas_position(block).is_some());
        editor.check_invariants().unwrap();
    }

    #[test]
    fn aborted_script_keeps_its_drawing_order() {
        let (mut editor, lang) = editor();
        let mut scripts = vec![];
        for x in [300.0, 500.0, 700.0] {
            let b = editor.new_block(lang.true_).unwrap();
            editor.add_script(b, Point::new(x, 900.0)).unwrap();
            scripts.push(b);
        }

        // Middle script goes back between its neighbors.
        editor.pick_up(scripts[1], Point::new(501.0, 901.0)).unwrap();
        editor.pointer_move(Point::new(1200.0, 1200.0)).unwrap();
        assert_eq!(editor.abort_drag().unwrap(), DropOutcome::Returned);
        assert_eq!(editor.scripts().collect::<Vec<_>>(), scripts);
        assert_eq!(
            editor.scene().translation(scripts[1]),
            Some(Vec2::new(500.0, 900.0))
        );

        // Last script stays last.
        editor.pick_up(scripts[2], Point::new(701.0, 901.0)).unwrap();
        assert_eq!(editor.abort_drag().unwrap(), DropOutcome::Returned);
        assert_eq!(editor.scripts().collect::<Vec<_>>(), scripts);
    }

    #[test]
    fn pointer_down_on_input_is_swallowed() {
        let (mut editor, lang) = editor();
        let num = editor.new_block(lang.num).unwrap();
        editor.add_script(num, Point::new(300.0, 300.0)).unwrap();
        assert_eq!(editor.pointer_down(Point::new(310.0, 310.0)).unwrap(), None);
        assert_eq!(editor.drag_state(), DragState::Idle);
    }

    #[test]
    fn nested_pick_up_shrinks_the_owner() {
        let (mut editor, lang) = editor();
        let pair = editor.new_block(lang.pair).unwrap();
        let tall = editor.new_block(lang.tall).unwrap();
        editor.fill_slot(pair, 1, tall).unwrap();
        editor.add_script(pair, Point::new(300.0, 0.0)).unwrap();
        assert_eq!(editor.block(pair).unwrap().row_breaks(), 3);

        let grab = editor.canvas_position(tall).unwrap();
        editor.pick_up(tall, grab).unwrap();
        assert_eq!(editor.block(pair).unwrap().row_breaks(), 1);
        editor.abort_drag().unwrap();
        assert_eq!(editor.block(pair).unwrap().row_breaks(), 3);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "out of sync")]
    fn desynced_drop_target_is_fatal_in_debug() {
        let (mut editor, lang) = editor();
        let (if_, _) = if_script(&mut editor, &lang);
        let hole = editor.hole_at(if_, 2).unwrap();
        let target = editor.canvas_position(hole).unwrap();
        let block = editor.new_block(lang.true_).unwrap();
        editor.add_script(block, Point::new(600.0, 600.0)).unwrap();
        editor.pick_up(block, Point::new(600.0, 600.0)).unwrap();
        editor.pointer_move(target).unwrap();
        editor.holes.unregister(hole);
        let _ = editor.release();
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn desynced_drop_target_is_ignored_in_release() {
        let (mut editor, lang) = editor();
        let (if_, _) = if_script(&mut editor, &lang);
        let hole = editor.hole_at(if_, 2).unwrap();
        let target = editor.canvas_position(hole).unwrap();
        let block = editor.new_block(lang.true_).unwrap();
        editor.add_script(block, Point::new(600.0, 600.0)).unwrap();
        editor.pick_up(block, Point::new(600.0, 600.0)).unwrap();
        editor.pointer_move(target).unwrap();
        editor.holes.unregister(hole);
        assert_eq!(editor.release().unwrap(), DropOutcome::Script);
        assert_eq!(editor.block(if_).unwrap().args()[2], None);
    }
}
