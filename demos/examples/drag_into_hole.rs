// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag a block from the palette into a hole, then pull it back out.
//!
//! Loads a small grammar from its JSON table, builds an `if` script, and
//! replays a pointer gesture, printing the layout and the exported tree
//! after each step.
//!
//! Run:
//! - `cargo run -p understory_demos --example drag_into_hole`

use kurbo::{Point, Rect, Vec2};
use understory_blocks::{Editor, EditorConfig, Element};
use understory_grammar::{Grammar, GrammarSpec};
use understory_scene::NodeId;

const GRAMMAR: &str = r#"{
  "nonterminals": [
    { "id": "expr", "productions": [
      { "id": "if", "symbols": [
        { "type": "token", "text": "if" },
        { "type": "nonterminal", "nonterminal": "expr" },
        { "type": "newline" },
        { "type": "tab" },
        { "type": "token", "text": "then" },
        { "type": "nonterminal", "nonterminal": "expr" },
        { "type": "newline" },
        { "type": "tab" },
        { "type": "token", "text": "else" },
        { "type": "nonterminal", "nonterminal": "expr" } ] },
      { "id": "true", "symbols": [ { "type": "token", "text": "true" } ] },
      { "id": "num", "symbols": [ { "type": "number" } ] } ] } ] }"#;

/// Palette sidebar: anything released here is thrown away.
const PALETTE: Rect = Rect::new(0.0, 0.0, 150.0, 600.0);

fn print_tree(editor: &Editor, id: NodeId, depth: usize) {
    let scene = editor.scene();
    let pos = scene.translation(id).unwrap_or_default();
    let size = scene.size(id).unwrap_or_default();
    let label = match scene.payload(id) {
        Some(Element::Layer(layer)) => format!("{layer:?} layer"),
        Some(Element::Block(b)) => {
            let name = editor
                .grammar()
                .production(b.production())
                .map_or("?", |p| p.name());
            format!("block `{name}` rows+{}", b.row_breaks())
        }
        Some(Element::Hole(h)) => format!("hole for slot {}", h.slot()),
        Some(Element::Text(t)) => format!("{:?}", t.text()),
        Some(Element::Input(i)) => format!("{:?} input {:?}", i.kind(), i.value()),
        None => "<dead>".to_string(),
    };
    println!(
        "{:indent$}{label} at ({}, {}) size {}x{}",
        "",
        pos.x,
        pos.y,
        size.width,
        size.height,
        indent = depth * 2
    );
    for child in scene.children(id) {
        print_tree(editor, child, depth + 1);
    }
}

fn main() {
    let spec: GrammarSpec = serde_json::from_str(GRAMMAR).expect("grammar JSON");
    let (grammar, issues) = Grammar::load(&spec).expect("valid grammar");
    assert!(issues.is_empty());
    let expr = grammar.nonterminal_by_name("expr").unwrap();
    let if_ = grammar.production_by_name(expr, "if").unwrap();
    let true_ = grammar.production_by_name(expr, "true").unwrap();

    let config = EditorConfig {
        discard_region: Some(PALETTE),
        ..EditorConfig::default()
    };
    let mut editor = Editor::new(grammar, config);

    let script = editor.new_block(if_).unwrap();
    editor.add_script(script, Point::new(200.0, 40.0)).unwrap();
    let fresh = editor.new_block(true_).unwrap();
    editor.add_script(fresh, Point::new(20.0, 20.0)).unwrap();

    println!("== initial ==");
    print_tree(&editor, editor.canvas(), 0);

    // Grab the palette block and drop it onto the `then` hole.
    let then_hole = editor.hole_at(script, 1).unwrap();
    let target = editor.canvas_position(then_hole).unwrap();
    let picked = editor.pointer_down(Point::new(22.0, 22.0)).unwrap();
    println!("\npicked up {picked:?}");
    let outcome = editor
        .pointer_up(target + Vec2::new(2.0, 2.0))
        .unwrap();
    println!("dropped: {outcome:?}");
    println!("\n== after drop ==");
    print_tree(&editor, editor.canvas(), 0);
    println!(
        "\nexport: {}",
        serde_json::to_string(&editor.export(script).unwrap()).unwrap()
    );

    // Pull it back out and let go in the palette.
    let grab = editor.canvas_position(fresh).unwrap() + Vec2::new(1.0, 1.0);
    editor.pointer_down(grab).unwrap();
    let outcome = editor.pointer_up(Point::new(40.0, 300.0)).unwrap();
    println!("\nreleased over palette: {outcome:?}");
    println!(
        "export: {}",
        serde_json::to_string(&editor.export(script).unwrap()).unwrap()
    );
    editor.check_invariants().unwrap();
    println!("damage since start: {:?}", editor.take_damage().union_rect());
}
