// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Editor configuration: layout metrics, drop behavior, and text measurement.

use kurbo::Rect;
use understory_grammar::LiteralKind;

/// Fixed layout dimensions, in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Metrics {
    /// Height of one block row.
    pub row_height: f64,
    /// Margin after each token and inline input.
    pub spacing: f64,
    /// Width of one indent.
    pub tab_width: f64,
    /// Width of an empty slot.
    pub hole_width: f64,
    /// Width of a `char` input.
    pub char_input_width: f64,
    /// Width of `number` and `string` inputs.
    pub input_width: f64,
    /// A dragged block snaps to a hole closer than this.
    pub snap_threshold: f64,
}

impl Metrics {
    /// Width of an inline input of the given kind.
    pub fn literal_width(&self, kind: LiteralKind) -> f64 {
        match kind {
            LiteralKind::Char => self.char_input_width,
            LiteralKind::Number | LiteralKind::String => self.input_width,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            row_height: 25.0,
            spacing: 5.0,
            tab_width: 30.0,
            hole_width: 25.0,
            char_input_width: 25.0,
            input_width: 50.0,
            snap_threshold: 20.0,
        }
    }
}

/// Configuration of an [`Editor`](crate::Editor).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditorConfig {
    /// Layout dimensions.
    pub metrics: Metrics,
    /// Blocks released here without a drop target are discarded.
    ///
    /// Host UIs typically pass the bounds of their palette. `None` never discards.
    pub discard_region: Option<Rect>,
}

/// Measures the advance width of token text.
pub trait TextMeasure {
    /// Width of `text` when drawn as a block token.
    fn text_width(&self, text: &str) -> f64;
}

impl<F: Fn(&str) -> f64> TextMeasure for F {
    fn text_width(&self, text: &str) -> f64 {
        self(text)
    }
}

/// Measures every character with the same advance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedAdvance(pub f64);

impl Default for FixedAdvance {
    fn default() -> Self {
        Self(7.0)
    }
}

impl TextMeasure for FixedAdvance {
    fn text_width(&self, text: &str) -> f64 {
        #[allow(
            clippy::cast_precision_loss,
            reason = "token text is far shorter than 2^52 characters."
        )]
        let chars = text.chars().count() as f64;
        chars * self.0
    }
}
