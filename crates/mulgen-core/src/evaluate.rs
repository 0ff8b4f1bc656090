//! Decoding and rendering of generated structures.
//!
//! Everything here reads a settled simulation and reduces wires back to
//! numbers, mod 2^P. The rendered table is part of the crate's contract:
//! one header line, one line per row with its glyph cells MSB first and its
//! decoded contribution, and a footer with the raw total and its signed
//! decode. Glyphs: pattern and constant bits print `0`/`1`, sign bits
//! `s`/`S`, negate carries `c`/`C`, absent columns `.`.

use crate::compressor::ColumnCompressor;
use crate::generator::ProductMeta;
use crate::matrix::{product_mask, PartialProductMatrix, Term, TermKind};
use mulgen_wire::{BitVector, Sim, Signedness};

/// Reference product of two operand bit patterns: interprets each pattern
/// per its signedness, multiplies, reduces mod 2^(wx+wy), and maps into the
/// signed range when either operand is signed.
pub fn model_product(x: u128, wx: usize, signed_x: bool, y: u128, wy: usize, signed_y: bool) -> i128 {
    let interp = |bits: u128, w: usize, signed: bool| -> i128 {
        let bits = bits & product_mask(w);
        if signed && (bits >> (w - 1)) & 1 == 1 {
            bits as i128 - (1i128 << w)
        } else {
            bits as i128
        }
    };
    let p = wx + wy;
    let raw = (interp(x, wx, signed_x).wrapping_mul(interp(y, wy, signed_y)) as u128)
        & product_mask(p);
    if (signed_x || signed_y) && (raw >> (p - 1)) & 1 == 1 {
        raw as i128 - (1i128 << p)
    } else {
        raw as i128
    }
}

pub struct Evaluator {
    meta: ProductMeta,
}

impl Evaluator {
    pub fn new(meta: ProductMeta) -> Self {
        Evaluator { meta }
    }

    pub fn meta(&self) -> &ProductMeta {
        &self.meta
    }

    fn mask(&self) -> u128 {
        product_mask(self.meta.product_width)
    }

    /// True when the product decodes as two's complement: either operand
    /// signed, with dynamic selects read from the simulation.
    pub fn result_signed(&self, sim: &Sim) -> bool {
        let resolve = |s: Signedness| match s {
            Signedness::Static(b) => b,
            Signedness::Dynamic(sel) => sim.value(sel),
        };
        resolve(self.meta.x_signedness) || resolve(self.meta.y_signedness)
    }

    /// Maps a raw mod-2^P total into the result range.
    pub fn decode_signed(&self, sim: &Sim, raw: u128) -> i128 {
        let p = self.meta.product_width;
        let raw = raw & self.mask();
        if self.result_signed(sim) && (raw >> (p - 1)) & 1 == 1 {
            raw as i128 - (1i128 << p)
        } else {
            raw as i128
        }
    }

    pub fn decode_terms(&self, sim: &Sim, terms: &[Term]) -> u128 {
        terms
            .iter()
            .map(|t| (sim.value(t.wire) as u128) << t.column)
            .sum()
    }

    pub fn decode_matrix(&self, sim: &Sim, matrix: &PartialProductMatrix) -> u128 {
        self.decode_terms(sim, matrix.terms()) & self.mask()
    }

    pub fn decode_columns(&self, sim: &Sim, comp: &ColumnCompressor) -> u128 {
        comp.wires()
            .into_iter()
            .fold(0u128, |acc, (c, w)| {
                acc.wrapping_add((sim.value(w) as u128) << c)
            })
            & self.mask()
    }

    pub fn decode_rows(&self, sim: &Sim, rows: &(BitVector, BitVector)) -> u128 {
        sim.read(&rows.0).wrapping_add(sim.read(&rows.1)) & self.mask()
    }

    fn header(&self) -> String {
        format!(
            "radix={} ext={} {}x{} prod={}\n",
            self.meta.radix,
            self.meta.extension,
            self.meta.multiplicand_width,
            self.meta.multiplier_width,
            self.meta.product_width
        )
    }

    fn footer(&self, sim: &Sim, total: u128) -> String {
        format!("total={} decode={}\n", total, self.decode_signed(sim, total))
    }

    fn cells(&self, sim: &Sim, terms: &[Term]) -> String {
        let mut glyphs = vec!['.'; self.meta.product_width];
        for t in terms {
            debug_assert_eq!(glyphs[t.column], '.', "two terms in one cell");
            let v = sim.value(t.wire);
            glyphs[t.column] = match (t.kind, v) {
                (TermKind::Body | TermKind::Const, false) => '0',
                (TermKind::Body | TermKind::Const, true) => '1',
                (TermKind::Sign, false) => 's',
                (TermKind::Sign, true) => 'S',
                (TermKind::Carry, false) => 'c',
                (TermKind::Carry, true) => 'C',
            };
        }
        let strs: Vec<String> = glyphs.iter().rev().map(|c| c.to_string()).collect();
        strs.join(" ")
    }

    /// Column-aligned table of the matrix at the current input values.
    pub fn render_matrix(&self, sim: &Sim, matrix: &PartialProductMatrix) -> String {
        let mut out = self.header();
        let mut total = 0u128;
        for row in matrix.rows() {
            let terms = matrix.row_terms(row);
            let value = self.decode_terms(sim, terms);
            total = total.wrapping_add(value) & self.mask();
            out.push_str(&format!(
                "{:<7}{}  = {}\n",
                row.kind.label(),
                self.cells(sim, terms),
                value
            ));
        }
        out.push_str(&self.footer(sim, total));
        out
    }

    /// Table of the two carry-save output rows.
    pub fn render_rows(&self, sim: &Sim, rows: &(BitVector, BitVector)) -> String {
        let mut out = self.header();
        let mut total = 0u128;
        for (i, row) in [&rows.0, &rows.1].into_iter().enumerate() {
            let value = sim.read(row) & self.mask();
            total = total.wrapping_add(value) & self.mask();
            let strs: Vec<String> = row
                .bits()
                .iter()
                .rev()
                .map(|w| if sim.value(*w) { "1".to_string() } else { "0".to_string() })
                .collect();
            out.push_str(&format!("{:<7}{}  = {}\n", format!("out{i}"), strs.join(" "), value));
        }
        out.push_str(&self.footer(sim, total));
        out
    }
}
