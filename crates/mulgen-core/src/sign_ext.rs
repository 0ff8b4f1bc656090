//! Sign-extension policies for the digit rows.
//!
//! A digit row is a `Wm`-bit pattern at column `ik` whose value continues
//! upward with an extension bit `s_i`, plus a pending +1 when the digit is
//! negative. Replicating `s_i` to the product width keeps every row exact but
//! fills the matrix with sign columns. The alternatives all rest on the same
//! identity, `-s * 2^a = !s * 2^a - 2^a` (mod 2^P): trade the replicated sign
//! for one inverted bit per row plus a compile-time constant, then choose
//! where the constant lives.
//!
//! * `Brute` replicates every `s_i` and gives the last +1 its own row.
//! * `StopBits` puts one `!s_i` per row and gathers the constant (and the
//!   last +1) into a separate correction row.
//! * `Compact` spreads the constant's one-bits across the digit rows, so no
//!   extra row exists. Square operands only.
//! * `CompactRect` folds the whole constant into row 0's tail, which works
//!   for any operand shape. The last +1 is pre-added into the last row's
//!   pattern in both compact forms.

use crate::matrix::{product_mask, PartialProductMatrix, RowKind, Term, TermKind};
use mulgen_wire::{WireGraph, WireId};

/// One digit row before its extension is materialized.
#[derive(Debug)]
pub(crate) struct RowSeed {
    /// Pattern bits, LSB at `shift`.
    pub body: Vec<WireId>,
    /// Extension bit of the row value.
    pub sign: WireId,
    /// Pending +1 of a negative digit, weighted at `shift`.
    pub negate: WireId,
    /// Column of the pattern LSB, `i * k`.
    pub shift: usize,
}

impl RowSeed {
    /// First column above the pattern.
    fn tail(&self) -> usize {
        self.shift + self.body.len()
    }
}

pub(crate) fn brute(g: &mut WireGraph, m: &mut PartialProductMatrix, seeds: Vec<RowSeed>, k: usize) {
    let p = m.width();
    for (i, seed) in seeds.iter().enumerate() {
        let mut terms = base_terms(g, &seeds, i, k);
        for col in seed.tail()..p {
            terms.push(Term::sign(col, seed.sign));
        }
        m.push_row(RowKind::Digit(i), terms);
    }
    if let Some(last) = seeds.last() {
        m.push_row(RowKind::Negate, vec![Term::carry(last.shift, last.negate)]);
    }
}

pub(crate) fn stop_bits(
    g: &mut WireGraph,
    m: &mut PartialProductMatrix,
    seeds: Vec<RowSeed>,
    k: usize,
) {
    let p = m.width();
    let mut constant: u128 = 0;
    for (i, seed) in seeds.iter().enumerate() {
        let mut terms = base_terms(g, &seeds, i, k);
        let a = seed.tail();
        if a < p {
            let q = g.not(seed.sign);
            terms.push(Term::sign(a, q));
            constant = constant.wrapping_sub(1u128 << a) & product_mask(p);
        }
        m.push_row(RowKind::Digit(i), terms);
    }

    let mut terms = Vec::new();
    if let Some(last) = seeds.last() {
        fold_wire(g, &mut constant, &mut terms, last.shift, last.negate, TermKind::Carry, p);
    }
    push_constant_bits(g, &mut terms, constant, p);
    m.push_row(RowKind::Correction, terms);
}

pub(crate) fn compact(
    g: &mut WireGraph,
    m: &mut PartialProductMatrix,
    seeds: Vec<RowSeed>,
    k: usize,
) {
    let p = m.width();
    let seeds = preadd_last_negate(g, seeds);
    for (i, seed) in seeds.iter().enumerate() {
        let mut terms = base_terms(g, &seeds, i, k);
        let a = seed.tail();
        if i == 0 {
            for j in 0..k {
                terms.push(Term::sign(a + j, seed.sign));
            }
            let q = g.not(seed.sign);
            terms.push(Term::sign(a + k, q));
        } else if a < p {
            let q = g.not(seed.sign);
            terms.push(Term::sign(a, q));
            let one = g.one();
            for j in 1..k {
                terms.push(Term::constant(a + j, one));
            }
        }
        m.push_row(RowKind::Digit(i), terms);
    }
}

pub(crate) fn compact_rect(
    g: &mut WireGraph,
    m: &mut PartialProductMatrix,
    seeds: Vec<RowSeed>,
    k: usize,
) {
    let p = m.width();
    let seeds = preadd_last_negate(g, seeds);

    let mut constant: u128 = 0;
    for seed in &seeds {
        if seed.tail() < p {
            constant = constant.wrapping_sub(1u128 << seed.tail()) & product_mask(p);
        }
    }

    for (i, seed) in seeds.iter().enumerate() {
        let mut terms = base_terms(g, &seeds, i, k);
        let a = seed.tail();
        if i == 0 {
            let q = g.not(seed.sign);
            fold_wire(g, &mut constant, &mut terms, a, q, TermKind::Sign, p);
            push_constant_bits(g, &mut terms, constant, p);
        } else if a < p {
            let q = g.not(seed.sign);
            terms.push(Term::sign(a, q));
        }
        m.push_row(RowKind::Digit(i), terms);
    }
}

/// Negate prefix of the previous digit plus this digit's pattern. The +1 of
/// digit i-1 has weight `2^((i-1)k)`, so it rides at the front of row i with
/// explicit zeros up to this row's pattern.
fn base_terms(g: &mut WireGraph, seeds: &[RowSeed], i: usize, k: usize) -> Vec<Term> {
    let mut terms = Vec::new();
    if i > 0 {
        let prev = &seeds[i - 1];
        terms.push(Term::carry(prev.shift, prev.negate));
        let zero = g.zero();
        for j in 1..k {
            terms.push(Term::constant(prev.shift + j, zero));
        }
    }
    let seed = &seeds[i];
    for (j, w) in seed.body.iter().enumerate() {
        terms.push(Term::body(seed.shift + j, *w));
    }
    terms
}

/// Adds the last digit's +1 into its own pattern so no extra term is left.
/// A single-bit ripple: sum = b ^ c, next carry = b & c. When the pattern
/// wraps (all ones plus one) the multiple was zero, the stale sign flips
/// with the final carry, and the row reads as exactly zero.
fn preadd_last_negate(g: &mut WireGraph, mut seeds: Vec<RowSeed>) -> Vec<RowSeed> {
    if let Some(last) = seeds.last_mut() {
        let mut carry = last.negate;
        for bit in last.body.iter_mut() {
            let (sum, c) = g.half_adder(*bit, carry);
            *bit = sum;
            carry = c;
        }
        last.sign = g.xor(last.sign, carry);
        last.negate = g.zero();
    }
    seeds
}

/// Adds a single runtime bit at `start` into a constant: while the constant
/// holds a one the sum bit is the inverted wire and the carry is the wire
/// itself, so the wire slides up to the first zero. Past `width` it vanishes.
pub(crate) fn fold_wire(
    g: &mut WireGraph,
    constant: &mut u128,
    terms: &mut Vec<Term>,
    start: usize,
    wire: WireId,
    kind: TermKind,
    width: usize,
) {
    let mut col = start;
    if col < width && (*constant >> col) & 1 == 1 {
        let inv = g.not(wire);
        while col < width && (*constant >> col) & 1 == 1 {
            *constant &= !(1u128 << col);
            terms.push(Term { column: col, wire: inv, kind });
            col += 1;
        }
    }
    if col < width {
        terms.push(Term { column: col, wire, kind });
    }
}

fn push_constant_bits(g: &mut WireGraph, terms: &mut Vec<Term>, constant: u128, width: usize) {
    let one = g.one();
    for col in 0..width {
        if (constant >> col) & 1 == 1 {
            terms.push(Term::constant(col, one));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mulgen_wire::Sim;

    #[test]
    fn test_fold_wire_lands_on_clear_bit() {
        let mut g = WireGraph::new();
        let (_, bits) = g.add_input("w", 1);
        let mut constant: u128 = 0b0110_0000;
        let mut terms = Vec::new();
        fold_wire(&mut g, &mut constant, &mut terms, 5, bits[0], TermKind::Carry, 8);

        // ones at 5 and 6 consumed, wire lands at 7
        assert_eq!(constant, 0);
        assert_eq!(terms.len(), 3);
        assert_eq!(terms.iter().map(|t| t.column).collect::<Vec<_>>(), vec![5, 6, 7]);

        let mut sim = Sim::new(&g);
        for w in [0u128, 1] {
            sim.set_by_name("w", w);
            sim.settle();
            let total: u128 = terms
                .iter()
                .map(|t| (sim.value(t.wire) as u128) << t.column)
                .sum();
            assert_eq!(total, (0b0110_0000 + (w << 5)) & 0xff, "w={w}");
        }
    }

    #[test]
    fn test_fold_wire_on_clear_start_is_direct() {
        let mut g = WireGraph::new();
        let (_, bits) = g.add_input("w", 1);
        let mut constant: u128 = 0b0110_0000;
        let mut terms = Vec::new();
        fold_wire(&mut g, &mut constant, &mut terms, 2, bits[0], TermKind::Carry, 8);
        assert_eq!(constant, 0b0110_0000);
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].column, 2);
        assert_eq!(terms[0].wire, bits[0]);
    }

    #[test]
    fn test_fold_wire_drops_past_width() {
        let mut g = WireGraph::new();
        let (_, bits) = g.add_input("w", 1);
        let mut constant: u128 = 0b1100_0000;
        let mut terms = Vec::new();
        fold_wire(&mut g, &mut constant, &mut terms, 6, bits[0], TermKind::Carry, 8);
        // both ones consumed, carry out of width 8 disappears
        assert_eq!(constant, 0);
        assert_eq!(terms.len(), 2);
        assert_eq!(terms.iter().map(|t| t.column).collect::<Vec<_>>(), vec![6, 7]);
    }
}
