//! Word-level view over the wire graph.
//!
//! A [`BitVector`] is an ordered bundle of wires (LSB first) plus a
//! [`Signedness`] that says how its top bit extends. Signedness can be fixed
//! at build time or selected by a runtime wire, in which case every extension
//! bit becomes a mux and the emitted shape stays independent of the value.

use crate::wire::{WireGraph, WireId};
use serde::{Deserialize, Serialize};

/// Interpretation of a bit-vector's top end.
///
/// `Static(true)` is two's complement, `Static(false)` is unsigned, and
/// `Dynamic(sel)` picks between them with a runtime select (high = signed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signedness {
    Static(bool),
    Dynamic(WireId),
}

impl Signedness {
    /// True only for build-time two's complement; a dynamic select is not.
    pub fn is_static_signed(&self) -> bool {
        matches!(self, Signedness::Static(true))
    }
}

/// Fixed-width ordered bit sequence, LSB first. Immutable once built; every
/// operation allocates fresh wires in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitVector {
    bits: Vec<WireId>,
    signedness: Signedness,
}

impl BitVector {
    pub fn new(bits: Vec<WireId>, signedness: Signedness) -> Self {
        Self { bits, signedness }
    }

    pub fn width(&self) -> usize {
        self.bits.len()
    }

    pub fn bit(&self, i: usize) -> WireId {
        self.bits[i]
    }

    pub fn bits(&self) -> &[WireId] {
        &self.bits
    }

    pub fn msb(&self) -> WireId {
        self.bits[self.width() - 1]
    }

    pub fn signedness(&self) -> Signedness {
        self.signedness
    }

    /// Bits `lo..=hi`, keeping the signedness tag.
    pub fn slice(&self, lo: usize, hi: usize) -> BitVector {
        BitVector::new(self.bits[lo..=hi].to_vec(), self.signedness)
    }

    /// `high` lands above `self`.
    pub fn concat(&self, high: &BitVector) -> BitVector {
        let mut bits = self.bits.clone();
        bits.extend_from_slice(&high.bits);
        BitVector::new(bits, high.signedness)
    }

    /// The wire that pads this vector above its MSB: the sign bit when
    /// signed, constant zero when unsigned, a mux when runtime-selected.
    pub fn extension_bit(&self, g: &mut WireGraph) -> WireId {
        match self.signedness {
            Signedness::Static(false) => g.zero(),
            Signedness::Static(true) => self.msb(),
            Signedness::Dynamic(sel) => {
                let zero = g.zero();
                let msb = self.msb();
                g.mux(sel, zero, msb)
            }
        }
    }

    /// Widens to `width` by replicating the extension bit.
    pub fn extend_to(&self, g: &mut WireGraph, width: usize) -> BitVector {
        debug_assert!(width >= self.width());
        let ext = self.extension_bit(g);
        let mut bits = self.bits.clone();
        bits.resize(width, ext);
        BitVector::new(bits, self.signedness)
    }

    /// Logical shift left within the same width; low bits fill with zero.
    pub fn shifted_left(&self, g: &mut WireGraph, amount: usize) -> BitVector {
        let zero = g.zero();
        let width = self.width();
        let mut bits = vec![zero; width];
        for i in amount..width {
            bits[i] = self.bits[i - amount];
        }
        BitVector::new(bits, self.signedness)
    }

    /// Arithmetic shift right within the same width; top fills per signedness.
    pub fn shifted_right(&self, g: &mut WireGraph, amount: usize) -> BitVector {
        let ext = self.extension_bit(g);
        let width = self.width();
        let mut bits = vec![ext; width];
        for i in 0..width.saturating_sub(amount) {
            bits[i] = self.bits[i + amount];
        }
        BitVector::new(bits, self.signedness)
    }

    pub fn not(&self, g: &mut WireGraph) -> BitVector {
        let bits = self.bits.iter().map(|b| g.not(*b)).collect();
        BitVector::new(bits, self.signedness)
    }

    pub fn and(&self, g: &mut WireGraph, other: &BitVector) -> BitVector {
        self.zip(g, other, WireGraph::and)
    }

    pub fn or(&self, g: &mut WireGraph, other: &BitVector) -> BitVector {
        self.zip(g, other, WireGraph::or)
    }

    pub fn xor(&self, g: &mut WireGraph, other: &BitVector) -> BitVector {
        self.zip(g, other, WireGraph::xor)
    }

    fn zip(
        &self,
        g: &mut WireGraph,
        other: &BitVector,
        f: fn(&mut WireGraph, WireId, WireId) -> WireId,
    ) -> BitVector {
        debug_assert_eq!(self.width(), other.width());
        let bits = self
            .bits
            .iter()
            .zip(&other.bits)
            .map(|(a, b)| f(g, *a, *b))
            .collect();
        BitVector::new(bits, self.signedness)
    }

    /// Ripple-carry sum, same width, carry out of the top dropped.
    pub fn ripple_add(&self, g: &mut WireGraph, other: &BitVector) -> BitVector {
        debug_assert_eq!(self.width(), other.width());
        let mut carry = g.zero();
        let mut bits = Vec::with_capacity(self.width());
        for (a, b) in self.bits.iter().zip(&other.bits) {
            let (sum, c) = g.full_adder(*a, *b, carry);
            bits.push(sum);
            carry = c;
        }
        BitVector::new(bits, self.signedness)
    }

    /// Two's-complement negate (`!v + 1`), same width.
    pub fn negate(&self, g: &mut WireGraph) -> BitVector {
        let mut carry = g.one();
        let mut bits = Vec::with_capacity(self.width());
        for b in &self.bits {
            let nb = g.not(*b);
            let (sum, c) = g.half_adder(nb, carry);
            bits.push(sum);
            carry = c;
        }
        BitVector::new(bits, self.signedness)
    }

    /// Single-wire equality over all bits.
    pub fn equals(&self, g: &mut WireGraph, other: &BitVector) -> WireId {
        debug_assert_eq!(self.width(), other.width());
        let mut acc = g.one();
        for (a, b) in self.bits.iter().zip(&other.bits) {
            let diff = g.xor(*a, *b);
            let same = g.not(diff);
            acc = g.and(acc, same);
        }
        acc
    }

    /// Per-bit 2:1 mux: `sel ? d1 : d0`. Signedness follows `d1`.
    pub fn mux(g: &mut WireGraph, sel: WireId, d0: &BitVector, d1: &BitVector) -> BitVector {
        debug_assert_eq!(d0.width(), d1.width());
        let bits = d0
            .bits
            .iter()
            .zip(&d1.bits)
            .map(|(a, b)| g.mux(sel, *a, *b))
            .collect();
        BitVector::new(bits, d1.signedness)
    }
}
