//! Generalized radix-2^k Booth encoding.
//!
//! The multiplier is scanned in overlapping windows of k+1 bits (one bit of
//! overlap, an implicit zero below bit 0). Each window encodes one signed
//! digit in [-(r/2), r/2]:
//!
//! ```text
//! d_i = w_0 + sum_{j=1..k-1} 2^(j-1) * w_j - 2^(k-1) * w_k
//! ```
//!
//! where `w_0` is the overlap bit and `w_k` the window's top bit. Magnitude
//! and negate are derived from the window by a fixed boolean function:
//! conditional inversion against `w_k` followed by a half-adder increment
//! chain gives |d| in binary, then per-multiple equality decode produces the
//! one-hot selects. No lookup tables, so any power-of-two radix encodes the
//! same way.

use crate::config::Radix;
use mulgen_wire::{BitVector, Sim, Signedness, WireGraph, WireId};
use serde::{Deserialize, Serialize};

/// Decoded value of one Booth digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DigitValue {
    Zero,
    Positive(u64),
    Negative(u64),
}

impl DigitValue {
    pub fn signed(&self) -> i64 {
        match self {
            DigitValue::Zero => 0,
            DigitValue::Positive(m) => *m as i64,
            DigitValue::Negative(m) => -(*m as i64),
        }
    }
}

/// One structural digit: a negate wire plus one-hot magnitude selects.
/// `magnitude_onehot[m-1]` is high exactly when |d| == m; all low means the
/// digit is zero and the row it drives stays all-zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoothDigit {
    pub index: usize,
    /// Column offset of this digit's row, `index * k`.
    pub shift: usize,
    pub negate: WireId,
    pub magnitude_onehot: Vec<WireId>,
}

impl BoothDigit {
    /// Reads the digit back out of a settled simulation.
    pub fn read_value(&self, sim: &Sim) -> DigitValue {
        for (i, w) in self.magnitude_onehot.iter().enumerate() {
            if sim.value(*w) {
                let m = i as u64 + 1;
                return if sim.value(self.negate) {
                    DigitValue::Negative(m)
                } else {
                    DigitValue::Positive(m)
                };
            }
        }
        DigitValue::Zero
    }
}

/// Number of digits needed to cover a multiplier of `width` bits. Statically
/// signed multipliers need ceil(width/k); unsigned and runtime-selected ones
/// need one extra padding bit so the top window sees a zero above the MSB.
/// An all-sign-bits window encodes digit zero, so the padded count stays
/// correct for the signed setting of a dynamic select.
pub fn digit_count(width: usize, signedness: Signedness, radix: Radix) -> usize {
    let k = radix.log2();
    if signedness.is_static_signed() {
        width.div_ceil(k)
    } else {
        (width + 1).div_ceil(k)
    }
}

/// Window scanner and digit encoder for one radix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadixEncoder {
    radix: Radix,
}

impl RadixEncoder {
    pub fn new(radix: Radix) -> Self {
        RadixEncoder { radix }
    }

    pub fn radix(&self) -> Radix {
        self.radix
    }

    /// Builds the structural digit sequence for `multiplier`.
    pub fn encode(&self, g: &mut WireGraph, multiplier: &BitVector) -> Vec<BoothDigit> {
        let k = self.radix.log2();
        let count = digit_count(multiplier.width(), multiplier.signedness(), self.radix);
        let zero = g.zero();
        let ext = multiplier.extension_bit(g);
        let bit_at = |pos: isize| -> WireId {
            if pos < 0 {
                zero
            } else if (pos as usize) < multiplier.width() {
                multiplier.bit(pos as usize)
            } else {
                ext
            }
        };

        let mut digits = Vec::with_capacity(count);
        for index in 0..count {
            let base = (index * k) as isize;
            let window: Vec<WireId> = (0..=k).map(|j| bit_at(base + j as isize - 1)).collect();
            digits.push(self.encode_window(g, index, &window));
        }
        digits
    }

    fn encode_window(&self, g: &mut WireGraph, index: usize, w: &[WireId]) -> BoothDigit {
        let k = self.radix.log2();
        debug_assert_eq!(w.len(), k + 1);

        // d < 0 iff the top bit is set and the rest are not all ones; the
        // all-ones window is digit zero and must not invert its row.
        let mut lower_ones = w[0];
        for wj in &w[1..k] {
            lower_ones = g.and(lower_ones, *wj);
        }
        let not_ones = g.not(lower_ones);
        let negate = g.and(w[k], not_ones);

        // |d| = (middle bits ^ w_k) incremented by (w_0 ^ w_k).
        let mut carry = g.xor(w[0], w[k]);
        let mut mag_bits = Vec::with_capacity(k);
        for j in 0..k - 1 {
            let vt = g.xor(w[j + 1], w[k]);
            let out = g.xor(vt, carry);
            let next = g.and(vt, carry);
            mag_bits.push(out);
            carry = next;
        }
        mag_bits.push(carry);

        let max_multiple = self.radix.max_multiple();
        let mut magnitude_onehot = Vec::with_capacity(max_multiple as usize);
        for m in 1..=max_multiple {
            let mut hit = g.one();
            for (b, bit) in mag_bits.iter().enumerate() {
                let lit = if (m >> b) & 1 == 1 {
                    *bit
                } else {
                    g.not(*bit)
                };
                hit = g.and(hit, lit);
            }
            magnitude_onehot.push(hit);
        }

        BoothDigit {
            index,
            shift: index * k,
            negate,
            magnitude_onehot,
        }
    }

    /// Pure decode of one window, LSB = overlap bit. Verification-side twin
    /// of [`encode`](Self::encode).
    pub fn digit_value(&self, window: u32) -> DigitValue {
        let k = self.radix.log2();
        let w0 = (window & 1) as i64;
        let mid = if k > 1 {
            ((window >> 1) & ((1 << (k - 1)) - 1)) as i64
        } else {
            0
        };
        let top = ((window >> k) & 1) as i64;
        let d = w0 + mid - (top << (k - 1));
        match d {
            0 => DigitValue::Zero,
            d if d > 0 => DigitValue::Positive(d as u64),
            d => DigitValue::Negative((-d) as u64),
        }
    }

    /// Window `index` of a concrete multiplier pattern, padded per
    /// signedness above `width`.
    pub fn concrete_window(&self, value: u128, width: usize, signed: bool, index: usize) -> u32 {
        let k = self.radix.log2();
        let sign_bit = (value >> (width - 1)) & 1;
        let bit = |pos: isize| -> u32 {
            if pos < 0 {
                0
            } else if (pos as usize) < width {
                ((value >> pos) & 1) as u32
            } else if signed {
                sign_bit as u32
            } else {
                0
            }
        };
        let base = (index * k) as isize;
        (0..=k).fold(0u32, |acc, j| acc | (bit(base + j as isize - 1) << j))
    }

    /// All digits of a concrete multiplier pattern.
    pub fn digit_values(&self, value: u128, width: usize, signed: bool) -> Vec<DigitValue> {
        let count = digit_count(width, Signedness::Static(signed), self.radix);
        (0..count)
            .map(|i| self.digit_value(self.concrete_window(value, width, signed, i)))
            .collect()
    }
}
