//! Shared multiples of the multiplicand.
//!
//! Every digit row selects from the same bank of multiples `1*X .. (r/2)*X`,
//! each `Wm = Wx + k - 1` bits wide. That width holds the largest magnitude
//! exactly for signed and unsigned operands alike, so all downstream
//! arithmetic is plain mod-2^Wm. Even multiples are shifts of smaller ones,
//! odd multiples add `X` once, so the bank costs at most `r/2 - 1` ripple
//! structures regardless of radix.

use crate::config::Radix;
use mulgen_wire::{BitVector, WireGraph};

#[derive(Debug, Clone)]
pub struct Multiples {
    rows: Vec<BitVector>,
    width: usize,
}

impl Multiples {
    pub fn build(g: &mut WireGraph, x: &BitVector, radix: Radix) -> Self {
        let k = radix.log2();
        let width = x.width() + k - 1;
        let max = radix.max_multiple();

        let mut rows: Vec<BitVector> = Vec::with_capacity(max as usize);
        rows.push(x.extend_to(g, width));
        for m in 2..=max {
            let row = if m % 2 == 0 {
                rows[m as usize / 2 - 1].shifted_left(g, 1)
            } else {
                rows[m as usize - 2].ripple_add(g, &rows[0])
            };
            rows.push(row);
        }
        Multiples { rows, width }
    }

    /// Width of every multiple, `Wx + k - 1`.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// The multiple `m*X`, `1 <= m <= r/2`.
    pub fn multiple(&self, m: u64) -> &BitVector {
        &self.rows[m as usize - 1]
    }
}
