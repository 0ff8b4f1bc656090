//! Partial product generation.
//!
//! Ties the pieces together: validate the configuration against the operand
//! shapes, build the multiple bank, encode the multiplier into digits, turn
//! each digit into a row seed (selected pattern, extension bit, pending +1),
//! then hand the seeds to the configured sign-extension policy. The output
//! matrix plus its metadata is everything the compressor and the evaluator
//! need.

use crate::booth::{BoothDigit, RadixEncoder};
use crate::config::{check_operand_width, MulConfig, Radix, SignExtension};
use crate::error::{ConfigError, Result};
use crate::matrix::{PartialProductMatrix, RowKind, Term};
use crate::multiples::Multiples;
use crate::sign_ext::{self, RowSeed};
use mulgen_wire::{BitVector, Signedness, WireGraph, WireId};
use serde::{Deserialize, Serialize};

/// Build-time description of a product, carried alongside the matrix so
/// evaluation needs no access to the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMeta {
    pub radix: u64,
    pub extension: SignExtension,
    pub multiplicand_width: usize,
    pub multiplier_width: usize,
    pub product_width: usize,
    pub x_signedness: Signedness,
    pub y_signedness: Signedness,
}

/// A generated matrix with its digits and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialProducts {
    pub matrix: PartialProductMatrix,
    pub digits: Vec<BoothDigit>,
    pub meta: ProductMeta,
}

pub struct PartialProductGenerator {
    radix: Radix,
    extension: SignExtension,
    encoder: RadixEncoder,
}

impl PartialProductGenerator {
    pub fn new(config: &MulConfig) -> Result<Self> {
        let radix = Radix::new(config.radix)?;
        Ok(PartialProductGenerator {
            radix,
            extension: config.extension,
            encoder: RadixEncoder::new(radix),
        })
    }

    pub fn radix(&self) -> Radix {
        self.radix
    }

    pub fn extension(&self) -> SignExtension {
        self.extension
    }

    pub fn encoder(&self) -> &RadixEncoder {
        &self.encoder
    }

    /// Builds the partial product matrix for `x * y` mod `2^(Wx+Wy)`.
    pub fn generate(
        &self,
        g: &mut WireGraph,
        x: &BitVector,
        y: &BitVector,
    ) -> Result<PartialProducts> {
        check_operand_width("multiplicand", x.width())?;
        check_operand_width("multiplier", y.width())?;
        let k = self.radix.log2();
        if y.width() < k {
            return Err(ConfigError::MultiplierTooNarrow {
                width: y.width(),
                radix: self.radix.value(),
                min: k,
            });
        }
        if self.extension == SignExtension::Compact && x.width() != y.width() {
            return Err(ConfigError::SkewedCompact {
                multiplicand: x.width(),
                multiplier: y.width(),
            });
        }

        let product_width = x.width() + y.width();
        tracing::debug!(
            radix = self.radix.value(),
            extension = %self.extension,
            wx = x.width(),
            wy = y.width(),
            "generating partial products"
        );

        let bank = Multiples::build(g, x, self.radix);
        let digits = self.encoder.encode(g, y);

        // x's signedness as a wire, so dynamic selects reach the sign bits
        let signed_x = match x.signedness() {
            Signedness::Static(false) => g.zero(),
            Signedness::Static(true) => g.one(),
            Signedness::Dynamic(sel) => sel,
        };

        let seeds: Vec<RowSeed> = digits
            .iter()
            .map(|d| row_seed(g, &bank, d, signed_x))
            .collect();

        let mut matrix = PartialProductMatrix::new(product_width);
        match self.extension {
            SignExtension::Brute => sign_ext::brute(g, &mut matrix, seeds, k),
            SignExtension::StopBits => sign_ext::stop_bits(g, &mut matrix, seeds, k),
            SignExtension::Compact => sign_ext::compact(g, &mut matrix, seeds, k),
            SignExtension::CompactRect => sign_ext::compact_rect(g, &mut matrix, seeds, k),
        }
        tracing::debug!(shape = %matrix.shape(), "matrix built");

        Ok(PartialProducts {
            matrix,
            digits,
            meta: ProductMeta {
                radix: self.radix.value(),
                extension: self.extension,
                multiplicand_width: x.width(),
                multiplier_width: y.width(),
                product_width,
                x_signedness: x.signedness(),
                y_signedness: y.signedness(),
            },
        })
    }

    /// Prepends an accumulate row `addend << shift`. The addend must be at
    /// least one bit wide and fit entirely below the product width; its
    /// extension bit fills the rest.
    pub fn attach_addend(
        &self,
        g: &mut WireGraph,
        products: &mut PartialProducts,
        addend: &BitVector,
        shift: usize,
    ) -> Result<()> {
        let p = products.meta.product_width;
        if addend.width() == 0 {
            return Err(ConfigError::WidthOutOfRange { operand: "addend", width: 0, max: p });
        }
        let end = shift + addend.width();
        if end > p {
            return Err(ConfigError::AddendOutOfRange { shift, end, product: p });
        }
        let mut terms: Vec<Term> = addend
            .bits()
            .iter()
            .enumerate()
            .map(|(j, w)| Term::body(shift + j, *w))
            .collect();
        if end < p {
            let ext = addend.extension_bit(g);
            for col in end..p {
                terms.push(Term::sign(col, ext));
            }
        }
        products.matrix.prepend_row(RowKind::Addend, terms);
        Ok(())
    }
}

/// Selects the digit's multiple through its one-hot, applies the conditional
/// inversion, and derives the row's extension bit. A zero digit selects
/// nothing and the whole row reads zero.
fn row_seed(g: &mut WireGraph, bank: &Multiples, digit: &BoothDigit, signed_x: WireId) -> RowSeed {
    let wm = bank.width();
    let mut magnitude = Vec::with_capacity(wm);
    for j in 0..wm {
        let mut acc = g.zero();
        for (mi, hot) in digit.magnitude_onehot.iter().enumerate() {
            let mbit = bank.multiple(mi as u64 + 1).bit(j);
            let hit = g.and(*hot, mbit);
            acc = g.or(acc, hit);
        }
        magnitude.push(acc);
    }

    let top = magnitude[wm - 1];
    let body = magnitude.iter().map(|b| g.xor(*b, digit.negate)).collect();
    let ext = g.and(signed_x, top);
    let sign = g.xor(digit.negate, ext);
    RowSeed {
        body,
        sign,
        negate: digit.negate,
        shift: digit.shift,
    }
}
